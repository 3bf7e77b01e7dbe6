// Time expressions - symbolic musical-time literals
// Covers the three notations track configuration is written in: measure
// counts ("1m"), note lengths ("8n", "4n.", "8t"), and bar:beat positions
// ("0:2.6666"). Parsing fails fast; resolution against a time signature
// cannot fail.

use std::fmt;
use std::str::FromStr;

use crate::error::{ScheduleError, ScheduleResult};
use crate::time::{MusicalTime, Ticks, TimeSignature};

/// A parsed musical-time expression
///
/// `Measures` and `Note` are durations; `Position` is an offset from
/// playback (or loop) start. Beat and sixteenth components of a position
/// may be fractional, as in the source notation ("0:2.6666"), and are
/// resolved to the nearest tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeExpr {
    /// Whole measures: "1m", "4m"
    Measures(u32),
    /// Note length: "4n" quarter, "8n." dotted eighth, "8t" eighth triplet
    Note {
        denominator: u16,
        dots: u8,
        triplet: bool,
    },
    /// bar:beat or bar:beat:sixteenth position
    Position { bar: u32, beat: f64, sixteenth: f64 },
}

impl TimeExpr {
    /// Parse a time expression literal
    pub fn parse(input: &str) -> ScheduleResult<Self> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ScheduleError::InvalidTimeExpression(input.to_string()));
        }

        if s.contains(':') {
            return Self::parse_position(input, s);
        }

        if let Some(count) = s.strip_suffix('m') {
            let measures = count
                .parse::<u32>()
                .map_err(|_| ScheduleError::InvalidTimeExpression(input.to_string()))?;
            return Ok(TimeExpr::Measures(measures));
        }

        Self::parse_note(input, s)
    }

    fn parse_position(input: &str, s: &str) -> ScheduleResult<Self> {
        let invalid = || ScheduleError::InvalidTimeExpression(input.to_string());

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid());
        }

        let bar = parts[0].parse::<u32>().map_err(|_| invalid())?;
        let beat = parts[1].parse::<f64>().map_err(|_| invalid())?;
        let sixteenth = match parts.get(2) {
            Some(p) => p.parse::<f64>().map_err(|_| invalid())?,
            None => 0.0,
        };

        if !beat.is_finite() || beat < 0.0 || !sixteenth.is_finite() || sixteenth < 0.0 {
            return Err(invalid());
        }

        Ok(TimeExpr::Position {
            bar,
            beat,
            sixteenth,
        })
    }

    fn parse_note(input: &str, s: &str) -> ScheduleResult<Self> {
        let invalid = || ScheduleError::InvalidTimeExpression(input.to_string());

        let body = s.trim_end_matches('.');
        let dots = (s.len() - body.len()) as u8;

        let (digits, triplet) = if let Some(d) = body.strip_suffix('n') {
            (d, false)
        } else if let Some(d) = body.strip_suffix('t') {
            (d, true)
        } else {
            return Err(invalid());
        };

        let denominator = digits.parse::<u16>().map_err(|_| invalid())?;
        if !denominator.is_power_of_two() || denominator > 64 {
            return Err(invalid());
        }

        Ok(TimeExpr::Note {
            denominator,
            dots,
            triplet,
        })
    }

    /// Resolve to ticks against a time signature
    pub fn to_ticks(&self, time_signature: &TimeSignature) -> Ticks {
        match *self {
            TimeExpr::Measures(n) => n as Ticks * time_signature.ticks_per_bar(),
            TimeExpr::Note {
                denominator,
                dots,
                triplet,
            } => {
                // Note values are relative to the signature's beat unit:
                // in x/4 a "4n" is one beat, in x/8 an "8n" is one beat.
                let mut base = MusicalTime::TICKS_PER_BEAT as f64
                    * time_signature.denominator as f64
                    / denominator as f64;
                if triplet {
                    base = base * 2.0 / 3.0;
                }
                let mut value = base;
                let mut add = base;
                for _ in 0..dots {
                    add /= 2.0;
                    value += add;
                }
                value.round() as Ticks
            }
            TimeExpr::Position {
                bar,
                beat,
                sixteenth,
            } => {
                let ticks_per_beat = MusicalTime::TICKS_PER_BEAT as f64;
                let raw = bar as f64 * time_signature.ticks_per_bar() as f64
                    + beat * ticks_per_beat
                    + sixteenth * ticks_per_beat / 4.0;
                raw.round() as Ticks
            }
        }
    }

    /// Resolve to a normalized musical position
    pub fn to_position(&self, time_signature: &TimeSignature) -> MusicalTime {
        MusicalTime::from_total_ticks(self.to_ticks(time_signature), time_signature)
    }
}

impl FromStr for TimeExpr {
    type Err = ScheduleError;

    fn from_str(s: &str) -> ScheduleResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for TimeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TimeExpr::Measures(n) => write!(f, "{}m", n),
            TimeExpr::Note {
                denominator,
                dots,
                triplet,
            } => {
                let unit = if triplet { 't' } else { 'n' };
                write!(f, "{}{}", denominator, unit)?;
                for _ in 0..dots {
                    write!(f, ".")?;
                }
                Ok(())
            }
            TimeExpr::Position {
                bar,
                beat,
                sixteenth,
            } => {
                if sixteenth == 0.0 {
                    write!(f, "{}:{}", bar, beat)
                } else {
                    write!(f, "{}:{}:{}", bar, beat, sixteenth)
                }
            }
        }
    }
}
