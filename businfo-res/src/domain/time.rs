//! Stop times as written in schedule files.
//!
//! Raw schedules give departures as "H:MM" or "HH:MM". Every stored time is
//! normalized to exactly five characters so that string comparisons in the
//! client database order correctly.

use std::fmt;

/// Error returned when parsing an invalid stop time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A departure time of day, always rendered as "HH:MM".
///
/// Hours are not range checked: schedules may use "24:10" for services
/// running past midnight, and the value is carried through verbatim.
///
/// # Examples
///
/// ```
/// use businfo_res::domain::StopTime;
///
/// let t = StopTime::parse("9:05").unwrap();
/// assert_eq!(t.as_str(), "09:05");
///
/// assert!(StopTime::parse("905").is_err());
/// assert!(StopTime::parse("9:5").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopTime([u8; 5]);

impl StopTime {
    /// Parse "H:MM" or "HH:MM" (ASCII digits only).
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();

        let (hour, minute) = match bytes.len() {
            4 => ([b'0', bytes[0]], &bytes[2..4]),
            5 => ([bytes[0], bytes[1]], &bytes[3..5]),
            _ => return Err(TimeError::new("expected H:MM or HH:MM")),
        };

        if bytes[bytes.len() - 3] != b':' {
            return Err(TimeError::new("expected colon before minutes"));
        }

        if !hour.iter().chain(minute).all(u8::is_ascii_digit) {
            return Err(TimeError::new("expected ASCII digits"));
        }

        Ok(StopTime([hour[0], hour[1], b':', minute[0], minute[1]]))
    }

    /// Returns the normalized "HH:MM" text.
    pub fn as_str(&self) -> &str {
        // SAFETY: only ASCII digits and ':' are stored
        std::str::from_utf8(&self.0).unwrap()
    }
}

impl fmt::Debug for StopTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopTime({})", self.as_str())
    }
}

impl fmt::Display for StopTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_single_digit_hour() {
        assert_eq!(StopTime::parse("9:05").unwrap().as_str(), "09:05");
        assert_eq!(StopTime::parse("0:00").unwrap().as_str(), "00:00");
    }

    #[test]
    fn keeps_two_digit_hour() {
        assert_eq!(StopTime::parse("14:30").unwrap().as_str(), "14:30");
        assert_eq!(StopTime::parse("24:10").unwrap().as_str(), "24:10");
    }

    #[test]
    fn rejects_malformed() {
        assert!(StopTime::parse("").is_err());
        assert!(StopTime::parse("1430").is_err());
        assert!(StopTime::parse("14:3").is_err());
        assert!(StopTime::parse("14h30").is_err());
        assert!(StopTime::parse("ab:cd").is_err());
        assert!(StopTime::parse("114:30").is_err());
        assert!(StopTime::parse("14:30*x*").is_err());
    }

    #[test]
    fn rejects_non_ascii_digits() {
        // Arabic-Indic digits are numeric but not ASCII
        assert!(StopTime::parse("٩:٠٥").is_err());
    }

    #[test]
    fn display_and_debug() {
        let t = StopTime::parse("7:45").unwrap();
        assert_eq!(format!("{}", t), "07:45");
        assert_eq!(format!("{:?}", t), "StopTime(07:45)");
    }

    #[test]
    fn ordering_follows_text() {
        let a = StopTime::parse("9:59").unwrap();
        let b = StopTime::parse("10:00").unwrap();
        assert!(a < b);
    }
}
