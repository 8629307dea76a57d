//! Time-of-day handling shared by every persisted record.
//!
//! Stores have historically held times as `9:00`, `09:00 ` or `09:00:00`;
//! everything is parsed leniently and always rendered back as `HH:MM`.

use chrono::{NaiveTime, Timelike};

pub const TIME_FORMAT: &str = "%H:%M";

/// Parses `H:MM`, `HH:MM` or `HH:MM:SS` (surrounding whitespace allowed),
/// truncating to minute precision.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .ok()
        .and_then(|time| NaiveTime::from_hms_opt(time.hour(), time.minute(), 0))
}

pub fn format_time_of_day(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

pub fn from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time_of_day(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time_of_day(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid time of day '{}'", raw)))
    }
}

pub mod hhmm_option {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => serializer.serialize_some(&super::format_time_of_day(*time)),
            None => serializer.serialize_none(),
        }
    }

    /// Blank strings count as absent.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse_time_of_day(&raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid time of day '{}'", raw))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_width_and_seconds() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(parse_time_of_day("9:00"), Some(nine));
        assert_eq!(parse_time_of_day(" 09:00 "), Some(nine));
        assert_eq!(parse_time_of_day("09:00:45"), Some(nine));
        assert_eq!(format_time_of_day(nine), "09:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_time_of_day(""), None);
        assert_eq!(parse_time_of_day("25:00"), None);
        assert_eq!(parse_time_of_day("nine"), None);
    }

    #[test]
    fn test_minutes_conversion() {
        let t = NaiveTime::from_hms_opt(13, 45, 0).unwrap();
        assert_eq!(minutes_since_midnight(t), 825);
        assert_eq!(from_minutes(825), Some(t));
        assert_eq!(from_minutes(24 * 60), None);
    }
}
