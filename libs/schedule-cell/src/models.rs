// libs/schedule-cell/src/models.rs
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use shared_config::AppConfig;

use crate::error::ScheduleError;
use crate::time::{self, hhmm, hhmm_option};

// ==============================================================================
// IDENTITY KEYS
// ==============================================================================

/// Separator for every identity key. No date, `HH:MM` time or accepted
/// professional id contains it.
pub const KEY_DELIMITER: char = '_';

pub fn compose_key(parts: &[&str]) -> String {
    parts.join(&KEY_DELIMITER.to_string())
}

pub fn validate_professional_id(professional_id: &str) -> Result<(), ScheduleError> {
    if professional_id.trim().is_empty() {
        return Err(ScheduleError::ValidationError(
            "Professional id must not be empty".to_string(),
        ));
    }
    if professional_id.contains(KEY_DELIMITER) {
        return Err(ScheduleError::ValidationError(format!(
            "Professional id '{}' must not contain '{}'",
            professional_id, KEY_DELIMITER
        )));
    }
    Ok(())
}

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ==============================================================================
// SCHEDULE MODELS
// ==============================================================================

/// Which days a schedule entry applies to: every week on a weekday, or a
/// single calendar date overriding the weekly rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScheduleDay {
    Date(NaiveDate),
    Weekly(#[serde(with = "weekday_name")] Weekday),
}

impl ScheduleDay {
    pub fn applies_to(&self, date: NaiveDate) -> bool {
        match self {
            ScheduleDay::Date(day) => *day == date,
            ScheduleDay::Weekly(weekday) => date.weekday() == *weekday,
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, ScheduleDay::Date(_))
    }
}

impl fmt::Display for ScheduleDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleDay::Date(date) => write!(f, "{}", date_key(*date)),
            ScheduleDay::Weekly(weekday) => write!(f, "{}", weekday_name::name(*weekday)),
        }
    }
}

mod weekday_name {
    use chrono::Weekday;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn name(weekday: Weekday) -> &'static str {
        match weekday {
            Weekday::Mon => "monday",
            Weekday::Tue => "tuesday",
            Weekday::Wed => "wednesday",
            Weekday::Thu => "thursday",
            Weekday::Fri => "friday",
            Weekday::Sat => "saturday",
            Weekday::Sun => "sunday",
        }
    }

    pub fn serialize<S: Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(name(*weekday))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse::<Weekday>()
            .map_err(|_| D::Error::custom(format!("invalid weekday '{}'", raw)))
    }
}

/// One working-hours rule for one professional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub professional_id: String,
    #[serde(rename = "weekday")]
    pub day: ScheduleDay,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default, with = "hhmm_option")]
    pub lunch_start: Option<NaiveTime>,
    #[serde(default, with = "hhmm_option")]
    pub lunch_end: Option<NaiveTime>,
}

impl ScheduleEntry {
    pub fn key(&self) -> String {
        compose_key(&[&self.professional_id, &self.day.to_string()])
    }

    pub fn lunch_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        self.lunch_start.zip(self.lunch_end)
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        validate_professional_id(&self.professional_id)?;

        if self.start_time >= self.end_time {
            return Err(ScheduleError::ValidationError(format!(
                "Start time {} must be before end time {}",
                time::format_time_of_day(self.start_time),
                time::format_time_of_day(self.end_time)
            )));
        }

        match (self.lunch_start, self.lunch_end) {
            (None, None) => Ok(()),
            (Some(lunch_start), Some(lunch_end)) => {
                if lunch_start >= lunch_end {
                    return Err(ScheduleError::ValidationError(
                        "Lunch start must be before lunch end".to_string(),
                    ));
                }
                if lunch_start < self.start_time || lunch_end > self.end_time {
                    return Err(ScheduleError::ValidationError(
                        "Lunch window must lie within working hours".to_string(),
                    ));
                }
                Ok(())
            }
            _ => Err(ScheduleError::ValidationError(
                "Lunch start and lunch end must be given together".to_string(),
            )),
        }
    }
}

// ==============================================================================
// BLOCKING MODELS
// ==============================================================================

/// Clinic-wide closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDay {
    pub date: NaiveDate,
}

impl BlockedDay {
    pub fn key(&self) -> String {
        date_key(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDayForEmployee {
    pub date: NaiveDate,
    pub professional_id: String,
}

impl BlockedDayForEmployee {
    pub fn key(&self) -> String {
        compose_key(&[&date_key(self.date), &self.professional_id])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedTime {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub professional_id: String,
}

impl BlockedTime {
    pub fn key(&self) -> String {
        compose_key(&[
            &date_key(self.date),
            &time::format_time_of_day(self.time),
            &self.professional_id,
        ])
    }
}

/// Per-date blocks scoped to a professional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateBlock {
    Time(BlockedTime),
    ProfessionalDay(BlockedDayForEmployee),
}

impl DateBlock {
    pub fn professional_id(&self) -> &str {
        match self {
            DateBlock::Time(block) => &block.professional_id,
            DateBlock::ProfessionalDay(block) => &block.professional_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Day,
    ProfessionalDay,
    Time,
}

impl BlockKind {
    pub fn path_segment(&self) -> &'static str {
        match self {
            BlockKind::Day => "days",
            BlockKind::ProfessionalDay => "professional-days",
            BlockKind::Time => "times",
        }
    }
}

impl FromStr for BlockKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "days" | "day" => Ok(BlockKind::Day),
            "professional-days" | "professional_day" => Ok(BlockKind::ProfessionalDay),
            "times" | "time" => Ok(BlockKind::Time),
            other => Err(ScheduleError::ValidationError(format!(
                "Unknown block kind '{}'",
                other
            ))),
        }
    }
}

/// Everything blocking one professional on one date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfessionalBlocks {
    pub whole_day: bool,
    pub times: BTreeSet<NaiveTime>,
}

// ==============================================================================
// TIME CATALOGS
// ==============================================================================

/// Externally configured catalogs of offerable times.
///
/// `standard` restricts what regular callers see inside the generated
/// range (`None` = no restriction). `admin_extended` holds privileged times
/// offered to administrators on top, even outside working hours.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeCatalog {
    pub standard: Option<BTreeSet<NaiveTime>>,
    pub admin_extended: BTreeSet<NaiveTime>,
}

impl TimeCatalog {
    pub fn from_config(config: &AppConfig) -> Result<Self, ScheduleError> {
        let standard = config
            .standard_time_catalog
            .as_ref()
            .map(|raw| parse_catalog("STANDARD_TIME_CATALOG", raw))
            .transpose()?;
        let admin_extended = parse_catalog("ADMIN_TIME_CATALOG", &config.admin_time_catalog)?;

        Ok(Self {
            standard,
            admin_extended,
        })
    }

    /// Narrows generated candidates to the caller's catalog. Output is
    /// ascending and duplicate-free.
    pub fn candidates(&self, generated: &[NaiveTime], caller_is_admin: bool) -> Vec<NaiveTime> {
        let mut result: BTreeSet<NaiveTime> = generated
            .iter()
            .copied()
            .filter(|time| {
                self.standard
                    .as_ref()
                    .map_or(true, |standard| standard.contains(time))
            })
            .collect();

        if caller_is_admin {
            result.extend(self.admin_extended.iter().copied());
        }

        result.into_iter().collect()
    }
}

fn parse_catalog(name: &str, raw: &[String]) -> Result<BTreeSet<NaiveTime>, ScheduleError> {
    raw.iter()
        .map(|value| {
            time::parse_time_of_day(value).ok_or_else(|| {
                ScheduleError::ValidationError(format!("{} contains invalid time '{}'", name, value))
            })
        })
        .collect()
}
