//! Data types and associated functions and methods

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use validator::{Validate, ValidationError};

use crate::error::DashboardError;
use crate::types::Key;

/// Academic ranks present in the dataset.
pub const RANKS: [&str; 3] = ["Prof", "AsstProf", "AssocProf"];

/// Sexes present in the dataset.
pub const SEXES: [&str; 2] = ["Female", "Male"];

/// A faculty member's salary record
///
/// Immutable once loaded into a [RecordStore](crate::store::RecordStore).
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
pub struct Record {
    /// Academic rank
    #[validate(custom = "validate_rank")]
    pub rank: String,
    /// Discipline
    #[validate(length(min = 1, message = "discipline must not be empty"))]
    pub discipline: String,
    /// Years since the PhD was awarded
    pub yrs_since_phd: u32,
    /// Years of service
    pub yrs_service: u32,
    /// Sex
    #[validate(custom = "validate_sex")]
    pub sex: String,
    /// Nine-month salary in dollars
    pub salary: u32,
}

impl Record {
    /// Return a new Record object.
    pub fn new(
        rank: &str,
        discipline: &str,
        yrs_since_phd: u32,
        yrs_service: u32,
        sex: &str,
        salary: u32,
    ) -> Self {
        Record {
            rank: rank.to_string(),
            discipline: discipline.to_string(),
            yrs_since_phd,
            yrs_service,
            sex: sex.to_string(),
            salary,
        }
    }
}

/// Validate an academic rank
fn validate_rank(rank: &str) -> Result<(), ValidationError> {
    if !RANKS.contains(&rank) {
        let mut error = ValidationError::new("rank must be one of Prof, AsstProf, AssocProf");
        error.add_param("rank".into(), &rank);
        return Err(error);
    }
    Ok(())
}

/// Validate a sex
fn validate_sex(sex: &str) -> Result<(), ValidationError> {
    if !SEXES.contains(&sex) {
        let mut error = ValidationError::new("sex must be one of Female, Male");
        error.add_param("sex".into(), &sex);
        return Err(error);
    }
    Ok(())
}

/// A dataset row as it appears in the CSV source, before numeric fields are parsed.
///
/// The published dataset uses dotted column names; underscored spellings are accepted too.
/// Unknown columns, such as the unnamed row index, are ignored.
#[derive(Debug, Deserialize)]
pub struct RawRecord {
    pub rank: String,
    pub discipline: String,
    #[serde(rename = "yrs.since.phd", alias = "yrs_since_phd")]
    pub yrs_since_phd: String,
    #[serde(rename = "yrs.service", alias = "yrs_service")]
    pub yrs_service: String,
    pub sex: String,
    pub salary: String,
}

/// Parse a non-negative integer field.
fn parse_integer(field: &'static str, value: &str) -> Result<u32, DashboardError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| DashboardError::NotAnInteger {
            field,
            value: value.to_string(),
        })
}

impl TryFrom<RawRecord> for Record {
    type Error = DashboardError;

    fn try_from(raw: RawRecord) -> Result<Self, Self::Error> {
        let record = Record {
            rank: raw.rank.trim().to_string(),
            discipline: raw.discipline.trim().to_string(),
            yrs_since_phd: parse_integer("yrs_since_phd", &raw.yrs_since_phd)?,
            yrs_service: parse_integer("yrs_service", &raw.yrs_service)?,
            sex: raw.sex.trim().to_string(),
            salary: parse_integer("salary", &raw.salary)?,
        };
        record.validate()?;
        Ok(record)
    }
}

/// Record fields that dimensions may be keyed on
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Rank,
    Discipline,
    YrsSincePhd,
    YrsService,
    Sex,
    Salary,
}

impl Field {
    /// Returns the key of this field for a record.
    pub fn key(self, record: &Record) -> Key {
        match self {
            Self::Rank => Key::from(record.rank.as_str()),
            Self::Discipline => Key::from(record.discipline.as_str()),
            Self::YrsSincePhd => Key::from(record.yrs_since_phd),
            Self::YrsService => Key::from(record.yrs_service),
            Self::Sex => Key::from(record.sex.as_str()),
            Self::Salary => Key::from(record.salary),
        }
    }
}

/// Returns a key function projecting a single field.
pub fn pluck(field: Field) -> impl Fn(&Record) -> Key {
    move |record| field.key(record)
}

/// Returns a key function projecting several fields into a composite key.
pub fn pluck_all(fields: &[Field]) -> impl Fn(&Record) -> Key {
    let fields = fields.to_vec();
    move |record| Key::Tuple(fields.iter().map(|field| field.key(record)).collect())
}
