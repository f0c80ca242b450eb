use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i32);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub i32);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where the studying happened.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyType {
    /// Lessons and school-set work.
    School,
    /// Self-directed study.
    #[serde(rename = "self")]
    SelfStudy,
}

impl StudyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyType::School => "school",
            StudyType::SelfStudy => "self",
        }
    }
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown study type: {0:?} (expected \"school\" or \"self\")")]
pub struct UnknownStudyType(pub String);

impl FromStr for StudyType {
    type Err = UnknownStudyType;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "school" => Ok(StudyType::School),
            "self" => Ok(StudyType::SelfStudy),
            _ => Err(UnknownStudyType(s.to_string())),
        }
    }
}

/// Largest accepted value for the minutes part of a duration.
pub const MAX_MINUTES_PART: i64 = 59;
