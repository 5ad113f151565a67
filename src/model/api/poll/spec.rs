use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{
    common::{Candidate, Poll},
    mongodb::Id,
};

/// A poll specification, as submitted by an administrator.
///
/// Every field is optional at the serde level so that a request missing
/// several fields reports all of them at once instead of failing on the
/// first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub candidates: Vec<CandidateSpec>,
}

/// A candidate specification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
    /// Blank URLs are treated as absent.
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// One problem with a submitted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Path of the offending field, e.g. `candidates[1].bio`.
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

/// A poll specification was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid poll: {}", join(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl PollSpec {
    /// Check the submission, collecting every violation. On success returns the
    /// voting window.
    pub fn validate(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationError> {
        let mut violations = Vec::new();

        if is_blank(&self.title) {
            violations.push(Violation::new("title", "must not be blank"));
        }
        if is_blank(&self.description) {
            violations.push(Violation::new("description", "must not be blank"));
        }
        let window = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end <= start => {
                violations.push(Violation::new("endTime", "must be after startTime"));
                None
            }
            (Some(start), Some(end)) => Some((start, end)),
            (start, end) => {
                if start.is_none() {
                    violations.push(Violation::new("startTime", "is required"));
                }
                if end.is_none() {
                    violations.push(Violation::new("endTime", "is required"));
                }
                None
            }
        };
        if self.candidates.is_empty() {
            violations.push(Violation::new("candidates", "must not be empty"));
        }
        for (i, candidate) in self.candidates.iter().enumerate() {
            if is_blank(&candidate.name) {
                violations.push(Violation::new(
                    format!("candidates[{i}].name"),
                    "must not be blank",
                ));
            }
            if is_blank(&candidate.bio) {
                violations.push(Violation::new(
                    format!("candidates[{i}].bio"),
                    "must not be blank",
                ));
            }
        }

        match window {
            Some(window) if violations.is_empty() => Ok(window),
            _ => Err(ValidationError { violations }),
        }
    }

    /// Validate this spec and convert it into a fresh poll with unique IDs
    /// and no ballots.
    pub fn into_poll(self) -> Result<Poll, ValidationError> {
        let (start_time, end_time) = self.validate()?;

        Ok(Poll {
            id: Id::new(),
            title: self.title,
            description: self.description,
            start_time,
            end_time,
            candidates: self
                .candidates
                .into_iter()
                .map(CandidateSpec::into_candidate)
                .collect(),
            ballots: HashMap::new(),
        })
    }
}

impl CandidateSpec {
    fn into_candidate(self) -> Candidate {
        Candidate {
            id: Id::new(),
            name: self.name,
            bio: self.bio,
            photo_url: self.photo_url.filter(|url| !is_blank(url)),
        }
    }
}
