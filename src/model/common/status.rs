use std::fmt::{Display, Formatter};

use rocket::FromFormField;
use serde::{Deserialize, Serialize};

/// Temporal phase of a poll, always derived from the current time.
///
/// Variants are declared in lifecycle order, so `Ord` follows time.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, FromFormField,
)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    /// Not yet open for voting.
    #[field(value = "upcoming")]
    Upcoming,
    /// Open for voting.
    #[field(value = "ongoing")]
    Ongoing,
    /// Closed; results are final.
    #[field(value = "ended")]
    Ended,
}

impl Display for PollStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Ended => "ended",
        })
    }
}
