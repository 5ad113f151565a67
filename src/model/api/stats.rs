use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::status_at;
use crate::model::common::{Poll, PollStatus};

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_polls: usize,
    pub upcoming: usize,
    pub ongoing: usize,
    pub ended: usize,
    /// Ballots cast across all polls.
    pub total_votes: usize,
}

impl DashboardStats {
    pub fn new<'a>(polls: impl IntoIterator<Item = &'a Poll>, now: DateTime<Utc>) -> Self {
        polls.into_iter().fold(Self::default(), |mut stats, poll| {
            stats.total_polls += 1;
            stats.total_votes += poll.total_votes();
            match status_at(poll, now) {
                PollStatus::Upcoming => stats.upcoming += 1,
                PollStatus::Ongoing => stats.ongoing += 1,
                PollStatus::Ended => stats.ended += 1,
            }
            stats
        })
    }
}
