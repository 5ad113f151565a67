use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::status_at;
use crate::model::{
    common::{Candidate, Poll, PollStatus, VoterId},
    mongodb::Id,
};

/// An API-friendly poll description, without any individual ballots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDescription {
    /// Poll unique ID.
    pub id: Id,
    pub title: String,
    pub description: String,
    /// Status at the time of the request.
    pub status: PollStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Candidates in declared order.
    pub candidates: Vec<Candidate>,
    /// Number of ballots cast so far.
    pub total_votes: usize,
    /// The candidate the requesting voter chose, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voted_for: Option<Id>,
}

impl PollDescription {
    /// Describe `poll` as seen by `voter` at `now`.
    pub fn new(poll: Poll, now: DateTime<Utc>, voter: Option<&VoterId>) -> Self {
        Self {
            status: status_at(&poll, now),
            total_votes: poll.total_votes(),
            voted_for: voter.and_then(|voter| poll.ballot(voter)),
            id: poll.id,
            title: poll.title,
            description: poll.description,
            start_time: poll.start_time,
            end_time: poll.end_time,
            candidates: poll.candidates,
        }
    }
}

/// A summary of a poll for listings, shorter than the full `PollDescription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollSummary {
    pub id: Id,
    pub title: String,
    pub status: PollStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub candidate_count: usize,
    pub total_votes: usize,
}

impl PollSummary {
    pub fn new(poll: &Poll, now: DateTime<Utc>) -> Self {
        Self {
            id: poll.id,
            title: poll.title.clone(),
            status: status_at(poll, now),
            start_time: poll.start_time,
            end_time: poll.end_time,
            candidate_count: poll.candidates.len(),
            total_votes: poll.total_votes(),
        }
    }
}
