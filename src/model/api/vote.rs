use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// A vote submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub candidate_id: Id,
}

/// A voter's own ballot in a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotDesc {
    pub poll_id: Id,
    /// `None` if the voter has not voted in this poll.
    pub candidate_id: Option<Id>,
}
