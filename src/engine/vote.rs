use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    common::{Poll, PollStatus, VoterId},
    mongodb::Id,
};

use super::status_at;

/// Why a vote was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VoteRejection {
    #[error("Poll is {0}, not ongoing")]
    PollNotOngoing(PollStatus),
    #[error("Candidate {0} is not part of this poll")]
    UnknownCandidate(Id),
    #[error("Voter has already voted in this poll")]
    AlreadyVoted,
}

/// Record a ballot for `voter` choosing `candidate_id`, if the rules allow it.
///
/// Checks are applied in order: the poll must be ongoing at `now`, the
/// candidate must belong to the poll, and the voter must not have voted yet.
/// On success the updated poll is returned; on failure the caller's copy is
/// left untouched.
pub fn cast_vote(
    mut poll: Poll,
    voter: &VoterId,
    candidate_id: Id,
    now: DateTime<Utc>,
) -> Result<Poll, VoteRejection> {
    let status = status_at(&poll, now);
    if status != PollStatus::Ongoing {
        return Err(VoteRejection::PollNotOngoing(status));
    }
    if poll.candidate(candidate_id).is_none() {
        return Err(VoteRejection::UnknownCandidate(candidate_id));
    }
    if poll.has_voted(voter) {
        return Err(VoteRejection::AlreadyVoted);
    }

    poll.ballots.insert(voter.clone(), candidate_id);
    Ok(poll)
}
