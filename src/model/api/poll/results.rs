use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{status_at, tally, InconsistentBallot, TallyEntry};
use crate::model::{
    common::{Candidate, Poll, PollStatus},
    mongodb::Id,
};

/// One candidate's position in the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub rank: usize,
    pub candidate: Candidate,
    pub vote_count: usize,
    pub percentage: f64,
}

impl From<TallyEntry<'_>> for Standing {
    fn from(entry: TallyEntry<'_>) -> Self {
        Self {
            rank: entry.rank,
            candidate: entry.candidate.clone(),
            vote_count: entry.vote_count,
            percentage: entry.percentage,
        }
    }
}

/// Live or final results of a poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub poll_id: Id,
    pub title: String,
    /// Results are final once this is `ended`.
    pub status: PollStatus,
    pub total_votes: usize,
    /// Every candidate, ranked by votes; ties in declared order.
    pub standings: Vec<Standing>,
    /// IDs of the candidates with the most votes; empty if nobody has voted.
    pub leaders: Vec<Id>,
}

impl PollResults {
    /// Tally `poll` as of `now`.
    pub fn new(poll: &Poll, now: DateTime<Utc>) -> Result<Self, InconsistentBallot> {
        let tally = tally(poll)?;
        let leaders = tally.leaders().iter().map(|c| c.id).collect();
        let total_votes = tally.total_votes();
        Ok(Self {
            poll_id: poll.id,
            title: poll.title.clone(),
            status: status_at(poll, now),
            total_votes,
            standings: tally.into_entries().into_iter().map(Standing::from).collect(),
            leaders,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::model::common::VoterId;

    use super::*;

    #[test]
    fn ranks_and_leads() {
        let mut poll = Poll::example();
        let b = poll.candidate_id("B");
        for voter in ["v1", "v2"] {
            poll.ballots.insert(VoterId::try_from(voter).unwrap(), b);
        }

        let results = PollResults::new(&poll, poll.start_time).unwrap();
        assert_eq!(results.status, PollStatus::Ongoing);
        assert_eq!(results.total_votes, 2);
        assert_eq!(results.leaders, vec![b]);
        let names: Vec<_> = results
            .standings
            .iter()
            .map(|s| (s.candidate.name.as_str(), s.rank, s.percentage))
            .collect();
        assert_eq!(names, vec![("B", 1, 100.0), ("A", 2, 0.0), ("C", 2, 0.0)]);
    }
}
