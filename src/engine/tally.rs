use std::collections::HashMap;

use thiserror::Error;

use crate::model::{
    common::{Candidate, Poll, VoterId},
    mongodb::Id,
};

/// A stored ballot names a candidate the poll does not have.
///
/// Ballots are validated before they are written, so this indicates a
/// corrupted record rather than a user error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Ballot of voter {voter} references unknown candidate {candidate}")]
pub struct InconsistentBallot {
    pub voter: VoterId,
    pub candidate: Id,
}

/// One candidate's line in a tally.
#[derive(Debug, Clone, PartialEq)]
pub struct TallyEntry<'a> {
    pub candidate: &'a Candidate,
    pub vote_count: usize,
    /// Share of all ballots, in percent, rounded half away from zero to one
    /// decimal place. Zero when no ballots have been cast.
    pub percentage: f64,
    /// Standard competition rank: tied candidates share a rank and the next
    /// rank skips accordingly (1, 1, 3).
    pub rank: usize,
}

/// Aggregated results of a poll, ranked by vote count.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally<'a> {
    entries: Vec<TallyEntry<'a>>,
    total_votes: usize,
}

impl<'a> Tally<'a> {
    /// Entries in rank order; ties keep the poll's declared candidate order.
    pub fn entries(&self) -> &[TallyEntry<'a>] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TallyEntry<'a>> {
        self.entries
    }

    pub fn total_votes(&self) -> usize {
        self.total_votes
    }

    /// The candidates sharing the highest vote count, or none if no votes
    /// have been cast.
    pub fn leaders(&self) -> Vec<&'a Candidate> {
        self.entries
            .iter()
            .filter(|entry| entry.rank == 1 && entry.vote_count > 0)
            .map(|entry| entry.candidate)
            .collect()
    }
}

/// Count the ballots of `poll` and rank its candidates.
pub fn tally(poll: &Poll) -> Result<Tally<'_>, InconsistentBallot> {
    let mut counts: HashMap<Id, usize> = poll.candidates.iter().map(|c| (c.id, 0)).collect();
    for (voter, candidate) in &poll.ballots {
        match counts.get_mut(candidate) {
            Some(count) => *count += 1,
            None => {
                return Err(InconsistentBallot {
                    voter: voter.clone(),
                    candidate: *candidate,
                })
            }
        }
    }

    let total_votes = poll.total_votes();
    let mut entries: Vec<TallyEntry> = poll
        .candidates
        .iter()
        .map(|candidate| {
            let vote_count = counts.get(&candidate.id).copied().unwrap_or_default();
            TallyEntry {
                candidate,
                vote_count,
                percentage: percentage(vote_count, total_votes),
                rank: 0,
            }
        })
        .collect();

    // `sort_by` is stable, so ties stay in declaration order.
    entries.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));

    let mut previous_count = None;
    let mut rank = 0;
    for (position, entry) in entries.iter_mut().enumerate() {
        if previous_count != Some(entry.vote_count) {
            rank = position + 1;
            previous_count = Some(entry.vote_count);
        }
        entry.rank = rank;
    }

    Ok(Tally {
        entries,
        total_votes,
    })
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}
