use std::collections::hash_map::Entry;
use std::collections::HashMap;

use rocket::tokio::sync::RwLock;

use crate::error::Result;
use crate::model::{
    common::{Poll, VoterId},
    mongodb::Id,
};

use super::repository::{BallotWrite, PollRepository};

/// A repository that keeps polls in process memory. Nothing survives a
/// restart; used for development and tests.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    polls: RwLock<HashMap<Id, Poll>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl PollRepository for MemoryRepository {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load_all(&self) -> Result<Vec<Poll>> {
        Ok(self.polls.read().await.values().cloned().collect())
    }

    async fn load(&self, id: Id) -> Result<Option<Poll>> {
        Ok(self.polls.read().await.get(&id).cloned())
    }

    async fn insert(&self, poll: &Poll) -> Result<()> {
        self.polls.write().await.insert(poll.id, poll.clone());
        Ok(())
    }

    async fn remove(&self, id: Id) -> Result<bool> {
        Ok(self.polls.write().await.remove(&id).is_some())
    }

    async fn record_ballot(&self, id: Id, voter: &VoterId, candidate: Id) -> Result<BallotWrite> {
        let mut polls = self.polls.write().await;
        let Some(poll) = polls.get_mut(&id) else {
            return Ok(BallotWrite::PollMissing);
        };
        Ok(match poll.ballots.entry(voter.clone()) {
            Entry::Occupied(_) => BallotWrite::AlreadyVoted,
            Entry::Vacant(entry) => {
                entry.insert(candidate);
                BallotWrite::Recorded
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rocket::async_test]
    async fn ballots_are_compare_and_swap() {
        let repo = MemoryRepository::new();
        let poll = Poll::example();
        let a = poll.candidate_id("A");
        let b = poll.candidate_id("B");
        repo.insert(&poll).await.unwrap();

        let voter = VoterId::try_from("v1").unwrap();
        assert_eq!(
            repo.record_ballot(poll.id, &voter, a).await.unwrap(),
            BallotWrite::Recorded
        );
        assert_eq!(
            repo.record_ballot(poll.id, &voter, b).await.unwrap(),
            BallotWrite::AlreadyVoted
        );
        assert_eq!(
            repo.record_ballot(Id::new(), &voter, a).await.unwrap(),
            BallotWrite::PollMissing
        );

        let stored = repo.load(poll.id).await.unwrap().unwrap();
        assert_eq!(stored.ballot(&voter), Some(a));
    }

    #[rocket::async_test]
    async fn remove_reports_presence() {
        let repo = MemoryRepository::new();
        let poll = Poll::example();
        repo.insert(&poll).await.unwrap();
        assert!(repo.remove(poll.id).await.unwrap());
        assert!(!repo.remove(poll.id).await.unwrap());
        assert!(repo.load_all().await.unwrap().is_empty());
    }
}
