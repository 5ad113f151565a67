use crate::error::Result;
use crate::model::{
    common::{Poll, VoterId},
    mongodb::Id,
};

/// Outcome of an attempt to add a ballot at the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallotWrite {
    /// The ballot was stored.
    Recorded,
    /// The voter already had a ballot in this poll; nothing was changed.
    AlreadyVoted,
    /// The poll does not exist.
    PollMissing,
}

/// Durable storage of poll records.
///
/// Implementations only store and fetch; every rule about what may be stored
/// lives in [`crate::engine`] and [`super::PollStore`].
#[rocket::async_trait]
pub trait PollRepository: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Every stored poll, in no particular order.
    async fn load_all(&self) -> Result<Vec<Poll>>;

    async fn load(&self, id: Id) -> Result<Option<Poll>>;

    async fn insert(&self, poll: &Poll) -> Result<()>;

    /// Remove a poll and its ballots. Returns whether anything was removed.
    async fn remove(&self, id: Id) -> Result<bool>;

    /// Add `voter`'s ballot, but only if they have none yet.
    ///
    /// This is a compare-and-swap on the stored record, independent of any
    /// in-process locking.
    async fn record_ballot(&self, id: Id, voter: &VoterId, candidate: Id) -> Result<BallotWrite>;
}
