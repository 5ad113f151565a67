//! Poll persistence with per-poll write serialisation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rocket::tokio::{sync::Mutex, time::timeout};

use crate::engine;
use crate::error::{Error, Result};
use crate::model::{
    api::poll::PollSpec,
    common::{Poll, VoterId},
    mongodb::Id,
};

mod memory;
mod mongo;
mod repository;

pub use memory::MemoryRepository;
pub use mongo::MongoRepository;
pub use repository::{BallotWrite, PollRepository};

/// Bounds on persistence I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    /// Longest a single repository call may take.
    pub timeout: Duration,
    /// Total attempts for a read that fails transiently. Writes are attempted once.
    pub read_attempts: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(2000),
            read_attempts: 3,
        }
    }
}

/// Map from poll IDs to the lock serialising writes to that poll.
type LockMap = HashMap<Id, Arc<Mutex<()>>>;

/// The collection of polls.
///
/// Reads always go to the repository. Writes to one poll are serialised by
/// a per-poll lock, so the check for an existing ballot and the insertion of
/// a new one cannot interleave within this process; the repository's
/// compare-and-swap covers other processes.
pub struct PollStore {
    repository: Box<dyn PollRepository>,
    locks: Mutex<LockMap>,
    settings: StoreSettings,
}

impl PollStore {
    pub fn new(repository: impl PollRepository + 'static, settings: StoreSettings) -> Self {
        Self {
            repository: Box::new(repository),
            locks: Default::default(),
            settings,
        }
    }

    /// A fresh, empty store held in memory.
    pub fn in_memory() -> Self {
        Self::new(MemoryRepository::new(), StoreSettings::default())
    }

    /// Name of the backing repository.
    pub fn backend(&self) -> &'static str {
        self.repository.name()
    }

    /// All polls, ordered by start time and then ID.
    pub async fn list(&self) -> Result<Vec<Poll>> {
        let mut polls = self.read("list polls", || self.repository.load_all()).await?;
        polls.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(polls)
    }

    /// Get one poll.
    pub async fn get(&self, id: Id) -> Result<Poll> {
        self.read("load poll", || self.repository.load(id))
            .await?
            .ok_or_else(|| Error::not_found(format!("Poll with ID {id}")))
    }

    /// Validate `spec` and store the resulting poll.
    pub async fn create(&self, spec: PollSpec) -> Result<Poll> {
        let poll = spec.into_poll()?;
        self.bounded(self.repository.insert(&poll)).await?;
        info!(
            "Created poll {} \"{}\" with {} candidates",
            poll.id,
            poll.title,
            poll.candidates.len()
        );
        Ok(poll)
    }

    /// Remove a poll together with all of its ballots.
    pub async fn delete(&self, id: Id) -> Result<()> {
        let lock = self.lock_for(id).await;
        let guard = lock.lock().await;
        let removed = self.bounded(self.repository.remove(id)).await;
        drop(guard);
        self.release(id, lock).await;

        if removed? {
            info!("Deleted poll {id}");
            Ok(())
        } else {
            Err(Error::not_found(format!("Poll with ID {id}")))
        }
    }

    /// Record `voter`'s ballot for `candidate` in poll `id`, as of `now`.
    ///
    /// Returns the poll including the new ballot.
    pub async fn cast_vote(
        &self,
        id: Id,
        voter: &VoterId,
        candidate: Id,
        now: DateTime<Utc>,
    ) -> Result<Poll> {
        let lock = self.lock_for(id).await;
        let guard = lock.lock().await;
        let result = self.cast_vote_locked(id, voter, candidate, now).await;
        drop(guard);
        self.release(id, lock).await;
        result
    }

    /// The body of [`Self::cast_vote`], run with the poll's lock held.
    async fn cast_vote_locked(
        &self,
        id: Id,
        voter: &VoterId,
        candidate: Id,
        now: DateTime<Utc>,
    ) -> Result<Poll> {
        let poll = self.get(id).await?;
        let poll = engine::cast_vote(poll, voter, candidate, now).map_err(|rejection| {
            debug!("Vote by {voter} in poll {id} rejected: {rejection}");
            rejection
        })?;

        match self
            .bounded(self.repository.record_ballot(id, voter, candidate))
            .await?
        {
            BallotWrite::Recorded => {
                debug!("Recorded ballot in poll {id}");
                Ok(poll)
            }
            BallotWrite::AlreadyVoted => {
                warn!("Ballot of {voter} in poll {id} was recorded concurrently elsewhere");
                Err(engine::VoteRejection::AlreadyVoted.into())
            }
            BallotWrite::PollMissing => Err(Error::not_found(format!("Poll with ID {id}"))),
        }
    }

    /// Store a poll record exactly as given, bypassing validation.
    #[cfg(test)]
    pub(crate) async fn insert_raw(&self, poll: &Poll) -> Result<()> {
        self.repository.insert(poll).await
    }

    /// The lock for the given poll, created on first use.
    async fn lock_for(&self, id: Id) -> Arc<Mutex<()>> {
        self.locks.lock().await.entry(id).or_default().clone()
    }

    /// Give back a lock obtained from [`Self::lock_for`], forgetting it once
    /// no other task holds or waits on it.
    async fn release(&self, id: Id, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map, one here.
        let idle = Arc::strong_count(&lock) <= 2;
        if idle && locks.get(&id).map_or(false, |held| Arc::ptr_eq(held, &lock)) {
            locks.remove(&id);
        }
    }

    /// Run one repository call under the configured timeout.
    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match timeout(self.settings.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "{} store did not respond within {:?}",
                    self.backend(),
                    self.settings.timeout
                );
                Err(Error::StoreTimeout(self.settings.timeout))
            }
        }
    }

    /// Run a read, retrying transient failures.
    async fn read<T, F, Fut>(&self, what: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.settings.read_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.bounded(call()).await {
                Err(err) if err.is_transient() && attempt < attempts => {
                    warn!("Failed to {what} (attempt {attempt}/{attempts}): {err}");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
