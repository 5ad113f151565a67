use log::info;
use mongodb::{
    bson::{doc, Bson, Document},
    Client, Database,
};
use rocket::futures::TryStreamExt;

use crate::error::Result;
use crate::model::{
    common::{Poll, VoterId},
    mongodb::{Coll, Id},
};

use super::repository::{BallotWrite, PollRepository};

/// A repository storing one MongoDB document per poll, with ballots embedded
/// as a `voterId -> candidateId` sub-document.
#[derive(Clone)]
pub struct MongoRepository {
    polls: Coll<Poll>,
}

impl MongoRepository {
    /// Use the `polls` collection of the given database.
    pub fn new(db: &Database) -> Self {
        Self {
            polls: Coll::from_db(db),
        }
    }

    /// Connect to the given server and check that it responds.
    pub async fn connect(db_uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(db_uri).await?;
        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 }, None).await?;
        info!("Connected to MongoDB database {db_name}");
        Ok(Self::new(&db))
    }
}

/// Path of a voter's entry inside the ballots sub-document.
fn ballot_path(voter: &VoterId) -> String {
    format!("ballots.{}", voter.storage_key())
}

/// Filter and update recording `voter`'s ballot in poll `id`. The filter only
/// matches while the voter has no ballot, so at most one write succeeds.
fn ballot_cas(id: Id, voter: &VoterId, candidate: Id) -> (Document, Document) {
    let path = ballot_path(voter);
    let filter = doc! {
        "_id": id.to_string(),
        &path: { "$exists": false },
    };
    let update = doc! {
        "$set": { &path: Bson::String(candidate.to_string()) },
    };
    (filter, update)
}

#[rocket::async_trait]
impl PollRepository for MongoRepository {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn load_all(&self) -> Result<Vec<Poll>> {
        let polls: Vec<Poll> = self.polls.find(None, None).await?.try_collect().await?;
        Ok(polls)
    }

    async fn load(&self, id: Id) -> Result<Option<Poll>> {
        Ok(self.polls.find_one(id.as_doc(), None).await?)
    }

    async fn insert(&self, poll: &Poll) -> Result<()> {
        self.polls.insert_one(poll, None).await?;
        Ok(())
    }

    async fn remove(&self, id: Id) -> Result<bool> {
        let result = self.polls.delete_one(id.as_doc(), None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn record_ballot(&self, id: Id, voter: &VoterId, candidate: Id) -> Result<BallotWrite> {
        let (filter, update) = ballot_cas(id, voter, candidate);
        let result = self.polls.update_one(filter, update, None).await?;
        if result.matched_count > 0 {
            return Ok(BallotWrite::Recorded);
        }

        // Lost the swap: either the ballot exists or the poll does not.
        let exists = self.polls.count_documents(id.as_doc(), None).await? > 0;
        Ok(if exists {
            BallotWrite::AlreadyVoted
        } else {
            BallotWrite::PollMissing
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ballot_paths() {
        let voter = VoterId::try_from("auth0|abc").unwrap();
        assert_eq!(ballot_path(&voter), "ballots.auth0|abc");

        let voter = VoterId::try_from("jane.doe@example.com").unwrap();
        assert_eq!(ballot_path(&voter), "ballots.jane%2Edoe@example%2Ecom");
    }

    #[test]
    fn ballot_write_only_matches_without_a_ballot() {
        let poll = Id::new();
        let candidate = Id::new();
        let voter = VoterId::try_from("auth0|abc").unwrap();

        let (filter, update) = ballot_cas(poll, &voter, candidate);
        assert_eq!(
            filter,
            doc! {
                "_id": poll.to_string(),
                "ballots.auth0|abc": { "$exists": false },
            }
        );
        assert_eq!(
            update,
            doc! {
                "$set": { "ballots.auth0|abc": candidate.to_string() },
            }
        );
    }

    /// Runs against the server at `TALLY_TEST_DB_URI` (default localhost),
    /// in a throwaway database that is dropped afterwards.
    #[rocket::async_test]
    #[ignore = "needs a running MongoDB server"]
    async fn second_ballot_loses_the_swap() {
        let uri = std::env::var("TALLY_TEST_DB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db_name = format!("tally_test_{}", Id::new());
        let repo = MongoRepository::connect(&uri, &db_name).await.unwrap();

        let poll = Poll::example();
        let a = poll.candidate_id("A");
        let b = poll.candidate_id("B");
        let voter = VoterId::try_from("jane.doe@example.com").unwrap();
        repo.insert(&poll).await.unwrap();

        let first = repo.record_ballot(poll.id, &voter, a).await;
        let second = repo.record_ballot(poll.id, &voter, b).await;
        let missing = repo.record_ballot(Id::new(), &voter, a).await;
        let stored = repo.load(poll.id).await;

        let client = mongodb::Client::with_uri_str(&uri).await.unwrap();
        client.database(&db_name).drop(None).await.unwrap();

        assert_eq!(first.unwrap(), BallotWrite::Recorded);
        assert_eq!(second.unwrap(), BallotWrite::AlreadyVoted);
        assert_eq!(missing.unwrap(), BallotWrite::PollMissing);
        assert_eq!(stored.unwrap().unwrap().ballot(&voter), Some(a));
    }
}
