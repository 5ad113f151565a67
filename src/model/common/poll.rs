use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{common::VoterId, mongodb::Id};

/// A single option a voter may select within a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Unique within the poll.
    pub id: Id,
    pub name: String,
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// A poll record, exactly as persisted.
///
/// The status is deliberately absent: it is derived from the clock on every
/// read, see [`crate::engine::status_at`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    /// Unique ID.
    #[serde(rename = "_id")]
    pub id: Id,
    pub title: String,
    pub description: String,
    /// Voting opens at this instant (inclusive).
    pub start_time: DateTime<Utc>,
    /// Voting closes after this instant (inclusive).
    pub end_time: DateTime<Utc>,
    /// Candidates in their declared order, which is also the ranking tie-break.
    pub candidates: Vec<Candidate>,
    /// Ballots: voter to chosen candidate. At most one per voter.
    #[serde(default, with = "ballot_map")]
    pub ballots: HashMap<VoterId, Id>,
}

/// Ballot maps are keyed by [`VoterId::storage_key`].
mod ballot_map {
    use std::collections::HashMap;

    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use crate::model::{common::VoterId, mongodb::Id};

    pub fn serialize<S: Serializer>(
        ballots: &HashMap<VoterId, Id>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            ballots
                .iter()
                .map(|(voter, candidate)| (voter.storage_key(), candidate)),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<VoterId, Id>, D::Error> {
        HashMap::<String, Id>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, candidate)| {
                VoterId::from_storage_key(&key)
                    .map(|voter| (voter, candidate))
                    .map_err(|err| D::Error::custom(format!("{err}: {key}")))
            })
            .collect()
    }
}

impl Poll {
    /// Find a candidate by ID.
    pub fn candidate(&self, candidate_id: Id) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == candidate_id)
    }

    /// The candidate the given voter chose, if they have voted.
    pub fn ballot(&self, voter: &VoterId) -> Option<Id> {
        self.ballots.get(voter).copied()
    }

    pub fn has_voted(&self, voter: &VoterId) -> bool {
        self.ballots.contains_key(voter)
    }

    /// Number of ballots cast.
    pub fn total_votes(&self) -> usize {
        self.ballots.len()
    }
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::{serde_json, serde_json::json};

    use super::*;

    #[test]
    fn persisted_layout() {
        let mut poll = Poll::example();
        let voter = VoterId::try_from("v1").unwrap();
        let b = poll.candidate_id("B");
        poll.ballots.insert(voter.clone(), b);

        let value = serde_json::to_value(&poll).unwrap();
        assert_eq!(value["_id"], json!(poll.id.to_string()));
        assert_eq!(value["startTime"], json!("2024-01-01T00:00:00Z"));
        assert_eq!(value["endTime"], json!("2024-01-02T00:00:00Z"));
        assert_eq!(value["ballots"]["v1"], json!(b.to_string()));
        assert!(value.get("status").is_none());
        assert!(value["candidates"][0].get("photoUrl").is_none());

        let restored: Poll = serde_json::from_value(value).unwrap();
        assert_eq!(restored, poll);
        assert_eq!(restored.ballot(&voter), Some(b));
    }

    #[test]
    fn ballot_keys_are_escaped() {
        let mut poll = Poll::example();
        let voter = VoterId::try_from("jane.doe@example.com").unwrap();
        let a = poll.candidate_id("A");
        poll.ballots.insert(voter.clone(), a);

        let value = serde_json::to_value(&poll).unwrap();
        assert_eq!(
            value["ballots"],
            json!({ "jane%2Edoe@example%2Ecom": a.to_string() })
        );
        let restored: Poll = serde_json::from_value(value).unwrap();
        assert_eq!(restored.ballot(&voter), Some(a));
    }

    #[test]
    fn malformed_ballot_key_is_rejected() {
        let mut value = serde_json::to_value(Poll::example()).unwrap();
        value["ballots"] = json!({ "bad%zz": Id::new().to_string() });
        assert!(serde_json::from_value::<Poll>(value).is_err());
    }

    #[test]
    fn missing_ballots_default_to_empty() {
        let poll = Poll::example();
        let mut value = serde_json::to_value(&poll).unwrap();
        value.as_object_mut().unwrap().remove("ballots");
        let restored: Poll = serde_json::from_value(value).unwrap();
        assert_eq!(restored.total_votes(), 0);
    }

    #[test]
    fn lookups() {
        let poll = Poll::example();
        let a = poll.candidate_id("A");
        assert_eq!(poll.candidate(a).map(|c| c.name.as_str()), Some("A"));
        assert!(poll.candidate(Id::new()).is_none());
        assert!(!poll.has_voted(&VoterId::try_from("nobody").unwrap()));
    }
}
