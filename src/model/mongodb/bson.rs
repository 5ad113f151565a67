use std::fmt::{Display, Formatter};
use std::str::FromStr;

use mongodb::bson::{
    doc,
    oid::{self, ObjectId},
    Document,
};
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};

/// A globally unique identifier for polls and candidates.
///
/// Backed by an [`ObjectId`], but always serialised as its 24-digit hex
/// string, both in the database and over the API, so that stored records
/// and API payloads share one representation.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Id(ObjectId);

impl Id {
    /// Generate a fresh, globally unique ID.
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// A filter document matching the record with this ID.
    pub fn as_doc(&self) -> Document {
        doc! {
            "_id": self.to_string(),
        }
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl FromStr for Id {
    type Err = oid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse::<ObjectId>()?))
    }
}

impl TryFrom<String> for Id {
    type Error = oid::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.to_string()
    }
}

impl From<ObjectId> for Id {
    fn from(id: ObjectId) -> Self {
        Self(id)
    }
}

impl<'a> FromParam<'a> for Id {
    type Error = oid::Error;

    fn from_param(param: &'a str) -> Result<Self, Self::Error> {
        param.parse::<Id>()
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn serialises_as_hex_string() {
        let id: Id = "65a1f0c2e4b0a1b2c3d4e5f6".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"65a1f0c2e4b0a1b2c3d4e5f6\"");
        assert_eq!(serde_json::from_str::<Id>(&json).unwrap(), id);
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!("not-an-id".parse::<Id>().is_err());
        assert!(Id::from_param("65a1f0c2").is_err());
        assert!(serde_json::from_str::<Id>("\"zzzzzzzzzzzzzzzzzzzzzzzz\"").is_err());
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = Id::new();
        let b = Id::new();
        assert_ne!(a, b);
        assert_eq!(a.as_doc(), doc! { "_id": a.to_string() });
    }
}
