use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest voter identifier we will accept from the identity provider.
pub const MAX_VOTER_ID_LEN: usize = 256;

/// A stable, unique voter identifier as supplied by the identity provider.
///
/// Any non-empty string without NUL is accepted. Voter IDs become keys of a
/// poll's ballot document, where they are stored escaped, see
/// [`VoterId::storage_key`].
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct VoterId(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidVoterId {
    #[error("voter ID is empty")]
    Empty,
    #[error("voter ID is longer than {} bytes", MAX_VOTER_ID_LEN)]
    TooLong,
    #[error("voter ID contains a NUL character")]
    ContainsNul,
    #[error("malformed escape in stored voter ID")]
    BadEscape,
}

/// Characters MongoDB gives meaning to inside field names, and their escapes.
/// `%` comes first so that escaping is reversible.
const ESCAPES: [(char, &str); 3] = [('%', "%25"), ('.', "%2E"), ('$', "%24")];

impl VoterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The form used as a key in persisted ballot maps: `%`, `.` and `$` are
    /// percent-encoded so the key is never read as a path or an operator.
    pub fn storage_key(&self) -> String {
        let mut key = String::with_capacity(self.0.len());
        for c in self.0.chars() {
            match ESCAPES.iter().find(|(raw, _)| *raw == c) {
                Some((_, escaped)) => key.push_str(escaped),
                None => key.push(c),
            }
        }
        key
    }

    /// Inverse of [`VoterId::storage_key`].
    pub fn from_storage_key(key: &str) -> Result<Self, InvalidVoterId> {
        let mut id = String::with_capacity(key.len());
        let mut rest = key;
        while let Some(at) = rest.find('%') {
            id.push_str(&rest[..at]);
            let escape = rest.get(at..at + 3).ok_or(InvalidVoterId::BadEscape)?;
            let (raw, _) = ESCAPES
                .iter()
                .find(|(_, escaped)| escaped.eq_ignore_ascii_case(escape))
                .ok_or(InvalidVoterId::BadEscape)?;
            id.push(*raw);
            rest = &rest[at + 3..];
        }
        id.push_str(rest);
        Self::try_from(id)
    }
}

impl TryFrom<String> for VoterId {
    type Error = InvalidVoterId;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        if id.is_empty() {
            return Err(InvalidVoterId::Empty);
        }
        if id.len() > MAX_VOTER_ID_LEN {
            return Err(InvalidVoterId::TooLong);
        }
        if id.contains('\0') {
            return Err(InvalidVoterId::ContainsNul);
        }
        Ok(Self(id))
    }
}

impl TryFrom<&str> for VoterId {
    type Error = InvalidVoterId;

    fn try_from(id: &str) -> Result<Self, Self::Error> {
        Self::try_from(id.to_string())
    }
}

impl From<VoterId> for String {
    fn from(id: VoterId) -> Self {
        id.0
    }
}

impl Display for VoterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_provider_identifiers() {
        for id in [
            "voter1",
            "auth0|5f7c8ec7c33c6c004bbafe82",
            "jane.doe@example.com",
            "$admin",
        ] {
            assert_eq!(VoterId::try_from(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn rejects_unusable_identifiers() {
        assert_eq!(VoterId::try_from(""), Err(InvalidVoterId::Empty));
        assert_eq!(
            VoterId::try_from("a".repeat(MAX_VOTER_ID_LEN + 1)),
            Err(InvalidVoterId::TooLong)
        );
        assert_eq!(
            VoterId::try_from("nul\0byte"),
            Err(InvalidVoterId::ContainsNul)
        );
    }

    #[test]
    fn storage_keys_hide_dots_and_dollars() {
        let cases = [
            ("auth0|abc", "auth0|abc"),
            ("jane.doe@example.com", "jane%2Edoe@example%2Ecom"),
            ("$where", "%24where"),
            ("100%.", "100%25%2E"),
        ];
        for (id, key) in cases {
            let voter = VoterId::try_from(id).unwrap();
            assert_eq!(voter.storage_key(), key);
            assert_eq!(VoterId::from_storage_key(key), Ok(voter));
        }
    }

    #[test]
    fn rejects_malformed_storage_keys() {
        for key in ["50%", "%2", "%41", ""] {
            assert!(VoterId::from_storage_key(key).is_err(), "{key}");
        }
        assert_eq!(
            VoterId::from_storage_key("a%2eb").unwrap().as_str(),
            "a.b"
        );
    }
}
