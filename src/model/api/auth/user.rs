use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// A kind of user of our application, having defined rights.
///
/// Users are managed by the external identity provider; these types only
/// select which rights an [`AuthToken`](super::AuthToken) must carry.
pub trait User {
    /// The rights of this user type.
    const RIGHTS: Rights;
}

/// Different privilege levels.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rights {
    Voter,
    Admin,
}

impl Display for Rights {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Voter => "voter",
                Self::Admin => "admin",
            }
        )
    }
}

/// Someone who may create and delete polls.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

/// Someone who may cast ballots.
#[derive(Debug, Clone, Copy)]
pub struct Voter;

impl User for Admin {
    const RIGHTS: Rights = Rights::Admin;
}

impl User for Voter {
    const RIGHTS: Rights = Rights::Voter;
}
