//! Types shared between the API, the database, and the election engine.

mod poll;
mod status;
mod voter;

pub use poll::{Candidate, Poll};
pub use status::PollStatus;
pub use voter::{InvalidVoterId, VoterId};
