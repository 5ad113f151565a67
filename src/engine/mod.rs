//! Pure poll rules: status derivation, vote validation and tallying.
//!
//! Nothing here touches storage or the clock; the caller supplies `now`.

mod status;
mod tally;
mod vote;

pub use status::status_at;
pub use tally::{tally, InconsistentBallot, Tally, TallyEntry};
pub use vote::{cast_vote, VoteRejection};
