mod desc;
mod results;
mod spec;

pub use desc::{PollDescription, PollSummary};
pub use results::{PollResults, Standing};
pub use spec::{CandidateSpec, PollSpec, ValidationError, Violation};
