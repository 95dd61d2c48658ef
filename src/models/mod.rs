pub mod outcome;
pub mod solution;

pub use outcome::{Credentials, StepOutcome, SubmissionPayload};
pub use solution::{Answer, ProposedSolution};
