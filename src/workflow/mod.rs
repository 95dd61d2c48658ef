pub mod prompt;
pub mod quiz_step;
pub mod step_ctx;

pub use quiz_step::{Capabilities, QuizStep, StepLimits};
pub use step_ctx::StepCtx;
