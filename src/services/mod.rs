pub mod llm_service;
pub mod response_interpreter;
pub mod submission_service;

pub use llm_service::LlmService;
pub use response_interpreter::interpret;
pub use submission_service::SubmissionService;
