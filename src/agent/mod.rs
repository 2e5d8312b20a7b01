//! Agent module: the free-text companion and the channel-driven loop.

pub mod agent_loop;
pub mod companion;
pub mod submission;

pub use agent_loop::Agent;
pub use companion::CompanionAgent;
pub use submission::{Submission, SubmissionParser};
