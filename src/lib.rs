//! MIND Companion: conversational mental-health questionnaire.

pub mod agent;
pub mod channels;
pub mod config;
pub mod dashboards;
pub mod error;
pub mod llm;
pub mod prediction;
pub mod server;
pub mod survey;
