//! Questionnaire: the scripted chat that collects the sixteen answers the
//! prediction model needs.
//!
//! The dialogue moves through `intro`, `collecting`, `review`, and
//! `after_prediction`. Transitions live in [`engine`] and never perform I/O;
//! [`SurveyManager`] runs the prediction and companion calls they request.

pub mod engine;
pub mod intent;
pub mod interpret;
pub mod manager;
pub mod model;
pub mod prompts;
pub mod routes;
pub mod schema;
pub mod sessions;
pub mod state;

pub use engine::{Step, Task};
pub use interpret::{Interpretation, Rejection, interpret};
pub use manager::{PendingTask, SurveyDeps, SurveyManager, SurveyStatus, Turn};
pub use model::{ChatMessage, Speaker, Transcript};
pub use routes::{SurveyRouteState, survey_routes};
pub use schema::{FEATURES, FeatureId, FeatureKind, FeatureSchema};
pub use sessions::{SessionStore, SharedSurvey, spawn_pruner};
pub use state::{CollectedAnswers, ConversationState, DialoguePhase};
