//! Dialogue transitions.
//!
//! Every handler is a function of `(state, input)` that mutates the
//! conversation state and returns the assistant messages to append, plus at
//! most one remote [`Task`] the caller must run before accepting more input.
//! Nothing here performs I/O.

use super::interpret::{Interpretation, interpret};
use super::intent::Intent;
use super::model::ChatMessage;
use super::prompts;
use super::schema::{FeatureId, FeatureSchema};
use super::state::{CollectedAnswers, ConversationState, DialoguePhase};
use crate::error::PredictionError;
use crate::prediction::PredictionResult;

/// Remote work requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    /// Submit the full answer mapping to the prediction endpoint.
    Predict(CollectedAnswers),
    /// Ask the companion about a message outside the phase grammar.
    Consult {
        text: String,
        context: Option<String>,
    },
}

impl Task {
    /// Status line to show while the task runs.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Predict(_) => prompts::PREDICTING_STATUS,
            Self::Consult { .. } => prompts::THINKING_STATUS,
        }
    }
}

/// Output of one transition.
#[derive(Debug, Default)]
pub struct Step {
    pub replies: Vec<ChatMessage>,
    pub task: Option<Task>,
}

impl Step {
    fn reply(replies: Vec<ChatMessage>) -> Self {
        Self {
            replies,
            task: None,
        }
    }

    fn task(task: Task) -> Self {
        Self {
            replies: Vec::new(),
            task: Some(task),
        }
    }
}

/// Handle one user message in the current phase.
pub fn step(state: &mut ConversationState, input: &str) -> Step {
    let intent = Intent::parse(state.phase, input);
    tracing::debug!(phase = %state.phase, ?intent, "Handling reply");

    match (state.phase, intent) {
        (DialoguePhase::Intro, Intent::Affirm) => Step::reply(begin(state)),
        (DialoguePhase::Intro, _) => consult(input, None),

        (DialoguePhase::Collecting, Intent::ChangeLast) => Step::reply(change_last(state)),
        (DialoguePhase::Collecting, _) => Step::reply(answer(state, input)),

        (DialoguePhase::Review, Intent::Confirm) => {
            Step::task(Task::Predict(state.answers.clone()))
        }
        (DialoguePhase::Review, Intent::ChangeLast) => Step::reply(change_last(state)),
        (DialoguePhase::Review, Intent::Edit(feature)) => {
            Step::reply(start_edit(state, feature, prompts::edit_named))
        }
        (DialoguePhase::Review, _) => consult(input, None),

        (DialoguePhase::AfterPrediction, Intent::Restart) => Step::reply(reset(state)),
        (DialoguePhase::AfterPrediction, Intent::Decline) => {
            Step::reply(vec![ChatMessage::assistant(prompts::DECLINE_ACK)])
        }
        (DialoguePhase::AfterPrediction, _) => {
            let context = state.prediction.as_ref().map(prompts::prediction_context);
            consult(input, context)
        }
    }
}

/// Start the questionnaire from scratch, from any phase.
pub fn begin(state: &mut ConversationState) -> Vec<ChatMessage> {
    state.reset();
    state.enter(DialoguePhase::Collecting);
    vec![
        ChatMessage::assistant(prompts::BEGIN_MESSAGE),
        ask(FeatureId::Age.schema()),
    ]
}

/// Clear answers and prediction and replay the introduction.
pub fn reset(state: &mut ConversationState) -> Vec<ChatMessage> {
    state.reset();
    intro_messages()
}

pub fn intro_messages() -> Vec<ChatMessage> {
    prompts::INTRO_MESSAGES
        .iter()
        .map(|text| ChatMessage::assistant(*text))
        .collect()
}

/// Apply the outcome of a [`Task::Predict`].
///
/// Success moves review to after_prediction; failure leaves the state
/// untouched so a later confirmation resubmits.
pub fn resolve_prediction(
    state: &mut ConversationState,
    outcome: Result<PredictionResult, PredictionError>,
) -> Vec<ChatMessage> {
    if state.phase != DialoguePhase::Review {
        tracing::warn!(phase = %state.phase, "Discarding prediction outcome outside review");
        return Vec::new();
    }

    match outcome {
        Ok(result) => {
            state.prediction = Some(result);
            state.enter(DialoguePhase::AfterPrediction);
            vec![
                ChatMessage::assistant(prompts::scores(&result)),
                ChatMessage::assistant(prompts::RESTART_OFFER),
            ]
        }
        Err(e) => {
            tracing::warn!("Prediction failed: {}", e);
            vec![ChatMessage::assistant(prompts::prediction_failure(&e))]
        }
    }
}

fn consult(text: &str, context: Option<String>) -> Step {
    Step::task(Task::Consult {
        text: text.to_string(),
        context,
    })
}

fn ask(schema: &FeatureSchema) -> ChatMessage {
    ChatMessage::question(schema.id, prompts::question(schema))
}

/// Interpret a reply to the active question.
fn answer(state: &mut ConversationState, input: &str) -> Vec<ChatMessage> {
    let Some(feature) = state.active_feature() else {
        // Nothing pending: every entry is answered.
        return enter_review(state);
    };
    let schema = feature.schema();

    let mut replies = Vec::new();
    match interpret(schema, input) {
        Interpretation::NoMatch(rejection) => {
            tracing::debug!(%feature, ?rejection, "Reply not accepted");
            return vec![ChatMessage::assistant(prompts::clarify(rejection)), ask(schema)];
        }
        Interpretation::Exact { value, .. } => state.record(feature, value),
        Interpretation::Interpreted { value, label } => {
            state.record(feature, value);
            replies.push(ChatMessage::assistant(prompts::interpreted_as(label)));
        }
    }

    // An edit ends with the first valid value.
    state.editing = None;
    match state.first_unanswered() {
        None => replies.extend(enter_review(state)),
        Some(next) => replies.push(ask(next.schema())),
    }
    replies
}

fn enter_review(state: &mut ConversationState) -> Vec<ChatMessage> {
    state.enter(DialoguePhase::Review);
    vec![ChatMessage::assistant(prompts::review_summary(&state.answers))]
}

/// Re-ask the most recently recorded feature.
fn change_last(state: &mut ConversationState) -> Vec<ChatMessage> {
    match state.last_answered {
        Some(feature) => start_edit(state, feature, prompts::edit_last),
        None => {
            let mut replies = vec![ChatMessage::assistant(prompts::NOTHING_TO_CHANGE)];
            if let Some(pending) = state.active_feature() {
                replies.push(ask(pending.schema()));
            }
            replies
        }
    }
}

fn start_edit(
    state: &mut ConversationState,
    feature: FeatureId,
    ack: fn(&FeatureSchema) -> String,
) -> Vec<ChatMessage> {
    if state.phase != DialoguePhase::Collecting {
        state.enter(DialoguePhase::Collecting);
    }
    state.editing = Some(feature);
    tracing::debug!(%feature, "Editing answer");

    let schema = feature.schema();
    vec![ChatMessage::assistant(ack(schema)), ask(schema)]
}
