//! Assistant-facing text for the questionnaire.

use super::interpret::Rejection;
use super::schema::{FeatureKind, FeatureSchema, features};
use super::state::CollectedAnswers;
use crate::error::PredictionError;
use crate::prediction::{PredictionResult, format_percentage};

/// The three introduction messages shown at the start and after a restart.
pub const INTRO_MESSAGES: [&str; 3] = [
    "Hi, I'm MIND Companion, a mental health chatbot focusing on depression and anxiety.",
    "I can guide you through a questionnaire and show your depression/anxiety prediction.",
    "Would you like to start the prediction now?",
];

pub const BEGIN_MESSAGE: &str =
    "Great, we'll go through a short set of questions. Please answer as honestly as you can.";

pub const NOTHING_TO_CHANGE: &str =
    "We haven't recorded any answers yet to change. Let's start from the first question.";

pub const NO_NUMBER: &str =
    "I couldn't find a clear number in that. Could you reply with a single number for this question?";

pub const NO_OPTION: &str = "I couldn't match that answer to one of the options. Please type the number or a short phrase that fits best.";

pub const RESTART_OFFER: &str = "If you'd like, I can restart the questionnaire so you can try different answers.\nType \"restart\" or \"start again\" to begin a new run, or you can just keep chatting about how you feel.";

pub const DECLINE_ACK: &str =
    "Okay, we'll keep your current results. You can still ask me questions about how you're feeling.";

pub const BUSY: &str = "I'm still working on your last message. Please wait a moment.";

pub const PREDICTION_NOT_CONFIGURED: &str =
    "The prediction service is not configured yet. Please contact the developer.";

pub const PREDICTION_UNREACHABLE: &str =
    "I couldn't reach the prediction service just now. Please try again a bit later.";

pub const PREDICTION_FAILED: &str =
    "I'm sorry, the prediction service had a problem. Please try again later.";

/// Status line while the prediction request is outstanding.
pub const PREDICTING_STATUS: &str = "Calculating your depression and anxiety probabilities...";

/// Status line while the companion is answering.
pub const THINKING_STATUS: &str = "Thinking...";

/// Static "facts about anxiety and depression".
pub const FACTS: [&str; 5] = [
    "Age group of 18-29 are more prone to Anxiety/Depression than other age groups.",
    "Physical Health Status is crucial, as depleting health can lead to Depression/Anxiety.",
    "People who received emotional or social support rarely showed most depression/anxiety cases.",
    "People who slept very low or very high showed signs of Depression/Anxiety more.",
    "People dissatisfied towards their life showed more sign of Depression/Anxiety.",
];

/// Question text followed by the answer format: one `"<code>. <label>"`
/// line per option for categorical entries, a unit hint for numeric ones.
pub fn question(schema: &FeatureSchema) -> String {
    let mut lines = vec![schema.question.to_string()];
    match schema.kind {
        FeatureKind::Categorical { options } => {
            lines.extend(options.iter().map(|o| format!("{}. {}", o.code, o.label)));
            lines.push("You can reply with the number or a short phrase.".to_string());
        }
        FeatureKind::Numeric { unit: Some(unit), .. } => {
            lines.push(format!("You can reply with a single number ({unit})."));
        }
        FeatureKind::Numeric { unit: None, .. } => {}
    }
    lines.join("\n")
}

/// Re-prompt for a rejected reply.
pub fn clarify(rejection: Rejection) -> String {
    match rejection {
        Rejection::NoNumber => NO_NUMBER.to_string(),
        Rejection::OutOfRange { min, max } => {
            format!("That number is outside the expected range. Please reply with a number between {min} and {max}.")
        }
        Rejection::NoOption => NO_OPTION.to_string(),
    }
}

/// Echo for a best-guess categorical match.
pub fn interpreted_as(label: &str) -> String {
    format!(
        "I'll interpret your answer as \"{label}\". If that's not right, please type \"change my last answer\"."
    )
}

/// Acknowledgement before re-asking a feature named in an edit request.
pub fn edit_named(schema: &FeatureSchema) -> String {
    format!("Sure, let's update your {}.", schema.label)
}

/// Acknowledgement before re-asking the most recent answer.
pub fn edit_last(schema: &FeatureSchema) -> String {
    format!("No problem, let's update your {}.", schema.label)
}

/// One line per recorded answer in question order, then the edit and
/// confirm instructions.
pub fn review_summary(answers: &CollectedAnswers) -> String {
    let mut text = String::from("Here's a quick summary of what I recorded:");
    for schema in features() {
        if let Some(&value) = answers.get(&schema.id) {
            text.push_str(&format!("\n- {}: {}", schema.label, schema.describe_value(value)));
        }
    }
    text.push_str(
        "\n\nIf you'd like to change anything, you can say things like:\n\
         - \"change my last answer\"\n\
         - \"change my life satisfaction\", \"edit my region\", etc.\n\n\
         When everything looks right, you can type \"confirm\", \"ok\", or \"looks good\" and I'll run the prediction.",
    );
    text
}

/// Both percentages plus the advisory for the larger probability.
pub fn scores(result: &PredictionResult) -> String {
    format!(
        "Your prediction scores are:\n\n\
         • Anxiety: {}\n\
         • Depression: {}\n\n\
         Suggestion: {}",
        format_percentage(result.anxiety_probability),
        format_percentage(result.depression_probability),
        result.severity().advisory()
    )
}

/// User-visible text for a failed prediction.
pub fn prediction_failure(error: &PredictionError) -> &'static str {
    match error {
        PredictionError::NotConfigured => PREDICTION_NOT_CONFIGURED,
        PredictionError::Unreachable { .. } => PREDICTION_UNREACHABLE,
        PredictionError::HttpStatus { .. } | PredictionError::InvalidResponse { .. } => {
            PREDICTION_FAILED
        }
    }
}

/// Companion context after a prediction: the last result as JSON.
pub fn prediction_context(result: &PredictionResult) -> String {
    let json = serde_json::to_string(result).unwrap_or_default();
    format!("Their last prediction was: {json}")
}

/// Inline help for a feature, if it has any.
pub fn info(schema: &FeatureSchema) -> String {
    match schema.info {
        Some(info) => format!("About {}: {info}", schema.label),
        None => format!("There is no extra information for the {} question.", schema.label),
    }
}
