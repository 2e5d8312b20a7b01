//! Phase grammar: what a reply means given the current dialogue phase.
//!
//! Anything that is not recognized comes back as [`Intent::Other`]; in
//! `collecting` that is an answer attempt, elsewhere it goes to the companion.

use super::interpret::{contains_phrase, normalize};
use super::schema::{FeatureId, features};
use super::state::DialoguePhase;

/// Words that start the questionnaire from the introduction.
const AFFIRMATIVE_WORDS: &[&str] = &["yes", "start", "ok", "okay", "sure", "begin"];

/// Replies that are a confirmation only when they are the whole message.
const CONFIRM_EXACT: &[&str] = &["confirm", "ok", "okay"];

/// Phrases that confirm the review summary anywhere in the message.
const CONFIRM_PHRASES: &[&str] = &["looks good", "go ahead", "yes"];

const CHANGE_LAST_PHRASE: &str = "change my last answer";

const RESTART_PHRASES: &[&str] = &["restart", "start again"];

const DECLINE_PHRASES: &[&str] = &["not now", "later"];

/// Interpreted meaning of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Intro: agreed to start the questionnaire.
    Affirm,
    /// Review: run the prediction.
    Confirm,
    /// Collecting or review: re-ask the most recently answered feature.
    ChangeLast,
    /// Review: re-ask a feature named by keyword.
    Edit(FeatureId),
    /// After prediction: start over.
    Restart,
    /// After prediction: keep the current results.
    Decline,
    /// Not part of the phase grammar.
    Other,
}

impl Intent {
    /// Classify `text` against the grammar of `phase`.
    pub fn parse(phase: DialoguePhase, text: &str) -> Self {
        let lower = normalize(text);
        match phase {
            DialoguePhase::Intro => parse_intro(&lower),
            DialoguePhase::Collecting => parse_collecting(&lower),
            DialoguePhase::Review => parse_review(&lower),
            DialoguePhase::AfterPrediction => parse_after_prediction(&lower),
        }
    }
}

fn parse_intro(lower: &str) -> Intent {
    if contains_any(lower, AFFIRMATIVE_WORDS) {
        Intent::Affirm
    } else {
        Intent::Other
    }
}

fn parse_collecting(lower: &str) -> Intent {
    if lower.contains(CHANGE_LAST_PHRASE) {
        Intent::ChangeLast
    } else {
        Intent::Other
    }
}

fn parse_review(lower: &str) -> Intent {
    if CONFIRM_EXACT.contains(&lower) || contains_any(lower, CONFIRM_PHRASES) {
        return Intent::Confirm;
    }
    if lower.contains(CHANGE_LAST_PHRASE) {
        return Intent::ChangeLast;
    }
    match edit_target(lower) {
        Some(feature) => Intent::Edit(feature),
        None => Intent::Other,
    }
}

fn parse_after_prediction(lower: &str) -> Intent {
    if contains_any(lower, RESTART_PHRASES) {
        Intent::Restart
    } else if lower == "no" || contains_any(lower, DECLINE_PHRASES) {
        Intent::Decline
    } else {
        Intent::Other
    }
}

/// First feature, in question order, whose edit keyword appears in the text.
pub fn edit_target(lower: &str) -> Option<FeatureId> {
    features()
        .find(|schema| contains_any(lower, schema.edit_keywords))
        .map(|schema| schema.id)
}

fn contains_any(lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(lower, p))
}
