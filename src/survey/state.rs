//! Dialogue state machine: tracks which phase the conversation is in and
//! what has been collected so far.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schema::{FEATURES, FeatureId};
use crate::prediction::PredictionResult;

/// Recorded answers, feature id to integer value. Iterates in question order.
pub type CollectedAnswers = BTreeMap<FeatureId, i64>;

/// Phases of the scripted dialogue.
///
/// Intro → Collecting → Review → AfterPrediction, with Review → Collecting
/// for edits and AfterPrediction → Intro for a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DialoguePhase {
    #[default]
    Intro,
    Collecting,
    Review,
    AfterPrediction,
}

impl DialoguePhase {
    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: DialoguePhase) -> bool {
        use DialoguePhase::*;
        matches!(
            (self, target),
            (Intro, Collecting)
                | (Collecting, Review)
                | (Review, Collecting)
                | (Review, AfterPrediction)
                | (AfterPrediction, Intro)
        )
    }
}

impl std::fmt::Display for DialoguePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Intro => "intro",
            Self::Collecting => "collecting",
            Self::Review => "review",
            Self::AfterPrediction => "after_prediction",
        };
        write!(f, "{s}")
    }
}

/// Conversation state handed to every transition.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationState {
    pub phase: DialoguePhase,
    pub answers: CollectedAnswers,
    /// Feature being re-asked because the user asked to change it.
    pub editing: Option<FeatureId>,
    /// Most recently recorded feature ("change my last answer").
    pub last_answered: Option<FeatureId>,
    pub prediction: Option<PredictionResult>,
}

impl ConversationState {
    /// Move to `target`, logging transitions the dialogue never takes.
    pub fn enter(&mut self, target: DialoguePhase) {
        if self.phase != target && !self.phase.can_transition_to(target) {
            tracing::warn!(from = %self.phase, to = %target, "Unexpected dialogue transition");
        }
        tracing::debug!(from = %self.phase, to = %target, "Dialogue phase change");
        self.phase = target;
    }

    /// First schema entry without a recorded answer.
    pub fn first_unanswered(&self) -> Option<FeatureId> {
        FEATURES
            .iter()
            .map(|s| s.id)
            .find(|id| !self.answers.contains_key(id))
    }

    /// Feature the next reply answers: the edit target if an edit is in
    /// progress, otherwise the first unanswered entry.
    pub fn active_feature(&self) -> Option<FeatureId> {
        if self.phase != DialoguePhase::Collecting {
            return None;
        }
        self.editing.or_else(|| self.first_unanswered())
    }

    /// Whether every schema entry has an answer.
    pub fn is_complete(&self) -> bool {
        self.first_unanswered().is_none()
    }

    /// Record a value for `feature`.
    pub fn record(&mut self, feature: FeatureId, value: i64) {
        self.answers.insert(feature, value);
        self.last_answered = Some(feature);
    }

    /// Clear answers, edit target, and prediction, back to intro.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        use DialoguePhase::*;
        let transitions = [
            (Intro, Collecting),
            (Collecting, Review),
            (Review, Collecting),
            (Review, AfterPrediction),
            (AfterPrediction, Intro),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use DialoguePhase::*;
        assert!(!Intro.can_transition_to(Review));
        assert!(!Collecting.can_transition_to(AfterPrediction));
        assert!(!AfterPrediction.can_transition_to(Review));
        assert!(!Review.can_transition_to(Review));
    }

    #[test]
    fn display_matches_serde() {
        use DialoguePhase::*;
        for phase in [Intro, Collecting, Review, AfterPrediction] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{phase}\""), json);
        }
    }

    #[test]
    fn active_feature_is_first_unanswered() {
        let mut state = ConversationState::default();
        assert_eq!(state.active_feature(), None);

        state.enter(DialoguePhase::Collecting);
        assert_eq!(state.active_feature(), Some(FeatureId::Age));

        state.record(FeatureId::Age, 30);
        assert_eq!(state.active_feature(), Some(FeatureId::Sex));
        assert_eq!(state.last_answered, Some(FeatureId::Age));
    }

    #[test]
    fn edit_target_overrides_cursor() {
        let mut state = ConversationState::default();
        state.enter(DialoguePhase::Collecting);
        state.record(FeatureId::Age, 30);
        state.record(FeatureId::Sex, 1);
        state.editing = Some(FeatureId::Age);
        assert_eq!(state.active_feature(), Some(FeatureId::Age));
    }

    #[test]
    fn complete_after_all_features() {
        let mut state = ConversationState::default();
        for schema in FEATURES.iter() {
            assert!(!state.is_complete());
            state.record(schema.id, 1);
        }
        assert!(state.is_complete());
        assert_eq!(state.first_unanswered(), None);
    }

    #[test]
    fn reset_clears_everything() {
        let mut state = ConversationState::default();
        state.enter(DialoguePhase::Collecting);
        state.record(FeatureId::Age, 44);
        state.prediction = Some(PredictionResult::default());
        state.reset();
        assert_eq!(state.phase, DialoguePhase::Intro);
        assert!(state.answers.is_empty());
        assert!(state.prediction.is_none());
        assert!(state.last_answered.is_none());
    }
}
