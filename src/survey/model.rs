//! Chat transcript model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::schema::FeatureId;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One entry of the conversation log. Never mutated after it is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub speaker: Speaker,
    pub text: String,
    /// Feature this message is about, set on questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_id: Option<FeatureId>,
    #[serde(default)]
    pub is_question: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker,
            text: text.into(),
            feature_id: None,
            is_question: false,
            created_at: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Speaker::Assistant, text)
    }

    /// An assistant message asking the question for `feature`.
    pub fn question(feature: FeatureId, text: impl Into<String>) -> Self {
        Self {
            feature_id: Some(feature),
            is_question: true,
            ..Self::new(Speaker::Assistant, text)
        }
    }
}

/// Append-only conversation log.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = ChatMessage>) {
        self.messages.extend(messages);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Feature of the most recent question, for inline help.
    pub fn last_question_feature(&self) -> Option<FeatureId> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_question)
            .and_then(|m| m.feature_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_links_feature() {
        let msg = ChatMessage::question(FeatureId::Region, "Which region?");
        assert_eq!(msg.speaker, Speaker::Assistant);
        assert!(msg.is_question);
        assert_eq!(msg.feature_id, Some(FeatureId::Region));
    }

    #[test]
    fn last_question_feature_skips_plain_messages() {
        let mut transcript = Transcript::new();
        assert_eq!(transcript.last_question_feature(), None);

        transcript.push(ChatMessage::question(FeatureId::Age, "How old?"));
        transcript.push(ChatMessage::user("30"));
        transcript.push(ChatMessage::question(FeatureId::Sex, "Sex?"));
        transcript.push(ChatMessage::user("purple"));
        transcript.push(ChatMessage::assistant("I couldn't match that."));

        assert_eq!(transcript.last_question_feature(), Some(FeatureId::Sex));
        assert_eq!(transcript.len(), 5);
    }

    #[test]
    fn message_serializes_speaker_and_feature() {
        let json = serde_json::to_value(ChatMessage::question(FeatureId::SleepHours, "Hours?")).unwrap();
        assert_eq!(json["speaker"], "assistant");
        assert_eq!(json["feature_id"], "SLPHOURS_A");
        assert_eq!(json["is_question"], true);

        let json = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert!(json.get("feature_id").is_none());
    }
}
