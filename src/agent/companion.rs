//! Free-text companion: answers anything the questionnaire grammar does not
//! recognize by delegating to the chat-completion service.

use std::sync::Arc;

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Persona instruction sent as the system message on every call.
pub const PERSONA_PROMPT: &str = "\
You are \"MIND Companion\", a calm, supportive mental health AI focused ONLY on
depression, anxiety, stress, and emotional wellbeing.

Rules:
- Only answer mental-health related questions.
- Decline unrelated topics (math, programming, politics, etc.)
- Never give medical or medication advice.
- Encourage professional help if symptoms are serious.
- Use warm, supportive, concise language.";

/// Shown instead of calling out when no API key is configured.
pub const NOT_CONFIGURED_REPLY: &str =
    "I cannot connect to the language model right now because no OpenAI API key is configured.";

/// Shown when the service answered with an error or an unusable body.
pub const TROUBLE_THINKING_REPLY: &str = "I'm having trouble thinking right now. Please try again.";

/// Shown when the service could not be reached.
pub const TROUBLE_CONNECTING_REPLY: &str =
    "I'm having trouble connecting right now. Please try again.";

/// Wraps the optional LLM provider with the persona and failure texts.
///
/// Failures never propagate: every call yields text to show the user.
pub struct CompanionAgent {
    llm: Option<Arc<dyn LlmProvider>>,
}

impl CompanionAgent {
    pub fn new(llm: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { llm }
    }

    /// Companion with no backend; every reply is the not-configured apology.
    pub fn disabled() -> Self {
        Self { llm: None }
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_some()
    }

    /// Reply to a free-text message. `context` is appended to the user turn
    /// (e.g. the last prediction).
    pub async fn reply(&self, text: &str, context: Option<&str>) -> String {
        let Some(llm) = &self.llm else {
            return NOT_CONFIGURED_REPLY.to_string();
        };

        let request = CompletionRequest::new(build_messages(text, context));
        match llm.complete(request).await {
            Ok(response) if response.content.trim().is_empty() => {
                tracing::warn!("Companion reply was empty");
                TROUBLE_THINKING_REPLY.to_string()
            }
            Ok(response) => response.content,
            Err(e) => {
                tracing::error!(model = llm.model_name(), "Companion call failed: {}", e);
                failure_reply(&e).to_string()
            }
        }
    }
}

/// System persona plus the wrapped user turn.
pub fn build_messages(text: &str, context: Option<&str>) -> Vec<ChatMessage> {
    let extra = context.unwrap_or_default();
    vec![
        ChatMessage::system(PERSONA_PROMPT),
        ChatMessage::user(format!(
            "User message: \"{text}\"\n\n{extra}\nIf the message is unrelated to mental health, politely decline."
        )),
    ]
}

fn failure_reply(error: &LlmError) -> &'static str {
    match error {
        LlmError::Unreachable { .. } => TROUBLE_CONNECTING_REPLY,
        _ => TROUBLE_THINKING_REPLY,
    }
}
