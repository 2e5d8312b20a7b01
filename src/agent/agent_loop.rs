//! Main agent loop: routes channel input to one questionnaire per user.

use std::sync::Arc;

use futures::StreamExt;

use crate::agent::submission::{HELP_TEXT, Submission, SubmissionParser};
use crate::channels::{ChannelManager, IncomingMessage, OutgoingResponse, StatusUpdate};
use crate::error::Error;
use crate::survey::{ChatMessage, ConversationState, DialoguePhase, SessionStore, SurveyDeps, Turn};

const NO_QUESTION_YET: &str = "No question has been asked yet. Type /start to begin the questionnaire.";

/// The agent that drives conversations arriving on channels.
pub struct Agent {
    channels: Arc<ChannelManager>,
    sessions: SessionStore,
    /// Channel and user greeted with the introduction on startup.
    greeting: Option<(String, String)>,
}

impl Agent {
    pub fn new(channels: ChannelManager, deps: SurveyDeps) -> Self {
        Self {
            channels: Arc::new(channels),
            sessions: SessionStore::new(deps),
            greeting: None,
        }
    }

    /// Show the introduction to `user_id` on `channel` as soon as the loop starts.
    pub fn with_greeting(mut self, channel: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.greeting = Some((channel.into(), user_id.into()));
        self
    }

    // ── Main loop ───────────────────────────────────────────────────

    /// Run the agent main loop.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;

        if let Some((channel, user_id)) = &self.greeting {
            self.greet(&IncomingMessage::new(channel, user_id, "")).await;
        }

        tracing::info!("Agent ready and listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            match self.handle_message(&message).await {
                Ok(Some(response)) if !response.is_empty() => {
                    let awaiting = self.awaiting(&message).await;
                    let _ = self
                        .channels
                        .respond(&message, OutgoingResponse::text(response).awaiting(awaiting))
                        .await;
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::info!("Quit command received, exiting...");
                    break;
                }
                Err(e) => {
                    tracing::error!("Error handling message: {}", e);
                    let _ = self
                        .channels
                        .respond(&message, OutgoingResponse::text(format!("Error: {}", e)))
                        .await;
                }
            }
        }

        tracing::info!("Agent shutting down...");
        self.channels.shutdown_all().await?;
        Ok(())
    }

    /// Send the conversation so far (the introduction for a new user).
    async fn greet(&self, origin: &IncomingMessage) {
        let survey = self.sessions.get_or_create(&origin.session_key()).await;
        let (text, awaiting) = {
            let manager = survey.lock().await;
            (join(manager.transcript().messages()), awaiting(manager.state()))
        };
        let response = OutgoingResponse::text(text).awaiting(awaiting);
        if let Err(e) = self.channels.respond(origin, response).await {
            tracing::warn!(channel = %origin.channel, "Failed to send greeting: {}", e);
        }
    }

    /// What the sender's conversation expects next.
    async fn awaiting(&self, message: &IncomingMessage) -> Option<String> {
        let survey = self.sessions.get(&message.session_key()).await?;
        let manager = survey.lock().await;
        awaiting(manager.state())
    }

    // ── Message dispatch ────────────────────────────────────────────

    /// Handle one message. `Ok(None)` means the user asked to quit.
    pub(crate) async fn handle_message(&self, message: &IncomingMessage) -> Result<Option<String>, Error> {
        let submission = SubmissionParser::parse(&message.content);
        let key = message.session_key();

        tracing::debug!(
            "Received message from {} on {} ({} chars)",
            message.user_id,
            message.channel,
            message.content.len()
        );

        let survey = self.sessions.get_or_create(&key).await;
        let mut manager = survey.lock().await;

        let replies = match submission {
            Submission::Quit => return Ok(None),
            Submission::Help => return Ok(Some(HELP_TEXT.to_string())),
            Submission::Info => {
                return Ok(Some(
                    manager.info().unwrap_or_else(|| NO_QUESTION_YET.to_string()),
                ));
            }
            Submission::Start => manager.begin(),
            Submission::Restart => manager.restart(),
            Submission::UserInput { content } => {
                let Turn { replies, task } = manager.submit(&content);
                let Some(task) = task else {
                    return Ok(Some(join(&replies)));
                };

                // Delivery problems must not strand the task: always complete it.
                if !replies.is_empty() {
                    if let Err(e) = self
                        .channels
                        .respond(message, OutgoingResponse::text(join(&replies)))
                        .await
                    {
                        tracing::warn!(channel = %message.channel, "Failed to send interim reply: {}", e);
                    }
                }
                if let Err(e) = self
                    .channels
                    .send_status(
                        &message.channel,
                        StatusUpdate::Thinking(task.describe().to_string()),
                        &message.metadata,
                    )
                    .await
                {
                    tracing::warn!(channel = %message.channel, "Failed to send status: {}", e);
                }
                manager.complete(task).await
            }
        };

        tracing::debug!(session_id = %key, phase = %manager.phase(), "Turn finished");
        Ok(Some(join(&replies)))
    }
}

/// Short name of the answer the conversation is waiting for.
fn awaiting(state: &ConversationState) -> Option<String> {
    match state.phase {
        DialoguePhase::Collecting => state
            .active_feature()
            .map(|feature| feature.schema().label.to_string()),
        DialoguePhase::Review => Some("confirm or edit".to_string()),
        DialoguePhase::Intro | DialoguePhase::AfterPrediction => None,
    }
}

/// Render assistant messages as one block, blank line between messages.
fn join(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
