//! CLI channel: stdin/stdout REPL for the questionnaire.
//!
//! The input prompt names what the conversation is waiting for, so a user
//! mid-questionnaire sees `age> ` rather than a bare `> `.

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};
use crate::error::ChannelError;

const CHANNEL_NAME: &str = "cli";

/// Reads lines from stdin and prints replies to stdout.
pub struct CliChannel {
    user_id: String,
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            user_id: "local-user".to_string(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        Ok(read_lines(
            BufReader::new(tokio::io::stdin()),
            self.user_id.clone(),
        ))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        println!("\n{}\n", render_reply(&response.content));
        eprint!("{}", prompt(response.awaiting.as_deref()));
        Ok(())
    }

    async fn send_status(
        &self,
        status: StatusUpdate,
        _metadata: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        eprintln!("{}", render_status(&status));
        Ok(())
    }
}

/// Turn non-blank input lines into messages from `user_id`.
///
/// Blank lines are skipped; reading stops at EOF or on the first I/O error.
pub fn read_lines<R>(reader: R, user_id: String) -> MessageStream
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let lines = reader.lines();
    let stream = stream::unfold((lines, user_id), |(mut lines, user_id)| async move {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let msg = IncomingMessage::new(CHANNEL_NAME, &user_id, line);
                    return Some((msg, (lines, user_id)));
                }
                Ok(None) => return None,
                Err(e) => {
                    tracing::error!("Error reading stdin: {}", e);
                    return None;
                }
            }
        }
    });
    Box::pin(stream)
}

/// Input prompt for the next line.
fn prompt(awaiting: Option<&str>) -> String {
    match awaiting {
        Some(what) => format!("{}> ", what.to_lowercase()),
        None => "> ".to_string(),
    }
}

/// Indent continuation lines under the speaker tag.
fn render_reply(content: &str) -> String {
    let mut out = String::new();
    for (i, line) in content.lines().enumerate() {
        if i == 0 {
            out.push_str("MIND: ");
        } else {
            out.push('\n');
            if !line.is_empty() {
                out.push_str("      ");
            }
        }
        out.push_str(line);
    }
    out
}

fn render_status(status: &StatusUpdate) -> String {
    match status {
        StatusUpdate::Thinking(msg) => format!("⏳ {}", msg),
        StatusUpdate::Status(msg) => format!("ℹ️  {}", msg),
    }
}
