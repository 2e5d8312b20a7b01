//! Submission types for the terminal REPL.
//!
//! Slash commands map to the questionnaire's explicit controls; anything
//! else is a reply for the dialogue.

/// Parses user input into Submission types.
pub struct SubmissionParser;

impl SubmissionParser {
    /// Parse message content into a Submission.
    pub fn parse(content: &str) -> Submission {
        let trimmed = content.trim();
        let lower = trimmed.to_lowercase();

        match lower.as_str() {
            "/start" | "/begin" => Submission::Start,
            "/restart" | "/reset" => Submission::Restart,
            "/info" => Submission::Info,
            "/help" | "/?" => Submission::Help,
            "/quit" | "/exit" => Submission::Quit,
            _ => Submission::UserInput {
                content: trimmed.to_string(),
            },
        }
    }
}

/// A submission to the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A reply for the dialogue.
    UserInput { content: String },
    /// Begin the questionnaire from the first question.
    Start,
    /// Reset to the introduction.
    Restart,
    /// Explain the most recent question.
    Info,
    Help,
    Quit,
}

/// Shown for `/help`.
pub const HELP_TEXT: &str = "\
Commands:
  /start    begin the questionnaire from the first question
  /restart  clear your answers and return to the introduction
  /info     more about the current question
  /help     show this list
  /quit     leave

Anything else is a reply to MIND Companion.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(SubmissionParser::parse("/start"), Submission::Start);
        assert_eq!(SubmissionParser::parse("  /RESTART "), Submission::Restart);
        assert_eq!(SubmissionParser::parse("/info"), Submission::Info);
        assert_eq!(SubmissionParser::parse("/?"), Submission::Help);
        assert_eq!(SubmissionParser::parse("/exit"), Submission::Quit);
    }

    #[test]
    fn everything_else_is_input() {
        assert_eq!(
            SubmissionParser::parse("  restart "),
            Submission::UserInput {
                content: "restart".into()
            }
        );
        assert_eq!(
            SubmissionParser::parse("/unknown"),
            Submission::UserInput {
                content: "/unknown".into()
            }
        );
    }
}
