//! SurveyManager: owns one conversation and runs the remote tasks its
//! transitions request.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::Serialize;

use super::engine::{self, Task};
use super::model::{ChatMessage, Transcript};
use super::prompts;
use super::schema::FeatureId;
use super::state::{CollectedAnswers, ConversationState, DialoguePhase};
use crate::agent::CompanionAgent;
use crate::error::PredictionError;
use crate::prediction::{PredictionClient, PredictionResult};

/// Shared collaborators every conversation uses.
#[derive(Clone)]
pub struct SurveyDeps {
    /// `None` when no prediction endpoint is configured.
    pub prediction: Option<Arc<dyn PredictionClient>>,
    pub companion: Arc<CompanionAgent>,
}

/// Messages produced by a submitted reply, plus the task still to run.
#[derive(Debug)]
pub struct Turn {
    pub replies: Vec<ChatMessage>,
    pub task: Option<PendingTask>,
}

/// A submitted task that has not finished yet.
///
/// The conversation stays busy for as long as this value lives. Dropping it,
/// whether after [`SurveyManager::complete`] or because the turn was
/// abandoned, releases the conversation.
#[derive(Debug)]
pub struct PendingTask {
    task: Option<Task>,
    busy: Arc<AtomicBool>,
}

impl PendingTask {
    fn new(task: Task, busy: Arc<AtomicBool>) -> Self {
        busy.store(true, Ordering::Release);
        Self {
            task: Some(task),
            busy,
        }
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    /// Status line to show while the task runs.
    pub fn describe(&self) -> &'static str {
        self.task.as_ref().map_or(prompts::THINKING_STATUS, Task::describe)
    }
}

impl Drop for PendingTask {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Snapshot of a conversation for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SurveyStatus {
    pub phase: DialoguePhase,
    pub answers: CollectedAnswers,
    pub active_feature: Option<FeatureId>,
    pub prediction: Option<PredictionResult>,
    pub busy: bool,
}

/// One conversation: dialogue state, transcript, and the busy guard.
///
/// Input is accepted in two phases: [`submit`](Self::submit) applies the
/// transition and [`complete`](Self::complete) runs the requested task. While
/// the returned [`PendingTask`] is alive every further submission is refused.
pub struct SurveyManager {
    state: ConversationState,
    transcript: Transcript,
    deps: SurveyDeps,
    busy: Arc<AtomicBool>,
    last_active: Instant,
}

impl SurveyManager {
    /// New conversation with the introduction already in the transcript.
    pub fn new(deps: SurveyDeps) -> Self {
        let mut transcript = Transcript::new();
        transcript.extend(engine::intro_messages());
        Self {
            state: ConversationState::default(),
            transcript,
            deps,
            busy: Arc::new(AtomicBool::new(false)),
            last_active: Instant::now(),
        }
    }

    pub fn phase(&self) -> DialoguePhase {
        self.state.phase
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Whether a remote task is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn last_active(&self) -> Instant {
        self.last_active
    }

    pub fn status(&self) -> SurveyStatus {
        SurveyStatus {
            phase: self.state.phase,
            answers: self.state.answers.clone(),
            active_feature: self.state.active_feature(),
            prediction: self.state.prediction,
            busy: self.is_busy(),
        }
    }

    /// Apply a user message. The returned task, if any, should be passed to
    /// [`complete`](Self::complete); the conversation refuses input until it
    /// is completed or dropped.
    pub fn submit(&mut self, text: &str) -> Turn {
        if self.is_busy() {
            tracing::debug!(phase = %self.state.phase, "Refusing input while a task is outstanding");
            return Turn {
                replies: vec![ChatMessage::assistant(prompts::BUSY)],
                task: None,
            };
        }
        self.last_active = Instant::now();

        self.transcript.push(ChatMessage::user(text));
        let step = engine::step(&mut self.state, text);
        self.transcript.extend(step.replies.iter().cloned());

        Turn {
            replies: step.replies,
            task: step
                .task
                .map(|task| PendingTask::new(task, Arc::clone(&self.busy))),
        }
    }

    /// Run an outstanding task and append its messages.
    ///
    /// Cancel-safe: if this future is dropped before it finishes, the
    /// conversation is left where `submit` put it and accepts input again.
    pub async fn complete(&mut self, mut pending: PendingTask) -> Vec<ChatMessage> {
        let replies = match pending.task.take() {
            Some(Task::Predict(answers)) => {
                let outcome = predict(&self.deps, &answers).await;
                engine::resolve_prediction(&mut self.state, outcome)
            }
            Some(Task::Consult { text, context }) => {
                let reply = self.deps.companion.reply(&text, context.as_deref()).await;
                vec![ChatMessage::assistant(reply)]
            }
            None => Vec::new(),
        };

        self.transcript.extend(replies.iter().cloned());
        self.last_active = Instant::now();
        drop(pending);
        replies
    }

    /// Submit and run any resulting task in one call.
    pub async fn handle(&mut self, text: &str) -> Vec<ChatMessage> {
        let Turn { mut replies, task } = self.submit(text);
        if let Some(task) = task {
            replies.extend(self.complete(task).await);
        }
        replies
    }

    /// Start the questionnaire from the first question, clearing any answers.
    pub fn begin(&mut self) -> Vec<ChatMessage> {
        self.control(engine::begin)
    }

    /// Reset to the introduction.
    pub fn restart(&mut self) -> Vec<ChatMessage> {
        self.control(engine::reset)
    }

    fn control(&mut self, transition: fn(&mut ConversationState) -> Vec<ChatMessage>) -> Vec<ChatMessage> {
        if self.is_busy() {
            return vec![ChatMessage::assistant(prompts::BUSY)];
        }
        self.last_active = Instant::now();
        let replies = transition(&mut self.state);
        self.transcript.extend(replies.iter().cloned());
        replies
    }

    /// Inline help for the most recent question, if any question was asked.
    pub fn info(&self) -> Option<String> {
        self.transcript
            .last_question_feature()
            .map(|feature| prompts::info(feature.schema()))
    }
}

async fn predict(deps: &SurveyDeps, answers: &CollectedAnswers) -> Result<PredictionResult, PredictionError> {
    match &deps.prediction {
        Some(client) => client.predict(answers).await,
        None => Err(PredictionError::NotConfigured),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::LlmError;
    use crate::llm::{CompletionRequest, CompletionResponse, FinishReason, LlmProvider};
    use crate::survey::schema::{FeatureKind, features};

    /// Records every request body and answers with a fixed result.
    struct RecordingPredictor {
        outcome: Result<PredictionResult, u16>,
        bodies: Mutex<Vec<String>>,
    }

    impl RecordingPredictor {
        fn new(outcome: Result<PredictionResult, u16>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                bodies: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PredictionClient for RecordingPredictor {
        async fn predict(&self, answers: &CollectedAnswers) -> Result<PredictionResult, PredictionError> {
            self.bodies
                .lock()
                .unwrap()
                .push(serde_json::to_string(answers).unwrap());
            self.outcome.map_err(|status| PredictionError::HttpStatus {
                status,
                body: String::new(),
            })
        }
    }

    struct EchoLlm;

    #[async_trait]
    impl LlmProvider for EchoLlm {
        fn model_name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Ok(CompletionResponse {
                content: format!("echo: {}", request.messages.len()),
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
            })
        }
    }

    fn manager(prediction: Option<Arc<dyn PredictionClient>>) -> SurveyManager {
        SurveyManager::new(SurveyDeps {
            prediction,
            companion: Arc::new(CompanionAgent::new(Some(Arc::new(EchoLlm)))),
        })
    }

    fn high_result() -> PredictionResult {
        PredictionResult {
            depression_probability: Some(0.82),
            anxiety_probability: Some(0.3),
        }
    }

    async fn answer_everything(manager: &mut SurveyManager) {
        for schema in features() {
            let reply = match schema.kind {
                FeatureKind::Numeric { min, .. } => min.to_string(),
                FeatureKind::Categorical { options } => options[0].code.to_string(),
            };
            manager.handle(&reply).await;
        }
    }

    #[test]
    fn new_conversation_shows_intro() {
        let manager = manager(None);
        assert_eq!(manager.phase(), DialoguePhase::Intro);
        assert_eq!(manager.transcript().len(), prompts::INTRO_MESSAGES.len());
        assert!(manager.info().is_none());
    }

    #[tokio::test]
    async fn full_run_to_prediction() {
        let predictor = RecordingPredictor::new(Ok(high_result()));
        let mut manager = manager(Some(predictor.clone()));

        manager.handle("yes").await;
        answer_everything(&mut manager).await;
        assert_eq!(manager.phase(), DialoguePhase::Review);

        let replies = manager.handle("confirm").await;
        assert_eq!(manager.phase(), DialoguePhase::AfterPrediction);
        assert!(replies[0].text.contains("Depression: 82.0%"));
        assert!(replies[0].text.contains("higher likelihood"));
        assert_eq!(predictor.bodies.lock().unwrap().len(), 1);
        assert_eq!(manager.status().prediction, Some(high_result()));
    }

    #[tokio::test]
    async fn restart_reproduces_identical_request_body() {
        let predictor = RecordingPredictor::new(Ok(high_result()));
        let mut manager = manager(Some(predictor.clone()));

        for _ in 0..2 {
            manager.handle("start").await;
            answer_everything(&mut manager).await;
            manager.handle("looks good").await;
            assert_eq!(manager.phase(), DialoguePhase::AfterPrediction);
            manager.handle("restart").await;
            assert_eq!(manager.phase(), DialoguePhase::Intro);
            assert!(manager.status().answers.is_empty());
            assert!(manager.status().prediction.is_none());
        }

        let bodies = predictor.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0], bodies[1]);
        assert!(bodies[0].starts_with("{\"AGEP_A\":18,"));
    }

    #[tokio::test]
    async fn failed_prediction_stays_in_review() {
        let predictor = RecordingPredictor::new(Err(500));
        let mut manager = manager(Some(predictor.clone()));
        manager.handle("ok").await;
        answer_everything(&mut manager).await;

        let replies = manager.handle("confirm").await;
        assert_eq!(manager.phase(), DialoguePhase::Review);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, prompts::PREDICTION_FAILED);
        assert!(!manager.is_busy());

        manager.handle("confirm").await;
        assert_eq!(predictor.bodies.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_endpoint_reports_not_configured() {
        let mut manager = manager(None);
        manager.handle("yes").await;
        answer_everything(&mut manager).await;
        let replies = manager.handle("confirm").await;
        assert_eq!(replies[0].text, prompts::PREDICTION_NOT_CONFIGURED);
        assert_eq!(manager.phase(), DialoguePhase::Review);
    }

    #[tokio::test]
    async fn edit_returns_to_review() {
        let mut manager = manager(None);
        manager.handle("yes").await;
        answer_everything(&mut manager).await;

        manager.handle("change my region").await;
        assert_eq!(manager.status().active_feature, Some(FeatureId::Region));
        let info = manager.info().unwrap();
        assert!(info.contains("Census regions"));

        let replies = manager.handle("West").await;
        assert_eq!(manager.phase(), DialoguePhase::Review);
        assert_eq!(manager.status().answers.get(&FeatureId::Region), Some(&4));
        assert!(replies[0].text.contains("- U.S. region: West"));
    }

    #[tokio::test]
    async fn pending_task_refuses_input() {
        let mut manager = manager(None);
        let turn = manager.submit("how do I cope with stress?");
        let task = turn.task.expect("companion task");
        assert_eq!(task.describe(), prompts::THINKING_STATUS);
        assert!(manager.is_busy());
        let len = manager.transcript().len();

        let refused = manager.submit("hello?");
        assert!(refused.task.is_none());
        assert_eq!(refused.replies[0].text, prompts::BUSY);
        assert_eq!(manager.begin()[0].text, prompts::BUSY);
        assert_eq!(manager.transcript().len(), len);

        let replies = manager.complete(task).await;
        assert_eq!(replies[0].text, "echo: 2");
        assert!(!manager.is_busy());
        assert_eq!(manager.phase(), DialoguePhase::Intro);
    }

    #[tokio::test]
    async fn abandoned_task_releases_conversation() {
        let mut manager = manager(None);
        let turn = manager.submit("what is anxiety?");
        assert!(manager.is_busy());
        drop(turn);

        assert!(!manager.is_busy());
        let replies = manager.handle("yes").await;
        assert_eq!(manager.phase(), DialoguePhase::Collecting);
        assert_eq!(replies[1].feature_id, Some(FeatureId::Age));
    }

    /// Never answers within a test's lifetime.
    struct StalledPredictor;

    #[async_trait]
    impl PredictionClient for StalledPredictor {
        async fn predict(&self, _answers: &CollectedAnswers) -> Result<PredictionResult, PredictionError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(PredictionResult::default())
        }
    }

    #[tokio::test]
    async fn cancelled_turn_leaves_conversation_usable() {
        let mut manager = manager(Some(Arc::new(StalledPredictor)));
        manager.handle("yes").await;
        answer_everything(&mut manager).await;
        assert_eq!(manager.phase(), DialoguePhase::Review);

        let cancelled =
            tokio::time::timeout(Duration::from_millis(50), manager.handle("confirm")).await;
        assert!(cancelled.is_err());

        assert!(!manager.is_busy());
        assert!(!manager.status().busy);
        assert_eq!(manager.phase(), DialoguePhase::Review);
        assert!(manager.state().prediction.is_none());

        let replies = manager.restart();
        assert_eq!(manager.phase(), DialoguePhase::Intro);
        assert_eq!(replies.len(), prompts::INTRO_MESSAGES.len());
        let replies = manager.handle("start").await;
        assert_eq!(replies[1].feature_id, Some(FeatureId::Age));
    }

    #[tokio::test]
    async fn begin_and_restart_controls() {
        let mut manager = manager(None);
        let replies = manager.begin();
        assert_eq!(manager.phase(), DialoguePhase::Collecting);
        assert_eq!(replies[1].feature_id, Some(FeatureId::Age));
        manager.handle("40").await;

        // Begin again from mid-questionnaire clears the answers.
        manager.begin();
        assert!(manager.status().answers.is_empty());

        let replies = manager.restart();
        assert_eq!(manager.phase(), DialoguePhase::Intro);
        assert_eq!(replies.len(), prompts::INTRO_MESSAGES.len());
    }
}
