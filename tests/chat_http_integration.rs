//! Integration tests for the questionnaire REST API.
//!
//! Each test spins up the real router on a random port, plus mock prediction
//! and chat-completion servers, and drives them over HTTP with reqwest.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use mind_companion::agent::CompanionAgent;
use mind_companion::dashboards::DashboardConfig;
use mind_companion::llm::{LlmConfig, create_provider};
use mind_companion::prediction::{HttpPredictionClient, PredictionClient, PredictionConfig};
use mind_companion::server::build_router;
use mind_companion::survey::schema::{FeatureKind, features};
use mind_companion::survey::{SessionStore, SurveyDeps};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// What a mock server received, in arrival order.
#[derive(Default)]
struct Recorded {
    bodies: Mutex<Vec<Value>>,
    authorization: Mutex<Vec<Option<String>>>,
}

impl Recorded {
    fn record(&self, headers: &HeaderMap, body: Value) {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorization.lock().unwrap().push(auth);
        self.bodies.lock().unwrap().push(body);
    }

    fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    fn authorization(&self) -> Vec<Option<String>> {
        self.authorization.lock().unwrap().clone()
    }
}

type Seen = Arc<Recorded>;

/// Bind a router on a random local port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}")
}

/// Mock scoring endpoint answering every POST with `status` and `body`.
async fn start_predictor(status: StatusCode, body: Value) -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route(
            "/predict",
            post(
                move |State(seen): State<Seen>, headers: HeaderMap, Json(request): Json<Value>| {
                    let body = body.clone();
                    async move {
                        seen.record(&headers, request);
                        (status, Json(body))
                    }
                },
            ),
        )
        .with_state(seen.clone());
    (format!("{}/predict", serve(app).await), seen)
}

/// Mock chat-completions endpoint that always answers with `reply`.
async fn start_llm(reply: &'static str) -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route(
            "/v1/chat/completions",
            post(
                move |State(seen): State<Seen>, headers: HeaderMap, Json(request): Json<Value>| async move {
                    seen.record(&headers, request);
                    Json(json!({
                        "choices": [{
                            "message": {"role": "assistant", "content": reply},
                            "finish_reason": "stop"
                        }]
                    }))
                },
            ),
        )
        .with_state(seen.clone());
    (serve(app).await, seen)
}

/// Prediction settings for a mock endpoint, with an optional bearer key.
fn prediction_config(endpoint: String, api_key: Option<&str>) -> PredictionConfig {
    PredictionConfig {
        endpoint,
        api_key: api_key.map(SecretString::from),
        timeout: Duration::from_secs(5),
    }
}

/// Start the application wired to the given mock endpoints.
async fn start_app(prediction_url: Option<String>, llm_url: Option<String>) -> String {
    start_app_with(prediction_url.map(|url| prediction_config(url, None)), llm_url).await
}

async fn start_app_with(prediction: Option<PredictionConfig>, llm_url: Option<String>) -> String {
    let prediction = prediction.map(|config| {
        let client = HttpPredictionClient::new(config).unwrap();
        Arc::new(client) as Arc<dyn PredictionClient>
    });
    let llm = llm_url.map(|base_url| {
        create_provider(&LlmConfig {
            api_key: SecretString::from("sk-test"),
            model: "gpt-4o-mini".to_string(),
            base_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    });

    let deps = SurveyDeps {
        prediction,
        companion: Arc::new(CompanionAgent::new(llm)),
    };
    let sessions = Arc::new(SessionStore::new(deps));
    serve(build_router(sessions, DashboardConfig::default())).await
}

/// Create a session and return its id.
async fn create_session(http: &reqwest::Client, base: &str) -> String {
    let response = http.post(format!("{base}/api/sessions")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    body["session_id"].as_str().unwrap().to_string()
}

/// Post one user message, returning the response body.
async fn say(http: &reqwest::Client, base: &str, id: &str, text: &str) -> Value {
    let response = http
        .post(format!("{base}/api/sessions/{id}/messages"))
        .json(&json!({ "content": text }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    response.json().await.unwrap()
}

/// Answer every question with its first valid value.
async fn answer_everything(http: &reqwest::Client, base: &str, id: &str) -> Value {
    let mut last = Value::Null;
    for schema in features() {
        let reply = match schema.kind {
            FeatureKind::Numeric { min, .. } => min.to_string(),
            FeatureKind::Categorical { options } => options[0].code.to_string(),
        };
        last = say(http, base, id, &reply).await;
    }
    last
}

fn reply_text(body: &Value, index: usize) -> &str {
    body["replies"][index]["text"].as_str().unwrap()
}

#[tokio::test]
async fn full_questionnaire_reaches_prediction() {
    timeout(TEST_TIMEOUT, async {
        let (predict_url, seen) = start_predictor(
            StatusCode::OK,
            json!({"depression_probability": 0.82, "anxiety_probability": 0.3}),
        )
        .await;
        let base = start_app(Some(predict_url), None).await;
        let http = reqwest::Client::new();
        let id = create_session(&http, &base).await;

        let body = say(&http, &base, &id, "yes").await;
        assert_eq!(body["phase"], "collecting");

        let body = answer_everything(&http, &base, &id).await;
        assert_eq!(body["phase"], "review");
        assert!(reply_text(&body, 0).starts_with("Here's a quick summary"));

        let body = say(&http, &base, &id, "confirm").await;
        assert_eq!(body["phase"], "after_prediction");
        assert!(reply_text(&body, 0).contains("Depression: 82.0%"));
        assert!(reply_text(&body, 0).contains("Anxiety: 30.0%"));

        let requests = seen.bodies();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["AGEP_A"], 18);
        assert_eq!(requests[0].as_object().unwrap().len(), features().count());
        assert_eq!(seen.authorization(), vec![None]);

        let status: Value = http
            .get(format!("{base}/api/sessions/{id}"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["prediction"]["depression_probability"], 0.82);
        assert_eq!(status["busy"], false);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn prediction_error_stays_in_review() {
    timeout(TEST_TIMEOUT, async {
        let (predict_url, seen) =
            start_predictor(StatusCode::INTERNAL_SERVER_ERROR, json!({"detail": "boom"})).await;
        let base = start_app(Some(predict_url), None).await;
        let http = reqwest::Client::new();
        let id = create_session(&http, &base).await;

        say(&http, &base, &id, "start").await;
        answer_everything(&http, &base, &id).await;

        let body = say(&http, &base, &id, "looks good").await;
        assert_eq!(body["phase"], "review");
        assert!(reply_text(&body, 0).contains("prediction service had a problem"));

        // Confirming again sends a second request.
        say(&http, &base, &id, "confirm").await;
        assert_eq!(seen.bodies().len(), 2);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn prediction_key_is_sent_as_bearer_token() {
    timeout(TEST_TIMEOUT, async {
        let (predict_url, seen) = start_predictor(
            StatusCode::OK,
            json!({"depression_probability": 0.1, "anxiety_probability": 0.2}),
        )
        .await;
        let base = start_app_with(Some(prediction_config(predict_url, Some("p-secret"))), None).await;
        let http = reqwest::Client::new();
        let id = create_session(&http, &base).await;

        say(&http, &base, &id, "yes").await;
        answer_everything(&http, &base, &id).await;
        let body = say(&http, &base, &id, "confirm").await;
        assert_eq!(body["phase"], "after_prediction");

        assert_eq!(seen.authorization(), vec![Some("Bearer p-secret".to_string())]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_prediction_service_is_reported() {
    timeout(TEST_TIMEOUT, async {
        let base = start_app(None, None).await;
        let http = reqwest::Client::new();
        let id = create_session(&http, &base).await;

        say(&http, &base, &id, "ok").await;
        answer_everything(&http, &base, &id).await;
        let body = say(&http, &base, &id, "confirm").await;
        assert_eq!(body["phase"], "review");
        assert!(reply_text(&body, 0).contains("not configured"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn intro_questions_go_to_companion() {
    timeout(TEST_TIMEOUT, async {
        let (llm_url, seen) = start_llm("  Anxiety is a feeling of worry.  ").await;
        let base = start_app(None, Some(llm_url)).await;
        let http = reqwest::Client::new();
        let id = create_session(&http, &base).await;

        let body = say(&http, &base, &id, "what is anxiety?").await;
        assert_eq!(body["phase"], "intro");
        assert_eq!(reply_text(&body, 0), "  Anxiety is a feeling of worry.  ");

        assert_eq!(seen.authorization(), vec![Some("Bearer sk-test".to_string())]);
        let requests = seen.bodies();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["messages"][0]["role"], "system");
        assert!(
            requests[0]["messages"][1]["content"]
                .as_str()
                .unwrap()
                .contains("what is anxiety?")
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn dashboards_report_unconfigured() {
    timeout(TEST_TIMEOUT, async {
        let base = start_app(None, None).await;
        let body: Value = reqwest::get(format!("{base}/api/dashboards"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["configured"], false);

        let health: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
    })
    .await
    .expect("test timed out");
}
