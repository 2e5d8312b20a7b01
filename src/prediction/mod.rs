//! Prediction client: submits collected answers to the external scoring
//! endpoint and interprets the returned probabilities.
//!
//! One POST per confirmation. No retry and no backoff: a failure is reported
//! once and the user may confirm again.

mod client;

pub use client::{HttpPredictionClient, PredictionConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PredictionError;
use crate::survey::state::CollectedAnswers;

/// Scores returned by the model, each in `[0, 1]` when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depression_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anxiety_probability: Option<f64>,
}

impl PredictionResult {
    /// Read the two probabilities out of an arbitrary JSON body.
    ///
    /// A field that is missing, not a number, or outside `[0, 1]` is treated
    /// as absent, so an unexpected shape degrades to "N/A".
    pub fn from_json(value: &serde_json::Value) -> Self {
        let probability = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_f64())
                .filter(|p| (0.0..=1.0).contains(p))
        };
        Self {
            depression_probability: probability("depression_probability"),
            anxiety_probability: probability("anxiety_probability"),
        }
    }

    /// Larger of the two probabilities, absent ones counting as zero.
    pub fn max_probability(&self) -> f64 {
        self.depression_probability
            .unwrap_or(0.0)
            .max(self.anxiety_probability.unwrap_or(0.0))
    }

    pub fn severity(&self) -> Severity {
        Severity::classify(self.max_probability())
    }
}

/// Render a probability as a percentage rounded to one decimal ("82.0%").
pub fn format_percentage(probability: Option<f64>) -> String {
    match probability {
        Some(p) => format!("{:.1}%", (p * 1000.0).round() / 10.0),
        None => "N/A".to_string(),
    }
}

/// Advisory band for the larger of the two probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Mild,
    Moderate,
    High,
}

impl Severity {
    pub fn classify(max_probability: f64) -> Self {
        if max_probability < 0.25 {
            Self::Low
        } else if max_probability < 0.5 {
            Self::Mild
        } else if max_probability < 0.75 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// Fixed advisory sentence for this band.
    pub fn advisory(&self) -> &'static str {
        match self {
            Self::Low => {
                "These scores suggest a low likelihood of strong depression or anxiety. Keep maintaining healthy habits."
            }
            Self::Mild => {
                "These scores suggest a mild likelihood. Pay attention to your emotional patterns and maintain healthy routines."
            }
            Self::Moderate => {
                "These scores suggest a moderate likelihood. Consider talking with a counselor or therapist if things feel overwhelming."
            }
            Self::High => {
                "These scores suggest a higher likelihood. If you feel distressed or overwhelmed, please reach out to a mental health professional or trusted person soon."
            }
        }
    }
}

/// Scores a completed questionnaire.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict(&self, answers: &CollectedAnswers) -> Result<PredictionResult, PredictionError>;
}
