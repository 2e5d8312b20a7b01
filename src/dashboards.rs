//! Embedded analytics dashboards.
//!
//! Up to three externally hosted visualizations, each shown in a sandboxed
//! iframe. The base URLs come from configuration; fixed embed parameters
//! are appended here.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

/// Query appended to every dashboard base URL.
pub const EMBED_QUERY: &str = "?:showVizHome=no&:embed=true&:toolbar=top";

/// Iframe sandbox permissions.
const SANDBOX: &str = "allow-scripts allow-same-origin allow-popups";

pub const DISCLAIMER: &str = "These visualizations do not provide a diagnosis and should not be used for emergency decision-making. If you are concerned about your mental health, please speak with a qualified professional.";

pub const NOT_CONFIGURED: &str = "Dashboard URLs are not configured. Please set MIND_DASHBOARD_URL_1, MIND_DASHBOARD_URL_2, and MIND_DASHBOARD_URL_3.";

/// Dashboard base URLs; each one is optional.
#[derive(Debug, Clone, Default)]
pub struct DashboardConfig {
    pub anxiety_url: Option<String>,
    pub depression_url: Option<String>,
    pub factors_url: Option<String>,
}

impl DashboardConfig {
    pub fn any_configured(&self) -> bool {
        self.anxiety_url.is_some() || self.depression_url.is_some() || self.factors_url.is_some()
    }

    /// One card per configured URL, in display order.
    pub fn embeds(&self) -> Vec<DashboardEmbed> {
        let cards = [
            (
                &self.anxiety_url,
                "anxiety",
                "Anxiety Visualization",
                "Explore predicted anxiety levels across different filters.",
                "Anxiety Prediction Dashboard",
            ),
            (
                &self.depression_url,
                "depression",
                "Depression Visualization",
                "View how depression predictions vary with the same filters.",
                "Depression Prediction Dashboard",
            ),
            (
                &self.factors_url,
                "risk_factors",
                "Risk & Factors Visualization",
                "Examine how lifestyle and other factors relate to predicted anxiety and depression.",
                "Risk Factors Prediction Dashboard",
            ),
        ];

        cards
            .into_iter()
            .filter_map(|(base, key, title, description, frame_title)| {
                base.as_deref().map(|base| DashboardEmbed {
                    key,
                    title,
                    description,
                    frame_title,
                    url: embed_url(base),
                })
            })
            .collect()
    }
}

/// A dashboard card ready to render.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardEmbed {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub frame_title: &'static str,
    pub url: String,
}

impl DashboardEmbed {
    /// Card markup with a sandboxed iframe.
    pub fn to_html(&self) -> String {
        format!(
            "<section class=\"dashboard-card\" id=\"dashboard-{key}\">\n\
             <h3>{title}</h3>\n\
             <p>{description}</p>\n\
             <iframe title=\"{frame_title}\" src=\"{url}\" sandbox=\"{SANDBOX}\" \
             loading=\"lazy\" allowfullscreen scrolling=\"no\"></iframe>\n\
             </section>",
            key = self.key,
            title = escape_html(self.title),
            description = escape_html(self.description),
            frame_title = escape_html(self.frame_title),
            url = escape_html(&self.url),
        )
    }
}

/// Base URL plus the fixed embed query.
pub fn embed_url(base: &str) -> String {
    format!("{}{EMBED_QUERY}", base.trim())
}

/// HTML fragment with every configured card and the disclaimer, or the
/// configuration error when none is set.
pub fn render_html(config: &DashboardConfig) -> String {
    if !config.any_configured() {
        return format!("<p class=\"dashboard-error\">{}</p>", escape_html(NOT_CONFIGURED));
    }
    let mut html = String::from("<div class=\"dashboards\">\n");
    for embed in config.embeds() {
        html.push_str(&embed.to_html());
        html.push('\n');
    }
    html.push_str(&format!(
        "<p class=\"dashboard-disclaimer\">{}</p>\n</div>",
        escape_html(DISCLAIMER)
    ));
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ── Routes ──────────────────────────────────────────────────────────────

/// Build the dashboard routes.
pub fn dashboard_routes(config: DashboardConfig) -> Router {
    Router::new()
        .route("/api/dashboards", get(list_dashboards))
        .route("/dashboards", get(dashboards_html))
        .with_state(Arc::new(config))
}

async fn list_dashboards(State(config): State<Arc<DashboardConfig>>) -> impl IntoResponse {
    if !config.any_configured() {
        return Json(json!({
            "configured": false,
            "error": NOT_CONFIGURED,
        }));
    }
    Json(json!({
        "configured": true,
        "dashboards": config.embeds(),
        "disclaimer": DISCLAIMER,
    }))
}

async fn dashboards_html(State(config): State<Arc<DashboardConfig>>) -> impl IntoResponse {
    Html(render_html(&config))
}
