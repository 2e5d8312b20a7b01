//! HTTP server assembly.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::dashboards::{DashboardConfig, dashboard_routes};
use crate::survey::{SessionStore, SurveyRouteState, survey_routes};

/// All HTTP routes: questionnaire sessions, schema, facts and dashboards.
pub fn build_router(sessions: Arc<SessionStore>, dashboards: DashboardConfig) -> Router {
    survey_routes(SurveyRouteState { sessions })
        .merge(dashboard_routes(dashboards))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve `router` on an already bound listener until the task is dropped.
pub fn spawn(listener: TcpListener, router: Router) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, "HTTP server started");
        }
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("HTTP server stopped: {}", e);
        }
    })
}
