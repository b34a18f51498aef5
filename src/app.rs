use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tracing::warn;

use crate::config::Config;
use crate::database::Database;
use crate::error::AppError;
use crate::events::{self, EventRegistry};
use crate::signature::SignatureVerifier;
use crate::{middleware, receiver, routes};

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<SignatureVerifier>,
    pub events: Arc<EventRegistry>,
    /// `None` when the database was unreachable at startup (degraded mode).
    pub db: Option<Database>,
}

/// Composes the gateway with the default event bindings.
pub async fn compose(config: &Config) -> Router {
    let mut registry = EventRegistry::new();
    events::register_default_handlers(&mut registry);
    compose_with_events(config, registry).await
}

/// Composes the gateway in fixed order: database connect, receiver mount,
/// middleware installation, route and fallback registration.
///
/// Returns a fresh router each call, so composing twice yields two
/// independent pipelines. A database connection failure is observed and
/// logged but does not abort startup; the gateway runs degraded.
pub async fn compose_with_events(config: &Config, events: EventRegistry) -> Router {
    let db = match Database::connect(config).await {
        Ok(db) => Some(db),
        Err(e) => {
            warn!("Database unavailable, starting degraded: {:#}", e);
            None
        }
    };

    let state = AppState {
        verifier: Arc::new(SignatureVerifier::new(config.slack_signing_secret.clone())),
        events: Arc::new(events),
        db,
    };

    Router::new()
        .merge(receiver::router())
        .merge(routes::router())
        .fallback(not_found)
        // Outermost first: log, cookies, JSON body, URL-encoded body.
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::access_log))
                .layer(axum::middleware::from_fn(middleware::parse_cookies))
                .layer(axum::middleware::from_fn(middleware::parse_json_body))
                .layer(axum::middleware::from_fn(middleware::parse_urlencoded_body)),
        )
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}
