use std::collections::HashMap;
use std::future::Future;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::info;

pub type EventCallback = Box<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Event-name-to-callback bindings for the chat platform.
///
/// Delivery and signature verification live in the receiver; this is the
/// capability surface callbacks are registered against.
#[derive(Default)]
pub struct EventRegistry {
    handlers: HashMap<String, EventCallback>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `callback` to `event_name`, replacing any previous binding.
    pub fn register<F, Fut>(&mut self, event_name: &str, callback: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers.insert(
            event_name.to_string(),
            Box::new(move |payload| Box::pin(callback(payload))),
        );
    }

    /// Invokes the callback bound to `event_name`, if any. Returns whether a
    /// handler was found.
    pub async fn dispatch(&self, event_name: &str, payload: Value) -> bool {
        match self.handlers.get(event_name) {
            Some(callback) => {
                callback(payload).await;
                true
            }
            None => false,
        }
    }

    pub fn registered_events(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

/// Binds the fixed set of events the gateway listens for. The callback
/// bodies are placeholders for the actual bot logic.
pub fn register_default_handlers(registry: &mut EventRegistry) {
    registry.register("app_mention", |event| async move {
        let user = event
            .get("user")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        info!(user = %user, "app_mention received");
    });

    registry.register("message", |event| async move {
        let channel = event
            .get("channel")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        info!(channel = %channel, "message received");
    });
}
