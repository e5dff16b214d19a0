//! Client lifecycle events.
//!
//! Requests, session transitions, setup progress and token adoption are
//! broadcast to registered handlers. The default [`LoggingHandler`] forwards
//! them to the `log` facade; secrets never appear in event payloads.

use chrono::{DateTime, Utc};
use http::Method;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::session::SessionState;
use crate::setup::SetupStep;

/// Completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct RequestEvent {
    pub method: Method,
    pub url: Url,
    pub status: u16,
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub from: SessionState,
    pub to: SessionState,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SetupStepEvent {
    pub step: SetupStep,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenEvent {
    pub token_id: u64,
    pub user_id: u64,
    pub created: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub operation: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    Request(RequestEvent),
    Session(SessionEvent),
    SetupStep(SetupStepEvent),
    TokenAdopted(TokenEvent),
    Error(ErrorEvent),
}

/// Trait implemented by event handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &ClientEvent);
}

/// Dispatcher that broadcasts events to registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    /// Dispatcher with the [`LoggingHandler`] already registered.
    pub fn with_logging() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register_handler(Arc::new(LoggingHandler));
        dispatcher
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn dispatch(&self, event: ClientEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

/// Logs events using the `log` crate.
#[derive(Debug)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &ClientEvent) {
        match event {
            ClientEvent::Request(request) => {
                log::debug!(
                    "{} {} -> {} ({:.2}s)",
                    request.method,
                    request.url.path(),
                    request.status,
                    request.latency.as_secs_f64()
                );
            }
            ClientEvent::Session(session) => {
                log::info!("session {:?} -> {:?}", session.from, session.to);
            }
            ClientEvent::SetupStep(step) => {
                if step.success {
                    log::info!("setup step {} completed", step.step);
                } else {
                    log::warn!("setup step {} failed", step.step);
                }
            }
            ClientEvent::TokenAdopted(token) => {
                log::info!(
                    "adopted api token {} for user {} (created={})",
                    token.token_id,
                    token.user_id,
                    token.created
                );
            }
            ClientEvent::Error(error) => {
                log::warn!("{} failed: {}", error.operation, error.error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingHandler(std::sync::Mutex<usize>);

    impl EventHandler for CountingHandler {
        fn handle(&self, _event: &ClientEvent) {
            *self.0.lock().unwrap() += 1;
        }
    }

    #[test]
    fn dispatches_to_handlers() {
        let mut dispatcher = EventDispatcher::with_logging();
        let counter = Arc::new(CountingHandler(std::sync::Mutex::new(0)));
        dispatcher.register_handler(counter.clone());
        dispatcher.dispatch(ClientEvent::Error(ErrorEvent {
            operation: "sign-in".into(),
            error: "timeout".into(),
            timestamp: Utc::now(),
        }));
        dispatcher.dispatch(ClientEvent::SetupStep(SetupStepEvent {
            step: SetupStep::Import,
            success: true,
            timestamp: Utc::now(),
        }));
        assert_eq!(*counter.0.lock().unwrap(), 2);
    }
}
