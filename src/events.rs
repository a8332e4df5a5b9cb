//! Event system for pipeline lifecycle hooks.
//!
//! Provides an optional, non-intrusive way to observe a battle card run.
//! Stages emit events when they start, probe a candidate page, finish
//! (possibly degraded), and when the writer persists an artifact.
//! Implement [`EventHandler`] to receive these for progress UIs or metrics.

use std::path::PathBuf;
use std::sync::Arc;

/// Events emitted during a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A stage has started executing.
    StageStart {
        /// Stage name (`"research"`, `"pricing"`, `"news"`, `"writer"`).
        stage: &'static str,
    },
    /// A stage has finished.
    StageEnd {
        stage: &'static str,
        /// `Some(reason)` when the stage fell back to its defaults.
        degraded: Option<String>,
    },
    /// A candidate page was tried while probing for pricing or news.
    ProbeAttempt {
        stage: &'static str,
        url: String,
        /// Whether the page yielded enough text to use.
        usable: bool,
    },
    /// The writer saved a file.
    ArtifactWritten { path: PathBuf },
}

/// Handler for pipeline lifecycle events.
///
/// This is entirely optional -- the pipeline works without an event handler.
///
/// # Example
///
/// ```
/// use battle_card::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::StageStart { stage } => println!("[start] {}", stage),
///             Event::StageEnd { stage, degraded } => println!("[end] {} {:?}", stage, degraded),
///             _ => {}
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use battle_card::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::ArtifactWritten { path } = event {
///         println!("saved {}", path.display());
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_emit_without_handler_is_noop() {
        emit(&None, Event::StageStart { stage: "research" });
    }

    #[test]
    fn test_fn_handler_receives_events() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: Arc<dyn EventHandler> = Arc::new(FnEventHandler(move |e: Event| {
            sink.lock().unwrap().push(e);
        }));

        emit(&Some(handler), Event::StageStart { stage: "pricing" });

        assert_eq!(*seen.lock().unwrap(), vec![Event::StageStart { stage: "pricing" }]);
    }
}
