//! View lifetime and change notifications.
//!
//! The client has no UI framework re-rendering on state changes. Instead a
//! view registers an [`Arc<dyn ViewObserver>`] and redraws when told to, and
//! holds a [`ViewScope`] it unmounts when it goes away.
//!
//! # Stale results
//!
//! In-flight requests are never cancelled. A request that completes after
//! its view was unmounted still runs to the end, but the component sees
//! `!scope.is_mounted()` and drops the visible update instead of calling
//! the observer.
//!
//! # Example
//!
//! ```rust
//! use pdf2audio_client::{ViewObserver, WorkflowState};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Redraws(AtomicUsize);
//!
//! impl ViewObserver for Redraws {
//!     fn on_workflow_state(&self, state: &WorkflowState) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("now {}", state.name());
//!     }
//! }
//!
//! let observer: Arc<dyn ViewObserver> = Arc::new(Redraws(AtomicUsize::new(0)));
//! observer.on_workflow_state(&WorkflowState::Empty);
//! ```

use crate::error::Notice;
use crate::job::ConversionJob;
use crate::workflow::WorkflowState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Receives state changes of the components a view owns.
///
/// All methods default to no-ops. Calls may come from any tokio worker
/// thread, so implementations must be `Send + Sync`.
pub trait ViewObserver: Send + Sync {
    /// A conversion workflow changed state.
    fn on_workflow_state(&self, state: &WorkflowState) {
        let _ = state;
    }

    /// The job directory's list changed (refresh or removal).
    fn on_directory_changed(&self, jobs: &[ConversionJob]) {
        let _ = jobs;
    }

    /// Something the user should be told about.
    fn on_notice(&self, notice: &Notice) {
        let _ = notice;
    }
}

/// Observer for callers that poll state instead.
pub struct NoopObserver;

impl ViewObserver for NoopObserver {}

/// Convenience alias for the shared observer handle.
pub type Observer = Arc<dyn ViewObserver>;

/// Whether the owning view is still on screen.
///
/// Cloning shares the flag: every component created for the same view sees
/// the same unmount.
#[derive(Debug, Clone)]
pub struct ViewScope {
    mounted: Arc<AtomicBool>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self {
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }
}

impl ViewScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Tear the view down. Irreversible.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct TrackingObserver {
        states: AtomicUsize,
        lists: AtomicUsize,
        notices: AtomicUsize,
    }

    impl ViewObserver for TrackingObserver {
        fn on_workflow_state(&self, _state: &WorkflowState) {
            self.states.fetch_add(1, Ordering::SeqCst);
        }

        fn on_directory_changed(&self, _jobs: &[ConversionJob]) {
            self.lists.fetch_add(1, Ordering::SeqCst);
        }

        fn on_notice(&self, _notice: &Notice) {
            self.notices.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let o = NoopObserver;
        o.on_workflow_state(&WorkflowState::Empty);
        o.on_directory_changed(&[]);
        o.on_notice(&Notice::Toast {
            message: "hi".into(),
        });
    }

    #[test]
    fn tracking_observer_receives_events() {
        let o = TrackingObserver {
            states: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
            notices: AtomicUsize::new(0),
        };
        o.on_workflow_state(&WorkflowState::Empty);
        o.on_workflow_state(&WorkflowState::Submitting);
        o.on_directory_changed(&[]);
        o.on_notice(&Notice::Alert {
            message: "boom".into(),
        });
        assert_eq!(o.states.load(Ordering::SeqCst), 2);
        assert_eq!(o.lists.load(Ordering::SeqCst), 1);
        assert_eq!(o.notices.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unmount_is_shared_between_clones() {
        let scope = ViewScope::new();
        let child = scope.clone();
        assert!(child.is_mounted());
        scope.unmount();
        assert!(!child.is_mounted());
    }
}
