//! The UI slice: toasts shown to the user.

use chrono::{DateTime, Utc};
use dashboard_state_api::Toast;
use dashboard_state_core::delay;
use dashboard_state_core::effect::Effect;
use dashboard_state_core::environment::Clock;
use dashboard_state_core::reducer::Reducer;
use dashboard_state_core::{SmallVec, smallvec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Identifier of a displayed toast.
pub type ToastId = u64;

/// How long a toast stays up unless dismissed earlier.
pub const DEFAULT_TOAST_TIMEOUT: Duration = Duration::from_secs(5);

/// A toast currently on screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveToast {
    /// Identifier used to dismiss it
    pub id: ToastId,
    /// What is shown
    pub toast: Toast,
    /// When it appeared
    pub shown_at: DateTime<Utc>,
}

/// UI slice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiState {
    /// Toasts on screen, oldest first
    pub toasts: Vec<ActiveToast>,
    next_id: ToastId,
}

/// UI actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiAction {
    /// Display a toast
    ShowToast(Toast),
    /// Remove a toast
    DismissToast {
        /// Toast to remove
        id: ToastId,
    },
}

/// Dependencies of the UI slice.
#[derive(Clone)]
pub struct UiEnvironment {
    /// Timestamps displayed toasts
    pub clock: Arc<dyn Clock>,
    /// Auto-dismiss delay; `None` keeps toasts until dismissed
    pub toast_timeout: Option<Duration>,
}

impl UiEnvironment {
    /// Toasts auto-dismiss after [`DEFAULT_TOAST_TIMEOUT`].
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            toast_timeout: Some(DEFAULT_TOAST_TIMEOUT),
        }
    }

    /// Override the auto-dismiss delay.
    #[must_use]
    pub const fn with_toast_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.toast_timeout = timeout;
        self
    }
}

impl std::fmt::Debug for UiEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiEnvironment")
            .field("toast_timeout", &self.toast_timeout)
            .finish_non_exhaustive()
    }
}

/// Reducer of the UI slice.
#[derive(Clone, Copy, Debug, Default)]
pub struct UiReducer;

impl Reducer for UiReducer {
    type State = UiState;
    type Action = UiAction;
    type Environment = UiEnvironment;

    fn reduce(&self, state: &mut UiState, action: UiAction, env: &UiEnvironment) -> SmallVec<[Effect<UiAction>; 4]> {
        match action {
            UiAction::ShowToast(toast) => {
                let id = state.next_id;
                state.next_id += 1;
                tracing::info!(id, intent = ?toast.intent, message = %toast.message, "Toast");
                state.toasts.push(ActiveToast {
                    id,
                    toast,
                    shown_at: env.clock.now(),
                });

                match env.toast_timeout {
                    Some(duration) => smallvec![delay! {
                        duration: duration,
                        action: UiAction::DismissToast { id }
                    }],
                    None => SmallVec::new(),
                }
            },
            UiAction::DismissToast { id } => {
                state.toasts.retain(|active| active.id != id);
                SmallVec::new()
            },
        }
    }
}
