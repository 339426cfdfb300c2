//! pentrace-playback: replay actions on an absolute-position pointer.
//!
//! The pipeline produces a static action list; this crate is the
//! consumer that walks it. Pacing comes from the device's own per-command
//! pause, which [`replay`] overrides for the duration of playback through
//! a [`PauseGuard`]. The operator can abort at any time with the device's
//! fail-safe gesture, which ends playback as [`PlaybackReport::Cancelled`].

pub mod device;
pub mod recording;

use std::time::Duration;

use log::{info, warn};
use pentrace_pipeline::{Action, CanvasAction};

pub use device::{DeviceError, PauseGuard, PointerDevice};
pub use recording::{Recorded, RecordingDevice};

/// Timing for one playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Device pause applied after each action.
    pub action_pause: Duration,
    /// Time given to the operator to focus the target window.
    pub start_delay: Duration,
}

impl PlaybackConfig {
    /// Default pause after each action.
    pub const DEFAULT_ACTION_PAUSE: Duration = Duration::from_millis(5);
    /// Default countdown before playback starts.
    pub const DEFAULT_START_DELAY: Duration = Duration::from_secs(5);
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            action_pause: Self::DEFAULT_ACTION_PAUSE,
            start_delay: Self::DEFAULT_START_DELAY,
        }
    }
}

/// How a playback session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackReport {
    /// Every action was executed.
    Completed {
        /// Actions executed.
        executed: usize,
    },
    /// The operator triggered the fail-safe.
    Cancelled {
        /// Actions executed before the abort.
        executed: usize,
    },
    /// The device failed.
    Failed {
        /// Actions executed before the failure.
        executed: usize,
        /// What went wrong.
        error: DeviceError,
    },
}

impl PlaybackReport {
    /// Actions executed before playback ended.
    #[must_use]
    pub const fn executed(&self) -> usize {
        match self {
            Self::Completed { executed }
            | Self::Cancelled { executed }
            | Self::Failed { executed, .. } => *executed,
        }
    }

    /// Returns `true` if every action was executed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Execute `actions` on `device` in order.
///
/// `Move` becomes [`PointerDevice::move_to`] and `Drag` becomes
/// [`PointerDevice::drag_to`]. The device pause is set to
/// `config.action_pause` for the session and restored afterwards on
/// every path. An empty list completes without touching the device.
///
/// `config.start_delay` is not applied here; see [`countdown`].
pub fn replay<D: PointerDevice + ?Sized>(
    device: &mut D,
    actions: &[CanvasAction],
    config: &PlaybackConfig,
) -> PlaybackReport {
    if actions.is_empty() {
        return PlaybackReport::Completed { executed: 0 };
    }

    let mut device = PauseGuard::new(device, config.action_pause);
    for (executed, action) in actions.iter().enumerate() {
        let result = match *action {
            Action::Move(p) => device.move_to(p),
            Action::Drag(p) => device.drag_to(p),
        };
        match result {
            Ok(()) => {}
            Err(DeviceError::FailSafe) => {
                warn!("playback cancelled by fail-safe after {executed} actions");
                return PlaybackReport::Cancelled { executed };
            }
            Err(error) => {
                warn!("playback failed after {executed} actions: {error}");
                return PlaybackReport::Failed { executed, error };
            }
        }
    }

    info!("playback completed: {} actions", actions.len());
    PlaybackReport::Completed {
        executed: actions.len(),
    }
}

/// Sleep for `delay` in steps of at most one second, calling `on_tick`
/// with the remaining time before each step.
pub fn countdown(delay: Duration, mut on_tick: impl FnMut(Duration)) {
    let mut remaining = delay;
    while !remaining.is_zero() {
        on_tick(remaining);
        let step = remaining.min(Duration::from_secs(1));
        std::thread::sleep(step);
        remaining -= step;
    }
}
