//! In-memory [`PointerDevice`] for tests and dry runs.

use std::time::Duration;

use pentrace_pipeline::{Action, CanvasAction, PixelPoint};

use crate::device::{DeviceError, PointerDevice};

/// One command received by a [`RecordingDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recorded {
    /// The command as an action.
    pub action: CanvasAction,
    /// The device pause in effect when it arrived.
    pub pause: Duration,
}

/// Device that records commands instead of moving a pointer.
///
/// Never sleeps. Can be told to fail once a number of commands have
/// been accepted, to exercise abort and error paths.
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    pause: Duration,
    commands: Vec<Recorded>,
    fail_after: Option<(usize, DeviceError)>,
}

impl RecordingDevice {
    /// A recording device whose pause starts at `pause`.
    #[must_use]
    pub fn with_pause(pause: Duration) -> Self {
        Self {
            pause,
            ..Self::default()
        }
    }

    /// Report [`DeviceError::FailSafe`] for every command after the first
    /// `accepted`.
    #[must_use]
    pub fn fail_safe_after(self, accepted: usize) -> Self {
        self.fail_after(accepted, DeviceError::FailSafe)
    }

    /// Report `error` for every command after the first `accepted`.
    #[must_use]
    pub fn fail_after(mut self, accepted: usize, error: DeviceError) -> Self {
        self.fail_after = Some((accepted, error));
        self
    }

    /// Commands accepted so far.
    #[must_use]
    pub fn commands(&self) -> &[Recorded] {
        &self.commands
    }

    fn record(&mut self, action: CanvasAction) -> Result<(), DeviceError> {
        if let Some((accepted, error)) = &self.fail_after
            && self.commands.len() >= *accepted
        {
            return Err(error.clone());
        }
        self.commands.push(Recorded {
            action,
            pause: self.pause,
        });
        Ok(())
    }
}

impl PointerDevice for RecordingDevice {
    fn pause(&self) -> Duration {
        self.pause
    }

    fn set_pause(&mut self, pause: Duration) {
        self.pause = pause;
    }

    fn move_to(&mut self, to: PixelPoint) -> Result<(), DeviceError> {
        self.record(Action::Move(to))
    }

    fn drag_to(&mut self, to: PixelPoint) -> Result<(), DeviceError> {
        self.record(Action::Drag(to))
    }
}
