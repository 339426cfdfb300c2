//! The pointer device capability and its shared pause setting.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use pentrace_pipeline::PixelPoint;

/// Failure reported by a [`PointerDevice`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The operator aborted playback, typically by flinging the pointer
    /// into a screen corner.
    #[error("fail-safe triggered by the operator")]
    FailSafe,

    /// The device could not execute the command.
    #[error("pointer device error: {0}")]
    Device(String),
}

/// Absolute-position pointer control.
///
/// Implementations wait for [`pause`](Self::pause) after every command,
/// which is how playback paces itself. The pause is a setting shared by
/// everything that drives the device, so changes to it must be scoped
/// with a [`PauseGuard`].
pub trait PointerDevice {
    /// Delay applied after each command.
    fn pause(&self) -> Duration;

    /// Change the delay applied after each command.
    fn set_pause(&mut self, pause: Duration);

    /// Lift the pen and move to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::FailSafe`] if the operator aborted and
    /// [`DeviceError::Device`] for any other failure.
    fn move_to(&mut self, to: PixelPoint) -> Result<(), DeviceError>;

    /// Press, drag to `to`, and release.
    ///
    /// # Errors
    ///
    /// Same as [`move_to`](Self::move_to).
    fn drag_to(&mut self, to: PixelPoint) -> Result<(), DeviceError>;
}

/// Scoped override of a device's pause setting.
///
/// Stores the previous pause, applies the new one, and puts the old
/// value back when dropped, whether playback finished, returned early,
/// or unwound from a panic. Derefs to the device.
pub struct PauseGuard<'a, D: PointerDevice + ?Sized> {
    device: &'a mut D,
    previous: Duration,
}

impl<'a, D: PointerDevice + ?Sized> PauseGuard<'a, D> {
    /// Apply `pause` to `device` until the guard is dropped.
    pub fn new(device: &'a mut D, pause: Duration) -> Self {
        let previous = device.pause();
        device.set_pause(pause);
        log::debug!("pointer pause {previous:?} -> {pause:?}");
        Self { device, previous }
    }

    /// The pause that will be restored.
    #[must_use]
    pub const fn previous(&self) -> Duration {
        self.previous
    }
}

impl<D: PointerDevice + ?Sized> Deref for PauseGuard<'_, D> {
    type Target = D;

    fn deref(&self) -> &Self::Target {
        self.device
    }
}

impl<D: PointerDevice + ?Sized> DerefMut for PauseGuard<'_, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.device
    }
}

impl<D: PointerDevice + ?Sized> Drop for PauseGuard<'_, D> {
    fn drop(&mut self) {
        self.device.set_pause(self.previous);
        log::debug!("pointer pause restored to {:?}", self.previous);
    }
}
