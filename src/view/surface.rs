//! The screen the view controller draws on.

use super::Notification;
use image::DynamicImage;

/// Everything the view controller is allowed to change on screen.
///
/// Only the task that owns the [`ViewController`](super::ViewController)
/// calls into a surface.
pub trait Surface {
    /// Shows or hides the busy indicator.
    fn set_busy(&mut self, busy: bool);

    /// Enables or disables the capture trigger.
    fn set_trigger_enabled(&mut self, enabled: bool);

    /// Replaces the displayed image.
    fn show_image(&mut self, image: &DynamicImage);

    /// Shows a transient notification.
    fn notify(&mut self, notification: &Notification);
}

/// Surface that records what it was told, for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    /// Busy indicator shown.
    pub busy: bool,
    /// Capture trigger enabled.
    pub trigger_enabled: bool,
    /// Dimensions of every image shown, in order.
    pub shown: Vec<(u32, u32)>,
    /// Every notification raised, in order.
    pub notifications: Vec<Notification>,
}

impl RecordingSurface {
    /// Creates an empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notification kinds raised so far, in order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.notifications.iter().map(|n| n.notice.kind()).collect()
    }
}

impl Surface for RecordingSurface {
    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    fn set_trigger_enabled(&mut self, enabled: bool) {
        self.trigger_enabled = enabled;
    }

    fn show_image(&mut self, image: &DynamicImage) {
        self.shown.push((image.width(), image.height()));
    }

    fn notify(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }
}
