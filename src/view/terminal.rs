//! Terminal rendition of the screen.

use super::{Length, Notice, Notification, Surface};
use image::DynamicImage;
use std::path::PathBuf;

/// Prints notifications to stdout and writes the displayed image to disk.
#[derive(Debug)]
pub struct TerminalSurface {
    output: Option<PathBuf>,
    busy: bool,
    trigger_enabled: bool,
    failure: Option<Notice>,
}

impl TerminalSurface {
    /// `output` receives every displayed image; `None` keeps images in
    /// memory only.
    pub fn new(output: Option<PathBuf>) -> Self {
        Self {
            output,
            busy: false,
            trigger_enabled: true,
            failure: None,
        }
    }

    /// First notice that ended a cycle without a result.
    pub fn failure(&self) -> Option<&Notice> {
        self.failure.as_ref()
    }
}

impl Surface for TerminalSurface {
    fn set_busy(&mut self, busy: bool) {
        if busy != self.busy {
            println!("{}", if busy { "[working...]" } else { "[done]" });
        }
        self.busy = busy;
    }

    fn set_trigger_enabled(&mut self, enabled: bool) {
        if enabled && !self.trigger_enabled {
            println!("Press Enter to take a photo (p = pause, r = resume, h = health, q = quit)");
        }
        self.trigger_enabled = enabled;
    }

    fn show_image(&mut self, image: &DynamicImage) {
        let Some(path) = &self.output else {
            return;
        };
        match image.save(path) {
            Ok(()) => println!(
                "Image {}x{} written to {}",
                image.width(),
                image.height(),
                path.display()
            ),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "Failed to write image"),
        }
    }

    fn notify(&mut self, notification: &Notification) {
        if self.failure.is_none() && notification.notice.aborts_cycle() {
            self.failure = Some(notification.notice.clone());
        }
        let stamp = notification.raised_at.format("%H:%M:%S");
        match notification.length() {
            Length::Short => println!("[{stamp}] {}", notification.message()),
            Length::Long => println!("[{stamp}]\n{}\n", notification.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Operation;

    #[test]
    fn test_first_failure_kept() {
        let mut surface = TerminalSurface::new(None);
        surface.notify(&Notification::new(Notice::ProcessedImageUnavailable));
        assert!(surface.failure().is_none());

        surface.notify(&Notification::new(Notice::Unreachable {
            operation: Operation::Analyze,
            url: "http://127.0.0.1:5000/analyze".to_string(),
        }));
        surface.notify(&Notification::new(Notice::CaptureCancelled));
        assert_eq!(surface.failure().map(Notice::kind), Some("unreachable"));
    }
}
