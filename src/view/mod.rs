//! Single-screen view: state machine, notifications and rendering.
//!
//! The view has two states. A tap in `Idle` (with the camera permission
//! held) launches the capture flow and moves to `Processing`; any outcome
//! of the capture-encode-analyze cycle returns it to `Idle`. While
//! `Processing`, the trigger is disabled, the busy indicator is shown and
//! further taps are ignored.

mod controller;
mod notice;
mod surface;
mod terminal;

pub use controller::{ViewController, ViewEvent, ViewState};
pub use notice::{Length, Notice, Notification, Operation};
pub use surface::{RecordingSurface, Surface};
pub use terminal::TerminalSurface;
