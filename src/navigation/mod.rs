//! Live navigation: session state, route re-anchoring, geofence checks and
//! step-by-step directions, driven by a single worker task.

mod controller;
mod error;
mod event;
mod navigator;
mod notice;
mod session;
mod stepper;
mod types;

#[cfg(test)]
mod testing;

pub use controller::SessionSnapshot;
pub use error::NavError;
pub use event::TrackerEvent;
pub use navigator::{EventRecord, NavigationConfig, Navigator, NavigatorStatus};
pub use notice::{Notice, NoticeLevel};
pub use types::TrackedPosition;
