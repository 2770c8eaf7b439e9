//! Subscription notifier adapters.

mod log_notifier;
mod recording_notifier;

pub use log_notifier::LogNotifier;
pub use recording_notifier::RecordingNotifier;
