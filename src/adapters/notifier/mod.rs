//! Outbound webhook notifier adapters.

mod http;
mod recording;

pub use http::HttpWebhookNotifier;
pub use recording::{Delivery, RecordingNotifier};
