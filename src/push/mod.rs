//! Push event intake: payload decoding, event types, and the feed
//! subscription that delivers events while the portal web app is closed.

pub mod event;
pub mod payload;
pub mod subscriber;

pub use event::{NotificationClickEvent, PushEvent};
pub use payload::PushPayload;
pub use subscriber::{FeedSubscriber, ReconnectPolicy};
