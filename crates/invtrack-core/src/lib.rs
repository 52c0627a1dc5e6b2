//! Invite cache and join attribution.
//!
//! The tracker mirrors every tracked guild's invite counters and, when a
//! member joins, compares a fresh invite fetch against that mirror to tell
//! which invite was used.

pub mod attribution;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod loader;
pub mod notification;
pub mod router;
pub mod session;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use cache::InviteCache;
pub use config::{GuildFilter, TrackerConfig};
pub use error::{NotificationError, SessionError};
pub use events::{EventBus, JoinReason, TrackerEvent};
pub use notification::Notification;
pub use session::{GuildHandle, Session};
pub use tracker::InviteTracker;
