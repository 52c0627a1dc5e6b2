use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use invtrack_models::invite::InviteSnapshot;
use invtrack_models::member::Member;

/// How a member got into the guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinReason {
    /// A cached invite's counter advanced.
    Normal,
    /// No invite advanced and the guild has a vanity link.
    Vanity,
    /// No invite advanced and there is no vanity link.
    Unknown,
    /// The session may not list this guild's invites.
    Permissions,
    /// Bot accounts join through application authorization, not invites.
    Bot,
}

/// Outcome published to tracker subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    CacheReady {
        invites: HashMap<String, InviteSnapshot>,
    },
    MemberJoin {
        member: Member,
        reason: JoinReason,
        invite: Option<InviteSnapshot>,
    },
    InviteCreate {
        invite: InviteSnapshot,
    },
    /// `invite` is `None` when the deleted code was never cached.
    InviteDelete {
        invite: Option<InviteSnapshot>,
    },
}

impl TrackerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TrackerEvent::CacheReady { .. } => "cache_ready",
            TrackerEvent::MemberJoin { .. } => "member_join",
            TrackerEvent::InviteCreate { .. } => "invite_create",
            TrackerEvent::InviteDelete { .. } => "invite_delete",
        }
    }
}

/// Broadcast-based fan-out of tracker outcomes. Dropping a receiver
/// unsubscribes it.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TrackerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: TrackerEvent) {
        let name = event.name();
        // No subscribers is not an error
        if self.sender.send(event).is_err() {
            tracing::trace!(event = name, "tracker event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
