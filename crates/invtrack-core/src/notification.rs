use serde::de::DeserializeOwned;

use invtrack_models::gateway::{
    GatewayMessage, EVENT_GUILD_MEMBER_ADD, EVENT_INVITE_CREATE, EVENT_INVITE_DELETE, EVENT_READY,
};
use invtrack_models::invite::{Invite, InviteDelete};
use invtrack_models::member::Member;

use crate::error::NotificationError;

/// Platform notifications the tracker reacts to.
#[derive(Debug, Clone)]
pub enum Notification {
    Ready,
    MemberAdd(Member),
    InviteCreate(Invite),
    InviteDelete(InviteDelete),
}

impl Notification {
    /// Decode a gateway frame. Frames the tracker does not care about
    /// (heartbeats, other dispatches) yield `Ok(None)`.
    pub fn from_gateway(message: &GatewayMessage) -> Result<Option<Self>, NotificationError> {
        let Some(event) = message.dispatch_name() else {
            return Ok(None);
        };
        let notification = match event {
            EVENT_READY => Notification::Ready,
            EVENT_GUILD_MEMBER_ADD => Notification::MemberAdd(decode(event, message)?),
            EVENT_INVITE_CREATE => Notification::InviteCreate(decode(event, message)?),
            EVENT_INVITE_DELETE => Notification::InviteDelete(decode(event, message)?),
            _ => return Ok(None),
        };
        Ok(Some(notification))
    }

    pub fn guild_id(&self) -> Option<i64> {
        match self {
            Notification::Ready => None,
            Notification::MemberAdd(member) => Some(member.guild_id),
            Notification::InviteCreate(invite) => Some(invite.guild_id),
            Notification::InviteDelete(deleted) => Some(deleted.guild_id),
        }
    }
}

fn decode<T: DeserializeOwned>(
    event: &str,
    message: &GatewayMessage,
) -> Result<T, NotificationError> {
    let payload = message
        .d
        .clone()
        .ok_or_else(|| NotificationError::MissingPayload {
            event: event.to_string(),
        })?;
    serde_json::from_value(payload).map_err(|source| NotificationError::Payload {
        event: event.to_string(),
        source,
    })
}
