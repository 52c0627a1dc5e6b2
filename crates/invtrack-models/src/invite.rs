use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Invite as delivered by the platform, either from a list fetch or an
/// `INVITE_CREATE` dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invite {
    pub code: String,
    pub guild_id: i64,
    pub channel_id: i64,
    pub inviter_id: Option<i64>,
    #[serde(default)]
    pub uses: i32,
    pub max_uses: Option<i32>,
    pub max_age: Option<i32>,
    #[serde(default)]
    pub temporary: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload of an `INVITE_DELETE` dispatch. The platform only sends the
/// identifying fields of the invite that went away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteDelete {
    pub code: String,
    pub guild_id: i64,
    pub channel_id: i64,
}

/// Normalized invite record kept in the tracker cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteSnapshot {
    pub code: String,
    pub uses: u32,
    /// `None` means unlimited. A raw cap of zero is folded into `None`.
    pub max_uses: Option<u32>,
    pub inviter_id: Option<i64>,
    pub guild_id: i64,
}

impl InviteSnapshot {
    /// Whether the invite has reached its cap and can no longer admit anyone.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.max_uses, Some(max) if self.uses >= max)
    }
}

impl From<&Invite> for InviteSnapshot {
    fn from(invite: &Invite) -> Self {
        Self {
            code: invite.code.clone(),
            uses: u32::try_from(invite.uses).unwrap_or(0),
            max_uses: invite
                .max_uses
                .and_then(|max| u32::try_from(max).ok())
                .filter(|max| *max > 0),
            inviter_id: invite.inviter_id,
            guild_id: invite.guild_id,
        }
    }
}
