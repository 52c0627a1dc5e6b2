use invtrack_models::guild::Guild;
use invtrack_models::invite::Invite;
use invtrack_models::permissions::Permissions;

use crate::error::SessionError;

/// A guild as currently known to the session, together with the session's
/// own standing in it.
#[derive(Debug, Clone)]
pub struct GuildHandle {
    pub guild: Guild,
    /// Effective guild permissions of the session's own member.
    pub own_permissions: Permissions,
}

impl GuildHandle {
    pub fn id(&self) -> i64 {
        self.guild.id
    }

    pub fn can_manage_invites(&self) -> bool {
        self.own_permissions.can_manage_invites()
    }

    pub fn has_vanity_url(&self) -> bool {
        self.guild.has_vanity_url()
    }
}

/// The connection to the platform that delivers notifications and answers
/// fetches. The tracker never retries or times out a fetch itself.
#[allow(async_fn_in_trait)]
pub trait Session: Send + Sync {
    /// Whether the session finished its handshake and can serve fetches.
    fn is_ready(&self) -> bool;

    /// Session-local guild state, without a round trip.
    fn guild(&self, guild_id: i64) -> Option<GuildHandle>;

    /// Every guild the session currently has access to.
    async fn list_guilds(&self) -> Result<Vec<GuildHandle>, SessionError>;

    /// Current invites of one guild, in the order the platform returns them.
    async fn fetch_invites(&self, guild_id: i64) -> Result<Vec<Invite>, SessionError>;
}
