use std::fmt;
use std::sync::Arc;

use invtrack_models::guild::Guild;

/// Predicate over guild attributes; `true` keeps the guild in scope.
pub type GuildFilter = Arc<dyn Fn(&Guild) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct TrackerConfig {
    /// Track only this guild.
    pub guild_id: Option<i64>,
    /// Track only guilds accepted by this predicate. Combined with
    /// `guild_id` as an AND when both are set.
    pub guild_filter: Option<GuildFilter>,
    /// Emit `InviteDelete(None)` when a deleted code was never cached.
    pub emit_unknown_deletes: bool,
    /// Capacity of the outcome broadcast channel.
    pub event_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            guild_id: None,
            guild_filter: None,
            emit_unknown_deletes: true,
            event_capacity: 1024,
        }
    }
}

impl fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("guild_id", &self.guild_id)
            .field("guild_filter", &self.guild_filter.as_ref().map(|_| "<fn>"))
            .field("emit_unknown_deletes", &self.emit_unknown_deletes)
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}

impl TrackerConfig {
    pub fn for_guild(guild_id: i64) -> Self {
        Self {
            guild_id: Some(guild_id),
            ..Self::default()
        }
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Guild) -> bool + Send + Sync + 'static,
    {
        self.guild_filter = Some(Arc::new(filter));
        self
    }

    /// Scope check for a notification about `guild_id`. A configured filter
    /// cannot be evaluated without guild state, so an unknown guild is out of
    /// scope whenever a filter is set.
    pub fn admits(&self, guild_id: i64, guild: Option<&Guild>) -> bool {
        if self.guild_id.is_some_and(|id| id != guild_id) {
            return false;
        }
        match (&self.guild_filter, guild) {
            (None, _) => true,
            (Some(filter), Some(guild)) => filter(guild),
            (Some(_), None) => false,
        }
    }
}
