use std::sync::Arc;

use futures_util::future::join_all;
use invtrack_models::invite::InviteSnapshot;

use crate::cache::InviteCache;
use crate::config::TrackerConfig;
use crate::error::SessionError;
use crate::session::Session;

/// Bulk-populates the cache from invite list fetches.
pub struct CacheLoader<S> {
    session: Arc<S>,
    cache: Arc<InviteCache>,
    config: TrackerConfig,
}

impl<S: Session> CacheLoader<S> {
    pub fn new(session: Arc<S>, cache: Arc<InviteCache>, config: TrackerConfig) -> Self {
        Self {
            session,
            cache,
            config,
        }
    }

    /// Refresh one guild's invites. Out-of-scope guilds are skipped and fetch
    /// failures are logged; returns the number of invites stored.
    pub async fn load_guild(&self, guild_id: i64) -> usize {
        let handle = self.session.guild(guild_id);
        if !self.config.admits(guild_id, handle.as_ref().map(|h| &h.guild)) {
            tracing::debug!(guild_id, "skipping invite load for out-of-scope guild");
            return 0;
        }
        let _load = self.cache.begin_load();
        self.fill_from(guild_id).await
    }

    /// Load every in-scope guild the session can see, fetching all of them
    /// concurrently. One guild failing does not affect the others. Only a
    /// failure to list the guilds at all is returned.
    pub async fn load_all(&self) -> Result<usize, SessionError> {
        let _load = self.cache.begin_load();
        let guilds = self.session.list_guilds().await?;
        let guild_ids: Vec<i64> = guilds
            .iter()
            .filter(|handle| self.config.admits(handle.id(), Some(&handle.guild)))
            .map(|handle| handle.id())
            .collect();

        join_all(guild_ids.iter().map(|guild_id| self.fill_from(*guild_id))).await;

        tracing::info!(
            guilds = guild_ids.len(),
            invites = self.cache.len(),
            "invite cache loaded"
        );
        Ok(guild_ids.len())
    }

    async fn fill_from(&self, guild_id: i64) -> usize {
        match self.session.fetch_invites(guild_id).await {
            Ok(invites) => {
                let mut stored = 0;
                for invite in &invites {
                    if self.cache.restore(InviteSnapshot::from(invite)) {
                        stored += 1;
                    } else {
                        tracing::debug!(
                            guild_id,
                            code = %invite.code,
                            "invite deleted during load, not restored"
                        );
                    }
                }
                tracing::debug!(guild_id, invites = stored, "guild invites cached");
                stored
            }
            Err(e) => {
                tracing::warn!(guild_id, error = %e, "failed to fetch invites for guild");
                0
            }
        }
    }
}
