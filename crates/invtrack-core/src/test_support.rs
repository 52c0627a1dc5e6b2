use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use invtrack_models::guild::Guild;
use invtrack_models::invite::{Invite, InviteDelete, InviteSnapshot};
use invtrack_models::member::Member;
use invtrack_models::permissions::Permissions;
use invtrack_models::user::User;

use crate::error::SessionError;
use crate::session::{GuildHandle, Session};

pub fn snapshot(code: &str, uses: u32, guild_id: i64) -> InviteSnapshot {
    InviteSnapshot {
        code: code.to_string(),
        uses,
        max_uses: None,
        inviter_id: None,
        guild_id,
    }
}

pub fn invite(code: &str, uses: i32, guild_id: i64) -> Invite {
    Invite {
        code: code.to_string(),
        guild_id,
        channel_id: guild_id * 10,
        inviter_id: Some(1),
        uses,
        max_uses: None,
        max_age: None,
        temporary: false,
        created_at: Utc::now(),
    }
}

pub fn invite_delete(code: &str, guild_id: i64) -> InviteDelete {
    InviteDelete {
        code: code.to_string(),
        guild_id,
        channel_id: guild_id * 10,
    }
}

pub fn member(guild_id: i64, bot: bool) -> Member {
    Member {
        guild_id,
        user: User {
            id: 500,
            username: if bot { "helper-bot".into() } else { "newcomer".into() },
            discriminator: None,
            avatar: None,
            bot,
            system: false,
        },
        nick: None,
        roles: Vec::new(),
        joined_at: Utc::now(),
    }
}

/// In-memory session with scripted guild and invite state.
pub struct FakeSession {
    ready: AtomicBool,
    guilds: Mutex<BTreeMap<i64, GuildHandle>>,
    invites: Mutex<BTreeMap<i64, Vec<Invite>>>,
    failing: Mutex<HashSet<i64>>,
    listing_fails: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    fetches: AtomicUsize,
}

impl FakeSession {
    pub fn ready() -> Self {
        Self {
            ready: AtomicBool::new(true),
            guilds: Mutex::new(BTreeMap::new()),
            invites: Mutex::new(BTreeMap::new()),
            failing: Mutex::new(HashSet::new()),
            listing_fails: AtomicBool::new(false),
            fetch_delay: Mutex::new(None),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn pending() -> Self {
        let session = Self::ready();
        session.ready.store(false, Ordering::SeqCst);
        session
    }

    pub fn with_guild(self, guild_id: i64, manage_guild: bool, invites: Vec<Invite>) -> Self {
        let own_permissions = if manage_guild {
            Permissions::VIEW_CHANNEL | Permissions::MANAGE_GUILD
        } else {
            Permissions::VIEW_CHANNEL
        };
        let handle = GuildHandle {
            guild: Guild {
                id: guild_id,
                name: format!("guild {guild_id}"),
                icon: None,
                description: None,
                owner_id: 1,
                member_count: 10,
                features: Vec::new(),
                vanity_url_code: None,
            },
            own_permissions,
        };
        self.guilds.lock().unwrap().insert(guild_id, handle);
        self.invites.lock().unwrap().insert(guild_id, invites);
        self
    }

    pub fn set_vanity(&self, guild_id: i64, code: &str) {
        if let Some(handle) = self.guilds.lock().unwrap().get_mut(&guild_id) {
            handle.guild.vanity_url_code = Some(code.to_string());
        }
    }

    pub fn fail_fetches(&self, guild_id: i64) {
        self.failing.lock().unwrap().insert(guild_id);
    }

    pub fn fail_guild_listing(&self, fail: bool) {
        self.listing_fails.store(fail, Ordering::SeqCst);
    }

    /// Every invite fetch sleeps for `delay` before answering. The answer
    /// reflects invite state from when the fetch started.
    pub fn delay_fetches(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Session for FakeSession {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn guild(&self, guild_id: i64) -> Option<GuildHandle> {
        self.guilds.lock().unwrap().get(&guild_id).cloned()
    }

    async fn list_guilds(&self) -> Result<Vec<GuildHandle>, SessionError> {
        if self.listing_fails.load(Ordering::SeqCst) {
            return Err(SessionError::Transport("guild listing unavailable".into()));
        }
        Ok(self.guilds.lock().unwrap().values().cloned().collect())
    }

    async fn fetch_invites(&self, guild_id: i64) -> Result<Vec<Invite>, SessionError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&guild_id) {
            return Err(SessionError::MissingPermission);
        }
        let invites = self
            .invites
            .lock()
            .unwrap()
            .get(&guild_id)
            .cloned()
            .ok_or(SessionError::UnknownGuild(guild_id));
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        invites
    }
}
