use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Deserialize;
use thiserror::Error;

use invtrack_core::{
    GuildHandle, InviteTracker, Notification, Session, SessionError, TrackerConfig, TrackerEvent,
};
use invtrack_models::gateway::{
    GatewayMessage, EVENT_INVITE_CREATE, EVENT_INVITE_DELETE, EVENT_READY,
};
use invtrack_models::guild::Guild;
use invtrack_models::invite::{Invite, InviteDelete};
use invtrack_models::permissions::Permissions;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read fixture {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid fixture {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Recorded session: the guilds visible to the bot and the gateway frames it
/// received, in order.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    /// Whether the session was already established when tracking began.
    #[serde(default)]
    pub ready: bool,
    pub guilds: Vec<FixtureGuild>,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureGuild {
    pub guild: Guild,
    #[serde(default)]
    pub own_permissions: Permissions,
    #[serde(default)]
    pub invites: Vec<Invite>,
    /// Invite fetches for this guild fail.
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReplayFrame {
    #[serde(flatten)]
    pub message: GatewayMessage,
    /// Invite code whose counter the platform bumped before this frame.
    #[serde(default)]
    pub redeem: Option<String>,
}

impl Fixture {
    pub fn load(path: &str) -> Result<Self, ReplayError> {
        let content = std::fs::read_to_string(path).map_err(|source| ReplayError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &str, content: &str) -> Result<Self, ReplayError> {
        serde_json::from_str(content).map_err(|source| ReplayError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

/// Session backed by fixture state. Frames mutate the platform side the way
/// the live service would before the tracker sees them.
pub struct ReplaySession {
    ready: AtomicBool,
    guilds: Mutex<Vec<FixtureGuild>>,
}

impl ReplaySession {
    pub fn new(ready: bool, guilds: Vec<FixtureGuild>) -> Self {
        Self {
            ready: AtomicBool::new(ready),
            guilds: Mutex::new(guilds),
        }
    }

    fn guilds(&self) -> MutexGuard<'_, Vec<FixtureGuild>> {
        self.guilds.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bring platform state in line with `frame` before it is delivered.
    pub fn apply(&self, frame: &ReplayFrame) {
        if let Some(code) = &frame.redeem {
            let mut guilds = self.guilds();
            match guilds
                .iter_mut()
                .flat_map(|g| g.invites.iter_mut())
                .find(|invite| &invite.code == code)
            {
                Some(invite) => invite.uses += 1,
                None => tracing::warn!(code = %code, "redeemed invite is not in the fixture"),
            }
        }

        let Some(event) = frame.message.dispatch_name() else {
            return;
        };
        match event {
            EVENT_READY => self.ready.store(true, Ordering::SeqCst),
            EVENT_INVITE_CREATE => {
                if let Some(invite) = payload::<Invite>(&frame.message) {
                    let mut guilds = self.guilds();
                    if let Some(guild) = guilds.iter_mut().find(|g| g.guild.id == invite.guild_id) {
                        guild.invites.retain(|existing| existing.code != invite.code);
                        guild.invites.push(invite);
                    }
                }
            }
            EVENT_INVITE_DELETE => {
                if let Some(deleted) = payload::<InviteDelete>(&frame.message) {
                    for guild in self.guilds().iter_mut() {
                        guild.invites.retain(|existing| existing.code != deleted.code);
                    }
                }
            }
            _ => {}
        }
    }
}

fn payload<T: serde::de::DeserializeOwned>(message: &GatewayMessage) -> Option<T> {
    message
        .d
        .clone()
        .and_then(|d| serde_json::from_value(d).ok())
}

impl Session for ReplaySession {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn guild(&self, guild_id: i64) -> Option<GuildHandle> {
        self.guilds()
            .iter()
            .find(|g| g.guild.id == guild_id)
            .map(|g| GuildHandle {
                guild: g.guild.clone(),
                own_permissions: g.own_permissions,
            })
    }

    async fn list_guilds(&self) -> Result<Vec<GuildHandle>, SessionError> {
        Ok(self
            .guilds()
            .iter()
            .map(|g| GuildHandle {
                guild: g.guild.clone(),
                own_permissions: g.own_permissions,
            })
            .collect())
    }

    async fn fetch_invites(&self, guild_id: i64) -> Result<Vec<Invite>, SessionError> {
        let guilds = self.guilds();
        let guild = guilds
            .iter()
            .find(|g| g.guild.id == guild_id)
            .ok_or(SessionError::UnknownGuild(guild_id))?;
        if guild.unavailable {
            return Err(SessionError::Transport(format!(
                "guild {guild_id} is unavailable"
            )));
        }
        if !guild.own_permissions.can_manage_invites() {
            return Err(SessionError::MissingPermission);
        }
        Ok(guild.invites.clone())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames: usize,
    pub skipped: usize,
    pub events: usize,
}

/// Feed every frame through a tracker, one at a time, handing each outcome
/// to `sink` as soon as it is published.
pub async fn replay<F>(
    fixture: Fixture,
    config: TrackerConfig,
    mut sink: F,
) -> anyhow::Result<ReplaySummary>
where
    F: FnMut(&TrackerEvent) -> anyhow::Result<()>,
{
    let session = Arc::new(ReplaySession::new(fixture.ready, fixture.guilds));
    let tracker = InviteTracker::new(session.clone(), config);
    let mut events = tracker.subscribe();
    let mut summary = ReplaySummary::default();

    tracker.start().await;
    summary.events += forward(&mut events, &mut sink)?;

    for (index, frame) in fixture.frames.iter().enumerate() {
        summary.frames += 1;
        session.apply(frame);
        match Notification::from_gateway(&frame.message) {
            Ok(Some(notification)) => {
                tracing::trace!(index, guild_id = ?notification.guild_id(), "delivering frame");
                tracker.handle(notification).await
            }
            Ok(None) => {
                summary.skipped += 1;
                tracing::debug!(index, event = ?frame.message.t, "frame not tracked");
            }
            Err(e) => {
                summary.skipped += 1;
                tracing::warn!(index, error = %e, "skipping malformed frame");
            }
        }
        summary.events += forward(&mut events, &mut sink)?;
    }

    tracing::info!(
        frames = summary.frames,
        skipped = summary.skipped,
        events = summary.events,
        cached_invites = tracker.cache().len(),
        "replay finished"
    );
    Ok(summary)
}

fn forward<F>(
    events: &mut tokio::sync::broadcast::Receiver<TrackerEvent>,
    sink: &mut F,
) -> anyhow::Result<usize>
where
    F: FnMut(&TrackerEvent) -> anyhow::Result<()>,
{
    use tokio::sync::broadcast::error::TryRecvError;

    let mut forwarded = 0;
    loop {
        match events.try_recv() {
            Ok(event) => {
                sink(&event)?;
                forwarded += 1;
            }
            Err(TryRecvError::Lagged(missed)) => {
                tracing::warn!(missed, "event receiver lagged, outcomes were dropped");
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
        }
    }
    Ok(forwarded)
}
