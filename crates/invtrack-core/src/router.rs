use std::sync::Arc;

use invtrack_models::invite::{Invite, InviteDelete, InviteSnapshot};
use invtrack_models::member::Member;

use crate::attribution;
use crate::cache::InviteCache;
use crate::config::TrackerConfig;
use crate::events::{JoinReason, TrackerEvent};
use crate::session::Session;

/// Applies scope, mutates the cache and classifies joins. Returns the
/// outcome to publish, or `None` when the notification is dropped.
pub struct EventRouter<S> {
    session: Arc<S>,
    cache: Arc<InviteCache>,
    config: TrackerConfig,
}

impl<S: Session> EventRouter<S> {
    pub fn new(session: Arc<S>, cache: Arc<InviteCache>, config: TrackerConfig) -> Self {
        Self {
            session,
            cache,
            config,
        }
    }

    fn in_scope(&self, guild_id: i64) -> bool {
        let handle = self.session.guild(guild_id);
        let admitted = self
            .config
            .admits(guild_id, handle.as_ref().map(|h| &h.guild));
        if !admitted {
            tracing::debug!(guild_id, "notification outside tracked scope");
        }
        admitted
    }

    /// Classify a join as bot, permissions, normal, vanity or unknown.
    pub async fn member_add(&self, member: Member) -> Option<TrackerEvent> {
        let guild_id = member.guild_id;
        if !self.in_scope(guild_id) {
            return None;
        }

        if member.is_bot() {
            return Some(member_join(member, JoinReason::Bot, None));
        }

        let Some(handle) = self.session.guild(guild_id) else {
            tracing::warn!(guild_id, user_id = member.user.id, "member joined unknown guild");
            return None;
        };
        if !handle.can_manage_invites() {
            return Some(member_join(member, JoinReason::Permissions, None));
        }

        let invites = match self.session.fetch_invites(guild_id).await {
            Ok(invites) => invites,
            Err(e) => {
                tracing::warn!(
                    guild_id,
                    user_id = member.user.id,
                    error = %e,
                    "invite fetch failed, dropping member join"
                );
                return None;
            }
        };
        let fresh: Vec<InviteSnapshot> = invites.iter().map(InviteSnapshot::from).collect();

        let (reason, invite) = match attribution::attribute(&self.cache, &fresh) {
            Some(used) => {
                if used.is_exhausted() {
                    tracing::debug!(guild_id, code = %used.code, "invite reached its use cap");
                }
                self.cache.upsert(used.clone());
                (JoinReason::Normal, Some(used.clone()))
            }
            None => {
                let vanity = self
                    .session
                    .guild(guild_id)
                    .unwrap_or(handle)
                    .has_vanity_url();
                if vanity {
                    (JoinReason::Vanity, None)
                } else {
                    (JoinReason::Unknown, None)
                }
            }
        };

        tracing::debug!(
            guild_id,
            user_id = member.user.id,
            reason = ?reason,
            code = invite.as_ref().map(|i| i.code.as_str()),
            "member join classified"
        );
        Some(member_join(member, reason, invite))
    }

    pub fn invite_create(&self, invite: &Invite) -> Option<TrackerEvent> {
        if !self.in_scope(invite.guild_id) {
            return None;
        }
        let snapshot = InviteSnapshot::from(invite);
        self.cache.upsert(snapshot.clone());
        tracing::debug!(guild_id = invite.guild_id, code = %invite.code, "invite cached");
        Some(TrackerEvent::InviteCreate { invite: snapshot })
    }

    pub fn invite_delete(&self, deleted: &InviteDelete) -> Option<TrackerEvent> {
        if !self.in_scope(deleted.guild_id) {
            return None;
        }
        let removed = self.cache.remove(&deleted.code);
        if removed.is_none() {
            tracing::debug!(
                guild_id = deleted.guild_id,
                code = %deleted.code,
                "deleted invite was not cached"
            );
            if !self.config.emit_unknown_deletes {
                return None;
            }
        }
        Some(TrackerEvent::InviteDelete { invite: removed })
    }
}

fn member_join(member: Member, reason: JoinReason, invite: Option<InviteSnapshot>) -> TrackerEvent {
    TrackerEvent::MemberJoin {
        member,
        reason,
        invite,
    }
}
