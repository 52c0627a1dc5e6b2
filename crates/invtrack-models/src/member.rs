use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::user::User;

/// Member payload of a `GUILD_MEMBER_ADD` dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub guild_id: i64,
    pub user: User,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<i64>,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn is_bot(&self) -> bool {
        self.user.bot
    }
}
