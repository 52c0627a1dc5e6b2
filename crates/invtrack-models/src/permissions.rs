use bitflags::bitflags;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Guild-level permission bits of the session's own member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Permissions: i64 {
        const CREATE_INSTANT_INVITE = 1 << 0;
        const KICK_MEMBERS         = 1 << 1;
        const BAN_MEMBERS          = 1 << 2;
        const ADMINISTRATOR        = 1 << 3;
        const MANAGE_CHANNELS      = 1 << 4;
        const MANAGE_GUILD         = 1 << 5;
        const VIEW_AUDIT_LOG       = 1 << 7;
        const VIEW_CHANNEL         = 1 << 10;
        const MANAGE_ROLES         = 1 << 28;
    }
}

impl Permissions {
    /// Listing a guild's invites requires MANAGE_GUILD; administrators
    /// implicitly hold it.
    pub fn can_manage_invites(self) -> bool {
        self.intersects(Self::MANAGE_GUILD | Self::ADMINISTRATOR)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.bits())
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // The gateway sends permission sets as decimal strings; accept plain
        // integers as well.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        let bits = match Raw::deserialize(deserializer)? {
            Raw::Int(bits) => bits,
            Raw::Str(s) => s.trim().parse::<i64>().map_err(<D::Error as de::Error>::custom)?,
        };
        Ok(Permissions::from_bits_truncate(bits))
    }
}
