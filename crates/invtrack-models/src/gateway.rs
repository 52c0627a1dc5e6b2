use serde::{Deserialize, Serialize};

// Server -> Client opcodes
pub const OP_DISPATCH: u8 = 0;
pub const OP_HEARTBEAT_ACK: u8 = 11;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayMessage {
    pub op: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayMessage {
    /// Event name of a dispatch frame; `None` for every other opcode.
    pub fn dispatch_name(&self) -> Option<&str> {
        if self.op != OP_DISPATCH {
            return None;
        }
        self.t.as_deref()
    }
}

// Dispatch event names
pub const EVENT_READY: &str = "READY";
pub const EVENT_GUILD_MEMBER_ADD: &str = "GUILD_MEMBER_ADD";
pub const EVENT_INVITE_CREATE: &str = "INVITE_CREATE";
pub const EVENT_INVITE_DELETE: &str = "INVITE_DELETE";
