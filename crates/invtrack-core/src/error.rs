use thiserror::Error;

/// Failure reported by a [`Session`](crate::session::Session) fetch.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("missing permission")]
    MissingPermission,
    #[error("unknown guild {0}")]
    UnknownGuild(i64),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("dispatch {event} is missing its payload")]
    MissingPayload { event: String },
    #[error("malformed {event} payload: {source}")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}
