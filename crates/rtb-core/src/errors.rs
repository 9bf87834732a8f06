/// Core error type for the bot.
///
/// Adapter crates map their specific failures into this type so the command
/// dispatcher can turn every per-message failure into a chat reply.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("user is not authorized")]
    Unauthorized,

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("unknown status: {token}")]
    UnknownStatus { token: String, valid: Vec<String> },

    #[error("tracker returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
