use thiserror::Error;

use crate::body::BodyMode;

/// The errors produced while building, sending or reading a request.
#[derive(Debug, Error)]
pub enum Error {
    /// The request URL could not be parsed.
    #[error("invalid URL")]
    InvalidUrl(#[from] url::ParseError),
    /// An I/O failure reported by the connection, a body source or a body sink.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    /// No connection factory has been registered for this process.
    #[error("no connection factory registered")]
    NoConnectionFactory,
    /// A header or transport setting was changed after the connection had already
    /// been created.
    #[error("connection already created, request can no longer be configured")]
    ConnectionAlreadyOpen,
    /// A body write implied a different framing than the one the request already
    /// committed to.
    #[error("request body already started as {active}, cannot write {requested}")]
    ModeConflict {
        /// The framing the first body write committed to.
        active: BodyMode,
        /// The framing the rejected call asked for.
        requested: BodyMode,
    },
    /// A body write was attempted after the output channel had been closed.
    #[error("request body output already closed")]
    OutputClosed,
    /// A charset name outside the supported set was encountered.
    #[error("unsupported charset {0:?}")]
    UnsupportedCharset(String),
}

/// A `Result` alias where the `Err` case is [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;
