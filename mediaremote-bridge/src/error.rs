use thiserror::Error;

/// The bridge specific result type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The MediaRemote framework bundle could not be loaded from the given path.
    #[error("MediaRemote framework could not be loaded from {0}")]
    FrameworkNotFound(String),
    /// A function or data symbol is missing from the loaded framework.
    #[error("symbol {0} not found in the MediaRemote framework")]
    SymbolNotFound(&'static str),
    #[error("unknown MediaRemote command code {0}")]
    UnknownCommand(isize),
    #[error("failed to run osascript, {0}")]
    Script(String),
    /// The media source loop is no longer receiving events.
    #[error("media source is not running")]
    SourceClosed,
    #[error("invalid configuration value for {key}: {value}")]
    InvalidConfig { key: &'static str, value: String },
}
