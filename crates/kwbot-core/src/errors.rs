/// Core error type.
///
/// The adapter crate maps platform errors into this type so the
/// orchestrator can treat failures uniformly (fatal vs best-effort).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("week arithmetic error: {0}")]
    Week(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
