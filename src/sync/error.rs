use thiserror::Error;

/// Why a [`Renderer`](super::Renderer) could not produce a view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("document is too large to preview ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },
    #[error("document nests {depth} levels deep (limit {limit})")]
    NestingTooDeep { depth: usize, limit: usize },
    #[error("{0}")]
    Other(String),
}

/// A [`DisplaySink`](super::DisplaySink) failed to show a view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DisplayError(pub String);

/// Anomalies raised by the synchronizer. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// An edit arrived with a sequence number that was not newer than the
    /// last one seen. The edit is ignored.
    #[error("ignored edit #{seq}: already saw #{last_seen}")]
    StaleSignal { seq: u64, last_seen: u64 },
    /// The renderer failed for this edit; the previous preview is kept.
    #[error("preview of edit #{seq} failed: {detail}")]
    RenderFailure { seq: u64, detail: String },
    /// The display rejected the rendered view; the previous preview is kept.
    #[error("showing edit #{seq} failed: {source}")]
    DisplayFailure {
        seq: u64,
        #[source]
        source: DisplayError,
    },
}
