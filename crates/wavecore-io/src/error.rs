//! Error taxonomy for the transport, backend, and analysis layers (§7).

/// Error kinds raised by the transport and backend layers.
///
/// Infallible hot-path operations (ring buffer read/write, effect `process`)
/// never return `Result`; backpressure and clipping are reported through
/// counters and events instead, per §4.A/§4.E/§4.F.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration rejected before any native resources were touched.
    #[error("configuration rejected: {0}")]
    ConfigRejected(String),

    /// Neither the primary nor the secondary backend could be loaded.
    #[error("no audio backend available: {0}")]
    BackendUnavailable(String),

    /// A backend accepted the configuration but the hardware refused it.
    #[error("device open failed: {0}")]
    DeviceOpenFailed(String),

    /// Operation attempted before `initialize`.
    #[error("engine not initialized")]
    NotInitialized,

    /// Operation requires the Running state.
    #[error("engine not running")]
    NotRunning,

    /// Operation is invalid in the engine's current state (e.g. device
    /// change while running).
    #[error("invalid operation for current engine state")]
    InvalidState,

    /// Operation attempted on a disposed engine.
    #[error("engine has been disposed")]
    Disposed,

    /// Spectral analysis attempted on audio shorter than 10 seconds.
    #[error("audio too short for analysis (minimum 10s)")]
    TooShort,

    /// The requested device could not be found during enumeration.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for this crate's fallible operations.
pub type Result<T> = std::result::Result<T, Error>;
