//! Error handling module.
use thiserror::Error;

/// Looking glass sources error enum.
///
/// Configuration errors are fatal to a configuration load. Remote errors are
/// returned per call and carry a description of the failed operation.
#[derive(Error, Debug)]
pub enum LgError {
    #[error("ConfigNotFound: could not find any configuration file (tried {0})")]
    ConfigNotFound(String),

    #[error("ConfigIoError: {0}")]
    ConfigIoError(#[from] std::io::Error),

    #[error("NoBackend: {0} has no backend configuration")]
    NoBackend(String),

    #[error("AmbiguousBackends: {0} has ambiguous backends")]
    AmbiguousBackends(String),

    #[error("DuplicateSource: {0} reuses the id of an earlier source")]
    DuplicateSource(String),

    #[error("UnsupportedBackend: {0} has an unsupported backend")]
    UnsupportedBackend(String),

    #[error("InvalidBackendConfig: {section}: {reason}")]
    InvalidBackendConfig { section: String, reason: String },

    #[error("InvalidRpki: unexpected rpki.invalid configuration: {0:?}")]
    InvalidRpki(Vec<String>),

    #[error("UnknownSource: no source configured with id {0}")]
    UnknownSource(String),

    #[error("BackendUnavailable: no {kind} backend registered for source {source_id}")]
    BackendUnavailable {
        source_id: String,
        kind: &'static str,
    },

    #[error("ConnectError: {context}: {source}")]
    ConnectError {
        context: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("RemoteError: {context}: {source}")]
    RemoteError {
        context: String,
        #[source]
        source: tonic::Status,
    },

    #[error("Timeout: {context} did not finish within {secs} seconds")]
    Timeout { context: String, secs: u64 },
}

impl LgError {
    pub(crate) fn remote<S: Into<String>>(context: S, source: tonic::Status) -> Self {
        LgError::RemoteError {
            context: context.into(),
            source,
        }
    }

    /// Returns true if the error was caused by the remote side being unreachable.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            LgError::RemoteError { source, .. } if source.code() == tonic::Code::Unavailable
        )
    }
}
