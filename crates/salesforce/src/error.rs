//! Error types for the Salesforce connector.

use connectors_common::ErrorClass;

pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by connector operations.
///
/// Bulk operations record the [`BulkPhase`] that failed, so the display reads
/// e.g. `upload data failed: Failed to read CSV data: ...`.
#[derive(Debug, thiserror::Error)]
#[error("{}{kind}", phase_prefix(.phase))]
pub struct Error {
    pub kind: ErrorKind,
    /// Step of the bulk workflow that failed, if any.
    pub phase: Option<BulkPhase>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

fn phase_prefix(phase: &Option<BulkPhase>) -> String {
    phase.map(|p| format!("{} failed: ", p)).unwrap_or_default()
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            phase: None,
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            phase: None,
            source: Some(Box::new(source)),
        }
    }

    /// Attach the phase, keeping an inner phase if one is already set.
    pub fn in_phase(mut self, phase: BulkPhase) -> Self {
        self.phase.get_or_insert(phase);
        self
    }

    /// The transport/protocol error underneath, if this came from the HTTP layer.
    pub fn client_error(&self) -> Option<&connectors_common::Error> {
        self.source.as_ref()?.downcast_ref::<connectors_common::Error>()
    }

    pub fn class(&self) -> ErrorClass {
        match &self.kind {
            ErrorKind::Client { class, .. } => *class,
            ErrorKind::InvalidJobState(_) | ErrorKind::MissingParam(_) => ErrorClass::Caller,
            ErrorKind::ReadData(_)
            | ErrorKind::KeyNotFound(_)
            | ErrorKind::UnsupportedOperation(_)
            | ErrorKind::Csv(_) => ErrorClass::DataIntegrity,
        }
    }

    /// Returns true if retrying the failed step may succeed.
    pub fn is_retryable(&self) -> bool {
        self.client_error().is_some_and(|e| e.is_retryable())
    }

    pub fn is_cancelled(&self) -> bool {
        self.class() == ErrorClass::Cancelled
    }
}

/// Step of the bulk ingestion workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkPhase {
    CreateJob,
    UploadData,
    CloseJob,
    GetJobInfo,
    FetchFailedResults,
    Reconcile,
}

impl std::fmt::Display for BulkPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BulkPhase::CreateJob => "create job",
            BulkPhase::UploadData => "upload data",
            BulkPhase::CloseJob => "close job",
            BulkPhase::GetJobInfo => "get job info",
            BulkPhase::FetchFailedResults => "fetch failed results",
            BulkPhase::Reconcile => "reconcile failures",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Transport, protocol or HTTP status error; the original is kept as source.
    #[error("{message}")]
    Client { class: ErrorClass, message: String },
    #[error("Invalid job state: {0}")]
    InvalidJobState(String),
    #[error("Failed to read CSV data: {0}")]
    ReadData(String),
    #[error("Key not found: '{0}'")]
    KeyNotFound(String),
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("Missing required parameter: {0}")]
    MissingParam(String),
    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<connectors_common::Error> for Error {
    fn from(err: connectors_common::Error) -> Self {
        let kind = ErrorKind::Client {
            class: err.class(),
            message: err.to_string(),
        };
        Error::with_source(kind, err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::with_source(ErrorKind::Csv(err.to_string()), err)
    }
}
