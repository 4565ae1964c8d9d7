//! Types for Bulk API 2.0 ingest jobs.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tokio::io::AsyncRead;

/// Record id column of a failed-results report.
pub const SF_ID_FIELD: &str = "sf__Id";

/// Error message column of a failed-results report.
pub const SF_ERROR_FIELD: &str = "sf__Error";

/// Deserialize API version that can be either a float (59.0) or string ("59.0").
pub(crate) fn deserialize_api_version<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ApiVersion {
        Float(f64),
        String(String),
    }

    Option::<ApiVersion>::deserialize(deserializer).map(|opt| {
        opt.map(|v| match v {
            ApiVersion::Float(f) => format!("{:.1}", f),
            ApiVersion::String(s) => s,
        })
    })
}

/// Bulk API 2.0 job states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    /// Job is open and accepting data
    Open,
    /// Upload is complete, job is queued for processing
    UploadComplete,
    /// Job is processing
    InProgress,
    /// Job was aborted
    Aborted,
    /// Job finished; individual records may still have failed
    JobComplete,
    /// Job failed
    Failed,
    /// A state this client does not know about
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// True for JobComplete, Failed and Aborted.
    pub fn is_done(&self) -> bool {
        matches!(
            self,
            JobState::Aborted | JobState::JobComplete | JobState::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Open => "Open",
            JobState::UploadComplete => "UploadComplete",
            JobState::InProgress => "InProgress",
            JobState::Aborted => "Aborted",
            JobState::JobComplete => "JobComplete",
            JobState::Failed => "Failed",
            JobState::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ingest operation of a job.
///
/// Only upsert and delete can be started through this crate, but job info
/// may report any operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BulkOperationMode {
    Insert,
    Update,
    Upsert,
    Delete,
    HardDelete,
    Other(String),
}

impl BulkOperationMode {
    /// Get the API string for this operation.
    pub fn api_name(&self) -> &str {
        match self {
            BulkOperationMode::Insert => "insert",
            BulkOperationMode::Update => "update",
            BulkOperationMode::Upsert => "upsert",
            BulkOperationMode::Delete => "delete",
            BulkOperationMode::HardDelete => "hardDelete",
            BulkOperationMode::Other(name) => name,
        }
    }
}

impl From<String> for BulkOperationMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "insert" => BulkOperationMode::Insert,
            "update" => BulkOperationMode::Update,
            "upsert" => BulkOperationMode::Upsert,
            "delete" => BulkOperationMode::Delete,
            "hardDelete" => BulkOperationMode::HardDelete,
            _ => BulkOperationMode::Other(value),
        }
    }
}

impl From<BulkOperationMode> for String {
    fn from(mode: BulkOperationMode) -> Self {
        mode.api_name().to_string()
    }
}

impl std::fmt::Display for BulkOperationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Content type for Bulk API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContentType {
    #[default]
    #[serde(rename = "CSV")]
    Csv,
}

/// Line ending style for Bulk API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LineEnding {
    /// Unix-style (LF)
    #[default]
    #[serde(rename = "LF")]
    Lf,
    /// Windows-style (CRLF)
    #[serde(rename = "CRLF")]
    Crlf,
}

/// Input to a bulk write or delete.
///
/// The CSV source is read once, to the end, before the upload.
pub struct BulkOperationParams {
    /// Target object, e.g. "Account"
    pub object_name: String,
    /// External id field; required for upserts
    pub external_id_field: Option<String>,
    pub csv_data: Box<dyn AsyncRead + Send + Unpin>,
    pub mode: BulkOperationMode,
}

impl BulkOperationParams {
    pub fn new(
        object_name: impl Into<String>,
        mode: BulkOperationMode,
        csv_data: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self {
            object_name: object_name.into(),
            external_id_field: None,
            csv_data: Box::new(csv_data),
            mode,
        }
    }

    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field = Some(field.into());
        self
    }
}

impl std::fmt::Debug for BulkOperationParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulkOperationParams")
            .field("object_name", &self.object_name)
            .field("external_id_field", &self.external_id_field)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// Request to create an ingest job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIngestJobRequest {
    /// SObject API name
    pub object: String,
    pub operation: BulkOperationMode,
    /// External ID field for upsert
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id_field_name: Option<String>,
    pub content_type: ContentType,
    pub line_ending: LineEnding,
}

impl CreateIngestJobRequest {
    pub fn new(object: impl Into<String>, operation: BulkOperationMode) -> Self {
        Self {
            object: object.into(),
            operation,
            external_id_field_name: None,
            content_type: ContentType::default(),
            line_ending: LineEnding::default(),
        }
    }

    /// Set the external ID field for upsert operations.
    pub fn with_external_id_field(mut self, field: impl Into<String>) -> Self {
        self.external_id_field_name = Some(field.into());
        self
    }
}

/// Request to change a job's state.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateJobStateRequest {
    pub state: JobState,
}

impl UpdateJobStateRequest {
    /// Signal that all data has been uploaded.
    pub fn upload_complete() -> Self {
        Self {
            state: JobState::UploadComplete,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// State of a job right after it was closed.
///
/// Normally UploadComplete or InProgress; poll for the terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationResult {
    pub job_id: String,
    pub state: JobState,
}

/// Ingest job info as reported by Salesforce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetJobInfoResult {
    pub id: String,
    pub object: String,
    pub operation: BulkOperationMode,
    pub state: JobState,
    #[serde(default)]
    pub external_id_field_name: Option<String>,
    #[serde(default)]
    pub created_by_id: Option<String>,
    #[serde(default)]
    pub column_delimiter: Option<String>,
    #[serde(default)]
    pub line_ending: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub number_records_processed: i64,
    #[serde(default)]
    pub number_records_failed: i64,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub retries: Option<i64>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub system_modstamp: Option<String>,
    /// Total processing time in milliseconds
    #[serde(default)]
    pub total_processing_time: Option<i64>,
    #[serde(default)]
    pub api_active_processing_time: Option<i64>,
    #[serde(default)]
    pub apex_processing_time: Option<i64>,
    /// API version (can be float like 59.0 or string like "59.0")
    #[serde(default, deserialize_with = "deserialize_api_version")]
    pub api_version: Option<String>,
    #[serde(default)]
    pub concurrency_mode: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub is_pk_chunking_supported: Option<bool>,
}

impl GetJobInfoResult {
    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// Finished with every record processed successfully.
    pub fn is_clean_success(&self) -> bool {
        self.state == JobState::JobComplete && self.number_records_failed == 0
    }
}

/// Per-record failures of a job, grouped by error message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailInfo {
    pub failure_type: String,
    /// Records that had an id: error message -> references
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failed_updates: BTreeMap<String, Vec<String>>,
    /// Records that were never assigned an id: error message -> references
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failed_creates: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FailInfo {
    pub const PARTIAL: &'static str = "Partial";

    pub fn partial() -> Self {
        Self {
            failure_type: Self::PARTIAL.to_string(),
            ..Default::default()
        }
    }

    /// Number of references across both maps.
    pub fn total_failures(&self) -> usize {
        self.failed_updates
            .values()
            .chain(self.failed_creates.values())
            .map(Vec::len)
            .sum()
    }
}

/// Outcome of a job, with failure details when any were fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResults {
    pub job_id: String,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_details: Option<FailInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_info: Option<GetJobInfoResult>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl JobResults {
    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }
}

/// Single record to delete through the REST API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteParams {
    pub object_name: String,
    pub record_id: String,
}

impl DeleteParams {
    pub fn new(object_name: impl Into<String>, record_id: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            record_id: record_id.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub success: bool,
}
