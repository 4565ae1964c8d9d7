//! Reconciliation of a job's failed-results CSV into a [`FailInfo`].

use tracing::{debug, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::types::{BulkOperationMode, FailInfo, GetJobInfoResult, SF_ERROR_FIELD, SF_ID_FIELD};

/// Where a failed row's reference comes from.
enum Reference {
    /// The record id column (deletes).
    RecordId,
    /// A caller-supplied external id column (upserts).
    Column(usize),
}

/// Group the rows of a failed-results report by error message.
///
/// Rows without a record id are failed creates, the rest failed updates.
/// Upserts are referenced by their external id, deletes by record id.
/// Columns are matched by name, ignoring case and order.
pub fn reconcile_failures(report: &[u8], job: &GetJobInfoResult) -> Result<FailInfo> {
    let external_id_field = match &job.operation {
        BulkOperationMode::Upsert => Some(
            job.external_id_field_name
                .as_deref()
                .filter(|f| !f.is_empty())
                .ok_or_else(|| Error::new(ErrorKind::KeyNotFound("externalIdFieldName".into())))?,
        ),
        BulkOperationMode::Delete => None,
        other => return Err(Error::new(ErrorKind::UnsupportedOperation(other.to_string()))),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(report);

    let headers = reader.headers()?.clone();
    let mut fail_info = FailInfo::partial();

    if headers.is_empty() {
        warn!(job_id = %job.id, "Failed results report is empty");
        return Ok(fail_info);
    }

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::new(ErrorKind::KeyNotFound(name.to_string())))
    };

    let id_idx = column(SF_ID_FIELD)?;
    let error_idx = column(SF_ERROR_FIELD)?;
    let reference_column = match external_id_field {
        Some(field) => Reference::Column(column(field)?),
        None => Reference::RecordId,
    };

    let mut rows = 0usize;
    for record in reader.records() {
        let record = record?;
        let id = field(&record, id_idx)?;
        let message = field(&record, error_idx)?;
        let reference = match reference_column {
            Reference::RecordId => id,
            Reference::Column(idx) => field(&record, idx)?,
        };

        let bucket = if id.is_empty() {
            &mut fail_info.failed_creates
        } else {
            &mut fail_info.failed_updates
        };
        bucket
            .entry(message.to_string())
            .or_default()
            .push(reference.to_string());
        rows += 1;
    }

    debug!(
        job_id = %job.id,
        rows,
        creates = fail_info.failed_creates.len(),
        updates = fail_info.failed_updates.len(),
        "Reconciled failed results"
    );
    if job.number_records_failed > 0 && rows as i64 != job.number_records_failed {
        warn!(
            job_id = %job.id,
            rows,
            reported = job.number_records_failed,
            "Failed results row count differs from job info"
        );
    }

    Ok(fail_info)
}

fn field(record: &csv::StringRecord, idx: usize) -> Result<&str> {
    record.get(idx).ok_or_else(|| {
        Error::new(ErrorKind::Csv(format!(
            "row {} has no column {}",
            record.position().map(|p| p.line()).unwrap_or_default(),
            idx
        )))
    })
}
