//! Bulk API 2.0 ingest jobs.
//!
//! A write runs create -> upload -> close and returns right after the close
//! call. Completion is the caller's loop over [`Connector::get_job_info`] and
//! [`is_done`], followed by [`Connector::fetch_failure_details`] when the job
//! did not finish cleanly.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use connectors_common::decode::expect_media_type;

use crate::connector::Connector;
use crate::error::{BulkPhase, Error, ErrorKind, Result};
use crate::reconcile::reconcile_failures;
use crate::types::{
    BulkOperationMode, BulkOperationParams, BulkOperationResult, CreateIngestJobRequest,
    GetJobInfoResult, JobResults, JobState, UpdateJobStateRequest,
};

const CSV_MEDIA_TYPE: &str = "text/csv";

const PARTIAL_FAILURE_MESSAGE: &str =
    "Some records are not processed successfully. Please refer to the 'failureDetails' for more details.";

const SUCCESS_MESSAGE: &str = "All records processed successfully.";

/// True once a job has reached JobComplete, Failed or Aborted.
pub fn is_done(state: JobState) -> bool {
    state.is_done()
}

/// Summary for a job that has not finished cleanly.
pub fn incomplete_job_message(info: &GetJobInfoResult) -> &'static str {
    match info.state {
        JobState::InProgress | JobState::UploadComplete => {
            "Job is still in progress. Please try again later."
        }
        JobState::Aborted => "Job aborted. Please refer to the JobInfo for more details.",
        JobState::Failed => {
            "No records processed successfully. This is likely due the CSV being empty or issues with CSV column names."
        }
        _ => "Job is in an unknown state.",
    }
}

fn empty_response() -> Error {
    connectors_common::Error::new(connectors_common::ErrorKind::EmptyResponse).into()
}

impl Connector {
    /// Upsert the CSV rows of `params` into `params.object_name`, matching on
    /// the external id field.
    pub async fn bulk_write(
        &self,
        cancel: &CancellationToken,
        params: BulkOperationParams,
    ) -> Result<BulkOperationResult> {
        if params.mode != BulkOperationMode::Upsert || !self.bulk_write_support().upsert {
            return Err(Error::new(ErrorKind::UnsupportedOperation(format!(
                "bulk write with mode {}",
                params.mode
            ))));
        }
        let external_id = params
            .external_id_field
            .clone()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| Error::new(ErrorKind::MissingParam("external_id_field".into())))?;

        self.create_and_run(cancel, params, move |p| {
            Ok(CreateIngestJobRequest::new(&p.object_name, BulkOperationMode::Upsert)
                .with_external_id_field(external_id))
        })
        .await
    }

    /// Delete the records whose ids are listed in the CSV of `params`.
    pub async fn bulk_delete(
        &self,
        cancel: &CancellationToken,
        params: BulkOperationParams,
    ) -> Result<BulkOperationResult> {
        if params.mode != BulkOperationMode::Delete || !self.bulk_write_support().delete {
            return Err(Error::new(ErrorKind::UnsupportedOperation(format!(
                "bulk delete with mode {}",
                params.mode
            ))));
        }

        self.create_and_run(cancel, params, |p| {
            Ok(CreateIngestJobRequest::new(&p.object_name, BulkOperationMode::Delete))
        })
        .await
    }

    /// Create a job from `build_body`, upload the CSV data and close the job.
    ///
    /// The returned state is the one reported by the close call, normally
    /// UploadComplete or InProgress. Nothing is retried; a failed step is
    /// reported with its [`BulkPhase`].
    #[instrument(
        skip(self, cancel, params, build_body),
        fields(object = %params.object_name, mode = %params.mode)
    )]
    pub async fn create_and_run<F>(
        &self,
        cancel: &CancellationToken,
        mut params: BulkOperationParams,
        build_body: F,
    ) -> Result<BulkOperationResult>
    where
        F: FnOnce(&BulkOperationParams) -> Result<CreateIngestJobRequest>,
    {
        if params.object_name.trim().is_empty() {
            return Err(Error::new(ErrorKind::MissingParam("object_name".into())));
        }

        let body = build_body(&params).map_err(|e| e.in_phase(BulkPhase::CreateJob))?;
        let job_id = self
            .create_job(cancel, &body)
            .await
            .map_err(|e| e.in_phase(BulkPhase::CreateJob))?;
        info!(job_id = %job_id, "Created ingest job");

        let data = read_csv(cancel, &mut params.csv_data)
            .await
            .map_err(|e| e.in_phase(BulkPhase::UploadData))?;
        self.upload_data(cancel, &job_id, data)
            .await
            .map_err(|e| e.in_phase(BulkPhase::UploadData))?;
        info!(job_id = %job_id, "Uploaded job data");

        let result = self
            .close_job(cancel, &job_id)
            .await
            .map_err(|e| e.in_phase(BulkPhase::CloseJob))?;
        info!(job_id = %result.job_id, state = %result.state, "Closed ingest job");

        Ok(result)
    }

    async fn create_job(
        &self,
        cancel: &CancellationToken,
        body: &CreateIngestJobRequest,
    ) -> Result<String> {
        let url = self.ingest_url(None, None)?;
        let document = self
            .client
            .post_json(cancel, &url, body)
            .await?
            .ok_or_else(empty_response)?;
        let job = document.json()?;

        let state = job.get_str("state")?;
        if !state.eq_ignore_ascii_case(JobState::Open.as_str()) {
            return Err(Error::new(ErrorKind::InvalidJobState(format!(
                "expected job state to be Open, got {}",
                state
            ))));
        }

        Ok(job.get_str("id")?.to_string())
    }

    async fn upload_data(&self, cancel: &CancellationToken, job_id: &str, data: Bytes) -> Result<()> {
        let url = self.ingest_url(Some(job_id), Some("batches"))?;
        self.client
            .put_bytes(cancel, &url, data, CSV_MEDIA_TYPE)
            .await?;
        Ok(())
    }

    async fn close_job(&self, cancel: &CancellationToken, job_id: &str) -> Result<BulkOperationResult> {
        let url = self.ingest_url(Some(job_id), None)?;
        let document = self
            .client
            .patch_json(cancel, &url, &UpdateJobStateRequest::upload_complete())
            .await?
            .ok_or_else(empty_response)?;
        let job = document.json()?;

        let id = job.get_str("id")?;
        let state: JobState = job.get("state")?.deserialize()?;
        if id != job_id {
            warn!(uploaded = %job_id, returned = %id, "Close returned a different job id");
        }

        Ok(BulkOperationResult {
            job_id: id.to_string(),
            state,
        })
    }

    /// Fetch the current info of a job once.
    #[instrument(skip(self, cancel))]
    pub async fn get_job_info(
        &self,
        cancel: &CancellationToken,
        job_id: &str,
    ) -> Result<GetJobInfoResult> {
        let info = self
            .fetch_job_info(cancel, job_id)
            .await
            .map_err(|e| e.in_phase(BulkPhase::GetJobInfo))?;
        debug!(
            state = %info.state,
            processed = info.number_records_processed,
            failed = info.number_records_failed,
            "Fetched job info"
        );
        Ok(info)
    }

    async fn fetch_job_info(
        &self,
        cancel: &CancellationToken,
        job_id: &str,
    ) -> Result<GetJobInfoResult> {
        if job_id.trim().is_empty() {
            return Err(Error::new(ErrorKind::MissingParam("job_id".into())));
        }
        let url = self.ingest_url(Some(job_id), None)?;
        let document = self
            .client
            .get_json(cancel, &url)
            .await?
            .ok_or_else(empty_response)?;
        Ok(document.deserialize()?)
    }

    /// Poll a job once and summarize it.
    ///
    /// Unfinished and cleanly completed jobs carry no failure details; any
    /// other finished job has its failed results fetched and reconciled.
    #[instrument(skip(self, cancel))]
    pub async fn get_job_results(
        &self,
        cancel: &CancellationToken,
        job_id: &str,
    ) -> Result<JobResults> {
        let info = self.get_job_info(cancel, job_id).await?;

        if !info.is_done() {
            return Ok(JobResults {
                job_id: info.id.clone(),
                state: info.state,
                failure_details: None,
                message: incomplete_job_message(&info).to_string(),
                job_info: Some(info),
            });
        }

        self.fetch_failure_details(cancel, &info).await
    }

    /// Download and reconcile the failed results of a finished job.
    ///
    /// A clean JobComplete returns without fetching anything. Calling this
    /// for a job that is not done is an [`ErrorKind::InvalidJobState`].
    #[instrument(skip(self, cancel, info), fields(job_id = %info.id, state = %info.state))]
    pub async fn fetch_failure_details(
        &self,
        cancel: &CancellationToken,
        info: &GetJobInfoResult,
    ) -> Result<JobResults> {
        if !info.is_done() {
            return Err(Error::new(ErrorKind::InvalidJobState(format!(
                "job {} is {}, failure details require a finished job",
                info.id, info.state
            )))
            .in_phase(BulkPhase::FetchFailedResults));
        }

        if info.is_clean_success() {
            return Ok(JobResults {
                job_id: info.id.clone(),
                state: info.state,
                failure_details: None,
                job_info: Some(info.clone()),
                message: SUCCESS_MESSAGE.to_string(),
            });
        }

        let report = self
            .get_failed_results(cancel, &info.id)
            .await
            .map_err(|e| e.in_phase(BulkPhase::FetchFailedResults))?;

        let failure_details =
            reconcile_failures(&report, info).map_err(|e| e.in_phase(BulkPhase::Reconcile))?;
        info!(
            failures = failure_details.total_failures(),
            "Reconciled failed results"
        );

        Ok(JobResults {
            job_id: info.id.clone(),
            state: info.state,
            failure_details: Some(failure_details),
            job_info: Some(info.clone()),
            message: PARTIAL_FAILURE_MESSAGE.to_string(),
        })
    }

    async fn get_failed_results(&self, cancel: &CancellationToken, job_id: &str) -> Result<Bytes> {
        let url = self.ingest_url(Some(job_id), Some("failedResults"))?;
        let response = self.client.get_raw(cancel, &url, CSV_MEDIA_TYPE).await?;
        expect_media_type(&response, CSV_MEDIA_TYPE, |m| m.essence() == CSV_MEDIA_TYPE)?;
        Ok(response.into_body())
    }
}

/// Drain the caller's CSV source into memory.
async fn read_csv(
    cancel: &CancellationToken,
    source: &mut (dyn AsyncRead + Send + Unpin),
) -> Result<Bytes> {
    let mut buf = Vec::new();
    let read = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        read = source.read_to_end(&mut buf) => Some(read),
    };

    match read {
        None => Err(connectors_common::Error::new(connectors_common::ErrorKind::Cancelled).into()),
        Some(Ok(len)) => {
            debug!(bytes = len, "Read CSV data");
            Ok(Bytes::from(buf))
        }
        Some(Err(err)) => Err(Error::with_source(ErrorKind::ReadData(err.to_string()), err)),
    }
}
