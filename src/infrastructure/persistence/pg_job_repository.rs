use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{ArtifactPaths, Job, JobId, JobStatus, Segment};

/// Relational alternative to the in-memory store; same contract. The
/// transition reducers read the current row `FOR UPDATE` inside a
/// transaction so concurrent workers serialize per job id.
///
/// Expects a `jobs` table:
/// id uuid primary key, source_url text, status text, created_at
/// timestamptz, completed_at timestamptz, transcript text, segments
/// jsonb, error_message text, srt_path text, vtt_path text.
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn transition<F>(
        &self,
        id: JobId,
        to: JobStatus,
        apply: F,
    ) -> Result<Option<Job>, RepositoryError>
    where
        F: FnOnce(&mut Job) + Send,
    {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let row = sqlx::query(
            "SELECT id, source_url, status, created_at, completed_at, transcript, segments, \
             error_message, srt_path, vtt_path FROM jobs WHERE id = $1 FOR UPDATE",
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let mut job = match row {
            Some(row) => job_from_row(&row)?,
            None => return Err(RepositoryError::NotFound(id)),
        };

        // Repeating the current status writes nothing; the None signals
        // callers to skip transition side effects.
        if job.status == to {
            tx.commit()
                .await
                .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
            return Ok(None);
        }
        if !job.status.allows(to) {
            return Err(RepositoryError::InvalidTransition {
                from: job.status,
                to,
            });
        }

        apply(&mut job);

        let segments_json = match &job.segments {
            Some(segments) => Some(
                serde_json::to_value(segments)
                    .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?,
            ),
            None => None,
        };

        sqlx::query(
            "UPDATE jobs SET status = $1, completed_at = $2, transcript = $3, segments = $4, \
             error_message = $5, srt_path = $6, vtt_path = $7 WHERE id = $8",
        )
        .bind(job.status.as_str())
        .bind(job.completed_at)
        .bind(job.transcript.as_deref())
        .bind(segments_json)
        .bind(job.error_message.as_deref())
        .bind(job.artifacts.as_ref().map(|a| a.srt.display().to_string()))
        .bind(job.artifacts.as_ref().map(|a| a.vtt.display().to_string()))
        .bind(job.id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
        Ok(Some(job))
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO jobs (id, source_url, status, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(job.id.as_uuid())
        .bind(&job.source_url)
        .bind(job.status.as_str())
        .bind(job.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::ConstraintViolation(format!("job already exists: {}", job.id))
            }
            other => RepositoryError::QueryFailed(other.to_string()),
        })?;
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, source_url, status, created_at, completed_at, transcript, segments, \
             error_message, srt_path, vtt_path FROM jobs WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.map(|row| job_from_row(&row)).transpose()
    }

    async fn mark_running(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        self.transition(id, JobStatus::Running, |job| job.mark_running())
            .await
    }

    async fn mark_complete(
        &self,
        id: JobId,
        transcript: &str,
        segments: &[Segment],
        artifacts: Option<ArtifactPaths>,
    ) -> Result<Option<Job>, RepositoryError> {
        self.transition(id, JobStatus::Complete, |job| {
            job.mark_complete(transcript.to_string(), segments.to_vec(), artifacts)
        })
        .await
    }

    async fn mark_error(&self, id: JobId, message: &str) -> Result<Option<Job>, RepositoryError> {
        self.transition(id, JobStatus::Error, |job| job.mark_error(message))
            .await
    }
}

fn job_from_row(row: &PgRow) -> Result<Job, RepositoryError> {
    let query_err = |e: sqlx::Error| RepositoryError::QueryFailed(e.to_string());

    let id: Uuid = row.try_get("id").map_err(query_err)?;
    let status_str: String = row.try_get("status").map_err(query_err)?;
    let status = JobStatus::from_str(&status_str).map_err(RepositoryError::QueryFailed)?;

    let segments: Option<Vec<Segment>> = row
        .try_get::<Option<serde_json::Value>, _>("segments")
        .map_err(query_err)?
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

    let srt_path: Option<String> = row.try_get("srt_path").map_err(query_err)?;
    let vtt_path: Option<String> = row.try_get("vtt_path").map_err(query_err)?;
    let artifacts = match (srt_path, vtt_path) {
        (Some(srt), Some(vtt)) => Some(ArtifactPaths {
            srt: PathBuf::from(srt),
            vtt: PathBuf::from(vtt),
        }),
        _ => None,
    };

    Ok(Job {
        id: JobId::from_uuid(id),
        source_url: row.try_get("source_url").map_err(query_err)?,
        status,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(query_err)?,
        completed_at: row.try_get("completed_at").map_err(query_err)?,
        transcript: row.try_get("transcript").map_err(query_err)?,
        segments,
        error_message: row.try_get("error_message").map_err(query_err)?,
        artifacts,
    })
}
