use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::ValueEnum;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DashboardError, DashboardResult};
use crate::models::{mentor_active, Candidate, CandidateStatus, Interview, InterviewStatus, Mentor};
use crate::store::{RecordSource, SlotStore};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let now = Utc::now();
    let today = now.date_naive();

    let candidates = vec![
        (
            Uuid::parse_str("c41e8b27-7d3a-4f65-a9c2-1b5f0e6d8a01")?,
            "Alisher Karimov",
            "Frontend Developer",
            CandidateStatus::Interview,
        ),
        (
            Uuid::parse_str("c41e8b27-7d3a-4f65-a9c2-1b5f0e6d8a02")?,
            "Zilola Rahimova",
            "UX Designer",
            CandidateStatus::Verification,
        ),
        (
            Uuid::parse_str("c41e8b27-7d3a-4f65-a9c2-1b5f0e6d8a03")?,
            "Sardor Tursunov",
            "Backend Developer",
            CandidateStatus::Test,
        ),
    ];

    for (id, name, position, status) in candidates {
        insert_candidate(pool, id, name, position, status, now).await?;
    }

    let interviews = vec![
        (
            Uuid::parse_str("6f1c9a43-51b8-4d0e-9a57-0d6b7f2c1e01")?,
            "Alisher Karimov",
            "Frontend Developer",
            "Jamshid Toshmatov",
            today,
        ),
        (
            Uuid::parse_str("6f1c9a43-51b8-4d0e-9a57-0d6b7f2c1e02")?,
            "Zilola Rahimova",
            "UX Designer",
            "Nigora Saidova",
            today,
        ),
        (
            Uuid::parse_str("6f1c9a43-51b8-4d0e-9a57-0d6b7f2c1e03")?,
            "Sardor Tursunov",
            "Backend Developer",
            "Bobur Alijonov",
            today + Duration::days(1),
        ),
    ];

    for (id, candidate, position, interviewer, scheduled_on) in interviews {
        insert_interview(
            pool,
            id,
            candidate,
            position,
            interviewer,
            scheduled_on,
            InterviewStatus::Scheduled,
            now,
        )
        .await?;
    }

    let mentors = vec![
        (
            Uuid::parse_str("a2b7e0d4-8c6f-4f3e-b1d2-5e9c0f7a3b01")?,
            "Jasur Hakimbekov",
            "Frontend Development",
            4.9,
            45,
        ),
        (
            Uuid::parse_str("a2b7e0d4-8c6f-4f3e-b1d2-5e9c0f7a3b02")?,
            "Aziz Badalov",
            "Full Stack Developer",
            4.8,
            38,
        ),
        (
            Uuid::parse_str("a2b7e0d4-8c6f-4f3e-b1d2-5e9c0f7a3b03")?,
            "Behruz Satimbayev",
            "Full Stack Development",
            4.7,
            42,
        ),
        (
            Uuid::parse_str("a2b7e0d4-8c6f-4f3e-b1d2-5e9c0f7a3b04")?,
            "Ziyovuddin Abdurashidov",
            "Frontend Development",
            4.9,
            45,
        ),
    ];

    for (id, name, specialty, rating, students) in mentors {
        insert_mentor(pool, id, name, specialty, rating, students, true, Some(true)).await?;
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportKind {
    Candidates,
    Interviews,
    Mentors,
}

pub async fn import_csv(
    pool: &PgPool,
    kind: ImportKind,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;

    let inserted = match kind {
        ImportKind::Candidates => import_candidates(pool, &mut reader).await?,
        ImportKind::Interviews => import_interviews(pool, &mut reader).await?,
        ImportKind::Mentors => import_mentors(pool, &mut reader).await?,
    };

    info!(?kind, inserted, path = %csv_path.display(), "csv import finished");
    Ok(inserted)
}

async fn import_candidates(
    pool: &PgPool,
    reader: &mut csv::Reader<std::fs::File>,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: Option<Uuid>,
        full_name: String,
        #[serde(default)]
        position: String,
        status: String,
        created_at: Option<DateTime<Utc>>,
    }

    let mut inserted = 0usize;
    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let affected = insert_candidate(
            pool,
            row.id.unwrap_or_else(Uuid::new_v4),
            &row.full_name,
            &row.position,
            CandidateStatus::parse_lossy(&row.status),
            row.created_at.unwrap_or_else(Utc::now),
        )
        .await?;
        inserted += affected as usize;
    }
    Ok(inserted)
}

async fn import_interviews(
    pool: &PgPool,
    reader: &mut csv::Reader<std::fs::File>,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: Option<Uuid>,
        candidate_name: String,
        #[serde(default)]
        position: String,
        #[serde(default)]
        interviewer: String,
        scheduled_on: NaiveDate,
        #[serde(default)]
        status: String,
        created_at: Option<DateTime<Utc>>,
    }

    let mut inserted = 0usize;
    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let affected = insert_interview(
            pool,
            row.id.unwrap_or_else(Uuid::new_v4),
            &row.candidate_name,
            &row.position,
            &row.interviewer,
            row.scheduled_on,
            InterviewStatus::parse_lossy(&row.status),
            row.created_at.unwrap_or_else(Utc::now),
        )
        .await?;
        inserted += affected as usize;
    }
    Ok(inserted)
}

async fn import_mentors(
    pool: &PgPool,
    reader: &mut csv::Reader<std::fs::File>,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: Option<Uuid>,
        full_name: String,
        #[serde(default)]
        specialty: String,
        #[serde(default)]
        rating: f64,
        #[serde(default)]
        students: i32,
        #[serde(default)]
        verified: bool,
        active: Option<bool>,
    }

    let mut inserted = 0usize;
    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let affected = insert_mentor(
            pool,
            row.id.unwrap_or_else(Uuid::new_v4),
            &row.full_name,
            &row.specialty,
            row.rating,
            row.students,
            row.verified,
            Some(mentor_active(row.active)),
        )
        .await?;
        inserted += affected as usize;
    }
    Ok(inserted)
}

async fn insert_candidate(
    pool: &PgPool,
    id: Uuid,
    full_name: &str,
    position: &str,
    status: CandidateStatus,
    created_at: DateTime<Utc>,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO hr_dashboard.candidates (id, full_name, position, status, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(position)
    .bind(status.as_str())
    .bind(created_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

#[allow(clippy::too_many_arguments)]
async fn insert_interview(
    pool: &PgPool,
    id: Uuid,
    candidate_name: &str,
    position: &str,
    interviewer: &str,
    scheduled_on: NaiveDate,
    status: InterviewStatus,
    created_at: DateTime<Utc>,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO hr_dashboard.interviews
        (id, candidate_name, position, interviewer, scheduled_on, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(candidate_name)
    .bind(position)
    .bind(interviewer)
    .bind(scheduled_on)
    .bind(status.as_str())
    .bind(created_at)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

#[allow(clippy::too_many_arguments)]
async fn insert_mentor(
    pool: &PgPool,
    id: Uuid,
    full_name: &str,
    specialty: &str,
    rating: f64,
    students: i32,
    verified: bool,
    active: Option<bool>,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO hr_dashboard.mentors
        (id, full_name, specialty, rating, students, verified, active)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(specialty)
    .bind(rating)
    .bind(students)
    .bind(verified)
    .bind(active)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Reads the three dashboard collections from Postgres in insertion order.
#[derive(Clone)]
pub struct PgRecordSource {
    pool: PgPool,
}

impl PgRecordSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn candidate_from_row(row: &PgRow) -> Result<Candidate, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Candidate {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        position: row.try_get("position")?,
        status: CandidateStatus::parse_lossy(&status),
        created_at: row.try_get("created_at")?,
    })
}

fn interview_from_row(row: &PgRow) -> Result<Interview, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Interview {
        id: row.try_get("id")?,
        candidate_name: row.try_get("candidate_name")?,
        position: row.try_get("position")?,
        interviewer: row.try_get("interviewer")?,
        scheduled_on: row.try_get("scheduled_on")?,
        status: InterviewStatus::parse_lossy(&status),
        created_at: row.try_get("created_at")?,
    })
}

fn mentor_from_row(row: &PgRow) -> Result<Mentor, sqlx::Error> {
    let active: Option<bool> = row.try_get("active")?;
    Ok(Mentor {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        specialty: row.try_get("specialty")?,
        rating: row.try_get("rating")?,
        students: row.try_get("students")?,
        verified: row.try_get("verified")?,
        active: mentor_active(active),
    })
}

fn read_error(collection: &'static str) -> impl Fn(sqlx::Error) -> DashboardError {
    move |source| DashboardError::RecordSource { collection, source }
}

#[async_trait]
impl RecordSource for PgRecordSource {
    async fn candidates(&self) -> DashboardResult<Vec<Candidate>> {
        let rows = sqlx::query(
            "SELECT id, full_name, position, status, created_at \
             FROM hr_dashboard.candidates ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("candidates"))?;

        let candidates = rows
            .iter()
            .map(candidate_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_error("candidates"))?;
        debug!(count = candidates.len(), "loaded candidates");
        Ok(candidates)
    }

    async fn interviews(&self) -> DashboardResult<Vec<Interview>> {
        let rows = sqlx::query(
            "SELECT id, candidate_name, position, interviewer, scheduled_on, status, created_at \
             FROM hr_dashboard.interviews ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("interviews"))?;

        let interviews = rows
            .iter()
            .map(interview_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_error("interviews"))?;
        debug!(count = interviews.len(), "loaded interviews");
        Ok(interviews)
    }

    async fn mentors(&self) -> DashboardResult<Vec<Mentor>> {
        let rows = sqlx::query(
            "SELECT id, full_name, specialty, rating, students, verified, active \
             FROM hr_dashboard.mentors ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(read_error("mentors"))?;

        let mentors = rows
            .iter()
            .map(mentor_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_error("mentors"))?;
        debug!(count = mentors.len(), "loaded mentors");
        Ok(mentors)
    }
}

/// Named slots backed by `hr_dashboard.dashboard_slots`.
#[derive(Clone)]
pub struct PgSlotStore {
    pool: PgPool,
}

impl PgSlotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotStore for PgSlotStore {
    async fn get(&self, name: &str) -> DashboardResult<Option<String>> {
        let row = sqlx::query("SELECT payload FROM hr_dashboard.dashboard_slots WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| DashboardError::SlotStore {
                slot: name.to_string(),
                source,
            })?;

        row.map(|row| row.try_get::<String, _>("payload"))
            .transpose()
            .map_err(|source| DashboardError::SlotStore {
                slot: name.to_string(),
                source,
            })
    }

    async fn set(&self, name: &str, payload: String) -> DashboardResult<()> {
        sqlx::query(
            r#"
            INSERT INTO hr_dashboard.dashboard_slots (name, payload, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (name) DO UPDATE
            SET payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(name)
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(|source| DashboardError::SlotStore {
            slot: name.to_string(),
            source,
        })?;
        Ok(())
    }
}
