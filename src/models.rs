use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Interview,
    Verification,
    Test,
    Accepted,
    Rejected,
    Pending,
}

impl CandidateStatus {
    /// Categories shown in the status distribution, in display order.
    pub const TRACKED: [CandidateStatus; 4] = [
        CandidateStatus::Interview,
        CandidateStatus::Test,
        CandidateStatus::Verification,
        CandidateStatus::Accepted,
    ];

    /// Unknown values fall back to `Pending`, matching how the badge view renders them.
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or(CandidateStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Interview => "interview",
            CandidateStatus::Verification => "verification",
            CandidateStatus::Test => "test",
            CandidateStatus::Accepted => "accepted",
            CandidateStatus::Rejected => "rejected",
            CandidateStatus::Pending => "pending",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CandidateStatus::Interview => "Interview",
            CandidateStatus::Verification => "Verification",
            CandidateStatus::Test => "Test stage",
            CandidateStatus::Accepted => "Accepted",
            CandidateStatus::Rejected => "Rejected",
            CandidateStatus::Pending => "Pending",
        }
    }
}

impl FromStr for CandidateStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "interview" => Ok(CandidateStatus::Interview),
            "verification" => Ok(CandidateStatus::Verification),
            "test" => Ok(CandidateStatus::Test),
            "accepted" => Ok(CandidateStatus::Accepted),
            "rejected" => Ok(CandidateStatus::Rejected),
            "pending" => Ok(CandidateStatus::Pending),
            other => Err(format!("unknown candidate status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Scheduled,
    Completed,
}

impl InterviewStatus {
    /// New interviews are created as scheduled, so anything unrecognised is treated as such.
    pub fn parse_lossy(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" => InterviewStatus::Completed,
            _ => InterviewStatus::Scheduled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "scheduled",
            InterviewStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: Uuid,
    pub full_name: String,
    pub position: String,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interview {
    pub id: Uuid,
    pub candidate_name: String,
    pub position: String,
    pub interviewer: String,
    pub scheduled_on: NaiveDate,
    pub status: InterviewStatus,
    pub created_at: DateTime<Utc>,
}

/// `active` is always concrete here; a missing flag becomes `true` where rows are ingested.
#[derive(Debug, Clone, PartialEq)]
pub struct Mentor {
    pub id: Uuid,
    pub full_name: String,
    pub specialty: String,
    pub rating: f64,
    pub students: i32,
    pub verified: bool,
    pub active: bool,
}

/// Mentors are active unless a row says otherwise.
pub fn mentor_active(flag: Option<bool>) -> bool {
    flag.unwrap_or(true)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBucket {
    pub label: String,
    pub date: NaiveDate,
    pub candidate_count: u32,
    pub interview_count: u32,
    pub intensity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBucket {
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub candidate_count: u32,
    pub interview_count: u32,
    pub intensity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSlice {
    pub status: CandidateStatus,
    pub status_label: String,
    pub count: u32,
    pub share_of_total: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceScore {
    pub value: u8,
    pub candidate_accept_rate: u8,
    pub interview_completion_rate: u8,
    pub mentor_active_rate: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRollup {
    pub new_candidate_count: u32,
    pub pending_interview_count: u32,
    pub active_mentor_count: u32,
    pub pending_verification_count: u32,
}

impl StatsRollup {
    pub fn total(&self) -> u64 {
        u64::from(self.new_candidate_count)
            + u64::from(self.pending_interview_count)
            + u64::from(self.active_mentor_count)
            + u64::from(self.pending_verification_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stats_rollup: StatsRollup,
    pub captured_at: DateTime<Utc>,
}

/// Chart series persisted after every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub day_buckets: Vec<DayBucket>,
    pub month_buckets: Vec<MonthBucket>,
    pub status_slices: Vec<StatusSlice>,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub score: PerformanceScore,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateHighlight {
    pub full_name: String,
    pub position: String,
    pub status: CandidateStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MentorHighlight {
    pub full_name: String,
    pub specialty: String,
    pub rating: f64,
    pub students: i32,
    pub verified: bool,
}

/// Everything the overview screen renders after one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardOverview {
    pub aggregation: AggregationResult,
    pub performance: PerformanceScore,
    pub rollup: StatsRollup,
    pub trend: String,
    pub recent_candidates: Vec<CandidateHighlight>,
    pub top_mentors: Vec<MentorHighlight>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_candidate_status_falls_back_to_pending() {
        assert_eq!(CandidateStatus::parse_lossy("archived"), CandidateStatus::Pending);
        assert_eq!(CandidateStatus::parse_lossy(" Accepted "), CandidateStatus::Accepted);
    }

    #[test]
    fn unknown_interview_status_is_scheduled() {
        assert_eq!(InterviewStatus::parse_lossy("completed"), InterviewStatus::Completed);
        assert_eq!(InterviewStatus::parse_lossy(""), InterviewStatus::Scheduled);
    }

    #[test]
    fn missing_mentor_flag_means_active() {
        assert!(mentor_active(None));
        assert!(mentor_active(Some(true)));
        assert!(!mentor_active(Some(false)));
    }

    #[test]
    fn rollup_total_sums_all_counts() {
        let rollup = StatsRollup {
            new_candidate_count: 3,
            pending_interview_count: 2,
            active_mentor_count: 4,
            pending_verification_count: 1,
        };
        assert_eq!(rollup.total(), 10);
    }
}
