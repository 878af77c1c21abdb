use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::models::{
    Candidate, CandidateStatus, Interview, InterviewStatus, Mentor, PerformanceScore, StatsRollup,
};

pub const ACCEPT_WEIGHT: f64 = 40.0;
pub const COMPLETION_WEIGHT: f64 = 30.0;
pub const MENTOR_WEIGHT: f64 = 30.0;

/// Lookback for the "new candidates" rollup count.
pub const NEW_CANDIDATE_WINDOW_DAYS: i64 = 7;

/// Weighted 0-100 score over accept, completion and mentor-activity rates.
///
/// A component whose denominator is zero contributes nothing.
pub fn performance_score(
    candidates: &[Candidate],
    interviews: &[Interview],
    mentors: &[Mentor],
) -> PerformanceScore {
    let accepted = candidates
        .iter()
        .filter(|c| c.status == CandidateStatus::Accepted)
        .count();
    let completed = interviews
        .iter()
        .filter(|i| i.status == InterviewStatus::Completed)
        .count();
    let active = mentors.iter().filter(|m| m.active).count();

    let accept_ratio = ratio(accepted, candidates.len());
    let completion_ratio = ratio(completed, interviews.len());
    let mentor_ratio = ratio(active, mentors.len());

    let score = accept_ratio * ACCEPT_WEIGHT
        + completion_ratio * COMPLETION_WEIGHT
        + mentor_ratio * MENTOR_WEIGHT;

    PerformanceScore {
        value: to_percent(score),
        candidate_accept_rate: to_percent(accept_ratio * 100.0),
        interview_completion_rate: to_percent(completion_ratio * 100.0),
        mentor_active_rate: to_percent(mentor_ratio * 100.0),
    }
}

/// Four-count summary captured once per pass and used as the trend baseline.
pub fn stats_rollup<Tz: TimeZone>(
    candidates: &[Candidate],
    interviews: &[Interview],
    mentors: &[Mentor],
    now: &DateTime<Tz>,
) -> StatsRollup {
    let cutoff = now.with_timezone(&Utc) - Duration::days(NEW_CANDIDATE_WINDOW_DAYS);

    StatsRollup {
        new_candidate_count: count(candidates.iter().filter(|c| c.created_at > cutoff)),
        pending_interview_count: count(
            interviews
                .iter()
                .filter(|i| i.status == InterviewStatus::Scheduled),
        ),
        active_mentor_count: count(mentors.iter().filter(|m| m.active)),
        pending_verification_count: count(
            candidates
                .iter()
                .filter(|c| c.status == CandidateStatus::Verification),
        ),
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn to_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn count<I: Iterator>(items: I) -> u32 {
    u32::try_from(items.count()).unwrap_or(u32::MAX)
}
