use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tracing::{info, warn};

use crate::buckets;
use crate::distribution;
use crate::error::DashboardResult;
use crate::models::{
    AggregationResult, Candidate, CandidateHighlight, DashboardOverview, Mentor, MentorHighlight,
    PerformanceRecord,
};
use crate::score;
use crate::store::{read_slot, write_slot, RecordSource, SlotStore, AGGREGATION_SLOT, PERFORMANCE_SLOT};
use crate::trend::SnapshotTrendTracker;

pub const RECENT_CANDIDATE_LIMIT: usize = 4;
pub const TOP_MENTOR_LIMIT: usize = 4;

/// Runs one full aggregation pass: read, aggregate, score, persist, trend.
pub struct DashboardEngine<S: RecordSource + ?Sized, K: SlotStore + ?Sized> {
    source: Arc<S>,
    store: Arc<K>,
    trend: SnapshotTrendTracker<K>,
}

impl<S: RecordSource + ?Sized, K: SlotStore + ?Sized> DashboardEngine<S, K> {
    pub fn new(source: Arc<S>, store: Arc<K>) -> Self {
        Self {
            trend: SnapshotTrendTracker::new(store.clone()),
            source,
            store,
        }
    }

    /// A failed collection read abandons the pass before anything is written,
    /// so the previously persisted results stay in place.
    pub async fn run_pass<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DashboardResult<DashboardOverview> {
        let candidates = self.source.candidates().await.inspect_err(|err| {
            warn!(error = %err, "abandoning pass: candidates unavailable");
        })?;
        let interviews = self.source.interviews().await.inspect_err(|err| {
            warn!(error = %err, "abandoning pass: interviews unavailable");
        })?;
        let mentors = self.source.mentors().await.inspect_err(|err| {
            warn!(error = %err, "abandoning pass: mentors unavailable");
        })?;

        let captured_at = now.with_timezone(&Utc);
        let aggregation = AggregationResult {
            day_buckets: buckets::day_buckets(&candidates, &interviews, now),
            month_buckets: buckets::month_buckets(&candidates, &interviews, now),
            status_slices: distribution::status_distribution(&candidates),
            captured_at,
        };
        let performance = score::performance_score(&candidates, &interviews, &mentors);
        let rollup = score::stats_rollup(&candidates, &interviews, &mentors, now);

        if let Err(err) = write_slot(&*self.store, AGGREGATION_SLOT, &aggregation).await {
            warn!(error = %err, "failed to persist aggregation result");
        }
        let record = PerformanceRecord {
            score: performance,
            captured_at,
        };
        if let Err(err) = write_slot(&*self.store, PERFORMANCE_SLOT, &record).await {
            warn!(error = %err, "failed to persist performance score");
        }

        let trend = self.trend.compute_trend(rollup, now).await;

        info!(
            candidates = candidates.len(),
            interviews = interviews.len(),
            mentors = mentors.len(),
            score = performance.value,
            trend = %trend,
            "aggregation pass complete"
        );

        Ok(DashboardOverview {
            aggregation,
            performance: record.score,
            rollup,
            trend,
            recent_candidates: recent_candidates(&candidates),
            top_mentors: top_mentors(&mentors),
        })
    }

    /// Last persisted chart series and score, if both slots hold valid data.
    pub async fn cached_results(&self) -> Option<(AggregationResult, PerformanceRecord)> {
        let aggregation = read_slot(&*self.store, AGGREGATION_SLOT).await?;
        let performance = read_slot(&*self.store, PERFORMANCE_SLOT).await?;
        Some((aggregation, performance))
    }
}

/// The most recently added candidates, newest first.
pub fn recent_candidates(candidates: &[Candidate]) -> Vec<CandidateHighlight> {
    candidates
        .iter()
        .rev()
        .take(RECENT_CANDIDATE_LIMIT)
        .map(|c| CandidateHighlight {
            full_name: c.full_name.clone(),
            position: c.position.clone(),
            status: c.status,
        })
        .collect()
}

pub fn top_mentors(mentors: &[Mentor]) -> Vec<MentorHighlight> {
    let mut ranked: Vec<&Mentor> = mentors.iter().collect();
    ranked.sort_by(|a, b| b.rating.partial_cmp(&a.rating).unwrap_or(std::cmp::Ordering::Equal));
    ranked
        .into_iter()
        .take(TOP_MENTOR_LIMIT)
        .map(|m| MentorHighlight {
            full_name: m.full_name.clone(),
            specialty: m.specialty.clone(),
            rating: m.rating,
            students: m.students,
            verified: m.verified,
        })
        .collect()
}
