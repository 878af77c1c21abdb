use std::collections::HashMap;

use crate::models::{Candidate, CandidateStatus, StatusSlice};

/// Tallies candidates across the tracked status categories.
///
/// Statuses outside [`CandidateStatus::TRACKED`] count toward neither a slice
/// nor the denominator. Shares are percentages rounded to one decimal.
pub fn status_distribution(candidates: &[Candidate]) -> Vec<StatusSlice> {
    let mut counts: HashMap<CandidateStatus, u32> = HashMap::new();
    for candidate in candidates {
        if CandidateStatus::TRACKED.contains(&candidate.status) {
            *counts.entry(candidate.status).or_insert(0) += 1;
        }
    }

    let total: u32 = counts.values().sum();

    CandidateStatus::TRACKED
        .iter()
        .map(|status| {
            let count = counts.get(status).copied().unwrap_or(0);
            StatusSlice {
                status: *status,
                status_label: status.label().to_string(),
                count,
                share_of_total: share(count, total),
            }
        })
        .collect()
}

fn share(count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let percent = f64::from(count) / f64::from(total) * 100.0;
    ((percent * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn with_status(status: CandidateStatus) -> Candidate {
        Candidate {
            id: Uuid::new_v4(),
            full_name: "Sardor Tursunov".to_string(),
            position: "Backend Developer".to_string(),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_distribution_has_zero_shares() {
        let slices = status_distribution(&[]);
        assert_eq!(slices.len(), 4);
        assert!(slices.iter().all(|s| s.count == 0 && s.share_of_total == 0.0));
    }

    #[test]
    fn untracked_statuses_are_excluded_from_denominator() {
        let candidates = vec![
            with_status(CandidateStatus::Accepted),
            with_status(CandidateStatus::Rejected),
            with_status(CandidateStatus::Pending),
        ];
        let slices = status_distribution(&candidates);
        let accepted = slices
            .iter()
            .find(|s| s.status == CandidateStatus::Accepted)
            .unwrap();
        assert_eq!(accepted.count, 1);
        assert_eq!(accepted.share_of_total, 100.0);
    }

    #[test]
    fn only_untracked_candidates_yield_zero_shares() {
        let candidates = vec![with_status(CandidateStatus::Rejected)];
        let slices = status_distribution(&candidates);
        assert!(slices.iter().all(|s| s.share_of_total == 0.0));
    }

    #[test]
    fn shares_round_to_one_decimal() {
        let candidates = vec![
            with_status(CandidateStatus::Interview),
            with_status(CandidateStatus::Test),
            with_status(CandidateStatus::Test),
        ];
        let slices = status_distribution(&candidates);
        assert_eq!(slices[0].status, CandidateStatus::Interview);
        assert_eq!(slices[0].share_of_total, 33.3);
        assert_eq!(slices[1].share_of_total, 66.7);
        assert_eq!(slices[1].status_label, "Test stage");
    }
}
