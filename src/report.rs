use std::fmt::Write;

use chrono::{DateTime, Local};

use crate::models::{
    AggregationResult, DashboardOverview, PerformanceRecord, PerformanceScore, StatsRollup,
};

/// Short console summary of one pass.
pub fn summary(overview: &DashboardOverview) -> String {
    let mut output = String::new();
    write_headline(&mut output, &overview.rollup, &overview.trend);
    write_score(&mut output, &overview.performance);
    output
}

pub fn build_report(overview: &DashboardOverview) -> String {
    let mut output = String::new();
    let generated = overview.aggregation.captured_at.with_timezone(&Local);

    let _ = writeln!(output, "# HR Operations Dashboard");
    let _ = writeln!(output, "Generated {}", generated.format("%A, %B %-d, %Y %H:%M"));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Headline");
    write_headline(&mut output, &overview.rollup, &overview.trend);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance");
    write_score(&mut output, &overview.performance);

    let _ = writeln!(output);
    write_series(&mut output, &overview.aggregation);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Candidates");
    if overview.recent_candidates.is_empty() {
        let _ = writeln!(output, "No candidates yet.");
    } else {
        for candidate in &overview.recent_candidates {
            let _ = writeln!(
                output,
                "- {} ({}): {}",
                candidate.full_name,
                candidate.position,
                candidate.status.label()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Mentors");
    if overview.top_mentors.is_empty() {
        let _ = writeln!(output, "No mentors yet.");
    } else {
        for mentor in &overview.top_mentors {
            let verified = if mentor.verified { ", verified" } else { "" };
            let _ = writeln!(
                output,
                "- {} ({}{}) rating {:.1}, {} students",
                mentor.full_name, mentor.specialty, verified, mentor.rating, mentor.students
            );
        }
    }

    output
}

/// Renders the persisted results of the last pass without recomputing.
pub fn build_cached_report(aggregation: &AggregationResult, performance: &PerformanceRecord) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "# HR Operations Dashboard (cached {})",
        format_instant(&aggregation.captured_at.with_timezone(&Local))
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance");
    write_score(&mut output, &performance.score);
    let _ = writeln!(output);
    write_series(&mut output, aggregation);
    output
}

fn write_headline(output: &mut String, rollup: &StatsRollup, trend: &str) {
    let _ = writeln!(output, "- New candidates (7 days): {}", rollup.new_candidate_count);
    let _ = writeln!(output, "- Pending interviews: {}", rollup.pending_interview_count);
    let _ = writeln!(output, "- Active mentors: {}", rollup.active_mentor_count);
    let _ = writeln!(
        output,
        "- Pending verification: {}",
        rollup.pending_verification_count
    );
    let _ = writeln!(output, "- Trend vs previous pass: {trend}");
}

fn write_score(output: &mut String, score: &PerformanceScore) {
    let _ = writeln!(output, "- Score: {}/100", score.value);
    let _ = writeln!(output, "- Candidate accept rate: {}%", score.candidate_accept_rate);
    let _ = writeln!(
        output,
        "- Interview completion rate: {}%",
        score.interview_completion_rate
    );
    let _ = writeln!(output, "- Mentor active rate: {}%", score.mentor_active_rate);
}

fn write_series(output: &mut String, aggregation: &AggregationResult) {
    let _ = writeln!(output, "## Last 7 Days");
    let _ = writeln!(output, "| Day | Candidates | Interviews | Intensity |");
    let _ = writeln!(output, "|---|---|---|---|");
    for bucket in &aggregation.day_buckets {
        let _ = writeln!(
            output,
            "| {} {} | {} | {} | {} |",
            bucket.label, bucket.date, bucket.candidate_count, bucket.interview_count, bucket.intensity
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Last 12 Months");
    let _ = writeln!(output, "| Month | Candidates | Interviews | Intensity |");
    let _ = writeln!(output, "|---|---|---|---|");
    for bucket in &aggregation.month_buckets {
        let _ = writeln!(
            output,
            "| {} {} | {} | {} | {} |",
            bucket.label, bucket.year, bucket.candidate_count, bucket.interview_count, bucket.intensity
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");
    for slice in &aggregation.status_slices {
        let _ = writeln!(
            output,
            "- {}: {} ({:.1}%)",
            slice.status_label, slice.count, slice.share_of_total
        );
    }
}

fn format_instant(instant: &DateTime<Local>) -> String {
    instant.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateHighlight, CandidateStatus, StatusSlice};
    use chrono::{TimeZone, Utc};

    fn overview() -> DashboardOverview {
        DashboardOverview {
            aggregation: AggregationResult {
                day_buckets: vec![],
                month_buckets: vec![],
                status_slices: vec![StatusSlice {
                    status: CandidateStatus::Interview,
                    status_label: "Interview".to_string(),
                    count: 2,
                    share_of_total: 66.7,
                }],
                captured_at: Utc.with_ymd_and_hms(2026, 2, 18, 9, 0, 0).unwrap(),
            },
            performance: PerformanceScore {
                value: 65,
                candidate_accept_rate: 50,
                interview_completion_rate: 50,
                mentor_active_rate: 100,
            },
            rollup: StatsRollup {
                new_candidate_count: 3,
                pending_interview_count: 2,
                active_mentor_count: 4,
                pending_verification_count: 1,
            },
            trend: "+20%".to_string(),
            recent_candidates: vec![CandidateHighlight {
                full_name: "Zilola Rahimova".to_string(),
                position: "UX Designer".to_string(),
                status: CandidateStatus::Verification,
            }],
            top_mentors: vec![],
        }
    }

    #[test]
    fn report_lists_sections() {
        let report = build_report(&overview());
        assert!(report.starts_with("# HR Operations Dashboard"));
        assert!(report.contains("- Trend vs previous pass: +20%"));
        assert!(report.contains("- Score: 65/100"));
        assert!(report.contains("- Interview: 2 (66.7%)"));
        assert!(report.contains("- Zilola Rahimova (UX Designer): Verification"));
        assert!(report.contains("No mentors yet."));
    }

    #[test]
    fn summary_is_headline_and_score_only() {
        let summary = summary(&overview());
        assert!(summary.contains("- Pending interviews: 2"));
        assert!(summary.contains("- Mentor active rate: 100%"));
        assert!(!summary.contains("## Last 7 Days"));
    }

    #[test]
    fn cached_report_includes_series() {
        let overview = overview();
        let record = PerformanceRecord {
            score: overview.performance,
            captured_at: overview.aggregation.captured_at,
        };
        let report = build_cached_report(&overview.aggregation, &record);
        assert!(report.contains("(cached "));
        assert!(report.contains("## Status Mix"));
    }
}
