use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};

use crate::models::{Candidate, DayBucket, Interview, MonthBucket};

pub const DAYS_IN_WINDOW: i64 = 7;
pub const MONTHS_IN_WINDOW: i32 = 12;
pub const DAY_INTENSITY_MULTIPLIER: u64 = 8;
pub const MONTH_INTENSITY_MULTIPLIER: u64 = 3;

/// Seven daily buckets ending with `now`'s calendar day, oldest first.
///
/// Candidates are placed by `created_at` converted into `now`'s timezone, so a
/// bucket covers local 00:00:00.000 through 23:59:59.999. Interviews are placed
/// by their scheduled calendar date.
pub fn day_buckets<Tz: TimeZone>(
    candidates: &[Candidate],
    interviews: &[Interview],
    now: &DateTime<Tz>,
) -> Vec<DayBucket> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut candidate_days: HashMap<NaiveDate, u32> = HashMap::new();
    for candidate in candidates {
        let local_day = candidate.created_at.with_timezone(&tz).date_naive();
        *candidate_days.entry(local_day).or_insert(0) += 1;
    }

    let mut interview_days: HashMap<NaiveDate, u32> = HashMap::new();
    for interview in interviews {
        *interview_days.entry(interview.scheduled_on).or_insert(0) += 1;
    }

    (0..DAYS_IN_WINDOW)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let candidate_count = candidate_days.get(&date).copied().unwrap_or(0);
            let interview_count = interview_days.get(&date).copied().unwrap_or(0);
            DayBucket {
                label: date.format("%A").to_string(),
                date,
                candidate_count,
                interview_count,
                intensity: intensity(candidate_count, interview_count, DAY_INTENSITY_MULTIPLIER),
            }
        })
        .collect()
}

/// Twelve monthly buckets ending with `now`'s calendar month, oldest first.
pub fn month_buckets<Tz: TimeZone>(
    candidates: &[Candidate],
    interviews: &[Interview],
    now: &DateTime<Tz>,
) -> Vec<MonthBucket> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut candidate_months: HashMap<(i32, u32), u32> = HashMap::new();
    for candidate in candidates {
        let local_day = candidate.created_at.with_timezone(&tz).date_naive();
        *candidate_months
            .entry((local_day.year(), local_day.month()))
            .or_insert(0) += 1;
    }

    let mut interview_months: HashMap<(i32, u32), u32> = HashMap::new();
    for interview in interviews {
        let day = interview.scheduled_on;
        *interview_months.entry((day.year(), day.month())).or_insert(0) += 1;
    }

    (0..MONTHS_IN_WINDOW)
        .rev()
        .map(|offset| {
            let (year, month) = shift_month(today.year(), today.month(), offset);
            let candidate_count = candidate_months.get(&(year, month)).copied().unwrap_or(0);
            let interview_count = interview_months.get(&(year, month)).copied().unwrap_or(0);
            MonthBucket {
                label: month_label(month).to_string(),
                year,
                month,
                candidate_count,
                interview_count,
                intensity: intensity(
                    candidate_count,
                    interview_count,
                    MONTH_INTENSITY_MULTIPLIER,
                ),
            }
        })
        .collect()
}

/// Saturating activity scale capped at 100.
pub fn intensity(candidate_count: u32, interview_count: u32, multiplier: u64) -> u8 {
    let total = u64::from(candidate_count) + u64::from(interview_count);
    total.saturating_mul(multiplier).min(100) as u8
}

/// Calendar month `months_back` months before `year`/`month`.
fn shift_month(year: i32, month: u32, months_back: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) - months_back;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

fn month_label(month: u32) -> &'static str {
    const LABELS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    LABELS[((month + 11) % 12) as usize]
}
