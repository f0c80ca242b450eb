use chrono::NaiveDate;
use studylog_shared::stats::{
    self, Bucket, BucketKey, BucketMode, DurationEntry, GoalProgress, StatsError, YearMonth,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn ym(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

fn hours(buckets: &[Bucket]) -> Vec<f64> {
    buckets.iter().map(|b| b.hours()).collect()
}

#[test]
fn to_minutes_and_back() {
    assert_eq!(stats::to_minutes(2, 30).unwrap(), 150);
    assert_eq!(stats::to_minutes(0, 0).unwrap(), 0);
    assert_eq!(stats::to_hours_minutes(150).unwrap(), (2, 30));
    assert_eq!(stats::to_hours_minutes(59).unwrap(), (0, 59));
    assert_eq!(stats::to_hours_minutes(0).unwrap(), (0, 0));
}

#[test]
fn negative_durations_are_rejected() {
    assert!(matches!(
        stats::to_minutes(-1, 0),
        Err(StatsError::InvalidArgument(_))
    ));
    assert!(matches!(
        stats::to_minutes(1, -5),
        Err(StatsError::InvalidArgument(_))
    ));
    assert!(matches!(
        stats::to_hours_minutes(-1),
        Err(StatsError::InvalidArgument(_))
    ));
}

#[test]
fn minutes_to_hours_rounds_to_one_decimal() {
    assert_eq!(stats::minutes_to_hours(90), 1.5);
    assert_eq!(stats::minutes_to_hours(100), 1.7);
    assert_eq!(stats::minutes_to_hours(3), 0.1);
    assert_eq!(stats::minutes_to_hours(2), 0.0);
    assert_eq!(stats::minutes_to_hours(0), 0.0);
}

#[test]
fn year_month_validation() {
    assert!(YearMonth::new(2024, 0).is_err());
    assert!(YearMonth::new(2024, 13).is_err());
    assert!(YearMonth::new(0, 5).is_err());
    assert!(YearMonth::new(10_000, 5).is_err());
    let m = ym(2024, 2);
    assert_eq!(m.days_in_month(), 29);
    assert_eq!(ym(2023, 2).days_in_month(), 28);
    assert_eq!(ym(1900, 2).days_in_month(), 28);
    assert_eq!(ym(2000, 2).days_in_month(), 29);
    assert_eq!(m.to_string(), "2024-02");
    assert_eq!("2024-02".parse::<YearMonth>().unwrap(), m);
    assert!("2024/02".parse::<YearMonth>().is_err());
}

#[test]
fn week_of_month_boundaries() {
    assert_eq!(stats::week_of_month(d(2024, 3, 1)), 1);
    assert_eq!(stats::week_of_month(d(2024, 3, 7)), 1);
    assert_eq!(stats::week_of_month(d(2024, 3, 8)), 2);
    assert_eq!(stats::week_of_month(d(2024, 3, 28)), 4);
    assert_eq!(stats::week_of_month(d(2024, 3, 29)), 5);
    assert_eq!(stats::week_of_month(d(2024, 3, 31)), 5);
}

#[test]
fn weekly_example_31_day_month() {
    let entries = [
        DurationEntry::new(d(2024, 1, 3), 1, 30),
        DurationEntry::new(d(2024, 1, 10), 0, 30),
    ];
    let buckets = stats::bucketize(BucketMode::Weekly, ym(2024, 1), &entries).unwrap();
    assert_eq!(buckets.len(), 5);
    assert_eq!(hours(&buckets), vec![1.5, 0.5, 0.0, 0.0, 0.0]);
    assert_eq!(buckets[0].total_minutes, 90);
    assert_eq!(buckets[1].total_minutes, 30);

    let entries = [
        DurationEntry::new(d(2024, 1, 3), 1, 30),
        DurationEntry::new(d(2024, 1, 5), 0, 30),
        DurationEntry::new(d(2024, 1, 10), 0, 30),
    ];
    let buckets = stats::bucketize(BucketMode::Weekly, ym(2024, 1), &entries).unwrap();
    assert_eq!(hours(&buckets), vec![2.0, 0.5, 0.0, 0.0, 0.0]);
}

#[test]
fn weekly_leap_february_has_five_weeks() {
    let month = ym(2024, 2);
    assert_eq!(month.week_count(), 5);
    let entries = [DurationEntry::new(d(2024, 2, 29), 2, 0)];
    let buckets = stats::bucketize(BucketMode::Weekly, month, &entries).unwrap();
    assert_eq!(buckets.len(), 5);
    assert_eq!(buckets[4].key, BucketKey::Week(5));
    assert_eq!(buckets[4].hours(), 2.0);
    assert_eq!(ym(2023, 2).week_count(), 4);
}

#[test]
fn weekly_ignores_other_months() {
    let entries = [
        DurationEntry::new(d(2024, 4, 30), 3, 0),
        DurationEntry::new(d(2024, 5, 1), 1, 0),
        DurationEntry::new(d(2024, 6, 1), 5, 0),
    ];
    let buckets = stats::bucketize(BucketMode::Weekly, ym(2024, 5), &entries).unwrap();
    let total: i64 = buckets.iter().map(|b| b.total_minutes).sum();
    assert_eq!(total, 60);
}

#[test]
fn weekday_always_seven_sunday_first() {
    let empty = stats::bucketize(BucketMode::Weekday, ym(2024, 6), &[]).unwrap();
    assert_eq!(empty.len(), 7);
    assert!(empty.iter().all(|b| b.total_minutes == 0 && b.hours() == 0.0));
    let labels: Vec<String> = empty.iter().map(|b| b.label()).collect();
    assert_eq!(labels, vec!["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]);

    // 2024-06-02 is a Sunday, 2024-06-08 a Saturday
    let entries = [
        DurationEntry::new(d(2024, 6, 2), 1, 0),
        DurationEntry::new(d(2024, 6, 9), 0, 30),
        DurationEntry::new(d(2024, 6, 8), 0, 45),
    ];
    let buckets = stats::bucketize(BucketMode::Weekday, ym(2024, 6), &entries).unwrap();
    assert_eq!(buckets[0].key, BucketKey::Weekday(0));
    assert_eq!(buckets[0].total_minutes, 90);
    assert_eq!(buckets[6].total_minutes, 45);
    assert_eq!(buckets[1..6].iter().map(|b| b.total_minutes).sum::<i64>(), 0);
}

#[test]
fn trailing_window_rolls_over_year() {
    let window = ym(2024, 1).trailing(stats::TRAILING_MONTHS).unwrap();
    assert_eq!(window.len(), 12);
    assert_eq!(window.first().unwrap().to_string(), "2023-02");
    assert_eq!(window[10].to_string(), "2023-12");
    assert_eq!(window.last().unwrap().to_string(), "2024-01");
    assert!(window.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn trailing_window_cannot_start_before_year_one() {
    let err = ym(1, 5).trailing(stats::TRAILING_MONTHS).unwrap_err();
    assert!(err.to_string().contains("starts before 0001-01"), "{err}");
    assert!(stats::bucketize(BucketMode::Monthly, ym(1, 5), &[]).is_err());
    let earliest = ym(1, 12).trailing(stats::TRAILING_MONTHS).unwrap();
    assert_eq!(earliest.first().unwrap().to_string(), "0001-01");
}

#[test]
fn monthly_buckets_cover_window_only() {
    let entries = [
        DurationEntry::new(d(2023, 12, 31), 1, 0),
        DurationEntry::new(d(2024, 1, 15), 0, 30),
        DurationEntry::new(d(2023, 1, 31), 9, 0), // just outside the window
        DurationEntry::new(d(2024, 2, 1), 9, 0),  // after the reference month
    ];
    let buckets = stats::bucketize(BucketMode::Monthly, ym(2024, 1), &entries).unwrap();
    assert_eq!(buckets.len(), 12);
    assert_eq!(buckets[0].key, BucketKey::Month(ym(2023, 2)));
    assert_eq!(buckets[10].hours(), 1.0);
    assert_eq!(buckets[11].hours(), 0.5);
    assert_eq!(buckets.iter().map(|b| b.total_minutes).sum::<i64>(), 90);
}

#[test]
fn bucketize_propagates_invalid_durations() {
    let entries = [DurationEntry::new(d(2024, 1, 3), -1, 0)];
    assert!(stats::bucketize(BucketMode::Weekly, ym(2024, 1), &entries).is_err());
}

#[test]
fn bucket_mode_parsing() {
    assert_eq!("week".parse::<BucketMode>().unwrap(), BucketMode::Weekly);
    assert_eq!("daily".parse::<BucketMode>().unwrap(), BucketMode::Weekday);
    assert_eq!("Monthly".parse::<BucketMode>().unwrap(), BucketMode::Monthly);
    assert!("yearly".parse::<BucketMode>().is_err());
}

#[test]
fn group_totals_orders_by_time() {
    let rows = vec![
        ("math".to_string(), 1, 0),
        ("english".to_string(), 0, 30),
        ("math".to_string(), 0, 45),
        ("art".to_string(), 0, 30),
    ];
    let totals = stats::group_totals(rows).unwrap();
    assert_eq!(
        totals,
        vec![
            ("math".to_string(), 105),
            ("art".to_string(), 30),
            ("english".to_string(), 30),
        ]
    );
}

#[test]
fn achievement_is_capped() {
    assert_eq!(stats::achievement_percent(20.0, 25.0).unwrap(), 100.0);
    assert_eq!(stats::achievement_percent(20.0, 5.0).unwrap(), 25.0);
    assert_eq!(stats::achievement_percent(0.0, 5.0).unwrap(), 0.0);
    assert_eq!(stats::achievement_percent(-3.0, 5.0).unwrap(), 0.0);
    assert!(stats::achievement_percent(10.0, -1.0).is_err());
    assert!(stats::achievement_percent(f64::NAN, 1.0).is_err());
}

#[test]
fn remaining_days_in_and_out_of_month() {
    let month = ym(2024, 4);
    assert_eq!(stats::remaining_days(month, d(2024, 4, 10)), 20);
    assert_eq!(stats::remaining_days(month, d(2024, 4, 30)), 0);
    assert_eq!(stats::remaining_days(month, d(2024, 5, 1)), 0);
    assert_eq!(stats::remaining_days(month, d(2024, 3, 31)), 0);
}

#[test]
fn daily_goal_rounds_up_to_tenth() {
    assert_eq!(stats::daily_goal(30.0, 10.0, 8).unwrap(), 2.5);
    assert_eq!(stats::daily_goal(10.0, 0.0, 3).unwrap(), 3.4);
    assert_eq!(stats::daily_goal(10.0, 12.0, 3).unwrap(), 0.0);
    assert_eq!(stats::daily_goal(10.0, 0.0, 0).unwrap(), 0.0);
}

#[test]
fn goal_progress_bundle() {
    let p = GoalProgress::compute(40.0, 600, ym(2024, 4), d(2024, 4, 20)).unwrap();
    assert_eq!(p.study_hours, 10.0);
    assert_eq!(p.achievement_percent, 25.0);
    assert_eq!(p.remaining_days, 10);
    assert_eq!(p.daily_goal, 3.0);
    assert!(GoalProgress::compute(40.0, -1, ym(2024, 4), d(2024, 4, 20)).is_err());
}

#[test]
fn goal_progress_uses_exact_time_not_display_rounding() {
    // 9h57m shows as 10.0h but leaves 3 minutes to go
    let p = GoalProgress::compute(10.0, 597, ym(2024, 3), d(2024, 3, 15)).unwrap();
    assert_eq!(p.study_hours, 10.0);
    assert!(p.achievement_percent < 100.0);
    assert_eq!(p.remaining_days, 16);
    assert_eq!(p.daily_goal, 0.1);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn round_trip(h in 0i64..10_000, m in 0i64..60) {
            let total = stats::to_minutes(h, m).unwrap();
            prop_assert_eq!(stats::to_hours_minutes(total).unwrap(), (h, m));
        }

        #[test]
        fn weekly_buckets_conserve_minutes(
            month in 1u32..=12,
            rows in proptest::collection::vec((1u32..=31, 0i64..6, 0i64..60), 0..40),
        ) {
            let m = ym(2023, month);
            let entries: Vec<DurationEntry> = rows
                .iter()
                .map(|&(day, h, mi)| {
                    let day = day.min(m.days_in_month());
                    DurationEntry::new(d(2023, month, day), h, mi)
                })
                .collect();
            let buckets = stats::bucketize(BucketMode::Weekly, m, &entries).unwrap();
            prop_assert_eq!(buckets.len() as u32, m.week_count());
            let bucketed: i64 = buckets.iter().map(|b| b.total_minutes).sum();
            prop_assert_eq!(bucketed, stats::total_minutes(&entries).unwrap());
        }

        #[test]
        fn achievement_monotone_and_capped(
            goal in 0.1f64..500.0,
            a in 0.0f64..1000.0,
            b in 0.0f64..1000.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let p_lo = stats::achievement_percent(goal, lo).unwrap();
            let p_hi = stats::achievement_percent(goal, hi).unwrap();
            prop_assert!(p_lo <= p_hi);
            prop_assert!(p_hi <= 100.0);
        }

        #[test]
        fn trailing_window_is_strictly_increasing(year in 1i32..9999, month in 1u32..=12) {
            let result = ym(year, month).trailing(stats::TRAILING_MONTHS);
            // The earliest complete window ends at 0001-12
            if year == 1 && month < 12 {
                prop_assert!(result.is_err());
                return Ok(());
            }
            let window = result.unwrap();
            prop_assert_eq!(window.len(), 12);
            prop_assert!(window.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(*window.last().unwrap(), ym(year, month));
        }
    }
}
