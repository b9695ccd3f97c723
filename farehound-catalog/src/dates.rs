use chrono::{Datelike, Duration, NaiveDate, Weekday};
use farehound_core::{CoreError, CoreResult, TripWindow};

/// Dates `baseline + offset` for every offset in `start_offset..=end_offset`
/// whose weekday is listed, in ascending order.
///
/// Offsets that land outside the representable calendar are skipped without
/// being visited.
pub fn generate_dates(
    weekdays: &[Weekday],
    start_offset: i64,
    end_offset: i64,
    baseline: NaiveDate,
) -> Vec<NaiveDate> {
    let lowest = NaiveDate::MIN.signed_duration_since(baseline).num_days();
    let highest = NaiveDate::MAX.signed_duration_since(baseline).num_days();

    (start_offset.max(lowest)..=end_offset.min(highest))
        .filter_map(|offset| add_days(baseline, offset))
        .filter(|date| weekdays.contains(&date.weekday()))
        .collect()
}

/// (depart, return) pairs for a window, return = depart + trip duration.
pub fn trip_dates(window: &TripWindow, baseline: NaiveDate) -> CoreResult<Vec<(NaiveDate, NaiveDate)>> {
    generate_dates(&window.weekdays, window.start_offset, window.end_offset, baseline)
        .into_iter()
        .map(|depart| {
            add_days(depart, window.trip_duration)
                .map(|inbound| (depart, inbound))
                .ok_or_else(|| {
                    CoreError::ValidationError(format!(
                        "return date {} days after {} is out of range",
                        window.trip_duration, depart
                    ))
                })
        })
        .collect()
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    Duration::try_days(days).and_then(|delta| date.checked_add_signed(delta))
}
