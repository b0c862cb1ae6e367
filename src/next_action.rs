//! The "next action" chip: how urgent a follow-up is, judged by the viewer's
//! calendar day rather than by elapsed hours.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;

use crate::display::{PLACEHOLDER, Tone};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextAction {
    pub label: String,
    pub tone: Tone,
}

impl NextAction {
    fn unset() -> Self {
        Self {
            label: PLACEHOLDER.to_string(),
            tone: Tone::Neutral,
        }
    }
}

/// Classify a due instant against `now`.
///
/// Day boundaries come from `tz`: a due time earlier today is "Today at ...",
/// not overdue, even when it has already passed. Overdue counts whole
/// calendar days, so a DST change in between does not skew the number.
pub fn classify<Tz: TimeZone>(due: Option<DateTime<Utc>>, now: DateTime<Utc>, tz: &Tz) -> NextAction
where
    Tz::Offset: Display,
{
    let Some(due) = due else {
        return NextAction::unset();
    };

    let local_due = due.with_timezone(tz);
    let due_day = local_due.date_naive();
    let today = now.with_timezone(tz).date_naive();

    if due_day < today {
        let days = (today - due_day).num_days().max(1);
        return NextAction {
            label: format!("Overdue • {}d", days),
            tone: Tone::Danger,
        };
    }

    if due_day == today {
        return NextAction {
            label: format!("Today at {}", local_due.format("%-I:%M %p")),
            tone: Tone::Warning,
        };
    }

    if today.succ_opt() == Some(due_day) {
        return NextAction {
            label: "Tomorrow".to_string(),
            tone: Tone::Neutral,
        };
    }

    NextAction {
        label: local_due.format("%b %-d").to_string(),
        tone: Tone::Neutral,
    }
}

/// Same as [`classify`] for a stored string. Anything unparseable reads as
/// "no next action".
pub fn classify_iso<Tz: TimeZone>(due: Option<&str>, now: DateTime<Utc>, tz: &Tz) -> NextAction
where
    Tz::Offset: Display,
{
    classify(due.and_then(|value| parse_instant(value, tz)), now, tz)
}

/// Read a stored date or date-time.
///
/// - RFC 3339 values are absolute.
/// - `YYYY-MM-DD` is midnight UTC.
/// - A date-time with no offset (what a date-time picker produces) is wall
///   clock time in `tz`. Inside a spring-forward gap it moves ahead an hour.
pub fn parse_instant<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    const LOCAL_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())?;

    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}
