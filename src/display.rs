use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::fmt::Display;

use crate::models::{ApplicationRecord, ApplicationStatus};
use crate::next_action::{NextAction, parse_instant};

/// Shown wherever an optional value is absent.
pub const PLACEHOLDER: &str = "—";

/// Visual bucket for a badge. Carries no meaning beyond picking a style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Neutral,
    Info,
    Accent,
    Success,
    Warning,
    Danger,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Applied => "Applied",
            Self::Screen => "Screen",
            Self::Interview => "Interview",
            Self::Offer => "Offer",
            Self::Rejected => "Rejected",
            Self::Withdrawn => "Withdrawn",
            Self::Ghosted => "Ghosted",
        }
    }

    pub const fn tone(self) -> Tone {
        match self {
            Self::Draft => Tone::Neutral,
            Self::Applied => Tone::Info,
            Self::Screen => Tone::Accent,
            Self::Interview => Tone::Warning,
            Self::Offer => Tone::Success,
            Self::Rejected => Tone::Danger,
            Self::Withdrawn | Self::Ghosted => Tone::Neutral,
        }
    }
}

// Raw-string variants for values read from outside the typed model
// (imported documents, CLI input). Unrecognised statuses fall back.

pub fn status_label(status: &str) -> &'static str {
    ApplicationStatus::parse(status).map_or("Unknown", ApplicationStatus::label)
}

pub fn status_tone(status: &str) -> Tone {
    ApplicationStatus::parse(status).map_or(Tone::default(), ApplicationStatus::tone)
}

/// 1 is the most urgent level.
pub fn priority_label(priority: i64) -> &'static str {
    match priority {
        1 => "Urgent",
        2 => "High",
        3 => "Medium",
        4 => "Low",
        5 => "Someday",
        _ => "Unknown",
    }
}

pub fn priority_tone(priority: i64) -> Tone {
    match priority {
        1 => Tone::Danger,
        2 => Tone::Warning,
        3 => Tone::Info,
        _ => Tone::Neutral,
    }
}

/// Badge text for a priority, e.g. `High (P2)`.
pub fn priority_badge(priority: i64) -> String {
    format!("{} (P{})", priority_label(priority), priority)
}

/// Month and day in the viewer's zone, e.g. `Jan 2`.
pub fn format_short_date<Tz: TimeZone>(iso: Option<&str>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    format_in_zone(iso, tz, "%b %-d")
}

/// Full date in the viewer's zone, e.g. `Jan 2, 2026`.
pub fn format_date<Tz: TimeZone>(iso: Option<&str>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    format_in_zone(iso, tz, "%b %-d, %Y")
}

// A bare `YYYY-MM-DD` is a calendar date and is shown as written.
fn format_in_zone<Tz: TimeZone>(iso: Option<&str>, tz: &Tz, fmt: &str) -> String
where
    Tz::Offset: Display,
{
    let date_only = iso.and_then(|value| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok());
    if let Some(date) = date_only {
        return date.format(fmt).to_string();
    }
    iso.and_then(|value| parse_instant(value, tz))
        .map(|instant: DateTime<Utc>| instant.with_timezone(tz).format(fmt).to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// `Austin, TX • hybrid`, either half alone, or the placeholder.
pub fn location_line(location: Option<&str>, work_mode: Option<&str>) -> String {
    let parts: Vec<&str> = [location, work_mode]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        parts.join(" • ")
    }
}

/// A record plus everything needed to render it, for machine-readable output.
#[derive(Debug, Serialize)]
pub struct ApplicationView<'a> {
    #[serde(flatten)]
    pub record: &'a ApplicationRecord,
    pub status_label: &'static str,
    pub status_tone: Tone,
    pub priority_label: &'static str,
    pub priority_tone: Tone,
    pub next_action: NextAction,
}

impl<'a> ApplicationView<'a> {
    pub fn new(record: &'a ApplicationRecord, next_action: NextAction) -> Self {
        let status = record.status.as_str();
        Self {
            record,
            status_label: status_label(status),
            status_tone: status_tone(status),
            priority_label: priority_label(record.priority),
            priority_tone: priority_tone(record.priority),
            next_action,
        }
    }
}

pub fn or_placeholder(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => PLACEHOLDER,
    }
}
