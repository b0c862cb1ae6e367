use anyhow::{Result, anyhow};

use crate::models::{ApplicationRecord, ApplicationStatus, MAX_PRIORITY, MIN_PRIORITY};

/// Work modes offered by the browser's filter cycle. Records may carry others.
pub const WORK_MODES: [&str; 3] = ["remote", "hybrid", "onsite"];

const WILDCARD: &str = "all";

/// Active filters. `None` on a criterion is the "all" wildcard, and an empty
/// (after trimming) search matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub status: Option<ApplicationStatus>,
    pub priority: Option<i64>,
    pub work_mode: Option<String>,
}

impl FilterCriteria {
    pub fn is_default(&self) -> bool {
        self.search.trim().is_empty()
            && self.status.is_none()
            && self.priority.is_none()
            && self.work_mode.is_none()
    }

    /// Build criteria from user input where each value may be `all`.
    pub fn from_args(
        search: Option<&str>,
        status: Option<&str>,
        priority: Option<&str>,
        work_mode: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            search: search.unwrap_or_default().to_string(),
            status: status.map(parse_status).transpose()?.flatten(),
            priority: priority.map(parse_priority).transpose()?.flatten(),
            work_mode: work_mode.and_then(parse_work_mode),
        })
    }
}

fn is_wildcard(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case(WILDCARD)
}

fn parse_status(value: &str) -> Result<Option<ApplicationStatus>> {
    if is_wildcard(value) {
        return Ok(None);
    }
    ApplicationStatus::parse(value)
        .map(Some)
        .ok_or_else(|| anyhow!("Unknown status '{}'", value))
}

fn parse_priority(value: &str) -> Result<Option<i64>> {
    if is_wildcard(value) {
        return Ok(None);
    }
    match value.trim().parse::<i64>() {
        Ok(p) if (MIN_PRIORITY..=MAX_PRIORITY).contains(&p) => Ok(Some(p)),
        _ => Err(anyhow!(
            "Priority must be {}-{} or 'all', got '{}'",
            MIN_PRIORITY,
            MAX_PRIORITY,
            value
        )),
    }
}

fn parse_work_mode(value: &str) -> Option<String> {
    if is_wildcard(value) || value.trim().is_empty() {
        None
    } else {
        Some(value.trim().to_string())
    }
}

/// Whether `record` passes every active criterion.
pub fn matches(record: &ApplicationRecord, criteria: &FilterCriteria) -> bool {
    if let Some(status) = criteria.status {
        if record.status != status {
            return false;
        }
    }

    if let Some(priority) = criteria.priority {
        if record.priority != priority {
            return false;
        }
    }

    if let Some(mode) = &criteria.work_mode {
        let record_mode = record.work_mode.as_deref().unwrap_or("").to_lowercase();
        if record_mode != mode.to_lowercase() {
            return false;
        }
    }

    let query = criteria.search.trim().to_lowercase();
    if !query.is_empty() {
        let company = record.company_name.to_lowercase();
        let role = record.role_title.to_lowercase();
        if !company.contains(&query) && !role.contains(&query) {
            return false;
        }
    }

    true
}

/// The records passing `criteria`, in their original order.
pub fn apply<'a>(
    records: &'a [ApplicationRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a ApplicationRecord> {
    records.iter().filter(|r| matches(r, criteria)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewApplication;
    use pretty_assertions::assert_eq;

    fn record(id: &str, company: &str, role: &str) -> ApplicationRecord {
        NewApplication {
            company_name: company.into(),
            role_title: role.into(),
            status: ApplicationStatus::Applied,
            priority: 3,
            applied_at: None,
            next_action_at: None,
            next_action_label: None,
            location: None,
            work_mode: None,
            notes: None,
        }
        .into_record(id.into())
    }

    fn sample() -> Vec<ApplicationRecord> {
        let mut ibm = record("1", "IBM", "Entry Level Software Engineer");
        ibm.status = ApplicationStatus::Rejected;
        ibm.priority = 1;
        ibm.work_mode = Some("hybrid".into());

        let mut google = record("2", "Google", "Frontend Engineer");
        google.status = ApplicationStatus::Screen;
        google.work_mode = Some("Remote".into());

        let mut ghost = record("3", "No Response LLC", "Backend Googler");
        ghost.status = ApplicationStatus::Ghosted;
        ghost.priority = 3;

        vec![ibm, google, ghost]
    }

    fn ids(rows: &[&ApplicationRecord]) -> Vec<String> {
        rows.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn default_criteria_keep_everything_in_order() {
        let rows = sample();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_default());
        let kept = apply(&rows, &criteria);
        assert_eq!(kept.len(), rows.len());
        assert!(kept.iter().zip(rows.iter()).all(|(a, b)| *a == b));
    }

    #[test]
    fn search_matches_company_or_role_case_insensitively() {
        let rows = sample();
        let criteria = FilterCriteria {
            search: "  GOOG ".into(),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&rows, &criteria)), vec!["2", "3"]);

        let criteria = FilterCriteria {
            search: "xyz".into(),
            ..Default::default()
        };
        assert!(apply(&rows, &criteria).is_empty());

        let criteria = FilterCriteria {
            search: "   ".into(),
            ..Default::default()
        };
        assert_eq!(apply(&rows, &criteria).len(), 3);
    }

    #[test]
    fn status_and_priority_are_exact() {
        let rows = sample();
        let criteria = FilterCriteria {
            status: Some(ApplicationStatus::Screen),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&rows, &criteria)), vec!["2"]);

        let criteria = FilterCriteria {
            priority: Some(3),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&rows, &criteria)), vec!["2", "3"]);

        let criteria = FilterCriteria {
            priority: Some(2),
            ..Default::default()
        };
        assert!(apply(&rows, &criteria).is_empty());
    }

    #[test]
    fn work_mode_ignores_case_and_treats_null_as_empty() {
        let rows = sample();
        let criteria = FilterCriteria {
            work_mode: Some("REMOTE".into()),
            ..Default::default()
        };
        assert_eq!(ids(&apply(&rows, &criteria)), vec!["2"]);

        let criteria = FilterCriteria {
            work_mode: Some("onsite".into()),
            ..Default::default()
        };
        assert!(apply(&rows, &criteria).is_empty());
    }

    #[test]
    fn criteria_combine_with_and() {
        let rows = sample();
        let criteria = FilterCriteria {
            search: "engineer".into(),
            status: Some(ApplicationStatus::Rejected),
            priority: Some(1),
            work_mode: Some("hybrid".into()),
        };
        assert_eq!(ids(&apply(&rows, &criteria)), vec!["1"]);

        let criteria = FilterCriteria {
            priority: Some(3),
            ..criteria
        };
        assert!(apply(&rows, &criteria).is_empty());
    }

    #[test]
    fn result_is_the_intersection_of_single_criteria() {
        let rows = sample();
        let full = FilterCriteria {
            search: "e".into(),
            status: Some(ApplicationStatus::Screen),
            priority: Some(3),
            work_mode: Some("remote".into()),
        };
        let singles = [
            FilterCriteria {
                search: full.search.clone(),
                ..Default::default()
            },
            FilterCriteria {
                status: full.status,
                ..Default::default()
            },
            FilterCriteria {
                priority: full.priority,
                ..Default::default()
            },
            FilterCriteria {
                work_mode: full.work_mode.clone(),
                ..Default::default()
            },
        ];
        for row in &rows {
            let each = singles.iter().all(|c| matches(row, c));
            assert_eq!(matches(row, &full), each);
        }
    }

    #[test]
    fn from_args_understands_all() {
        let criteria =
            FilterCriteria::from_args(Some("acme"), Some("all"), Some("ALL"), Some("all")).unwrap();
        assert_eq!(
            criteria,
            FilterCriteria {
                search: "acme".into(),
                ..Default::default()
            }
        );

        let criteria =
            FilterCriteria::from_args(None, Some("offer"), Some("2"), Some("Hybrid")).unwrap();
        assert_eq!(criteria.status, Some(ApplicationStatus::Offer));
        assert_eq!(criteria.priority, Some(2));
        assert_eq!(criteria.work_mode.as_deref(), Some("Hybrid"));
    }

    #[test]
    fn from_args_rejects_bad_values() {
        assert!(FilterCriteria::from_args(None, Some("hired"), None, None).is_err());
        assert!(FilterCriteria::from_args(None, None, Some("9"), None).is_err());
        assert!(FilterCriteria::from_args(None, None, Some("high"), None).is_err());
    }
}
