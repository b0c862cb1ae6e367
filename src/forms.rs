use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::{
    ApplicationPatch, ApplicationRecord, ApplicationStatus, DEFAULT_PRIORITY, NewApplication,
    clamp_priority,
};

/// Raw input for a new application, as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplicationForm {
    pub company_name: String,
    pub role_title: String,
    pub status: ApplicationStatus,
    pub priority: i64,
    pub applied_at: String,
    pub next_action_at: String,
    pub next_action_label: String,
    pub location: String,
    pub work_mode: String,
    pub notes: String,
}

impl Default for NewApplicationForm {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            role_title: String::new(),
            status: ApplicationStatus::Applied,
            priority: DEFAULT_PRIORITY,
            applied_at: String::new(),
            next_action_at: String::new(),
            next_action_label: String::new(),
            location: String::new(),
            work_mode: String::new(),
            notes: String::new(),
        }
    }
}

impl NewApplicationForm {
    pub fn can_save(&self) -> bool {
        !self.company_name.trim().is_empty() && !self.role_title.trim().is_empty()
    }

    /// Normalised fields for the store, or `None` while company or role is blank.
    pub fn build(&self) -> Option<NewApplication> {
        if !self.can_save() {
            return None;
        }
        let priority = if self.priority == 0 { DEFAULT_PRIORITY } else { self.priority };
        Some(NewApplication {
            company_name: self.company_name.trim().to_string(),
            role_title: self.role_title.trim().to_string(),
            status: self.status,
            priority: clamp_priority(priority),
            applied_at: optional(&self.applied_at),
            next_action_at: optional(&self.next_action_at),
            next_action_label: optional(&self.next_action_label),
            location: optional(&self.location),
            work_mode: optional(&self.work_mode).map(|m| m.to_lowercase()),
            notes: optional(&self.notes),
        })
    }
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Edits against a snapshot taken when the form was opened. Saving sends
/// only what differs from that snapshot.
#[derive(Debug, Clone)]
pub struct QuickEditForm {
    snapshot: ApplicationRecord,
    pub draft: ApplicationRecord,
}

impl QuickEditForm {
    pub fn open(record: &ApplicationRecord) -> Self {
        Self {
            snapshot: record.clone(),
            draft: record.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.snapshot.id
    }

    /// Record a touch point at `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.draft.last_touch_at = Some(now.to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    /// Fields that differ from the snapshot. A field left as it was never
    /// shows up, even if the stored value is not in normalised form.
    pub fn diff(&self) -> ApplicationPatch {
        let before = &self.snapshot;
        let after = &self.draft;
        let mut patch = ApplicationPatch::default();

        patch.company_name = changed_text(&before.company_name, &after.company_name);
        patch.role_title = changed_text(&before.role_title, &after.role_title);
        if after.status != before.status {
            patch.status = Some(after.status);
        }
        if after.priority != before.priority {
            let priority = clamp_priority(after.priority);
            if priority != before.priority {
                patch.priority = Some(priority);
            }
        }

        patch.applied_at = changed(&before.applied_at, &after.applied_at, optional);
        patch.last_touch_at = changed(&before.last_touch_at, &after.last_touch_at, optional);
        patch.next_action_at = changed(&before.next_action_at, &after.next_action_at, optional);
        patch.next_action_label =
            changed(&before.next_action_label, &after.next_action_label, optional);
        patch.location = changed(&before.location, &after.location, optional);
        patch.work_mode = changed(&before.work_mode, &after.work_mode, |m| {
            optional(m).map(|m| m.to_lowercase())
        });
        patch.notes = changed(&before.notes, &after.notes, optional);

        patch
    }

    pub fn is_dirty(&self) -> bool {
        !self.diff().is_empty()
    }

    pub fn can_save(&self) -> bool {
        self.is_dirty()
            && !self.draft.company_name.trim().is_empty()
            && !self.draft.role_title.trim().is_empty()
    }
}

fn changed_text(before: &str, after: &str) -> Option<String> {
    if after == before {
        return None;
    }
    let after = after.trim();
    (after != before).then(|| after.to_string())
}

fn changed(
    before: &Option<String>,
    after: &Option<String>,
    normalize: impl Fn(&str) -> Option<String>,
) -> Option<Option<String>> {
    if after == before {
        return None;
    }
    let after = after.as_deref().and_then(normalize);
    if after == *before { None } else { Some(after) }
}
