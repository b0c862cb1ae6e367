use serde::{Deserialize, Serialize};

pub const MIN_PRIORITY: i64 = 1;
pub const MAX_PRIORITY: i64 = 5;
pub const DEFAULT_PRIORITY: i64 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Draft,
    #[default]
    Applied,
    Screen,
    Interview,
    Offer,
    Rejected,
    Withdrawn,
    Ghosted,
}

impl ApplicationStatus {
    pub const ALL: [Self; 8] = [
        Self::Draft,
        Self::Applied,
        Self::Screen,
        Self::Interview,
        Self::Offer,
        Self::Rejected,
        Self::Withdrawn,
        Self::Ghosted,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Applied => "applied",
            Self::Screen => "screen",
            Self::Interview => "interview",
            Self::Offer => "offer",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
            Self::Ghosted => "ghosted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "applied" => Some(Self::Applied),
            "screen" => Some(Self::Screen),
            "interview" => Some(Self::Interview),
            "offer" => Some(Self::Offer),
            "rejected" => Some(Self::Rejected),
            "withdrawn" => Some(Self::Withdrawn),
            "ghosted" => Some(Self::Ghosted),
            _ => None,
        }
    }

    /// The status after this one in `ALL`, wrapping around. Used by the
    /// browser's quick edit to cycle statuses with a single key.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Out-of-range priorities are pulled back into [1, 5], never rejected.
pub fn clamp_priority(priority: i64) -> i64 {
    priority.clamp(MIN_PRIORITY, MAX_PRIORITY)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    #[serde(alias = "application_id")]
    pub id: String,
    pub company_name: String,
    pub role_title: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default)]
    pub applied_at: Option<String>,
    #[serde(default)]
    pub last_touch_at: Option<String>,
    #[serde(default)]
    pub next_action_at: Option<String>,
    #[serde(default)]
    pub next_action_label: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub work_mode: Option<String>, // "remote", "hybrid", "onsite" by convention
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_priority() -> i64 {
    DEFAULT_PRIORITY
}

/// Fields for a record that the store has not assigned an id to yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub company_name: String,
    pub role_title: String,
    pub status: ApplicationStatus,
    pub priority: i64,
    pub applied_at: Option<String>,
    pub next_action_at: Option<String>,
    pub next_action_label: Option<String>,
    pub location: Option<String>,
    pub work_mode: Option<String>,
    pub notes: Option<String>,
}

impl NewApplication {
    /// What the record looks like once the store hands back its id.
    pub fn into_record(self, id: String) -> ApplicationRecord {
        ApplicationRecord {
            id,
            company_name: self.company_name,
            role_title: self.role_title,
            status: self.status,
            priority: clamp_priority(self.priority),
            applied_at: self.applied_at,
            last_touch_at: None,
            next_action_at: self.next_action_at,
            next_action_label: self.next_action_label,
            location: self.location,
            work_mode: self.work_mode,
            notes: self.notes,
        }
    }
}

/// A partial update. `None` leaves a field alone; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationPatch {
    pub company_name: Option<String>,
    pub role_title: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub priority: Option<i64>,
    pub applied_at: Option<Option<String>>,
    pub last_touch_at: Option<Option<String>>,
    pub next_action_at: Option<Option<String>>,
    pub next_action_label: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub work_mode: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl ApplicationPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch to an in-memory copy, mirroring what the store does.
    pub fn apply_to(&self, record: &mut ApplicationRecord) {
        if let Some(v) = &self.company_name {
            record.company_name = v.clone();
        }
        if let Some(v) = &self.role_title {
            record.role_title = v.clone();
        }
        if let Some(v) = self.status {
            record.status = v;
        }
        if let Some(v) = self.priority {
            record.priority = clamp_priority(v);
        }
        if let Some(v) = &self.applied_at {
            record.applied_at = v.clone();
        }
        if let Some(v) = &self.last_touch_at {
            record.last_touch_at = v.clone();
        }
        if let Some(v) = &self.next_action_at {
            record.next_action_at = v.clone();
        }
        if let Some(v) = &self.next_action_label {
            record.next_action_label = v.clone();
        }
        if let Some(v) = &self.location {
            record.location = v.clone();
        }
        if let Some(v) = &self.work_mode {
            record.work_mode = v.clone();
        }
        if let Some(v) = &self.notes {
            record.notes = v.clone();
        }
    }
}
