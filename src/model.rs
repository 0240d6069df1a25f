use serde::{Deserialize, Serialize};

/// Connection parameters persisted by the local session store.
///
/// The access token is stored in plaintext, matching the console this
/// replaces; the session file itself is written owner-only (see
/// `session::SessionStore`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub base_url: String,
    pub repo: String,
    pub token: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl ScheduleDay {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monday" => Some(Self::Monday),
            "tuesday" => Some(Self::Tuesday),
            "wednesday" => Some(Self::Wednesday),
            "thursday" => Some(Self::Thursday),
            "friday" => Some(Self::Friday),
            "saturday" => Some(Self::Saturday),
            "sunday" => Some(Self::Sunday),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    pub fn weekday(self) -> time::Weekday {
        match self {
            Self::Monday => time::Weekday::Monday,
            Self::Tuesday => time::Weekday::Tuesday,
            Self::Wednesday => time::Weekday::Wednesday,
            Self::Thursday => time::Weekday::Thursday,
            Self::Friday => time::Weekday::Friday,
            Self::Saturday => time::Weekday::Saturday,
            Self::Sunday => time::Weekday::Sunday,
        }
    }
}

impl std::fmt::Display for ScheduleDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The settings document stored on the remote, replaced wholesale on each
/// fetch. Its version token travels out-of-band and is retained by the
/// settings manager, never embedded in this body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default)]
    pub recipients: Vec<String>,

    #[serde(default = "default_schedule_day")]
    pub schedule_day: ScheduleDay,

    #[serde(default = "default_schedule_hour")]
    pub schedule_hour: u8,

    /// Hex digest of the admin password, or empty when no password has been
    /// set yet (first-run state).
    #[serde(default)]
    pub admin_password_hash: String,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            schedule_day: ScheduleDay::Monday,
            schedule_hour: 8,
            admin_password_hash: String::new(),
        }
    }
}

fn default_schedule_day() -> ScheduleDay {
    ScheduleDay::Monday
}

fn default_schedule_hour() -> u8 {
    8
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Success,
    Failure,
    /// Catch-all: in-flight runs and any outcome string this tool does not
    /// recognize.
    #[serde(other)]
    Pending,
}

impl RunOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Pending => "pending",
        }
    }
}

/// Most recent execution of the reporting job. Display projection only,
/// never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowRunStatus {
    pub outcome: RunOutcome,
    pub created_at: String,
    pub url: String,
}
