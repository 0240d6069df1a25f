use time::{Duration, OffsetDateTime};

use crate::error::{AdminError, Result};
use crate::model::{ScheduleDay, SettingsDocument};
use crate::remote::RemoteClient;

/// Path of the settings document on the remote store.
pub const SETTINGS_PATH: &str = "settings.json";

/// Owns the in-memory settings document and its version token. All remote
/// round-trips for the document go through here; the client transports it
/// but never retains a copy.
#[derive(Debug)]
pub struct SettingsManager {
    client: RemoteClient,
    doc: SettingsDocument,
    version: Option<String>,
}

impl SettingsManager {
    pub fn new(client: RemoteClient) -> Self {
        Self {
            client,
            doc: SettingsDocument::default(),
            version: None,
        }
    }

    pub fn client(&self) -> &RemoteClient {
        &self.client
    }

    pub fn document(&self) -> &SettingsDocument {
        &self.doc
    }

    /// Version token from the last successful fetch or save. Absent iff the
    /// document has never been persisted.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Fetch the remote document, replacing local state wholesale. An absent
    /// remote copy is not an error: it yields the defaults with no version
    /// token, and the first save will create the resource.
    pub fn load(&mut self) -> Result<&SettingsDocument> {
        match self.client.fetch_document(SETTINGS_PATH) {
            Ok((bytes, version)) => {
                self.doc = serde_json::from_slice(&bytes)?;
                self.version = Some(version);
            }
            Err(AdminError::NotFound) => {
                self.doc = SettingsDocument::default();
                self.version = None;
            }
            Err(err) => return Err(err),
        }
        Ok(&self.doc)
    }

    /// Version-checked write-back. A `Conflict` means someone else changed
    /// the settings since our load; it propagates to the operator and is
    /// never resolved here. The retained token is only replaced on success.
    pub fn save(&mut self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.doc)?;
        let version = self
            .client
            .put_document(SETTINGS_PATH, &bytes, self.version.as_deref())?;
        self.version = Some(version);
        Ok(())
    }

    /// Append a recipient, preserving insertion order. Matching is
    /// case-sensitive and exact.
    pub fn add_recipient(&mut self, email: &str) -> Result<()> {
        if email.is_empty() || !email.contains('@') || !email.contains('.') {
            return Err(AdminError::InvalidInput(format!(
                "not a valid email address: {:?}",
                email
            )));
        }
        if self.doc.recipients.iter().any(|r| r == email) {
            return Err(AdminError::Duplicate(email.to_string()));
        }
        self.doc.recipients.push(email.to_string());
        Ok(())
    }

    /// Remove by position, returning the removed address. Out-of-range
    /// leaves the list untouched.
    pub fn remove_recipient(&mut self, index: usize) -> Result<String> {
        if index >= self.doc.recipients.len() {
            return Err(AdminError::OutOfRange(index));
        }
        Ok(self.doc.recipients.remove(index))
    }

    pub fn set_schedule(&mut self, day: &str, hour: i32) -> Result<()> {
        let day = ScheduleDay::parse(day)
            .ok_or_else(|| AdminError::InvalidInput(format!("unknown weekday: {:?}", day)))?;
        if !(0..=23).contains(&hour) {
            return Err(AdminError::InvalidInput(format!(
                "hour out of range 0-23: {}",
                hour
            )));
        }
        self.doc.schedule_day = day;
        self.doc.schedule_hour = hour as u8;
        Ok(())
    }

    pub fn set_password_hash(&mut self, hash: String) {
        self.doc.admin_password_hash = hash;
    }
}

/// Next instant matching the configured weekday and hour, strictly after
/// today.
///
/// A weekday delta of zero always advances a full week, so the same weekday
/// later today is never selected, even when the hour has not passed yet.
/// The console this replaces behaves exactly this way; kept as-is rather
/// than "fixed" to same-day scheduling.
pub fn next_occurrence(
    day: ScheduleDay,
    hour: u8,
    now: OffsetDateTime,
) -> Result<OffsetDateTime> {
    let target = i64::from(day.weekday().number_days_from_monday());
    let current = i64::from(now.weekday().number_days_from_monday());
    let mut delta = (target - current).rem_euclid(7);
    if delta == 0 {
        delta = 7;
    }
    let at = (now.date() + Duration::days(delta))
        .with_hms(hour, 0, 0)
        .map_err(|e| AdminError::InvalidInput(format!("schedule hour: {}", e)))?;
    Ok(at.assume_offset(now.offset()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Session;
    use time::{Date, Month, Weekday};

    fn manager() -> SettingsManager {
        let client = RemoteClient::new(Session {
            base_url: "http://127.0.0.1:1".to_string(),
            repo: "reports".to_string(),
            token: "unused".to_string(),
        })
        .unwrap();
        SettingsManager::new(client)
    }

    fn utc(year: i32, month: Month, day: u8, hour: u8) -> OffsetDateTime {
        Date::from_calendar_date(year, month, day)
            .unwrap()
            .with_hms(hour, 0, 0)
            .unwrap()
            .assume_utc()
    }

    #[test]
    fn add_recipient_appends_in_order() {
        let mut m = manager();
        m.add_recipient("a@example.com").unwrap();
        m.add_recipient("b@example.com").unwrap();
        m.add_recipient("c@example.com").unwrap();
        assert_eq!(
            m.document().recipients,
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
    }

    #[test]
    fn add_recipient_rejects_malformed_addresses() {
        let mut m = manager();
        for bad in ["", "no-at-sign.com", "no-dot@com"] {
            let err = m.add_recipient(bad).unwrap_err();
            assert!(matches!(err, AdminError::InvalidInput(_)), "{:?}", bad);
        }
        assert!(m.document().recipients.is_empty());
    }

    #[test]
    fn add_recipient_rejects_duplicates_without_mutating() {
        let mut m = manager();
        m.add_recipient("a@example.com").unwrap();
        let err = m.add_recipient("a@example.com").unwrap_err();
        assert!(matches!(err, AdminError::Duplicate(_)));
        assert_eq!(m.document().recipients, vec!["a@example.com"]);

        // Case-sensitive exact match: a differently-cased address is new.
        m.add_recipient("A@example.com").unwrap();
        assert_eq!(m.document().recipients.len(), 2);
    }

    #[test]
    fn remove_then_readd_never_duplicates() {
        let mut m = manager();
        m.add_recipient("a@example.com").unwrap();
        m.add_recipient("b@example.com").unwrap();
        let removed = m.remove_recipient(0).unwrap();
        assert_eq!(removed, "a@example.com");
        m.add_recipient("a@example.com").unwrap();
        assert_eq!(
            m.document().recipients,
            vec!["b@example.com", "a@example.com"]
        );
    }

    #[test]
    fn remove_recipient_out_of_range_leaves_list_unchanged() {
        let mut m = manager();
        m.add_recipient("a@example.com").unwrap();
        let err = m.remove_recipient(1).unwrap_err();
        assert!(matches!(err, AdminError::OutOfRange(1)));
        assert_eq!(m.document().recipients, vec!["a@example.com"]);
    }

    #[test]
    fn set_schedule_validates_day_and_hour() {
        let mut m = manager();
        m.set_schedule("friday", 0).unwrap();
        m.set_schedule("sunday", 23).unwrap();
        assert_eq!(m.document().schedule_day, ScheduleDay::Sunday);
        assert_eq!(m.document().schedule_hour, 23);

        assert!(matches!(
            m.set_schedule("sunday", 24),
            Err(AdminError::InvalidInput(_))
        ));
        assert!(matches!(
            m.set_schedule("sunday", -1),
            Err(AdminError::InvalidInput(_))
        ));
        assert!(matches!(
            m.set_schedule("funday", 8),
            Err(AdminError::InvalidInput(_))
        ));
        // Rejection leaves the previous schedule in place.
        assert_eq!(m.document().schedule_day, ScheduleDay::Sunday);
        assert_eq!(m.document().schedule_hour, 23);
    }

    #[test]
    fn next_occurrence_skips_same_day_even_before_the_hour() {
        // 2026-01-05 is a Monday. Asking for monday 08:00 at Monday 09:00
        // must give the following Monday, not today.
        let now = utc(2026, Month::January, 5, 9);
        let next = next_occurrence(ScheduleDay::Monday, 8, now).unwrap();
        assert_eq!(next.date(), Date::from_calendar_date(2026, Month::January, 12).unwrap());
        assert_eq!(next.hour(), 8);

        // Same quirk when the hour has not passed yet: Monday 07:00 asking
        // for monday 08:00 still lands next week.
        let now = utc(2026, Month::January, 5, 7);
        let next = next_occurrence(ScheduleDay::Monday, 8, now).unwrap();
        assert_eq!(next.date(), Date::from_calendar_date(2026, Month::January, 12).unwrap());
    }

    #[test]
    fn next_occurrence_uses_naive_delta_for_other_days() {
        // Monday asking for friday: +4 days.
        let now = utc(2026, Month::January, 5, 9);
        let next = next_occurrence(ScheduleDay::Friday, 17, now).unwrap();
        assert_eq!(next.date(), Date::from_calendar_date(2026, Month::January, 9).unwrap());
        assert_eq!(next.hour(), 17);
        assert_eq!(next.weekday(), Weekday::Friday);

        // Friday asking for monday wraps across the weekend.
        let now = utc(2026, Month::January, 9, 12);
        let next = next_occurrence(ScheduleDay::Monday, 8, now).unwrap();
        assert_eq!(next.date(), Date::from_calendar_date(2026, Month::January, 12).unwrap());
    }
}
