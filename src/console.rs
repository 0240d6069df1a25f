use std::collections::HashMap;

use time::OffsetDateTime;

use crate::error::{AdminError, Result};
use crate::gate::{self, GateState};
use crate::model::{Session, SettingsDocument, WorkflowRunStatus};
use crate::remote::RemoteClient;
use crate::session::SessionStore;
use crate::settings::{self, SettingsManager};

/// Action id of the reporting job on the remote runner.
pub const REPORT_ACTION_ID: &str = "weekly-report.yml";
const REPORT_ACTION_REF: &str = "main";

/// Session-scoped command surface of the admin console.
///
/// Owns the gate state, the session store, and (once attached) the settings
/// manager. Rendering layers drive this and display what comes back;
/// nothing here knows about a UI.
#[derive(Debug)]
pub struct Console {
    store: SessionStore,
    state: GateState,
    manager: Option<SettingsManager>,
}

impl Console {
    /// A console with no session attached (first-run setup).
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            state: GateState::NoSession,
            manager: None,
        }
    }

    /// Read the stored session and, when present, attach to the remote.
    ///
    /// An authorization failure clears the stored session before surfacing,
    /// so the next start lands in first-run setup. Any other attach failure
    /// leaves the stored session alone and propagates.
    pub fn start(store: SessionStore) -> Result<Self> {
        let Some(session) = store.read()? else {
            return Ok(Self::new(store));
        };
        match attach(session) {
            Ok((manager, state)) => Ok(Self {
                store,
                state,
                manager: Some(manager),
            }),
            Err(AdminError::Auth(msg)) => {
                store.clear()?;
                Err(AdminError::Auth(msg))
            }
            Err(err) => Err(err),
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// First-run setup: attach with the given parameters, persisting them
    /// only once the remote proves reachable and readable.
    pub fn connect(&mut self, session: Session) -> Result<GateState> {
        let (manager, state) = attach(session.clone())?;
        self.store.write(&session)?;
        self.manager = Some(manager);
        self.state = state;
        Ok(state)
    }

    /// Explicit session reset: discard local connection parameters and fall
    /// back to first-run setup. Control returns to the caller; there is no
    /// environment-level reload side effect.
    pub fn logout(&mut self) -> Result<()> {
        self.store.clear()?;
        self.manager = None;
        self.state = GateState::NoSession;
        Ok(())
    }

    /// Pass the gate. A wrong password returns `false` and keeps the gate
    /// locked; there is no attempt limit.
    pub fn unlock(&mut self, password: &str) -> Result<bool> {
        match self.state {
            GateState::Locked => {}
            GateState::Unlocked => return Ok(true),
            GateState::NeedsPasswordSetup => {
                return Err(AdminError::Locked(
                    "no admin password set yet; set one first".into(),
                ));
            }
            GateState::NoSession => return Err(no_session()),
        }
        let stored = &self.manager_ref()?.document().admin_password_hash;
        if gate::verify_password(password, stored) {
            self.state = GateState::Unlocked;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Set the admin password (first run) or change it (while unlocked),
    /// and persist the document.
    pub fn set_password(&mut self, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(AdminError::InvalidInput("password must not be empty".into()));
        }
        match self.state {
            GateState::NeedsPasswordSetup | GateState::Unlocked => {}
            GateState::Locked => {
                return Err(AdminError::Locked(
                    "unlock with the current password first".into(),
                ));
            }
            GateState::NoSession => return Err(no_session()),
        }
        let hash = gate::hash_password(new_password);
        let manager = self.manager_mut()?;
        manager.set_password_hash(hash);
        manager.save()?;
        self.state = GateState::Unlocked;
        Ok(())
    }

    pub fn document(&self) -> Result<&SettingsDocument> {
        self.require_unlocked()?;
        Ok(self.manager_ref()?.document())
    }

    pub fn add_recipient(&mut self, email: &str) -> Result<()> {
        self.require_unlocked()?;
        self.manager_mut()?.add_recipient(email)
    }

    pub fn remove_recipient(&mut self, index: usize) -> Result<String> {
        self.require_unlocked()?;
        self.manager_mut()?.remove_recipient(index)
    }

    pub fn set_schedule(&mut self, day: &str, hour: i32) -> Result<()> {
        self.require_unlocked()?;
        self.manager_mut()?.set_schedule(day, hour)
    }

    pub fn save(&mut self) -> Result<()> {
        self.require_unlocked()?;
        self.manager_mut()?.save()
    }

    pub fn next_run(&self, now: OffsetDateTime) -> Result<OffsetDateTime> {
        let doc = self.document()?;
        settings::next_occurrence(doc.schedule_day, doc.schedule_hour, now)
    }

    /// Manually trigger the reporting job. Fire-and-forget.
    pub fn trigger_report(&self) -> Result<()> {
        self.require_unlocked()?;
        let inputs = HashMap::from([("reason".to_string(), "manual trigger".to_string())]);
        self.manager_ref()?
            .client()
            .dispatch_action(REPORT_ACTION_ID, REPORT_ACTION_REF, &inputs)
    }

    /// Latest run of the reporting job. Display-only, so it is allowed
    /// while locked and collapses every failure to `None`.
    pub fn run_status(&self) -> Option<WorkflowRunStatus> {
        self.manager.as_ref()?.client().latest_run_status()
    }

    fn require_unlocked(&self) -> Result<()> {
        if self.state == GateState::Unlocked {
            Ok(())
        } else {
            Err(AdminError::Locked(
                "settings are locked; unlock with the admin password first".into(),
            ))
        }
    }

    fn manager_ref(&self) -> Result<&SettingsManager> {
        self.manager.as_ref().ok_or_else(no_session)
    }

    fn manager_mut(&mut self) -> Result<&mut SettingsManager> {
        self.manager.as_mut().ok_or_else(no_session)
    }
}

fn no_session() -> AdminError {
    AdminError::Locked("no session configured (run `reportctl login`)".into())
}

fn attach(session: Session) -> Result<(SettingsManager, GateState)> {
    let client = RemoteClient::new(session)?;
    let mut manager = SettingsManager::new(client);
    manager.load()?;
    let state = if manager.document().admin_password_hash.is_empty() {
        GateState::NeedsPasswordSetup
    } else {
        GateState::Locked
    };
    Ok((manager, state))
}
