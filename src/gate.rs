//! Password gate for the settings editor.
//!
//! One digest pass over password + a fixed, publicly-known salt. This
//! deters casual access to the admin console and nothing more: there is no
//! per-user salt, no iteration cost, and no attempt limit. It must not be
//! treated as a security boundary.

/// Fixed salt, identical for every deployment.
const PASSWORD_SALT: &str = "reportctl-admin-gate-v1";

pub fn hash_password(password: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(password.as_bytes());
    hasher.update(PASSWORD_SALT.as_bytes());
    hasher.finalize().to_hex().to_string()
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    hash_password(password) == stored_hash
}

/// Which screen of the console applies.
///
/// `NoSession -> NeedsPasswordSetup | Locked -> Unlocked`; a wrong password
/// keeps `Locked`, and only an explicit logout returns to `NoSession`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    /// No local connection parameters; first-run setup.
    NoSession,
    /// Session present, remote document carries no password hash yet.
    NeedsPasswordSetup,
    /// Session present, hash set, gate not passed this run.
    Locked,
    /// Gate passed this run.
    Unlocked,
}
