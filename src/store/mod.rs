//! Process-wide persisted client state.
//!
//! Two small JSON files under the state directory replace ad hoc storage
//! access scattered through the UI:
//!
//! - `preferences.json` — loaded once at startup, saved on change: the
//!   stable device id sent with login and passkey calls, plus the last
//!   email and tenant used.
//! - `logout-notice.json` — a short-lived entry written on a forced logout
//!   and consumed exactly once at the next start, so the sign-in banner can
//!   explain why the session ended.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};
use uuid::Uuid;

const PREFERENCES_FILE: &str = "preferences.json";
const LOGOUT_NOTICE_FILE: &str = "logout-notice.json";

/// Notices older than this are stale and silently dropped.
pub const LOGOUT_NOTICE_TTL_SECONDS: u64 = 120;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Preferences {
    /// Stable identifier for trust-device decisions; generated on first run.
    pub device_id: Uuid,
    #[serde(default)]
    pub last_email: Option<String>,
    #[serde(default)]
    pub last_tenant: Option<String>,
}

impl Preferences {
    fn fresh() -> Self {
        Self {
            device_id: Uuid::new_v4(),
            last_email: None,
            last_tenant: None,
        }
    }
}

/// Why the previous session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    Unauthorized,
    SessionExpired,
    LoggedOut,
}

#[derive(Debug, Serialize, Deserialize)]
struct LogoutNotice {
    reason: LogoutReason,
    created_at_unix: u64,
}

pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    /// Open the store, creating the state directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating state directory {}", root.display()))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load preferences, minting a fresh device id on first run. A corrupt
    /// file is replaced rather than treated as fatal.
    pub fn load_preferences(&self) -> Result<Preferences> {
        let path = self.root.join(PREFERENCES_FILE);
        let preferences = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(preferences) => return Ok(preferences),
                Err(err) => {
                    warn!("discarding corrupt preferences file: {err}");
                    Preferences::fresh()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Preferences::fresh(),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()));
            }
        };
        self.save_preferences(&preferences)?;
        Ok(preferences)
    }

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        let path = self.root.join(PREFERENCES_FILE);
        let raw = serde_json::to_string_pretty(preferences)?;
        fs::write(&path, raw).with_context(|| format!("writing {}", path.display()))?;
        debug!("saved preferences to {}", path.display());
        Ok(())
    }

    /// Record why the session ended, for the next start's banner.
    pub fn record_logout(&self, reason: LogoutReason) -> Result<()> {
        let path = self.root.join(LOGOUT_NOTICE_FILE);
        let notice = LogoutNotice {
            reason,
            created_at_unix: now_unix(),
        };
        let raw = serde_json::to_string(&notice)?;
        fs::write(&path, raw).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Consume the pending logout notice, if any. The entry is removed
    /// whether or not it is still fresh.
    pub fn take_logout_notice(&self) -> Result<Option<LogoutReason>> {
        let path = self.root.join(LOGOUT_NOTICE_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).with_context(|| format!("reading {}", path.display())),
        };
        fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;

        let notice: LogoutNotice = match serde_json::from_str(&raw) {
            Ok(notice) => notice,
            Err(err) => {
                warn!("discarding corrupt logout notice: {err}");
                return Ok(None);
            }
        };
        if now_unix().saturating_sub(notice.created_at_unix) > LOGOUT_NOTICE_TTL_SECONDS {
            debug!("logout notice expired");
            return Ok(None);
        }
        Ok(Some(notice.reason))
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn preferences_persist_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();

        let mut preferences = store.load_preferences().unwrap();
        let device_id = preferences.device_id;
        preferences.last_email = Some("a@x.com".to_string());
        store.save_preferences(&preferences).unwrap();

        let reloaded = store.load_preferences().unwrap();
        assert_eq!(reloaded.device_id, device_id);
        assert_eq!(reloaded.last_email.as_deref(), Some("a@x.com"));
    }

    #[test]
    fn corrupt_preferences_are_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        fs::write(dir.path().join(PREFERENCES_FILE), "not json").unwrap();

        let preferences = store.load_preferences().unwrap();
        assert!(preferences.last_email.is_none());
        // The fresh copy was written back.
        let reloaded = store.load_preferences().unwrap();
        assert_eq!(reloaded.device_id, preferences.device_id);
    }

    #[test]
    fn logout_notice_is_consumed_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();

        store.record_logout(LogoutReason::SessionExpired).unwrap();
        assert_eq!(
            store.take_logout_notice().unwrap(),
            Some(LogoutReason::SessionExpired)
        );
        assert_eq!(store.take_logout_notice().unwrap(), None);
    }

    #[test]
    fn stale_logout_notice_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();

        let notice = LogoutNotice {
            reason: LogoutReason::LoggedOut,
            created_at_unix: now_unix() - LOGOUT_NOTICE_TTL_SECONDS - 1,
        };
        fs::write(
            dir.path().join(LOGOUT_NOTICE_FILE),
            serde_json::to_string(&notice).unwrap(),
        )
        .unwrap();

        assert_eq!(store.take_logout_notice().unwrap(), None);
    }

    #[test]
    fn corrupt_logout_notice_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).unwrap();
        fs::write(dir.path().join(LOGOUT_NOTICE_FILE), "{").unwrap();
        assert_eq!(store.take_logout_notice().unwrap(), None);
    }
}
