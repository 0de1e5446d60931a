use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::ports::SessionStore;
use crate::domain::session::{Role, Session};

pub const TOKEN_KEY: &str = "auth-token";
pub const USER_KEY: &str = "auth-user";

#[derive(Debug, Serialize, Deserialize)]
struct StoredUser {
    email: String,
    rol: String,
}

/// Key/value file holding the session under fixed keys. Other keys in the
/// file are left alone.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A file that does not parse holds no session; the next `save` replaces it.
    fn read_entries(&self) -> Result<BTreeMap<String, String>, DomainError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => Ok(entries),
                Err(e) => {
                    log::warn!(
                        "Ignoring corrupt session file {}: {}",
                        self.path.display(),
                        e
                    );
                    Ok(BTreeMap::new())
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(DomainError::Internal(e.to_string())),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), DomainError> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| DomainError::Internal(e.to_string()))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, DomainError> {
        let entries = self.read_entries()?;
        let (Some(token), Some(user)) = (entries.get(TOKEN_KEY), entries.get(USER_KEY)) else {
            return Ok(None);
        };
        let user: StoredUser = match serde_json::from_str(user) {
            Ok(user) => user,
            Err(e) => {
                log::warn!("Ignoring unreadable stored user: {}", e);
                return Ok(None);
            }
        };
        let role: Role = match user.rol.parse() {
            Ok(role) => role,
            Err(e) => {
                log::warn!("Ignoring stored session: {}", e);
                return Ok(None);
            }
        };
        if user.email.is_empty() {
            return Ok(None);
        }
        Ok(Some(Session::new(token.clone(), user.email, role)))
    }

    fn save(&self, session: &Session) -> Result<(), DomainError> {
        let mut entries = self.read_entries()?;
        let user = StoredUser {
            email: session.profile.email.clone(),
            rol: session.role().as_str().to_string(),
        };
        let user =
            serde_json::to_string(&user).map_err(|e| DomainError::Internal(e.to_string()))?;
        entries.insert(TOKEN_KEY.to_string(), session.token.clone());
        entries.insert(USER_KEY.to_string(), user);
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<(), DomainError> {
        let mut entries = self.read_entries()?;
        let had_token = entries.remove(TOKEN_KEY).is_some();
        let had_user = entries.remove(USER_KEY).is_some();
        if !had_token && !had_user {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}
