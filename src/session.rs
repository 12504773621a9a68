use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::config_directory;
use crate::error::{AppError, AppResult};

const SESSION_FILE_NAME: &str = "session.json";

/// Profile of the signed-in user, cached alongside the token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub account_id: String,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// An authenticated session: bearer token plus the cached user profile.
///
/// Created by `login`, destroyed by `logout` or when the backend reports the
/// token expired. Always passed explicitly into the gateway, never read from
/// ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    pub fn new(token: String, user: UserProfile) -> Self {
        Self { token, user }
    }

    /// Load the persisted session, if one exists and parses.
    pub fn load() -> AppResult<Option<Self>> {
        let path = session_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let session = serde_json::from_str(&contents).map_err(|err| {
                    AppError::Configuration(format!("invalid session file: {err}"))
                })?;
                Ok(Some(session))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = session_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write session: {err}")))?;
        fs::write(&path, data)?;
        Ok(())
    }

    /// Remove the persisted session. Missing file is not an error.
    pub fn clear() -> AppResult<()> {
        let path = session_file_path()?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    /// Load the session or fail with a re-login hint.
    pub fn require() -> AppResult<Self> {
        Session::load()?.ok_or(AppError::AuthExpired)
    }
}

fn session_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(SESSION_FILE_NAME))
}
