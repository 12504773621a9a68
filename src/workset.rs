use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::config_directory;
use crate::domain::ticket::{LabelAction, TicketEntry, split_ticket_keys};
use crate::error::{AppError, AppResult};

const WORKSET_FILE_NAME: &str = "workset.json";

#[derive(Default, Serialize, Deserialize)]
struct WorksetFile {
    next_id: u64,
    entries: Vec<TicketEntry>,
}

/// The editing session's working set of tickets, persisted between CLI
/// invocations so failed submissions can be retried.
pub struct WorkingSet {
    file_path: PathBuf,
    file: WorksetFile,
}

impl WorkingSet {
    pub fn load() -> AppResult<Self> {
        let dir = config_directory()?;
        let path = dir.join(WORKSET_FILE_NAME);
        let file = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str::<WorksetFile>(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid workset file: {err}")))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => WorksetFile::default(),
            Err(err) => return Err(AppError::Io(err)),
        };

        Ok(Self {
            file_path: path,
            file,
        })
    }

    /// Working set backed by a unique temp file, for tests only.
    #[cfg(test)]
    pub(crate) fn load_for_tests() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "tickettractor-workset-{}-{n}.json",
            std::process::id()
        ));
        Self {
            file_path: path,
            file: WorksetFile::default(),
        }
    }

    pub fn entries(&self) -> &[TicketEntry] {
        &self.file.entries
    }

    pub fn is_empty(&self) -> bool {
        self.file.entries.is_empty()
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut TicketEntry> {
        self.file.entries.iter_mut().find(|entry| entry.id == id)
    }

    /// Add one entry per pasted ticket key. Duplicate keys are kept as
    /// separate rows; the backend decides how to treat them.
    pub fn add_keys(&mut self, raw: &str) -> Vec<u64> {
        let mut added = Vec::new();
        for key in split_ticket_keys(raw) {
            let id = self.file.next_id;
            self.file.next_id += 1;
            self.file.entries.push(TicketEntry::new(id, &key));
            added.push(id);
        }
        added
    }

    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.file.entries.len();
        self.file.entries.retain(|entry| entry.id != id);
        self.file.entries.len() != before
    }

    /// Set the same label action on every entry whose id is listed.
    pub fn set_action_for(&mut self, ids: &[u64], action: LabelAction) {
        for entry in &mut self.file.entries {
            if ids.contains(&entry.id) {
                entry.label_action = action;
            }
        }
    }

    /// Reconcile the working set with a bulk-update response: drop entries
    /// whose ticket_key succeeded, keep the rest annotated with their error.
    /// Returns how many entries were removed.
    pub fn prune_succeeded(
        &mut self,
        succeeded: &HashSet<String>,
        errors: &[(String, String)],
    ) -> usize {
        let before = self.file.entries.len();
        self.file
            .entries
            .retain(|entry| !succeeded.contains(&entry.ticket_key));
        for entry in &mut self.file.entries {
            if let Some((_, message)) = errors.iter().find(|(key, _)| *key == entry.ticket_key) {
                entry.last_error = Some(message.clone());
            }
        }
        before - self.file.entries.len()
    }

    pub fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(&self.file)
            .map_err(|err| AppError::Configuration(format!("failed to write workset: {err}")))?;
        fs::write(&self.file_path, data)?;
        Ok(())
    }
}
