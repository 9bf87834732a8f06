//! Issue status table and status-token resolution.

use crate::{domain::StatusId, errors::Error, Result};

/// Status id → name table, fetched from the tracker once at startup.
///
/// Entries keep the tracker's order; resolution walks them front to back.
#[derive(Clone, Debug, Default)]
pub struct StatusMapping {
    entries: Vec<(StatusId, String)>,
}

impl StatusMapping {
    pub fn new(entries: Vec<(StatusId, String)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(_, name)| name.clone()).collect()
    }

    /// Resolve a user-supplied token (numeric id or case-insensitive name).
    ///
    /// First matching entry wins. Fails with [`Error::UnknownStatus`] carrying
    /// every valid name when nothing matches.
    pub fn resolve(&self, token: &str) -> Result<StatusId> {
        let token = token.trim();
        let lowered = token.to_lowercase();

        for (id, name) in &self.entries {
            if token == id.0.to_string() {
                return Ok(*id);
            }
            if lowered == name.to_lowercase() {
                return Ok(*id);
            }
        }

        Err(Error::UnknownStatus {
            token: token.to_string(),
            valid: self.names(),
        })
    }
}
