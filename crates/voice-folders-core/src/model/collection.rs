use crate::{Folder, FolderId};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Every folder the user owns; the unit of persistence.
///
/// Serializes as a bare JSON array of folders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    folders: Vec<Folder>,
}

impl Collection {
    /// Wrap an ordered list of folders.
    pub fn new(folders: Vec<Folder>) -> Self {
        Self { folders }
    }

    /// Folders in creation order.
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Look up a folder by id.
    pub fn folder(&self, id: &FolderId) -> Option<&Folder> {
        self.folders.iter().find(|f| &f.id == id)
    }

    pub(crate) fn folder_mut(&mut self, id: &FolderId) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| &f.id == id)
    }

    pub(crate) fn push(&mut self, folder: Folder) {
        self.folders.push(folder);
    }

    /// Number of folders.
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// Whether there are no folders yet.
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Folders whose name contains `query`, ignoring case.
    ///
    /// An empty (or all-whitespace) query matches every folder.
    pub fn search(&self, query: &str) -> Vec<&Folder> {
        let needle = query.trim().to_lowercase();
        self.folders
            .iter()
            .filter(|f| needle.is_empty() || f.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Check the id uniqueness invariants.
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut folder_ids = HashSet::with_capacity(self.folders.len());
        for folder in &self.folders {
            if !folder_ids.insert(&folder.id) {
                return Err(format!("duplicate folder id {}", folder.id));
            }

            let mut recording_ids = HashSet::with_capacity(folder.recordings.len());
            for recording in &folder.recordings {
                if !recording_ids.insert(&recording.id) {
                    return Err(format!(
                        "duplicate recording id {} in folder {}",
                        recording.id, folder.id
                    ));
                }
            }
        }
        Ok(())
    }

    /// Every id stored in the collection, folders and recordings alike.
    pub(crate) fn ids(&self) -> impl Iterator<Item = &str> {
        self.folders.iter().flat_map(|f| {
            std::iter::once(f.id.as_str()).chain(f.recordings.iter().map(|r| r.id.as_str()))
        })
    }
}
