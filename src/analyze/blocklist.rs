//! Blocked-author list
//!
//! A plain text file with one author per line. Blank lines and `#` comments are
//! ignored. New entries are appended, never rewritten.

use crate::HarvestError;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BlockList {
    path: PathBuf,
    authors: HashSet<String>,
}

impl BlockList {
    /// Loads the list at `path`; a missing file is an empty list
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, HarvestError> {
        let path = path.into();
        let authors = match fs::read_to_string(&path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("Block list {} not found, starting empty", path.display());
                HashSet::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, authors })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, author: &str) -> bool {
        self.authors.contains(author)
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    /// Adds `author` and appends it to the file
    ///
    /// Returns false, without touching the file, if the author was already blocked.
    pub fn block(&mut self, author: &str) -> Result<bool, HarvestError> {
        if self.contains(author) {
            return Ok(false);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", author)?;

        self.authors.insert(author.to_string());
        Ok(true)
    }
}
