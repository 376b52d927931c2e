//! Configuration file handling
//!
//! Says where the data files live and how strict loading should be.
//! Stored as JSON; every field has a default, so an empty object is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where and how the library state is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory holding the three data files
    pub data_dir: PathBuf,
    pub books_file: String,
    pub users_file: String,
    /// Which user holds which title
    pub loans_file: String,
    /// Abort loading at the first malformed line instead of skipping it
    pub strict_load: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            books_file: "books.txt".to_string(),
            users_file: "users.txt".to_string(),
            loans_file: "loans.txt".to_string(),
            strict_load: true,
        }
    }
}

impl LibraryConfig {
    /// Write this configuration as pretty JSON, refusing an invalid one
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.validate()
            .context("Refusing to write an invalid configuration")?;

        let mut json =
            serde_json::to_string_pretty(self).context("Failed to serialize configuration")?;
        json.push('\n');

        fs::write(path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path))
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let files = [
            ("books_file", &self.books_file),
            ("users_file", &self.users_file),
            ("loans_file", &self.loans_file),
        ];

        for (field, name) in files {
            if name.trim().is_empty() {
                anyhow::bail!("{} must be specified", field);
            }
        }

        if self.books_file == self.users_file
            || self.books_file == self.loans_file
            || self.users_file == self.loans_file
        {
            anyhow::bail!("books_file, users_file and loans_file must all be different");
        }

        Ok(())
    }

    pub fn books_path(&self) -> PathBuf {
        self.data_dir.join(&self.books_file)
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }

    pub fn loans_path(&self) -> PathBuf {
        self.data_dir.join(&self.loans_file)
    }
}
