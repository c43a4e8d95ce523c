use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

use crate::SourceReader;

/// Reads raw text from a single file, or from every matching file under a
/// directory when pointed at one.
pub struct FileSource {
    ending: Option<String>,
}

impl FileSource {
    pub fn new(ending: Option<String>) -> Self {
        Self { ending }
    }

    fn matches(&self, path: &Path) -> bool {
        match &self.ending {
            Some(ending) => path.to_string_lossy().ends_with(ending.as_str()),
            None => true,
        }
    }
}

impl SourceReader for FileSource {
    fn load(&self, location: &Path) -> Result<Vec<String>> {
        if !location.is_dir() {
            let content = fs::read_to_string(location)
                .with_context(|| format!("failed to read file: {}", location.display()))?;
            return Ok(vec![content]);
        }

        let mut contents = Vec::new();
        for entry in WalkDir::new(location) {
            let entry = entry?;
            if !entry.file_type().is_file() || !self.matches(entry.path()) {
                continue;
            }
            let content = fs::read_to_string(entry.path())
                .with_context(|| format!("failed to read file: {}", entry.path().display()))?;
            contents.push(content);
        }
        debug!(location = %location.display(), files = contents.len(), "loaded directory");
        Ok(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ending_filter_matches_suffix() {
        let source = FileSource::new(Some(".txt".to_string()));
        assert!(source.matches(Path::new("notes/report.txt")));
        assert!(!source.matches(Path::new("notes/report.md")));
    }

    #[test]
    fn no_ending_matches_everything() {
        let source = FileSource::new(None);
        assert!(source.matches(Path::new("anything.bin")));
    }
}
