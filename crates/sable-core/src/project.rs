// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The set of open source files, indexed two ways.
//!
//! A [`Project`] owns every open [`SourceFile`] and keeps two indexes over
//! the same set: the canonical filesystem path and the client's URI. Both
//! indexes agree after every public operation; files are stored under
//! their path, with the URI index mapping back to it.

use std::collections::HashMap;

use camino::Utf8PathBuf;
use tracing::debug;

use crate::document::{SourceFile, TextChange};
use crate::error::DocumentError;
use crate::source_analysis::FileId;

/// The open-file set of one editing session.
///
/// File ids are assigned from a counter and never reused, so a stale
/// [`crate::source_analysis::Span`] can always be told apart from a span
/// of a re-opened file.
#[derive(Debug, Default)]
pub struct Project {
    /// Primary storage, keyed by filesystem path.
    files_by_path: HashMap<Utf8PathBuf, SourceFile>,
    /// Secondary index: URI to path.
    files_by_uri: HashMap<String, Utf8PathBuf>,
    /// Next file id to assign.
    next_file_id: u32,
}

impl Project {
    /// Creates an empty project.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files_by_path: HashMap::new(),
            files_by_uri: HashMap::new(),
            next_file_id: 1,
        }
    }

    /// Opens a file, replacing any previous entry at the same path.
    ///
    /// The previous entry (if any) is removed from both indexes and its
    /// storage released before the new file is parsed and inserted.
    pub fn add_or_update_file(
        &mut self,
        path: impl Into<Utf8PathBuf>,
        uri: impl Into<String>,
        content: impl Into<String>,
        version: i32,
    ) -> &SourceFile {
        let path = path.into();
        let uri = uri.into();

        if let Some(old) = self.files_by_path.remove(&path) {
            self.files_by_uri.remove(old.uri());
        }

        let file_id = FileId::new(self.next_file_id);
        self.next_file_id += 1;

        let file = SourceFile::new(path.clone(), uri.clone(), content, version, file_id);
        debug!(%path, version, "opened source file");
        self.files_by_uri.insert(uri, path.clone());
        self.files_by_path.insert(path.clone(), file);
        &self.files_by_path[&path]
    }

    /// Looks up a file by filesystem path.
    pub fn file_by_path(&self, path: &Utf8PathBuf) -> Result<&SourceFile, DocumentError> {
        self.files_by_path
            .get(path)
            .ok_or_else(|| DocumentError::FileNotFound(path.as_str().into()))
    }

    /// Looks up a file by URI.
    pub fn file_by_uri(&self, uri: &str) -> Result<&SourceFile, DocumentError> {
        let path = self
            .files_by_uri
            .get(uri)
            .ok_or_else(|| DocumentError::FileNotFound(uri.into()))?;
        self.file_by_path(path)
    }

    fn file_by_uri_mut(&mut self, uri: &str) -> Result<&mut SourceFile, DocumentError> {
        let path = self
            .files_by_uri
            .get(uri)
            .ok_or_else(|| DocumentError::FileNotFound(uri.into()))?;
        self.files_by_path
            .get_mut(path)
            .ok_or_else(|| DocumentError::FileNotFound(uri.into()))
    }

    /// Replaces a file's entire content: a single full-document edit.
    pub fn update_file_content(
        &mut self,
        uri: &str,
        content: impl Into<String>,
        version: i32,
    ) -> Result<(), DocumentError> {
        let file = self.file_by_uri_mut(uri)?;
        file.apply_text_changes(&[TextChange::full(content.into())], version)
    }

    /// Forwards incremental changes to the file's edit method.
    pub fn apply_incremental_changes(
        &mut self,
        uri: &str,
        changes: &[TextChange],
        version: i32,
    ) -> Result<(), DocumentError> {
        let file = self.file_by_uri_mut(uri)?;
        file.apply_text_changes(changes, version)
    }

    /// Closes a file by path, releasing its storage.
    pub fn remove_file_by_path(&mut self, path: &Utf8PathBuf) -> Result<(), DocumentError> {
        let file = self
            .files_by_path
            .remove(path)
            .ok_or_else(|| DocumentError::FileNotFound(path.as_str().into()))?;
        self.files_by_uri.remove(file.uri());
        debug!(%path, "closed source file");
        Ok(())
    }

    /// Closes a file by URI, releasing its storage.
    pub fn remove_file_by_uri(&mut self, uri: &str) -> Result<(), DocumentError> {
        let path = self
            .files_by_uri
            .remove(uri)
            .ok_or_else(|| DocumentError::FileNotFound(uri.into()))?;
        self.files_by_path.remove(&path);
        debug!(%path, "closed source file");
        Ok(())
    }

    /// Returns the number of open files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files_by_path.len()
    }

    /// Iterates over all open files, in no particular order.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files_by_path.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language_service::Position;

    /// Both indexes must reference the same file set.
    fn assert_indexes_agree(project: &Project) {
        assert_eq!(project.files_by_path.len(), project.files_by_uri.len());
        for (uri, path) in &project.files_by_uri {
            let file = project
                .files_by_path
                .get(path)
                .expect("uri index points at a stored file");
            assert_eq!(file.uri(), uri);
            assert_eq!(file.path(), path);
        }
    }

    fn path(s: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(s)
    }

    #[test]
    fn add_and_lookup_both_ways() {
        let mut project = Project::new();
        project.add_or_update_file("/src/a.sb", "file:///src/a.sb", "import std;", 1);

        let by_path = project.file_by_path(&path("/src/a.sb")).expect("by path");
        let by_uri = project.file_by_uri("file:///src/a.sb").expect("by uri");
        assert_eq!(by_path.uri(), by_uri.uri());
        assert_eq!(project.file_count(), 1);
        assert_indexes_agree(&project);
    }

    #[test]
    fn reopen_replaces_and_bumps_file_id() {
        let mut project = Project::new();
        let first_id = project
            .add_or_update_file("/src/a.sb", "file:///src/a.sb", "int a = 1;", 1)
            .file_id();
        let second_id = project
            .add_or_update_file("/src/a.sb", "file:///src/a.sb", "int b = 2;", 2)
            .file_id();

        assert_ne!(first_id, second_id, "file ids are never reused");
        assert_eq!(project.file_count(), 1);
        let file = project.file_by_uri("file:///src/a.sb").expect("file");
        assert_eq!(file.content(), "int b = 2;");
        assert_eq!(file.version(), 2);
        assert_indexes_agree(&project);
    }

    #[test]
    fn lookup_missing_is_file_not_found() {
        let project = Project::new();
        assert!(matches!(
            project.file_by_path(&path("/none.sb")),
            Err(DocumentError::FileNotFound(_))
        ));
        assert!(matches!(
            project.file_by_uri("file:///none.sb"),
            Err(DocumentError::FileNotFound(_))
        ));
    }

    #[test]
    fn update_file_content_is_full_edit() {
        let mut project = Project::new();
        project.add_or_update_file("/src/a.sb", "file:///src/a.sb", "int a = 1;", 1);
        project
            .update_file_content("file:///src/a.sb", "int b = 2;", 2)
            .expect("update");

        let file = project.file_by_uri("file:///src/a.sb").expect("file");
        assert_eq!(file.content(), "int b = 2;");
        assert_eq!(file.version(), 2);
        assert_indexes_agree(&project);
    }

    #[test]
    fn incremental_changes_are_forwarded() {
        use crate::document::{TextRange, TextChange};

        let mut project = Project::new();
        project.add_or_update_file(
            "/src/a.sb",
            "file:///src/a.sb",
            "import foo;\nstruct Point { int x; }\n",
            1,
        );
        project
            .apply_incremental_changes(
                "file:///src/a.sb",
                &[TextChange::splice(
                    TextRange::new(Position::new(1, 15), Position::new(1, 20)),
                    "int y",
                )],
                2,
            )
            .expect("apply");

        let file = project.file_by_uri("file:///src/a.sb").expect("file");
        assert!(file.content().contains("int y"));
        assert_eq!(file.version(), 2);
    }

    #[test]
    fn edits_on_unknown_uri_fail() {
        let mut project = Project::new();
        assert!(matches!(
            project.update_file_content("file:///none.sb", "x", 1),
            Err(DocumentError::FileNotFound(_))
        ));
        assert!(matches!(
            project.apply_incremental_changes("file:///none.sb", &[], 1),
            Err(DocumentError::FileNotFound(_))
        ));
    }

    #[test]
    fn remove_by_path_clears_both_indexes() {
        let mut project = Project::new();
        project.add_or_update_file("/src/a.sb", "file:///src/a.sb", "", 1);
        project
            .remove_file_by_path(&path("/src/a.sb"))
            .expect("remove");

        assert_eq!(project.file_count(), 0);
        assert!(project.file_by_uri("file:///src/a.sb").is_err());
        assert_indexes_agree(&project);
    }

    #[test]
    fn remove_by_uri_clears_both_indexes() {
        let mut project = Project::new();
        project.add_or_update_file("/src/a.sb", "file:///src/a.sb", "", 1);
        project
            .remove_file_by_uri("file:///src/a.sb")
            .expect("remove");

        assert_eq!(project.file_count(), 0);
        assert!(project.file_by_path(&path("/src/a.sb")).is_err());
        assert_indexes_agree(&project);
    }

    #[test]
    fn remove_missing_is_file_not_found() {
        let mut project = Project::new();
        assert!(matches!(
            project.remove_file_by_path(&path("/none.sb")),
            Err(DocumentError::FileNotFound(_))
        ));
        assert!(matches!(
            project.remove_file_by_uri("file:///none.sb"),
            Err(DocumentError::FileNotFound(_))
        ));
    }

    #[test]
    fn files_iterates_all_entries() {
        let mut project = Project::new();
        project.add_or_update_file("/src/a.sb", "file:///src/a.sb", "", 1);
        project.add_or_update_file("/src/b.sb", "file:///src/b.sb", "", 1);

        let mut paths: Vec<_> = project.files().map(|f| f.path().to_string()).collect();
        paths.sort();
        assert_eq!(paths, vec!["/src/a.sb", "/src/b.sb"]);
        assert_eq!(project.file_count(), 2);
        assert_indexes_agree(&project);
    }

    #[test]
    fn failed_edit_leaves_indexes_and_content_intact() {
        use crate::document::{TextRange, TextChange};

        let mut project = Project::new();
        project.add_or_update_file("/src/a.sb", "file:///src/a.sb", "abc", 1);
        let result = project.apply_incremental_changes(
            "file:///src/a.sb",
            &[TextChange::splice(
                TextRange::new(Position::new(5, 0), Position::new(5, 1)),
                "x",
            )],
            2,
        );
        assert!(result.is_err());

        let file = project.file_by_uri("file:///src/a.sb").expect("file");
        assert_eq!(file.content(), "abc");
        assert_eq!(file.version(), 1);
        assert_indexes_agree(&project);
    }
}
