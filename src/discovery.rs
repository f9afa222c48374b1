use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Error;

/// Walks `root` and returns every non-directory entry whose file name
/// matches the shell-style `pattern`. Each directory is visited in lexical
/// order. Any walk error aborts discovery.
pub fn walk_match(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, Error> {
    let pattern = glob::Pattern::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    let mut matches = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| Error::Discovery {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if pattern.matches(&entry.file_name().to_string_lossy()) {
            matches.push(entry.into_path());
        }
    }

    debug!("found {} files matching under {}", matches.len(), root.display());
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), "").unwrap();
        }
    }

    #[test]
    fn only_matching_files_are_returned_in_walk_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["z.http", "b.http", "c.txt", "a.http"]);
        fs::create_dir(dir.path().join("dir.http")).unwrap();
        touch(&dir.path().join("dir.http"), &["nested.http"]);

        let found = walk_match(dir.path(), "*.http").unwrap();
        assert_eq!(found, vec![
            dir.path().join("a.http"),
            dir.path().join("b.http"),
            dir.path().join("dir.http").join("nested.http"),
            dir.path().join("z.http"),
        ]);
    }

    #[test]
    fn many_files_come_back_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let names: Vec<String> = ('a'..='z').rev().map(|c| format!("{}.http", c)).collect();
        for name in &names {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let found: Vec<String> = walk_match(dir.path(), "*.http")
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        let mut expected = names.clone();
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn question_marks_and_classes() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), &["case-1.http", "case-12.http", "case-b.xttp", "a.http", "*.http"]);

        let names = |pattern: &str| -> Vec<String> {
            walk_match(dir.path(), pattern)
                .unwrap()
                .iter()
                .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
                .collect()
        };
        assert_eq!(names("case-?.[hx]ttp"), vec!["case-1.http", "case-b.xttp"]);
        assert_eq!(names("[!a]*.http"), vec!["*.http", "case-1.http", "case-12.http"]);
        assert_eq!(names("[*].http"), vec!["*.http"]);
    }

    #[test]
    fn bad_patterns_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(walk_match(dir.path(), "[abc"), Err(Error::InvalidPattern { .. })));
        assert!(matches!(walk_match(dir.path(), "a***b"), Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(walk_match(dir.path(), "*.http").unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(walk_match(&missing, "*.http"), Err(Error::Discovery { .. })));
    }
}
