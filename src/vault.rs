use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("invalid ignore pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: ignore::Error,
    },

    #[error("cannot read vault {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read paths from stdin: {0}")]
    Stdin(#[from] io::Error),
}

/// Markdown files under `vault_path`, sorted. `.gitignore` and `.mdqignore`
/// files are honoured and every glob in `ignore_patterns` is excluded.
/// The root itself must be a readable directory; unreadable entries below
/// it are skipped.
pub fn collect_markdown_files(
    vault_path: &Path,
    ignore_patterns: &[String],
) -> Result<Vec<PathBuf>, VaultError> {
    fs::read_dir(vault_path).map_err(|source| VaultError::Root {
        path: vault_path.to_path_buf(),
        source,
    })?;

    let mut overrides = OverrideBuilder::new(vault_path);
    for pattern in ignore_patterns {
        overrides
            .add(&format!("!{}", pattern))
            .map_err(|source| VaultError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
    }
    let overrides = overrides.build().map_err(|source| VaultError::Pattern {
        pattern: ignore_patterns.join(", "),
        source,
    })?;

    let walker = WalkBuilder::new(vault_path)
        .hidden(false)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(false)
        .require_git(false)
        .add_custom_ignore_filename(".mdqignore")
        .overrides(overrides)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable vault entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    tracing::debug!(count = files.len(), vault = %vault_path.display(), "collected markdown files");
    Ok(files)
}

pub fn read_paths_from_stdin() -> Result<Vec<PathBuf>, VaultError> {
    read_paths(io::stdin().lock())
}

fn read_paths(reader: impl BufRead) -> Result<Vec<PathBuf>, VaultError> {
    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            paths.push(PathBuf::from(trimmed));
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "---\ntitle: x\n---\n").unwrap();
    }

    fn relative(root: &Path, files: Vec<PathBuf>) -> Vec<String> {
        files
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_collects_only_markdown_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.md");
        touch(dir.path(), "a.md");
        touch(dir.path(), "notes/c.md");
        touch(dir.path(), "image.png");
        touch(dir.path(), ".hidden/d.md");

        let files = collect_markdown_files(dir.path(), &[]).unwrap();
        assert_eq!(
            relative(dir.path(), files),
            vec![".hidden/d.md", "a.md", "b.md", "notes/c.md"]
        );
    }

    #[test]
    fn test_ignore_file_and_patterns() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "keep.md");
        touch(dir.path(), "templates/t.md");
        touch(dir.path(), "archive/old.md");
        fs::write(dir.path().join(".mdqignore"), "templates/\n").unwrap();

        let files = collect_markdown_files(dir.path(), &["archive/**".to_string()]).unwrap();
        assert_eq!(relative(dir.path(), files), vec!["keep.md"]);
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_markdown_files(dir.path(), &["a[".to_string()]).unwrap_err();
        assert!(matches!(err, VaultError::Pattern { .. }));
    }

    #[test]
    fn test_missing_or_file_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = collect_markdown_files(&dir.path().join("nope"), &[]).unwrap_err();
        assert!(matches!(err, VaultError::Root { .. }));

        touch(dir.path(), "note.md");
        let err = collect_markdown_files(&dir.path().join("note.md"), &[]).unwrap_err();
        assert!(matches!(err, VaultError::Root { .. }));
    }

    #[test]
    fn test_read_paths_skips_blank_lines() {
        let input = "a.md\n\n  sub/b.md  \n";
        let paths = read_paths(input.as_bytes()).unwrap();
        assert_eq!(paths, vec![PathBuf::from("a.md"), PathBuf::from("sub/b.md")]);
    }
}
