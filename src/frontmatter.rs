use crate::value::{DynamicValue, FieldAccessor};
use serde_yaml::{Mapping, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid frontmatter in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("frontmatter in {} is not a mapping", .0.display())]
    NotAMapping(PathBuf),
}

/// A markdown note's frontmatter, fields kept in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub path: PathBuf,
    pub fields: Mapping,
}

impl Note {
    /// `Ok(None)` when the file has no frontmatter block.
    pub fn load(path: &Path) -> Result<Option<Note>, NoteError> {
        let content = fs::read_to_string(path).map_err(|source| NoteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Note::from_content(path, &content)
    }

    pub fn from_content(path: &Path, content: &str) -> Result<Option<Note>, NoteError> {
        let Some(yaml_str) = extract_block(content) else {
            return Ok(None);
        };
        if yaml_str.trim().is_empty() {
            return Ok(Some(Note {
                path: path.to_path_buf(),
                fields: Mapping::new(),
            }));
        }

        let value: Value = serde_yaml::from_str(yaml_str).map_err(|source| NoteError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

        let fields = match value {
            Value::Mapping(m) => m,
            Value::Null => Mapping::new(),
            _ => return Err(NoteError::NotAMapping(path.to_path_buf())),
        };

        Ok(Some(Note {
            path: path.to_path_buf(),
            fields,
        }))
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        if let Some(v) = self.fields.get(name) {
            return Some(v);
        }
        self.fields
            .iter()
            .find(|(key, _)| key.as_str().is_some_and(|k| k.eq_ignore_ascii_case(name)))
            .map(|(_, v)| v)
    }
}

impl FieldAccessor for Note {
    fn get_field(&self, name: &str) -> Option<DynamicValue> {
        self.lookup(name).map(DynamicValue::from)
    }
}

/// The text between the opening `---` and the next line starting with `---`.
fn extract_block(content: &str) -> Option<&str> {
    let trimmed = content.trim_start();
    let after_first = trimmed.strip_prefix("---")?;
    let after_first = after_first.strip_prefix('\r').unwrap_or(after_first);
    let after_first = after_first.strip_prefix('\n')?;

    if after_first.starts_with("---") {
        return Some("");
    }
    let end_idx = after_first.find("\n---")?;
    Some(&after_first[..end_idx])
}
