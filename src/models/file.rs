use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A reference to another file from a plugin's metadata: a filename plus an
/// optional display name and an optional condition string.
///
/// Equality and hashing are case-insensitive on the filename, matching the
/// way the games resolve plugin names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "FileRefRepr", into = "FileRefRepr")]
pub struct FileRef {
    pub name: String,
    pub display: Option<String>,
    pub condition: Option<String>,
}

impl FileRef {
    pub fn new<S: Into<String>>(name: S) -> Self {
        FileRef {
            name: name.into(),
            display: None,
            condition: None,
        }
    }

    pub fn with_condition<S: Into<String>>(mut self, condition: S) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_display<S: Into<String>>(mut self, display: S) -> Self {
        self.display = Some(display.into());
        self
    }

    /// The name shown to users; falls back to the filename.
    pub fn display_name(&self) -> &str {
        match self.display.as_deref() {
            Some(display) if !display.is_empty() => display,
            _ => &self.name,
        }
    }

    pub(crate) fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

impl PartialEq for FileRef {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for FileRef {}

impl Hash for FileRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Document form: either a bare filename string or a mapping with `name`,
/// `display` and `condition` keys.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum FileRefRepr {
    Name(String),
    Full(FileRefDoc),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileRefDoc {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
}

impl From<FileRefRepr> for FileRef {
    fn from(repr: FileRefRepr) -> Self {
        match repr {
            FileRefRepr::Name(name) => FileRef::new(name),
            FileRefRepr::Full(doc) => FileRef {
                name: doc.name,
                display: doc.display,
                condition: doc.condition,
            },
        }
    }
}

impl From<FileRef> for FileRefRepr {
    fn from(file: FileRef) -> Self {
        if file.display.is_none() && file.condition.is_none() {
            FileRefRepr::Name(file.name)
        } else {
            FileRefRepr::Full(FileRefDoc {
                name: file.name,
                display: file.display,
                condition: file.condition,
            })
        }
    }
}
