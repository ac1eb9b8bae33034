use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A Bash Tag suggestion: a tag name, whether it is being suggested for
/// addition or removal, and an optional condition.
///
/// Document form is a bare string (a leading `-` marks a removal) or a
/// `{name, condition}` mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "TagRepr", into = "TagRepr")]
pub struct Tag {
    pub name: String,
    pub is_addition: bool,
    pub condition: Option<String>,
}

impl Tag {
    pub fn addition<S: Into<String>>(name: S) -> Self {
        Tag {
            name: name.into(),
            is_addition: true,
            condition: None,
        }
    }

    pub fn removal<S: Into<String>>(name: S) -> Self {
        Tag {
            name: name.into(),
            is_addition: false,
            condition: None,
        }
    }

    pub fn with_condition<S: Into<String>>(mut self, condition: S) -> Self {
        self.condition = Some(condition.into());
        self
    }

    fn from_prefixed(name: String) -> Self {
        match name.strip_prefix('-') {
            Some(stripped) => Tag::removal(stripped),
            None => Tag::addition(name),
        }
    }

    fn prefixed_name(&self) -> String {
        if self.is_addition {
            self.name.clone()
        } else {
            format!("-{}", self.name)
        }
    }

    pub(crate) fn key(&self) -> (String, bool) {
        (self.name.to_lowercase(), self.is_addition)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TagRepr {
    Name(String),
    Full(TagDoc),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TagDoc {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<String>,
}

impl From<TagRepr> for Tag {
    fn from(repr: TagRepr) -> Self {
        match repr {
            TagRepr::Name(name) => Tag::from_prefixed(name),
            TagRepr::Full(doc) => {
                let mut tag = Tag::from_prefixed(doc.name);
                tag.condition = doc.condition;
                tag
            }
        }
    }
}

impl From<Tag> for TagRepr {
    fn from(tag: Tag) -> Self {
        let name = tag.prefixed_name();
        match tag.condition {
            None => TagRepr::Name(name),
            condition => TagRepr::Full(TagDoc { name, condition }),
        }
    }
}
