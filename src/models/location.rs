use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A download location for a plugin: a URL plus an optional display name.
/// Document form is a bare URL string or a `{link, name}` mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "LocationRepr", into = "LocationRepr")]
pub struct Location {
    pub url: String,
    pub name: Option<String>,
}

impl Location {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Location {
            url: url.into(),
            name: None,
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub(crate) fn key(&self) -> String {
        self.url.to_lowercase()
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LocationRepr {
    Url(String),
    Full(LocationDoc),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct LocationDoc {
    link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl From<LocationRepr> for Location {
    fn from(repr: LocationRepr) -> Self {
        match repr {
            LocationRepr::Url(url) => Location::new(url),
            LocationRepr::Full(doc) => Location {
                url: doc.link,
                name: doc.name,
            },
        }
    }
}

impl From<Location> for LocationRepr {
    fn from(location: Location) -> Self {
        match location.name {
            None => LocationRepr::Url(location.url),
            name => LocationRepr::Full(LocationDoc {
                link: location.url,
                name,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_bare_url() {
        let location: Location =
            serde_yaml_ng::from_str("\"https://example.com/mod\"").unwrap();
        assert_eq!(location.url, "https://example.com/mod");
        assert!(location.name.is_none());
    }

    #[test]
    fn test_deserialize_mapping() {
        let location: Location =
            serde_yaml_ng::from_str("{link: 'https://example.com/mod', name: 'Mod Page'}")
                .unwrap();
        assert_eq!(location.url, "https://example.com/mod");
        assert_eq!(location.name.as_deref(), Some("Mod Page"));
    }

    #[test]
    fn test_equality_is_case_insensitive_on_url() {
        assert_eq!(
            Location::new("https://Example.com/Mod"),
            Location::new("https://example.com/mod")
        );
    }
}
