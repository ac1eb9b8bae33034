use serde::{Deserialize, Serialize};

/// A named bucket of plugins with a partial order: every group named in
/// `after` loads before this one. The groups in a metadata document form a
/// DAG that the sorter turns into soft ordering edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Group {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
}

impl Group {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Group {
            name: name.into(),
            after: Vec::new(),
        }
    }

    pub fn after<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after = names.into_iter().map(Into::into).collect();
        self
    }
}
