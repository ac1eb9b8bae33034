use std::fmt;

use camino::Utf8Path;
use thiserror::Error;

use crate::services::sorting::EdgeType;

/// Result alias for all fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// One step of a reported sorting cycle: the plugin and the rule that
/// contributed the edge leading to the next plugin in the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleEdge {
    pub plugin: String,
    pub edge_type: EdgeType,
}

impl fmt::Display for CycleEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --[{}]-->", self.plugin, self.edge_type)
    }
}

/// The error kinds exposed by this crate.
///
/// Each kind has a stable numeric code (see [`Error::code`]) that is part of
/// the compatibility surface; kinds are never collapsed into one another.
#[derive(Debug, Error)]
pub enum Error {
    /// A path was missing, unreadable, or unwritable.
    #[error("file access error: {0}")]
    FileAccess(String),

    /// A condition string failed to parse.
    #[error("failed to parse condition \"{condition}\": {reason}")]
    ConditionSyntax { condition: String, reason: String },

    /// The sorter detected a cycle. The payload names every plugin in the
    /// cycle along with the rule class that contributed each edge.
    #[error("cyclic interaction detected: {}", format_cycle(.0))]
    CyclicInteraction(Vec<CycleEdge>),

    /// A version control operation failed.
    #[error("version control error: {0}")]
    GitState(String),

    /// A caller-supplied path or flag was self-inconsistent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Metadata referenced a group name that no group declaration defines.
    #[error("group \"{0}\" is not declared in the group graph")]
    UndefinedGroup(String),
}

impl Error {
    /// Stable integer code for this error kind.
    pub fn code(&self) -> u32 {
        match self {
            Error::FileAccess(_) => 1,
            Error::ConditionSyntax { .. } => 2,
            Error::CyclicInteraction(_) => 3,
            Error::GitState(_) => 4,
            Error::InvalidArgument(_) => 5,
            Error::UndefinedGroup(_) => 6,
        }
    }

    /// The plugins involved in a reported cycle, in cycle order.
    pub fn cycle(&self) -> Option<&[CycleEdge]> {
        match self {
            Error::CyclicInteraction(cycle) => Some(cycle),
            _ => None,
        }
    }

    pub(crate) fn io(path: &Utf8Path, err: &std::io::Error) -> Self {
        Error::FileAccess(format!("{path}: {err}"))
    }
}

fn format_cycle(cycle: &[CycleEdge]) -> String {
    let mut out = String::new();
    for step in cycle {
        out.push_str(&step.to_string());
        out.push(' ');
    }
    match cycle.first() {
        Some(first) => {
            out.push_str(&first.plugin);
            out
        }
        None => "empty cycle".to_string(),
    }
}
