use std::cmp::Ordering;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Where a priority value came from.
///
/// `Unset` entries compare as zero but lose to any set value on merge.
/// Document parsing produces `Set`; the explicit API path produces
/// `User`. The rank `Unset < Set < User` breaks ties between equal
/// values so that priority comparison is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PriorityState {
    #[default]
    Unset,
    Set,
    User,
}

/// A signed 8-bit priority with an explicit "unset" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Priority {
    value: i8,
    state: PriorityState,
}

impl Priority {
    /// A priority that has never been given a value.
    pub fn unset() -> Self {
        Priority::default()
    }

    /// A priority set by a metadata document.
    pub fn new(value: i8) -> Self {
        Priority {
            value,
            state: PriorityState::Set,
        }
    }

    /// A priority set explicitly through the API.
    pub fn user(value: i8) -> Self {
        Priority {
            value,
            state: PriorityState::User,
        }
    }

    /// The effective value; unset priorities read as zero.
    pub fn value(&self) -> i8 {
        match self.state {
            PriorityState::Unset => 0,
            _ => self.value,
        }
    }

    pub fn state(&self) -> PriorityState {
        self.state
    }

    pub fn is_set(&self) -> bool {
        self.state != PriorityState::Unset
    }

    pub fn is_unset(&self) -> bool {
        !self.is_set()
    }

    /// Merge discipline: the other side wins iff it carries a set value.
    pub fn merge(&mut self, other: Priority) {
        if other.is_set() {
            *self = other;
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value()
            .cmp(&other.value())
            .then(self.state.cmp(&other.state))
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.value())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i8::deserialize(deserializer)?;
        Ok(Priority::new(value))
    }
}
