use serde::{Deserialize, Serialize};

use super::Instant;

/// A tracked individual. Immutable once the registry is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub birth: Instant,
}

impl Person {
    pub fn new(name: impl Into<String>, birth: Instant) -> Self {
        Self {
            name: name.into(),
            birth,
        }
    }
}
