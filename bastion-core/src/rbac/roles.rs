//! Role records

use crate::rights::{Right, RightSet};

/// A named bundle of granted rights plus the right needed to manage it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    /// Unique role name
    pub name: String,

    /// Rights held by every user assigned to this role
    pub granted: RightSet,

    /// Right a caller must already hold to create, modify or delete this
    /// role or any user assigned to it
    pub manage_right: Right,
}

impl Role {
    /// Create a new role
    pub fn new(name: impl Into<String>, granted: RightSet, manage_right: Right) -> Self {
        Self { name: name.into(), granted, manage_right }
    }

    /// Check if the role grants a right
    pub fn grants(&self, right: Right) -> bool {
        self.granted.contains_right(right)
    }
}
