//! User records

/// An identity bound to exactly one role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,

    /// Name of the assigned role (key into the role registry)
    pub role: String,
}

impl User {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self { name: name.into(), role: role.into() }
    }
}
