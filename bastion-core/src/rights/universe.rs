//! The fixed universe of rights known to a process

use super::{Right, RightSet};
use crate::rbac::RbacError;
use std::collections::HashMap;

/// Number of distinct rights a universe can hold (one per bit of a `u64`)
pub const MAX_RIGHTS: usize = 64;

/// Universe used when configuration does not name one
pub const DEFAULT_RIGHTS: [&str; 5] = ["read", "write", "manage-users", "manage-roles", "superuser"];

/// Ordered, immutable mapping between right names and bit positions.
///
/// Bit `i` is the `i`-th name given to [`RightUniverse::new`]. Names are
/// matched case-insensitively and stored lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RightUniverse {
    names: Vec<String>,
    index: HashMap<String, Right>,
}

impl RightUniverse {
    /// Build a universe from an ordered list of names.
    ///
    /// Fails with `ValidationError` when the list is empty, longer than
    /// [`MAX_RIGHTS`], or contains blank or duplicate names.
    pub fn new<I, S>(names: I) -> Result<Self, RbacError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered = Vec::new();
        let mut index = HashMap::new();

        for name in names {
            let name = normalize(name.as_ref());
            if name.is_empty() {
                return Err(RbacError::ValidationError("right names must not be empty".into()));
            }
            let right = Right::from_bit(ordered.len() as u8).ok_or_else(|| {
                RbacError::ValidationError(format!(
                    "right universe holds at most {} rights",
                    MAX_RIGHTS
                ))
            })?;
            if index.insert(name.clone(), right).is_some() {
                return Err(RbacError::ValidationError(format!("duplicate right '{}'", name)));
            }
            ordered.push(name);
        }

        if ordered.is_empty() {
            return Err(RbacError::ValidationError("right universe must not be empty".into()));
        }

        Ok(Self { names: ordered, index })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Every right of the universe
    pub fn all(&self) -> RightSet {
        RightSet::from_rights(self.index.values().copied())
    }

    /// Whether `right` belongs to this universe
    pub fn contains(&self, right: Right) -> bool {
        (right.bit() as usize) < self.names.len()
    }

    /// Whether every member of `set` belongs to this universe
    pub fn contains_set(&self, set: RightSet) -> bool {
        self.all().contains(set)
    }

    /// Look a right up by name
    pub fn resolve(&self, name: &str) -> Result<Right, RbacError> {
        self.index
            .get(&normalize(name))
            .copied()
            .ok_or_else(|| RbacError::InvalidRight(name.to_string()))
    }

    /// Resolve a list of names, failing on the first unknown one
    pub fn resolve_all<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Right>, RbacError> {
        names.iter().map(|name| self.resolve(name.as_ref())).collect()
    }

    /// Resolve a list of names into a set
    pub fn right_set<S: AsRef<str>>(&self, names: &[S]) -> Result<RightSet, RbacError> {
        Ok(RightSet::from_rights(self.resolve_all(names)?))
    }

    /// Name of a right, if it belongs to this universe
    pub fn name(&self, right: Right) -> Option<&str> {
        self.names.get(right.bit() as usize).map(String::as_str)
    }

    /// Names of the rights in `set`, in bit order. Bits outside the universe are skipped.
    pub fn names(&self, set: RightSet) -> Vec<String> {
        set.iter().filter_map(|right| self.name(right)).map(str::to_string).collect()
    }
}

impl Default for RightUniverse {
    fn default() -> Self {
        let names = DEFAULT_RIGHTS.iter().map(|n| n.to_string()).collect();
        let index = DEFAULT_RIGHTS
            .iter()
            .enumerate()
            .map(|(bit, name)| (name.to_string(), Right(bit as u8)))
            .collect();
        Self { names, index }
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
