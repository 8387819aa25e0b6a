//! Rights and right sets
//!
//! A [`Right`] is a single bit position inside a fixed universe of at most 64
//! permissions. A [`RightSet`] is an immutable `u64` bit-vector over that
//! universe, so every check on the request path is one AND and one compare.
//!
//! The universe itself ([`RightUniverse`]) is built once at startup from the
//! ordered list of right names in configuration and never changes afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use bastion_core::rights::{RightSet, RightUniverse};
//!
//! let universe = RightUniverse::new(["read", "write", "manage-users"])?;
//! let read = universe.resolve("read")?;
//! let write = universe.resolve("write")?;
//!
//! let editor = RightSet::from_rights([read, write]);
//! assert!(editor.contains(RightSet::from(read)));
//! assert!(!editor.contains_right(universe.resolve("manage-users")?));
//! ```

mod universe;

pub use universe::{RightUniverse, DEFAULT_RIGHTS, MAX_RIGHTS};

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// A single permission, identified by its bit position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Right(u8);

impl Right {
    /// Build a right from a raw bit position.
    ///
    /// Returns `None` for positions that cannot fit in a [`RightSet`]. A right
    /// built this way is not necessarily part of a given universe; registries
    /// check membership with [`RightUniverse::contains`].
    pub const fn from_bit(bit: u8) -> Option<Self> {
        if (bit as usize) < MAX_RIGHTS {
            Some(Self(bit))
        } else {
            None
        }
    }

    /// Bit position of this right
    pub const fn bit(self) -> u8 {
        self.0
    }

    const fn mask(self) -> u64 {
        1u64 << self.0
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "right#{}", self.0)
    }
}

/// Immutable set of rights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RightSet(u64);

impl RightSet {
    /// The empty set. Satisfies no requirement except the empty one.
    pub const EMPTY: RightSet = RightSet(0);

    /// Build a set from raw bits
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Raw bits of the set
    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn from_rights<I: IntoIterator<Item = Right>>(rights: I) -> Self {
        rights.into_iter().fold(Self::EMPTY, |set, right| set.with(right))
    }

    /// Copy of this set with `right` added
    #[must_use]
    pub const fn with(self, right: Right) -> Self {
        Self(self.0 | right.mask())
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Rights in `self` that are not in `other`
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Subset test: true when every right in `required` is held by `self`
    pub const fn contains(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    pub const fn contains_right(self, right: Right) -> bool {
        self.0 & right.mask() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Rights in this set, lowest bit first
    pub fn iter(self) -> impl Iterator<Item = Right> {
        (0..MAX_RIGHTS as u8).map(Right).filter(move |right| self.contains_right(*right))
    }
}

impl From<Right> for RightSet {
    fn from(right: Right) -> Self {
        Self::EMPTY.with(right)
    }
}

impl FromIterator<Right> for RightSet {
    fn from_iter<I: IntoIterator<Item = Right>>(iter: I) -> Self {
        Self::from_rights(iter)
    }
}

impl BitOr for RightSet {
    type Output = RightSet;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitAnd for RightSet {
    type Output = RightSet;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.intersection(rhs)
    }
}
