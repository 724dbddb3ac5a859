//! GPO version arithmetic
//!
//! A GPO's `versionNumber` attribute packs two independent 16-bit revision
//! counters into one 32-bit integer: the user-policy revision in the high
//! half, the computer-policy revision in the low half. The two halves move
//! independently; combining them is a plain shift-and-add with no carry
//! between the fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which half (or halves) of the version number an increment applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionTarget {
    User,
    Computer,
    Both,
}

impl std::str::FromStr for VersionTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(VersionTarget::User),
            "computer" | "machine" => Ok(VersionTarget::Computer),
            "both" => Ok(VersionTarget::Both),
            other => Err(format!("unknown version target: {}", other)),
        }
    }
}

impl fmt::Display for VersionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionTarget::User => write!(f, "User"),
            VersionTarget::Computer => write!(f, "Computer"),
            VersionTarget::Both => write!(f, "Both"),
        }
    }
}

/// A GPO version number split into its two independent halves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpoVersion {
    pub user: u16,
    pub computer: u16,
}

impl GpoVersion {
    /// Split a raw 32-bit `versionNumber` value into its halves
    pub fn from_raw(raw: u32) -> Self {
        Self {
            user: (raw >> 16) as u16,
            computer: (raw & 0xFFFF) as u16,
        }
    }

    /// Recombine into the raw 32-bit directory value
    pub fn as_raw(&self) -> u32 {
        ((self.user as u32) << 16) + self.computer as u32
    }

    /// Return a copy with the selected half (or halves) incremented by one.
    ///
    /// A counter at 65535 wraps to zero; either way the combined value
    /// changes, which is what forces clients to re-read the policy.
    pub fn incremented(&self, target: VersionTarget) -> Self {
        let mut next = *self;
        match target {
            VersionTarget::User => next.user = next.user.wrapping_add(1),
            VersionTarget::Computer => next.computer = next.computer.wrapping_add(1),
            VersionTarget::Both => {
                next.user = next.user.wrapping_add(1);
                next.computer = next.computer.wrapping_add(1);
            }
        }
        next
    }
}

impl fmt::Display for GpoVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (user={}, computer={})", self.as_raw(), self.user, self.computer)
    }
}
