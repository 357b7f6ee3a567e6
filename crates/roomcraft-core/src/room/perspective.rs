//! Camera perspectives rendered for each room.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A camera perspective of a room.
///
/// `Hero` is the canonical eye-level render; every other perspective is
/// derived from it and must visually match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    Hero,
    Wide,
    Overhead,
    Detail,
}

impl Perspective {
    /// All perspectives, hero first.
    pub const ALL: [Perspective; 4] = [
        Perspective::Hero,
        Perspective::Wide,
        Perspective::Overhead,
        Perspective::Detail,
    ];

    /// The perspectives fanned out after hero approval.
    pub const SECONDARY: [Perspective; 3] =
        [Perspective::Wide, Perspective::Overhead, Perspective::Detail];

    /// Human-readable label shown in the UI and sent to the generation service.
    pub fn label(&self) -> &'static str {
        match self {
            Perspective::Hero => "Eye-Level (Hero)",
            Perspective::Wide => "Wide Angle (Full Room)",
            Perspective::Overhead => "Isometric / Overhead",
            Perspective::Detail => "Close-up Detail",
        }
    }

    pub fn is_hero(&self) -> bool {
        matches!(self, Perspective::Hero)
    }

    /// Every perspective except `self`, in canonical order.
    pub fn others(&self) -> Vec<Perspective> {
        Self::ALL.into_iter().filter(|p| p != self).collect()
    }
}

impl Default for Perspective {
    fn default() -> Self {
        Perspective::Hero
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_others_excludes_self() {
        assert_eq!(Perspective::Hero.others(), Perspective::SECONDARY.to_vec());
        assert_eq!(
            Perspective::Overhead.others(),
            vec![Perspective::Hero, Perspective::Wide, Perspective::Detail]
        );
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Perspective::Overhead).unwrap(),
            "\"overhead\""
        );
    }
}
