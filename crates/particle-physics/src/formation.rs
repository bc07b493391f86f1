//! Formation presets
//!
//! A formation re-parameterizes every particle's spring (ease and size) and
//! moves it to a new starting position. Assemble and print additionally freeze
//! particles and release them one by one.

use crate::constants::BLOCK_SIZE;
use std::fmt;

/// Named target configuration triggered by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Formation {
    /// Explosive scatter over the whole field, then settle
    Warp,
    /// Enlarged squares, half of them dropped onto the bottom edge
    Blocks,
    /// Random scatter, frozen, released in a slow cascade
    Assemble,
    /// Everything emitted from the bottom center in a tight cascade
    Print,
}

impl Formation {
    /// Spring stiffness applied by this formation
    pub const fn ease(self) -> f32 {
        match self {
            Formation::Warp => 0.1,
            Formation::Blocks => 0.04,
            Formation::Assemble | Formation::Print => 0.2,
        }
    }

    /// Square size applied by this formation, `gap` being the canonical grid size
    pub fn size(self, gap: f32) -> f32 {
        match self {
            Formation::Blocks => BLOCK_SIZE,
            _ => gap,
        }
    }

    /// Reactivation delay per activation step in milliseconds.
    ///
    /// `None` for formations that leave particles active.
    pub const fn stagger_ms(self) -> Option<f32> {
        match self {
            Formation::Assemble => Some(0.5),
            Formation::Print => Some(1.0),
            Formation::Warp | Formation::Blocks => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Formation::Warp => "warp",
            Formation::Blocks => "blocks",
            Formation::Assemble => "assemble",
            Formation::Print => "print",
        }
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cascades_stagger() {
        assert_eq!(Formation::Warp.stagger_ms(), None);
        assert_eq!(Formation::Blocks.stagger_ms(), None);
        assert_eq!(Formation::Assemble.stagger_ms(), Some(0.5));
        assert_eq!(Formation::Print.stagger_ms(), Some(1.0));
    }

    #[test]
    fn test_sizes() {
        assert_eq!(Formation::Blocks.size(4.0), BLOCK_SIZE);
        assert_eq!(Formation::Warp.size(4.0), 4.0);
        assert_eq!(Formation::Print.size(2.0), 2.0);
    }
}
