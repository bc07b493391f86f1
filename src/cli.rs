//! Command line options

use clap::{Parser, ValueEnum};
use particle_physics::{Formation, DEFAULT_EASE, DEFAULT_FRICTION, DEFAULT_GAP, INFLUENCE_RADIUS_SQUARED};
use particle_simulation::FieldParams;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "particles", about = "Interactive image particle field", version)]
pub struct Cli {
    /// Image to sample (PNG or JPEG). A built-in pattern is used when omitted.
    pub image: Option<PathBuf>,

    /// Sampling stride in pixels
    #[arg(long, default_value_t = DEFAULT_GAP)]
    pub gap: u32,

    /// Initial spring stiffness toward the origin
    #[arg(long, default_value_t = DEFAULT_EASE)]
    pub ease: f32,

    /// Per-frame velocity damping
    #[arg(long, default_value_t = DEFAULT_FRICTION)]
    pub friction: f32,

    /// Pointer influence radius in pixels
    #[arg(long, default_value_t = INFLUENCE_RADIUS_SQUARED.sqrt())]
    pub radius: f32,

    /// Fixed RNG seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Render headless and save the last frame to this PNG instead of opening a window
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Frames to simulate in headless mode
    #[arg(long, default_value_t = 300, requires = "snapshot")]
    pub frames: u32,

    /// Headless canvas width
    #[arg(long, default_value_t = 800, requires = "snapshot")]
    pub width: u32,

    /// Headless canvas height
    #[arg(long, default_value_t = 600, requires = "snapshot")]
    pub height: u32,

    /// Formation to trigger on the first headless frame
    #[arg(long, value_enum, requires = "snapshot")]
    pub formation: Option<Trigger>,
}

impl Cli {
    pub fn field_params(&self) -> FieldParams {
        let params = FieldParams::default()
            .with_gap(self.gap)
            .with_ease(self.ease)
            .with_friction(self.friction)
            .with_influence_radius(self.radius);
        match self.seed {
            Some(seed) => params.with_seed(seed),
            None => params,
        }
    }
}

/// Formation trigger names accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Trigger {
    Warp,
    Blocks,
    Assemble,
    Print,
}

impl From<Trigger> for Formation {
    fn from(trigger: Trigger) -> Self {
        match trigger {
            Trigger::Warp => Formation::Warp,
            Trigger::Blocks => Formation::Blocks,
            Trigger::Assemble => Formation::Assemble,
            Trigger::Print => Formation::Print,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_field_params() {
        let cli = Cli::parse_from(["particles"]);
        let params = cli.field_params();
        assert_eq!(params.gap, DEFAULT_GAP);
        assert_eq!(params.ease, DEFAULT_EASE);
        assert!((params.influence_radius_squared - INFLUENCE_RADIUS_SQUARED).abs() < 1e-2);
        assert_eq!(params.seed, None);
    }

    #[test]
    fn test_headless_flags() {
        let cli = Cli::parse_from([
            "particles",
            "logo.png",
            "--snapshot",
            "out.png",
            "--formation",
            "print",
            "--seed",
            "3",
        ]);
        assert_eq!(cli.image, Some(PathBuf::from("logo.png")));
        assert_eq!(cli.formation.map(Formation::from), Some(Formation::Print));
        assert_eq!(cli.field_params().seed, Some(3));
    }

    #[test]
    fn test_formation_requires_snapshot() {
        assert!(Cli::try_parse_from(["particles", "--formation", "warp"]).is_err());
    }
}
