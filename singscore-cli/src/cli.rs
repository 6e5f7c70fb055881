use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use singscore_core::ScoringPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "singscore",
    about = "Score a singer's pitch against a reference vocal in real time"
)]
pub struct Cli {
    /// Configuration file (TOML). Defaults to ./singscore.toml or the user config dir.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze an isolated vocal stem into a reusable reference track (JSON)
    Analyze {
        /// Vocal stem (WAV)
        vocals: PathBuf,

        /// Where to write the reference track
        #[arg(short, long, default_value = "reference.json")]
        output: PathBuf,

        /// Samples per analysis frame
        #[arg(long)]
        hop_size: Option<usize>,
    },

    /// Score a recorded performance against a reference, without any device
    Score {
        /// Reference track (JSON from `analyze`) or vocal stem (WAV)
        reference: PathBuf,

        /// Recorded performance (WAV)
        performance: PathBuf,

        /// Lyric segments (JSON)
        #[arg(long)]
        lyrics: Option<PathBuf>,

        /// Per-frame scoring policy
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Print every frame, not just the summary
        #[arg(short, long)]
        verbose: bool,

        /// Write the session summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Sing along with a backing track and get live feedback
    Sing {
        /// Backing track (WAV)
        backing: PathBuf,

        /// Vocal stem to analyze as the reference (WAV)
        #[arg(long, required_unless_present = "reference", conflicts_with = "reference")]
        vocals: Option<PathBuf>,

        /// Pre-analyzed reference track (JSON from `analyze`)
        #[arg(long)]
        reference: Option<PathBuf>,

        /// Lyric segments (JSON)
        #[arg(long)]
        lyrics: Option<PathBuf>,

        /// Per-frame scoring policy
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Stop automatically when the backing track ends
        #[arg(long)]
        stop_at_end: bool,

        /// Write the session summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyArg {
    /// Relative frequency distance (default)
    Percentage,
    /// Distance in semitones against a tolerance
    Semitone,
}

impl From<PolicyArg> for ScoringPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Percentage => ScoringPolicy::PercentageDistance,
            PolicyArg::Semitone => ScoringPolicy::SemitoneTolerance,
        }
    }
}
