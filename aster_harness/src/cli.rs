use std::path::PathBuf;

use clap::Parser;

/// Frame driver that exercises the runtime against scripted host stubs.
#[derive(Parser, Debug)]
#[command(
    about = "Drives the aster runtime through a scripted demo scene",
    version
)]
pub struct Args {
    /// Number of frames to advance after the launch sequence
    #[arg(long, default_value_t = 120)]
    pub frames: u64,

    /// Path to write the run journal as JSON
    #[arg(long)]
    pub event_log_json: Option<PathBuf>,

    /// Path to write the run summary (runtime + host call counts) as JSON
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Grow the stub viewport starting at this frame to exercise
    /// resolution-change handling
    #[arg(long)]
    pub resize_at: Option<u64>,

    /// Frames on which the stub renderer refuses to begin a frame,
    /// comma separated
    #[arg(long, value_delimiter = ',')]
    pub reject_frames: Vec<u64>,

    /// Dispatch an external message with this topic halfway through the run
    #[arg(long)]
    pub message_topic: Option<String>,

    /// Dispatch an asset-updated notification for this path three quarters
    /// of the way through the run
    #[arg(long)]
    pub asset_updated: Option<String>,

    /// Draw the physics debug overlay on every rendered frame
    #[arg(long)]
    pub debug_physics: bool,

    /// Print per-frame diagnostics to stderr
    #[arg(long)]
    pub verbose: bool,
}
