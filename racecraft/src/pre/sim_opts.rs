use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "racecraft",
    about = "A real-time interactive race simulator written in Rust"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug printing
    #[clap(short, long)]
    pub debug: bool,

    /// Run as fast as possible instead of real-time (prints the final classification only)
    #[clap(long)]
    pub headless: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set path to the session parameter file (OPTIONAL: if not set, uses the built-in demo grid)
    #[clap(short, long)]
    pub parfile_path: Option<PathBuf>,

    /// Set real-time factor (only relevant in real-time mode)
    #[clap(short, long, default_value = "1.0")]
    pub realtime_factor: f64,

    /// Set number of physics ticks applied per rendered frame, must be >= 1
    #[clap(short, long, default_value = "1")]
    pub speed_multiplier: u32,

    /// Override the lap count of the selected circuit
    #[clap(short, long)]
    pub laps: Option<u32>,
}
