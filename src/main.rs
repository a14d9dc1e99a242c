// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "trichrome")]
#[command(about = "Decode payloads split across the color channels of an image")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// JSON scanner config (thresholds, throttle window, formats)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed images as frames until the payload decodes
    Scan {
        /// Image files, fed in order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// How many times to cycle through the images
        #[arg(short, long, default_value = "3")]
        repeat: usize,

        /// Delay between frames in milliseconds
        #[arg(short, long, default_value = "100")]
        interval_ms: u64,

        /// Clockwise sensor rotation of the images in degrees
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        rotation: i32,
    },

    /// Write the three thresholded channel images of a frame as PNGs
    Separate {
        /// Source image
        image: PathBuf,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=trichrome=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            images,
            repeat,
            interval_ms,
            rotation,
        } => cli::scan(&config, &images, repeat, interval_ms, rotation),
        Commands::Separate { image, output_dir } => {
            cli::separate(&config, &image, output_dir.as_deref())
        }
    }
}
