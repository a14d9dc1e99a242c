// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! - Scanning a sequence of image files as camera frames
//! - Dumping the thresholded channel images of a frame

use std::path::{Path, PathBuf};
use std::time::Duration;
use trichrome::backends::camera::{FrameLease, SensorRotation, load_image_as_frame};
use trichrome::frame_processor::{ChannelSeparator, PassController, QrDecoder};
use trichrome::{AppError, AppResult, PassOutcome, ScanEvent, ScannerConfig};
use tracing::{debug, info};

/// Load the config file if one was given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> AppResult<ScannerConfig> {
    match path {
        Some(path) => ScannerConfig::load(path),
        None => Ok(ScannerConfig::default()),
    }
}

/// Feed images as frames until all three channels decode
pub fn scan(
    config: &ScannerConfig,
    images: &[PathBuf],
    repeat: usize,
    interval_ms: u64,
    rotation: i32,
) -> Result<(), Box<dyn std::error::Error>> {
    let rotation = SensorRotation::from_degrees_int(rotation);
    let runtime = tokio::runtime::Runtime::new()?;
    let payload = runtime.block_on(scan_frames(config, images, repeat, interval_ms, rotation))?;

    match payload {
        Some(payload) => {
            println!("{}", payload);
            Ok(())
        }
        None => Err(format!(
            "No payload decoded after {} pass(es) over {} image(s)",
            repeat,
            images.len()
        )
        .into()),
    }
}

async fn scan_frames(
    config: &ScannerConfig,
    images: &[PathBuf],
    repeat: usize,
    interval_ms: u64,
    rotation: SensorRotation,
) -> AppResult<Option<String>> {
    let decoder = QrDecoder::from_config(config)?;
    let (controller, mut events) = PassController::new(decoder, config);
    let interval = Duration::from_millis(interval_ms);

    for round in 0..repeat {
        for path in images {
            let frame = load_image_as_frame(path)?.with_rotation(rotation);
            let source = path.display().to_string();
            let lease = FrameLease::new(frame, move |_| debug!(source = %source, "Frame released"));

            let outcome = controller.run_pass(lease).await;
            while let Ok(event) = events.try_recv() {
                report(&event);
            }

            match outcome {
                PassOutcome::Completed {
                    output: Some(payload),
                    ..
                } => {
                    info!(round, path = %path.display(), "Payload decoded");
                    return Ok(Some(payload));
                }
                PassOutcome::Completed { .. } => {
                    let filled = controller.filled();
                    info!(round, path = %path.display(), ?filled, "Pass finished without payload");
                }
                PassOutcome::Throttled => {
                    debug!(round, path = %path.display(), "Frame skipped by throttle");
                }
            }

            tokio::time::sleep(interval).await;
        }
    }

    Ok(None)
}

fn report(event: &ScanEvent) {
    match event {
        ScanEvent::Failed {
            channel: Some(channel),
            error,
        } => eprintln!("{} channel: {}", channel, error),
        ScanEvent::Failed {
            channel: None,
            error,
        } => eprintln!("{}", error),
        ScanEvent::Decoded(_) | ScanEvent::PassCompleted { .. } => {}
    }
}

/// Write `<stem>_<channel>.png` for each channel of an image
pub fn separate(
    config: &ScannerConfig,
    image: &Path,
    output_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = load_image_as_frame(image)?;
    let separator = ChannelSeparator::from_config(config);
    let region = separator.region_for(frame.width, frame.height);
    println!(
        "Region of interest: {}x{} at ({}, {})",
        region.edge, region.edge, region.x, region.y
    );

    let output_dir = output_dir.unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(output_dir).map_err(AppError::from)?;

    let stem = image
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frame");

    for channel_image in separator.separate(&frame, [false; 3]).into_iter().flatten() {
        let path = output_dir.join(format!("{}_{}.png", stem, channel_image.channel));
        channel_image.pixels.save(&path)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
