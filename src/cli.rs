//! Command-line interface definitions and helpers.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::camera::Facing;

/// Parse and validate resolution (WIDTHxHEIGHT format)
pub fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid resolution format '{}'. Use WIDTHxHEIGHT (e.g., 640x480)",
            s
        ));
    }
    let width: u32 = parts[0]
        .parse()
        .map_err(|_| format!("Invalid width '{}' in resolution", parts[0]))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|_| format!("Invalid height '{}' in resolution", parts[1]))?;
    if width == 0 || height == 0 {
        return Err("Resolution width and height must be greater than 0".to_string());
    }
    if width > 7680 || height > 4320 {
        return Err("Resolution exceeds maximum supported (7680x4320)".to_string());
    }
    Ok((width, height))
}

/// Parse and validate countdown length (1-10 seconds)
pub fn parse_countdown(s: &str) -> Result<u32, String> {
    let seconds: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number of seconds", s))?;
    if !(1..=10).contains(&seconds) {
        return Err(format!(
            "Countdown must be between 1 and 10 seconds, got {}",
            seconds
        ));
    }
    Ok(seconds)
}

/// Parse camera facing mode
pub fn parse_facing(s: &str) -> Result<Facing, String> {
    Facing::from_str(s)
        .ok_or_else(|| format!("Unknown facing '{}'. Use 'front' or 'back'", s))
}

/// photobooth: countdown camera booth with backgrounds and filters
#[derive(Parser)]
#[command(name = "photobooth")]
#[command(version, about = "Countdown camera booth with backgrounds and filters")]
#[command(long_about = "Take photos with a countdown, composite them over scenery \
    backgrounds, preview them with color filters, and collect them in a gallery \
    directory. Capture can be triggered manually or by voice phrases.")]
#[command(after_help = "EXAMPLES:
    # Start the booth with defaults (front camera, 3 second countdown)
    photobooth start

    # Back camera, 5 second countdown, photos into ./party
    photobooth start --facing back --countdown 5 --output-dir party

    # Use your own scenery images
    photobooth start --backgrounds-dir ~/Pictures/scenery

    # List connected cameras
    photobooth list-cameras

CONTROLS (while running):
    snap             Start the countdown (also: voice \"cheese\", \"snap\")
    save             Keep the reviewed photo
    retake           Discard the reviewed photo
    filter <name>    none | grayscale | sepia | invert
    bg <name>        none | beach | cityscape | forest | party | space
    switch           Toggle front/back camera
    say <text>       Feed a phrase to the voice trigger
    quit             Leave the booth")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available camera devices
    ListCameras,

    /// Start the booth
    Start {
        /// Camera to start with: front or back
        #[arg(long, short = 'f', value_parser = parse_facing)]
        facing: Option<Facing>,

        /// Requested capture resolution (WIDTHxHEIGHT, e.g., 640x480).
        /// The camera may grant a different one; output follows the grant.
        #[arg(long, short = 'r', value_parser = parse_resolution)]
        resolution: Option<(u32, u32)>,

        /// Countdown length in seconds (1-10)
        #[arg(long, short = 'n', value_parser = parse_countdown)]
        countdown: Option<u32>,

        /// Directory with background images (beach.jpg, space.jpg, ...)
        #[arg(long, short = 'b')]
        backgrounds_dir: Option<PathBuf>,

        /// Directory saved photos are written to
        #[arg(long, short = 'O')]
        output_dir: Option<PathBuf>,

        /// Do not mirror the front camera
        #[arg(long)]
        no_mirror: bool,

        /// Disable the voice capture trigger
        #[arg(long)]
        no_voice: bool,

        /// Custom config file path (default: ~/.config/photobooth/config.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}
