use clap::Parser;
use std::path::PathBuf;

use photobooth::backgrounds::BackgroundSet;
use photobooth::camera::{list_devices, CameraCapture, CameraSettings, Facing, Resolution};
use photobooth::cli::{Cli, Commands};
use photobooth::compositor::CompositeImage;
use photobooth::config::Config;
use photobooth::event_loop::{self, BoothCommand};
use photobooth::filters::PhotoFilter;
use photobooth::gallery::DirGallery;
use photobooth::input;
use photobooth::session::{BoothView, Session};
use photobooth::voice::{ChannelSource, VoiceTrigger};

/// Everything the start command needs after config and CLI are merged.
struct BoothOptions {
    settings: CameraSettings,
    countdown: u32,
    backgrounds_dir: PathBuf,
    output_dir: PathBuf,
    voice_enabled: bool,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::ListCameras) => match list_devices() {
            Ok(devices) if devices.is_empty() => println!("No cameras found."),
            Ok(devices) => {
                for device in devices {
                    println!("{}", device);
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Some(Commands::Start {
            facing,
            resolution,
            countdown,
            backgrounds_dir,
            output_dir,
            no_mirror,
            no_voice,
            config,
        }) => {
            let options = match build_options(
                facing,
                resolution,
                countdown,
                backgrounds_dir,
                output_dir,
                no_mirror,
                no_voice,
                config,
            ) {
                Ok(options) => options,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            run_booth(options);
        }
        None => {
            // Bare `photobooth` starts the booth with defaults
            let options = match build_options(
                None, None, None, None, None, false, false, None,
            ) {
                Ok(options) => options,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            run_booth(options);
        }
    }
}

/// Merge CLI flags over the config file into booth options.
#[allow(clippy::too_many_arguments)]
fn build_options(
    facing: Option<Facing>,
    resolution: Option<(u32, u32)>,
    countdown: Option<u32>,
    backgrounds_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    no_mirror: bool,
    no_voice: bool,
    config_path: Option<PathBuf>,
) -> Result<BoothOptions, String> {
    let config = Config::load(config_path.as_deref()).map_err(|e| e.to_string())?;

    let facing = facing
        .or_else(|| config.camera.facing.as_deref().and_then(Facing::from_str))
        .unwrap_or_default();

    let resolution = match resolution {
        Some((width, height)) => Resolution { width, height },
        None => match (config.camera.width, config.camera.height) {
            (Some(width), Some(height)) => Resolution { width, height },
            _ => Resolution::default(),
        },
    };

    let settings = CameraSettings {
        facing,
        resolution,
        fps: 30,
        mirror: !no_mirror && config.camera.mirror,
    };

    Ok(BoothOptions {
        settings,
        countdown: countdown.unwrap_or(config.booth.countdown_seconds),
        backgrounds_dir: backgrounds_dir
            .or(config.backgrounds.dir)
            .unwrap_or_else(|| PathBuf::from("backgrounds")),
        output_dir: output_dir
            .or(config.gallery.dir)
            .unwrap_or_else(|| PathBuf::from("photos")),
        voice_enabled: !no_voice && config.voice.enabled,
    })
}

fn run_booth(options: BoothOptions) {
    let session = Session::with_countdown(options.countdown);
    let backgrounds = BackgroundSet::new(&options.backgrounds_dir);
    let mut gallery = DirGallery::new(&options.output_dir);
    let mut view = ConsoleView;

    // Initial acquisition; failure leaves the booth running with capture
    // disabled until a camera switch succeeds
    let camera = match acquire_camera(options.settings.clone()) {
        Ok(camera) => Some(camera),
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Capture is disabled. Type 'switch' to retry with the other camera.");
            None
        }
    };

    let (command_tx, command_rx) = tokio::sync::mpsc::unbounded_channel();
    let (voice_tx, voice_rx) = tokio::sync::mpsc::unbounded_channel();
    let (say_tx, say_rx) = std::sync::mpsc::channel();

    let _voice_trigger = options
        .voice_enabled
        .then(|| VoiceTrigger::start(ChannelSource::new(say_rx), voice_tx));

    input::spawn_listener(command_tx.clone(), say_tx);

    let ctrlc_tx = command_tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nReceived Ctrl+C, shutting down...");
        let _ = ctrlc_tx.send(BoothCommand::Quit);
    }) {
        log::warn!("could not install Ctrl+C handler: {}", e);
    }

    eprintln!(
        "Photo booth ready. Photos go to {:?}. Type 'snap' (or say \"cheese\") to start.",
        options.output_dir
    );

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let _session = rt.block_on(event_loop::run(
        session,
        camera,
        options.settings,
        backgrounds,
        &mut gallery,
        &mut view,
        command_rx,
        voice_rx,
    ));

    eprintln!("Booth closed.");
}

/// Acquire and start the camera, turning errors into user-facing text.
fn acquire_camera(settings: CameraSettings) -> Result<CameraCapture, String> {
    let mut camera =
        CameraCapture::acquire(settings).map_err(|e| format!("Camera unavailable: {}", e))?;
    camera
        .start()
        .map_err(|e| format!("Camera unavailable: {}", e))?;

    if let Some(res) = camera.granted_resolution() {
        eprintln!(
            "Using {} camera at {}x{}",
            camera.facing(),
            res.width,
            res.height
        );
    }
    Ok(camera)
}

/// Presenter that narrates the booth on the terminal.
struct ConsoleView;

impl BoothView for ConsoleView {
    fn countdown(&mut self, remaining: u32) {
        eprintln!("  {}...", remaining);
    }

    fn show_ready(&mut self) {
        eprintln!("  Smile!");
    }

    fn review(&mut self, composite: &CompositeImage, filter: PhotoFilter) {
        if filter.is_active() {
            eprintln!(
                "Photo ready ({}x{}, {} filter). 'save' to keep it, 'retake' to discard.",
                composite.width, composite.height, filter
            );
        } else {
            eprintln!(
                "Photo ready ({}x{}). 'save' to keep it, 'retake' to discard.",
                composite.width, composite.height
            );
        }
    }

    fn live(&mut self) {
        eprintln!("Live view. Type 'snap' when ready.");
    }

    fn photo_saved(&mut self, filename: &str) {
        eprintln!("Saved {}", filename);
    }

    fn notice(&mut self, message: &str) {
        eprintln!("! {}", message);
    }
}
