//! Host application: audio output setup, bootstrap, and handoff to the UI.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info, warn};

use patchdeck::bootstrap::{
    Bootstrapper, FailureReport, OutputStage, ResumeLatch, StatusReporter,
};
use patchdeck::device::AudioConfig;
use patchdeck::patch::DirSource;
use patchdeck::MAX_BLOCK_SIZE;

use super::ui::UiApp;

/// Reporter that forwards bootstrap status to the log.
struct LogReporter;

impl StatusReporter for LogReporter {
    fn failed(&mut self, report: FailureReport) {
        match report.header {
            Some(header) => error!("{header}: {}", report.error),
            None => error!("{}", report.error),
        }
        if let Some(description) = report.description {
            error!("{description}");
        }
    }

    fn ready(&mut self) {
        info!("bootstrap complete, device is live");
    }
}

pub struct HostApp {
    bundle: PathBuf,
}

impl HostApp {
    pub fn new(bundle: PathBuf) -> Self {
        Self { bundle }
    }

    /// Run the host (takes over the terminal, plays audio).
    pub fn run(self) -> EyreResult<()> {
        // Set up audio
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        info!("audio output: {sample_rate} Hz, {channels} channels");

        let output = Arc::new(Mutex::new(OutputStage::new()));

        // Stream callback pulls mono blocks from the output stage and fans
        // them out to every channel.
        let stage = Arc::clone(&output);
        let mut mono = vec![0.0f32; MAX_BLOCK_SIZE];
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    let mut stage = stage.lock().unwrap();
                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;

                    while frames_written < total_frames {
                        let n = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                        let block = &mut mono[..n];
                        stage.render(block);

                        for (i, &sample) in block.iter().enumerate() {
                            let off = (frames_written + i) * channels;
                            for ch in 0..channels {
                                data[off + ch] = sample;
                            }
                        }
                        frames_written += n;
                    }
                },
                |err| eprintln!("audio stream error: {err}"),
                None,
            )
            .wrap_err("failed to build output stream")?;

        // Bootstrap the device into the output stage
        let source = DirSource::new(&self.bundle);
        let rig = {
            let mut stage = output.lock().unwrap();
            Bootstrapper::new(&source)
                .with_reporter(Box::new(LogReporter))
                .run(&AudioConfig { sample_rate }, &mut stage)?
        };

        // The stream stays paused until the first user interaction
        let resume = ResumeLatch::new(move || {
            if let Err(err) = stream.play() {
                warn!("could not start audio output: {err}");
            }
        });

        // Hand the live rig to the control surface
        let mut terminal = ratatui::init();
        let result = UiApp::new(rig, resume).run(&mut terminal);
        ratatui::restore();
        result
    }
}
