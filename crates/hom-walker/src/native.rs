use crate::create_app;
use crate::logging::install_tracing_subscriber;
use crate::settings::{STEP_PAUSE_MS_RANGE, ViewerSettings};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "hom-walker",
    about = "Watch a remote sampler walk homomorphisms from a biclique into a target graph"
)]
pub struct Args {
    /// JSON settings file; missing keys keep their defaults.
    #[arg(long, default_value = "hom-walker.json")]
    pub config: PathBuf,

    /// Base URL of the sampler, overriding the settings file.
    #[arg(long, env = "HOM_WALKER_SERVER_URL")]
    pub server_url: Option<String>,

    /// Pause between steps of a batch run, in milliseconds.
    #[arg(long)]
    pub step_pause_ms: Option<u64>,

    /// Tracing filter, e.g. `debug` or `homomorphism=trace`. Falls back to RUST_LOG.
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Settings file merged with command-line overrides. A broken file is
    /// reported and replaced by the defaults.
    pub fn settings(&self) -> (ViewerSettings, Vec<String>) {
        let mut notices = Vec::new();
        let mut settings = match ViewerSettings::load(&self.config) {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "native.settings.invalid");
                notices.push(format!("{e}. Using default settings."));
                ViewerSettings::default()
            }
        };
        if let Some(url) = &self.server_url {
            settings.sampler.base_url = url.clone();
        }
        if let Some(pause) = self.step_pause_ms {
            settings.run.step_pause_ms =
                STEP_PAUSE_MS_RANGE.clamp(pause as f32) as u64;
        }
        (settings, notices)
    }
}

/// Entry point used by the native executable.
pub fn run() -> eframe::Result<()> {
    let args = Args::parse();
    install_tracing_subscriber(args.log_level.as_deref());
    let (settings, notices) = args.settings();
    info!(
        server = %settings.sampler.base_url,
        step_pause_ms = settings.run.step_pause_ms,
        "native.start"
    );

    eframe::run_native(
        "Homomorphism Walker",
        eframe::NativeOptions::default(),
        Box::new(move |cc| Ok(Box::new(create_app(cc, settings, notices)))),
    )
}
