//! patchdeck - terminal host for patch-described audio devices
//!
//! Run with: cargo run -- <path-to-patch-bundle>

mod app;
mod ui;

use std::path::PathBuf;

use app::HostApp;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let bundle: PathBuf = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    HostApp::new(bundle).run()
}
