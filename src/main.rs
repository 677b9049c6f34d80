use std::path::PathBuf;

use bevy::prelude::*;
use bevy::window::{PresentMode, WindowTheme};
use bevy_egui::EguiPlugin;
use clap::Parser;

mod galaxy;
mod graphics;
mod ui;

mod prelude;

use galaxy::{ConfigError, GalaxyParams};

#[derive(Parser, Debug)]
#[command(name = "galaxy_generator", about = "Procedural spiral galaxy point cloud")]
struct Cli {
    /// TOML file with galaxy parameters; missing fields use the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for reproducible galaxies
    #[arg(long)]
    seed: Option<u64>,

    /// Override the number of stars
    #[arg(long)]
    count: Option<u32>,
}

impl Cli {
    fn params(&self) -> Result<GalaxyParams, ConfigError> {
        let mut params = match &self.config {
            Some(path) => GalaxyParams::load(path)?,
            None => GalaxyParams::default(),
        };
        if let Some(count) = self.count {
            params.count = count;
        }
        params.validate()?;
        Ok(params)
    }
}

fn main() -> Result<(), ConfigError> {
    let cli = Cli::parse();
    let params = cli.params()?;

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Galaxy Generator".into(),
                name: Some("bevy.app".into()),
                present_mode: PresentMode::AutoVsync,
                fit_canvas_to_parent: true,
                prevent_default_event_handling: false,
                window_theme: Some(WindowTheme::Dark),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin {
            enable_multipass_for_primary_context: false,
        })
        .add_plugins((
            galaxy::GalaxyPlugin {
                params,
                seed: cli.seed,
            },
            graphics::GraphicsPlugin,
            ui::UiPlugin,
        ))
        .run();

    Ok(())
}
