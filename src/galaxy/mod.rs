use bevy::prelude::*;

mod error;
mod galaxy_config;
mod generator;
mod lifecycle;
mod spawn_galaxy;

pub use error::{ConfigError, GalaxyError};
pub use galaxy_config::{GalaxyConfigUi, GalaxyParams};
pub use generator::{branch_angle, generate, generate_with_rng, GalaxyCloud};
pub use lifecycle::{DisplayedGalaxy, GalaxyHost, PointStyle};
pub use spawn_galaxy::{
    CommitGalaxyParams, GalaxyPoints, GalaxyRng, GenerationStats, InstalledGalaxy,
    SpawnGalaxyPlugin,
};

/// Holds the working parameters and rebuilds the galaxy on every commit.
pub struct GalaxyPlugin {
    pub params: GalaxyParams,
    pub seed: Option<u64>,
}

impl Plugin for GalaxyPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(GalaxyConfigUi {
            params: self.params,
        })
        .add_plugins(SpawnGalaxyPlugin { seed: self.seed });
    }
}
