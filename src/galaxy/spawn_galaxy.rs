use std::time::{Duration, Instant};

use crate::graphics::{build_point_mesh, GalaxyPointsMaterial};
use crate::prelude::*;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::render::view::NoFrustumCulling;
use rand::prelude::*;
use rand::rngs::StdRng;

use super::{generate_with_rng, DisplayedGalaxy, GalaxyHost};

pub struct SpawnGalaxyPlugin {
    pub seed: Option<u64>,
}

impl Plugin for SpawnGalaxyPlugin {
    fn build(&self, app: &mut App) {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        app.add_event::<CommitGalaxyParams>()
            .insert_resource(GalaxyRng(rng))
            .insert_resource(DisplayedGalaxy::<InstalledGalaxy>::default())
            .init_resource::<GenerationStats>()
            .add_systems(Startup, commit_initial_params)
            .add_systems(Update, regenerate_galaxy);
    }
}

/// Sent when an edit is finalized. Carries the full parameter snapshot.
#[derive(Event, Clone, Copy, Debug)]
pub struct CommitGalaxyParams(pub GalaxyParams);

#[derive(Resource)]
pub struct GalaxyRng(pub StdRng);

#[derive(Resource, Default, Debug)]
pub struct GenerationStats {
    pub points: usize,
    pub elapsed: Duration,
    pub last_error: Option<String>,
}

/// Marks the entity that displays the galaxy.
#[derive(Component)]
pub struct GalaxyPoints;

#[derive(Debug)]
pub struct InstalledGalaxy {
    pub entity: Entity,
    pub mesh: Handle<Mesh>,
    pub material: Handle<GalaxyPointsMaterial>,
}

/// The slice of the world a galaxy lives in.
#[derive(SystemParam)]
pub struct GalaxyScene<'w, 's> {
    commands: Commands<'w, 's>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<GalaxyPointsMaterial>>,
    points: Query<'w, 's, Entity, With<GalaxyPoints>>,
}

impl GalaxyHost for GalaxyScene<'_, '_> {
    type Installed = InstalledGalaxy;

    fn install(&mut self, cloud: GalaxyCloud, style: PointStyle) -> InstalledGalaxy {
        let mesh = self.meshes.add(build_point_mesh(&cloud));
        let material = self.materials.add(GalaxyPointsMaterial::new(style));
        let entity = self
            .commands
            .spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::IDENTITY,
                GalaxyPoints,
                NoFrustumCulling,
            ))
            .id();

        InstalledGalaxy {
            entity,
            mesh,
            material,
        }
    }

    fn check_release(&self, installed: &InstalledGalaxy) -> Result<(), GalaxyError> {
        if !self.meshes.contains(&installed.mesh) {
            return Err(GalaxyError::ResourceRelease("point mesh is already gone".into()));
        }
        if !self.materials.contains(&installed.material) {
            return Err(GalaxyError::ResourceRelease(
                "point material is already gone".into(),
            ));
        }
        if !self.points.contains(installed.entity) {
            return Err(GalaxyError::ResourceRelease(format!(
                "galaxy entity {} is not in the scene",
                installed.entity
            )));
        }
        Ok(())
    }

    fn release_geometry(&mut self, installed: &InstalledGalaxy) -> Result<(), GalaxyError> {
        self.meshes
            .remove(&installed.mesh)
            .map(drop)
            .ok_or_else(|| GalaxyError::ResourceRelease("point mesh is already gone".into()))
    }

    fn release_material(&mut self, installed: &InstalledGalaxy) -> Result<(), GalaxyError> {
        self.materials
            .remove(&installed.material)
            .map(drop)
            .ok_or_else(|| GalaxyError::ResourceRelease("point material is already gone".into()))
    }

    fn detach(&mut self, installed: &InstalledGalaxy) -> Result<(), GalaxyError> {
        if !self.points.contains(installed.entity) {
            return Err(GalaxyError::ResourceRelease(format!(
                "galaxy entity {} is not in the scene",
                installed.entity
            )));
        }
        self.commands.entity(installed.entity).despawn();
        Ok(())
    }
}

fn commit_initial_params(
    config: Res<GalaxyConfigUi>,
    mut commits: EventWriter<CommitGalaxyParams>,
) {
    commits.write(CommitGalaxyParams(config.params));
}

/// Rebuilds the galaxy from the newest commit of the frame, if there is one.
pub fn regenerate_galaxy(
    mut commits: EventReader<CommitGalaxyParams>,
    mut displayed: ResMut<DisplayedGalaxy<InstalledGalaxy>>,
    mut rng: ResMut<GalaxyRng>,
    mut stats: ResMut<GenerationStats>,
    mut scene: GalaxyScene,
) {
    let Some(CommitGalaxyParams(params)) = commits.read().last().copied() else {
        return;
    };

    let start = Instant::now();
    let result = params
        .validate()
        .and_then(|()| generate_with_rng(&params, &mut rng.0))
        .and_then(|cloud| {
            let points = cloud.len();
            displayed
                .replace(&mut scene, cloud, PointStyle::from(&params))
                .map(|_| points)
        });

    match result {
        Ok(points) => {
            stats.points = points;
            stats.elapsed = start.elapsed();
            stats.last_error = None;
            info!(
                "Galaxy generated: {} points in {:.1} ms (generation {})",
                points,
                stats.elapsed.as_secs_f64() * 1000.0,
                displayed.generation()
            );
        }
        Err(err) => {
            error!("Galaxy regeneration aborted: {err}");
            stats.last_error = Some(err.to_string());
        }
    }
}
