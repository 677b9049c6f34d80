use crate::prelude::*;
use bevy::{
    pbr::{MaterialPipeline, MaterialPipelineKey},
    prelude::*,
    reflect::TypePath,
    render::{
        mesh::{Indices, MeshVertexBufferLayoutRef, PrimitiveTopology},
        render_asset::RenderAssetUsages,
        render_resource::{
            AsBindGroup, RenderPipelineDescriptor, ShaderRef, SpecializedMeshPipelineError,
        },
    },
};

const SHADER_ASSET_PATH: &str = "shaders/galaxy_points.wgsl";

/// Billboard corners, expanded around each star in the vertex shader.
const CORNERS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

pub struct PointsMaterialPlugin;

impl Plugin for PointsMaterialPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(MaterialPlugin::<GalaxyPointsMaterial>::default());
    }
}

#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct GalaxyPointsMaterial {
    #[uniform(0)]
    pub point_size: f32,
    pub alpha_mode: AlphaMode,
}

impl GalaxyPointsMaterial {
    pub fn new(style: PointStyle) -> Self {
        Self {
            point_size: style.size,
            alpha_mode: AlphaMode::Add,
        }
    }
}

impl Material for GalaxyPointsMaterial {
    fn vertex_shader() -> ShaderRef {
        SHADER_ASSET_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        SHADER_ASSET_PATH.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let vertex_layout = layout.0.get_layout(&[
            Mesh::ATTRIBUTE_POSITION.at_shader_location(0),
            Mesh::ATTRIBUTE_UV_0.at_shader_location(1),
            Mesh::ATTRIBUTE_COLOR.at_shader_location(2),
        ])?;
        descriptor.vertex.buffers = vec![vertex_layout];
        descriptor.primitive.cull_mode = None;
        if let Some(depth_stencil) = descriptor.depth_stencil.as_mut() {
            depth_stencil.depth_write_enabled = false;
        }
        Ok(())
    }
}

/// Turns the flat position and color buffers into one quad per star: 4 vertices
/// sharing the star position, each tagged with its corner and the star color.
pub fn build_point_mesh(cloud: &GalaxyCloud) -> Mesh {
    let vertex_count = cloud.len() * CORNERS.len();
    let mut positions = Vec::with_capacity(vertex_count);
    let mut corners = Vec::with_capacity(vertex_count);
    let mut colors = Vec::with_capacity(vertex_count);

    let stars = cloud
        .flat_positions()
        .chunks_exact(3)
        .zip(cloud.flat_colors().chunks_exact(3));
    for (position, color) in stars {
        for corner in CORNERS {
            positions.push([position[0], position[1], position[2]]);
            corners.push(corner);
            colors.push([color[0], color[1], color[2], 1.0]);
        }
    }

    let indices = (0..cloud.len() as u32)
        .flat_map(|star| QUAD_INDICES.map(|i| star * CORNERS.len() as u32 + i))
        .collect();

    Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::RENDER_WORLD,
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, corners)
    .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
    .with_inserted_indices(Indices::U32(indices))
}
