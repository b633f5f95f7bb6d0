pub mod vertex;
pub mod builder;

pub use vertex::TerrainVertex;
pub use builder::{generate_terrain_mesh, validate_mesh_params, MeshData};
