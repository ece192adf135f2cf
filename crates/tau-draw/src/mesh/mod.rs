//! Unit-space primitive meshes used by the shape push operations.

mod unit;

pub use unit::{MeshVertex, TriMesh, UnitMeshConfig, UnitMeshes, WireMesh};
