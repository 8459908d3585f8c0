//! Layered envelope constructions.
//!
//! [`assembly`] holds the parallel-path calculator every builder feeds;
//! the archetype builders live in [`walls`], [`roofs`], [`floors`],
//! [`foundation`], [`fenestration`] and [`internal_mass`].

pub mod assembly;
pub mod fenestration;
pub mod floors;
pub mod foundation;
pub mod ground;
pub mod internal_mass;
pub mod material;
pub mod model;
pub mod registry;
pub mod roofs;
pub mod walls;

pub use assembly::{gap_factor, Assembly, AssemblyBuilder, Layer, PathSet};
pub use material::{
    BaseMaterial, ExteriorFinish, Films, GlazingMaterial, Material, OpaqueMaterial, SimpleMaterial,
};
pub use model::{ConstructionId, Model, ModelSummary, SurfaceId, SurfaceKind};
pub use registry::{MaterialId, MaterialRegistry, ModelMaterial};
