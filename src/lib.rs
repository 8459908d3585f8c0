//! Envelope constructions for residential building energy models.
//!
//! Builders turn archetype inputs (stud walls, roofs, slabs, windows, ...)
//! into layered constructions. Layers with parallel heat-flow paths are
//! collapsed into single equivalent materials that preserve the assembly's
//! overall R-value, deduplicated against the model's material registry and
//! assigned to surfaces.

pub mod construction;
pub mod error;
pub mod input;
pub mod schedule;
pub mod units;

pub use construction::{Assembly, AssemblyBuilder, Model, ModelSummary};
pub use error::{ConstructionError, PropertyBoundWarning};
pub use input::BuildingInput;
