//! Error types for assembly validation and construction building.
//!
//! Every error here is fatal for the assembly being built: nothing is
//! registered or assigned once one of these is returned. The only advisory
//! condition is [`PropertyBoundWarning`], which is logged and collected while
//! the build continues.

use std::fmt;

use thiserror::Error;

/// Failure building a single construction.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ConstructionError {
    /// Path fractions are not a valid partition of the cross-section.
    #[error("invalid path fractions: {0}")]
    PathFraction(#[from] PathFractionError),

    /// A layer has the wrong shape for the path set.
    #[error("invalid layer composition: {0}")]
    LayerComposition(#[from] LayerCompositionError),

    /// Glazing and opaque materials are combined illegally.
    #[error("invalid material kinds: {0}")]
    MaterialKind(#[from] MaterialKindError),

    /// Archetype-specific inputs describe an impossible assembly.
    #[error("invalid {archetype} input: {reason}")]
    BuilderInput {
        /// Builder that rejected the input.
        archetype: &'static str,
        /// Human readable reason.
        reason: String,
    },

    /// A target surface handle does not exist in the model.
    #[error("unknown surface id {0}")]
    UnknownSurface(usize),

    /// A construction handle does not exist in the model.
    #[error("unknown construction id {0}")]
    UnknownConstruction(usize),
}

impl ConstructionError {
    pub(crate) fn builder(archetype: &'static str, reason: impl Into<String>) -> Self {
        ConstructionError::BuilderInput {
            archetype,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathFractionError {
    #[error("no paths defined")]
    Empty,

    #[error("fractions sum to {sum}, expected 1 (±0.001)")]
    BadSum { sum: f64 },

    #[error("fraction {index} is negative ({value})")]
    Negative { index: usize, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayerCompositionError {
    #[error("assembly has no layers")]
    NoLayers,

    #[error("layer {layer} has {count} materials, expected 1 or {paths}")]
    MaterialCount {
        layer: usize,
        count: usize,
        paths: usize,
    },

    #[error("materials in layer {layer} have different thicknesses ({first} in vs {other} in)")]
    ThicknessMismatch { layer: usize, first: f64, other: f64 },

    #[error("layer {layer} is parallel but contains a material without thickness")]
    ParallelNotOpaque { layer: usize },

    #[error("non-contiguous parallel layers (layer {layer})")]
    NonContiguousParallel { layer: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaterialKindError {
    #[error("cannot mix glazing materials with other materials")]
    MixedGlazing,

    #[error("layer {layer} has more than one glazing material")]
    MultipleGlazingInLayer { layer: usize },

    #[error("glazing assemblies must have a single path, found {paths}")]
    GlazingPaths { paths: usize },
}

/// A physical property exceeded the range the simulation engine accepts and
/// was clipped.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PropertyBoundWarning {
    /// Name of the material the value belongs to.
    pub material: String,
    /// Property name, e.g. "U-factor".
    pub property: &'static str,
    /// Requested value (SI).
    pub value: f64,
    /// Value actually used (SI).
    pub bound: f64,
}

impl fmt::Display for PropertyBoundWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} of {:.3} exceeds the maximum; clipped to {:.3}",
            self.material, self.property, self.value, self.bound
        )
    }
}
