//! Framed floor builder (floors over crawlspaces, garages and outdoors).

use serde::{Deserialize, Serialize};

use crate::construction::assembly::AssemblyBuilder;
use crate::construction::material::{BaseMaterial, Films, OpaqueMaterial};
use crate::construction::model::{ConstructionId, Model, SurfaceId};
use crate::construction::walls::{check_fraction, check_grade, check_positive, stud_paths};
use crate::error::ConstructionError;

fn default_grade() -> u8 {
    1
}

fn default_subfloor() -> f64 {
    0.75
}

/// Carpet, tile or other finish flooring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorCovering {
    pub thick_in: f64,
    pub r_value: f64,
}

impl FloorCovering {
    /// Covering as an opaque layer with the given R-value.
    pub fn to_material(&self) -> OpaqueMaterial {
        OpaqueMaterial::floor_covering(self.thick_in, self.r_value)
    }
}

/// Joisted floor over an unconditioned space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Floor {
    pub cavity_r: f64,
    #[serde(default = "default_grade")]
    pub install_grade: u8,
    pub joist_height_in: f64,
    pub framing_factor: f64,
    #[serde(default = "default_subfloor")]
    pub plywood_thick_in: f64,
    /// Continuous insulation on the underside of the joists.
    #[serde(default)]
    pub rigid_r: f64,
    /// Ceiling finish of the space below, if any.
    #[serde(default)]
    pub drywall_thick_in: f64,
    #[serde(default)]
    pub covering: Option<FloorCovering>,
}

/// Floor with the joist cavity open below and subfloor plus covering above.
pub fn apply_floor(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    floor: &Floor,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "floor";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_grade(ARCHETYPE, floor.install_grade)?;
    check_fraction(ARCHETYPE, "framing factor", floor.framing_factor)?;
    check_positive(ARCHETYPE, "joist height", floor.joist_height_in)?;

    let joist = floor.joist_height_in;
    let framing = OpaqueMaterial::from_base("FloorJoist", joist, BaseMaterial::wood());
    let cavity = if floor.cavity_r > 0.0 {
        OpaqueMaterial::from_base_with_r(
            "FloorIns",
            joist,
            BaseMaterial::insulation_densepack(),
            floor.cavity_r,
        )
    } else {
        OpaqueMaterial::air_cavity_open(joist)
    };
    let gap = OpaqueMaterial::air_cavity_open(joist);

    let drywall = (floor.drywall_thick_in > 0.0)
        .then(|| OpaqueMaterial::gypsum_ceiling(floor.drywall_thick_in));
    let rigid = (floor.rigid_r > 0.0)
        .then(|| OpaqueMaterial::rigid_insulation("FloorRigidIns", floor.rigid_r));
    let subfloor = (floor.plywood_thick_in > 0.0)
        .then(|| OpaqueMaterial::plywood(floor.plywood_thick_in));

    let assembly = AssemblyBuilder::new(
        name,
        stud_paths(floor.framing_factor, floor.install_grade, floor.cavity_r),
    )
    .layer(films.outside.clone())
    .optional_layer(drywall)
    .optional_layer(rigid)
    .parallel_layer("FloorStudAndCavity", vec![framing, cavity, gap])
    .optional_layer(subfloor)
    .optional_layer(floor.covering.as_ref().map(FloorCovering::to_material))
    .layer(films.inside.clone())
    .build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}
