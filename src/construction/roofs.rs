//! Roof and attic-ceiling assembly builders.

use serde::{Deserialize, Serialize};

use crate::construction::assembly::{gap_factor, AssemblyBuilder};
use crate::construction::material::{BaseMaterial, ExteriorFinish, Films, OpaqueMaterial};
use crate::construction::model::{ConstructionId, Model, SurfaceId};
use crate::construction::walls::{
    cavity_material, check_fraction, check_grade, check_positive, stud_paths,
};
use crate::error::ConstructionError;

fn default_grade() -> u8 {
    1
}

fn default_true() -> bool {
    true
}

fn default_drywall() -> f64 {
    0.5
}

/// Layers above the rafters shared by both roof types.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoofDeck {
    #[serde(default)]
    pub osb_thick_in: f64,
    #[serde(default)]
    pub rigid_r: f64,
    #[serde(default)]
    pub roofing: Option<ExteriorFinish>,
    #[serde(default)]
    pub radiant_barrier: bool,
}

impl RoofDeck {
    /// Outside film, roofing, rigid insulation, deck and radiant barrier.
    fn exterior_side(&self, builder: AssemblyBuilder, films: &Films) -> AssemblyBuilder {
        let rigid = (self.rigid_r > 0.0)
            .then(|| OpaqueMaterial::rigid_insulation("RoofRigidIns", self.rigid_r));
        let deck = (self.osb_thick_in > 0.0)
            .then(|| OpaqueMaterial::osb("RoofSheathing", self.osb_thick_in));
        builder
            .layer(films.outside.clone())
            .optional_layer(self.roofing.as_ref().map(ExteriorFinish::to_material))
            .optional_layer(rigid)
            .optional_layer(deck)
            .optional_layer(self.radiant_barrier.then(OpaqueMaterial::radiant_barrier))
    }
}

/// Roof over an unconditioned attic; rafters are open to the attic below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpenCavityRoof {
    pub cavity_r: f64,
    #[serde(default = "default_grade")]
    pub install_grade: u8,
    /// Thickness of the insulation between rafters.
    #[serde(default)]
    pub cavity_ins_thick_in: f64,
    pub framing_factor: f64,
    pub framing_thick_in: f64,
    #[serde(flatten)]
    pub deck: RoofDeck,
}

/// Open-cavity roof. The parallel layer is as thick as the deeper of the
/// insulation and the rafters; the thinner one has its conductivity scaled
/// so that it keeps its own R-value at the common thickness.
pub fn apply_open_cavity_roof(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    roof: &OpenCavityRoof,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "open cavity roof";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_grade(ARCHETYPE, roof.install_grade)?;
    check_fraction(ARCHETYPE, "framing factor", roof.framing_factor)?;
    check_positive(ARCHETYPE, "framing thickness", roof.framing_thick_in)?;
    if roof.cavity_r > 0.0 {
        check_positive(ARCHETYPE, "cavity insulation thickness", roof.cavity_ins_thick_in)?;
    }

    let thick_in = roof.cavity_ins_thick_in.max(roof.framing_thick_in);
    let wood = BaseMaterial::wood();
    let framing_r = roof.framing_thick_in / wood.k_in;
    let framing = OpaqueMaterial::from_base_with_r("RoofFraming", thick_in, wood, framing_r);
    let cavity = if roof.cavity_r > 0.0 {
        OpaqueMaterial::from_base_with_r(
            "RoofIns",
            thick_in,
            BaseMaterial::insulation_loosefill(),
            roof.cavity_r,
        )
    } else {
        OpaqueMaterial::air_cavity_open(thick_in)
    };
    let gap = OpaqueMaterial::air_cavity_open(thick_in);

    let builder = AssemblyBuilder::new(
        name,
        stud_paths(roof.framing_factor, roof.install_grade, roof.cavity_r),
    );
    let assembly = roof
        .deck
        .exterior_side(builder, films)
        .parallel_layer("RoofStudAndCavity", vec![framing, cavity, gap])
        .layer(films.inside.clone())
        .build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}

/// Roof enclosing a conditioned space (cathedral or vaulted ceiling).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClosedCavityRoof {
    pub cavity_r: f64,
    #[serde(default = "default_grade")]
    pub install_grade: u8,
    pub cavity_depth_in: f64,
    #[serde(default = "default_true")]
    pub cavity_filled: bool,
    pub framing_factor: f64,
    #[serde(default = "default_drywall")]
    pub drywall_thick_in: f64,
    #[serde(flatten)]
    pub deck: RoofDeck,
}

/// Closed-cavity roof with drywall on the underside of the rafters.
pub fn apply_closed_cavity_roof(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    roof: &ClosedCavityRoof,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "closed cavity roof";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_grade(ARCHETYPE, roof.install_grade)?;
    check_fraction(ARCHETYPE, "framing factor", roof.framing_factor)?;
    check_positive(ARCHETYPE, "cavity depth", roof.cavity_depth_in)?;

    let depth = roof.cavity_depth_in;
    let framing = OpaqueMaterial::from_base("RoofFraming", depth, BaseMaterial::wood());
    let cavity = cavity_material("RoofIns", depth, roof.cavity_r, roof.cavity_filled);
    let gap = OpaqueMaterial::air_cavity_closed(depth);
    let drywall = (roof.drywall_thick_in > 0.0)
        .then(|| OpaqueMaterial::gypsum_ceiling(roof.drywall_thick_in));

    let builder = AssemblyBuilder::new(
        name,
        stud_paths(roof.framing_factor, roof.install_grade, roof.cavity_r),
    );
    let assembly = roof
        .deck
        .exterior_side(builder, films)
        .parallel_layer("RoofStudAndCavity", vec![framing, cavity, gap])
        .optional_layer(drywall)
        .layer(films.inside.clone())
        .build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}

/// Attic floor / ceiling of the living space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ceiling {
    /// Total insulation R-value, between and above the joists.
    pub cavity_r: f64,
    #[serde(default = "default_grade")]
    pub install_grade: u8,
    /// Total insulation depth.
    #[serde(default)]
    pub ins_thick_in: f64,
    pub framing_factor: f64,
    pub joist_height_in: f64,
    #[serde(default = "default_drywall")]
    pub drywall_thick_in: f64,
}

/// Ceiling below an attic. Insulation deeper than the joists becomes a
/// homogeneous layer above the framing, covering every path.
pub fn apply_ceiling(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    ceiling: &Ceiling,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "ceiling";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_grade(ARCHETYPE, ceiling.install_grade)?;
    check_fraction(ARCHETYPE, "framing factor", ceiling.framing_factor)?;
    check_positive(ARCHETYPE, "joist height", ceiling.joist_height_in)?;
    if ceiling.cavity_r > 0.0 {
        check_positive(ARCHETYPE, "insulation thickness", ceiling.ins_thick_in)?;
    }

    let joist = ceiling.joist_height_in;
    let loosefill = BaseMaterial::insulation_loosefill();
    let (cavity, above) = if ceiling.cavity_r <= 0.0 {
        (OpaqueMaterial::air_cavity_open(joist), None)
    } else if ceiling.ins_thick_in > joist {
        let r_in_joists = ceiling.cavity_r * joist / ceiling.ins_thick_in;
        let extra_thick = ceiling.ins_thick_in - joist;
        let extra = OpaqueMaterial::from_base_with_r(
            "CeilingInsAbove",
            extra_thick,
            loosefill,
            ceiling.cavity_r - r_in_joists,
        );
        (
            OpaqueMaterial::from_base_with_r("CeilingIns", joist, loosefill, r_in_joists),
            Some(extra),
        )
    } else {
        (
            OpaqueMaterial::from_base_with_r("CeilingIns", joist, loosefill, ceiling.cavity_r),
            None,
        )
    };
    let framing = OpaqueMaterial::from_base("CeilingJoist", joist, BaseMaterial::wood());
    let gap = OpaqueMaterial::air_cavity_open(joist);
    let drywall = (ceiling.drywall_thick_in > 0.0)
        .then(|| OpaqueMaterial::gypsum_ceiling(ceiling.drywall_thick_in));

    let assembly = AssemblyBuilder::new(
        name,
        stud_paths(ceiling.framing_factor, ceiling.install_grade, ceiling.cavity_r),
    )
    .layer(films.outside.clone())
    .optional_layer(above)
    .parallel_layer("CeilingStudAndCavity", vec![framing, cavity, gap])
    .optional_layer(drywall)
    .layer(films.inside.clone())
    .build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}

/// Gap fraction a ceiling of these inputs would use.
pub fn ceiling_gap_fraction(ceiling: &Ceiling) -> f64 {
    gap_factor(ceiling.install_grade, ceiling.framing_factor, ceiling.cavity_r)
}
