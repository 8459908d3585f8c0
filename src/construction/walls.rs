//! Wall and rim-joist assembly builders.
//!
//! Every builder composes the stack outside to inside:
//!
//! 1. outside air film
//! 2. exterior finish (optional)
//! 3. continuous rigid insulation (optional)
//! 4. structural sheathing (optional)
//! 5. the structural layer(s), usually parallel framing / cavity / gap paths
//! 6. drywall (when thickness > 0)
//! 7. inside air film
//!
//! and then hands the finished [`Assembly`](super::assembly::Assembly) to the
//! calculator for validation, materialization and assignment.

use serde::{Deserialize, Serialize};

use crate::construction::assembly::{gap_factor, AssemblyBuilder};
use crate::construction::material::{
    BaseMaterial, ExteriorFinish, Films, OpaqueMaterial, AIR_GAP_R_VALUE,
};
use crate::construction::model::{ConstructionId, Model, SurfaceId};
use crate::error::ConstructionError;

/// Rim joist nominal thickness (in).
pub const RIM_JOIST_THICK_IN: f64 = 1.5;
/// Sill plate nominal depth (in).
pub const SILL_PLATE_THICK_IN: f64 = 3.5;
/// Width of one stud (in).
const STUD_WIDTH_IN: f64 = 1.5;
/// SIP spline thickness on each face (in).
const SIP_SPLINE_THICK_IN: f64 = 0.5;
/// One 4 in spline per 48 in panel.
pub const SIP_SPLINE_FRACTION: f64 = 4.0 / 48.0;

fn default_drywall() -> f64 {
    0.5
}

fn default_true() -> bool {
    true
}

fn default_grade() -> u8 {
    1
}

/// Layers outside and inside the structural core shared by all walls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallFinishes {
    #[serde(default = "default_drywall")]
    pub drywall_thick_in: f64,
    #[serde(default)]
    pub osb_thick_in: f64,
    #[serde(default)]
    pub rigid_r: f64,
    #[serde(default)]
    pub exterior_finish: Option<ExteriorFinish>,
}

impl Default for WallFinishes {
    fn default() -> Self {
        Self {
            drywall_thick_in: default_drywall(),
            osb_thick_in: 0.0,
            rigid_r: 0.0,
            exterior_finish: None,
        }
    }
}

impl WallFinishes {
    /// Bare framing: no sheathing, rigid insulation or finishes.
    pub fn none() -> Self {
        Self {
            drywall_thick_in: 0.0,
            ..Self::default()
        }
    }

    fn exterior_side(&self, builder: AssemblyBuilder, films: &Films) -> AssemblyBuilder {
        let rigid = (self.rigid_r > 0.0)
            .then(|| OpaqueMaterial::rigid_insulation("WallRigidIns", self.rigid_r));
        let osb = (self.osb_thick_in > 0.0)
            .then(|| OpaqueMaterial::osb("WallSheathing", self.osb_thick_in));
        builder
            .layer(films.outside.clone())
            .optional_layer(self.exterior_finish.as_ref().map(ExteriorFinish::to_material))
            .optional_layer(rigid)
            .optional_layer(osb)
    }

    fn interior_side(&self, builder: AssemblyBuilder, films: &Films) -> AssemblyBuilder {
        let drywall =
            (self.drywall_thick_in > 0.0).then(|| OpaqueMaterial::gypsum_wall(self.drywall_thick_in));
        builder.optional_layer(drywall).layer(films.inside.clone())
    }
}

pub(crate) fn check_grade(archetype: &'static str, grade: u8) -> Result<(), ConstructionError> {
    if (1..=3).contains(&grade) {
        Ok(())
    } else {
        Err(ConstructionError::builder(
            archetype,
            format!("installation grade must be 1, 2 or 3, got {grade}"),
        ))
    }
}

pub(crate) fn check_fraction(
    archetype: &'static str,
    what: &str,
    value: f64,
) -> Result<(), ConstructionError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConstructionError::builder(
            archetype,
            format!("{what} must be within [0, 1], got {value}"),
        ))
    }
}

pub(crate) fn check_positive(
    archetype: &'static str,
    what: &str,
    value: f64,
) -> Result<(), ConstructionError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConstructionError::builder(
            archetype,
            format!("{what} must be positive, got {value}"),
        ))
    }
}

/// Cavity fill material, with the unfilled-cavity air gap in series when
/// the insulation does not fill the depth.
pub(crate) fn cavity_material(name: &str, depth_in: f64, cavity_r: f64, filled: bool) -> OpaqueMaterial {
    if cavity_r <= 0.0 {
        return OpaqueMaterial::air_cavity_closed(depth_in);
    }
    let r = if filled {
        cavity_r
    } else {
        cavity_r + AIR_GAP_R_VALUE
    };
    OpaqueMaterial::from_base_with_r(name, depth_in, BaseMaterial::insulation_densepack(), r)
}

/// Three-path framing / insulation / gap fractions.
pub(crate) fn stud_paths(framing_factor: f64, install_grade: u8, cavity_r: f64) -> Vec<f64> {
    let gap = gap_factor(install_grade, framing_factor, cavity_r);
    vec![framing_factor, 1.0 - framing_factor - gap, gap]
}

/// Wood-stud framed wall with insulated cavities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WoodStudWall {
    pub cavity_r: f64,
    #[serde(default = "default_grade")]
    pub install_grade: u8,
    pub cavity_depth_in: f64,
    #[serde(default = "default_true")]
    pub cavity_filled: bool,
    pub framing_factor: f64,
    #[serde(flatten)]
    pub finishes: WallFinishes,
}

/// Wood-stud wall with framing, cavity and gap paths.
///
/// # Arguments
/// * `model` - Model receiving materials and the construction
/// * `surfaces` - Target surfaces; an empty list is a no-op
/// * `name` - Construction name
/// * `wall` - Framing, cavity and finish parameters
/// * `films` - Outside and inside air films
///
/// # Returns
/// The assigned construction, `None` when there were no surfaces.
pub fn apply_wood_stud_wall(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    wall: &WoodStudWall,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "wood stud wall";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_grade(ARCHETYPE, wall.install_grade)?;
    check_fraction(ARCHETYPE, "framing factor", wall.framing_factor)?;
    check_positive(ARCHETYPE, "cavity depth", wall.cavity_depth_in)?;

    let depth = wall.cavity_depth_in;
    let framing = OpaqueMaterial::from_base("WallStud", depth, BaseMaterial::wood());
    let cavity = cavity_material("WallCavityIns", depth, wall.cavity_r, wall.cavity_filled);
    let gap = OpaqueMaterial::air_cavity_closed(depth);

    let builder = AssemblyBuilder::new(
        name,
        stud_paths(wall.framing_factor, wall.install_grade, wall.cavity_r),
    );
    let builder = wall.finishes.exterior_side(builder, films);
    let builder = builder.parallel_layer("WallStudAndCavity", vec![framing, cavity, gap]);
    let assembly = wall.finishes.interior_side(builder, films).build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}

/// Steel-stud framed wall.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SteelStudWall {
    pub cavity_r: f64,
    #[serde(default = "default_grade")]
    pub install_grade: u8,
    pub cavity_depth_in: f64,
    #[serde(default = "default_true")]
    pub cavity_filled: bool,
    pub framing_factor: f64,
    /// Multiplier on cavity R that accounts for bridging through steel.
    pub correction_factor: f64,
    #[serde(flatten)]
    pub finishes: WallFinishes,
}

/// Steel-stud wall. The correction factor folds the framing into an
/// effective cavity R, so the cavity layer has only insulation and gap
/// paths.
pub fn apply_steel_stud_wall(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    wall: &SteelStudWall,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "steel stud wall";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_grade(ARCHETYPE, wall.install_grade)?;
    check_fraction(ARCHETYPE, "framing factor", wall.framing_factor)?;
    check_fraction(ARCHETYPE, "correction factor", wall.correction_factor)?;
    check_positive(ARCHETYPE, "cavity depth", wall.cavity_depth_in)?;

    let depth = wall.cavity_depth_in;
    let effective_r = wall.cavity_r * wall.correction_factor;
    let cavity = cavity_material("WallCavityIns", depth, effective_r, wall.cavity_filled);
    let gap = OpaqueMaterial::air_cavity_closed(depth);
    let gap_frac = gap_factor(wall.install_grade, wall.framing_factor, wall.cavity_r);

    let builder = AssemblyBuilder::new(name, vec![1.0 - gap_frac, gap_frac]);
    let builder = wall.finishes.exterior_side(builder, films);
    let builder = builder.parallel_layer("WallStudAndCavity", vec![cavity, gap]);
    let assembly = wall.finishes.interior_side(builder, films).build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}

/// Two rows of studs with an insulated gap between them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DoubleStudWall {
    pub cavity_r: f64,
    #[serde(default = "default_grade")]
    pub install_grade: u8,
    pub stud_depth_in: f64,
    /// Depth of the insulated gap between the two stud rows.
    pub gap_depth_in: f64,
    /// Total framing factor, studs included.
    pub framing_factor: f64,
    pub framing_spacing_in: f64,
    #[serde(default)]
    pub staggered: bool,
    #[serde(flatten)]
    pub finishes: WallFinishes,
}

/// Framing fraction contributed by one row of studs alone.
pub fn stud_fraction(framing_spacing_in: f64) -> f64 {
    STUD_WIDTH_IN / framing_spacing_in
}

/// Double-stud wall with paths
/// `[misc framing, outer stud, inner stud, gap, insulation]`.
pub fn apply_double_stud_wall(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    wall: &DoubleStudWall,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "double stud wall";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_grade(ARCHETYPE, wall.install_grade)?;
    check_fraction(ARCHETYPE, "framing factor", wall.framing_factor)?;
    check_positive(ARCHETYPE, "cavity R-value", wall.cavity_r)?;
    check_positive(ARCHETYPE, "stud depth", wall.stud_depth_in)?;
    check_positive(ARCHETYPE, "framing spacing", wall.framing_spacing_in)?;
    if wall.gap_depth_in < 0.0 {
        return Err(ConstructionError::builder(
            ARCHETYPE,
            format!("gap depth must not be negative, got {}", wall.gap_depth_in),
        ));
    }

    let stud_frac = stud_fraction(wall.framing_spacing_in);
    let misc_framing = wall.framing_factor - stud_frac;
    if misc_framing < 0.0 {
        return Err(ConstructionError::builder(
            ARCHETYPE,
            format!(
                "framing factor ({}) is less than the framing provided by the studs alone ({stud_frac})",
                wall.framing_factor
            ),
        ));
    }

    let stud_depth = wall.stud_depth_in;
    let gap_depth = wall.gap_depth_in;
    let cavity_depth = 2.0 * stud_depth + gap_depth;
    let ins_k = cavity_depth / wall.cavity_r;
    let dense = BaseMaterial::insulation_densepack();
    let wood = BaseMaterial::wood();

    let ins_stud_zone = OpaqueMaterial::new("WallCavityIns", stud_depth, ins_k, dense.rho, dense.cp);
    let framing_stud_zone = OpaqueMaterial::from_base("WallFraming", stud_depth, wood);
    let stud = OpaqueMaterial::from_base("WallStud", stud_depth, wood);
    let air = BaseMaterial::air();
    let gap_stud_zone = OpaqueMaterial::from_base_with_r(
        "WallAirGap",
        stud_depth,
        air,
        AIR_GAP_R_VALUE * stud_depth / cavity_depth,
    );

    let gap_frac = gap_factor(wall.install_grade, wall.framing_factor, wall.cavity_r);
    let paths = vec![
        misc_framing,
        stud_frac,
        stud_frac,
        gap_frac,
        1.0 - (2.0 * stud_frac + misc_framing + gap_frac),
    ];

    let (outer, inner) = if wall.staggered {
        (
            vec![
                framing_stud_zone.clone(),
                stud.clone(),
                ins_stud_zone.clone(),
                gap_stud_zone.clone(),
                ins_stud_zone.clone(),
            ],
            vec![
                framing_stud_zone,
                ins_stud_zone.clone(),
                stud,
                gap_stud_zone,
                ins_stud_zone,
            ],
        )
    } else {
        let row = vec![
            framing_stud_zone,
            stud.clone(),
            stud,
            gap_stud_zone,
            ins_stud_zone,
        ];
        (row.clone(), row)
    };

    let builder = AssemblyBuilder::new(name, paths);
    let mut builder = wall
        .finishes
        .exterior_side(builder, films)
        .parallel_layer("WallStudAndCavityOuter", outer);
    if gap_depth > 0.0 {
        let ins_middle = OpaqueMaterial::new("WallCavityIns", gap_depth, ins_k, dense.rho, dense.cp);
        let framing_middle = OpaqueMaterial::from_base("WallFraming", gap_depth, wood);
        let gap_middle = OpaqueMaterial::from_base_with_r(
            "WallAirGap",
            gap_depth,
            air,
            AIR_GAP_R_VALUE * gap_depth / cavity_depth,
        );
        builder = builder.parallel_layer(
            "WallCavity",
            vec![
                framing_middle,
                ins_middle.clone(),
                ins_middle.clone(),
                gap_middle,
                ins_middle,
            ],
        );
    }
    let builder = builder.parallel_layer("WallStudAndCavityInner", inner);
    let assembly = wall.finishes.interior_side(builder, films).build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}

/// Concrete masonry unit wall with optional interior furring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CmuWall {
    pub thick_in: f64,
    /// Effective block conductivity, Btu·in/(hr·ft²·°F).
    pub conductivity: f64,
    /// lbm/ft³
    pub density: f64,
    /// Fraction of grouted/framed webs through the block.
    pub framing_factor: f64,
    #[serde(default)]
    pub furring_r: f64,
    #[serde(default)]
    pub furring_cavity_depth_in: f64,
    #[serde(default)]
    pub furring_spacing_in: f64,
    #[serde(flatten)]
    pub finishes: WallFinishes,
}

/// CMU wall with a framing path through the block. Interior furring adds a
/// second parallel layer with its own stud and cavity paths.
pub fn apply_cmu_wall(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    wall: &CmuWall,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "CMU wall";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_fraction(ARCHETYPE, "framing factor", wall.framing_factor)?;
    check_positive(ARCHETYPE, "block thickness", wall.thick_in)?;
    check_positive(ARCHETYPE, "block conductivity", wall.conductivity)?;

    let concrete = BaseMaterial::concrete();
    let cmu = OpaqueMaterial::new("WallCMU", wall.thick_in, wall.conductivity, wall.density, concrete.cp);
    let framing = OpaqueMaterial::from_base("WallCMUFraming", wall.thick_in, BaseMaterial::wood());

    let builder = if wall.furring_cavity_depth_in > 0.0 {
        check_positive(ARCHETYPE, "furring spacing", wall.furring_spacing_in)?;
        let depth = wall.furring_cavity_depth_in;
        let furring = OpaqueMaterial::from_base("WallFurring", depth, BaseMaterial::wood());
        let furring_cavity = if wall.furring_r > 0.0 {
            OpaqueMaterial::from_base_with_r(
                "WallFurringIns",
                depth,
                BaseMaterial::insulation_densepack(),
                wall.furring_r,
            )
        } else {
            OpaqueMaterial::air_cavity_closed(depth)
        };
        let stud_frac = stud_fraction(wall.furring_spacing_in);
        let cavity_frac = 1.0 - (stud_frac + wall.framing_factor);
        if cavity_frac < 0.0 {
            return Err(ConstructionError::builder(
                ARCHETYPE,
                format!(
                    "framing factor ({}) plus furring fraction ({stud_frac}) exceeds 1",
                    wall.framing_factor
                ),
            ));
        }
        let builder = AssemblyBuilder::new(name, vec![wall.framing_factor, stud_frac, cavity_frac]);
        wall.finishes
            .exterior_side(builder, films)
            .parallel_layer("WallCMU", vec![framing, cmu.clone(), cmu])
            .parallel_layer("WallFurring", vec![furring.clone(), furring, furring_cavity])
    } else {
        let builder = AssemblyBuilder::new(name, vec![wall.framing_factor, 1.0 - wall.framing_factor]);
        wall.finishes
            .exterior_side(builder, films)
            .parallel_layer("WallCMU", vec![framing, cmu])
    };
    let assembly = wall.finishes.interior_side(builder, films).build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}

/// Insulating concrete form wall: foam, concrete, foam.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IcfWall {
    /// R-value of one insulating form.
    pub icf_r: f64,
    /// Thickness of one insulating form.
    pub ins_thick_in: f64,
    pub concrete_thick_in: f64,
    pub framing_factor: f64,
    #[serde(flatten)]
    pub finishes: WallFinishes,
}

/// ICF wall; framing runs through both forms and the concrete core.
pub fn apply_icf_wall(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    wall: &IcfWall,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "ICF wall";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_fraction(ARCHETYPE, "framing factor", wall.framing_factor)?;
    check_positive(ARCHETYPE, "form R-value", wall.icf_r)?;
    check_positive(ARCHETYPE, "form thickness", wall.ins_thick_in)?;
    check_positive(ARCHETYPE, "concrete thickness", wall.concrete_thick_in)?;

    let wood = BaseMaterial::wood();
    let ins = OpaqueMaterial::from_base_with_r(
        "WallICFIns",
        wall.ins_thick_in,
        BaseMaterial::insulation_rigid(),
        wall.icf_r,
    );
    let concrete = OpaqueMaterial::concrete("WallICFConcrete", wall.concrete_thick_in);
    let framing_form = OpaqueMaterial::from_base("WallICFFraming", wall.ins_thick_in, wood);
    let framing_core = OpaqueMaterial::from_base("WallICFFraming", wall.concrete_thick_in, wood);

    let builder = AssemblyBuilder::new(name, vec![wall.framing_factor, 1.0 - wall.framing_factor]);
    let builder = wall
        .finishes
        .exterior_side(builder, films)
        .parallel_layer("WallICFInsFormOuter", vec![framing_form.clone(), ins.clone()])
        .parallel_layer("WallICFConcrete", vec![framing_core, concrete])
        .parallel_layer("WallICFInsFormInner", vec![framing_form, ins]);
    let assembly = wall.finishes.interior_side(builder, films).build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}

/// Structural insulated panel wall.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SipWall {
    /// Nominal panel R-value.
    pub sip_r: f64,
    /// Total panel thickness, splines included.
    pub sip_thick_in: f64,
    pub framing_factor: f64,
    /// Interior structural sheathing.
    #[serde(default)]
    pub sheathing_thick_in: f64,
    #[serde(flatten)]
    pub finishes: WallFinishes,
}

/// Structural insulated panel wall with paths `[framing, spline, foam]`.
pub fn apply_sip_wall(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    wall: &SipWall,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "SIP wall";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_fraction(ARCHETYPE, "framing factor", wall.framing_factor)?;
    check_positive(ARCHETYPE, "panel R-value", wall.sip_r)?;
    let core_thick = wall.sip_thick_in - 2.0 * SIP_SPLINE_THICK_IN;
    if core_thick <= 0.0 {
        return Err(ConstructionError::builder(
            ARCHETYPE,
            format!(
                "panel thickness ({} in) leaves no room for the foam core",
                wall.sip_thick_in
            ),
        ));
    }
    let cavity_frac = 1.0 - (SIP_SPLINE_FRACTION + wall.framing_factor);
    if cavity_frac < 0.0 {
        return Err(ConstructionError::builder(
            ARCHETYPE,
            format!(
                "framing factor ({}) plus spline fraction exceeds 1",
                wall.framing_factor
            ),
        ));
    }

    let wood = BaseMaterial::wood();
    let rigid = BaseMaterial::insulation_rigid();
    let ins_k = wall.sip_thick_in / wall.sip_r;
    let framing_face = OpaqueMaterial::from_base("WallSIPFraming", SIP_SPLINE_THICK_IN, wood);
    let framing_core = OpaqueMaterial::from_base("WallSIPFraming", core_thick, wood);
    let spline = OpaqueMaterial::from_base("WallSIPSpline", SIP_SPLINE_THICK_IN, wood);
    let ins_face = OpaqueMaterial::new("WallSIPIns", SIP_SPLINE_THICK_IN, ins_k, rigid.rho, rigid.cp);
    let ins_core = OpaqueMaterial::new("WallSIPIns", core_thick, ins_k, rigid.rho, rigid.cp);
    let sheathing = (wall.sheathing_thick_in > 0.0)
        .then(|| OpaqueMaterial::osb("WallSIPSheathing", wall.sheathing_thick_in));

    let builder = AssemblyBuilder::new(
        name,
        vec![wall.framing_factor, SIP_SPLINE_FRACTION, cavity_frac],
    );
    let builder = wall
        .finishes
        .exterior_side(builder, films)
        .parallel_layer(
            "WallSplineLayerOuter",
            vec![framing_face.clone(), spline.clone(), ins_face.clone()],
        )
        .parallel_layer("WallIns", vec![framing_core, ins_core.clone(), ins_core])
        .parallel_layer("WallSplineLayerInner", vec![framing_face, spline, ins_face])
        .optional_layer(sheathing);
    let assembly = wall.finishes.interior_side(builder, films).build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}

/// One user-defined homogeneous layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenericLayer {
    pub thick_in: f64,
    pub k_in: f64,
    pub rho: f64,
    pub cp: f64,
}

/// Wall given as an explicit list of layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenericWall {
    /// Outside to inside, at most five.
    pub layers: Vec<GenericLayer>,
    #[serde(flatten)]
    pub finishes: WallFinishes,
}

pub const MAX_GENERIC_LAYERS: usize = 5;

pub fn apply_generic_layered_wall(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    wall: &GenericWall,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "generic layered wall";
    if surfaces.is_empty() {
        return Ok(None);
    }
    if wall.layers.is_empty() || wall.layers.len() > MAX_GENERIC_LAYERS {
        return Err(ConstructionError::builder(
            ARCHETYPE,
            format!(
                "expected 1 to {MAX_GENERIC_LAYERS} layers, got {}",
                wall.layers.len()
            ),
        ));
    }
    for layer in &wall.layers {
        check_positive(ARCHETYPE, "layer thickness", layer.thick_in)?;
        check_positive(ARCHETYPE, "layer conductivity", layer.k_in)?;
        check_positive(ARCHETYPE, "layer density", layer.rho)?;
        check_positive(ARCHETYPE, "layer specific heat", layer.cp)?;
    }

    let builder = wall
        .finishes
        .exterior_side(AssemblyBuilder::new(name, vec![1.0]), films);
    let builder = wall
        .layers
        .iter()
        .enumerate()
        .fold(builder, |b, (i, l)| {
            b.layer(OpaqueMaterial::new(
                format!("WallLayer{}", i + 1),
                l.thick_in,
                l.k_in,
                l.rho,
                l.cp,
            ))
        });
    let assembly = wall.finishes.interior_side(builder, films).build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}

/// Band joist at the floor line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RimJoist {
    pub cavity_r: f64,
    #[serde(default = "default_grade")]
    pub install_grade: u8,
    pub framing_factor: f64,
    #[serde(flatten)]
    pub finishes: WallFinishes,
}

/// Rim joist; the cavity behind the band is insulated between floor joists.
pub fn apply_rim_joist(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    rim: &RimJoist,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "rim joist";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_grade(ARCHETYPE, rim.install_grade)?;
    check_fraction(ARCHETYPE, "framing factor", rim.framing_factor)?;

    // Cavity depth is what the sill plate leaves behind the joist itself.
    let depth = SILL_PLATE_THICK_IN - RIM_JOIST_THICK_IN;
    let framing = OpaqueMaterial::from_base("RimJoistFraming", depth, BaseMaterial::wood());
    let cavity = cavity_material("RimJoistIns", depth, rim.cavity_r, true);
    let gap = OpaqueMaterial::air_cavity_closed(depth);
    let joist = OpaqueMaterial::from_base("RimJoist", RIM_JOIST_THICK_IN, BaseMaterial::wood());

    let builder = AssemblyBuilder::new(
        name,
        stud_paths(rim.framing_factor, rim.install_grade, rim.cavity_r),
    );
    let builder = rim
        .finishes
        .exterior_side(builder, films)
        .layer(joist)
        .parallel_layer("RimJoistStudAndCavity", vec![framing, cavity, gap]);
    let assembly = rim.finishes.interior_side(builder, films).build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}
