//! Below-grade wall and slab builders.
//!
//! Both are single-path stacks. Insulation that sits beside or under the
//! concrete is not part of the construction; it becomes an
//! [`InsulationBlock`] on a [`Foundation`] in the ground domain, and every
//! target surface is linked to that foundation.

use serde::{Deserialize, Serialize};

use crate::construction::assembly::AssemblyBuilder;
use crate::construction::floors::FloorCovering;
use crate::construction::ground::{Foundation, InsulationBlock, InsulationPlacement};
use crate::construction::material::{Films, OpaqueMaterial};
use crate::construction::model::{ConstructionId, Model, SurfaceId};
use crate::construction::walls::check_positive;
use crate::error::ConstructionError;
use crate::units;

/// Foundation wall extends this far below the top of the slab (in).
pub const WALL_DEPTH_BELOW_SLAB_IN: f64 = 8.0;

fn default_drywall() -> f64 {
    0.5
}

/// Vertical insulation on one face of a foundation wall.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WallInsulation {
    pub r_value: f64,
    /// Distance from the top of the wall to the top of the insulation (ft).
    #[serde(default)]
    pub top_ft: f64,
    /// Distance from the top of the wall to the bottom of the insulation (ft).
    pub bottom_ft: f64,
}

impl WallInsulation {
    fn block(
        &self,
        archetype: &'static str,
        name: &str,
        placement: InsulationPlacement,
    ) -> Result<Option<InsulationBlock>, ConstructionError> {
        if self.r_value <= 0.0 || self.bottom_ft <= self.top_ft {
            return Ok(None);
        }
        if self.top_ft < 0.0 {
            return Err(ConstructionError::builder(
                archetype,
                format!("insulation top ({} ft) is above the wall", self.top_ft),
            ));
        }
        Ok(Some(InsulationBlock::rigid(
            name,
            placement,
            self.r_value,
            self.bottom_ft,
            0.0,
            self.top_ft,
        )))
    }
}

/// Basement or crawlspace wall.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoundationWall {
    pub concrete_thick_in: f64,
    pub height_ft: f64,
    pub height_above_grade_ft: f64,
    #[serde(default = "default_drywall")]
    pub drywall_thick_in: f64,
    #[serde(default)]
    pub interior_insulation: Option<WallInsulation>,
    #[serde(default)]
    pub exterior_insulation: Option<WallInsulation>,
}

/// Concrete foundation wall, with a new foundation holding its insulation.
pub fn apply_foundation_wall(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    wall: &FoundationWall,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "foundation wall";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_positive(ARCHETYPE, "concrete thickness", wall.concrete_thick_in)?;
    check_positive(ARCHETYPE, "wall height", wall.height_ft)?;
    if wall.height_above_grade_ft < 0.0 || wall.height_above_grade_ft > wall.height_ft {
        return Err(ConstructionError::builder(
            ARCHETYPE,
            format!(
                "height above grade ({} ft) must be within the wall height ({} ft)",
                wall.height_above_grade_ft, wall.height_ft
            ),
        ));
    }

    let mut foundation = Foundation::new(format!("{name} Foundation"));
    foundation.wall_height_above_grade = Some(units::ft_to_m(wall.height_above_grade_ft));
    foundation.wall_depth_below_slab = Some(units::in_to_m(WALL_DEPTH_BELOW_SLAB_IN));
    let blocks = [
        wall.interior_insulation.as_ref().map(|ins| {
            ins.block(ARCHETYPE, "FoundationWallIntIns", InsulationPlacement::InteriorVertical)
        }),
        wall.exterior_insulation.as_ref().map(|ins| {
            ins.block(ARCHETYPE, "FoundationWallExtIns", InsulationPlacement::ExteriorVertical)
        }),
    ];
    for block in blocks.into_iter().flatten() {
        if let Some(block) = block? {
            foundation = foundation.with_block(block);
        }
    }

    let drywall =
        (wall.drywall_thick_in > 0.0).then(|| OpaqueMaterial::gypsum_wall(wall.drywall_thick_in));
    let assembly = AssemblyBuilder::new(name, vec![1.0])
        .layer(OpaqueMaterial::concrete("FoundationWallConcrete", wall.concrete_thick_in))
        .optional_layer(drywall)
        .layer(films.inside.clone())
        .build()?;

    let id = assembly.create_and_assign(model, surfaces)?;
    link_foundation(model, surfaces, foundation, None);
    Ok(Some(id))
}

/// Slab on grade or basement floor slab.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    pub concrete_thick_in: f64,
    /// Rigid insulation under the whole slab, part of the construction.
    #[serde(default)]
    pub whole_slab_r: f64,
    /// Exterior vertical insulation at the slab edge.
    #[serde(default)]
    pub perimeter_r: f64,
    #[serde(default)]
    pub perimeter_depth_ft: f64,
    /// Interior vertical insulation between slab edge and foundation wall.
    #[serde(default)]
    pub gap_r: f64,
    /// Horizontal insulation under the slab edge.
    #[serde(default)]
    pub under_slab_r: f64,
    #[serde(default)]
    pub under_slab_width_ft: f64,
    #[serde(default)]
    pub covering: Option<FloorCovering>,
    pub exposed_perimeter_ft: f64,
    /// Attach to an existing foundation (e.g. the basement walls') instead
    /// of creating one.
    #[serde(default)]
    pub foundation: Option<String>,
}

/// Slab floor. Edge and under-slab insulation become blocks on the
/// slab's own foundation, or on the named existing one.
pub fn apply_slab(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    slab: &Slab,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "slab";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_positive(ARCHETYPE, "concrete thickness", slab.concrete_thick_in)?;
    if slab.exposed_perimeter_ft < 0.0 {
        return Err(ConstructionError::builder(
            ARCHETYPE,
            format!("exposed perimeter must not be negative, got {}", slab.exposed_perimeter_ft),
        ));
    }

    let existing = match &slab.foundation {
        Some(foundation_name) => Some(
            model
                .ground()
                .foundations
                .iter()
                .position(|f| &f.name == foundation_name)
                .ok_or_else(|| {
                    ConstructionError::builder(
                        ARCHETYPE,
                        format!("no foundation named {foundation_name:?}"),
                    )
                })?,
        ),
        None => None,
    };

    let slab_thick_ft = slab.concrete_thick_in / 12.0;
    let mut blocks = Vec::new();
    if slab.perimeter_r > 0.0 && slab.perimeter_depth_ft > 0.0 {
        blocks.push(InsulationBlock::rigid(
            "SlabPerimeterIns",
            InsulationPlacement::ExteriorVertical,
            slab.perimeter_r,
            slab.perimeter_depth_ft,
            0.0,
            0.0,
        ));
    }
    if slab.gap_r > 0.0 {
        blocks.push(InsulationBlock::rigid(
            "SlabGapIns",
            InsulationPlacement::InteriorVertical,
            slab.gap_r,
            slab_thick_ft,
            0.0,
            0.0,
        ));
    }
    if slab.under_slab_r > 0.0 && slab.under_slab_width_ft > 0.0 {
        blocks.push(InsulationBlock::rigid(
            "SlabUnderIns",
            InsulationPlacement::InteriorHorizontal,
            slab.under_slab_r,
            slab_thick_ft,
            slab.under_slab_width_ft,
            0.0,
        ));
    }

    let rigid = (slab.whole_slab_r > 0.0)
        .then(|| OpaqueMaterial::rigid_insulation("SlabRigidIns", slab.whole_slab_r));
    let assembly = AssemblyBuilder::new(name, vec![1.0])
        .optional_layer(rigid)
        .layer(OpaqueMaterial::concrete("Concrete", slab.concrete_thick_in))
        .optional_layer(slab.covering.as_ref().map(FloorCovering::to_material))
        .layer(films.inside.clone())
        .build()?;

    let id = assembly.create_and_assign(model, surfaces)?;
    let perimeter = Some(units::ft_to_m(slab.exposed_perimeter_ft));
    match existing {
        Some(index) => {
            let ground = model.ground_mut();
            ground.ensure_configured();
            ground.foundations[index].insulation.extend(blocks);
            set_foundation(model, surfaces, index, perimeter);
        }
        None => {
            let foundation = blocks
                .into_iter()
                .fold(Foundation::new(format!("{name} Foundation")), Foundation::with_block);
            link_foundation(model, surfaces, foundation, perimeter);
        }
    }
    Ok(Some(id))
}

/// Registers `foundation` and points every surface at it.
fn link_foundation(
    model: &mut Model,
    surfaces: &[SurfaceId],
    foundation: Foundation,
    exposed_perimeter: Option<f64>,
) {
    let ground = model.ground_mut();
    ground.ensure_configured();
    let index = ground.add_foundation(foundation);
    set_foundation(model, surfaces, index, exposed_perimeter);
}

fn set_foundation(
    model: &mut Model,
    surfaces: &[SurfaceId],
    index: usize,
    exposed_perimeter: Option<f64>,
) {
    for &sid in surfaces {
        if let Some(surface) = model.surface_mut(sid) {
            surface.foundation = Some(index);
            if exposed_perimeter.is_some() {
                surface.exposed_perimeter = exposed_perimeter;
            }
        }
    }
}
