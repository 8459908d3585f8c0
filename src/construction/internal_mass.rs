//! Interior partition and furniture thermal mass.
//!
//! Neither bounds a real surface. Each builder creates internal-mass
//! surfaces sized from the conditioned floor area, split between the
//! above-grade living space and a conditioned basement.

use serde::{Deserialize, Serialize};

use crate::construction::assembly::{Assembly, AssemblyBuilder};
use crate::construction::material::{BaseMaterial, Films, OpaqueMaterial};
use crate::construction::model::{ConstructionId, Model, SurfaceId, SurfaceKind};
use crate::construction::walls::{cavity_material, check_fraction, check_positive, stud_paths};
use crate::error::ConstructionError;
use crate::units;

pub const PARTITION_WALL_FRAMING_FACTOR: f64 = 0.16;
pub const PARTITION_WALL_CAVITY_DEPTH_IN: f64 = 3.5;

fn one() -> f64 {
    1.0
}

fn default_furniture_mass() -> f64 {
    8.0
}

fn default_furniture_density() -> f64 {
    BaseMaterial::furniture().rho
}

fn default_furniture_area_fraction() -> f64 {
    0.4
}

fn default_drywall() -> f64 {
    0.5
}

/// Interior partition walls as internal mass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionWallMass {
    pub conditioned_floor_area_ft2: f64,
    /// Partition wall area per unit of conditioned floor area.
    #[serde(default = "one")]
    pub fraction_of_floor_area: f64,
    /// Share of conditioned floor area that is a conditioned basement.
    #[serde(default)]
    pub basement_fraction: f64,
    #[serde(default = "default_drywall")]
    pub drywall_thick_in: f64,
}

/// Furniture as internal mass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FurnitureMass {
    pub conditioned_floor_area_ft2: f64,
    #[serde(default)]
    pub basement_fraction: f64,
    /// lbm per ft² of floor area.
    #[serde(default = "default_furniture_mass")]
    pub mass_per_area: f64,
    /// lbm/ft³
    #[serde(default = "default_furniture_density")]
    pub density: f64,
    /// Share of the floor covered by furniture.
    #[serde(default = "default_furniture_area_fraction")]
    pub area_fraction: f64,
}

/// Uninsulated wood-stud partition, drywall on both faces.
pub fn apply_partition_wall_mass(
    model: &mut Model,
    name: &str,
    mass: &PartitionWallMass,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "partition wall mass";
    check_positive(ARCHETYPE, "conditioned floor area", mass.conditioned_floor_area_ft2)?;
    check_fraction(ARCHETYPE, "basement fraction", mass.basement_fraction)?;
    if mass.fraction_of_floor_area < 0.0 {
        return Err(ConstructionError::builder(
            ARCHETYPE,
            format!(
                "fraction of floor area must not be negative, got {}",
                mass.fraction_of_floor_area
            ),
        ));
    }
    let area_ft2 = mass.fraction_of_floor_area * mass.conditioned_floor_area_ft2;
    if area_ft2 <= 0.0 {
        return Ok(None);
    }

    let depth = PARTITION_WALL_CAVITY_DEPTH_IN;
    let films = Films::interior_wall();
    let drywall =
        (mass.drywall_thick_in > 0.0).then(|| OpaqueMaterial::gypsum_wall(mass.drywall_thick_in));
    let assembly = AssemblyBuilder::new(name, stud_paths(PARTITION_WALL_FRAMING_FACTOR, 1, 0.0))
        .layer(films.outside.clone())
        .optional_layer(drywall.clone())
        .parallel_layer(
            "PartitionWallStudAndCavity",
            vec![
                OpaqueMaterial::from_base("PartitionWallStud", depth, BaseMaterial::wood()),
                cavity_material("PartitionWallCavity", depth, 0.0, true),
                OpaqueMaterial::air_cavity_closed(depth),
            ],
        )
        .optional_layer(drywall)
        .layer(films.inside)
        .build()?;

    assign_to_mass_surfaces(model, assembly, area_ft2, mass.basement_fraction).map(Some)
}

/// Furniture as one solid slab whose thickness spreads the furniture mass
/// over the covered floor area.
pub fn apply_furniture_mass(
    model: &mut Model,
    name: &str,
    mass: &FurnitureMass,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "furniture mass";
    check_positive(ARCHETYPE, "conditioned floor area", mass.conditioned_floor_area_ft2)?;
    check_fraction(ARCHETYPE, "basement fraction", mass.basement_fraction)?;
    check_fraction(ARCHETYPE, "area fraction", mass.area_fraction)?;
    check_positive(ARCHETYPE, "density", mass.density)?;
    if mass.mass_per_area <= 0.0 || mass.area_fraction <= 0.0 {
        return Ok(None);
    }

    let thick_in = mass.mass_per_area / (mass.density * mass.area_fraction) * 12.0;
    let base = BaseMaterial::furniture();
    let furniture = OpaqueMaterial::new("Furniture", thick_in, base.k_in, mass.density, base.cp)
        .with_absorptances(Some(0.9), Some(0.6), None);
    let assembly = AssemblyBuilder::new(name, vec![1.0]).layer(furniture).build()?;

    let area_ft2 = mass.area_fraction * mass.conditioned_floor_area_ft2;
    assign_to_mass_surfaces(model, assembly, area_ft2, mass.basement_fraction).map(Some)
}

fn assign_to_mass_surfaces(
    model: &mut Model,
    assembly: Assembly,
    area_ft2: f64,
    basement_fraction: f64,
) -> Result<ConstructionId, ConstructionError> {
    let name = assembly.name().to_string();
    let mut surfaces: Vec<SurfaceId> = Vec::with_capacity(2);
    let splits = [
        ("Living", 1.0 - basement_fraction),
        ("Basement", basement_fraction),
    ];
    for (space, share) in splits {
        if share > 0.0 {
            surfaces.push(model.add_surface(
                format!("{name} {space}"),
                SurfaceKind::InternalMass,
                units::ft2_to_m2(area_ft2 * share),
            ));
        }
    }
    assembly.create_and_assign(model, &surfaces)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_partition_area_split() {
        let mut model = Model::new();
        let mass = PartitionWallMass {
            conditioned_floor_area_ft2: 2000.0,
            fraction_of_floor_area: 1.0,
            basement_fraction: 0.25,
            drywall_thick_in: 0.5,
        };
        let id = apply_partition_wall_mass(&mut model, "PartitionWallMass", &mass)
            .unwrap()
            .unwrap();

        let surfaces: Vec<_> = model.surfaces().map(|(_, s)| s.clone()).collect();
        assert_eq!(surfaces.len(), 2);
        assert_eq!(surfaces[0].name, "PartitionWallMass Living");
        assert!((surfaces[0].area - units::ft2_to_m2(1500.0)).abs() < EPSILON);
        assert!((surfaces[1].area - units::ft2_to_m2(500.0)).abs() < EPSILON);
        assert!(surfaces.iter().all(|s| s.kind == SurfaceKind::InternalMass));
        assert!(surfaces.iter().all(|s| s.construction == Some(id)));

        let layers = model.summary().constructions[id.index()].layers.clone();
        assert_eq!(
            layers,
            vec!["GypsumBoard", "PartitionWallStudAndCavity", "GypsumBoard"]
        );
    }

    #[test]
    fn test_partition_wall_r_value() {
        let mut model = Model::new();
        let mass = PartitionWallMass {
            conditioned_floor_area_ft2: 1000.0,
            fraction_of_floor_area: 1.0,
            basement_fraction: 0.0,
            drywall_thick_in: 0.5,
        };
        let id = apply_partition_wall_mass(&mut model, "Partition", &mass)
            .unwrap()
            .unwrap();
        let common = 2.0 * 0.68 + 2.0 * 0.5 / 1.1112;
        let stud = common + 3.5 / 0.8004;
        let cavity = common + 1.0;
        let expected = 1.0 / (0.16 / stud + 0.84 / cavity);
        assert!((model.construction(id).unwrap().r_value - expected).abs() < EPSILON);
        assert_eq!(model.surfaces().count(), 1);
    }

    #[test]
    fn test_furniture_thickness() {
        let mut model = Model::new();
        let mass = FurnitureMass {
            conditioned_floor_area_ft2: 1000.0,
            basement_fraction: 0.0,
            mass_per_area: 8.0,
            density: 40.0,
            area_fraction: 0.4,
        };
        apply_furniture_mass(&mut model, "FurnitureMass", &mass).unwrap();
        let (_, material) = model.registry().iter().next().unwrap();
        let crate::construction::registry::ModelMaterial::StandardOpaque {
            thickness,
            solar_absorptance,
            ..
        } = material
        else {
            panic!("expected opaque furniture, got {material:?}");
        };
        assert!((thickness - units::in_to_m(6.0)).abs() < EPSILON);
        assert_eq!(*solar_absorptance, Some(0.6));
        let (_, surface) = model.surfaces().next().unwrap();
        assert!((surface.area - units::ft2_to_m2(400.0)).abs() < EPSILON);
    }

    #[test]
    fn test_zero_fraction_creates_nothing() {
        let mut model = Model::new();
        let mass = PartitionWallMass {
            conditioned_floor_area_ft2: 1000.0,
            fraction_of_floor_area: 0.0,
            basement_fraction: 0.0,
            drywall_thick_in: 0.5,
        };
        assert!(apply_partition_wall_mass(&mut model, "Partition", &mass)
            .unwrap()
            .is_none());
        assert_eq!(model.surfaces().count(), 0);
    }
}
