//! JSON building description and the model build that consumes it.
//!
//! ```json
//! {
//!   "surfaces": [{ "name": "Wall North", "kind": "opaque", "area_ft2": 320 }],
//!   "assemblies": [{
//!     "name": "ExteriorWall",
//!     "surfaces": ["Wall North"],
//!     "type": "wood_stud_wall",
//!     "cavity_r": 13, "cavity_depth_in": 3.5, "framing_factor": 0.25
//!   }]
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::construction::fenestration::{self, Door, Window, DEFAULT_COOLING_SEASON};
use crate::construction::floors::{self, Floor};
use crate::construction::foundation::{self, FoundationWall, Slab};
use crate::construction::ground::{DeepGroundBoundary, GroundDomainSettings, SolutionTimestep};
use crate::construction::internal_mass::{self, FurnitureMass, PartitionWallMass};
use crate::construction::material::{Films, SimpleMaterial};
use crate::construction::model::{ConstructionId, Model, SurfaceId, SurfaceKind};
use crate::construction::roofs::{self, Ceiling, ClosedCavityRoof, OpenCavityRoof};
use crate::construction::walls::{
    self, CmuWall, DoubleStudWall, GenericWall, IcfWall, RimJoist, SipWall, SteelStudWall,
    WoodStudWall,
};
use crate::error::ConstructionError;
use crate::units;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to parse building description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("surface {0:?} is defined more than once")]
    DuplicateSurface(String),

    #[error("surface {surface:?} is adjacent to unknown surface {adjacent:?}")]
    UnknownAdjacent { surface: String, adjacent: String },

    #[error("assembly {assembly:?} targets unknown surface {surface:?}")]
    UnknownSurface { assembly: String, surface: String },

    #[error("assembly {assembly:?} uses unknown air film {film:?}")]
    UnknownFilm { assembly: String, film: String },

    #[error("assembly {assembly:?} failed: {source}")]
    Construction {
        assembly: String,
        #[source]
        source: ConstructionError,
    },
}

/// Optional overrides of the ground-domain defaults. Soil conductivity is
/// in IP units like the rest of the description; every other field is SI,
/// matching [`GroundDomainSettings`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroundSettingsInput {
    /// Btu·in/(hr·ft²·°F)
    pub soil_conductivity: Option<f64>,
    /// kg/m³
    pub soil_density: Option<f64>,
    /// J/(kg·K)
    pub soil_specific_heat: Option<f64>,
    pub ground_solar_absorptivity: Option<f64>,
    pub ground_thermal_absorptivity: Option<f64>,
    /// m
    pub ground_surface_roughness: Option<f64>,
    /// m
    pub far_field_width: Option<f64>,
    pub deep_ground_boundary: Option<DeepGroundBoundary>,
    /// m
    pub deep_ground_depth: Option<f64>,
    /// m
    pub minimum_cell_dimension: Option<f64>,
    pub maximum_cell_growth_coefficient: Option<f64>,
    pub timestep: Option<SolutionTimestep>,
}

impl GroundSettingsInput {
    pub fn to_settings(&self) -> GroundDomainSettings {
        let defaults = match self.soil_conductivity {
            Some(k) => GroundDomainSettings::with_soil_conductivity(k),
            None => GroundDomainSettings::default(),
        };
        GroundDomainSettings {
            soil_density: self.soil_density.unwrap_or(defaults.soil_density),
            soil_specific_heat: self.soil_specific_heat.unwrap_or(defaults.soil_specific_heat),
            ground_solar_absorptivity: self
                .ground_solar_absorptivity
                .unwrap_or(defaults.ground_solar_absorptivity),
            ground_thermal_absorptivity: self
                .ground_thermal_absorptivity
                .unwrap_or(defaults.ground_thermal_absorptivity),
            ground_surface_roughness: self
                .ground_surface_roughness
                .unwrap_or(defaults.ground_surface_roughness),
            far_field_width: self.far_field_width.unwrap_or(defaults.far_field_width),
            deep_ground_boundary: self
                .deep_ground_boundary
                .unwrap_or(defaults.deep_ground_boundary),
            deep_ground_depth: self.deep_ground_depth.unwrap_or(defaults.deep_ground_depth),
            minimum_cell_dimension: self
                .minimum_cell_dimension
                .unwrap_or(defaults.minimum_cell_dimension),
            maximum_cell_growth_coefficient: self
                .maximum_cell_growth_coefficient
                .unwrap_or(defaults.maximum_cell_growth_coefficient),
            timestep: self.timestep.unwrap_or(defaults.timestep),
            ..defaults
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceInput {
    pub name: String,
    pub kind: SurfaceKind,
    #[serde(default)]
    pub adjacent: Option<String>,
    pub area_ft2: f64,
}

/// Every archetype a building description can request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Archetype {
    WoodStudWall(WoodStudWall),
    SteelStudWall(SteelStudWall),
    DoubleStudWall(DoubleStudWall),
    CmuWall(CmuWall),
    IcfWall(IcfWall),
    SipWall(SipWall),
    GenericWall(GenericWall),
    RimJoist(RimJoist),
    OpenCavityRoof(OpenCavityRoof),
    ClosedCavityRoof(ClosedCavityRoof),
    Ceiling(Ceiling),
    Floor(Floor),
    FoundationWall(FoundationWall),
    Slab(Slab),
    Door(Door),
    Window(Window),
    Skylight(Window),
    PartitionWallMass(PartitionWallMass),
    FurnitureMass(FurnitureMass),
}

impl Archetype {
    /// Air films used when the description does not override them.
    pub fn default_films(&self) -> Films {
        match self {
            Archetype::OpenCavityRoof(_) | Archetype::ClosedCavityRoof(_) => Films::roof(),
            Archetype::Ceiling(_) => Films::ceiling(),
            Archetype::Floor(_) | Archetype::Slab(_) => Films::floor(),
            _ => Films::exterior_wall(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssemblyInput {
    pub name: String,
    #[serde(default)]
    pub surfaces: Vec<String>,
    #[serde(default)]
    pub outside_film: Option<String>,
    #[serde(default)]
    pub inside_film: Option<String>,
    #[serde(flatten)]
    pub archetype: Archetype,
}

impl AssemblyInput {
    fn films(&self) -> Result<Films, InputError> {
        let defaults = self.archetype.default_films();
        let lookup = |name: &Option<String>, default: SimpleMaterial| match name {
            None => Ok(default),
            Some(film) => SimpleMaterial::air_film_by_name(film).ok_or_else(|| InputError::UnknownFilm {
                assembly: self.name.clone(),
                film: film.clone(),
            }),
        };
        Ok(Films::new(
            lookup(&self.outside_film, defaults.outside)?,
            lookup(&self.inside_film, defaults.inside)?,
        ))
    }

    /// Runs the matching builder.
    pub fn apply(
        &self,
        model: &mut Model,
        surfaces: &[SurfaceId],
        cooling_season: &[bool; 12],
    ) -> Result<Option<ConstructionId>, InputError> {
        let films = self.films()?;
        let name = self.name.as_str();
        let result = match &self.archetype {
            Archetype::WoodStudWall(p) => walls::apply_wood_stud_wall(model, surfaces, name, p, &films),
            Archetype::SteelStudWall(p) => walls::apply_steel_stud_wall(model, surfaces, name, p, &films),
            Archetype::DoubleStudWall(p) => walls::apply_double_stud_wall(model, surfaces, name, p, &films),
            Archetype::CmuWall(p) => walls::apply_cmu_wall(model, surfaces, name, p, &films),
            Archetype::IcfWall(p) => walls::apply_icf_wall(model, surfaces, name, p, &films),
            Archetype::SipWall(p) => walls::apply_sip_wall(model, surfaces, name, p, &films),
            Archetype::GenericWall(p) => {
                walls::apply_generic_layered_wall(model, surfaces, name, p, &films)
            }
            Archetype::RimJoist(p) => walls::apply_rim_joist(model, surfaces, name, p, &films),
            Archetype::OpenCavityRoof(p) => {
                roofs::apply_open_cavity_roof(model, surfaces, name, p, &films)
            }
            Archetype::ClosedCavityRoof(p) => {
                roofs::apply_closed_cavity_roof(model, surfaces, name, p, &films)
            }
            Archetype::Ceiling(p) => roofs::apply_ceiling(model, surfaces, name, p, &films),
            Archetype::Floor(p) => floors::apply_floor(model, surfaces, name, p, &films),
            Archetype::FoundationWall(p) => {
                foundation::apply_foundation_wall(model, surfaces, name, p, &films)
            }
            Archetype::Slab(p) => foundation::apply_slab(model, surfaces, name, p, &films),
            Archetype::Door(p) => fenestration::apply_door(model, surfaces, name, p, &films),
            Archetype::Window(p) => {
                fenestration::apply_window(model, surfaces, name, p, cooling_season)
            }
            Archetype::Skylight(p) => {
                fenestration::apply_skylight(model, surfaces, name, p, cooling_season)
            }
            Archetype::PartitionWallMass(p) => internal_mass::apply_partition_wall_mass(model, name, p),
            Archetype::FurnitureMass(p) => internal_mass::apply_furniture_mass(model, name, p),
        };
        result.map_err(|source| InputError::Construction {
            assembly: self.name.clone(),
            source,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingInput {
    #[serde(default)]
    pub ground: Option<GroundSettingsInput>,
    #[serde(default)]
    pub surfaces: Vec<SurfaceInput>,
    #[serde(default)]
    pub assemblies: Vec<AssemblyInput>,
    /// Monthly cooling-season flags, January first.
    #[serde(default)]
    pub cooling_season: Option<[bool; 12]>,
}

/// A finished build and the assemblies that were skipped on the way.
#[derive(Debug)]
pub struct BuildOutcome {
    pub model: Model,
    pub skipped: Vec<(String, String)>,
}

impl BuildingInput {
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builds every assembly in order.
    ///
    /// With `skip_invalid`, an assembly that fails is logged and skipped and
    /// its surfaces stay unassigned; otherwise the first failure is returned.
    pub fn build(&self, skip_invalid: bool) -> Result<BuildOutcome, InputError> {
        let mut model = Model::new();
        if let Some(ground) = &self.ground {
            model.ground_mut().configure(ground.to_settings());
        }

        let mut by_name: HashMap<&str, SurfaceId> = HashMap::new();
        for surface in &self.surfaces {
            let id = model.add_surface(
                surface.name.clone(),
                surface.kind,
                units::ft2_to_m2(surface.area_ft2),
            );
            if by_name.insert(surface.name.as_str(), id).is_some() {
                return Err(InputError::DuplicateSurface(surface.name.clone()));
            }
        }
        for surface in &self.surfaces {
            let Some(adjacent) = &surface.adjacent else {
                continue;
            };
            let other = by_name.get(adjacent.as_str()).ok_or_else(|| InputError::UnknownAdjacent {
                surface: surface.name.clone(),
                adjacent: adjacent.clone(),
            })?;
            model
                .set_adjacent(by_name[surface.name.as_str()], *other)
                .map_err(|source| InputError::Construction {
                    assembly: surface.name.clone(),
                    source,
                })?;
        }

        let cooling_season = self.cooling_season.unwrap_or(DEFAULT_COOLING_SEASON);
        let mut skipped = Vec::new();
        for assembly in &self.assemblies {
            let result = assembly
                .surfaces
                .iter()
                .map(|name| {
                    by_name.get(name.as_str()).copied().ok_or_else(|| InputError::UnknownSurface {
                        assembly: assembly.name.clone(),
                        surface: name.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .and_then(|targets| assembly.apply(&mut model, &targets, &cooling_season));

            match result {
                Ok(_) => {}
                Err(e) if skip_invalid => {
                    warn!(assembly = %assembly.name, error = %e, "skipping invalid assembly");
                    skipped.push((assembly.name.clone(), e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            constructions = model.constructions().count(),
            materials = model.registry().len(),
            skipped = skipped.len(),
            "model build complete"
        );
        Ok(BuildOutcome { model, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUSE: &str = r#"{
        "surfaces": [
            { "name": "Wall", "kind": "opaque", "area_ft2": 400 },
            { "name": "Attic Floor", "kind": "opaque", "area_ft2": 1000 },
            { "name": "Window", "kind": "sub_surface", "area_ft2": 40 }
        ],
        "assemblies": [
            {
                "name": "ExteriorWall",
                "surfaces": ["Wall"],
                "type": "wood_stud_wall",
                "cavity_r": 13,
                "cavity_depth_in": 3.5,
                "framing_factor": 0.25,
                "osb_thick_in": 0.5
            },
            {
                "name": "Ceiling",
                "surfaces": ["Attic Floor"],
                "type": "ceiling",
                "cavity_r": 38,
                "ins_thick_in": 12,
                "framing_factor": 0.11,
                "joist_height_in": 3.5
            },
            {
                "name": "Window",
                "surfaces": ["Window"],
                "type": "window",
                "u_factor": 0.33,
                "shgc": 0.45,
                "cooling_shade_multiplier": 0.7
            }
        ]
    }"#;

    #[test]
    fn test_parse_archetypes_and_defaults() {
        let input = BuildingInput::from_json(HOUSE).unwrap();
        assert_eq!(input.assemblies.len(), 3);
        let Archetype::WoodStudWall(wall) = &input.assemblies[0].archetype else {
            panic!("expected a wood stud wall");
        };
        assert_eq!(wall.install_grade, 1);
        assert!(wall.cavity_filled);
        assert_eq!(wall.finishes.drywall_thick_in, 0.5);
        assert_eq!(wall.finishes.osb_thick_in, 0.5);
    }

    #[test]
    fn test_build_assigns_every_surface() {
        let outcome = BuildingInput::from_json(HOUSE).unwrap().build(false).unwrap();
        let summary = outcome.model.summary();
        assert!(outcome.skipped.is_empty());
        assert_eq!(summary.constructions.len(), 3);
        for surface in &summary.surfaces {
            assert!(surface.construction.is_some(), "{} unassigned", surface.name);
        }
        assert_eq!(summary.surfaces[2].shading_controls.len(), 1);
    }

    #[test]
    fn test_unknown_surface() {
        let json = r#"{ "assemblies": [
            { "name": "Door", "surfaces": ["Front Door"], "type": "door", "u_factor": 0.2 }
        ] }"#;
        let err = BuildingInput::from_json(json).unwrap().build(false).unwrap_err();
        assert!(matches!(err, InputError::UnknownSurface { .. }));
    }

    #[test]
    fn test_skip_invalid_continues() {
        let json = r#"{
            "surfaces": [
                { "name": "Wall", "kind": "opaque", "area_ft2": 400 },
                { "name": "Door", "kind": "sub_surface", "area_ft2": 20 }
            ],
            "assemblies": [
                {
                    "name": "DoubleWall",
                    "surfaces": ["Wall"],
                    "type": "double_stud_wall",
                    "cavity_r": 40,
                    "stud_depth_in": 3.5,
                    "gap_depth_in": 3.0,
                    "framing_factor": 0.05,
                    "framing_spacing_in": 24
                },
                { "name": "Door", "surfaces": ["Door"], "type": "door", "u_factor": 0.2 }
            ]
        }"#;
        let input = BuildingInput::from_json(json).unwrap();
        assert!(matches!(
            input.build(false),
            Err(InputError::Construction {
                source: ConstructionError::BuilderInput { .. },
                ..
            })
        ));

        let outcome = input.build(true).unwrap();
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].0, "DoubleWall");
        let summary = outcome.model.summary();
        assert_eq!(summary.surfaces[0].construction, None);
        assert_eq!(summary.surfaces[1].construction.as_deref(), Some("Door"));
    }

    #[test]
    fn test_film_override() {
        let json = r#"{
            "surfaces": [{ "name": "Wall", "kind": "opaque", "area_ft2": 100 }],
            "assemblies": [{
                "name": "Wall", "surfaces": ["Wall"], "type": "generic_wall",
                "outside_film": "vertical",
                "drywall_thick_in": 0,
                "layers": [{ "thick_in": 4, "k_in": 9.0912, "rho": 140, "cp": 0.2 }]
            }]
        }"#;
        let outcome = BuildingInput::from_json(json).unwrap().build(false).unwrap();
        let r = outcome.model.summary().constructions[0].r_value_ip;
        assert!((r - (0.68 + 4.0 / 9.0912 + 0.68)).abs() < 1e-9);

        let bad = json.replace("\"vertical\"", "\"sideways\"");
        let err = BuildingInput::from_json(&bad).unwrap().build(false).unwrap_err();
        assert!(matches!(err, InputError::UnknownFilm { .. }));
    }

    #[test]
    fn test_ground_overrides() {
        let input = GroundSettingsInput {
            far_field_width: Some(20.0),
            ..GroundSettingsInput::default()
        };
        let settings = input.to_settings();
        assert_eq!(settings.far_field_width, 20.0);
        assert_eq!(settings.deep_ground_depth, 40.0);
    }

    #[test]
    fn test_every_ground_setting_overridable() {
        let json = r#"{
            "ground": {
                "soil_conductivity": 6.0,
                "soil_density": 1500,
                "soil_specific_heat": 900,
                "ground_solar_absorptivity": 0.8,
                "ground_thermal_absorptivity": 0.85,
                "ground_surface_roughness": 0.1,
                "far_field_width": 30,
                "deep_ground_boundary": "GroundWater",
                "deep_ground_depth": 25,
                "minimum_cell_dimension": 0.05,
                "maximum_cell_growth_coefficient": 2.0,
                "timestep": "Timestep"
            }
        }"#;
        let outcome = BuildingInput::from_json(json).unwrap().build(false).unwrap();
        let settings = outcome.model.ground().settings.clone().unwrap();
        assert!((settings.soil_conductivity - units::k_in_to_si(6.0)).abs() < 1e-12);
        assert_eq!(settings.soil_density, 1500.0);
        assert_eq!(settings.soil_specific_heat, 900.0);
        assert_eq!(settings.ground_solar_absorptivity, 0.8);
        assert_eq!(settings.ground_thermal_absorptivity, 0.85);
        assert_eq!(settings.ground_surface_roughness, 0.1);
        assert_eq!(settings.far_field_width, 30.0);
        assert_eq!(settings.deep_ground_boundary, DeepGroundBoundary::GroundWater);
        assert_eq!(settings.deep_ground_depth, 25.0);
        assert_eq!(settings.minimum_cell_dimension, 0.05);
        assert_eq!(settings.maximum_cell_growth_coefficient, 2.0);
        assert_eq!(settings.timestep, SolutionTimestep::Timestep);
    }

    #[test]
    fn test_unknown_ground_setting_rejected() {
        let json = r#"{ "ground": { "soil_densty": 1500 } }"#;
        assert!(matches!(BuildingInput::from_json(json), Err(InputError::Json(_))));
    }
}
