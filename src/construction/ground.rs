//! Below-grade numerical domain for foundation heat transfer.
//!
//! One set of [`GroundDomainSettings`] applies to the whole model; each
//! foundation carries its own insulation placement. Configuring the domain is
//! idempotent: later calls overwrite the domain-wide settings.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::construction::material::{BaseMaterial, OpaqueMaterial};
use crate::construction::registry::ModelMaterial;
use crate::units;

/// Boundary condition at the bottom of the ground domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeepGroundBoundary {
    ZeroFlux,
    GroundWater,
    Autoselect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolutionTimestep {
    Hourly,
    Timestep,
}

/// Domain-wide soil and meshing parameters, SI units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundDomainSettings {
    /// W/(m·K)
    pub soil_conductivity: f64,
    /// kg/m³
    pub soil_density: f64,
    /// J/(kg·K)
    pub soil_specific_heat: f64,
    pub ground_solar_absorptivity: f64,
    pub ground_thermal_absorptivity: f64,
    /// m
    pub ground_surface_roughness: f64,
    /// m
    pub far_field_width: f64,
    pub deep_ground_boundary: DeepGroundBoundary,
    /// m
    pub deep_ground_depth: f64,
    /// m
    pub minimum_cell_dimension: f64,
    pub maximum_cell_growth_coefficient: f64,
    pub timestep: SolutionTimestep,
}

impl GroundDomainSettings {
    /// Defaults for a given soil conductivity in Btu·in/(hr·ft²·°F).
    pub fn with_soil_conductivity(soil_k_in: f64) -> Self {
        let soil = BaseMaterial::soil();
        Self {
            soil_conductivity: units::k_in_to_si(soil_k_in),
            soil_density: units::density_to_si(soil.rho),
            soil_specific_heat: units::specific_heat_to_si(soil.cp),
            ground_solar_absorptivity: 0.9,
            ground_thermal_absorptivity: 0.9,
            ground_surface_roughness: 0.03,
            far_field_width: 40.0,
            deep_ground_boundary: DeepGroundBoundary::ZeroFlux,
            deep_ground_depth: 40.0,
            minimum_cell_dimension: 0.2,
            maximum_cell_growth_coefficient: 3.0,
            timestep: SolutionTimestep::Hourly,
        }
    }
}

impl Default for GroundDomainSettings {
    fn default() -> Self {
        Self::with_soil_conductivity(BaseMaterial::soil().k_in)
    }
}

/// Where an insulation block sits relative to the wall or slab.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsulationPlacement {
    InteriorHorizontal,
    InteriorVertical,
    ExteriorHorizontal,
    ExteriorVertical,
}

/// A rectangle of rigid insulation in the ground domain.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InsulationBlock {
    pub placement: InsulationPlacement,
    pub material: ModelMaterial,
    /// Depth below the top of the wall or slab, m.
    pub depth: f64,
    /// Horizontal extent from the wall, m (horizontal blocks).
    pub width: f64,
    /// Distance from the top of the foundation wall where the block starts, m.
    pub offset: f64,
}

impl InsulationBlock {
    /// Rigid insulation block of the given R-value (hr·ft²·°F/Btu).
    pub fn rigid(
        name: &str,
        placement: InsulationPlacement,
        r_value: f64,
        depth_ft: f64,
        width_ft: f64,
        offset_ft: f64,
    ) -> Self {
        let material = ModelMaterial::from_opaque(&OpaqueMaterial::rigid_insulation(name, r_value));
        Self {
            placement,
            material,
            depth: units::ft_to_m(depth_ft),
            width: units::ft_to_m(width_ft),
            offset: units::ft_to_m(offset_ft),
        }
    }
}

/// One foundation object that wall and slab surfaces point at.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Foundation {
    pub name: String,
    pub insulation: Vec<InsulationBlock>,
    /// m
    pub wall_height_above_grade: Option<f64>,
    /// m
    pub wall_depth_below_slab: Option<f64>,
}

impl Foundation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            insulation: Vec::new(),
            wall_height_above_grade: None,
            wall_depth_below_slab: None,
        }
    }

    pub fn with_block(mut self, block: InsulationBlock) -> Self {
        self.insulation.push(block);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GroundDomain {
    pub settings: Option<GroundDomainSettings>,
    pub foundations: Vec<Foundation>,
}

impl GroundDomain {
    /// Installs (or replaces) the domain-wide settings.
    pub fn configure(&mut self, settings: GroundDomainSettings) {
        info!(
            soil_conductivity = settings.soil_conductivity,
            far_field_width = settings.far_field_width,
            "configured ground domain"
        );
        self.settings = Some(settings);
    }

    /// Installs default settings if none exist yet.
    pub fn ensure_configured(&mut self) {
        if self.settings.is_none() {
            self.configure(GroundDomainSettings::default());
        }
    }

    pub fn add_foundation(&mut self, foundation: Foundation) -> usize {
        self.foundations.push(foundation);
        self.foundations.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = GroundDomainSettings::default();
        assert!((settings.soil_conductivity - 1.7307).abs() < 1e-3);
        assert_eq!(settings.far_field_width, 40.0);
        assert_eq!(settings.deep_ground_boundary, DeepGroundBoundary::ZeroFlux);
        assert_eq!(settings.timestep, SolutionTimestep::Hourly);
    }

    #[test]
    fn test_configure_overwrites() {
        let mut domain = GroundDomain::default();
        domain.ensure_configured();
        domain.configure(GroundDomainSettings::with_soil_conductivity(6.0));
        domain.ensure_configured();
        let k = domain.settings.as_ref().unwrap().soil_conductivity;
        assert!((k - units::k_in_to_si(6.0)).abs() < 1e-12);
    }

    #[test]
    fn test_rigid_block_units() {
        let block = InsulationBlock::rigid(
            "FoundationExtVertIns",
            InsulationPlacement::ExteriorVertical,
            10.0,
            8.0,
            0.0,
            0.0,
        );
        assert!((block.depth - 2.4384).abs() < 1e-9);
        assert!((block.material.thermal_resistance() - units::r_value_to_si(10.0)).abs() < 1e-4);
    }
}
