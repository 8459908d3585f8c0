//! Material model for layered envelope assemblies.
//!
//! Three kinds of material can appear in an assembly:
//!
//! - [`OpaqueMaterial`]: homogeneous solid with thickness, conductivity,
//!   density and specific heat. R-value is derived as thickness / conductivity.
//! - [`SimpleMaterial`]: massless resistance expressed directly as an R-value.
//!   Air films are simple materials flagged so they are never materialized.
//! - [`GlazingMaterial`]: simple glazing system described by U-factor and SHGC.
//!
//! All values are IP: inches, Btu·in/(hr·ft²·°F), lbm/ft³, Btu/(lbm·°F) and
//! hr·ft²·°F/Btu. Conversion to SI happens in the registry.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PropertyBoundWarning;
use crate::units;

/// Resistance assumed for an unfilled framing cavity (hr·ft²·°F/Btu).
pub const AIR_GAP_R_VALUE: f64 = 1.0;

/// Maximum U-factor the simple glazing model accepts, W/(m²·K).
pub const MAX_GLAZING_U_FACTOR_SI: f64 = 7.0;

/// Density (lbm/ft³) and specific heat (Btu/(lbm·°F)) of still air.
const AIR_DENSITY: f64 = 0.07347;
const AIR_SPECIFIC_HEAT: f64 = 0.2402;

/// Property table entry a layer material can be scaled from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BaseMaterial {
    /// Density in lbm/ft³.
    pub rho: f64,
    /// Specific heat in Btu/(lbm·°F).
    pub cp: f64,
    /// Nominal conductivity in Btu·in/(hr·ft²·°F).
    pub k_in: f64,
}

impl BaseMaterial {
    /// Softwood framing lumber (R-1.25/in).
    pub const fn wood() -> Self {
        Self {
            rho: 32.0,
            cp: 0.29,
            k_in: 0.8004,
        }
    }

    /// Gypsum board.
    pub const fn gypsum() -> Self {
        Self {
            rho: 50.0,
            cp: 0.2,
            k_in: 1.1112,
        }
    }

    /// Normal weight concrete.
    pub const fn concrete() -> Self {
        Self {
            rho: 140.0,
            cp: 0.2,
            k_in: 9.0912,
        }
    }

    /// Rigid foam board (R-4.9/in).
    pub const fn insulation_rigid() -> Self {
        Self {
            rho: 2.0,
            cp: 0.29,
            k_in: 0.204,
        }
    }

    /// Dense-pack cavity insulation. Conductivity is normally overridden from
    /// the target cavity R-value.
    pub const fn insulation_densepack() -> Self {
        Self {
            rho: 2.2,
            cp: 0.25,
            k_in: 0.2667,
        }
    }

    /// Loose-fill attic insulation.
    pub const fn insulation_loosefill() -> Self {
        Self {
            rho: 0.5,
            cp: 0.25,
            k_in: 0.3448,
        }
    }

    pub const fn soil() -> Self {
        Self {
            rho: 115.0,
            cp: 0.1,
            k_in: 12.0,
        }
    }

    pub const fn steel() -> Self {
        Self {
            rho: 490.0,
            cp: 0.12,
            k_in: 312.0,
        }
    }

    /// Lightweight furniture, treated as wood.
    pub const fn furniture() -> Self {
        Self {
            rho: 40.0,
            cp: 0.29,
            k_in: 0.8004,
        }
    }

    /// Still air. Conductivity is a placeholder; air cavities use
    /// [`AIR_GAP_R_VALUE`].
    pub const fn air() -> Self {
        Self {
            rho: AIR_DENSITY,
            cp: AIR_SPECIFIC_HEAT,
            k_in: 0.1751,
        }
    }

    pub const fn aluminum() -> Self {
        Self {
            rho: 168.6,
            cp: 0.22,
            k_in: 1600.0,
        }
    }

    pub const fn carpet() -> Self {
        Self {
            rho: 3.4,
            cp: 0.32,
            k_in: 0.4,
        }
    }
}

/// A homogeneous opaque layer material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpaqueMaterial {
    pub name: String,
    /// Thickness in inches.
    pub thick_in: f64,
    /// Conductivity in Btu·in/(hr·ft²·°F).
    pub k_in: f64,
    /// Density in lbm/ft³.
    pub rho: f64,
    /// Specific heat in Btu/(lbm·°F).
    pub cp: f64,
    #[serde(default)]
    pub thermal_absorptance: Option<f64>,
    #[serde(default)]
    pub solar_absorptance: Option<f64>,
    #[serde(default)]
    pub visible_absorptance: Option<f64>,
}

impl OpaqueMaterial {
    pub fn new(name: impl Into<String>, thick_in: f64, k_in: f64, rho: f64, cp: f64) -> Self {
        Self {
            name: name.into(),
            thick_in,
            k_in,
            rho,
            cp,
            thermal_absorptance: None,
            solar_absorptance: None,
            visible_absorptance: None,
        }
    }

    /// Scales a base material to the given thickness.
    pub fn from_base(name: impl Into<String>, thick_in: f64, base: BaseMaterial) -> Self {
        Self::new(name, thick_in, base.k_in, base.rho, base.cp)
    }

    /// Scales a base material to the given thickness, overriding conductivity
    /// so the layer has exactly `r_value`.
    pub fn from_base_with_r(
        name: impl Into<String>,
        thick_in: f64,
        base: BaseMaterial,
        r_value: f64,
    ) -> Self {
        Self::new(name, thick_in, thick_in / r_value, base.rho, base.cp)
    }

    /// Sets surface absorptances.
    pub fn with_absorptances(
        mut self,
        thermal: Option<f64>,
        solar: Option<f64>,
        visible: Option<f64>,
    ) -> Self {
        self.thermal_absorptance = thermal;
        self.solar_absorptance = solar;
        self.visible_absorptance = visible;
        self
    }

    /// Thermal resistance (hr·ft²·°F/Btu): R = δ / k.
    pub fn r_value(&self) -> f64 {
        self.thick_in / self.k_in
    }

    /// Heat capacity per unit area, Btu/(ft²·°F).
    pub fn heat_capacity_per_area(&self) -> f64 {
        self.rho * self.cp * self.thick_in / 12.0
    }

    pub fn gypsum_wall(thick_in: f64) -> Self {
        Self::from_base("GypsumBoard", thick_in, BaseMaterial::gypsum())
    }

    pub fn gypsum_ceiling(thick_in: f64) -> Self {
        Self::from_base("GypsumBoardCeiling", thick_in, BaseMaterial::gypsum())
    }

    pub fn osb(name: impl Into<String>, thick_in: f64) -> Self {
        Self::from_base(name, thick_in, BaseMaterial::wood())
    }

    pub fn plywood(thick_in: f64) -> Self {
        Self::from_base("Plywood", thick_in, BaseMaterial::wood())
    }

    pub fn concrete(name: impl Into<String>, thick_in: f64) -> Self {
        Self::from_base(name, thick_in, BaseMaterial::concrete())
    }

    /// Continuous rigid foam of the given R-value; thickness follows from the
    /// nominal board conductivity.
    pub fn rigid_insulation(name: impl Into<String>, r_value: f64) -> Self {
        let base = BaseMaterial::insulation_rigid();
        let thick_in = r_value * base.k_in;
        Self::from_base_with_r(name, thick_in, base, r_value)
    }

    /// Enclosed, unvented air space inside a framing cavity.
    pub fn air_cavity_closed(thick_in: f64) -> Self {
        Self::from_base_with_r("AirCavityClosed", thick_in, BaseMaterial::air(), AIR_GAP_R_VALUE)
    }

    /// Air space open to an attic or crawlspace.
    pub fn air_cavity_open(thick_in: f64) -> Self {
        Self::from_base_with_r("AirCavityOpen", thick_in, BaseMaterial::air(), AIR_GAP_R_VALUE)
    }

    /// Foil radiant barrier on the underside of a roof deck.
    pub fn radiant_barrier() -> Self {
        Self::from_base("RadiantBarrier", 0.0084, BaseMaterial::aluminum()).with_absorptances(
            Some(0.05),
            Some(0.05),
            Some(0.05),
        )
    }

    /// Floor covering (carpet, tile) of a given R-value.
    pub fn floor_covering(thick_in: f64, r_value: f64) -> Self {
        Self::from_base_with_r("FloorCovering", thick_in, BaseMaterial::carpet(), r_value)
    }
}

/// Massless resistance layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimpleMaterial {
    pub name: String,
    /// R-value in hr·ft²·°F/Btu.
    pub r_value: f64,
    /// Air films contribute resistance but are not written to the model.
    #[serde(default)]
    pub air_film: bool,
}

impl SimpleMaterial {
    pub fn new(name: impl Into<String>, r_value: f64) -> Self {
        Self {
            name: name.into(),
            r_value,
            air_film: false,
        }
    }

    fn film(name: &str, r_value: f64) -> Self {
        Self {
            name: name.to_string(),
            r_value,
            air_film: true,
        }
    }

    /// Exterior surface, moving air.
    pub fn air_film_outside() -> Self {
        Self::film("AirFilmOutside", 0.197)
    }

    /// Still air, vertical surface, horizontal heat flow.
    pub fn air_film_vertical() -> Self {
        Self::film("AirFilmVertical", 0.68)
    }

    /// Still air, horizontal surface, heat flow upward.
    pub fn air_film_flat_enhanced() -> Self {
        Self::film("AirFilmFlatEnhanced", 0.61)
    }

    /// Still air, horizontal surface, heat flow downward.
    pub fn air_film_flat_reduced() -> Self {
        Self::film("AirFilmFlatReduced", 0.92)
    }

    /// Still air, 45° surface, heat flow upward.
    pub fn air_film_slope_enhanced() -> Self {
        Self::film("AirFilmSlopeEnhanced", 0.62)
    }

    /// Still air, 45° surface, heat flow downward.
    pub fn air_film_slope_reduced() -> Self {
        Self::film("AirFilmSlopeReduced", 0.76)
    }

    /// Mean of the upward and downward flat films, used for floors that see
    /// heat flow in both directions over a year.
    pub fn air_film_floor_average() -> Self {
        Self::film("AirFilmFloorAverage", (0.61 + 0.92) / 2.0)
    }

    /// Looks an air film up by its name.
    pub fn air_film_by_name(name: &str) -> Option<Self> {
        let film = match name {
            "AirFilmOutside" | "outside" => Self::air_film_outside(),
            "AirFilmVertical" | "vertical" => Self::air_film_vertical(),
            "AirFilmFlatEnhanced" | "flat_enhanced" => Self::air_film_flat_enhanced(),
            "AirFilmFlatReduced" | "flat_reduced" => Self::air_film_flat_reduced(),
            "AirFilmSlopeEnhanced" | "slope_enhanced" => Self::air_film_slope_enhanced(),
            "AirFilmSlopeReduced" | "slope_reduced" => Self::air_film_slope_reduced(),
            "AirFilmFloorAverage" | "floor_average" => Self::air_film_floor_average(),
            _ => return None,
        };
        Some(film)
    }
}

/// Simple glazing system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlazingMaterial {
    pub name: String,
    /// U-factor in Btu/(hr·ft²·°F), air films included.
    pub u_factor: f64,
    pub shgc: f64,
}

impl GlazingMaterial {
    /// Creates a glazing material, clipping the U-factor to the simple glazing
    /// limit. A clip is logged; use [`GlazingMaterial::bounded`] to also
    /// receive the warning.
    pub fn new(name: impl Into<String>, u_factor: f64, shgc: f64) -> Self {
        Self::bounded(name, u_factor, shgc).0
    }

    /// Creates a glazing material and reports whether the U-factor had to be
    /// clipped.
    pub fn bounded(
        name: impl Into<String>,
        u_factor: f64,
        shgc: f64,
    ) -> (Self, Option<PropertyBoundWarning>) {
        let name = name.into();
        let u_si = units::u_factor_to_si(u_factor);
        if u_si <= MAX_GLAZING_U_FACTOR_SI {
            return (
                Self {
                    name,
                    u_factor,
                    shgc,
                },
                None,
            );
        }

        let warning = PropertyBoundWarning {
            material: name.clone(),
            property: "U-factor",
            value: u_si,
            bound: MAX_GLAZING_U_FACTOR_SI,
        };
        warn!(%warning, "glazing U-factor clipped");
        let glazing = Self {
            name,
            u_factor: units::u_factor_to_ip(MAX_GLAZING_U_FACTOR_SI),
            shgc,
        };
        (glazing, Some(warning))
    }

    /// Effective resistance, 1 / U (hr·ft²·°F/Btu).
    pub fn r_value(&self) -> f64 {
        1.0 / self.u_factor
    }
}

/// Any material that can occupy a layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Material {
    Opaque(OpaqueMaterial),
    Simple(SimpleMaterial),
    Glazing(GlazingMaterial),
}

impl Material {
    pub fn name(&self) -> &str {
        match self {
            Material::Opaque(m) => &m.name,
            Material::Simple(m) => &m.name,
            Material::Glazing(m) => &m.name,
        }
    }

    /// Resistance in hr·ft²·°F/Btu.
    pub fn r_value(&self) -> f64 {
        match self {
            Material::Opaque(m) => m.r_value(),
            Material::Simple(m) => m.r_value,
            Material::Glazing(m) => m.r_value(),
        }
    }

    /// Thickness in inches; massless and glazing materials have none.
    pub fn thick_in(&self) -> Option<f64> {
        match self {
            Material::Opaque(m) => Some(m.thick_in),
            Material::Simple(_) | Material::Glazing(_) => None,
        }
    }

    pub fn is_glazing(&self) -> bool {
        matches!(self, Material::Glazing(_))
    }

    pub fn is_air_film(&self) -> bool {
        matches!(self, Material::Simple(SimpleMaterial { air_film: true, .. }))
    }
}

impl From<OpaqueMaterial> for Material {
    fn from(m: OpaqueMaterial) -> Self {
        Material::Opaque(m)
    }
}

impl From<SimpleMaterial> for Material {
    fn from(m: SimpleMaterial) -> Self {
        Material::Simple(m)
    }
}

impl From<GlazingMaterial> for Material {
    fn from(m: GlazingMaterial) -> Self {
        Material::Glazing(m)
    }
}

/// Exterior finish (siding, roofing) as supplied by the building description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExteriorFinish {
    #[serde(default = "ExteriorFinish::default_name")]
    pub name: String,
    pub thick_in: f64,
    pub k_in: f64,
    pub rho: f64,
    pub cp: f64,
    #[serde(default)]
    pub solar_absorptance: Option<f64>,
    #[serde(default)]
    pub thermal_absorptance: Option<f64>,
}

impl ExteriorFinish {
    fn default_name() -> String {
        "ExteriorFinish".to_string()
    }

    pub fn to_material(&self) -> OpaqueMaterial {
        OpaqueMaterial::new(self.name.clone(), self.thick_in, self.k_in, self.rho, self.cp)
            .with_absorptances(self.thermal_absorptance, self.solar_absorptance, None)
    }
}

/// Air films on either face of an assembly.
#[derive(Clone, Debug, PartialEq)]
pub struct Films {
    pub outside: SimpleMaterial,
    pub inside: SimpleMaterial,
}

impl Films {
    pub fn new(outside: SimpleMaterial, inside: SimpleMaterial) -> Self {
        Self { outside, inside }
    }

    /// Exterior wall: moving air outside, vertical still air inside.
    pub fn exterior_wall() -> Self {
        Self::new(
            SimpleMaterial::air_film_outside(),
            SimpleMaterial::air_film_vertical(),
        )
    }

    /// Wall between two indoor spaces.
    pub fn interior_wall() -> Self {
        Self::new(
            SimpleMaterial::air_film_vertical(),
            SimpleMaterial::air_film_vertical(),
        )
    }

    /// Pitched roof deck.
    pub fn roof() -> Self {
        Self::new(
            SimpleMaterial::air_film_outside(),
            SimpleMaterial::air_film_slope_enhanced(),
        )
    }

    /// Ceiling below an attic.
    pub fn ceiling() -> Self {
        Self::new(
            SimpleMaterial::air_film_flat_reduced(),
            SimpleMaterial::air_film_flat_enhanced(),
        )
    }

    /// Floor over a crawlspace, garage or outdoors.
    pub fn floor() -> Self {
        Self::new(
            SimpleMaterial::air_film_floor_average(),
            SimpleMaterial::air_film_floor_average(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_opaque_r_value() {
        let stud = OpaqueMaterial::from_base("Stud", 3.5, BaseMaterial::wood());
        assert!((stud.r_value() - 3.5 / 0.8004).abs() < EPSILON);
    }

    #[test]
    fn test_from_base_with_r_hits_target() {
        let cavity =
            OpaqueMaterial::from_base_with_r("Cavity", 3.5, BaseMaterial::insulation_densepack(), 13.0);
        assert!((cavity.r_value() - 13.0).abs() < EPSILON);
        assert_eq!(cavity.rho, 2.2);
    }

    #[test]
    fn test_rigid_insulation_thickness_from_r() {
        let rigid = OpaqueMaterial::rigid_insulation("Rigid", 5.0);
        assert!((rigid.thick_in - 5.0 * 0.204).abs() < EPSILON);
        assert!((rigid.r_value() - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_air_cavity_resistance() {
        let gap = OpaqueMaterial::air_cavity_closed(5.5);
        assert!((gap.r_value() - AIR_GAP_R_VALUE).abs() < EPSILON);
    }

    #[test]
    fn test_air_film_flag() {
        let film: Material = SimpleMaterial::air_film_vertical().into();
        assert!(film.is_air_film());
        let plain: Material = SimpleMaterial::new("Resistance", 2.0).into();
        assert!(!plain.is_air_film());
    }

    #[test]
    fn test_air_film_lookup() {
        assert_eq!(
            SimpleMaterial::air_film_by_name("vertical"),
            Some(SimpleMaterial::air_film_vertical())
        );
        assert!(SimpleMaterial::air_film_by_name("bogus").is_none());
    }

    #[test]
    fn test_glazing_within_bound() {
        let (glazing, warning) = GlazingMaterial::bounded("Window", 0.35, 0.44);
        assert!(warning.is_none());
        assert_eq!(glazing.u_factor, 0.35);
    }

    #[test]
    fn test_glazing_clipped_above_bound() {
        // 1.5 Btu/hr·ft²·°F is about 8.5 W/m²K
        let (glazing, warning) = GlazingMaterial::bounded("Window", 1.5, 0.7);
        let warning = warning.expect("expected a clip warning");
        assert_eq!(warning.bound, MAX_GLAZING_U_FACTOR_SI);
        assert!(warning.value > MAX_GLAZING_U_FACTOR_SI);
        assert!((units::u_factor_to_si(glazing.u_factor) - MAX_GLAZING_U_FACTOR_SI).abs() < 1e-9);
    }

    #[test]
    fn test_material_thickness_by_kind() {
        let glazing: Material = GlazingMaterial::new("Window", 0.3, 0.4).into();
        assert_eq!(glazing.thick_in(), None);
        let drywall: Material = OpaqueMaterial::gypsum_wall(0.5).into();
        assert_eq!(drywall.thick_in(), Some(0.5));
    }
}
