//! Deduplicating store of materialized (SI) materials.
//!
//! The registry is append-only for the lifetime of one model build. Before a
//! material is added, existing entries of the same kind are searched for one
//! whose defining properties match within [`MaterialRegistry::TOLERANCE`];
//! a match is reused instead of creating a duplicate.

use serde::Serialize;
use tracing::debug;

use crate::construction::material::{Material, OpaqueMaterial};
use crate::units;

/// Default absorptances the engine assumes when none are given.
const DEFAULT_THERMAL_ABSORPTANCE: f64 = 0.9;
const DEFAULT_SOLAR_ABSORPTANCE: f64 = 0.7;
const DEFAULT_VISIBLE_ABSORPTANCE: f64 = 0.7;

/// Handle to a registered material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MaterialId(pub(crate) usize);

impl MaterialId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Material as stored in the simulation model, SI units.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelMaterial {
    StandardOpaque {
        name: String,
        /// m
        thickness: f64,
        /// W/(m·K)
        conductivity: f64,
        /// kg/m³
        density: f64,
        /// J/(kg·K)
        specific_heat: f64,
        thermal_absorptance: Option<f64>,
        solar_absorptance: Option<f64>,
        visible_absorptance: Option<f64>,
    },
    Massless {
        name: String,
        /// m²·K/W
        thermal_resistance: f64,
    },
    SimpleGlazing {
        name: String,
        /// W/(m²·K)
        u_factor: f64,
        shgc: f64,
    },
}

impl ModelMaterial {
    pub fn from_opaque(m: &OpaqueMaterial) -> Self {
        ModelMaterial::StandardOpaque {
            name: m.name.clone(),
            thickness: units::in_to_m(m.thick_in),
            conductivity: units::k_in_to_si(m.k_in),
            density: units::density_to_si(m.rho),
            specific_heat: units::specific_heat_to_si(m.cp),
            thermal_absorptance: m.thermal_absorptance,
            solar_absorptance: m.solar_absorptance,
            visible_absorptance: m.visible_absorptance,
        }
    }

    pub fn from_material(material: &Material) -> Self {
        match material {
            Material::Opaque(m) => Self::from_opaque(m),
            Material::Simple(m) => ModelMaterial::Massless {
                name: m.name.clone(),
                thermal_resistance: units::r_value_to_si(m.r_value),
            },
            Material::Glazing(m) => ModelMaterial::SimpleGlazing {
                name: m.name.clone(),
                u_factor: units::u_factor_to_si(m.u_factor),
                shgc: m.shgc,
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ModelMaterial::StandardOpaque { name, .. }
            | ModelMaterial::Massless { name, .. }
            | ModelMaterial::SimpleGlazing { name, .. } => name,
        }
    }

    /// Resistance of the material as stored (m²·K/W).
    pub fn thermal_resistance(&self) -> f64 {
        match self {
            ModelMaterial::StandardOpaque {
                thickness,
                conductivity,
                ..
            } => thickness / conductivity,
            ModelMaterial::Massless {
                thermal_resistance, ..
            } => *thermal_resistance,
            ModelMaterial::SimpleGlazing { u_factor, .. } => 1.0 / u_factor,
        }
    }

    /// Whether `self`, already registered, can stand in for `candidate`.
    ///
    /// Names are not part of the identity; absorptances are only compared
    /// when the candidate specifies them.
    fn matches(&self, candidate: &ModelMaterial, tol: f64) -> bool {
        let close = |a: f64, b: f64| (a - b).abs() <= tol;
        let close_opt = |existing: Option<f64>, wanted: Option<f64>, default: f64| match wanted {
            None => true,
            Some(w) => close(existing.unwrap_or(default), w),
        };
        match (self, candidate) {
            (
                ModelMaterial::StandardOpaque {
                    thickness: t1,
                    conductivity: k1,
                    density: d1,
                    specific_heat: c1,
                    thermal_absorptance: ta1,
                    solar_absorptance: sa1,
                    visible_absorptance: va1,
                    ..
                },
                ModelMaterial::StandardOpaque {
                    thickness: t2,
                    conductivity: k2,
                    density: d2,
                    specific_heat: c2,
                    thermal_absorptance: ta2,
                    solar_absorptance: sa2,
                    visible_absorptance: va2,
                    ..
                },
            ) => {
                close(*t1, *t2)
                    && close(*k1, *k2)
                    && close(*d1, *d2)
                    && close(*c1, *c2)
                    && close_opt(*ta1, *ta2, DEFAULT_THERMAL_ABSORPTANCE)
                    && close_opt(*sa1, *sa2, DEFAULT_SOLAR_ABSORPTANCE)
                    && close_opt(*va1, *va2, DEFAULT_VISIBLE_ABSORPTANCE)
            }
            (
                ModelMaterial::Massless {
                    thermal_resistance: r1,
                    ..
                },
                ModelMaterial::Massless {
                    thermal_resistance: r2,
                    ..
                },
            ) => close(*r1, *r2),
            (
                ModelMaterial::SimpleGlazing {
                    u_factor: u1,
                    shgc: s1,
                    ..
                },
                ModelMaterial::SimpleGlazing {
                    u_factor: u2,
                    shgc: s2,
                    ..
                },
            ) => close(*u1, *u2) && close(*s1, *s2),
            _ => false,
        }
    }
}

/// Append-only material store owned by a [`Model`](crate::construction::model::Model).
#[derive(Clone, Debug, Default, Serialize)]
pub struct MaterialRegistry {
    materials: Vec<ModelMaterial>,
}

impl MaterialRegistry {
    /// Property tolerance in SI units.
    pub const TOLERANCE: f64 = 1e-4;

    pub fn new() -> Self {
        Self::default()
    }

    /// Finds an existing entry equivalent to `material`.
    pub fn find(&self, material: &ModelMaterial) -> Option<MaterialId> {
        self.materials
            .iter()
            .position(|m| m.matches(material, Self::TOLERANCE))
            .map(MaterialId)
    }

    /// Returns the id of an equivalent entry, registering `material` if
    /// none exists.
    pub fn get_or_insert(&mut self, material: ModelMaterial) -> MaterialId {
        if let Some(id) = self.find(&material) {
            debug!(
                requested = material.name(),
                reused = self.materials[id.0].name(),
                "reusing registered material"
            );
            return id;
        }
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn get(&self, id: MaterialId) -> Option<&ModelMaterial> {
        self.materials.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialId, &ModelMaterial)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialId(i), m))
    }
}
