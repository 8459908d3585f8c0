//! Model-build context shared by every builder.
//!
//! A [`Model`] owns the material registry, the constructions created so far,
//! the surfaces they are assigned to and the auxiliary objects some builders
//! produce (shading controls, season schedules, the ground domain). It is
//! created by the caller for one build and passed by `&mut` into every
//! builder; nothing here is global.

use std::collections::HashMap;

use serde::Serialize;

use crate::construction::ground::GroundDomain;
use crate::construction::registry::{MaterialId, MaterialRegistry, ModelMaterial};
use crate::error::{ConstructionError, PropertyBoundWarning};
use crate::units;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SurfaceId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConstructionId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ShadeId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ScheduleId(pub(crate) usize);

impl SurfaceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl ConstructionId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a construction is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    /// Wall, roof, floor or slab.
    Opaque,
    /// Window, skylight or door.
    SubSurface,
    /// Internal mass definition (partitions, furniture).
    InternalMass,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Surface {
    pub name: String,
    pub kind: SurfaceKind,
    /// m²
    pub area: f64,
    /// Surface on the other side, for interzonal surfaces.
    pub adjacent: Option<SurfaceId>,
    pub construction: Option<ConstructionId>,
    /// Index into [`GroundDomain::foundations`].
    pub foundation: Option<usize>,
    /// Exposed slab perimeter, m.
    pub exposed_perimeter: Option<f64>,
    pub shading_controls: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Construction {
    pub name: String,
    /// Outside to inside.
    pub layers: Vec<MaterialId>,
    /// Assembly R-value including air films, hr·ft²·°F/Btu.
    pub r_value: f64,
    /// Set on constructions generated by [`Model::reverse_construction`].
    pub reverse_of: Option<ConstructionId>,
}

/// Shading material for interior window shades.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Shade {
    pub name: String,
    pub solar_transmittance: f64,
    pub visible_transmittance: f64,
}

/// On/off schedule by month.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeasonSchedule {
    pub name: String,
    pub months: [bool; 12],
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShadingControl {
    pub name: String,
    pub shading_type: &'static str,
    pub shade: ShadeId,
    pub schedule: ScheduleId,
}

#[derive(Debug, Default)]
pub struct Model {
    registry: MaterialRegistry,
    constructions: Vec<Construction>,
    reversed: HashMap<ConstructionId, ConstructionId>,
    surfaces: Vec<Surface>,
    shades: Vec<Shade>,
    schedules: Vec<SeasonSchedule>,
    shading_controls: Vec<ShadingControl>,
    ground: GroundDomain,
    warnings: Vec<PropertyBoundWarning>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MaterialRegistry {
        &mut self.registry
    }

    pub fn add_surface(&mut self, name: impl Into<String>, kind: SurfaceKind, area_m2: f64) -> SurfaceId {
        self.surfaces.push(Surface {
            name: name.into(),
            kind,
            area: area_m2,
            adjacent: None,
            construction: None,
            foundation: None,
            exposed_perimeter: None,
            shading_controls: Vec::new(),
        });
        SurfaceId(self.surfaces.len() - 1)
    }

    /// Links two surfaces as the two faces of one interzonal partition.
    pub fn set_adjacent(&mut self, a: SurfaceId, b: SurfaceId) -> Result<(), ConstructionError> {
        self.check_surfaces(&[a, b])?;
        self.surfaces[a.0].adjacent = Some(b);
        self.surfaces[b.0].adjacent = Some(a);
        Ok(())
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(id.0)
    }

    pub(crate) fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut Surface> {
        self.surfaces.get_mut(id.0)
    }

    pub fn find_surface(&self, name: &str) -> Option<SurfaceId> {
        self.surfaces.iter().position(|s| s.name == name).map(SurfaceId)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (SurfaceId, &Surface)> {
        self.surfaces.iter().enumerate().map(|(i, s)| (SurfaceId(i), s))
    }

    pub fn check_surfaces(&self, ids: &[SurfaceId]) -> Result<(), ConstructionError> {
        match ids.iter().find(|id| id.0 >= self.surfaces.len()) {
            Some(id) => Err(ConstructionError::UnknownSurface(id.0)),
            None => Ok(()),
        }
    }

    pub fn construction(&self, id: ConstructionId) -> Option<&Construction> {
        self.constructions.get(id.0)
    }

    pub fn constructions(&self) -> impl Iterator<Item = (ConstructionId, &Construction)> {
        self.constructions
            .iter()
            .enumerate()
            .map(|(i, c)| (ConstructionId(i), c))
    }

    pub fn find_construction(&self, name: &str) -> Option<ConstructionId> {
        self.constructions
            .iter()
            .position(|c| c.name == name)
            .map(ConstructionId)
    }

    pub(crate) fn add_construction(
        &mut self,
        name: String,
        layers: Vec<MaterialId>,
        r_value: f64,
    ) -> ConstructionId {
        self.constructions.push(Construction {
            name,
            layers,
            r_value,
            reverse_of: None,
        });
        ConstructionId(self.constructions.len() - 1)
    }

    /// The layer-reversed twin of `id`, created on first request.
    ///
    /// Returns `None` when `id` is not a construction of this model.
    pub fn reverse_construction(&mut self, id: ConstructionId) -> Option<ConstructionId> {
        if let Some(&rev) = self.reversed.get(&id) {
            return Some(rev);
        }
        let original = self.constructions.get(id.0)?;
        let reversed = Construction {
            name: format!("{} Reversed", original.name),
            layers: original.layers.iter().rev().copied().collect(),
            r_value: original.r_value,
            reverse_of: Some(id),
        };
        self.constructions.push(reversed);
        let rev = ConstructionId(self.constructions.len() - 1);
        self.reversed.insert(id, rev);
        Some(rev)
    }

    /// Assigns `id` to each surface. Opaque surfaces with an adjacent surface
    /// pass the reversed construction to their neighbour.
    pub fn assign_construction(
        &mut self,
        id: ConstructionId,
        surfaces: &[SurfaceId],
    ) -> Result<(), ConstructionError> {
        self.check_surfaces(surfaces)?;
        if self.construction(id).is_none() {
            return Err(ConstructionError::UnknownConstruction(id.0));
        }
        for &sid in surfaces {
            let surface = &mut self.surfaces[sid.0];
            surface.construction = Some(id);
            if surface.kind != SurfaceKind::Opaque {
                continue;
            }
            let Some(adjacent) = surface.adjacent else {
                continue;
            };
            let rev = self.reverse_construction(id);
            self.surfaces[adjacent.0].construction = rev;
        }
        Ok(())
    }

    pub fn shades(&self) -> &[Shade] {
        &self.shades
    }

    /// Returns a shade with the given transmittance, creating one if needed.
    pub(crate) fn get_or_add_shade(&mut self, name: &str, transmittance: f64) -> ShadeId {
        let tol = MaterialRegistry::TOLERANCE;
        if let Some(i) = self.shades.iter().position(|s| {
            (s.solar_transmittance - transmittance).abs() <= tol
                && (s.visible_transmittance - transmittance).abs() <= tol
        }) {
            return ShadeId(i);
        }
        self.shades.push(Shade {
            name: name.to_string(),
            solar_transmittance: transmittance,
            visible_transmittance: transmittance,
        });
        ShadeId(self.shades.len() - 1)
    }

    pub fn schedules(&self) -> &[SeasonSchedule] {
        &self.schedules
    }

    /// Returns the schedule with this name, creating it if needed.
    pub(crate) fn get_or_add_schedule(&mut self, name: &str, months: [bool; 12]) -> ScheduleId {
        if let Some(i) = self.schedules.iter().position(|s| s.name == name && s.months == months) {
            return ScheduleId(i);
        }
        self.schedules.push(SeasonSchedule {
            name: name.to_string(),
            months,
        });
        ScheduleId(self.schedules.len() - 1)
    }

    pub fn shading_controls(&self) -> &[ShadingControl] {
        &self.shading_controls
    }

    pub(crate) fn add_shading_control(&mut self, control: ShadingControl) -> usize {
        self.shading_controls.push(control);
        self.shading_controls.len() - 1
    }

    pub fn ground(&self) -> &GroundDomain {
        &self.ground
    }

    pub fn ground_mut(&mut self) -> &mut GroundDomain {
        &mut self.ground
    }

    pub fn record_warning(&mut self, warning: PropertyBoundWarning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[PropertyBoundWarning] {
        &self.warnings
    }

    /// Serializable snapshot of everything built so far.
    pub fn summary(&self) -> ModelSummary {
        let material_name = |id: &MaterialId| {
            self.registry
                .get(*id)
                .map(|m| m.name().to_string())
                .unwrap_or_default()
        };
        ModelSummary {
            materials: self.registry.iter().map(|(_, m)| m.clone()).collect(),
            constructions: self
                .constructions
                .iter()
                .map(|c| ConstructionSummary {
                    name: c.name.clone(),
                    layers: c.layers.iter().map(material_name).collect(),
                    r_value_ip: c.r_value,
                    r_value_si: units::r_value_to_si(c.r_value),
                })
                .collect(),
            surfaces: self
                .surfaces
                .iter()
                .map(|s| SurfaceSummary {
                    name: s.name.clone(),
                    kind: s.kind,
                    construction: s
                        .construction
                        .and_then(|id| self.construction(id))
                        .map(|c| c.name.clone()),
                    foundation: s
                        .foundation
                        .and_then(|i| self.ground.foundations.get(i))
                        .map(|f| f.name.clone()),
                    shading_controls: s
                        .shading_controls
                        .iter()
                        .filter_map(|&i| self.shading_controls.get(i))
                        .map(|c| c.name.clone())
                        .collect(),
                })
                .collect(),
            shades: self.shades.clone(),
            schedules: self.schedules.clone(),
            ground: self.ground.clone(),
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ConstructionSummary {
    pub name: String,
    pub layers: Vec<String>,
    pub r_value_ip: f64,
    pub r_value_si: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SurfaceSummary {
    pub name: String,
    pub kind: SurfaceKind,
    pub construction: Option<String>,
    pub foundation: Option<String>,
    pub shading_controls: Vec<String>,
}

/// JSON output of a model build.
#[derive(Clone, Debug, Serialize)]
pub struct ModelSummary {
    pub materials: Vec<ModelMaterial>,
    pub constructions: Vec<ConstructionSummary>,
    pub surfaces: Vec<SurfaceSummary>,
    pub shades: Vec<Shade>,
    pub schedules: Vec<SeasonSchedule>,
    pub ground: GroundDomain,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_construction_created_once() {
        let mut model = Model::new();
        let a = model.add_surface("Wall A", SurfaceKind::Opaque, 10.0);
        let b = model.add_surface("Wall B", SurfaceKind::Opaque, 10.0);
        let c = model.add_surface("Wall C", SurfaceKind::Opaque, 10.0);
        let d = model.add_surface("Wall D", SurfaceKind::Opaque, 10.0);
        model.set_adjacent(a, b).unwrap();
        model.set_adjacent(c, d).unwrap();

        let m1 = model.registry_mut().get_or_insert(ModelMaterial::Massless {
            name: "Outer".into(),
            thermal_resistance: 0.5,
        });
        let m2 = model.registry_mut().get_or_insert(ModelMaterial::Massless {
            name: "Inner".into(),
            thermal_resistance: 1.0,
        });
        let id = model.add_construction("Partition".into(), vec![m1, m2], 8.5);
        model.assign_construction(id, &[a, c]).unwrap();

        let rev_b = model.surface(b).unwrap().construction.unwrap();
        let rev_d = model.surface(d).unwrap().construction.unwrap();
        assert_eq!(rev_b, rev_d);
        assert_eq!(model.construction(rev_b).unwrap().layers, vec![m2, m1]);
        assert_eq!(model.constructions().count(), 2);
    }

    #[test]
    fn test_unknown_construction_rejected() {
        let mut model = Model::new();
        let a = model.add_surface("Wall A", SurfaceKind::Opaque, 10.0);
        assert_eq!(model.reverse_construction(ConstructionId(7)), None);
        assert!(matches!(
            model.assign_construction(ConstructionId(7), &[a]),
            Err(ConstructionError::UnknownConstruction(7))
        ));
        assert_eq!(model.surface(a).unwrap().construction, None);
    }

    #[test]
    fn test_subsurfaces_do_not_propagate() {
        let mut model = Model::new();
        let door = model.add_surface("Door", SurfaceKind::SubSurface, 2.0);
        let other = model.add_surface("Door Other Side", SurfaceKind::SubSurface, 2.0);
        model.set_adjacent(door, other).unwrap();
        let id = model.add_construction("Door".into(), vec![], 2.0);
        model.assign_construction(id, &[door]).unwrap();
        assert_eq!(model.surface(other).unwrap().construction, None);
    }

    #[test]
    fn test_unknown_surface_rejected() {
        let mut model = Model::new();
        let id = model.add_construction("Wall".into(), vec![], 2.0);
        assert_eq!(
            model.assign_construction(id, &[SurfaceId(3)]),
            Err(ConstructionError::UnknownSurface(3))
        );
    }

    #[test]
    fn test_shades_reused_by_transmittance() {
        let mut model = Model::new();
        let a = model.get_or_add_shade("WindowShade", 0.7);
        let b = model.get_or_add_shade("SkylightShade", 0.7);
        let c = model.get_or_add_shade("WindowShade", 0.85);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(model.shades().len(), 2);
    }
}
