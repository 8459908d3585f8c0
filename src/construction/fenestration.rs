//! Doors, windows and skylights.
//!
//! Windows and skylights are a single simple-glazing layer. Interior shades
//! are not part of the construction: each shaded surface gets shading
//! controls tied to a heating- or cooling-season schedule.

use serde::{Deserialize, Serialize};

use crate::construction::assembly::AssemblyBuilder;
use crate::construction::material::{BaseMaterial, Films, GlazingMaterial, OpaqueMaterial};
use crate::construction::model::{ConstructionId, Model, ShadingControl, SurfaceId};
use crate::construction::walls::check_positive;
use crate::error::ConstructionError;

/// Nominal door slab thickness (in).
pub const DOOR_THICK_IN: f64 = 1.75;

/// Skylight ratings are at a 20° slope; vertical-equivalent U-factors are
/// this much higher.
pub const SKYLIGHT_U_FACTOR_RATIO: f64 = 1.2;

/// Default cooling season: May through September.
pub const DEFAULT_COOLING_SEASON: [bool; 12] = [
    false, false, false, false, true, true, true, true, true, false, false, false,
];

fn one() -> f64 {
    1.0
}

/// Opaque exterior door.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Door {
    /// Whole-door U-factor, air films included.
    pub u_factor: f64,
}

/// Door as one opaque slab whose conductivity reproduces the target U-factor
/// once the air films are added back.
pub fn apply_door(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    door: &Door,
    films: &Films,
) -> Result<Option<ConstructionId>, ConstructionError> {
    const ARCHETYPE: &str = "door";
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_positive(ARCHETYPE, "U-factor", door.u_factor)?;
    let film_r = films.outside.r_value + films.inside.r_value;
    let slab_r = 1.0 / door.u_factor - film_r;
    if slab_r <= 0.0 {
        return Err(ConstructionError::builder(
            ARCHETYPE,
            format!(
                "U-factor {} leaves no resistance after the air films ({film_r})",
                door.u_factor
            ),
        ));
    }

    let wood = BaseMaterial::wood();
    let slab = OpaqueMaterial::new("DoorMaterial", DOOR_THICK_IN, DOOR_THICK_IN / slab_r, wood.rho, wood.cp);
    let assembly = AssemblyBuilder::new(name, vec![1.0])
        .layer(films.outside.clone())
        .layer(slab)
        .layer(films.inside.clone())
        .build()?;

    assembly.create_and_assign(model, surfaces).map(Some)
}

/// Simple-glazing window or skylight with optional interior shades.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Btu/(hr·ft²·°F); for skylights, the vertical-equivalent rating.
    pub u_factor: f64,
    pub shgc: f64,
    /// Fraction of solar gain admitted by interior shades in winter.
    #[serde(default = "one")]
    pub heating_shade_multiplier: f64,
    #[serde(default = "one")]
    pub cooling_shade_multiplier: f64,
}

/// Vertical window, one glazing layer plus seasonal shade controls.
pub fn apply_window(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    window: &Window,
    cooling_season: &[bool; 12],
) -> Result<Option<ConstructionId>, ConstructionError> {
    apply_glazing(model, surfaces, name, "window", "WindowMaterial", window.u_factor, window, cooling_season)
}

/// Skylight; the rated U-factor is converted to the 20° mounting before
/// materialization.
pub fn apply_skylight(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    skylight: &Window,
    cooling_season: &[bool; 12],
) -> Result<Option<ConstructionId>, ConstructionError> {
    let u_factor = skylight_u_factor(skylight.u_factor);
    apply_glazing(model, surfaces, name, "skylight", "SkylightMaterial", u_factor, skylight, cooling_season)
}

/// Converts a vertical-equivalent rating to the skylight mounting.
pub fn skylight_u_factor(vertical_u_factor: f64) -> f64 {
    vertical_u_factor / SKYLIGHT_U_FACTOR_RATIO
}

#[allow(clippy::too_many_arguments)]
fn apply_glazing(
    model: &mut Model,
    surfaces: &[SurfaceId],
    name: &str,
    archetype: &'static str,
    material_name: &str,
    u_factor: f64,
    window: &Window,
    cooling_season: &[bool; 12],
) -> Result<Option<ConstructionId>, ConstructionError> {
    if surfaces.is_empty() {
        return Ok(None);
    }
    check_positive(archetype, "U-factor", u_factor)?;
    if !(0.0..=1.0).contains(&window.shgc) {
        return Err(ConstructionError::builder(
            archetype,
            format!("SHGC must be within [0, 1], got {}", window.shgc),
        ));
    }
    for multiplier in [window.heating_shade_multiplier, window.cooling_shade_multiplier] {
        if !(0.0..=1.0).contains(&multiplier) {
            return Err(ConstructionError::builder(
                archetype,
                format!("shade multiplier must be within [0, 1], got {multiplier}"),
            ));
        }
    }

    let (glazing, warning) = GlazingMaterial::bounded(material_name, u_factor, window.shgc);
    let assembly = AssemblyBuilder::new(name, vec![1.0]).layer(glazing).build()?;
    let id = assembly.create_and_assign(model, surfaces)?;
    if let Some(warning) = warning {
        model.record_warning(warning);
    }

    let heating_season = cooling_season.map(|cooling| !cooling);
    let seasons = [
        ("Heating", window.heating_shade_multiplier, heating_season),
        ("Cooling", window.cooling_shade_multiplier, *cooling_season),
    ];
    for (season, multiplier, months) in seasons {
        if multiplier >= 1.0 {
            continue;
        }
        apply_shading(model, surfaces, archetype, season, multiplier, months);
    }
    Ok(Some(id))
}

/// Adds one interior-shade control per surface for the given season.
fn apply_shading(
    model: &mut Model,
    surfaces: &[SurfaceId],
    archetype: &str,
    season: &str,
    transmittance: f64,
    months: [bool; 12],
) {
    let shade = model.get_or_add_shade(&format!("{season}Shade"), transmittance);
    let schedule = model.get_or_add_schedule(&format!("{season}Season"), months);
    for &sid in surfaces {
        let Some(surface_name) = model.surface(sid).map(|s| s.name.clone()) else {
            continue;
        };
        let control = model.add_shading_control(ShadingControl {
            name: format!("{surface_name} {season} {archetype} Shading"),
            shading_type: "InteriorShade",
            shade,
            schedule,
        });
        if let Some(surface) = model.surface_mut(sid) {
            surface.shading_controls.push(control);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::model::SurfaceKind;
    use crate::construction::registry::ModelMaterial;
    use crate::units;

    const EPSILON: f64 = 1e-9;

    fn plain_window(u: f64) -> Window {
        Window {
            u_factor: u,
            shgc: 0.4,
            heating_shade_multiplier: 1.0,
            cooling_shade_multiplier: 1.0,
        }
    }

    #[test]
    fn test_door_reproduces_u_factor() {
        let mut model = Model::new();
        let door = model.add_surface("Door", SurfaceKind::SubSurface, 2.0);
        let id = apply_door(&mut model, &[door], "Door", &Door { u_factor: 0.2 }, &Films::exterior_wall())
            .unwrap()
            .unwrap();
        assert!((model.construction(id).unwrap().r_value - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_door_too_conductive() {
        let mut model = Model::new();
        let door = model.add_surface("Door", SurfaceKind::SubSurface, 2.0);
        let err = apply_door(&mut model, &[door], "Door", &Door { u_factor: 1.5 }, &Films::exterior_wall())
            .unwrap_err();
        assert!(matches!(err, ConstructionError::BuilderInput { archetype: "door", .. }));
    }

    #[test]
    fn test_skylight_u_factor_conversion() {
        assert!((skylight_u_factor(0.60) - 0.50).abs() < EPSILON);
        let mut model = Model::new();
        let skylight = model.add_surface("Skylight", SurfaceKind::SubSurface, 1.0);
        apply_skylight(&mut model, &[skylight], "Skylight", &plain_window(0.60), &DEFAULT_COOLING_SEASON)
            .unwrap();
        let (_, material) = model.registry().iter().next().unwrap();
        let ModelMaterial::SimpleGlazing { u_factor, .. } = material else {
            panic!("expected glazing, got {material:?}");
        };
        assert!((u_factor - units::u_factor_to_si(0.50)).abs() < 1e-9);
    }

    #[test]
    fn test_glazing_u_factor_clipped_with_warning() {
        let mut model = Model::new();
        let window = model.add_surface("Window", SurfaceKind::SubSurface, 1.0);
        let id = apply_window(&mut model, &[window], "Window", &plain_window(2.0), &DEFAULT_COOLING_SEASON)
            .unwrap()
            .unwrap();
        assert_eq!(model.warnings().len(), 1);
        let r_si = units::r_value_to_si(model.construction(id).unwrap().r_value);
        assert!((1.0 / r_si - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_window_shading_controls() {
        let mut model = Model::new();
        let w1 = model.add_surface("Window 1", SurfaceKind::SubSurface, 1.0);
        let w2 = model.add_surface("Window 2", SurfaceKind::SubSurface, 1.0);
        let window = Window {
            heating_shade_multiplier: 0.85,
            cooling_shade_multiplier: 0.7,
            ..plain_window(0.33)
        };
        apply_window(&mut model, &[w1, w2], "Window", &window, &DEFAULT_COOLING_SEASON).unwrap();

        assert_eq!(model.shading_controls().len(), 4);
        assert_eq!(model.shades().len(), 2);
        assert_eq!(model.schedules().len(), 2);
        let heating = &model.schedules()[0];
        assert_eq!(heating.name, "HeatingSeason");
        assert!(heating.months[0] && !heating.months[6]);
        assert_eq!(model.surface(w1).unwrap().shading_controls.len(), 2);
    }

    #[test]
    fn test_unshaded_window_has_no_controls() {
        let mut model = Model::new();
        let window = model.add_surface("Window", SurfaceKind::SubSurface, 1.0);
        apply_window(&mut model, &[window], "Window", &plain_window(0.33), &DEFAULT_COOLING_SEASON).unwrap();
        assert!(model.shading_controls().is_empty());
    }
}
