//! Parallel-path assembly calculator.
//!
//! An [`Assembly`] is an ordered stack of [`Layer`]s (outside to inside)
//! crossed by one or more parallel heat-flow paths described by a
//! [`PathSet`]. Overall resistance follows the isothermal-planes (parallel
//! path) method:
//!
//! ```text
//! R_p = Σ_layers R(layer, p)
//! U   = Σ_p fraction_p / R_p
//! R   = 1 / U
//! ```
//!
//! Because the simulation engine only understands homogeneous layers, every
//! parallel layer is collapsed into one equivalent material whose resistance
//! is chosen so that the collapsed stack reproduces `R` exactly.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::construction::material::{Material, OpaqueMaterial};
use crate::construction::model::{ConstructionId, Model, SurfaceId};
use crate::construction::registry::ModelMaterial;
use crate::error::{
    ConstructionError, LayerCompositionError, MaterialKindError, PathFractionError,
};

/// Allowed deviation of Σ fractions from 1.
pub const PATH_FRACTION_TOLERANCE: f64 = 0.001;

/// Allowed thickness difference between materials sharing a parallel layer (in).
const THICKNESS_TOLERANCE: f64 = 1e-6;

/// Area fractions of the parallel heat-flow paths through an assembly.
///
/// Fractions are never normalized: they must already sum to one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathSet(Vec<f64>);

impl PathSet {
    /// Validates path fractions: at least one, none negative or non-finite,
    /// summing to one within [`PATH_FRACTION_TOLERANCE`].
    pub fn new(fractions: Vec<f64>) -> Result<Self, PathFractionError> {
        if fractions.is_empty() {
            return Err(PathFractionError::Empty);
        }
        let sum: f64 = fractions.iter().sum();
        if !sum.is_finite() || (sum - 1.0).abs() > PATH_FRACTION_TOLERANCE {
            return Err(PathFractionError::BadSum { sum });
        }
        if let Some((index, &value)) = fractions.iter().enumerate().find(|(_, f)| **f < 0.0) {
            return Err(PathFractionError::Negative { index, value });
        }
        Ok(Self(fractions))
    }

    /// A single path covering the whole cross-section.
    pub fn single() -> Self {
        Self(vec![1.0])
    }

    /// Fractions in path order.
    pub fn fractions(&self) -> &[f64] {
        &self.0
    }

    /// Number of paths.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One depth position in the stack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Layer {
    /// One material across every path.
    Homogeneous(Material),
    /// One material per path, all of equal thickness.
    Parallel { name: String, materials: Vec<Material> },
}

impl Layer {
    /// True when the layer actually varies across paths.
    pub fn is_parallel(&self) -> bool {
        matches!(self, Layer::Parallel { materials, .. } if materials.len() > 1)
    }

    /// Every material in the layer, one per path for parallel layers.
    pub fn materials(&self) -> &[Material] {
        match self {
            Layer::Homogeneous(m) => std::slice::from_ref(m),
            Layer::Parallel { materials, .. } => materials,
        }
    }

    /// Material seen by path `path`.
    fn material_for_path(&self, path: usize) -> &Material {
        let materials = self.materials();
        if materials.len() == 1 {
            &materials[0]
        } else {
            &materials[path]
        }
    }
}

/// Accumulates layers for an [`Assembly`]. Nothing is checked until
/// [`AssemblyBuilder::build`].
#[derive(Debug)]
pub struct AssemblyBuilder {
    name: String,
    paths: Vec<f64>,
    layers: Vec<Layer>,
}

impl AssemblyBuilder {
    /// Starts an empty stack. Fractions are validated by [`AssemblyBuilder::build`].
    pub fn new(name: impl Into<String>, path_fractions: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            paths: path_fractions,
            layers: Vec::new(),
        }
    }

    /// Appends a homogeneous layer on the inside of the stack.
    pub fn layer(mut self, material: impl Into<Material>) -> Self {
        self.layers.push(Layer::Homogeneous(material.into()));
        self
    }

    /// Adds the layer only when a material is present.
    pub fn optional_layer<M: Into<Material>>(self, material: Option<M>) -> Self {
        match material {
            Some(m) => self.layer(m),
            None => self,
        }
    }

    /// Appends a layer with one material per path, in path order.
    pub fn parallel_layer(mut self, name: impl Into<String>, materials: Vec<OpaqueMaterial>) -> Self {
        self.layers.push(Layer::Parallel {
            name: name.into(),
            materials: materials.into_iter().map(Material::Opaque).collect(),
        });
        self
    }

    /// Validates and freezes the assembly.
    pub fn build(self) -> Result<Assembly, ConstructionError> {
        let paths = PathSet::new(self.paths)?;
        Assembly::new(self.name, paths, self.layers)
    }
}

/// A validated layer stack.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Assembly {
    name: String,
    paths: PathSet,
    layers: Vec<Layer>,
}

impl Assembly {
    /// Builds a validated assembly.
    ///
    /// # Arguments
    /// * `name` - Construction name
    /// * `paths` - Area fractions of the parallel paths
    /// * `layers` - Layers outside to inside
    ///
    /// # Returns
    /// The assembly, or the first composition or material-kind violation found.
    pub fn new(
        name: impl Into<String>,
        paths: PathSet,
        layers: Vec<Layer>,
    ) -> Result<Self, ConstructionError> {
        validate(&paths, &layers)?;
        Ok(Self {
            name: name.into(),
            paths,
            layers,
        })
    }

    /// Construction name used when the assembly is materialized.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Validated path fractions.
    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    /// Layers outside to inside.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Series resistance along each path (hr·ft²·°F/Btu).
    pub fn path_r_values(&self) -> Vec<f64> {
        (0..self.paths.len())
            .map(|p| {
                self.layers
                    .iter()
                    .map(|layer| layer.material_for_path(p).r_value())
                    .sum()
            })
            .collect()
    }

    /// Overall assembly resistance, films included (hr·ft²·°F/Btu).
    pub fn r_value(&self) -> f64 {
        let u: f64 = self
            .path_r_values()
            .iter()
            .zip(self.paths.fractions())
            .map(|(r, f)| f / r)
            .sum();
        1.0 / u
    }

    /// Overall conductance (Btu/(hr·ft²·°F)).
    pub fn u_factor(&self) -> f64 {
        1.0 / self.r_value()
    }

    /// Resistance of each layer taken on its own, paths in parallel.
    pub fn layer_r_values(&self) -> Vec<f64> {
        let fractions = self.paths.fractions();
        self.layers
            .iter()
            .map(|layer| {
                if layer.is_parallel() {
                    let u: f64 = layer
                        .materials()
                        .iter()
                        .zip(fractions)
                        .map(|(m, f)| f / m.r_value())
                        .sum();
                    1.0 / u
                } else {
                    layer.materials()[0].r_value()
                }
            })
            .collect()
    }

    /// Equivalent homogeneous material for the parallel layer at `index`.
    ///
    /// Returns `None` for layers that do not vary across paths.
    pub fn parallel_material(&self, index: usize) -> Option<OpaqueMaterial> {
        let Layer::Parallel { name, materials } = self.layers.get(index)? else {
            return None;
        };
        if materials.len() < 2 {
            return None;
        }

        let r_overall = self.r_value();
        let layer_rs = self.layer_r_values();
        let sum_r_all: f64 = layer_rs.iter().sum();
        let sum_r_parallel: f64 = self
            .layers
            .iter()
            .zip(&layer_rs)
            .filter(|(layer, _)| layer.is_parallel())
            .map(|(_, r)| r)
            .sum();

        // Conductance, not resistance, adds across paths; spread the
        // difference over the parallel layers by resistance share.
        let r_layer = layer_rs[index];
        let r_equivalent = r_layer + (r_overall - sum_r_all) * r_layer / sum_r_parallel;

        let opaque: Vec<&OpaqueMaterial> = materials
            .iter()
            .filter_map(|m| match m {
                Material::Opaque(o) => Some(o),
                _ => None,
            })
            .collect();
        let fractions = self.paths.fractions();
        let thick_in = opaque[0].thick_in;
        let rho: f64 = opaque.iter().zip(fractions).map(|(m, f)| m.rho * f).sum();
        let cp: f64 = if rho > 0.0 {
            opaque
                .iter()
                .zip(fractions)
                .map(|(m, f)| m.cp * m.rho * f)
                .sum::<f64>()
                / rho
        } else {
            0.0
        };

        Some(OpaqueMaterial::new(
            name.clone(),
            thick_in,
            thick_in / r_equivalent,
            rho,
            cp,
        ))
    }

    /// The same stack with every parallel layer replaced by its equivalent
    /// material, on a single path.
    pub fn collapsed(&self) -> Assembly {
        let layers = self
            .layers
            .iter()
            .enumerate()
            .map(|(i, layer)| match self.parallel_material(i) {
                Some(m) => Layer::Homogeneous(Material::Opaque(m)),
                None => Layer::Homogeneous(layer.materials()[0].clone()),
            })
            .collect();
        Assembly {
            name: self.name.clone(),
            paths: PathSet::single(),
            layers,
        }
    }

    /// Materials as they will appear in the model, outside to inside.
    /// Air films are dropped.
    pub fn model_materials(&self) -> Vec<ModelMaterial> {
        self.layers
            .iter()
            .enumerate()
            .filter_map(|(i, layer)| {
                if let Some(equivalent) = self.parallel_material(i) {
                    return Some(ModelMaterial::from_opaque(&equivalent));
                }
                let material = &layer.materials()[0];
                if material.is_air_film() {
                    return None;
                }
                Some(ModelMaterial::from_material(material))
            })
            .collect()
    }

    /// Materializes the assembly into `model` and assigns it to `surfaces`.
    ///
    /// Surfaces are checked before anything is registered, so a failure
    /// leaves the model untouched.
    pub fn create_and_assign(
        self,
        model: &mut Model,
        surfaces: &[SurfaceId],
    ) -> Result<ConstructionId, ConstructionError> {
        model.check_surfaces(surfaces)?;

        let r_value = self.r_value();
        let layer_ids = self
            .model_materials()
            .into_iter()
            .map(|m| model.registry_mut().get_or_insert(m))
            .collect::<Vec<_>>();
        debug!(
            construction = %self.name,
            r_value,
            layers = layer_ids.len(),
            "materialized assembly"
        );

        let id = model.add_construction(self.name, layer_ids, r_value);
        model.assign_construction(id, surfaces)?;
        Ok(id)
    }
}

/// Checks the structural invariants of a layer stack.
pub fn validate(paths: &PathSet, layers: &[Layer]) -> Result<(), ConstructionError> {
    if layers.is_empty() {
        return Err(LayerCompositionError::NoLayers.into());
    }

    let any_glazing = layers.iter().flat_map(Layer::materials).any(Material::is_glazing);
    if any_glazing {
        let all_glazing = layers.iter().flat_map(Layer::materials).all(Material::is_glazing);
        if !all_glazing {
            return Err(MaterialKindError::MixedGlazing.into());
        }
        if let Some(layer) = layers.iter().position(|l| l.materials().len() != 1) {
            return Err(MaterialKindError::MultipleGlazingInLayer { layer }.into());
        }
        if paths.len() != 1 {
            return Err(MaterialKindError::GlazingPaths { paths: paths.len() }.into());
        }
        return Ok(());
    }

    for (i, layer) in layers.iter().enumerate() {
        let count = layer.materials().len();
        if count != 1 && count != paths.len() {
            return Err(LayerCompositionError::MaterialCount {
                layer: i,
                count,
                paths: paths.len(),
            }
            .into());
        }
        if !layer.is_parallel() {
            continue;
        }
        let mut thicknesses = layer.materials().iter().map(Material::thick_in);
        let Some(Some(first)) = thicknesses.next() else {
            return Err(LayerCompositionError::ParallelNotOpaque { layer: i }.into());
        };
        for thickness in thicknesses {
            let Some(other) = thickness else {
                return Err(LayerCompositionError::ParallelNotOpaque { layer: i }.into());
            };
            if (other - first).abs() > THICKNESS_TOLERANCE {
                return Err(LayerCompositionError::ThicknessMismatch {
                    layer: i,
                    first,
                    other,
                }
                .into());
            }
        }
    }

    let mut found_parallel = false;
    let mut last_parallel = false;
    for (i, layer) in layers.iter().enumerate() {
        let parallel = layer.is_parallel();
        if parallel {
            if found_parallel && !last_parallel {
                return Err(LayerCompositionError::NonContiguousParallel { layer: i }.into());
            }
            found_parallel = true;
        }
        last_parallel = parallel;
    }

    Ok(())
}

/// Area fraction of a framed cavity assumed uninsulated because of
/// installation defects (RESNET grades 1-3).
pub fn gap_factor(install_grade: u8, framing_factor: f64, cavity_r: f64) -> f64 {
    if cavity_r <= 0.0 {
        return 0.0;
    }
    match install_grade {
        2 => 0.02 * (1.0 - framing_factor),
        3 => 0.05 * (1.0 - framing_factor),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construction::material::{
        BaseMaterial, GlazingMaterial, OpaqueMaterial, SimpleMaterial,
    };

    const EPSILON: f64 = 1e-9;

    fn stud(thick_in: f64) -> OpaqueMaterial {
        OpaqueMaterial::from_base("Stud", thick_in, BaseMaterial::wood())
    }

    fn cavity(thick_in: f64, r: f64) -> OpaqueMaterial {
        OpaqueMaterial::from_base_with_r("Cavity", thick_in, BaseMaterial::insulation_densepack(), r)
    }

    fn stud_wall(fractions: Vec<f64>) -> AssemblyBuilder {
        AssemblyBuilder::new("Wall", fractions)
            .layer(SimpleMaterial::air_film_outside())
            .layer(OpaqueMaterial::osb("Sheathing", 0.5))
            .parallel_layer(
                "StudAndCavity",
                vec![stud(3.5), cavity(3.5, 13.0), OpaqueMaterial::air_cavity_closed(3.5)],
            )
            .layer(OpaqueMaterial::gypsum_wall(0.5))
            .layer(SimpleMaterial::air_film_vertical())
    }

    #[test]
    fn test_path_set_rejects_bad_sum() {
        assert!(matches!(
            PathSet::new(vec![0.25, 0.7]),
            Err(PathFractionError::BadSum { .. })
        ));
        assert!(PathSet::new(vec![0.25, 0.7495, 0.0]).is_ok());
        assert!(PathSet::new(vec![0.25, 0.7485]).is_err());
    }

    #[test]
    fn test_path_set_rejects_non_finite() {
        assert!(matches!(
            PathSet::new(vec![f64::NAN]),
            Err(PathFractionError::BadSum { .. })
        ));
        assert!(PathSet::new(vec![0.5, f64::INFINITY]).is_err());
        assert!(AssemblyBuilder::new("Wall", vec![f64::NAN])
            .layer(SimpleMaterial::air_film_vertical())
            .build()
            .is_err());
    }

    #[test]
    fn test_path_set_rejects_negative() {
        assert_eq!(
            PathSet::new(vec![1.1, -0.1]),
            Err(PathFractionError::Negative {
                index: 1,
                value: -0.1
            })
        );
    }

    #[test]
    fn test_path_set_is_not_normalized() {
        let paths = PathSet::new(vec![0.2995, 0.7]).unwrap();
        assert_eq!(paths.fractions(), &[0.2995, 0.7]);
    }

    #[test]
    fn test_homogeneous_r_value_is_series_sum() {
        let assembly = AssemblyBuilder::new("Slab", vec![1.0])
            .layer(OpaqueMaterial::concrete("Concrete", 4.0))
            .layer(SimpleMaterial::new("Carpet", 2.0))
            .build()
            .unwrap();
        let expected = 4.0 / 9.0912 + 2.0;
        assert!((assembly.r_value() - expected).abs() < EPSILON);
    }

    #[test]
    fn test_parallel_r_value() {
        let assembly = stud_wall(vec![0.25, 0.75, 0.0]).build().unwrap();
        let common = 0.197 + 0.5 / 0.8004 + 0.5 / 1.1112 + 0.68;
        let r_framing = common + 3.5 / 0.8004;
        let r_cavity = common + 13.0;
        let expected = 1.0 / (0.25 / r_framing + 0.75 / r_cavity);
        assert!((assembly.r_value() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_collapse_preserves_overall_r() {
        let assembly = stud_wall(vec![0.23, 0.7546, 0.0154]).build().unwrap();
        let collapsed = assembly.collapsed();
        assert_eq!(collapsed.paths().len(), 1);
        assert!((collapsed.r_value() - assembly.r_value()).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_material_mass_weighting() {
        let assembly = stud_wall(vec![0.25, 0.75, 0.0]).build().unwrap();
        let eq = assembly.parallel_material(2).unwrap();
        let rho = 0.25 * 32.0 + 0.75 * 2.2;
        let cp = (0.25 * 32.0 * 0.29 + 0.75 * 2.2 * 0.25) / rho;
        assert_eq!(eq.name, "StudAndCavity");
        assert!((eq.thick_in - 3.5).abs() < EPSILON);
        assert!((eq.rho - rho).abs() < EPSILON);
        assert!((eq.cp - cp).abs() < EPSILON);
        assert!(assembly.parallel_material(1).is_none());
    }

    #[test]
    fn test_model_materials_skip_air_films() {
        let assembly = stud_wall(vec![0.25, 0.75, 0.0]).build().unwrap();
        let names: Vec<String> = assembly
            .model_materials()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["Sheathing", "StudAndCavity", "GypsumBoard"]);
    }

    #[test]
    fn test_wrong_material_count() {
        let err = AssemblyBuilder::new("Wall", vec![0.25, 0.75, 0.0])
            .parallel_layer("StudAndCavity", vec![stud(3.5), cavity(3.5, 13.0)])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::LayerComposition(LayerCompositionError::MaterialCount {
                count: 2,
                paths: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_thickness_mismatch() {
        let err = AssemblyBuilder::new("Wall", vec![0.25, 0.75])
            .parallel_layer("StudAndCavity", vec![stud(3.5), cavity(5.5, 19.0)])
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::LayerComposition(LayerCompositionError::ThicknessMismatch { .. })
        ));
    }

    #[test]
    fn test_non_contiguous_parallel_layers() {
        let err = AssemblyBuilder::new("Wall", vec![0.25, 0.75])
            .parallel_layer("Outer", vec![stud(1.0), cavity(1.0, 4.0)])
            .layer(OpaqueMaterial::osb("Sheathing", 0.5))
            .parallel_layer("Inner", vec![stud(1.0), cavity(1.0, 4.0)])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConstructionError::LayerComposition(LayerCompositionError::NonContiguousParallel {
                layer: 2
            })
        );
    }

    #[test]
    fn test_contiguous_parallel_layers_are_fine() {
        let assembly = AssemblyBuilder::new("Wall", vec![0.25, 0.75])
            .parallel_layer("Outer", vec![stud(1.0), cavity(1.0, 4.0)])
            .parallel_layer("Inner", vec![stud(2.0), cavity(2.0, 8.0)])
            .layer(OpaqueMaterial::osb("Sheathing", 0.5))
            .build()
            .unwrap();
        assert!((assembly.collapsed().r_value() - assembly.r_value()).abs() < 1e-9);
    }

    #[test]
    fn test_glazing_cannot_mix() {
        let err = AssemblyBuilder::new("Window", vec![1.0])
            .layer(GlazingMaterial::new("Glass", 0.3, 0.4))
            .layer(OpaqueMaterial::gypsum_wall(0.5))
            .build()
            .unwrap_err();
        assert_eq!(err, ConstructionError::MaterialKind(MaterialKindError::MixedGlazing));
    }

    #[test]
    fn test_glazing_single_path() {
        let err = AssemblyBuilder::new("Window", vec![0.5, 0.5])
            .layer(GlazingMaterial::new("Glass", 0.3, 0.4))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConstructionError::MaterialKind(MaterialKindError::GlazingPaths { paths: 2 })
        );
    }

    #[test]
    fn test_glazing_r_value() {
        let assembly = AssemblyBuilder::new("Window", vec![1.0])
            .layer(GlazingMaterial::new("Glass", 0.5, 0.4))
            .build()
            .unwrap();
        assert!((assembly.r_value() - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_empty_assembly() {
        let err = AssemblyBuilder::new("Nothing", vec![1.0]).build().unwrap_err();
        assert_eq!(
            err,
            ConstructionError::LayerComposition(LayerCompositionError::NoLayers)
        );
    }

    #[test]
    fn test_gap_factor() {
        assert_eq!(gap_factor(2, 0.25, 0.0), 0.0);
        assert_eq!(gap_factor(1, 0.25, 13.0), 0.0);
        assert!((gap_factor(2, 0.25, 13.0) - 0.015).abs() < EPSILON);
        assert!((gap_factor(3, 0.25, 13.0) - 0.0375).abs() < EPSILON);
        for ff in [0.0, 0.1, 0.5, 1.0] {
            assert!((gap_factor(3, ff, 19.0) - 0.05 * (1.0 - ff)).abs() < EPSILON);
        }
    }
}
