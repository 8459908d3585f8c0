use enclosure::input::{Archetype, BuildingInput};

const BASEMENT_HOUSE: &str = r#"{
    "ground": { "soil_conductivity": 10.0 },
    "cooling_season": [false, false, false, false, false, true, true, true, false, false, false, false],
    "surfaces": [
        { "name": "Above Grade Wall", "kind": "opaque", "area_ft2": 1200 },
        { "name": "Basement Wall", "kind": "opaque", "area_ft2": 960 },
        { "name": "Basement Slab", "kind": "opaque", "area_ft2": 1000 },
        { "name": "Floor Above Basement", "kind": "opaque", "area_ft2": 1000, "adjacent": "Basement Ceiling" },
        { "name": "Basement Ceiling", "kind": "opaque", "area_ft2": 1000 },
        { "name": "South Window", "kind": "sub_surface", "area_ft2": 60 },
        { "name": "Roof Deck", "kind": "opaque", "area_ft2": 1100 }
    ],
    "assemblies": [
        {
            "name": "AboveGradeWall", "surfaces": ["Above Grade Wall"], "type": "steel_stud_wall",
            "cavity_r": 13, "install_grade": 2, "cavity_depth_in": 3.5,
            "framing_factor": 0.25, "correction_factor": 0.46, "rigid_r": 5,
            "exterior_finish": { "thick_in": 0.375, "k_in": 0.62, "rho": 11.1, "cp": 0.25, "solar_absorptance": 0.6 }
        },
        {
            "name": "BasementWall", "surfaces": ["Basement Wall"], "type": "foundation_wall",
            "concrete_thick_in": 8, "height_ft": 8, "height_above_grade_ft": 1,
            "exterior_insulation": { "r_value": 10, "bottom_ft": 8 }
        },
        {
            "name": "BasementSlab", "surfaces": ["Basement Slab"], "type": "slab",
            "concrete_thick_in": 4, "exposed_perimeter_ft": 128,
            "foundation": "BasementWall Foundation"
        },
        {
            "name": "FloorOverBasement", "surfaces": ["Floor Above Basement"], "type": "floor",
            "cavity_r": 0, "joist_height_in": 9.25, "framing_factor": 0.13,
            "covering": { "thick_in": 0.5, "r_value": 2.08 }
        },
        {
            "name": "Window", "surfaces": ["South Window"], "type": "window",
            "u_factor": 0.35, "shgc": 0.4, "heating_shade_multiplier": 0.85, "cooling_shade_multiplier": 0.7
        },
        {
            "name": "Roof", "surfaces": ["Roof Deck"], "type": "open_cavity_roof",
            "cavity_r": 0, "framing_factor": 0.07, "framing_thick_in": 7.25,
            "osb_thick_in": 0.75, "radiant_barrier": true,
            "roofing": { "name": "AsphaltShingles", "thick_in": 0.25, "k_in": 1.128, "rho": 70, "cp": 0.35 }
        },
        {
            "name": "PartitionWalls", "type": "partition_wall_mass",
            "conditioned_floor_area_ft2": 2000, "basement_fraction": 0.5
        },
        {
            "name": "Furniture", "type": "furniture_mass",
            "conditioned_floor_area_ft2": 2000, "basement_fraction": 0.5
        }
    ]
}"#;

#[test]
fn test_full_description_builds() {
    let input = BuildingInput::from_json(BASEMENT_HOUSE).unwrap();
    assert!(matches!(input.assemblies[6].archetype, Archetype::PartitionWallMass(_)));

    let outcome = input.build(false).unwrap();
    assert!(outcome.skipped.is_empty());
    let summary = outcome.model.summary();

    for surface in &summary.surfaces {
        assert!(surface.construction.is_some(), "{} unassigned", surface.name);
    }
    // 7 description surfaces plus living/basement mass surfaces for two mass kinds
    assert_eq!(summary.surfaces.len(), 11);

    let ceiling = summary
        .surfaces
        .iter()
        .find(|s| s.name == "Basement Ceiling")
        .unwrap();
    assert_eq!(ceiling.construction.as_deref(), Some("FloorOverBasement Reversed"));

    assert_eq!(summary.ground.foundations.len(), 1);
    let slab = summary.surfaces.iter().find(|s| s.name == "Basement Slab").unwrap();
    assert_eq!(slab.foundation.as_deref(), Some("BasementWall Foundation"));

    let window = summary.surfaces.iter().find(|s| s.name == "South Window").unwrap();
    assert_eq!(window.shading_controls.len(), 2);
    assert_eq!(summary.schedules[1].months[5], true);

    let soil_k = summary.ground.settings.as_ref().unwrap().soil_conductivity;
    assert!((soil_k - 10.0 / 12.0 * 1.730_734_666).abs() < 1e-9);
    assert!(summary.warnings.is_empty());
}

#[test]
fn test_summary_serializes() {
    let outcome = BuildingInput::from_json(BASEMENT_HOUSE)
        .unwrap()
        .build(false)
        .unwrap();
    let json = serde_json::to_value(outcome.model.summary()).unwrap();
    let materials = json["materials"].as_array().unwrap();
    assert!(materials.iter().all(|m| m["kind"].is_string()));
    assert!(materials
        .iter()
        .any(|m| m["name"] == "AsphaltShingles" && m["kind"] == "standard_opaque"));
    let constructions = json["constructions"].as_array().unwrap();
    assert!(constructions
        .iter()
        .all(|c| c["r_value_ip"].as_f64().unwrap() > c["r_value_si"].as_f64().unwrap()));
}

#[test]
fn test_malformed_json() {
    assert!(BuildingInput::from_json("{ \"assemblies\": [{ \"name\": \"X\", \"type\": \"tent\" }] }").is_err());
}
