use criterion::{black_box, criterion_group, criterion_main, Criterion};
use enclosure::construction::walls::{apply_wood_stud_wall, WallFinishes, WoodStudWall};
use enclosure::construction::{
    AssemblyBuilder, BaseMaterial, Films, Model, OpaqueMaterial, SimpleMaterial, SurfaceKind,
};

fn bench_assembly(c: &mut Criterion) {
    let assembly = AssemblyBuilder::new("Wall", vec![0.23, 0.7546, 0.0154])
        .layer(SimpleMaterial::air_film_outside())
        .layer(OpaqueMaterial::osb("Sheathing", 0.5))
        .parallel_layer(
            "StudAndCavity",
            vec![
                OpaqueMaterial::from_base("Stud", 3.5, BaseMaterial::wood()),
                OpaqueMaterial::from_base_with_r("Ins", 3.5, BaseMaterial::insulation_densepack(), 13.0),
                OpaqueMaterial::air_cavity_closed(3.5),
            ],
        )
        .layer(OpaqueMaterial::gypsum_wall(0.5))
        .layer(SimpleMaterial::air_film_vertical())
        .build()
        .expect("valid assembly");

    c.bench_function("assembly_r_value", |b| b.iter(|| black_box(&assembly).r_value()));
    c.bench_function("assembly_model_materials", |b| {
        b.iter(|| black_box(&assembly).model_materials())
    });

    let wall = WoodStudWall {
        cavity_r: 13.0,
        install_grade: 2,
        cavity_depth_in: 3.5,
        cavity_filled: true,
        framing_factor: 0.23,
        finishes: WallFinishes::default(),
    };
    // Same wall on 200 surface groups; registry lookups dominate after the first.
    c.bench_function("wood_stud_wall_200_groups", |b| {
        b.iter(|| {
            let mut model = Model::new();
            let films = Films::exterior_wall();
            for i in 0..200 {
                let surface = model.add_surface(format!("Wall {i}"), SurfaceKind::Opaque, 10.0);
                apply_wood_stud_wall(&mut model, &[surface], "Wall", &wall, &films)
                    .expect("valid wall");
            }
            model
        })
    });
}

criterion_group!(benches, bench_assembly);
criterion_main!(benches);
