//! Grows hair on an STL model and slowly turns it.
//!
//! Drag to orbit, scroll to zoom. Without a path, or if the file can't be
//! read, a torus stands in.
//!
//! Run with: `cargo run --example stl_fuzz -- path/to/model.stl`

use fuzzy_mesh::*;

fn load(path: Option<String>) -> RawGeometry {
    let Some(path) = path else {
        log::info!("no model given, using a torus");
        return primitives::torus(3.0, 1.0, 16, 48);
    };

    match GeometryLoader::from_file(&path)
        .centered()
        .upright()
        .normalized()
        .scaled(8.0)
        .smooth_normals()
        .build()
    {
        Ok(geometry) => {
            log::info!("loaded {path}: {} vertices", geometry.vertices.len());
            geometry
        }
        Err(err) => {
            log::error!("failed to load {path}: {err}; using a torus");
            primitives::torus(3.0, 1.0, 16, 48)
        }
    }
}

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut geometry = load(std::env::args().nth(1));
    geometry.weld(1e-4);

    let config = AppConfig::new()
        .title("STL Fuzz")
        .size(1280, 720)
        .clear_color(Color::hex(0x1a1a24));

    run_with_config(config, move |ctx| {
        *ctx.orbit = OrbitCamera::new().distance(18.0).elevation(0.3);

        let hair = FuzzyConfig::builder()
            .hair_length(0.75)
            .hair_radius_base(0.04)
            .hair_height_segments(8)
            .force_factor(0.5, 1.5)
            .fuzz(0.4)
            .build()?;

        let model = FuzzyMesh::builder(geometry)
            .config(hair)
            .material(
                MaterialParams::default()
                    .color(Color::hex(0xd8a86c))
                    .roughness(0.8),
            )
            .build()?;
        let model = ctx.scene.spawn(model);

        Ok(move |frame: &mut Frame| {
            if let Some(fuzzy) = frame.scene.fuzzy_mut(model) {
                fuzzy.set_rotation_angle(frame.time * 0.5);
            }
        })
    })
}
