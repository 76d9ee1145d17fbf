//! A fuzzy ball that hops, spins about a random axis, and lands.
//!
//! The hair trails on the way up, flies out while spinning, squashes on the
//! landing, and wobbles back into place during the pause between hops.
//!
//! Run with: `cargo run --example bounce`

use std::f32::consts::TAU;

use fuzzy_mesh::tween::{Easing, Repeat, Track};
use fuzzy_mesh::*;
use rand::Rng;

const TURQUOISE: u32 = 0x47debd;
const DARK_PURPLE: u32 = 0x2e044e;
const PURPLE: u32 = 0x7821ec;
const YELLOW: u32 = 0xfff95d;

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::new()
        .title("Bounce")
        .size(1280, 720)
        .clear_color(Color::hex(DARK_PURPLE));

    run_with_config(config, |ctx| {
        let mut rng = rand::rng();

        *ctx.lighting = Lighting {
            key_direction: Vec3::new(0.125, 1.0, 0.0),
            key_color: Color::hex(TURQUOISE),
            fill_direction: Vec3::new(-0.125, -1.0, 0.0),
            fill_color: Color::hex(YELLOW),
            ambient: Color::hex(PURPLE),
            ..Default::default()
        };

        let eye = Vec3::new(-10.0, 0.0, 20.0);
        *ctx.orbit = OrbitCamera::new()
            .distance(eye.length())
            .azimuth(eye.x.atan2(eye.z))
            .elevation(0.0);

        let mut ball = primitives::sphere(2.0, 32, 16);
        ball.weld(1e-4);

        let hair = FuzzyConfig::builder()
            .hair_length(2.0)
            .hair_radial_segments(4)
            .hair_radius_top(0.0)
            .hair_radius_base(0.1)
            .build()?;

        let ball = FuzzyMesh::builder(ball)
            .config(hair)
            .material(MaterialParams::default().roughness(1.0))
            .build()?;
        log::info!("ball has {} hairs", ball.hair_count());
        let ball = ctx.scene.spawn(ball);

        let hop = Track::new(0.0)
            .to(0.5, 8.0, Easing::CubicOut)
            .to(0.5, 0.0, Easing::CubicIn)
            .to(0.1, -2.0, Easing::CubicOut)
            .to(0.5, 0.0, Easing::CubicOut);

        let turn = if rng.random::<bool>() { TAU } else { -TAU };
        let spin = Track::new(0.0).to(1.0, turn, Easing::QuadInOut);

        let timeline = Repeat {
            delay: 1.0,
            duration: hop.duration(),
            repeat_delay: 1.0,
        };

        if let Some(fuzzy) = ctx.scene.fuzzy_mut(ball) {
            fuzzy.set_rotation_axis(random_axis(&mut rng));
        }
        let mut last_iteration = 0;

        Ok(move |frame: &mut Frame| {
            let Some(fuzzy) = frame.scene.fuzzy_mut(ball) else {
                return;
            };

            let (iteration, t) = timeline.cycle(frame.time);
            if iteration != last_iteration {
                last_iteration = iteration;
                fuzzy.set_rotation_axis(random_axis(&mut rng));
            }

            fuzzy.set_position(Vec3::new(0.0, hop.sample(t), 0.0));
            fuzzy.set_rotation_angle(spin.sample(t));
        })
    })
}
