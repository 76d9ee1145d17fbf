//! A walking fuzzy character built from six fuzzy meshes.
//!
//! Head, torso, hands and legs each carry their own hair and simulation; they
//! share one random color and hang off a common body group.
//!
//! Run with: `cargo run --example hero`

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, FRAC_PI_8, PI, TAU};

use fuzzy_mesh::primitives::SphereSection;
use fuzzy_mesh::*;
use rand::Rng;

/// Walk cycle advance per frame, in radians.
const STEP: f32 = 0.125;
/// Stride and bob amplitude.
const AMPLITUDE: f32 = 4.0;

struct Hero {
    head: FuzzyId,
    torso: FuzzyId,
    hand_right: FuzzyId,
    hand_left: FuzzyId,
    leg_right: FuzzyId,
    leg_left: FuzzyId,
}

fn part(
    scene: &mut FuzzyScene,
    body: GroupId,
    geometry: RawGeometry,
    config: FuzzyConfig,
    color: Color,
    position: Vec3,
    axis: Vec3,
) -> Result<FuzzyId, FuzzyError> {
    let mut geometry = geometry;
    geometry.weld(1e-4);

    let mut fuzzy = FuzzyMesh::new(geometry, config)?;
    fuzzy.set_color(color);
    fuzzy.set_rotation_axis(axis);
    fuzzy.place(position);
    Ok(scene.spawn_in_group(body, fuzzy))
}

impl Hero {
    fn spawn(scene: &mut FuzzyScene, color: Color) -> Result<Self, FuzzyError> {
        let body = scene.spawn_group(Transform::from_position(Vec3::new(0.0, -8.0, 0.0)));

        let head = part(
            scene,
            body,
            primitives::sphere_section(4.0, 32, 16, SphereSection::cap(0.55 * PI)),
            FuzzyConfig::builder()
                .hair_length(6.0)
                .hair_radius_base(0.5)
                .hair_radial_segments(6)
                .gravity(2.0)
                .fuzz(0.25)
                .force_factor(0.5, 0.75)
                .build()?,
            color,
            Vec3::new(0.0, 13.0, 0.0),
            Vec3::X,
        )?;

        let torso = part(
            scene,
            body,
            primitives::sphere_section(3.0, 32, 16, SphereSection::band(0.25 * PI, 0.7 * PI)),
            FuzzyConfig::builder()
                .hair_length(5.0)
                .force_factor(1.0, 4.0)
                .centrifugal_force_factor(4.0)
                .fuzz(0.5)
                .build()?,
            color,
            Vec3::new(0.0, 9.0, 0.0),
            Vec3::Y,
        )?;

        let hand = FuzzyConfig::builder()
            .hair_length(2.0)
            .hair_radius_base(0.25)
            .hair_radial_segments(6)
            .gravity(2.0)
            .build()?;
        let hand_right = part(
            scene,
            body,
            primitives::sphere(1.0, 12, 12),
            hand,
            color,
            Vec3::new(0.0, 8.0, 6.0),
            Vec3::Z,
        )?;
        let hand_left = part(
            scene,
            body,
            primitives::sphere(1.0, 12, 12),
            hand,
            color,
            Vec3::new(0.0, 8.0, -6.0),
            Vec3::Z,
        )?;

        let leg = FuzzyConfig::builder()
            .hair_length(2.0)
            .hair_radius_base(0.5)
            .gravity(1.0)
            .build()?;
        let foot = || primitives::sphere_section(2.0, 48, 16, SphereSection::cap(0.5 * PI));
        let leg_right = part(scene, body, foot(), leg, color, Vec3::new(0.0, 0.0, 3.0), Vec3::Z)?;
        let leg_left = part(scene, body, foot(), leg, color, Vec3::new(0.0, 0.0, -3.0), Vec3::Z)?;

        Ok(Self {
            head,
            torso,
            hand_right,
            hand_left,
            leg_right,
            leg_left,
        })
    }

    /// Poses every part for walk phase `t` in `[0, 2π)`.
    fn pose(&self, scene: &mut FuzzyScene, t: f32) {
        let bob = (2.0 * t).cos() * AMPLITUDE;

        set(scene, self.head, Vec3::new(0.0, 13.0 - bob * 0.3, 0.0), t.cos() * AMPLITUDE * 0.02);
        set(
            scene,
            self.torso,
            Vec3::new(0.0, 9.0 - bob * 0.2, 0.0),
            -(t + PI).cos() * AMPLITUDE * 0.05,
        );

        for (hand, phase, z) in [(self.hand_right, t, 6.0), (self.hand_left, t + PI, -6.0)] {
            set(
                scene,
                hand,
                Vec3::new(-phase.cos() * AMPLITUDE, 8.0, z),
                -phase.cos() * FRAC_PI_8,
            );
        }

        // Only the foot in the air tips forward.
        let kick = (2.0 * t + FRAC_PI_2).cos() * FRAC_PI_4;
        let (right_angle, left_angle) = if t > PI { (kick, 0.0) } else { (0.0, kick) };

        for (leg, phase, z, angle) in [
            (self.leg_right, t, 3.0, right_angle),
            (self.leg_left, t + PI, -3.0, left_angle),
        ] {
            let lift = (-phase.sin() * AMPLITUDE).max(0.0);
            set(scene, leg, Vec3::new(phase.cos() * AMPLITUDE, lift, z), angle);
        }
    }
}

fn set(scene: &mut FuzzyScene, id: FuzzyId, position: Vec3, angle: f32) {
    if let Some(fuzzy) = scene.fuzzy_mut(id) {
        fuzzy.set_position(position);
        fuzzy.set_rotation_angle(angle);
    }
}

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let background = Color::hex(0xf1f1f1);
    let config = AppConfig::new()
        .title("Hero")
        .size(1280, 720)
        .clear_color(background);

    run_with_config(config, move |ctx| {
        let color = Color::from_hsl(rand::rng().random::<f32>(), 0.75, 0.5);

        *ctx.lighting = Lighting {
            fog_color: background,
            fog_density: 0.01,
            ..Default::default()
        };

        let eye = Vec3::new(30.0, 10.0, 30.0);
        *ctx.orbit = OrbitCamera::new()
            .distance(eye.length())
            .azimuth(eye.x.atan2(eye.z))
            .elevation((eye.y / eye.length()).asin())
            .mode(OrbitMode::AutoRotate { speed: 0.2 });

        let hero = Hero::spawn(ctx.scene, color)?;
        let mut t = 0.0;

        Ok(move |frame: &mut Frame| {
            t = (t + STEP) % TAU;
            hero.pose(frame.scene, t);
        })
    })
}
