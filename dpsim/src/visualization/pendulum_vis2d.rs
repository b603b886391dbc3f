use bevy::color::Srgba;
use bevy::math::primitives::Circle;
use bevy::prelude::*;
use bevy::sprite::{MaterialMesh2dBundle, Mesh2dHandle};
use bevy::window::{PrimaryWindow, WindowResized};

use crate::configuration::settings::{Settings, SettingsStore};
use crate::error::Result;
use crate::simulation::engine::SPEED_RANGE;
use crate::simulation::scenario::{random_color, FrameOutcome, Scenario};
use crate::simulation::states::{Geometry, NVec2};
use crate::simulation::trail::TrailBuffer;

/// Component tagging each bob mesh with its link index (0 or 1)
#[derive(Component)]
struct BobIndex(pub usize);

/// Fading trails of both bobs, filled once per stepped frame
#[derive(Resource)]
struct Trails {
    bob1: TrailBuffer,
    bob2: TrailBuffer,
}

impl Trails {
    fn new(capacity: usize) -> Self {
        Self {
            bob1: TrailBuffer::new(capacity),
            bob2: TrailBuffer::new(capacity),
        }
    }

    fn push(&mut self, geometry: &Geometry) {
        self.bob1.push(geometry.rod1_end);
        self.bob2.push(geometry.rod2_end);
    }

    fn clear(&mut self) {
        self.bob1.clear();
        self.bob2.clear();
    }
}

const WINDOW_TITLE: &str = "dpsim";

/// Opacity of the newest trail segment
const TRAIL_ALPHA: f32 = 0.33;

const SPEED_STEP: f64 = 0.1;
const FPS_STEP: u32 = 5;
const FPS_RANGE: (u32, u32) = (10, 240);
const LENGTH_STEP: f64 = 10.0;
const LENGTH_RANGE: (f64, f64) = (50.0, 300.0);
const RADIUS_RANGE: (f64, f64) = (5.0, 30.0);

pub fn run_2d(scenario: Scenario, store: SettingsStore) {
    println!("run_2d: starting Bevy 2D viewer, settings in {}", store.path().display());

    App::new()
        .insert_resource(ClearColor(background_color(scenario.style.dark_mode)))
        .insert_resource(Trails::new(scenario.trail_length))
        .insert_resource(scenario)
        .insert_resource(store)
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: WINDOW_TITLE.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }))
        .add_systems(Startup, setup_pendulum_system)
        .add_systems(
            Update,
            (
                control_input_system,
                viewport_system,
                physics_step_system,
                sync_bobs_system,
                draw_pendulum_system,
                fps_title_system,
            )
                .chain(),
        )
        .run();
}

fn setup_pendulum_system(
    mut commands: Commands,
    mut scenario: ResMut<Scenario>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    // 2D camera
    commands.spawn(Camera2dBundle::default());

    if let Ok(window) = windows.get_single() {
        scenario.set_viewport(f64::from(window.width()), f64::from(window.height()));
    }

    // Unit circles, scaled to the bob radius every frame
    let colors = [&scenario.style.color1, &scenario.style.color2];
    for (i, color) in colors.into_iter().enumerate() {
        commands.spawn((
            MaterialMesh2dBundle {
                mesh: Mesh2dHandle(meshes.add(Circle::new(1.0))),
                material: materials.add(ColorMaterial::from(parse_color(color))),
                transform: Transform::from_xyz(0.0, 0.0, 1.0),
                ..Default::default()
            },
            BobIndex(i),
        ));
    }

    info!(
        "pendulum ready: lengths {:?} (scale {:.2}), speed {}x, cap {} fps",
        scenario.base_lengths(),
        scenario.length_scale(),
        scenario.engine().simulation_speed,
        scenario.engine().target_fps
    );
}

fn viewport_system(mut resized: EventReader<WindowResized>, mut scenario: ResMut<Scenario>) {
    for ev in resized.read() {
        scenario.set_viewport(f64::from(ev.width), f64::from(ev.height));
    }
}

fn physics_step_system(time: Res<Time>, mut scenario: ResMut<Scenario>, mut trails: ResMut<Trails>) {
    let now = time.elapsed_seconds_f64() * 1000.0;

    match scenario.advance(now) {
        Ok(FrameOutcome::Stepped(geometry)) => trails.push(&geometry),
        Ok(FrameOutcome::Skipped | FrameOutcome::Paused) => {}
        Err(e) => {
            // Stepping on would only spread the NaN, so stop and let the user restart
            error!("simulation halted: {e}");
            scenario.set_paused(true);
        }
    }
}

fn control_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut scenario: ResMut<Scenario>,
    mut trails: ResMut<Trails>,
    mut clear_color: ResMut<ClearColor>,
    store: Res<SettingsStore>,
) {
    let mut changed = false;

    if keys.just_pressed(KeyCode::Space) {
        scenario.toggle_pause();
    }
    if keys.just_pressed(KeyCode::KeyR) {
        scenario.restart();
        trails.clear();
    }
    if keys.just_pressed(KeyCode::KeyD) {
        scenario.reset_to_defaults();
        trails.clear();
        // Only the theme survives a reset
        let saved = store.clear().and_then(|()| {
            if scenario.style.dark_mode {
                store.save(&Settings {
                    dark_mode: Some(true),
                    ..Default::default()
                })
            } else {
                Ok(())
            }
        });
        if let Err(e) = saved {
            error!("could not reset settings: {e}");
        }
        info!("reset to defaults");
    }
    if keys.just_pressed(KeyCode::KeyC) {
        scenario.randomize(&mut rand::thread_rng());
        trails.clear();
        changed = true;
    }

    // Playback
    if keys.just_pressed(KeyCode::ArrowUp) || keys.just_pressed(KeyCode::ArrowDown) {
        let delta = if keys.just_pressed(KeyCode::ArrowUp) { SPEED_STEP } else { -SPEED_STEP };
        let speed = nudge(scenario.engine().simulation_speed, delta, SPEED_RANGE);
        changed |= apply(scenario.set_simulation_speed(speed));
        info!("speed {}x", scenario.engine().simulation_speed);
    }
    if keys.just_pressed(KeyCode::ArrowRight) || keys.just_pressed(KeyCode::ArrowLeft) {
        let fps = if keys.just_pressed(KeyCode::ArrowRight) {
            scenario.engine().target_fps.saturating_add(FPS_STEP)
        } else {
            scenario.engine().target_fps.saturating_sub(FPS_STEP)
        };
        changed |= apply(scenario.set_target_fps(fps.clamp(FPS_RANGE.0, FPS_RANGE.1)));
        info!("fps cap {}", scenario.engine().target_fps);
    }

    // Rod lengths: A/Z link 1, S/X link 2
    let [mut l1, mut l2] = scenario.base_lengths();
    for (key, link, delta) in [
        (KeyCode::KeyA, 0, LENGTH_STEP),
        (KeyCode::KeyZ, 0, -LENGTH_STEP),
        (KeyCode::KeyS, 1, LENGTH_STEP),
        (KeyCode::KeyX, 1, -LENGTH_STEP),
    ] {
        if keys.just_pressed(key) {
            let length = if link == 0 { &mut l1 } else { &mut l2 };
            *length = nudge(*length, delta, LENGTH_RANGE);
            changed |= apply(scenario.set_rod_lengths(l1, l2));
        }
    }

    // Bob radii cycle upward and wrap
    if keys.just_pressed(KeyCode::KeyQ) || keys.just_pressed(KeyCode::KeyW) {
        let (mut r1, mut r2) = (scenario.style.bob1_radius, scenario.style.bob2_radius);
        if keys.just_pressed(KeyCode::KeyQ) {
            r1 = cycle_radius(r1);
        }
        if keys.just_pressed(KeyCode::KeyW) {
            r2 = cycle_radius(r2);
        }
        changed |= apply(scenario.set_bob_radii(r1, r2));
    }

    // New random color for one link
    if keys.just_pressed(KeyCode::KeyG) || keys.just_pressed(KeyCode::KeyH) {
        let mut rng = rand::thread_rng();
        let (mut c1, mut c2) = (scenario.style.color1.clone(), scenario.style.color2.clone());
        if keys.just_pressed(KeyCode::KeyG) {
            c1 = random_color(&mut rng);
        }
        if keys.just_pressed(KeyCode::KeyH) {
            c2 = random_color(&mut rng);
        }
        changed |= apply(scenario.set_colors(c1, c2));
    }

    if keys.just_pressed(KeyCode::KeyT) {
        let dark = scenario.toggle_dark_mode();
        clear_color.0 = background_color(dark);
        changed = true;
    }

    if changed {
        if let Err(e) = store.save(&scenario.settings()) {
            error!("could not save settings: {e}");
        }
    }
}

fn sync_bobs_system(
    scenario: Res<Scenario>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut query: Query<(&BobIndex, &mut Transform, &Handle<ColorMaterial>)>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let size = window.size();
    let geometry = scenario.geometry();
    let style = &scenario.style;

    for (BobIndex(i), mut transform, mat_handle) in &mut query {
        let (center, radius, color) = match i {
            0 => (geometry.rod1_end, style.bob1_radius, &style.color1),
            _ => (geometry.rod2_end, style.bob2_radius, &style.color2),
        };

        transform.translation = to_world(center, size).extend(1.0);
        transform.scale = Vec3::splat(radius as f32);

        let color = parse_color(color);
        let stale = materials.get(mat_handle).map_or(false, |mat| mat.color != color);
        if stale {
            if let Some(mat) = materials.get_mut(mat_handle) {
                mat.color = color;
            }
        }
    }
}

fn draw_pendulum_system(
    scenario: Res<Scenario>,
    trails: Res<Trails>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut gizmos: Gizmos,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let size = window.size();
    let style = &scenario.style;

    draw_trail(&mut gizmos, &trails.bob1, parse_color(&style.color1), size);
    draw_trail(&mut gizmos, &trails.bob2, parse_color(&style.color2), size);

    // Rods and bob outlines
    let ink = ink_color(style.dark_mode);
    let g = scenario.geometry();
    let (pivot, end1, end2) = (to_world(g.pivot, size), to_world(g.rod1_end, size), to_world(g.rod2_end, size));
    gizmos.line_2d(pivot, end1, ink);
    gizmos.line_2d(end1, end2, ink);
    gizmos.circle_2d(end1, style.bob1_radius as f32, ink);
    gizmos.circle_2d(end2, style.bob2_radius as f32, ink);
}

/// Oldest samples are nearly transparent, the newest reach `TRAIL_ALPHA`
fn draw_trail(gizmos: &mut Gizmos, trail: &TrailBuffer, color: Color, size: Vec2) {
    if trail.len() < 2 {
        return;
    }
    let n = trail.len() as f32;
    gizmos.linestrip_gradient_2d(
        trail
            .iter()
            .enumerate()
            .map(|(i, p)| (to_world(*p, size), color.with_alpha(TRAIL_ALPHA * i as f32 / n))),
    );
}

fn fps_title_system(
    scenario: Res<Scenario>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut shown: Local<Option<(u32, bool)>>,
) {
    let current = (scenario.fps(), scenario.engine().paused);
    if *shown == Some(current) {
        return;
    }
    if let Ok(mut window) = windows.get_single_mut() {
        let (fps, paused) = current;
        window.title = if paused {
            format!("{WINDOW_TITLE} - FPS: {fps} - paused")
        } else {
            format!("{WINDOW_TITLE} - FPS: {fps}")
        };
        *shown = Some(current);
    }
}

/// Screen coordinates (origin top-left, y down) to world (origin centered, y up)
fn to_world(p: NVec2, size: Vec2) -> Vec2 {
    Vec2::new(p.x as f32 - size.x / 2.0, size.y / 2.0 - p.y as f32)
}

fn parse_color(hex: &str) -> Color {
    Srgba::hex(hex).map(Color::from).unwrap_or(Color::WHITE)
}

fn background_color(dark_mode: bool) -> Color {
    if dark_mode {
        Color::srgb(0.1, 0.1, 0.12)
    } else {
        Color::srgb(0.96, 0.96, 0.96)
    }
}

fn ink_color(dark_mode: bool) -> Color {
    if dark_mode {
        Color::srgb(0.85, 0.85, 0.85)
    } else {
        Color::BLACK
    }
}

fn nudge(value: f64, delta: f64, (min, max): (f64, f64)) -> f64 {
    (((value + delta) * 10.0).round() / 10.0).clamp(min, max)
}

fn cycle_radius(radius: f64) -> f64 {
    let next = radius.round() + 1.0;
    if next > RADIUS_RANGE.1 { RADIUS_RANGE.0 } else { next.max(RADIUS_RANGE.0) }
}

/// Log a rejected change, report whether it was applied
fn apply(result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("{e}");
            false
        }
    }
}
