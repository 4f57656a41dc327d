#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Quantum Groove.
//!
//! Macroquad is built without its `audio` feature. Sound belongs to the
//! session's sound collaborator, and the audio backend would pull in ALSA.
//!
//! The 3D scene is drawn with a perspective camera; meters and the HUD are
//! drawn in screen space on top.

use anyhow::Result;
use glam::{Vec2, Vec3};
use macroquad::{
    camera::{set_camera, set_default_camera, Camera3D},
    input::{is_key_pressed, is_key_released, mouse_position, KeyCode},
    math::{vec3, Vec3 as MacroquadVec3},
};
use quantum_groove_rendering::{
    Color, DrumMarker, FrameInput, Presentation, RenderingBackend, Scene,
};
use std::{collections::BTreeSet, time::Duration};
use tracing::info;

const CAMERA_POSITION: Vec3 = Vec3::new(0.0, 3.5, 9.5);
const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 0.0, 0.0);
const MARKER_SIZE: f32 = 0.45;
const METER_WIDTH: f32 = 18.0;
const METER_HEIGHT: f32 = 160.0;
const METER_MARGIN: f32 = 24.0;
const HUD_FONT_SIZE: f32 = 24.0;

const CHARACTER_KEYS: [(KeyCode, char); 37] = [
    (KeyCode::A, 'a'),
    (KeyCode::B, 'b'),
    (KeyCode::C, 'c'),
    (KeyCode::D, 'd'),
    (KeyCode::E, 'e'),
    (KeyCode::F, 'f'),
    (KeyCode::G, 'g'),
    (KeyCode::H, 'h'),
    (KeyCode::I, 'i'),
    (KeyCode::J, 'j'),
    (KeyCode::K, 'k'),
    (KeyCode::L, 'l'),
    (KeyCode::M, 'm'),
    (KeyCode::N, 'n'),
    (KeyCode::O, 'o'),
    (KeyCode::P, 'p'),
    (KeyCode::Q, 'q'),
    (KeyCode::R, 'r'),
    (KeyCode::S, 's'),
    (KeyCode::T, 't'),
    (KeyCode::U, 'u'),
    (KeyCode::V, 'v'),
    (KeyCode::W, 'w'),
    (KeyCode::X, 'x'),
    (KeyCode::Y, 'y'),
    (KeyCode::Z, 'z'),
    (KeyCode::Key0, '0'),
    (KeyCode::Key1, '1'),
    (KeyCode::Key2, '2'),
    (KeyCode::Key3, '3'),
    (KeyCode::Key4, '4'),
    (KeyCode::Key5, '5'),
    (KeyCode::Key6, '6'),
    (KeyCode::Key7, '7'),
    (KeyCode::Key8, '8'),
    (KeyCode::Key9, '9'),
    (KeyCode::Space, ' '),
];

/// Character produced by a key, for keys that produce exactly one.
///
/// Modifier-only and navigation keys yield `None`.
#[must_use]
pub fn char_for_key(key: KeyCode) -> Option<char> {
    CHARACTER_KEYS
        .iter()
        .find(|(code, _)| *code == key)
        .map(|(_, character)| *character)
}

/// Tracks which character keys are held so edges are forwarded exactly once.
#[doc(hidden)]
#[derive(Clone, Debug, Default)]
pub struct HeldCharacters {
    held: BTreeSet<char>,
}

impl HeldCharacters {
    /// Filters raw edges into the frame input, dropping repeats and orphan releases.
    pub fn observe(&mut self, pressed: &[char], released: &[char], input: &mut FrameInput) {
        for key in pressed {
            if self.held.insert(*key) {
                input.keys_pressed.push(*key);
            }
        }
        for key in released {
            if self.held.remove(key) {
                input.keys_released.push(*key);
            }
        }
    }

    /// Releases every held key, e.g. when the window is about to close.
    pub fn release_all(&mut self, input: &mut FrameInput) {
        input.keys_released.extend(std::mem::take(&mut self.held));
    }

    /// Number of keys currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Reports whether no key is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame rate once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    /// Records a frame and returns the average rate once a second has elapsed.
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }
        let per_second = self.frames as f32 / self.elapsed.as_secs_f32();
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some(per_second)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 1280,
            window_height: 720,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let mut held = HeldCharacters::default();
            let mut fps_counter = FpsCounter::default();

            loop {
                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));

                if is_key_pressed(KeyCode::Escape) {
                    let mut input = FrameInput::default();
                    held.release_all(&mut input);
                    update_scene(frame_dt, input, &mut scene);
                    info!("escape pressed; closing window");
                    break;
                }

                let input = gather_frame_input(&mut held);
                update_scene(frame_dt, input, &mut scene);

                macroquad::window::clear_background(to_macroquad_color(scene.background));
                draw_world(&scene);
                draw_overlay(&scene);

                if show_fps {
                    if let Some(per_second) = fps_counter.record_frame(frame_dt) {
                        info!(fps = per_second, "frame rate");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

fn gather_frame_input(held: &mut HeldCharacters) -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    let mut input = FrameInput {
        pointer: pointer_inside(
            Vec2::new(cursor_x, cursor_y),
            Vec2::new(
                macroquad::window::screen_width(),
                macroquad::window::screen_height(),
            ),
        ),
        ..FrameInput::default()
    };

    let pressed: Vec<char> = CHARACTER_KEYS
        .iter()
        .filter(|(code, _)| is_key_pressed(*code))
        .map(|(_, character)| *character)
        .collect();
    let released: Vec<char> = CHARACTER_KEYS
        .iter()
        .filter(|(code, _)| is_key_released(*code))
        .map(|(_, character)| *character)
        .collect();
    held.observe(&pressed, &released, &mut input);
    input
}

fn pointer_inside(cursor: Vec2, screen: Vec2) -> Option<Vec2> {
    let inside = cursor.x >= 0.0 && cursor.y >= 0.0 && cursor.x < screen.x && cursor.y < screen.y;
    inside.then_some(cursor)
}

fn draw_world(scene: &Scene) {
    set_camera(&Camera3D {
        position: to_macroquad_vec3(CAMERA_POSITION),
        target: to_macroquad_vec3(CAMERA_TARGET),
        up: vec3(0.0, 1.0, 0.0),
        ..Camera3D::default()
    });

    let grid_color = to_macroquad_color(scene.background.lighten(0.15));
    macroquad::models::draw_grid(20, 1.0, grid_color, grid_color);

    for sphere in &scene.spheres {
        macroquad::models::draw_sphere(
            to_macroquad_vec3(sphere.center),
            sphere.radius,
            None,
            to_macroquad_color(sphere.color),
        );
    }

    for marker in &scene.drums {
        let color = marker_color(marker, scene.pulse);
        let size = MARKER_SIZE * (1.0 + 0.4 * if marker.lit { scene.pulse } else { 0.0 });
        macroquad::models::draw_cube(
            to_macroquad_vec3(marker.position),
            vec3(size, size, size),
            None,
            to_macroquad_color(color),
        );
    }

    set_default_camera();
}

fn marker_color(marker: &DrumMarker, pulse: f32) -> Color {
    let lit = marker.drum.color();
    if marker.lit {
        lit.lighten(0.5 * pulse)
    } else {
        lit.mix(Color::from_rgb_u8(0x30, 0x30, 0x38), 0.8)
    }
}

fn draw_overlay(scene: &Scene) {
    let screen_height = macroquad::window::screen_height();
    let meters = [
        ("A", scene.drive.drive_a() as f32, Color::from_rgb_u8(0xff, 0x70, 0x43)),
        ("B", scene.drive.drive_b() as f32, Color::from_rgb_u8(0x42, 0xa5, 0xf5)),
    ];
    for (slot, (label, value, color)) in meters.into_iter().enumerate() {
        let (x, y, height) = meter_fill(slot, value, screen_height);
        let top = screen_height - METER_MARGIN - METER_HEIGHT;
        macroquad::shapes::draw_rectangle_lines(
            x,
            top,
            METER_WIDTH,
            METER_HEIGHT,
            2.0,
            macroquad::color::WHITE,
        );
        macroquad::shapes::draw_rectangle(x, y, METER_WIDTH, height, to_macroquad_color(color));
        let _ = macroquad::text::draw_text(
            label,
            x + 2.0,
            top - 6.0,
            HUD_FONT_SIZE * 0.75,
            macroquad::color::WHITE,
        );
    }

    let hud = scene.hud;
    let status = format!(
        "{} bpm  {}{}  triggers {}",
        hud.tempo.bpm(),
        hud.tier.label(),
        if hud.generated_melody { " (generated)" } else { "" },
        hud.triggers,
    );
    let _ = macroquad::text::draw_text(
        &status,
        METER_MARGIN,
        METER_MARGIN + HUD_FONT_SIZE,
        HUD_FONT_SIZE,
        macroquad::color::WHITE,
    );

    for (slot, marker) in scene.drums.iter().enumerate() {
        let color = marker_color(marker, scene.pulse);
        let _ = macroquad::text::draw_text(
            marker.drum.label(),
            METER_MARGIN + slot as f32 * 80.0,
            METER_MARGIN + HUD_FONT_SIZE * 2.2,
            HUD_FONT_SIZE * 0.8,
            to_macroquad_color(color),
        );
    }
}

/// Screen-space rectangle `(x, y, height)` filled for a meter slot.
fn meter_fill(slot: usize, value: f32, screen_height: f32) -> (f32, f32, f32) {
    let height = METER_HEIGHT * value.clamp(0.0, 1.0);
    let x = METER_MARGIN + slot as f32 * (METER_WIDTH + METER_MARGIN);
    let y = screen_height - METER_MARGIN - height;
    (x, y, height)
}

fn to_macroquad_vec3(vector: Vec3) -> MacroquadVec3 {
    vec3(vector.x, vector.y, vector.z)
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}
