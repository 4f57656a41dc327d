#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Quantum Groove adapters.
//!
//! The [`Scene`] is a backend-agnostic description of the reactive view: one
//! sphere per basis state, a ring of drum markers, a trigger pulse, drive
//! meters, and a HUD. Adapters feed it [`VisualFrame`]s received through a
//! [`FrameMailbox`] and hand it to a [`RenderingBackend`] for drawing.

use anyhow::Result as AnyResult;
use glam::{Vec2, Vec3};
use quantum_groove_core::{
    Command, ComplexityTier, DriveSignal, RhythmTrigger, Tempo, VisualFrame, VisualSurface,
    BASIS_STATES,
};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        Self {
            red: self.red + (1.0 - self.red) * amount,
            green: self.green + (1.0 - self.green) * amount,
            blue: self.blue + (1.0 - self.blue) * amount,
            alpha: self.alpha,
        }
    }

    /// Linear interpolation towards `other`, keeping this color's alpha.
    #[must_use]
    pub fn mix(self, other: Color, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        Self {
            red: self.red + (other.red - self.red) * amount,
            green: self.green + (other.green - self.green) * amount,
            blue: self.blue + (other.blue - self.blue) * amount,
            alpha: self.alpha,
        }
    }
}

const BACKGROUND_REST: Color = Color::from_rgb_u8(0x0b, 0x0d, 0x1a);
const BACKGROUND_MOTION: Color = Color::from_rgb_u8(0x5a, 0x1d, 0x3c);
const BACKGROUND_KEYS: Color = Color::from_rgb_u8(0x12, 0x3f, 0x6b);

const BASIS_PALETTE: [Color; BASIS_STATES] = [
    Color::from_rgb_u8(0x4f, 0xc3, 0xf7),
    Color::from_rgb_u8(0xff, 0x8a, 0x65),
    Color::from_rgb_u8(0xba, 0x68, 0xc8),
    Color::from_rgb_u8(0xff, 0xd5, 0x4f),
];

/// Background tint derived from the drive signal.
///
/// Drive-A warms the tint, drive-B cools it; both mix over a dark base.
#[must_use]
pub fn background_for(drive: DriveSignal) -> Color {
    BACKGROUND_REST
        .mix(BACKGROUND_MOTION, drive.drive_a() as f32 * 0.8)
        .mix(BACKGROUND_KEYS, drive.drive_b() as f32 * 0.5)
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Pointer position in window pixels, when the pointer is over the window.
    pub pointer: Option<Vec2>,
    /// Single-character keys that went down this frame.
    pub keys_pressed: Vec<char>,
    /// Single-character keys that were released this frame.
    pub keys_released: Vec<char>,
}

impl FrameInput {
    /// Translates the snapshot into session commands, followed by a tick of `dt`.
    pub fn commands(&self, dt: Duration, out: &mut Vec<Command>) {
        if let Some(pointer) = self.pointer {
            out.push(Command::PointerMoved {
                x: f64::from(pointer.x),
                y: f64::from(pointer.y),
            });
        }
        out.extend(
            self.keys_pressed
                .iter()
                .map(|key| Command::KeyPressed { key: *key }),
        );
        out.extend(
            self.keys_released
                .iter()
                .map(|key| Command::KeyReleased { key: *key }),
        );
        out.push(Command::Tick { dt });
    }
}

/// Geometry used to lay out the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLayout {
    /// Horizontal distance between neighbouring spheres in world units.
    pub sphere_spacing: f32,
    /// Radius of a sphere whose probability is zero.
    pub min_radius: f32,
    /// Radius of a sphere whose probability is one.
    pub max_radius: f32,
    /// Vertical offset of a sphere whose amplitude is one.
    pub max_lift: f32,
    /// Time for the trigger pulse to fall to half its strength.
    pub pulse_half_life: Duration,
}

impl SceneLayout {
    /// Validates and creates a layout.
    pub fn new(
        sphere_spacing: f32,
        min_radius: f32,
        max_radius: f32,
        max_lift: f32,
        pulse_half_life: Duration,
    ) -> Result<Self, RenderingError> {
        if !(sphere_spacing.is_finite() && sphere_spacing > 0.0) {
            return Err(RenderingError::InvalidSpacing { sphere_spacing });
        }
        if !(min_radius >= 0.0 && max_radius.is_finite() && min_radius <= max_radius) {
            return Err(RenderingError::InvalidRadii {
                min_radius,
                max_radius,
            });
        }
        if pulse_half_life.is_zero() {
            return Err(RenderingError::ZeroPulseHalfLife);
        }
        Ok(Self {
            sphere_spacing,
            min_radius,
            max_radius,
            max_lift,
            pulse_half_life,
        })
    }

    /// Radius of a sphere carrying the given probability.
    #[must_use]
    pub fn radius_for(&self, probability: f64) -> f32 {
        let probability = probability.clamp(0.0, 1.0) as f32;
        self.min_radius + (self.max_radius - self.min_radius) * probability
    }

    /// Resting center of the sphere for a basis index.
    #[must_use]
    pub fn sphere_anchor(&self, index: usize) -> Vec3 {
        let centered = index as f32 - (BASIS_STATES as f32 - 1.0) * 0.5;
        Vec3::new(centered * self.sphere_spacing, 0.0, 0.0)
    }
}

impl Default for SceneLayout {
    fn default() -> Self {
        Self {
            sphere_spacing: 2.5,
            min_radius: 0.15,
            max_radius: 1.0,
            max_lift: 1.5,
            pulse_half_life: Duration::from_millis(120),
        }
    }
}

/// Sphere representing one basis state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BasisSphere {
    /// Basis index the sphere represents.
    pub index: usize,
    /// Center of the sphere in world units.
    pub center: Vec3,
    /// Radius derived from the probability.
    pub radius: f32,
    /// Fill color.
    pub color: Color,
    /// Probability shown by the sphere.
    pub probability: f32,
}

/// Drum voices shown in the marker ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Drum {
    /// Kick drum.
    Kick,
    /// Snare drum.
    Snare,
    /// Closed hi-hat.
    HiHat,
    /// Hand clap.
    Clap,
}

impl Drum {
    /// Every drum in marker order.
    pub const ALL: [Drum; 4] = [Self::Kick, Self::Snare, Self::HiHat, Self::Clap];

    /// Short label drawn under the marker.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Kick => "kick",
            Self::Snare => "snare",
            Self::HiHat => "hat",
            Self::Clap => "clap",
        }
    }

    /// Whether the drum plays in `trigger`.
    #[must_use]
    pub const fn fires(self, trigger: &RhythmTrigger) -> bool {
        match self {
            Self::Kick => trigger.kick,
            Self::Snare => trigger.snare,
            Self::HiHat => trigger.hihat,
            Self::Clap => trigger.clap,
        }
    }

    /// Marker color when lit.
    #[must_use]
    pub const fn color(self) -> Color {
        match self {
            Self::Kick => Color::from_rgb_u8(0xef, 0x53, 0x50),
            Self::Snare => Color::from_rgb_u8(0x66, 0xbb, 0x6a),
            Self::HiHat => Color::from_rgb_u8(0xff, 0xee, 0x58),
            Self::Clap => Color::from_rgb_u8(0xab, 0x47, 0xbc),
        }
    }
}

/// Marker flashing when its drum fires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrumMarker {
    /// Drum the marker belongs to.
    pub drum: Drum,
    /// Position of the marker in world units.
    pub position: Vec3,
    /// Whether the drum fired in the most recent trigger.
    pub lit: bool,
}

/// Transport details printed in the heads-up display.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HudPresentation {
    /// Current tempo.
    pub tempo: Tempo,
    /// Current pattern tier.
    pub tier: ComplexityTier,
    /// Triggers fired since the session started.
    pub triggers: u64,
    /// Whether the melody came from the generative model.
    pub generated_melody: bool,
}

/// Scene description consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Geometry of the scene.
    pub layout: SceneLayout,
    /// One sphere per basis state, in basis order.
    pub spheres: [BasisSphere; BASIS_STATES],
    /// Ring of drum markers.
    pub drums: [DrumMarker; 4],
    /// Strength of the trigger pulse in `[0, 1]`.
    pub pulse: f32,
    /// Drive values shown by the meters.
    pub drive: DriveSignal,
    /// Background tint.
    pub background: Color,
    /// Transport details.
    pub hud: HudPresentation,
    /// Most recent frame applied to the scene.
    pub frame: VisualFrame,
}

impl Scene {
    /// Creates a resting scene.
    #[must_use]
    pub fn new(layout: SceneLayout) -> Self {
        let spheres = std::array::from_fn(|index| BasisSphere {
            index,
            center: layout.sphere_anchor(index),
            radius: layout.min_radius,
            color: BASIS_PALETTE[index],
            probability: 0.0,
        });
        let ring_z = layout.sphere_spacing;
        let drums = std::array::from_fn(|slot| {
            let anchor = layout.sphere_anchor(slot);
            DrumMarker {
                drum: Drum::ALL[slot],
                position: Vec3::new(anchor.x, -layout.max_lift, ring_z),
                lit: false,
            }
        });
        let mut scene = Self {
            layout,
            spheres,
            drums,
            pulse: 0.0,
            drive: DriveSignal::ZERO,
            background: background_for(DriveSignal::ZERO),
            hud: HudPresentation::default(),
            frame: VisualFrame::default(),
        };
        scene.apply_frame(&VisualFrame::default());
        scene
    }

    /// Updates every visual channel from a session frame.
    pub fn apply_frame(&mut self, frame: &VisualFrame) {
        let measured = frame
            .snapshot
            .last_measurement
            .map(|measurement| usize::from(measurement.state_value()));
        let layout = self.layout;
        for sphere in &mut self.spheres {
            let probability = frame.snapshot.probabilities[sphere.index];
            let amplitude = frame.snapshot.amplitudes[sphere.index] as f32;
            sphere.probability = probability as f32;
            sphere.radius = layout.radius_for(probability);
            sphere.center = layout.sphere_anchor(sphere.index) + Vec3::Y * amplitude * layout.max_lift;
            let base = BASIS_PALETTE[sphere.index];
            sphere.color = if measured == Some(sphere.index) {
                base.lighten(0.2 + 0.5 * self.pulse)
            } else {
                base
            };
        }
        if frame.triggered {
            self.pulse = 1.0;
        }
        for marker in &mut self.drums {
            marker.lit = marker.drum.fires(&frame.trigger);
        }
        self.drive = frame.drive;
        self.background = background_for(frame.drive);
        self.frame = *frame;
    }

    /// Lets the trigger pulse fade by `dt`.
    pub fn decay(&mut self, dt: Duration) {
        let half_lives = dt.as_secs_f32() / self.layout.pulse_half_life.as_secs_f32();
        self.pulse *= 0.5_f32.powf(half_lives);
        if self.pulse < 1e-3 {
            self.pulse = 0.0;
        }
    }
}

/// Visual collaborator that keeps the latest frame until the render loop collects it.
#[derive(Clone, Debug, Default)]
pub struct FrameMailbox {
    latest: Option<VisualFrame>,
    triggers: u64,
}

impl FrameMailbox {
    /// Creates an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the newest frame, if one arrived since the last call.
    pub fn take(&mut self) -> Option<VisualFrame> {
        self.latest.take()
    }

    /// Number of triggered frames delivered so far.
    #[must_use]
    pub const fn triggers(&self) -> u64 {
        self.triggers
    }
}

impl VisualSurface for FrameMailbox {
    fn update(&mut self, frame: &VisualFrame) {
        if frame.triggered {
            self.triggers = self.triggers.saturating_add(1);
        }
        self.latest = Some(*frame);
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            scene,
        }
    }
}

/// Rendering backend capable of presenting Quantum Groove scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, and may mutate the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Sphere spacing must be a positive finite number.
    InvalidSpacing {
        /// Provided spacing that failed validation.
        sphere_spacing: f32,
    },
    /// Radii must satisfy `0 <= min <= max`.
    InvalidRadii {
        /// Provided minimum radius.
        min_radius: f32,
        /// Provided maximum radius.
        max_radius: f32,
    },
    /// The pulse must fade over a non-zero duration.
    ZeroPulseHalfLife,
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSpacing { sphere_spacing } => {
                write!(f, "sphere spacing must be positive (received {sphere_spacing})")
            }
            Self::InvalidRadii {
                min_radius,
                max_radius,
            } => write!(
                f,
                "sphere radii must satisfy 0 <= min <= max (received {min_radius}..{max_radius})"
            ),
            Self::ZeroPulseHalfLife => write!(f, "pulse half-life must be non-zero"),
        }
    }
}

impl Error for RenderingError {}
