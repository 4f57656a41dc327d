#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic two-element register simulator used as a stochastic rhythm source.
//!
//! Every pass starts from the `[1, 0, 0, 0]` basis state, runs a fixed gate
//! sequence selected by the drive signal, and collapses the register with a
//! single uniform draw from a seeded ChaCha generator. Only the collapse is
//! stochastic; [`prepare_register`] reproduces the pre-collapse state exactly
//! for identical drive values.
//!
//! Amplitudes are real numbers. The phase gate applies only the cosine of its
//! angle, so the register never represents complex phase.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use quantum_groove_core::{clamp_unit, Measurement, QuantumSnapshot, RhythmTrigger, BASIS_STATES};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Drive-A level above which element 0 is placed in superposition.
pub const FIRST_SUPERPOSITION_THRESHOLD: f64 = 0.3;

/// Drive-A level above which element 1 is placed in superposition.
pub const SECOND_SUPERPOSITION_THRESHOLD: f64 = 0.6;

/// One of the two simulated elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    /// Element addressed by bit 0 of the basis index.
    Zero,
    /// Element addressed by bit 1 of the basis index.
    One,
}

impl Element {
    /// Bit mask selecting this element within a basis index.
    #[must_use]
    pub const fn mask(self) -> usize {
        match self {
            Self::Zero => 0b01,
            Self::One => 0b10,
        }
    }
}

/// Lifecycle stage of the register within a single pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegisterStage {
    /// Basis state, no gate applied yet.
    Reset,
    /// At least one superposition transform has been applied.
    Superposed,
    /// The conditional flip has been applied.
    Entangled,
    /// All probability mass sits on one basis index.
    Collapsed,
}

/// Four real amplitudes and the probabilities derived from them.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantumRegister {
    amplitudes: [f64; BASIS_STATES],
    probabilities: [f64; BASIS_STATES],
    stage: RegisterStage,
}

impl QuantumRegister {
    /// Creates a register in the `[1, 0, 0, 0]` basis state.
    #[must_use]
    pub fn ground() -> Self {
        Self::from_amplitudes([1.0, 0.0, 0.0, 0.0])
    }

    /// Creates a register from arbitrary real amplitudes.
    ///
    /// Probabilities are derived immediately; an all-zero vector yields
    /// all-zero probabilities.
    #[must_use]
    pub fn from_amplitudes(amplitudes: [f64; BASIS_STATES]) -> Self {
        let mut register = Self {
            amplitudes,
            probabilities: [0.0; BASIS_STATES],
            stage: RegisterStage::Reset,
        };
        register.refresh_probabilities();
        register
    }

    /// Returns the register to the basis state.
    pub fn reset(&mut self) {
        *self = Self::ground();
    }

    /// Spreads amplitude across every basis pair that differs only in `element`'s bit.
    pub fn superpose(&mut self, element: Element) {
        let mask = element.mask();
        for low in (0..BASIS_STATES).filter(|index| index & mask == 0) {
            let high = low | mask;
            let x = self.amplitudes[low];
            let y = self.amplitudes[high];
            self.amplitudes[low] = (x + y) * FRAC_1_SQRT_2;
            self.amplitudes[high] = (x - y) * FRAC_1_SQRT_2;
        }
        self.stage = RegisterStage::Superposed;
        self.refresh_probabilities();
    }

    /// Weights every index whose `element` bit is set by `cos(phase)`.
    ///
    /// The sine component would be the imaginary part of the rotation; it is
    /// not applied because amplitudes are real-valued.
    pub fn rotate_phase(&mut self, element: Element, phase: f64) {
        let real = phase.cos();
        let mask = element.mask();
        for (index, amplitude) in self.amplitudes.iter_mut().enumerate() {
            if index & mask != 0 {
                *amplitude *= real;
            }
        }
        self.refresh_probabilities();
    }

    /// Swaps amplitudes across the `target` bit for every index whose `control` bit is set.
    ///
    /// Each affected pair is exchanged exactly once.
    pub fn conditional_flip(&mut self, control: Element, target: Element) {
        let control_mask = control.mask();
        let target_mask = target.mask();
        for index in 0..BASIS_STATES {
            let partner = index ^ target_mask;
            if index & control_mask != 0 && index < partner {
                self.amplitudes.swap(index, partner);
            }
        }
        self.stage = RegisterStage::Entangled;
        self.refresh_probabilities();
    }

    /// Collapses the register onto a single basis index using the uniform draw `r`.
    ///
    /// The first index whose running probability sum exceeds `r` wins. When no
    /// index qualifies (rounding, or an all-zero register) the last index is
    /// chosen.
    pub fn collapse(&mut self, r: f64) -> usize {
        let mut running = 0.0;
        let chosen = self
            .probabilities
            .iter()
            .position(|probability| {
                running += probability;
                running > r
            })
            .unwrap_or(BASIS_STATES - 1);

        self.amplitudes = [0.0; BASIS_STATES];
        self.amplitudes[chosen] = 1.0;
        self.probabilities = self.amplitudes;
        self.stage = RegisterStage::Collapsed;
        chosen
    }

    /// Real amplitudes indexed by basis label.
    #[must_use]
    pub const fn amplitudes(&self) -> &[f64; BASIS_STATES] {
        &self.amplitudes
    }

    /// Normalised probabilities indexed by basis label.
    #[must_use]
    pub const fn probabilities(&self) -> &[f64; BASIS_STATES] {
        &self.probabilities
    }

    /// Current lifecycle stage.
    #[must_use]
    pub const fn stage(&self) -> RegisterStage {
        self.stage
    }

    fn refresh_probabilities(&mut self) {
        let mut total = 0.0;
        for (probability, amplitude) in self.probabilities.iter_mut().zip(self.amplitudes) {
            *probability = amplitude * amplitude;
            total += *probability;
        }

        if total > 0.0 {
            for probability in &mut self.probabilities {
                *probability /= total;
            }
        } else {
            self.probabilities = [0.0; BASIS_STATES];
        }
    }
}

impl Default for QuantumRegister {
    fn default() -> Self {
        Self::ground()
    }
}

/// Phase angle derived from drive-B.
#[must_use]
pub fn phase_for(drive_b: f64) -> f64 {
    clamp_unit(drive_b) * PI
}

/// Runs the deterministic part of a pass: reset, gates, and probability derivation.
#[must_use]
pub fn prepare_register(drive_a: f64, drive_b: f64) -> QuantumRegister {
    let drive_a = clamp_unit(drive_a);
    let phase = phase_for(drive_b);

    let mut register = QuantumRegister::ground();
    if drive_a > FIRST_SUPERPOSITION_THRESHOLD {
        register.superpose(Element::Zero);
    }
    if drive_a > SECOND_SUPERPOSITION_THRESHOLD {
        register.superpose(Element::One);
    }
    register.rotate_phase(Element::Zero, phase);
    register.conditional_flip(Element::Zero, Element::One);
    register
}

/// Simulator that turns drive values into rhythm triggers.
#[derive(Debug)]
pub struct QuantumRhythm {
    register: QuantumRegister,
    rng: ChaCha8Rng,
    phase: f64,
    last_measurement: Option<Measurement>,
    passes: u64,
}

impl QuantumRhythm {
    /// Creates a simulator whose collapse draws come from the provided seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            register: QuantumRegister::ground(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            phase: 0.0,
            last_measurement: None,
            passes: 0,
        }
    }

    /// Runs a full pass and returns the resulting rhythm trigger.
    pub fn process_input(&mut self, drive_a: f64, drive_b: f64) -> RhythmTrigger {
        let r: f64 = self.rng.gen();
        self.process_with_draw(drive_a, drive_b, r)
    }

    /// Runs a full pass using an explicit collapse draw in `[0, 1)`.
    pub fn process_with_draw(&mut self, drive_a: f64, drive_b: f64, r: f64) -> RhythmTrigger {
        self.register = prepare_register(drive_a, drive_b);
        self.phase = phase_for(drive_b);

        let index = self.register.collapse(r);
        let measurement = Measurement::from_index(index);
        let trigger = RhythmTrigger::from_measurement(measurement);
        self.last_measurement = Some(measurement);
        self.passes = self.passes.saturating_add(1);

        debug!(
            pass = self.passes,
            index,
            phase = self.phase,
            ?trigger,
            "register collapsed"
        );
        trigger
    }

    /// Exact post-collapse state of the most recent pass.
    #[must_use]
    pub fn snapshot(&self) -> QuantumSnapshot {
        QuantumSnapshot {
            amplitudes: *self.register.amplitudes(),
            probabilities: *self.register.probabilities(),
            last_measurement: self.last_measurement,
            phase: self.phase,
        }
    }

    /// Register as left by the most recent pass.
    #[must_use]
    pub fn register(&self) -> &QuantumRegister {
        &self.register
    }

    /// Number of passes run since construction or the last reset.
    #[must_use]
    pub const fn passes(&self) -> u64 {
        self.passes
    }

    /// Discards the register state and restarts the draw sequence from `seed`.
    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superpose_on_ground_state_splits_evenly() {
        let mut register = QuantumRegister::ground();
        register.superpose(Element::Zero);
        assert!((register.amplitudes()[0] - FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((register.amplitudes()[1] - FRAC_1_SQRT_2).abs() < 1e-12);
        assert_eq!(register.stage(), RegisterStage::Superposed);
    }

    #[test]
    fn conditional_flip_moves_controlled_amplitude() {
        let mut register = QuantumRegister::from_amplitudes([0.0, 1.0, 0.0, 0.0]);
        register.conditional_flip(Element::Zero, Element::One);
        assert_eq!(register.amplitudes(), &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(register.probabilities(), &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn conditional_flip_ignores_uncontrolled_indices() {
        let mut register = QuantumRegister::from_amplitudes([0.6, 0.0, 0.8, 0.0]);
        register.conditional_flip(Element::Zero, Element::One);
        assert_eq!(register.amplitudes(), &[0.6, 0.0, 0.8, 0.0]);
    }

    #[test]
    fn phase_rotation_scales_only_flagged_indices() {
        let mut register = QuantumRegister::from_amplitudes([0.5, 0.5, 0.5, 0.5]);
        register.rotate_phase(Element::Zero, PI);
        assert_eq!(register.amplitudes(), &[0.5, -0.5, 0.5, -0.5]);
        assert_eq!(register.probabilities(), &[0.25; 4]);
    }

    #[test]
    fn zero_register_collapses_to_last_index() {
        let mut register = QuantumRegister::from_amplitudes([0.0; 4]);
        assert_eq!(register.probabilities(), &[0.0; 4]);
        assert_eq!(register.collapse(0.0), 3);
        assert_eq!(register.amplitudes(), &[0.0, 0.0, 0.0, 1.0]);
    }
}
