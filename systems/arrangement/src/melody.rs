use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc::{self, Receiver, TryRecvError},
        Arc,
    },
    thread,
};

use quantum_groove_core::{ComplexityTier, Note};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::patterns::{pattern_for, Phrase};

/// Failures surfaced by a melody request.
#[derive(Debug, Error)]
pub enum MelodyError {
    /// The model could not serve the request.
    #[error("melody model unavailable: {0}")]
    Unavailable(String),
    /// The model answered with no notes.
    #[error("melody model returned no notes")]
    Empty,
    /// The worker exited without answering.
    #[error("melody worker disconnected before replying")]
    Disconnected,
    /// The worker thread could not be started.
    #[error("failed to spawn melody worker")]
    Spawn(#[source] std::io::Error),
}

/// Generative model that continues a seed phrase.
///
/// Implementations may block for as long as they need; they are always
/// invoked from a worker thread.
pub trait MelodyModel: Send + Sync + 'static {
    /// Produces a continuation of `seed` sampled at `temperature`.
    fn continue_sequence(&self, seed: &[Note], temperature: f64) -> Result<Vec<Note>, MelodyError>;
}

/// Observed state of an in-flight melody request.
#[derive(Debug)]
pub enum MelodyPoll {
    /// The worker has not answered yet.
    Pending,
    /// The worker produced a non-empty continuation.
    Ready(Vec<Note>),
    /// The worker failed.
    Failed(MelodyError),
    /// The request was cancelled before its answer was observed.
    Cancelled,
}

/// Single melody request running on a background thread.
///
/// Dropping the task cancels it; a cancelled worker discards its answer.
pub struct MelodyTask {
    receiver: Receiver<Result<Vec<Note>, MelodyError>>,
    cancelled: Arc<AtomicBool>,
}

impl MelodyTask {
    /// Starts a worker that asks `model` to continue `seed`.
    pub fn spawn(
        model: Arc<dyn MelodyModel>,
        seed: Vec<Note>,
        temperature: f64,
    ) -> Result<Self, MelodyError> {
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = Arc::clone(&cancelled);

        let _worker = thread::Builder::new()
            .name("melody-worker".to_owned())
            .spawn(move || {
                if worker_cancelled.load(Ordering::Acquire) {
                    return;
                }
                let result = model.continue_sequence(&seed, temperature);
                if !worker_cancelled.load(Ordering::Acquire) {
                    let _ = sender.send(result);
                }
            })
            .map_err(MelodyError::Spawn)?;

        Ok(Self {
            receiver,
            cancelled,
        })
    }

    /// Checks for an answer without blocking.
    ///
    /// A terminal answer is reported once; later polls report the worker as
    /// disconnected.
    pub fn poll(&mut self) -> MelodyPoll {
        if self.is_cancelled() {
            return MelodyPoll::Cancelled;
        }
        match self.receiver.try_recv() {
            Ok(Ok(notes)) if notes.is_empty() => MelodyPoll::Failed(MelodyError::Empty),
            Ok(Ok(notes)) => MelodyPoll::Ready(notes),
            Ok(Err(error)) => MelodyPoll::Failed(error),
            Err(TryRecvError::Empty) => MelodyPoll::Pending,
            Err(TryRecvError::Disconnected) => MelodyPoll::Failed(MelodyError::Disconnected),
        }
    }

    /// Asks the worker to discard its answer.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Reports whether [`MelodyTask::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Drop for MelodyTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for MelodyTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MelodyTask")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Keeps the active phrase in sync with the complexity tier.
///
/// The deterministic pattern for the tier plays until a generated melody
/// arrives. Failures leave the deterministic pattern in place.
pub struct MelodyDirector {
    model: Option<Arc<dyn MelodyModel>>,
    tier: ComplexityTier,
    requested: Option<ComplexityTier>,
    task: Option<MelodyTask>,
    phrase: Phrase,
    generated: bool,
}

impl MelodyDirector {
    /// Creates a director; without a model only the built-in patterns play.
    #[must_use]
    pub fn new(model: Option<Arc<dyn MelodyModel>>) -> Self {
        Self {
            model,
            tier: ComplexityTier::default(),
            requested: None,
            task: None,
            phrase: pattern_for(ComplexityTier::default()),
            generated: false,
        }
    }

    /// Switches to `tier`, issuing one melody request per change.
    pub fn select_tier(&mut self, tier: ComplexityTier, temperature: f64) {
        if self.requested == Some(tier) {
            return;
        }
        self.cancel();
        self.tier = tier;
        self.requested = Some(tier);
        self.phrase = pattern_for(tier);
        self.generated = false;

        let Some(model) = self.model.as_ref() else {
            return;
        };
        let seed: Vec<Note> = self.phrase.melody().copied().collect();
        match MelodyTask::spawn(Arc::clone(model), seed, temperature) {
            Ok(task) => {
                debug!(tier = tier.label(), temperature, "melody requested");
                self.task = Some(task);
            }
            Err(error) => {
                warn!(%error, tier = tier.label(), "melody request failed; keeping built-in pattern");
            }
        }
    }

    /// Collects a finished request; returns `true` when the active phrase changed.
    pub fn poll(&mut self) -> bool {
        let Some(task) = self.task.as_mut() else {
            return false;
        };
        match task.poll() {
            MelodyPoll::Pending => false,
            MelodyPoll::Ready(notes) => {
                self.task = None;
                self.phrase = pattern_for(self.tier).with_melody(&notes);
                self.generated = true;
                info!(
                    tier = self.tier.label(),
                    notes = notes.len(),
                    "generated melody active"
                );
                true
            }
            MelodyPoll::Failed(error) => {
                self.task = None;
                warn!(%error, tier = self.tier.label(), "melody generation failed; keeping built-in pattern");
                false
            }
            MelodyPoll::Cancelled => {
                self.task = None;
                false
            }
        }
    }

    /// Phrase the sequencer should play.
    #[must_use]
    pub const fn active_phrase(&self) -> &Phrase {
        &self.phrase
    }

    /// Tier the active phrase belongs to.
    #[must_use]
    pub const fn tier(&self) -> ComplexityTier {
        self.tier
    }

    /// Reports whether a request is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.task.is_some()
    }

    /// Reports whether the active melody came from the model.
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        self.generated
    }

    /// Cancels the in-flight request, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
            debug!(tier = self.tier.label(), "melody request cancelled");
        }
    }

    /// Cancels any request and returns to the simple built-in pattern.
    pub fn reset(&mut self) {
        self.cancel();
        self.tier = ComplexityTier::default();
        self.requested = None;
        self.phrase = pattern_for(self.tier);
        self.generated = false;
    }
}

impl fmt::Debug for MelodyDirector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MelodyDirector")
            .field("has_model", &self.model.is_some())
            .field("tier", &self.tier)
            .field("requested", &self.requested)
            .field("pending", &self.task.is_some())
            .field("generated", &self.generated)
            .finish()
    }
}

const PENTATONIC: [u8; 5] = [0, 2, 4, 7, 9];

fn pentatonic_degree(pitch: u8) -> i32 {
    let octave = i32::from(pitch / 12);
    let class = pitch % 12;
    let index = PENTATONIC
        .iter()
        .rposition(|offset| *offset <= class)
        .unwrap_or(0) as i32;
    octave * 5 + index
}

fn pitch_for_degree(degree: i32) -> u8 {
    let degree = degree.max(0);
    let octave = degree / 5;
    let offset = i32::from(PENTATONIC[(degree % 5) as usize]);
    (octave * 12 + offset).clamp(0, 127) as u8
}

/// Built-in model that varies the seed along the major pentatonic scale.
///
/// Each request draws from a ChaCha stream derived from the base seed and a
/// request counter, so a fixed seed yields a reproducible sequence of answers.
#[derive(Debug)]
pub struct ProceduralVariation {
    seed: u64,
    requests: AtomicU64,
}

impl ProceduralVariation {
    /// Creates a model rooted at `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            requests: AtomicU64::new(0),
        }
    }
}

impl MelodyModel for ProceduralVariation {
    fn continue_sequence(&self, seed: &[Note], temperature: f64) -> Result<Vec<Note>, MelodyError> {
        if seed.is_empty() {
            return Err(MelodyError::Empty);
        }
        let request = self.requests.fetch_add(1, Ordering::Relaxed);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ request.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        let spread = if temperature.is_finite() {
            temperature.clamp(0.0, 2.0)
        } else {
            0.0
        };

        let notes = seed
            .iter()
            .map(|note| {
                let shift = (rng.gen_range(-1.0..=1.0) * spread * 2.0).round() as i32;
                let jitter = (rng.gen_range(-1.0..=1.0) * spread * 10.0).round() as i32;
                Note {
                    pitch: pitch_for_degree(pentatonic_degree(note.pitch) + shift),
                    velocity: (i32::from(note.velocity) + jitter).clamp(1, 127) as u8,
                    ..*note
                }
            })
            .collect();
        Ok(notes)
    }
}
