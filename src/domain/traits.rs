// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The telemetry hook observes a run: which module is being
// trained, which loss is used, which phase is active, and the
// loss of every step. The training and evaluation loops only
// see `dyn TrainingHook`, so a JSON-lines writer, a no-op hook
// or a recording hook in tests all plug in the same way.
//
// The hook is created once by the orchestrator and handed into
// each loop through an EpochContext. There is no global hook.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)
//            Rust Book §17 (Trait Objects)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::stats::{EpochSummary, Phase};

// ─── ModuleSummary ────────────────────────────────────────────────────────────
/// What the hook is told about the model when it is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub name: String,
    /// Parameters of the feature extractor, never updated
    pub frozen_params: usize,
    /// Parameters the optimiser owns
    pub trainable_params: usize,
}

// ─── TrainingHook ─────────────────────────────────────────────────────────────
/// Telemetry attachment for a training run.
///
/// Implementations:
///   - JsonlHook → appends events to a JSON-lines file
///   - NullHook  → discards everything
pub trait TrainingHook {
    /// Attach to the model being trained.
    fn register_module(&mut self, module: &ModuleSummary) -> Result<()>;

    /// Attach to the loss function.
    fn register_loss(&mut self, name: &str) -> Result<()>;

    /// Switch between training and evaluating. Called at loop boundaries.
    fn set_mode(&mut self, phase: Phase);

    /// Current mode.
    fn mode(&self) -> Phase;

    /// Observe the loss of one step in the current mode.
    fn record_step(&mut self, loss: f64) -> Result<()>;

    /// Observe the summary of a finished pass.
    fn record_epoch(&mut self, summary: &EpochSummary) -> Result<()>;

    /// Flush anything buffered. Called once at the end of the run.
    fn close(&mut self) -> Result<()>;
}

// ─── EpochContext ─────────────────────────────────────────────────────────────
/// Everything a loop needs besides the model and data:
/// the 1-based epoch number and the run's hook.
pub struct EpochContext<'a> {
    pub epoch: usize,
    pub hook: &'a mut dyn TrainingHook,
}

impl<'a> EpochContext<'a> {
    pub fn new(epoch: usize, hook: &'a mut dyn TrainingHook) -> Self {
        Self { epoch, hook }
    }
}
