// ============================================================
// Layer 3 — Epoch Statistics
// ============================================================
// Running totals for one pass over a dataset split.
//
//   loss_sum  += mean_batch_loss × batch_size
//   correct   += number of argmax hits in the batch
//   samples   += batch_size
//
// At the end of the pass the totals are divided by the size of
// the split (not by the number of batches), so a short last
// batch is weighted by the samples it actually held.
//
// Reference: Rust Book §5 (Structs), §6 (Enums)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::LoopError;

/// A progress line is emitted each time the cumulative sample
/// count crosses a multiple of this value.
pub const PROGRESS_INTERVAL: usize = 500;

/// Which loop produced a set of statistics. Also doubles as the
/// telemetry hook mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Train,
    Eval,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Train => f.write_str("train"),
            Phase::Eval => f.write_str("eval"),
        }
    }
}

/// Accumulator for one pass. Created fresh by every loop call.
#[derive(Debug, Clone, Default)]
pub struct EpochStats {
    loss_sum: f64,
    correct: usize,
    samples: usize,
    batches: usize,
}

impl EpochStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch into the running totals.
    ///
    /// Returns `true` when this batch pushed the cumulative sample
    /// count past a multiple of [`PROGRESS_INTERVAL`].
    pub fn record_batch(&mut self, mean_loss: f64, batch_size: usize, correct: usize) -> bool {
        let before = self.samples / PROGRESS_INTERVAL;

        self.loss_sum += mean_loss * batch_size as f64;
        self.correct += correct;
        self.samples += batch_size;
        self.batches += 1;

        self.samples / PROGRESS_INTERVAL > before
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    /// Accuracy over the samples seen so far.
    pub fn running_accuracy(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.correct as f64 / self.samples as f64
        }
    }

    /// Close the pass. Fails if fewer samples were seen than the
    /// split holds, which happens when an image could not be decoded.
    pub fn finish(
        self,
        epoch: usize,
        phase: Phase,
        dataset_len: usize,
    ) -> Result<EpochSummary, LoopError> {
        if self.samples != dataset_len {
            return Err(LoopError::ShortPass {
                phase,
                seen: self.samples,
                expected: dataset_len,
            });
        }

        let (avg_loss, accuracy) = if dataset_len == 0 {
            (0.0, 0.0)
        } else {
            (
                self.loss_sum / dataset_len as f64,
                self.correct as f64 / dataset_len as f64,
            )
        };

        Ok(EpochSummary {
            epoch,
            phase,
            avg_loss,
            accuracy,
            correct: self.correct,
            samples: self.samples,
            dataset_len,
            batches: self.batches,
        })
    }
}

/// Final numbers for one pass, logged and written to the metrics CSV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: usize,
    pub phase: Phase,
    pub avg_loss: f64,
    /// Fraction in [0.0, 1.0]
    pub accuracy: f64,
    pub correct: usize,
    pub samples: usize,
    pub dataset_len: usize,
    pub batches: usize,
}
