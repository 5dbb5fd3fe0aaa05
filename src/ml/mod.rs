// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that touches Burn modules and optimisers lives in
// this layer.
//
//   resnet.rs    — ResNet bottleneck feature extractor with
//                  torchvision-compatible parameter names
//
//   model.rs     — Frozen backbone + trainable two-layer head,
//                  and the factory that loads pretrained
//                  weights and freezes the backbone
//
//   trainer.rs   — One training pass: forward, cross-entropy,
//                  backward, AdamW step on the head only
//
//   evaluator.rs — One evaluation pass on the inner backend:
//                  no gradients, batch norm in inference mode
//
// Both loops report to the run's TrainingHook and return an
// EpochSummary; neither owns the data loaders or the hook.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            He et al. (2016) Deep Residual Learning

/// ResNet-50 feature extractor
pub mod resnet;

/// Classifier architecture and model factory
pub mod model;

/// Training pass over the train split
pub mod trainer;

/// Evaluation pass over the test split
pub mod evaluator;

use burn::prelude::*;

use crate::domain::stats::{EpochStats, EpochSummary, Phase};

/// Number of rows whose highest score is at the target index.
pub(crate) fn count_correct<B: Backend>(scores: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    // argmax(1) returns shape [batch, 1]; flatten to [batch]
    let predicted = scores.argmax(1).flatten::<1>(0, 1);
    predicted
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

fn split_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Train => "Train set",
        Phase::Eval => "Test set",
    }
}

pub(crate) fn log_progress(stats: &EpochStats, dataset_len: usize, loss: f64) {
    tracing::info!(
        "{}: [{}/{} ({:.0}%)] Loss: {:.2} Accuracy: {}/{} ({:.2}%)",
        split_label(Phase::Train),
        stats.samples(),
        dataset_len,
        100.0 * stats.samples() as f64 / dataset_len.max(1) as f64,
        loss,
        stats.correct(),
        stats.samples(),
        100.0 * stats.running_accuracy(),
    );
}

pub(crate) fn log_summary(summary: &EpochSummary) {
    tracing::info!(
        "{}: Average loss: {:.4}, Accuracy: {}/{} ({:.0}%)",
        split_label(summary.phase),
        summary.avg_loss,
        summary.correct,
        summary.dataset_len,
        100.0 * summary.accuracy,
    );
}


#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_count_correct() {
        let device = Default::default();
        let scores = Tensor::<NdArray, 2>::from_floats(
            [[0.1, 0.9, 0.0], [0.8, 0.1, 0.1], [0.0, 0.2, 0.7]],
            &device,
        );
        let targets = Tensor::<NdArray, 1, Int>::from_ints([1, 2, 2], &device);
        assert_eq!(count_correct(scores, targets), 2);
    }
}
