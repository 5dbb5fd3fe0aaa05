// ============================================================
// Layer 5 — Evaluation Loop
// ============================================================
// One pass over the test split with a model on a plain
// (non-autodiff) backend. The caller converts a training model
// with `model.valid()` first, which also puts batch norm into
// inference mode. No optimiser, no gradients, the model is only
// borrowed. Only the end-of-pass summary is logged.
//
// Reference: Burn Book §5 (Custom Training Loop)

use anyhow::Result;
use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};

use crate::data::SplitLoader;
use crate::domain::stats::{EpochStats, EpochSummary, Phase};
use crate::domain::traits::EpochContext;
use crate::ml::model::Classifier;
use crate::ml::{count_correct, log_summary};

pub fn evaluate_epoch<B: Backend>(
    model:  &Classifier<B>,
    loader: &SplitLoader<B>,
    ctx:    &mut EpochContext<'_>,
) -> Result<EpochSummary> {
    tracing::info!("Epoch: {} - Testing...", ctx.epoch);
    ctx.hook.set_mode(Phase::Eval);

    let mut stats = EpochStats::new();

    for batch in loader.iter() {
        let batch_size = batch.len();
        let scores = model.forward(batch.images);

        let loss_value: f64 = CrossEntropyLossConfig::new()
            .init(&scores.device())
            .forward(scores.clone(), batch.targets.clone())
            .into_scalar()
            .elem::<f64>();
        let correct = count_correct(scores, batch.targets);

        // progress lines are a training-only output
        stats.record_batch(loss_value, batch_size, correct);
        ctx.hook.record_step(loss_value)?;
    }

    let summary = stats.finish(ctx.epoch, Phase::Eval, loader.len())?;
    log_summary(&summary);
    ctx.hook.record_epoch(&summary)?;

    Ok(summary)
}
