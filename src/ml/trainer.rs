// ============================================================
// Layer 5 — Training Loop
// ============================================================
// One pass over the training split.
//
// Per batch:
//   1. backbone forward on the inner backend (frozen, outside
//      the autodiff graph, batch norm uses running stats)
//   2. features lifted back onto the autodiff backend
//   3. head forward → cross-entropy against the labels
//   4. backward, gradients collected for the head only
//   5. AdamW step on the head
//
// Key Burn insight:
//   - model.backbone.valid() gives the same weights on
//     B::InnerBackend, so no gradient is ever tracked for them
//   - Tensor::from_inner() turns the features into a leaf of
//     the autodiff graph; backward stops there
//   - the optimiser is typed over ClassifierHead<B>, it has no
//     way to reach the backbone
//
// Reference: Burn Book §5 (Custom Training Loop)
//            Loshchilov & Hutter (2019) Decoupled Weight Decay

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::SplitLoader;
use crate::domain::stats::{EpochStats, EpochSummary, Phase};
use crate::domain::traits::EpochContext;
use crate::ml::model::{Classifier, ClassifierHead};
use crate::ml::{count_correct, log_progress, log_summary};

/// Train the head for one epoch and hand the updated model back.
///
/// Fails if the pass saw fewer samples than the split holds, or if
/// the hook rejects a step.
pub fn train_epoch<B, O>(
    mut model: Classifier<B>,
    optim:     &mut O,
    lr:        f64,
    loader:    &SplitLoader<B>,
    ctx:       &mut EpochContext<'_>,
) -> Result<(Classifier<B>, EpochSummary)>
where
    B: AutodiffBackend,
    O: Optimizer<ClassifierHead<B>, B>,
{
    tracing::info!("Epoch: {} - Training...", ctx.epoch);
    ctx.hook.set_mode(Phase::Train);

    let frozen = model.backbone.valid();
    let mut stats = EpochStats::new();

    for batch in loader.iter() {
        let batch_size = batch.len();

        let features = Tensor::<B, 2>::from_inner(frozen.forward(batch.images.inner()));
        let scores = model.head.forward(features);

        let loss = CrossEntropyLossConfig::new()
            .init(&scores.device())
            .forward(scores.clone(), batch.targets.clone());
        let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();
        let correct = count_correct(scores.inner(), batch.targets.inner());

        // Backward pass + AdamW update on the head
        let grads = GradientsParams::from_grads(loss.backward(), &model.head);
        model.head = optim.step(lr, model.head, grads);

        if stats.record_batch(loss_value, batch_size, correct) {
            log_progress(&stats, loader.len(), loss_value);
        }
        ctx.hook.record_step(loss_value)?;
    }

    let summary = stats.finish(ctx.epoch, Phase::Train, loader.len())?;
    log_summary(&summary);
    ctx.hook.record_epoch(&summary)?;

    Ok((model, summary))
}
