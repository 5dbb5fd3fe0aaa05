// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that reads or writes files on behalf of the other
// layers:
//
//   pretrained.rs — Backbone weights from a torchvision .pth
//                   state dict or a Burn record
//
//   checkpoint.rs — Final model weights, architecture, run
//                   config and class names in the model dir
//
//   metrics.rs    — One CSV row per finished train/eval pass
//
//   hook.rs       — Telemetry hook writing JSON lines, plus a
//                   no-op hook
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Pretrained backbone loading
pub mod pretrained;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Telemetry hook implementations
pub mod hook;
