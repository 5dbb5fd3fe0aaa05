// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types shared by every other layer:
//
//   stats.rs   — running loss / accuracy bookkeeping for one pass
//   traits.rs  — the telemetry hook abstraction and loop context
//   errors.rs  — typed failures for data, configuration and loops
//
// Nothing in here touches Burn, the filesystem or the GPU,
// so all of it is unit-testable on its own.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

/// Epoch statistics accumulator and summaries
pub mod stats;

/// Telemetry hook trait and per-epoch loop context
pub mod traits;

/// Error kinds callers match on
pub mod errors;
