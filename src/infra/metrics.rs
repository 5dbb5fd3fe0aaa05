// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per finished pass (train or eval) so the
// learning curve can be plotted after the run.
//
// Example CSV output:
//   epoch,phase,avg_loss,accuracy,correct,samples
//   1,train,4.712300,0.031000,210,6680
//   1,eval,4.530100,0.052600,44,836
//
// The header is written only when the file is new, so several
// runs into the same output directory append to one log.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::stats::EpochSummary;

const HEADER: &str = "epoch,phase,avg_loss,accuracy,correct,samples";

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Creates `dir` and the CSV (with header) if they don't exist yet.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, s: &EpochSummary) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{:.6},{:.6},{},{}",
            s.epoch, s.phase, s.avg_loss, s.accuracy, s.correct, s.samples,
        )?;

        tracing::debug!(
            "Logged epoch {} {} metrics: loss={:.4}, accuracy={:.4}",
            s.epoch,
            s.phase,
            s.avg_loss,
            s.accuracy,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
