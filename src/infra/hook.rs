// ============================================================
// Layer 6 — Telemetry Hook
// ============================================================
// Concrete TrainingHook implementations.
//
//   JsonlHook → one JSON object per line in <dir>/steps.jsonl
//   NullHook  → tracks the mode, writes nothing
//
// Event lines:
//   {"event":"module","name":"resnet50","frozen_params":..,"trainable_params":..}
//   {"event":"loss","name":"cross_entropy"}
//   {"event":"mode","mode":"train"}
//   {"event":"step","mode":"train","step":17,"loss":4.81}
//   {"event":"epoch","epoch":1,"phase":"eval","avg_loss":..,..}
//
// Step numbers count per mode and keep running across epochs.
// Only every `save_interval`-th step is written.
//
// The hook is configured by an optional JSON file:
//   { "enabled": true, "out_dir": "/tmp/hook", "save_interval": 10 }
// Every field may be left out.
//
// Reference: serde_json documentation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::domain::stats::{EpochSummary, Phase};
use crate::domain::traits::{ModuleSummary, TrainingHook};

/// Hook settings read from the `--hook_config` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    pub enabled: bool,
    /// Defaults to `<output_dir>/hook`
    pub out_dir: Option<PathBuf>,
    pub save_interval: usize,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            out_dir: None,
            save_interval: 1,
        }
    }
}

impl HookConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read hook config '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid hook config '{}'", path.display()))
    }

    /// Build the hook this configuration describes.
    pub fn create(&self, output_dir: &Path) -> Result<Box<dyn TrainingHook>> {
        if !self.enabled {
            tracing::info!("Telemetry hook disabled");
            return Ok(Box::new(NullHook::new()));
        }
        let dir = self
            .out_dir
            .clone()
            .unwrap_or_else(|| output_dir.join("hook"));
        let hook = JsonlHook::create(&dir, self.save_interval)?;
        tracing::info!("Telemetry hook writing to '{}'", hook.path().display());
        Ok(Box::new(hook))
    }
}

// ─── JsonlHook ────────────────────────────────────────────────────────────────
pub struct JsonlHook {
    path: PathBuf,
    writer: BufWriter<File>,
    mode: Phase,
    save_interval: usize,
    train_steps: usize,
    eval_steps: usize,
}

impl JsonlHook {
    pub fn create(dir: &Path, save_interval: usize) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create hook directory '{}'", dir.display()))?;
        let path = dir.join("steps.jsonl");
        let file = File::create(&path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            mode: Phase::Train,
            save_interval: save_interval.max(1),
            train_steps: 0,
            eval_steps: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_event(&mut self, event: serde_json::Value) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &event)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl TrainingHook for JsonlHook {
    fn register_module(&mut self, module: &ModuleSummary) -> Result<()> {
        self.write_event(json!({
            "event": "module",
            "name": module.name,
            "frozen_params": module.frozen_params,
            "trainable_params": module.trainable_params,
        }))
    }

    fn register_loss(&mut self, name: &str) -> Result<()> {
        self.write_event(json!({ "event": "loss", "name": name }))
    }

    fn set_mode(&mut self, phase: Phase) {
        self.mode = phase;
        if let Err(e) = self.write_event(json!({ "event": "mode", "mode": phase })) {
            tracing::warn!("Hook could not record mode change: {:#}", e);
        }
    }

    fn mode(&self) -> Phase {
        self.mode
    }

    fn record_step(&mut self, loss: f64) -> Result<()> {
        let step = match self.mode {
            Phase::Train => {
                self.train_steps += 1;
                self.train_steps
            }
            Phase::Eval => {
                self.eval_steps += 1;
                self.eval_steps
            }
        };
        if step % self.save_interval != 0 {
            return Ok(());
        }
        self.write_event(json!({
            "event": "step",
            "mode": self.mode,
            "step": step,
            "loss": loss,
        }))
    }

    fn record_epoch(&mut self, summary: &EpochSummary) -> Result<()> {
        let mut event = serde_json::to_value(summary)?;
        if let Some(fields) = event.as_object_mut() {
            fields.insert("event".to_string(), json!("epoch"));
        }
        self.write_event(event)
    }

    fn close(&mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("Cannot flush '{}'", self.path.display()))
    }
}

// ─── NullHook ─────────────────────────────────────────────────────────────────
pub struct NullHook {
    mode: Phase,
}

impl NullHook {
    pub fn new() -> Self {
        Self { mode: Phase::Train }
    }
}

impl TrainingHook for NullHook {
    fn register_module(&mut self, _module: &ModuleSummary) -> Result<()> {
        Ok(())
    }

    fn register_loss(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn set_mode(&mut self, phase: Phase) {
        self.mode = phase;
    }

    fn mode(&self) -> Phase {
        self.mode
    }

    fn record_step(&mut self, _loss: f64) -> Result<()> {
        Ok(())
    }

    fn record_epoch(&mut self, _summary: &EpochSummary) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_events(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_jsonl_hook_writes_events_per_mode() {
        let dir = tempdir().unwrap();
        let mut hook = JsonlHook::create(dir.path(), 1).unwrap();

        hook.register_loss("cross_entropy").unwrap();
        hook.set_mode(Phase::Train);
        hook.record_step(2.5).unwrap();
        hook.record_step(2.0).unwrap();
        hook.set_mode(Phase::Eval);
        assert_eq!(hook.mode(), Phase::Eval);
        hook.record_step(1.5).unwrap();
        hook.close().unwrap();

        let events = read_events(&dir.path().join("steps.jsonl"));
        let steps: Vec<_> = events.iter().filter(|e| e["event"] == "step").collect();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[1]["mode"], "train");
        assert_eq!(steps[1]["step"], 2);
        assert_eq!(steps[2]["mode"], "eval");
        assert_eq!(steps[2]["step"], 1);
        assert_eq!(events[0]["name"], "cross_entropy");
    }

    #[test]
    fn test_save_interval_skips_steps() {
        let dir = tempdir().unwrap();
        let mut hook = JsonlHook::create(dir.path(), 2).unwrap();
        for loss in [1.0, 2.0, 3.0, 4.0, 5.0] {
            hook.record_step(loss).unwrap();
        }
        hook.close().unwrap();

        let losses: Vec<f64> = read_events(hook.path())
            .iter()
            .filter_map(|e| e["loss"].as_f64())
            .collect();
        assert_eq!(losses, vec![2.0, 4.0]);
    }

    #[test]
    fn test_config_defaults_and_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hook.json");
        fs::write(&path, r#"{ "save_interval": 25 }"#).unwrap();

        let config = HookConfig::from_json_file(&path).unwrap();
        assert!(config.enabled);
        assert_eq!(config.out_dir, None);
        assert_eq!(config.save_interval, 25);
    }

    #[test]
    fn test_disabled_config_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = HookConfig { enabled: false, ..HookConfig::default() };
        let mut hook = config.create(dir.path()).unwrap();
        hook.set_mode(Phase::Eval);
        hook.record_step(1.0).unwrap();
        hook.close().unwrap();

        assert_eq!(hook.mode(), Phase::Eval);
        assert!(!dir.path().join("hook").exists());
    }
}
