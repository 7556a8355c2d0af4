use std::io::Write;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    DepotAllocation,
    Coverage,
    DistributionAllocation,
    Validation,
}

pub const PHASE_COUNT: usize = 4;

/// Typed progress stream for UIs. Events carry preformatted messages plus
/// the phase tag; consumers that want machine-readable payloads get them
/// from the final result document instead.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    PhaseStarted { phase: Phase, message: String },
    PhaseCompleted { phase: Phase, message: String },
}

pub trait ProgressObserver {
    fn on_event(&self, event: &ProgressEvent);
}

/// Discards all events. Default for library callers and tests.
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Writes each event as one JSON line on stdout, flushed immediately so a
/// consuming UI sees phases as they happen. Log output goes to stderr and
/// stays out of this stream.
pub struct JsonLineObserver;

impl ProgressObserver for JsonLineObserver {
    fn on_event(&self, event: &ProgressEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            let mut out = std::io::stdout();
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }
}

/// Renders phase progress as a terminal bar.
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(PHASE_COUNT as u64);
        bar.set_style(
            ProgressStyle::with_template("[{bar:24}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressBarObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_event(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::PhaseStarted { message, .. } => {
                self.bar.set_message(message.clone());
            }
            ProgressEvent::PhaseCompleted { message, .. } => {
                self.bar.set_message(message.clone());
                self.bar.inc(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = ProgressEvent::PhaseStarted {
            phase: Phase::DepotAllocation,
            message: "allocating depots".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"phase_started\""));
        assert!(json.contains("\"phase\":\"depot_allocation\""));
    }
}
