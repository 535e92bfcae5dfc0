//! Scripted event traces and the virtual-clock runner
//!
//! A trace is a TOML file describing one control: whether a double handler
//! is bound, its override and ambient layers, and a list of raw events with
//! millisecond offsets. Replaying a trace runs a `ClickEngine` without any
//! real waiting; every fire is stamped with the virtual time it happened at.

use anyhow::{Context, Result};
use clickgate_core::{
    ActivationKind, AmbientConfig, ClickEngine, ConfigLayer, EngineStats, Handlers, RawEvent,
    Resolution,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Trace printed by `clickgate example`
pub const EXAMPLE_TRACE: &str = r#"# Three quick clicks, a pause, then a double click
double_listener = true

[config]
model = "debounce"
delay = 100
max_wait = 400

[ambient]
dbl_delay = 250

[[event]]
at = 0
kind = "single"
label = "first"

[[event]]
at = 40
kind = "single"
label = "second"

[[event]]
at = 80
kind = "single"
label = "third"

[[event]]
at = 1000
kind = "single"
label = "before-double"

[[event]]
at = 1120
kind = "double"
label = "double"
"#;

/// One control's worth of scripted input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Trace {
    /// Bind a double handler (enables single/double disambiguation)
    pub double_listener: bool,
    /// Per-instance override layer
    pub config: ConfigLayer,
    /// Ambient defaults layer
    pub ambient: ConfigLayer,
    /// Raw events, replayed in `at` order
    #[serde(rename = "event")]
    pub events: Vec<TraceEvent>,
}

/// A raw event in a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceEvent {
    /// Milliseconds since the start of the trace
    pub at: u64,
    /// Single or double
    pub kind: ActivationKind,
    /// Name echoed back when the event fires (default: `#<index>`)
    #[serde(default)]
    pub label: Option<String>,
}

impl Trace {
    /// Parse a trace from TOML text
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Invalid trace")
    }

    /// Load a trace file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("In {}", path.display()))
    }
}

/// A handler invocation observed during replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fire {
    /// Virtual time of the fire, in milliseconds
    pub at: u64,
    /// Which handler ran
    pub kind: ActivationKind,
    /// Label of the raw event whose payload was delivered
    pub label: String,
}

/// Outcome of replaying a trace
#[derive(Debug, Clone)]
pub struct Replay {
    /// Configuration the engine resolved at creation
    pub resolution: Resolution,
    /// Fires in the order they happened
    pub fires: Vec<Fire>,
    /// Engine counters after the trace drained
    pub stats: EngineStats,
}

#[derive(Debug, Default)]
struct Recorder {
    now_ms: u64,
    fires: Vec<Fire>,
}

/// Run a trace through a fresh engine on a virtual clock
///
/// Before each event, every timer due at or before it fires at its own
/// deadline. After the last event the engine is stepped until idle.
pub fn replay(trace: &Trace) -> Replay {
    let recorder = Arc::new(Mutex::new(Recorder::default()));

    let singles = Arc::clone(&recorder);
    let mut handlers = Handlers::new(move |label: String| {
        let mut rec = singles.lock();
        let at = rec.now_ms;
        rec.fires.push(Fire { at, kind: ActivationKind::Single, label });
    });
    if trace.double_listener {
        let doubles = Arc::clone(&recorder);
        handlers = handlers.with_double(move |label: String| {
            let mut rec = doubles.lock();
            let at = rec.now_ms;
            rec.fires.push(Fire { at, kind: ActivationKind::Double, label });
        });
    }

    let ambient = AmbientConfig::new(trace.ambient.clone());
    let mut engine = ClickEngine::new(trace.config.clone(), ambient, handlers);
    let resolution = engine.resolution();

    let mut events: Vec<(usize, &TraceEvent)> = trace.events.iter().enumerate().collect();
    events.sort_by_key(|(_, event)| event.at);

    let t0 = Instant::now();
    for (index, event) in events {
        step_until(&mut engine, &recorder, t0, Some(t0 + Duration::from_millis(event.at)));

        recorder.lock().now_ms = event.at;
        let label = event.label.clone().unwrap_or_else(|| format!("#{}", index));
        let raw = match event.kind {
            ActivationKind::Single => RawEvent::single(label),
            ActivationKind::Double => RawEvent::double(label),
        };
        engine.dispatch(t0 + Duration::from_millis(event.at), raw);
    }
    step_until(&mut engine, &recorder, t0, None);

    let stats = engine.stats();
    engine.teardown();

    let fires = std::mem::take(&mut recorder.lock().fires);
    Replay { resolution, fires, stats }
}

/// Fire deadlines one at a time up to `limit` (or until idle)
fn step_until(
    engine: &mut ClickEngine<String>,
    recorder: &Mutex<Recorder>,
    t0: Instant,
    limit: Option<Instant>,
) {
    while let Some(deadline) = engine.next_deadline() {
        if limit.is_some_and(|limit| deadline > limit) {
            break;
        }
        recorder.lock().now_ms = deadline.duration_since(t0).as_millis() as u64;
        engine.advance(deadline);
    }
}
