//! Observers
//!
//! Fire-and-forget subscribers to FAD events, keyed by event kind, plus the
//! stock sinks: a JSONL event logger, a lost-fish monitor and an in-memory
//! buffer.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use fad_events::{EventKind, FadEvent};

/// Receives events it subscribed to.
pub trait Observer: Send + Sync {
    fn observe(&mut self, event: &FadEvent);
}

/// Lets one sink be registered under several kinds.
impl<O: Observer> Observer for Arc<Mutex<O>> {
    fn observe(&mut self, event: &FadEvent) {
        match self.lock() {
            Ok(mut inner) => inner.observe(event),
            Err(_) => tracing::warn!("Observer lock poisoned, dropping {:?} event", event.kind()),
        }
    }
}

/// Observers registered per event kind.
#[derive(Default)]
pub struct Observers {
    by_kind: BTreeMap<EventKind, Vec<Box<dyn Observer>>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: EventKind, observer: Box<dyn Observer>) {
        self.by_kind.entry(kind).or_default().push(observer);
    }

    /// Registers a shared sink for every kind.
    pub fn register_all<O: Observer + 'static>(&mut self, observer: Arc<Mutex<O>>) {
        for kind in EventKind::all() {
            self.register(*kind, Box::new(observer.clone()));
        }
    }

    /// Delivers `event` to everyone subscribed to its kind.
    pub fn react_to(&mut self, event: &FadEvent) {
        if let Some(observers) = self.by_kind.get_mut(&event.kind()) {
            for observer in observers.iter_mut() {
                observer.observe(event);
            }
        }
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.by_kind.get(&kind).map_or(0, Vec::len)
    }
}

/// Appends every observed event to a JSONL file
pub struct EventLogger {
    writer: Option<BufWriter<File>>,
    event_count: u64,
}

impl EventLogger {
    /// Create a new event logger writing to the specified path
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            event_count: 0,
        })
    }

    /// Create a logger that discards events (for testing)
    pub fn null() -> Self {
        Self {
            writer: None,
            event_count: 0,
        }
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Log an event to the file
    pub fn log(&mut self, event: &FadEvent) -> std::io::Result<()> {
        self.event_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = event.to_jsonl()?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    /// Flush the buffer to disk
    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Observer for EventLogger {
    fn observe(&mut self, event: &FadEvent) {
        if let Err(e) = self.log(event) {
            tracing::warn!("Failed to log {:?} event: {}", event.kind(), e);
        }
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("Warning: Failed to flush event logger: {}", e);
        }
    }
}

/// Running totals of fish destroyed into the void, per species.
#[derive(Debug, Clone, Default)]
pub struct FishLostMonitor {
    lost: Vec<f64>,
    events: usize,
}

impl FishLostMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Biomass (kg) lost per species index.
    pub fn lost_per_species(&self) -> &[f64] {
        &self.lost
    }

    pub fn total_lost(&self) -> f64 {
        self.lost.iter().sum()
    }

    pub fn event_count(&self) -> usize {
        self.events
    }
}

impl Observer for FishLostMonitor {
    fn observe(&mut self, event: &FadEvent) {
        let Some(lost) = event.lost_biomass() else {
            return;
        };
        if self.lost.len() < lost.len() {
            self.lost.resize(lost.len(), 0.0);
        }
        for (total, amount) in self.lost.iter_mut().zip(lost) {
            *total += amount;
        }
        self.events += 1;
    }
}

/// Keeps observed events in memory
#[derive(Debug, Clone, Default)]
pub struct EventBuffer {
    events: Vec<FadEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[FadEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<FadEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Observer for EventBuffer {
    fn observe(&mut self, event: &FadEvent) {
        self.events.push(event.clone());
    }
}
