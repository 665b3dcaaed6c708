// Kbfn Pipeline
// Builds the layer chain from configuration and drives it with events and timers

use super::{DualRoleEngine, Layer, LayerId, RemapLayer, SinkStage, Timers};
use crate::config::{ConfigError, LayerConfig, LayerDescriptor};
use crate::event::Event;
use crate::output::EventSink;
use std::io;
use std::time::SystemTime;

/// Ordered chain of layers ending in a sink.
///
/// Layers are listed outermost first: the first configured layer sees
/// device events before any other.
pub struct Pipeline {
    head: Box<dyn Layer>,
    timers: Timers,
    layer_count: usize,
}

impl Pipeline {
    /// Build the chain from validated layer configurations
    pub fn build<S: EventSink + 'static>(layers: &[LayerConfig], sink: S) -> Self {
        let mut next: Box<dyn Layer> = Box::new(SinkStage::new(sink));

        // Each layer owns its successor, so construct from the sink upwards
        for (id, layer) in layers.iter().enumerate().rev() {
            next = make_layer(id, layer, next);
        }

        log::info!("pipeline built with {} layer(s)", layers.len());
        Self {
            head: next,
            timers: Timers::new(),
            layer_count: layers.len(),
        }
    }

    /// Validate raw descriptors and build the chain.
    ///
    /// Fails on the first invalid descriptor; nothing is built in that case.
    pub fn from_descriptors<S: EventSink + 'static>(
        descriptors: &[LayerDescriptor],
        sink: S,
    ) -> Result<Self, ConfigError> {
        let layers = descriptors
            .iter()
            .map(LayerConfig::from_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::build(&layers, sink))
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    /// Feed one event into the outermost layer.
    ///
    /// Timers due at or before the event's timestamp fire first, so the
    /// chain always observes time moving forward.
    pub fn dispatch(&mut self, event: Event) -> io::Result<()> {
        self.fire_due(event.time)?;
        self.head.transform(event, &mut self.timers)
    }

    /// Dispatch a batch read from the device, then flush once.
    ///
    /// Synchronization markers are dropped; the sink adds its own.
    pub fn process_batch<I>(&mut self, events: I) -> io::Result<()>
    where
        I: IntoIterator<Item = Event>,
    {
        for event in events {
            if event.is_sync() {
                continue;
            }
            self.dispatch(event)?;
        }
        self.head.flush()
    }

    /// Fire every timer due at `now`, flushing if any fired.
    ///
    /// Returns whether anything fired.
    pub fn tick(&mut self, now: SystemTime) -> io::Result<bool> {
        let fired = self.fire_due(now)?;
        if fired {
            self.head.flush()?;
        }
        Ok(fired)
    }

    /// When the next timer is due, if one is pending
    pub fn next_deadline(&self) -> Option<SystemTime> {
        self.timers.next_deadline()
    }

    fn fire_due(&mut self, now: SystemTime) -> io::Result<bool> {
        let mut fired = false;
        while let Some(timer) = self.timers.pop_due(now) {
            log::trace!("timer {:?} fired", timer);
            self.head.expire(timer, &mut self.timers)?;
            fired = true;
        }
        Ok(fired)
    }
}

fn make_layer(id: LayerId, config: &LayerConfig, next: Box<dyn Layer>) -> Box<dyn Layer> {
    match config {
        LayerConfig::Remap(remap) => {
            log::debug!("layer {}: remap ({} codes)", id, remap.codes.len());
            Box::new(RemapLayer::new(
                remap.codes.iter().map(|(from, to)| (*from, *to)),
                next,
            ))
        }
        LayerConfig::DualRole(dual_role) => {
            log::debug!("layer {}: dual-role on {}", id, dual_role.key);
            Box::new(DualRoleEngine::new(id, dual_role.clone(), next))
        }
    }
}
