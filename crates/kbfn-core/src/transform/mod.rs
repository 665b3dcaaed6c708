// Kbfn Transform Module
// Layer chain between the physical device and the virtual device

pub mod dual_role;
pub mod pipeline;
pub mod remap;
pub mod timer;

use crate::event::Event;
use crate::output::EventSink;
use std::io;

pub use dual_role::{
    DualRoleConfig, DualRoleEngine, EngineState, HoldAction, DEFAULT_HOLD_THRESHOLD,
    DEFAULT_LOOKAHEAD_DELAY,
};
pub use pipeline::Pipeline;
pub use remap::RemapLayer;
pub use timer::{TimerId, Timers};

/// Position of a layer in the configured list, used to address timers
pub type LayerId = usize;

/// One stage of the pipeline.
///
/// A layer owns exactly one downstream stage, fixed at construction, and
/// forwards zero or more events to it for every event it receives. The
/// only errors a layer reports are I/O errors from the sink at the end of
/// the chain; malformed input is absorbed by the layer itself.
pub trait Layer {
    /// Consume one event, forwarding the results downstream in order
    fn transform(&mut self, event: Event, timers: &mut Timers) -> io::Result<()>;

    /// Handle an expired timer addressed to this layer or one below it
    fn expire(&mut self, timer: TimerId, timers: &mut Timers) -> io::Result<()>;

    /// Propagate a flush boundary to the sink
    fn flush(&mut self) -> io::Result<()>;
}

/// Adapter that terminates a layer chain with an [`EventSink`]
pub struct SinkStage<S> {
    sink: S,
}

impl<S: EventSink> SinkStage<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: EventSink> Layer for SinkStage<S> {
    fn transform(&mut self, event: Event, _timers: &mut Timers) -> io::Result<()> {
        self.sink.write(event)
    }

    fn expire(&mut self, timer: TimerId, _timers: &mut Timers) -> io::Result<()> {
        log::trace!("timer {:?} reached the sink without an owner", timer);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}
