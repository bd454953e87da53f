use crate::{
    foundation::core::NodeId,
    schedule::clock::TickScheduler,
};

/// Pending-redraw set coalescing batched draw requests.
///
/// Each `enqueue` registers a layer at most once per tick and asks the host
/// scheduler for exactly one wakeup; `take_pending` drains a snapshot so
/// that re-entrant requests made while flushing land in the next tick.
pub struct RedrawQueue {
    pending: Vec<NodeId>,
    tick_requested: bool,
    scheduler: Box<dyn TickScheduler>,
}

impl RedrawQueue {
    /// Queue driven by the given host scheduler.
    pub fn new(scheduler: Box<dyn TickScheduler>) -> Self {
        Self {
            pending: Vec::new(),
            tick_requested: false,
            scheduler,
        }
    }

    /// Register `layer` for the next flush. Returns whether it was newly
    /// added (duplicates within one tick coalesce).
    pub fn enqueue(&mut self, layer: NodeId) -> bool {
        if self.pending.contains(&layer) {
            return false;
        }
        self.pending.push(layer);
        if !self.tick_requested {
            self.tick_requested = true;
            self.scheduler.request_tick();
        }
        true
    }

    /// Drop a layer from the pending set (it was destroyed).
    pub fn discard(&mut self, layer: NodeId) {
        self.pending.retain(|l| *l != layer);
    }

    /// Drain the pending snapshot in request order.
    pub fn take_pending(&mut self) -> Vec<NodeId> {
        self.tick_requested = false;
        std::mem::take(&mut self.pending)
    }

    /// Layers currently awaiting a flush.
    pub fn pending(&self) -> &[NodeId] {
        &self.pending
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/redraw.rs"]
mod tests;
