//! Synchronized component lifecycle
//!
//! A component kind implements `SynchronizedComponent`: it knows how to diff
//! its host against a cached snapshot and how to frame the result. The
//! object-safe `ComponentInstance` wraps it in a `ComponentDriver`, which
//! owns the per-tick protocol:
//!
//! 1. `calculate_delta_changes` (always, so the cache tracks the host)
//! 2. delta to endpoints that already hold the full state, if `has_changes`
//! 3. complete state to endpoints seen for the first time
//! 4. forget endpoints that went away

use std::collections::BTreeSet;

use mirra_core::{ChangeFlags, EndpointId, MirraResult, PerformanceParameters, ShortId};

use crate::MessageSink;

/// Component kind with its own change flags and wire layout
pub trait SynchronizedComponent {
    type Changes: ChangeFlags;

    /// Wire tag of this component kind
    fn short_id(&self) -> ShortId;

    /// Called once when attached to the host. No network I/O.
    fn on_initialized(&mut self) {}

    /// False once the host object is gone
    fn is_alive(&self) -> bool {
        true
    }

    fn has_changes(&self, changes: Self::Changes) -> bool {
        !changes.is_empty()
    }

    /// Diff the host against the cached state, updating the cache.
    ///
    /// A second call without a host mutation in between returns `NONE`.
    fn calculate_delta_changes(&mut self, params: &PerformanceParameters) -> Self::Changes;

    /// Bring `endpoints` to full knowledge of the current state
    fn send_complete_changes(
        &mut self,
        sink: &mut dyn MessageSink,
        endpoints: &[EndpointId],
    ) -> MirraResult<()>;

    /// Send only the fields named by `changes`
    fn send_delta_changes(
        &mut self,
        sink: &mut dyn MessageSink,
        endpoints: &[EndpointId],
        changes: Self::Changes,
    ) -> MirraResult<()>;
}

/// Object-safe handle the manager keeps per attached component
pub trait ComponentInstance {
    fn short_id(&self) -> ShortId;

    fn is_alive(&self) -> bool;

    /// Run one synchronization tick against the current endpoint set
    fn synchronize(
        &mut self,
        sink: &mut dyn MessageSink,
        endpoints: &[EndpointId],
        params: &PerformanceParameters,
    ) -> MirraResult<()>;

    /// Treat `endpoint` as new so it receives a complete message next tick
    fn forget_endpoint(&mut self, endpoint: EndpointId);

    /// Endpoints that already hold this instance's full state
    fn known_endpoints(&self) -> Vec<EndpointId>;
}

/// Drives a `SynchronizedComponent` through the tick protocol
pub struct ComponentDriver<C> {
    component: C,
    known: BTreeSet<EndpointId>,
}

impl<C: SynchronizedComponent> ComponentDriver<C> {
    pub fn new(mut component: C) -> Self {
        component.on_initialized();
        ComponentDriver {
            component,
            known: BTreeSet::new(),
        }
    }

    pub fn component(&self) -> &C {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut C {
        &mut self.component
    }
}

impl<C: SynchronizedComponent> ComponentInstance for ComponentDriver<C> {
    fn short_id(&self) -> ShortId {
        self.component.short_id()
    }

    fn is_alive(&self) -> bool {
        self.component.is_alive()
    }

    fn synchronize(
        &mut self,
        sink: &mut dyn MessageSink,
        endpoints: &[EndpointId],
        params: &PerformanceParameters,
    ) -> MirraResult<()> {
        let changes = self.component.calculate_delta_changes(params);

        let (established, added): (Vec<EndpointId>, Vec<EndpointId>) = endpoints
            .iter()
            .copied()
            .partition(|e| self.known.contains(e));

        if !established.is_empty() && self.component.has_changes(changes) {
            self.component.send_delta_changes(sink, &established, changes)?;
        }

        if !added.is_empty() {
            self.component.send_complete_changes(sink, &added)?;
        }

        self.known = endpoints.iter().copied().collect();
        Ok(())
    }

    fn forget_endpoint(&mut self, endpoint: EndpointId) {
        self.known.remove(&endpoint);
    }

    fn known_endpoints(&self) -> Vec<EndpointId> {
        self.known.iter().copied().collect()
    }
}
