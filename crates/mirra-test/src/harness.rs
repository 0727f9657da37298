//! Authoring/observer harness
//!
//! One authoring `SyncManager` and any number of observer managers, wired
//! through recording transports. `tick` runs the authoring pass and pumps
//! every recorded delivery into the addressed observers.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use mirra_core::{EndpointId, MirraResult, ObjectId, SyncConfig};
use mirra_render::{
    MeshRenderer, MeshRendererKind, MeshRendererService, RendererKind, RendererState,
    SkinnedMeshRenderer, SkinnedMeshRendererKind, SkinnedMeshRendererService,
};
use mirra_sync::{Received, SyncManager};
use tracing::debug;

use crate::{Delivery, RecordingTransport};

/// Endpoint id observers see for the authoring side
pub const AUTHORING_ENDPOINT: EndpointId = EndpointId(0);

/// Observer side of the harness
pub struct Observer {
    pub manager: SyncManager<RecordingTransport>,
    pub received: Vec<MirraResult<Received>>,
}

impl Observer {
    fn new(config: SyncConfig) -> MirraResult<Self> {
        Ok(Observer {
            manager: renderer_manager(config, RecordingTransport::new())?,
            received: Vec::new(),
        })
    }

    pub fn mesh(&self, object: ObjectId) -> Option<&RendererState> {
        self.manager
            .service::<MeshRendererService>(MeshRendererKind::ID)?
            .mirror(object)
    }

    pub fn skinned_mesh(&self, object: ObjectId) -> Option<&RendererState> {
        self.manager
            .service::<SkinnedMeshRendererService>(SkinnedMeshRendererKind::ID)?
            .mirror(object)
    }
}

/// Manager with both renderer services registered
pub fn renderer_manager(
    config: SyncConfig,
    transport: RecordingTransport,
) -> MirraResult<SyncManager<RecordingTransport>> {
    let mut manager = SyncManager::with_config(config, transport);
    manager.register_service(MeshRendererService::new())?;
    manager.register_service(SkinnedMeshRendererService::new())?;
    Ok(manager)
}

/// End-to-end mirror harness
pub struct MirrorHarness {
    config: SyncConfig,
    authoring: SyncManager<RecordingTransport>,
    outbox: RecordingTransport,
    observers: BTreeMap<EndpointId, Observer>,
    log: Vec<Delivery>,
}

impl MirrorHarness {
    pub fn new() -> MirraResult<Self> {
        Self::with_config(SyncConfig::default())
    }

    pub fn with_config(config: SyncConfig) -> MirraResult<Self> {
        let outbox = RecordingTransport::new();
        Ok(MirrorHarness {
            authoring: renderer_manager(config.clone(), outbox.clone())?,
            config,
            outbox,
            observers: BTreeMap::new(),
            log: Vec::new(),
        })
    }

    pub fn authoring(&self) -> &SyncManager<RecordingTransport> {
        &self.authoring
    }

    pub fn authoring_mut(&mut self) -> &mut SyncManager<RecordingTransport> {
        &mut self.authoring
    }

    /// Handle to the authoring transport, for failure injection
    pub fn outbox(&self) -> &RecordingTransport {
        &self.outbox
    }

    /// Connect a new observer
    pub fn add_observer(&mut self, endpoint: EndpointId) -> MirraResult<()> {
        let observer = Observer::new(self.config.clone())?;
        self.observers.insert(endpoint, observer);
        self.authoring.connect(endpoint);
        Ok(())
    }

    pub fn remove_observer(&mut self, endpoint: EndpointId) -> Option<Observer> {
        self.authoring.disconnect(endpoint);
        self.observers.remove(&endpoint)
    }

    pub fn observer(&self, endpoint: EndpointId) -> Option<&Observer> {
        self.observers.get(&endpoint)
    }

    pub fn spawn_mesh(
        &mut self,
        object: ObjectId,
        host: MeshRenderer,
    ) -> Rc<RefCell<MeshRenderer>> {
        let host = Rc::new(RefCell::new(host));
        self.authoring.object_created(object, host.clone());
        host
    }

    pub fn spawn_skinned_mesh(
        &mut self,
        object: ObjectId,
        host: SkinnedMeshRenderer,
    ) -> Rc<RefCell<SkinnedMeshRenderer>> {
        let host = Rc::new(RefCell::new(host));
        self.authoring.object_created(object, host.clone());
        host
    }

    /// Run one authoring tick and deliver its output.
    ///
    /// Returns the deliveries of this tick. Observer-side results are kept
    /// on each `Observer`.
    pub fn tick(&mut self) -> MirraResult<Vec<Delivery>> {
        self.authoring.tick()?;
        let deliveries = self.outbox.take();

        for delivery in &deliveries {
            for endpoint in &delivery.endpoints {
                let Some(observer) = self.observers.get_mut(endpoint) else {
                    debug!(endpoint = %endpoint, "delivery to detached observer dropped");
                    continue;
                };
                let result = observer.manager.receive(AUTHORING_ENDPOINT, &delivery.bytes);
                observer.received.push(result);
            }
        }

        self.log.extend(deliveries.iter().cloned());
        Ok(deliveries)
    }

    /// Every delivery since the harness was built
    pub fn log(&self) -> &[Delivery] {
        &self.log
    }
}
