//! Synchronization manager
//!
//! Explicit context object owning the registered services, the connected
//! endpoints and every attached component instance. The host drives it:
//! - `object_created` / `object_destroyed` as the scene changes
//! - `connect` / `disconnect` as observers come and go
//! - `tick` once per frame on the authoring side
//! - `receive` for every inbound buffer on the observer side

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use bytes::Bytes;
use mirra_core::{EndpointId, MirraError, MirraResult, ObjectId, ShortId, SyncConfig};
use mirra_wire::{open_envelope, wrap_envelope, MessageHeader};
use tracing::{debug, info, trace, warn};

use crate::{ComponentInstance, ComponentService, MessageSink, ServiceRegistry, Transport};

/// Manager counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub ticks: u64,
    pub messages_sent: u64,
    pub bytes_sent: u64,
    pub messages_received: u64,
    pub unrecognized: u64,
    pub protocol_errors: u64,
}

/// Outcome of a successfully handled inbound buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Received {
    /// Decoded and applied by the owning service
    Applied { object: ObjectId, id: ShortId },
    /// No service registered for this ShortId; dropped
    Unrecognized(ShortId),
}

/// Per-instance sink that wraps messages in the object envelope
struct EnvelopeSink<'a, T> {
    transport: &'a mut T,
    object: ObjectId,
    max_message_size: usize,
    stats: &'a mut SyncStats,
}

impl<T: Transport> MessageSink for EnvelopeSink<'_, T> {
    fn send(&mut self, endpoints: &[EndpointId], bytes: Bytes) -> MirraResult<()> {
        if bytes.len() > self.max_message_size {
            return Err(MirraError::InvalidWireFormat(format!(
                "Message too large: {} > {}",
                bytes.len(),
                self.max_message_size
            )));
        }

        if let Ok(header) = MessageHeader::parse(&bytes) {
            debug!(
                object = %self.object,
                id = %header.id,
                flags = header.flags,
                len = bytes.len(),
                endpoints = endpoints.len(),
                "sending component message"
            );
        }

        let framed = wrap_envelope(self.object, &bytes);
        let len = framed.len() as u64;
        self.transport.send(endpoints, framed)?;

        self.stats.messages_sent += 1;
        self.stats.bytes_sent += len;
        Ok(())
    }
}

/// Owns services, endpoints and component instances
pub struct SyncManager<T> {
    config: SyncConfig,
    transport: T,
    registry: ServiceRegistry,
    endpoints: Vec<EndpointId>,
    faulted: BTreeSet<EndpointId>,
    instances: BTreeMap<(ObjectId, ShortId), Box<dyn ComponentInstance>>,
    stats: SyncStats,
}

impl<T: Transport> SyncManager<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(SyncConfig::default(), transport)
    }

    pub fn with_config(config: SyncConfig, transport: T) -> Self {
        SyncManager {
            config,
            transport,
            registry: ServiceRegistry::new(),
            endpoints: Vec::new(),
            faulted: BTreeSet::new(),
            instances: BTreeMap::new(),
            stats: SyncStats::default(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ------------------------------------------------------------------
    // Services
    // ------------------------------------------------------------------

    /// Register a component service under its ShortId
    pub fn register_service<S: ComponentService>(&mut self, service: S) -> MirraResult<()> {
        let id = self.registry.register(Box::new(service))?;
        if let Some(definition) = self.registry.definition(id) {
            info!(
                id = %id,
                capability = definition.capability_name(),
                "registered component service"
            );
        }
        Ok(())
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Typed access to a registered service
    pub fn service<S: ComponentService>(&self, id: ShortId) -> Option<&S> {
        self.registry.get(id)?.as_any().downcast_ref::<S>()
    }

    pub fn service_mut<S: ComponentService>(&mut self, id: ShortId) -> Option<&mut S> {
        self.registry.get_mut(id)?.as_any_mut().downcast_mut::<S>()
    }

    // ------------------------------------------------------------------
    // Endpoints
    // ------------------------------------------------------------------

    /// Add an observer; it receives complete state on the next tick
    pub fn connect(&mut self, endpoint: EndpointId) {
        if !self.endpoints.contains(&endpoint) {
            self.endpoints.push(endpoint);
            self.endpoints.sort_unstable();
            info!(endpoint = %endpoint, "endpoint connected");
        }
    }

    pub fn disconnect(&mut self, endpoint: EndpointId) {
        let before = self.endpoints.len();
        self.endpoints.retain(|e| *e != endpoint);
        self.faulted.remove(&endpoint);
        for instance in self.instances.values_mut() {
            instance.forget_endpoint(endpoint);
        }
        if self.endpoints.len() != before {
            info!(endpoint = %endpoint, "endpoint disconnected");
        }
    }

    pub fn endpoints(&self) -> &[EndpointId] {
        &self.endpoints
    }

    /// Send `endpoint` a complete snapshot of every instance on the next tick
    pub fn request_full_snapshot(&mut self, endpoint: EndpointId) {
        debug!(endpoint = %endpoint, "full snapshot requested");
        for instance in self.instances.values_mut() {
            instance.forget_endpoint(endpoint);
        }
    }

    /// Endpoints that sent a malformed message
    pub fn is_faulted(&self, endpoint: EndpointId) -> bool {
        self.faulted.contains(&endpoint)
    }

    pub fn faulted_endpoints(&self) -> impl Iterator<Item = EndpointId> + '_ {
        self.faulted.iter().copied()
    }

    // ------------------------------------------------------------------
    // Scene objects
    // ------------------------------------------------------------------

    /// Attach an instance of every registered kind that synchronizes `host`.
    ///
    /// Returns the number of instances attached.
    pub fn object_created(&mut self, object: ObjectId, host: Rc<dyn Any>) -> usize {
        let mut attached = 0;
        for (id, definition) in self.registry.definitions() {
            if !definition.matches(&*host) {
                continue;
            }
            if self.instances.contains_key(&(object, id)) {
                debug!(object = %object, id = %id, "component already attached");
                continue;
            }
            if let Some(instance) = definition.instantiate(host.clone()) {
                debug!(object = %object, id = %id, "component attached");
                self.instances.insert((object, id), instance);
                attached += 1;
            }
        }
        attached
    }

    /// Detach every instance on `object`. Returns the number removed.
    pub fn object_destroyed(&mut self, object: ObjectId) -> usize {
        let before = self.instances.len();
        self.instances.retain(|(o, _), _| *o != object);
        let removed = before - self.instances.len();
        if removed > 0 {
            debug!(object = %object, removed, "components detached");
        }
        removed
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn has_instance(&self, object: ObjectId, id: ShortId) -> bool {
        self.instances.contains_key(&(object, id))
    }

    // ------------------------------------------------------------------
    // Tick / receive
    // ------------------------------------------------------------------

    /// Run one synchronization pass over every live instance.
    ///
    /// A transport error aborts the pass and is returned unchanged.
    pub fn tick(&mut self) -> MirraResult<()> {
        self.stats.ticks += 1;

        let before = self.instances.len();
        self.instances.retain(|(object, id), instance| {
            let alive = instance.is_alive();
            if !alive {
                debug!(object = %object, id = %id, "host gone, detaching component");
            }
            alive
        });
        let dropped = before - self.instances.len();

        let sent_before = self.stats.messages_sent;
        for ((object, _), instance) in self.instances.iter_mut() {
            let mut sink = EnvelopeSink {
                transport: &mut self.transport,
                object: *object,
                max_message_size: self.config.max_message_size,
                stats: &mut self.stats,
            };
            instance.synchronize(&mut sink, &self.endpoints, &self.config.performance)?;
        }

        trace!(
            tick = self.stats.ticks,
            instances = self.instances.len(),
            dropped,
            sent = self.stats.messages_sent - sent_before,
            "tick complete"
        );
        Ok(())
    }

    /// Handle one inbound buffer from `from`.
    ///
    /// Unknown ShortIds are dropped with `Received::Unrecognized`. Malformed
    /// input flags `from` as faulted and returns the protocol error.
    pub fn receive(&mut self, from: EndpointId, bytes: &[u8]) -> MirraResult<Received> {
        self.stats.messages_received += 1;
        match self.dispatch(from, bytes) {
            Ok(received) => Ok(received),
            Err(e) => {
                self.stats.protocol_errors += 1;
                if self.faulted.insert(from) {
                    warn!(endpoint = %from, error = %e, "endpoint flagged after protocol error");
                }
                Err(e)
            }
        }
    }

    fn dispatch(&mut self, from: EndpointId, bytes: &[u8]) -> MirraResult<Received> {
        let (object, message) = open_envelope(bytes)?;
        let id = MessageHeader::peek_id(message)?;

        let Some(service) = self.registry.get_mut(id) else {
            self.stats.unrecognized += 1;
            warn!(endpoint = %from, id = %id, "dropping message for unrecognized component");
            return Ok(Received::Unrecognized(id));
        };

        service.read(from, object, message)?;
        Ok(Received::Applied { object, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Weak;

    use mirra_core::{ChangeFlags, PerformanceParameters};
    use mirra_wire::{MessageReader, MessageWriter};

    use crate::{ComponentDefinition, SynchronizedComponent};

    const LMP: ShortId = ShortId::from_static(b"LMP");

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct LampChanges(u8);

    impl ChangeFlags for LampChanges {
        const NONE: Self = LampChanges(0);
        const ALL: Self = LampChanges(0x1);

        fn bits(self) -> u8 {
            self.0
        }

        fn from_bits_retain(bits: u8) -> Self {
            LampChanges(bits)
        }
    }

    struct Lamp {
        on: bool,
    }

    struct LampComponent {
        host: Weak<RefCell<Lamp>>,
        previous: bool,
    }

    impl SynchronizedComponent for LampComponent {
        type Changes = LampChanges;

        fn short_id(&self) -> ShortId {
            LMP
        }

        fn is_alive(&self) -> bool {
            self.host.strong_count() > 0
        }

        fn calculate_delta_changes(&mut self, _: &PerformanceParameters) -> LampChanges {
            let on = self.host.upgrade().map(|h| h.borrow().on).unwrap_or(false);
            if on != self.previous {
                self.previous = on;
                LampChanges(0x1)
            } else {
                LampChanges::NONE
            }
        }

        fn send_complete_changes(
            &mut self,
            sink: &mut dyn MessageSink,
            endpoints: &[EndpointId],
        ) -> MirraResult<()> {
            self.send_delta_changes(sink, endpoints, LampChanges::ALL)
        }

        fn send_delta_changes(
            &mut self,
            sink: &mut dyn MessageSink,
            endpoints: &[EndpointId],
            changes: LampChanges,
        ) -> MirraResult<()> {
            let mut message = MessageWriter::begin(LMP, changes.bits());
            message.write_bool(self.previous);
            sink.send(endpoints, message.finish())
        }
    }

    #[derive(Default)]
    struct LampService {
        mirrors: BTreeMap<ObjectId, bool>,
    }

    impl ComponentService for LampService {
        fn id(&self) -> ShortId {
            LMP
        }

        fn definition(&self) -> ComponentDefinition {
            ComponentDefinition::new(|host: Weak<RefCell<Lamp>>| LampComponent {
                host,
                previous: false,
            })
        }

        fn read(&mut self, _: EndpointId, object: ObjectId, message: &[u8]) -> MirraResult<()> {
            let (header, payload) = MessageHeader::split(message)?;
            let flags = LampChanges::from_bits(header.flags).ok_or(
                MirraError::UnsupportedChangeFlags {
                    id: header.id,
                    flags: header.flags,
                },
            )?;
            let mut reader = MessageReader::new(payload);
            if flags.contains(LampChanges(0x1)) {
                let on = reader.read_bool()?;
                self.mirrors.insert(object, on);
            }
            reader.expect_end()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct VecTransport {
        sent: Vec<(Vec<EndpointId>, Bytes)>,
        fail: bool,
    }

    impl MessageSink for VecTransport {
        fn send(&mut self, endpoints: &[EndpointId], bytes: Bytes) -> MirraResult<()> {
            if self.fail {
                return Err(MirraError::TransportError("link down".into()));
            }
            self.sent.push((endpoints.to_vec(), bytes));
            Ok(())
        }
    }

    fn authoring() -> (SyncManager<VecTransport>, Rc<RefCell<Lamp>>) {
        let mut manager = SyncManager::new(VecTransport::default());
        manager.register_service(LampService::default()).unwrap();
        let lamp = Rc::new(RefCell::new(Lamp { on: true }));
        assert_eq!(manager.object_created(ObjectId::new(1), lamp.clone()), 1);
        (manager, lamp)
    }

    #[test]
    fn test_duplicate_registration_is_fatal() {
        let mut manager = SyncManager::new(VecTransport::default());
        manager.register_service(LampService::default()).unwrap();
        let result = manager.register_service(LampService::default());
        assert!(matches!(result, Err(MirraError::DuplicateShortId(_))));
    }

    #[test]
    fn test_tick_sends_enveloped_messages() {
        let (mut manager, lamp) = authoring();
        manager.connect(EndpointId::new(9));

        manager.tick().unwrap();
        manager.tick().unwrap();
        lamp.borrow_mut().on = false;
        manager.tick().unwrap();

        let sent = &manager.transport().sent;
        assert_eq!(sent.len(), 2);
        assert_eq!(&sent[0].1[..], b"\x01\x00\x00\x00LMP\x01\x01");
        assert_eq!(&sent[1].1[..], b"\x01\x00\x00\x00LMP\x01\x00");
        assert_eq!(manager.stats().messages_sent, 2);
        assert_eq!(manager.stats().bytes_sent, 18);
        assert_eq!(manager.stats().ticks, 3);
    }

    #[test]
    fn test_destroyed_host_detaches() {
        let (mut manager, lamp) = authoring();
        manager.connect(EndpointId::new(1));
        drop(lamp);

        manager.tick().unwrap();
        assert_eq!(manager.instance_count(), 0);
        assert!(manager.transport().sent.is_empty());
    }

    #[test]
    fn test_object_destroyed_explicitly() {
        let (mut manager, _lamp) = authoring();
        assert_eq!(manager.object_destroyed(ObjectId::new(1)), 1);
        assert!(!manager.has_instance(ObjectId::new(1), LMP));
    }

    #[test]
    fn test_duplicate_attach_ignored() {
        let (mut manager, lamp) = authoring();
        assert_eq!(manager.object_created(ObjectId::new(1), lamp), 0);
        assert_eq!(manager.instance_count(), 1);
    }

    #[test]
    fn test_unmatched_capability_not_attached() {
        let mut manager = SyncManager::new(VecTransport::default());
        manager.register_service(LampService::default()).unwrap();
        let host: Rc<dyn Any> = Rc::new(RefCell::new("not a lamp"));
        assert_eq!(manager.object_created(ObjectId::new(2), host), 0);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let (mut manager, _lamp) = authoring();
        manager.connect(EndpointId::new(1));
        manager.transport_mut().fail = true;

        assert!(matches!(manager.tick(), Err(MirraError::TransportError(_))));

        // The endpoint is still owed its complete state
        manager.transport_mut().fail = false;
        manager.tick().unwrap();
        assert_eq!(manager.transport().sent.len(), 1);
    }

    #[test]
    fn test_oversized_message_rejected() {
        let config = SyncConfig::default().with_max_message_size(4);
        let mut manager = SyncManager::with_config(config, VecTransport::default());
        manager.register_service(LampService::default()).unwrap();
        let lamp = Rc::new(RefCell::new(Lamp { on: true }));
        manager.object_created(ObjectId::new(1), lamp.clone());
        manager.connect(EndpointId::new(1));

        assert!(matches!(manager.tick(), Err(MirraError::InvalidWireFormat(_))));
        assert!(manager.transport().sent.is_empty());
        assert_eq!(manager.instance_count(), 1);
        assert_eq!(manager.stats().messages_sent, 0);
        drop(lamp);
    }

    #[test]
    fn test_request_full_snapshot() {
        let (mut manager, _lamp) = authoring();
        let a = EndpointId::new(1);
        manager.connect(a);
        manager.tick().unwrap();
        manager.tick().unwrap();
        assert_eq!(manager.transport().sent.len(), 1);

        manager.request_full_snapshot(a);
        manager.tick().unwrap();
        assert_eq!(manager.transport().sent.len(), 2);
        assert_eq!(manager.transport().sent[1].1, manager.transport().sent[0].1);
    }

    #[test]
    fn test_receive_applies_to_service() {
        let mut observer = SyncManager::new(VecTransport::default());
        observer.register_service(LampService::default()).unwrap();

        let received = observer
            .receive(EndpointId::new(5), b"\x03\x00\x00\x00LMP\x01\x01")
            .unwrap();
        assert_eq!(
            received,
            Received::Applied {
                object: ObjectId::new(3),
                id: LMP
            }
        );

        let service = observer.service::<LampService>(LMP).unwrap();
        assert_eq!(service.mirrors.get(&ObjectId::new(3)), Some(&true));
    }

    #[test]
    fn test_receive_unknown_id_dropped() {
        let mut observer = SyncManager::new(VecTransport::default());
        observer.register_service(LampService::default()).unwrap();

        let received = observer
            .receive(EndpointId::new(5), b"\x03\x00\x00\x00XYZ\x01\x01")
            .unwrap();
        assert_eq!(received, Received::Unrecognized(ShortId::from_static(b"XYZ")));
        assert_eq!(observer.stats().unrecognized, 1);
        assert!(!observer.is_faulted(EndpointId::new(5)));
    }

    #[test]
    fn test_malformed_message_flags_endpoint() {
        let mut observer = SyncManager::new(VecTransport::default());
        observer.register_service(LampService::default()).unwrap();
        let bad = EndpointId::new(6);
        let good = EndpointId::new(7);

        // Undefined flag bit
        let result = observer.receive(bad, b"\x03\x00\x00\x00LMP\x80");
        assert!(matches!(
            result,
            Err(MirraError::UnsupportedChangeFlags { flags: 0x80, .. })
        ));
        assert!(observer.is_faulted(bad));

        // Truncated envelope
        assert!(observer.receive(bad, b"\x03\x00").is_err());
        assert_eq!(observer.stats().protocol_errors, 2);

        // Other endpoints are unaffected
        observer
            .receive(good, b"\x03\x00\x00\x00LMP\x01\x00")
            .unwrap();
        assert!(!observer.is_faulted(good));
        assert_eq!(observer.faulted_endpoints().collect::<Vec<_>>(), vec![bad]);

        observer.disconnect(bad);
        assert!(!observer.is_faulted(bad));
    }
}
