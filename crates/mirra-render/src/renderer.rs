//! Synchronized renderer
//!
//! Generic over a `RendererKind`, which names the host type, the ShortId and
//! the property filter. Two messages may leave per tick, in this order:
//! 1. `[id][flags & !MaterialProperty][enabled?][materials?]` unless the
//!    flags are exactly `MaterialProperty`
//! 2. `[id][MaterialProperty][property list]` when `MaterialProperty` is set

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Weak;

use mirra_core::{
    ChangeFlags, EndpointId, MirraResult, PerformanceParameters, PropertyInfo, ShortId,
};
use mirra_sync::{MessageSink, SynchronizedComponent};
use mirra_wire::{MessageHeader, MessageWriter};
use tracing::trace;

use crate::{Renderable, RendererChanges, SynchronizedMaterials};

/// Concrete renderer kind
pub trait RendererKind: 'static {
    /// Host capability this kind synchronizes
    type Host: Renderable;

    const ID: ShortId;

    /// Flags forced on the complete message
    const INITIAL_CHANGES: RendererChanges = RendererChanges::COMPLETE;

    fn is_enabled(host: &Self::Host) -> bool {
        host.enabled()
    }

    /// Exclude properties that observers have no use for
    fn should_synchronize_material_property(_property: &PropertyInfo<'_>) -> bool {
        true
    }
}

/// Renderer visibility and material component
pub struct SynchronizedRenderer<K: RendererKind> {
    host: Weak<RefCell<K::Host>>,
    previous_enabled: bool,
    materials: SynchronizedMaterials,
    _kind: PhantomData<K>,
}

impl<K: RendererKind> SynchronizedRenderer<K> {
    pub fn new(host: Weak<RefCell<K::Host>>) -> Self {
        SynchronizedRenderer {
            host,
            previous_enabled: false,
            materials: SynchronizedMaterials::new(),
            _kind: PhantomData,
        }
    }

    /// Cached material state
    pub fn materials(&self) -> &SynchronizedMaterials {
        &self.materials
    }

    fn write_renderer(
        &self,
        message: &mut MessageWriter,
        changes: RendererChanges,
    ) -> MirraResult<()> {
        if changes.has_enabled() {
            message.write_bool(self.previous_enabled);
        }
        if changes.has_materials() {
            self.materials
                .write_materials(message, K::should_synchronize_material_property)?;
        }
        Ok(())
    }
}

impl<K: RendererKind> SynchronizedComponent for SynchronizedRenderer<K> {
    type Changes = RendererChanges;

    fn short_id(&self) -> ShortId {
        K::ID
    }

    fn on_initialized(&mut self) {
        trace!(id = %K::ID, "renderer component initialized");
    }

    fn is_alive(&self) -> bool {
        self.host.strong_count() > 0
    }

    fn calculate_delta_changes(&mut self, params: &PerformanceParameters) -> RendererChanges {
        let Some(host) = self.host.upgrade() else {
            return RendererChanges::NONE;
        };
        let host = host.borrow();

        let mut changes = RendererChanges::NONE;

        let enabled = K::is_enabled(&host);
        if self.previous_enabled != enabled {
            self.previous_enabled = enabled;
            changes |= RendererChanges::ENABLED;
        }

        if self.materials.update_materials(host.materials()) {
            changes |= RendererChanges::MATERIALS;
        } else if self.materials.detect_property_changes(
            params,
            host.materials(),
            K::should_synchronize_material_property,
        ) {
            // A structural resend already carries current values
            changes |= RendererChanges::MATERIAL_PROPERTY;
        }

        changes
    }

    fn send_complete_changes(
        &mut self,
        sink: &mut dyn MessageSink,
        endpoints: &[EndpointId],
    ) -> MirraResult<()> {
        self.send_delta_changes(sink, endpoints, K::INITIAL_CHANGES)
    }

    fn send_delta_changes(
        &mut self,
        sink: &mut dyn MessageSink,
        endpoints: &[EndpointId],
        changes: RendererChanges,
    ) -> MirraResult<()> {
        if changes != RendererChanges::MATERIAL_PROPERTY {
            let primary = changes.difference(RendererChanges::MATERIAL_PROPERTY);
            let mut message = MessageWriter::begin(K::ID, primary.bits());
            self.write_renderer(&mut message, primary)?;
            sink.send(endpoints, message.finish())?;
        }

        if changes.has_material_property() {
            self.materials
                .send_material_property_changes(sink, endpoints, |message| {
                    message.write_header(MessageHeader::new(
                        K::ID,
                        RendererChanges::MATERIAL_PROPERTY.bits(),
                    ));
                })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use bytes::Bytes;
    use mirra_core::{MaterialDescriptor, PropertyValue};
    use proptest::prelude::*;

    use crate::{materials_encoded_len, MeshRenderer, MeshRendererKind, RendererUpdate};

    const MSH: ShortId = MeshRendererKind::ID;

    #[derive(Default)]
    struct VecSink {
        sent: Vec<(Vec<EndpointId>, Bytes)>,
    }

    impl MessageSink for VecSink {
        fn send(&mut self, endpoints: &[EndpointId], bytes: Bytes) -> MirraResult<()> {
            self.sent.push((endpoints.to_vec(), bytes));
            Ok(())
        }
    }

    fn material(name: &str, glossiness: f32) -> MaterialDescriptor {
        MaterialDescriptor::new(name, "Standard")
            .with_property("_Glossiness", PropertyValue::Float(glossiness))
    }

    fn attached(
        host: MeshRenderer,
    ) -> (Rc<RefCell<MeshRenderer>>, SynchronizedRenderer<MeshRendererKind>) {
        let host = Rc::new(RefCell::new(host));
        let mut renderer = SynchronizedRenderer::<MeshRendererKind>::new(Rc::downgrade(&host));
        renderer.on_initialized();
        (host, renderer)
    }

    #[test]
    fn test_first_calculation_reports_initial_state() {
        let params = PerformanceParameters::default();
        let (_host, mut renderer) = attached(MeshRenderer::new(vec![material("A", 0.5)]));

        let changes = renderer.calculate_delta_changes(&params);
        assert_eq!(changes, RendererChanges::ENABLED | RendererChanges::MATERIALS);
    }

    #[test]
    fn test_idempotent_calculation() {
        let params = PerformanceParameters::default();
        let (host, mut renderer) = attached(MeshRenderer::new(vec![material("A", 0.5)]));
        renderer.calculate_delta_changes(&params);

        host.borrow_mut().enabled = false;
        host.borrow_mut().set_property(0, "_Glossiness", PropertyValue::Float(0.1));
        assert_eq!(
            renderer.calculate_delta_changes(&params),
            RendererChanges::ENABLED | RendererChanges::MATERIAL_PROPERTY
        );
        assert_eq!(renderer.calculate_delta_changes(&params), RendererChanges::NONE);
    }

    #[test]
    fn test_structural_change_suppresses_property_bit() {
        let params = PerformanceParameters::default();
        let (host, mut renderer) = attached(MeshRenderer::new(vec![material("A", 0.5)]));
        renderer.calculate_delta_changes(&params);

        // Count and value change in the same tick
        host.borrow_mut().materials = vec![material("A", 0.9), material("B", 0.1)];
        let changes = renderer.calculate_delta_changes(&params);
        assert_eq!(changes, RendererChanges::MATERIALS);
        assert!(renderer.materials().pending_property_changes().is_empty());
    }

    #[test]
    fn test_complete_message_layout() {
        let params = PerformanceParameters::default();
        let materials = vec![material("A", 0.5)];
        let (_host, mut renderer) = attached(MeshRenderer::new(materials.clone()));
        let mut sink = VecSink::default();
        let endpoint = [EndpointId::new(1)];

        renderer.calculate_delta_changes(&params);
        renderer.send_complete_changes(&mut sink, &endpoint).unwrap();

        assert_eq!(sink.sent.len(), 1);
        let bytes = &sink.sent[0].1;
        assert_eq!(&bytes[..4], b"MSH\x03");
        assert_eq!(bytes[4], 0x01);
        assert_eq!(bytes.len(), 4 + 1 + materials_encoded_len(&materials, |_| true));

        let update = RendererUpdate::decode(MSH, bytes).unwrap();
        assert_eq!(update.enabled, Some(true));
        assert_eq!(update.materials, Some(materials));
    }

    #[test]
    fn test_property_only_skips_primary_message() {
        let params = PerformanceParameters::default();
        let (host, mut renderer) = attached(MeshRenderer::new(vec![material("A", 0.5)]));
        let mut sink = VecSink::default();
        renderer.calculate_delta_changes(&params);

        host.borrow_mut().set_property(0, "_Glossiness", PropertyValue::Float(0.75));
        let changes = renderer.calculate_delta_changes(&params);
        assert_eq!(changes, RendererChanges::MATERIAL_PROPERTY);

        renderer.send_delta_changes(&mut sink, &[], changes).unwrap();
        assert_eq!(sink.sent.len(), 1);
        assert_eq!(&sink.sent[0].1[..4], b"MSH\x04");
    }

    #[test]
    fn test_enabled_and_property_send_two_messages_in_order() {
        let params = PerformanceParameters::default();
        let (host, mut renderer) = attached(MeshRenderer::new(vec![material("A", 0.5)]));
        let mut sink = VecSink::default();
        renderer.calculate_delta_changes(&params);

        host.borrow_mut().enabled = false;
        host.borrow_mut().set_property(0, "_Glossiness", PropertyValue::Float(0.75));
        let changes = renderer.calculate_delta_changes(&params);
        renderer.send_delta_changes(&mut sink, &[], changes).unwrap();

        assert_eq!(sink.sent.len(), 2);
        assert_eq!(&sink.sent[0].1[..], b"MSH\x01\x00");
        assert_eq!(&sink.sent[1].1[..4], b"MSH\x04");
    }

    #[test]
    fn test_dead_host_reports_nothing() {
        let params = PerformanceParameters::default();
        let (host, mut renderer) = attached(MeshRenderer::new(vec![]));
        drop(host);
        assert!(!renderer.is_alive());
        assert_eq!(renderer.calculate_delta_changes(&params), RendererChanges::NONE);
    }

    proptest! {
        #[test]
        fn prop_enabled_reported_iff_changed(
            sequence in proptest::collection::vec(any::<bool>(), 1..40)
        ) {
            let params = PerformanceParameters::default();
            let (host, mut renderer) = attached(MeshRenderer::new(vec![material("A", 0.5)]));
            renderer.calculate_delta_changes(&params);
            let mut previous = true;

            for enabled in sequence {
                host.borrow_mut().enabled = enabled;
                let changes = renderer.calculate_delta_changes(&params);
                prop_assert_eq!(changes.has_enabled(), enabled != previous);
                // Never twice for the same value
                prop_assert!(!renderer.calculate_delta_changes(&params).has_enabled());
                previous = enabled;
            }
        }

        #[test]
        fn prop_structural_and_value_edits_are_exclusive(
            edits in proptest::collection::vec((0u8..4, 0.0f32..1.0), 1..30)
        ) {
            let params = PerformanceParameters::default();
            let (host, mut renderer) = attached(MeshRenderer::new(vec![material("M0", 0.5)]));
            renderer.calculate_delta_changes(&params);
            let mut next_name = 1;

            for (op, value) in edits {
                let structural = {
                    let mut h = host.borrow_mut();
                    match op {
                        // Append
                        0 => {
                            h.materials.push(material(&format!("M{}", next_name), value));
                            next_name += 1;
                            true
                        }
                        // Remove
                        1 if !h.materials.is_empty() => {
                            h.materials.pop();
                            true
                        }
                        // Replace first slot
                        2 if !h.materials.is_empty() => {
                            h.materials[0] = material(&format!("M{}", next_name), value);
                            next_name += 1;
                            true
                        }
                        // Value-only edit
                        3 if !h.materials.is_empty() => {
                            let current = h.materials[0].properties[0].value;
                            let new_value = PropertyValue::Float(value + 2.0);
                            prop_assume!(current != new_value);
                            h.set_property(0, "_Glossiness", new_value);
                            false
                        }
                        _ => continue,
                    }
                };

                let changes = renderer.calculate_delta_changes(&params);
                if structural {
                    prop_assert!(changes.has_materials());
                    prop_assert!(!changes.has_material_property());
                } else {
                    prop_assert!(!changes.has_materials());
                    prop_assert!(changes.has_material_property());
                }
                prop_assert_eq!(renderer.calculate_delta_changes(&params), RendererChanges::NONE);
            }
        }
    }
}
