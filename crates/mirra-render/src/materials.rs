//! Material diff engine
//!
//! Caches the last material snapshot seen for one renderer and classifies
//! each new observation as structural (slots, shaders or property layout
//! changed) or value-only. Value changes found by a poll are held as pending
//! until the next property message, or discarded at the next update.

use mirra_core::{
    EndpointId, MaterialDescriptor, MirraResult, PerformanceParameters, PropertyInfo,
};
use mirra_sync::MessageSink;
use mirra_wire::MessageWriter;

use crate::{write_materials, write_property_changes, PropertyChange};

/// Per-renderer material cache
#[derive(Debug, Default)]
pub struct SynchronizedMaterials {
    materials: Vec<MaterialDescriptor>,
    pending: Vec<PropertyChange>,
    polls: u64,
}

impl SynchronizedMaterials {
    pub fn new() -> Self {
        SynchronizedMaterials::default()
    }

    /// Last observed snapshot
    pub fn materials(&self) -> &[MaterialDescriptor] {
        &self.materials
    }

    /// Property changes found by the last poll and not yet sent
    pub fn pending_property_changes(&self) -> &[PropertyChange] {
        &self.pending
    }

    /// Compare `current` against the cache structurally.
    ///
    /// Returns true (and replaces the cache wholesale) when the slot count,
    /// any slot's name or shader, or any property layout differs. Pending
    /// property changes from an earlier tick are discarded either way.
    pub fn update_materials(&mut self, current: &[MaterialDescriptor]) -> bool {
        self.pending.clear();

        let differ = self.materials.len() != current.len()
            || self
                .materials
                .iter()
                .zip(current.iter())
                .any(|(cached, live)| !cached.same_structure(live));

        if differ {
            self.materials = current.to_vec();
        }
        differ
    }

    /// Diff property values of a structurally unchanged list.
    ///
    /// Changed values accepted by `filter` are written into the cache and
    /// recorded as pending. Returns true if anything is pending.
    pub fn detect_property_changes<F>(
        &mut self,
        params: &PerformanceParameters,
        current: &[MaterialDescriptor],
        filter: F,
    ) -> bool
    where
        F: Fn(&PropertyInfo<'_>) -> bool,
    {
        let poll = self.polls;
        self.polls += 1;
        if !params.should_poll_properties(poll) {
            return false;
        }

        for (slot, (cached, live)) in self.materials.iter_mut().zip(current.iter()).enumerate() {
            // Slots past the u16 range cannot be addressed on the wire
            let Ok(slot) = u16::try_from(slot) else {
                break;
            };

            // Index among synchronized properties, as laid out in the material list
            let mut index: u16 = 0;
            for (cached_property, live_property) in
                cached.properties.iter_mut().zip(live.properties.iter())
            {
                if !filter(&live_property.info()) {
                    continue;
                }
                let position = index;
                let Some(next) = index.checked_add(1) else {
                    break;
                };
                index = next;

                if cached_property
                    .value
                    .approx_eq(&live_property.value, params.float_tolerance)
                {
                    continue;
                }
                cached_property.value = live_property.value;
                self.pending.push(PropertyChange {
                    slot,
                    index: position,
                    name: live_property.name.clone(),
                    value: live_property.value,
                });
            }
        }

        !self.pending.is_empty()
    }

    /// Serialize the cached material list
    pub fn write_materials<F>(&self, writer: &mut MessageWriter, filter: F) -> MirraResult<()>
    where
        F: Fn(&PropertyInfo<'_>) -> bool,
    {
        write_materials(writer, &self.materials, filter)
    }

    /// Send the pending property changes as one message.
    ///
    /// `write_header` frames the message so it shares the component header
    /// layout. Returns false (and sends nothing) when nothing is pending.
    pub fn send_material_property_changes<H>(
        &mut self,
        sink: &mut dyn MessageSink,
        endpoints: &[EndpointId],
        write_header: H,
    ) -> MirraResult<bool>
    where
        H: FnOnce(&mut MessageWriter),
    {
        if self.pending.is_empty() {
            return Ok(false);
        }

        let mut message = MessageWriter::new();
        write_header(&mut message);
        write_property_changes(&mut message, &self.pending)?;
        sink.send(endpoints, message.finish())?;

        self.pending.clear();
        Ok(true)
    }
}
