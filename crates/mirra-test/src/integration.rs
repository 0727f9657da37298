//! End-to-end synchronization scenarios
//!
//! Drives an authoring manager and its observers through `MirrorHarness` and
//! checks both the exact bytes on the wire and observer convergence.

use mirra_core::{MirraResult, ObjectId};
use mirra_wire::open_envelope;

use crate::Delivery;

/// Component message carried by one delivery
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentMessage {
    pub object: ObjectId,
    pub bytes: Vec<u8>,
}

/// Strip the object envelope from each delivery
pub fn component_messages(deliveries: &[Delivery]) -> MirraResult<Vec<ComponentMessage>> {
    deliveries
        .iter()
        .map(|d| {
            let (object, message) = open_envelope(&d.bytes)?;
            Ok(ComponentMessage {
                object,
                bytes: message.to_vec(),
            })
        })
        .collect()
}
