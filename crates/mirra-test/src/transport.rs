//! In-memory transport that records every delivery

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use mirra_core::{EndpointId, MirraError, MirraResult};
use mirra_sync::MessageSink;
use parking_lot::Mutex;

/// One `send` call as seen by the transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub endpoints: Vec<EndpointId>,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
struct Recorded {
    deliveries: Vec<Delivery>,
    unreachable: BTreeSet<EndpointId>,
    offline: bool,
}

/// Recording transport
///
/// Clones share the same log, so a test can keep a handle after moving the
/// transport into a manager.
#[derive(Clone, Debug, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        RecordingTransport::default()
    }

    /// Snapshot of everything delivered so far
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.inner.lock().deliveries.clone()
    }

    /// Drain the log
    pub fn take(&self) -> Vec<Delivery> {
        std::mem::take(&mut self.inner.lock().deliveries)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail every send while offline
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    /// Fail sends addressed to `endpoint` with `ConnectionFailed`
    pub fn set_unreachable(&self, endpoint: EndpointId, unreachable: bool) {
        let mut inner = self.inner.lock();
        if unreachable {
            inner.unreachable.insert(endpoint);
        } else {
            inner.unreachable.remove(&endpoint);
        }
    }
}

impl MessageSink for RecordingTransport {
    fn send(&mut self, endpoints: &[EndpointId], bytes: Bytes) -> MirraResult<()> {
        let mut inner = self.inner.lock();
        if inner.offline {
            return Err(MirraError::TransportError("transport offline".into()));
        }
        if let Some(endpoint) = endpoints.iter().find(|e| inner.unreachable.contains(*e)) {
            return Err(MirraError::ConnectionFailed(*endpoint));
        }

        inner.deliveries.push(Delivery {
            endpoints: endpoints.to_vec(),
            bytes,
        });
        Ok(())
    }
}
