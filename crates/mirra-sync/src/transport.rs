//! Outbound byte delivery

use bytes::Bytes;
use mirra_core::{EndpointId, MirraResult};

/// Destination for framed component messages
pub trait MessageSink {
    /// Deliver `bytes` to every endpoint in `endpoints`
    fn send(&mut self, endpoints: &[EndpointId], bytes: Bytes) -> MirraResult<()>;
}

impl<S: MessageSink + ?Sized> MessageSink for Box<S> {
    fn send(&mut self, endpoints: &[EndpointId], bytes: Bytes) -> MirraResult<()> {
        (**self).send(endpoints, bytes)
    }
}

/// Network transport driven by the synchronization manager
///
/// Any `MessageSink` is a transport. Delivery is synchronous from the
/// manager's point of view and a returned error aborts the current tick.
pub trait Transport: MessageSink {}

impl<T: MessageSink + ?Sized> Transport for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSink {
        sent: usize,
    }

    impl MessageSink for CountingSink {
        fn send(&mut self, _: &[EndpointId], _: Bytes) -> MirraResult<()> {
            self.sent += 1;
            Ok(())
        }
    }

    fn send_via_transport<T: Transport>(transport: &mut T) -> MirraResult<()> {
        transport.send(&[EndpointId::new(1)], Bytes::from_static(b"MSH\x01\x01"))
    }

    #[test]
    fn test_sink_is_transport() {
        let mut sink = CountingSink::default();
        send_via_transport(&mut sink).unwrap();
        assert_eq!(sink.sent, 1);
    }

    #[test]
    fn test_boxed_transport() {
        let mut boxed: Box<dyn Transport> = Box::new(CountingSink::default());
        send_via_transport(&mut boxed).unwrap();
        send_via_transport(&mut boxed).unwrap();

        let sink: &mut dyn MessageSink = &mut boxed;
        sink.send(&[], Bytes::new()).unwrap();
    }
}
