//! Fuzz inbound component messages on an observer manager
//!
//! Arbitrary bytes must either apply cleanly or fail with a protocol error;
//! a mirror is never left half-updated and the manager never panics.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mirra_core::{EndpointId, ObjectId, SyncConfig};
use mirra_render::{MeshRendererKind, MeshRendererService, RendererKind, RendererUpdate};
use mirra_test::{renderer_manager, RecordingTransport};
use mirra_wire::wrap_envelope;

fuzz_target!(|data: &[u8]| {
    let Ok(mut observer) = renderer_manager(SyncConfig::default(), RecordingTransport::new()) else {
        return;
    };
    let from = EndpointId::new(1);

    // Raw buffer, envelope included
    let _ = observer.receive(from, data);

    // Same bytes as a component message for a known object
    let object = ObjectId::new(1);
    let _ = observer.receive(from, &wrap_envelope(object, b"MSH\x03\x01\x00\x00"));
    let before = observer
        .service::<MeshRendererService>(MeshRendererKind::ID)
        .and_then(|s| s.mirror(object))
        .cloned();

    let decoded = RendererUpdate::decode(MeshRendererKind::ID, data);
    let result = observer.receive(from, &wrap_envelope(object, data));
    let after = observer
        .service::<MeshRendererService>(MeshRendererKind::ID)
        .and_then(|s| s.mirror(object))
        .cloned();

    if data.starts_with(b"MSH") && decoded.is_err() {
        assert!(result.is_err());
    }
    if result.is_err() {
        assert_eq!(before, after);
    }
});
