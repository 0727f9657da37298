//! MIRRA Mirror Demo
//!
//! Runs one authoring side and two observers in-process. A mesh renderer is
//! hidden, re-skinned and tweaked over a few ticks, and every wire message is
//! printed alongside the observer's mirrored state.
//!
//! Set `RUST_LOG=debug` to see the manager's own logging.

use mirra_core::{EndpointId, MaterialDescriptor, MirraResult, ObjectId, PropertyValue};
use mirra_render::{MeshRenderer, SkinnedMeshRenderer, BLEND_SHAPE_WEIGHTS_PROPERTY};
use mirra_test::{component_messages, MirrorHarness};
use mirra_wire::MessageHeader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const FIRST: EndpointId = EndpointId(1);
const SECOND: EndpointId = EndpointId(2);
const MESH: ObjectId = ObjectId(100);
const SKIN: ObjectId = ObjectId(200);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== MIRRA Mirror Demo ===\n");

    if let Err(e) = run() {
        error!(error = %e, "demo failed");
        std::process::exit(1);
    }
}

fn run() -> MirraResult<()> {
    // 1. Authoring side with one observer
    println!("1. Connecting first observer...");
    let mut harness = MirrorHarness::new()?;
    harness.add_observer(FIRST)?;

    // 2. Scene objects
    println!("\n2. Spawning renderers...");
    let mesh = harness.spawn_mesh(
        MESH,
        MeshRenderer::new(vec![MaterialDescriptor::new("Hull", "Standard")
            .with_property("_Color", PropertyValue::Color([0.2, 0.4, 0.8, 1.0]))
            .with_property("_Glossiness", PropertyValue::Float(0.5))]),
    );
    let skin = harness.spawn_skinned_mesh(
        SKIN,
        SkinnedMeshRenderer::new(vec![MaterialDescriptor::new("Face", "Skin")
            .with_property("_Color", PropertyValue::Color([0.9, 0.7, 0.6, 1.0]))
            .with_property(BLEND_SHAPE_WEIGHTS_PROPERTY, PropertyValue::Vector([0.0; 4]))]),
    );
    print_tick(&mut harness, "attach")?;

    // 3. Visibility
    println!("\n3. Hiding the mesh...");
    mesh.borrow_mut().enabled = false;
    print_tick(&mut harness, "hide")?;

    // 4. Structural material change
    println!("\n4. Swapping the hull material...");
    mesh.borrow_mut().materials[0] = MaterialDescriptor::new("HullDamaged", "Standard")
        .with_property("_Color", PropertyValue::Color([0.3, 0.3, 0.3, 1.0]))
        .with_property("_Glossiness", PropertyValue::Float(0.1));
    print_tick(&mut harness, "swap")?;

    // 5. Value-only changes; blend shape weights stay local
    println!("\n5. Animating properties...");
    mesh.borrow_mut().set_property(0, "_Glossiness", PropertyValue::Float(0.35));
    skin.borrow_mut()
        .set_property(0, BLEND_SHAPE_WEIGHTS_PROPERTY, PropertyValue::Vector([1.0, 0.0, 0.0, 0.0]));
    print_tick(&mut harness, "animate")?;

    // 6. Late joiner
    println!("\n6. Connecting second observer...");
    harness.add_observer(SECOND)?;
    print_tick(&mut harness, "late join")?;

    // 7. Mirrored state
    println!("\n7. Observer state:");
    for endpoint in [FIRST, SECOND] {
        let Some(observer) = harness.observer(endpoint) else {
            continue;
        };
        if let Some(state) = observer.mesh(MESH) {
            println!(
                "   {} mesh: enabled={} materials={:?}",
                endpoint,
                state.enabled,
                state.materials.iter().map(|m| m.name.as_str()).collect::<Vec<_>>()
            );
        }
        if let Some(state) = observer.skinned_mesh(SKIN) {
            println!(
                "   {} skinned mesh: enabled={} properties={}",
                endpoint,
                state.enabled,
                state.materials.iter().map(|m| m.properties.len()).sum::<usize>()
            );
        }
    }

    let stats = harness.authoring().stats();
    info!(
        ticks = stats.ticks,
        messages = stats.messages_sent,
        bytes = stats.bytes_sent,
        "authoring summary"
    );
    println!(
        "\n   Sent {} messages ({} bytes) over {} ticks",
        stats.messages_sent, stats.bytes_sent, stats.ticks
    );

    println!("\n=== Demo Complete ===");
    Ok(())
}

fn print_tick(harness: &mut MirrorHarness, label: &str) -> MirraResult<()> {
    let deliveries = harness.tick()?;
    let messages = component_messages(&deliveries)?;
    println!("   [{}] {} message(s)", label, messages.len());

    for (delivery, message) in deliveries.iter().zip(messages.iter()) {
        let header = MessageHeader::parse(&message.bytes)?;
        println!(
            "   -> {:?} object={} id={} flags=0x{:02x} len={}",
            delivery.endpoints,
            message.object,
            header.id,
            header.flags,
            message.bytes.len()
        );
    }
    Ok(())
}
