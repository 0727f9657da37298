//! Component services and definitions
//!
//! A service is the process-wide entry point for one component kind. On the
//! authoring side it supplies the `ComponentDefinition` used to attach
//! instances to host objects; on the observer side it decodes the messages
//! tagged with its ShortId.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use mirra_core::{EndpointId, MirraResult, ObjectId, ShortId};

use crate::{ComponentDriver, ComponentInstance, SynchronizedComponent};

type Factory = Box<dyn Fn(Rc<dyn Any>) -> Option<Box<dyn ComponentInstance>>>;

/// How to attach a component kind to a host capability
///
/// Host capabilities are shared as `Rc<RefCell<H>>`; the definition matches on
/// `H` and hands the constructed component a `Weak` handle, so the component
/// never keeps the host alive.
pub struct ComponentDefinition {
    capability: TypeId,
    capability_name: &'static str,
    factory: Factory,
}

impl ComponentDefinition {
    /// Define a component built from a host capability of type `H`
    pub fn new<H, C, F>(constructor: F) -> Self
    where
        H: 'static,
        C: SynchronizedComponent + 'static,
        F: Fn(Weak<RefCell<H>>) -> C + 'static,
    {
        ComponentDefinition {
            capability: TypeId::of::<RefCell<H>>(),
            capability_name: std::any::type_name::<H>(),
            factory: Box::new(move |host: Rc<dyn Any>| {
                let host = host.downcast::<RefCell<H>>().ok()?;
                let component = constructor(Rc::downgrade(&host));
                Some(Box::new(ComponentDriver::new(component)) as Box<dyn ComponentInstance>)
            }),
        }
    }

    /// Type name of the synchronized host capability
    pub fn capability_name(&self) -> &'static str {
        self.capability_name
    }

    /// Whether `host` is the capability this definition synchronizes
    pub fn matches(&self, host: &dyn Any) -> bool {
        host.type_id() == self.capability
    }

    /// Build an instance for `host`, if it is the right capability
    pub fn instantiate(&self, host: Rc<dyn Any>) -> Option<Box<dyn ComponentInstance>> {
        (self.factory)(host)
    }
}

impl std::fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("capability", &self.capability_name)
            .finish()
    }
}

/// One service per component kind
pub trait ComponentService: Any {
    /// Globally unique wire tag
    fn id(&self) -> ShortId;

    /// Definition registered with the manager
    fn definition(&self) -> ComponentDefinition;

    /// Decode a complete component message (header included) sent by
    /// `from` about `object`
    fn read(&mut self, from: EndpointId, object: ObjectId, message: &[u8]) -> MirraResult<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirra_core::{ChangeFlags, PerformanceParameters};

    use crate::MessageSink;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct NoChanges(u8);

    impl ChangeFlags for NoChanges {
        const NONE: Self = NoChanges(0);
        const ALL: Self = NoChanges(0);

        fn bits(self) -> u8 {
            self.0
        }

        fn from_bits_retain(bits: u8) -> Self {
            NoChanges(bits)
        }
    }

    struct Light;

    struct LightComponent {
        host: Weak<RefCell<Light>>,
    }

    impl SynchronizedComponent for LightComponent {
        type Changes = NoChanges;

        fn short_id(&self) -> ShortId {
            ShortId::from_static(b"LGT")
        }

        fn is_alive(&self) -> bool {
            self.host.strong_count() > 0
        }

        fn calculate_delta_changes(&mut self, _: &PerformanceParameters) -> NoChanges {
            NoChanges::NONE
        }

        fn send_complete_changes(
            &mut self,
            _: &mut dyn MessageSink,
            _: &[EndpointId],
        ) -> MirraResult<()> {
            Ok(())
        }

        fn send_delta_changes(
            &mut self,
            _: &mut dyn MessageSink,
            _: &[EndpointId],
            _: NoChanges,
        ) -> MirraResult<()> {
            Ok(())
        }
    }

    fn definition() -> ComponentDefinition {
        ComponentDefinition::new(|host: Weak<RefCell<Light>>| LightComponent { host })
    }

    #[test]
    fn test_definition_matches_capability() {
        let def = definition();
        let light: Rc<dyn Any> = Rc::new(RefCell::new(Light));
        let other: Rc<dyn Any> = Rc::new(RefCell::new(42u32));

        assert!(def.matches(&*light));
        assert!(!def.matches(&*other));
        assert!(def.capability_name().ends_with("Light"));
    }

    #[test]
    fn test_instantiate_holds_weak_host() {
        let def = definition();
        let light = Rc::new(RefCell::new(Light));
        let instance = def.instantiate(light.clone()).unwrap();

        assert_eq!(instance.short_id(), ShortId::from_static(b"LGT"));
        assert!(instance.is_alive());
        assert_eq!(Rc::strong_count(&light), 1);

        drop(light);
        assert!(!instance.is_alive());
    }

    #[test]
    fn test_instantiate_wrong_capability() {
        let def = definition();
        assert!(def.instantiate(Rc::new(RefCell::new(1u8))).is_none());
    }
}
