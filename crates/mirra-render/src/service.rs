//! Renderer component service
//!
//! Registers the renderer definition on the authoring side and keeps one
//! `RendererState` mirror per remote object on the observer side.

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::rc::Weak;

use mirra_core::{EndpointId, MirraError, MirraResult, ObjectId, ShortId};
use mirra_sync::{ComponentDefinition, ComponentService};
use tracing::debug;

use crate::{RendererKind, RendererState, RendererUpdate, SynchronizedRenderer};

/// Service for one renderer kind
pub struct RendererService<K> {
    mirrors: BTreeMap<ObjectId, RendererState>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: RendererKind> RendererService<K> {
    pub fn new() -> Self {
        RendererService {
            mirrors: BTreeMap::new(),
            _kind: PhantomData,
        }
    }

    /// Mirrored state of a remote renderer
    pub fn mirror(&self, object: ObjectId) -> Option<&RendererState> {
        self.mirrors.get(&object)
    }

    pub fn mirrors(&self) -> impl Iterator<Item = (ObjectId, &RendererState)> {
        self.mirrors.iter().map(|(o, s)| (*o, s))
    }

    /// Forget a remote renderer
    pub fn remove_mirror(&mut self, object: ObjectId) -> Option<RendererState> {
        self.mirrors.remove(&object)
    }
}

impl<K: RendererKind> Default for RendererService<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: RendererKind> ComponentService for RendererService<K> {
    fn id(&self) -> ShortId {
        K::ID
    }

    fn definition(&self) -> ComponentDefinition {
        ComponentDefinition::new(|host: Weak<RefCell<K::Host>>| {
            SynchronizedRenderer::<K>::new(host)
        })
    }

    fn read(&mut self, from: EndpointId, object: ObjectId, message: &[u8]) -> MirraResult<()> {
        let update = RendererUpdate::decode(K::ID, message)?;
        let changes = update.changes;

        match self.mirrors.get_mut(&object) {
            Some(state) => update.apply_to(state)?,
            None => {
                // Property updates need the list they patch
                if update.materials.is_none() && update.properties.is_some() {
                    return Err(MirraError::UnknownObject(object));
                }
                let mut state = RendererState::default();
                update.apply_to(&mut state)?;
                self.mirrors.insert(object, state);
            }
        }

        debug!(
            endpoint = %from,
            object = %object,
            id = %K::ID,
            flags = changes.0,
            "applied renderer update"
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
