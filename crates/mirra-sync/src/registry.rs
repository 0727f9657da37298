//! Service registry keyed by ShortId

use std::collections::BTreeMap;

use mirra_core::{MirraError, MirraResult, ShortId};

use crate::{ComponentDefinition, ComponentService};

struct Registration {
    service: Box<dyn ComponentService>,
    definition: ComponentDefinition,
}

/// Registered component services, one per ShortId
#[derive(Default)]
pub struct ServiceRegistry {
    services: BTreeMap<ShortId, Registration>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        ServiceRegistry::default()
    }

    /// Register a service; a second service with the same ShortId is rejected
    pub fn register(&mut self, service: Box<dyn ComponentService>) -> MirraResult<ShortId> {
        let id = service.id();
        if self.services.contains_key(&id) {
            return Err(MirraError::DuplicateShortId(id));
        }
        let definition = service.definition();
        self.services.insert(
            id,
            Registration {
                service,
                definition,
            },
        );
        Ok(id)
    }

    pub fn contains(&self, id: ShortId) -> bool {
        self.services.contains_key(&id)
    }

    pub fn get(&self, id: ShortId) -> Option<&dyn ComponentService> {
        self.services.get(&id).map(|r| r.service.as_ref())
    }

    pub fn get_mut(&mut self, id: ShortId) -> Option<&mut (dyn ComponentService + 'static)> {
        self.services.get_mut(&id).map(|r| r.service.as_mut())
    }

    pub fn definition(&self, id: ShortId) -> Option<&ComponentDefinition> {
        self.services.get(&id).map(|r| &r.definition)
    }

    /// Definitions in ShortId order
    pub fn definitions(&self) -> impl Iterator<Item = (ShortId, &ComponentDefinition)> {
        self.services.iter().map(|(id, r)| (*id, &r.definition))
    }

    pub fn ids(&self) -> impl Iterator<Item = ShortId> + '_ {
        self.services.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
