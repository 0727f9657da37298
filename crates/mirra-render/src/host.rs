//! Host renderer capabilities
//!
//! The rendering engine owns the real renderers. MIRRA only reads visibility
//! and materials through `Renderable`. `MeshRenderer` and
//! `SkinnedMeshRenderer` are plain in-memory hosts used by the authoring
//! side of tests and demos.

use mirra_core::{MaterialDescriptor, PropertyValue};

/// Read access to a renderable object
pub trait Renderable: 'static {
    fn enabled(&self) -> bool;

    fn materials(&self) -> &[MaterialDescriptor];
}

fn set_material_property(
    materials: &mut [MaterialDescriptor],
    slot: usize,
    name: &str,
    value: PropertyValue,
) -> bool {
    match materials.get_mut(slot).and_then(|m| m.property_mut(name)) {
        Some(property) => {
            property.value = value;
            true
        }
        None => false,
    }
}

/// Static mesh renderer
#[derive(Clone, Debug, PartialEq)]
pub struct MeshRenderer {
    pub enabled: bool,
    pub materials: Vec<MaterialDescriptor>,
}

impl MeshRenderer {
    pub fn new(materials: Vec<MaterialDescriptor>) -> Self {
        MeshRenderer {
            enabled: true,
            materials,
        }
    }

    /// Set a property value in place. Returns false if slot or property is missing.
    pub fn set_property(&mut self, slot: usize, name: &str, value: PropertyValue) -> bool {
        set_material_property(&mut self.materials, slot, name, value)
    }
}

impl Renderable for MeshRenderer {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn materials(&self) -> &[MaterialDescriptor] {
        &self.materials
    }
}

/// Skinned (animated) mesh renderer
#[derive(Clone, Debug, PartialEq)]
pub struct SkinnedMeshRenderer {
    pub enabled: bool,
    pub materials: Vec<MaterialDescriptor>,
}

impl SkinnedMeshRenderer {
    pub fn new(materials: Vec<MaterialDescriptor>) -> Self {
        SkinnedMeshRenderer {
            enabled: true,
            materials,
        }
    }

    pub fn set_property(&mut self, slot: usize, name: &str, value: PropertyValue) -> bool {
        set_material_property(&mut self.materials, slot, name, value)
    }
}

impl Renderable for SkinnedMeshRenderer {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn materials(&self) -> &[MaterialDescriptor] {
        &self.materials
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_property() {
        let mut renderer = MeshRenderer::new(vec![MaterialDescriptor::new("A", "Standard")
            .with_property("_Glossiness", PropertyValue::Float(0.5))]);

        assert!(renderer.set_property(0, "_Glossiness", PropertyValue::Float(0.9)));
        assert_eq!(
            renderer.materials[0].property("_Glossiness").unwrap().value,
            PropertyValue::Float(0.9)
        );
        assert!(!renderer.set_property(1, "_Glossiness", PropertyValue::Float(0.9)));
        assert!(!renderer.set_property(0, "_Missing", PropertyValue::Float(0.9)));
    }
}
