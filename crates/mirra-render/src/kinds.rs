//! Built-in renderer kinds

use mirra_core::{PropertyInfo, ShortId};

use crate::{MeshRenderer, RendererKind, RendererService, SkinnedMeshRenderer};

/// Skinning weights are driven locally by animation on every observer
pub const BLEND_SHAPE_WEIGHTS_PROPERTY: &str = "_BlendShapeWeights";

/// Static mesh renderers
pub struct MeshRendererKind;

impl RendererKind for MeshRendererKind {
    type Host = MeshRenderer;

    const ID: ShortId = ShortId::from_static(b"MSH");
}

/// Skinned mesh renderers
pub struct SkinnedMeshRendererKind;

impl RendererKind for SkinnedMeshRendererKind {
    type Host = SkinnedMeshRenderer;

    const ID: ShortId = ShortId::from_static(b"SKN");

    fn should_synchronize_material_property(property: &PropertyInfo<'_>) -> bool {
        property.name != BLEND_SHAPE_WEIGHTS_PROPERTY
    }
}

pub type MeshRendererService = RendererService<MeshRendererKind>;
pub type SkinnedMeshRendererService = RendererService<SkinnedMeshRendererKind>;
