//! Renderer change flags

use std::ops::{BitOr, BitOrAssign};

use mirra_core::ChangeFlags;

/// Renderer change bits (1 byte)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RendererChanges(pub u8);

impl RendererChanges {
    pub const NONE: RendererChanges = RendererChanges(0x0);
    pub const ENABLED: RendererChanges = RendererChanges(0x1);
    pub const MATERIALS: RendererChanges = RendererChanges(0x2);
    pub const MATERIAL_PROPERTY: RendererChanges = RendererChanges(0x4);

    /// Every field of the primary message; material values travel with the list
    pub const COMPLETE: RendererChanges = RendererChanges(0x1 | 0x2);

    #[inline]
    pub fn has_enabled(self) -> bool {
        self.0 & Self::ENABLED.0 != 0
    }

    #[inline]
    pub fn has_materials(self) -> bool {
        self.0 & Self::MATERIALS.0 != 0
    }

    #[inline]
    pub fn has_material_property(self) -> bool {
        self.0 & Self::MATERIAL_PROPERTY.0 != 0
    }
}

impl ChangeFlags for RendererChanges {
    const NONE: Self = RendererChanges::NONE;
    const ALL: Self = RendererChanges(0x1 | 0x2 | 0x4);

    fn bits(self) -> u8 {
        self.0
    }

    fn from_bits_retain(bits: u8) -> Self {
        RendererChanges(bits)
    }
}

impl BitOr for RendererChanges {
    type Output = RendererChanges;

    fn bitor(self, rhs: Self) -> Self {
        RendererChanges(self.0 | rhs.0)
    }
}

impl BitOrAssign for RendererChanges {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
