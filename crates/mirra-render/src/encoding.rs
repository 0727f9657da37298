//! Renderer payload encoding
//!
//! Material list:
//! - Count (u16)
//! - Per material: name (str), shader (str), property count (u16),
//!   then per property: name (str), tagged value
//!
//! Property list (MaterialProperty message):
//! - Count (u16)
//! - Per change: slot (u16), property index (u16), property name (str),
//!   tagged value
//!
//! The property index counts only properties written to the material list,
//! so it addresses the observer's copy even when names repeat.
//!
//! Strings are `[len:u16][utf8]`; all integers little-endian.

use mirra_core::{
    ChangeFlags, MaterialDescriptor, MaterialProperty, MirraError, MirraResult, PropertyInfo,
    PropertyValue, ShortId,
};
use mirra_wire::{MessageHeader, MessageReader, MessageWriter};

use crate::RendererChanges;

/// One value-only property update
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange {
    /// Material slot index
    pub slot: u16,
    /// Position among the synchronized properties of the slot
    pub index: u16,
    pub name: String,
    pub value: PropertyValue,
}

/// Write the material list, keeping only properties accepted by `filter`
pub fn write_materials<F>(
    writer: &mut MessageWriter,
    materials: &[MaterialDescriptor],
    filter: F,
) -> MirraResult<()>
where
    F: Fn(&PropertyInfo<'_>) -> bool,
{
    writer.write_len(materials.len())?;
    for material in materials {
        writer.write_str(&material.name)?;
        writer.write_str(&material.shader)?;

        let count = material
            .properties
            .iter()
            .filter(|p| filter(&p.info()))
            .count();
        writer.write_len(count)?;
        for property in material.properties.iter().filter(|p| filter(&p.info())) {
            writer.write_str(&property.name)?;
            writer.write_value(&property.value);
        }
    }
    Ok(())
}

pub fn read_materials(reader: &mut MessageReader<'_>) -> MirraResult<Vec<MaterialDescriptor>> {
    let count = reader.read_len()?;
    let mut materials = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        let name = reader.read_str()?;
        let shader = reader.read_str()?;
        let property_count = reader.read_len()?;
        let mut properties = Vec::with_capacity(property_count.min(reader.remaining()));
        for _ in 0..property_count {
            let name = reader.read_str()?;
            let value = reader.read_value()?;
            properties.push(MaterialProperty { name, value });
        }
        materials.push(MaterialDescriptor {
            name,
            shader,
            properties,
        });
    }
    Ok(materials)
}

/// Encoded size of a material list, used to check exact message lengths
pub fn materials_encoded_len<F>(materials: &[MaterialDescriptor], filter: F) -> usize
where
    F: Fn(&PropertyInfo<'_>) -> bool,
{
    let str_len = |s: &str| 2 + s.len();
    2 + materials
        .iter()
        .map(|m| {
            str_len(&m.name)
                + str_len(&m.shader)
                + 2
                + m.properties
                    .iter()
                    .filter(|p| filter(&p.info()))
                    .map(|p| str_len(&p.name) + 1 + p.value.kind().value_size())
                    .sum::<usize>()
        })
        .sum::<usize>()
}

pub fn write_property_changes(
    writer: &mut MessageWriter,
    changes: &[PropertyChange],
) -> MirraResult<()> {
    writer.write_len(changes.len())?;
    for change in changes {
        writer.write_u16(change.slot);
        writer.write_u16(change.index);
        writer.write_str(&change.name)?;
        writer.write_value(&change.value);
    }
    Ok(())
}

pub fn read_property_changes(reader: &mut MessageReader<'_>) -> MirraResult<Vec<PropertyChange>> {
    let count = reader.read_len()?;
    let mut changes = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        let slot = reader.read_u16()?;
        let index = reader.read_u16()?;
        let name = reader.read_str()?;
        let value = reader.read_value()?;
        changes.push(PropertyChange {
            slot,
            index,
            name,
            value,
        });
    }
    Ok(changes)
}

/// Observer-side view of one renderer
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RendererState {
    pub enabled: bool,
    pub materials: Vec<MaterialDescriptor>,
}

/// Fully decoded renderer message, not yet applied
#[derive(Clone, Debug, PartialEq)]
pub struct RendererUpdate {
    pub changes: RendererChanges,
    pub enabled: Option<bool>,
    pub materials: Option<Vec<MaterialDescriptor>>,
    pub properties: Option<Vec<PropertyChange>>,
}

impl RendererUpdate {
    /// Decode a complete renderer message (header included).
    ///
    /// Fields are read in ascending bit order, gated by the flags byte. Undefined
    /// bits, truncation and trailing bytes are errors.
    pub fn decode(expected: ShortId, message: &[u8]) -> MirraResult<Self> {
        let (header, payload) = MessageHeader::split(message)?;
        if header.id != expected {
            return Err(MirraError::InvalidWireFormat(format!(
                "Expected {} message, got {}",
                expected, header.id
            )));
        }
        let changes = RendererChanges::from_bits(header.flags).ok_or(
            MirraError::UnsupportedChangeFlags {
                id: header.id,
                flags: header.flags,
            },
        )?;

        let mut reader = MessageReader::new(payload);
        let enabled = if changes.has_enabled() {
            Some(reader.read_bool()?)
        } else {
            None
        };
        let materials = if changes.has_materials() {
            Some(read_materials(&mut reader)?)
        } else {
            None
        };
        let properties = if changes.has_material_property() {
            Some(read_property_changes(&mut reader)?)
        } else {
            None
        };
        reader.expect_end()?;

        Ok(RendererUpdate {
            changes,
            enabled,
            materials,
            properties,
        })
    }

    /// Apply to `state`. Property updates are validated against the resulting
    /// material list before anything is written.
    pub fn apply_to(self, state: &mut RendererState) -> MirraResult<()> {
        let materials = self.materials.as_deref().unwrap_or(&state.materials);
        if let Some(properties) = &self.properties {
            for change in properties {
                let target = materials
                    .get(change.slot as usize)
                    .and_then(|m| m.properties.get(change.index as usize))
                    .filter(|p| p.name == change.name)
                    .ok_or_else(|| {
                        MirraError::InvalidWireFormat(format!(
                            "No property {:?} at index {} in material slot {}",
                            change.name, change.index, change.slot
                        ))
                    })?;
                if target.value.kind() != change.value.kind() {
                    return Err(MirraError::InvalidWireFormat(format!(
                        "Property {:?} changed kind",
                        change.name
                    )));
                }
            }
        }

        if let Some(enabled) = self.enabled {
            state.enabled = enabled;
        }
        if let Some(materials) = self.materials {
            state.materials = materials;
        }
        if let Some(properties) = self.properties {
            for change in properties {
                if let Some(property) = state
                    .materials
                    .get_mut(change.slot as usize)
                    .and_then(|m| m.properties.get_mut(change.index as usize))
                {
                    property.value = change.value;
                }
            }
        }
        Ok(())
    }
}
