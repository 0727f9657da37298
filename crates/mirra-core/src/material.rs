//! Material model mirrored to observers
//!
//! A renderable exposes an ordered list of material slots. Each material has
//! a shader and an ordered list of named, typed properties. The shape of the
//! list (slots, shaders, property names and kinds) is "structure"; the
//! property values are what changes from frame to frame.

/// Kind of a material property value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PropertyKind {
    Float = 0x00,
    Int = 0x01,
    Vector = 0x02,
    Color = 0x03,
    Texture = 0x04,
}

impl PropertyKind {
    /// Parse from wire tag
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(PropertyKind::Float),
            0x01 => Some(PropertyKind::Int),
            0x02 => Some(PropertyKind::Vector),
            0x03 => Some(PropertyKind::Color),
            0x04 => Some(PropertyKind::Texture),
            _ => None,
        }
    }

    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Encoded width of a value of this kind (excluding the tag)
    pub fn value_size(self) -> usize {
        match self {
            PropertyKind::Float | PropertyKind::Int => 4,
            PropertyKind::Vector | PropertyKind::Color => 16,
            PropertyKind::Texture => 8,
        }
    }
}

/// Material property value
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PropertyValue {
    Float(f32),
    Int(i32),
    Vector([f32; 4]),
    Color([f32; 4]),
    /// Texture asset id, 0 for none
    Texture(u64),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Vector(_) => PropertyKind::Vector,
            PropertyValue::Color(_) => PropertyKind::Color,
            PropertyValue::Texture(_) => PropertyKind::Texture,
        }
    }

    /// Compare values, treating float components within `tolerance` as equal
    pub fn approx_eq(&self, other: &PropertyValue, tolerance: f32) -> bool {
        // Identical bits (NaN included) always compare equal
        let close = |a: f32, b: f32| {
            a.to_bits() == b.to_bits() || a == b || (a - b).abs() <= tolerance
        };
        match (self, other) {
            (PropertyValue::Float(a), PropertyValue::Float(b)) => close(*a, *b),
            (PropertyValue::Int(a), PropertyValue::Int(b)) => a == b,
            (PropertyValue::Vector(a), PropertyValue::Vector(b))
            | (PropertyValue::Color(a), PropertyValue::Color(b)) => {
                a.iter().zip(b.iter()).all(|(x, y)| close(*x, *y))
            }
            (PropertyValue::Texture(a), PropertyValue::Texture(b)) => a == b,
            _ => false,
        }
    }
}

/// Name and kind of a property, used by synchronization filters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyInfo<'a> {
    pub name: &'a str,
    pub kind: PropertyKind,
}

/// Named material property
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialProperty {
    pub name: String,
    pub value: PropertyValue,
}

impl MaterialProperty {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        MaterialProperty {
            name: name.into(),
            value,
        }
    }

    pub fn info(&self) -> PropertyInfo<'_> {
        PropertyInfo {
            name: &self.name,
            kind: self.value.kind(),
        }
    }
}

/// One material slot of a renderable
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MaterialDescriptor {
    pub name: String,
    pub shader: String,
    pub properties: Vec<MaterialProperty>,
}

impl MaterialDescriptor {
    pub fn new(name: impl Into<String>, shader: impl Into<String>) -> Self {
        MaterialDescriptor {
            name: name.into(),
            shader: shader.into(),
            properties: Vec::new(),
        }
    }

    /// Builder-style property append
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.push(MaterialProperty::new(name, value));
        self
    }

    pub fn property(&self, name: &str) -> Option<&MaterialProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut MaterialProperty> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Same slot identity, shader and property layout; values may differ
    pub fn same_structure(&self, other: &MaterialDescriptor) -> bool {
        self.name == other.name
            && self.shader == other.shader
            && self.properties.len() == other.properties.len()
            && self
                .properties
                .iter()
                .zip(other.properties.iter())
                .all(|(a, b)| a.name == b.name && a.value.kind() == b.value.kind())
    }
}
