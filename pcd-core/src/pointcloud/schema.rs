use byteorder::{ByteOrder as _, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Floating,
    Unsigned,
}

/// One field of a point record as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub size: usize,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType, size: usize) -> Self {
        Self {
            name: name.into(),
            field_type,
            size,
        }
    }

    pub fn floating(name: impl Into<String>, size: usize) -> Self {
        Self::new(name, FieldType::Floating, size)
    }

    pub fn unsigned(name: impl Into<String>, size: usize) -> Self {
        Self::new(name, FieldType::Unsigned, size)
    }
}

/// Sum of the field sizes, i.e. the byte width of one record.
pub fn point_size(schema: &[FieldSpec]) -> usize {
    schema.iter().map(|field| field.size).sum()
}

/// How a single field is read out of a little-endian record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDecoder {
    Float32,
    UInt8,
    UInt16,
    UInt32,
}

impl FieldDecoder {
    pub fn for_field(field_type: FieldType, size: usize) -> Option<Self> {
        match (field_type, size) {
            (FieldType::Floating, 4) => Some(Self::Float32),
            (FieldType::Unsigned, 1) => Some(Self::UInt8),
            (FieldType::Unsigned, 2) => Some(Self::UInt16),
            (FieldType::Unsigned, 4) => Some(Self::UInt32),
            _ => None,
        }
    }

    pub fn byte_width(self) -> usize {
        match self {
            Self::UInt8 => 1,
            Self::UInt16 => 2,
            Self::Float32 | Self::UInt32 => 4,
        }
    }

    /// `bytes` must hold at least `byte_width()` bytes.
    #[inline]
    pub fn read(self, bytes: &[u8]) -> f32 {
        match self {
            Self::Float32 => LittleEndian::read_f32(bytes),
            Self::UInt8 => bytes[0] as f32,
            Self::UInt16 => LittleEndian::read_u16(bytes) as f32,
            // values above 2^24 lose precision, same as any f32 widening
            Self::UInt32 => LittleEndian::read_u32(bytes) as f32,
        }
    }
}

/// Validated, immutable read plan for one schema. Build it once per schema and reuse it for
/// every point.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaPlan {
    decoders: Vec<FieldDecoder>,
    names: Vec<String>,
    point_size: usize,
}

impl SchemaPlan {
    pub fn build(schema: &[FieldSpec], declared_point_size: usize) -> Result<Self, SchemaError> {
        if schema.is_empty() {
            return Err(SchemaError::EmptySchema);
        }

        let mut decoders = Vec::with_capacity(schema.len());
        for (index, field) in schema.iter().enumerate() {
            let decoder = FieldDecoder::for_field(field.field_type, field.size).ok_or_else(|| {
                SchemaError::UnsupportedField {
                    index,
                    name: field.name.clone(),
                    field_type: field.field_type,
                    size: field.size,
                }
            })?;
            decoders.push(decoder);
        }

        let actual = decoders.iter().map(|d| d.byte_width()).sum();
        if actual != declared_point_size {
            return Err(SchemaError::SizeMismatch {
                declared: declared_point_size,
                actual,
            });
        }

        Ok(Self {
            decoders,
            names: schema.iter().map(|field| field.name.clone()).collect(),
            point_size: actual,
        })
    }

    pub fn decoders(&self) -> &[FieldDecoder] {
        &self.decoders
    }

    pub fn field_count(&self) -> usize {
        self.decoders.len()
    }

    pub fn point_size(&self) -> usize {
        self.point_size
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Column of the first field with exactly this name.
    pub fn column_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn is_all_float(&self) -> bool {
        self.decoders.iter().all(|d| *d == FieldDecoder::Float32)
    }
}
