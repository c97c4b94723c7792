use thiserror::Error;

use crate::pointcloud::schema::FieldType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unsupported encoding for field #{index} '{name}': {field_type:?} with {size} bytes")]
    UnsupportedField {
        index: usize,
        name: String,
        field_type: FieldType,
        size: usize,
    },

    #[error("point size mismatch: schema fields sum to {actual} bytes, declared {declared}")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("schema has no fields")]
    EmptySchema,

    #[error("axis normalization needs X, Y and Z columns, schema has {count}")]
    TooFewColumns { count: usize },
}
