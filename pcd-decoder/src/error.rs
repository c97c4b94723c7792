use std::{collections::TryReserveError, io};

use pcd_core::pointcloud::schema::FieldType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    LasZip(#[from] laz::LasZipError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("point {index} of {total} could not be decoded: {source}")]
    Point {
        index: usize,
        total: usize,
        #[source]
        source: Box<DecodeError>,
    },

    #[error("stream truncated at byte {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },

    #[error("field ({field_type:?}, {size} bytes) registered after decoding started")]
    FieldsLocked { field_type: FieldType, size: usize },

    #[error("{field_type:?} field of {size} bytes is not supported by the {codec} codec")]
    UnsupportedField {
        codec: &'static str,
        field_type: FieldType,
        size: usize,
    },

    #[error("record buffer is {actual} bytes but registered fields make {expected}")]
    RecordSize { expected: usize, actual: usize },

    #[error("schema has no bytes per point")]
    EmptyRecord,

    #[error("{num_points} points of {point_size} bytes do not fit in memory")]
    TooManyPoints { num_points: usize, point_size: usize },

    #[error("could not reserve the decode output: {0}")]
    Reserve(#[from] TryReserveError),
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error(transparent)]
    LasZip(#[from] laz::LasZipError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("field '{name}' of {size} bytes cannot be stored as LAZ extra bytes")]
    UnsupportedField { name: String, size: usize },

    #[error("{len} bytes are not a whole number of {point_size} byte records")]
    PartialRecord { len: usize, point_size: usize },
}
