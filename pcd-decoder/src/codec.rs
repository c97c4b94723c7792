use pcd_core::pointcloud::schema::FieldType;
use serde::{Deserialize, Serialize};

use crate::{error::DecodeError, laszip::LazDecompressor, raw::RawDecompressor};

/// A point decompression library. `open` is handed the whole compressed stream and
/// returns a decoder that borrows it for as long as points are being pulled.
pub trait Decompressor {
    fn name(&self) -> &'static str;

    fn open<'a>(&'a self, input: &'a [u8]) -> Result<Box<dyn PointDecoder + 'a>, DecodeError>;
}

/// One open stream.
///
/// Fields carry no metadata in the stream, so they must be registered in exactly the order
/// the encoder saw them, before the first `decode`.
pub trait PointDecoder {
    fn configure_field(&mut self, field_type: FieldType, size: usize) -> Result<(), DecodeError>;

    /// Writes the next record into `out` and advances the stream.
    fn decode(&mut self, out: &mut [u8]) -> Result<(), DecodeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    #[default]
    Laz,
    Raw,
}

static LAZ: LazDecompressor = LazDecompressor;
static RAW: RawDecompressor = RawDecompressor;

impl Codec {
    pub fn decompressor(self) -> &'static dyn Decompressor {
        match self {
            Codec::Laz => &LAZ,
            Codec::Raw => &RAW,
        }
    }
}
