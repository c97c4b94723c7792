use pcd_core::pointcloud::schema::FieldType;

use crate::{
    codec::{Decompressor, PointDecoder},
    error::DecodeError,
};

/// Identity codec: the stream already is the packed little-endian records.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDecompressor;

impl Decompressor for RawDecompressor {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn open<'a>(&'a self, input: &'a [u8]) -> Result<Box<dyn PointDecoder + 'a>, DecodeError> {
        Ok(Box::new(RawPointDecoder {
            input,
            offset: 0,
            record_size: 0,
            started: false,
        }))
    }
}

struct RawPointDecoder<'a> {
    input: &'a [u8],
    offset: usize,
    record_size: usize,
    started: bool,
}

impl PointDecoder for RawPointDecoder<'_> {
    fn configure_field(&mut self, field_type: FieldType, size: usize) -> Result<(), DecodeError> {
        if self.started {
            return Err(DecodeError::FieldsLocked { field_type, size });
        }
        self.record_size += size;
        Ok(())
    }

    fn decode(&mut self, out: &mut [u8]) -> Result<(), DecodeError> {
        if out.len() != self.record_size {
            return Err(DecodeError::RecordSize {
                expected: self.record_size,
                actual: out.len(),
            });
        }
        self.started = true;

        let end = self.offset + self.record_size;
        let record = self
            .input
            .get(self.offset..end)
            .ok_or_else(|| DecodeError::Truncated {
                offset: self.offset,
                needed: end - self.input.len(),
            })?;
        out.copy_from_slice(record);
        self.offset = end;
        Ok(())
    }
}
