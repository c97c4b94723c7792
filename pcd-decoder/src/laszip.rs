use std::io::Cursor;

use laz::{LasZipCompressor, LasZipDecompressor, LazItemRecordBuilder, LazItemType, LazVlr};
use pcd_core::pointcloud::schema::{point_size, FieldSpec, FieldType};

use crate::{
    codec::{Decompressor, PointDecoder},
    error::{DecodeError, EncodeError},
};

// Every field goes through the LASzip "extra bytes" model. The model only cares about the
// byte width, so floating and unsigned fields of the same size are stored alike.
fn field_item(size: usize) -> Option<LazItemType> {
    match size {
        1 | 2 | 4 => Some(LazItemType::Byte(size as u16)),
        _ => None,
    }
}

/// LASzip point stream decompression backed by the `laz` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LazDecompressor;

impl Decompressor for LazDecompressor {
    fn name(&self) -> &'static str {
        "laz"
    }

    fn open<'a>(&'a self, input: &'a [u8]) -> Result<Box<dyn PointDecoder + 'a>, DecodeError> {
        Ok(Box::new(LazPointDecoder {
            input,
            items: LazItemRecordBuilder::new(),
            record_size: 0,
            stream: None,
        }))
    }
}

struct LazPointDecoder<'a> {
    input: &'a [u8],
    items: LazItemRecordBuilder,
    record_size: usize,
    // built on the first decode, once every field is known
    stream: Option<LasZipDecompressor<'a, Cursor<&'a [u8]>>>,
}

impl<'a> LazPointDecoder<'a> {
    fn open_stream(
        input: &'a [u8],
        items: &LazItemRecordBuilder,
    ) -> Result<LasZipDecompressor<'a, Cursor<&'a [u8]>>, DecodeError> {
        let vlr = LazVlr::from_laz_items(items.build());
        let stream = LasZipDecompressor::new(Cursor::new(input), vlr)?;
        log::trace!("laz: opened stream of {} bytes", input.len());
        Ok(stream)
    }
}

impl PointDecoder for LazPointDecoder<'_> {
    fn configure_field(&mut self, field_type: FieldType, size: usize) -> Result<(), DecodeError> {
        if self.stream.is_some() {
            return Err(DecodeError::FieldsLocked { field_type, size });
        }
        let item = field_item(size).ok_or(DecodeError::UnsupportedField {
            codec: "laz",
            field_type,
            size,
        })?;
        self.items.add_item(item);
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

        let stream = match &mut self.stream {
            Some(stream) => stream,
            slot => slot.insert(Self::open_stream(self.input, &self.items)?),
        };
        stream.decompress_one(out)?;
        Ok(())
    }
}

/// Compresses packed records with the same per-field registration [`LazDecompressor`]
/// expects, so the output can be fed straight back through a decode request.
pub fn compress_records(schema: &[FieldSpec], records: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let point_size = point_size(schema);
    if point_size == 0 || records.len() % point_size != 0 {
        return Err(EncodeError::PartialRecord {
            len: records.len(),
            point_size,
        });
    }

    let mut items = LazItemRecordBuilder::new();
    for field in schema {
        let item = field_item(field.size).ok_or_else(|| EncodeError::UnsupportedField {
            name: field.name.clone(),
            size: field.size,
        })?;
        items.add_item(item);
    }
    let vlr = LazVlr::from_laz_items(items.build());

    let mut compressor = LasZipCompressor::new(Cursor::new(Vec::new()), vlr)?;
    for record in records.chunks_exact(point_size) {
        compressor.compress_one(record)?;
    }
    compressor.done()?;

    let compressed = compressor.into_inner().into_inner();
    log::debug!(
        "laz: compressed {} records, {} -> {} bytes",
        records.len() / point_size,
        records.len(),
        compressed.len()
    );
    Ok(compressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<FieldSpec> {
        vec![
            FieldSpec::floating("X", 4),
            FieldSpec::floating("Y", 4),
            FieldSpec::floating("Z", 4),
            FieldSpec::unsigned("Intensity", 2),
            FieldSpec::unsigned("Classification", 1),
        ]
    }

    fn records(count: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        for i in 0..count {
            let t = i as f32;
            bytes.extend_from_slice(&(t * 0.5).to_le_bytes());
            bytes.extend_from_slice(&(100.0 - t).to_le_bytes());
            bytes.extend_from_slice(&(t * t * 0.01).to_le_bytes());
            bytes.extend_from_slice(&((i * 37 % 65536) as u16).to_le_bytes());
            bytes.push((i % 7) as u8);
        }
        bytes
    }

    #[test]
    fn test_compressed_stream_decodes_back() {
        let schema = schema();
        let original = records(500);
        let compressed = compress_records(&schema, &original).unwrap();

        let codec = LazDecompressor;
        let mut decoder = codec.open(&compressed).unwrap();
        for field in &schema {
            decoder
                .configure_field(field.field_type, field.size)
                .unwrap();
        }

        let mut decoded = Vec::new();
        let mut record = [0u8; 15];
        for _ in 0..500 {
            decoder.decode(&mut record).unwrap();
            decoded.extend_from_slice(&record);
        }
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_fields_locked_after_first_point() {
        let schema = schema();
        let compressed = compress_records(&schema, &records(2)).unwrap();

        let codec = LazDecompressor;
        let mut decoder = codec.open(&compressed).unwrap();
        for field in &schema {
            decoder
                .configure_field(field.field_type, field.size)
                .unwrap();
        }
        decoder.decode(&mut [0u8; 15]).unwrap();
        assert!(matches!(
            decoder.configure_field(FieldType::Unsigned, 1),
            Err(DecodeError::FieldsLocked { .. })
        ));
    }

    #[test]
    fn test_unsupported_width() {
        let codec = LazDecompressor;
        let mut decoder = codec.open(&[]).unwrap();
        assert!(matches!(
            decoder.configure_field(FieldType::Floating, 8),
            Err(DecodeError::UnsupportedField { codec: "laz", .. })
        ));
    }

    #[test]
    fn test_garbage_input_fails() {
        let codec = LazDecompressor;
        let mut decoder = codec.open(&[0xff, 0x01]).unwrap();
        decoder.configure_field(FieldType::Floating, 4).unwrap();
        assert!(decoder.decode(&mut [0u8; 4]).is_err());
    }

    #[test]
    fn test_unsupported_width_rejected_by_encoder() {
        let schema = vec![FieldSpec::floating("GpsTime", 8)];
        assert!(matches!(
            compress_records(&schema, &[0u8; 8]),
            Err(EncodeError::UnsupportedField { size: 8, .. })
        ));
    }

    #[test]
    fn test_partial_record_rejected() {
        assert!(matches!(
            compress_records(&schema(), &[0u8; 16]),
            Err(EncodeError::PartialRecord {
                len: 16,
                point_size: 15
            })
        ));
    }
}
