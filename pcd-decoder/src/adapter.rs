use pcd_core::pointcloud::{
    buffer::RawPoints,
    schema::{point_size, FieldSpec},
};

use crate::{
    codec::Decompressor, error::DecodeError, metrics::DecodeMetrics, staging::StagingHeap,
};

// Records reserved up front. Anything past this grows as points actually decode, so an
// inflated point count cannot allocate more than the stream delivers.
const PREALLOC_POINTS: usize = 1 << 16;

/// Drives a [`Decompressor`] through one stream: stage the input, register fields in
/// schema order, pull `num_points` records.
pub struct DecoderAdapter<'a> {
    codec: &'a dyn Decompressor,
    heap: &'a StagingHeap,
    metrics: &'a DecodeMetrics,
}

impl<'a> DecoderAdapter<'a> {
    pub fn new(
        codec: &'a dyn Decompressor,
        heap: &'a StagingHeap,
        metrics: &'a DecodeMetrics,
    ) -> Self {
        Self {
            codec,
            heap,
            metrics,
        }
    }

    pub fn decode(
        &self,
        compressed: &[u8],
        schema: &[FieldSpec],
        num_points: usize,
    ) -> Result<RawPoints, DecodeError> {
        let point_size = point_size(schema);
        if point_size == 0 {
            return Err(DecodeError::EmptyRecord);
        }
        if num_points == 0 {
            return Ok(RawPoints::new(point_size));
        }
        match num_points.checked_mul(point_size) {
            Some(total) if total <= isize::MAX as usize => {}
            _ => {
                return Err(DecodeError::TooManyPoints {
                    num_points,
                    point_size,
                })
            }
        }

        // Drop order matters: the decoder borrows `input`, `record` goes first.
        let input = self.heap.stage(compressed);
        let mut decoder = self.codec.open(&input)?;
        for field in schema {
            decoder.configure_field(field.field_type, field.size)?;
        }

        let mut record = self.heap.alloc(point_size);
        let mut raw = RawPoints::new(point_size);
        raw.try_reserve(num_points.min(PREALLOC_POINTS))?;
        for index in 0..num_points {
            decoder
                .decode(&mut record)
                .map_err(|source| DecodeError::Point {
                    index,
                    total: num_points,
                    source: Box::new(source),
                })?;
            raw.push_record(&record);
        }

        self.metrics
            .record_decode(num_points, point_size, compressed.len());
        log::debug!(
            "{}: decoded {num_points} points of {point_size} bytes from {} bytes",
            self.codec.name(),
            compressed.len()
        );
        Ok(raw)
    }
}
