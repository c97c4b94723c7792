use std::collections::TryReserveError;

// Raw records are stored in 4-byte aligned memory so an all-float schema can be
// handed to the unpacked stage as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPoints {
    words: Vec<f32>,
    byte_len: usize,
    point_size: usize,
}

impl RawPoints {
    /// An empty buffer that grows one record at a time.
    ///
    /// # Panics
    /// If `point_size` is zero.
    pub fn new(point_size: usize) -> Self {
        assert!(point_size > 0, "point size must be positive");
        Self {
            words: Vec::new(),
            byte_len: 0,
            point_size,
        }
    }

    /// Copies already decoded little-endian records.
    ///
    /// # Panics
    /// If `point_size` is zero or `bytes` is not a whole number of records.
    pub fn from_bytes(bytes: &[u8], point_size: usize) -> Self {
        assert!(point_size > 0, "point size must be positive");
        assert_eq!(
            bytes.len() % point_size,
            0,
            "buffer is not a whole number of records"
        );
        let mut raw = Self::new(point_size);
        raw.words = vec![0.0; bytes.len().div_ceil(4)];
        raw.byte_len = bytes.len();
        raw.as_bytes_mut().copy_from_slice(bytes);
        raw
    }

    /// Reserves room for `additional` more records without aborting on failure.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let bytes = self
            .byte_len
            .saturating_add(additional.saturating_mul(self.point_size));
        let words = bytes.div_ceil(4).saturating_sub(self.words.len());
        self.words.try_reserve(words)
    }

    /// # Panics
    /// If `record` is not exactly one record long.
    pub fn push_record(&mut self, record: &[u8]) {
        assert_eq!(record.len(), self.point_size, "record size mismatch");
        let start = self.byte_len;
        self.byte_len += self.point_size;
        self.words.resize(self.byte_len.div_ceil(4), 0.0);
        self.as_bytes_mut()[start..].copy_from_slice(record);
    }

    pub fn num_points(&self) -> usize {
        self.byte_len / self.point_size
    }

    pub fn point_size(&self) -> usize {
        self.point_size
    }

    pub fn is_empty(&self) -> bool {
        self.byte_len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<f32, u8>(&self.words)[..self.byte_len]
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<f32, u8>(&mut self.words)[..self.byte_len]
    }

    pub fn record(&self, index: usize) -> &[u8] {
        let start = index * self.point_size;
        &self.as_bytes()[start..start + self.point_size]
    }

    pub fn record_mut(&mut self, index: usize) -> &mut [u8] {
        let point_size = self.point_size;
        let start = index * point_size;
        &mut self.as_bytes_mut()[start..start + point_size]
    }

    /// The backing storage as native floats. Only meaningful when every field is an f32
    /// and the record size is a multiple of four.
    pub(crate) fn into_words(self) -> Vec<f32> {
        self.words
    }
}

/// Dense point-major float columns, one value per field per point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnpackedPoints {
    values: Vec<f32>,
    field_count: usize,
}

impl UnpackedPoints {
    /// # Panics
    /// If `values.len()` is not a multiple of `field_count`.
    pub fn new(values: Vec<f32>, field_count: usize) -> Self {
        assert!(
            field_count > 0 && values.len() % field_count == 0,
            "{} values do not split into rows of {field_count}",
            values.len()
        );
        Self {
            values,
            field_count,
        }
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    pub fn num_points(&self) -> usize {
        if self.field_count == 0 {
            0
        } else {
            self.values.len() / self.field_count
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn points(&self) -> std::slice::ChunksExact<'_, f32> {
        self.values.chunks_exact(self.field_count.max(1))
    }

    pub fn points_mut(&mut self) -> std::slice::ChunksExactMut<'_, f32> {
        self.values.chunks_exact_mut(self.field_count.max(1))
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_points_records() {
        let bytes = [1u8, 2, 3, 4, 5, 6];
        let mut raw = RawPoints::from_bytes(&bytes, 3);
        assert_eq!(raw.num_points(), 2);
        assert_eq!(raw.record(1), &[4, 5, 6]);

        raw.record_mut(0).copy_from_slice(&[9, 9, 9]);
        assert_eq!(raw.as_bytes(), &[9, 9, 9, 4, 5, 6]);
    }

    #[test]
    fn test_raw_points_push() {
        let mut raw = RawPoints::new(3);
        raw.try_reserve(2).unwrap();
        raw.push_record(&[1, 2, 3]);
        raw.push_record(&[4, 5, 6]);
        raw.push_record(&[7, 8, 9]);
        assert_eq!(raw.num_points(), 3);
        assert_eq!(raw.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(raw.record(2), &[7, 8, 9]);
    }

    #[test]
    fn test_raw_points_reserve_too_large() {
        let mut raw = RawPoints::new(12);
        assert!(raw.try_reserve(usize::MAX / 8).is_err());
        assert!(raw.is_empty());
    }

    #[test]
    fn test_raw_points_empty() {
        let raw = RawPoints::new(7);
        assert!(raw.is_empty());
        assert_eq!(raw.num_points(), 0);
        assert!(raw.as_bytes().is_empty());
    }

    #[test]
    #[should_panic]
    fn test_raw_points_partial_record() {
        RawPoints::from_bytes(&[0u8; 5], 4);
    }

    #[test]
    fn test_unpacked_points_rows() {
        let points = UnpackedPoints::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        assert_eq!(points.num_points(), 2);
        let rows: Vec<&[f32]> = points.points().collect();
        assert_eq!(rows, vec![&[1.0, 2.0, 3.0][..], &[4.0, 5.0, 6.0][..]]);
    }
}
