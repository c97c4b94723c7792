use crate::pointcloud::{
    buffer::{RawPoints, UnpackedPoints},
    schema::SchemaPlan,
};

/// Widens every field of every record to an `f32`, keeping schema order as column order.
///
/// The plan must come from the same schema the records were decoded with.
pub fn unpack(raw: RawPoints, plan: &SchemaPlan) -> UnpackedPoints {
    debug_assert_eq!(raw.point_size(), plan.point_size());

    let field_count = plan.field_count();
    let num_points = raw.num_points();

    // Records are already little-endian f32 columns, only the view changes.
    if plan.is_all_float() && cfg!(target_endian = "little") {
        log::debug!("unpack: all-float schema, reusing {num_points} decoded records");
        let mut values = raw.into_words();
        values.truncate(num_points * field_count);
        return UnpackedPoints::new(values, field_count);
    }

    let mut values = Vec::with_capacity(num_points * field_count);
    let bytes = raw.as_bytes();
    let mut cursor = 0;
    for _ in 0..num_points {
        for decoder in plan.decoders() {
            values.push(decoder.read(&bytes[cursor..]));
            cursor += decoder.byte_width();
        }
    }

    UnpackedPoints::new(values, field_count)
}
