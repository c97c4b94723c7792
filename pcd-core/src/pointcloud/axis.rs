use crate::{error::SchemaError, pointcloud::buffer::UnpackedPoints};

/// Reorients columns 0, 1, 2 (X, Y, Z) in place for the viewer's Y-up frame.
///
/// X is negated when `normalize` is set, otherwise mirrored inside `world_bounds_x`.
/// Source Y and Z trade places. Columns past the third are not touched.
pub fn swap_axes(
    points: &mut UnpackedPoints,
    world_bounds_x: [f64; 2],
    normalize: bool,
) -> Result<(), SchemaError> {
    if points.is_empty() {
        return Ok(());
    }
    if points.field_count() < 3 {
        return Err(SchemaError::TooFewColumns {
            count: points.field_count(),
        });
    }

    let [min_x, max_x] = world_bounds_x;
    for point in points.points_mut() {
        let (x, y, z) = (point[0], point[1], point[2]);
        point[0] = if normalize {
            -x
        } else {
            (max_x - x as f64 + min_x) as f32
        };
        point[1] = z;
        point[2] = y;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_normalized() {
        let mut points = UnpackedPoints::new(vec![1.0, 2.0, 3.0, 4.0, -5.0, 6.0, 7.0, 8.0], 4);
        swap_axes(&mut points, [100.0, 200.0], true).unwrap();
        assert_eq!(points.as_slice(), &[-1.0, 3.0, 2.0, 4.0, 5.0, 7.0, 6.0, 8.0]);
    }

    #[test]
    fn test_swap_mirrored_in_bounds() {
        let mut points = UnpackedPoints::new(vec![110.0, 2.0, 3.0], 3);
        swap_axes(&mut points, [100.0, 200.0], false).unwrap();
        assert_eq!(points.as_slice(), &[190.0, 3.0, 2.0]);
    }

    #[test]
    fn test_swap_empty_is_noop() {
        let mut points = UnpackedPoints::new(Vec::new(), 2);
        swap_axes(&mut points, [0.0, 1.0], true).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_swap_needs_three_columns() {
        let mut points = UnpackedPoints::new(vec![1.0, 2.0], 2);
        assert_eq!(
            swap_axes(&mut points, [0.0, 1.0], true),
            Err(SchemaError::TooFewColumns { count: 2 })
        );
        assert_eq!(points.as_slice(), &[1.0, 2.0]);
    }
}
