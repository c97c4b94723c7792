use pcd_core::pointcloud::{axis::swap_axes, buffer::UnpackedPoints};

use super::Transform;
use crate::error::PipelineError;

/// Moves points from the source Z-up frame to the viewer's Y-up frame.
pub struct AxisTransform {
    world_bounds_x: [f64; 2],
    normalize: bool,
}

impl AxisTransform {
    pub fn new(world_bounds_x: [f64; 2], normalize: bool) -> Self {
        Self {
            world_bounds_x,
            normalize,
        }
    }

    pub fn normalized() -> Self {
        Self::new([0.0, 0.0], true)
    }
}

impl Transform for AxisTransform {
    fn transform(&self, points: &mut UnpackedPoints) -> Result<(), PipelineError> {
        swap_axes(points, self.world_bounds_x, self.normalize)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcd_core::SchemaError;

    #[test]
    fn test_mirror_in_world_bounds() {
        let transform = AxisTransform::new([-50.0, 50.0], false);
        let mut points = UnpackedPoints::new(vec![10.0, 1.0, 2.0], 3);
        transform.transform(&mut points).unwrap();
        assert_eq!(points.as_slice(), &[-10.0, 2.0, 1.0]);
    }

    #[test]
    fn test_too_few_columns() {
        let mut points = UnpackedPoints::new(vec![10.0, 1.0], 2);
        let err = AxisTransform::normalized()
            .transform(&mut points)
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Schema(SchemaError::TooFewColumns { count: 2 })
        ));
    }
}
