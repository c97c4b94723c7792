use pcd_core::pointcloud::buffer::UnpackedPoints;

use crate::error::PipelineError;

pub mod axis;

/// An in-place rewrite of unpacked points.
pub trait Transform {
    fn transform(&self, points: &mut UnpackedPoints) -> Result<(), PipelineError>;
}

pub struct CompositeTransform {
    transforms: Vec<Box<dyn Transform>>,
}

impl CompositeTransform {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }
}

impl Transform for CompositeTransform {
    fn transform(&self, points: &mut UnpackedPoints) -> Result<(), PipelineError> {
        for transform in &self.transforms {
            transform.transform(points)?;
        }
        Ok(())
    }
}
