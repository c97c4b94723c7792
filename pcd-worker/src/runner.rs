use std::{sync::Arc, time::Instant};

use pcd_core::{
    pointcloud::{
        schema::{point_size, SchemaPlan},
        stats::{collect_stats, StatSpec},
        unpack::unpack,
    },
    SchemaError,
};
use pcd_decoder::{DecodeMetrics, DecoderAdapter, Decompressor, StagingHeap};

use crate::{
    builder::PipelineConfig,
    error::PipelineError,
    request::{DecodeRequest, DecodeResponse},
    transform::{axis::AxisTransform, CompositeTransform, Transform},
};

pub trait Executor {
    fn execute(&self, request: DecodeRequest) -> Result<DecodeResponse, PipelineError>;
}

/// Decode, unpack, normalize and bin one request at a time.
pub struct DecodePipeline {
    pub(crate) config: PipelineConfig,
    pub(crate) metrics: Arc<DecodeMetrics>,
    pub(crate) heap: StagingHeap,
    pub(crate) decompressor: Option<Box<dyn Decompressor + Send>>,
}

impl DecodePipeline {
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<DecodeMetrics> {
        &self.metrics
    }

    pub fn staging(&self) -> &StagingHeap {
        &self.heap
    }

    fn transforms(request: &DecodeRequest) -> CompositeTransform {
        CompositeTransform::new(vec![Box::new(AxisTransform::new(
            request.world_bounds_x,
            request.normalize,
        ))])
    }

    fn run(&self, request: DecodeRequest) -> Result<DecodeResponse, PipelineError> {
        let start = Instant::now();

        let declared = request
            .point_size
            .unwrap_or_else(|| point_size(&request.schema));
        let plan = SchemaPlan::build(&request.schema, declared)?;
        if request.points_count > 0 {
            check_coordinate_columns(&plan)?;
        }

        let codec: &dyn Decompressor = match &self.decompressor {
            Some(decompressor) => decompressor.as_ref(),
            None => request.codec.decompressor(),
        };
        let adapter = DecoderAdapter::new(codec, &self.heap, &self.metrics);
        let raw = adapter.decode(&request.buffer, &request.schema, request.points_count)?;
        let decoded_in = start.elapsed();

        let mut points = unpack(raw, &plan);
        Self::transforms(&request).transform(&mut points)?;

        let specs = StatSpec::defaults(&plan, &self.config.stats);
        let stats = collect_stats(&points, &specs);

        log::debug!(
            "decoded {} points x {} fields (decode {:?}, total {:?}), stats: {:?}",
            points.num_points(),
            plan.field_count(),
            decoded_in,
            start.elapsed(),
            stats.keys().collect::<Vec<_>>()
        );

        Ok(DecodeResponse {
            field_count: plan.field_count(),
            result: points.into_vec(),
            stats,
        })
    }
}

impl Executor for DecodePipeline {
    fn execute(&self, request: DecodeRequest) -> Result<DecodeResponse, PipelineError> {
        let result = self.run(request);
        if let Err(e) = &result {
            self.metrics.record_failure();
            log::warn!("decode request failed: {e}");
        }
        result
    }
}

// Columns 0..3 are always treated as X, Y, Z. A schema that names them otherwise is still
// processed, but the caller is probably getting mislabelled axes.
fn check_coordinate_columns(plan: &SchemaPlan) -> Result<(), SchemaError> {
    if plan.field_count() < 3 {
        return Err(SchemaError::TooFewColumns {
            count: plan.field_count(),
        });
    }
    let names = &plan.names()[..3];
    let expected = ["x", "y", "z"];
    if !names
        .iter()
        .zip(expected)
        .all(|(name, axis)| name.eq_ignore_ascii_case(axis))
    {
        log::warn!("columns 0..3 are {names:?}, normalizing them as X, Y, Z");
    }
    Ok(())
}
