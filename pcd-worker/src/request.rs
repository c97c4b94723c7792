use pcd_core::pointcloud::{schema::FieldSpec, stats::StatsResult};
use pcd_decoder::Codec;

/// One decompression job.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeRequest {
    pub schema: Vec<FieldSpec>,
    pub buffer: Vec<u8>,
    pub points_count: usize,
    pub world_bounds_x: [f64; 2],
    pub normalize: bool,
    pub codec: Codec,
    /// Record size announced by the producer. Defaults to the sum of the schema fields.
    pub point_size: Option<usize>,
}

impl DecodeRequest {
    pub fn new(schema: Vec<FieldSpec>, buffer: Vec<u8>, points_count: usize) -> Self {
        Self {
            schema,
            buffer,
            points_count,
            world_bounds_x: [0.0, 0.0],
            normalize: true,
            codec: Codec::default(),
            point_size: None,
        }
    }

    /// Negate X when set (the default), otherwise mirror it inside `world_bounds_x`.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_world_bounds_x(mut self, world_bounds_x: [f64; 2]) -> Self {
        self.world_bounds_x = world_bounds_x;
        self
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_point_size(mut self, point_size: usize) -> Self {
        self.point_size = Some(point_size);
        self
    }
}

/// The caller owns `result` outright; nothing on the worker side keeps a reference to it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeResponse {
    pub result: Vec<f32>,
    pub field_count: usize,
    pub stats: StatsResult,
}

impl DecodeResponse {
    pub fn num_points(&self) -> usize {
        if self.field_count == 0 {
            0
        } else {
            self.result.len() / self.field_count
        }
    }
}
