pub mod adapter;
pub mod codec;
mod error;
pub mod laszip;
pub mod metrics;
pub mod raw;
pub mod staging;

pub use adapter::DecoderAdapter;
pub use codec::{Codec, Decompressor, PointDecoder};
pub use error::{DecodeError, EncodeError};
pub use metrics::{DecodeMetrics, MetricsSnapshot};
pub use staging::{StagingBuffer, StagingHeap};
