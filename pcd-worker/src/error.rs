use pcd_core::SchemaError;
use pcd_decoder::DecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("decode worker is no longer running")]
    WorkerGone,
}
