pub mod builder;
pub mod error;
pub mod request;
pub mod runner;
pub mod transform;
pub mod worker;

pub use builder::{PipelineBuilder, PipelineConfig};
pub use error::PipelineError;
pub use request::{DecodeRequest, DecodeResponse};
pub use runner::{DecodePipeline, Executor};
pub use worker::{Ticket, Worker};
