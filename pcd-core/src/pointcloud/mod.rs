pub mod axis;
pub mod buffer;
pub mod schema;
pub mod stats;
pub mod unpack;
