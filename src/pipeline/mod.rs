// Request pipeline: each stage does one step and hands the context onward

pub mod context;
pub mod error;
pub mod pipeline;
pub mod traits;

pub use context::*;
pub use error::*;
pub use pipeline::*;
pub use traits::*;
