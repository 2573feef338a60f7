pub mod prediction;
pub mod candle;

pub use prediction::*;
pub use candle::*;
