pub mod state;
pub mod refresher;

pub use state::*;
pub use refresher::*;
