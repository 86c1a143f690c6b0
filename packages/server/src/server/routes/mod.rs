// HTTP routes
pub mod health;
pub mod ws;

pub use health::*;
pub use ws::*;
