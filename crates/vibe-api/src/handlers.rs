//! Request handlers.

pub mod cameras;
pub mod health;
pub mod tracker;

pub use cameras::*;
pub use health::*;
pub use tracker::*;
