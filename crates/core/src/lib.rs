#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod progress;
pub mod rounding;
pub mod time;

pub use error::Error;
pub use time::Clock;
