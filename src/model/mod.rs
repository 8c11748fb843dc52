pub mod blessing;
pub mod catalog;
pub mod category;
pub mod config;

pub use blessing::*;
pub use catalog::*;
pub use category::*;
pub use config::*;
