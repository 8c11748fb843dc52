//! Blessing generator: pick a curated blessing for a wish, derive one
//! blessing per calendar day, and keep a local history and favorites.

pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod session;
