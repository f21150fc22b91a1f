// Keep types reachable as `crate::tcode::*`
pub mod code;
pub use code::*;

pub mod builder;
pub use builder::build;
