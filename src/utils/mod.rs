pub mod constants;
pub mod helpers;
pub mod logging;

pub use helpers::*;
