//! Host health server: disk, temp storage, memory, CPU and descriptor
//! checks classified into ok / warning / critical bands.

pub mod cli;
pub mod core;
pub mod server;
pub mod utils;
