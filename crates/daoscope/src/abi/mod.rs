//! ABI signature catalog and event-log decoding.

pub mod decode;
pub mod descriptor;
pub mod value;
