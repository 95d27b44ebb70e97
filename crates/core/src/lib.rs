#![forbid(unsafe_code)]

pub mod access;
pub mod model;
pub mod time;

pub use access::{is_locked, is_locked_for};
pub use time::Clock;
