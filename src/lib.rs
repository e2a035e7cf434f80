//! Geoscope: look up where an IP address (or a place name) is, what
//! country it belongs to, and what time it is there.

pub mod config;
pub mod lookup;
