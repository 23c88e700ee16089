//! File output for stored readings.

pub mod export;
