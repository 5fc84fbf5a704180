//! Domain boundary of the dataflow instantiation

pub mod ports;
