pub mod datasets;
pub mod harness;
