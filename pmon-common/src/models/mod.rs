//! Wire and domain types shared across the pipeline

pub mod label;
pub mod sample;

pub use label::{Label, LabelPayload, LabelSource};
pub use sample::{PressureSample, RawSession, Reading, TelemetrySample};
