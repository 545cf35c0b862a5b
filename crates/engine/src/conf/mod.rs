//! Engine configuration: tunable heuristics for detection, bounds
//! extraction, and histogram binning.

pub mod load;
pub mod model;

pub use model::EngineConfig;
