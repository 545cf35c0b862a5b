// Domain-driven module structure for the Logsift analysis engine.

// Core infrastructure
pub mod boot;
pub mod conf;
pub mod error;
pub mod model;

// Domain modules
pub mod timestamp;
pub mod volume;
