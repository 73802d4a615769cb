//! Order sizing under a fixed monetary risk budget

mod sizing;

pub use sizing::{compute_size, RiskSizer};
