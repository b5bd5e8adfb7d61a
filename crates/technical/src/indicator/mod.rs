pub mod engine;
pub mod math;
pub mod row;

pub use engine::IndicatorEngine;
pub use row::IndicatorRow;
