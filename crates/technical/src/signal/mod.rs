pub mod detector;
pub mod entity;

pub use detector::SignalDetector;
pub use entity::{
    Bias, BollSignal, KdjSignal, MaSignal, MacdSignal, RsiSignal, Signal, SignalFamily, SignalSet,
};
