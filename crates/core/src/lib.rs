//! # kabu-core
//!
//! 投资分析流水线的共享内核：证券身份、行情实体、配置，以及数据源与缓存两个外部协作者的端口定义。
//! 指标计算、信号识别与评分位于各自的 crate 中，只依赖这里声明的类型。

pub mod cache;
pub mod common;
pub mod config;
pub mod market;
