//! # kabu-app
//!
//! 命令行入口的组成部分：参数解析、日志初始化、数据源装配与 Markdown 报告渲染。

pub mod cli;
pub mod logging;
pub mod provider;
pub mod report;
