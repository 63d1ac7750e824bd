//! `k = 2` (不腐蚀) 与 `k > 2` (腐蚀) 两种检测策略的消融实验.
//!
//! 在合成体数据上比较两种策略: 相切的亮球只有腐蚀后才能分开,
//! 而单体素亮点在腐蚀后会消失.
//!
//! 若设置了 `$BLOBY_VOLUME` (及 `$BLOBY_REGIONS`), 还会在真实数据上运行一次默认检测.

mod profile;
mod result;
mod runner;

use simple_logger::SimpleLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init()?;

    runner::run().analyze()?;
    runner::run_env()
}
