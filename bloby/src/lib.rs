#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 在三维荧光显微体数据中检测亮斑 (细胞核、标记细胞等),
//! 并按配准的区域标签 (atlas) 统计原始强度.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 检测流程
//!
//! 1. 统计体数据中所有不同强度值及其体素个数 ([`IntensityHistogram`]);
//! 2. 在 `[强度, 体素个数]` 特征点上拟合 `k` 分量高斯混合模型 ([`ClusterModel`]);
//! 3. 取每个分量的经验众数作为代表强度, 以最大与次大代表强度的中点为阈值 ([`Threshold`]);
//! 4. `k > 2` 时对阈值掩膜做一次 6-邻域腐蚀 ([`ErosionPolicy`]);
//! 5. 按 26-相邻规则标记连通区域 ([`LabeledVolume`]), 输出各区域取整后的质心 ([`Centroid`]).
//!
//! 分区强度统计 ([`region`]) 与检测流程相互独立.
//!
//! # 注意
//!
//! 1. 体数据统一按 `(z, y, x)` 轴序存储, `z` 为切片索引.
//! 2. 所有错误均以 [`BlobError`] 返回, 调用要么得到完整结果, 要么整体失败.
//! 3. 未固定随机种子时, 混合模型初始化是随机的, 不同运行之间结果可能略有不同.
//!
//! # 开发计划
//!
//! ### 强度直方图与高斯混合模型 ✅
//!
//! 实现位于 `bloby/src/histogram.rs` 与 `bloby/src/cluster`.
//!
//! ### 自适应阈值与三维形态学腐蚀 ✅
//!
//! 实现位于 `bloby/src/threshold.rs` 与 `bloby/src/morph.rs`.
//!
//! ### 26-连通区域标记与质心 ✅
//!
//! 实现位于 `bloby/src/label.rs` 与 `bloby/src/centroid.rs`.
//!
//! ### 分区强度统计 (含 `rayon` 并行版本) ✅
//!
//! 实现位于 `bloby/src/region.rs`.
//!
//! ### `k = 2` 与 `k > 2` 腐蚀策略的消融实验 ✅
//!
//! 实现位于 `ablations/erosion`.

/// 三维索引 `(z, y, x)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

pub mod consts;

mod error;

pub use error::{BlobError, BlobResult, ConfigError, DataError};

/// 三维体数据基础数据结构.
pub mod volume;

pub use volume::{LoadError, RegionId, RegionVolume, Volume, VolumeAttr};

pub mod histogram;

pub use histogram::IntensityHistogram;

pub mod cluster;

pub use cluster::{ClusterConfig, ClusterModel, Component};

pub mod threshold;

pub use threshold::Threshold;

mod mask;

pub use mask::BinaryMask;

pub mod morph;

pub use morph::ErosionPolicy;

pub mod label;

pub use label::LabeledVolume;

pub mod centroid;

pub use centroid::Centroid;

pub mod region;

pub use region::{RegionIntensityMap, RegionStats};

pub mod detector;

pub use detector::{BlobDetector, Detection, DetectorConfig};

pub mod prelude;
