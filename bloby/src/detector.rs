//! 斑点检测流程.
//!
//! 体数据 → 强度直方图 → 强度聚类 → 自适应阈值 → (按策略) 形态学腐蚀
//! → 26-连通区域标记 → 质心. 每一步都是无状态的纯数据变换,
//! 检测器本身只持有只读配置.

use log::{debug, info};

use crate::centroid::Centroid;
use crate::cluster::{ClusterConfig, ClusterModel};
use crate::consts::DEFAULT_COMPONENTS;
use crate::error::{BlobResult, ConfigError};
use crate::label::LabeledVolume;
use crate::morph::ErosionPolicy;
use crate::region::{self, RegionIntensityMap};
use crate::threshold::Threshold;
use crate::volume::{RegionVolume, Volume};

/// 斑点检测配置.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorConfig {
    /// 强度聚类参数. 其中分量个数即聚类个数 `k`.
    pub cluster: ClusterConfig,
}

impl DetectorConfig {
    /// 以 `components` 个强度聚类和默认参数构建配置.
    ///
    /// # 注意
    ///
    /// `components == 2` 时检测流程不做形态学腐蚀, 见 [`ErosionPolicy`].
    #[inline]
    pub fn new(components: usize) -> Self {
        Self {
            cluster: ClusterConfig::new(components),
        }
    }

    /// 固定混合模型初始化的随机种子, 使检测结果可复现.
    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.cluster = self.cluster.with_seed(seed);
        self
    }

    /// 强度聚类个数 `k`.
    #[inline]
    pub fn components(&self) -> usize {
        self.cluster.components()
    }

    /// 由 `k` 决定的形态学处理策略.
    #[inline]
    pub fn erosion_policy(&self) -> ErosionPolicy {
        ErosionPolicy::for_components(self.components())
    }

    /// 检查参数是否合法. 检测流程要求 `k >= 2`.
    pub fn validate(&self) -> BlobResult<()> {
        let k = self.components();
        if k < 2 {
            return Err(ConfigError::TooFewComponents(k).into());
        }
        self.cluster.validate()
    }
}

/// 一次检测的完整结果.
#[derive(Clone, Debug)]
pub struct Detection {
    /// 拟合得到的混合模型.
    pub model: ClusterModel,

    /// 每个聚类的代表强度, 升序.
    pub representatives: Vec<u16>,

    /// 前景阈值.
    pub threshold: Threshold,

    /// 本次检测使用的形态学策略.
    pub policy: ErosionPolicy,

    /// 阈值掩膜中的前景体素个数 (腐蚀前).
    pub foreground: usize,

    /// 连通区域标记结果.
    pub labels: LabeledVolume,

    /// 每个斑点的质心, 按标签升序.
    pub centroids: Vec<Centroid>,
}

/// 斑点检测器.
#[derive(Copy, Clone, Debug, Default)]
pub struct BlobDetector {
    config: DetectorConfig,
}

impl BlobDetector {
    /// 由配置构建检测器.
    #[inline]
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// 以 `components` 个强度聚类构建检测器.
    #[inline]
    pub fn with_components(components: usize) -> Self {
        Self::new(DetectorConfig::new(components))
    }

    /// 检测器配置.
    #[inline]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// 运行完整检测流程, 返回全部中间结果.
    ///
    /// # 错误
    ///
    /// 1. `k < 2` 或其它参数非法时返回 `BlobError::Config`, 此时不会进行任何拟合;
    /// 2. 体数据为空、不同强度值少于 `k`、拟合失败时返回 `BlobError::Data`.
    pub fn detect(&self, volume: &Volume) -> BlobResult<Detection> {
        self.config.validate()?;

        let hist = volume.histogram();
        debug!("{} distinct intensities", hist.len());

        let model = ClusterModel::fit(&hist, &self.config.cluster)?;
        let mut representatives = model.representatives(&hist)?;
        representatives.sort_unstable();
        debug!(
            "mixture converged after {} iterations, representatives {representatives:?}",
            model.iterations()
        );

        let threshold = Threshold::from_representatives(&representatives)?;
        let mask = threshold.binary_mask(volume);
        let foreground = mask.count_foreground();

        let policy = self.config.erosion_policy();
        let labels = LabeledVolume::from_mask(&policy.apply(mask));
        let centroids = labels.centroids();
        info!(
            "threshold {:.2}, {foreground} foreground voxels, {policy:?}, {} blobs",
            threshold.value(),
            centroids.len()
        );

        Ok(Detection {
            model,
            representatives,
            threshold,
            policy,
            foreground,
            labels,
            centroids,
        })
    }

    /// 基于混合模型阈值、腐蚀和连通区域获取斑点质心, 按标签升序.
    ///
    /// 错误语义同 [`Self::detect`].
    #[inline]
    pub fn get_blob_centroids(&self, volume: &Volume) -> BlobResult<Vec<Centroid>> {
        self.detect(volume).map(|d| d.centroids)
    }

    /// 给定配准后的区域标签体数据, 计算每个区域的原始强度总和.
    ///
    /// 开启 `rayon` feature 时按切片并行计算, 结果相同.
    pub fn intensity_by_region(
        &self,
        volume: &Volume,
        regions: &RegionVolume,
    ) -> BlobResult<RegionIntensityMap> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                region::par_sum_intensity_by_region(volume, regions)
            } else {
                region::sum_intensity_by_region(volume, regions)
            }
        }
    }
}

impl From<DetectorConfig> for BlobDetector {
    #[inline]
    fn from(config: DetectorConfig) -> Self {
        Self::new(config)
    }
}

impl Default for DetectorConfig {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_COMPONENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BlobError, DataError};
    use crate::volume::VolumeAttr;
    use ndarray::{s, Array3};

    #[test]
    fn test_config_rejects_single_component() {
        let d = BlobDetector::with_components(1);
        let v = Volume::from_shape_vec((1, 1, 3), vec![0, 5, 10]).unwrap();
        assert_eq!(
            d.get_blob_centroids(&v),
            Err(BlobError::Config(ConfigError::TooFewComponents(1)))
        );
        let d = BlobDetector::with_components(0);
        assert!(d.detect(&v).unwrap_err().is_config());
    }

    #[test]
    fn test_default_components() {
        assert_eq!(DetectorConfig::default().components(), DEFAULT_COMPONENTS);
        assert_eq!(
            DetectorConfig::new(2).erosion_policy(),
            ErosionPolicy::Skip
        );
        assert_eq!(
            DetectorConfig::new(4).erosion_policy(),
            ErosionPolicy::Erode
        );
    }

    #[test]
    fn test_uniform_volume_is_data_error() {
        let v = Volume::new(Array3::from_elem((3, 3, 3), 42));
        let e = BlobDetector::new(DetectorConfig::new(2).with_seed(0))
            .detect(&v)
            .unwrap_err();
        assert_eq!(
            e,
            BlobError::Data(DataError::TooFewIntensities {
                distinct: 1,
                components: 2
            })
        );
    }

    #[test]
    fn test_two_bands() {
        let mut raw = Array3::<u16>::from_elem((4, 4, 4), 100);
        raw.slice_mut(s![2..4, .., ..]).fill(900);
        let v = Volume::new(raw);

        let d = BlobDetector::new(DetectorConfig::new(2).with_seed(3))
            .detect(&v)
            .unwrap();
        assert_eq!(d.representatives, vec![100, 900]);
        assert!(100.0 < d.threshold.value() && d.threshold.value() < 900.0);
        assert_eq!(d.policy, ErosionPolicy::Skip);
        assert_eq!(d.foreground, 32);

        // 掩膜恰好复现较亮的一半.
        let mask = d.threshold.binary_mask(&v);
        for ((z, _, _), &fg) in mask.data().indexed_iter() {
            assert_eq!(fg, z >= 2);
        }
        assert_eq!(d.labels.len(), 1);
        // (2.5, 1.5, 1.5) 五成双取整.
        assert_eq!(d.centroids, vec![Centroid::from((2, 2, 2))]);
    }

    #[test]
    fn test_intensity_by_region() {
        let v = Volume::from_shape_vec((1, 1, 4), vec![1, 2, 3, 4]).unwrap();
        let r = RegionVolume::from_shape_vec((1, 1, 4), vec![0, 1, 1, 0]).unwrap();
        let m = BlobDetector::default().intensity_by_region(&v, &r).unwrap();
        assert_eq!(m[&0], 5.0);
        assert_eq!(m[&1], 5.0);
    }
}
