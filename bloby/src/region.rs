//! 分区强度统计.
//!
//! 给定与强度体数据配准的区域标签体数据 (atlas), 按区域编号对原始强度分组求和.
//! 结果包含标签体数据中出现的每一个编号, 包括 0.

use std::collections::BTreeMap;

use log::debug;
use ndarray::ArrayView2;

use crate::error::{BlobError, BlobResult};
use crate::volume::{RegionId, RegionVolume, Volume, VolumeAttr};

/// 区域编号到该区域原始强度总和的映射, 按区域编号升序.
pub type RegionIntensityMap = BTreeMap<RegionId, f64>;

/// 单个区域的强度统计.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegionStats {
    /// 区域体素个数.
    pub voxels: u64,

    /// 区域内原始强度总和.
    pub total: f64,
}

impl RegionStats {
    /// 区域平均强度. 区域为空时返回 `None`.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        (self.voxels != 0).then(|| self.total / self.voxels as f64)
    }

    #[inline]
    fn push(&mut self, v: u16) {
        self.voxels += 1;
        self.total += v as f64;
    }

    #[inline]
    fn merge(&mut self, other: &RegionStats) {
        self.voxels += other.voxels;
        self.total += other.total;
    }
}

/// 检查两个体数据形状是否一致.
fn check_shape(volume: &Volume, regions: &RegionVolume) -> BlobResult<()> {
    if volume.shape() != regions.shape() {
        return Err(BlobError::ShapeMismatch {
            volume: volume.shape(),
            regions: regions.shape(),
        });
    }
    Ok(())
}

/// 统计单个水平切片, 结果累加到 `acc`.
fn accumulate_slice(
    acc: &mut BTreeMap<RegionId, RegionStats>,
    raw: ArrayView2<u16>,
    regions: ArrayView2<RegionId>,
) {
    for (&v, &r) in raw.iter().zip(regions.iter()) {
        acc.entry(r).or_default().push(v);
    }
}

#[inline]
fn totals(stats: BTreeMap<RegionId, RegionStats>) -> RegionIntensityMap {
    stats.into_iter().map(|(k, s)| (k, s.total)).collect()
}

/// 计算每个区域的体素个数与强度总和.
///
/// 两个体数据形状不一致时返回 `BlobError::ShapeMismatch`.
pub fn region_statistics(
    volume: &Volume,
    regions: &RegionVolume,
) -> BlobResult<BTreeMap<RegionId, RegionStats>> {
    check_shape(volume, regions)?;
    let mut acc = BTreeMap::new();
    for (raw, reg) in volume.slice_iter().zip(regions.slice_iter()) {
        accumulate_slice(&mut acc, raw, reg);
    }
    debug!("summed {} voxels over {} regions", volume.size(), acc.len());
    Ok(acc)
}

/// 计算每个区域的原始强度总和.
///
/// 两个体数据形状不一致时返回 `BlobError::ShapeMismatch`.
#[inline]
pub fn sum_intensity_by_region(
    volume: &Volume,
    regions: &RegionVolume,
) -> BlobResult<RegionIntensityMap> {
    region_statistics(volume, regions).map(totals)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use ndarray::Axis;
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

        /// 借助 `rayon`, 按水平切片并行地计算每个区域的体素个数与强度总和.
        ///
        /// 结果与 [`region_statistics`] 完全一致.
        pub fn par_region_statistics(
            volume: &Volume,
            regions: &RegionVolume,
        ) -> BlobResult<BTreeMap<RegionId, RegionStats>> {
            check_shape(volume, regions)?;
            let (raw, reg) = (volume.data(), regions.data());
            let acc = raw
                .axis_iter(Axis(0))
                .into_par_iter()
                .zip(reg.axis_iter(Axis(0)).into_par_iter())
                .fold(BTreeMap::new, |mut acc, (r, g)| {
                    accumulate_slice(&mut acc, r, g);
                    acc
                })
                .reduce(BTreeMap::new, |mut a, b| {
                    for (k, s) in b.iter() {
                        a.entry(*k).or_default().merge(s);
                    }
                    a
                });
            debug!("summed {} voxels over {} regions", volume.size(), acc.len());
            Ok(acc)
        }

        /// 借助 `rayon`, 按水平切片并行地计算每个区域的原始强度总和.
        ///
        /// 结果与 [`sum_intensity_by_region`] 完全一致.
        #[inline]
        pub fn par_sum_intensity_by_region(
            volume: &Volume,
            regions: &RegionVolume,
        ) -> BlobResult<RegionIntensityMap> {
            par_region_statistics(volume, regions).map(totals)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn ramp(shape: (usize, usize, usize)) -> Volume {
        let (z, y, x) = shape;
        let data = (0..z * y * x).map(|i| (i * 37 % 1000) as u16).collect();
        Volume::from_shape_vec(shape, data).unwrap()
    }

    #[test]
    fn test_single_region() {
        let v = ramp((3, 4, 5));
        let r = RegionVolume::new(Array3::from_elem((3, 4, 5), 17));
        let m = sum_intensity_by_region(&v, &r).unwrap();
        assert_eq!(m.len(), 1);
        assert!(f64_eq(m[&17], v.total_intensity()));
    }

    #[test]
    fn test_background_and_single_voxel_kept() {
        let v = Volume::from_shape_vec((1, 2, 3), vec![1, 2, 3, 4, 5, 6]).unwrap();
        let r = RegionVolume::from_shape_vec((1, 2, 3), vec![0, 0, 9, 0, 4, 4]).unwrap();
        let m = sum_intensity_by_region(&v, &r).unwrap();
        assert_eq!(m.keys().copied().collect::<Vec<_>>(), vec![0, 4, 9]);
        assert_eq!(m[&0], 7.0);
        assert_eq!(m[&4], 11.0);
        assert_eq!(m[&9], 3.0);

        let s = region_statistics(&v, &r).unwrap();
        assert_eq!(s[&4].voxels, 2);
        assert_eq!(s[&4].mean(), Some(5.5));
        assert_eq!(s[&9].voxels, 1);
    }

    #[test]
    fn test_mass_preserved() {
        let v = ramp((4, 5, 6));
        let labels = (0..120).map(|i| (i % 7) as RegionId).collect();
        let r = RegionVolume::from_shape_vec((4, 5, 6), labels).unwrap();
        let m = sum_intensity_by_region(&v, &r).unwrap();
        assert_eq!(m.len(), 7);
        assert!(f64_eq(m.values().sum::<f64>(), v.total_intensity()));
    }

    #[test]
    fn test_shape_mismatch() {
        let v = ramp((2, 2, 2));
        let r = RegionVolume::new(Array3::zeros((2, 2, 3)));
        assert_eq!(
            sum_intensity_by_region(&v, &r),
            Err(BlobError::ShapeMismatch {
                volume: (2, 2, 2),
                regions: (2, 2, 3),
            })
        );
    }

    #[test]
    fn test_empty_stats_mean() {
        assert_eq!(RegionStats::default().mean(), None);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_parallel_matches_sequential() {
        let v = ramp((9, 8, 7));
        let labels = (0..504).map(|i| ((i / 5) % 11) as RegionId).collect();
        let r = RegionVolume::from_shape_vec((9, 8, 7), labels).unwrap();
        assert_eq!(
            par_sum_intensity_by_region(&v, &r).unwrap(),
            sum_intensity_by_region(&v, &r).unwrap()
        );
        assert_eq!(
            par_region_statistics(&v, &r).unwrap(),
            region_statistics(&v, &r).unwrap()
        );

        let bad = RegionVolume::new(Array3::zeros((1, 1, 1)));
        assert!(par_sum_intensity_by_region(&v, &bad).is_err());
    }
}
