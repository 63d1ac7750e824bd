//! 三维体数据基础结构.
//!
//! 所有体数据均按照 `(z, y, x)` 顺序访问, 且底层数据总是行优先 (standard layout) 存储.

use std::collections::BTreeSet;
use std::ops::Index;

use ndarray::{Array3, ArrayView2, ArrayView3, Axis};

use crate::error::{BlobResult, DataError};
use crate::histogram::IntensityHistogram;
use crate::Idx3d;

mod load;

pub use load::LoadError;

/// 区域 (atlas) 标签值类型.
pub type RegionId = u16;

/// 保证数组为行优先存储.
#[inline]
fn standard<T: Clone>(data: Array3<T>) -> Array3<T> {
    if data.is_standard_layout() {
        data
    } else {
        data.as_standard_layout().into_owned()
    }
}

/// 三维体数据的共用属性和部分通用操作.
pub trait VolumeAttr {
    /// 体素类型.
    type Elem: Copy + 'static;

    /// 获得数据的一份不可变 shallow copy.
    fn data(&self) -> ArrayView3<'_, Self::Elem>;

    /// 获取数据形状大小 `(z, y, x)`.
    #[inline]
    fn shape(&self) -> Idx3d {
        self.data().dim()
    }

    /// 获取水平切片个数.
    #[inline]
    fn len_z(&self) -> usize {
        self.shape().0
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, y, x) = self.shape();
        z * y * x
    }

    /// 体数据是否不含任何体素?
    #[inline]
    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// 检查索引是否合法.
    #[inline]
    fn check(&self, (z0, y0, x0): &Idx3d) -> bool {
        let (z, y, x) = self.shape();
        *z0 < z && *y0 < y && *x0 < x
    }

    /// 获取能按升序迭代水平切片视图的迭代器.
    #[inline]
    fn slice_iter(&self) -> impl ExactSizeIterator<Item = ArrayView2<'_, Self::Elem>> {
        (0..self.len_z()).map(move |z| self.data().index_axis_move(Axis(0), z))
    }
}

/// 三维荧光强度体数据. 强度以 `u16` 保存, 只读.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    data: Array3<u16>,
}

impl VolumeAttr for Volume {
    type Elem = u16;

    #[inline]
    fn data(&self) -> ArrayView3<'_, u16> {
        self.data.view()
    }
}

impl Index<Idx3d> for Volume {
    type Output = u16;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl From<Array3<u16>> for Volume {
    #[inline]
    fn from(data: Array3<u16>) -> Self {
        Self::new(data)
    }
}

impl Volume {
    /// 由 `(z, y, x)` 排列的三维数组直接创建体数据.
    #[inline]
    pub fn new(data: Array3<u16>) -> Self {
        Self {
            data: standard(data),
        }
    }

    /// 由行优先的扁平数据创建体数据.
    ///
    /// 若 `data` 长度与 `shape` 不符, 则返回 `DataError::BadShape`.
    pub fn from_shape_vec(shape: Idx3d, data: Vec<u16>) -> BlobResult<Self> {
        let data = Array3::from_shape_vec(shape, data).map_err(|_| DataError::BadShape)?;
        Ok(Self { data })
    }

    /// 统计体数据中每个不同强度值出现的次数.
    #[inline]
    pub fn histogram(&self) -> IntensityHistogram {
        IntensityHistogram::from_volume(self)
    }

    /// 所有体素强度之和.
    pub fn total_intensity(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    /// 消费自我, 获得底层数据.
    #[inline]
    pub fn into_inner(self) -> Array3<u16> {
        self.data
    }
}

/// 与强度体数据配准的区域标签体数据. 每个体素保存其所属区域的编号.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionVolume {
    data: Array3<RegionId>,
}

impl VolumeAttr for RegionVolume {
    type Elem = RegionId;

    #[inline]
    fn data(&self) -> ArrayView3<'_, RegionId> {
        self.data.view()
    }
}

impl Index<Idx3d> for RegionVolume {
    type Output = RegionId;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl From<Array3<RegionId>> for RegionVolume {
    #[inline]
    fn from(data: Array3<RegionId>) -> Self {
        Self::new(data)
    }
}

impl RegionVolume {
    /// 由 `(z, y, x)` 排列的三维数组直接创建区域标签体数据.
    #[inline]
    pub fn new(data: Array3<RegionId>) -> Self {
        Self {
            data: standard(data),
        }
    }

    /// 由行优先的扁平数据创建区域标签体数据.
    ///
    /// 若 `data` 长度与 `shape` 不符, 则返回 `DataError::BadShape`.
    pub fn from_shape_vec(shape: Idx3d, data: Vec<RegionId>) -> BlobResult<Self> {
        let data = Array3::from_shape_vec(shape, data).map_err(|_| DataError::BadShape)?;
        Ok(Self { data })
    }

    /// 获取体数据中出现的所有区域编号, 升序排列.
    pub fn regions(&self) -> Vec<RegionId> {
        self.data
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 获取值为 `region` 的体素个数.
    #[inline]
    pub fn count(&self, region: RegionId) -> usize {
        self.data.iter().filter(|p| **p == region).count()
    }
}
