//! 三维二值前景掩膜.

use std::ops::Index;

use ndarray::{Array3, ArrayView3};

use crate::volume::VolumeAttr;
use crate::Idx3d;

/// 与体数据同形状的布尔前景掩膜. `true` 代表前景.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    data: Array3<bool>,
}

impl VolumeAttr for BinaryMask {
    type Elem = bool;

    #[inline]
    fn data(&self) -> ArrayView3<'_, bool> {
        self.data.view()
    }
}

impl Index<Idx3d> for BinaryMask {
    type Output = bool;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl From<Array3<bool>> for BinaryMask {
    #[inline]
    fn from(data: Array3<bool>) -> Self {
        Self::new(data)
    }
}

impl BinaryMask {
    /// 直接由布尔数组创建掩膜.
    #[inline]
    pub fn new(data: Array3<bool>) -> Self {
        Self { data }
    }

    /// 前景体素个数.
    #[inline]
    pub fn count_foreground(&self) -> usize {
        self.data.iter().filter(|p| **p).count()
    }

    /// 是否不存在前景?
    #[inline]
    pub fn is_background(&self) -> bool {
        !self.data.iter().any(|p| *p)
    }

    /// 收集所有前景体素的下标. 结果按行优先存储.
    pub fn foreground_pos(&self) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, p)| p.then_some(pos))
            .collect()
    }

    /// 获取 `pos` 前后上下左右六个点的坐标.
    ///
    /// 在数据范围外的坐标会被过滤掉, 不会包含在返回值中.
    pub(crate) fn diamond_neighbours(&self, (z, y, x): Idx3d) -> Vec<Idx3d> {
        [
            (z.wrapping_sub(1), y, x),
            (z.saturating_add(1), y, x),
            (z, y.wrapping_sub(1), x),
            (z, y.saturating_add(1), x),
            (z, y, x.wrapping_sub(1)),
            (z, y, x.saturating_add(1)),
        ]
        .into_iter()
        .filter(|p| self.check(p))
        .collect()
    }
}
