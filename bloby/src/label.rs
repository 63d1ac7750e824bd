//! 连通区域标记.

use std::collections::VecDeque;
use std::ops::Index;

use ndarray::{Array3, ArrayView3};

use crate::consts::BACKGROUND_LABEL;
use crate::mask::BinaryMask;
use crate::volume::VolumeAttr;
use crate::Idx3d;

/// 连通区域标记结果. 与掩膜同形状, 背景为 0, 每个 26-连通前景区域拥有唯一的正整数标签.
///
/// 标签按照行优先扫描时区域第一次出现的顺序从 1 开始连续分配,
/// 因此对固定的掩膜是确定的, 但除了区分区域之外没有其它含义.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledVolume {
    data: Array3<u32>,
    len: u32,
}

impl VolumeAttr for LabeledVolume {
    type Elem = u32;

    #[inline]
    fn data(&self) -> ArrayView3<'_, u32> {
        self.data.view()
    }
}

impl Index<Idx3d> for LabeledVolume {
    type Output = u32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

/// 获取 `pos` 的 26-邻域坐标.
///
/// 在 `shape` 范围外的坐标会被过滤掉, 不会包含在返回值中.
fn neighbours26((z, y, x): Idx3d, (sz, sy, sx): Idx3d) -> impl Iterator<Item = Idx3d> {
    const D: [isize; 3] = [-1, 0, 1];
    D.into_iter()
        .flat_map(|dz| D.into_iter().map(move |dy| (dz, dy)))
        .flat_map(|(dz, dy)| D.into_iter().map(move |dx| (dz, dy, dx)))
        .filter(|&d| d != (0, 0, 0))
        .filter_map(move |(dz, dy, dx)| {
            let nz = z.checked_add_signed(dz).filter(|v| *v < sz)?;
            let ny = y.checked_add_signed(dy).filter(|v| *v < sy)?;
            let nx = x.checked_add_signed(dx).filter(|v| *v < sx)?;
            Some((nz, ny, nx))
        })
}

impl LabeledVolume {
    /// 按照 26-相邻规则标记 `mask` 中的所有前景区域.
    ///
    /// 两个前景体素属于同一区域, 当且仅当存在一条连接二者的 26-相邻前景路径.
    pub fn from_mask(mask: &BinaryMask) -> Self {
        let shape = mask.shape();
        let mut data = Array3::from_elem(shape, BACKGROUND_LABEL);
        let mut len = 0u32;
        let mut bfs_q = VecDeque::with_capacity(64);

        for (pos, &fg) in mask.data().indexed_iter() {
            if !fg || data[pos] != BACKGROUND_LABEL {
                continue;
            }
            len += 1;
            data[pos] = len;
            bfs_q.push_back(pos);

            while let Some(cur) = bfs_q.pop_front() {
                for n in neighbours26(cur, shape) {
                    if mask[n] && data[n] == BACKGROUND_LABEL {
                        data[n] = len;
                        bfs_q.push_back(n);
                    }
                }
            }
        }
        Self { data, len }
    }

    /// 前景区域个数, 即最大标签值.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// 是否不存在前景区域?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 每个区域的体素个数. 第 `i` 个元素对应标签 `i + 1`.
    pub fn region_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.len()];
        for &l in self.data.iter().filter(|l| **l != BACKGROUND_LABEL) {
            sizes[l as usize - 1] += 1;
        }
        sizes
    }

    /// 收集标签为 `label` 的所有体素下标. 结果按行优先存储.
    pub fn region_pos(&self, label: u32) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, l)| (*l == label).then_some(pos))
            .collect()
    }

    /// 消费自我, 获得底层标签数组.
    #[inline]
    pub fn into_inner(self) -> Array3<u32> {
        self.data
    }
}
