//! 从本地文件加载体数据.
//!
//! 文件格式本身不是检测流程的一部分, 这里只提供常用格式 (npy, nifti, 多页 tiff) 的读取.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use ndarray::{Array3, ArrayD, Ix3};
use ndarray_npy::{read_npy, ReadNpyError};
use nifti::{IntoNdArray, NiftiError, NiftiObject, ReaderOptions};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::{ColorType, TiffError};

use super::{RegionId, RegionVolume, Volume};

/// 加载体数据错误.
#[derive(Debug)]
pub enum LoadError {
    /// 读取 npy 文件错误.
    ReadNpy(ReadNpyError),

    /// 读取 nifti 文件错误.
    Nifti(NiftiError),

    /// 文件数据不是三维的. 参数为实际维数.
    NotThreeDimensional(usize),

    /// 打开文件错误.
    Io(io::Error),

    /// 读取 tiff 文件错误.
    Tiff(TiffError),

    /// tiff 页面不是 8/16 位单通道灰度图.
    UnsupportedColor(ColorType),

    /// tiff 第 `page` 页 (从 0 开始) 的尺寸与第一页不同.
    PageSizeMismatch {
        /// 页面下标.
        page: usize,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadNpy(e) => write!(f, "failed to read npy file: {e}"),
            Self::Nifti(e) => write!(f, "failed to read nifti file: {e}"),
            Self::NotThreeDimensional(n) => {
                write!(f, "expected a 3-D volume, found {n} dimensions")
            }
            Self::Io(e) => write!(f, "failed to open file: {e}"),
            Self::Tiff(e) => write!(f, "failed to read tiff file: {e}"),
            Self::UnsupportedColor(c) => {
                write!(f, "expected 8/16-bit grayscale tiff pages, found {c:?}")
            }
            Self::PageSizeMismatch { page } => {
                write!(f, "tiff page {page} differs in size from the first page")
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadNpy(e) => Some(e),
            Self::Nifti(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Tiff(e) => Some(e),
            Self::NotThreeDimensional(_)
            | Self::UnsupportedColor(_)
            | Self::PageSizeMismatch { .. } => None,
        }
    }
}

impl From<ReadNpyError> for LoadError {
    #[inline]
    fn from(e: ReadNpyError) -> Self {
        Self::ReadNpy(e)
    }
}

impl From<NiftiError> for LoadError {
    #[inline]
    fn from(e: NiftiError) -> Self {
        Self::Nifti(e)
    }
}

impl From<io::Error> for LoadError {
    #[inline]
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<TiffError> for LoadError {
    #[inline]
    fn from(e: TiffError) -> Self {
        Self::Tiff(e)
    }
}

/// 读取 npy 文件. 文件内数组应按 `(z, y, x)` 排列.
fn open_npy_u16(path: &Path) -> Result<Array3<u16>, LoadError> {
    Ok(read_npy::<_, Array3<u16>>(path)?)
}

/// 读取 nifti 文件, 并将 `(x, y, z)` 转换成 `(z, y, x)`.
fn open_nifti_u16(path: &Path) -> Result<Array3<u16>, LoadError> {
    let obj = ReaderOptions::new().read_file(path)?;
    let data: ArrayD<u16> = obj.into_volume().into_ndarray::<u16>()?;
    let ndim = data.ndim();
    let data = data
        .into_dimensionality::<Ix3>()
        .map_err(|_| LoadError::NotThreeDimensional(ndim))?;

    // [x, y, z] -> [z, y, x]. 内存布局由调用方统一整理为行优先.
    Ok(data.permuted_axes([2, 1, 0]))
}

/// 读取多页 tiff 文件. 每一页是一个 `(y, x)` 水平切片, 页序即 `z` 方向.
///
/// 只接受 8 位或 16 位单通道灰度页面, 且所有页面尺寸一致.
fn open_tiff_u16(path: &Path) -> Result<Array3<u16>, LoadError> {
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    let (w, h) = decoder.dimensions()?;
    let mut data = Vec::with_capacity(w as usize * h as usize);
    let mut len_z = 0usize;

    loop {
        if decoder.dimensions()? != (w, h) {
            return Err(LoadError::PageSizeMismatch { page: len_z });
        }
        match decoder.colortype()? {
            ColorType::Gray(8 | 16) => {}
            c => return Err(LoadError::UnsupportedColor(c)),
        }
        match decoder.read_image()? {
            DecodingResult::U8(page) => data.extend(page.into_iter().map(u16::from)),
            DecodingResult::U16(page) => data.extend(page),
            _ => return Err(LoadError::UnsupportedColor(decoder.colortype()?)),
        }
        len_z += 1;

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }

    Array3::from_shape_vec((len_z, h as usize, w as usize), data)
        .map_err(|_| LoadError::PageSizeMismatch { page: len_z - 1 })
}

impl Volume {
    /// 打开 npy 格式的三维强度数据. `path` 为 npy 文件的本地路径.
    pub fn open_npy<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        open_npy_u16(path.as_ref()).map(Self::new)
    }

    /// 打开 nii 格式的三维强度数据. 强度值会被转换为 `u16`.
    pub fn open_nifti<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        open_nifti_u16(path.as_ref()).map(Self::new)
    }

    /// 打开多页 tiff 格式的三维强度数据 (显微镜 z-stack). 第 `i` 页即第 `i` 个水平切片.
    pub fn open_tiff<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        open_tiff_u16(path.as_ref()).map(Self::new)
    }
}

impl RegionVolume {
    /// 打开 npy 格式的区域标签数据. 数组元素类型必须为 `u16`.
    pub fn open_npy<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        open_npy_u16(path.as_ref()).map(Self::new)
    }

    /// 打开 nii 格式的区域标签数据. 标签值会被转换为 [`RegionId`].
    pub fn open_nifti<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let data: Array3<RegionId> = open_nifti_u16(path.as_ref())?;
        Ok(Self::new(data))
    }

    /// 打开多页 tiff 格式的区域标签数据 (atlas). 页面须为 8/16 位灰度.
    pub fn open_tiff<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        open_tiff_u16(path.as_ref()).map(Self::new)
    }
}
