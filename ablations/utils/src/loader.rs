//! 对 `bloby::volume` 加载接口的一层封装. 从环境变量指定的路径加载体数据.

use bloby::{LoadError, RegionVolume, Volume};
use std::env;
use std::path::{Path, PathBuf};

/// 原始强度体数据路径的环境变量名.
pub const VOLUME_ENV: &str = "BLOBY_VOLUME";

/// 区域标签体数据路径的环境变量名.
pub const REGIONS_ENV: &str = "BLOBY_REGIONS";

/// 体数据文件格式, 由文件名后缀判断.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Format {
    Npy,
    Nifti,
    Tiff,
}

impl Format {
    /// `.nii`/`.nii.gz` 为 NIfTI, `.tif`/`.tiff` 为多页 tiff, 其余一律视为 `.npy`.
    fn of(p: &Path) -> Self {
        let name = p
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if name.ends_with(".nii") || name.ends_with(".nii.gz") {
            Self::Nifti
        } else if name.ends_with(".tif") || name.ends_with(".tiff") {
            Self::Tiff
        } else {
            Self::Npy
        }
    }
}

/// 读取环境变量 `key` 给出的路径. 未设置或为空时返回 `None`.
pub fn path_from_env(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// 按扩展名加载强度体数据.
pub fn load_volume<P: AsRef<Path>>(path: P) -> Result<Volume, LoadError> {
    let p = path.as_ref();
    match Format::of(p) {
        Format::Npy => Volume::open_npy(p),
        Format::Nifti => Volume::open_nifti(p),
        Format::Tiff => Volume::open_tiff(p),
    }
}

/// 按扩展名加载区域标签体数据.
pub fn load_regions<P: AsRef<Path>>(path: P) -> Result<RegionVolume, LoadError> {
    let p = path.as_ref();
    match Format::of(p) {
        Format::Npy => RegionVolume::open_npy(p),
        Format::Nifti => RegionVolume::open_nifti(p),
        Format::Tiff => RegionVolume::open_tiff(p),
    }
}

/// 若设置了 `$BLOBY_VOLUME`, 则加载其指向的强度体数据.
#[inline]
pub fn volume_from_env() -> Option<Result<Volume, LoadError>> {
    path_from_env(VOLUME_ENV).map(load_volume)
}

/// 若设置了 `$BLOBY_REGIONS`, 则加载其指向的区域标签体数据.
#[inline]
pub fn regions_from_env() -> Option<Result<RegionVolume, LoadError>> {
    path_from_env(REGIONS_ENV).map(load_regions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_of() {
        assert_eq!(Format::of(Path::new("/tmp/a.nii")), Format::Nifti);
        assert_eq!(Format::of(Path::new("b.nii.gz")), Format::Nifti);
        assert_eq!(Format::of(Path::new("c.npy")), Format::Npy);
        assert_eq!(Format::of(Path::new("nii")), Format::Npy);
        assert_eq!(Format::of(Path::new("stack.tif")), Format::Tiff);
        assert_eq!(Format::of(Path::new("/data/atlas.TIFF")), Format::Tiff);
    }
}
