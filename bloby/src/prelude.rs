//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::error::{BlobError, BlobResult, ConfigError, DataError};

pub use crate::volume::{RegionId, RegionVolume, Volume, VolumeAttr};

pub use crate::cluster::{ClusterConfig, ClusterModel};

pub use crate::centroid::Centroid;

pub use crate::detector::{BlobDetector, Detection, DetectorConfig};

pub use crate::region::{sum_intensity_by_region, RegionIntensityMap};

#[cfg(feature = "rayon")]
pub use crate::region::par_sum_intensity_by_region;

pub use crate::consts::DEFAULT_COMPONENTS;
