#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

extern crate io_util;

mod codec;
mod error;
mod file_system;
mod header;
mod image_format;
mod processing;
mod resource;
mod texture;
mod texture_data;
mod texture_flags;
mod thumbnail;

pub use self::codec::ReadOptions;
pub use self::error::{VtfError, VtfResult};
pub use self::file_system::{FileSystem, OpenMode, StdFileSystem};
pub use self::header::{header_size, Header, CURRENT_VERSION, MAX_MINOR_VERSION};
pub use self::image_format::{calculate_image_size, FormatSizeInfo, ImageFormat, ImageFormatInfo};
pub use self::processing::{AlphaCoverage, CubeMapFace, ImageProcessor, ImageView, ImageViewMut, ResampleOptions};
pub use self::resource::{
  ExtraResource, Resource, ResourceData, ResourceEntry, CRC_TAG, HIGH_RES_IMAGE_TAG, KEY_VALUES_TAG,
  LOD_SETTINGS_TAG, LOW_RES_IMAGE_TAG, MAX_RESOURCE_ENTRIES, RESOURCE_FLAG_NO_DATA_CHUNK, TEXTURE_SETTINGS_TAG
};
pub use self::texture::{compute_mip_count, ImageDataLocation, VtfTexture};
pub use self::texture_data::*;
pub use self::texture_flags::TextureFlags;
pub use self::thumbnail::{LowResLocation, Thumbnail};
