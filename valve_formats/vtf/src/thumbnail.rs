use crate::image_format::{calculate_image_size, ImageFormat};

/// Where the low-res image lives inside an encoded file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LowResLocation {
  pub offset: u32,
  pub size: u32
}

#[derive(Clone, Debug, PartialEq)]
pub struct Thumbnail {
  pub data: Vec<u8>,
  pub format: ImageFormat,
  pub width: u32,
  pub height: u32,
  pub location: LowResLocation
}

impl Thumbnail {
  pub(crate) fn empty() -> Self {
    Self {
      data: Vec::new(),
      format: ImageFormat::Unknown,
      width: 0,
      height: 0,
      location: LowResLocation::default()
    }
  }

  pub(crate) fn byte_size(width: u32, height: u32, format: ImageFormat) -> usize {
    if width == 0 || height == 0 {
      return 0;
    }
    calculate_image_size(width, height, 1, format)
  }

  pub fn is_present(&self) -> bool {
    !self.data.is_empty()
  }
}
