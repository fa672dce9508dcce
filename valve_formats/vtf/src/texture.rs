use std::cmp::max;

use crate::error::{VtfError, VtfResult};
use crate::header::{is_version_supported, Header, CURRENT_VERSION, NO_SPHERE_MAP_FRAME};
use crate::image_format::{
  calculate_image_size, calculate_pixel_offset, calculate_row_count, calculate_row_size, checked_image_size, ImageFormat
};
use crate::resource::{ExtraResource, Resource};
use crate::texture_flags::TextureFlags;
use crate::thumbnail::{LowResLocation, Thumbnail};
use crate::{Face, Frame, MipMap, Slice};

pub const CUBE_MAP_FACE_COUNT: u32 = 6;
pub const DEFAULT_ALPHA_TEST_THRESHOLD: f32 = -1.0;

/// Addresses a position inside the image data: frame, face, mip level and a texel within that mip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageDataLocation {
  pub frame: u32,
  pub face: u32,
  pub mip_level: u32,
  pub x: u32,
  pub y: u32,
  pub z: u32
}

impl ImageDataLocation {
  pub fn new(frame: u32, face: u32, mip_level: u32) -> Self {
    Self {
      frame,
      face,
      mip_level,
      ..Default::default()
    }
  }

  pub fn at(self, x: u32, y: u32, z: u32) -> Self {
    Self { x, y, z, ..self }
  }
}

/// A decoded texture. Image data is laid out frame by frame, each frame face by face,
/// each face holding its mip levels from largest to smallest, each mip its depth slices.
#[derive(Clone, Debug, PartialEq)]
pub struct VtfTexture {
  pub(crate) version: [u32; 2],
  pub(crate) width: u32,
  pub(crate) height: u32,
  pub(crate) depth: u32,
  pub(crate) mip_count: u32,
  pub(crate) frame_count: u32,
  pub(crate) face_count: u32,
  pub(crate) start_frame: u16,
  pub(crate) format: ImageFormat,
  pub(crate) flags: TextureFlags,
  pub(crate) bump_scale: f32,
  pub(crate) reflectivity: [f32; 3],
  pub(crate) alpha_test_threshold: f32,
  pub(crate) alpha_test_high_freq_threshold: f32,
  pub(crate) image_data: Vec<u8>,
  pub(crate) low_res: Thumbnail,
  pub(crate) resources: Vec<ExtraResource>
}

impl Default for VtfTexture {
  fn default() -> Self {
    Self {
      version: CURRENT_VERSION,
      width: 1,
      height: 1,
      depth: 1,
      mip_count: 1,
      frame_count: 1,
      face_count: 1,
      start_frame: 0,
      format: ImageFormat::Unknown,
      flags: TextureFlags::empty(),
      bump_scale: 1.0,
      reflectivity: [0.0; 3],
      alpha_test_threshold: DEFAULT_ALPHA_TEST_THRESHOLD,
      alpha_test_high_freq_threshold: DEFAULT_ALPHA_TEST_THRESHOLD,
      image_data: Vec::new(),
      low_res: Thumbnail::empty(),
      resources: Vec::new()
    }
  }
}

/// `floor(log2(max(width, height, depth))) + 1`
pub fn compute_mip_count(width: u32, height: u32, depth: u32) -> u32 {
  let largest = max(1, max(width, max(height, depth)));
  32 - largest.leading_zeros()
}

fn mip_dimension(base: u32, mip_level: u32) -> u32 {
  max(1, base.checked_shr(mip_level).unwrap_or(0))
}

/// Zeroed buffer. Running out of memory is reported instead of aborting.
pub(crate) fn allocate_zeroed(size: usize) -> VtfResult<Vec<u8>> {
  let mut data = Vec::new();
  data.try_reserve_exact(size)?;
  data.resize(size, 0u8);
  Ok(data)
}

impl VtfTexture {
  /// An empty texture without a format. All size queries return 0.
  pub fn new() -> Self {
    Self::default()
  }

  /// Cheap signature check.
  pub fn check_file(data: &[u8]) -> bool {
    Header::check_file(data)
  }

  /// Creates a texture and allocates zeroed image data for it.
  pub fn create(width: u32, height: u32, depth: u32, format: ImageFormat, flags: TextureFlags, frame_count: u32, forced_mip_count: Option<u32>) -> VtfResult<Self> {
    let mut texture = Self::new();
    texture.init(width, height, depth, format, flags, frame_count, forced_mip_count)?;
    Ok(texture)
  }

  /// Initializes the texture and allocates space for the bits.
  /// In most cases the mip count should not be forced.
  pub fn init(&mut self, width: u32, height: u32, depth: u32, format: ImageFormat, flags: TextureFlags, frame_count: u32, forced_mip_count: Option<u32>) -> VtfResult<()> {
    if width == 0 || height == 0 || depth == 0 {
      return Err(VtfError::argument(format!("invalid dimensions {}x{}x{}", width, height, depth)));
    }
    if width > u16::MAX as u32 || height > u16::MAX as u32 || depth > u16::MAX as u32 {
      return Err(VtfError::argument(format!("dimensions {}x{}x{} exceed {}", width, height, depth, u16::MAX)));
    }
    if frame_count == 0 || frame_count > u16::MAX as u32 {
      return Err(VtfError::argument(format!("invalid frame count {}", frame_count)));
    }
    if format == ImageFormat::Default {
      return Err(VtfError::argument("the default format can only be used as a conversion target"));
    }
    let mip_count = match forced_mip_count {
      Some(0) => return Err(VtfError::argument("forced mip count must be at least 1")),
      Some(count) if count > u8::MAX as u32 => return Err(VtfError::argument(format!("forced mip count {} exceeds {}", count, u8::MAX))),
      Some(count) => count,
      None => compute_mip_count(width, height, depth)
    };

    let mut texture = Self {
      width,
      height,
      depth,
      mip_count,
      frame_count,
      face_count: if flags.contains(TextureFlags::ENVMAP) { CUBE_MAP_FACE_COUNT } else { 1 },
      start_frame: if flags.contains(TextureFlags::ENVMAP) { NO_SPHERE_MAP_FRAME } else { 0 },
      format,
      flags,
      ..Self::default()
    };
    let total_size = texture.checked_total_size().ok_or_else(|| VtfError::argument(format!(
      "{}x{}x{} {:?} texture with {} frames is too large", width, height, depth, format, frame_count
    )))?;
    texture.image_data = allocate_zeroed(total_size)?;
    *self = texture;
    Ok(())
  }

  /// Allocates a zeroed low-res image. An unknown format or a zero dimension removes it.
  pub fn init_low_res_image(&mut self, width: u32, height: u32, format: ImageFormat) -> VtfResult<()> {
    if format == ImageFormat::Default {
      return Err(VtfError::argument("the default format can only be used as a conversion target"));
    }
    if width > u8::MAX as u32 || height > u8::MAX as u32 {
      return Err(VtfError::argument(format!("low res dimensions {}x{} exceed {}", width, height, u8::MAX)));
    }
    let size = Thumbnail::byte_size(width, height, format);
    self.low_res = if size == 0 {
      Thumbnail::empty()
    } else {
      Thumbnail {
        data: vec![0u8; size],
        format,
        width,
        height,
        location: LowResLocation::default()
      }
    };
    self.refresh_low_res_location();
    Ok(())
  }

  /// Header size follows version and resource count, the low-res image sits right behind it.
  fn refresh_low_res_location(&mut self) {
    if !self.low_res.is_present() {
      return;
    }
    self.low_res.location = LowResLocation {
      offset: self.layout().low_res_offset as u32,
      size: self.low_res.data.len() as u32
    };
  }

  pub fn version(&self) -> [u32; 2] {
    self.version
  }

  /// Selects the version `serialize` writes.
  pub fn set_version(&mut self, major: u32, minor: u32) -> VtfResult<()> {
    if !is_version_supported([major, minor]) {
      return Err(VtfError::argument(format!("unsupported version {}.{}", major, minor)));
    }
    self.version = [major, minor];
    self.refresh_low_res_location();
    Ok(())
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn depth(&self) -> u32 {
    self.depth
  }

  pub fn mip_count(&self) -> u32 {
    self.mip_count
  }

  pub fn format(&self) -> ImageFormat {
    self.format
  }

  pub fn face_count(&self) -> u32 {
    self.face_count
  }

  pub fn frame_count(&self) -> u32 {
    self.frame_count
  }

  pub fn start_frame(&self) -> u16 {
    self.start_frame
  }

  pub fn flags(&self) -> TextureFlags {
    self.flags
  }

  pub fn bump_scale(&self) -> f32 {
    self.bump_scale
  }

  pub fn set_bump_scale(&mut self, bump_scale: f32) {
    self.bump_scale = bump_scale;
  }

  /// NOTE: reflectivity[0] = blue, [1] = green, [2] = red.
  pub fn reflectivity(&self) -> [f32; 3] {
    self.reflectivity
  }

  pub fn set_reflectivity(&mut self, reflectivity: [f32; 3]) {
    self.reflectivity = reflectivity;
  }

  pub fn alpha_test_threshholds(&self) -> (f32, f32) {
    (self.alpha_test_threshold, self.alpha_test_high_freq_threshold)
  }

  /// Sets threshold values for alpha tested mipmapping.
  pub fn set_alpha_test_threshholds(&mut self, base: f32, high_freq: f32) {
    self.alpha_test_threshold = base;
    self.alpha_test_high_freq_threshold = high_freq;
  }

  pub fn low_res_width(&self) -> u32 {
    self.low_res.width
  }

  pub fn low_res_height(&self) -> u32 {
    self.low_res.height
  }

  pub fn low_res_format(&self) -> ImageFormat {
    self.low_res.format
  }

  /// Offset and size of the low-res image inside the file it was read from,
  /// or inside the file `serialize` would write.
  pub fn low_res_file_info(&self) -> LowResLocation {
    self.low_res.location
  }

  pub fn is_cube_map(&self) -> bool {
    self.flags.contains(TextureFlags::ENVMAP)
  }

  pub fn is_normal_map(&self) -> bool {
    self.flags.contains(TextureFlags::NORMAL)
  }

  pub fn is_volume_texture(&self) -> bool {
    self.depth > 1
  }

  pub fn resources(&self) -> &[ExtraResource] {
    &self.resources
  }

  /// Adds or replaces a resource directory entry. Only stored by 7.3+ files.
  pub fn set_resource(&mut self, resource: ExtraResource) -> VtfResult<()> {
    if matches!(resource.kind(), Resource::Thumbnail | Resource::Image) {
      return Err(VtfError::argument("image resources are managed by the texture"));
    }
    match self.resources.iter_mut().find(|existing| existing.tag == resource.tag) {
      Some(existing) => *existing = resource,
      None => self.resources.push(resource)
    }
    self.refresh_low_res_location();
    Ok(())
  }

  pub fn remove_resource(&mut self, tag: [u8; 3]) -> Option<ExtraResource> {
    let index = self.resources.iter().position(|resource| resource.tag == tag)?;
    let removed = self.resources.remove(index);
    self.refresh_low_res_location();
    Some(removed)
  }

  fn check_mip_level(&self, mip_level: u32) -> VtfResult<()> {
    if mip_level >= self.mip_count {
      return Err(VtfError::argument(format!(
        "texture has no mipmap: miplevel '{}', mipcount '{}'", mip_level, self.mip_count
      )));
    }
    Ok(())
  }

  /// Width, height and depth of a mip level.
  pub fn compute_mip_dimensions(&self, mip_level: u32) -> VtfResult<(u32, u32, u32)> {
    self.check_mip_level(mip_level)?;
    Ok(self.mip_dimensions(mip_level))
  }

  pub fn compute_mip_width(&self, mip_level: u32) -> VtfResult<u32> {
    self.compute_mip_dimensions(mip_level).map(|(width, _, _)| width)
  }

  pub fn compute_mip_height(&self, mip_level: u32) -> VtfResult<u32> {
    self.compute_mip_dimensions(mip_level).map(|(_, height, _)| height)
  }

  pub fn compute_mip_depth(&self, mip_level: u32) -> VtfResult<u32> {
    self.compute_mip_dimensions(mip_level).map(|(_, _, depth)| depth)
  }

  pub(crate) fn mip_dimensions(&self, mip_level: u32) -> (u32, u32, u32) {
    (
      mip_dimension(self.width, mip_level),
      mip_dimension(self.height, mip_level),
      mip_dimension(self.depth, mip_level)
    )
  }

  /// Size of one row of a particular mip level. One row of blocks for compressed formats.
  pub fn row_size_in_bytes(&self, mip_level: u32) -> usize {
    let (width, _, _) = self.mip_dimensions(mip_level);
    calculate_row_size(width, self.format)
  }

  /// Size of one face (a single depth slice) of a particular mip level.
  pub fn face_size_in_bytes(&self, mip_level: u32) -> usize {
    let (_, height, _) = self.mip_dimensions(mip_level);
    self.row_size_in_bytes(mip_level).saturating_mul(calculate_row_count(height, self.format))
  }

  /// Size of a single mipmap of a single face of a single frame, all depth slices included.
  pub fn compute_mip_size(&self, mip_level: u32) -> usize {
    let (width, height, depth) = self.mip_dimensions(mip_level);
    calculate_image_size(width, height, depth, self.format)
  }

  /// Size of a single face of a single frame, counting the mip levels from `starting_mip_level` on.
  /// Like the other size queries it saturates at `usize::MAX`.
  pub fn compute_face_size(&self, starting_mip_level: u32) -> usize {
    (starting_mip_level..self.mip_count)
      .map(|mip_level| self.compute_mip_size(mip_level))
      .fold(0, usize::saturating_add)
  }

  /// Size of all faces of all frames.
  pub fn compute_total_size(&self) -> usize {
    self.checked_total_size().unwrap_or(usize::MAX)
  }

  /// `None` if the image data of this texture could not even be addressed.
  pub(crate) fn checked_total_size(&self) -> Option<usize> {
    let mut face_size = 0usize;
    for mip_level in 0..self.mip_count {
      let (width, height, depth) = self.mip_dimensions(mip_level);
      face_size = face_size.checked_add(checked_image_size(width, height, depth, self.format)?)?;
    }
    face_size
      .checked_mul(self.frame_count as usize)?
      .checked_mul(self.face_count as usize)
  }

  fn check_location(&self, location: &ImageDataLocation) -> VtfResult<()> {
    self.check_mip_level(location.mip_level)?;
    if location.frame >= self.frame_count {
      return Err(VtfError::argument(format!("texture has no frame {}, framecount '{}'", location.frame, self.frame_count)));
    }
    if location.face >= self.face_count {
      return Err(VtfError::argument(format!("texture has no face {}, facecount '{}'", location.face, self.face_count)));
    }
    let (width, height, depth) = self.mip_dimensions(location.mip_level);
    if location.x >= width || location.y >= height || location.z >= depth {
      return Err(VtfError::argument(format!(
        "position ({}, {}, {}) is outside of mip level {} ({}x{}x{})",
        location.x, location.y, location.z, location.mip_level, width, height, depth
      )));
    }
    Ok(())
  }

  /// Byte offset of `location` inside the image data.
  pub fn image_data_offset(&self, location: ImageDataLocation) -> VtfResult<usize> {
    self.check_location(&location)?;
    let face_index = location.frame as usize * self.face_count as usize + location.face as usize;
    let (width, _, _) = self.mip_dimensions(location.mip_level);
    let offset = face_index
      .saturating_mul(self.compute_face_size(0))
      .saturating_add(self.compute_face_size(0).saturating_sub(self.compute_face_size(location.mip_level)))
      .saturating_add((location.z as usize).saturating_mul(self.face_size_in_bytes(location.mip_level)))
      .saturating_add(calculate_pixel_offset(location.x, location.y, width, self.format));
    Ok(offset)
  }

  /// Number of bytes from `location` to the end of the image data, not the size of the addressed slice alone.
  pub fn image_data_size(&self, location: ImageDataLocation) -> VtfResult<usize> {
    let offset = self.image_data_offset(location)?;
    Ok(self.compute_total_size().saturating_sub(offset))
  }

  fn check_image_data(&self) -> VtfResult<()> {
    if self.image_data.is_empty() {
      return Err(VtfError::argument("texture has no image data"));
    }
    Ok(())
  }

  /// The image data from `location` to the end of the buffer.
  pub fn image_data(&self, location: ImageDataLocation) -> VtfResult<&[u8]> {
    self.check_image_data()?;
    let offset = self.image_data_offset(location)?;
    Ok(&self.image_data[offset..])
  }

  pub fn image_data_mut(&mut self, location: ImageDataLocation) -> VtfResult<&mut [u8]> {
    self.check_image_data()?;
    let offset = self.image_data_offset(location)?;
    Ok(&mut self.image_data[offset..])
  }

  /// Copies the image data from `location` to the end of the buffer.
  pub fn get_image_data(&self, location: ImageDataLocation) -> VtfResult<Vec<u8>> {
    self.image_data(location).map(|data| data.to_vec())
  }

  /// Copies `data` into the image data starting at `location`. Fails without touching
  /// the buffer if `data` does not fit into the remaining bytes.
  pub fn set_image_data(&mut self, data: &[u8], location: ImageDataLocation) -> VtfResult<()> {
    let target = self.image_data_mut(location)?;
    if data.len() > target.len() {
      return Err(VtfError::argument(format!(
        "image data exceeds maximum length: data '{}', max '{}'", data.len(), target.len()
      )));
    }
    target[..data.len()].copy_from_slice(data);
    Ok(())
  }

  fn check_low_res_image_data(&self) -> VtfResult<()> {
    if !self.low_res.is_present() {
      return Err(VtfError::argument("texture has no low res image data"));
    }
    Ok(())
  }

  pub fn low_res_image_data_size(&self) -> VtfResult<usize> {
    self.check_low_res_image_data()?;
    Ok(self.low_res.data.len())
  }

  pub fn low_res_image_data(&self) -> VtfResult<&[u8]> {
    self.check_low_res_image_data()?;
    Ok(&self.low_res.data)
  }

  pub fn get_low_res_image_data(&self) -> VtfResult<Vec<u8>> {
    self.low_res_image_data().map(|data| data.to_vec())
  }

  pub fn set_low_res_image_data(&mut self, data: &[u8]) -> VtfResult<()> {
    let max_size = self.low_res_image_data_size()?;
    if data.len() > max_size {
      return Err(VtfError::argument(format!(
        "image data exceeds maximum length: data '{}', max '{}'", data.len(), max_size
      )));
    }
    self.low_res.data[..data.len()].copy_from_slice(data);
    Ok(())
  }

  /// Copies one mip level of every frame, face and depth slice.
  pub fn mip_map(&self, mip_level: u32) -> VtfResult<MipMap> {
    self.check_mip_level(mip_level)?;
    self.check_image_data()?;
    let (width, height, depth) = self.mip_dimensions(mip_level);
    let slice_size = self.face_size_in_bytes(mip_level);

    let mut frames = Vec::<Frame>::with_capacity(self.frame_count as usize);
    for frame in 0..self.frame_count {
      let mut faces = Vec::<Face>::with_capacity(self.face_count as usize);
      for face in 0..self.face_count {
        let mut slices = Vec::<Slice>::with_capacity(depth as usize);
        for z in 0..depth {
          let offset = self.image_data_offset(ImageDataLocation::new(frame, face, mip_level).at(0, 0, z))?;
          slices.push(Slice {
            data: self.image_data[offset..offset + slice_size].into()
          });
        }
        faces.push(Face {
          slices
        });
      }
      frames.push(Frame {
        faces
      });
    }

    Ok(MipMap {
      frames,
      format: self.format,
      width,
      height,
      depth
    })
  }
}
