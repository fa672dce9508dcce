use std::cmp::min;
use std::io::{Cursor, Seek, SeekFrom};

use io_util::{PrimitiveRead, PrimitiveWrite};

use crate::error::{VtfError, VtfResult};
use crate::header::{struct_size, version_at_least, Header, EXPECTED_SIGNATURE, NO_SPHERE_MAP_FRAME};
use crate::image_format::{is_image_format_supported, ImageFormat};
use crate::resource::{
  ExtraResource, Resource, ResourceData, ResourceEntry, HIGH_RES_IMAGE_TAG, LOW_RES_IMAGE_TAG, RESOURCE_ENTRY_SIZE,
  RESOURCE_FLAG_NO_DATA_CHUNK
};
use crate::texture::{allocate_zeroed, ImageDataLocation, VtfTexture, CUBE_MAP_FACE_COUNT, DEFAULT_ALPHA_TEST_THRESHOLD};
use crate::texture_flags::TextureFlags;
use crate::thumbnail::{LowResLocation, Thumbnail};

/// Minor version from which cube maps no longer store a sphere map face.
const MIN_MINOR_VERSION_WITHOUT_SPHERE_MAP: u32 = 5;

/// Controls how `VtfTexture::deserialize` decodes a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadOptions {
  /// Only parse the header, leave image data empty.
  pub header_only: bool,
  /// Number of the largest mip levels to drop. The largest loaded level becomes the new base size.
  pub skip_mip_levels: u32,
  /// Read a minor version of 5 as 4.
  pub header_fixup: bool
}

impl Default for ReadOptions {
  fn default() -> Self {
    Self {
      header_only: false,
      skip_mip_levels: 0,
      header_fixup: true
    }
  }
}

impl ReadOptions {
  pub fn header_only() -> Self {
    Self {
      header_only: true,
      ..Default::default()
    }
  }
}

/// Where each part of an encoded texture goes.
pub(crate) struct FileLayout {
  pub(crate) header_size: usize,
  pub(crate) low_res_offset: usize,
  /// Offsets of the data chunks of `VtfTexture::resources`, 0 for inline ones.
  pub(crate) chunk_offsets: Vec<usize>,
  pub(crate) image_offset: usize,
  pub(crate) file_size: usize
}

impl VtfTexture {
  fn has_resource_directory(&self) -> bool {
    version_at_least(self.version, 7, 3)
  }

  fn directory_entry_count(&self) -> usize {
    if !self.has_resource_directory() {
      return 0;
    }
    let low_res_entries = if self.low_res.is_present() { 1 } else { 0 };
    low_res_entries + 1 + self.resources.len()
  }

  pub(crate) fn layout(&self) -> FileLayout {
    let header_size = struct_size(self.version) as usize + self.directory_entry_count() * RESOURCE_ENTRY_SIZE as usize;
    let low_res_offset = header_size;
    let mut offset = low_res_offset + self.low_res.data.len();
    let mut chunk_offsets = Vec::with_capacity(self.resources.len());
    for resource in &self.resources {
      if self.has_resource_directory() && resource.chunk_size() > 0 {
        chunk_offsets.push(offset);
        offset += resource.chunk_size();
      } else {
        chunk_offsets.push(0);
      }
    }
    let image_offset = offset;
    FileLayout {
      header_size,
      low_res_offset,
      chunk_offsets,
      image_offset,
      file_size: image_offset.saturating_add(self.compute_total_size())
    }
  }

  /// Number of bytes `serialize` writes, leaving out the `mip_skip_count` largest mip levels.
  pub fn file_size(&self, mip_skip_count: u32) -> usize {
    let skip = min(mip_skip_count, self.mip_count.saturating_sub(1));
    let layout = self.layout();
    let image_size = self.compute_face_size(skip)
      .saturating_mul(self.frame_count as usize)
      .saturating_mul(self.face_count as usize);
    layout.image_offset.saturating_add(image_size)
  }

  /// Decodes a texture. `bytes` is never modified, the minor version fixup only affects the parsed header.
  pub fn deserialize(bytes: &[u8], options: &ReadOptions) -> VtfResult<Self> {
    let header = Header::read(bytes, options.header_fixup)?;
    if header.width == 0 || header.height == 0 {
      return Err(VtfError::format(format!("invalid dimensions {}x{}", header.width, header.height)));
    }
    if header.mipmap_count == 0 {
      return Err(VtfError::format("texture has no mip levels"));
    }
    if header.frames == 0 {
      return Err(VtfError::format("texture has no frames"));
    }

    let is_cube_map = header.flags.contains(TextureFlags::ENVMAP);
    let face_count = if is_cube_map { CUBE_MAP_FACE_COUNT } else { 1 };
    let stored_face_count = if is_cube_map
      && header.version[1] < MIN_MINOR_VERSION_WITHOUT_SPHERE_MAP
      && header.first_frame != NO_SPHERE_MAP_FRAME {
      CUBE_MAP_FACE_COUNT + 1
    } else {
      face_count
    };

    let low_res_size = if is_image_format_supported(header.low_res_image_format) {
      Thumbnail::byte_size(header.low_res_image_width as u32, header.low_res_image_height as u32, header.low_res_image_format)
    } else {
      0
    };

    let mut low_res_offset = header.header_size as usize;
    let mut image_offset = None;
    let mut resources = Vec::new();
    if version_at_least(header.version, 7, 3) {
      for entry in &header.resources {
        match Resource::from_tag(entry.tag) {
          Resource::Thumbnail => low_res_offset = entry.data as usize,
          Resource::Image => image_offset = Some(entry.data as usize),
          _ if options.header_only => {},
          _ => resources.push(read_extra_resource(bytes, entry)?)
        }
      }
    } else {
      image_offset = Some(low_res_offset + low_res_size);
    }

    let mut texture = VtfTexture {
      version: header.version,
      width: header.width as u32,
      height: header.height as u32,
      depth: (header.depth as u32).max(1),
      mip_count: header.mipmap_count as u32,
      frame_count: header.frames as u32,
      face_count,
      start_frame: header.first_frame,
      format: header.high_res_image_format,
      flags: header.flags,
      bump_scale: header.bumpmap_scale,
      reflectivity: header.reflectivity,
      alpha_test_threshold: DEFAULT_ALPHA_TEST_THRESHOLD,
      alpha_test_high_freq_threshold: DEFAULT_ALPHA_TEST_THRESHOLD,
      image_data: Vec::new(),
      low_res: Thumbnail {
        data: Vec::new(),
        format: header.low_res_image_format,
        width: header.low_res_image_width as u32,
        height: header.low_res_image_height as u32,
        location: if low_res_size > 0 {
          LowResLocation {
            offset: low_res_offset as u32,
            size: low_res_size as u32
          }
        } else {
          LowResLocation::default()
        }
      },
      resources
    };

    if texture.checked_total_size().is_none() {
      return Err(VtfError::format(format!(
        "{}x{}x{} texture with {} frames and {} faces is too large",
        texture.width, texture.height, texture.depth, texture.frame_count, texture.face_count
      )));
    }

    if options.header_only {
      return Ok(texture);
    }

    if low_res_size > 0 {
      texture.low_res.data = read_range(bytes, low_res_offset, low_res_size, "low res image")?.to_vec();
    }

    let image_offset = image_offset.ok_or_else(|| VtfError::format("resource dictionary has no high res image"))?;
    texture.read_image_data(bytes, image_offset, stored_face_count, options.skip_mip_levels)?;

    debug!(
      "Read {}x{}x{} {:?} texture, version {}.{}, {} mips, {} frames, {} faces",
      texture.width, texture.height, texture.depth, texture.format, texture.version[0], texture.version[1],
      texture.mip_count, texture.frame_count, texture.face_count
    );
    Ok(texture)
  }

  /// Reads the high res mip chain. On disk the smallest mip comes first, each mip holds
  /// all frames, each frame all stored faces, each face all depth slices.
  fn read_image_data(&mut self, bytes: &[u8], image_offset: usize, stored_face_count: u32, skip_mip_levels: u32) -> VtfResult<()> {
    let skip = min(skip_mip_levels, self.mip_count - 1);
    if skip != skip_mip_levels {
      warn!("Can't skip {} of {} mip levels, skipping {}", skip_mip_levels, self.mip_count, skip);
    }
    if stored_face_count > self.face_count {
      warn!("Dropping the sphere map face of a version {}.{} cube map", self.version[0], self.version[1]);
    }

    let stored_mip_count = self.mip_count;
    let (width, height, depth) = self.mip_dimensions(skip);
    self.width = width;
    self.height = height;
    self.depth = depth;
    self.mip_count = stored_mip_count - skip;

    // Check the payload is there before allocating what the header asks for.
    let stored_size = self.compute_face_size(0)
      .checked_mul(self.frame_count as usize)
      .and_then(|size| size.checked_mul(stored_face_count as usize))
      .ok_or_else(|| VtfError::format("high res image is too large"))?;
    read_range(bytes, image_offset, stored_size, "high res image")?;
    self.image_data = allocate_zeroed(self.compute_total_size())?;

    let mut offset = image_offset;
    for mip_level in (0..self.mip_count).rev() {
      let mip_size = self.compute_mip_size(mip_level);
      for frame in 0..self.frame_count {
        for face in 0..stored_face_count {
          let source = read_range(bytes, offset, mip_size, "high res image")?;
          offset += mip_size;
          if face >= self.face_count {
            continue;
          }
          let target = self.image_data_offset(ImageDataLocation::new(frame, face, mip_level))?;
          self.image_data[target..target + mip_size].copy_from_slice(source);
        }
      }
    }
    Ok(())
  }

  fn check_serializable(&self) -> VtfResult<()> {
    let total_size = self.compute_total_size();
    if self.image_data.len() < total_size {
      return Err(VtfError::format(format!(
        "image data has {} bytes but the texture needs {}", self.image_data.len(), total_size
      )));
    }
    if self.low_res.is_present() && self.low_res.data.len() != Thumbnail::byte_size(self.low_res.width, self.low_res.height, self.low_res.format) {
      return Err(VtfError::format("low res image data does not match its dimensions"));
    }
    if self.depth > 1 && !version_at_least(self.version, 7, 2) {
      return Err(VtfError::format(format!(
        "version {}.{} can't store volume textures", self.version[0], self.version[1]
      )));
    }
    if self.width > u16::MAX as u32 || self.height > u16::MAX as u32 || self.depth > u16::MAX as u32 || self.frame_count > u16::MAX as u32 {
      return Err(VtfError::format("texture dimensions exceed the file format limits"));
    }
    if self.mip_count > u8::MAX as u32 || self.low_res.width > u8::MAX as u32 || self.low_res.height > u8::MAX as u32 {
      return Err(VtfError::format("mip count or low res dimensions exceed the file format limits"));
    }
    Ok(())
  }

  fn build_header(&self, layout: &FileLayout) -> Header {
    let mut resources = Vec::new();
    if self.has_resource_directory() {
      if self.low_res.is_present() {
        resources.push(ResourceEntry { tag: LOW_RES_IMAGE_TAG, flags: 0, data: layout.low_res_offset as u32 });
      }
      resources.push(ResourceEntry { tag: HIGH_RES_IMAGE_TAG, flags: 0, data: layout.image_offset as u32 });
      for (resource, chunk_offset) in self.resources.iter().zip(layout.chunk_offsets.iter()) {
        let data = match &resource.data {
          ResourceData::Inline(value) => *value,
          ResourceData::Chunk(_) => *chunk_offset as u32
        };
        resources.push(ResourceEntry { tag: resource.tag, flags: resource.flags, data });
      }
    }

    // Older readers expect a seventh sphere map face unless the first frame says otherwise.
    let first_frame = if self.is_cube_map() && self.version[1] < MIN_MINOR_VERSION_WITHOUT_SPHERE_MAP {
      NO_SPHERE_MAP_FRAME
    } else {
      self.start_frame
    };

    let (low_res_format, low_res_width, low_res_height) = if self.low_res.is_present() {
      (self.low_res.format, self.low_res.width as u8, self.low_res.height as u8)
    } else {
      (ImageFormat::Unknown, 0u8, 0u8)
    };

    Header {
      signature: EXPECTED_SIGNATURE,
      version: self.version,
      header_size: layout.header_size as u32,
      width: self.width as u16,
      height: self.height as u16,
      flags: self.flags,
      frames: self.frame_count as u16,
      first_frame,
      reflectivity: self.reflectivity,
      bumpmap_scale: self.bump_scale,
      high_res_image_format: self.format,
      mipmap_count: self.mip_count as u8,
      low_res_image_format: low_res_format,
      low_res_image_width: low_res_width,
      low_res_image_height: low_res_height,
      depth: self.depth as u16,
      resources
    }
  }

  /// Encodes the texture in its current version.
  pub fn serialize(&self) -> VtfResult<Vec<u8>> {
    self.check_serializable()?;
    if !self.has_resource_directory() && !self.resources.is_empty() {
      warn!(
        "Version {}.{} has no resource directory, dropping {} resources",
        self.version[0], self.version[1], self.resources.len()
      );
    }

    let layout = self.layout();
    let mut data = Vec::new();
    data.try_reserve_exact(layout.file_size)?;

    self.build_header(&layout).write(&mut data)?;
    data.extend_from_slice(&self.low_res.data);
    if self.has_resource_directory() {
      for resource in &self.resources {
        if let ResourceData::Chunk(chunk) = &resource.data {
          data.write_u32(chunk.len() as u32)?;
          data.extend_from_slice(chunk);
        }
      }
    }
    debug_assert_eq!(data.len(), layout.image_offset);

    for mip_level in (0..self.mip_count).rev() {
      let mip_size = self.compute_mip_size(mip_level);
      for frame in 0..self.frame_count {
        for face in 0..self.face_count {
          let offset = self.image_data_offset(ImageDataLocation::new(frame, face, mip_level))?;
          data.extend_from_slice(&self.image_data[offset..offset + mip_size]);
        }
      }
    }

    debug!(
      "Wrote {}x{}x{} {:?} texture, version {}.{}, {} bytes",
      self.width, self.height, self.depth, self.format, self.version[0], self.version[1], data.len()
    );
    Ok(data)
  }
}

fn read_range<'a>(bytes: &'a [u8], offset: usize, size: usize, what: &str) -> VtfResult<&'a [u8]> {
  offset
    .checked_add(size)
    .filter(|end| *end <= bytes.len())
    .map(|end| &bytes[offset..end])
    .ok_or_else(|| VtfError::format(format!(
      "{} needs {} bytes at offset {} but the buffer has {} bytes", what, size, offset, bytes.len()
    )))
}

fn read_extra_resource(bytes: &[u8], entry: &ResourceEntry) -> VtfResult<ExtraResource> {
  if entry.flags & RESOURCE_FLAG_NO_DATA_CHUNK != 0 {
    return Ok(ExtraResource {
      tag: entry.tag,
      flags: entry.flags,
      data: ResourceData::Inline(entry.data)
    });
  }

  let mut reader = Cursor::new(bytes);
  reader.seek(SeekFrom::Start(entry.data as u64))?;
  let size = reader.read_u32().map_err(|_| VtfError::format(format!("resource {:?} points past the end of the file", entry.tag)))? as usize;
  let data = read_range(bytes, entry.data as usize + 4, size, "resource data")?;
  Ok(ExtraResource {
    tag: entry.tag,
    flags: entry.flags,
    data: ResourceData::Chunk(data.into())
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::header::MINOR_VERSION_OFFSET;
  use crate::resource::{CRC_TAG, KEY_VALUES_TAG};

  fn gradient(texture: &mut VtfTexture) {
    for (i, byte) in texture.image_data.iter_mut().enumerate() {
      *byte = (i % 251) as u8;
    }
  }

  fn sample(format: ImageFormat, flags: TextureFlags, frames: u32) -> VtfTexture {
    let mut texture = VtfTexture::create(64, 32, 1, format, flags, frames, None).unwrap();
    gradient(&mut texture);
    texture.set_bump_scale(1.5);
    texture.set_reflectivity([0.1, 0.2, 0.3]);
    texture
  }

  #[test]
  fn round_trip_preserves_everything() {
    let mut texture = sample(ImageFormat::RGBA8888, TextureFlags::TRILINEAR, 3);
    texture.init_low_res_image(16, 8, ImageFormat::DXT1).unwrap();
    texture.set_low_res_image_data(&[0x5Au8; 64]).unwrap();
    let bytes = texture.serialize().unwrap();
    assert_eq!(bytes.len(), texture.file_size(0));

    let decoded = VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap();
    assert_eq!(decoded, texture);
    assert_eq!(decoded.reflectivity(), [0.1, 0.2, 0.3]);
    assert_eq!(decoded.low_res_file_info(), texture.low_res_file_info());
  }

  #[test]
  fn round_trip_for_every_version() {
    for minor in 0..=5 {
      let mut texture = sample(ImageFormat::DXT5, TextureFlags::empty(), 1);
      texture.set_version(7, minor).unwrap();
      texture.init_low_res_image(8, 4, ImageFormat::DXT1).unwrap();
      let bytes = texture.serialize().unwrap();
      let options = ReadOptions { header_fixup: false, ..Default::default() };
      let decoded = VtfTexture::deserialize(&bytes, &options).unwrap();
      assert_eq!(decoded, texture, "version 7.{}", minor);
    }
  }

  #[test]
  fn legacy_layout_places_low_res_after_header() {
    let mut texture = sample(ImageFormat::RGB888, TextureFlags::empty(), 1);
    texture.set_version(7, 2).unwrap();
    texture.init_low_res_image(4, 4, ImageFormat::RGB888).unwrap();
    texture.set_low_res_image_data(&[0xEEu8; 48]).unwrap();
    let bytes = texture.serialize().unwrap();
    assert_eq!(u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]), 80);
    assert_eq!(&bytes[80..128], &[0xEEu8; 48][..]);
    // Smallest mip first.
    assert_eq!(&bytes[128..131], &texture.image_data[texture.image_data.len() - 3..]);
  }

  #[test]
  fn resource_directory_locates_payloads() {
    let mut texture = sample(ImageFormat::BGRA8888, TextureFlags::empty(), 1);
    texture.set_version(7, 3).unwrap();
    texture.set_resource(ExtraResource::inline(CRC_TAG, 0xC0FFEE)).unwrap();
    texture.set_resource(ExtraResource::chunk(KEY_VALUES_TAG, b"\"key\" \"value\"".to_vec().into_boxed_slice())).unwrap();
    texture.init_low_res_image(4, 4, ImageFormat::BGRA8888).unwrap();
    let bytes = texture.serialize().unwrap();

    let header = Header::read(&bytes, true).unwrap();
    assert_eq!(header.resources.len(), 4);
    assert_eq!(header.header_size, 80 + 4 * 8);
    assert_eq!(header.resources[0].tag, LOW_RES_IMAGE_TAG);
    assert_eq!(header.resources[0].data, 112);

    let decoded = VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap();
    assert_eq!(decoded.resources(), texture.resources());
    assert_eq!(decoded, texture);
  }

  #[test]
  fn pre_directory_versions_drop_resources() {
    let mut texture = sample(ImageFormat::RGBA8888, TextureFlags::empty(), 1);
    texture.set_version(7, 2).unwrap();
    texture.set_resource(ExtraResource::inline(CRC_TAG, 1)).unwrap();
    let bytes = texture.serialize().unwrap();
    let decoded = VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap();
    assert!(decoded.resources().is_empty());
    assert_eq!(decoded.image_data, texture.image_data);
  }

  #[test]
  fn legacy_minor_version_is_fixed_up() {
    let mut texture = sample(ImageFormat::RGBA8888, TextureFlags::empty(), 1);
    texture.set_version(7, 5).unwrap();
    let bytes = texture.serialize().unwrap();
    assert_eq!(bytes[MINOR_VERSION_OFFSET], 5);

    let fixed = VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap();
    assert_eq!(fixed.version(), [7, 4]);
    assert_eq!(bytes[MINOR_VERSION_OFFSET], 5);

    let options = ReadOptions { header_fixup: false, ..Default::default() };
    assert_eq!(VtfTexture::deserialize(&bytes, &options).unwrap().version(), [7, 5]);
  }

  #[test]
  fn header_only_matches_full_read() {
    let mut texture = sample(ImageFormat::DXT1, TextureFlags::CLAMPS | TextureFlags::CLAMPT, 2);
    texture.init_low_res_image(16, 8, ImageFormat::DXT1).unwrap();
    let bytes = texture.serialize().unwrap();

    let full = VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap();
    let header_only = VtfTexture::deserialize(&bytes[..200], &ReadOptions::header_only()).unwrap();
    assert!(header_only.image_data.is_empty());
    assert!(header_only.low_res.data.is_empty());
    assert_eq!(header_only.width(), full.width());
    assert_eq!(header_only.height(), full.height());
    assert_eq!(header_only.mip_count(), full.mip_count());
    assert_eq!(header_only.frame_count(), full.frame_count());
    assert_eq!(header_only.flags(), full.flags());
    assert_eq!(header_only.format(), full.format());
    assert_eq!(header_only.bump_scale(), full.bump_scale());
    assert_eq!(header_only.reflectivity(), full.reflectivity());
    assert_eq!(header_only.low_res_file_info(), full.low_res_file_info());
    assert_eq!(header_only.compute_total_size(), full.compute_total_size());
    assert_eq!(header_only.image_data_size(ImageDataLocation::default()).unwrap(), full.compute_total_size());
    assert!(header_only.get_image_data(ImageDataLocation::default()).is_err());
  }

  #[test]
  fn skipping_mip_levels_shrinks_the_texture() {
    let texture = sample(ImageFormat::RGBA8888, TextureFlags::empty(), 2);
    let bytes = texture.serialize().unwrap();
    let options = ReadOptions { skip_mip_levels: 2, ..Default::default() };
    let decoded = VtfTexture::deserialize(&bytes, &options).unwrap();
    assert_eq!(decoded.width(), 16);
    assert_eq!(decoded.height(), 8);
    assert_eq!(decoded.mip_count(), texture.mip_count() - 2);
    for frame in 0..2 {
      let expected = texture.mip_map(2).unwrap();
      let actual = decoded.mip_map(0).unwrap();
      assert_eq!(actual.frames[frame].faces[0].slices[0].data, expected.frames[frame].faces[0].slices[0].data);
    }
  }

  #[test]
  fn skipped_mips_do_not_have_to_be_present() {
    let texture = sample(ImageFormat::RGBA8888, TextureFlags::empty(), 1);
    let bytes = texture.serialize().unwrap();
    let options = ReadOptions { skip_mip_levels: 1, ..Default::default() };
    let truncated = &bytes[..texture.file_size(1)];
    assert_eq!(VtfTexture::deserialize(truncated, &options).unwrap().width(), 32);
    assert!(matches!(VtfTexture::deserialize(truncated, &ReadOptions::default()), Err(VtfError::Format(_))));
  }

  #[test]
  fn skip_is_clamped_to_the_smallest_mip() {
    let texture = sample(ImageFormat::RGBA8888, TextureFlags::empty(), 1);
    let bytes = texture.serialize().unwrap();
    let options = ReadOptions { skip_mip_levels: 40, ..Default::default() };
    let decoded = VtfTexture::deserialize(&bytes, &options).unwrap();
    assert_eq!(decoded.mip_count(), 1);
    assert_eq!((decoded.width(), decoded.height()), (1, 1));
  }

  #[test]
  fn truncated_payload_is_a_format_error() {
    let texture = sample(ImageFormat::RGBA8888, TextureFlags::empty(), 1);
    let bytes = texture.serialize().unwrap();
    let result = VtfTexture::deserialize(&bytes[..bytes.len() - 1], &ReadOptions::default());
    assert!(matches!(result, Err(VtfError::Format(_))));
    assert!(matches!(VtfTexture::deserialize(&bytes[..10], &ReadOptions::default()), Err(VtfError::Format(_))));
  }

  #[test]
  fn cube_maps_round_trip_and_skip_sphere_maps() {
    let mut texture = VtfTexture::create(4, 4, 1, ImageFormat::RGBA8888, TextureFlags::ENVMAP, 1, None).unwrap();
    gradient(&mut texture);
    texture.set_version(7, 2).unwrap();
    let bytes = texture.serialize().unwrap();
    assert_eq!(VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap(), texture);

    // Same texture with an extra face per mip, flagged as carrying a sphere map.
    let mut legacy = Vec::new();
    let mut header = Header::read(&bytes, true).unwrap();
    header.first_frame = 0;
    header.write(&mut legacy).unwrap();
    for mip_level in (0..texture.mip_count()).rev() {
      let mip_size = texture.compute_mip_size(mip_level);
      for face in 0..6 {
        let offset = texture.image_data_offset(ImageDataLocation::new(0, face, mip_level)).unwrap();
        legacy.extend_from_slice(&texture.image_data[offset..offset + mip_size]);
      }
      legacy.extend(std::iter::repeat(0xFFu8).take(mip_size));
    }
    let decoded = VtfTexture::deserialize(&legacy, &ReadOptions::default()).unwrap();
    assert_eq!(decoded.face_count(), 6);
    assert_eq!(decoded.image_data, texture.image_data);
  }

  #[test]
  fn volume_textures_need_version_7_2() {
    let mut texture = VtfTexture::create(8, 8, 4, ImageFormat::RGBA8888, TextureFlags::empty(), 1, None).unwrap();
    gradient(&mut texture);
    let bytes = texture.serialize().unwrap();
    assert_eq!(VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap(), texture);

    texture.set_version(7, 1).unwrap();
    assert!(matches!(texture.serialize(), Err(VtfError::Format(_))));
  }

  #[test]
  fn inconsistent_texture_does_not_serialize() {
    let mut texture = sample(ImageFormat::RGBA8888, TextureFlags::empty(), 1);
    texture.image_data.truncate(10);
    assert!(matches!(texture.serialize(), Err(VtfError::Format(_))));
  }

  fn huge_header(frames: u16, mipmap_count: u8, flags: TextureFlags) -> Vec<u8> {
    let header = Header {
      signature: EXPECTED_SIGNATURE,
      version: [7, 2],
      header_size: struct_size([7, 2]),
      width: u16::MAX,
      height: u16::MAX,
      flags,
      frames,
      first_frame: NO_SPHERE_MAP_FRAME,
      reflectivity: [0.0; 3],
      bumpmap_scale: 1.0,
      high_res_image_format: ImageFormat::RGBA32323232F,
      mipmap_count,
      low_res_image_format: ImageFormat::Unknown,
      low_res_image_width: 0,
      low_res_image_height: 0,
      depth: u16::MAX,
      resources: Vec::new()
    };
    let mut bytes = Vec::new();
    header.write(&mut bytes).unwrap();
    bytes
  }

  #[test]
  fn unaddressable_texture_is_a_format_error() {
    let bytes = huge_header(u16::MAX, 17, TextureFlags::ENVMAP);
    assert_eq!(bytes.len(), 80);
    assert!(matches!(VtfTexture::deserialize(&bytes, &ReadOptions::default()), Err(VtfError::Format(_))));
    assert!(matches!(VtfTexture::deserialize(&bytes, &ReadOptions::header_only()), Err(VtfError::Format(_))));
  }

  #[test]
  #[cfg(target_pointer_width = "64")]
  fn huge_texture_without_payload_is_not_allocated() {
    let bytes = huge_header(3000, 1, TextureFlags::empty());
    assert!(matches!(VtfTexture::deserialize(&bytes, &ReadOptions::default()), Err(VtfError::Format(_))));

    let header_only = VtfTexture::deserialize(&bytes, &ReadOptions::header_only()).unwrap();
    let expected = 3000 * 65535u128.pow(3) * 16;
    assert_eq!(header_only.compute_total_size() as u128, expected);
    assert_eq!(header_only.file_size(0) as u128, 80 + expected);
  }

  #[test]
  fn low_res_location_follows_the_resource_directory() {
    let mut texture = VtfTexture::create(8, 8, 1, ImageFormat::RGBA8888, TextureFlags::empty(), 1, None).unwrap();
    gradient(&mut texture);
    texture.init_low_res_image(4, 4, ImageFormat::RGBA8888).unwrap();
    assert_eq!(texture.low_res_file_info(), LowResLocation { offset: 96, size: 64 });

    texture.set_resource(ExtraResource::inline(CRC_TAG, 7)).unwrap();
    assert_eq!(texture.low_res_file_info().offset, 104);
    let decoded = VtfTexture::deserialize(&texture.serialize().unwrap(), &ReadOptions::default()).unwrap();
    assert_eq!(decoded, texture);

    texture.remove_resource(CRC_TAG).unwrap();
    assert_eq!(texture.low_res_file_info().offset, 96);
    texture.set_version(7, 2).unwrap();
    assert_eq!(texture.low_res_file_info().offset, 80);
    let decoded = VtfTexture::deserialize(&texture.serialize().unwrap(), &ReadOptions::default()).unwrap();
    assert_eq!(decoded, texture);
  }

  #[test]
  fn file_size_counts_skipped_mips() {
    let texture = sample(ImageFormat::RGBA8888, TextureFlags::empty(), 1);
    let full = texture.file_size(0);
    assert_eq!(full - texture.file_size(1), 64 * 32 * 4);
    assert_eq!(full, texture.serialize().unwrap().len());
  }
}
