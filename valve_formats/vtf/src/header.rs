use std::io::{Cursor, Seek, SeekFrom};

use io_util::{PrimitiveRead, PrimitiveWrite};

use crate::error::{VtfError, VtfResult};
use crate::image_format::ImageFormat;
use crate::resource::{ResourceEntry, MAX_RESOURCE_ENTRIES, RESOURCE_ENTRY_SIZE};
use crate::texture_flags::TextureFlags;

const SIZE_73: u32 = 80;
const SIZE_72: u32 = 80;
const SIZE_71: u32 = 64;

/// Signature, major version, minor version and header size.
const VERSION_PREFIX_SIZE: usize = 16;

pub const EXPECTED_SIGNATURE: u32 = 0x00465456;
pub const CURRENT_VERSION: [u32; 2] = [7, 4];
pub const MAX_MINOR_VERSION: u32 = 5;

/// Byte offset of the minor version inside the file.
pub const MINOR_VERSION_OFFSET: usize = 8;
const LEGACY_MINOR_VERSION: u8 = 5;
const FIXED_MINOR_VERSION: u8 = 4;

/// Stored in `first_frame` of cube maps that do not carry a sphere map face.
pub const NO_SPHERE_MAP_FRAME: u16 = 0xFFFF;

#[derive(Clone, Debug, PartialEq)]
pub struct Header {
  /// "VTF\0"
  pub signature: u32,
  /// version[0].version[1]
  pub version: [u32; 2],
  /// Size of the header struct + size of the resources dictionary (7.3+).
  pub header_size: u32,
  /// Width of the largest mipmap in pixels.
  pub width: u16,
  /// Height of the largest mipmap in pixels.
  pub height: u16,
  pub flags: TextureFlags,
  /// Number of frames, if animated (1 for no animation).
  pub frames: u16,
  /// First frame in animation (0 based).
  pub first_frame: u16,
  /// Blue, green, red. In that order.
  pub reflectivity: [f32; 3],
  pub bumpmap_scale: f32,
  pub high_res_image_format: ImageFormat,
  pub mipmap_count: u8,
  pub low_res_image_format: ImageFormat,
  pub low_res_image_width: u8,
  pub low_res_image_height: u8,

  // 7.2+
  /// Depth of the largest mipmap in pixels. Can be 0 or 1 for a 2D texture (v7.2 only).
  pub depth: u16,

  // 7.3+
  pub resources: Vec<ResourceEntry>
}

pub(crate) fn version_at_least(version: [u32; 2], major: u32, minor: u32) -> bool {
  version[0] > major || version[0] == major && version[1] >= minor
}

pub(crate) fn is_version_supported(version: [u32; 2]) -> bool {
  version[0] == 7 && version[1] <= MAX_MINOR_VERSION
}

/// Size of the fixed header struct, without the resource dictionary.
pub(crate) fn struct_size(version: [u32; 2]) -> u32 {
  if version_at_least(version, 7, 3) {
    SIZE_73
  } else if version_at_least(version, 7, 2) {
    SIZE_72
  } else {
    SIZE_71
  }
}

/// Largest header a file of the given version can have. `None` picks the current version.
pub fn header_size(major_version: Option<u32>, minor_version: Option<u32>) -> Option<u32> {
  let version = [
    major_version.unwrap_or(CURRENT_VERSION[0]),
    minor_version.unwrap_or(CURRENT_VERSION[1])
  ];
  if !is_version_supported(version) {
    return None;
  }
  if version_at_least(version, 7, 3) {
    Some(SIZE_73 + MAX_RESOURCE_ENTRIES * RESOURCE_ENTRY_SIZE)
  } else {
    Some(struct_size(version))
  }
}

fn read_format(raw: i32, what: &str) -> VtfResult<ImageFormat> {
  ImageFormat::from_raw(raw).ok_or_else(|| VtfError::format(format!("unknown {} image format {}", what, raw)))
}

impl Header {
  pub(super) fn check_file(data: &[u8]) -> bool {
    data.len() >= 4 && u32::from_le_bytes([data[0], data[1], data[2], data[3]]) == EXPECTED_SIGNATURE
  }

  /// Parses the header at the start of `data`. With `header_fixup`, a minor version byte of 5 is read as 4.
  pub fn read(data: &[u8], header_fixup: bool) -> VtfResult<Self> {
    if data.len() < VERSION_PREFIX_SIZE {
      return Err(VtfError::format(format!("{} bytes is too short for a texture header", data.len())));
    }
    let mut reader = Cursor::new(data);
    let signature = reader.read_u32()?;
    if signature != EXPECTED_SIGNATURE {
      return Err(VtfError::format("File is not a VTF file"));
    }
    let major = reader.read_u32()?;
    let mut minor = reader.read_u32()?;
    if header_fixup && data[MINOR_VERSION_OFFSET] == LEGACY_MINOR_VERSION {
      minor = (minor & !0xFF) | FIXED_MINOR_VERSION as u32;
    }
    let version = [major, minor];
    if !is_version_supported(version) {
      return Err(VtfError::format(format!("unsupported version {}.{}", major, minor)));
    }
    let fixed_size = struct_size(version);
    if data.len() < fixed_size as usize {
      return Err(VtfError::format(format!(
        "{} bytes is too short for a version {}.{} header of {} bytes", data.len(), major, minor, fixed_size
      )));
    }

    let header_size = reader.read_u32()?;
    let width = reader.read_u16()?;
    let height = reader.read_u16()?;
    let flags = TextureFlags::from_bits_retain(reader.read_u32()?);
    let frames = reader.read_u16()?;
    let first_frame = reader.read_u16()?;
    reader.seek(SeekFrom::Current(4))?;
    let reflectivity = [reader.read_f32()?, reader.read_f32()?, reader.read_f32()?];
    reader.seek(SeekFrom::Current(4))?;
    let bumpmap_scale = reader.read_f32()?;
    let high_res_image_format = read_format(reader.read_i32()?, "high res")?;
    let mipmap_count = reader.read_u8()?;
    let low_res_image_format = read_format(reader.read_i32()?, "low res")?;
    let low_res_image_width = reader.read_u8()?;
    let low_res_image_height = reader.read_u8()?;

    let depth = if version_at_least(version, 7, 2) {
      reader.read_u16()?
    } else {
      1u16
    };

    let mut resources = Vec::new();
    if version_at_least(version, 7, 3) {
      reader.seek(SeekFrom::Current(3))?;
      let num_resources = reader.read_u32()?;
      if num_resources > MAX_RESOURCE_ENTRIES {
        return Err(VtfError::format(format!("{} resources exceed the maximum of {}", num_resources, MAX_RESOURCE_ENTRIES)));
      }
      let dictionary_end = SIZE_73 as usize + (num_resources * RESOURCE_ENTRY_SIZE) as usize;
      if data.len() < dictionary_end {
        return Err(VtfError::format(format!("resource dictionary ends at {} but the buffer has {} bytes", dictionary_end, data.len())));
      }
      reader.seek(SeekFrom::Start(SIZE_73 as u64))?;
      for _ in 0..num_resources {
        let tag: [u8; 3] = reader.read_bytes()?;
        let flags = reader.read_u8()?;
        let value = reader.read_u32()?;
        trace!("Resource {:?} flags {:#x} data {:#x}", tag, flags, value);
        resources.push(ResourceEntry { tag, flags, data: value });
      }
    }

    Ok(Self {
      signature,
      version,
      header_size,
      width,
      height,
      flags,
      frames,
      first_frame,
      reflectivity,
      bumpmap_scale,
      high_res_image_format,
      mipmap_count,
      low_res_image_format,
      low_res_image_width,
      low_res_image_height,
      depth,
      resources
    })
  }

  /// Writes the header struct and, for 7.3+, the resource dictionary.
  pub fn write(&self, writer: &mut Vec<u8>) -> VtfResult<()> {
    let start = writer.len();
    writer.write_u32(self.signature)?;
    writer.write_u32(self.version[0])?;
    writer.write_u32(self.version[1])?;
    writer.write_u32(self.header_size)?;
    writer.write_u16(self.width)?;
    writer.write_u16(self.height)?;
    writer.write_u32(self.flags.bits())?;
    writer.write_u16(self.frames)?;
    writer.write_u16(self.first_frame)?;
    writer.write_padding(4)?;
    for component in self.reflectivity.iter() {
      writer.write_f32(*component)?;
    }
    writer.write_padding(4)?;
    writer.write_f32(self.bumpmap_scale)?;
    writer.write_i32(self.high_res_image_format.to_raw())?;
    writer.write_u8(self.mipmap_count)?;
    writer.write_i32(self.low_res_image_format.to_raw())?;
    writer.write_u8(self.low_res_image_width)?;
    writer.write_u8(self.low_res_image_height)?;

    if version_at_least(self.version, 7, 2) {
      writer.write_u16(self.depth)?;
    }
    if version_at_least(self.version, 7, 3) {
      writer.write_padding(3)?;
      writer.write_u32(self.resources.len() as u32)?;
    }

    let written = writer.len() - start;
    writer.write_padding(struct_size(self.version) as usize - written)?;

    if version_at_least(self.version, 7, 3) {
      for entry in &self.resources {
        writer.extend_from_slice(&entry.tag);
        writer.write_u8(entry.flags)?;
        writer.write_u32(entry.data)?;
      }
    }
    Ok(())
  }
}
