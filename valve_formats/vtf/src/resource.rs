pub const LOW_RES_IMAGE_TAG: [u8; 3] = [0x01, 0x00, 0x00];
pub const HIGH_RES_IMAGE_TAG: [u8; 3] = [0x30, 0x00, 0x00];
pub const CRC_TAG: [u8; 3] = *b"CRC";
pub const LOD_SETTINGS_TAG: [u8; 3] = *b"LOD";
pub const TEXTURE_SETTINGS_TAG: [u8; 3] = *b"TS0";
pub const KEY_VALUES_TAG: [u8; 3] = *b"KVD";

/// The entry stores its value inline instead of pointing to a data chunk.
pub const RESOURCE_FLAG_NO_DATA_CHUNK: u8 = 0x02;

pub(crate) const RESOURCE_ENTRY_SIZE: u32 = 8;
pub const MAX_RESOURCE_ENTRIES: u32 = 32;

#[derive(Hash, PartialEq, Eq, Copy, Clone, Debug)]
pub enum Resource {
  Unknown,
  Thumbnail,
  Image,
  Crc,
  LodSettings,
  TextureSettings,
  KeyValues
}

impl Resource {
  pub fn from_tag(tag: [u8; 3]) -> Self {
    match tag {
      LOW_RES_IMAGE_TAG => Resource::Thumbnail,
      HIGH_RES_IMAGE_TAG => Resource::Image,
      CRC_TAG => Resource::Crc,
      LOD_SETTINGS_TAG => Resource::LodSettings,
      TEXTURE_SETTINGS_TAG => Resource::TextureSettings,
      KEY_VALUES_TAG => Resource::KeyValues,
      _ => Resource::Unknown
    }
  }
}

/// One row of the resource directory as it is stored on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResourceEntry {
  pub tag: [u8; 3],
  pub flags: u8,
  /// Either the inline value or the file offset of the data chunk.
  pub data: u32
}

impl ResourceEntry {
  pub fn has_data_chunk(&self) -> bool {
    self.flags & RESOURCE_FLAG_NO_DATA_CHUNK == 0
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceData {
  Inline(u32),
  Chunk(Box<[u8]>)
}

/// A directory entry other than the two images, carried along so it survives re-encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtraResource {
  pub tag: [u8; 3],
  pub flags: u8,
  pub data: ResourceData
}

impl ExtraResource {
  pub fn inline(tag: [u8; 3], value: u32) -> Self {
    Self {
      tag,
      flags: RESOURCE_FLAG_NO_DATA_CHUNK,
      data: ResourceData::Inline(value)
    }
  }

  pub fn chunk(tag: [u8; 3], data: Box<[u8]>) -> Self {
    Self {
      tag,
      flags: 0,
      data: ResourceData::Chunk(data)
    }
  }

  pub fn kind(&self) -> Resource {
    Resource::from_tag(self.tag)
  }

  /// Bytes the resource occupies after the directory, including the length prefix.
  pub(crate) fn chunk_size(&self) -> usize {
    match &self.data {
      ResourceData::Inline(_) => 0,
      ResourceData::Chunk(data) => 4 + data.len()
    }
  }
}
