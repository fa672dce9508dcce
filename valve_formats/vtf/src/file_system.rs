use std::fs::{File, OpenOptions};
use std::io::{Read, Result as IOResult, Seek, SeekFrom, Write};
use std::path::Path;

use futures_lite::io::{AsyncRead, AsyncReadExt};
use io_util::{RawDataRead, ReadEntireSeekableFile};

use crate::codec::ReadOptions;
use crate::error::{VtfError, VtfResult};
use crate::header::header_size;
use crate::texture::VtfTexture;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenMode {
  Read,
  /// Creates the file or truncates an existing one.
  Write
}

/// Byte stream provider for `VtfTexture::open` and `VtfTexture::save`. Files are closed when dropped.
pub trait FileSystem {
  type File: Read + Write + Seek;
  fn open<P: AsRef<Path>>(&self, path: P, mode: OpenMode) -> IOResult<Self::File>;

  fn size(&self, file: &mut Self::File) -> IOResult<u64> {
    let position = file.stream_position()?;
    let size = file.seek(SeekFrom::End(0))?;
    file.seek(SeekFrom::Start(position))?;
    Ok(size)
  }
}

/// `FileSystem` backed by `std::fs`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
  type File = File;

  fn open<P: AsRef<Path>>(&self, path: P, mode: OpenMode) -> IOResult<File> {
    match mode {
      OpenMode::Read => File::open(path),
      OpenMode::Write => OpenOptions::new().write(true).create(true).truncate(true).open(path)
    }
  }

  fn size(&self, file: &mut File) -> IOResult<u64> {
    Ok(file.metadata()?.len())
  }
}

fn read_limit(options: &ReadOptions) -> Option<u64> {
  if options.header_only {
    header_size(None, None).map(|size| size as u64)
  } else {
    None
  }
}

impl VtfTexture {
  /// Reads and decodes a texture. In header only mode just the largest possible header is read.
  pub fn open<F: FileSystem, P: AsRef<Path>>(file_system: &F, path: P, options: &ReadOptions) -> VtfResult<Self> {
    let mut file = file_system.open(path.as_ref(), OpenMode::Read)?;
    let data = match read_limit(options) {
      Some(limit) => {
        let size = file_system.size(&mut file)?.min(limit);
        file.read_data_exact(size as usize)?
      },
      None => file.read_seekable_to_end()?
    };
    Self::deserialize(&data, options)
  }

  pub fn save<F: FileSystem, P: AsRef<Path>>(&self, file_system: &F, path: P) -> VtfResult<()> {
    let data = self.serialize()?;
    let mut file = file_system.open(path.as_ref(), OpenMode::Write)?;
    file.write_all(&data)?;
    file.flush()?;
    Ok(())
  }

  /// Whether the file decodes as a texture. I/O errors are still reported.
  pub fn is_vtf_file<F: FileSystem, P: AsRef<Path>>(file_system: &F, path: P, options: &ReadOptions) -> VtfResult<bool> {
    match Self::open(file_system, path, options) {
      Ok(_) => Ok(true),
      Err(VtfError::Format(_)) => Ok(false),
      Err(e) => Err(e)
    }
  }

  pub async fn read_async<R: AsyncRead + Unpin>(mut reader: R, options: &ReadOptions) -> VtfResult<Self> {
    let mut data = Vec::new();
    match read_limit(options) {
      Some(limit) => (&mut reader).take(limit).read_to_end(&mut data).await?,
      None => reader.read_to_end(&mut data).await?
    };
    Self::deserialize(&data, options)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::image_format::ImageFormat;
  use crate::texture_flags::TextureFlags;
  use futures_lite::future::block_on;
  use futures_lite::io::Cursor as AsyncCursor;

  fn texture() -> VtfTexture {
    let mut texture = VtfTexture::create(32, 32, 1, ImageFormat::BGRA8888, TextureFlags::TRILINEAR, 2, None).unwrap();
    for (i, byte) in texture.image_data.iter_mut().enumerate() {
      *byte = (i % 13) as u8;
    }
    texture
  }

  #[test]
  fn save_then_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("brick.vtf");
    let texture = texture();
    texture.save(&StdFileSystem, &path).unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, texture.file_size(0));
    assert_eq!(VtfTexture::open(&StdFileSystem, &path, &ReadOptions::default()).unwrap(), texture);
  }

  #[test]
  fn header_only_open_reads_the_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("brick.vtf");
    texture().save(&StdFileSystem, &path).unwrap();
    let header = VtfTexture::open(&StdFileSystem, &path, &ReadOptions::header_only()).unwrap();
    assert_eq!((header.width(), header.height(), header.frame_count()), (32, 32, 2));
    assert!(header.image_data.is_empty());
  }

  #[test]
  fn detects_texture_files() {
    let dir = tempfile::tempdir().unwrap();
    let texture_path = dir.path().join("brick.vtf");
    let text_path = dir.path().join("notes.txt");
    texture().save(&StdFileSystem, &texture_path).unwrap();
    std::fs::write(&text_path, b"not a texture at all").unwrap();

    let options = ReadOptions::default();
    assert!(VtfTexture::is_vtf_file(&StdFileSystem, &texture_path, &options).unwrap());
    assert!(!VtfTexture::is_vtf_file(&StdFileSystem, &text_path, &options).unwrap());
    let missing = VtfTexture::is_vtf_file(&StdFileSystem, dir.path().join("missing.vtf"), &options);
    assert!(matches!(missing, Err(VtfError::Io(_))));
  }

  #[test]
  fn reads_from_async_sources() {
    let texture = texture();
    let bytes = texture.serialize().unwrap();
    let decoded = block_on(VtfTexture::read_async(AsyncCursor::new(bytes.clone()), &ReadOptions::default())).unwrap();
    assert_eq!(decoded, texture);

    let header = block_on(VtfTexture::read_async(AsyncCursor::new(bytes), &ReadOptions::header_only())).unwrap();
    assert_eq!(header.mip_count(), texture.mip_count());
  }
}
