use std::io::{Read, Result as IOResult, Seek, SeekFrom};

pub trait RawDataRead {
  fn read_data_exact(&mut self, len: usize) -> IOResult<Box<[u8]>>;
}

impl<T: Read + ?Sized> RawDataRead for T {
  fn read_data_exact(&mut self, len: usize) -> IOResult<Box<[u8]>> {
    let mut buffer = vec![0u8; len];
    self.read_exact(&mut buffer)?;
    Ok(buffer.into_boxed_slice())
  }
}

pub trait ReadEntireSeekableFile {
  fn read_seekable_to_end(&mut self) -> IOResult<Box<[u8]>>;
}

// The standard library read_to_end function does a lot of small reads because it can't rely on Seek.
impl<T: RawDataRead + Seek + ?Sized> ReadEntireSeekableFile for T {
  fn read_seekable_to_end(&mut self) -> IOResult<Box<[u8]>> {
    let len = self.seek(SeekFrom::End(0))? as usize;
    let _ = self.seek(SeekFrom::Start(0))?;
    self.read_data_exact(len)
  }
}

pub trait PrimitiveRead {
  fn read_u8(&mut self) -> IOResult<u8>;
  fn read_u16(&mut self) -> IOResult<u16>;
  fn read_u32(&mut self) -> IOResult<u32>;
  fn read_i32(&mut self) -> IOResult<i32>;
  fn read_f32(&mut self) -> IOResult<f32>;
  fn read_bytes<const N: usize>(&mut self) -> IOResult<[u8; N]>;
}

impl<T: Read + ?Sized> PrimitiveRead for T {
  fn read_u8(&mut self) -> IOResult<u8> {
    Ok(u8::from_le_bytes(self.read_bytes()?))
  }

  fn read_u16(&mut self) -> IOResult<u16> {
    Ok(u16::from_le_bytes(self.read_bytes()?))
  }

  fn read_u32(&mut self) -> IOResult<u32> {
    Ok(u32::from_le_bytes(self.read_bytes()?))
  }

  fn read_i32(&mut self) -> IOResult<i32> {
    Ok(i32::from_le_bytes(self.read_bytes()?))
  }

  fn read_f32(&mut self) -> IOResult<f32> {
    Ok(f32::from_le_bytes(self.read_bytes()?))
  }

  fn read_bytes<const N: usize>(&mut self) -> IOResult<[u8; N]> {
    let mut buffer = [0u8; N];
    self.read_exact(&mut buffer)?;
    Ok(buffer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::{Cursor, ErrorKind};

  #[test]
  fn reads_little_endian_primitives() {
    let mut cursor = Cursor::new(vec![0x56, 0x54, 0x46, 0x00, 0x34, 0x12, 0xFF, 0x00, 0x00, 0x80, 0x3F]);
    assert_eq!(cursor.read_u32().unwrap(), 0x00465456);
    assert_eq!(cursor.read_u16().unwrap(), 0x1234);
    assert_eq!(cursor.read_u8().unwrap(), 0xFF);
    assert_eq!(cursor.read_f32().unwrap(), 1.0f32);
  }

  #[test]
  fn short_primitive_read_fails() {
    let mut cursor = Cursor::new(vec![1u8, 2u8]);
    let err = cursor.read_u32().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
  }

  #[test]
  fn read_data_exact_needs_every_byte() {
    let mut cursor = Cursor::new(vec![1u8, 2, 3]);
    assert_eq!(&*cursor.read_data_exact(2).unwrap(), &[1u8, 2]);
    assert!(cursor.read_data_exact(2).is_err());
  }

  #[test]
  fn reads_entire_seekable_file() {
    let mut cursor = Cursor::new(vec![9u8; 17]);
    cursor.set_position(5);
    assert_eq!(cursor.read_seekable_to_end().unwrap().len(), 17);
  }
}
