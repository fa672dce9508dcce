use sourcerenderer_vtf::{
  header_size, ExtraResource, ImageDataLocation, ImageFormat, ReadOptions, TextureFlags, VtfError, VtfTexture,
  CRC_TAG, LOD_SETTINGS_TAG
};

fn gradient_texture(width: u32, height: u32, format: ImageFormat, flags: TextureFlags, frames: u32) -> VtfTexture {
  let mut texture = VtfTexture::create(width, height, 1, format, flags, frames, None).unwrap();
  let data: Vec<u8> = (0..texture.compute_total_size()).map(|i| (i * 7 % 256) as u8).collect();
  texture.set_image_data(&data, ImageDataLocation::default()).unwrap();
  texture
}

/// Hand assembled version 7.2 file: 4x4 RGBA8888, one mip, no low res image.
fn handmade_7_2_file() -> Vec<u8> {
  let mut data = Vec::new();
  data.extend_from_slice(b"VTF\0");
  data.extend_from_slice(&7u32.to_le_bytes());
  data.extend_from_slice(&2u32.to_le_bytes());
  data.extend_from_slice(&80u32.to_le_bytes());
  data.extend_from_slice(&4u16.to_le_bytes());
  data.extend_from_slice(&4u16.to_le_bytes());
  data.extend_from_slice(&(TextureFlags::CLAMPS | TextureFlags::NOMIP).bits().to_le_bytes());
  data.extend_from_slice(&1u16.to_le_bytes());
  data.extend_from_slice(&0u16.to_le_bytes());
  data.extend_from_slice(&[0u8; 4]);
  for component in [0.25f32, 0.5, 0.75] {
    data.extend_from_slice(&component.to_le_bytes());
  }
  data.extend_from_slice(&[0u8; 4]);
  data.extend_from_slice(&1.0f32.to_le_bytes());
  data.extend_from_slice(&0i32.to_le_bytes());
  data.push(1);
  data.extend_from_slice(&(-1i32).to_le_bytes());
  data.push(0);
  data.push(0);
  data.extend_from_slice(&1u16.to_le_bytes());
  data.resize(80, 0);
  data.extend((0..64u8).map(|i| i * 3));
  data
}

#[test]
fn texture_64x64_survives_serialization() {
  let texture = gradient_texture(64, 64, ImageFormat::RGBA8888, TextureFlags::empty(), 1);
  assert_eq!(texture.mip_count(), 7);
  assert_eq!(texture.compute_total_size(), (4096 + 1024 + 256 + 64 + 16 + 4 + 1) * 4);

  let bytes = texture.serialize().unwrap();
  assert!(VtfTexture::check_file(&bytes));
  assert_eq!(&bytes[0..4], b"VTF\0");
  assert_eq!(bytes.len(), texture.file_size(0));

  let decoded = VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap();
  assert_eq!(decoded, texture);
  for mip_level in 0..7 {
    let location = ImageDataLocation::new(0, 0, mip_level);
    assert_eq!(decoded.get_image_data(location).unwrap(), texture.get_image_data(location).unwrap());
  }
}

#[test]
fn reads_a_handmade_file() {
  let bytes = handmade_7_2_file();
  let texture = VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap();
  assert_eq!(texture.version(), [7, 2]);
  assert_eq!((texture.width(), texture.height(), texture.depth()), (4, 4, 1));
  assert_eq!(texture.mip_count(), 1);
  assert_eq!(texture.format(), ImageFormat::RGBA8888);
  assert_eq!(texture.flags(), TextureFlags::CLAMPS | TextureFlags::NOMIP);
  assert_eq!(texture.reflectivity(), [0.25, 0.5, 0.75]);
  assert_eq!(texture.low_res_format(), ImageFormat::Unknown);
  assert!(texture.get_low_res_image_data().is_err());
  assert_eq!(texture.get_image_data(ImageDataLocation::default()).unwrap(), (0..64u8).map(|i| i * 3).collect::<Vec<_>>());

  assert_eq!(texture.serialize().unwrap(), bytes);
}

#[test]
fn header_only_read_skips_payloads() {
  let mut texture = gradient_texture(128, 64, ImageFormat::DXT5, TextureFlags::TRILINEAR, 4);
  texture.init_low_res_image(16, 8, ImageFormat::DXT1).unwrap();
  let bytes = texture.serialize().unwrap();
  let limit = header_size(None, None).unwrap() as usize;

  let header = VtfTexture::deserialize(&bytes[..limit], &ReadOptions::header_only()).unwrap();
  assert_eq!((header.width(), header.height()), (128, 64));
  assert_eq!(header.frame_count(), 4);
  assert_eq!(header.format(), ImageFormat::DXT5);
  assert_eq!(header.low_res_format(), ImageFormat::DXT1);
  assert_eq!(header.low_res_file_info(), texture.low_res_file_info());
  assert!(matches!(header.get_image_data(ImageDataLocation::default()), Err(VtfError::Argument(_))));
}

#[test]
fn mip_skipping_shrinks_to_the_requested_level() {
  let texture = gradient_texture(64, 64, ImageFormat::BGR888, TextureFlags::empty(), 1);
  let bytes = texture.serialize().unwrap();
  let options = ReadOptions { skip_mip_levels: 2, ..Default::default() };
  let decoded = VtfTexture::deserialize(&bytes, &options).unwrap();
  assert_eq!((decoded.width(), decoded.height()), (16, 16));
  assert_eq!(decoded.mip_count(), 5);
  assert_eq!(
    decoded.get_image_data(ImageDataLocation::default()).unwrap(),
    texture.get_image_data(ImageDataLocation::new(0, 0, 2)).unwrap()
  );
}

#[test]
fn minor_version_fixup_leaves_the_input_alone() {
  let mut texture = gradient_texture(8, 8, ImageFormat::RGBA8888, TextureFlags::empty(), 1);
  texture.set_version(7, 5).unwrap();
  let bytes = texture.serialize().unwrap();
  let copy = bytes.clone();

  assert_eq!(VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap().version(), [7, 4]);
  let strict = ReadOptions { header_fixup: false, ..Default::default() };
  assert_eq!(VtfTexture::deserialize(&bytes, &strict).unwrap().version(), [7, 5]);
  assert_eq!(bytes, copy);
}

#[test]
fn older_versions_round_trip() {
  for minor in [0, 2, 3] {
    let mut texture = gradient_texture(32, 16, ImageFormat::RGB565, TextureFlags::POINTSAMPLE, 2);
    texture.set_version(7, minor).unwrap();
    texture.init_low_res_image(8, 4, ImageFormat::RGB565).unwrap();
    texture.set_low_res_image_data(&[0x42; 64]).unwrap();
    let bytes = texture.serialize().unwrap();
    let decoded = VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap();
    assert_eq!(decoded, texture, "version 7.{}", minor);
    assert_eq!(decoded.get_low_res_image_data().unwrap(), vec![0x42; 64]);
  }
}

#[test]
fn extra_resources_survive_round_trip() {
  let mut texture = gradient_texture(16, 16, ImageFormat::RGBA8888, TextureFlags::empty(), 1);
  texture.set_resource(ExtraResource::inline(CRC_TAG, 0x1234_5678)).unwrap();
  texture.set_resource(ExtraResource::inline(LOD_SETTINGS_TAG, 0x0000_0303)).unwrap();
  let bytes = texture.serialize().unwrap();
  let decoded = VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap();
  assert_eq!(decoded.resources(), texture.resources());
}

#[test]
fn cube_maps_keep_six_faces() {
  let texture = gradient_texture(8, 8, ImageFormat::RGBA8888, TextureFlags::ENVMAP, 1);
  assert_eq!(texture.face_count(), 6);
  let bytes = texture.serialize().unwrap();
  let decoded = VtfTexture::deserialize(&bytes, &ReadOptions::default()).unwrap();
  assert!(decoded.is_cube_map());
  assert_eq!(decoded, texture);
}

#[test]
fn malformed_input_is_rejected() {
  let bytes = handmade_7_2_file();
  for len in [0, 15, 40, 79, bytes.len() - 1] {
    let result = VtfTexture::deserialize(&bytes[..len], &ReadOptions::default());
    assert!(matches!(result, Err(VtfError::Format(_))), "length {}", len);
  }

  let mut wrong_signature = bytes.clone();
  wrong_signature[3] = b'!';
  assert!(!VtfTexture::check_file(&wrong_signature));
  assert!(matches!(VtfTexture::deserialize(&wrong_signature, &ReadOptions::default()), Err(VtfError::Format(_))));

  let mut zero_width = bytes;
  zero_width[16] = 0;
  assert!(matches!(VtfTexture::deserialize(&zero_width, &ReadOptions::default()), Err(VtfError::Format(_))));
}
