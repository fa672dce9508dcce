use std::ops::Range;

use crate::error::{VtfError, VtfResult};
use crate::image_format::{calculate_image_size, ImageFormat};
use crate::texture::{allocate_zeroed, ImageDataLocation, VtfTexture};
use crate::texture_flags::TextureFlags;

/// A single 2D image: one depth slice of one mip level of one face of one frame.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
  pub data: &'a [u8],
  pub format: ImageFormat,
  pub width: u32,
  pub height: u32
}

#[derive(Debug)]
pub struct ImageViewMut<'a> {
  pub data: &'a mut [u8],
  pub format: ImageFormat,
  pub width: u32,
  pub height: u32
}

/// Parameters for mipmap and thumbnail resampling, derived from the texture flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResampleOptions {
  pub normal_map: bool,
  pub clamp_s: bool,
  pub clamp_t: bool,
  pub clamp_u: bool,
  pub alpha_test_threshold: f32,
  pub alpha_test_high_freq_threshold: f32
}

/// How much of the alpha channel an image uses. Ordered from weakest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlphaCoverage {
  Opaque,
  OneBit,
  EightBit
}

/// Cube map faces in the order they are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeMapFace {
  Right,
  Left,
  Back,
  Front,
  Up,
  Down
}

impl CubeMapFace {
  pub const ALL: [CubeMapFace; 6] = [
    CubeMapFace::Right,
    CubeMapFace::Left,
    CubeMapFace::Back,
    CubeMapFace::Front,
    CubeMapFace::Up,
    CubeMapFace::Down
  ];

  pub fn from_index(index: u32) -> Option<Self> {
    Self::ALL.get(index as usize).copied()
  }
}

/// Pixel math the texture delegates to. Implementations report failures as `VtfError::Processing`.
pub trait ImageProcessor {
  /// Converts `source` into `target.format`. Both images have the same dimensions.
  fn convert(&self, source: ImageView, target: ImageViewMut, normal_to_dudv: bool) -> VtfResult<()>;
  /// Scales `source` to the dimensions of `target`. Both images have the same format.
  fn resample(&self, source: ImageView, target: ImageViewMut, options: &ResampleOptions) -> VtfResult<()>;
  /// Average linear color as red, green, blue in `0.0..=1.0`.
  fn average_color(&self, image: ImageView) -> VtfResult<[f32; 3]>;
  fn alpha_coverage(&self, image: ImageView) -> VtfResult<AlphaCoverage>;
  fn fill_alpha(&self, image: ImageViewMut, alpha: u8) -> VtfResult<()>;
  fn orient_cube_face(&self, image: ImageViewMut, face: CubeMapFace) -> VtfResult<()>;
}

/// One depth slice inside the image data.
#[derive(Clone, Debug)]
struct SliceRegion {
  frame: u32,
  face: u32,
  mip_level: u32,
  z: u32,
  width: u32,
  height: u32,
  range: Range<usize>
}

/// Borrows `source` immutably and `target` mutably from the same buffer. `source` has to come first.
fn split_source_target(data: &mut [u8], source: Range<usize>, target: Range<usize>) -> (&[u8], &mut [u8]) {
  debug_assert!(source.end <= target.start);
  let (head, tail) = data.split_at_mut(target.start);
  (&head[source], &mut tail[..target.end - target.start])
}

impl VtfTexture {
  /// Every depth slice of the given mip levels, ordered like the image data.
  fn slice_regions(&self, mip_levels: Range<u32>) -> VtfResult<Vec<SliceRegion>> {
    let mut regions = Vec::new();
    for frame in 0..self.frame_count {
      for face in 0..self.face_count {
        for mip_level in mip_levels.clone() {
          let (width, height, depth) = self.mip_dimensions(mip_level);
          let slice_size = self.face_size_in_bytes(mip_level);
          for z in 0..depth {
            let offset = self.image_data_offset(ImageDataLocation::new(frame, face, mip_level).at(0, 0, z))?;
            regions.push(SliceRegion {
              frame,
              face,
              mip_level,
              z,
              width,
              height,
              range: offset..offset + slice_size
            });
          }
        }
      }
    }
    Ok(regions)
  }

  fn view(&self, region: &SliceRegion) -> ImageView {
    ImageView {
      data: &self.image_data[region.range.clone()],
      format: self.format,
      width: region.width,
      height: region.height
    }
  }

  fn view_mut(&mut self, region: &SliceRegion) -> ImageViewMut {
    ImageViewMut {
      data: &mut self.image_data[region.range.clone()],
      format: self.format,
      width: region.width,
      height: region.height
    }
  }

  fn require_image_data(&self) -> VtfResult<()> {
    if self.image_data.is_empty() {
      return Err(VtfError::argument("texture has no image data"));
    }
    Ok(())
  }

  fn resample_options(&self) -> ResampleOptions {
    ResampleOptions {
      normal_map: self.is_normal_map(),
      clamp_s: self.flags.contains(TextureFlags::CLAMPS),
      clamp_t: self.flags.contains(TextureFlags::CLAMPT),
      clamp_u: self.flags.contains(TextureFlags::CLAMPU),
      alpha_test_threshold: self.alpha_test_threshold,
      alpha_test_high_freq_threshold: self.alpha_test_high_freq_threshold
    }
  }

  /// Regenerates every mip level below the first from the first one.
  pub fn generate_mipmaps(&mut self, processor: &dyn ImageProcessor) -> VtfResult<()> {
    self.require_image_data()?;
    if self.format.is_compressed() {
      return Err(VtfError::argument(format!("can't generate mipmaps for compressed format {:?}", self.format)));
    }
    if self.mip_count < 2 {
      return Ok(());
    }

    let options = self.resample_options();
    let base_depth = self.depth;
    let sources = self.slice_regions(0..1)?;
    let targets = self.slice_regions(1..self.mip_count)?;
    for target in &targets {
      let (_, _, depth) = self.mip_dimensions(target.mip_level);
      let source_z = (target.z as u64 * base_depth as u64 / depth as u64) as usize;
      let face_index = (target.frame * self.face_count + target.face) as usize;
      let source_index = face_index * base_depth as usize + source_z;
      let source = &sources[source_index];
      let format = self.format;
      let (source_data, target_data) = split_source_target(&mut self.image_data, source.range.clone(), target.range.clone());
      processor.resample(
        ImageView { data: source_data, format, width: source.width, height: source.height },
        ImageViewMut { data: target_data, format, width: target.width, height: target.height },
        &options
      )?;
    }
    debug!("Generated {} mip levels for a {}x{} texture", self.mip_count - 1, self.width, self.height);
    Ok(())
  }

  /// Rotates the faces of a cube map into the orientation the engine expects. Does nothing for other textures.
  pub fn fix_cubemap_face_orientation(&mut self, processor: &dyn ImageProcessor) -> VtfResult<()> {
    if !self.is_cube_map() {
      return Ok(());
    }
    self.require_image_data()?;
    for region in self.slice_regions(0..self.mip_count)? {
      let face = CubeMapFace::from_index(region.face)
        .ok_or_else(|| VtfError::format(format!("cube map face {} out of range", region.face)))?;
      processor.orient_cube_face(self.view_mut(&region), face)?;
    }
    Ok(())
  }

  /// Fills the alpha channel of mip level `m` with `255 / 2^m`.
  pub fn put_one_over_mip_level_in_alpha(&mut self, processor: &dyn ImageProcessor) -> VtfResult<()> {
    self.require_image_data()?;
    if !self.format.is_rgba8888_family() {
      return Err(VtfError::argument(format!("format {:?} has no 8 bit alpha channel", self.format)));
    }
    for region in self.slice_regions(0..self.mip_count)? {
      let alpha = 255u32.checked_shr(region.mip_level).unwrap_or(0) as u8;
      processor.fill_alpha(self.view_mut(&region), alpha)?;
    }
    Ok(())
  }

  /// Stores the average color of the largest mip level as reflectivity.
  pub fn compute_reflectivity(&mut self, processor: &dyn ImageProcessor) -> VtfResult<()> {
    self.require_image_data()?;
    let regions = self.slice_regions(0..1)?;
    let mut sum = [0f32; 3];
    for region in &regions {
      let color = processor.average_color(self.view(region))?;
      for (total, component) in sum.iter_mut().zip(color.iter()) {
        *total += *component;
      }
    }
    let count = regions.len() as f32;
    self.reflectivity = [sum[2] / count, sum[1] / count, sum[0] / count];
    Ok(())
  }

  /// Sets ONEBITALPHA or EIGHTBITALPHA from the alpha usage of the largest mip level.
  pub fn compute_alpha_flags(&mut self, processor: &dyn ImageProcessor) -> VtfResult<()> {
    self.require_image_data()?;
    let mut coverage = AlphaCoverage::Opaque;
    for region in &self.slice_regions(0..1)? {
      coverage = coverage.max(processor.alpha_coverage(self.view(region))?);
    }
    self.flags.remove(TextureFlags::ONEBITALPHA | TextureFlags::EIGHTBITALPHA);
    match coverage {
      AlphaCoverage::Opaque => {},
      AlphaCoverage::OneBit => self.flags.insert(TextureFlags::ONEBITALPHA),
      AlphaCoverage::EightBit => self.flags.insert(TextureFlags::EIGHTBITALPHA)
    }
    Ok(())
  }

  /// Fills the low res image with a scaled down copy of the first frame.
  pub fn construct_low_res_image(&mut self, processor: &dyn ImageProcessor) -> VtfResult<()> {
    self.require_image_data()?;
    if !self.low_res.is_present() {
      return Err(VtfError::argument("texture has no low res image"));
    }
    let options = self.resample_options();
    let (width, height) = (self.width, self.height);
    let source_size = self.face_size_in_bytes(0);
    let source = ImageView {
      data: &self.image_data[..source_size],
      format: self.format,
      width,
      height
    };
    let (low_res_width, low_res_height) = (self.low_res.width, self.low_res.height);
    let target = ImageViewMut {
      data: &mut self.low_res.data,
      format: self.low_res.format,
      width: low_res_width,
      height: low_res_height
    };
    if source.format == target.format {
      return processor.resample(source, target, &options);
    }

    // Formats differ, go through RGBA8888.
    let rgba = ImageFormat::RGBA8888;
    let converted = if source.format == rgba {
      None
    } else {
      let mut data = allocate_zeroed(calculate_image_size(width, height, 1, rgba))?;
      processor.convert(source, ImageViewMut { data: &mut data, format: rgba, width, height }, false)?;
      Some(data)
    };
    let rgba_source = match &converted {
      Some(data) => ImageView { data: data.as_slice(), format: rgba, width, height },
      None => source
    };
    let mut resampled = allocate_zeroed(calculate_image_size(low_res_width, low_res_height, 1, rgba))?;
    processor.resample(
      rgba_source,
      ImageViewMut { data: &mut resampled, format: rgba, width: low_res_width, height: low_res_height },
      &options
    )?;
    processor.convert(
      ImageView { data: &resampled, format: rgba, width: low_res_width, height: low_res_height },
      target,
      false
    )
  }

  /// Converts all image data to `format`. The texture is left untouched if the conversion fails.
  pub fn convert_image_format(&mut self, format: ImageFormat, normal_to_dudv: bool, processor: &dyn ImageProcessor) -> VtfResult<()> {
    let format = match format {
      ImageFormat::Default => ImageFormat::RGBA8888,
      ImageFormat::Unknown => return Err(VtfError::argument("can't convert to an unknown format")),
      format => format
    };
    if format == self.format {
      return Ok(());
    }
    self.require_image_data()?;

    let regions = self.slice_regions(0..self.mip_count)?;
    let target_size: usize = regions.iter()
      .map(|region| calculate_image_size(region.width, region.height, 1, format))
      .fold(0, usize::saturating_add);
    let mut converted = allocate_zeroed(target_size)?;
    let mut offset = 0usize;
    for region in &regions {
      let size = calculate_image_size(region.width, region.height, 1, format);
      processor.convert(
        self.view(region),
        ImageViewMut {
          data: &mut converted[offset..offset + size],
          format,
          width: region.width,
          height: region.height
        },
        normal_to_dudv
      )?;
      offset += size;
    }

    debug!("Converted texture from {:?} to {:?}", self.format, format);
    self.image_data = converted;
    self.format = format;
    Ok(())
  }
}
