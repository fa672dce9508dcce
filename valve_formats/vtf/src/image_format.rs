use std::collections::HashMap;

use crate::error::VtfError;

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
#[repr(i32)]
pub enum ImageFormat {
    /// Only valid as a conversion target, resolves to RGBA8888.
    Default = -2,
    /// No image, stored as -1 on disk.
    Unknown = -1,
    RGBA8888 = 0,
    ABGR8888,
    RGB888,
    BGR888,
    RGB565,
    I8,
    IA88,
    P8,
    A8,
    RGB888Bluescreen,
    BGR888Bluescreen,
    ARGB8888,
    BGRA8888,
    DXT1,
    DXT3,
    DXT5,
    BGRX8888,
    BGR565,
    BGRX5551,
    BGRA4444,
    DXT1OneBitAlpha,
    BGRA5551,
    UV88,
    UVWQ8888,
    RGBA16161616F,
    RGBA16161616,
    UVLX8888,
    R32F,
    RGB323232F,
    RGBA32323232F,
    RG1616F,
    RG3232F,
    RGBX8888,
    Null,
    ATI2N,
    ATI1N,
    RGBA1010102,
    BGRA1010102,
    R16F,
    D16,
    D15S1,
    D32,
    D24S8,
    LinearD24S8,
    D24X8,
    D24X4S4,
    D24FS8,
    D16Shadow,
    D24X8Shadow,
    LinearBGRX8888,
    LinearRGBA8888,
    LinearABGR8888,
    LinearARGB8888,
    LinearBGRA8888,
    LinearRGB888,
    LinearBGR888,
    LinearBGRX5551,
    LinearI8,
    LinearRGBA16161616,
    LeBGRX8888,
    LeBGRA8888,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 63] = [
        ImageFormat::Default,
        ImageFormat::Unknown,
        ImageFormat::RGBA8888,
        ImageFormat::ABGR8888,
        ImageFormat::RGB888,
        ImageFormat::BGR888,
        ImageFormat::RGB565,
        ImageFormat::I8,
        ImageFormat::IA88,
        ImageFormat::P8,
        ImageFormat::A8,
        ImageFormat::RGB888Bluescreen,
        ImageFormat::BGR888Bluescreen,
        ImageFormat::ARGB8888,
        ImageFormat::BGRA8888,
        ImageFormat::DXT1,
        ImageFormat::DXT3,
        ImageFormat::DXT5,
        ImageFormat::BGRX8888,
        ImageFormat::BGR565,
        ImageFormat::BGRX5551,
        ImageFormat::BGRA4444,
        ImageFormat::DXT1OneBitAlpha,
        ImageFormat::BGRA5551,
        ImageFormat::UV88,
        ImageFormat::UVWQ8888,
        ImageFormat::RGBA16161616F,
        ImageFormat::RGBA16161616,
        ImageFormat::UVLX8888,
        ImageFormat::R32F,
        ImageFormat::RGB323232F,
        ImageFormat::RGBA32323232F,
        ImageFormat::RG1616F,
        ImageFormat::RG3232F,
        ImageFormat::RGBX8888,
        ImageFormat::Null,
        ImageFormat::ATI2N,
        ImageFormat::ATI1N,
        ImageFormat::RGBA1010102,
        ImageFormat::BGRA1010102,
        ImageFormat::R16F,
        ImageFormat::D16,
        ImageFormat::D15S1,
        ImageFormat::D32,
        ImageFormat::D24S8,
        ImageFormat::LinearD24S8,
        ImageFormat::D24X8,
        ImageFormat::D24X4S4,
        ImageFormat::D24FS8,
        ImageFormat::D16Shadow,
        ImageFormat::D24X8Shadow,
        ImageFormat::LinearBGRX8888,
        ImageFormat::LinearRGBA8888,
        ImageFormat::LinearABGR8888,
        ImageFormat::LinearARGB8888,
        ImageFormat::LinearBGRA8888,
        ImageFormat::LinearRGB888,
        ImageFormat::LinearBGR888,
        ImageFormat::LinearBGRX5551,
        ImageFormat::LinearI8,
        ImageFormat::LinearRGBA16161616,
        ImageFormat::LeBGRX8888,
        ImageFormat::LeBGRA8888,
    ];

    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|format| *format as i32 == raw)
    }

    pub fn to_raw(self) -> i32 {
        self as i32
    }

    /// Size and channel layout, `None` for the `Default` and `Unknown` sentinels.
    pub fn info(self) -> Option<&'static ImageFormatInfo> {
        IMAGE_FORMAT_INFO_MAP.get(&self)
    }

    pub fn is_compressed(self) -> bool {
        matches!(
            self.info().map(|info| &info.size_info),
            Some(FormatSizeInfo::Block { .. })
        )
    }

    pub fn is_depth(self) -> bool {
        matches!(
            self,
            ImageFormat::D16
                | ImageFormat::D15S1
                | ImageFormat::D32
                | ImageFormat::D24S8
                | ImageFormat::LinearD24S8
                | ImageFormat::D24X8
                | ImageFormat::D24X4S4
                | ImageFormat::D24FS8
                | ImageFormat::D16Shadow
                | ImageFormat::D24X8Shadow
        )
    }

    pub fn has_alpha(self) -> bool {
        self.info().map_or(false, |info| info.alpha_bits > 0)
    }

    /// True for the byte-per-channel RGBA layouts that alpha filling works on.
    pub fn is_rgba8888_family(self) -> bool {
        matches!(
            self,
            ImageFormat::RGBA8888
                | ImageFormat::ABGR8888
                | ImageFormat::ARGB8888
                | ImageFormat::BGRA8888
                | ImageFormat::LinearRGBA8888
                | ImageFormat::LinearABGR8888
                | ImageFormat::LinearARGB8888
                | ImageFormat::LinearBGRA8888
                | ImageFormat::LeBGRA8888
        )
    }
}

impl TryFrom<i32> for ImageFormat {
    type Error = VtfError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        ImageFormat::from_raw(raw).ok_or_else(|| VtfError::Argument(format!("unknown image format {}", raw)))
    }
}

pub enum FormatSizeInfo {
    Pixel {
        bytes_per_pixel: u8,
    },
    Block {
        block_width: u8,
        block_height: u8,
        bytes_per_block: u8,
    },
}

pub struct ImageFormatInfo {
    pub size_info: FormatSizeInfo,
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
}

fn pixel(red_bits: u8, green_bits: u8, blue_bits: u8, alpha_bits: u8, bytes_per_pixel: u8) -> ImageFormatInfo {
    ImageFormatInfo {
        size_info: FormatSizeInfo::Pixel { bytes_per_pixel },
        red_bits,
        green_bits,
        blue_bits,
        alpha_bits,
    }
}

fn block(red_bits: u8, green_bits: u8, blue_bits: u8, alpha_bits: u8, bytes_per_block: u8) -> ImageFormatInfo {
    ImageFormatInfo {
        size_info: FormatSizeInfo::Block {
            block_width: 4,
            block_height: 4,
            bytes_per_block,
        },
        red_bits,
        green_bits,
        blue_bits,
        alpha_bits,
    }
}

lazy_static! {
    static ref IMAGE_FORMAT_INFO_MAP: HashMap<ImageFormat, ImageFormatInfo> = {
        let mut m = HashMap::new();
        m.insert(ImageFormat::RGBA8888, pixel(8, 8, 8, 8, 4));
        m.insert(ImageFormat::ABGR8888, pixel(8, 8, 8, 8, 4));
        m.insert(ImageFormat::RGB888, pixel(8, 8, 8, 0, 3));
        m.insert(ImageFormat::BGR888, pixel(8, 8, 8, 0, 3));
        m.insert(ImageFormat::RGB565, pixel(5, 6, 5, 0, 2));
        m.insert(ImageFormat::I8, pixel(0, 0, 0, 0, 1));
        m.insert(ImageFormat::IA88, pixel(0, 0, 0, 8, 2));
        m.insert(ImageFormat::P8, pixel(0, 0, 0, 0, 1));
        m.insert(ImageFormat::A8, pixel(0, 0, 0, 8, 1));
        m.insert(ImageFormat::RGB888Bluescreen, pixel(8, 8, 8, 0, 3));
        m.insert(ImageFormat::BGR888Bluescreen, pixel(8, 8, 8, 0, 3));
        m.insert(ImageFormat::ARGB8888, pixel(8, 8, 8, 8, 4));
        m.insert(ImageFormat::BGRA8888, pixel(8, 8, 8, 8, 4));
        m.insert(ImageFormat::DXT1, block(0, 0, 0, 0, 8));
        m.insert(ImageFormat::DXT3, block(0, 0, 0, 8, 16));
        m.insert(ImageFormat::DXT5, block(0, 0, 0, 8, 16));
        m.insert(ImageFormat::BGRX8888, pixel(8, 8, 8, 0, 4));
        m.insert(ImageFormat::BGR565, pixel(5, 6, 5, 0, 2));
        m.insert(ImageFormat::BGRX5551, pixel(5, 5, 5, 0, 2));
        m.insert(ImageFormat::BGRA4444, pixel(4, 4, 4, 4, 2));
        m.insert(ImageFormat::DXT1OneBitAlpha, block(0, 0, 0, 1, 8));
        m.insert(ImageFormat::BGRA5551, pixel(5, 5, 5, 1, 2));
        m.insert(ImageFormat::UV88, pixel(8, 8, 0, 0, 2));
        m.insert(ImageFormat::UVWQ8888, pixel(8, 8, 8, 8, 4));
        m.insert(ImageFormat::RGBA16161616F, pixel(16, 16, 16, 16, 8));
        m.insert(ImageFormat::RGBA16161616, pixel(16, 16, 16, 16, 8));
        m.insert(ImageFormat::UVLX8888, pixel(8, 8, 8, 8, 4));
        m.insert(ImageFormat::R32F, pixel(32, 0, 0, 0, 4));
        m.insert(ImageFormat::RGB323232F, pixel(32, 32, 32, 0, 12));
        m.insert(ImageFormat::RGBA32323232F, pixel(32, 32, 32, 32, 16));
        m.insert(ImageFormat::RG1616F, pixel(16, 16, 0, 0, 4));
        m.insert(ImageFormat::RG3232F, pixel(32, 32, 0, 0, 8));
        m.insert(ImageFormat::RGBX8888, pixel(8, 8, 8, 0, 4));
        m.insert(ImageFormat::Null, pixel(0, 0, 0, 0, 4));
        m.insert(ImageFormat::ATI2N, block(0, 0, 0, 0, 16));
        m.insert(ImageFormat::ATI1N, block(0, 0, 0, 0, 8));
        m.insert(ImageFormat::RGBA1010102, pixel(10, 10, 10, 2, 4));
        m.insert(ImageFormat::BGRA1010102, pixel(10, 10, 10, 2, 4));
        m.insert(ImageFormat::R16F, pixel(16, 0, 0, 0, 2));
        m.insert(ImageFormat::D16, pixel(0, 0, 0, 0, 2));
        m.insert(ImageFormat::D15S1, pixel(0, 0, 0, 0, 2));
        m.insert(ImageFormat::D32, pixel(0, 0, 0, 0, 4));
        m.insert(ImageFormat::D24S8, pixel(0, 0, 0, 0, 4));
        m.insert(ImageFormat::LinearD24S8, pixel(0, 0, 0, 0, 4));
        m.insert(ImageFormat::D24X8, pixel(0, 0, 0, 0, 4));
        m.insert(ImageFormat::D24X4S4, pixel(0, 0, 0, 0, 4));
        m.insert(ImageFormat::D24FS8, pixel(0, 0, 0, 0, 4));
        m.insert(ImageFormat::D16Shadow, pixel(0, 0, 0, 0, 2));
        m.insert(ImageFormat::D24X8Shadow, pixel(0, 0, 0, 0, 4));
        m.insert(ImageFormat::LinearBGRX8888, pixel(8, 8, 8, 0, 4));
        m.insert(ImageFormat::LinearRGBA8888, pixel(8, 8, 8, 8, 4));
        m.insert(ImageFormat::LinearABGR8888, pixel(8, 8, 8, 8, 4));
        m.insert(ImageFormat::LinearARGB8888, pixel(8, 8, 8, 8, 4));
        m.insert(ImageFormat::LinearBGRA8888, pixel(8, 8, 8, 8, 4));
        m.insert(ImageFormat::LinearRGB888, pixel(8, 8, 8, 0, 3));
        m.insert(ImageFormat::LinearBGR888, pixel(8, 8, 8, 0, 3));
        m.insert(ImageFormat::LinearBGRX5551, pixel(5, 5, 5, 0, 2));
        m.insert(ImageFormat::LinearI8, pixel(0, 0, 0, 0, 1));
        m.insert(ImageFormat::LinearRGBA16161616, pixel(16, 16, 16, 16, 8));
        m.insert(ImageFormat::LeBGRX8888, pixel(8, 8, 8, 0, 4));
        m.insert(ImageFormat::LeBGRA8888, pixel(8, 8, 8, 8, 4));
        m
    };
}

pub(crate) fn is_image_format_supported(format: ImageFormat) -> bool {
    IMAGE_FORMAT_INFO_MAP.contains_key(&format)
}

/// Bytes taken by one row of pixels, or one row of blocks for compressed formats.
pub(crate) fn calculate_row_size(width: u32, format: ImageFormat) -> usize {
    match format.info().map(|info| &info.size_info) {
        Some(FormatSizeInfo::Pixel { bytes_per_pixel }) => *bytes_per_pixel as usize * width as usize,
        Some(FormatSizeInfo::Block {
            block_width,
            bytes_per_block,
            ..
        }) => ((width as usize + *block_width as usize - 1) / *block_width as usize) * *bytes_per_block as usize,
        None => 0,
    }
}

/// Number of rows (block rows for compressed formats) that make up an image of the given height.
pub(crate) fn calculate_row_count(height: u32, format: ImageFormat) -> usize {
    match format.info().map(|info| &info.size_info) {
        Some(FormatSizeInfo::Pixel { .. }) => height as usize,
        Some(FormatSizeInfo::Block { block_height, .. }) => {
            (height as usize + *block_height as usize - 1) / *block_height as usize
        }
        None => 0,
    }
}

/// Byte offset of the pixel (or the block containing the pixel) at `x, y` inside one image.
pub(crate) fn calculate_pixel_offset(x: u32, y: u32, width: u32, format: ImageFormat) -> usize {
    let row_size = calculate_row_size(width, format);
    match format.info().map(|info| &info.size_info) {
        Some(FormatSizeInfo::Pixel { bytes_per_pixel }) => {
            y as usize * row_size + x as usize * *bytes_per_pixel as usize
        }
        Some(FormatSizeInfo::Block {
            block_width,
            block_height,
            bytes_per_block,
        }) => {
            (y / *block_height as u32) as usize * row_size
                + (x / *block_width as u32) as usize * *bytes_per_block as usize
        }
        None => 0,
    }
}

/// `None` if the size does not fit into a `usize`.
pub(crate) fn checked_image_size(width: u32, height: u32, depth: u32, format: ImageFormat) -> Option<usize> {
    calculate_row_size(width, format)
        .checked_mul(calculate_row_count(height, format))?
        .checked_mul(depth as usize)
}

/// Saturates at `usize::MAX`.
pub fn calculate_image_size(width: u32, height: u32, depth: u32, format: ImageFormat) -> usize {
    checked_image_size(width, height, depth, format).unwrap_or(usize::MAX)
}
