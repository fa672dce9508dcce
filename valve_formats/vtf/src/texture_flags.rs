bitflags! {
  /// Flags stored in the texture header. Bits without a name are kept as they are.
  #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
  pub struct TextureFlags: u32 {
    const POINTSAMPLE = 0x0000_0001;
    const TRILINEAR = 0x0000_0002;
    const CLAMPS = 0x0000_0004;
    const CLAMPT = 0x0000_0008;
    const ANISOTROPIC = 0x0000_0010;
    const HINT_DXT5 = 0x0000_0020;
    const SRGB = 0x0000_0040;
    const NORMAL = 0x0000_0080;
    const NOMIP = 0x0000_0100;
    const NOLOD = 0x0000_0200;
    const ALL_MIPS = 0x0000_0400;
    const PROCEDURAL = 0x0000_0800;
    const ONEBITALPHA = 0x0000_1000;
    const EIGHTBITALPHA = 0x0000_2000;
    const ENVMAP = 0x0000_4000;
    const RENDERTARGET = 0x0000_8000;
    const DEPTHRENDERTARGET = 0x0001_0000;
    const NODEBUGOVERRIDE = 0x0002_0000;
    const SINGLECOPY = 0x0004_0000;
    const STAGING_MEMORY = 0x0008_0000;
    const IMMEDIATE_CLEANUP = 0x0010_0000;
    const IGNORE_PICMIP = 0x0020_0000;
    const UNUSED_00400000 = 0x0040_0000;
    const NODEPTHBUFFER = 0x0080_0000;
    const UNUSED_01000000 = 0x0100_0000;
    const CLAMPU = 0x0200_0000;
    const VERTEXTEXTURE = 0x0400_0000;
    const SSBUMP = 0x0800_0000;
    const UNUSED_10000000 = 0x1000_0000;
    const BORDER = 0x2000_0000;
    const UNUSED_40000000 = 0x4000_0000;
    const UNUSED_80000000 = 0x8000_0000;
  }
}
