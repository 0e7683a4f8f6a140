use glam::Vec2;

/// An opaque reference to a texture owned outside this crate. The model
/// graph never holds texel data itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureMagFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureMinFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureMipmapFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureWrappingMode {
    ClampToEdge,
    MirroredRepeat,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplerAsset {
    pub mag_filter: TextureMagFilter,
    pub min_filter: TextureMinFilter,
    pub mipmap_filter: TextureMipmapFilter,
    pub wrap_x: TextureWrappingMode,
    pub wrap_y: TextureWrappingMode,
}

impl Default for SamplerAsset {
    fn default() -> Self {
        Self {
            mag_filter: TextureMagFilter::Linear,
            min_filter: TextureMinFilter::Linear,
            mipmap_filter: TextureMipmapFilter::Linear,
            wrap_x: TextureWrappingMode::Repeat,
            wrap_y: TextureWrappingMode::Repeat,
        }
    }
}

/// An affine remapping of texture coordinates, applied before sampling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureTransform {
    pub offset: [f32; 2],
    pub rotation: f32,
    pub scale: [f32; 2],
    pub tex_coord: Option<usize>,
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self {
            offset: [0.0, 0.0],
            rotation: 0.0,
            scale: [1.0, 1.0],
            tex_coord: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextureInfo {
    pub texture: TextureHandle,
    pub tex_coord: usize,
    pub sampler: SamplerAsset,
    pub transform: Option<TextureTransform>,
}

impl TextureInfo {
    pub fn from_handle(texture: TextureHandle) -> Self {
        Self {
            texture,
            tex_coord: 0,
            sampler: SamplerAsset::default(),
            transform: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalTextureInfo {
    pub texture: TextureInfo,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OcclusionTextureInfo {
    pub texture: TextureInfo,
    pub strength: f32,
}

/// Resolves texture handles to raw texel values. Implemented by whatever
/// owns the actual texture memory, typically a renderer or a loader that
/// kept the source images around.
pub trait TexelFetch {
    /// Samples the texel covering `uv` and returns its channels as raw
    /// unsigned integers in RGBA order, or `None` when the handle is
    /// unknown to this source.
    fn fetch_texel(&self, texture: TextureHandle, uv: Vec2) -> Option<[u32; 4]>;
}
