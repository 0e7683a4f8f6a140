use log::warn;

use crate::texture::{NormalTextureInfo, OcclusionTextureInfo, TextureInfo};

/// Alpha cutoff applied when a mask mode gives none of its own.
pub const DEFAULT_ALPHA_CUTOFF: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetallicRoughness {
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<TextureInfo>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub metallic_roughness_texture: Option<TextureInfo>,
}

impl Default for MetallicRoughness {
    fn default() -> Self {
        Self {
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpecularGlossiness {
    pub diffuse_factor: [f32; 4],
    pub diffuse_texture: Option<TextureInfo>,
    pub specular_factor: [f32; 3],
    pub glossiness_factor: f32,
    pub specular_glossiness_texture: Option<TextureInfo>,
}

impl Default for SpecularGlossiness {
    fn default() -> Self {
        Self {
            diffuse_factor: [1.0, 1.0, 1.0, 1.0],
            diffuse_texture: None,
            specular_factor: [1.0, 1.0, 1.0],
            glossiness_factor: 1.0,
            specular_glossiness_texture: None,
        }
    }
}

/// Define lighting parameters for the material. A material carries
/// exactly one shading model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaterialAssetData {
    /// The standard physically based model.
    MetallicRoughness(MetallicRoughness),
    /// The legacy physically based model, kept for assets that still
    /// ship it.
    SpecularGlossiness(SpecularGlossiness),
}

impl Default for MaterialAssetData {
    fn default() -> Self {
        MaterialAssetData::MetallicRoughness(MetallicRoughness::default())
    }
}

impl MaterialAssetData {
    /// Picks one shading model from what a source format supplied.
    /// Specular glossiness overrides metallic roughness when both are
    /// present, since sources that write both treat the latter as a
    /// fallback. Neither present yields the default model.
    pub fn from_parts(
        metallic_roughness: Option<MetallicRoughness>,
        specular_glossiness: Option<SpecularGlossiness>,
    ) -> Self {
        match (metallic_roughness, specular_glossiness) {
            (Some(_), Some(specular_glossiness)) => {
                warn!("Material carries both shading models, using specular glossiness");
                MaterialAssetData::SpecularGlossiness(specular_glossiness)
            }
            (None, Some(specular_glossiness)) => {
                MaterialAssetData::SpecularGlossiness(specular_glossiness)
            }
            (Some(metallic_roughness), None) => {
                MaterialAssetData::MetallicRoughness(metallic_roughness)
            }
            (None, None) => MaterialAssetData::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaterialAlphaMode {
    #[default]
    Opaque,
    // Alpha cutoff
    Mask(f32),
    Blend,
}

impl MaterialAlphaMode {
    /// A mask mode for sources that name the mode but no cutoff.
    pub fn mask_default() -> Self {
        MaterialAlphaMode::Mask(DEFAULT_ALPHA_CUTOFF)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialAsset {
    pub name: Option<String>,
    pub data: MaterialAssetData,
    pub normal_texture: Option<NormalTextureInfo>,
    pub occlusion_texture: Option<OcclusionTextureInfo>,
    pub emissive_texture: Option<TextureInfo>,
    pub emissive_factor: [f32; 3],
    pub alpha_mode: MaterialAlphaMode,
    pub double_sided: bool,
    /// Skip lighting entirely and draw the base color as is.
    pub unlit: bool,
}
