use crate::attribute::{Attribute, AttributeSemantic};
use crate::error::ModelError;
use crate::texture::{TexelFetch, TextureInfo};
use crate::value::{AttributeType, Value};

/// Where per-vertex or per-instance feature IDs come from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FeatureIdSource {
    /// IDs are stored in the attribute with this semantic.
    Attribute(AttributeSemantic),
    /// IDs are computed from the element index alone:
    /// `constant + index / max(divisor, 1)`.
    Implicit { constant: u64, divisor: u64 },
}

/// Binds elements to rows of an externally stored feature table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureIdAttribute {
    pub feature_table_id: String,
    pub source: FeatureIdSource,
}

impl FeatureIdAttribute {
    /// The feature ID for the element at `index`. `attributes` is the
    /// owning attribute set; only the `Attribute` source consults it,
    /// and only the `Attribute` source can detect an out-of-bounds
    /// index.
    pub fn resolve(&self, attributes: &[Attribute], index: usize) -> Result<u64, ModelError> {
        match &self.source {
            FeatureIdSource::Attribute(semantic) => {
                let attribute = find_attribute(attributes, semantic, "FeatureIdAttribute")?;
                attribute.integer_at(index)
            }
            FeatureIdSource::Implicit { constant, divisor } => {
                Ok(constant + index as u64 / (*divisor).max(1))
            }
        }
    }

    pub fn validate(
        &self,
        attributes: &[Attribute],
        entity: &'static str,
        metadata: Option<&FeatureMetadataHandle>,
    ) -> Result<(), ModelError> {
        if let FeatureIdSource::Attribute(semantic) = &self.source {
            find_attribute(attributes, semantic, entity)?;
        }
        check_feature_table(&self.feature_table_id, metadata)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureChannel {
    R,
    G,
    B,
    A,
}

impl TextureChannel {
    pub fn index(self) -> usize {
        match self {
            TextureChannel::R => 0,
            TextureChannel::G => 1,
            TextureChannel::B => 2,
            TextureChannel::A => 3,
        }
    }
}

/// Binds texels to rows of an externally stored feature table. The ID
/// for a vertex is one channel of the texel its texture coordinates
/// land on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureIdTexture {
    pub feature_table_id: String,
    pub channel: TextureChannel,
    pub texture: TextureInfo,
}

impl FeatureIdTexture {
    /// The feature ID for the vertex at `index`, read through `source`.
    /// Texture coordinates are passed to the source as stored; any
    /// texture transform is left to GPU consumers.
    pub fn resolve(
        &self,
        attributes: &[Attribute],
        index: usize,
        source: &dyn TexelFetch,
    ) -> Result<u64, ModelError> {
        let semantic = AttributeSemantic::TexCoord(self.texture.tex_coord as u32);
        let attribute = find_attribute(attributes, &semantic, "FeatureIdTexture")?;
        let uv = attribute.value_at(index)?;
        let Value::Vec2(uv) = uv else {
            return Err(ModelError::ShapeMismatch {
                entity: "FeatureIdTexture",
                field: "texcoord",
                expected: AttributeType::Vec2,
                actual: uv.ty(),
            });
        };
        let texel = source
            .fetch_texel(self.texture.texture, uv)
            .ok_or(ModelError::TextureUnavailable {
                texture: self.texture.texture,
            })?;
        Ok(texel[self.channel.index()] as u64)
    }

    pub fn validate(
        &self,
        attributes: &[Attribute],
        entity: &'static str,
        metadata: Option<&FeatureMetadataHandle>,
    ) -> Result<(), ModelError> {
        let semantic = AttributeSemantic::TexCoord(self.texture.tex_coord as u32);
        find_attribute(attributes, &semantic, entity)?;
        check_feature_table(&self.feature_table_id, metadata)
    }
}

/// Names the feature tables and feature textures an external metadata
/// store holds for this model. The rows themselves live outside the
/// component graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeatureMetadataHandle {
    pub feature_table_ids: Vec<String>,
    pub feature_texture_ids: Vec<String>,
}

impl FeatureMetadataHandle {
    pub fn has_feature_table(&self, id: &str) -> bool {
        self.feature_table_ids.iter().any(|table| table == id)
    }

    pub fn has_feature_texture(&self, id: &str) -> bool {
        self.feature_texture_ids.iter().any(|texture| texture == id)
    }
}

fn find_attribute<'a>(
    attributes: &'a [Attribute],
    semantic: &AttributeSemantic,
    entity: &'static str,
) -> Result<&'a Attribute, ModelError> {
    attributes
        .iter()
        .find(|attribute| attribute.semantic == *semantic)
        .ok_or_else(|| ModelError::MissingAttribute {
            entity,
            semantic: semantic.clone(),
        })
}

pub(crate) fn check_feature_table(
    id: &str,
    metadata: Option<&FeatureMetadataHandle>,
) -> Result<(), ModelError> {
    match metadata {
        Some(handle) if handle.has_feature_table(id) => Ok(()),
        _ => Err(ModelError::UnknownFeatureTable { id: id.to_string() }),
    }
}

pub(crate) fn check_feature_texture(
    id: &str,
    metadata: Option<&FeatureMetadataHandle>,
) -> Result<(), ModelError> {
    match metadata {
        Some(handle) if handle.has_feature_texture(id) => Ok(()),
        _ => Err(ModelError::UnknownFeatureTexture { id: id.to_string() }),
    }
}
