use std::sync::Arc;

use crate::attribute::{Attribute, AttributeSemantic};
use crate::error::ModelError;
use crate::feature_id::{
    check_feature_texture, FeatureIdAttribute, FeatureIdTexture, FeatureMetadataHandle,
};
use crate::indices::Indices;
use crate::material::MaterialAsset;
use crate::value::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveAssetMode {
    Points,
    LineList,
    LineLoop,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

/// Additive deltas over a primitive's base attributes. A semantic
/// missing here contributes a zero delta.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MorphTarget {
    pub attributes: Vec<Attribute>,
}

impl MorphTarget {
    pub fn attribute(&self, semantic: &AttributeSemantic) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.semantic == *semantic)
    }
}

/// One drawable unit: attributes plus indices, topology, material,
/// morph data and feature ID bindings.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimitiveAsset {
    pub attributes: Vec<Attribute>,
    pub morph_targets: Vec<MorphTarget>,
    /// Blend weight per morph target. Animation may rewrite these each
    /// frame, the lengths must stay equal.
    pub morph_weights: Vec<f32>,
    /// `None` means a non-indexed draw.
    pub indices: Option<Indices>,
    pub material: Option<Arc<MaterialAsset>>,
    pub mode: PrimitiveAssetMode,
    pub feature_id_attributes: Vec<FeatureIdAttribute>,
    pub feature_id_textures: Vec<FeatureIdTexture>,
    /// Feature textures in the external metadata that apply to this
    /// primitive, on top of any per-texel ID bindings.
    pub feature_texture_ids: Vec<String>,
}

impl PrimitiveAsset {
    pub fn attribute(&self, semantic: &AttributeSemantic) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.semantic == *semantic)
    }

    /// The element at `index` with all morph targets applied:
    /// `base + Σ weight_k * delta_k`. Nothing is cached, callers that
    /// blend per frame should do their own buffering.
    pub fn morphed_value(
        &self,
        semantic: &AttributeSemantic,
        index: usize,
    ) -> Result<Value, ModelError> {
        if self.morph_weights.len() != self.morph_targets.len() {
            return Err(ModelError::MorphTargetWeightMismatch {
                targets: self.morph_targets.len(),
                weights: self.morph_weights.len(),
            });
        }
        let base = self
            .attribute(semantic)
            .ok_or_else(|| ModelError::MissingAttribute {
                entity: "Primitive.attributes",
                semantic: semantic.clone(),
            })?;
        let mut value = base.value_at(index)?;
        for (target, weight) in self.morph_targets.iter().zip(&self.morph_weights) {
            // A target without the semantic contributes a zero delta.
            let delta = match target.attribute(semantic) {
                Some(delta_attribute) => delta_attribute.value_at(index)?,
                None => Value::zero(value.ty()),
            };
            let expected = value.ty();
            if delta.ty() != expected {
                return Err(ModelError::ShapeMismatch {
                    entity: "MorphTarget.attributes",
                    field: "type",
                    expected,
                    actual: delta.ty(),
                });
            }
            value = value
                .zip(&delta, |base, delta| base + *weight * delta)
                .ok_or(ModelError::ShapeMismatch {
                    entity: "MorphTarget.attributes",
                    field: "type",
                    expected,
                    actual: delta.ty(),
                })?;
        }
        Ok(value)
    }

    pub fn validate(&self, metadata: Option<&FeatureMetadataHandle>) -> Result<(), ModelError> {
        for attribute in &self.attributes {
            attribute.validate("Primitive.attributes")?;
        }
        if let Some(indices) = &self.indices {
            indices.validate()?;
        }
        if self.morph_weights.len() != self.morph_targets.len() {
            return Err(ModelError::MorphTargetWeightMismatch {
                targets: self.morph_targets.len(),
                weights: self.morph_weights.len(),
            });
        }
        for target in &self.morph_targets {
            for attribute in &target.attributes {
                attribute.validate("MorphTarget.attributes")?;
                let base = self.attribute(&attribute.semantic).ok_or_else(|| {
                    ModelError::MissingAttribute {
                        entity: "MorphTarget.attributes",
                        semantic: attribute.semantic.clone(),
                    }
                })?;
                if attribute.count != base.count {
                    return Err(ModelError::MorphTargetCountMismatch {
                        semantic: attribute.semantic.clone(),
                        base: base.count,
                        target: attribute.count,
                    });
                }
                if attribute.ty != base.ty {
                    return Err(ModelError::ShapeMismatch {
                        entity: "MorphTarget.attributes",
                        field: "type",
                        expected: base.ty,
                        actual: attribute.ty,
                    });
                }
            }
        }
        for feature_ids in &self.feature_id_attributes {
            feature_ids.validate(&self.attributes, "Primitive.feature_id_attributes", metadata)?;
        }
        for feature_ids in &self.feature_id_textures {
            feature_ids.validate(&self.attributes, "Primitive.feature_id_textures", metadata)?;
        }
        for id in &self.feature_texture_ids {
            check_feature_texture(id, metadata)?;
        }
        Ok(())
    }
}
