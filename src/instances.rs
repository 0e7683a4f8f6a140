use glam::{Mat4, Quat, Vec3};

use crate::attribute::{Attribute, AttributeSemantic};
use crate::error::ModelError;
use crate::feature_id::{FeatureIdAttribute, FeatureMetadataHandle};
use crate::node::DecomposedTransform;
use crate::value::{AttributeType, Value};

/// Per-instance data for GPU instancing. Each instance is one element
/// across the attribute set: a translation/rotation/scale triple, any of
/// which may be absent, plus optional per-instance feature IDs.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstancesAsset {
    pub attributes: Vec<Attribute>,
    pub feature_id_attributes: Vec<FeatureIdAttribute>,
    /// Apply instance transforms in world space instead of the owning
    /// node's local space.
    pub transform_in_world_space: bool,
}

impl InstancesAsset {
    pub fn attribute(&self, semantic: &AttributeSemantic) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.semantic == *semantic)
    }

    /// The number of instances: the translation attribute's count, then
    /// a feature ID attribute's, then any attribute's. Zero when there
    /// are no attributes at all.
    pub fn count(&self) -> usize {
        if let Some(attribute) = self.attribute(&AttributeSemantic::Translation) {
            return attribute.count;
        }
        if let Some(attribute) = self
            .attributes
            .iter()
            .find(|attribute| matches!(attribute.semantic, AttributeSemantic::FeatureId(_)))
        {
            return attribute.count;
        }
        self.attributes
            .first()
            .map(|attribute| attribute.count)
            .unwrap_or(0)
    }

    /// The local transform of instance `index`, composed as translation
    /// times rotation times scale. Absent parts take identity values.
    pub fn transform_at(&self, index: usize) -> Result<Mat4, ModelError> {
        let count = self.count();
        if index >= count {
            return Err(ModelError::OutOfBounds {
                entity: "Instances",
                index,
                count,
            });
        }
        let translation = match self.attribute(&AttributeSemantic::Translation) {
            Some(attribute) => expect_vec3(attribute.value_at(index)?, "TRANSLATION")?,
            None => Vec3::ZERO,
        };
        let rotation = match self.attribute(&AttributeSemantic::Rotation) {
            Some(attribute) => {
                let value = attribute.value_at(index)?;
                let Value::Vec4(quat) = value else {
                    return Err(ModelError::ShapeMismatch {
                        entity: "Instances.attributes",
                        field: "ROTATION",
                        expected: AttributeType::Vec4,
                        actual: value.ty(),
                    });
                };
                Quat::from_xyzw(quat.x, quat.y, quat.z, quat.w).normalize()
            }
            None => Quat::IDENTITY,
        };
        let scale = match self.attribute(&AttributeSemantic::Scale) {
            Some(attribute) => expect_vec3(attribute.value_at(index)?, "SCALE")?,
            None => Vec3::ONE,
        };
        Ok(DecomposedTransform {
            translation,
            rotation,
            scale,
        }
        .into())
    }

    pub fn validate(&self, metadata: Option<&FeatureMetadataHandle>) -> Result<(), ModelError> {
        if self.attributes.is_empty() {
            return Err(ModelError::EmptyInstances);
        }
        let expected = self.count();
        for attribute in &self.attributes {
            attribute.validate("Instances.attributes")?;
            if attribute.count != expected {
                return Err(ModelError::InstanceCountMismatch {
                    semantic: attribute.semantic.clone(),
                    expected,
                    actual: attribute.count,
                });
            }
        }
        for (semantic, expected_ty, field) in [
            (AttributeSemantic::Translation, AttributeType::Vec3, "TRANSLATION"),
            (AttributeSemantic::Rotation, AttributeType::Vec4, "ROTATION"),
            (AttributeSemantic::Scale, AttributeType::Vec3, "SCALE"),
        ] {
            if let Some(attribute) = self.attribute(&semantic) {
                if attribute.ty != expected_ty {
                    return Err(ModelError::ShapeMismatch {
                        entity: "Instances.attributes",
                        field,
                        expected: expected_ty,
                        actual: attribute.ty,
                    });
                }
            }
        }
        for feature_ids in &self.feature_id_attributes {
            feature_ids.validate(&self.attributes, "Instances.feature_id_attributes", metadata)?;
        }
        Ok(())
    }
}

fn expect_vec3(value: Value, field: &'static str) -> Result<Vec3, ModelError> {
    match value {
        Value::Vec3(value) => Ok(value),
        other => Err(ModelError::ShapeMismatch {
            entity: "Instances.attributes",
            field,
            expected: AttributeType::Vec3,
            actual: other.ty(),
        }),
    }
}
