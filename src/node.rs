use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use crate::error::ModelError;
use crate::instances::InstancesAsset;
use crate::primitive::PrimitiveAsset;
use crate::skin::SkinAsset;

/// Position of a node in [`ModelAsset::nodes`]. Hierarchy edges are
/// indices rather than owned subtrees so skins can point back at joint
/// nodes without sharing ownership.
///
/// [`ModelAsset::nodes`]: crate::model::ModelAsset::nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeIndex(pub usize);

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecomposedTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// A node's local transform, either a baked matrix or decomposed parts.
/// A node never carries both.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeTransform {
    Matrix(Mat4),
    Decomposed(DecomposedTransform),
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::Decomposed(DecomposedTransform::default())
    }
}

impl NodeTransform {
    /// Builds a transform from whatever parts a source format supplied.
    /// A matrix next to any decomposed part is a fault; missing parts
    /// take identity values.
    pub fn from_parts(
        matrix: Option<Mat4>,
        translation: Option<Vec3>,
        rotation: Option<Quat>,
        scale: Option<Vec3>,
    ) -> Result<Self, ModelError> {
        let decomposed = translation.is_some() || rotation.is_some() || scale.is_some();
        match matrix {
            Some(_) if decomposed => Err(ModelError::ConflictingNodeTransform),
            Some(matrix) => Ok(NodeTransform::Matrix(matrix)),
            None => Ok(NodeTransform::Decomposed(DecomposedTransform {
                translation: translation.unwrap_or(Vec3::ZERO),
                rotation: rotation.unwrap_or(Quat::IDENTITY),
                scale: scale.unwrap_or(Vec3::ONE),
            })),
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        match self {
            NodeTransform::Matrix(matrix) => *matrix,
            NodeTransform::Decomposed(decomposed) => decomposed.clone().into(),
        }
    }
}

impl From<DecomposedTransform> for Mat4 {
    fn from(value: DecomposedTransform) -> Self {
        Mat4::from_translation(value.translation)
            * Mat4::from_quat(value.rotation)
            * Mat4::from_scale(value.scale)
    }
}

impl From<NodeTransform> for Mat4 {
    fn from(value: NodeTransform) -> Self {
        value.to_matrix()
    }
}

impl From<NodeTransform> for DecomposedTransform {
    fn from(value: NodeTransform) -> Self {
        match value {
            NodeTransform::Matrix(matrix) => {
                let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
                DecomposedTransform {
                    translation,
                    rotation,
                    scale,
                }
            }
            NodeTransform::Decomposed(decomposed) => decomposed,
        }
    }
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeAsset {
    pub name: Option<String>,
    pub transform: NodeTransform,
    pub children: Vec<NodeIndex>,
    pub primitives: Vec<PrimitiveAsset>,
    /// GPU instancing for this node's primitives. Drawn once per
    /// instance instead of once.
    pub instances: Option<InstancesAsset>,
    pub skin: Option<Arc<SkinAsset>>,
}
