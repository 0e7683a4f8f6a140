use glam::Mat4;

use crate::error::ModelError;
use crate::node::NodeIndex;

/// Skeletal binding for a skinned mesh. Joints refer into the model's
/// node list, one inverse bind matrix per joint.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkinAsset {
    pub name: Option<String>,
    pub joints: Vec<NodeIndex>,
    pub inverse_bind_matrices: Vec<Mat4>,
}

impl SkinAsset {
    /// One skinning matrix per joint: the joint's world transform times
    /// its inverse bind matrix. `world_transforms` is indexed by node,
    /// as produced by [`ModelAsset::world_transforms`].
    ///
    /// [`ModelAsset::world_transforms`]: crate::model::ModelAsset::world_transforms
    pub fn joint_matrices(&self, world_transforms: &[Mat4]) -> Result<Vec<Mat4>, ModelError> {
        self.validate(world_transforms.len())?;
        Ok(self
            .joints
            .iter()
            .zip(&self.inverse_bind_matrices)
            .map(|(joint, inverse_bind_matrix)| world_transforms[joint.0] * *inverse_bind_matrix)
            .collect())
    }

    pub fn validate(&self, node_count: usize) -> Result<(), ModelError> {
        if self.joints.len() != self.inverse_bind_matrices.len() {
            return Err(ModelError::SkinLengthMismatch {
                joints: self.joints.len(),
                matrices: self.inverse_bind_matrices.len(),
            });
        }
        for joint in &self.joints {
            if joint.0 >= node_count {
                return Err(ModelError::NodeIndexOutOfRange {
                    entity: "Skin.joints",
                    index: joint.0,
                    count: node_count,
                });
            }
        }
        Ok(())
    }
}
