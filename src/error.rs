use std::error::Error;
use std::fmt::{self, Display, Formatter};

use crate::attribute::AttributeSemantic;
use crate::texture::TextureHandle;
use crate::value::AttributeType;

/// Every fallible operation in this crate reports through this type.
/// `entity` fields name the owning structure so a fault in a deep graph
/// can be traced back to its source.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// An element index past the end of an attribute, index view or
    /// instance set. A caller contract violation, not a malformed asset.
    OutOfBounds {
        entity: &'static str,
        index: usize,
        count: usize,
    },
    /// A view needs more bytes than its buffer holds.
    BufferTooShort {
        entity: &'static str,
        needed: usize,
        actual: usize,
    },
    /// A value's shape disagrees with the shape its field requires.
    ShapeMismatch {
        entity: &'static str,
        field: &'static str,
        expected: AttributeType,
        actual: AttributeType,
    },
    /// `normalized` is only meaningful for integer components.
    NormalizedFloat { semantic: AttributeSemantic },
    /// A node supplied both a matrix and decomposed transform parts.
    ConflictingNodeTransform,
    MorphTargetWeightMismatch { targets: usize, weights: usize },
    MorphTargetCountMismatch {
        semantic: AttributeSemantic,
        base: usize,
        target: usize,
    },
    MissingAttribute {
        entity: &'static str,
        semantic: AttributeSemantic,
    },
    NonIntegralFeatureId {
        semantic: AttributeSemantic,
        index: usize,
    },
    NegativeFeatureId {
        semantic: AttributeSemantic,
        index: usize,
        value: i64,
    },
    InstanceCountMismatch {
        semantic: AttributeSemantic,
        expected: usize,
        actual: usize,
    },
    EmptyInstances,
    SkinLengthMismatch { joints: usize, matrices: usize },
    /// A node reference (child, root or joint) outside the node list.
    NodeIndexOutOfRange {
        entity: &'static str,
        index: usize,
        count: usize,
    },
    MultipleParents { node: usize },
    NodeCycle { node: usize },
    UnknownFeatureTable { id: String },
    UnknownFeatureTexture { id: String },
    /// The texel source could not resolve a texture handle. A runtime
    /// availability fault, not a malformed asset.
    TextureUnavailable { texture: TextureHandle },
}

impl ModelError {
    /// Whether the error describes a defect in the asset itself, as
    /// opposed to a caller contract or runtime availability fault.
    pub fn is_malformed_asset(&self) -> bool {
        !matches!(
            self,
            ModelError::OutOfBounds { .. } | ModelError::TextureUnavailable { .. }
        )
    }
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::OutOfBounds {
                entity,
                index,
                count,
            } => write!(f, "{entity} element {index} out of bounds, count is {count}"),
            ModelError::BufferTooShort {
                entity,
                needed,
                actual,
            } => write!(
                f,
                "{entity} needs {needed} bytes but its buffer holds {actual}"
            ),
            ModelError::ShapeMismatch {
                entity,
                field,
                expected,
                actual,
            } => write!(
                f,
                "{entity} {field} expects {expected:?} but got {actual:?}"
            ),
            ModelError::NormalizedFloat { semantic } => {
                write!(f, "Attribute {semantic} is normalized but not integer typed")
            }
            ModelError::ConflictingNodeTransform => {
                write!(f, "Node has both a matrix and decomposed transform parts")
            }
            ModelError::MorphTargetWeightMismatch { targets, weights } => write!(
                f,
                "Primitive has {targets} morph targets but {weights} morph weights"
            ),
            ModelError::MorphTargetCountMismatch {
                semantic,
                base,
                target,
            } => write!(
                f,
                "Morph target attribute {semantic} has {target} elements, base has {base}"
            ),
            ModelError::MissingAttribute { entity, semantic } => {
                write!(f, "{entity} refers to missing attribute {semantic}")
            }
            ModelError::NonIntegralFeatureId { semantic, index } => write!(
                f,
                "Feature ID attribute {semantic} holds a non-integral value at {index}"
            ),
            ModelError::NegativeFeatureId {
                semantic,
                index,
                value,
            } => write!(
                f,
                "Feature ID attribute {semantic} holds negative value {value} at {index}"
            ),
            ModelError::InstanceCountMismatch {
                semantic,
                expected,
                actual,
            } => write!(
                f,
                "Instance attribute {semantic} has {actual} elements, expected {expected}"
            ),
            ModelError::EmptyInstances => {
                write!(f, "Instance set has no attributes to take a count from")
            }
            ModelError::SkinLengthMismatch { joints, matrices } => write!(
                f,
                "Skin has {joints} joints but {matrices} inverse bind matrices"
            ),
            ModelError::NodeIndexOutOfRange {
                entity,
                index,
                count,
            } => write!(f, "{entity} refers to node {index}, node count is {count}"),
            ModelError::MultipleParents { node } => {
                write!(f, "Node {node} is referenced as a child or root more than once")
            }
            ModelError::NodeCycle { node } => {
                write!(f, "Node {node} is part of a hierarchy cycle")
            }
            ModelError::UnknownFeatureTable { id } => {
                write!(f, "Feature table {id:?} is not present in the feature metadata")
            }
            ModelError::UnknownFeatureTexture { id } => {
                write!(f, "Feature texture {id:?} is not present in the feature metadata")
            }
            ModelError::TextureUnavailable { texture } => {
                write!(f, "Texture {texture:?} is not available to the texel source")
            }
        }
    }
}

impl Error for ModelError {}
