use crate::node::NodeIndex;

/// The root set of the node hierarchy. Nodes outside the scene are
/// still part of the model, skins may refer to them as joints.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SceneAsset {
    pub name: Option<String>,
    pub nodes: Vec<NodeIndex>,
}
