use glam::Mat4;

use log::warn;

use crate::error::ModelError;
use crate::feature_id::FeatureMetadataHandle;
use crate::node::{NodeAsset, NodeIndex};
use crate::scene::SceneAsset;

/// The root of a loaded model: every node the asset defines, the scene
/// that selects the drawn roots, and the handle to external feature
/// metadata. Nodes own their primitives and instance data; hierarchy
/// edges and skin joints are [`NodeIndex`] references into `nodes`.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelAsset {
    pub scene: SceneAsset,
    pub nodes: Vec<NodeAsset>,
    pub feature_metadata: Option<FeatureMetadataHandle>,
}

impl ModelAsset {
    pub fn node(&self, index: NodeIndex) -> Result<&NodeAsset, ModelError> {
        self.nodes.get(index.0).ok_or(ModelError::NodeIndexOutOfRange {
            entity: "Model.nodes",
            index: index.0,
            count: self.nodes.len(),
        })
    }

    /// Mutable access for animation systems that drive transforms and
    /// morph weights.
    pub fn node_mut(&mut self, index: NodeIndex) -> Result<&mut NodeAsset, ModelError> {
        let count = self.nodes.len();
        self.nodes
            .get_mut(index.0)
            .ok_or(ModelError::NodeIndexOutOfRange {
                entity: "Model.nodes",
                index: index.0,
                count,
            })
    }

    /// The parent of each node plus a parent-before-child order over
    /// the whole forest. Rejects out-of-range children, nodes claimed
    /// by two parents, and cycles.
    fn hierarchy(&self) -> Result<(Vec<Option<usize>>, Vec<usize>), ModelError> {
        let count = self.nodes.len();
        let mut parents = vec![None; count];
        for (index, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                if child.0 >= count {
                    return Err(ModelError::NodeIndexOutOfRange {
                        entity: "Node.children",
                        index: child.0,
                        count,
                    });
                }
                if parents[child.0].is_some() {
                    return Err(ModelError::MultipleParents { node: child.0 });
                }
                parents[child.0] = Some(index);
            }
        }
        let mut order = Vec::with_capacity(count);
        let mut stack: Vec<usize> = (0..count).rev().filter(|index| parents[*index].is_none()).collect();
        while let Some(index) = stack.pop() {
            order.push(index);
            for child in self.nodes[index].children.iter().rev() {
                stack.push(child.0);
            }
        }
        if order.len() != count {
            let mut seen = vec![false; count];
            for index in &order {
                seen[*index] = true;
            }
            // Single parentage holds here, so anything unreached sits
            // on a cycle.
            let node = (0..count).find(|index| !seen[*index]).unwrap_or(0);
            return Err(ModelError::NodeCycle { node });
        }
        Ok((parents, order))
    }

    /// The world transform of every node, indexed like `nodes`. Roots
    /// compose against identity, children top-down against their
    /// parent. Nodes outside the scene are resolved too.
    pub fn world_transforms(&self) -> Result<Vec<Mat4>, ModelError> {
        let (parents, order) = self.hierarchy()?;
        let mut worlds = vec![Mat4::IDENTITY; self.nodes.len()];
        for index in order {
            let local = self.nodes[index].transform.to_matrix();
            worlds[index] = match parents[index] {
                Some(parent) => worlds[parent] * local,
                None => local,
            };
        }
        Ok(worlds)
    }

    /// Visits every node reachable from the scene in depth-first
    /// pre-order, handing each its world transform.
    pub fn traverse<F: FnMut(NodeIndex, &NodeAsset, Mat4)>(
        &self,
        mut visit: F,
    ) -> Result<(), ModelError> {
        let (parents, _) = self.hierarchy()?;
        self.check_roots(&parents)?;
        let mut stack: Vec<(NodeIndex, Mat4)> = Vec::new();
        for root in self.scene.nodes.iter().rev() {
            stack.push((*root, Mat4::IDENTITY));
        }
        while let Some((index, parent_world)) = stack.pop() {
            let node = &self.nodes[index.0];
            let world = parent_world * node.transform.to_matrix();
            visit(index, node, world);
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
        Ok(())
    }

    /// A root claimed twice, or claimed by a child list, would be
    /// visited more than once.
    fn check_roots(&self, parents: &[Option<usize>]) -> Result<(), ModelError> {
        let count = self.nodes.len();
        let mut seen = vec![false; count];
        for root in &self.scene.nodes {
            if root.0 >= count {
                return Err(ModelError::NodeIndexOutOfRange {
                    entity: "Scene.nodes",
                    index: root.0,
                    count,
                });
            }
            if seen[root.0] || parents[root.0].is_some() {
                return Err(ModelError::MultipleParents { node: root.0 });
            }
            seen[root.0] = true;
        }
        Ok(())
    }

    /// Checks the whole graph: hierarchy shape, scene roots, every
    /// primitive, instance set and skin, and that feature references
    /// resolve against the attached metadata. Nodes that neither the
    /// scene nor any skin can reach are only warned about, real assets
    /// carry them.
    pub fn validate(&self) -> Result<(), ModelError> {
        let (parents, _) = self.hierarchy()?;
        self.check_roots(&parents)?;
        let metadata = self.feature_metadata.as_ref();
        for node in &self.nodes {
            for primitive in &node.primitives {
                primitive.validate(metadata)?;
            }
            if let Some(instances) = &node.instances {
                instances.validate(metadata)?;
            }
            if let Some(skin) = &node.skin {
                skin.validate(self.nodes.len())?;
            }
        }
        let mut referenced = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = self.scene.nodes.iter().map(|root| root.0).collect();
        while let Some(index) = stack.pop() {
            if referenced[index] {
                continue;
            }
            referenced[index] = true;
            stack.extend(self.nodes[index].children.iter().map(|child| child.0));
        }
        for node in &self.nodes {
            let Some(skin) = &node.skin else { continue };
            for joint in &skin.joints {
                // Joints and their ancestors position the skeleton even
                // when the scene never reaches them.
                let mut current = Some(joint.0);
                while let Some(index) = current {
                    if referenced[index] {
                        break;
                    }
                    referenced[index] = true;
                    current = parents[index];
                }
            }
        }
        for (index, flag) in referenced.iter().enumerate() {
            if !flag {
                warn!("Node {index} is not reachable from the scene and is not used by a skin");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use glam::{Mat4, Vec3};

    use crate::attribute::{Attribute, AttributeData, AttributeSemantic};
    use crate::error::ModelError;
    use crate::feature_id::{FeatureIdAttribute, FeatureIdSource, FeatureMetadataHandle};
    use crate::instances::InstancesAsset;
    use crate::node::{DecomposedTransform, NodeAsset, NodeIndex, NodeTransform};
    use crate::primitive::PrimitiveAsset;
    use crate::scene::SceneAsset;
    use crate::skin::SkinAsset;
    use crate::value::{AttributeType, ComponentDatatype};

    use super::ModelAsset;

    fn translated_node(translation: Vec3, children: Vec<NodeIndex>) -> NodeAsset {
        NodeAsset {
            transform: NodeTransform::Decomposed(DecomposedTransform {
                translation,
                ..DecomposedTransform::default()
            }),
            children,
            ..NodeAsset::default()
        }
    }

    fn chain_model() -> ModelAsset {
        ModelAsset {
            scene: SceneAsset {
                name: None,
                nodes: vec![NodeIndex(0)],
            },
            nodes: vec![
                translated_node(Vec3::new(1.0, 1.0, 0.0), vec![NodeIndex(1)]),
                translated_node(Vec3::new(1.0, 2.0, 0.0), vec![]),
            ],
            feature_metadata: None,
        }
    }

    #[test]
    fn world_transforms_compose_top_down() {
        let worlds = chain_model().world_transforms().unwrap();
        assert_eq!(
            worlds[0].transform_point3(Vec3::ZERO),
            Vec3::new(1.0, 1.0, 0.0)
        );
        assert_eq!(
            worlds[1].transform_point3(Vec3::ZERO),
            Vec3::new(2.0, 3.0, 0.0)
        );
    }

    #[test]
    fn nodes_outside_the_scene_root_at_identity() {
        let mut model = chain_model();
        model
            .nodes
            .push(translated_node(Vec3::new(9.0, 0.0, 0.0), vec![]));
        let worlds = model.world_transforms().unwrap();
        assert_eq!(
            worlds[2].transform_point3(Vec3::ZERO),
            Vec3::new(9.0, 0.0, 0.0)
        );
    }

    #[test]
    fn a_node_cannot_have_two_parents() {
        let mut model = chain_model();
        model.nodes[1].children.push(NodeIndex(0));
        // Node 1 now claims node 0, which the scene also roots; make it
        // a true double claim through another child list.
        model.nodes.push(translated_node(Vec3::ZERO, vec![NodeIndex(1)]));
        assert_eq!(
            model.world_transforms(),
            Err(ModelError::MultipleParents { node: 1 })
        );
    }

    #[test]
    fn cycles_are_detected() {
        let mut model = chain_model();
        model.nodes[1].children.push(NodeIndex(0));
        model.scene.nodes.clear();
        assert_eq!(
            model.world_transforms(),
            Err(ModelError::NodeCycle { node: 0 })
        );
    }

    #[test]
    fn child_references_must_be_in_range() {
        let mut model = chain_model();
        model.nodes[1].children.push(NodeIndex(7));
        assert_eq!(
            model.world_transforms(),
            Err(ModelError::NodeIndexOutOfRange {
                entity: "Node.children",
                index: 7,
                count: 2,
            })
        );
    }

    #[test]
    fn scene_roots_must_be_in_range_and_unique() {
        let mut model = chain_model();
        model.scene.nodes.push(NodeIndex(5));
        assert_eq!(
            model.validate(),
            Err(ModelError::NodeIndexOutOfRange {
                entity: "Scene.nodes",
                index: 5,
                count: 2,
            })
        );
        let mut model = chain_model();
        model.scene.nodes.push(NodeIndex(0));
        assert_eq!(
            model.validate(),
            Err(ModelError::MultipleParents { node: 0 })
        );
    }

    #[test]
    fn a_scene_root_cannot_also_be_a_child() {
        let mut model = chain_model();
        // Node 1 is already node 0's child; rooting it as well would
        // visit it twice, under two different worlds.
        model.scene.nodes.push(NodeIndex(1));
        assert_eq!(
            model.validate(),
            Err(ModelError::MultipleParents { node: 1 })
        );
        let mut visited = Vec::new();
        assert_eq!(
            model.traverse(|index, _node, _world| visited.push(index.0)),
            Err(ModelError::MultipleParents { node: 1 })
        );
        assert!(visited.is_empty());
    }

    #[test]
    fn node_lookup_reports_bad_indices() {
        let mut model = chain_model();
        assert!(model.node(NodeIndex(1)).is_ok());
        assert_eq!(
            model.node(NodeIndex(2)).err(),
            Some(ModelError::NodeIndexOutOfRange {
                entity: "Model.nodes",
                index: 2,
                count: 2,
            })
        );
        assert!(model.node_mut(NodeIndex(0)).is_ok());
    }

    #[test]
    fn traverse_visits_scene_nodes_in_preorder() {
        let mut model = chain_model();
        model
            .nodes
            .push(translated_node(Vec3::new(5.0, 0.0, 0.0), vec![]));
        model.scene.nodes.push(NodeIndex(2));
        let mut visited = Vec::new();
        model
            .traverse(|index, _node, world| {
                visited.push((index.0, world.transform_point3(Vec3::ZERO)));
            })
            .unwrap();
        assert_eq!(
            visited,
            vec![
                (0, Vec3::new(1.0, 1.0, 0.0)),
                (1, Vec3::new(2.0, 3.0, 0.0)),
                (2, Vec3::new(5.0, 0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn skinned_joints_resolve_through_world_transforms() {
        let mut model = chain_model();
        let skin = Arc::new(SkinAsset {
            name: None,
            joints: vec![NodeIndex(1)],
            inverse_bind_matrices: vec![Mat4::from_translation(Vec3::new(-2.0, -3.0, 0.0))],
        });
        model.nodes[0].skin = Some(skin.clone());
        assert!(model.validate().is_ok());
        let worlds = model.world_transforms().unwrap();
        let joints = skin.joint_matrices(&worlds).unwrap();
        assert!(joints[0].abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn validate_covers_primitives_instances_and_metadata() {
        let mut model = chain_model();
        model.feature_metadata = Some(FeatureMetadataHandle {
            feature_table_ids: vec!["parts".to_string()],
            feature_texture_ids: Vec::new(),
        });
        model.nodes[1].primitives.push(PrimitiveAsset {
            attributes: vec![Attribute::new(
                AttributeSemantic::Position,
                ComponentDatatype::F32,
                AttributeType::Vec3,
                0,
                AttributeData::TypedArray(Vec::new()),
            )],
            feature_id_attributes: vec![FeatureIdAttribute {
                feature_table_id: "parts".to_string(),
                source: FeatureIdSource::Implicit {
                    constant: 1,
                    divisor: 0,
                },
            }],
            ..PrimitiveAsset::default()
        });
        model.nodes[1].instances = Some(InstancesAsset {
            attributes: vec![Attribute::new(
                AttributeSemantic::Translation,
                ComponentDatatype::F32,
                AttributeType::Vec3,
                0,
                AttributeData::TypedArray(Vec::new()),
            )],
            ..InstancesAsset::default()
        });
        assert!(model.validate().is_ok());
        model.nodes[1].primitives[0].feature_id_attributes[0].feature_table_id =
            "missing".to_string();
        assert_eq!(
            model.validate(),
            Err(ModelError::UnknownFeatureTable {
                id: "missing".to_string(),
            })
        );
    }
}
