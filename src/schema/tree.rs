use super::profile::ElementProfile;
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// One level of the hierarchical structure summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureNode {
    pub count: u64,
    pub namespace: Option<String>,
    pub attribute_names: Vec<String>,
    pub has_text: bool,
    /// The tag also appears among its own ancestors; children are not repeated
    #[serde(default, skip_serializing_if = "is_false")]
    pub recursive: bool,
    /// Expansion stopped here because the node budget ran out
    #[serde(default, skip_serializing_if = "is_false")]
    pub truncated: bool,
    pub children: BTreeMap<String, StructureNode>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl StructureNode {
    fn leaf(profile: &ElementProfile) -> Self {
        Self {
            count: profile.occurrence_count,
            namespace: profile.namespace_uri.clone(),
            attribute_names: profile.attribute_names(),
            has_text: profile.has_text(),
            recursive: false,
            truncated: false,
            children: BTreeMap::new(),
        }
    }

    /// Number of nodes in this subtree, including itself
    pub fn node_count(&self) -> usize {
        1 + self.children.values().map(|c| c.node_count()).sum::<usize>()
    }

    /// Number of levels in this subtree, including itself
    pub fn height(&self) -> usize {
        1 + self.children.values().map(|c| c.height()).max().unwrap_or(0)
    }
}

/// Build the nested summary rooted at `root`.
///
/// A child is expanded under a node at level `d` only if it was observed at
/// document depth `d + 1`, so the tree mirrors real nesting levels. A tag
/// found on its own ancestor chain becomes a `recursive` leaf. Descending
/// past `max_depth` would mean the element table is inconsistent and is
/// reported as an error.
pub fn build_structure_tree(
    root: &str,
    elements: &BTreeMap<String, ElementProfile>,
    max_depth: usize,
    max_nodes: usize,
) -> Result<BTreeMap<String, StructureNode>, AnalysisError> {
    let mut tree = BTreeMap::new();
    if root.is_empty() {
        return Ok(tree);
    }

    let mut builder = TreeBuilder {
        elements,
        max_depth,
        max_nodes,
        nodes: 0,
        truncated: false,
    };
    let mut ancestors = Vec::new();
    let node = builder.build(root, 0, &mut ancestors)?;

    if builder.truncated {
        warn!(
            "Structure tree truncated at {} nodes (root <{}>)",
            builder.nodes, root
        );
    }

    tree.insert(root.to_string(), node);
    Ok(tree)
}

struct TreeBuilder<'a> {
    elements: &'a BTreeMap<String, ElementProfile>,
    max_depth: usize,
    max_nodes: usize,
    nodes: usize,
    truncated: bool,
}

impl<'a> TreeBuilder<'a> {
    fn build(
        &mut self,
        tag: &'a str,
        level: usize,
        ancestors: &mut Vec<&'a str>,
    ) -> Result<StructureNode, AnalysisError> {
        if level > self.max_depth {
            return Err(AnalysisError::Structure {
                message: format!(
                    "<{}> reached level {} but the document is only {} deep",
                    tag, level, self.max_depth
                ),
            });
        }

        let elements = self.elements;
        let profile = elements.get(tag).ok_or_else(|| AnalysisError::Structure {
            message: format!("<{}> is referenced but was never observed", tag),
        })?;

        self.nodes += 1;
        let mut node = StructureNode::leaf(profile);

        if ancestors.contains(&tag) {
            node.recursive = true;
            return Ok(node);
        }

        ancestors.push(tag);
        for child in &profile.child_tags {
            let observed_below = elements
                .get(child)
                .map(|c| c.depths.contains(&(level + 1)))
                .unwrap_or(false);
            if !observed_below {
                continue;
            }
            if self.nodes >= self.max_nodes {
                node.truncated = true;
                self.truncated = true;
                break;
            }
            let child_node = self.build(child, level + 1, ancestors)?;
            node.children.insert(child.clone(), child_node);
        }
        ancestors.pop();

        Ok(node)
    }
}
