//! Category catalog collaborator.

use std::sync::RwLock;

use uuid::Uuid;

use carryover_domain::CategoryNode;

use crate::CoreError;

pub trait CategoryCatalog: Send + Sync {
    /// `true` iff the category's parent is a root-level category.
    fn is_main_category(&self, category_id: Uuid) -> Result<bool, CoreError>;
}

/// In-memory category tree.
#[derive(Debug, Default)]
pub struct CategoryTree {
    nodes: RwLock<Vec<CategoryNode>>,
}

impl CategoryTree {
    pub fn new(nodes: Vec<CategoryNode>) -> Self {
        Self {
            nodes: RwLock::new(nodes),
        }
    }

    pub fn insert(&self, node: CategoryNode) -> Result<Uuid, CoreError> {
        let id = node.id;
        self.nodes
            .write()
            .map_err(|_| CoreError::Storage("category tree lock poisoned".into()))?
            .push(node);
        Ok(id)
    }
}

impl CategoryCatalog for CategoryTree {
    fn is_main_category(&self, category_id: Uuid) -> Result<bool, CoreError> {
        let nodes = self
            .nodes
            .read()
            .map_err(|_| CoreError::Storage("category tree lock poisoned".into()))?;
        let find = |id: Uuid| nodes.iter().find(|node| node.id == id);
        let is_main = find(category_id)
            .and_then(|node| node.parent_id)
            .and_then(find)
            .map(CategoryNode::is_root)
            .unwrap_or(false);
        Ok(is_main)
    }
}
