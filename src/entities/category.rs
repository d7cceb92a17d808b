use sea_orm::entity::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(indexed)]
    pub parent_id: Option<i32>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Parent,
    #[sea_orm(has_many = "crate::entities::product::Entity")]
    Product,
}

impl Related<crate::entities::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A category with its whole subtree, children ordered by title.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryNode {
    pub id: i32,
    pub title: String,
    pub subcategories: Vec<CategoryNode>,
}

fn children_index(categories: &[Model]) -> HashMap<Option<i32>, Vec<&Model>> {
    let mut index: HashMap<Option<i32>, Vec<&Model>> = HashMap::new();
    for category in categories {
        index.entry(category.parent_id).or_default().push(category);
    }
    for children in index.values_mut() {
        children.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
    }
    index
}

/// Ids of `root` and every category below it. Empty when `root` is unknown.
pub fn descendant_ids(categories: &[Model], root: i32) -> Vec<i32> {
    if !categories.iter().any(|c| c.id == root) {
        return Vec::new();
    }
    let index = children_index(categories);
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        result.push(id);
        if let Some(children) = index.get(&Some(id)) {
            stack.extend(children.iter().map(|c| c.id));
        }
    }
    result
}

/// Builds the forest of categories rooted at the ones without a parent.
pub fn build_tree(categories: &[Model]) -> Vec<CategoryNode> {
    let index = children_index(categories);

    fn build(
        parent: Option<i32>,
        index: &HashMap<Option<i32>, Vec<&Model>>,
        depth: usize,
    ) -> Vec<CategoryNode> {
        // a corrupted parent chain must not recurse forever
        if depth > index.len() {
            return Vec::new();
        }
        index
            .get(&parent)
            .map(|children| {
                children
                    .iter()
                    .map(|c| CategoryNode {
                        id: c.id,
                        title: c.title.clone(),
                        subcategories: build(Some(c.id), index, depth + 1),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    build(None, &index, 0)
}
