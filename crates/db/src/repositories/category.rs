//! Category repository.
//!
//! Categories form the 3-level APBD tree. Placement rules come from
//! `anggara_core::category`; this repository adds the sibling name and
//! per-kind code uniqueness checks and the deletion guards.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use anggara_core::category::{self, CategoryKind, HierarchyError};

use crate::entities::{categories, transactions};

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// Category not found.
    #[error("category not found: {0}")]
    NotFound(Uuid),

    /// Referenced parent category not found.
    #[error("parent category not found: {0}")]
    ParentNotFound(Uuid),

    /// Hierarchy rule violated.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// Sibling with the same name already exists.
    #[error("a category named '{0}' already exists at this position")]
    DuplicateName(String),

    /// Code already used within this kind.
    #[error("category code '{0}' is already in use")]
    DuplicateCode(String),

    /// Stored kind column does not parse. Indicates corrupt data.
    #[error("unrecognized category kind: {0}")]
    InvalidKind(String),

    /// Category still has children.
    #[error("category has child categories and cannot be deleted")]
    HasChildren,

    /// Category still referenced by transactions.
    #[error("category has transactions and cannot be deleted")]
    HasTransactions,

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Parent category, required for levels 2 and 3.
    pub parent_id: Option<Uuid>,
    /// Category type.
    pub kind: CategoryKind,
    /// Display name, unique among siblings (case-insensitive).
    pub name: String,
    /// Hierarchical code, unique within the kind (case-insensitive).
    pub code: Option<String>,
    /// Depth, 1..=3.
    pub level: i16,
}

/// Input for updating a category's name or code.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name.
    pub name: Option<String>,
    /// New code (`Some(None)` clears it).
    pub code: Option<Option<String>>,
}

/// A category with its children, for the tree view.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CategoryNode {
    /// The category itself.
    #[serde(flatten)]
    pub category: categories::Model,
    /// Child nodes, one level deeper.
    pub children: Vec<CategoryNode>,
}

/// Repository for category operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a category after validating its placement and uniqueness.
    ///
    /// # Errors
    ///
    /// Returns a [`HierarchyError`] wrapper for placement violations,
    /// [`CategoryError::DuplicateName`] for a sibling name collision, and
    /// [`CategoryError::DuplicateCode`] for a code collision within the
    /// kind.
    pub async fn create(
        &self,
        input: CreateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        let parent = match input.parent_id {
            Some(parent_id) => Some(
                categories::Entity::find_by_id(parent_id)
                    .one(&self.db)
                    .await?
                    .ok_or(CategoryError::ParentNotFound(parent_id))?,
            ),
            None => None,
        };

        let parent_placement = parent
            .as_ref()
            .map(|p| {
                CategoryKind::parse(&p.kind)
                    .map(|kind| (p.level, kind))
                    .ok_or_else(|| CategoryError::InvalidKind(p.kind.clone()))
            })
            .transpose()?;

        category::validate_placement(input.level, input.kind, parent_placement)?;

        self.check_name_unique(&input.name, input.kind, input.level, input.parent_id, None)
            .await?;
        if let Some(code) = &input.code {
            self.check_code_unique(code, input.kind, None).await?;
        }

        let now = Utc::now().into();
        let model = categories::ActiveModel {
            id: Set(Uuid::new_v4()),
            parent_id: Set(input.parent_id),
            kind: Set(input.kind.as_str().to_owned()),
            name: Set(input.name.trim().to_owned()),
            code: Set(input.code),
            level: Set(input.level),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(&self.db).await?)
    }

    /// Gets a category by ID.
    pub async fn get(&self, id: Uuid) -> Result<categories::Model, CategoryError> {
        categories::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(CategoryError::NotFound(id))
    }

    /// Lists categories, optionally filtered by kind and level, ordered
    /// by code then name.
    pub async fn list(
        &self,
        kind: Option<CategoryKind>,
        level: Option<i16>,
    ) -> Result<Vec<categories::Model>, CategoryError> {
        let mut query = categories::Entity::find();
        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        if let Some(level) = level {
            query = query.filter(categories::Column::Level.eq(level));
        }

        Ok(query
            .order_by_asc(categories::Column::Code)
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?)
    }

    /// Builds the full category tree, optionally restricted to one kind.
    pub async fn tree(&self, kind: Option<CategoryKind>) -> Result<Vec<CategoryNode>, CategoryError> {
        let all = self.list(kind, None).await?;
        Ok(build_tree(all))
    }

    /// Updates a category's name or code, re-checking uniqueness.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<categories::Model, CategoryError> {
        let existing = self.get(id).await?;
        let kind = CategoryKind::parse(&existing.kind)
            .ok_or_else(|| CategoryError::InvalidKind(existing.kind.clone()))?;

        if let Some(name) = &input.name {
            self.check_name_unique(name, kind, existing.level, existing.parent_id, Some(id))
                .await?;
        }
        if let Some(Some(code)) = &input.code {
            self.check_code_unique(code, kind, Some(id)).await?;
        }

        let mut active: categories::ActiveModel = existing.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_owned());
        }
        if let Some(code) = input.code {
            active.code = Set(code);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a category.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::HasChildren`] or
    /// [`CategoryError::HasTransactions`] when the category is still in
    /// use; nothing is deleted in that case.
    pub async fn delete(&self, id: Uuid) -> Result<(), CategoryError> {
        let category = self.get(id).await?;

        let children = categories::Entity::find()
            .filter(categories::Column::ParentId.eq(id))
            .count(&self.db)
            .await?;
        if children > 0 {
            return Err(CategoryError::HasChildren);
        }

        let referenced = transactions::Entity::find()
            .filter(transactions::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;
        if referenced > 0 {
            return Err(CategoryError::HasTransactions);
        }

        categories::Entity::delete_by_id(category.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Case-insensitive name uniqueness among siblings (same kind, level,
    /// parent). Comparison happens in Rust so it behaves identically on
    /// every backend.
    async fn check_name_unique(
        &self,
        name: &str,
        kind: CategoryKind,
        level: i16,
        parent_id: Option<Uuid>,
        exclude: Option<Uuid>,
    ) -> Result<(), CategoryError> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::Level.eq(level));
        query = match parent_id {
            Some(parent_id) => query.filter(categories::Column::ParentId.eq(parent_id)),
            None => query.filter(categories::Column::ParentId.is_null()),
        };

        let siblings = query.all(&self.db).await?;
        let collision = siblings
            .iter()
            .filter(|s| exclude != Some(s.id))
            .any(|s| category::names_collide(&s.name, name));
        if collision {
            return Err(CategoryError::DuplicateName(name.trim().to_owned()));
        }
        Ok(())
    }

    /// Case-insensitive code uniqueness within a kind.
    async fn check_code_unique(
        &self,
        code: &str,
        kind: CategoryKind,
        exclude: Option<Uuid>,
    ) -> Result<(), CategoryError> {
        let coded = categories::Entity::find()
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::Code.is_not_null())
            .all(&self.db)
            .await?;

        let collision = coded
            .iter()
            .filter(|c| exclude != Some(c.id))
            .filter_map(|c| c.code.as_deref())
            .any(|existing| existing.eq_ignore_ascii_case(code));
        if collision {
            return Err(CategoryError::DuplicateCode(code.to_owned()));
        }
        Ok(())
    }
}

/// Assembles flat rows into a forest rooted at level-1 categories.
fn build_tree(rows: Vec<categories::Model>) -> Vec<CategoryNode> {
    use std::collections::HashMap;

    let mut by_parent: HashMap<Option<Uuid>, Vec<categories::Model>> = HashMap::new();
    for row in rows {
        by_parent.entry(row.parent_id).or_default().push(row);
    }

    fn attach(
        parent: Option<Uuid>,
        by_parent: &mut HashMap<Option<Uuid>, Vec<categories::Model>>,
    ) -> Vec<CategoryNode> {
        by_parent
            .remove(&parent)
            .unwrap_or_default()
            .into_iter()
            .map(|category| {
                let children = attach(Some(category.id), by_parent);
                CategoryNode { category, children }
            })
            .collect()
    }

    attach(None, &mut by_parent)
}
