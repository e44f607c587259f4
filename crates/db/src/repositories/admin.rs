//! Admin account repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::admins;

/// Error types for admin operations.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Admin not found.
    #[error("admin not found")]
    NotFound,

    /// Username already taken.
    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Repository for admin accounts.
#[derive(Clone)]
pub struct AdminRepository {
    db: DatabaseConnection,
}

impl AdminRepository {
    /// Creates a new repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an admin with an already-hashed password.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<admins::Model, AdminError> {
        let existing = admins::Entity::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AdminError::DuplicateUsername(username.to_owned()));
        }

        let now = Utc::now().into();
        let model = admins::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_owned()),
            password_hash: Set(password_hash.to_owned()),
            role: Set(role.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(&self.db).await?)
    }

    /// Finds an admin by username.
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<admins::Model>, AdminError> {
        Ok(admins::Entity::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    /// Finds an admin by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<admins::Model>, AdminError> {
        Ok(admins::Entity::find_by_id(id).one(&self.db).await?)
    }
}
