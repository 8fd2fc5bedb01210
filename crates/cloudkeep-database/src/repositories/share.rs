//! Share grant repository implementation.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use cloudkeep_core::error::{AppError, ErrorKind};
use cloudkeep_core::result::AppResult;
use cloudkeep_core::types::pagination::{PageRequest, PageResponse};
use cloudkeep_entity::share::model::{CreateShareGrant, ItemType, ShareGrant};

/// Repository for share grant CRUD and lookup operations.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: SqlitePool,
}

impl ShareRepository {
    /// Create a new share repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new grant.
    ///
    /// A concurrent duplicate loses against the unique index on
    /// `(item_type, item_id, granted_to)` and surfaces as a conflict.
    pub async fn create(&self, data: &CreateShareGrant) -> AppResult<ShareGrant> {
        sqlx::query_as::<_, ShareGrant>(
            "INSERT INTO share_grants (id, item_type, item_id, granted_by, granted_to, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.item_type)
        .bind(data.item_id)
        .bind(data.granted_by)
        .bind(data.granted_to)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::conflict(format!(
                    "{} {} is already shared with this user",
                    data.item_type, data.item_id
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create grant", e),
        })
    }

    /// Find the grant for a specific item and grantee.
    pub async fn find_grant(
        &self,
        item_type: ItemType,
        item_id: Uuid,
        granted_to: Uuid,
    ) -> AppResult<Option<ShareGrant>> {
        sqlx::query_as::<_, ShareGrant>(
            "SELECT * FROM share_grants WHERE item_type = ? AND item_id = ? AND granted_to = ?",
        )
        .bind(item_type)
        .bind(item_id)
        .bind(granted_to)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find grant", e))
    }

    /// Whether any grant exists on an item.
    pub async fn has_grants(&self, item_type: ItemType, item_id: Uuid) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM share_grants WHERE item_type = ? AND item_id = ?",
        )
        .bind(item_type)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count grants", e))?;
        Ok(count > 0)
    }

    /// Directory grants held by a user over any of the given directories.
    ///
    /// Used by the access resolver to scan an ancestor chain in one query.
    pub async fn find_directory_grants_in(
        &self,
        granted_to: Uuid,
        directory_ids: &[Uuid],
    ) -> AppResult<Vec<ShareGrant>> {
        if directory_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT * FROM share_grants WHERE item_type = 'directory' AND granted_to = ",
        );
        query.push_bind(granted_to);
        query.push(" AND item_id IN (");
        let mut separated = query.separated(", ");
        for id in directory_ids {
            separated.push_bind(*id);
        }
        query.push(")");

        query
            .build_query_as::<ShareGrant>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to scan ancestor grants", e)
            })
    }

    /// All grants received by a user.
    pub async fn find_by_grantee(&self, granted_to: Uuid) -> AppResult<Vec<ShareGrant>> {
        sqlx::query_as::<_, ShareGrant>(
            "SELECT * FROM share_grants WHERE granted_to = ? ORDER BY created_at DESC",
        )
        .bind(granted_to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list received grants", e))
    }

    /// List grants created by a user, paginated.
    pub async fn find_by_creator(
        &self,
        granted_by: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ShareGrant>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM share_grants WHERE granted_by = ?")
                .bind(granted_by)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count grants", e)
                })?;

        let grants = sqlx::query_as::<_, ShareGrant>(
            "SELECT * FROM share_grants WHERE granted_by = ? \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(granted_by)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list grants", e))?;

        Ok(PageResponse::new(
            grants,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// List grants received by a user, paginated.
    pub async fn find_received(
        &self,
        granted_to: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ShareGrant>> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM share_grants WHERE granted_to = ?")
                .bind(granted_to)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count received", e)
                })?;

        let grants = sqlx::query_as::<_, ShareGrant>(
            "SELECT * FROM share_grants WHERE granted_to = ? \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(granted_to)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list received", e))?;

        Ok(PageResponse::new(
            grants,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Remove the grant for a specific item and grantee.
    pub async fn delete(
        &self,
        item_type: ItemType,
        item_id: Uuid,
        granted_to: Uuid,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM share_grants WHERE item_type = ? AND item_id = ? AND granted_to = ?",
        )
        .bind(item_type)
        .bind(item_id)
        .bind(granted_to)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete grant", e))?;
        Ok(result.rows_affected() > 0)
    }
}
