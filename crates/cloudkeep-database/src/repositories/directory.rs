//! Directory repository implementation.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use cloudkeep_core::error::{AppError, ErrorKind};
use cloudkeep_core::result::AppResult;
use cloudkeep_entity::directory::model::{CreateDirectory, Directory};

/// Repository for directory CRUD and tree queries.
#[derive(Debug, Clone)]
pub struct DirectoryRepository {
    pool: SqlitePool,
}

/// Recursive query for the IDs of a directory's whole subtree, including
/// the directory itself.
const SUBTREE_IDS_SQL: &str = "WITH RECURSIVE subtree(id) AS ( \
    SELECT id FROM directories WHERE id = ? \
    UNION ALL \
    SELECT d.id FROM directories d INNER JOIN subtree s ON d.parent_id = s.id \
 ) SELECT id FROM subtree";

impl DirectoryRepository {
    /// Create a new directory repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a directory by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Directory>> {
        sqlx::query_as::<_, Directory>("SELECT * FROM directories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find directory", e))
    }

    /// Find the root directory of an owner.
    pub async fn find_root(&self, owner_id: Uuid) -> AppResult<Option<Directory>> {
        sqlx::query_as::<_, Directory>(
            "SELECT * FROM directories WHERE owner_id = ? AND parent_id IS NULL",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find root", e))
    }

    /// Return the owner's root directory, creating it if absent.
    ///
    /// Race-free: the partial unique index on `(owner_id) WHERE parent_id IS
    /// NULL` rejects a second concurrent insert, and the loser reads back
    /// the winner's row.
    pub async fn get_or_create_root(&self, owner_id: Uuid) -> AppResult<Directory> {
        if let Some(root) = self.find_root(owner_id).await? {
            return Ok(root);
        }

        let insert = sqlx::query_as::<_, Directory>(
            "INSERT INTO directories (id, name, parent_id, owner_id, created_at) \
             VALUES (?, ?, NULL, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind("root")
        .bind(owner_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match insert {
            Ok(root) => Ok(root),
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => self
                .find_root(owner_id)
                .await?
                .ok_or_else(|| AppError::database("Root directory vanished after lost race")),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Database,
                "Failed to create root directory",
                e,
            )),
        }
    }

    /// Create a new non-root directory.
    pub async fn create(&self, data: &CreateDirectory) -> AppResult<Directory> {
        sqlx::query_as::<_, Directory>(
            "INSERT INTO directories (id, name, parent_id, owner_id, created_at) \
             VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(data.parent_id)
        .bind(data.owner_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create directory", e))
    }

    /// Rename a directory.
    pub async fn rename(&self, directory_id: Uuid, new_name: &str) -> AppResult<Directory> {
        sqlx::query_as::<_, Directory>(
            "UPDATE directories SET name = ? WHERE id = ? RETURNING *",
        )
        .bind(new_name)
        .bind(directory_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename directory", e))?
        .ok_or_else(|| AppError::not_found(format!("Directory {directory_id} not found")))
    }

    /// Move a directory to a new parent.
    ///
    /// The subtree check and the reparent run inside one transaction, so a
    /// concurrent move cannot slip a destination into the subtree between
    /// the check and the update. Fails with `CyclicMove` when the
    /// destination is the directory itself or one of its descendants.
    pub async fn set_parent(&self, directory_id: Uuid, new_parent_id: Uuid) -> AppResult<Directory> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let subtree: Vec<Uuid> = sqlx::query_scalar(SUBTREE_IDS_SQL)
            .bind(directory_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list subtree", e)
            })?;
        if subtree.is_empty() {
            return Err(AppError::not_found(format!(
                "Directory {directory_id} not found"
            )));
        }
        if subtree.contains(&new_parent_id) {
            return Err(AppError::cyclic_move(
                "Cannot move a directory into itself or one of its descendants",
            ));
        }

        let moved = sqlx::query_as::<_, Directory>(
            "UPDATE directories SET parent_id = ? WHERE id = ? RETURNING *",
        )
        .bind(new_parent_id)
        .bind(directory_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move directory", e))?
        .ok_or_else(|| AppError::not_found(format!("Directory {directory_id} not found")))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit directory move", e)
        })?;

        Ok(moved)
    }

    /// List direct child directories, ordered by name.
    pub async fn find_children(&self, parent_id: Uuid) -> AppResult<Vec<Directory>> {
        sqlx::query_as::<_, Directory>(
            "SELECT * FROM directories WHERE parent_id = ? ORDER BY name ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    /// Ancestor chain IDs from a directory up to its root, nearest first.
    /// The directory itself is the first element.
    pub async fn find_ancestor_ids(&self, directory_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>(
            "WITH RECURSIVE ancestors(id, parent_id, depth) AS ( \
                SELECT id, parent_id, 0 FROM directories WHERE id = ? \
                UNION ALL \
                SELECT d.id, d.parent_id, a.depth + 1 \
                FROM directories d INNER JOIN ancestors a ON d.id = a.parent_id \
             ) SELECT id FROM ancestors ORDER BY depth ASC",
        )
        .bind(directory_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find ancestors", e))
    }

    /// Delete a directory and its whole subtree in one transaction.
    ///
    /// Removes every grant referencing a subtree directory or a contained
    /// file, then the files, then the directories. Returns the content
    /// references of the removed files so the caller can delete the blobs
    /// after the transaction commits.
    pub async fn delete_subtree(&self, directory_id: Uuid) -> AppResult<Vec<String>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // Snapshot the subtree inside the transaction so a directory moved
        // in concurrently cannot escape the grant and blob cleanup.
        let subtree: Vec<Uuid> = sqlx::query_scalar(SUBTREE_IDS_SQL)
            .bind(directory_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list subtree", e)
            })?;
        if subtree.is_empty() {
            return Err(AppError::not_found(format!(
                "Directory {directory_id} not found"
            )));
        }

        let mut refs_query =
            QueryBuilder::<Sqlite>::new("SELECT content_ref FROM files WHERE directory_id IN (");
        push_id_list(&mut refs_query, &subtree);
        refs_query.push(")");
        let content_refs: Vec<String> = refs_query
            .build_query_scalar()
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to collect subtree files", e)
            })?;

        let mut file_grants = QueryBuilder::<Sqlite>::new(
            "DELETE FROM share_grants WHERE item_type = 'file' AND item_id IN \
             (SELECT id FROM files WHERE directory_id IN (",
        );
        push_id_list(&mut file_grants, &subtree);
        file_grants.push("))");
        file_grants.build().execute(&mut *tx).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete file grants", e)
        })?;

        let mut dir_grants = QueryBuilder::<Sqlite>::new(
            "DELETE FROM share_grants WHERE item_type = 'directory' AND item_id IN (",
        );
        push_id_list(&mut dir_grants, &subtree);
        dir_grants.push(")");
        dir_grants.build().execute(&mut *tx).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete directory grants", e)
        })?;

        let mut files = QueryBuilder::<Sqlite>::new("DELETE FROM files WHERE directory_id IN (");
        push_id_list(&mut files, &subtree);
        files.push(")");
        files.build().execute(&mut *tx).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete subtree files", e)
        })?;

        let mut dirs = QueryBuilder::<Sqlite>::new("DELETE FROM directories WHERE id IN (");
        push_id_list(&mut dirs, &subtree);
        dirs.push(")");
        dirs.build().execute(&mut *tx).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete subtree directories", e)
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit subtree delete", e)
        })?;

        Ok(content_refs)
    }
}

/// Push a comma-separated list of bound IDs into a query builder.
fn push_id_list(query: &mut QueryBuilder<'_, Sqlite>, ids: &[Uuid]) {
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
}
