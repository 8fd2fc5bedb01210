//! File repository implementation.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use cloudkeep_core::error::{AppError, ErrorKind};
use cloudkeep_core::result::AppResult;
use cloudkeep_core::types::pagination::{PageRequest, PageResponse};
use cloudkeep_entity::file::model::{CreateFile, File};

/// Repository for file CRUD and visibility-scoped query operations.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

/// Subquery selecting every directory visible to a user through a directory
/// grant, including all descendants of granted directories.
const SHARED_DIRS_CTE: &str = "WITH RECURSIVE shared_dirs(id) AS ( \
    SELECT item_id FROM share_grants WHERE item_type = 'directory' AND granted_to = ? \
    UNION \
    SELECT d.id FROM directories d INNER JOIN shared_dirs s ON d.parent_id = s.id \
 )";

/// Visibility predicate: owned, directly granted, or inside a shared directory.
const VISIBLE_PREDICATE: &str = "(owner_id = ? \
    OR id IN (SELECT item_id FROM share_grants WHERE item_type = 'file' AND granted_to = ?) \
    OR directory_id IN (SELECT id FROM shared_dirs))";

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a file by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// List files in a directory, ordered by name.
    pub async fn find_by_directory(&self, directory_id: Uuid) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE directory_id = ? ORDER BY filename ASC",
        )
        .bind(directory_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    /// Create a new file record.
    pub async fn create(&self, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (id, filename, content_ref, mime_type, size_bytes, \
             directory_id, owner_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.filename)
        .bind(&data.content_ref)
        .bind(&data.mime_type)
        .bind(data.size_bytes)
        .bind(data.directory_id)
        .bind(data.owner_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create file", e))
    }

    /// Rename a file.
    pub async fn rename(&self, file_id: Uuid, new_name: &str) -> AppResult<File> {
        sqlx::query_as::<_, File>("UPDATE files SET filename = ? WHERE id = ? RETURNING *")
            .bind(new_name)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename file", e))?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
    }

    /// Move a file to a different directory.
    pub async fn set_directory(&self, file_id: Uuid, directory_id: Uuid) -> AppResult<File> {
        sqlx::query_as::<_, File>("UPDATE files SET directory_id = ? WHERE id = ? RETURNING *")
            .bind(directory_id)
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to move file", e))?
            .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
    }

    /// Delete a file row together with every grant referencing it,
    /// in one transaction. Returns the content reference of the removed
    /// file, or `None` if the file did not exist.
    pub async fn delete_with_grants(&self, file_id: Uuid) -> AppResult<Option<String>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("DELETE FROM share_grants WHERE item_type = 'file' AND item_id = ?")
            .bind(file_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete file grants", e)
            })?;

        let content_ref: Option<String> =
            sqlx::query_scalar("DELETE FROM files WHERE id = ? RETURNING content_ref")
                .bind(file_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to delete file", e)
                })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit file delete", e)
        })?;

        Ok(content_ref)
    }

    /// Case-insensitive substring search over the files a user can see:
    /// owned, directly granted, or inside a (transitively) shared directory.
    pub async fn search_visible(
        &self,
        user_id: Uuid,
        query: &str,
        page: &PageRequest,
    ) -> AppResult<PageResponse<File>> {
        let pattern = format!("%{}%", escape_like(query));

        let count_sql = format!(
            "{SHARED_DIRS_CTE} SELECT COUNT(*) FROM files \
             WHERE filename LIKE ? ESCAPE '\\' AND {VISIBLE_PREDICATE}"
        );
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(user_id)
            .bind(&pattern)
            .bind(user_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to count search results", e)
            })?;

        let page_sql = format!(
            "{SHARED_DIRS_CTE} SELECT * FROM files \
             WHERE filename LIKE ? ESCAPE '\\' AND {VISIBLE_PREDICATE} \
             ORDER BY filename ASC LIMIT ? OFFSET ?"
        );
        let files = sqlx::query_as::<_, File>(&page_sql)
            .bind(user_id)
            .bind(&pattern)
            .bind(user_id)
            .bind(user_id)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to search files", e)
            })?;

        Ok(PageResponse::new(
            files,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// List every file's ID and content reference.
    ///
    /// Used by the orphan maintenance sweep.
    pub async fn list_content_refs(&self) -> AppResult<Vec<(Uuid, String)>> {
        sqlx::query_as::<_, (Uuid, String)>("SELECT id, content_ref FROM files")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list content refs", e)
            })
    }
}

/// Escape `%`, `_`, and the escape character itself for a LIKE pattern.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_passes_plain_text() {
        assert_eq!(escape_like("cat.png"), "cat.png");
    }

    #[test]
    fn test_escape_like_escapes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
