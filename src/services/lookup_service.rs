//! CRUD over the lookup tables plus the shared reference check used when a
//! location points at one of them.

use super::{ServiceError, ServiceResult, is_unique_violation};
use crate::models::{
    lookup::{LookupEntry, LookupKind},
    validation::ValidationError,
};
use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct LookupService {
    pub db: Arc<SqlitePool>,
}

impl LookupService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// All entries of one kind, ordered by name.
    pub async fn list(&self, kind: LookupKind) -> ServiceResult<Vec<LookupEntry>> {
        let sql = format!(
            "SELECT id, name, created_at FROM {} ORDER BY name ASC, rowid ASC",
            kind.table()
        );
        Ok(sqlx::query_as::<_, LookupEntry>(&sql)
            .fetch_all(&*self.db)
            .await?)
    }

    pub async fn create(&self, kind: LookupKind, name: &str) -> ServiceResult<LookupEntry> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::single("name", "required", "name must not be empty").into());
        }

        let entry = LookupEntry {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        let sql = format!(
            "INSERT INTO {} (id, name, created_at) VALUES (?, ?, ?)",
            kind.table()
        );
        match sqlx::query(&sql)
            .bind(entry.id)
            .bind(&entry.name)
            .bind(entry.created_at)
            .execute(&*self.db)
            .await
        {
            Ok(_) => {
                info!(kind = kind.label(), id = %entry.id, name = %entry.name, "lookup entry created");
                Ok(entry)
            }
            Err(err) if is_unique_violation(&err) => Err(ValidationError::single(
                "name",
                "unique",
                format!("{} `{}` already exists", kind.label(), name),
            )
            .into()),
            Err(err) => Err(ServiceError::Sqlx(err)),
        }
    }

    /// Delete an entry. Refused while any location still references it.
    pub async fn delete(&self, kind: LookupKind, id: Uuid) -> ServiceResult<()> {
        let mut tx = self.db.begin().await?;

        if !reference_exists(&mut *tx, kind, id).await? {
            return Err(ServiceError::NotFound {
                entity: kind.label(),
                id,
            });
        }

        if let Some(column) = kind.location_column() {
            let sql = format!("SELECT COUNT(*) FROM locations WHERE {column} = ?");
            let in_use: i64 = sqlx::query_scalar(&sql)
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
            if in_use > 0 {
                return Err(ServiceError::Conflict(format!(
                    "{} is used by {} location(s) and cannot be deleted",
                    kind.label(),
                    in_use
                )));
            }
        }

        let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());
        sqlx::query(&sql).bind(id).execute(&mut *tx).await?;
        tx.commit().await?;

        info!(kind = kind.label(), %id, "lookup entry deleted");
        Ok(())
    }
}

/// True if `id` exists in the table of `kind`.
pub async fn reference_exists<'e, E>(executor: E, kind: LookupKind, id: Uuid) -> ServiceResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", kind.table());
    let found: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(executor).await?;
    Ok(found != 0)
}

/// Validated reference change.
///
/// Given the stored reference and an incoming raw value, returns:
/// - `Ok(None)` when nothing is incoming or it equals the stored id (no lookup
///   is made);
/// - `Ok(Some(id))` when the new id exists in its table;
/// - `Err(InvalidReference)` when it is malformed or missing.
pub async fn resolve_reference_change<'e, E>(
    executor: E,
    kind: LookupKind,
    current: Uuid,
    incoming: Option<&str>,
) -> ServiceResult<Option<Uuid>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let Some(raw) = incoming else {
        return Ok(None);
    };
    let invalid = || ServiceError::InvalidReference {
        kind,
        id: raw.to_string(),
    };
    let id = Uuid::parse_str(raw).map_err(|_| invalid())?;
    if id == current {
        return Ok(None);
    }
    if reference_exists(executor, kind, id).await? {
        Ok(Some(id))
    } else {
        Err(invalid())
    }
}
