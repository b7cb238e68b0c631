//! Accounts and session tokens for the admin panel.
//!
//! One session per user: logging in replaces the stored token and logging
//! out clears it.

use super::{ServiceError, ServiceResult, is_unique_violation};
use crate::{
    auth::{
        new_session_token,
        password::{hash_password, verify_password},
    },
    models::{
        pagination::{Page, PageWindow},
        user::{Login, ROLE_ADMIN, ROLE_USER, RegisterUser, Session, UpdateUser, User, UserRecord},
        validation::ValidationError,
    },
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, display_name, role, password_hash, token, created_at";

#[derive(Clone)]
pub struct UserService {
    pub db: Arc<SqlitePool>,
}

impl UserService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Create a `user` account and open a session for it.
    pub async fn register(&self, body: RegisterUser) -> ServiceResult<Session> {
        let token = new_session_token();
        let record = self
            .insert(&body.email, &body.display_name, ROLE_USER, &body.password, Some(&token))
            .await?;
        Ok(Session {
            user: record.into(),
            token,
        })
    }

    pub async fn login(&self, body: &Login) -> ServiceResult<Session> {
        let record = self
            .by_email(body.email.trim())
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;
        let matches = verify_password(&body.password, &record.password_hash)
            .map_err(|e| ServiceError::PasswordHash(e.to_string()))?;
        if !matches {
            warn!(email = %record.email, "login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = new_session_token();
        sqlx::query("UPDATE users SET token = ? WHERE id = ?")
            .bind(&token)
            .bind(record.id)
            .execute(&*self.db)
            .await?;

        info!(id = %record.id, "user logged in");
        Ok(Session {
            user: record.into(),
            token,
        })
    }

    /// Clear the session of `user_id`. Repeating it is harmless.
    pub async fn logout(&self, user_id: Uuid) -> ServiceResult<()> {
        sqlx::query("UPDATE users SET token = NULL WHERE id = ?")
            .bind(user_id)
            .execute(&*self.db)
            .await?;
        info!(id = %user_id, "user logged out");
        Ok(())
    }

    /// Resolve a session token to its user.
    pub async fn authenticate(&self, token: &str) -> ServiceResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE token = ?");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(token)
            .fetch_optional(&*self.db)
            .await?
            .map(User::from)
            .ok_or_else(|| ServiceError::Unauthorized("invalid or expired token".into()))
    }

    pub async fn list(&self, page: u64, per_page: u64) -> ServiceResult<Page<User>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&*self.db)
            .await?;
        let window = PageWindow::resolve(page, per_page, u64::try_from(count).unwrap_or(0));

        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?"
        );
        let users = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&*self.db)
            .await?
            .into_iter()
            .map(User::from)
            .collect();

        Ok(window.into_page(users))
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<User> {
        Ok(self.record(id).await?.into())
    }

    /// Apply the present fields. A password change ends the user's session.
    pub async fn update(&self, id: Uuid, body: UpdateUser) -> ServiceResult<User> {
        self.record(id).await?;

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
        let mut changed = false;
        {
            let mut set = qb.separated(", ");
            if let Some(name) = body.display_name.as_deref() {
                set.push("display_name = ").push_bind_unseparated(name.trim().to_string());
                changed = true;
            }
            if let Some(role) = body.role.as_deref() {
                set.push("role = ").push_bind_unseparated(role.to_string());
                changed = true;
            }
            if let Some(password) = body.password.as_deref() {
                let hash =
                    hash_password(password).map_err(|e| ServiceError::PasswordHash(e.to_string()))?;
                set.push("password_hash = ").push_bind_unseparated(hash);
                set.push("token = NULL");
                changed = true;
            }
        }

        if changed {
            qb.push(" WHERE id = ").push_bind(id);
            qb.build().execute(&*self.db).await?;
            info!(%id, "user updated");
        }

        self.get(id).await
    }

    /// Delete `id` on behalf of `actor`. Nobody can delete their own account.
    pub async fn delete(&self, actor: Uuid, id: Uuid) -> ServiceResult<()> {
        if actor == id {
            return Err(ServiceError::Conflict("you cannot delete your own account".into()));
        }
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound { entity: "user", id });
        }
        info!(%id, by = %actor, "user deleted");
        Ok(())
    }

    /// Create an admin with these credentials unless the email is taken.
    /// Returns true when an account was created.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> ServiceResult<bool> {
        if self.by_email(email).await?.is_some() {
            return Ok(false);
        }
        let record = self.insert(email, "Administrator", ROLE_ADMIN, password, None).await?;
        info!(id = %record.id, email = %record.email, "seeded admin account");
        Ok(true)
    }

    async fn insert(
        &self,
        email: &str,
        display_name: &str,
        role: &str,
        password: &str,
        token: Option<&str>,
    ) -> ServiceResult<UserRecord> {
        let password_hash =
            hash_password(password).map_err(|e| ServiceError::PasswordHash(e.to_string()))?;
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            display_name: display_name.trim().to_string(),
            role: role.to_string(),
            password_hash,
            token: token.map(str::to_string),
            created_at: Utc::now(),
        };

        let res = sqlx::query(
            "INSERT INTO users (id, email, display_name, role, password_hash, token, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id)
        .bind(&record.email)
        .bind(&record.display_name)
        .bind(&record.role)
        .bind(&record.password_hash)
        .bind(&record.token)
        .bind(record.created_at)
        .execute(&*self.db)
        .await;

        match res {
            Ok(_) => {
                info!(id = %record.id, email = %record.email, role = %record.role, "user created");
                Ok(record)
            }
            Err(err) if is_unique_violation(&err) => Err(ValidationError::single(
                "email",
                "unique",
                format!("email `{}` is already registered", record.email),
            )
            .into()),
            Err(err) => Err(err.into()),
        }
    }

    async fn record(&self, id: Uuid) -> ServiceResult<UserRecord> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or(ServiceError::NotFound { entity: "user", id })
    }

    async fn by_email(&self, email: &str) -> ServiceResult<Option<UserRecord>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        Ok(sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&*self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use assert_matches::assert_matches;

    async fn service() -> UserService {
        let pool = db::connect_in_memory().await.unwrap();
        db::run_migrations(&pool).await.unwrap();
        UserService::new(Arc::new(pool))
    }

    fn register_body(email: &str) -> RegisterUser {
        RegisterUser {
            email: email.into(),
            password: "secret-pass".into(),
            display_name: "Operator".into(),
        }
    }

    #[tokio::test]
    async fn register_opens_a_session() {
        let svc = service().await;
        let session = svc.register(register_body("Ops@Example.kg")).await.unwrap();
        assert_eq!(session.user.email, "ops@example.kg");
        assert_eq!(session.user.role, ROLE_USER);

        let me = svc.authenticate(&session.token).await.unwrap();
        assert_eq!(me.id, session.user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_validation_error() {
        let svc = service().await;
        svc.register(register_body("a@b.kg")).await.unwrap();
        let err = svc.register(register_body("A@B.kg")).await.unwrap_err();
        assert_matches!(err, ServiceError::Validation(v) if v.has("email"));
    }

    #[tokio::test]
    async fn login_replaces_token_and_logout_clears_it() {
        let svc = service().await;
        let first = svc.register(register_body("a@b.kg")).await.unwrap();

        let login = Login {
            email: "a@b.kg".into(),
            password: "secret-pass".into(),
        };
        let second = svc.login(&login).await.unwrap();
        assert_ne!(first.token, second.token);
        assert_matches!(
            svc.authenticate(&first.token).await,
            Err(ServiceError::Unauthorized(_))
        );

        svc.logout(second.user.id).await.unwrap();
        svc.logout(second.user.id).await.unwrap();
        assert!(svc.authenticate(&second.token).await.is_err());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let svc = service().await;
        svc.register(register_body("a@b.kg")).await.unwrap();

        let bad = Login {
            email: "a@b.kg".into(),
            password: "nope-nope".into(),
        };
        assert_matches!(svc.login(&bad).await, Err(ServiceError::InvalidCredentials));

        let unknown = Login {
            email: "who@b.kg".into(),
            password: "secret-pass".into(),
        };
        assert_matches!(svc.login(&unknown).await, Err(ServiceError::InvalidCredentials));
    }

    #[tokio::test]
    async fn password_change_ends_session() {
        let svc = service().await;
        let session = svc.register(register_body("a@b.kg")).await.unwrap();

        let updated = svc
            .update(
                session.user.id,
                UpdateUser {
                    display_name: Some("Renamed".into()),
                    password: Some("another-pass".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Renamed");
        assert!(svc.authenticate(&session.token).await.is_err());

        let login = Login {
            email: "a@b.kg".into(),
            password: "another-pass".into(),
        };
        assert!(svc.login(&login).await.is_ok());
    }

    #[tokio::test]
    async fn self_delete_is_refused() {
        let svc = service().await;
        let me = svc.register(register_body("a@b.kg")).await.unwrap().user;
        let other = svc.register(register_body("c@d.kg")).await.unwrap().user;

        assert_matches!(svc.delete(me.id, me.id).await, Err(ServiceError::Conflict(_)));
        svc.delete(me.id, other.id).await.unwrap();
        assert_matches!(
            svc.delete(me.id, other.id).await,
            Err(ServiceError::NotFound { entity: "user", .. })
        );
    }

    #[tokio::test]
    async fn ensure_admin_runs_once() {
        let svc = service().await;
        assert!(svc.ensure_admin("root@example.kg", "admin-pass").await.unwrap());
        assert!(!svc.ensure_admin("root@example.kg", "admin-pass").await.unwrap());

        let page = svc.list(1, 10).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.items[0].role, ROLE_ADMIN);
    }

    #[tokio::test]
    async fn listing_is_paginated() {
        let svc = service().await;
        for i in 0..3 {
            svc.register(register_body(&format!("u{i}@b.kg"))).await.unwrap();
        }
        let page = svc.list(5, 2).await.unwrap();
        assert_eq!((page.page, page.pages, page.count), (2, 2, 3));
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].email, "u0@b.kg");
    }
}
