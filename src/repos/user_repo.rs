/*
 * Responsibility
 * - users テーブル向け SQLx 操作
 * - UserRepo trait 経由で提供 (services/handlers は PgPool に直接依存しない)
 * - DB エラーは RepoError で返す (unique 違反は Conflict)
 */
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    #[sqlx(rename = "userId")]
    pub id: i64,
    #[sqlx(rename = "userName")]
    pub user_name: String,
    #[sqlx(rename = "passwordHash")]
    pub password_hash: String,
    pub role: String,
    pub address: Option<String>,
    pub gender: Option<String>,
    #[sqlx(rename = "birthDate")]
    pub birth_date: Option<NaiveDate>,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_name: String,
    pub password_hash: String,
    pub role: String,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Profile attributes for `update_profile`.
///
/// Each field is tri-state:
/// - `None`: do not update
/// - `Some(None)`: set NULL
/// - `Some(Some(v))`: set v
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub address: Option<Option<String>>,
    pub gender: Option<Option<String>>,
    pub birth_date: Option<Option<NaiveDate>>,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create(&self, user: NewUser) -> RepoResult<UserRow>;
    async fn list(&self) -> RepoResult<Vec<UserRow>>;
    async fn get(&self, user_id: i64) -> RepoResult<Option<UserRow>>;
    async fn find_by_user_name(&self, user_name: &str) -> RepoResult<Option<UserRow>>;
    // Case-sensitive substring match on user_name.
    async fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<UserRow>>;
    async fn update_profile(&self, user_id: i64, update: ProfileUpdate)
    -> RepoResult<Option<UserRow>>;
    async fn delete(&self, user_id: i64) -> RepoResult<bool>;
}

const USER_COLUMNS: &str = r#""userId", "userName", "passwordHash", role, address, gender, "birthDate", "createdAt", "updatedAt""#;

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn create(&self, user: NewUser) -> RepoResult<UserRow> {
        let sql = format!(
            r#"
            INSERT INTO users ("userName", "passwordHash", role, address, gender, "birthDate")
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.user_name)
            .bind(&user.password_hash)
            .bind(&user.role)
            .bind(&user.address)
            .bind(&user.gender)
            .bind(user.birth_date)
            .fetch_one(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn list(&self) -> RepoResult<Vec<UserRow>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY "userId" ASC
            "#
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;

        Ok(rows)
    }

    async fn get(&self, user_id: i64) -> RepoResult<Option<UserRow>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE "userId" = $1
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn find_by_user_name(&self, user_name: &str) -> RepoResult<Option<UserRow>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE "userName" = $1
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<UserRow>> {
        // strpos avoids having to escape LIKE wildcards in user input
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE strpos("userName", $1) > 0
            ORDER BY "userId" ASC
            "#
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(fragment)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;

        Ok(rows)
    }

    async fn update_profile(
        &self,
        user_id: i64,
        update: ProfileUpdate,
    ) -> RepoResult<Option<UserRow>> {
        let sql = format!(
            r#"
            UPDATE users
            SET
                address = CASE WHEN $2 = false THEN address ELSE $3 END,
                gender = CASE WHEN $4 = false THEN gender ELSE $5 END,
                "birthDate" = CASE WHEN $6 = false THEN "birthDate" ELSE $7 END,
                "updatedAt" = now()
            WHERE "userId" = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id)
            .bind(update.address.is_some()) // $2: flag to set address
            .bind(update.address.flatten()) // $3
            .bind(update.gender.is_some()) // $4
            .bind(update.gender.flatten()) // $5
            .bind(update.birth_date.is_some()) // $6
            .bind(update.birth_date.flatten()) // $7
            .fetch_optional(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn delete(&self, user_id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE "userId" = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(result.rows_affected() > 0)
    }
}
