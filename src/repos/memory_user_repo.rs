//! In-memory `UserRepo` used by handler and middleware tests in place of Postgres.
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::user_repo::{NewUser, ProfileUpdate, UserRepo, UserRow};

#[derive(Debug, Default)]
pub struct MemoryUserRepo {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: BTreeMap<i64, UserRow>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, user: NewUser) -> RepoResult<UserRow> {
        let mut inner = self.inner.write().await;
        if inner.rows.values().any(|r| r.user_name == user.user_name) {
            return Err(RepoError::Conflict);
        }

        inner.next_id += 1;
        let now = Utc::now();
        let row = UserRow {
            id: inner.next_id,
            user_name: user.user_name,
            password_hash: user.password_hash,
            role: user.role,
            address: user.address,
            gender: user.gender,
            birth_date: user.birth_date,
            created_at: now,
            updated_at: now,
        };
        inner.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list(&self) -> RepoResult<Vec<UserRow>> {
        Ok(self.inner.read().await.rows.values().cloned().collect())
    }

    async fn get(&self, user_id: i64) -> RepoResult<Option<UserRow>> {
        Ok(self.inner.read().await.rows.get(&user_id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &str) -> RepoResult<Option<UserRow>> {
        Ok(self
            .inner
            .read()
            .await
            .rows
            .values()
            .find(|r| r.user_name == user_name)
            .cloned())
    }

    async fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<UserRow>> {
        Ok(self
            .inner
            .read()
            .await
            .rows
            .values()
            .filter(|r| r.user_name.contains(fragment))
            .cloned()
            .collect())
    }

    async fn update_profile(
        &self,
        user_id: i64,
        update: ProfileUpdate,
    ) -> RepoResult<Option<UserRow>> {
        let mut inner = self.inner.write().await;
        let Some(row) = inner.rows.get_mut(&user_id) else {
            return Ok(None);
        };

        if let Some(address) = update.address {
            row.address = address;
        }
        if let Some(gender) = update.gender {
            row.gender = gender;
        }
        if let Some(birth_date) = update.birth_date {
            row.birth_date = birth_date;
        }
        row.updated_at = Utc::now();

        Ok(Some(row.clone()))
    }

    async fn delete(&self, user_id: i64) -> RepoResult<bool> {
        Ok(self.inner.write().await.rows.remove(&user_id).is_some())
    }
}
