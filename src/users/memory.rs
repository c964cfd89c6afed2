use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::repo::{StoreError, StoreResult, UserStore};
use super::repo_types::{NewUser, PageRequest, User, UserChanges, UserFilter};

#[derive(Default)]
struct Inner {
    rows: BTreeMap<i64, User>,
    next_id: i64,
}

/// Process-local store mirroring the Postgres semantics, including the
/// unique email index.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn filter_matches(filter: &UserFilter, user: &User) -> bool {
    match &filter.name_contains {
        Some(term) => user.name.to_lowercase().contains(&term.to_lowercase()),
        None => true,
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list(&self, filter: &UserFilter, page: PageRequest) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        let rows = inner
            .rows
            .values()
            .rev()
            .filter(|u| filter_matches(filter, u))
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.per_page).unwrap_or(0))
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn count(&self, filter: &UserFilter) -> StoreResult<i64> {
        let inner = self.inner.read().await;
        let total = inner.rows.values().filter(|u| filter_matches(filter, u)).count();
        Ok(total as i64)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.rows.get(&id).cloned())
    }

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> StoreResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .values()
            .any(|u| u.email == email && Some(u.id) != except_id))
    }

    async fn insert(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        if inner.rows.values().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        inner.next_id += 1;
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: inner.next_id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            cpf: user.cpf,
            phone: user.phone,
            created_at: now,
            updated_at: now,
        };
        inner.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if let Some(email) = &changes.email {
            if inner.rows.values().any(|u| &u.email == email && u.id != id) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        let Some(row) = inner.rows.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(email) = changes.email {
            row.email = email;
        }
        if let Some(hash) = changes.password_hash {
            row.password_hash = hash;
        }
        if let Some(cpf) = changes.cpf {
            row.cpf = Some(cpf);
        }
        if let Some(phone) = changes.phone {
            row.phone = Some(phone);
        }
        row.updated_at = OffsetDateTime::now_utc();
        Ok(true)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.inner.write().await.rows.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            password_hash: "hash".into(),
            cpf: None,
            phone: None,
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_order() {
        let store = InMemoryUserStore::new();
        let a = store.insert(new_user("A", "a@example.com")).await.unwrap();
        let b = store.insert(new_user("B", "b@example.com")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("A", "a@example.com")).await.unwrap();
        let err = store.insert(new_user("B", "a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_paged() {
        let store = InMemoryUserStore::new();
        for i in 0..5 {
            store
                .insert(new_user(&format!("User {i}"), &format!("u{i}@example.com")))
                .await
                .unwrap();
        }
        let filter = UserFilter::default();
        let page = store
            .list(&filter, PageRequest { page: 2, per_page: 2 })
            .await
            .unwrap();
        let ids: Vec<i64> = page.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(store.count(&filter).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn filter_is_case_insensitive() {
        let store = InMemoryUserStore::new();
        store.insert(new_user("Maria Silva", "m@example.com")).await.unwrap();
        store.insert(new_user("João", "j@example.com")).await.unwrap();
        let filter = UserFilter {
            name_contains: Some("silva".into()),
        };
        assert_eq!(store.count(&filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_rows() {
        let store = InMemoryUserStore::new();
        assert!(!store.update(9, UserChanges::default()).await.unwrap());
        assert!(!store.delete(9).await.unwrap());
    }

    #[tokio::test]
    async fn email_taken_excludes_given_id() {
        let store = InMemoryUserStore::new();
        let a = store.insert(new_user("A", "a@example.com")).await.unwrap();
        assert!(store.email_taken("a@example.com", None).await.unwrap());
        assert!(!store.email_taken("a@example.com", Some(a.id)).await.unwrap());
    }
}
