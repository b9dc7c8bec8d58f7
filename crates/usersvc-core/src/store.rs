//! User storage.
//!
//! `UserStore` is the seam between the HTTP layer and persistence. The
//! in-memory implementation serves reads lock-free from `DashMap` shards and
//! serialises writes so the email index and the record map never disagree.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::error::{Result, UsersError};
use crate::model::{NewUser, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user under a freshly assigned id.
    async fn create(&self, new: NewUser) -> Result<User>;
    async fn get(&self, id: u64) -> Result<User>;
    /// All users, ordered by id.
    async fn list(&self) -> Result<Vec<User>>;
    /// Full replacement of `name` and `email`. `id` and `created_at` are kept.
    async fn replace(&self, id: u64, new: NewUser) -> Result<User>;
    async fn delete(&self, id: u64) -> Result<()>;
    async fn count(&self) -> Result<usize>;
}

/// In-process store. Ids start at 1 and are never reused.
pub struct MemoryStore {
    users: DashMap<u64, User>,
    /// email -> owning id
    emails: DashMap<String, u64>,
    next_id: AtomicU64,
    writes: Mutex<()>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            next_id: AtomicU64::new(1),
            writes: Mutex::new(()),
        }
    }

    fn write_lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        // Poisoned lock means a writer panicked mid-update; refuse instead of guessing.
        self.writes
            .lock()
            .map_err(|_| UsersError::Internal("user store write lock poisoned".into()))
    }

    fn email_owner(&self, email: &str) -> Option<u64> {
        self.emails.get(email).map(|r| *r.value())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new: NewUser) -> Result<User> {
        let _w = self.write_lock()?;

        if self.email_owner(&new.email).is_some() {
            return Err(UsersError::Conflict("Email already exists".into()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let user = User {
            id,
            name: new.name,
            email: new.email,
            created_at: Utc::now(),
        };
        self.emails.insert(user.email.clone(), id);
        self.users.insert(id, user.clone());

        tracing::debug!(id, "user stored");
        Ok(user)
    }

    async fn get(&self, id: u64) -> Result<User> {
        self.users
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(UsersError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut out: Vec<User> = self.users.iter().map(|r| r.value().clone()).collect();
        out.sort_by_key(|u| u.id);
        Ok(out)
    }

    async fn replace(&self, id: u64, new: NewUser) -> Result<User> {
        let _w = self.write_lock()?;

        let old_email = self
            .users
            .get(&id)
            .map(|r| r.value().email.clone())
            .ok_or(UsersError::NotFound(id))?;

        if new.email != old_email {
            if let Some(owner) = self.email_owner(&new.email) {
                if owner != id {
                    return Err(UsersError::Conflict("Email already exists".into()));
                }
            }
            self.emails.remove(&old_email);
            self.emails.insert(new.email.clone(), id);
        }

        let mut entry = self.users.get_mut(&id).ok_or(UsersError::NotFound(id))?;
        entry.name = new.name;
        entry.email = new.email;
        Ok(entry.value().clone())
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let _w = self.write_lock()?;

        let (_, user) = self.users.remove(&id).ok_or(UsersError::NotFound(id))?;
        self.emails.remove(&user.email);
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.users.len())
    }
}
