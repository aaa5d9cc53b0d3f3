use crate::core::error::StoreError;
use crate::models::user::{Role, User};
use crate::security::password::PasswordHasher;
use crate::services::reputation::ReputationChange;
use crate::wal::wal::{Wal, WalOperation};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Field changes accepted by [`UserStore::update`]
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub merit: Option<u32>,
    pub foul_count: Option<u32>,
}

/// Credential store: users keyed by id with a unique email index
///
/// Lock order is always `emails` before `users`.
pub struct UserStore {
    users: DashMap<u32, User>,
    emails: DashMap<String, u32>,
    next_id: AtomicU32,
    hasher: PasswordHasher,
    wal: Arc<Wal>,
}

fn persistence(e: anyhow::Error) -> StoreError {
    StoreError::Persistence(e.to_string())
}

impl UserStore {
    pub fn new(hasher: PasswordHasher, wal: Arc<Wal>) -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            next_id: AtomicU32::new(1),
            hasher,
            wal,
        }
    }

    /// Register a new user; duplicate emails are a conflict
    pub async fn create(&self, email: &str, password: &str, role: Role) -> Result<User, StoreError> {
        if self.emails.contains_key(email) {
            return Err(StoreError::EmailTaken(email.to_string()));
        }

        let password_hash = self.hasher.hash(password.to_string()).await?;

        // Re-checked under the entry lock; hashing above is slow
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(_) => Err(StoreError::EmailTaken(email.to_string())),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                let user = User::new(id, email.to_string(), password_hash, role);

                self.wal
                    .log_operation(&WalOperation::PutUser { user: user.clone() })
                    .map_err(persistence)?;

                self.users.insert(id, user.clone());
                slot.insert(id);
                Ok(user)
            }
        }
    }

    pub fn get_by_id(&self, id: u32) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    pub fn get_by_email(&self, email: &str) -> Option<User> {
        let id = *self.emails.get(email)?;
        // An in-flight email change may have reserved the address already
        self.get_by_id(id).filter(|user| user.email == email)
    }

    /// All users ordered by id
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by_key(|user| user.id);
        users
    }

    /// `false` when the user is unknown or the password does not match
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<bool, StoreError> {
        let Some(user) = self.get_by_email(email) else {
            return Ok(false);
        };
        self.hasher
            .verify(password.to_string(), user.password_hash)
            .await
    }

    /// Update mutable fields; reputation counters may only grow
    pub async fn update(&self, id: u32, changes: UserChanges) -> Result<User, StoreError> {
        let password_hash = match changes.password {
            Some(password) => Some(self.hasher.hash(password).await?),
            None => None,
        };

        let mut reserved = None;
        if let Some(email) = &changes.email {
            match self.emails.entry(email.clone()) {
                Entry::Occupied(owner) if *owner.get() != id => {
                    return Err(StoreError::EmailTaken(email.clone()));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(id);
                    reserved = Some(email.clone());
                }
            }
        }

        let outcome = self.apply_update(
            id,
            changes.email,
            password_hash,
            changes.merit,
            changes.foul_count,
        );

        match outcome {
            Ok((updated, previous_email)) => {
                if previous_email != updated.email {
                    self.emails.remove(&previous_email);
                }
                Ok(updated)
            }
            Err(e) => {
                if let Some(email) = reserved {
                    self.emails.remove(&email);
                }
                Err(e)
            }
        }
    }

    fn apply_update(
        &self,
        id: u32,
        email: Option<String>,
        password_hash: Option<String>,
        merit: Option<u32>,
        foul_count: Option<u32>,
    ) -> Result<(User, String), StoreError> {
        let mut entry = self.users.get_mut(&id).ok_or(StoreError::UserNotFound(id))?;
        let current = entry.value();

        if merit.is_some_and(|merit| merit < current.merit) {
            return Err(StoreError::InvalidUpdate("merit cannot decrease".to_string()));
        }
        if foul_count.is_some_and(|fouls| fouls < current.foul_count) {
            return Err(StoreError::InvalidUpdate("foul count cannot decrease".to_string()));
        }

        let previous_email = current.email.clone();
        let mut updated = current.clone();
        if let Some(email) = email {
            updated.email = email;
        }
        if let Some(hash) = password_hash {
            updated.password_hash = hash;
        }
        if let Some(merit) = merit {
            updated.merit = merit;
        }
        if let Some(fouls) = foul_count {
            updated.foul_count = fouls;
        }
        updated.version += 1;

        self.wal
            .log_operation(&WalOperation::PutUser { user: updated.clone() })
            .map_err(persistence)?;

        *entry = updated.clone();
        Ok((updated, previous_email))
    }

    /// Apply one submission's reputation change atomically
    ///
    /// The read-modify-write happens under the entry lock so concurrent
    /// submissions from the same user never lose an increment.
    pub fn record_outcome(&self, id: u32, change: ReputationChange) -> Result<User, StoreError> {
        let mut entry = self.users.get_mut(&id).ok_or(StoreError::UserNotFound(id))?;

        let mut updated = entry.value().clone();
        match change {
            ReputationChange::Merit(points) => {
                updated.merit = updated.merit.saturating_add(points);
            }
            ReputationChange::Foul => {
                updated.foul_count = updated.foul_count.saturating_add(1);
            }
        }
        updated.version += 1;

        self.wal
            .log_operation(&WalOperation::PutUser { user: updated.clone() })
            .map_err(persistence)?;

        *entry = updated.clone();
        Ok(updated)
    }

    /// Remove a user; owned images and results are purged by the caller
    pub fn delete(&self, id: u32) -> Result<User, StoreError> {
        if !self.users.contains_key(&id) {
            return Err(StoreError::UserNotFound(id));
        }

        self.wal
            .log_operation(&WalOperation::RemoveUser { id })
            .map_err(persistence)?;

        let (_, user) = self.users.remove(&id).ok_or(StoreError::UserNotFound(id))?;
        self.emails.remove_if(&user.email, |_, owner| *owner == id);
        Ok(user)
    }

    /// Insert or replace a replayed snapshot without logging it again
    pub fn restore(&self, user: User) {
        let previous = self.users.get(&user.id).map(|entry| entry.email.clone());
        if let Some(previous) = previous {
            if previous != user.email {
                self.emails.remove_if(&previous, |_, owner| *owner == user.id);
            }
        }
        self.next_id.fetch_max(user.id + 1, Ordering::SeqCst);
        self.emails.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user);
    }

    pub fn forget(&self, id: u32) {
        if let Some((_, user)) = self.users.remove(&id) {
            self.emails.remove_if(&user.email, |_, owner| *owner == id);
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
