//! # In-Memory Identity Store
//!
//! All state sits behind one `RwLock`, so every uniqueness check and the
//! write it guards happen atomically.

use crate::domain::entities::{CredentialToken, NewUser, UserId, UserPatch, UserRecord};
use crate::domain::errors::StoreError;
use crate::domain::password::PasswordDigest;
use crate::ports::inbound::IdentityStore;
use bridge_types::Role;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

#[derive(Default)]
struct Directory {
    next_id: UserId,
    users: BTreeMap<UserId, UserRecord>,
    /// token -> user
    tokens: HashMap<String, UserId>,
    /// user -> token
    issued: HashMap<UserId, CredentialToken>,
}

impl Directory {
    fn username_owner(&self, username: &str) -> Option<UserId> {
        self.users
            .values()
            .find(|u| u.username == username)
            .map(|u| u.id)
    }

    fn email_owner(&self, email: &str) -> Option<UserId> {
        self.users.values().find(|u| u.email == email).map(|u| u.id)
    }

    /// Reject `username`/`email` if held by an account other than `except`.
    fn check_unique(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        except: Option<UserId>,
    ) -> Result<(), StoreError> {
        if let Some(username) = username {
            if self
                .username_owner(username)
                .is_some_and(|owner| Some(owner) != except)
            {
                return Err(StoreError::DuplicateUsername(username.to_string()));
            }
        }
        if let Some(email) = email {
            if self
                .email_owner(email)
                .is_some_and(|owner| Some(owner) != except)
            {
                return Err(StoreError::DuplicateEmail(email.to_string()));
            }
        }
        Ok(())
    }
}

/// In-memory [`IdentityStore`].
pub struct InMemoryIdentityStore {
    directory: RwLock<Directory>,
    available: AtomicBool,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            directory: RwLock::new(Directory {
                next_id: 1,
                ..Default::default()
            }),
            available: AtomicBool::new(true),
        }
    }

    /// Toggle availability. While unavailable every operation fails with
    /// [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        info!(available, "Identity store availability changed");
    }

    /// Ensure an administrator account named `username` exists.
    ///
    /// An existing account of that name is returned unchanged.
    pub fn seed_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, StoreError> {
        if let Some(existing) = self.find_by_username(username)? {
            debug!(user_id = existing.id, "Administrator seed already present");
            return Ok(existing);
        }
        let admin = self.create_user(
            NewUser::new(username, email, password).with_role(Role::Administrator),
        )?;
        info!(user_id = admin.id, "Administrator account seeded");
        Ok(admin)
    }

    pub fn len(&self) -> usize {
        self.directory.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.ensure_available()?;
        let directory = self.directory.read();
        Ok(directory
            .users
            .values()
            .find(|u| u.username == username)
            .filter(|u| u.password.verify(password))
            .cloned())
    }

    fn issue_token(&self, user: UserId) -> Result<CredentialToken, StoreError> {
        self.ensure_available()?;
        let mut directory = self.directory.write();
        if !directory.users.contains_key(&user) {
            return Err(StoreError::NotFound(user));
        }
        if let Some(token) = directory.issued.get(&user) {
            return Ok(token.clone());
        }

        let token = CredentialToken::generate();
        directory.tokens.insert(token.as_str().to_string(), user);
        directory.issued.insert(user, token.clone());
        debug!(user_id = user, "Credential token issued");
        Ok(token)
    }

    fn set_password(&self, user: UserId, password: &str) -> Result<(), StoreError> {
        self.ensure_available()?;
        let mut directory = self.directory.write();
        let record = directory
            .users
            .get_mut(&user)
            .ok_or(StoreError::NotFound(user))?;
        record.password = PasswordDigest::new(password);
        Ok(())
    }

    fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, StoreError> {
        self.ensure_available()?;
        Ok(self.directory.read().users.get(&id).cloned())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        self.ensure_available()?;
        let directory = self.directory.read();
        Ok(directory
            .username_owner(username)
            .and_then(|id| directory.users.get(&id))
            .cloned())
    }

    fn find_by_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        self.ensure_available()?;
        let directory = self.directory.read();
        Ok(directory
            .tokens
            .get(token)
            .and_then(|id| directory.users.get(id))
            .cloned())
    }

    fn username_taken(&self, username: &str) -> Result<bool, StoreError> {
        self.ensure_available()?;
        Ok(self.directory.read().username_owner(username).is_some())
    }

    fn email_taken(&self, email: &str) -> Result<bool, StoreError> {
        self.ensure_available()?;
        Ok(self.directory.read().email_owner(email).is_some())
    }

    fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        self.ensure_available()?;
        Ok(self.directory.read().users.values().cloned().collect())
    }

    fn create_user(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        self.ensure_available()?;
        let mut directory = self.directory.write();
        directory.check_unique(Some(&user.username), Some(&user.email), None)?;

        let id = directory.next_id;
        directory.next_id += 1;
        let record = UserRecord {
            id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_active: true,
            date_joined: Utc::now(),
            password: PasswordDigest::new(&user.password),
        };
        directory.users.insert(id, record.clone());

        debug!(user_id = id, role = %record.role, "User created");
        Ok(record)
    }

    fn update_user(&self, id: UserId, patch: UserPatch) -> Result<UserRecord, StoreError> {
        self.ensure_available()?;
        let mut directory = self.directory.write();
        if !directory.users.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        directory.check_unique(patch.username.as_deref(), patch.email.as_deref(), Some(id))?;

        let record = directory
            .users
            .get_mut(&id)
            .ok_or(StoreError::NotFound(id))?;
        record.apply(patch);
        Ok(record.clone())
    }
}
