//! Credential Store
//!
//! Durable storage for the session credential pair. The store is an external
//! collaborator (keychain, encrypted preferences, …); the client only needs
//! get/set/clear of two opaque strings. Writes replace the whole pair so a
//! reader never observes a torn credential set.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::StorageError;
use crate::types::SessionCredentials;

/// Credential storage interface.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current access credential, if any.
    async fn access_token(&self) -> Result<Option<String>, StorageError>;

    /// Current refresh credential, if any.
    async fn refresh_token(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored credential pair.
    async fn store(&self, credentials: SessionCredentials) -> Result<(), StorageError>;

    /// Remove both credentials.
    async fn clear(&self) -> Result<(), StorageError>;
}

/// In-memory credential store.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: Mutex<Option<SessionCredentials>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a credential pair.
    pub fn with_credentials(credentials: SessionCredentials) -> Self {
        Self {
            credentials: Mutex::new(Some(credentials)),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn access_token(&self) -> Result<Option<String>, StorageError> {
        let credentials = self.credentials.lock().unwrap();
        Ok(credentials.as_ref().map(|c| c.access().to_string()))
    }

    async fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        let credentials = self.credentials.lock().unwrap();
        Ok(credentials.as_ref().map(|c| c.refresh().to_string()))
    }

    async fn store(&self, credentials: SessionCredentials) -> Result<(), StorageError> {
        *self.credentials.lock().unwrap() = Some(credentials);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        *self.credentials.lock().unwrap() = None;
        Ok(())
    }
}

/// Mock credential store for testing. Holds the two keys independently so
/// tests can stage partial states (an access credential with no refresh
/// credential).
#[derive(Default)]
pub struct MockCredentialStore {
    access: Mutex<Option<String>>,
    refresh: Mutex<Option<String>>,
    store_history: Mutex<Vec<SessionCredentials>>,
    clear_count: Mutex<usize>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl MockCredentialStore {
    /// Create new mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the credential pair.
    pub fn with_credentials(credentials: SessionCredentials) -> Self {
        Self {
            access: Mutex::new(Some(credentials.access().to_string())),
            refresh: Mutex::new(Some(credentials.refresh().to_string())),
            ..Self::default()
        }
    }

    /// Pre-populate only the access credential.
    pub fn with_access_only(access: impl Into<String>) -> Self {
        Self {
            access: Mutex::new(Some(access.into())),
            ..Self::default()
        }
    }

    /// Make all reads fail.
    pub fn set_fail_reads(&self, fail: bool) -> &Self {
        *self.fail_reads.lock().unwrap() = fail;
        self
    }

    /// Make all writes fail.
    pub fn set_fail_writes(&self, fail: bool) -> &Self {
        *self.fail_writes.lock().unwrap() = fail;
        self
    }

    /// Get store history.
    pub fn get_store_history(&self) -> Vec<SessionCredentials> {
        self.store_history.lock().unwrap().clone()
    }

    /// Number of times `clear` was called.
    pub fn clear_count(&self) -> usize {
        *self.clear_count.lock().unwrap()
    }

    fn check_read(&self) -> Result<(), StorageError> {
        if *self.fail_reads.lock().unwrap() {
            return Err(StorageError::ReadFailed {
                message: "mock storage read failure".to_string(),
            });
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StorageError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(StorageError::WriteFailed {
                message: "mock storage write failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.check_read()?;
        Ok(self.access.lock().unwrap().clone())
    }

    async fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        self.check_read()?;
        Ok(self.refresh.lock().unwrap().clone())
    }

    async fn store(&self, credentials: SessionCredentials) -> Result<(), StorageError> {
        self.check_write()?;
        self.store_history.lock().unwrap().push(credentials.clone());
        *self.access.lock().unwrap() = Some(credentials.access().to_string());
        *self.refresh.lock().unwrap() = Some(credentials.refresh().to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.check_write()?;
        *self.clear_count.lock().unwrap() += 1;
        *self.access.lock().unwrap() = None;
        *self.refresh.lock().unwrap() = None;
        Ok(())
    }
}

/// Create in-memory credential store.
pub fn create_in_memory_store() -> InMemoryCredentialStore {
    InMemoryCredentialStore::new()
}

/// Create mock credential store for testing.
pub fn create_mock_store() -> MockCredentialStore {
    MockCredentialStore::new()
}
