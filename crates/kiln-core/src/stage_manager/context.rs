use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::host::CodeHost;
use crate::stage_manager::error::StageSystemError;

/// Which side(s) the running process acts as.
///
/// `server` and `client` boot stages only run when the matching flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Realm {
    /// Authoritative role
    pub server: bool,
    /// Presentation role
    pub client: bool,
}

impl Realm {
    pub fn server() -> Self {
        Self { server: true, client: false }
    }

    pub fn client() -> Self {
        Self { server: false, client: true }
    }

    /// Listen server: both roles in one process
    pub fn both() -> Self {
        Self { server: true, client: true }
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::server()
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.server, self.client) {
            (true, true) => write!(f, "server+client"),
            (true, false) => write!(f, "server"),
            (false, true) => write!(f, "client"),
            (false, false) => write!(f, "none"),
        }
    }
}

/// Key/value store for singletons published while plugins boot
#[derive(Default)]
pub struct ObjectStore {
    objects: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `value` under `key`, replacing any previous object
    pub fn set_object<T: 'static + Send + Sync>(&mut self, key: &str, value: T) -> Result<(), StageSystemError> {
        if key.is_empty() {
            return Err(StageSystemError::ContextError {
                key: key.to_string(),
                reason: "cannot set an object under an empty key".to_string(),
            });
        }
        self.objects.insert(key.to_string(), Box::new(value));
        Ok(())
    }

    /// Get a published object, `None` if absent or of another type
    pub fn get_object<T: 'static + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.objects.get(key).and_then(|data| data.downcast_ref::<T>())
    }

    /// Get a mutable reference to a published object
    pub fn get_object_mut<T: 'static + Send + Sync>(&mut self, key: &str) -> Option<&mut T> {
        self.objects.get_mut(key).and_then(|data| data.downcast_mut::<T>())
    }

    /// Remove an object; returns whether one was present
    pub fn unset_object(&mut self, key: &str) -> Result<bool, StageSystemError> {
        if key.is_empty() {
            return Err(StageSystemError::ContextError {
                key: key.to_string(),
                reason: "cannot unset an object under an empty key".to_string(),
            });
        }
        Ok(self.objects.remove(key).is_some())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl fmt::Debug for ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.objects.keys().collect();
        keys.sort();
        f.debug_struct("ObjectStore").field("keys", &keys).finish()
    }
}

/// Process-wide state handed to every boot stage.
///
/// Created once per runtime and passed explicitly instead of living in globals.
pub struct BootContext {
    /// Realm flags gating side-specific stages
    pub realm: Realm,

    /// Objects published by plugins and the embedding application
    pub objects: ObjectStore,

    /// Collaborator that includes entrypoint and category files
    host: Arc<dyn CodeHost>,
}

impl BootContext {
    pub fn new(realm: Realm, host: Arc<dyn CodeHost>) -> Self {
        Self {
            realm,
            objects: ObjectStore::new(),
            host,
        }
    }

    /// The code inclusion collaborator
    pub fn host(&self) -> &Arc<dyn CodeHost> {
        &self.host
    }

    pub fn is_server(&self) -> bool {
        self.realm.server
    }

    pub fn is_client(&self) -> bool {
        self.realm.client
    }
}

impl fmt::Debug for BootContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootContext")
            .field("realm", &self.realm)
            .field("objects", &self.objects)
            .finish_non_exhaustive()
    }
}
