use std::sync::Arc;

use anyhow::Result;

use crate::models::Profile;
use crate::store::{KeyValueStore, PROFILE_KEY, read_json, write_json};

/// Loads and saves the single profile record.
pub struct ProfileRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Overwrites any previous profile wholesale.
    pub fn save(&self, profile: &Profile) -> Result<()> {
        write_json(self.store.as_ref(), PROFILE_KEY, profile)
    }

    pub fn load(&self) -> Result<Option<Profile>> {
        read_json(self.store.as_ref(), PROFILE_KEY)
    }
}
