//! Identity is an external collaborator: the engine treats the current user
//! as an opaque precondition and gates nothing on it. The local provider
//! persists a single signed-in identity to disk for the console shell.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

const IDENTITY_FILE: &str = "auth_user.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub provider: String,
}

pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<Identity>;
    fn sign_in(&self, identity: Identity) -> Result<()>;
    fn sign_out(&self) -> Result<()>;
}

pub struct LocalIdentityProvider {
    path: PathBuf,
    current: RwLock<Option<Identity>>,
}

impl LocalIdentityProvider {
    pub fn new(data_dir: &Path) -> Self {
        let path = data_dir.join(IDENTITY_FILE);
        let current = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok());
        Self {
            path,
            current: RwLock::new(current),
        }
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn current_user(&self) -> Option<Identity> {
        self.current.read().clone()
    }

    fn sign_in(&self, identity: Identity) -> Result<()> {
        let json = serde_json::to_string_pretty(&identity)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::info!(user = %identity.email, "identity signed in");
        *self.current.write() = Some(identity);
        Ok(())
    }

    fn sign_out(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        *self.current.write() = None;
        Ok(())
    }
}
