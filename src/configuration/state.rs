#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// What survives a restart: the session to reopen, the mode it was in, and
/// the theme. No schema versioning; unknown or missing fields just default.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub theme: String,
}

pub struct StateFile {
    pub path: path::PathBuf,
}

impl Default for StateFile {
    fn default() -> StateFile {
        let path = dirs::cache_dir().unwrap().join("conversa/state.yaml");

        return StateFile::new(path);
    }
}

impl StateFile {
    pub fn new(path: path::PathBuf) -> StateFile {
        return StateFile { path };
    }

    pub async fn load(&self) -> Result<ClientState> {
        if !self.path.exists() {
            return Ok(ClientState::default());
        }

        let payload = fs::read_to_string(&self.path).await?;
        let state: ClientState = serde_yaml::from_str(&payload)?;

        return Ok(state);
    }

    pub async fn save(&self, state: &ClientState) -> Result<()> {
        let payload = serde_yaml::to_string(state)?;

        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(&self.path).await?;
        file.write_all(payload.as_bytes()).await?;

        return Ok(());
    }
}
