use anyhow::Result;

use super::ClientState;
use super::StateFile;

#[tokio::test]
async fn it_defaults_when_no_file_exists() -> Result<()> {
    let file = StateFile::new(std::env::temp_dir().join("conversa-state-missing/state.yaml"));
    assert_eq!(file.load().await?, ClientState::default());

    return Ok(());
}

#[tokio::test]
async fn it_round_trips_state() -> Result<()> {
    let file = StateFile::new(std::env::temp_dir().join("conversa-state-roundtrip/state.yaml"));
    let state = ClientState {
        session_id: "s-1".to_string(),
        mode: "ocr".to_string(),
        theme: "dark".to_string(),
    };

    file.save(&state).await?;
    assert_eq!(file.load().await?, state);

    return Ok(());
}

#[tokio::test]
async fn it_tolerates_partial_files() -> Result<()> {
    let dir = std::env::temp_dir().join("conversa-state-partial");
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join("state.yaml");
    tokio::fs::write(&path, "mode: regular\n").await?;

    let state = StateFile::new(path).load().await?;
    assert_eq!(state.mode, "regular");
    assert_eq!(state.session_id, "");

    return Ok(());
}
