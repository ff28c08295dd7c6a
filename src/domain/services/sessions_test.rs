use anyhow::Result;
use test_utils::png_fixture;

use super::SessionStore;
use crate::domain::models::ChatMessage;
use crate::domain::models::ConversationState;
use crate::domain::models::GeneratedImage;
use crate::domain::models::GREETING;

fn store_in(dir: &tempfile::TempDir) -> SessionStore {
    return SessionStore::new(dir.path().join("session_data.json"));
}

fn populated_state() -> ConversationState {
    let mut state = ConversationState::new("models/chat-1");
    state.add_message(ChatMessage::user("Harbor Loaf, a bakery"));
    state.record_reply("# Executive Summary\nBUSINESS PLAN GENERATED");
    state.images.insert(
        "The Cover Page".to_string(),
        GeneratedImage {
            png: png_fixture(2, 2),
            label: None,
        },
    );
    state.images.insert(
        "Financial Highlights".to_string(),
        GeneratedImage::placeholder("Error: quota exceeded..."),
    );

    return state;
}

#[tokio::test]
async fn it_round_trips_every_field() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_in(&dir);
    let state = populated_state();

    assert!(store.save(&state).await);

    let mut loaded = ConversationState::new("models/other");
    assert!(store.load(&mut loaded).await);
    assert_eq!(loaded, state);

    return Ok(());
}

#[tokio::test]
async fn it_writes_the_expected_keys() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_in(&dir);
    assert!(store.save(&populated_state()).await);

    let payload = std::fs::read_to_string(store.path())?;
    let json: serde_json::Value = serde_json::from_str(&payload)?;
    let mut keys = json
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect::<Vec<String>>();
    keys.sort();

    assert_eq!(
        keys,
        vec![
            "generated_images",
            "generated_plan_text",
            "messages",
            "plan_generated",
            "selected_model"
        ]
    );
    assert!(payload.contains('\n'));

    return Ok(());
}

#[tokio::test]
async fn it_leaves_state_alone_when_missing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_in(&dir);

    let mut state = populated_state();
    let before = state.clone();

    assert!(!store.load(&mut state).await);
    assert_eq!(state, before);

    return Ok(());
}

#[tokio::test]
async fn it_only_restores_present_keys() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_in(&dir);
    std::fs::write(store.path(), r##"{"plan_generated": true, "generated_plan_text": "# Hi"}"##)?;

    let mut state = ConversationState::new("models/chat-1");
    assert!(store.load(&mut state).await);

    assert!(state.plan_generated);
    assert_eq!(state.plan_text, "# Hi");
    assert_eq!(state.selected_model, "models/chat-1");
    assert_eq!(state.messages, vec![ChatMessage::assistant(GREETING)]);

    return Ok(());
}

#[tokio::test]
async fn it_reports_corrupt_files() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_in(&dir);
    std::fs::write(store.path(), "{ not json")?;

    let mut state = populated_state();
    let before = state.clone();

    assert!(!store.load(&mut state).await);
    assert_eq!(state, before);

    return Ok(());
}

#[tokio::test]
async fn it_reports_unwritable_paths() -> Result<()> {
    let dir = tempfile::tempdir()?;
    // A directory cannot be opened as a file.
    let store = SessionStore::new(dir.path().to_path_buf());

    assert!(!store.save(&populated_state()).await);

    return Ok(());
}

#[tokio::test]
async fn it_creates_missing_parent_directories() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = SessionStore::new(dir.path().join("nested/deeper/session.json"));

    assert!(store.save(&populated_state()).await);
    assert!(store.path().exists());

    return Ok(());
}

#[tokio::test]
async fn it_clears_file_and_state() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_in(&dir);
    let mut state = populated_state();
    assert!(store.save(&state).await);

    store.clear(&mut state).await;

    assert!(!store.path().exists());
    assert_eq!(state, ConversationState::new("models/chat-1"));

    return Ok(());
}

#[tokio::test]
async fn it_clears_without_a_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = store_in(&dir);
    let mut state = populated_state();

    store.clear(&mut state).await;

    assert!(!state.plan_generated);
    assert!(state.images.is_empty());

    return Ok(());
}
