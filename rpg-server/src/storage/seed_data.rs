//! Seed Data - Starter dialogue scripts for the event store
//!
//! Populates the event table with the scripts a fresh deployment needs:
//! the opening event, a follow-up encounter, and the evolution epilogue.
//! Inserts are idempotent so re-running at every startup is safe.

use rpg_core::constants::{EVOLUTION_EVENT_ID, SELF_SPEAKER_PLACEHOLDER};
use rpg_core::DialogueLine;
use tracing::info;

use super::sqlite::{SqliteStore, StoreError};

/// Seed all dialogue scripts. Returns how many lines were newly written.
pub async fn seed_all(store: &SqliteStore) -> Result<u64, StoreError> {
    let mut total = 0;
    total += seed_opening(store).await?;
    total += seed_encounter(store).await?;
    total += seed_evolution_epilogue(store).await?;

    info!("Seeded {} dialogue lines", total);
    Ok(total)
}

/// Event 1: the script every fresh player starts on
async fn seed_opening(store: &SqliteStore) -> Result<u64, StoreError> {
    seed_script(
        store,
        1,
        &[
            ("だれか", "Welcome to the RPG world!"),
            ("だれか", "Your first adventure begins..."),
            (SELF_SPEAKER_PLACEHOLDER, "よし、ぼうけんのはじまりだ！"),
        ],
    )
    .await
}

/// Event 2: the first encounter
async fn seed_encounter(store: &SqliteStore) -> Result<u64, StoreError> {
    seed_script(
        store,
        2,
        &[
            ("だれか", "A wild monster appears!"),
            (SELF_SPEAKER_PLACEHOLDER, "まけないぞ！"),
        ],
    )
    .await
}

/// Event 999: shown after the evolution announcement
async fn seed_evolution_epilogue(store: &SqliteStore) -> Result<u64, StoreError> {
    seed_script(
        store,
        EVOLUTION_EVENT_ID,
        &[
            ("だれか", "Congratulations on leveling up!"),
            (SELF_SPEAKER_PLACEHOLDER, "あたらしい力がみなぎってくる……"),
        ],
    )
    .await
}

async fn seed_script(
    store: &SqliteStore,
    event_id: i64,
    lines: &[(&str, &str)],
) -> Result<u64, StoreError> {
    let mut written = 0;
    for (index, (speaker, text)) in lines.iter().enumerate() {
        let line = DialogueLine::new(event_id, index as i64 + 1, *speaker, *text);
        if store.insert_event_line(&line).await? {
            written += 1;
        }
    }
    Ok(written)
}
