//! Subcommand implementations.

pub mod bulk;
pub mod init;
pub mod student;
pub mod terms;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use credtrack_core::engine::CreditEngine;
use credtrack_core::model::StudentId;
use credtrack_core::traits::CreditStore;
use credtrack_store::{
    create_store, load_config_from, load_fixture, CredtrackConfig, MemoryStore, StoreConfig,
};

use crate::SourceArgs;

/// An engine wired to the selected store.
pub(crate) struct Session {
    pub engine: CreditEngine,
    pub config: CredtrackConfig,
    /// Students present in the fixture, when the store is fixture-backed.
    pub known_students: Option<Vec<StudentId>>,
}

/// Load config and open the store; `--fixture` wins over the configured store.
pub(crate) fn open_session(source: &SourceArgs, batch_size: Option<usize>) -> Result<Session> {
    let mut config = load_config_from(source.config.as_deref())?;
    if let Some(size) = batch_size {
        anyhow::ensure!(size >= 1, "batch size must be at least 1");
        config.batch_size = size;
    }

    let fixture_path: Option<PathBuf> = match (&source.fixture, &config.store) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(StoreConfig::Memory { fixture })) => Some(fixture.clone()),
        _ => None,
    };

    let (store, known_students): (Arc<dyn CreditStore>, _) = match (fixture_path, &config.store) {
        (Some(path), _) => {
            let fixture = load_fixture(&path)?;
            let known = fixture.student_ids();
            let store: Arc<dyn CreditStore> = Arc::new(MemoryStore::new(fixture));
            (store, Some(known))
        }
        (None, Some(store)) => (create_store(store)?, None),
        (None, None) => anyhow::bail!(
            "no store configured. Pass --fixture or add a [store] section to credtrack.toml"
        ),
    };

    tracing::debug!(store = store.name(), batch_size = config.batch_size, "opened store");

    let engine = CreditEngine::new(store, config.engine_config());
    Ok(Session {
        engine,
        config,
        known_students,
    })
}
