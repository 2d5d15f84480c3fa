// src/state.rs

use axum::extract::FromRef;

use crate::{config::Config, store::DynRepository, utils::upload::BlobStore};

#[derive(Clone)]
pub struct AppState {
    pub repo: DynRepository,
    pub config: Config,
    pub blobs: BlobStore,
}

impl FromRef<AppState> for DynRepository {
    fn from_ref(state: &AppState) -> Self {
        state.repo.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for BlobStore {
    fn from_ref(state: &AppState) -> Self {
        state.blobs.clone()
    }
}
