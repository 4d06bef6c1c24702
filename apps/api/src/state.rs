use std::sync::Arc;

use crate::cache::enums::EnumCache;
use crate::config::Config;
use crate::store::{ApplicationStore, BlobStore, EnumStore, ResumeStore, UserStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub resumes: Arc<dyn ResumeStore>,
    pub applications: Arc<dyn ApplicationStore>,
    /// Direct table access for writes and type listing.
    pub enum_store: Arc<dyn EnumStore>,
    /// Read-through view of `enum_store`; evict after every write.
    pub enums: EnumCache,
    pub blobs: Arc<dyn BlobStore>,
    pub config: Config,
}
