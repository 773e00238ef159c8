// src/core/refresh.rs

//! # Refresh Cycle
//!
//! Keeps the [`PatternRegistry`] in sync with the alias source.
//!
//! A cycle fetches every alias definition, rebuilds the registry from scratch and
//! publishes the result in one swap. When the source rejects the credentials the
//! authenticator gets exactly one chance to renew them before the fetch is retried.
//! Any failure abandons the cycle and leaves the previous snapshot in place.

use crate::{
    CancellationToken,
    core::{
        cache::{self, CacheError, CachedAliases},
        registry::{PatternRegistry, RegistrySnapshot},
    },
    models::AliasDefinition,
};
use async_trait::async_trait;
use std::{
    future::Future,
    path::PathBuf,
    sync::{Arc, atomic::Ordering},
    time::Duration,
};
use thiserror::Error;
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

/// Errors produced while talking to the alias source or the authentication service.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("The StackStorm API rejected the credentials.")]
    Unauthorized,
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected HTTP status {status} from '{url}'")]
    Status { status: u16, url: String },
    #[error("Could not decode the response: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("Failed to fetch action aliases: {0}")]
    Fetch(#[source] FetchError),
    #[error("Failed to renew credentials: {0}")]
    Renew(#[source] FetchError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("Registry rebuild was aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Where alias definitions come from.
#[async_trait]
pub trait AliasSource: Send + Sync {
    async fn fetch_aliases(&self) -> Result<Vec<AliasDefinition>, FetchError>;
}

/// The credential collaborator of the alias source.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Checks whether the current credentials are still accepted.
    async fn probe(&self) -> Result<bool, FetchError>;
    /// Obtains fresh credentials, replacing the current ones.
    async fn renew(&self) -> Result<(), FetchError>;
}

/// Drives refresh cycles against one registry.
pub struct Refresher {
    registry: Arc<PatternRegistry>,
    source: Arc<dyn AliasSource>,
    authenticator: Arc<dyn Authenticator>,
    request_timeout: Duration,
    cache_path: Option<PathBuf>,
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("request_timeout", &self.request_timeout)
            .field("cache_path", &self.cache_path)
            .finish_non_exhaustive()
    }
}

impl Refresher {
    pub fn new(
        registry: Arc<PatternRegistry>,
        source: Arc<dyn AliasSource>,
        authenticator: Arc<dyn Authenticator>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            source,
            authenticator,
            request_timeout,
            cache_path: None,
        }
    }

    /// Enables the last-good cache at `path`.
    pub fn with_cache(mut self, path: PathBuf) -> Self {
        self.cache_path = Some(path);
        self
    }

    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    /// Runs one refresh cycle.
    ///
    /// # Returns
    ///
    /// The newly published snapshot. On error nothing is published.
    pub async fn refresh_once(&self) -> Result<Arc<RegistrySnapshot>, RefreshError> {
        let definitions = match self.fetch().await {
            Ok(definitions) => definitions,
            Err(FetchError::Unauthorized) => {
                log::info!("Alias source rejected the credentials, renewing once.");
                with_timeout(self.request_timeout, self.authenticator.renew())
                    .await
                    .map_err(RefreshError::Renew)?;
                self.fetch().await.map_err(RefreshError::Fetch)?
            }
            Err(e) => return Err(RefreshError::Fetch(e)),
        };

        let cached = CachedAliases::new(definitions)?;
        if self.registry.snapshot().fingerprint == cached.fingerprint {
            log::debug!("Action aliases unchanged ({}).", cached.fingerprint);
        }

        // Compiling is CPU-bound; keep it off the async workers.
        let registry = Arc::clone(&self.registry);
        let cache_path = self.cache_path.clone();
        let snapshot = tokio::task::spawn_blocking(move || {
            let snapshot = registry.rebuild(&cached.definitions, cached.fingerprint.clone());
            if let Some(path) = cache_path {
                if let Err(e) = cache::write_cache(&path, &cached) {
                    log::warn!("Could not persist alias cache '{}': {}", path.display(), e);
                }
            }
            snapshot
        })
        .await?;

        Ok(snapshot)
    }

    async fn fetch(&self) -> Result<Vec<AliasDefinition>, FetchError> {
        with_timeout(self.request_timeout, self.source.fetch_aliases()).await
    }

    /// Performs the initial refresh. If the alias source is unavailable, the registry is
    /// seeded from the last-good cache instead. Never fails; the worst case is an empty
    /// registry.
    pub async fn warm_start(&self) -> Arc<RegistrySnapshot> {
        let error = match self.refresh_once().await {
            Ok(snapshot) => return snapshot,
            Err(e) => e,
        };
        log::warn!("{} ({})", t!("refresh.stale"), error);

        let Some(path) = &self.cache_path else {
            return self.registry.snapshot();
        };
        match cache::read_cache(path) {
            Ok(cached) => {
                log::info!(
                    "Loaded {} alias definition(s) from cache '{}'.",
                    cached.definitions.len(),
                    path.display()
                );
                self.registry.rebuild(&cached.definitions, cached.fingerprint)
            }
            Err(e) => {
                log::warn!("No usable alias cache: {}", e);
                self.registry.snapshot()
            }
        }
    }

    /// Starts the periodic refresh task. The first cycle runs one `interval` from now.
    /// The task exits at the first tick after `cancel` is raised.
    pub fn spawn(self: Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if cancel.load(Ordering::Relaxed) {
                    log::debug!("Refresh task cancelled.");
                    break;
                }
                match self.refresh_once().await {
                    Ok(snapshot) => log::info!(
                        "Refreshed action aliases: {} pattern(s).",
                        snapshot.patterns.len()
                    ),
                    Err(e) => log::error!("Alias refresh failed, keeping the previous set: {}", e),
                }
            }
        })
    }
}

async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, FetchError>>,
) -> Result<T, FetchError> {
    match time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(limit)),
    }
}
