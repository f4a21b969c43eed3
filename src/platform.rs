//! Platform resolution.
//!
//! Each domain registers one fallback chain per OS family. A
//! [`CompositeSource`] picks its chain exactly once, at construction, and
//! keeps it for its whole lifetime. Platforms without a chain still construct
//! fine; only the first read reports `UnsupportedPlatform`.

use std::sync::Arc;

use ahash::AHashMap as HashMap;
use tracing::debug;

use crate::acquire::Acquire;
use crate::chain::{FallbackChain, Pipeline, ProbeResult};
use crate::error::{MetricsError, Result};
use crate::model::OsFamily;

/// Platform tag to pipeline list, for one domain.
pub struct PlatformRegistry<T> {
    domain: &'static str,
    chains: HashMap<OsFamily, Vec<Box<dyn Pipeline<T>>>>,
}

impl<T> PlatformRegistry<T> {
    pub fn new(domain: &'static str) -> Self {
        Self {
            domain,
            chains: HashMap::new(),
        }
    }

    /// Registers the pipelines for `platform`, replacing earlier ones.
    pub fn register(mut self, platform: OsFamily, pipelines: Vec<Box<dyn Pipeline<T>>>) -> Self {
        self.chains.insert(platform, pipelines);
        self
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    pub fn supports(&self, platform: OsFamily) -> bool {
        self.chains.contains_key(&platform)
    }

    /// Takes the chain for `platform` out of the registry.
    pub fn resolve(mut self, platform: OsFamily) -> Option<FallbackChain<T>> {
        let domain = self.domain;
        self.chains
            .remove(&platform)
            .map(|pipelines| FallbackChain::new(domain, pipelines))
    }
}

/// One domain's reader, bound to the platform detected at construction.
pub struct CompositeSource<T> {
    domain: &'static str,
    platform: OsFamily,
    chain: Option<FallbackChain<T>>,
    acquirer: Arc<dyn Acquire>,
}

impl<T> CompositeSource<T> {
    pub fn new(
        registry: PlatformRegistry<T>,
        platform: OsFamily,
        acquirer: Arc<dyn Acquire>,
    ) -> Self {
        let domain = registry.domain();
        let chain = registry.resolve(platform);
        match &chain {
            Some(c) => debug!(domain, %platform, pipelines = ?c.pipeline_ids(), "resolved source"),
            None => debug!(domain, %platform, "no source registered for platform"),
        }
        Self {
            domain,
            platform,
            chain,
            acquirer,
        }
    }

    pub fn domain(&self) -> &'static str {
        self.domain
    }

    pub fn platform(&self) -> OsFamily {
        self.platform
    }

    pub fn is_supported(&self) -> bool {
        self.chain.is_some()
    }

    fn chain(&self) -> Result<&FallbackChain<T>> {
        self.chain
            .as_ref()
            .ok_or_else(|| unsupported(self.domain, self.platform))
    }

    /// Reads a fresh snapshot through the resolved chain.
    pub fn read(&self) -> Result<T> {
        Ok(self.chain()?.read(self.acquirer.as_ref())?)
    }

    /// Runs each pipeline of the resolved chain and reports every outcome.
    pub fn probe(&self) -> Result<Vec<ProbeResult>> {
        Ok(self.chain()?.probe(self.acquirer.as_ref()))
    }
}

pub(crate) fn unsupported(domain: &str, platform: OsFamily) -> MetricsError {
    MetricsError::UnsupportedPlatform {
        domain: domain.to_string(),
        platform: platform.to_string(),
    }
}
