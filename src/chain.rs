//! Fallback chains of acquisition + parse pipelines.
//!
//! A chain holds the pipelines for one domain on one platform in priority
//! order. [`FallbackChain::read`] returns the first success; when every
//! pipeline fails the individual errors are kept in an [`AggregateError`].

use tracing::{debug, warn};

use crate::acquire::Acquire;
use crate::error::{AggregateError, Attempt, Result};

/// One way of producing a `T`: acquire raw text, then parse it.
///
/// A pipeline is all-or-nothing unless it documents optional sub-reads,
/// which degrade to empty values instead of failing the attempt.
pub trait Pipeline<T>: Send + Sync {
    /// Stable identifier used in logs and in [`AggregateError`] attempts.
    fn id(&self) -> &str;

    fn read(&self, acquirer: &dyn Acquire) -> Result<T>;
}

/// Pipeline backed by a closure.
pub struct FnPipeline<F> {
    id: String,
    read: F,
}

impl<T, F> Pipeline<T> for FnPipeline<F>
where
    F: Fn(&dyn Acquire) -> Result<T> + Send + Sync,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self, acquirer: &dyn Acquire) -> Result<T> {
        (self.read)(acquirer)
    }
}

/// Boxes a closure as a pipeline.
pub fn pipeline<T, F>(id: impl Into<String>, read: F) -> Box<dyn Pipeline<T>>
where
    T: 'static,
    F: Fn(&dyn Acquire) -> Result<T> + Send + Sync + 'static,
{
    Box::new(FnPipeline { id: id.into(), read })
}

/// Outcome of running one pipeline in isolation, see [`FallbackChain::probe`].
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub pipeline: String,
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

pub struct FallbackChain<T> {
    domain: String,
    pipelines: Vec<Box<dyn Pipeline<T>>>,
}

impl<T> FallbackChain<T> {
    pub fn new(domain: impl Into<String>, pipelines: Vec<Box<dyn Pipeline<T>>>) -> Self {
        Self {
            domain: domain.into(),
            pipelines,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn pipeline_ids(&self) -> Vec<&str> {
        self.pipelines.iter().map(|p| p.id()).collect()
    }

    /// Tries every pipeline in order and returns the first success.
    pub fn read(&self, acquirer: &dyn Acquire) -> std::result::Result<T, AggregateError> {
        let mut attempts = Vec::with_capacity(self.pipelines.len());

        for pipeline in &self.pipelines {
            debug!(domain = %self.domain, pipeline = pipeline.id(), "trying pipeline");
            match pipeline.read(acquirer) {
                Ok(value) => {
                    if !attempts.is_empty() {
                        debug!(
                            domain = %self.domain,
                            pipeline = pipeline.id(),
                            failed_before = attempts.len(),
                            "fallback pipeline succeeded"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => {
                    warn!(
                        domain = %self.domain,
                        pipeline = pipeline.id(),
                        error = %error,
                        "pipeline failed"
                    );
                    attempts.push(Attempt {
                        pipeline: pipeline.id().to_string(),
                        error,
                    });
                }
            }
        }

        Err(AggregateError {
            domain: self.domain.clone(),
            attempts,
        })
    }

    /// Runs every pipeline, without short-circuiting, and reports each outcome.
    pub fn probe(&self, acquirer: &dyn Acquire) -> Vec<ProbeResult> {
        self.pipelines
            .iter()
            .map(|p| ProbeResult {
                pipeline: p.id().to_string(),
                error: p.read(acquirer).err().map(|e| e.to_string()),
            })
            .collect()
    }
}

impl<T> std::fmt::Debug for FallbackChain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackChain")
            .field("domain", &self.domain)
            .field("pipelines", &self.pipeline_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::MockAcquirer;
    use crate::error::{AcquisitionError, MetricsError, ParseError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn failing(id: &str) -> Box<dyn Pipeline<u32>> {
        let target = id.to_string();
        pipeline(id, move |_| {
            Err(AcquisitionError::NotFound {
                target: target.clone(),
            }
            .into())
        })
    }

    fn succeeding(id: &str, value: u32) -> Box<dyn Pipeline<u32>> {
        pipeline(id, move |_| Ok(value))
    }

    #[test]
    fn test_first_success_wins() {
        let chain = FallbackChain::new(
            "test",
            vec![failing("a"), succeeding("b", 7), succeeding("c", 9)],
        );
        assert_eq!(chain.read(&MockAcquirer::new()), Ok(7));
    }

    #[test]
    fn test_all_failures_are_aggregated_in_order() {
        let chain = FallbackChain::new("test", vec![failing("a"), failing("b")]);
        let err = chain.read(&MockAcquirer::new()).unwrap_err();
        assert_eq!(err.domain, "test");
        assert_eq!(err.attempts.len(), 2);
        assert_eq!(err.attempts[0].pipeline, "a");
        assert_eq!(err.attempts[1].pipeline, "b");
        assert!(matches!(
            err.attempts[0].error,
            MetricsError::Acquisition(AcquisitionError::NotFound { .. })
        ));
    }

    #[test]
    fn test_later_pipelines_not_run_after_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let counted = pipeline("counted", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(1u32)
        });
        let chain = FallbackChain::new("test", vec![succeeding("first", 0), counted]);
        assert_eq!(chain.read(&MockAcquirer::new()), Ok(0));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parse_errors_are_kept_unchanged() {
        let bad = pipeline("bad", |_| -> Result<u32> {
            Err(ParseError::empty("/proc/stat").into())
        });
        let err = FallbackChain::new("cpu", vec![bad]).read(&MockAcquirer::new()).unwrap_err();
        assert_eq!(
            err.attempts[0].error,
            MetricsError::Parse(ParseError::empty("/proc/stat"))
        );
    }

    #[test]
    fn test_empty_chain_fails_without_attempts() {
        let chain: FallbackChain<u32> = FallbackChain::new("none", Vec::new());
        assert!(chain.read(&MockAcquirer::new()).unwrap_err().attempts.is_empty());
    }

    #[test]
    fn test_probe_runs_every_pipeline() {
        let chain = FallbackChain::new("test", vec![succeeding("a", 1), failing("b")]);
        let report = chain.probe(&MockAcquirer::new());
        assert_eq!(report.len(), 2);
        assert!(report[0].succeeded());
        assert!(!report[1].succeeded());
        assert_eq!(chain.pipeline_ids(), vec!["a", "b"]);
    }
}
