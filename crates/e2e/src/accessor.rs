//! Element Accessor: the thin seam between the harness and a live page

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use wizcheck_common::{ElementState, Target};

use crate::error::{E2eError, E2eResult};

/// Semantic reads and actions against one browser session.
///
/// Implementations resolve [`Target`]s to concrete elements; the harness
/// never sees selectors. Every call is a suspension point; callers bound it
/// with [`bounded`] or poll it through [`crate::wait::wait_for`].
#[async_trait]
pub trait ElementAccessor: Send + Sync {
    async fn navigate(&self, url: &str) -> E2eResult<()>;

    async fn current_url(&self) -> E2eResult<String>;

    /// Dismiss the consent gate. Idempotent: a session with no banner is a no-op.
    async fn bootstrap(&self) -> E2eResult<()>;

    /// Read the element's state. A missing element is `ElementState::absent()`, not an error.
    async fn probe(&self, target: &Target) -> E2eResult<ElementState>;

    /// Type into a text-like input, appending to its current value
    async fn type_text(&self, target: &Target, text: &str) -> E2eResult<()>;

    async fn clear(&self, target: &Target) -> E2eResult<()>;

    async fn click(&self, target: &Target) -> E2eResult<()>;

    /// Release the session
    async fn close(&self) -> E2eResult<()> {
        Ok(())
    }
}

/// Opens fresh, isolated sessions; one per scenario execution
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> E2eResult<Box<dyn ElementAccessor>>;

    /// Short name for logs and reports
    fn describe(&self) -> String;
}

/// Bound one suspension point by `timeout`
pub async fn bounded<T, F>(what: impl Into<String>, timeout: Duration, fut: F) -> E2eResult<T>
where
    F: Future<Output = E2eResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(E2eError::Timeout {
            what: what.into(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
