use std::time::Duration;

use crate::errors::Result;
use async_trait::async_trait;

#[async_trait]
pub trait PageDriver: Send + Sync {
    type Element: Clone + Send + Sync;

    /// Navigate to a URL and wait for the load to settle
    async fn open(&mut self, url: &str) -> Result<()>;

    /// Bounded wait for an element matching `css` to be present
    async fn await_element(&self, css: &str, timeout: Duration) -> Result<Self::Element>;

    /// All descendants of `scope` matching `css`, in document order
    async fn query_all(&self, scope: &Self::Element, css: &str) -> Result<Vec<Self::Element>>;

    /// Rendered text content of an element
    async fn inner_text(&self, element: &Self::Element) -> Result<String>;

    /// Move the pointer to the element, then click it
    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// For each `row` under `container`, the href of its first `link`
    /// descendant, or `None` for rows without one
    async fn collect_row_links(
        &self,
        container: &Self::Element,
        row: &str,
        link: &str,
    ) -> Result<Vec<Option<String>>>;

    /// Content fingerprint of the container matching `css`; empty while the
    /// container is absent
    async fn fingerprint(&self, css: &str) -> Result<String>;

    /// Bounded wait until the container's fingerprint differs from `previous`
    async fn await_refresh(&self, css: &str, previous: &str, timeout: Duration) -> Result<()>;

    /// Tear down the underlying browser session
    async fn close(&mut self) -> Result<()>;
}
