use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::{PageDriver, SelectorConfig};
use crate::errors::{HarvestError, Result};

/// Scripted listing standing in for the live directory: one entry per page,
/// each row either a href or `None` for a row without a link.
#[derive(Debug, Clone)]
pub struct MockListing {
    pages: Vec<Vec<Option<String>>>,
    labels: Vec<String>,
}

impl MockListing {
    pub fn new(pages: Vec<Vec<Option<String>>>) -> Self {
        let labels = (1..=pages.len()).map(|n| n.to_string()).collect();
        Self { pages, labels }
    }

    /// `pages` pages of `rows` rows each, with predictable hrefs
    pub fn uniform(pages: usize, rows: usize) -> Self {
        Self::new(
            (1..=pages)
                .map(|p| {
                    (1..=rows)
                        .map(|r| Some(format!("https://example.com/company/p{}r{}", p, r)))
                        .collect()
                })
                .collect(),
        )
    }

    /// Override the pagination labels, e.g. to drop one or end on a
    /// non-numeric label
    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockElement {
    Consent,
    Pagination,
    PageLink(String),
    RowsContainer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Opened,
    ConsentClicked,
    RowsExtracted(u32),
    Advanced(u32),
    Closed,
}

#[derive(Debug)]
struct MockState {
    current_page: u32,
    consent_clicks: u32,
    advance_clicks: Vec<String>,
    events: Vec<MockEvent>,
    closed: bool,
}

/// In-memory page driver used by the harvester tests. Records every
/// interaction so tests can assert on click counts and ordering.
pub struct MockDriver {
    listing: MockListing,
    selectors: SelectorConfig,
    state: Mutex<MockState>,
}

impl MockDriver {
    pub fn new(listing: MockListing) -> Self {
        Self::with_selectors(listing, SelectorConfig::default())
    }

    pub fn with_selectors(listing: MockListing, selectors: SelectorConfig) -> Self {
        Self {
            listing,
            selectors,
            state: Mutex::new(MockState {
                current_page: 1,
                consent_clicks: 0,
                advance_clicks: Vec::new(),
                events: Vec::new(),
                closed: false,
            }),
        }
    }

    pub fn consent_clicks(&self) -> u32 {
        self.state.lock().unwrap().consent_clicks
    }

    pub fn advance_click_labels(&self) -> Vec<String> {
        self.state.lock().unwrap().advance_clicks.clone()
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn row_presence_selector(&self) -> String {
        format!("{} {}", self.selectors.rows_container, self.selectors.company_row)
    }

    fn current_rows(&self) -> Vec<Option<String>> {
        let page = self.state.lock().unwrap().current_page as usize;
        self.listing
            .pages
            .get(page - 1)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    type Element = MockElement;

    async fn open(&mut self, _url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.current_page = 1;
        state.events.push(MockEvent::Opened);
        Ok(())
    }

    async fn await_element(&self, css: &str, _timeout: Duration) -> Result<Self::Element> {
        if css == self.selectors.consent_button {
            return Ok(MockElement::Consent);
        }
        if css == self.selectors.pagination {
            return Ok(MockElement::Pagination);
        }
        if css == self.selectors.rows_container {
            return Ok(MockElement::RowsContainer);
        }
        if css == self.row_presence_selector() {
            if self.current_rows().is_empty() {
                return Err(HarvestError::Timeout(css.to_string()));
            }
            return Ok(MockElement::RowsContainer);
        }

        Err(HarvestError::ElementNotFound(css.to_string()))
    }

    async fn query_all(&self, scope: &Self::Element, css: &str) -> Result<Vec<Self::Element>> {
        if *scope == MockElement::Pagination && css == self.selectors.page_link {
            return Ok(self
                .listing
                .labels
                .iter()
                .map(|l| MockElement::PageLink(l.clone()))
                .collect());
        }

        Ok(Vec::new())
    }

    async fn inner_text(&self, element: &Self::Element) -> Result<String> {
        match element {
            MockElement::PageLink(label) => Ok(label.clone()),
            _ => Ok(String::new()),
        }
    }

    async fn click(&self, element: &Self::Element) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match element {
            MockElement::Consent => {
                state.consent_clicks += 1;
                state.events.push(MockEvent::ConsentClicked);
            }
            MockElement::PageLink(label) => {
                state.advance_clicks.push(label.clone());
                if let Ok(page) = label.parse::<u32>() {
                    if (1..=self.listing.pages.len() as u32).contains(&page) {
                        state.current_page = page;
                        state.events.push(MockEvent::Advanced(page));
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn collect_row_links(
        &self,
        container: &Self::Element,
        _row: &str,
        _link: &str,
    ) -> Result<Vec<Option<String>>> {
        if *container != MockElement::RowsContainer {
            return Err(HarvestError::ElementNotFound(format!("{:?}", container)));
        }

        let rows = self.current_rows();
        let mut state = self.state.lock().unwrap();
        let page = state.current_page;
        state.events.push(MockEvent::RowsExtracted(page));
        Ok(rows)
    }

    async fn fingerprint(&self, css: &str) -> Result<String> {
        if css == self.selectors.rows_container {
            Ok(format!("rows:{}", self.state.lock().unwrap().current_page))
        } else {
            Ok(String::new())
        }
    }

    async fn await_refresh(&self, css: &str, previous: &str, _timeout: Duration) -> Result<()> {
        let current = self.fingerprint(css).await?;
        if current != previous {
            Ok(())
        } else {
            Err(HarvestError::Timeout(format!("refresh of {}", css)))
        }
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.events.push(MockEvent::Closed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clicking_a_page_link_changes_the_fingerprint() {
        let driver = MockDriver::new(MockListing::uniform(3, 1));
        let selectors = SelectorConfig::default();

        let before = driver.fingerprint(&selectors.rows_container).await.unwrap();
        driver
            .click(&MockElement::PageLink("2".to_string()))
            .await
            .unwrap();
        let after = driver.fingerprint(&selectors.rows_container).await.unwrap();

        assert_ne!(before, after);
        driver
            .await_refresh(&selectors.rows_container, &before, Duration::from_secs(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn out_of_range_labels_do_not_advance() {
        let driver = MockDriver::new(MockListing::uniform(2, 1));

        driver
            .click(&MockElement::PageLink("9".to_string()))
            .await
            .unwrap();

        assert_eq!(driver.advance_click_labels(), vec!["9"]);
        assert!(driver
            .events()
            .iter()
            .all(|e| !matches!(e, MockEvent::Advanced(_))));
    }
}
