pub mod sink;

pub use sink::LinkSink;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::{HarvestConfig, PageDriver};
use crate::errors::{HarvestError, Result};

#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub started_at: DateTime<Utc>,
    pub pages_visited: u32,
    pub links_collected: usize,
    pub advance_clicks: u32,
}

/// Pagination traversal loop.
///
/// Dismisses the consent banner once, derives the page bound from the last
/// visible page label, then per page waits for company rows, appends their
/// hrefs to the sink and clicks the next page-number control. Readiness after
/// a click is detected by the row container's content fingerprint changing,
/// not by counting staleness events.
pub struct Harvester {
    config: HarvestConfig,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub async fn run<D: PageDriver>(
        &self,
        driver: &mut D,
        sink: &mut LinkSink,
    ) -> Result<HarvestReport> {
        let sel = &self.config.selectors;
        let timeouts = &self.config.timeouts;

        let mut report = HarvestReport {
            started_at: Utc::now(),
            pages_visited: 0,
            links_collected: 0,
            advance_clicks: 0,
        };

        info!(url = %self.config.listing_url, "opening listing");
        driver.open(&self.config.listing_url).await?;

        let consent = driver
            .await_element(&sel.consent_button, timeouts.consent())
            .await?;
        driver.click(&consent).await?;
        debug!("consent banner dismissed");

        let end = self.read_page_bound(driver).await?;
        info!(pages = end, "pagination bound resolved");

        let row_presence = format!("{} {}", sel.rows_container, sel.company_row);
        let mut page = 1u32;

        loop {
            driver.await_element(&row_presence, timeouts.rows()).await?;
            let container = driver
                .await_element(&sel.rows_container, timeouts.rows())
                .await?;

            let hrefs = driver
                .collect_row_links(&container, &sel.company_row, &sel.row_link)
                .await?;

            let mut kept = 0usize;
            for href in &hrefs {
                match href {
                    Some(href) => {
                        sink.append(href)?;
                        kept += 1;
                    }
                    None => warn!(page, "company row without a link, skipping"),
                }
            }
            sink.flush()?;

            report.pages_visited += 1;
            report.links_collected += kept;
            debug!(page, links = kept, "page harvested");

            if page == end {
                break;
            }

            page += 1;
            self.advance_to(driver, page).await?;
            report.advance_clicks += 1;
        }

        info!(
            pages = report.pages_visited,
            links = report.links_collected,
            "listing traversed"
        );

        Ok(report)
    }

    /// Last visible page-number label, parsed and clamped by the configured
    /// page cap. The bound is derived from the live pagination control, never
    /// hardcoded.
    async fn read_page_bound<D: PageDriver>(&self, driver: &D) -> Result<u32> {
        let sel = &self.config.selectors;

        let pager = driver
            .await_element(&sel.pagination, self.config.timeouts.pagination())
            .await?;
        let links = driver.query_all(&pager, &sel.page_link).await?;
        let last = links.last().ok_or(HarvestError::EmptyPagination)?;

        let label = driver.inner_text(last).await?;
        let end: u32 = label
            .trim()
            .parse()
            .map_err(|_| HarvestError::PageLabelParse {
                label: label.clone(),
            })?;

        let mut end = end.max(1);
        if let Some(cap) = self.config.page_cap {
            end = end.min(cap.max(1));
        }

        Ok(end)
    }

    /// Click the page-number link labelled `page` and wait until the row
    /// container's content differs from what was on screen before the click.
    async fn advance_to<D: PageDriver>(&self, driver: &D, page: u32) -> Result<()> {
        let sel = &self.config.selectors;

        let pager = driver
            .await_element(&sel.pagination, self.config.timeouts.pagination())
            .await?;
        let links = driver.query_all(&pager, &sel.page_link).await?;

        let wanted = page.to_string();
        let mut target = None;
        for link in &links {
            if driver.inner_text(link).await?.trim() == wanted {
                target = Some(link.clone());
                break;
            }
        }
        let target = target.ok_or(HarvestError::PageLinkMissing { page })?;

        let before = driver.fingerprint(&sel.rows_container).await?;
        driver.click(&target).await?;
        driver
            .await_refresh(&sel.rows_container, &before, self.config.timeouts.refresh())
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDriver, MockEvent, MockListing};

    fn config_with_output(path: &std::path::Path) -> HarvestConfig {
        HarvestConfig {
            output_path: path.to_path_buf(),
            ..Default::default()
        }
    }

    async fn run_listing(
        listing: MockListing,
        config: &HarvestConfig,
    ) -> (Result<HarvestReport>, MockDriver) {
        let mut driver = MockDriver::new(listing);
        let mut sink = LinkSink::open(&config.output_path).unwrap();
        let outcome = Harvester::new(config.clone()).run(&mut driver, &mut sink).await;
        (outcome, driver)
    }

    #[tokio::test]
    async fn collects_every_page_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(&dir.path().join("links.txt"));

        let listing = MockListing::uniform(3, 2);
        let (outcome, _) = run_listing(listing, &config).await;
        let report = outcome.unwrap();

        assert_eq!(report.pages_visited, 3);
        assert_eq!(report.links_collected, 6);

        let content = std::fs::read_to_string(&config.output_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "https://example.com/company/p1r1");
        assert_eq!(lines[5], "https://example.com/company/p3r2");
    }

    #[tokio::test]
    async fn rerun_strictly_appends() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(&dir.path().join("links.txt"));

        let (first, _) = run_listing(MockListing::uniform(2, 3), &config).await;
        first.unwrap();
        let after_first = std::fs::read_to_string(&config.output_path).unwrap();

        let (second, _) = run_listing(MockListing::uniform(2, 3), &config).await;
        second.unwrap();
        let after_second = std::fs::read_to_string(&config.output_path).unwrap();

        assert_eq!(after_second.len(), after_first.len() * 2);
    }

    #[tokio::test]
    async fn last_label_seven_means_six_advance_clicks() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(&dir.path().join("links.txt"));

        let (outcome, driver) = run_listing(MockListing::uniform(7, 1), &config).await;
        let report = outcome.unwrap();

        assert_eq!(report.advance_clicks, 6);
        assert_eq!(
            driver.advance_click_labels(),
            vec!["2", "3", "4", "5", "6", "7"]
        );
    }

    #[tokio::test]
    async fn missing_page_link_is_a_defined_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(&dir.path().join("links.txt"));

        let listing = MockListing::uniform(5, 1).with_labels(&["1", "2", "3", "5"]);
        let (outcome, _) = run_listing(listing, &config).await;

        match outcome {
            Err(HarvestError::PageLinkMissing { page }) => assert_eq!(page, 4),
            other => panic!("expected PageLinkMissing, got {:?}", other.map(|r| r.pages_visited)),
        }
    }

    #[tokio::test]
    async fn consent_clicked_once_before_any_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(&dir.path().join("links.txt"));

        let (outcome, driver) = run_listing(MockListing::uniform(3, 1), &config).await;
        outcome.unwrap();

        assert_eq!(driver.consent_clicks(), 1);

        let events = driver.events();
        let consent_at = events
            .iter()
            .position(|e| *e == MockEvent::ConsentClicked)
            .unwrap();
        let first_extraction = events
            .iter()
            .position(|e| matches!(e, MockEvent::RowsExtracted(_)))
            .unwrap();
        assert!(consent_at < first_extraction);
    }

    #[tokio::test]
    async fn end_to_end_two_page_example() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(&dir.path().join("links.txt"));

        let listing = MockListing::new(vec![
            vec![Some("/a".to_string()), Some("/b".to_string())],
            vec![Some("/c".to_string())],
        ]);
        let (outcome, _) = run_listing(listing, &config).await;
        outcome.unwrap();

        let content = std::fs::read_to_string(&config.output_path).unwrap();
        assert_eq!(content, "/a\n/b\n/c\n");
    }

    #[tokio::test]
    async fn unparseable_last_label_fails_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(&dir.path().join("links.txt"));

        let listing = MockListing::uniform(2, 1).with_labels(&["1", "2", "next"]);
        let (outcome, driver) = run_listing(listing, &config).await;

        assert!(matches!(
            outcome,
            Err(HarvestError::PageLabelParse { ref label }) if label == "next"
        ));
        // Nothing was extracted before the bound failed to parse
        assert!(driver
            .events()
            .iter()
            .all(|e| !matches!(e, MockEvent::RowsExtracted(_))));
    }

    #[tokio::test]
    async fn empty_pagination_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(&dir.path().join("links.txt"));

        let listing = MockListing::uniform(2, 1).with_labels(&[]);
        let (outcome, _) = run_listing(listing, &config).await;

        assert!(matches!(outcome, Err(HarvestError::EmptyPagination)));
    }

    #[tokio::test]
    async fn page_cap_clamps_the_derived_bound() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_with_output(&dir.path().join("links.txt"));
        config.page_cap = Some(2);

        let (outcome, driver) = run_listing(MockListing::uniform(5, 1), &config).await;
        let report = outcome.unwrap();

        assert_eq!(report.pages_visited, 2);
        assert_eq!(report.advance_clicks, 1);
        assert_eq!(driver.advance_click_labels(), vec!["2"]);
    }

    #[tokio::test]
    async fn rows_without_links_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(&dir.path().join("links.txt"));

        let listing = MockListing::new(vec![vec![
            Some("/a".to_string()),
            None,
            Some("/b".to_string()),
        ]]);
        let (outcome, _) = run_listing(listing, &config).await;
        let report = outcome.unwrap();

        assert_eq!(report.links_collected, 2);
        let content = std::fs::read_to_string(&config.output_path).unwrap();
        assert_eq!(content, "/a\n/b\n");
    }

    #[tokio::test]
    async fn single_page_listing_never_clicks() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_output(&dir.path().join("links.txt"));

        let (outcome, driver) = run_listing(MockListing::uniform(1, 4), &config).await;
        let report = outcome.unwrap();

        assert_eq!(report.pages_visited, 1);
        assert_eq!(report.advance_clicks, 0);
        assert!(driver.advance_click_labels().is_empty());
    }
}
