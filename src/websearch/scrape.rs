use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::fanout::{Cancelled, join_fail_fast};
use super::types::{ScrapedPage, SelectedPage};
use crate::provider::{ProviderError, ScrapeData, ScrapeFormat, ScrapeRequest, SearchProvider};

const FORMAT: ScrapeFormat = ScrapeFormat::Markdown;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("scraping {url} failed: {source}")]
    Provider {
        url: String,
        #[source]
        source: ProviderError,
    },

    #[error("{0}")]
    Cancelled(#[from] Cancelled),
}

/// Fetches full content for each selected page, concurrently. Output order
/// follows `pages`. Any failed scrape fails the whole batch.
pub async fn scrape_all(
    provider: &impl SearchProvider,
    pages: &[SelectedPage],
    cancel: &CancellationToken,
) -> Result<Vec<ScrapedPage>, ScrapeError> {
    if pages.is_empty() {
        return Ok(Vec::new());
    }

    let mut tasks = Vec::with_capacity(pages.len());
    for selected in pages {
        tasks.push(Box::pin(scrape_one(provider, selected)));
    }
    let scraped = join_fail_fast(cancel, tasks).await?;

    info!(
        pages = scraped.len(),
        empty = scraped.iter().filter(|p| p.content.is_empty()).count(),
        "scrape complete"
    );
    Ok(scraped)
}

async fn scrape_one(
    provider: &impl SearchProvider,
    selected: &SelectedPage,
) -> Result<ScrapedPage, ScrapeError> {
    let url = &selected.page.url;
    let request = ScrapeRequest {
        url: url.clone(),
        formats: vec![FORMAT],
    };

    let data = provider
        .scrape(&request)
        .await
        .map_err(|source| ScrapeError::Provider {
            url: url.clone(),
            source,
        })?;

    Ok(ScrapedPage {
        page: selected.page.clone(),
        content: page_content(&data, url),
    })
}

/// The requested format's text, or empty when the provider left it out or sent a non-string.
fn page_content(data: &ScrapeData, url: &str) -> String {
    match data.content(FORMAT) {
        Some(text) => text.to_string(),
        None => {
            warn!(url, format = FORMAT.as_str(), "scrape response has no usable content");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websearch::ScoredCandidate;
    use crate::websearch::testing::{MockProvider, page};
    use serde_json::json;

    fn selected(url: &str) -> SelectedPage {
        ScoredCandidate {
            page: page(url),
            relevance: 0.9,
            rationale: "relevant".into(),
        }
    }

    #[test]
    fn page_content_present() {
        let data = ScrapeData::from(json!({"markdown": "# Body"}));
        assert_eq!(page_content(&data, "https://a.com"), "# Body");
    }

    #[test]
    fn page_content_missing_field_is_empty() {
        let data = ScrapeData::from(json!({"metadata": {"title": "A"}}));
        assert_eq!(page_content(&data, "https://a.com"), "");
    }

    #[test]
    fn page_content_mistyped_field_is_empty() {
        let data = ScrapeData::from(json!({"markdown": ["not", "a", "string"]}));
        assert_eq!(page_content(&data, "https://a.com"), "");
    }

    #[tokio::test]
    async fn empty_selection_makes_no_calls() {
        let provider = MockProvider::new();
        let out = scrape_all(&provider, &[], &CancellationToken::new()).await.unwrap();
        assert!(out.is_empty());
        assert!(provider.scrapes().is_empty());
    }

    #[tokio::test]
    async fn scrapes_each_page_in_markdown() {
        let provider = MockProvider::new().on_scrape(|req| {
            Some(Ok(ScrapeData::from(json!({"markdown": format!("content of {}", req.url)}))))
        });
        let pages = [selected("https://a.com"), selected("https://b.com")];

        let out = scrape_all(&provider, &pages, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].page.url, "https://a.com");
        assert_eq!(out[0].content, "content of https://a.com");
        assert_eq!(out[1].content, "content of https://b.com");
        assert!(
            provider
                .scrapes()
                .iter()
                .all(|r| r.formats == vec![ScrapeFormat::Markdown])
        );
    }

    #[tokio::test]
    async fn page_without_body_is_kept_with_empty_content() {
        let provider = MockProvider::new().on_scrape(|req| {
            if req.url.contains("empty") {
                Some(Ok(ScrapeData::from(json!({"markdown": null}))))
            } else {
                Some(Ok(ScrapeData::from(json!({"markdown": "text"}))))
            }
        });
        let pages = [selected("https://full.com"), selected("https://empty.com")];

        let out = scrape_all(&provider, &pages, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out[0].content, "text");
        assert_eq!(out[1].content, "");
    }

    #[tokio::test]
    async fn one_failure_fails_the_stage() {
        let provider = MockProvider::new().on_scrape(|req| {
            if req.url == "https://down.com" {
                Some(Err(ProviderError::Status(502)))
            } else {
                None
            }
        });
        let pages = [
            selected("https://a.com"),
            selected("https://down.com"),
            selected("https://c.com"),
        ];

        let err = scrape_all(&provider, &pages, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(
            matches!(
                &err,
                ScrapeError::Provider { url, source: ProviderError::Status(502) }
                    if url == "https://down.com"
            ),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn cancelled_scrape_reports_cancellation() {
        let provider = MockProvider::new().on_scrape(|_| None);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = scrape_all(&provider, &[selected("https://a.com")], &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Cancelled(_)), "got: {err:?}");
    }
}
