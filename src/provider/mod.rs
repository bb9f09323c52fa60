//! SearchProvider capability: SERP search and single-page scraping over the Firecrawl API.

pub mod client;
pub mod types;

pub use client::{FirecrawlClient, ProviderError, SearchProvider};
pub use types::{ScrapeData, ScrapeFormat, ScrapeRequest, SearchRequest};
