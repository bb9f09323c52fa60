//! In-process doubles for the model and provider capabilities.

use std::sync::Mutex;

use crate::llm::{LanguageModel, Message, ModelError};
use crate::provider::{ProviderError, ScrapeData, ScrapeRequest, SearchProvider, SearchRequest};
use crate::websearch::CandidatePage;

type ChatFn = dyn Fn(&[Message]) -> Option<Result<String, ModelError>> + Send + Sync;

/// Replies via a closure. A `None` reply never completes, standing in for a hung call.
pub(crate) struct MockModel {
    reply: Box<ChatFn>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockModel {
    pub fn new(
        reply: impl Fn(&[Message]) -> Option<Result<String, ModelError>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            reply: Box::new(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Some(Ok(text.clone())))
    }

    pub fn failing() -> Self {
        Self::new(|_| Some(Err(ModelError::EmptyResponse)))
    }

    pub fn hanging() -> Self {
        Self::new(|_| None)
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl LanguageModel for MockModel {
    async fn chat(&self, messages: &[Message]) -> Result<String, ModelError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        let reply = (self.reply)(messages);
        match reply {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

/// Last user message of a chat, where every step puts its per-call input.
pub(crate) fn user_text(messages: &[Message]) -> &str {
    messages.last().map(|m| m.content.as_str()).unwrap_or_default()
}

type SearchFn =
    dyn Fn(&SearchRequest) -> Option<Result<Vec<CandidatePage>, ProviderError>> + Send + Sync;
type ScrapeFn = dyn Fn(&ScrapeRequest) -> Option<Result<ScrapeData, ProviderError>> + Send + Sync;

pub(crate) struct MockProvider {
    search: Box<SearchFn>,
    scrape: Box<ScrapeFn>,
    searches: Mutex<Vec<SearchRequest>>,
    scrapes: Mutex<Vec<ScrapeRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            search: Box::new(|_| Some(Ok(Vec::new()))),
            scrape: Box::new(|_| Some(Ok(ScrapeData::default()))),
            searches: Mutex::new(Vec::new()),
            scrapes: Mutex::new(Vec::new()),
        }
    }

    pub fn on_search(
        mut self,
        f: impl Fn(&SearchRequest) -> Option<Result<Vec<CandidatePage>, ProviderError>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.search = Box::new(f);
        self
    }

    pub fn on_scrape(
        mut self,
        f: impl Fn(&ScrapeRequest) -> Option<Result<ScrapeData, ProviderError>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.scrape = Box::new(f);
        self
    }

    pub fn searches(&self) -> Vec<SearchRequest> {
        self.searches.lock().unwrap().clone()
    }

    pub fn scrapes(&self) -> Vec<ScrapeRequest> {
        self.scrapes.lock().unwrap().clone()
    }
}

impl SearchProvider for MockProvider {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<CandidatePage>, ProviderError> {
        self.searches.lock().unwrap().push(request.clone());
        let reply = (self.search)(request);
        match reply {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    async fn scrape(&self, request: &ScrapeRequest) -> Result<ScrapeData, ProviderError> {
        self.scrapes.lock().unwrap().push(request.clone());
        let reply = (self.scrape)(request);
        match reply {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }
}

pub(crate) fn page(url: &str) -> CandidatePage {
    CandidatePage {
        url: url.to_string(),
        title: format!("Title of {url}"),
        description: format!("Snippet of {url}"),
    }
}
