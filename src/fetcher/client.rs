use crate::config::HarvestConfig;
use crate::fetcher::{
    backoff::RetryPolicy,
    errors::FetchError,
    pipeline::decode_page,
    rate_limit::RateLimiter,
    types::{DocumentBytes, PageResponse},
};
use chrono::Utc;
use reqwest::{Client, ClientBuilder, Response, header};
use std::path::Path;
use std::time::Duration;
use tokio::{fs::File, io::AsyncWriteExt, time::sleep};
use tracing::{debug, instrument, warn};
use url::Url;

const ACCEPT_MARKUP: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_DOCUMENT: &str = "application/pdf,*/*;q=0.8";

/// Sequential HTTP access to the remote sources. Every request, retries
/// included, passes through the politeness limiter first.
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    limiter: RateLimiter,
    retry: RetryPolicy,
    max_page_bytes: u64,
    max_document_bytes: u64,
}

impl Fetcher {
    pub fn new(config: &HarvestConfig, delay: Duration) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            limiter: RateLimiter::new(delay),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.base_backoff,
            },
            max_page_bytes: config.max_page_bytes,
            max_document_bytes: config.max_document_bytes,
        })
    }

    /// Fetch a listing or landing page and decode it to UTF-8.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<PageResponse, FetchError> {
        let parsed_url = Url::parse(url)?;
        let response = self.send(&parsed_url, ACCEPT_MARKUP).await?;
        check_declared_length(&response, self.max_page_bytes)?;

        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Content-Length may be missing
        if body.len() as u64 > self.max_page_bytes {
            return Err(FetchError::BodyTooLarge(body.len() as u64));
        }

        Ok(decode_page(final_url, status, headers, body, &content_type))
    }

    /// Buffered retrieval of a document.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_bytes(&self, url: &str) -> Result<DocumentBytes, FetchError> {
        let parsed_url = Url::parse(url)?;
        let response = self.send(&parsed_url, ACCEPT_DOCUMENT).await?;
        check_declared_length(&response, self.max_document_bytes)?;

        let url_final = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        if body.len() as u64 > self.max_document_bytes {
            return Err(FetchError::BodyTooLarge(body.len() as u64));
        }

        debug!(bytes = body.len(), "document fetched");
        Ok(DocumentBytes {
            url_final,
            content_type,
            body,
            fetched_at: Utc::now(),
        })
    }

    /// Streamed retrieval written chunk by chunk to `path`. A partially
    /// written file is removed when the transfer fails.
    #[instrument(skip_all, fields(url = %url, path = %path.display()))]
    pub async fn download_to(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        let parsed_url = Url::parse(url)?;
        let mut response = self.send(&parsed_url, ACCEPT_DOCUMENT).await?;
        check_declared_length(&response, self.max_document_bytes)?;

        let mut file = File::create(path).await.map_err(FetchError::Write)?;
        match stream_body(&mut response, &mut file, self.max_document_bytes).await {
            Ok(written) => {
                debug!(bytes = written, "download complete");
                Ok(written)
            }
            Err(err) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(path).await {
                    warn!("could not remove partial download: {}", remove_err);
                }
                Err(err)
            }
        }
    }

    async fn send(&self, url: &Url, accept: &str) -> Result<Response, FetchError> {
        let mut attempt = 0;
        loop {
            self.limiter.wait(url).await;

            let result = self
                .client
                .get(url.clone())
                .header(header::ACCEPT, accept)
                .send()
                .await
                .map_err(FetchError::from_reqwest_error)
                .and_then(|response| {
                    if response.status().is_success() {
                        Ok(response)
                    } else {
                        Err(FetchError::http(response.status()))
                    }
                });

            match result {
                Ok(response) => return Ok(response),
                Err(err) if err.should_retry() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        url = %url,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "retrying after {}",
                        err
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn check_declared_length(response: &Response, limit: u64) -> Result<(), FetchError> {
    match response.content_length() {
        Some(length) if length > limit => Err(FetchError::BodyTooLarge(length)),
        _ => Ok(()),
    }
}

async fn stream_body(response: &mut Response, file: &mut File, limit: u64) -> Result<u64, FetchError> {
    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(FetchError::from_reqwest_error)?
    {
        written += chunk.len() as u64;
        if written > limit {
            return Err(FetchError::BodyTooLarge(written));
        }
        file.write_all(&chunk).await.map_err(FetchError::Write)?;
    }
    file.flush().await.map_err(FetchError::Write)?;
    Ok(written)
}
