//! Fetch-and-transform pipeline behind the proxy endpoint.

use std::sync::Arc;

use axum::body::Body;
use url::Url;

use crate::config::RelayConfig;
use crate::observability::metrics;
use crate::patents::{self, PatentRecord, RenderContext};
use crate::relay::classify::{office_extension, office_viewer_url, ContentKind};
use crate::relay::error::RelayResult;
use crate::relay::fetch::UpstreamClient;
use crate::relay::links::RelayBase;
use crate::relay::rewrite::rewrite_html;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// What the proxy endpoint answers with.
pub enum RelayOutcome {
    /// `302 Found` to the given location.
    Redirect(String),
    /// Upstream body forwarded without buffering.
    Stream {
        content_type: String,
        content_length: Option<u64>,
        body: Body,
    },
    /// Rewritten or reconstructed document.
    Html(String),
}

impl std::fmt::Debug for RelayOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayOutcome::Redirect(location) => f.debug_tuple("Redirect").field(location).finish(),
            RelayOutcome::Stream { content_type, content_length, .. } => f
                .debug_struct("Stream")
                .field("content_type", content_type)
                .field("content_length", content_length)
                .finish_non_exhaustive(),
            RelayOutcome::Html(html) => f.debug_tuple("Html").field(&html.len()).finish(),
        }
    }
}

/// Shared per-process relay state.
#[derive(Clone)]
pub struct RelayService {
    config: Arc<RelayConfig>,
    client: UpstreamClient,
}

impl RelayService {
    pub fn new(config: Arc<RelayConfig>) -> RelayResult<Self> {
        let client = UpstreamClient::new(&config.upstream)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Fetch `target` and decide how to answer.
    ///
    /// Non-HTML bodies stream through (office documents go to the viewer
    /// instead), patent-detail pages are reconstructed, any other HTML is
    /// rewritten so its links route back through `base`.
    pub async fn relay(&self, target: &Url, base: &RelayBase) -> RelayResult<RelayOutcome> {
        let patent = patents::patent_id(target, &self.config.patents);

        if self.config.patents.prefer_pdf {
            if let Some(id) = patent.as_deref() {
                if let Some(location) = self.probe_pdf(id).await {
                    return Ok(RelayOutcome::Redirect(location));
                }
            }
        }

        let response = self.client.get(target).await?;

        match response.kind() {
            ContentKind::Passthrough => {
                let settings = &self.config.relay;
                if let Some(ext) = office_extension(target, &settings.office_extensions) {
                    tracing::debug!(target_url = %target, extension = ext, "Redirecting to office viewer");
                    return Ok(RelayOutcome::Redirect(office_viewer_url(
                        &settings.office_viewer_url,
                        target,
                    )));
                }

                tracing::debug!(
                    target_url = %target,
                    content_type = response.content_type(),
                    "Streaming upstream body"
                );
                Ok(RelayOutcome::Stream {
                    content_type: response.content_type().to_string(),
                    content_length: response.content_length(),
                    body: response.into_body(),
                })
            }
            ContentKind::Html => {
                let page_url = response.final_url().clone();
                let html = response.text().await?;
                match patent {
                    Some(id) => self.patent_page(&id, &page_url, &html, base).await,
                    None => Ok(RelayOutcome::Html(rewrite_html(&html, &page_url, base)?)),
                }
            }
        }
    }

    /// HEAD the PDF asset; `Some(location)` when it exists.
    async fn probe_pdf(&self, id: &str) -> Option<String> {
        let pdf = match patents::pdf_url(id, &self.config.patents) {
            Ok(pdf) => pdf,
            Err(e) => {
                tracing::warn!(patent = id, error = %e, "Cannot build PDF URL");
                return None;
            }
        };
        if self.client.exists(&pdf).await {
            metrics::record_pdf_fallback("redirect");
            tracing::info!(patent = id, pdf = %pdf, "Redirecting to patent PDF");
            Some(pdf.to_string())
        } else {
            None
        }
    }

    async fn patent_page(
        &self,
        id: &str,
        page_url: &Url,
        html: &str,
        base: &RelayBase,
    ) -> RelayResult<RelayOutcome> {
        let config = &self.config.patents;
        let pdf = patents::pdf_url(id, config).ok();

        if !patents::is_search_shell(html, config) {
            let record = patents::extract_record(html, page_url, id, config.max_images);
            tracing::debug!(patent = id, images = record.images.len(), "Reconstructed patent page");
            return Ok(RelayOutcome::Html(render(&record, page_url, pdf.as_ref(), base)));
        }

        tracing::info!(patent = id, "Detail page is a search shell, trying PDF");
        if let Some(pdf) = &pdf {
            match self.client.get(pdf).await {
                Ok(response) => {
                    metrics::record_pdf_fallback("streamed");
                    return Ok(RelayOutcome::Stream {
                        content_type: PDF_CONTENT_TYPE.to_string(),
                        content_length: response.content_length(),
                        body: response.into_body(),
                    });
                }
                Err(e) => {
                    tracing::warn!(patent = id, pdf = %pdf, error = %e, "PDF fallback failed");
                }
            }
        }

        metrics::record_pdf_fallback("missing");
        let record = PatentRecord::placeholder(id);
        Ok(RelayOutcome::Html(render(&record, page_url, None, base)))
    }
}

fn render(record: &PatentRecord, page_url: &Url, pdf: Option<&Url>, base: &RelayBase) -> String {
    patents::render_patent_page(
        record,
        &RenderContext {
            relay: base,
            page_url,
            pdf_url: pdf,
        },
    )
}
