use crate::api::IncidentApi;
use crate::config::ClientConfig;
use crate::error::{ConfigError, FetchFailure};
use crate::filter::ListQuery;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use triage_contract::{
    IncidentDetail, IncidentSummary, KpiSnapshot, PostmortemPayload, RefreshReceipt,
};

const MAX_DETAIL_CHARS: usize = 200;

/// [`IncidentApi`] over the backend's JSON HTTP interface.
#[derive(Clone, Debug)]
pub struct HttpIncidentApi {
    http: reqwest::Client,
    base: Url,
}

impl HttpIncidentApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let raw = config.base_url.trim();
        let base = Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: raw.to_string(),
                reason: "expected an http(s) base url".into(),
            });
        }

        let mut builder = reqwest::Client::builder();
        if let Some(ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }

        Ok(Self {
            http: builder.build()?,
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Appends each segment percent-encoded, so an order id always stays one
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, FetchFailure> {
        let response = request
            .send()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchFailure::Http {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        Ok(body.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        request: RequestBuilder,
    ) -> Result<T, FetchFailure> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(|e| FetchFailure::Decode(format!("{what}: {e}")))
    }
}

impl IncidentApi for HttpIncidentApi {
    async fn list_incidents(&self, query: &ListQuery) -> Result<Vec<IncidentSummary>, FetchFailure> {
        let url = self.endpoint(&["incidents"]);
        debug!(%url, status = ?query.status, search = ?query.search, "GET incidents");
        self.get_json("incident list", self.http.get(url).query(&query.pairs()))
            .await
    }

    async fn incident_detail(&self, order_id: &str) -> Result<IncidentDetail, FetchFailure> {
        let url = self.endpoint(&["incidents", order_id]);
        debug!(%url, "GET incident detail");
        self.get_json("incident detail", self.http.get(url)).await
    }

    async fn postmortem(
        &self,
        order_id: &str,
        regenerate: bool,
    ) -> Result<PostmortemPayload, FetchFailure> {
        let url = self.endpoint(&["incidents", order_id, "postmortem"]);
        debug!(%url, regenerate, "GET postmortem");
        let mut request = self.http.get(url);
        if regenerate {
            request = request.query(&[("regenerate", "true")]);
        }
        self.get_json("postmortem", request).await
    }

    async fn kpis(&self) -> Result<KpiSnapshot, FetchFailure> {
        let url = self.endpoint(&["kpis"]);
        debug!(%url, "GET kpis");
        self.get_json("kpis", self.http.get(url)).await
    }

    async fn trigger_refresh(&self) -> Result<RefreshReceipt, FetchFailure> {
        let url = self.endpoint(&["refresh"]);
        debug!(%url, "POST refresh");
        let body = self.send(self.http.post(url)).await?;
        Ok(serde_json::from_slice(&body).unwrap_or_default())
    }
}

/// Pulls a human-readable reason out of an error body. The backend answers
/// `{"detail": "..."}`; anything else falls back to the raw text.
fn error_detail(body: &[u8]) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(s)) => return Some(truncate(s)),
            Some(other) if !other.is_null() => return Some(truncate(&other.to_string())),
            _ => {}
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    (!text.is_empty()).then(|| truncate(text))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_DETAIL_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_DETAIL_CHARS).collect();
    out.push_str("...");
    out
}
