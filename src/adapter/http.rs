//! HTTP adapter
//!
//! `http://host/path` runs a bounded existence probe: a HEAD request (GET on
//! 405) with an explicit timeout, reporting status and interesting headers.
//! A timeout is a definite failure; nothing is retried.

use super::{Adapter, AdapterFactory, Renderer};
use crate::probe::{ConstructInput, Construction};
use crate::record::ResultRecord;
use crate::render;
use crate::ui;
use crate::{Error, Result};
use std::time::Duration;

pub struct HttpFactory {
    scheme: &'static str,
    timeout: Duration,
}

impl HttpFactory {
    pub fn new(scheme: &'static str, timeout: Duration) -> Self {
        Self { scheme, timeout }
    }
}

impl AdapterFactory for HttpFactory {
    fn construct(&self, input: &ConstructInput) -> Construction {
        match input {
            ConstructInput::FullUri { uri } => {
                let rest = uri
                    .split_once("://")
                    .map(|(_, rest)| rest)
                    .unwrap_or_default();
                if rest.is_empty() {
                    return Construction::Invalid(format!(
                        "the {} adapter requires a host, e.g. {}://example.com",
                        self.scheme, self.scheme
                    ));
                }
                Construction::Ready(Box::new(HttpAdapter {
                    url: uri.to_string(),
                    timeout: self.timeout,
                }))
            }
            _ => Construction::Mismatch,
        }
    }
}

pub struct HttpAdapter {
    url: String,
    timeout: Duration,
}

impl HttpAdapter {
    fn header<'a>(response: &'a reqwest::blocking::Response, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }
}

impl Adapter for HttpAdapter {
    fn structure(&self) -> Result<ResultRecord> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::AdapterInternal(format!("cannot build HTTP client: {e}")))?;

        let classify = |e: reqwest::Error| {
            if e.is_timeout() {
                Error::Adapter(format!(
                    "request to {} timed out after {}s",
                    self.url,
                    self.timeout.as_secs()
                ))
            } else if e.is_builder() {
                Error::AdapterValidation(format!("invalid URL: {}", self.url))
            } else {
                Error::Adapter(format!("request to {} failed: {e}", self.url))
            }
        };

        let mut response = client.head(&self.url).send().map_err(classify)?;
        if response.status() == reqwest::StatusCode::METHOD_NOT_ALLOWED {
            response = client.get(&self.url).send().map_err(classify)?;
        }

        let status = response.status();
        let mut record = ResultRecord::new("http_resource", self.url.clone())
            .with("url", self.url.clone())
            .with("final_url", response.url().to_string())
            .with("status", status.as_u16())
            .with("status_text", status.canonical_reason().unwrap_or(""))
            .with("ok", status.is_success());
        for name in ["content-type", "content-length", "server", "last-modified"] {
            if let Some(value) = Self::header(&response, name) {
                record = record.with(name, value);
            }
        }
        Ok(record)
    }
}

pub struct HttpRenderer;

impl Renderer for HttpRenderer {
    fn text(&self, record: &ResultRecord) -> Result<String> {
        match record.kind() {
            "http_resource" => {
                let mut table = ui::TableBuilder::new();
                table.add_row(
                    "status",
                    &format!(
                        "{} {}",
                        record.get("status").cloned().unwrap_or_default(),
                        record.str_field("status_text").unwrap_or("")
                    ),
                );
                for name in ["content-type", "content-length", "server", "last-modified"] {
                    if let Some(value) = record.str_field(name) {
                        table.add_row(name, value);
                    }
                }
                Ok(format!("{}\n{}", record.source(), table.build()))
            }
            _ => Ok(render::raw_dump(record)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> HttpFactory {
        HttpFactory::new("http", Duration::from_secs(5))
    }

    #[test]
    fn test_constructs_only_from_full_uri() {
        let query = crate::uri::QueryMap::new();
        assert!(matches!(
            factory().construct(&ConstructInput::NoArgs),
            Construction::Mismatch
        ));
        assert!(matches!(
            factory().construct(&ConstructInput::ResourceAndQuery {
                resource: "example.com",
                query: &query
            }),
            Construction::Mismatch
        ));
        assert!(matches!(
            factory().construct(&ConstructInput::FullUri {
                uri: "http://example.com"
            }),
            Construction::Ready(_)
        ));
    }

    #[test]
    fn test_empty_host_is_a_validation_error() {
        let outcome = factory().construct(&ConstructInput::FullUri { uri: "http://" });
        assert!(matches!(outcome, Construction::Invalid(_)));
    }
}
