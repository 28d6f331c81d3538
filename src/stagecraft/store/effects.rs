// SPDX-License-Identifier: MIT

//! `SideEffects` backed by a [`Store`]
//!
//! State changes become commands on the store. `Http` goes out through
//! reqwest. Every effect is also reported as an [`EffectEvent`] on an
//! optional channel so a host can follow a dispatch live.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

use super::command::Command;
use super::store::Store;
use crate::kit::effects::{EffectEvent, HttpRequest, SideEffects};
use crate::kit::error::StageError;

pub struct StoreEffects {
    store: Store,
    client: Client,
    events: Option<mpsc::Sender<EffectEvent>>,
}

impl StoreEffects {
    pub fn new(store: Store, http_timeout: Duration) -> Result<Self, StageError> {
        let client = Client::builder().timeout(http_timeout).build()?;
        Ok(Self {
            store,
            client,
            events: None,
        })
    }

    /// Report every effect on `sender`
    pub fn with_events(mut self, sender: mpsc::Sender<EffectEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    async fn report(&self, event: EffectEvent) {
        if let Some(sender) = &self.events {
            // Receiver gone means nobody is listening any more
            let _ = sender.send(event).await;
        }
    }

    async fn commit(&self, command: Command) -> Result<(), StageError> {
        self.store.commit(command).await?;
        Ok(())
    }
}

fn parse_url(raw: &str) -> Result<Url, StageError> {
    let url = Url::parse(raw)
        .map_err(|e| StageError::effect("http", format!("invalid url '{}': {}", raw, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(StageError::effect(
            "http",
            format!("unsupported scheme '{}'", scheme),
        )),
    }
}

/// JSON when the body parses, the raw text otherwise
fn parse_body(text: String) -> Value {
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[async_trait]
impl SideEffects for StoreEffects {
    async fn alert(&self, message: &str) -> Result<(), StageError> {
        log::info!("Alert: {}", message);
        self.report(EffectEvent::Alert {
            message: message.to_string(),
        })
        .await;
        Ok(())
    }

    async fn set_data(&self, path: &str, value: Value) -> Result<(), StageError> {
        self.commit(Command::SetData {
            path: path.to_string(),
            value,
        })
        .await?;
        self.report(EffectEvent::DataChanged {
            path: path.to_string(),
        })
        .await;
        Ok(())
    }

    async fn set_props(&self, node_id: &str, patch: Map<String, Value>) -> Result<(), StageError> {
        self.commit(Command::SetProps {
            node_id: node_id.to_string(),
            patch,
        })
        .await?;
        self.report(EffectEvent::PropsChanged {
            node_id: node_id.to_string(),
        })
        .await;
        Ok(())
    }

    async fn http(&self, request: &HttpRequest) -> Result<Value, StageError> {
        let url = parse_url(&request.url)?;
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|_| {
            StageError::effect("http", format!("invalid method '{}'", request.method))
        })?;

        log::debug!("HTTP {} {}", method, url);
        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        self.report(EffectEvent::HttpCompleted {
            url: request.url.clone(),
            status: status.as_u16(),
        })
        .await;

        if !status.is_success() {
            return Err(StageError::effect(
                "http",
                format!("{} returned {}", request.url, status),
            ));
        }
        Ok(parse_body(text))
    }

    async fn emit(&self, topic: &str, payload: Option<Value>) -> Result<(), StageError> {
        log::debug!("Emit on '{}'", topic);
        self.report(EffectEvent::Emit {
            topic: topic.to_string(),
            payload,
        })
        .await;
        Ok(())
    }

    async fn navigate(&self, page_id: &str) -> Result<(), StageError> {
        self.commit(Command::Navigate {
            page_id: page_id.to_string(),
        })
        .await?;
        self.report(EffectEvent::Navigated {
            page_id: page_id.to_string(),
        })
        .await;
        Ok(())
    }

    async fn open_fragment(&self, fragment_id: &str) -> Result<(), StageError> {
        self.commit(Command::OpenFragment {
            fragment_id: fragment_id.to_string(),
        })
        .await?;
        self.report(EffectEvent::FragmentOpened {
            fragment_id: fragment_id.to_string(),
        })
        .await;
        Ok(())
    }

    async fn close_fragment(&self, fragment_id: Option<&str>) -> Result<(), StageError> {
        self.commit(Command::CloseFragment {
            fragment_id: fragment_id.map(str::to_string),
        })
        .await?;
        self.report(EffectEvent::FragmentClosed {
            fragment_id: fragment_id.map(str::to_string),
        })
        .await;
        Ok(())
    }

    async fn failed(&self, kind: &str, error: &StageError) {
        self.report(EffectEvent::Error {
            kind: kind.to_string(),
            message: error.to_string(),
        })
        .await;
    }
}
