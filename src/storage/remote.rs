use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use super::{decode_entries, EntryStore, PersistenceError};
use crate::journal::Entry;

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(rename = "allData")]
    all_data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

/// Remote variant: one blocking HTTP round-trip per operation.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Client,
    base: Url,
}

impl RemoteStore {
    pub fn new(base_url: &str) -> Result<Self, PersistenceError> {
        let base =
            Url::parse(base_url).map_err(|err| PersistenceError::InvalidUrl(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(PersistenceError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, PersistenceError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| PersistenceError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn fetch_all(&self) -> Result<Vec<Entry>, PersistenceError> {
        let response = self.client.get(self.endpoint(&["get"])?).send()?;
        let body: ListResponse = ensure_success(response)?.json()?;
        Ok(decode_entries(body.all_data, self.base.as_str()))
    }
}

impl EntryStore for RemoteStore {
    fn list(&self) -> Vec<Entry> {
        match self.fetch_all() {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(error = %err, base = %self.base, "fetching remote entries failed");
                Vec::new()
            }
        }
    }

    fn create(&self, entry: &Entry) -> Result<(), PersistenceError> {
        let response = self
            .client
            .post(self.endpoint(&["add"])?)
            .json(&entry.to_new_entry())
            .send()?;
        let body: MessageResponse = ensure_success(response)?.json()?;
        tracing::debug!(message = %body.message, "remote create acknowledged");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        let response = self
            .client
            .delete(self.endpoint(&["delete", id])?)
            .send()?;
        let body: MessageResponse = ensure_success(response)?.json()?;
        tracing::debug!(%id, message = %body.message, "remote delete acknowledged");
        Ok(())
    }
}

fn ensure_success(response: Response) -> Result<Response, PersistenceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());
    Err(PersistenceError::Rejected {
        status: status.as_u16(),
        message,
    })
}
