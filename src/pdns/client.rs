// Copyright (c) 2025 CAV Enablers
// SPDX-License-Identifier: MIT

//! HTTP client for the PowerDNS authoritative server management API (v1).
//!
//! All requests carry the API key in the `X-API-Key` header and address one
//! virtual host (`server_id`) of the backend. Zone names placed in request
//! paths are expected to be canonical already; the reconcile cores own
//! canonicalization.

use anyhow::{Context as _, Result};
use reqwest::{header, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::{
    ApiError, PdnsError, RecordOperations, RrSet, RrSetChange, ZoneChanges, ZoneCreate, ZoneInfo,
    ZoneOperations, CHANGETYPE_DELETE, CHANGETYPE_REPLACE,
};
use crate::constants::OPERATOR_ACCOUNT;

/// PowerDNS management API client.
pub struct PdnsClient {
    base_url: String,
    vhost: String,
    http: reqwest::Client,
}

impl PdnsClient {
    /// Build a client for one backend virtual host.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key cannot be encoded as a header value
    /// or the underlying HTTP client fails to build.
    pub fn new(base_url: &str, vhost: &str, api_key: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let mut auth_header =
            header::HeaderValue::from_str(api_key).context("invalid PowerDNS API key")?;
        auth_header.set_sensitive(true);
        headers.insert("X-API-Key", auth_header);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("pdns-operator/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            vhost: vhost.to_string(),
            http,
        })
    }

    fn zones_url(&self) -> String {
        format!("{}/api/v1/servers/{}/zones", self.base_url, self.vhost)
    }

    fn zone_url(&self, zone_name: &str) -> String {
        format!("{}/{}", self.zones_url(), zone_name)
    }

    /// Map a non-success response to the error taxonomy, consuming the body.
    async fn map_error(resp: reqwest::Response) -> PdnsError {
        let status = resp.status();
        let body = resp.json::<ApiError>().await.unwrap_or_default();
        let message = if body.error.is_empty() {
            format!("HTTP {status}")
        } else {
            body.error
        };
        match status {
            StatusCode::NOT_FOUND => PdnsError::NotFound(message),
            StatusCode::CONFLICT => PdnsError::Conflict(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                PdnsError::Validation(message)
            }
            _ => PdnsError::Transport(format!("HTTP {status}: {message}")),
        }
    }

    async fn patch_rrsets<T: Serialize>(
        &self,
        zone_name: &str,
        rrsets: &T,
    ) -> Result<(), PdnsError> {
        let resp = self
            .http
            .patch(self.zone_url(zone_name))
            .json(&json!({ "rrsets": rrsets }))
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::map_error(resp).await)
        }
    }
}

#[async_trait::async_trait]
impl ZoneOperations for PdnsClient {
    async fn get_zone(&self, zone_name: &str) -> Result<ZoneInfo, PdnsError> {
        debug!(zone = %zone_name, "fetching zone from backend");
        let resp = self
            .http
            .get(self.zone_url(zone_name))
            .query(&[("rrsets", "false")])
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(resp.json::<ZoneInfo>().await?)
        } else {
            Err(Self::map_error(resp).await)
        }
    }

    async fn create_zone(&self, zone: &ZoneCreate) -> Result<ZoneInfo, PdnsError> {
        debug!(zone = %zone.name, kind = %zone.kind, "creating zone on backend");
        let resp = self.http.post(self.zones_url()).json(zone).send().await?;

        if resp.status().is_success() {
            Ok(resp.json::<ZoneInfo>().await?)
        } else {
            Err(Self::map_error(resp).await)
        }
    }

    async fn update_zone(&self, zone_name: &str, changes: &ZoneChanges) -> Result<(), PdnsError> {
        debug!(zone = %zone_name, "updating zone metadata on backend");
        let resp = self
            .http
            .put(self.zone_url(zone_name))
            .json(changes)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::map_error(resp).await)
        }
    }

    async fn delete_zone(&self, zone_name: &str) -> Result<(), PdnsError> {
        debug!(zone = %zone_name, "deleting zone from backend");
        let resp = self.http.delete(self.zone_url(zone_name)).send().await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::map_error(resp).await)
        }
    }
}

#[async_trait::async_trait]
impl RecordOperations for PdnsClient {
    async fn get_rrsets(
        &self,
        zone_name: &str,
        name: &str,
        rtype: &str,
    ) -> Result<Vec<RrSet>, PdnsError> {
        debug!(zone = %zone_name, name = %name, rtype = %rtype, "fetching record sets from backend");
        let resp = self
            .http
            .get(self.zone_url(zone_name))
            .query(&[("rrset_name", name), ("rrset_type", rtype)])
            .send()
            .await?;

        if resp.status().is_success() {
            let zone = resp.json::<ZoneInfo>().await?;
            Ok(zone.rrsets.unwrap_or_default())
        } else {
            Err(Self::map_error(resp).await)
        }
    }

    async fn replace_rrset(&self, zone_name: &str, change: &RrSetChange) -> Result<(), PdnsError> {
        debug!(zone = %zone_name, name = %change.name, rtype = %change.rtype, "replacing record set on backend");
        // Comments are always sent: an empty list purges any comment left
        // behind when the spec drops its own.
        let comments: Vec<super::Comment> = change
            .comment
            .iter()
            .map(|content| super::Comment {
                content: content.clone(),
                account: OPERATOR_ACCOUNT.to_string(),
                modified_at: None,
            })
            .collect();

        let rrset = RrSet {
            name: change.name.clone(),
            rtype: change.rtype.clone(),
            ttl: change.ttl,
            changetype: Some(CHANGETYPE_REPLACE.to_string()),
            records: change
                .records
                .iter()
                .map(|content| super::Record {
                    content: content.clone(),
                    disabled: Some(false),
                })
                .collect(),
            comments: Some(comments),
        };

        self.patch_rrsets(zone_name, &vec![rrset]).await
    }

    async fn delete_rrset(
        &self,
        zone_name: &str,
        name: &str,
        rtype: &str,
    ) -> Result<(), PdnsError> {
        debug!(zone = %zone_name, name = %name, rtype = %rtype, "deleting record set from backend");
        let rrset = json!({
            "name": name,
            "type": rtype,
            "changetype": CHANGETYPE_DELETE,
            "records": [],
        });

        self.patch_rrsets(zone_name, &vec![rrset]).await
    }
}
