//! Production [`DownloadClient`] speaking the qBittorrent Web API v2.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;

use crate::client::DownloadClient;
use crate::error::{ClientError, ClientResult};
use crate::model::{
    Category, RssRuleDef, ShareLimits, Torrent, TorrentFilter, TrackerEntry, join_hashes,
};

const LOGIN_OK: &str = "Ok.";

/// HTTP client for one qBittorrent instance, authenticated via the `SID`
/// session cookie obtained at login.
pub struct QbitClient {
    http: Client,
    base_url: Url,
}

impl QbitClient {
    /// Build a client and authenticate against the Web API.
    ///
    /// # Errors
    /// Returns [`ClientError::BaseUrl`] for an unparseable base URL,
    /// [`ClientError::AuthRejected`] when the client refuses the
    /// credentials, and transport/status errors for connection failures.
    pub async fn connect(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let mut base_url: Url = base_url.parse().map_err(|err| ClientError::BaseUrl {
            value: base_url.to_string(),
            source: err,
        })?;
        // Keep any reverse-proxy path prefix when joining endpoint paths.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|err| ClientError::transport("client_builder", err))?;

        let client = Self { http, base_url };
        client.login(username, password).await?;
        Ok(client)
    }

    async fn login(&self, username: &str, password: &str) -> ClientResult<()> {
        const ENDPOINT: &str = "auth/login";
        let response = self
            .http
            .post(self.endpoint(ENDPOINT)?)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|err| ClientError::transport(ENDPOINT, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::status(ENDPOINT, status));
        }
        let body = response
            .text()
            .await
            .map_err(|err| ClientError::decode(ENDPOINT, err))?;
        if body.trim() != LOGIN_OK {
            return Err(ClientError::AuthRejected {
                username: username.to_string(),
            });
        }
        debug!(username, "authenticated against download client");
        Ok(())
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(&format!("api/v2/{path}"))
            .map_err(|err| ClientError::BaseUrl {
                value: self.base_url.to_string(),
                source: err,
            })
    }

    async fn get_json<T>(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> ClientResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(self.endpoint(endpoint)?)
            .query(query)
            .send()
            .await
            .map_err(|err| ClientError::transport(endpoint, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::status(endpoint, status));
        }
        response
            .json()
            .await
            .map_err(|err| ClientError::decode(endpoint, err))
    }

    async fn post_form<T>(&self, endpoint: &'static str, form: &T) -> ClientResult<()>
    where
        T: Serialize + ?Sized,
    {
        let response = self
            .http
            .post(self.endpoint(endpoint)?)
            .form(form)
            .send()
            .await
            .map_err(|err| ClientError::transport(endpoint, err))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ClientError::status(endpoint, status))
        }
    }
}

#[async_trait]
impl DownloadClient for QbitClient {
    async fn torrents(&self, filter: TorrentFilter) -> ClientResult<Vec<Torrent>> {
        self.get_json("torrents/info", &[("filter", filter.as_str())])
            .await
    }

    async fn trackers(&self, hash: &str) -> ClientResult<Vec<TrackerEntry>> {
        self.get_json("torrents/trackers", &[("hash", hash)]).await
    }

    async fn delete_torrents(&self, hashes: &[String], delete_files: bool) -> ClientResult<()> {
        self.post_form(
            "torrents/delete",
            &[
                ("hashes", join_hashes(hashes)),
                ("deleteFiles", delete_files.to_string()),
            ],
        )
        .await
    }

    async fn add_tags(&self, hashes: &[String], tags: &[String]) -> ClientResult<()> {
        self.post_form(
            "torrents/addTags",
            &[("hashes", join_hashes(hashes)), ("tags", tags.join(","))],
        )
        .await
    }

    async fn categories(&self) -> ClientResult<BTreeMap<String, Category>> {
        self.get_json("torrents/categories", &[]).await
    }

    async fn create_category(&self, name: &str, save_path: &Path) -> ClientResult<()> {
        self.post_form(
            "torrents/createCategory",
            &[
                ("category", name.to_string()),
                ("savePath", save_path.display().to_string()),
            ],
        )
        .await
    }

    async fn rss_rule_names(&self) -> ClientResult<Vec<String>> {
        let rules: BTreeMap<String, serde_json::Value> =
            self.get_json("rss/rules", &[]).await?;
        Ok(rules.into_keys().collect())
    }

    async fn set_rss_rule(&self, rule_name: &str, rule: &RssRuleDef) -> ClientResult<()> {
        const ENDPOINT: &str = "rss/setRule";
        let rule_def = serde_json::to_string(rule).map_err(|err| ClientError::Encode {
            endpoint: ENDPOINT,
            source: err,
        })?;
        self.post_form(
            ENDPOINT,
            &[("ruleName", rule_name.to_string()), ("ruleDef", rule_def)],
        )
        .await
    }

    async fn set_share_limits(&self, hashes: &[String], limits: ShareLimits) -> ClientResult<()> {
        self.post_form(
            "torrents/setShareLimits",
            &[
                ("hashes", join_hashes(hashes)),
                ("ratioLimit", limits.ratio_limit.to_string()),
                ("seedingTimeLimit", limits.seeding_time_limit.to_string()),
                ("inactiveSeedingTimeLimit", "-2".to_string()),
            ],
        )
        .await
    }

    async fn set_upload_limit(&self, hashes: &[String], limit: i64) -> ClientResult<()> {
        self.post_form(
            "torrents/setUploadLimit",
            &[("hashes", join_hashes(hashes)), ("limit", limit.to_string())],
        )
        .await
    }

    async fn top_priority(&self, hashes: &[String]) -> ClientResult<()> {
        self.post_form("torrents/topPrio", &[("hashes", join_hashes(hashes))])
            .await
    }
}
