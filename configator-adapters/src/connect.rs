//! 1Password Connect Server client.
//!
//! Talks to a self-hosted Connect Server over its REST API with a bearer
//! token. Raw API error bodies are never surfaced to callers.

use std::sync::Arc;
use std::{env, fmt, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use configator_primitives::VaultRecord;
use hyper::body::to_bytes;
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, AUTHORIZATION};
use hyper::{Body, Client, Request, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tracing::debug;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::reference::{SecretReference, matches_segment};
use crate::traits::{
    ClientMetadata, ItemHandle, VaultClient, VaultError, VaultHandle, VaultResult,
};
use crate::wire::{WireItem, WireItemSummary, WireVault};

/// Environment variable holding the Connect Server URL.
pub const CONNECT_HOST_ENV: &str = "OP_CONNECT_HOST";

/// Environment variable holding the Connect access token.
pub const CONNECT_TOKEN_ENV: &str = "OP_CONNECT_TOKEN";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Configuration for the Connect client.
#[derive(Clone)]
pub struct ConnectConfig {
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ConnectConfig {
    /// Creates a configuration for the Connect Server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Configuration`] if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> VaultResult<Self> {
        Ok(Self {
            base_url: sanitize_base_url(base_url.as_ref())?,
            token: None,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Loads the URL and token from `OP_CONNECT_HOST` and `OP_CONNECT_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Configuration`] if the host is unset or invalid.
    pub fn from_env() -> VaultResult<Self> {
        let host = env::var(CONNECT_HOST_ENV).map_err(|_| {
            VaultError::configuration(format!("{CONNECT_HOST_ENV} is not set"))
        })?;
        let mut cfg = Self::new(host)?;
        cfg.token = env::var(CONNECT_TOKEN_ENV).ok();
        Ok(cfg)
    }

    /// Supplies the access token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the normalized base URL (always ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Vault client backed by a 1Password Connect Server.
pub struct ConnectClient {
    client: HyperClient,
    base_url: String,
    token: String,
    timeout: Duration,
    metadata: ClientMetadata,
}

impl fmt::Debug for ConnectClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ConnectClient {
    /// Constructs a client from the supplied configuration.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Configuration`] if the token is missing.
    pub fn new(config: ConnectConfig) -> VaultResult<Self> {
        let token = config
            .token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| VaultError::configuration("Connect client requires an access token"))?;

        Ok(Self {
            client: connect_http_client(config.timeout),
            metadata: ClientMetadata::new("onepassword-connect").with_endpoint(&config.base_url),
            base_url: config.base_url,
            token,
            timeout: config.timeout,
        })
    }

    /// Lists every vault the token can see.
    ///
    /// # Errors
    ///
    /// Propagates transport, authentication, and decoding failures.
    pub async fn list_vaults(&self) -> VaultResult<Vec<VaultHandle>> {
        let vaults: Vec<WireVault> = self.get_json("v1/vaults", "vault list").await?;
        Ok(vaults.into_iter().map(Into::into).collect())
    }

    /// Lists the items of a vault (titles only).
    ///
    /// # Errors
    ///
    /// Propagates transport, authentication, and decoding failures.
    pub async fn list_items(&self, vault_id: &str) -> VaultResult<Vec<ItemHandle>> {
        let items: Vec<WireItemSummary> = self
            .get_json(&format!("v1/vaults/{vault_id}/items"), &format!("vault {vault_id}"))
            .await?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    /// Fetches one item with all field values.
    ///
    /// # Errors
    ///
    /// Propagates transport, authentication, and decoding failures.
    pub async fn get_item(&self, vault_id: &str, item_id: &str) -> VaultResult<VaultRecord> {
        let item: WireItem = self
            .get_json(
                &format!("v1/vaults/{vault_id}/items/{item_id}"),
                &format!("item {item_id} in vault {vault_id}"),
            )
            .await?;
        Ok(item.into_record())
    }

    async fn get_bytes(&self, path: &str, what: &str) -> VaultResult<Bytes> {
        let uri = format!("{}{path}", self.base_url)
            .parse::<Uri>()
            .map_err(|err| VaultError::configuration(format!("invalid Connect URI: {err}")))?;

        debug!(%uri, "Connect request");
        let request = Request::get(uri)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/json")
            .body(Body::empty())
            .map_err(|err| VaultError::transport(format!("failed to build Connect request: {err}")))?;

        let response = timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| VaultError::transport("Connect request timed out"))?
            .map_err(|err| VaultError::transport(format!("Connect request failed: {err}")))?;

        check_status(response.status(), what)?;

        to_bytes(response.into_body())
            .await
            .map_err(|err| VaultError::transport(format!("failed to read Connect response: {err}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, what: &str) -> VaultResult<T> {
        let bytes = self.get_bytes(path, what).await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| VaultError::response(format!("failed to decode Connect response: {err}")))
    }

    async fn find_vault(&self, segment: &str) -> VaultResult<VaultHandle> {
        self.list_vaults()
            .await?
            .into_iter()
            .find(|vault| matches_segment(vault.id(), vault.title(), segment))
            .ok_or_else(|| VaultError::not_found(format!("vault `{segment}`")))
    }

    async fn find_item(&self, vault: &VaultHandle, segment: &str) -> VaultResult<ItemHandle> {
        self.list_items(vault.id())
            .await?
            .into_iter()
            .find(|item| matches_segment(item.id(), item.title(), segment))
            .ok_or_else(|| {
                VaultError::not_found(format!("item `{segment}` in vault `{}`", vault.title()))
            })
    }
}

#[async_trait]
impl VaultClient for ConnectClient {
    fn metadata(&self) -> &ClientMetadata {
        &self.metadata
    }

    async fn resolve_vault(&self, name: &str) -> VaultResult<Option<VaultHandle>> {
        Ok(self
            .list_vaults()
            .await?
            .into_iter()
            .find(|vault| vault.title() == name))
    }

    async fn resolve_item(
        &self,
        vault: &VaultHandle,
        name: &str,
    ) -> VaultResult<Option<ItemHandle>> {
        Ok(self
            .list_items(vault.id())
            .await?
            .into_iter()
            .find(|item| item.title() == name))
    }

    async fn fetch_record(
        &self,
        vault: &VaultHandle,
        item: &ItemHandle,
    ) -> VaultResult<VaultRecord> {
        self.get_item(vault.id(), item.id()).await
    }

    async fn dereference(&self, link: &str) -> VaultResult<String> {
        let reference = SecretReference::parse(link)?;
        let vault = self.find_vault(reference.vault()).await?;
        let item = self.find_item(&vault, reference.item()).await?;
        let record = self.get_item(vault.id(), item.id()).await?;
        reference.value_in(&record)
    }
}

/// Connector trusting the webpki roots. Plain `http://` stays reachable
/// because Connect servers usually sit on the local network.
fn connect_http_client(connect_timeout: Duration) -> HyperClient {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));
    let tls = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    Client::builder().build::<_, Body>(HttpsConnector::from((http, Arc::new(tls))))
}

fn check_status(status: StatusCode, what: &str) -> VaultResult<()> {
    match status.as_u16() {
        200..=299 => Ok(()),
        401 | 403 => Err(VaultError::Unauthorized),
        404 => Err(VaultError::not_found(what)),
        500..=599 => Err(VaultError::response(format!("Connect server error ({status})"))),
        _ => Err(VaultError::response(format!("unexpected Connect status {status}"))),
    }
}

fn sanitize_base_url(input: &str) -> VaultResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(VaultError::configuration(
            "Connect base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>()
        .map_err(|err| VaultError::configuration(format!("invalid Connect base URL: {err}")))?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> ConnectClient {
        let config = ConnectConfig::new(server.uri()).unwrap().with_token("test-token");
        ConnectClient::new(config).unwrap()
    }

    async fn mount_vaults(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/vaults"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "v1", "name": "Personal" },
                { "id": "v2", "name": "REPO api" }
            ])))
            .mount(server)
            .await;
    }

    async fn mount_items(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/vaults/v2/items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "i1", "title": "configator-test", "category": "LOGIN" }
            ])))
            .mount(server)
            .await;
    }

    async fn mount_item(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/v1/vaults/v2/items/i1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "i1",
                "title": "configator-test",
                "sections": [{ "id": "s1", "label": "APP" }],
                "fields": [
                    { "id": "f1", "label": "a-string", "value": "foo", "section": { "id": "s1" } },
                    { "id": "f2", "label": "token", "value": "op://Personal/mixpanel/token" }
                ]
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn base_url_requires_scheme() {
        let err = ConnectConfig::new("connect.internal:8080").expect_err("missing scheme");
        assert!(matches!(err, VaultError::Configuration { .. }));
    }

    #[test]
    fn sanitize_appends_trailing_slash() {
        let cfg = ConnectConfig::new("http://localhost:8080").unwrap();
        assert_eq!(cfg.base_url(), "http://localhost:8080/");
    }

    #[test]
    fn client_requires_token() {
        let cfg = ConnectConfig::new("http://localhost:8080").unwrap();
        let err = ConnectClient::new(cfg).expect_err("token required");
        assert!(matches!(err, VaultError::Configuration { .. }));
    }

    #[tokio::test]
    async fn plain_http_hosts_are_reachable() {
        let server = MockServer::start().await;
        mount_vaults(&server).await;
        assert!(server.uri().starts_with("http://"));

        let cfg = ConnectConfig::new(server.uri())
            .unwrap()
            .with_token("test-token")
            .with_timeout(Duration::from_secs(5));
        let client = ConnectClient::new(cfg).unwrap();
        assert_eq!(client.list_vaults().await.unwrap().len(), 2);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = ConnectConfig::new("http://localhost:8080")
            .unwrap()
            .with_token("super-secret");
        assert!(!format!("{cfg:?}").contains("super-secret"));
        let client = ConnectClient::new(cfg).unwrap();
        assert!(!format!("{client:?}").contains("super-secret"));
    }

    #[test]
    fn status_mapping() {
        assert!(check_status(StatusCode::OK, "x").is_ok());
        assert!(matches!(
            check_status(StatusCode::FORBIDDEN, "x"),
            Err(VaultError::Unauthorized)
        ));
        assert!(matches!(
            check_status(StatusCode::NOT_FOUND, "vault v1"),
            Err(VaultError::NotFound { what }) if what == "vault v1"
        ));
        assert!(matches!(
            check_status(StatusCode::BAD_GATEWAY, "x"),
            Err(VaultError::Response { .. })
        ));
    }

    #[tokio::test]
    async fn resolves_vault_item_and_record() {
        let server = MockServer::start().await;
        mount_vaults(&server).await;
        mount_items(&server).await;
        mount_item(&server).await;
        let client = client_for(&server);

        let vault = client.resolve_vault("REPO api").await.unwrap().expect("vault");
        assert_eq!(vault.id(), "v2");
        assert!(client.resolve_vault("Nope").await.unwrap().is_none());

        let item = client
            .resolve_item(&vault, "configator-test")
            .await
            .unwrap()
            .expect("item");
        let record = client.fetch_record(&vault, &item).await.unwrap();
        assert_eq!(record.sections()[0].title(), "APP");
        assert_eq!(record.fields()[0].value(), "foo");
    }

    #[tokio::test]
    async fn dereference_walks_vault_item_field() {
        let server = MockServer::start().await;
        mount_vaults(&server).await;
        mount_items(&server).await;
        mount_item(&server).await;
        let client = client_for(&server);

        let value = client
            .dereference("op://REPO api/configator-test/APP/a-string")
            .await
            .unwrap();
        assert_eq!(value, "foo");

        let err = client
            .dereference("op://Missing/configator-test/a-string")
            .await
            .expect_err("unknown vault");
        assert!(matches!(err, VaultError::NotFound { .. }));
    }

    #[tokio::test]
    async fn unauthorized_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/vaults"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
            .mount(&server)
            .await;
        let client = client_for(&server);

        let err = client.resolve_vault("Personal").await.expect_err("401");
        assert!(matches!(err, VaultError::Unauthorized));
    }

    #[tokio::test]
    async fn malformed_body_is_response_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/vaults"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        let client = client_for(&server);

        let err = client.list_vaults().await.expect_err("bad json");
        assert!(matches!(err, VaultError::Response { .. }));
    }
}
