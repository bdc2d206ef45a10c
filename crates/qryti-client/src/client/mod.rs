//! API client with bearer auth, retry logic, request de-duplication and caching

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use qryti_config::{EndpointsSection, QrytiToml, StorageSection};
use qryti_core::error::QrytiError;
use qryti_core::types::{ApiResponse, Registration, Session, UserProfile};
use qryti_core::utils::{build_url, collection_of};

use crate::api::{ClientsApi, ModelsApi, ProfileApi, ReportsApi};
use crate::cache::{CacheStats, InFlightRegistry, ResponseCache};
use crate::storage::{MemoryStore, SessionStore};
use crate::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
use crate::ClientResult;

/// Linear backoff retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first request
    pub max_retries: u32,
    /// The n-th retry waits `n * base_delay`
    pub base_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl RetryConfig {
    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry).min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: Duration,
    pub max_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(300),
            max_size: 100,
        }
    }
}

/// Everything the client needs to know about the backend
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL relative paths are joined onto
    pub base_url: String,
    /// Timeout applied to each attempt
    pub timeout: Duration,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
    pub endpoints: EndpointsSection,
    pub storage: StorageSection,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from(&QrytiToml::default())
    }
}

impl From<&QrytiToml> for ClientConfig {
    fn from(config: &QrytiToml) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            timeout: Duration::from_millis(config.api.timeout_ms),
            retry: RetryConfig {
                max_retries: config.retry.max_retries,
                base_delay: Duration::from_millis(config.retry.base_delay_ms),
                max_delay: Duration::from_millis(config.retry.max_delay_ms),
            },
            cache: CacheConfig {
                enabled: config.cache.enabled,
                ttl: Duration::from_millis(config.cache.ttl_ms),
                max_size: config.cache.max_size,
            },
            endpoints: config.api.endpoints.clone(),
            storage: config.storage.clone(),
        }
    }
}

/// Per-request options.
///
/// Everything except `skip_cache` is part of the cache key, so the same path
/// with different query parameters or headers is cached separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestOptions {
    /// Do not attach the bearer token
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub skip_auth: bool,
    /// Neither read nor populate the response cache
    #[serde(skip)]
    pub skip_cache: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<(String, String)>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    pub fn skip_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Cache key for a GET of `path` with these options
    pub fn cache_key(&self, path: &str) -> String {
        let options = serde_json::to_string(self).unwrap_or_default();
        format!("{}_{}", path, options)
    }
}

type SharedFetch = Shared<BoxFuture<'static, ClientResult<Value>>>;

/// Cache and in-flight registry, mutated together under one lock
struct ClientState {
    cache: ResponseCache,
    in_flight: InFlightRegistry<SharedFetch>,
}

impl ClientState {
    fn clear(&mut self) {
        self.cache.clear();
        self.in_flight.clear();
    }
}

/// Inner client state (shared across clones)
struct ClientInner {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn SessionStore>,
    session: RwLock<Session>,
    state: Mutex<ClientState>,
}

/// Client for the Qryti compliance backend.
///
/// Cheap to clone; clones share the session, cache and in-flight requests.
///
/// # Example
///
/// ```no_run
/// use qryti_client::{ApiClient, ClientConfig, RequestOptions};
///
/// # async fn example() -> qryti_client::ClientResult<()> {
/// let client = ApiClient::builder()
///     .config(ClientConfig::new("https://api.qryti.com/api/v1"))
///     .build()
///     .await?;
///
/// client.login("user@example.com", "secret").await?;
/// let clients = client.get("/clients", RequestOptions::new()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn SessionStore>>,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the client, restoring any session persisted in the store.
    ///
    /// Defaults to the reqwest transport and an in-memory store.
    pub async fn build(self) -> ClientResult<ApiClient> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let store: Arc<dyn SessionStore> = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));

        ApiClient::new(self.config.unwrap_or_default(), transport, store).await
    }
}

impl ApiClient {
    /// Create a client and restore the session held by `store`
    pub async fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn SessionStore>,
    ) -> ClientResult<Self> {
        let session = load_session(store.as_ref(), &config.storage).await?;
        if session.is_active() {
            debug!("Restored session from storage");
        }

        let state = ClientState {
            cache: ResponseCache::new(config.cache.ttl, config.cache.max_size),
            in_flight: InFlightRegistry::new(),
        };

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                store,
                session: RwLock::new(session),
                state: Mutex::new(state),
            }),
        })
    }

    /// Create a new client builder
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────

    /// Current bearer token
    pub fn token(&self) -> Option<String> {
        self.inner.session.read().token().map(str::to_string)
    }

    /// Profile of the signed-in user
    pub fn user(&self) -> Option<UserProfile> {
        self.inner.session.read().user().cloned()
    }

    pub fn session(&self) -> Session {
        self.inner.session.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.session.read().is_active()
    }

    /// Sign in and make the returned token the current session.
    ///
    /// Accepts `{access_token | token, user}` either at the top level or in an
    /// envelope's `data`. Clears the cache on success; nothing is persisted
    /// on failure.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let endpoint = self.inner.config.endpoints.login.clone();
        let body = json!({ "email": email, "password": password });

        let response = self
            .request(Method::Post, &endpoint, Some(&body), &RequestOptions::new().without_auth())
            .await?;

        let session = self.establish_session(email, response).await?;
        info!(email = %email, "Signed in");
        Ok(session)
    }

    /// Create an account; a response carrying a token signs the user in
    pub async fn register(&self, registration: &Registration) -> ClientResult<Session> {
        let endpoint = self.inner.config.endpoints.register.clone();
        let body = serde_json::to_value(registration)?;

        let response = self
            .request(Method::Post, &endpoint, Some(&body), &RequestOptions::new().without_auth())
            .await?;

        let session = self.establish_session(&registration.email, response).await?;
        info!(email = %registration.email, "Registered and signed in");
        Ok(session)
    }

    /// Ask the backend whether the current token is still valid.
    ///
    /// A 401 clears the session. Every failure reads as "not valid".
    pub async fn verify_token(&self) -> bool {
        if !self.is_authenticated() {
            return false;
        }

        let endpoint = self.inner.config.endpoints.verify.clone();
        match self.get(&endpoint, RequestOptions::new().skip_cache()).await {
            Ok(value) => {
                let response = ApiResponse::from_value(value);
                let valid = response
                    .data
                    .as_ref()
                    .and_then(|data| data.get("valid"))
                    .and_then(Value::as_bool);
                response.success && valid != Some(false)
            }
            Err(error) => {
                if error.is_unauthorized() {
                    warn!("Token rejected by backend, clearing session");
                    if let Err(e) = self.logout().await {
                        warn!(error = %e, "Failed to clear stored session");
                    }
                }
                false
            }
        }
    }

    /// Drop the session from memory and storage, and clear the cache
    pub async fn logout(&self) -> ClientResult<()> {
        *self.inner.session.write() = Session::anonymous();
        self.inner.state.lock().clear();

        let keys = &self.inner.config.storage;
        self.inner.store.remove(&keys.auth_token_key).await?;
        self.inner.store.remove(&keys.user_profile_key).await?;

        info!("Signed out");
        Ok(())
    }

    /// Replace the stored user profile, keeping the token
    pub(crate) async fn store_user(&self, user: UserProfile) -> ClientResult<()> {
        if !self.is_authenticated() {
            return Ok(());
        }

        let serialized = serde_json::to_string(&user)?;
        self.inner
            .store
            .set(&self.inner.config.storage.user_profile_key, &serialized)
            .await?;
        self.inner.session.write().set_user(user);
        Ok(())
    }

    async fn establish_session(&self, email: &str, response: Value) -> ClientResult<Session> {
        if response.get("success").and_then(Value::as_bool) == Some(false) {
            let envelope = ApiResponse::from_value(response.clone());
            return Err(QrytiError::Auth {
                status: None,
                message: envelope
                    .error
                    .or(envelope.message)
                    .unwrap_or_else(|| "Login was rejected".to_string()),
                data: response,
            });
        }

        let token = extract_token(&response).ok_or_else(|| QrytiError::Auth {
            status: None,
            message: "Response did not include an access token".to_string(),
            data: response.clone(),
        })?;
        let user = extract_user(&response).unwrap_or_else(|| UserProfile::fallback(email));

        let keys = &self.inner.config.storage;
        let serialized_user = serde_json::to_string(&user)?;
        self.inner.store.set(&keys.auth_token_key, &token).await?;
        if let Err(e) = self.inner.store.set(&keys.user_profile_key, &serialized_user).await {
            // Leave no half-written session behind
            if let Err(rollback) = self.inner.store.remove(&keys.auth_token_key).await {
                warn!(error = %rollback, "Failed to remove stored token after profile write failed");
            }
            return Err(e);
        }

        let session = Session::new(token, user);
        *self.inner.session.write() = session.clone();
        self.inner.state.lock().clear();
        Ok(session)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // HTTP methods
    // ─────────────────────────────────────────────────────────────────────────

    /// GET with caching and de-duplication.
    ///
    /// A fresh cached response is returned without a network call. Otherwise
    /// callers asking for the same key while a request is outstanding share
    /// that request's result, success or failure. Requests that bypass the
    /// cache are shared only among themselves, so a caching caller never
    /// joins a request whose result will not be stored.
    pub async fn get(&self, path: &str, options: RequestOptions) -> ClientResult<Value> {
        let use_cache = self.inner.config.cache.enabled && !options.skip_cache;
        let key = options.cache_key(path);
        let flight_key = if use_cache {
            key.clone()
        } else {
            format!("{}_uncached", key)
        };

        let pending = {
            let mut state = self.inner.state.lock();

            if use_cache {
                if let Some(value) = state.cache.get(&key) {
                    debug!(path = %path, "Cache hit");
                    return Ok(value);
                }
            }

            match state.in_flight.get(&flight_key) {
                Some(pending) => {
                    debug!(path = %path, "Joining in-flight request");
                    pending
                }
                None => state.in_flight.register(flight_key.clone(), path.to_string(), |ticket| {
                    let cache_key = use_cache.then(|| key.clone());
                    self.fetch(flight_key.clone(), cache_key, path.to_string(), options, ticket)
                }),
            }
        };

        pending.await
    }

    /// POST a JSON body; invalidates cached GETs of the same collection
    pub async fn post<B>(&self, path: &str, body: &B, options: RequestOptions) -> ClientResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.write(Method::Post, path, Some(&body), &options).await
    }

    /// PUT a JSON body; invalidates cached GETs of the same collection
    pub async fn put<B>(&self, path: &str, body: &B, options: RequestOptions) -> ClientResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.write(Method::Put, path, Some(&body), &options).await
    }

    /// DELETE; invalidates cached GETs of the same collection
    pub async fn delete(&self, path: &str, options: RequestOptions) -> ClientResult<Value> {
        self.write(Method::Delete, path, None, &options).await
    }

    /// Liveness probe. Never fails: any error reads as unhealthy.
    pub async fn health_check(&self) -> bool {
        let endpoint = self.inner.config.endpoints.health.clone();
        let options = RequestOptions::new().without_auth().skip_cache();

        match self.get(&endpoint, options).await {
            Ok(value) => ApiResponse::from_value(value).success,
            Err(error) => {
                debug!(error = %error, "Health check failed");
                false
            }
        }
    }

    /// Issue a request with auth, timeout and retry; no caching.
    ///
    /// 4xx responses fail immediately. Network failures, timeouts and 5xx
    /// responses are retried with linear backoff; when retries run out the
    /// last error is returned.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> ClientResult<Value> {
        let url = self.url_for(path, options);
        let body = match body {
            Some(Value::Null) | None => None,
            Some(value) => Some(serde_json::to_string(value)?),
        };

        self.with_retry(method, &url, || {
            self.send_once(HttpRequest {
                method,
                url: url.clone(),
                headers: self.headers(options),
                body: body.clone(),
            })
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cache
    // ─────────────────────────────────────────────────────────────────────────

    /// Drop every cached response and detach in-flight requests
    pub fn clear_cache(&self) {
        self.inner.state.lock().clear();
    }

    /// Drop cached responses (and detach in-flight GETs) of the collection `path` belongs to
    pub fn invalidate_collection(&self, path: &str) -> usize {
        let collection = collection_of(path);
        let mut state = self.inner.state.lock();
        let removed = state
            .cache
            .remove_where(|cached| collection_of(cached) == collection);
        state
            .in_flight
            .detach_where(|pending| collection_of(pending) == collection);

        if removed > 0 {
            debug!(collection = %collection, removed, "Invalidated cached responses");
        }
        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.state.lock().cache.stats()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resource APIs
    // ─────────────────────────────────────────────────────────────────────────

    /// Access the user profile API
    pub fn profile(&self) -> ProfileApi {
        ProfileApi::new(self.clone())
    }

    /// Access the compliance clients API
    pub fn clients(&self) -> ClientsApi {
        ClientsApi::new(self.clone())
    }

    /// Access the AI model registry API
    pub fn models(&self) -> ModelsApi {
        ModelsApi::new(self.clone())
    }

    /// Access the reports API
    pub fn reports(&self) -> ReportsApi {
        ReportsApi::new(self.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Future for one GET, shared by every caller of the same key.
    ///
    /// The request runs on its own task, so it settles even when every
    /// caller stops waiting. On settling it removes its own registry entry
    /// and, when it is still the registered request, caches a successful
    /// result under `cache_key` in the same critical section.
    fn fetch(
        &self,
        flight_key: String,
        cache_key: Option<String>,
        path: String,
        options: RequestOptions,
        ticket: u64,
    ) -> SharedFetch {
        let client = self.clone();
        let task = tokio::spawn(async move {
            let result = client.request(Method::Get, &path, None, &options).await;

            let mut state = client.inner.state.lock();
            let registered = state.in_flight.complete(&flight_key, ticket);
            if let (Ok(value), Some(cache_key)) = (&result, cache_key) {
                if registered {
                    state.cache.insert(cache_key, path, value.clone());
                }
            }
            result
        });

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(QrytiError::network("GET task did not complete".to_string(), e)),
            }
        }
        .boxed()
        .shared()
    }

    async fn write(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        options: &RequestOptions,
    ) -> ClientResult<Value> {
        let value = self.request(method, path, body, options).await?;
        self.invalidate_collection(path);
        Ok(value)
    }

    /// Execute a request with linear backoff retry logic
    async fn with_retry<F, Fut>(&self, method: Method, url: &str, operation: F) -> ClientResult<Value>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ClientResult<Value>>,
    {
        let retry = &self.inner.config.retry;
        let mut last_error = None;

        for attempt in 0..=retry.max_retries {
            debug!(method = method.as_str(), url = %url, attempt = attempt + 1, "Sending request");

            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    // Client errors are terminal
                    if !error.is_transient() {
                        return Err(error);
                    }

                    if attempt < retry.max_retries {
                        let delay = retry.delay_for(attempt + 1);
                        warn!(
                            method = method.as_str(),
                            url = %url,
                            attempt = attempt + 1,
                            max_retries = retry.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            error = %error,
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| QrytiError::Network {
            message: "Retry operation failed without error".to_string(),
            source: None,
        }))
    }

    /// One attempt, bounded by the configured timeout
    async fn send_once(&self, request: HttpRequest) -> ClientResult<Value> {
        let timeout = self.inner.config.timeout;
        let response = match tokio::time::timeout(timeout, self.inner.transport.send(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(QrytiError::Timeout { after: timeout }),
        };

        interpret_response(response)
    }

    fn url_for(&self, path: &str, options: &RequestOptions) -> String {
        let mut url = build_url(&self.inner.config.base_url, path);
        if !options.query.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(options.query.iter())
                .finish();
            let separator = if url.contains('?') { '&' } else { '?' };
            url.push(separator);
            url.push_str(&query);
        }
        url
    }

    fn headers(&self, options: &RequestOptions) -> Vec<(String, String)> {
        let mut headers = vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ];

        if !options.skip_auth {
            if let Some(token) = self.inner.session.read().token() {
                headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
            }
        }

        for (name, value) in &options.headers {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }
        headers
    }
}

/// Turn a raw response into a JSON value or a classified error.
///
/// A success body that is empty or not JSON reads as `null`.
fn interpret_response(response: HttpResponse) -> ClientResult<Value> {
    if response.is_success() {
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&response.body).unwrap_or_else(|e| {
            warn!(status = response.status, error = %e, "Response body is not valid JSON");
            Value::Null
        }));
    }

    let data = serde_json::from_str(&response.body).unwrap_or(Value::Null);
    Err(QrytiError::from_status(response.status, data))
}

async fn load_session(store: &dyn SessionStore, keys: &StorageSection) -> ClientResult<Session> {
    let token = store.get(&keys.auth_token_key).await?;

    let user = match store.get(&keys.user_profile_key).await? {
        Some(raw) => match serde_json::from_str::<UserProfile>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable stored user profile");
                store.remove(&keys.user_profile_key).await?;
                None
            }
        },
        None => None,
    };

    Ok(Session::from_parts(token, user))
}

fn extract_token(response: &Value) -> Option<String> {
    std::iter::once(response).chain(response.get("data")).find_map(|scope| {
        ["access_token", "token"]
            .iter()
            .find_map(|field| scope.get(field)?.as_str())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

fn extract_user(response: &Value) -> Option<UserProfile> {
    let user = response
        .get("user")
        .or_else(|| response.get("data").and_then(|data| data.get("user")))?;
    serde_json::from_value(user.clone()).ok()
}
