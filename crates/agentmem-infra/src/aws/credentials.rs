//! AWS credential resolution.
//!
//! Sources are tried in order:
//!
//! 1. the standard environment variables
//! 2. the shared credentials and config files (see [`super::profile`])
//! 3. the container credentials endpoint (the agent runtime, ECS)
//! 4. the EC2 instance metadata service (IMDSv2)
//!
//! Endpoint credentials are cached until shortly before they expire.
//!
//! Secret parts are wrapped in [`SecretString`] and never appear in `Debug`
//! output.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;

use agentmem_types::error::ConfigError;

use super::profile::profile_credentials;

pub const ACCESS_KEY_ID_VAR: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_VAR: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_VAR: &str = "AWS_SESSION_TOKEN";
pub const BEARER_TOKEN_VAR: &str = "AWS_BEARER_TOKEN_BEDROCK";

const CONTAINER_FULL_URI_VAR: &str = "AWS_CONTAINER_CREDENTIALS_FULL_URI";
const CONTAINER_RELATIVE_URI_VAR: &str = "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI";
const CONTAINER_TOKEN_VAR: &str = "AWS_CONTAINER_AUTHORIZATION_TOKEN";
const CONTAINER_TOKEN_FILE_VAR: &str = "AWS_CONTAINER_AUTHORIZATION_TOKEN_FILE";
const CONTAINER_HOST: &str = "http://169.254.170.2";

const IMDS_ENDPOINT_VAR: &str = "AWS_EC2_METADATA_SERVICE_ENDPOINT";
const IMDS_DISABLED_VAR: &str = "AWS_EC2_METADATA_DISABLED";
const IMDS_ENDPOINT: &str = "http://169.254.169.254";
const IMDS_TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const IMDS_TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";
const IMDS_TIMEOUT: Duration = Duration::from_secs(1);

/// Refresh endpoint credentials this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// A resolved set of AWS credentials.
#[derive(Clone)]
pub struct AwsCredentials {
    access_key_id: String,
    secret_access_key: SecretString,
    session_token: Option<SecretString>,
    expires_at: Option<DateTime<Utc>>,
}

impl AwsCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: SecretString,
        session_token: Option<SecretString>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key,
            session_token,
            expires_at: None,
        }
    }

    /// Static credentials from `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`
    /// (and optionally `AWS_SESSION_TOKEN`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let access_key_id = get(ACCESS_KEY_ID_VAR).ok_or(ConfigError::Missing(ACCESS_KEY_ID_VAR))?;
        let secret = get(SECRET_ACCESS_KEY_VAR).ok_or(ConfigError::Missing(SECRET_ACCESS_KEY_VAR))?;
        Ok(Self::new(
            access_key_id,
            SecretString::from(secret),
            get(SESSION_TOKEN_VAR).map(SecretString::from),
        ))
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub(crate) fn secret_access_key(&self) -> &str {
        self.secret_access_key.expose_secret()
    }

    pub(crate) fn session_token(&self) -> Option<&str> {
        self.session_token.as_ref().map(|token| token.expose_secret())
    }

    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| {
            chrono::Duration::from_std(REFRESH_MARGIN)
                .map(|margin| expires_at - margin > now)
                .unwrap_or(false)
        })
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Container credentials endpoint and the token to present to it.
#[derive(Debug, Clone)]
struct ContainerEndpoint {
    uri: String,
    authorization: Option<SecretString>,
}

/// Credential document served by the container and instance metadata
/// endpoints.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EndpointCredentials {
    access_key_id: String,
    secret_access_key: String,
    token: Option<String>,
    expiration: Option<DateTime<Utc>>,
}

/// Endpoint serving short-lived credentials.
#[derive(Debug)]
enum Endpoint {
    Container(ContainerEndpoint),
    /// IMDSv2 base URL.
    InstanceMetadata(String),
}

#[derive(Debug)]
enum Source {
    Static(AwsCredentials),
    Endpoint(Endpoint),
    /// No source configured; every request fails with this reason.
    Unavailable(String),
}

/// Where SigV4 credentials come from, with caching for expiring ones.
#[derive(Debug)]
pub struct CredentialsProvider {
    source: Source,
    http: reqwest::Client,
    cached: Mutex<Option<AwsCredentials>>,
}

impl CredentialsProvider {
    pub fn fixed(credentials: AwsCredentials) -> Self {
        Self::with_source(Source::Static(credentials))
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// The first configured source, in the order listed in the module docs.
    ///
    /// Resolution problems do not fail here; they surface from
    /// [`credentials`](Self::credentials) on the first signed request, so a
    /// process can start (and report its configuration) without credentials.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match Self::resolve(&lookup) {
            Ok(provider) => provider,
            Err(e) => {
                tracing::debug!(error = %e, "No AWS credentials source");
                Self::with_source(Source::Unavailable(e.to_string()))
            }
        }
    }

    fn resolve(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Ok(credentials) = AwsCredentials::from_lookup(lookup) {
            return Ok(Self::fixed(credentials));
        }
        if let Some(credentials) = profile_credentials(lookup)? {
            return Ok(Self::fixed(credentials));
        }

        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let uri = match (get(CONTAINER_FULL_URI_VAR), get(CONTAINER_RELATIVE_URI_VAR)) {
            (Some(full), _) => full,
            (None, Some(relative)) => format!("{CONTAINER_HOST}{relative}"),
            (None, None) => {
                if get(IMDS_DISABLED_VAR).is_some_and(|v| v.eq_ignore_ascii_case("true")) {
                    return Err(ConfigError::Missing(ACCESS_KEY_ID_VAR));
                }
                let endpoint = get(IMDS_ENDPOINT_VAR).unwrap_or_else(|| IMDS_ENDPOINT.to_string());
                return Ok(Self::with_source(Source::Endpoint(Endpoint::InstanceMetadata(
                    endpoint.trim_end_matches('/').to_string(),
                ))));
            }
        };
        let authorization = match (get(CONTAINER_TOKEN_VAR), get(CONTAINER_TOKEN_FILE_VAR)) {
            (Some(token), _) => Some(token),
            (None, Some(path)) => Some(
                std::fs::read_to_string(&path)
                    .map(|token| token.trim().to_string())
                    .map_err(|e| ConfigError::Invalid {
                        name: CONTAINER_TOKEN_FILE_VAR,
                        reason: format!("{path}: {e}"),
                    })?,
            ),
            (None, None) => None,
        };

        Ok(Self::with_source(Source::Endpoint(Endpoint::Container(
            ContainerEndpoint {
                uri,
                authorization: authorization.map(SecretString::from),
            },
        ))))
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            cached: Mutex::new(None),
        }
    }

    /// Current credentials, fetching from the endpoint when the cache is
    /// empty or near expiry.
    pub async fn credentials(&self) -> Result<AwsCredentials, String> {
        let endpoint = match &self.source {
            Source::Static(credentials) => return Ok(credentials.clone()),
            Source::Unavailable(reason) => return Err(reason.clone()),
            Source::Endpoint(endpoint) => endpoint,
        };

        let mut cached = self.cached.lock().await;
        if let Some(credentials) = cached.as_ref().filter(|c| c.is_fresh(Utc::now())) {
            return Ok(credentials.clone());
        }

        let body = match endpoint {
            Endpoint::Container(container) => self.fetch_container(container).await?,
            Endpoint::InstanceMetadata(base) => self
                .fetch_instance_metadata(base)
                .await
                .map_err(|e| {
                    format!(
                        "no AWS credentials found: set {ACCESS_KEY_ID_VAR}/{SECRET_ACCESS_KEY_VAR}, \
                         configure a profile, or run with an instance role ({e})"
                    )
                })?,
        };

        tracing::debug!(expires_at = ?body.expiration, "Fetched endpoint credentials");
        let credentials = AwsCredentials {
            access_key_id: body.access_key_id,
            secret_access_key: SecretString::from(body.secret_access_key),
            session_token: body.token.map(SecretString::from),
            expires_at: body.expiration,
        };
        *cached = Some(credentials.clone());
        Ok(credentials)
    }

    async fn fetch_container(&self, endpoint: &ContainerEndpoint) -> Result<EndpointCredentials, String> {
        let mut request = self.http.get(&endpoint.uri);
        if let Some(token) = &endpoint.authorization {
            request = request.header("Authorization", token.expose_secret());
        }
        let response = request
            .send()
            .await
            .map_err(|e| format!("container credentials request failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!(
                "container credentials endpoint returned HTTP {}",
                response.status()
            ));
        }
        response
            .json()
            .await
            .map_err(|e| format!("malformed container credentials: {e}"))
    }

    /// IMDSv2: session token, then the instance role name, then its credentials.
    async fn fetch_instance_metadata(&self, endpoint: &str) -> Result<EndpointCredentials, String> {
        let token = self
            .http
            .put(format!("{endpoint}/latest/api/token"))
            .header(IMDS_TOKEN_TTL_HEADER, "21600")
            .timeout(IMDS_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| format!("instance metadata token request failed: {e}"))?
            .text()
            .await
            .map_err(|e| format!("instance metadata token unreadable: {e}"))?;

        let roles_url = format!("{endpoint}/latest/meta-data/iam/security-credentials/");
        let roles = self
            .http
            .get(&roles_url)
            .header(IMDS_TOKEN_HEADER, &token)
            .timeout(IMDS_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| format!("instance role lookup failed: {e}"))?
            .text()
            .await
            .map_err(|e| format!("instance role lookup unreadable: {e}"))?;
        let role = roles
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| "instance has no IAM role attached".to_string())?;

        self.http
            .get(format!("{roles_url}{role}"))
            .header(IMDS_TOKEN_HEADER, &token)
            .timeout(IMDS_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| format!("instance role credentials request failed: {e}"))?
            .json()
            .await
            .map_err(|e| format!("malformed instance role credentials: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::aws::profile::{CONFIG_FILE_VAR, PROFILE_VAR, SHARED_CREDENTIALS_FILE_VAR};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    /// `vars` with the shared files pointed at nothing and IMDS disabled,
    /// unless `vars` sets them.
    fn isolated(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let mut all: Vec<(&str, &str)> = vec![
            (SHARED_CREDENTIALS_FILE_VAR, "/nonexistent/agentmem/credentials"),
            (CONFIG_FILE_VAR, "/nonexistent/agentmem/config"),
            (IMDS_DISABLED_VAR, "true"),
        ];
        all.retain(|(name, _)| !vars.iter().any(|(set, _)| set == name));
        all.extend_from_slice(vars);
        lookup(&all)
    }

    fn credentials_file(contents: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        std::fs::write(&path, contents).unwrap();
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    #[test]
    fn test_static_credentials_from_env() {
        let credentials = AwsCredentials::from_lookup(lookup(&[
            ("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
            ("AWS_SESSION_TOKEN", "token"),
        ]))
        .unwrap();
        assert_eq!(credentials.access_key_id(), "AKIDEXAMPLE");
        assert_eq!(credentials.session_token(), Some("token"));
    }

    #[test]
    fn test_missing_secret_is_reported() {
        let err = AwsCredentials::from_lookup(lookup(&[("AWS_ACCESS_KEY_ID", "AKIDEXAMPLE")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AWS_SECRET_ACCESS_KEY")));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials =
            AwsCredentials::new("AKIDEXAMPLE", SecretString::from("super-secret"), None);
        let debug = format!("{credentials:?}");
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_no_source_fails_on_use() {
        let provider = CredentialsProvider::from_lookup(isolated(&[]));
        let err = provider.credentials().await.unwrap_err();
        assert!(err.contains("AWS_ACCESS_KEY_ID"));
    }

    #[tokio::test]
    async fn test_profile_from_shared_credentials_file() {
        let (_dir, path) = credentials_file(
            "[default]\naws_access_key_id = AKIADEFAULT\naws_secret_access_key = s1\n\n\
             [demo]\naws_access_key_id = AKIADEMO\naws_secret_access_key = s2\n",
        );
        let provider = CredentialsProvider::from_lookup(isolated(&[
            (SHARED_CREDENTIALS_FILE_VAR, path.as_str()),
            (PROFILE_VAR, "demo"),
        ]));

        let credentials = provider.credentials().await.unwrap();
        assert_eq!(credentials.access_key_id(), "AKIADEMO");
        assert_eq!(credentials.secret_access_key(), "s2");
    }

    #[tokio::test]
    async fn test_environment_keys_win_over_profile() {
        let (_dir, path) = credentials_file(
            "[default]\naws_access_key_id = AKIAFILE\naws_secret_access_key = file-secret\n",
        );
        let provider = CredentialsProvider::from_lookup(isolated(&[
            (SHARED_CREDENTIALS_FILE_VAR, path.as_str()),
            ("AWS_ACCESS_KEY_ID", "AKIAENV"),
            ("AWS_SECRET_ACCESS_KEY", "env-secret"),
        ]));

        assert_eq!(provider.credentials().await.unwrap().access_key_id(), "AKIAENV");
    }

    #[tokio::test]
    async fn test_unknown_named_profile_fails_on_use() {
        let (_dir, path) = credentials_file("[default]\naws_access_key_id = A\naws_secret_access_key = B\n");
        let provider = CredentialsProvider::from_lookup(isolated(&[
            (SHARED_CREDENTIALS_FILE_VAR, path.as_str()),
            (PROFILE_VAR, "missing"),
        ]));

        let err = provider.credentials().await.unwrap_err();
        assert!(err.contains("profile 'missing'"));
    }

    #[tokio::test]
    async fn test_instance_metadata_credentials() {
        let server = MockServer::start().await;
        let expiration = (Utc::now() + chrono::Duration::hours(6)).to_rfc3339();
        Mock::given(method("PUT"))
            .and(path("/latest/api/token"))
            .and(header(IMDS_TOKEN_TTL_HEADER, "21600"))
            .respond_with(ResponseTemplate::new(200).set_body_string("imds-token"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/meta-data/iam/security-credentials/"))
            .and(header(IMDS_TOKEN_HEADER, "imds-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("agent-role\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/meta-data/iam/security-credentials/agent-role"))
            .and(header(IMDS_TOKEN_HEADER, "imds-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Code": "Success",
                "Type": "AWS-HMAC",
                "AccessKeyId": "ASIAINSTANCE",
                "SecretAccessKey": "instance-secret",
                "Token": "instance-session",
                "Expiration": expiration,
            })))
            .mount(&server)
            .await;

        let endpoint = server.uri();
        let provider = CredentialsProvider::from_lookup(isolated(&[
            (IMDS_DISABLED_VAR, "false"),
            (IMDS_ENDPOINT_VAR, endpoint.as_str()),
        ]));

        let first = provider.credentials().await.unwrap();
        let second = provider.credentials().await.unwrap();
        assert_eq!(first.access_key_id(), "ASIAINSTANCE");
        assert_eq!(second.session_token(), Some("instance-session"));
    }

    #[tokio::test]
    async fn test_instance_metadata_failure_explains_sources() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/latest/api/token"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let endpoint = server.uri();
        let provider = CredentialsProvider::from_lookup(isolated(&[
            (IMDS_DISABLED_VAR, "false"),
            (IMDS_ENDPOINT_VAR, endpoint.as_str()),
        ]));

        let err = provider.credentials().await.unwrap_err();
        assert!(err.contains("AWS_ACCESS_KEY_ID"));
        assert!(err.contains("instance metadata token request failed"));
    }

    #[tokio::test]
    async fn test_container_credentials_fetched_and_cached() {
        let server = MockServer::start().await;
        let expiration = (Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
        Mock::given(method("GET"))
            .and(path("/v2/credentials"))
            .and(header("Authorization", "container-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "AccessKeyId": "ASIACONTAINER",
                "SecretAccessKey": "container-secret",
                "Token": "session",
                "Expiration": expiration,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let full_uri = format!("{}/v2/credentials", server.uri());
        let provider = CredentialsProvider::from_lookup(isolated(&[
            ("AWS_CONTAINER_CREDENTIALS_FULL_URI", full_uri.as_str()),
            ("AWS_CONTAINER_AUTHORIZATION_TOKEN", "container-token"),
        ]));

        let first = provider.credentials().await.unwrap();
        let second = provider.credentials().await.unwrap();
        assert_eq!(first.access_key_id(), "ASIACONTAINER");
        assert_eq!(second.session_token(), Some("session"));
    }
}
