//! OpenTelemetry [`Resource`] construction and Cloud Run detection.
//!
//! On Cloud Run the platform injects `K_SERVICE`, `K_REVISION` and
//! `K_CONFIGURATION` into the container environment, and the GCE metadata
//! server answers project, region and instance queries. Both are required:
//! a missing `K_SERVICE` means the process is not running on Cloud Run.

use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource as semconv;
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the metadata server `host[:port]`.
pub const METADATA_HOST_ENV: &str = "GCE_METADATA_HOST";

const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
const METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors produced while detecting the Cloud Run resource.
#[derive(Debug, Error)]
pub enum DetectError {
    /// A required Cloud Run environment variable is absent.
    #[error("not running on Cloud Run: {0} is not set")]
    NotCloudRun(&'static str),

    /// The HTTP client for the metadata server could not be built.
    #[error("failed to build metadata client: {0}")]
    Client(#[source] reqwest::Error),

    /// The metadata server could not be reached or its body not read.
    #[error("metadata request for {path} failed: {source}")]
    Metadata {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The metadata server answered with a non-success status.
    #[error("metadata server returned {status} for {path}")]
    MetadataStatus { path: &'static str, status: u16 },
}

/// Basic resource for a named service: `service.name` and `service.version`.
pub fn service_resource(service_name: &'static str) -> Resource {
    Resource::new(vec![
        KeyValue::new(semconv::SERVICE_NAME, service_name),
        KeyValue::new(semconv::SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
    ])
}

/// Resource for a process outside any detectable platform.
///
/// Carries a random `service.instance.id` so that series from two local runs
/// do not merge in the backend.
pub fn local_resource(service_name: &'static str) -> Resource {
    service_resource(service_name).merge(&Resource::new(vec![KeyValue::new(
        semconv::SERVICE_INSTANCE_ID,
        uuid::Uuid::new_v4().to_string(),
    )]))
}

/// Add `cloud.account.id` for `project_id` unless it is blank.
pub fn with_project(resource: Resource, project_id: &str) -> Resource {
    if project_id.trim().is_empty() {
        return resource;
    }
    resource.merge(&Resource::new(vec![KeyValue::new(
        semconv::CLOUD_ACCOUNT_ID,
        project_id.to_owned(),
    )]))
}

/// Values the Cloud Run platform places in the container environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudRunEnv {
    pub service: String,
    pub revision: Option<String>,
    pub configuration: Option<String>,
}

impl CloudRunEnv {
    /// Read the Cloud Run variables from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::NotCloudRun`] if `K_SERVICE` is unset or empty.
    pub fn from_env() -> Result<Self, DetectError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, DetectError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let service = present("K_SERVICE").ok_or(DetectError::NotCloudRun("K_SERVICE"))?;
        Ok(Self {
            service,
            revision: present("K_REVISION"),
            configuration: present("K_CONFIGURATION"),
        })
    }
}

/// Values answered by the GCE metadata server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudRunMetadata {
    pub project_id: String,
    /// Full metadata value, e.g. `projects/123/regions/us-central1`.
    pub region: String,
    pub instance_id: String,
}

/// Assemble the Cloud Run resource from its environment and metadata parts.
pub fn cloud_run_resource(env: &CloudRunEnv, md: &CloudRunMetadata) -> Resource {
    let region = md.region.rsplit('/').next().unwrap_or(&md.region).to_owned();
    let mut attrs = vec![
        KeyValue::new(semconv::CLOUD_PROVIDER, "gcp"),
        KeyValue::new(semconv::CLOUD_PLATFORM, "gcp_cloud_run"),
        KeyValue::new(semconv::CLOUD_ACCOUNT_ID, md.project_id.clone()),
        KeyValue::new(semconv::CLOUD_REGION, region),
        KeyValue::new(semconv::SERVICE_NAME, env.service.clone()),
        KeyValue::new(semconv::SERVICE_INSTANCE_ID, md.instance_id.clone()),
    ];
    if let Some(revision) = &env.revision {
        attrs.push(KeyValue::new(semconv::SERVICE_VERSION, revision.clone()));
    }
    if let Some(configuration) = &env.configuration {
        attrs.push(KeyValue::new(semconv::SERVICE_NAMESPACE, configuration.clone()));
    }
    Resource::new(attrs)
}

/// Detects the Cloud Run resource the process is running under.
#[derive(Debug, Clone)]
pub struct CloudRunDetector {
    client: reqwest::Client,
    metadata_base: String,
}

impl CloudRunDetector {
    /// Create a detector pointed at `$GCE_METADATA_HOST`, falling back to
    /// `metadata.google.internal`.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::Client`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, DetectError> {
        let host = std::env::var(METADATA_HOST_ENV)
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_METADATA_HOST.to_owned());
        Self::with_metadata_host(&host)
    }

    /// Create a detector that queries the metadata server at `host[:port]`.
    pub fn with_metadata_host(host: &str) -> Result<Self, DetectError> {
        let client = reqwest::Client::builder()
            .timeout(METADATA_TIMEOUT)
            .build()
            .map_err(DetectError::Client)?;
        Ok(Self {
            client,
            metadata_base: format!("http://{host}/computeMetadata/v1"),
        })
    }

    /// Detect the Cloud Run resource from the environment and metadata server.
    ///
    /// # Errors
    ///
    /// Fails if `K_SERVICE` is unset or any metadata query fails.
    pub async fn detect(&self) -> Result<Resource, DetectError> {
        let env = CloudRunEnv::from_env()?;
        self.detect_with(&env).await
    }

    async fn detect_with(&self, env: &CloudRunEnv) -> Result<Resource, DetectError> {
        let md = CloudRunMetadata {
            project_id: self.metadata("project/project-id").await?,
            region: self.metadata("instance/region").await?,
            instance_id: self.metadata("instance/id").await?,
        };
        debug!(service = %env.service, project_id = %md.project_id, "detected Cloud Run resource");
        Ok(cloud_run_resource(env, &md))
    }

    async fn metadata(&self, path: &'static str) -> Result<String, DetectError> {
        let url = format!("{}/{path}", self.metadata_base);
        let resp = self
            .client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|source| DetectError::Metadata { path, source })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DetectError::MetadataStatus {
                path,
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|source| DetectError::Metadata { path, source })?;
        Ok(body.trim().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::{HeaderMap, StatusCode, Uri},
        Router,
    };
    use opentelemetry::{Key, Value};
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn string_attr(resource: &Resource, key: &'static str) -> Option<String> {
        resource.get(Key::from_static_str(key)).map(|v| match v {
            Value::String(s) => s.to_string(),
            other => other.to_string(),
        })
    }

    /// Serve a fake metadata server on an ephemeral port.
    ///
    /// Requests without `Metadata-Flavor: Google` are rejected like the real server.
    async fn fake_metadata_server() -> String {
        async fn answer(headers: HeaderMap, uri: Uri) -> (StatusCode, &'static str) {
            if headers.get("Metadata-Flavor").map(|v| v.as_bytes()) != Some(b"Google") {
                return (StatusCode::FORBIDDEN, "missing flavor");
            }
            match uri.path() {
                "/computeMetadata/v1/project/project-id" => (StatusCode::OK, "demo-project"),
                "/computeMetadata/v1/instance/region" => {
                    (StatusCode::OK, "projects/1234/regions/asia-northeast1\n")
                }
                "/computeMetadata/v1/instance/id" => (StatusCode::OK, "00bf4bf02d"),
                _ => (StatusCode::NOT_FOUND, "not found"),
            }
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().fallback(answer))
                .await
                .unwrap();
        });
        addr.to_string()
    }

    #[test]
    fn env_requires_k_service() {
        let err = CloudRunEnv::from_lookup(lookup(&[("K_REVISION", "r1")])).unwrap_err();
        assert!(matches!(err, DetectError::NotCloudRun("K_SERVICE")));
    }

    #[test]
    fn env_treats_blank_as_absent() {
        let err = CloudRunEnv::from_lookup(lookup(&[("K_SERVICE", "  ")])).unwrap_err();
        assert!(matches!(err, DetectError::NotCloudRun(_)));
    }

    #[test]
    fn env_reads_optional_values() {
        let env = CloudRunEnv::from_lookup(lookup(&[
            ("K_SERVICE", "wave"),
            ("K_REVISION", "wave-00001-abc"),
        ]))
        .unwrap();
        assert_eq!(env.service, "wave");
        assert_eq!(env.revision.as_deref(), Some("wave-00001-abc"));
        assert_eq!(env.configuration, None);
    }

    #[test]
    fn resource_uses_last_region_segment() {
        let env = CloudRunEnv {
            service: "wave".into(),
            revision: Some("wave-00001-abc".into()),
            configuration: Some("wave".into()),
        };
        let md = CloudRunMetadata {
            project_id: "demo-project".into(),
            region: "projects/1234/regions/us-central1".into(),
            instance_id: "42".into(),
        };
        let res = cloud_run_resource(&env, &md);
        assert_eq!(string_attr(&res, "cloud.region").as_deref(), Some("us-central1"));
        assert_eq!(string_attr(&res, "cloud.provider").as_deref(), Some("gcp"));
        assert_eq!(string_attr(&res, "cloud.account.id").as_deref(), Some("demo-project"));
        assert_eq!(string_attr(&res, "service.name").as_deref(), Some("wave"));
        assert_eq!(string_attr(&res, "service.version").as_deref(), Some("wave-00001-abc"));
        assert_eq!(string_attr(&res, "service.instance.id").as_deref(), Some("42"));
    }

    #[test]
    fn resource_omits_absent_optionals() {
        let env = CloudRunEnv {
            service: "wave".into(),
            revision: None,
            configuration: None,
        };
        let md = CloudRunMetadata {
            project_id: "p".into(),
            region: "us-east1".into(),
            instance_id: "1".into(),
        };
        let res = cloud_run_resource(&env, &md);
        assert_eq!(string_attr(&res, "cloud.region").as_deref(), Some("us-east1"));
        assert!(string_attr(&res, "service.namespace").is_none());
    }

    #[test]
    fn local_resource_has_instance_id() {
        let res = local_resource("constant-metric");
        assert_eq!(string_attr(&res, "service.name").as_deref(), Some("constant-metric"));
        assert!(string_attr(&res, "service.instance.id").is_some());
    }

    #[test]
    fn with_project_skips_blank() {
        let res = with_project(service_resource("client"), " ");
        assert!(string_attr(&res, "cloud.account.id").is_none());
        let res = with_project(service_resource("client"), "demo-project");
        assert_eq!(string_attr(&res, "cloud.account.id").as_deref(), Some("demo-project"));
        assert_eq!(string_attr(&res, "service.name").as_deref(), Some("client"));
    }

    #[tokio::test]
    async fn detects_from_metadata_server() {
        let host = fake_metadata_server().await;
        let detector = CloudRunDetector::with_metadata_host(&host).unwrap();
        let env = CloudRunEnv {
            service: "wave".into(),
            revision: None,
            configuration: Some("wave".into()),
        };
        let res = detector.detect_with(&env).await.unwrap();
        assert_eq!(string_attr(&res, "cloud.account.id").as_deref(), Some("demo-project"));
        assert_eq!(string_attr(&res, "cloud.region").as_deref(), Some("asia-northeast1"));
        assert_eq!(string_attr(&res, "service.instance.id").as_deref(), Some("00bf4bf02d"));
        assert_eq!(string_attr(&res, "service.namespace").as_deref(), Some("wave"));
    }

    #[tokio::test]
    async fn unreachable_metadata_server_fails() {
        // Port 9 (discard) is closed on test hosts.
        let detector = CloudRunDetector::with_metadata_host("127.0.0.1:9").unwrap();
        let env = CloudRunEnv {
            service: "wave".into(),
            revision: None,
            configuration: None,
        };
        let err = detector.detect_with(&env).await.unwrap_err();
        assert!(matches!(err, DetectError::Metadata { path: "project/project-id", .. }));
    }
}
