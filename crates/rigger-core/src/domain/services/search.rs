//! Full-text search engine record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    BackendKind, CONTAINER_PASSWORD, DEFAULT_REGION, FieldMap, LOCAL_HOST, ProvisionContext,
    Readiness, ServiceConfig,
    fields::{FieldReader, FieldWriter},
    host_port, or_default,
};
use crate::domain::{config_ops::ConfigValues, error::DomainError, manifest::RenderVariables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDriver {
    Collection,
    Database,
    Meilisearch,
    Typesense,
    Elasticsearch,
    Opensearch,
}

impl SearchDriver {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Database => "database",
            Self::Meilisearch => "meilisearch",
            Self::Typesense => "typesense",
            Self::Elasticsearch => "elasticsearch",
            Self::Opensearch => "opensearch",
        }
    }

    pub const fn default_port(&self) -> Option<u16> {
        match self {
            Self::Meilisearch => Some(7700),
            Self::Typesense => Some(8108),
            Self::Elasticsearch => Some(9200),
            Self::Collection | Self::Database | Self::Opensearch => None,
        }
    }

    const fn is_in_process(&self) -> bool {
        matches!(self, Self::Collection | Self::Database)
    }
}

impl fmt::Display for SearchDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchDriver {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collection" => Ok(Self::Collection),
            "database" => Ok(Self::Database),
            "meilisearch" => Ok(Self::Meilisearch),
            "typesense" => Ok(Self::Typesense),
            "elasticsearch" | "elastic" => Ok(Self::Elasticsearch),
            "opensearch" => Ok(Self::Opensearch),
            other => Err(DomainError::invalid(
                "driver",
                other,
                "expected collection, database, meilisearch, typesense, elasticsearch or opensearch",
            )),
        }
    }
}

/// Search engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    driver: SearchDriver,
    host: Option<String>,
    port: Option<u16>,
    api_key: Option<String>,
    region: Option<String>,
    endpoint: Option<String>,
    docker: bool,
    readiness: Readiness,
}

impl SearchConfig {
    pub fn new(driver: SearchDriver) -> Self {
        Self {
            driver,
            host: None,
            port: None,
            api_key: None,
            region: None,
            endpoint: None,
            docker: false,
            readiness: Readiness::NotChecked,
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_docker(mut self, docker: bool) -> Self {
        self.docker = docker;
        self
    }

    pub fn driver(&self) -> SearchDriver {
        self.driver
    }
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
    pub fn port(&self) -> Option<u16> {
        self.port
    }
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
    pub fn is_docker(&self) -> bool {
        self.docker
    }

    fn http_url(&self) -> Option<String> {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => Some(format!("http://{host}:{port}")),
            (Some(host), None) => Some(format!("http://{host}")),
            _ => None,
        }
    }
}

impl ServiceConfig for SearchConfig {
    const KIND: BackendKind = BackendKind::Search;

    fn from_mapping(map: &FieldMap) -> Result<Self, DomainError> {
        let fields = FieldReader::new(map);
        fields.require_all(&["driver"])?;

        Ok(Self {
            driver: fields.parse("driver")?,
            host: fields.string("host"),
            port: fields.port("port")?,
            api_key: fields.string("api_key"),
            region: fields.string("region"),
            endpoint: fields.string("endpoint"),
            docker: fields.flag("docker")?,
            readiness: fields.optional("readiness")?.unwrap_or_default(),
        })
    }

    fn to_mapping(&self) -> FieldMap {
        FieldWriter::default()
            .put("driver", self.driver)
            .put_opt("host", self.host.as_ref())
            .put_opt("port", self.port.as_ref())
            .put_opt("api_key", self.api_key.as_ref())
            .put_opt("region", self.region.as_ref())
            .put_opt("endpoint", self.endpoint.as_ref())
            .put("docker", self.docker)
            .put_opt("readiness", self.readiness.serialized().as_ref())
            .finish()
    }

    fn driver_name(&self) -> &'static str {
        self.driver.as_str()
    }

    fn needs_backend(&self) -> bool {
        !self.driver.is_in_process()
    }

    fn wants_container(&self) -> bool {
        self.docker
    }

    fn container_service(&self) -> Option<&'static str> {
        match self.driver {
            SearchDriver::Meilisearch | SearchDriver::Typesense | SearchDriver::Elasticsearch => {
                Some(self.driver.as_str())
            }
            _ => None,
        }
    }

    fn readiness(&self) -> Readiness {
        self.readiness
    }

    fn with_readiness(mut self, readiness: Readiness) -> Self {
        self.readiness = readiness;
        self
    }

    fn with_container_endpoint(&self, _ctx: &ProvisionContext) -> Self {
        // Typesense refuses to boot without an API key.
        let api_key = match self.driver {
            SearchDriver::Typesense => or_default(&self.api_key, CONTAINER_PASSWORD),
            _ => self.api_key.clone(),
        };

        Self {
            host: self
                .container_service()
                .and_then(|service| or_default(&self.host, service)),
            port: self.port.or(self.driver.default_port()),
            api_key,
            docker: true,
            ..self.clone()
        }
    }

    fn with_local_defaults(&self, _ctx: &ProvisionContext) -> Self {
        match self.driver {
            SearchDriver::Collection | SearchDriver::Database => Self {
                docker: false,
                ..self.clone()
            },
            SearchDriver::Opensearch => Self {
                region: or_default(&self.region, DEFAULT_REGION),
                docker: false,
                readiness: Readiness::NotChecked,
                ..self.clone()
            },
            _ => Self {
                host: or_default(&self.host, LOCAL_HOST),
                port: self.port.or(self.driver.default_port()),
                docker: false,
                readiness: Readiness::NotChecked,
                ..self.clone()
            },
        }
    }

    fn manifest_variables(&self, ctx: &ProvisionContext) -> RenderVariables {
        let service = self.container_service().unwrap_or(self.driver.as_str());
        RenderVariables::new(ctx.slug(), service)
            .with_variable("PORT", self.port.or(self.driver.default_port()).unwrap_or(0))
            .with_variable("API_KEY", self.api_key.as_deref().unwrap_or(CONTAINER_PASSWORD))
    }

    fn env_values(&self) -> ConfigValues {
        let mut env = ConfigValues::new();
        env.insert("SCOUT_DRIVER".into(), Value::from(self.driver.as_str()));

        let entries: Vec<(&str, Option<String>)> = match self.driver {
            SearchDriver::Collection | SearchDriver::Database => Vec::new(),
            SearchDriver::Meilisearch => vec![
                ("MEILISEARCH_HOST", self.http_url()),
                ("MEILISEARCH_KEY", self.api_key.clone()),
            ],
            SearchDriver::Typesense => vec![
                ("TYPESENSE_HOST", self.host.clone()),
                ("TYPESENSE_PORT", self.port.map(|p| p.to_string())),
                ("TYPESENSE_API_KEY", self.api_key.clone()),
            ],
            SearchDriver::Elasticsearch => vec![
                ("ELASTICSEARCH_HOST", self.http_url()),
                ("ELASTICSEARCH_API_KEY", self.api_key.clone()),
            ],
            SearchDriver::Opensearch => vec![
                ("OPENSEARCH_HOST", self.endpoint.clone()),
                ("AWS_DEFAULT_REGION", self.region.clone()),
            ],
        };
        for (key, value) in entries {
            if let Some(value) = value {
                env.insert(key.into(), Value::from(value));
            }
        }
        env
    }

    fn endpoint(&self) -> String {
        match self.driver {
            SearchDriver::Collection | SearchDriver::Database => {
                format!("in-app ({})", self.driver)
            }
            SearchDriver::Opensearch => match (&self.endpoint, &self.region) {
                (Some(endpoint), _) => endpoint.clone(),
                (None, Some(region)) => format!("opensearch ({region})"),
                (None, None) => "opensearch".to_string(),
            },
            _ => host_port(self.host.as_ref(), self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::field_map;

    fn ctx() -> ProvisionContext {
        ProvisionContext::new("shop")
    }

    #[test]
    fn opensearch_is_cloud_managed() {
        let cfg = SearchConfig::from_mapping(&field_map([("driver", "opensearch")])).unwrap();
        assert!(cfg.needs_backend());
        assert_eq!(cfg.container_service(), None);

        let local = cfg.with_local_defaults(&ctx());
        assert_eq!(local.region(), Some(DEFAULT_REGION));
        assert_eq!(local.host(), None);
    }

    #[test]
    fn local_defaults_per_engine() {
        let cases = [
            (SearchDriver::Meilisearch, 7700),
            (SearchDriver::Typesense, 8108),
            (SearchDriver::Elasticsearch, 9200),
        ];
        for (driver, port) in cases {
            let cfg = SearchConfig::new(driver).with_local_defaults(&ctx());
            assert_eq!(cfg.host(), Some(LOCAL_HOST), "{driver}");
            assert_eq!(cfg.port(), Some(port), "{driver}");
        }
    }

    #[test]
    fn typesense_container_gets_api_key() {
        let cfg = SearchConfig::new(SearchDriver::Typesense).with_container_endpoint(&ctx());
        assert_eq!(cfg.host(), Some("typesense"));
        assert_eq!(cfg.api_key(), Some(CONTAINER_PASSWORD));
        assert_eq!(cfg.env_values()["TYPESENSE_API_KEY"], CONTAINER_PASSWORD);
    }

    #[test]
    fn meilisearch_env_host_is_a_url() {
        let env = SearchConfig::new(SearchDriver::Meilisearch)
            .with_container_endpoint(&ctx())
            .env_values();
        assert_eq!(env["SCOUT_DRIVER"], "meilisearch");
        assert_eq!(env["MEILISEARCH_HOST"], "http://meilisearch:7700");
        assert!(!env.contains_key("MEILISEARCH_KEY"));
    }

    #[test]
    fn mapping_round_trips() {
        let cfg = SearchConfig::new(SearchDriver::Opensearch)
            .with_region("eu-west-1")
            .with_endpoint("https://search.example.com")
            .with_api_key("k");
        assert_eq!(SearchConfig::from_mapping(&cfg.to_mapping()).unwrap(), cfg);
    }
}
