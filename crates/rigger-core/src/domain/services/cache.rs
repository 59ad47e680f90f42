//! Cache store record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    BackendKind, FieldMap, LOCAL_HOST, ProvisionContext, Readiness, ServiceConfig,
    fields::{FieldReader, FieldWriter},
    host_port, or_default,
};
use crate::domain::{config_ops::ConfigValues, error::DomainError, manifest::RenderVariables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheDriver {
    Array,
    File,
    Database,
    Redis,
    Memcached,
}

impl CacheDriver {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::File => "file",
            Self::Database => "database",
            Self::Redis => "redis",
            Self::Memcached => "memcached",
        }
    }

    pub const fn default_port(&self) -> Option<u16> {
        match self {
            Self::Redis => Some(6379),
            Self::Memcached => Some(11211),
            Self::Array | Self::File | Self::Database => None,
        }
    }
}

impl fmt::Display for CacheDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheDriver {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "array" => Ok(Self::Array),
            "file" => Ok(Self::File),
            "database" => Ok(Self::Database),
            "redis" => Ok(Self::Redis),
            "memcached" => Ok(Self::Memcached),
            other => Err(DomainError::invalid(
                "driver",
                other,
                "expected array, file, database, redis or memcached",
            )),
        }
    }
}

/// Cache store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    driver: CacheDriver,
    host: Option<String>,
    port: Option<u16>,
    password: Option<String>,
    connection: Option<String>,
    docker: bool,
    readiness: Readiness,
}

impl CacheConfig {
    pub fn new(driver: CacheDriver) -> Self {
        Self {
            driver,
            host: None,
            port: None,
            password: None,
            connection: None,
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

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_connection(mut self, alias: impl Into<String>) -> Self {
        self.connection = Some(alias.into());
        self
    }

    pub fn with_docker(mut self, docker: bool) -> Self {
        self.docker = docker;
        self
    }

    pub fn driver(&self) -> CacheDriver {
        self.driver
    }
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
    pub fn port(&self) -> Option<u16> {
        self.port
    }
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }
    pub fn is_docker(&self) -> bool {
        self.docker
    }
}

impl ServiceConfig for CacheConfig {
    const KIND: BackendKind = BackendKind::Cache;

    fn from_mapping(map: &FieldMap) -> Result<Self, DomainError> {
        let fields = FieldReader::new(map);
        fields.require_all(&["driver"])?;

        Ok(Self {
            driver: fields.parse("driver")?,
            host: fields.string("host"),
            port: fields.port("port")?,
            password: fields.string("password"),
            connection: fields.string("connection"),
            docker: fields.flag("docker")?,
            readiness: fields.optional("readiness")?.unwrap_or_default(),
        })
    }

    fn to_mapping(&self) -> FieldMap {
        FieldWriter::default()
            .put("driver", self.driver)
            .put_opt("host", self.host.as_ref())
            .put_opt("port", self.port.as_ref())
            .put_opt("password", self.password.as_ref())
            .put_opt("connection", self.connection.as_ref())
            .put("docker", self.docker)
            .put_opt("readiness", self.readiness.serialized().as_ref())
            .finish()
    }

    fn driver_name(&self) -> &'static str {
        self.driver.as_str()
    }

    fn needs_backend(&self) -> bool {
        matches!(self.driver, CacheDriver::Redis | CacheDriver::Memcached)
    }

    fn wants_container(&self) -> bool {
        self.docker
    }

    fn container_service(&self) -> Option<&'static str> {
        match self.driver {
            CacheDriver::Redis | CacheDriver::Memcached => Some(self.driver.as_str()),
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
        Self {
            host: self
                .container_service()
                .and_then(|service| or_default(&self.host, service)),
            port: self.port.or(self.driver.default_port()),
            docker: true,
            ..self.clone()
        }
    }

    fn with_local_defaults(&self, _ctx: &ProvisionContext) -> Self {
        if !self.needs_backend() {
            return Self {
                docker: false,
                ..self.clone()
            };
        }

        Self {
            host: or_default(&self.host, LOCAL_HOST),
            port: self.port.or(self.driver.default_port()),
            docker: false,
            readiness: Readiness::NotChecked,
            ..self.clone()
        }
    }

    fn manifest_variables(&self, ctx: &ProvisionContext) -> RenderVariables {
        let service = self.container_service().unwrap_or(self.driver.as_str());
        RenderVariables::new(ctx.slug(), service)
            .with_variable("PORT", self.port.or(self.driver.default_port()).unwrap_or(0))
    }

    fn env_values(&self) -> ConfigValues {
        let mut env = ConfigValues::new();
        env.insert("CACHE_STORE".into(), Value::from(self.driver.as_str()));

        let prefix = match self.driver {
            CacheDriver::Redis => "REDIS",
            CacheDriver::Memcached => "MEMCACHED",
            _ => return env,
        };
        if let Some(host) = &self.host {
            env.insert(format!("{prefix}_HOST"), Value::from(host.as_str()));
        }
        if let Some(port) = self.port {
            env.insert(format!("{prefix}_PORT"), Value::from(port.to_string()));
        }
        if let Some(password) = &self.password {
            env.insert(format!("{prefix}_PASSWORD"), Value::from(password.as_str()));
        }
        env
    }

    fn endpoint(&self) -> String {
        match self.driver {
            CacheDriver::Array | CacheDriver::File | CacheDriver::Database => {
                format!("in-app ({})", self.driver)
            }
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
    fn unknown_driver_is_invalid() {
        let err = CacheConfig::from_mapping(&field_map([("driver", "dynamodb")])).unwrap_err();
        assert!(matches!(err, DomainError::InvalidField { field: "driver", .. }));
    }

    #[test]
    fn mapping_round_trips() {
        let cfg = CacheConfig::new(CacheDriver::Redis)
            .with_host("cache")
            .with_port(6380)
            .with_password("s3cret")
            .with_connection("cache")
            .with_docker(true);

        assert_eq!(CacheConfig::from_mapping(&cfg.to_mapping()).unwrap(), cfg);
    }

    #[test]
    fn local_redis_defaults_to_6379() {
        let cfg = CacheConfig::new(CacheDriver::Redis).with_local_defaults(&ctx());
        assert_eq!(cfg.host(), Some(LOCAL_HOST));
        assert_eq!(cfg.port(), Some(6379));
    }

    #[test]
    fn memcached_container_endpoint() {
        let cfg = CacheConfig::new(CacheDriver::Memcached)
            .with_port(11311)
            .with_container_endpoint(&ctx());
        assert_eq!(cfg.host(), Some("memcached"));
        assert_eq!(cfg.port(), Some(11311));
        assert!(cfg.is_docker());
    }

    #[test]
    fn file_cache_is_in_process() {
        let cfg = CacheConfig::new(CacheDriver::File);
        assert!(!cfg.needs_backend());
        assert_eq!(cfg.container_service(), None);
        assert_eq!(cfg.endpoint(), "in-app (file)");
    }

    #[test]
    fn env_values_use_driver_prefix() {
        let env = CacheConfig::new(CacheDriver::Redis)
            .with_local_defaults(&ctx())
            .env_values();
        assert_eq!(env["CACHE_STORE"], "redis");
        assert_eq!(env["REDIS_PORT"], "6379");
        assert!(!env.contains_key("REDIS_PASSWORD"));
    }
}
