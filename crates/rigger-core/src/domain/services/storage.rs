//! Object storage record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    BackendKind, CONTAINER_PASSWORD, CONTAINER_USERNAME, DEFAULT_REGION, FieldMap, LOCAL_HOST,
    ProvisionContext, Readiness, ServiceConfig,
    fields::{FieldReader, FieldWriter},
    host_port, or_default,
};
use crate::domain::{config_ops::ConfigValues, error::DomainError, manifest::RenderVariables};

/// MinIO web console port inside the container.
pub const MINIO_CONSOLE_PORT: u16 = 8900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    Local,
    Minio,
    S3,
}

impl StorageDriver {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Minio => "minio",
            Self::S3 => "s3",
        }
    }

    pub const fn default_port(&self) -> Option<u16> {
        match self {
            Self::Minio => Some(9000),
            Self::Local | Self::S3 => None,
        }
    }
}

impl fmt::Display for StorageDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageDriver {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "minio" => Ok(Self::Minio),
            "s3" => Ok(Self::S3),
            other => Err(DomainError::invalid(
                "driver",
                other,
                "expected local, minio or s3",
            )),
        }
    }
}

/// Object storage settings. `username`/`password` are the access key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    driver: StorageDriver,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    bucket: Option<String>,
    region: Option<String>,
    endpoint: Option<String>,
    console_port: Option<u16>,
    docker: bool,
    readiness: Readiness,
}

impl StorageConfig {
    pub fn new(driver: StorageDriver) -> Self {
        Self {
            driver,
            host: None,
            port: None,
            username: None,
            password: None,
            bucket: None,
            region: None,
            endpoint: None,
            console_port: None,
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

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.username = Some(access_key.into());
        self.password = Some(secret_key.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
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

    pub fn driver(&self) -> StorageDriver {
        self.driver
    }
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
    pub fn port(&self) -> Option<u16> {
        self.port
    }
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }
    pub fn console_port(&self) -> Option<u16> {
        self.console_port
    }
    pub fn is_docker(&self) -> bool {
        self.docker
    }

    /// Explicit endpoint, else one derived from host and port.
    fn resolved_endpoint(&self) -> Option<String> {
        if self.endpoint.is_some() {
            return self.endpoint.clone();
        }
        match (&self.host, self.port) {
            (Some(host), Some(port)) => Some(format!("http://{host}:{port}")),
            _ => None,
        }
    }
}

impl ServiceConfig for StorageConfig {
    const KIND: BackendKind = BackendKind::Storage;

    fn from_mapping(map: &FieldMap) -> Result<Self, DomainError> {
        let fields = FieldReader::new(map);
        fields.require_all(&["driver"])?;

        Ok(Self {
            driver: fields.parse("driver")?,
            host: fields.string("host"),
            port: fields.port("port")?,
            username: fields.string("username"),
            password: fields.string("password"),
            bucket: fields.string("bucket"),
            region: fields.string("region"),
            endpoint: fields.string("endpoint"),
            console_port: fields.port("console_port")?,
            docker: fields.flag("docker")?,
            readiness: fields.optional("readiness")?.unwrap_or_default(),
        })
    }

    fn to_mapping(&self) -> FieldMap {
        FieldWriter::default()
            .put("driver", self.driver)
            .put_opt("host", self.host.as_ref())
            .put_opt("port", self.port.as_ref())
            .put_opt("username", self.username.as_ref())
            .put_opt("password", self.password.as_ref())
            .put_opt("bucket", self.bucket.as_ref())
            .put_opt("region", self.region.as_ref())
            .put_opt("endpoint", self.endpoint.as_ref())
            .put_opt("console_port", self.console_port.as_ref())
            .put("docker", self.docker)
            .put_opt("readiness", self.readiness.serialized().as_ref())
            .finish()
    }

    fn driver_name(&self) -> &'static str {
        self.driver.as_str()
    }

    fn needs_backend(&self) -> bool {
        self.driver != StorageDriver::Local
    }

    fn wants_container(&self) -> bool {
        self.docker
    }

    fn container_service(&self) -> Option<&'static str> {
        match self.driver {
            StorageDriver::Minio => Some("minio"),
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

    fn with_container_endpoint(&self, ctx: &ProvisionContext) -> Self {
        Self {
            host: self
                .container_service()
                .and_then(|service| or_default(&self.host, service)),
            port: self.port.or(self.driver.default_port()),
            username: or_default(&self.username, CONTAINER_USERNAME),
            password: or_default(&self.password, CONTAINER_PASSWORD),
            bucket: or_default(&self.bucket, ctx.slug()),
            console_port: Some(MINIO_CONSOLE_PORT),
            docker: true,
            ..self.clone()
        }
    }

    fn with_local_defaults(&self, ctx: &ProvisionContext) -> Self {
        match self.driver {
            StorageDriver::Local => Self {
                docker: false,
                ..self.clone()
            },
            StorageDriver::Minio => Self {
                host: or_default(&self.host, LOCAL_HOST),
                port: self.port.or(self.driver.default_port()),
                username: or_default(&self.username, "minioadmin"),
                password: or_default(&self.password, "minioadmin"),
                bucket: or_default(&self.bucket, ctx.slug()),
                docker: false,
                readiness: Readiness::NotChecked,
                ..self.clone()
            },
            StorageDriver::S3 => Self {
                region: or_default(&self.region, DEFAULT_REGION),
                bucket: or_default(&self.bucket, ctx.slug()),
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
            .with_variable("USERNAME", self.username.as_deref().unwrap_or(CONTAINER_USERNAME))
            .with_variable("PASSWORD", self.password.as_deref().unwrap_or(CONTAINER_PASSWORD))
            .with_variable("BUCKET", self.bucket.as_deref().unwrap_or(ctx.slug()))
            .with_variable(
                "CONSOLE_PORT",
                self.console_port.unwrap_or(MINIO_CONSOLE_PORT),
            )
    }

    fn env_values(&self) -> ConfigValues {
        let mut env = ConfigValues::new();
        if self.driver == StorageDriver::Local {
            env.insert("FILESYSTEM_DISK".into(), Value::from("local"));
            return env;
        }
        env.insert("FILESYSTEM_DISK".into(), Value::from("s3"));

        let path_style = (self.driver == StorageDriver::Minio).then(|| "true".to_string());
        let entries = [
            ("AWS_ACCESS_KEY_ID", self.username.clone()),
            ("AWS_SECRET_ACCESS_KEY", self.password.clone()),
            ("AWS_DEFAULT_REGION", self.region.clone()),
            ("AWS_BUCKET", self.bucket.clone()),
            ("AWS_ENDPOINT", self.resolved_endpoint()),
            ("AWS_USE_PATH_STYLE_ENDPOINT", path_style),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                env.insert(key.into(), Value::from(value));
            }
        }
        env
    }

    fn endpoint(&self) -> String {
        match self.driver {
            StorageDriver::Local => "storage/app".to_string(),
            StorageDriver::S3 => match (&self.bucket, &self.region) {
                (Some(bucket), Some(region)) => format!("s3://{bucket} ({region})"),
                (Some(bucket), None) => format!("s3://{bucket}"),
                _ => "s3".to_string(),
            },
            StorageDriver::Minio => host_port(self.host.as_ref(), self.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::field_map;

    fn ctx() -> ProvisionContext {
        ProvisionContext::new("Shop Front")
    }

    #[test]
    fn local_disk_is_a_no_op() {
        let cfg = StorageConfig::new(StorageDriver::Local);
        assert!(!cfg.needs_backend());
        assert_eq!(cfg.env_values().len(), 1);
    }

    #[test]
    fn minio_local_defaults() {
        let cfg = StorageConfig::new(StorageDriver::Minio).with_local_defaults(&ctx());
        assert_eq!(cfg.host(), Some(LOCAL_HOST));
        assert_eq!(cfg.port(), Some(9000));
        assert_eq!(cfg.username(), Some("minioadmin"));
        assert_eq!(cfg.bucket(), Some("shop-front"));
        assert_eq!(cfg.console_port(), None);
    }

    #[test]
    fn minio_container_sets_console_port() {
        let cfg = StorageConfig::new(StorageDriver::Minio)
            .with_bucket("assets")
            .with_container_endpoint(&ctx());

        assert_eq!(cfg.host(), Some("minio"));
        assert_eq!(cfg.console_port(), Some(MINIO_CONSOLE_PORT));
        assert_eq!(cfg.bucket(), Some("assets"));
        assert_eq!(cfg.password(), Some(CONTAINER_PASSWORD));
    }

    #[test]
    fn s3_local_defaults_fill_region_and_bucket() {
        let cfg = StorageConfig::new(StorageDriver::S3).with_local_defaults(&ctx());
        assert_eq!(cfg.region(), Some(DEFAULT_REGION));
        assert_eq!(cfg.bucket(), Some("shop-front"));
        assert_eq!(cfg.container_service(), None);
    }

    #[test]
    fn minio_env_uses_path_style_endpoint() {
        let env = StorageConfig::new(StorageDriver::Minio)
            .with_container_endpoint(&ctx())
            .env_values();
        assert_eq!(env["FILESYSTEM_DISK"], "s3");
        assert_eq!(env["AWS_ENDPOINT"], "http://minio:9000");
        assert_eq!(env["AWS_USE_PATH_STYLE_ENDPOINT"], "true");
    }

    #[test]
    fn console_port_rejects_garbage() {
        let err = StorageConfig::from_mapping(&field_map([
            ("driver", "minio"),
            ("console_port", "99999"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidField {
                field: "console_port",
                ..
            }
        ));
    }

    #[test]
    fn mapping_round_trips() {
        let cfg = StorageConfig::new(StorageDriver::Minio)
            .with_container_endpoint(&ctx())
            .with_readiness(Readiness::Assumed);
        assert_eq!(StorageConfig::from_mapping(&cfg.to_mapping()).unwrap(), cfg);
    }
}
