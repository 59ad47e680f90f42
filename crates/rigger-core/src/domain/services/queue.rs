//! Message queue record.

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

/// RabbitMQ management UI port inside the container.
pub const RABBITMQ_MANAGEMENT_PORT: u16 = 15672;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueDriver {
    Sync,
    Database,
    Redis,
    Rabbitmq,
    Sqs,
}

impl QueueDriver {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Database => "database",
            Self::Redis => "redis",
            Self::Rabbitmq => "rabbitmq",
            Self::Sqs => "sqs",
        }
    }

    pub const fn default_port(&self) -> Option<u16> {
        match self {
            Self::Redis => Some(6379),
            Self::Rabbitmq => Some(5672),
            Self::Sync | Self::Database | Self::Sqs => None,
        }
    }
}

impl fmt::Display for QueueDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueDriver {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(Self::Sync),
            "database" => Ok(Self::Database),
            "redis" => Ok(Self::Redis),
            "rabbitmq" | "amqp" => Ok(Self::Rabbitmq),
            "sqs" => Ok(Self::Sqs),
            other => Err(DomainError::invalid(
                "driver",
                other,
                "expected sync, database, redis, rabbitmq or sqs",
            )),
        }
    }
}

/// Queue connection settings.
///
/// `vhost` and `management_port` only mean something for RabbitMQ;
/// `region` and `endpoint` only for SQS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    driver: QueueDriver,
    host: Option<String>,
    port: Option<u16>,
    username: Option<String>,
    password: Option<String>,
    vhost: Option<String>,
    management_port: Option<u16>,
    region: Option<String>,
    endpoint: Option<String>,
    docker: bool,
    readiness: Readiness,
}

impl QueueConfig {
    pub fn new(driver: QueueDriver) -> Self {
        Self {
            driver,
            host: None,
            port: None,
            username: None,
            password: None,
            vhost: None,
            management_port: None,
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

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_vhost(mut self, vhost: impl Into<String>) -> Self {
        self.vhost = Some(vhost.into());
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

    pub fn driver(&self) -> QueueDriver {
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
    pub fn vhost(&self) -> Option<&str> {
        self.vhost.as_deref()
    }
    pub fn management_port(&self) -> Option<u16> {
        self.management_port
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
}

impl ServiceConfig for QueueConfig {
    const KIND: BackendKind = BackendKind::Queue;

    fn from_mapping(map: &FieldMap) -> Result<Self, DomainError> {
        let fields = FieldReader::new(map);
        fields.require_all(&["driver"])?;

        Ok(Self {
            driver: fields.parse("driver")?,
            host: fields.string("host"),
            port: fields.port("port")?,
            username: fields.string("username"),
            password: fields.string("password"),
            vhost: fields.string("vhost"),
            management_port: fields.port("management_port")?,
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
            .put_opt("username", self.username.as_ref())
            .put_opt("password", self.password.as_ref())
            .put_opt("vhost", self.vhost.as_ref())
            .put_opt("management_port", self.management_port.as_ref())
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
        matches!(
            self.driver,
            QueueDriver::Redis | QueueDriver::Rabbitmq | QueueDriver::Sqs
        )
    }

    fn wants_container(&self) -> bool {
        self.docker
    }

    fn container_service(&self) -> Option<&'static str> {
        match self.driver {
            QueueDriver::Redis | QueueDriver::Rabbitmq => Some(self.driver.as_str()),
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
        let host = self
            .container_service()
            .and_then(|service| or_default(&self.host, service));
        let port = self.port.or(self.driver.default_port());

        match self.driver {
            QueueDriver::Rabbitmq => Self {
                host,
                port,
                username: or_default(&self.username, CONTAINER_USERNAME),
                password: or_default(&self.password, CONTAINER_PASSWORD),
                vhost: or_default(&self.vhost, "/"),
                management_port: Some(RABBITMQ_MANAGEMENT_PORT),
                docker: true,
                ..self.clone()
            },
            _ => Self {
                host,
                port,
                docker: true,
                ..self.clone()
            },
        }
    }

    fn with_local_defaults(&self, _ctx: &ProvisionContext) -> Self {
        let base = Self {
            docker: false,
            readiness: Readiness::NotChecked,
            ..self.clone()
        };

        match self.driver {
            QueueDriver::Sync | QueueDriver::Database => Self {
                readiness: self.readiness,
                ..base
            },
            QueueDriver::Redis => Self {
                host: or_default(&self.host, LOCAL_HOST),
                port: self.port.or(self.driver.default_port()),
                ..base
            },
            QueueDriver::Rabbitmq => Self {
                host: or_default(&self.host, LOCAL_HOST),
                port: self.port.or(self.driver.default_port()),
                username: or_default(&self.username, "guest"),
                password: or_default(&self.password, "guest"),
                vhost: or_default(&self.vhost, "/"),
                ..base
            },
            QueueDriver::Sqs => Self {
                region: or_default(&self.region, DEFAULT_REGION),
                ..base
            },
        }
    }

    fn manifest_variables(&self, ctx: &ProvisionContext) -> RenderVariables {
        let service = self.container_service().unwrap_or(self.driver.as_str());
        RenderVariables::new(ctx.slug(), service)
            .with_variable("PORT", self.port.or(self.driver.default_port()).unwrap_or(0))
            .with_variable("USERNAME", self.username.as_deref().unwrap_or(CONTAINER_USERNAME))
            .with_variable("PASSWORD", self.password.as_deref().unwrap_or(CONTAINER_PASSWORD))
            .with_variable("VHOST", self.vhost.as_deref().unwrap_or("/"))
            .with_variable(
                "MANAGEMENT_PORT",
                self.management_port.unwrap_or(RABBITMQ_MANAGEMENT_PORT),
            )
    }

    fn env_values(&self) -> ConfigValues {
        let mut env = ConfigValues::new();
        env.insert("QUEUE_CONNECTION".into(), Value::from(self.driver.as_str()));

        let entries: Vec<(&str, Option<String>)> = match self.driver {
            QueueDriver::Sync | QueueDriver::Database => Vec::new(),
            QueueDriver::Redis => vec![
                ("REDIS_HOST", self.host.clone()),
                ("REDIS_PORT", self.port.map(|p| p.to_string())),
                ("REDIS_PASSWORD", self.password.clone()),
            ],
            QueueDriver::Rabbitmq => vec![
                ("RABBITMQ_HOST", self.host.clone()),
                ("RABBITMQ_PORT", self.port.map(|p| p.to_string())),
                ("RABBITMQ_USER", self.username.clone()),
                ("RABBITMQ_PASSWORD", self.password.clone()),
                ("RABBITMQ_VHOST", self.vhost.clone()),
            ],
            QueueDriver::Sqs => vec![
                ("AWS_DEFAULT_REGION", self.region.clone()),
                ("SQS_PREFIX", self.endpoint.clone()),
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
            QueueDriver::Sync | QueueDriver::Database => format!("in-app ({})", self.driver),
            QueueDriver::Sqs => match (&self.endpoint, &self.region) {
                (Some(endpoint), _) => endpoint.clone(),
                (None, Some(region)) => format!("sqs ({region})"),
                (None, None) => "sqs".to_string(),
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
    fn sync_and_database_are_in_process() {
        for driver in [QueueDriver::Sync, QueueDriver::Database] {
            let cfg = QueueConfig::new(driver);
            assert!(!cfg.needs_backend());
            assert_eq!(cfg.container_service(), None);
        }
    }

    #[test]
    fn sqs_needs_backend_but_has_no_container() {
        let cfg = QueueConfig::new(QueueDriver::Sqs);
        assert!(cfg.needs_backend());
        assert_eq!(cfg.container_service(), None);
    }

    #[test]
    fn management_port_is_coerced() {
        let err = QueueConfig::from_mapping(&field_map([
            ("driver", "rabbitmq"),
            ("management_port", "ui"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            DomainError::InvalidField {
                field: "management_port",
                ..
            }
        ));
    }

    #[test]
    fn mapping_round_trips() {
        let cfg = QueueConfig::new(QueueDriver::Rabbitmq)
            .with_host("broker")
            .with_credentials("app", "secret")
            .with_vhost("/shop")
            .with_docker(true)
            .with_container_endpoint(&ctx())
            .with_readiness(Readiness::Confirmed);

        assert_eq!(QueueConfig::from_mapping(&cfg.to_mapping()).unwrap(), cfg);
    }

    #[test]
    fn rabbitmq_local_defaults() {
        let cfg = QueueConfig::new(QueueDriver::Rabbitmq).with_local_defaults(&ctx());
        assert_eq!(cfg.host(), Some(LOCAL_HOST));
        assert_eq!(cfg.port(), Some(5672));
        assert_eq!(cfg.username(), Some("guest"));
        assert_eq!(cfg.password(), Some("guest"));
        assert_eq!(cfg.vhost(), Some("/"));
        assert_eq!(cfg.management_port(), None);
    }

    #[test]
    fn rabbitmq_container_always_sets_management_port() {
        let cfg = QueueConfig::new(QueueDriver::Rabbitmq)
            .with_vhost("/jobs")
            .with_container_endpoint(&ctx());

        assert_eq!(cfg.host(), Some("rabbitmq"));
        assert_eq!(cfg.management_port(), Some(RABBITMQ_MANAGEMENT_PORT));
        assert_eq!(cfg.vhost(), Some("/jobs"));
        assert_eq!(cfg.username(), Some(CONTAINER_USERNAME));
    }

    #[test]
    fn sqs_local_defaults_fill_region() {
        let cfg = QueueConfig::new(QueueDriver::Sqs).with_local_defaults(&ctx());
        assert_eq!(cfg.region(), Some(DEFAULT_REGION));
        assert_eq!(cfg.host(), None);
        assert_eq!(cfg.env_values()["AWS_DEFAULT_REGION"], DEFAULT_REGION);
    }

    #[test]
    fn redis_env_values() {
        let env = QueueConfig::new(QueueDriver::Redis)
            .with_container_endpoint(&ctx())
            .env_values();
        assert_eq!(env["QUEUE_CONNECTION"], "redis");
        assert_eq!(env["REDIS_HOST"], "redis");
        assert_eq!(env["REDIS_PORT"], "6379");
    }
}
