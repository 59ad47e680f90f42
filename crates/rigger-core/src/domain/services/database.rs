//! Relational datastore record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    BackendKind, CONTAINER_PASSWORD, CONTAINER_USERNAME, FieldMap, LOCAL_HOST, ProvisionContext,
    Readiness, ServiceConfig,
    fields::{FieldReader, FieldWriter},
    host_port, or_default,
};
use crate::domain::{config_ops::ConfigValues, error::DomainError, manifest::RenderVariables};

/// Supported relational drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    Sqlite,
    Mysql,
    Mariadb,
    Pgsql,
    Sqlsrv,
}

impl DatabaseDriver {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Mysql => "mysql",
            Self::Mariadb => "mariadb",
            Self::Pgsql => "pgsql",
            Self::Sqlsrv => "sqlsrv",
        }
    }

    pub const fn default_port(&self) -> Option<u16> {
        match self {
            Self::Sqlite => None,
            Self::Mysql | Self::Mariadb => Some(3306),
            Self::Pgsql => Some(5432),
            Self::Sqlsrv => Some(1433),
        }
    }

    const fn local_username(&self) -> Option<&'static str> {
        match self {
            Self::Sqlite => None,
            Self::Mysql | Self::Mariadb => Some("root"),
            Self::Pgsql => Some("postgres"),
            Self::Sqlsrv => Some("sa"),
        }
    }
}

impl fmt::Display for DatabaseDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseDriver {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "mysql" => Ok(Self::Mysql),
            "mariadb" => Ok(Self::Mariadb),
            "pgsql" | "postgres" | "postgresql" => Ok(Self::Pgsql),
            "sqlsrv" | "mssql" => Ok(Self::Sqlsrv),
            other => Err(DomainError::invalid(
                "driver",
                other,
                "expected sqlite, mysql, mariadb, pgsql or sqlsrv",
            )),
        }
    }
}

/// Connection settings for the application's relational database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    driver: DatabaseDriver,
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    connection: Option<String>,
    docker: bool,
    readiness: Readiness,
}

impl DatabaseConfig {
    pub fn new(driver: DatabaseDriver) -> Self {
        Self {
            driver,
            host: None,
            port: None,
            database: None,
            username: None,
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

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
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

    pub fn with_connection(mut self, alias: impl Into<String>) -> Self {
        self.connection = Some(alias.into());
        self
    }

    pub fn with_docker(mut self, docker: bool) -> Self {
        self.docker = docker;
        self
    }

    pub fn driver(&self) -> DatabaseDriver {
        self.driver
    }
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
    pub fn port(&self) -> Option<u16> {
        self.port
    }
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
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

impl ServiceConfig for DatabaseConfig {
    const KIND: BackendKind = BackendKind::Database;

    fn from_mapping(map: &FieldMap) -> Result<Self, DomainError> {
        let fields = FieldReader::new(map);
        fields.require_all(&["driver"])?;

        Ok(Self {
            driver: fields.parse("driver")?,
            host: fields.string("host"),
            port: fields.port("port")?,
            database: fields.string("database"),
            username: fields.string("username"),
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
            .put_opt("database", self.database.as_ref())
            .put_opt("username", self.username.as_ref())
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
        self.driver != DatabaseDriver::Sqlite
    }

    fn wants_container(&self) -> bool {
        self.docker
    }

    fn container_service(&self) -> Option<&'static str> {
        match self.driver {
            DatabaseDriver::Sqlite => None,
            other => Some(other.as_str()),
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
            driver: self.driver,
            host: self
                .container_service()
                .and_then(|service| or_default(&self.host, service)),
            port: self.port.or(self.driver.default_port()),
            database: or_default(&self.database, ctx.slug()),
            username: or_default(&self.username, CONTAINER_USERNAME),
            password: or_default(&self.password, CONTAINER_PASSWORD),
            connection: self.connection.clone(),
            docker: true,
            readiness: self.readiness,
        }
    }

    fn with_local_defaults(&self, ctx: &ProvisionContext) -> Self {
        if self.driver == DatabaseDriver::Sqlite {
            return Self {
                docker: false,
                ..self.clone()
            };
        }

        Self {
            driver: self.driver,
            host: or_default(&self.host, LOCAL_HOST),
            port: self.port.or(self.driver.default_port()),
            database: or_default(&self.database, ctx.slug()),
            username: self
                .username
                .clone()
                .or(self.driver.local_username().map(str::to_string)),
            password: or_default(&self.password, ""),
            connection: self.connection.clone(),
            docker: false,
            readiness: Readiness::NotChecked,
        }
    }

    fn manifest_variables(&self, ctx: &ProvisionContext) -> RenderVariables {
        let service = self.container_service().unwrap_or(self.driver.as_str());
        RenderVariables::new(ctx.slug(), service)
            .with_variable("PORT", self.port.or(self.driver.default_port()).unwrap_or(0))
            .with_variable("DATABASE", self.database.as_deref().unwrap_or(ctx.slug()))
            .with_variable("USERNAME", self.username.as_deref().unwrap_or(CONTAINER_USERNAME))
            .with_variable("PASSWORD", self.password.as_deref().unwrap_or(CONTAINER_PASSWORD))
    }

    fn env_values(&self) -> ConfigValues {
        let mut env = ConfigValues::new();
        env.insert("DB_CONNECTION".into(), Value::from(self.driver.as_str()));
        if self.driver == DatabaseDriver::Sqlite {
            return env;
        }
        let entries = [
            ("DB_HOST", self.host.clone()),
            ("DB_PORT", self.port.map(|p| p.to_string())),
            ("DB_DATABASE", self.database.clone()),
            ("DB_USERNAME", self.username.clone()),
            ("DB_PASSWORD", self.password.clone()),
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
            DatabaseDriver::Sqlite => "database/database.sqlite".to_string(),
            _ => host_port(self.host.as_ref(), self.port),
        }
    }
}
