//! Compose fragments shipped with rigger, one per container service key.
//!
//! Each fragment declares its service, a named volume where the image keeps
//! state, and the shared `rigger` bridge network, so fragments compose
//! additively into one manifest.

pub(crate) const MYSQL: &str = "\
services:
  mysql:
    image: 'mysql/mysql-server:8.0'
    ports:
      - '{{PORT}}:3306'
    environment:
      MYSQL_ROOT_PASSWORD: '{{PASSWORD}}'
      MYSQL_ROOT_HOST: '%'
      MYSQL_DATABASE: '{{DATABASE}}'
      MYSQL_USER: '{{USERNAME}}'
      MYSQL_PASSWORD: '{{PASSWORD}}'
    volumes:
      - '{{PROJECT_SLUG}}-mysql:/var/lib/mysql'
    networks:
      - rigger
volumes:
  {{PROJECT_SLUG}}-mysql:
    driver: local
networks:
  rigger:
    driver: bridge
";

pub(crate) const MARIADB: &str = "\
services:
  mariadb:
    image: 'mariadb:11'
    ports:
      - '{{PORT}}:3306'
    environment:
      MARIADB_ROOT_PASSWORD: '{{PASSWORD}}'
      MARIADB_ROOT_HOST: '%'
      MARIADB_DATABASE: '{{DATABASE}}'
      MARIADB_USER: '{{USERNAME}}'
      MARIADB_PASSWORD: '{{PASSWORD}}'
    volumes:
      - '{{PROJECT_SLUG}}-mariadb:/var/lib/mysql'
    networks:
      - rigger
volumes:
  {{PROJECT_SLUG}}-mariadb:
    driver: local
networks:
  rigger:
    driver: bridge
";

pub(crate) const PGSQL: &str = "\
services:
  pgsql:
    image: 'postgres:17'
    ports:
      - '{{PORT}}:5432'
    environment:
      PGPASSWORD: '{{PASSWORD}}'
      POSTGRES_DB: '{{DATABASE}}'
      POSTGRES_USER: '{{USERNAME}}'
      POSTGRES_PASSWORD: '{{PASSWORD}}'
    volumes:
      - '{{PROJECT_SLUG}}-pgsql:/var/lib/postgresql/data'
    networks:
      - rigger
volumes:
  {{PROJECT_SLUG}}-pgsql:
    driver: local
networks:
  rigger:
    driver: bridge
";

pub(crate) const SQLSRV: &str = "\
services:
  sqlsrv:
    image: 'mcr.microsoft.com/mssql/server:2022-latest'
    ports:
      - '{{PORT}}:1433'
    environment:
      ACCEPT_EULA: 'Y'
      MSSQL_SA_PASSWORD: '{{PASSWORD}}'
    volumes:
      - '{{PROJECT_SLUG}}-sqlsrv:/var/opt/mssql'
    networks:
      - rigger
volumes:
  {{PROJECT_SLUG}}-sqlsrv:
    driver: local
networks:
  rigger:
    driver: bridge
";

pub(crate) const REDIS: &str = "\
services:
  redis:
    image: 'redis:alpine'
    ports:
      - '{{PORT}}:6379'
    volumes:
      - '{{PROJECT_SLUG}}-redis:/data'
    networks:
      - rigger
volumes:
  {{PROJECT_SLUG}}-redis:
    driver: local
networks:
  rigger:
    driver: bridge
";

pub(crate) const MEMCACHED: &str = "\
services:
  memcached:
    image: 'memcached:alpine'
    ports:
      - '{{PORT}}:11211'
    networks:
      - rigger
networks:
  rigger:
    driver: bridge
";

pub(crate) const RABBITMQ: &str = "\
services:
  rabbitmq:
    image: 'rabbitmq:4-management-alpine'
    ports:
      - '{{PORT}}:5672'
      - '{{MANAGEMENT_PORT}}:15672'
    environment:
      RABBITMQ_DEFAULT_USER: '{{USERNAME}}'
      RABBITMQ_DEFAULT_PASS: '{{PASSWORD}}'
      RABBITMQ_DEFAULT_VHOST: '{{VHOST}}'
    volumes:
      - '{{PROJECT_SLUG}}-rabbitmq:/var/lib/rabbitmq'
    networks:
      - rigger
volumes:
  {{PROJECT_SLUG}}-rabbitmq:
    driver: local
networks:
  rigger:
    driver: bridge
";

pub(crate) const MEILISEARCH: &str = "\
services:
  meilisearch:
    image: 'getmeili/meilisearch:latest'
    ports:
      - '{{PORT}}:7700'
    environment:
      MEILI_NO_ANALYTICS: 'true'
    volumes:
      - '{{PROJECT_SLUG}}-meilisearch:/meili_data'
    networks:
      - rigger
volumes:
  {{PROJECT_SLUG}}-meilisearch:
    driver: local
networks:
  rigger:
    driver: bridge
";

pub(crate) const TYPESENSE: &str = "\
services:
  typesense:
    image: 'typesense/typesense:27.1'
    ports:
      - '{{PORT}}:8108'
    environment:
      TYPESENSE_DATA_DIR: '/typesense-data'
      TYPESENSE_API_KEY: '{{API_KEY}}'
      TYPESENSE_ENABLE_CORS: 'true'
    volumes:
      - '{{PROJECT_SLUG}}-typesense:/typesense-data'
    networks:
      - rigger
volumes:
  {{PROJECT_SLUG}}-typesense:
    driver: local
networks:
  rigger:
    driver: bridge
";

pub(crate) const ELASTICSEARCH: &str = "\
services:
  elasticsearch:
    image: 'docker.elastic.co/elasticsearch/elasticsearch:8.15.0'
    ports:
      - '{{PORT}}:9200'
    environment:
      discovery.type: 'single-node'
      xpack.security.enabled: 'false'
    volumes:
      - '{{PROJECT_SLUG}}-elasticsearch:/usr/share/elasticsearch/data'
    networks:
      - rigger
volumes:
  {{PROJECT_SLUG}}-elasticsearch:
    driver: local
networks:
  rigger:
    driver: bridge
";

pub(crate) const MINIO: &str = "\
services:
  minio:
    image: 'minio/minio:latest'
    ports:
      - '{{PORT}}:9000'
      - '{{CONSOLE_PORT}}:{{CONSOLE_PORT}}'
    environment:
      MINIO_ROOT_USER: '{{USERNAME}}'
      MINIO_ROOT_PASSWORD: '{{PASSWORD}}'
    command: 'minio server /data/minio --console-address \":{{CONSOLE_PORT}}\"'
    volumes:
      - '{{PROJECT_SLUG}}-minio:/data/minio'
    networks:
      - rigger
volumes:
  {{PROJECT_SLUG}}-minio:
    driver: local
networks:
  rigger:
    driver: bridge
";

/// `(service key, fragment)` for every built-in fragment.
pub(crate) const ALL: [(&str, &str); 11] = [
    ("mysql", MYSQL),
    ("mariadb", MARIADB),
    ("pgsql", PGSQL),
    ("sqlsrv", SQLSRV),
    ("redis", REDIS),
    ("memcached", MEMCACHED),
    ("rabbitmq", RABBITMQ),
    ("meilisearch", MEILISEARCH),
    ("typesense", TYPESENSE),
    ("elasticsearch", ELASTICSEARCH),
    ("minio", MINIO),
];
