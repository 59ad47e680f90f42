//! Provisioning through real adapters, with the container engine scripted.

use std::path::Path;
use std::time::Duration;

use rigger_adapters::{
    BuiltinManifestRenderer, FileConfigWriter, LocalFilesystem, MemoryFilesystem,
    RecordingSleeper, ScriptedProcessRunner,
};
use rigger_core::prelude::*;

const PROJECT: &str = "/work/my-shop";

fn manifest_path() -> std::path::PathBuf {
    Path::new(PROJECT).join("docker-compose.yml")
}

fn service(
    runner: &ScriptedProcessRunner,
    fs: &MemoryFilesystem,
    sleeper: &RecordingSleeper,
) -> ProvisioningService {
    ProvisioningService::new(
        Box::new(runner.clone()),
        Box::new(fs.clone()),
        Box::new(BuiltinManifestRenderer::new()),
        Box::new(sleeper.clone()),
    )
}

#[test]
fn two_backends_share_one_manifest() {
    let runner = ScriptedProcessRunner::succeeding();
    let fs = MemoryFilesystem::new();
    let sleeper = RecordingSleeper::new();
    let provisioning = service(&runner, &fs, &sleeper);

    let db = provisioning.provision(
        DatabaseConfig::new(DatabaseDriver::Pgsql).with_docker(true),
        Path::new(PROJECT),
    );
    let cache = provisioning.provision(
        CacheConfig::new(CacheDriver::Redis).with_docker(true),
        Path::new(PROJECT),
    );

    assert_eq!(db.readiness(), Readiness::Confirmed);
    assert_eq!(cache.readiness(), Readiness::Confirmed);
    assert_eq!(db.host(), Some("pgsql"));
    assert_eq!(cache.host(), Some("redis"));

    let text = fs.read_file(&manifest_path()).unwrap();
    let manifest = ComposeManifest::parse(&text).unwrap();
    assert!(manifest.declares_service("pgsql"));
    assert!(manifest.declares_service("redis"));
    assert_eq!(fs.write_count(), 2);

    let ups = runner.calls_with("up");
    assert_eq!(ups.len(), 2);
    assert_eq!(ups[0].argv, ["docker", "compose", "up", "-d", "pgsql"]);
    assert_eq!(ups[0].working_dir, Path::new(PROJECT));
    assert!(sleeper.pauses().is_empty());
}

#[test]
fn provisioning_twice_writes_the_manifest_once() {
    let runner = ScriptedProcessRunner::succeeding();
    let fs = MemoryFilesystem::new();
    let provisioning = service(&runner, &fs, &RecordingSleeper::new());
    let config = CacheConfig::new(CacheDriver::Redis).with_docker(true);

    let first = provisioning.provision(config.clone(), Path::new(PROJECT));
    let second = provisioning.provision(config, Path::new(PROJECT));

    assert_eq!(first, second);
    assert_eq!(fs.write_count(), 1);
}

#[test]
fn missing_engine_falls_back_to_local_installation() {
    let runner = ScriptedProcessRunner::failing();
    let fs = MemoryFilesystem::new();
    let provisioning = service(&runner, &fs, &RecordingSleeper::new());

    let db = provisioning.provision(
        DatabaseConfig::new(DatabaseDriver::Mysql).with_docker(true),
        Path::new(PROJECT),
    );

    assert_eq!(db.host(), Some("127.0.0.1"));
    assert_eq!(db.port(), Some(3306));
    assert_eq!(db.readiness(), Readiness::NotChecked);
    assert!(runner.calls_with("exec").is_empty());
}

#[test]
fn slow_backend_is_polled_until_ready() {
    let runner = ScriptedProcessRunner::succeeding().succeed_after(
        &["docker", "compose", "exec"],
        3,
    );
    let fs = MemoryFilesystem::new();
    let sleeper = RecordingSleeper::new();
    let provisioning = service(&runner, &fs, &sleeper);

    let cache = provisioning.provision(
        CacheConfig::new(CacheDriver::Redis).with_docker(true),
        Path::new(PROJECT),
    );

    assert_eq!(cache.readiness(), Readiness::Confirmed);
    let probes = runner.calls_with("exec");
    assert_eq!(probes.len(), 4);
    assert!(probes.iter().all(|p| p.timeout == Some(Duration::from_secs(2))));
    assert_eq!(sleeper.pauses().len(), 3);
    assert!(sleeper.total() <= Duration::from_secs(6));
}

#[test]
fn backend_that_never_answers_is_assumed_ready() {
    let runner = ScriptedProcessRunner::succeeding().fail_on(&["docker", "compose", "exec"]);
    let fs = MemoryFilesystem::new();
    let sleeper = RecordingSleeper::new();
    let provisioning = service(&runner, &fs, &sleeper);

    let cache = provisioning.provision(
        CacheConfig::new(CacheDriver::Redis).with_docker(true),
        Path::new(PROJECT),
    );

    assert_eq!(cache.readiness(), Readiness::Assumed);
    assert_eq!(runner.calls_with("exec").len(), 30);
    assert!(sleeper.total() <= Duration::from_secs(60));
}

#[test]
fn pipeline_writes_env_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "APP_NAME=shop\nDB_HOST=old\n").unwrap();

    let provisioning = ProvisioningService::new(
        Box::new(ScriptedProcessRunner::succeeding()),
        Box::new(LocalFilesystem::new()),
        Box::new(BuiltinManifestRenderer::new()),
        Box::new(RecordingSleeper::new()),
    );
    let config = ConfigService::new(Box::new(FileConfigWriter::new(LocalFilesystem::new())));
    let pipeline = ProvisioningPipeline::new(provisioning, config);

    let plan = InfrastructurePlan {
        database: Some(DatabaseConfig::new(DatabaseDriver::Pgsql).with_docker(true)),
        cache: Some(CacheConfig::new(CacheDriver::File)),
        ..Default::default()
    };
    let report = pipeline.run(plan, dir.path()).unwrap();

    assert_eq!(report.applied, 2);
    let env = std::fs::read_to_string(dir.path().join(".env")).unwrap();
    assert!(env.starts_with("APP_NAME=shop\nDB_HOST=pgsql\n"));
    assert!(env.contains("DB_CONNECTION=pgsql\n"));
    assert!(env.contains("CACHE_STORE=file\n"));
    assert!(dir.path().join("docker-compose.yml").exists());
}

#[test]
fn config_operations_apply_in_order() {
    let fs = MemoryFilesystem::new().with_file("/work/my-shop/.env", "A=0\n");
    let service = ConfigService::new(Box::new(FileConfigWriter::new(fs.clone())));

    let operations = vec![
        ConfigOperation::append(".env", config_values([("A", "1"), ("B", "1")])),
        ConfigOperation::set(".env", config_values([("B", "2")])),
    ];
    let applied = service.apply(Path::new(PROJECT), &operations).unwrap();

    assert_eq!(applied, 2);
    assert_eq!(
        fs.read_file(&Path::new(PROJECT).join(".env")).as_deref(),
        Some("A=0\nB=2\n")
    );
}
