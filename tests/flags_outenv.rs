//! Parameter resolution through the service and the `KEY=VALUE` dump.

use std::io::Write;

use svckit::{EnvSource, FlagSources, LifecycleState, ServiceError};

mod common;

use common::{hermetic_builder, CallLog, Recorder};

#[tokio::test]
async fn test_out_env_lists_only_registered_parameters() {
    let log = CallLog::default();
    let service = hermetic_builder()
        .with_runnable(Recorder::new("a", &log))
        .with_runnable(Recorder::new("b", &log))
        .flag_sources(FlagSources::from_args(["--a-uri", "redis://x", "--b-uri", "amqp://y"]))
        .build()
        .unwrap();
    service.init().await.unwrap();

    let dump = service.out_env().unwrap();
    let lines: Vec<&str> = dump.lines().collect();

    let component_lines: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| !l.starts_with("APP_ENV="))
        .collect();
    assert_eq!(component_lines, vec!["A_URI=redis://x", "B_URI=amqp://y"]);
    assert_eq!(lines, vec!["APP_ENV=dev", "A_URI=redis://x", "B_URI=amqp://y"]);
    assert!(!dump.contains("C_URI"));
}

#[test]
fn test_out_env_before_init_resolves_sources() {
    let log = CallLog::default();
    let service = hermetic_builder()
        .env("stg")
        .with_runnable(Recorder::new("cache", &log))
        .with_runnable(Recorder::new("db", &log))
        .flag_sources(
            FlagSources::from_args(["--cache-uri", "redis://cli"])
                .with_env(EnvSource::from_pairs([("DB_URI", "postgres://env")])),
        )
        .build()
        .unwrap();

    assert_eq!(
        service.out_env().unwrap(),
        "APP_ENV=stg\nCACHE_URI=redis://cli\nDB_URI=postgres://env\n"
    );
    assert_eq!(service.state(), LifecycleState::Created);
    assert_eq!(service.context().must_get::<Recorder>("cache").configures(), 0);

    let mut buf = Vec::new();
    service.write_env(&mut buf).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), service.out_env().unwrap());
}

#[test]
fn test_out_env_before_init_reports_bad_sources() {
    let log = CallLog::default();
    let service = hermetic_builder()
        .with_runnable(Recorder::new("cache", &log))
        .flag_sources(FlagSources::from_args(["--unknown-flag", "x"]))
        .build()
        .unwrap();

    let err = service.out_env().unwrap_err();
    assert!(matches!(err, ServiceError::Flags(_)));
    assert!(service.write_env(Vec::new()).is_err());
}

#[tokio::test]
async fn test_environment_and_env_file_feed_flags() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# captured with `svckit outenv`").unwrap();
    writeln!(file, "APP_ENV=prd").unwrap();
    writeln!(file, "A_URI=\"redis://from-file\"").unwrap();
    writeln!(file, "B_URI=amqp://from-file").unwrap();

    let log = CallLog::default();
    let service = hermetic_builder()
        .with_runnable(Recorder::new("a", &log))
        .with_runnable(Recorder::new("b", &log))
        .flag_sources(
            FlagSources::from_args(["--b-uri", "amqp://cli"])
                .with_env(EnvSource::from_pairs([("A_URI", "redis://env")]))
                .with_env_file(file.path()),
        )
        .build()
        .unwrap();
    service.init().await.unwrap();

    let ctx = service.context();
    assert_eq!(ctx.env(), "prd");
    assert_eq!(service.env(), "prd");
    assert_eq!(ctx.must_get::<Recorder>("a").uri(), "redis://env");
    assert_eq!(ctx.must_get::<Recorder>("b").uri(), "amqp://cli");
}

#[tokio::test]
async fn test_dump_reloads_into_an_identical_service() {
    let log = CallLog::default();
    let original = hermetic_builder()
        .with_runnable(Recorder::new("a", &log))
        .flag_sources(FlagSources::from_args(["--a-uri", "redis://with space"]))
        .build()
        .unwrap();
    original.init().await.unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    original.write_env(file.as_file_mut()).unwrap();

    let restored = hermetic_builder()
        .with_runnable(Recorder::new("a", &log))
        .flag_sources(FlagSources::from_args(Vec::<String>::new()).with_env_file(file.path()))
        .build()
        .unwrap();
    restored.init().await.unwrap();

    assert_eq!(restored.context().must_get::<Recorder>("a").uri(), "redis://with space");
    assert_eq!(restored.out_env().unwrap(), original.out_env().unwrap());
}

#[tokio::test]
async fn test_multi_line_value_survives_the_dump() {
    let pem = "-----BEGIN KEY-----\nabc\n-----END KEY-----";
    let log = CallLog::default();
    let original = hermetic_builder()
        .with_runnable(Recorder::new("tls", &log))
        .flag_sources(
            FlagSources::from_args(Vec::<String>::new())
                .with_env(EnvSource::from_pairs([("TLS_URI", pem)])),
        )
        .build()
        .unwrap();
    original.init().await.unwrap();

    let dump = original.out_env().unwrap();
    assert_eq!(dump.lines().count(), 2);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(dump.as_bytes()).unwrap();

    let restored = hermetic_builder()
        .with_runnable(Recorder::new("tls", &log))
        .flag_sources(FlagSources::from_args(Vec::<String>::new()).with_env_file(file.path()))
        .build()
        .unwrap();
    restored.init().await.unwrap();

    assert_eq!(restored.context().must_get::<Recorder>("tls").uri(), pem);
}

#[tokio::test]
async fn test_unknown_command_line_flag_fails_init() {
    let log = CallLog::default();
    let service = hermetic_builder()
        .with_runnable(Recorder::new("a", &log))
        .flag_sources(FlagSources::from_args(["--z-uri", "nowhere"]))
        .build()
        .unwrap();

    let err = service.init().await.unwrap_err();

    assert!(matches!(err, ServiceError::Flags(_)));
    assert_eq!(service.state(), LifecycleState::Failed);
    assert_eq!(service.context().must_get::<Recorder>("a").configures(), 0);
}

#[tokio::test]
async fn test_missing_env_file_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let service = hermetic_builder()
        .with_runnable(Recorder::new("a", &log))
        .flag_sources(FlagSources::from_args(Vec::<String>::new()).with_env_file(dir.path().join("absent.env")))
        .build()
        .unwrap();

    service.init().await.unwrap();
    assert_eq!(service.context().must_get::<Recorder>("a").uri(), "mem://a");
}
