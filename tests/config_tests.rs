mod common;

use common::json_config;
use std::path::{Path, PathBuf};
use telesink::{
    DEFAULT_EVENTS_PER_FILE, DEFAULT_FILE_SIZE_KB, Error, Format, RotationPolicy, SinkConfig,
};

fn config(
    file_size_kb: Option<u64>,
    events_per_file: Option<u64>,
    default: Option<&str>,
) -> SinkConfig {
    SinkConfig {
        path: PathBuf::from("/tmp/telemetry"),
        file_size_kb,
        events_per_file,
        format: "json".to_string(),
        default: default.map(str::to_string),
    }
}

#[test]
fn test_valid_configs() {
    config(Some(100), None, None).validate().unwrap();
    config(None, Some(10), None).validate().unwrap();
    config(None, None, Some("fileSizeKb")).validate().unwrap();
    config(None, None, Some("eventsPerFile")).validate().unwrap();
}

#[test]
fn test_path_required() {
    let mut cfg = config(Some(100), None, None);
    cfg.path = PathBuf::new();
    let err = cfg.validate().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
    assert!(err.to_string().contains("path"));
}

#[test]
fn test_format_required_and_validated() {
    let mut cfg = config(Some(100), None, None);
    cfg.format = String::new();
    assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));

    cfg.format = "xml".to_string();
    match cfg.validate().unwrap_err() {
        Error::InvalidFormat(label) => assert_eq!(label, "xml"),
        other => panic!("expected InvalidFormat, got {other}"),
    }
}

#[test]
fn test_format_labels_are_case_insensitive() {
    for label in ["json", "JSON", "Json", "protobuf", "PROTOBUF", "Protobuf"] {
        let mut cfg = config(Some(100), None, None);
        cfg.format = label.to_string();
        cfg.validate().unwrap();
    }
    assert_eq!(Format::parse("JSON").unwrap(), Format::Json);
    assert_eq!(Format::parse("protobuf").unwrap().extension(), "proto");
}

#[test]
fn test_exactly_one_policy_must_be_named() {
    assert!(matches!(
        config(None, None, None).validate(),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        config(Some(100), Some(10), None).validate(),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        config(Some(100), None, Some("fileSizeKb")).validate(),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        config(None, Some(10), Some("eventsPerFile")).validate(),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        config(Some(100), Some(10), Some("fileSizeKb")).validate(),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_limits_must_be_positive() {
    assert!(matches!(
        config(Some(0), None, None).validate(),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        config(None, Some(0), None).validate(),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_unknown_default_selector_rejected() {
    let err = config(None, None, Some("bySize")).validate().unwrap_err();
    assert!(err.to_string().contains("bySize"));
}

#[test]
fn test_default_selector_magnitudes() {
    let cfg = config(None, None, Some("fileSizeKb"));
    assert_eq!(
        cfg.resolved_policy().unwrap(),
        RotationPolicy::SizeLimitKb(DEFAULT_FILE_SIZE_KB)
    );

    let cfg = config(None, None, Some("EVENTSPERFILE"));
    assert_eq!(
        cfg.resolved_policy().unwrap(),
        RotationPolicy::EventsPerFile(DEFAULT_EVENTS_PER_FILE)
    );
}

#[test]
fn test_explicit_limits_resolve_directly() {
    assert_eq!(
        config(Some(25), None, None).resolved_policy().unwrap(),
        RotationPolicy::SizeLimitKb(25)
    );
    assert_eq!(
        config(None, Some(7), None).resolved_policy().unwrap(),
        RotationPolicy::EventsPerFile(7)
    );
}

#[test]
fn test_deserializes_host_configuration_keys() {
    let cfg: SinkConfig = serde_json::from_str(
        r#"{ "path": "/var/lib/telemetry", "fileSizeKb": 50, "format": "protobuf" }"#,
    )
    .unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.path, PathBuf::from("/var/lib/telemetry"));
    assert_eq!(cfg.resolved_policy().unwrap(), RotationPolicy::SizeLimitKb(50));

    let cfg: SinkConfig = serde_json::from_str(
        r#"{ "path": "/var/lib/telemetry", "eventsPerFile": 3, "format": "json" }"#,
    )
    .unwrap();
    cfg.validate().unwrap();
    assert_eq!(cfg.resolved_policy().unwrap(), RotationPolicy::EventsPerFile(3));
}

#[test]
fn test_fingerprint_identity() {
    let a = json_config(Path::new("/tmp/a"));
    let b = json_config(Path::new("/tmp/a"));
    assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
}

#[test]
fn test_fingerprint_distinguishes_every_dimension() {
    let base = json_config(Path::new("/tmp/a"));

    let mut other_path = base.clone();
    other_path.path = PathBuf::from("/tmp/b");
    assert_ne!(base.fingerprint().unwrap(), other_path.fingerprint().unwrap());

    let mut other_limit = base.clone();
    other_limit.events_per_file = Some(6);
    assert_ne!(base.fingerprint().unwrap(), other_limit.fingerprint().unwrap());

    let mut other_kind = base.clone();
    other_kind.events_per_file = None;
    other_kind.file_size_kb = Some(5);
    assert_ne!(base.fingerprint().unwrap(), other_kind.fingerprint().unwrap());

    let mut other_format = base.clone();
    other_format.format = "protobuf".to_string();
    assert_ne!(base.fingerprint().unwrap(), other_format.fingerprint().unwrap());
}

#[test]
fn test_fingerprint_ignores_policy_spelling() {
    // default = "eventsPerFile" resolves to EventsPerFile(1); so does an
    // explicit eventsPerFile = 1 — same engine either way.
    let explicit = config(None, Some(DEFAULT_EVENTS_PER_FILE), None);
    let via_default = config(None, None, Some("eventsPerFile"));
    assert_eq!(
        explicit.fingerprint().unwrap(),
        via_default.fingerprint().unwrap()
    );
}
