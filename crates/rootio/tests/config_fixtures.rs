//! Codec configuration loaded from TOML documents.

use rootio::rbase::Named;
use rootio::{
    to_bytes, ByteCountPolicy, CodecConfig, DecodeError, FutureVersionPolicy, IdentityTable,
    RBuffer, DEFAULT_MAX_CLASS_NAME_LEN, DEFAULT_MAX_DEPTH,
};

const FULL: &str = r#"
byte-count = "strict"
future-version = "skip-as-opaque"
max-class-name-len = 128
max-depth = 64
"#;

const PARTIAL: &str = r#"
future-version = "skip-as-opaque"
"#;

#[test]
fn full_document() {
    let config: CodecConfig = toml::from_str(FULL).unwrap();
    assert_eq!(config.byte_count, ByteCountPolicy::Strict);
    assert_eq!(config.future_version, FutureVersionPolicy::SkipAsOpaque);
    assert_eq!(config.max_class_name_len, 128);
    assert_eq!(config.max_depth, 64);
}

#[test]
fn partial_document_keeps_defaults() {
    let config: CodecConfig = toml::from_str(PARTIAL).unwrap();
    assert_eq!(config.byte_count, ByteCountPolicy::Warn);
    assert_eq!(config.future_version, FutureVersionPolicy::SkipAsOpaque);
    assert_eq!(config.max_class_name_len, DEFAULT_MAX_CLASS_NAME_LEN);
    assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);

    let empty: CodecConfig = toml::from_str("").unwrap();
    assert_eq!(empty, CodecConfig::default());
}

#[test]
fn invalid_documents_are_rejected() {
    for doc in [
        r#"byte-count = "lenient""#,
        r#"future-version = 1"#,
        r#"max-class-name-len = -3"#,
    ] {
        assert!(toml::from_str::<CodecConfig>(doc).is_err(), "{doc}");
    }
}

#[test]
fn serialized_config_reads_back() {
    let text = toml::to_string(&CodecConfig::strict()).unwrap();
    assert!(text.contains("byte-count = \"strict\""));
    let back: CodecConfig = toml::from_str(&text).unwrap();
    assert_eq!(back, CodecConfig::strict());
}

#[test]
fn loaded_config_drives_session() {
    let mut data = to_bytes(&Named::new("n", "t")).unwrap();
    let count = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) + 1;
    data[..4].copy_from_slice(&count.to_be_bytes());
    data.push(0);

    let lenient: CodecConfig = toml::from_str(PARTIAL).unwrap();
    let mut table = IdentityTable::new();
    let out = RBuffer::new(&data, &mut table)
        .with_config(lenient)
        .decode_record::<Named>()
        .unwrap();
    assert!(out.has_byte_count_mismatch());

    let strict: CodecConfig = toml::from_str(FULL).unwrap();
    let mut table = IdentityTable::new();
    let mut r = RBuffer::new(&data, &mut table).with_config(strict);
    assert!(matches!(
        r.decode_record::<Named>(),
        Err(DecodeError::ByteCountMismatch { .. })
    ));
    assert_eq!(r.config().max_class_name_len, 128);
}
