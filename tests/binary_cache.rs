#![cfg(feature = "binary-cache")]

use optrule::{
    filter_values, hide_option, option, require_option, set_default, show_option, Catalog,
    DeserializeError, OptionValue, ProductOption, Rule, SelectionState,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn blind_catalog() -> Catalog {
    Catalog::new(
        vec![
            ProductOption::new("control", "Control")
                .value("chain", "Chain")
                .value("cord", "Cord")
                .push_value(OptionValue::with_id("m-1", "motor", "Somfy Motor"))
                .required(),
            ProductOption::new("chain_length", "Chain length")
                .value("short", "Short")
                .value("long", "Long")
                .hidden(),
            ProductOption::new("motor_side", "Motor side")
                .value("left", "Left")
                .value("right", "Right"),
        ],
        vec![
            Rule::new("show_length", option("control").in_list(["chain", "cord"]), show_option("chain_length"))
                .describe("corded controls need a length"),
            Rule::new("long", option("control").equals("chain"), set_default("chain_length", "long")),
            Rule::new("cord_short", option("control").equals("cord"), filter_values("chain_length", ["short"])),
            Rule::new("side", option("control").contains("somfy"), require_option("motor_side")),
            Rule::new("no_side", option("control").not_equals("m-1"), hide_option("motor_side")),
        ],
    )
}

fn all_selections() -> Vec<SelectionState> {
    vec![
        SelectionState::new(),
        SelectionState::new().set("control", "chain"),
        SelectionState::new().set("control", "cord"),
        SelectionState::new().set("control", "motor"),
        SelectionState::new().set("control", "chain").set("chain_length", "short"),
    ]
}

// ---------------------------------------------------------------------------
// Round-trip
// ---------------------------------------------------------------------------

#[test]
fn round_trip_preserves_catalog() {
    let original = blind_catalog();
    let bytes = original.to_bytes(None).unwrap();
    let restored = Catalog::from_bytes(&bytes).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn round_trip_preserves_evaluation() {
    let original = blind_catalog().compile();
    let restored = Catalog::from_bytes(&blind_catalog().to_bytes(None).unwrap())
        .unwrap()
        .compile();
    for sel in all_selections() {
        assert_eq!(original.evaluate(&sel), restored.evaluate(&sel));
    }
}

#[test]
fn round_trip_with_source_digest() {
    let source = "option a:\n    x";
    let bytes = blind_catalog().to_bytes(Some(source)).unwrap();
    assert!(Catalog::cache_matches_source(&bytes, source).unwrap());
    assert!(!Catalog::cache_matches_source(&bytes, "option a:\n    y").unwrap());
}

#[test]
fn no_source_never_matches() {
    let bytes = blind_catalog().to_bytes(None).unwrap();
    assert!(!Catalog::cache_matches_source(&bytes, "").unwrap());
}

#[test]
fn empty_catalog_round_trip() {
    let bytes = Catalog::default().to_bytes(None).unwrap();
    assert_eq!(Catalog::from_bytes(&bytes).unwrap(), Catalog::default());
}

#[test]
fn encoding_determinism() {
    let a = blind_catalog().to_bytes(Some("src")).unwrap();
    let b = blind_catalog().to_bytes(Some("src")).unwrap();
    assert_eq!(a, b);
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

#[test]
fn corruption_byte_flip() {
    let mut corrupted = blind_catalog().to_bytes(None).unwrap();
    let last = corrupted.len() - 1;
    corrupted[last] ^= 0xFF;

    let err = Catalog::from_bytes(&corrupted).unwrap_err();
    assert!(
        matches!(err, DeserializeError::ChecksumMismatch),
        "expected ChecksumMismatch, got: {err}"
    );
}

#[test]
fn corruption_truncation() {
    let bytes = blind_catalog().to_bytes(None).unwrap();
    let err = Catalog::from_bytes(&bytes[..33]).unwrap_err();
    assert!(
        matches!(err, DeserializeError::LengthMismatch { .. }),
        "expected LengthMismatch, got: {err}"
    );
}

#[test]
fn bad_magic() {
    let mut bad = blind_catalog().to_bytes(None).unwrap();
    bad[0..4].copy_from_slice(b"OORO");

    let err = Catalog::from_bytes(&bad).unwrap_err();
    assert!(
        matches!(err, DeserializeError::BadMagic),
        "expected BadMagic, got: {err}"
    );
}

#[test]
fn version_mismatch() {
    let mut bad = blind_catalog().to_bytes(None).unwrap();
    bad[4] = 99;
    bad[5] = 0;

    let err = Catalog::from_bytes(&bad).unwrap_err();
    assert!(
        matches!(
            err,
            DeserializeError::IncompatibleVersion {
                blob: 99,
                supported: 1
            }
        ),
        "expected IncompatibleVersion, got: {err}"
    );
}

#[test]
fn empty_input_rejected() {
    let err = Catalog::from_bytes(&[]).unwrap_err();
    assert!(matches!(err, DeserializeError::LengthMismatch { .. }));
}

// ---------------------------------------------------------------------------
// Files and DSL sources
// ---------------------------------------------------------------------------

#[test]
fn file_round_trip() {
    let dir = std::env::temp_dir().join(format!("optrule_cache_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("blind.optrbin");

    let original = blind_catalog();
    original.to_binary_file(&path, None).unwrap();
    let restored = Catalog::from_binary_file(&path).unwrap();
    assert_eq!(restored, original);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_file_is_io_error() {
    let err = Catalog::from_binary_file("/nonexistent/optrule/blind.optrbin").unwrap_err();
    assert!(matches!(err, DeserializeError::Io(_)));
}

#[test]
fn dsl_source_cache_cycle() {
    let source = r#"
option control:
    chain "Chain", motor "Motor"
option chain_length (hidden):
    short, long
rule r:
    when control == chain then show_option chain_length
"#;
    let catalog = Catalog::from_dsl(source).unwrap();
    let bytes = catalog.to_bytes(Some(source)).unwrap();

    let cached = if Catalog::cache_matches_source(&bytes, source).unwrap() {
        Catalog::from_bytes(&bytes).unwrap()
    } else {
        Catalog::from_dsl(source).unwrap()
    };
    let views = cached.compile().evaluate(&SelectionState::new().set("control", "chain"));
    assert!(views.get("chain_length").unwrap().visible);
}

#[test]
fn snapshot_error_converts_to_unified_error() {
    fn load(bytes: &[u8]) -> Result<Catalog, optrule::OptruleError> {
        Ok(Catalog::from_bytes(bytes)?)
    }
    assert!(matches!(
        load(b"nope"),
        Err(optrule::OptruleError::Deserialize(_))
    ));
}
