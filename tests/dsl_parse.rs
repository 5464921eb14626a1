use optrule::{AuthoringError, Catalog, OptruleError, SelectionState};

const BLIND: &str = r#"
# Roller blind, corded and motorised variants
option control "Control" (required):
    chain "Chain", cord "Cord", motor "Somfy Motor"

option chain_length "Chain length" (hidden):
    short "Short", medium "Medium", long "Long"

option motor_side "Motor side" (hidden):
    left "Left", right "Right"

rule chain_shows_length "chain shows length":
    when control in [chain, cord] then show_option chain_length

rule chain_default_long:
    when control == chain then set_default chain_length long

rule cord_is_short:
    when control == cord then filter_values chain_length [short, medium]

rule motor_side:
    when control contains "somfy" then show_option motor_side

rule motor_needs_side:
    when control equals motor then require_option motor_side
"#;

#[test]
fn dsl_parse_and_evaluate() {
    let catalog = Catalog::from_dsl(BLIND).unwrap();
    assert_eq!(catalog.options.len(), 3);
    assert_eq!(catalog.rules.len(), 5);
    catalog.validate().unwrap();

    let rules = catalog.compile();

    let views = rules.evaluate(&SelectionState::new());
    assert!(views.get("control").unwrap().required);
    assert!(!views.get("chain_length").unwrap().visible);
    assert!(!views.get("motor_side").unwrap().visible);

    let views = rules.evaluate(&SelectionState::new().set("control", "chain"));
    let length = views.get("chain_length").unwrap();
    assert!(length.visible);
    assert_eq!(length.default_value.as_ref().unwrap().code, "long");
    assert_eq!(length.allowed_codes(), ["short", "medium", "long"]);

    let views = rules.evaluate(&SelectionState::new().set("control", "cord"));
    let length = views.get("chain_length").unwrap();
    assert!(length.visible);
    assert_eq!(length.allowed_codes(), ["short", "medium"]);
    assert!(length.default_value.is_none());

    let views = rules.evaluate(&SelectionState::new().set("control", "motor"));
    let side = views.get("motor_side").unwrap();
    assert!(side.visible);
    assert!(side.required);
    assert!(!views.get("chain_length").unwrap().visible);
}

#[test]
fn dsl_keeps_descriptions_and_labels() {
    let catalog = Catalog::from_dsl(BLIND).unwrap();
    assert_eq!(catalog.rules[0].description.as_deref(), Some("chain shows length"));
    assert_eq!(catalog.rules[1].description, None);
    assert_eq!(catalog.options[0].values[2].label, "Somfy Motor");
}

#[test]
fn dsl_unknown_references_parse_but_fail_validation() {
    let dsl = r#"
option control:
    chain, motor
rule r:
    when colour == white then hide_option control
"#;
    let catalog = Catalog::from_dsl(dsl).unwrap();
    assert!(catalog.validate().is_err());
    assert_eq!(catalog.compile().skipped_rules().len(), 1);
}

#[test]
fn dsl_validated_loader_reports_authoring_error() {
    let dsl = r#"
option control:
    chain, motor
option chain_length:
    short, long
rule r:
    when control == cord then hide_option chain_length
"#;
    let err = Catalog::from_dsl(dsl).and_then(Catalog::validated).unwrap_err();
    match err {
        OptruleError::Authoring(AuthoringError::UnknownValue { rule, key, code }) => {
            assert_eq!((rule.as_str(), key.as_str(), code.as_str()), ("r", "control", "cord"));
        }
        other => panic!("expected authoring error, got {other:?}"),
    }

    let ok = Catalog::from_dsl(BLIND).and_then(Catalog::validated).unwrap();
    assert_eq!(ok.rules.len(), 5);
}

#[test]
fn dsl_syntax_error() {
    let err = Catalog::from_dsl("rule r:\n    when control === chain then show_option x").unwrap_err();
    match err {
        OptruleError::Parse(e) => {
            assert!(e.to_string().starts_with("parse error"));
            assert!(e.offset() > 0);
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn dsl_from_file() {
    let path = std::env::temp_dir().join(format!("optrule_dsl_{}.optr", std::process::id()));
    std::fs::write(&path, BLIND).unwrap();
    let catalog = Catalog::from_file(&path).unwrap();
    assert_eq!(catalog.rules.len(), 5);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn dsl_missing_file_is_io_error() {
    let err = Catalog::from_file("/nonexistent/optrule/catalog.optr").unwrap_err();
    assert!(matches!(err, OptruleError::Io(_)));
}
