use pretty_assertions::assert_eq;
use ptaflow::core::analysis::Diagnostic;
use ptaflow::parser::parse_dir;
use ptaflow::{analyze, Target};
use std::path::PathBuf;

fn demos() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos")
}

#[test]
fn test_every_demo_parses_and_analyzes() {
    let modules = parse_dir(demos()).unwrap();
    let names: Vec<&str> = modules.iter().map(|(_, m)| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "double_pointer",
            "store_load",
            "store_through_loaded",
            "unsupported"
        ]
    );

    for (path, module) in &modules {
        let result = analyze(module, "main")
            .unwrap_or_else(|e| panic!("{} failed: {}", path.display(), e));
        assert!(result.function("main").is_some());
    }
}

#[test]
fn test_store_through_loaded_demo() {
    let modules = parse_dir(demos()).unwrap();
    let (_, module) = modules
        .iter()
        .find(|(_, m)| m.name == "store_through_loaded")
        .unwrap();
    let main = module.get_function("main").unwrap();
    let x = main.find_value("x").unwrap();
    let seven = main
        .instructions
        .iter()
        .filter_map(|inst| inst.value_operand())
        .find(|value| value.is_constant())
        .unwrap();

    let result = analyze(module, "main").unwrap();
    let facts = result.function("main").unwrap();
    assert!(facts
        .points_to_at(x.as_inst().unwrap(), x)
        .contains(&Target::Value(seven)));
}

#[test]
fn test_unsupported_demo_warnings() {
    let modules = parse_dir(demos()).unwrap();
    let (_, module) = modules
        .iter()
        .find(|(_, m)| m.name == "unsupported")
        .unwrap();

    let result = analyze(module, "main").unwrap();
    let warnings: Vec<String> = result
        .diagnostics
        .iter()
        .filter(|d| {
            matches!(
                d,
                Diagnostic::UnsupportedConsumer { .. } | Diagnostic::UnusedAllocation { .. }
            )
        })
        .map(|d| d.to_string())
        .collect();
    assert_eq!(
        warnings,
        vec![
            "@main: %p is consumed by unsupported `call` at inst2".to_string(),
            "@main: %p is consumed by unsupported `ptrtoint` at inst3".to_string(),
            "@main: %unused is never loaded from or stored to".to_string(),
        ]
    );
    assert_eq!(result.warning_count(), 3);
}
