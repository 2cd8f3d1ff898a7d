use pretty_assertions::assert_eq;
use ptaflow_core::format::format_module;
use ptaflow_core::{InstKind, Type, Value};
use ptaflow_parser::{parse_dir, parse_file, parse_module, ParseError};

const CANONICAL: &str = "; module: roundtrip
layout pointer_size=8

declare i32 @puts(i8*)

define i32 @main(i32* %a) {
  %p = alloca i32*
  store i32* %a, i32** %p
  %r = load i32*, i32** %p
  %v = load i32, i32* %r
  %c = call i32 @puts(i8* null)
  %sum = add i32 %v, 1
  ret i32 %sum
}
";

#[test]
fn test_canonical_text_round_trips() {
    let module = parse_module(CANONICAL).unwrap();
    assert_eq!(module.name, "roundtrip");
    assert_eq!(format_module(&module), CANONICAL);
}

#[test]
fn test_lowered_instructions() {
    let module = parse_module(CANONICAL).unwrap();
    let main = module.get_function("main").unwrap();

    assert_eq!(main.params.len(), 1);
    assert_eq!(main.instructions.len(), 7);
    let p = main.find_value("p").unwrap();
    assert_eq!(main.type_of(p), Some(Type::ptr_to(Type::ptr_to(Type::Int(32)))));
    match &main.instructions[1].kind {
        InstKind::Store { value, ptr } => {
            assert_eq!(*value, main.find_value("a").unwrap());
            assert_eq!(*ptr, p);
        }
        other => panic!("expected store, got {:?}", other),
    }
    assert_eq!(main.instructions[4].callee(), Some("puts"));
    assert!(module.get_function("puts").unwrap().is_declaration);
}

#[test]
fn test_snapshot_of_reformatted_module() {
    let input = "
define void @f() {
  %x = alloca {i8, [2 x i32]}   ; aggregate
  %y = alloca i8*
  %z = load i8*, i8** %y
  store i8* %z, i8** %y
  ret void
}
";
    let module = parse_module(input).unwrap();
    insta::assert_snapshot!(format_module(&module), @r"
    ; module: module
    layout pointer_size=8

    define void @f() {
      %x = alloca {i8, [2 x i32]}
      %y = alloca i8*
      %z = load i8*, i8** %y
      store i8* %z, i8** %y
      ret void
    }
    ");
}

#[test]
fn test_load_through_wrong_pointer_depth() {
    let input = "
define void @f() {
  %y = alloca i8**
  %z = load i8*, i8** %y
  ret void
}
";
    let err = parse_module(input).unwrap_err();
    assert_eq!(err.to_string(), "line 4: %y has type i8*** but is used as i8**");
}

#[test]
fn test_layout_directive() {
    let module = parse_module("layout pointer_size=4 pointer_align=2\n").unwrap();
    assert_eq!(module.layout.pointer_size, 4);
    assert_eq!(module.layout.pointer_align, 2);

    let err = parse_module("layout word=4\n").unwrap_err();
    assert!(matches!(err, ParseError::Layout { ref key, line: 1 } if key == "word"));
}

#[test]
fn test_undefined_value() {
    let input = "define void @f() {\n  store i32 1, i32* %nowhere\n}\n";
    match parse_module(input) {
        Err(ParseError::UndefinedValue { name, line }) => {
            assert_eq!(name, "nowhere");
            assert_eq!(line, 2);
        }
        other => panic!("expected undefined value, got {:?}", other.map(|m| m.name)),
    }
}

#[test]
fn test_duplicate_local() {
    let input = "define void @f() {\n  %p = alloca i32\n  %p = alloca i64\n}\n";
    assert!(matches!(
        parse_module(input),
        Err(ParseError::DuplicateDefinition { line: 3, .. })
    ));
}

#[test]
fn test_duplicate_function() {
    let input = "define void @f() {\n}\ndefine void @f() {\n}\n";
    assert!(matches!(
        parse_module(input),
        Err(ParseError::DuplicateFunction { .. })
    ));
}

#[test]
fn test_load_through_non_pointer() {
    let input = "define void @f(i32 %n) {\n  %r = load i32, i32 %n\n}\n";
    let err = parse_module(input).unwrap_err();
    assert_eq!(
        err.to_string(),
        "line 2: load through non-pointer of type i32"
    );
}

#[test]
fn test_store_through_non_pointer() {
    let input = "define void @f(i32 %n) {\n  store i32 1, i32 %n\n}\n";
    assert!(matches!(
        parse_module(input),
        Err(ParseError::Type { line: 2, .. })
    ));
}

#[test]
fn test_operand_type_must_match() {
    let input = "define void @f() {\n  %p = alloca i32\n  store i32 1, i64* %p\n}\n";
    let err = parse_module(input).unwrap_err();
    assert_eq!(err.to_string(), "line 3: %p has type i32* but is used as i64*");
}

#[test]
fn test_calls_need_a_declaration() {
    let input = "define void @f() {\n  call void @g()\n}\n";
    assert!(matches!(
        parse_module(input),
        Err(ParseError::UnknownFunction { ref name, line: 2 }) if name == "g"
    ));

    let forward = "define void @f() {\n  call void @g()\n  ret void\n}\n\ndefine void @g() {\n  ret void\n}\n";
    let module = parse_module(forward).unwrap();
    assert_eq!(module.definitions().count(), 2);
}

#[test]
fn test_syntax_errors_are_reported() {
    let err = parse_module("define i32 @main( {\n").unwrap_err();
    assert!(matches!(err, ParseError::Syntax(_)));
    assert!(err.to_string().starts_with("syntax error"));
}

#[test]
fn test_constants_are_shared() {
    let input = "define void @f() {
  %p = alloca i32
  store i32 7, i32* %p
  store i32 7, i32* %p
  ret void
}
";
    let module = parse_module(input).unwrap();
    let f = module.get_function("f").unwrap();
    let stored: Vec<Value> = f
        .instructions
        .iter()
        .filter_map(|inst| inst.value_operand())
        .collect();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0], stored[1]);
    assert_eq!(f.constants.len(), 1);
}

#[test]
fn test_files_and_directories() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.pir"), "define void @b() {\n  ret void\n}\n").unwrap();
    std::fs::write(dir.path().join("a.pir"), "; module: named\n").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not ir").unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    std::fs::write(dir.path().join("nested/c.pir"), "layout pointer_size=4\n").unwrap();

    let single = parse_file(dir.path().join("b.pir")).unwrap();
    assert_eq!(single.name, "b");

    let modules = parse_dir(dir.path()).unwrap();
    let names: Vec<&str> = modules.iter().map(|(_, m)| m.name.as_str()).collect();
    assert_eq!(names, vec!["named", "b", "c"]);

    let missing = parse_file(dir.path().join("missing.pir")).unwrap_err();
    assert!(matches!(missing, ParseError::Io { .. }));
}
