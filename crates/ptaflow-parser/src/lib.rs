/*! Parse textual IR into a program model.
 *
 * Pointer analysis is easiest to exercise on small hand-written programs. This crate reads the
 * LLVM-flavoured text that `ptaflow_core::format` prints back into a `Module`, checking that every
 * operand is defined and that loads and stores go through pointers.
 */

use pest::Parser;
use pest_derive::Parser;
use ptaflow_core::Module;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

mod lower;

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct PirParser;

pub type ParseResult<T> = Result<T, Box<pest::error::Error<Rule>>>;

/// File extension of textual IR files.
pub const EXTENSION: &str = "pir";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("syntax error\n{0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
    #[error("line {line}: undefined value %{name}")]
    UndefinedValue { name: String, line: usize },
    #[error("line {line}: %{name} is defined more than once")]
    DuplicateDefinition { name: String, line: usize },
    #[error("function @{name} is defined more than once")]
    DuplicateFunction { name: String },
    #[error("line {line}: call to undeclared function @{name}")]
    UnknownFunction { name: String, line: usize },
    #[error("line {line}: {message}")]
    Type { message: String, line: usize },
    #[error("line {line}: unknown layout key `{key}`")]
    Layout { key: String, line: usize },
    #[error("line {line}: malformed item")]
    Malformed { line: usize },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn parse(input: &str) -> ParseResult<pest::iterators::Pairs<'_, Rule>> {
    PirParser::parse(Rule::module, input).map_err(Box::new)
}

pub fn check(input: &str) -> bool {
    parse(input).is_ok()
}

/// Parses and lowers `input`. The module is named by a leading `; module: <name>` line, or
/// `"module"` when there is none.
pub fn parse_module(input: &str) -> Result<Module, ParseError> {
    let name = module_name(input).unwrap_or("module");
    parse_module_named(input, name)
}

pub fn parse_module_named(input: &str, name: &str) -> Result<Module, ParseError> {
    let pairs = parse(input)?;
    lower::lower_module(pairs, name)
}

/// Reads and lowers one file. Without a header line the module takes the file stem as its name.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Module, ParseError> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("module");
    let name = module_name(&input).unwrap_or(stem);
    parse_module_named(&input, name)
}

/// Parses every `.pir` file below `root`, in path order. Stops at the first failure.
pub fn parse_dir<P: AsRef<Path>>(root: P) -> Result<Vec<(PathBuf, Module)>, ParseError> {
    let root = root.as_ref();
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|err| ParseError::Io {
            path: err
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            source: err.into(),
        })?;
        let is_ir = entry.file_type().is_file()
            && entry.path().extension().and_then(|ext| ext.to_str()) == Some(EXTENSION);
        if is_ir {
            paths.push(entry.into_path());
        }
    }

    paths
        .into_iter()
        .map(|path| parse_file(&path).map(|module| (path, module)))
        .collect()
}

fn module_name(input: &str) -> Option<&str> {
    input
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.strip_prefix(';'))
        .and_then(|rest| rest.trim_start().strip_prefix("module:"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}
