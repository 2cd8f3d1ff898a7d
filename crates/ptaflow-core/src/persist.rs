use crate::analysis::AnalysisResult;
use crate::module::Module;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io;
use std::path::Path;

pub fn save_module(module: &Module, path: impl AsRef<Path>) -> io::Result<()> {
    write_json(module, path)
}

pub fn load_module(path: impl AsRef<Path>) -> io::Result<Module> {
    read_json(path)
}

pub fn save_result(result: &AnalysisResult, path: impl AsRef<Path>) -> io::Result<()> {
    write_json(result, path)
}

pub fn load_result(path: impl AsRef<Path>) -> io::Result<AnalysisResult> {
    read_json(path)
}

fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    fs::write(path, json)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> io::Result<T> {
    let json = fs::read_to_string(path)?;
    serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
