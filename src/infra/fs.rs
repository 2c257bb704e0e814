//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides the file operations of the CLI: writing report files
//! and configuration templates atomically, and reading reports back.
//!
//! 此模块提供 CLI 的文件操作：以原子方式写入报告文件和配置模板，以及读回报告。

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `contents` to `path`, creating missing parent directories.
/// The file is written to a temporary sibling first and then renamed, so
/// readers never observe a half-written report.
///
/// 将 `contents` 写入 `path`，并创建缺失的父目录。
/// 文件先写入同目录下的临时文件再重命名，因此读取方不会看到写了一半的报告。
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

    let mut temp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    temp.write_all(contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    temp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Serializes `value` as pretty-printed JSON into `path`.
/// 将 `value` 序列化为格式化的 JSON 并写入 `path`。
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).context("Failed to serialize JSON")?;
    write_atomic(path, &json)
}

/// Reads a JSON document written by [`write_json`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Writes a new file, refusing to replace an existing one unless `force` is set.
/// Returns `false` when the file exists and was left untouched.
///
/// 写入新文件；除非设置了 `force`，否则拒绝覆盖已有文件。
/// 文件已存在且未被修改时返回 `false`。
pub fn write_new_file(path: &Path, contents: &str, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    write_atomic(path, contents.as_bytes())?;
    Ok(true)
}
