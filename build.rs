//! # Build Script for Internationalization / 国际化构建脚本
//!
//! Checks the translation files in `locales/` against the base language
//! (`en.toml`) at build time. Every key of the base file must exist in every
//! other locale; missing and unknown keys are reported as cargo warnings.
//!
//! 在构建时将 `locales/` 中的翻译文件与基础语言（`en.toml`）进行比对。
//! 基础文件中的每个键都必须存在于其他语言中；缺失和未知的键会以 cargo 警告的形式报告。

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the structure of a translation file: keys mapped to strings
/// or to nested tables of keys.
///
/// 表示翻译文件的结构：键映射到字符串或嵌套的键表。
#[derive(Debug, Deserialize)]
struct Translations(toml::Table);

/// Flattens nested tables into dotted keys (`html_report.summary.total`).
/// 将嵌套表展开为点分隔的键（`html_report.summary.total`）。
fn flatten(prefix: &str, table: &toml::Table, keys: &mut BTreeSet<String>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::Table(nested) => flatten(&full_key, nested, keys),
            _ => {
                keys.insert(full_key);
            }
        }
    }
}

fn load_keys(path: &Path) -> Result<BTreeSet<String>, String> {
    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let translations: Translations =
        toml::from_str(&content).map_err(|e| format!("Failed to parse {}: {e}", path.display()))?;
    let mut keys = BTreeSet::new();
    flatten("", &translations.0, &mut keys);
    Ok(keys)
}

fn main() -> Result<(), String> {
    println!("cargo:rerun-if-changed=locales/");

    let locales_dir = Path::new("locales");
    let base_keys = load_keys(&locales_dir.join("en.toml"))?;

    let lang_files: Vec<PathBuf> = fs::read_dir(locales_dir)
        .map_err(|e| format!("Failed to read locales directory: {e}"))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml"))
        .filter(|path| path.file_stem().and_then(|s| s.to_str()) != Some("en"))
        .collect();

    for path in &lang_files {
        let keys = load_keys(path)?;
        for missing in base_keys.difference(&keys) {
            println!(
                "cargo:warning=Key '{missing}' is missing from {}",
                path.display()
            );
        }
        for unknown in keys.difference(&base_keys) {
            println!(
                "cargo:warning=Key '{unknown}' in {} is not present in en.toml",
                path.display()
            );
        }
    }

    Ok(())
}
