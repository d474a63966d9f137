//! JSON exports: per-pass change reports and ad-hoc listings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregator::ChangeSet;

/// `<sanitised identity>_<YYYYmmddTHHMMSSZ>.json`
pub fn report_file_name(set: &ChangeSet, at: DateTime<Utc>) -> String {
    format!(
        "{}_{}.json",
        set.resource.file_stem(),
        at.format("%Y%m%dT%H%M%SZ")
    )
}

/// Write `value` as pretty JSON, creating parent directories.
pub fn export_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
    }
    let content = serde_json::to_string_pretty(value).context("serialize report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Write a change set into `dir` under a timestamped name.
pub fn write_timestamped(dir: &Path, set: &ChangeSet) -> Result<PathBuf> {
    let path = dir.join(report_file_name(set, Utc::now()));
    export_json(&path, set)?;
    Ok(path)
}
