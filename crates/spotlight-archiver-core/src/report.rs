//! Markdown report of records sharing a perceptual fingerprint

use log::{debug, info, warn};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::persistence::{ImageRecord, RecordStore};
use crate::processing::PHash;

/// Records grouped under the fingerprint of their first member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    pub fingerprint: String,
    pub records: Vec<ImageRecord>,
}

/// Write `report_path` if any fingerprint is shared by two or more records
///
/// With `threshold == 0` fingerprints must match exactly. A positive
/// threshold groups records whose fingerprints are within that Hamming
/// distance of a group's first member. Returns whether duplicates were found;
/// no file is written otherwise. Records are never modified.
pub fn report_duplicates(store: &RecordStore, report_path: &Path, threshold: u32) -> Result<bool> {
    let groups = find_duplicates(store.all_records()?, threshold);
    if groups.is_empty() {
        debug!("No duplicate fingerprints found");
        return Ok(false);
    }

    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(report_path, render(&groups))?;

    info!(
        "Potential duplicates found. Reports are written to {}",
        report_path.display()
    );
    Ok(true)
}

/// Groups of two or more records, in order of first appearance
pub fn find_duplicates(records: Vec<ImageRecord>, threshold: u32) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = Vec::new();

    for record in records {
        let Some(fingerprint) = record.fingerprint.clone() else {
            continue;
        };

        match groups
            .iter_mut()
            .find(|g| same_picture(&g.fingerprint, &fingerprint, threshold))
        {
            Some(group) => group.records.push(record),
            None => groups.push(DuplicateGroup {
                fingerprint,
                records: vec![record],
            }),
        }
    }

    groups.retain(|g| g.records.len() > 1);
    groups
}

fn same_picture(a: &str, b: &str, threshold: u32) -> bool {
    if a == b {
        return true;
    }
    if threshold == 0 {
        return false;
    }
    match (a.parse::<PHash>(), b.parse::<PHash>()) {
        (Ok(a), Ok(b)) => a.is_similar(&b, threshold),
        _ => {
            warn!("Cannot compare fingerprints {} and {}", a, b);
            false
        }
    }
}

fn render(groups: &[DuplicateGroup]) -> String {
    let mut out = String::from("# Potential duplicates\n\n");

    for (idx, group) in groups.iter().enumerate() {
        let preview = &group.records[0].url;
        let _ = write!(out, "## phash `{}`\n\n", group.fingerprint);
        let _ = writeln!(out, "![phash {}]({})", group.fingerprint, preview);
        for record in &group.records {
            let _ = write!(
                out,
                "\n- {}  \n  Saved to `{}`\n",
                record.url, record.filename
            );
        }
        if idx + 1 < groups.len() {
            out.push('\n');
        }
    }

    out
}
