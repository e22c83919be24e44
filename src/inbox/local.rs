//! Classify messages stored on disk.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::{BatchClassifier, BatchReport};
use crate::error::{LeadError, Result};
use crate::parser::eml::{is_eml_path, read_eml};
use crate::parser::mbox::MboxParser;
use crate::parser::message::parse_message;

/// Stable id for a message that has no mailbox UID.
///
/// Hashes the `Message-ID` when present, else the raw bytes, so rescanning the
/// same archive updates leads instead of duplicating them.
pub fn local_uid(message_id: Option<&str>, raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    match message_id {
        Some(id) => hasher.update(id.as_bytes()),
        None => hasher.update(raw),
    }
    let hex = format!("{:x}", hasher.finalize());
    hex[..16].to_string()
}

/// List the `.eml` and `.mbox` files under `path`, sorted. A file path is returned as is.
pub fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    let metadata = std::fs::metadata(path).map_err(|e| LeadError::open(path, e))?;
    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    // Symlinks are not followed, so a link back to an ancestor cannot loop.
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| is_eml_path(p) || has_extension(p, "mbox"))
        .collect();
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Classify every message in a file or directory.
///
/// `progress(done, total)` reports bytes processed across all files.
pub fn scan_path(path: &Path, progress: Option<&dyn Fn(u64, u64)>) -> Result<BatchReport> {
    let files = collect_files(path)?;
    let total_bytes: u64 = files
        .iter()
        .filter_map(|f| std::fs::metadata(f).ok())
        .map(|m| m.len())
        .sum();
    info!(path = %path.display(), files = files.len(), "Scanning local messages");

    let mut batch = BatchClassifier::new();
    let mut done: u64 = 0;

    for file in &files {
        if is_eml_path(file) {
            let raw = read_eml(file)?;
            push_local(&mut batch, &file.display().to_string(), &raw);
            done += raw.len() as u64;
            if let Some(cb) = progress {
                cb(done, total_bytes);
            }
            continue;
        }

        let parser = MboxParser::new(file)?;
        let base = done;
        let origin = file.display().to_string();
        let file_progress = |d: u64, _t: u64| {
            if let Some(cb) = progress {
                cb(base + d, total_bytes);
            }
        };
        let count = parser.parse(
            &mut |offset, raw| {
                push_local(&mut batch, &format!("{origin}@{offset}"), raw);
                true
            },
            Some(&file_progress),
        )?;
        debug!(file = %origin, messages = count, "Scanned archive");
        done += parser.file_size();
    }

    Ok(batch.finish())
}

/// Decode with a placeholder uid, then assign the content-derived one.
fn push_local(batch: &mut BatchClassifier, origin: &str, raw: &[u8]) {
    let parsed = parse_message(origin, raw).map(|mut msg| {
        msg.uid = local_uid(msg.message_id.as_deref(), raw);
        msg
    });
    batch.push_parsed(origin, parsed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const MBOX: &str = "From a@b Mon Jan 01 00:00:00 2024\n\
From: Jane <jane@clientco.com>\n\
Subject: Website inquiry\n\
Message-ID: <m1@clientco.com>\n\
Date: Mon, 01 Jan 2024 10:00:00 +0000\n\
\n\
Please send a quote.\n\
\n\
From a@b Mon Jan 01 00:00:00 2024\n\
From: noreply@billing.example\n\
Subject: Invoice\n\
\n\
Your invoice.\n";

    #[test]
    fn test_local_uid_prefers_message_id() {
        let a = local_uid(Some("m1@x"), b"one");
        let b = local_uid(Some("m1@x"), b"two");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_ne!(local_uid(None, b"one"), local_uid(None, b"two"));
    }

    #[test]
    fn test_scan_mbox_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.mbox");
        std::fs::write(&path, MBOX).unwrap();

        let report = scan_path(&path, None).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.filtered, 1);
        assert_eq!(report.leads.len(), 1);
        assert_eq!(
            report.leads[0].id,
            format!("email-{}", local_uid(Some("m1@clientco.com"), b""))
        );
    }

    #[test]
    fn test_scan_directory_with_progress() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("inbox.mbox"), MBOX).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(
            dir.path().join("nested").join("one.eml"),
            "From: bob@acme.com\nSubject: Pricing\n\nHow much?\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = collect_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);

        let last = Cell::new((0u64, 0u64));
        let cb = |d: u64, t: u64| last.set((d, t));
        let report = scan_path(dir.path(), Some(&cb)).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.leads.len(), 2);
        let (done, total) = last.get();
        assert_eq!(done, total);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_not_walked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.eml"),
            "From: bob@acme.com\nSubject: Pricing\n\nHow much?\n",
        )
        .unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let files = collect_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.eml")]);

        let report = scan_path(dir.path(), None).unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.leads.len(), 1);
    }

    #[test]
    fn test_scan_missing_path() {
        assert!(matches!(
            scan_path(Path::new("/no/such/inbox"), None),
            Err(LeadError::FileNotFound(_))
        ));
    }
}
