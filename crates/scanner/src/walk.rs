use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::parser;

// NAS and OS housekeeping directories that never hold episodes.
static JUNK_DIRS: &[&str] = &["@eaDir", "#recycle", ".Trash", "$RECYCLE.BIN", "Sample", "Samples"];

/// Collect every video file under `root`, depth first, in name order.
pub fn walk_video_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let read_dir = match std::fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "cannot read directory");
                continue;
            }
        };

        let mut children: Vec<_> = read_dir.flatten().map(|entry| entry.path()).collect();
        children.sort();

        let mut subdirs = Vec::new();
        for path in children {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };

            if name.starts_with('.') || parser::should_ignore(&name) {
                debug!(path = %path.display(), "skipping ignored entry");
                continue;
            }

            if path.is_dir() {
                if JUNK_DIRS.iter().any(|junk| junk.eq_ignore_ascii_case(&name)) {
                    continue;
                }
                subdirs.push(path);
            } else if parser::is_video_file(&name) {
                found.push(path);
            }
        }

        // Reverse so the stack pops subdirectories in name order.
        pending.extend(subdirs.into_iter().rev());
    }

    found
}
