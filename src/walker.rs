use crossbeam_channel::Sender;
use jwalk::WalkDir;
use log::{debug, info, warn};
use std::path::Path;

use crate::cancel::{self, CancelFlag};
use crate::error::WalkError;
use crate::paths;
use crate::tree::FileRecord;

/// One item of the walker's output stream.
#[derive(Debug)]
pub enum FileEvent {
    File(FileRecord),
    Error(WalkError),
}

fn scan_threads() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cores * 2).clamp(4, 64)
}

/// Walk `root` and stream every entry into `events`.
///
/// Directories are always sent before their contents, and every path is
/// clean. Directories carry size 0; their totals come from the tree. The
/// stream ends when `events` is dropped on return, which happens once the
/// walk is exhausted, the receiver hangs up, or `cancel` fires.
pub fn walk(root: &Path, events: Sender<FileEvent>, cancel: &CancelFlag) {
    let root_path = paths::clean(&paths::from_os(root));
    info!("Walking {root_path}");

    let metadata = match std::fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(source) => {
            let err = WalkError::Io {
                path: root.to_path_buf(),
                source,
            };
            let _ = cancel::send(cancel, &events, FileEvent::Error(err));
            return;
        }
    };
    if !metadata.is_dir() {
        let err = WalkError::NotADirectory(root.to_path_buf());
        let _ = cancel::send(cancel, &events, FileEvent::Error(err));
        return;
    }

    if cancel::send(cancel, &events, FileEvent::File(FileRecord::dir(root_path.clone()))).is_err() {
        return;
    }

    let walker = WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .sort(true)
        .min_depth(1)
        .parallelism(jwalk::Parallelism::RayonNewPool(scan_threads()));

    for entry in walker {
        let event = match entry {
            Ok(entry) => {
                let path = paths::clean(&paths::from_os(&entry.path()));
                if entry.file_type().is_dir() {
                    FileEvent::File(FileRecord::dir(path))
                } else {
                    match entry.metadata() {
                        Ok(metadata) => FileEvent::File(FileRecord::file(path, metadata.len() as i64)),
                        Err(err) => {
                            warn!("Skipping {path}: {err}");
                            FileEvent::Error(err.into())
                        }
                    }
                }
            }
            Err(err) => {
                warn!("Walk error: {err}");
                FileEvent::Error(err.into())
            }
        };

        if cancel::send(cancel, &events, event).is_err() {
            debug!("Walk of {root_path} interrupted");
            return;
        }
    }

    info!("Finished walking {root_path}");
}
