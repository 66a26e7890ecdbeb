//! # Tree Walker Module
//!
//! Attraversamento depth-first dell'albero sorgente con mirroring delle directory.
//!
//! ## Garanzie:
//! - Una sola entry in elaborazione alla volta, anche attraverso le discese ricorsive
//! - Fratelli visitati in ordine di nome, in modo deterministico
//! - La directory speculare viene creata prima di visitare qualsiasi suo contenuto
//! - Un sottoalbero viene esaurito prima di passare al fratello successivo
//! - Il primo errore (listing, stat, mkdir o visitor) interrompe tutta la scansione
//!
//! ## Esempio:
//! ```text
//! src/a/b/file.png  ->  on_directory(a), mkdir dest/a,
//!                       on_directory(a/b), mkdir dest/a/b,
//!                       on_file(a/b/file.png)
//! ```

use crate::error::{IoContext, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// One filesystem object seen during the walk
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEntry {
    /// Path of the object in the source tree
    pub path: PathBuf,
    /// Directory containing the object, relative to the scan root
    pub relative_dir: PathBuf,
    pub file_name: String,
    /// File name without its extension
    pub stem: String,
    /// Extension as written on disk, without the dot (empty if none)
    pub extension: String,
    pub extension_lower: String,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Same object's location in the destination tree
    pub mirror_path: PathBuf,
}

impl TreeEntry {
    /// Path in the mirrored tree with the extension replaced
    pub fn mirror_path_with_extension(&self, extension: &str) -> PathBuf {
        self.mirror_path.with_file_name(format!("{}.{}", self.stem, extension))
    }
}

/// What to do with the contents of a directory after `on_directory`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    Yes,
    Skip,
}

/// Callbacks driven by [`TreeWalker::walk`]
#[async_trait]
pub trait TreeVisitor: Send {
    /// Called for every regular file; the walk waits for it to finish.
    async fn on_file(&mut self, entry: &TreeEntry) -> Result<()>;

    /// Called for every directory before its mirror is created.
    async fn on_directory(&mut self, _entry: &TreeEntry) -> Result<Descend> {
        Ok(Descend::Yes)
    }
}

/// Number of entries handed to the visitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub files: u64,
    pub dirs: u64,
}

/// Depth-first, strictly sequential walker that mirrors directories
pub struct TreeWalker {
    source_root: PathBuf,
    dest_root: PathBuf,
    recursive: bool,
}

impl TreeWalker {
    pub fn new(source_root: &Path, dest_root: &Path, recursive: bool) -> Self {
        Self {
            source_root: source_root.to_path_buf(),
            dest_root: dest_root.to_path_buf(),
            recursive,
        }
    }

    /// Walk the source tree, stopping at the first error.
    pub async fn walk<V: TreeVisitor + ?Sized>(&self, visitor: &mut V) -> Result<WalkSummary> {
        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut entries = WalkDir::new(&self.source_root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();
        let mut summary = WalkSummary::default();

        while let Some(entry) = entries.next() {
            let entry = entry?;
            let file_type = entry.file_type();

            if file_type.is_dir() {
                let tree_entry = self.tree_entry(entry.path(), 0);
                debug!("Directory: {}", tree_entry.path.display());

                let descend = visitor.on_directory(&tree_entry).await?;
                tokio::fs::create_dir_all(&tree_entry.mirror_path)
                    .await
                    .at(&tree_entry.mirror_path)?;
                summary.dirs += 1;

                if descend == Descend::Skip {
                    entries.skip_current_dir();
                }
            } else if file_type.is_file() {
                let size = entry.metadata()?.len();
                let tree_entry = self.tree_entry(entry.path(), size);

                visitor.on_file(&tree_entry).await?;
                summary.files += 1;
            } else {
                debug!("Skipping special file: {}", entry.path().display());
            }
        }

        Ok(summary)
    }

    fn tree_entry(&self, path: &Path, size: u64) -> TreeEntry {
        let relative = path.strip_prefix(&self.source_root).unwrap_or(path);
        let relative_dir = relative.parent().unwrap_or(Path::new("")).to_path_buf();

        let os_str_to_string =
            |s: Option<&std::ffi::OsStr>| s.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let file_name = os_str_to_string(path.file_name());
        let extension = os_str_to_string(path.extension());

        TreeEntry {
            path: path.to_path_buf(),
            mirror_path: self.dest_root.join(&relative_dir).join(&file_name),
            relative_dir,
            stem: os_str_to_string(path.file_stem()),
            extension_lower: extension.to_lowercase(),
            extension,
            file_name,
            size,
        }
    }
}
