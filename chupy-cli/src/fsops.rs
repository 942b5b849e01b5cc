//! Filesystem plumbing for the CLI: directory walking, parallel file
//! reads, archive extraction, and path-annotated I/O errors.

use chupy_archive::ChupyDirArchive;
use chupy_core::error::{ChupyError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};

/// Read a whole file, annotating errors with the path.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| annotate(path, e))
}

/// Write a whole file, annotating errors with the path.
pub fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).map_err(|e| annotate(path, e))
}

/// Collect every regular file under `root` and read their contents in
/// parallel, returning (relative path, contents) pairs.
///
/// Entries are sorted by path so the resulting archive does not depend
/// on directory-listing order.
pub fn read_dir_files(root: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let mut paths = Vec::new();
    walk(root, root, &mut paths)?;

    if paths.is_empty() {
        return Err(ChupyError::invalid_args(format!(
            "no files found under {}",
            root.display()
        )));
    }

    paths.sort_by(|a, b| a.0.cmp(&b.0));

    paths
        .into_par_iter()
        .map(|(name, path)| Ok((name, read_file(&path)?)))
        .collect()
}

/// Recursive directory walk, recording relative names with forward
/// slashes.
fn walk(dir: &Path, root: &Path, out: &mut Vec<(String, PathBuf)>) -> Result<()> {
    for entry in std::fs::read_dir(dir).map_err(|e| annotate(dir, e))? {
        let entry = entry.map_err(|e| annotate(dir, e))?;
        let path = entry.path();

        if path.is_dir() {
            walk(&path, root, out)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            out.push((relative, path));
        }
    }
    Ok(())
}

/// Extract every entry of an archive under `output`, creating parent
/// directories as needed.
pub fn extract_archive(archive: &ChupyDirArchive, output: &Path) -> Result<()> {
    std::fs::create_dir_all(output).map_err(|e| annotate(output, e))?;

    let pb = create_progress_bar(archive.entries().len() as u64);
    pb.set_message("files");

    for (name, data) in archive.files() {
        let file_path = output.join(sanitize(name));
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| annotate(parent, e))?;
        }
        write_file(&file_path, data)?;
        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(())
}

/// Strip path components that would escape the output directory.
fn sanitize(name: &str) -> PathBuf {
    name.split('/')
        .filter(|c| !c.is_empty() && *c != "." && *c != "..")
        .collect()
}

/// Create a progress bar with standard styling.
fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is valid")
            .progress_chars("█▓▒░ "),
    );
    pb
}

/// Attach the offending path to an I/O error.
fn annotate(path: &Path, err: io::Error) -> ChupyError {
    ChupyError::Io(io::Error::new(
        err.kind(),
        format!("{}: {err}", path.display()),
    ))
}
