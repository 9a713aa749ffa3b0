//! # Archive Module
//!
//! Bundles output directories into a single zip and extracts them back.
//! Pure I/O; no detection state lives here.

use crate::error::ArchiveError;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

fn zip_err(path: &Path, e: impl std::fmt::Display) -> ArchiveError {
    ArchiveError::Zip {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn io_err(path: &Path, source: io::Error) -> ArchiveError {
    ArchiveError::Create {
        path: path.to_path_buf(),
        source,
    }
}

/// Zip `directories` into a single archive at `output`
///
/// Each input directory becomes a top-level entry named after its base
/// name, with relative paths preserved beneath it. Entries are walked in
/// sorted order so the archive layout is deterministic for a given tree.
/// Inputs that are not directories are skipped with a warning.
///
/// Returns the number of file entries written.
pub fn archive_directories(
    directories: &[PathBuf],
    output: &Path,
) -> Result<usize, ArchiveError> {
    let file = File::create(output).map_err(|e| io_err(output, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut entries = 0usize;

    for directory in directories {
        if !directory.is_dir() {
            warn!("not a directory, skipping: {}", directory.display());
            continue;
        }

        let prefix = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for entry in WalkDir::new(directory).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping unreadable entry in {}: {}", directory.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(directory)
                .expect("walkdir yields paths under its root");
            let arc_name = relative
                .components()
                .fold(prefix.clone(), |mut name, component| {
                    name.push('/');
                    name.push_str(&component.as_os_str().to_string_lossy());
                    name
                });

            zip.start_file(arc_name, options)
                .map_err(|e| zip_err(output, e))?;
            let mut source = File::open(entry.path()).map_err(|e| io_err(entry.path(), e))?;
            io::copy(&mut source, &mut zip).map_err(|e| io_err(entry.path(), e))?;
            entries += 1;
        }
    }

    zip.finish().map_err(|e| zip_err(output, e))?;
    info!("archived {} entries into {}", entries, output.display());
    Ok(entries)
}

/// Extract a zip archive into `destination`, creating it if needed
pub fn extract_archive(archive_path: &Path, destination: &Path) -> Result<(), ArchiveError> {
    std::fs::create_dir_all(destination).map_err(|e| io_err(destination, e))?;
    let file = File::open(archive_path).map_err(|e| io_err(archive_path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| zip_err(archive_path, e))?;
    archive
        .extract(destination)
        .map_err(|e| zip_err(archive_path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn archive_prefixes_entries_with_directory_basename() {
        let temp = TempDir::new().unwrap();
        let images = temp.path().join("img");
        fs::create_dir_all(images.join("nested")).unwrap();
        fs::write(images.join("a.jpg"), b"a").unwrap();
        fs::write(images.join("nested/b.jpg"), b"b").unwrap();

        let output = temp.path().join("data.zip");
        let entries = archive_directories(&[images], &output).unwrap();
        assert_eq!(entries, 2);

        let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.contains(&"img/a.jpg".to_string()));
        assert!(names.contains(&"img/nested/b.jpg".to_string()));
    }

    #[test]
    fn non_directory_inputs_are_skipped() {
        let temp = TempDir::new().unwrap();
        let stray_file = temp.path().join("not-a-dir.txt");
        fs::write(&stray_file, b"text").unwrap();

        let output = temp.path().join("data.zip");
        let entries = archive_directories(&[stray_file], &output).unwrap();
        assert_eq!(entries, 0);
        assert!(output.exists());
    }

    #[test]
    fn extract_round_trips_file_content() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("results");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("report.json"), b"{}").unwrap();

        let output = temp.path().join("data.zip");
        archive_directories(&[source], &output).unwrap();

        let extracted = temp.path().join("out");
        extract_archive(&output, &extracted).unwrap();
        assert_eq!(
            fs::read(extracted.join("results/report.json")).unwrap(),
            b"{}"
        );
    }
}
