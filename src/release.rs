//! Release folder staging and resource copying.
//!
//! The release folder is reset at the start of every build: created when
//! absent, emptied when present. Nothing from a previous build survives,
//! including dotfiles.
//!
//! Resources are then mirrored into it with their relative paths intact:
//!
//! ```text
//! my-app/                          my-app/dist/
//! ├── index.html           →       ├── index.html
//! └── assets/                      └── assets/
//!     ├── img/             →           ├── img/   (whole directory)
//!     │   └── logo.png                 │   └── logo.png
//!     └── fonts/a.woff     →           └── fonts/a.woff
//! ```
//!
//! Resource paths are relative to the app path and may not climb out of it.
//! A directory resource that contains the release folder is copied without
//! the release folder itself.

use crate::manifest::is_contained;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("IO error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Release folder {0} exists but is not a directory")]
    NotADirectory(PathBuf),
}

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Cannot copy resource: {0}")]
    Missing(String),
    #[error("Cannot copy resource: {0} is outside the project")]
    OutsideApp(String),
    #[error("IO error copying resource {resource}: {source}")]
    Io { resource: String, source: io::Error },
    #[error("Error walking resource {resource}: {source}")]
    Walk {
        resource: String,
        source: walkdir::Error,
    },
}

/// What staging did to the release folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Created,
    Cleaned,
}

/// Kind of resource that was copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    File,
    Directory { files: usize },
}

/// One resource mirrored into the release folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedResource {
    pub resource: String,
    pub destination: PathBuf,
    pub kind: ResourceKind,
}

/// Create `release` or empty it if it already exists.
pub fn stage_release_folder(release: &Path) -> Result<StageOutcome, ReleaseError> {
    let io_err = |source| ReleaseError::Io {
        path: release.to_path_buf(),
        source,
    };

    if !release.exists() {
        fs::create_dir_all(release).map_err(io_err)?;
        return Ok(StageOutcome::Created);
    }

    if !release.is_dir() {
        return Err(ReleaseError::NotADirectory(release.to_path_buf()));
    }

    for entry in fs::read_dir(release).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        // symlink_metadata so a symlinked directory is unlinked, not followed
        let is_dir = fs::symlink_metadata(&path)
            .map(|m| m.is_dir())
            .map_err(|source| ReleaseError::Io {
                path: path.clone(),
                source,
            })?;
        let removed = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|source| ReleaseError::Io { path, source })?;
    }

    Ok(StageOutcome::Cleaned)
}

/// Copy every resource into `release`, in order.
///
/// Resource paths resolve against `app`. `on_copied` is called after each
/// resource lands.
pub fn copy_resources(
    app: &Path,
    resources: &[String],
    release: &Path,
    mut on_copied: impl FnMut(&CopiedResource),
) -> Result<Vec<CopiedResource>, ResourceError> {
    let mut copied = Vec::with_capacity(resources.len());
    for resource in resources {
        let entry = copy_resource(app, resource, release)?;
        on_copied(&entry);
        copied.push(entry);
    }
    Ok(copied)
}

/// Copy a single file or directory resource into `release`.
pub fn copy_resource(
    app: &Path,
    resource: &str,
    release: &Path,
) -> Result<CopiedResource, ResourceError> {
    let relative = Path::new(resource);
    if !is_contained(relative) {
        return Err(ResourceError::OutsideApp(resource.to_string()));
    }

    let source = app.join(relative);
    let is_dir = source.is_dir();
    if !is_dir && !source.is_file() {
        return Err(ResourceError::Missing(resource.to_string()));
    }

    let io_err = |source| ResourceError::Io {
        resource: resource.to_string(),
        source,
    };

    let destination = release.join(relative);
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let kind = if is_dir {
        let files = copy_dir_recursive(resource, &source, &destination, release)?;
        ResourceKind::Directory { files }
    } else {
        fs::copy(&source, &destination).map_err(io_err)?;
        ResourceKind::File
    };

    Ok(CopiedResource {
        resource: resource.to_string(),
        destination,
        kind,
    })
}

/// Mirror `src` into `dst`, returning the number of files copied.
///
/// `release` is never descended into, otherwise a resource that contains
/// it would keep walking the copy it is writing.
fn copy_dir_recursive(
    resource: &str,
    src: &Path,
    dst: &Path,
    release: &Path,
) -> Result<usize, ResourceError> {
    let io_err = |source| ResourceError::Io {
        resource: resource.to_string(),
        source,
    };

    let release = fs::canonicalize(release).ok();
    let outside_release = |entry: &walkdir::DirEntry| {
        !entry.file_type().is_dir()
            || release.is_none()
            || fs::canonicalize(entry.path()).ok() != release
    };

    let mut files = 0;
    for entry in WalkDir::new(src)
        .follow_links(true)
        .into_iter()
        .filter_entry(outside_release)
    {
        let entry = entry.map_err(|source| ResourceError::Walk {
            resource: resource.to_string(),
            source,
        })?;
        // strip_prefix cannot fail: every entry lives under `src`
        let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(io_err)?;
        } else {
            fs::copy(entry.path(), &target).map_err(io_err)?;
            files += 1;
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{read, write_file};
    use tempfile::TempDir;

    #[test]
    fn stage_creates_missing_folder() {
        let tmp = TempDir::new().unwrap();
        let release = tmp.path().join("dist");
        assert_eq!(stage_release_folder(&release).unwrap(), StageOutcome::Created);
        assert!(release.is_dir());
    }

    #[test]
    fn stage_creates_nested_folder() {
        let tmp = TempDir::new().unwrap();
        let release = tmp.path().join("build/release");
        assert_eq!(stage_release_folder(&release).unwrap(), StageOutcome::Created);
        assert!(release.is_dir());
    }

    #[test]
    fn stage_cleans_existing_folder() {
        let tmp = TempDir::new().unwrap();
        let release = tmp.path().join("dist");
        write_file(&release, "stale.js", "old");
        write_file(&release, ".hidden", "old");
        write_file(&release, "img/old.png", "old");

        assert_eq!(stage_release_folder(&release).unwrap(), StageOutcome::Cleaned);
        assert!(release.is_dir());
        assert_eq!(fs::read_dir(&release).unwrap().count(), 0);
    }

    #[test]
    fn stage_rejects_file_in_the_way() {
        let tmp = TempDir::new().unwrap();
        let release = write_file(tmp.path(), "dist", "not a dir");
        assert!(matches!(
            stage_release_folder(&release),
            Err(ReleaseError::NotADirectory(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn stage_unlinks_symlinked_dirs_without_following() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("keep");
        write_file(&outside, "precious.txt", "keep me");
        let release = tmp.path().join("dist");
        fs::create_dir_all(&release).unwrap();
        std::os::unix::fs::symlink(&outside, release.join("link")).unwrap();

        stage_release_folder(&release).unwrap();
        assert!(!release.join("link").exists());
        assert_eq!(read(&outside.join("precious.txt")), "keep me");
    }

    #[test]
    fn file_copy_preserves_structure() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "assets/img/logo.png", "png");
        let release = tmp.path().join("dist");

        let copied = copy_resource(tmp.path(), "assets/img/logo.png", &release).unwrap();
        assert_eq!(copied.kind, ResourceKind::File);
        assert_eq!(copied.destination, release.join("assets/img/logo.png"));
        assert_eq!(read(&release.join("assets/img/logo.png")), "png");
    }

    #[test]
    fn directory_copy_preserves_structure() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "assets/img/logo.png", "png");
        write_file(tmp.path(), "assets/img/icons/a.svg", "svg");
        let release = tmp.path().join("dist");

        let copied = copy_resource(tmp.path(), "assets/img", &release).unwrap();
        assert_eq!(copied.kind, ResourceKind::Directory { files: 2 });
        assert_eq!(read(&release.join("assets/img/logo.png")), "png");
        assert_eq!(read(&release.join("assets/img/icons/a.svg")), "svg");
    }

    #[test]
    fn top_level_resources_land_at_release_root() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "index.html", "<html>");
        write_file(tmp.path(), "fonts/a.woff", "woff");
        let release = tmp.path().join("dist");

        let resources = vec!["./index.html".to_string(), "fonts".to_string()];
        let mut seen = Vec::new();
        let copied =
            copy_resources(tmp.path(), &resources, &release, |c| seen.push(c.resource.clone()))
                .unwrap();

        assert_eq!(copied.len(), 2);
        assert_eq!(seen, resources);
        assert_eq!(read(&release.join("index.html")), "<html>");
        assert_eq!(read(&release.join("fonts/a.woff")), "woff");
    }

    #[test]
    fn copies_clobber_existing_files() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "robots.txt", "new");
        let release = tmp.path().join("dist");
        write_file(&release, "robots.txt", "old");

        copy_resource(tmp.path(), "robots.txt", &release).unwrap();
        assert_eq!(read(&release.join("robots.txt")), "new");
    }

    #[test]
    fn directory_containing_release_skips_it() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "public/index.html", "<html>");
        write_file(tmp.path(), "public/img/logo.png", "png");
        let release = tmp.path().join("public/dist");
        stage_release_folder(&release).unwrap();

        let copied = copy_resource(tmp.path(), "public", &release).unwrap();

        assert_eq!(copied.kind, ResourceKind::Directory { files: 2 });
        assert_eq!(read(&release.join("public/index.html")), "<html>");
        assert_eq!(read(&release.join("public/img/logo.png")), "png");
        assert!(!release.join("public/dist").exists());
    }

    #[test]
    fn rejects_resources_outside_project() {
        let tmp = TempDir::new().unwrap();
        for resource in ["../secret.txt", "/etc/passwd", "."] {
            assert!(matches!(
                copy_resource(tmp.path(), resource, &tmp.path().join("dist")),
                Err(ResourceError::OutsideApp(_))
            ));
        }
    }

    #[test]
    fn missing_resource_error_names_entry() {
        let tmp = TempDir::new().unwrap();
        let release = tmp.path().join("dist");
        let err = copy_resource(tmp.path(), "img/missing.png", &release).unwrap_err();
        assert!(matches!(&err, ResourceError::Missing(r) if r == "img/missing.png"));
        assert_eq!(err.to_string(), "Cannot copy resource: img/missing.png");
        assert!(!release.exists());
    }

    #[test]
    fn stops_at_first_missing_resource() {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "a.txt", "a");
        write_file(tmp.path(), "c.txt", "c");
        let release = tmp.path().join("dist");
        let resources = vec!["a.txt".to_string(), "b.txt".to_string(), "c.txt".to_string()];

        let err = copy_resources(tmp.path(), &resources, &release, |_| {}).unwrap_err();
        assert!(matches!(err, ResourceError::Missing(r) if r == "b.txt"));
        assert!(release.join("a.txt").exists());
        assert!(!release.join("c.txt").exists());
    }
}
