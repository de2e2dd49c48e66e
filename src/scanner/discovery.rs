use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, TemplateError};
use crate::types::InstalledPackage;

/// Supplies the set of installed packages to scan.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageSource: Send + Sync {
    async fn list_packages(&self) -> Result<Vec<InstalledPackage>>;
}

/// Enumerates packages installed in a list of library directories.
///
/// Every immediate subdirectory of a library is a package named after the
/// directory. When a package is installed in more than one library, the
/// earliest library wins.
#[derive(Debug, Clone)]
pub struct LibraryScanner {
    library_paths: Vec<PathBuf>,
}

impl LibraryScanner {
    pub fn new(library_paths: Vec<PathBuf>) -> Self {
        Self { library_paths }
    }

    fn scan_library(&self, library: &Path) -> Result<Vec<InstalledPackage>> {
        if !library.is_dir() {
            return Err(TemplateError::Enumeration {
                path: library.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }

        let mut packages = Vec::new();
        let walker = WalkDir::new(library)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(library = %library.display(), error = %e, "Skipping unreadable library entry");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            // Hidden directories and install lock dirs (00LOCK-*) are not packages
            if name.starts_with('.') || name.starts_with("00LOCK") {
                continue;
            }
            packages.push(InstalledPackage::new(name, entry.path()));
        }

        Ok(packages)
    }

    fn scan_all(&self) -> Vec<InstalledPackage> {
        let mut seen = HashSet::new();
        let mut packages = Vec::new();

        for library in &self.library_paths {
            match self.scan_library(library) {
                Ok(found) => {
                    debug!(library = %library.display(), count = found.len(), "Enumerated library");
                    packages.extend(found.into_iter().filter(|p| seen.insert(p.name.clone())));
                }
                Err(e) => warn!(error = %e, "Failed to enumerate library"),
            }
        }

        packages
    }
}

#[async_trait]
impl PackageSource for LibraryScanner {
    async fn list_packages(&self) -> Result<Vec<InstalledPackage>> {
        let scanner = self.clone();
        tokio::task::spawn_blocking(move || scanner.scan_all())
            .await
            .map_err(|e| TemplateError::Enumeration {
                path: PathBuf::new(),
                message: e.to_string(),
            })
    }
}
