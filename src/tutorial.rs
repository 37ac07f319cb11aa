//! Fetches the lid-driven cavity tutorial case.
//!
//! A system installation of the OpenFOAM examples is preferred; otherwise the
//! case files are downloaded from the OpenFOAM repository.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::error::TutorialError;

/// Location of the cavity case in the `openfoam-examples` package.
pub const CAVITY_SYSTEM_DIR: &str =
    "/usr/share/doc/openfoam-examples/examples/incompressible/icoFoam/cavity/cavity";

/// Raw file URL prefix of the cavity case in the ESI OpenFOAM repository.
pub const CAVITY_BASE_URL: &str = "https://develop.openfoam.com/Development/openfoam/-/raw/master/tutorials/incompressible/icoFoam/cavity/cavity/";

/// Files that make up a runnable cavity case.
pub const CAVITY_FILES: [&str; 7] = [
    "system/controlDict",
    "system/fvSchemes",
    "system/fvSolution",
    "system/blockMeshDict",
    "0/U",
    "0/p",
    "constant/transportProperties",
];

const CASE_DIRS: [&str; 3] = ["0", "constant", "system"];

/// Materializes a tutorial case into a directory.
#[derive(Debug, Clone)]
pub struct TutorialFetcher {
    system_dir: PathBuf,
    base_url: String,
    client: reqwest::Client,
}

impl TutorialFetcher {
    /// Fetcher for the icoFoam cavity case.
    pub fn cavity() -> Self {
        Self {
            system_dir: PathBuf::from(CAVITY_SYSTEM_DIR),
            base_url: CAVITY_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Overrides where the system installation is looked up.
    pub fn with_system_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.system_dir = dir.into();
        self
    }

    /// Overrides the download URL prefix. Must end with `/`.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Places the case files directly in `target_dir` and returns it.
    ///
    /// An existing case in `target_dir` is reused as is. A failed download
    /// removes `target_dir`.
    pub async fn fetch(&self, target_dir: &Path) -> Result<PathBuf, TutorialError> {
        std::fs::create_dir_all(target_dir)?;

        if is_case(target_dir) {
            info!(target = %target_dir.display(), "Using existing tutorial");
            return Ok(target_dir.to_path_buf());
        }

        if is_case(&self.system_dir) {
            info!(source = %self.system_dir.display(), "Copying tutorial from system installation");
            match copy_tree(&self.system_dir, target_dir) {
                Ok(()) if is_case(target_dir) => {
                    info!(target = %target_dir.display(), "Tutorial copied");
                    return Ok(target_dir.to_path_buf());
                }
                Ok(()) => warn!("System copy incomplete, falling back to download"),
                Err(e) => warn!(error = %e, "Failed to copy from system"),
            }
        }

        info!(url = %self.base_url, "Downloading tutorial");
        for dir in CASE_DIRS {
            std::fs::create_dir_all(target_dir.join(dir))?;
        }

        let mut failures = Vec::new();
        for file in CAVITY_FILES {
            if let Err(e) = self.download(file, &target_dir.join(file)).await {
                error!(file, error = %e, "Failed to download");
                failures.push(format!("{file}: {e}"));
            }
        }

        if !is_case(target_dir) {
            let _ = std::fs::remove_dir_all(target_dir);
            let reason = if failures.is_empty() {
                "controlDict not found after download".to_string()
            } else {
                failures.join("; ")
            };
            return Err(TutorialError::Download(reason));
        }

        info!(target = %target_dir.display(), "Tutorial downloaded");
        Ok(target_dir.to_path_buf())
    }

    async fn download(&self, file: &str, dest: &Path) -> Result<(), TutorialError> {
        let url = format!("{}{}", self.base_url, file);
        info!(%url, "Downloading");

        let body = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TutorialError::Download(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| TutorialError::Download(e.to_string()))?;

        tokio::fs::write(dest, &body).await?;
        Ok(())
    }
}

impl Default for TutorialFetcher {
    fn default() -> Self {
        Self::cavity()
    }
}

/// Fetches the cavity tutorial into `target_dir`.
pub async fn fetch_cavity_tutorial(
    target_dir: impl AsRef<Path>,
) -> Result<PathBuf, TutorialError> {
    TutorialFetcher::cavity().fetch(target_dir.as_ref()).await
}

fn is_case(dir: &Path) -> bool {
    dir.join("system").join("controlDict").is_file()
}

fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        let dest = dst.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
