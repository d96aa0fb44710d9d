//! Preparing OSRM walking datasets from Geofabrik extracts.
//!
//! Downloads a region once, then runs the OSRM toolchain in docker with the
//! foot profile (extract, partition, customize) so `osrm-routed --algorithm
//! mld` can serve walking routes from it. Every step is skipped when its
//! output already exists.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

const OSRM_IMAGE: &str = "osrm/osrm-backend";

/// Errors while preparing a dataset.
#[derive(Debug, thiserror::Error)]
pub enum OsrmDataError {
    #[error("filesystem error: {0}")]
    Io(#[from] io::Error),

    #[error("download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OSRM preprocessing failed: {0}")]
    ProcessFailure(String),
}

/// A Geofabrik extract, identified by its path on download.geofabrik.de.
#[derive(Debug, Clone)]
pub struct Region {
    /// e.g. "asia/japan/chubu"
    pub path: String,
}

impl Region {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Last path component, used to name local files.
    pub fn name(&self) -> &str {
        self.path
            .rsplit('/')
            .find(|part| !part.is_empty())
            .unwrap_or("region")
    }

    pub fn download_url(&self) -> String {
        format!("https://download.geofabrik.de/{}-latest.osm.pbf", self.path)
    }
}

/// OSRM routing profile bundled with the docker image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Foot,
    Car,
}

impl Profile {
    fn lua(&self) -> &'static str {
        match self {
            Profile::Foot => "/opt/foot.lua",
            Profile::Car => "/opt/car.lua",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Foot => "foot",
            Profile::Car => "car",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub region: Region,
    pub data_root: PathBuf,
    pub profile: Profile,
}

impl DatasetConfig {
    pub fn walking(region: Region, data_root: impl Into<PathBuf>) -> Self {
        Self {
            region,
            data_root: data_root.into(),
            profile: Profile::Foot,
        }
    }
}

/// A dataset ready for `osrm-routed`.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    /// Directory mounted as `/data` in the container.
    pub data_dir: PathBuf,
    /// Path of the `.osrm` base file.
    pub osrm_base: PathBuf,
    pub pbf_path: PathBuf,
}

impl PreparedDataset {
    /// Downloads and preprocesses the extract unless already done.
    pub fn ensure(config: &DatasetConfig) -> Result<Self, OsrmDataError> {
        let data_root = if config.data_root.is_absolute() {
            config.data_root.clone()
        } else {
            std::env::current_dir()?.join(&config.data_root)
        };
        // Profiles produce incompatible graphs, so each gets its own directory.
        let data_dir = data_root
            .join(config.region.name())
            .join(config.profile.name());
        fs::create_dir_all(&data_dir)?;

        let stem = format!("{}-latest", config.region.name());
        let pbf_path = data_dir.join(format!("{stem}.osm.pbf"));
        if !pbf_path.exists() {
            tracing::info!(url = %config.region.download_url(), "downloading OSM extract");
            download(&config.region.download_url(), &pbf_path)?;
        }

        let osrm_base = data_dir.join(format!("{stem}.osrm"));
        if !osrm_base.exists() {
            osrm_tool(
                &data_dir,
                &["osrm-extract", "-p", config.profile.lua(), &container_path(&pbf_path)],
            )?;
        }

        if !partitioned(&osrm_base) {
            osrm_tool(&data_dir, &["osrm-partition", &container_path(&osrm_base)])?;
            osrm_tool(&data_dir, &["osrm-customize", &container_path(&osrm_base)])?;
        }

        Ok(Self {
            data_dir,
            osrm_base,
            pbf_path,
        })
    }

    /// The `.osrm` path as seen from inside the container.
    pub fn container_osrm_path(&self) -> String {
        container_path(&self.osrm_base)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), OsrmDataError> {
    let bytes = reqwest::blocking::get(url)?.error_for_status()?.bytes()?;
    let partial = dest.with_extension("part");
    let mut writer = BufWriter::new(File::create(&partial)?);
    writer.write_all(&bytes)?;
    writer.flush()?;
    fs::rename(partial, dest)?;
    Ok(())
}

fn partitioned(osrm_base: &Path) -> bool {
    osrm_base.exists()
        && ["osrm.partition", "osrm.mldgr", "osrm.cells"]
            .iter()
            .all(|ext| osrm_base.with_extension(ext).exists())
}

fn osrm_tool(data_dir: &Path, args: &[&str]) -> Result<(), OsrmDataError> {
    tracing::info!(tool = args.first().copied().unwrap_or_default(), "running OSRM preprocessing");
    let status = Command::new("docker")
        .args(["run", "--rm", "-t", "-v"])
        .arg(format!("{}:/data", data_dir.display()))
        .arg(OSRM_IMAGE)
        .args(args)
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(OsrmDataError::ProcessFailure(format!(
            "{} exited with {}",
            args.first().copied().unwrap_or("docker"),
            status
        )))
    }
}

fn container_path(path: &Path) -> String {
    let file = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    format!("/data/{file}")
}
