//! Download datasets and checkpoints.
use anyhow::{Context, Result};
use log::info;
use reqwest::{IntoUrl, Url};
use std::{
    fmt::Debug,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

/// Low-dimensional proficient-human demonstrations of the `Lift` task.
pub const LIFT_PH_LOW_DIM_URL: &str =
    "http://downloads.cs.stanford.edu/downloads/rt_benchmark/lift/ph/low_dim_v141.hdf5";

/// BC-RNN policy trained on [`LIFT_PH_LOW_DIM_URL`].
pub const LIFT_PH_BC_RNN_URL: &str = "http://downloads.cs.stanford.edu/downloads/rt_benchmark/model_zoo/lift/bc_rnn/lift_ph_low_dim_epoch_1000_succ_100.pth";

/// Default download directory, `~/.demorun/downloads`.
pub fn default_download_dir() -> Result<PathBuf> {
    let mut dir = dirs::home_dir().context("Couldn't find home directory")?;
    dir.push(".demorun/downloads");
    Ok(dir)
}

/// File name of the last path segment of `url`.
pub fn file_name(url: &Url) -> Result<String> {
    url.path_segments()
        .and_then(|mut s| s.next_back())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .with_context(|| format!("No file name in {}", url))
}

/// Downloads a file into `dir` and returns its path.
///
/// The download is skipped if the file already exists. `dir` is created if
/// it does not exist; [`default_download_dir`] is used if `dir` is `None`.
pub fn download<T: AsRef<Path>>(url: impl IntoUrl + Debug, dir: Option<T>) -> Result<PathBuf> {
    let url = url.into_url()?;
    let dir = match dir {
        Some(dir) => dir.as_ref().to_path_buf(),
        None => default_download_dir()?,
    };
    let path = dir.join(file_name(&url)?);

    if path.exists() {
        info!("Exists file {:?}, skips download", path);
        return Ok(path);
    }

    fs::create_dir_all(&dir).with_context(|| format!("Failed to create directory {:?}", dir))?;

    info!("Download file from {}", url);
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    let content = response.bytes()?;

    // A partial file never has the final name
    let tmp = path.with_extension("part");
    let mut file = File::create(&tmp).with_context(|| format!("Failed to create file {:?}", tmp))?;
    file.write_all(&content)?;
    file.flush()?;
    fs::rename(&tmp, &path)?;
    info!("Downloaded file as {:?}", path);

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_file_name() -> Result<()> {
        let url = Url::parse(LIFT_PH_LOW_DIM_URL)?;
        assert_eq!(file_name(&url)?, "low_dim_v141.hdf5");
        let url = Url::parse("http://example.com/")?;
        assert!(file_name(&url).is_err());
        Ok(())
    }

    #[test]
    fn test_existing_file_is_not_downloaded() -> Result<()> {
        let tmp = TempDir::new("download")?;
        let path = tmp.path().join("low_dim_v141.hdf5");
        File::create(&path)?;
        // No network access happens when the file exists
        assert_eq!(download(LIFT_PH_LOW_DIM_URL, Some(tmp.path()))?, path);
        Ok(())
    }
}
