use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{Error, Result};

/// Returns kubeconfig path from `$HOME/.kube/config`.
pub fn default_kube_path() -> Result<PathBuf> {
    home::home_dir()
        .map(|h| h.join(".kube").join("config"))
        .ok_or(Error::NoHomeDirectory)
}

pub fn read_file<P: AsRef<Path>>(file: P) -> Result<Vec<u8>> {
    fs::read(&file).map_err(|source| read_error(file.as_ref(), source))
}

pub fn read_file_to_string<P: AsRef<Path>>(file: P) -> Result<String> {
    fs::read_to_string(&file).map_err(|source| read_error(file.as_ref(), source))
}

fn read_error(path: &Path, source: std::io::Error) -> Error {
    Error::ReadFile {
        path: path.into(),
        source: Arc::new(source),
    }
}
