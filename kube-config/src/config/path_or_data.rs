use std::path::{Component, Path, PathBuf};

use base64::Engine;

use super::utils;
use crate::{Error, Result};

/// Credential material given either as a file reference or inline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathOrData {
    /// A file to read the material from
    Path(PathBuf),
    /// The decoded material itself
    Data(Vec<u8>),
}

impl PathOrData {
    /// Builds from a kubeconfig `(path, data)` key pair.
    ///
    /// Inline data always wins over the path. Relative paths are resolved against
    /// `base_dir` (the directory of the kubeconfig file) when one is known.
    pub(crate) fn resolve(
        path: Option<&str>,
        data: Option<&str>,
        data_field: &'static str,
        base_dir: Option<&Path>,
    ) -> Result<Option<Self>> {
        if let Some(data) = data {
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(data)
                .map_err(|source| Error::Base64Decode {
                    field: data_field,
                    source,
                })?;
            return Ok(Some(Self::Data(decoded)));
        }
        Ok(path.map(|path| Self::Path(resolve_path(Path::new(path), base_dir))))
    }

    /// Reads the material, going to disk for the [`PathOrData::Path`] variant
    pub fn load(&self) -> Result<Vec<u8>> {
        match self {
            Self::Path(path) => utils::read_file(path),
            Self::Data(data) => Ok(data.clone()),
        }
    }
}

fn resolve_path(path: &Path, base_dir: Option<&Path>) -> PathBuf {
    match base_dir {
        Some(dir) if path.is_relative() => normalize(&normalize(dir).join(normalize(path))),
        _ => path.to_path_buf(),
    }
}

/// Lexically removes `.` and `..` components without touching the filesystem.
///
/// Leading `..` components of relative paths are kept, `..` directly under the root is dropped.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn data_wins_over_path() {
        let resolved = PathOrData::resolve(Some("ca.crt"), Some("aGVsbG8K"), "x-data", Some(Path::new("/k")))
            .unwrap()
            .unwrap();
        assert_eq!(resolved, PathOrData::Data(b"hello\n".to_vec()));
    }

    #[test]
    fn relative_path_joins_base_dir() {
        let base_dir = Path::new("/home/me/./.kube");
        let resolved = PathOrData::resolve(Some("./certs/../ca.crt"), None, "x-data", Some(base_dir))
            .unwrap()
            .unwrap();
        assert_eq!(resolved, PathOrData::Path(PathBuf::from("/home/me/.kube/ca.crt")));
    }

    #[test]
    fn relative_path_can_escape_base_dir() {
        let base_dir = Path::new("/home/me/.kube");
        let resolved = PathOrData::resolve(Some("../shared/ca.crt"), None, "x-data", Some(base_dir))
            .unwrap()
            .unwrap();
        assert_eq!(resolved, PathOrData::Path(PathBuf::from("/home/me/shared/ca.crt")));
    }

    #[test]
    fn absolute_path_ignores_base_dir() {
        let base_dir = Path::new("/home/me/.kube");
        let resolved = PathOrData::resolve(Some("/etc/ca/../ca.crt"), None, "x-data", Some(base_dir))
            .unwrap()
            .unwrap();
        assert_eq!(resolved, PathOrData::Path(PathBuf::from("/etc/ca/../ca.crt")));
    }

    #[test]
    fn relative_path_without_base_dir_is_untouched() {
        let resolved = PathOrData::resolve(Some("certs/ca.crt"), None, "x-data", None)
            .unwrap()
            .unwrap();
        assert_eq!(resolved, PathOrData::Path(PathBuf::from("certs/ca.crt")));
    }

    #[test]
    fn neither_key_is_none() {
        assert_eq!(PathOrData::resolve(None, None, "x-data", None).unwrap(), None);
    }

    #[test]
    fn invalid_base64_names_the_field() {
        let err = PathOrData::resolve(None, Some("not base64!"), "client-key-data", None).unwrap_err();
        assert!(matches!(err, Error::Base64Decode { field: "client-key-data", .. }));
    }

    #[test]
    fn normalize_paths() {
        assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize(Path::new("../a/..")), PathBuf::from(".."));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn load_reads_either_variant() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "from disk").unwrap();
        let from_path = PathOrData::Path(file.path().to_path_buf());
        assert_eq!(from_path.load().unwrap(), b"from disk".to_vec());
        assert_eq!(PathOrData::Data(b"inline".to_vec()).load().unwrap(), b"inline".to_vec());

        let missing = PathOrData::Path(PathBuf::from("/definitely/not/here"));
        assert!(matches!(missing.load(), Err(Error::ReadFile { .. })));
    }
}
