use std::{env, path::PathBuf};

use super::{utils, Configuration};
use crate::{Error, Result};

/// Points the process at an unauthenticated proxy url, overriding every other source
pub const PROXY_URL_ENV: &str = "KUBE_CLUSTER_URL";
/// Selects the source explicitly: `file`, `proxy`, or a `file://` url of a kubeconfig
pub const CONFIG_SOURCE_ENV: &str = "KUBE_CONFIG_SOURCE";
/// Path of the kubeconfig file to use instead of `~/.kube/config`
pub const KUBECONFIG: &str = "KUBECONFIG";

/// A source consulted by [`Configuration::infer`]; `None` when its variable is not set
type Resolver = fn() -> Option<Result<Configuration>>;

/// Environment driven sources, in order of precedence
const OVERRIDES: [(&str, Resolver); 3] = [
    (PROXY_URL_ENV, from_proxy_url_env),
    (CONFIG_SOURCE_ENV, from_config_source_env),
    (KUBECONFIG, from_kubeconfig_env),
];

impl Configuration {
    /// Infer the configuration from the environment
    ///
    /// Sources are tried in this order, and the first one that is set decides the outcome:
    ///
    /// 1. `KUBE_CLUSTER_URL`: an unauthenticated proxy at that url
    /// 2. `KUBE_CONFIG_SOURCE`: `file` for `~/.kube/config`, `proxy` for `kubectl proxy` on its
    ///    default port, anything else is read as the `file://` url of a kubeconfig
    /// 3. `KUBECONFIG`: the kubeconfig at that path
    /// 4. the [in-cluster](Configuration::in_cluster) environment, and if that is unavailable,
    ///    `~/.kube/config`
    ///
    /// Failures of the chosen source are returned as they are. Only a failed in-cluster attempt
    /// is recovered from, by falling back to the default kubeconfig.
    pub fn infer() -> Result<Self> {
        resolve_chain(&OVERRIDES, || {
            recover_with(Self::in_cluster(), Self::from_default_kubeconfig)
        })
    }

    /// Create configuration from `~/.kube/config`
    pub fn from_default_kubeconfig() -> Result<Self> {
        Self::read_from(utils::default_kube_path()?)
    }
}

fn resolve_chain(
    overrides: &[(&str, Resolver)],
    otherwise: impl FnOnce() -> Result<Configuration>,
) -> Result<Configuration> {
    for (source, resolve) in overrides {
        if let Some(result) = resolve() {
            tracing::debug!("resolving configuration from {}", source);
            return result;
        }
        tracing::trace!("{} is not set", source);
    }
    otherwise()
}

fn recover_with(
    primary: Result<Configuration>,
    fallback: impl FnOnce() -> Result<Configuration>,
) -> Result<Configuration> {
    primary.or_else(|err| {
        tracing::debug!("No in-cluster config found: {}", err);
        tracing::debug!("Falling back to local kubeconfig");
        fallback()
    })
}

fn from_proxy_url_env() -> Option<Result<Configuration>> {
    non_empty_env(PROXY_URL_ENV).map(|url| Ok(Configuration::use_proxy_at(url)))
}

fn from_config_source_env() -> Option<Result<Configuration>> {
    let source = non_empty_env(CONFIG_SOURCE_ENV)?;
    Some(match source.as_str() {
        "file" => Configuration::from_default_kubeconfig(),
        "proxy" => Ok(Configuration::use_local_proxy_default()),
        url => file_url_to_path(url).and_then(Configuration::read_from),
    })
}

fn from_kubeconfig_env() -> Option<Result<Configuration>> {
    non_empty_env(KUBECONFIG).map(Configuration::read_from)
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn file_url_to_path(value: &str) -> Result<PathBuf> {
    let invalid = || Error::InvalidFileUrl { url: value.to_owned() };
    url::Url::parse(value)
        .map_err(|_| invalid())?
        .to_file_path()
        .map_err(|_| invalid())
}
