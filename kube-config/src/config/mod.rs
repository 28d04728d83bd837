//! Kubernetes client configuration from `~/.kube/config`, `$KUBECONFIG`, proxy overrides,
//! or the [cluster environment](https://kubernetes.io/docs/tasks/access-application-cluster/access-cluster/#accessing-the-api-from-a-pod).
//!
//! # Usage
//! The [`Configuration`] has several constructors plus logic to infer the environment.
//!
//! Unless you have issues, prefer using [`Configuration::infer`].
mod auth;
mod file_config;
mod file_loader;
mod incluster_config;
mod infer;
mod path_or_data;
mod utils;

use std::{collections::HashMap, sync::OnceLock};

use crate::{Error, Result};

pub use auth::AuthInfo;
pub use incluster_config::{SERVICE_HOSTENV, SERVICE_PORTENV};
pub use infer::{CONFIG_SOURCE_ENV, KUBECONFIG, PROXY_URL_ENV};
pub use path_or_data::PathOrData;

/// Namespace used when nothing else selects one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Port `kubectl proxy` listens on unless told otherwise
pub const DEFAULT_PROXY_PORT: u16 = 8001;

/// Name given to the single cluster/context of synthesized configurations
const DEFAULT_NAME: &str = "default";

/// Cluster stores information to connect to a Kubernetes cluster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cluster {
    /// The api version of the cluster block
    pub api_version: String,
    /// The address of the kubernetes cluster (https://hostname:port).
    pub server: String,
    /// Skips the validity check for the server's certificate. This will make your HTTPS connections insecure.
    pub insecure_skip_tls_verify: bool,
    /// The certificate authority, either as a file or as inline data.
    pub certificate_authority: Option<PathOrData>,
}

impl Default for Cluster {
    fn default() -> Self {
        Self {
            api_version: String::from("v1"),
            server: String::from("localhost:6443"),
            insecure_skip_tls_verify: false,
            certificate_authority: None,
        }
    }
}

/// A fully resolved pairing of a cluster, credentials and a default namespace.
///
/// Contexts embed their own copies of the cluster and credentials, so replacing a named
/// cluster on a [`Configuration`] afterwards does not change contexts built from it.
#[derive(Clone, Debug, PartialEq)]
pub struct Context {
    /// The cluster to talk to
    pub cluster: Cluster,
    /// The credentials to present
    pub auth_info: AuthInfo,
    /// The default namespace to use on unspecified requests
    pub namespace: String,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            auth_info: AuthInfo::default(),
            namespace: String::from(DEFAULT_NAMESPACE),
        }
    }
}

/// Everything a client needs to know to reach and authenticate against a cluster.
///
/// # Usage
/// Construct a [`Configuration`] by using one of the constructors, typically [`Configuration::infer`].
///
/// The `current_context` is a copy taken when the configuration was built or when
/// [`use_context`](Configuration::use_context) was last called. It does not have to
/// appear in `contexts`.
///
/// All modifiers consume the configuration and return the changed value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Configuration {
    /// Referencable names to cluster configs
    pub clusters: HashMap<String, Cluster>,
    /// Referencable names to context configs
    pub contexts: HashMap<String, Context>,
    /// The context in use
    pub current_context: Context,
    /// Referencable names to user credentials
    pub users: HashMap<String, AuthInfo>,
}

impl Configuration {
    /// Add or replace a named cluster
    #[must_use]
    pub fn with_cluster(mut self, name: impl Into<String>, cluster: Cluster) -> Self {
        self.clusters.insert(name.into(), cluster);
        self
    }

    /// Add or replace a named context
    #[must_use]
    pub fn with_context(mut self, name: impl Into<String>, context: Context) -> Self {
        self.contexts.insert(name.into(), context);
        self
    }

    /// Add or replace named user credentials
    #[must_use]
    pub fn with_user(mut self, name: impl Into<String>, auth_info: AuthInfo) -> Self {
        self.users.insert(name.into(), auth_info);
        self
    }

    /// Make `context` the current context
    #[must_use]
    pub fn use_context(mut self, context: Context) -> Self {
        self.current_context = context;
        self
    }

    /// Make the context registered under `name` the current context
    pub fn use_context_named(self, name: &str) -> Result<Self> {
        let context = self.contexts.get(name).cloned().ok_or_else(|| Error::LoadContext {
            context_name: name.to_owned(),
        })?;
        Ok(self.use_context(context))
    }

    /// Change the namespace of the current context
    #[must_use]
    pub fn set_current_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.current_context.namespace = namespace.into();
        self
    }

    /// The namespace requests default to
    pub fn current_namespace(&self) -> &str {
        &self.current_context.namespace
    }

    /// A configuration talking to an unauthenticated proxy (e.g. `kubectl proxy`) at `url`
    pub fn use_proxy_at(url: impl Into<String>) -> Self {
        let cluster = Cluster {
            server: url.into(),
            ..Cluster::default()
        };
        let context = Context {
            cluster: cluster.clone(),
            ..Context::default()
        };
        Self::default()
            .with_cluster(DEFAULT_NAME, cluster)
            .with_context(DEFAULT_NAME, context.clone())
            .use_context(context)
    }

    /// A configuration talking to a proxy on `localhost:{port}`
    pub fn use_local_proxy_on_port(port: u16) -> Self {
        Self::use_proxy_at(format!("http://localhost:{port}"))
    }

    /// A configuration talking to `kubectl proxy` on its default port
    ///
    /// Computed once per process.
    pub fn use_local_proxy_default() -> Self {
        static LOCAL_PROXY: OnceLock<Configuration> = OnceLock::new();
        LOCAL_PROXY
            .get_or_init(|| Self::use_local_proxy_on_port(DEFAULT_PROXY_PORT))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn local_proxy_on_port() {
        let config = Configuration::use_local_proxy_on_port(8080);
        assert_eq!(config.clusters.len(), 1);
        assert_eq!(config.clusters["default"].server, "http://localhost:8080");
        assert_eq!(config.current_context.cluster.server, "http://localhost:8080");
        assert_eq!(config.current_namespace(), DEFAULT_NAMESPACE);
        assert_eq!(config.current_context.auth_info, AuthInfo::None);
    }

    #[test]
    fn local_proxy_default_is_stable() {
        let first = Configuration::use_local_proxy_default();
        assert_eq!(first.current_context.cluster.server, "http://localhost:8001");
        assert_eq!(first, Configuration::use_local_proxy_default());
    }

    #[test]
    fn modifiers_leave_the_original_untouched() {
        let base = Configuration::use_proxy_at("http://proxy:9000");
        let changed = base.clone().set_current_namespace("kube-system");
        assert_eq!(base.current_namespace(), "default");
        assert_eq!(changed.current_namespace(), "kube-system");
        // only the current copy moves, the named context keeps its namespace
        assert_eq!(changed.contexts["default"].namespace, "default");
    }

    #[test]
    fn contexts_are_copies_of_clusters() {
        let cluster = Cluster {
            server: "https://a:6443".into(),
            ..Cluster::default()
        };
        let context = Context {
            cluster: cluster.clone(),
            auth_info: AuthInfo::Token {
                token: SecretString::from("t".to_owned()),
            },
            namespace: "apps".into(),
        };
        let config = Configuration::default()
            .with_cluster("a", cluster)
            .with_context("a", context.clone())
            .use_context(context)
            .with_cluster("a", Cluster {
                server: "https://b:6443".into(),
                ..Cluster::default()
            });
        assert_eq!(config.clusters["a"].server, "https://b:6443");
        assert_eq!(config.contexts["a"].cluster.server, "https://a:6443");
        assert_eq!(config.current_context.cluster.server, "https://a:6443");
    }

    #[test]
    fn use_context_named_requires_a_known_name() {
        let config = Configuration::use_proxy_at("http://p");
        assert!(config.clone().use_context_named("default").is_ok());
        assert!(matches!(
            config.use_context_named("missing"),
            Err(Error::LoadContext { context_name }) if context_name == "missing"
        ));
    }

    #[test]
    fn defaults() {
        let cluster = Cluster::default();
        assert_eq!(cluster.api_version, "v1");
        assert_eq!(cluster.server, "localhost:6443");
        assert!(!cluster.insecure_skip_tls_verify);
        assert!(cluster.certificate_authority.is_none());
        let context = Context::default();
        assert_eq!(context.namespace, "default");
        assert_eq!(context.auth_info, AuthInfo::None);
    }
}
