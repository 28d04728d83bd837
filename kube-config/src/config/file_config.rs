//! Serde mirror of the on-disk kubeconfig format.
//!
//! Every field is optional here; the loader decides what is required and what gets defaulted.
use std::collections::HashMap;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

/// [`Kubeconfig`] is the document found in `~/.kube/config`, as written.
///
/// An analogue of the [config type from client-go](https://github.com/kubernetes/client-go/blob/7697067af71046b18e03dbda04e01a5bb17f9809/tools/clientcmd/api/types.go),
/// limited to the keys this crate resolves.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Kubeconfig {
    /// Referencable names to cluster configs
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub clusters: Vec<NamedCluster>,
    /// Referencable names to user configs
    #[serde(rename = "users")]
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub auth_infos: Vec<NamedAuthInfo>,
    /// Referencable names to context configs
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub contexts: Vec<NamedContext>,
    /// The name of the context that you would like to use by default
    #[serde(rename = "current-context")]
    pub current_context: Option<String>,
}

/// NamedCluster associates name with cluster.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct NamedCluster {
    /// Name of cluster
    pub name: Option<String>,
    /// Information about how to communicate with a kubernetes cluster
    pub cluster: Option<Cluster>,
}

/// Cluster block as written in the file.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Cluster {
    #[serde(rename = "api-version")]
    pub api_version: Option<String>,
    pub server: Option<String>,
    #[serde(rename = "insecure-skip-tls-verify")]
    pub insecure_skip_tls_verify: Option<bool>,
    /// The path to a cert file for the certificate authority.
    #[serde(rename = "certificate-authority")]
    pub certificate_authority: Option<String>,
    /// Base64 PEM-encoded certificate authority certificates. Overrides `certificate_authority`
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: Option<String>,
}

/// NamedAuthInfo associates name with authentication.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct NamedAuthInfo {
    /// Name of the user
    pub name: Option<String>,
    /// Information that describes identity of the user
    #[serde(rename = "user")]
    pub auth_info: Option<AuthInfo>,
}

/// User block as written in the file.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct AuthInfo {
    /// The username for basic authentication to the kubernetes cluster.
    pub username: Option<String>,
    /// The password for basic authentication to the kubernetes cluster.
    #[serde(default, deserialize_with = "deserialize_secretstring")]
    pub password: Option<SecretString>,

    /// The bearer token for authentication to the kubernetes cluster.
    #[serde(default, deserialize_with = "deserialize_secretstring")]
    pub token: Option<SecretString>,

    /// Path to a client cert file for TLS.
    #[serde(rename = "client-certificate")]
    pub client_certificate: Option<String>,
    /// PEM-encoded data from a client cert file for TLS. Overrides `client_certificate`
    #[serde(rename = "client-certificate-data")]
    pub client_certificate_data: Option<String>,

    /// Path to a client key file for TLS.
    #[serde(rename = "client-key")]
    pub client_key: Option<String>,
    /// PEM-encoded data from a client key file for TLS. Overrides `client_key`
    #[serde(rename = "client-key-data")]
    #[serde(default, deserialize_with = "deserialize_secretstring")]
    pub client_key_data: Option<SecretString>,

    /// Specifies a custom authentication plugin for the kubernetes cluster.
    #[serde(rename = "auth-provider")]
    pub auth_provider: Option<AuthProviderConfig>,
}

/// AuthProviderConfig stores auth for specified cloud provider.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthProviderConfig {
    /// Name of the auth provider
    pub name: String,
    /// Auth provider configuration
    #[serde(default, deserialize_with = "deserialize_null_as_default")]
    pub config: HashMap<String, serde_yaml::Value>,
}

impl AuthProviderConfig {
    /// A config value, if it is a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(serde_yaml::Value::as_str)
    }
}

/// NamedContext associates name with context.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct NamedContext {
    /// Name of the context
    pub name: Option<String>,
    /// Associations for the context
    pub context: Option<Context>,
}

/// Context block as written in the file, referencing clusters and users by name.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Context {
    /// Name of the cluster for this context
    pub cluster: Option<String>,
    /// Name of the `AuthInfo` for this context
    pub user: Option<String>,
    /// The default namespace to use on unspecified requests
    pub namespace: Option<String>,
}

fn deserialize_secretstring<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

fn deserialize_null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    T: Default + Deserialize<'de>,
    D: Deserializer<'de>,
{
    let opt = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}
