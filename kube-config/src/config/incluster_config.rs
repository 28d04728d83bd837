use std::{env, path::Path, sync::OnceLock};

use secrecy::SecretString;

use super::{utils, AuthInfo, Cluster, Configuration, Context, PathOrData, DEFAULT_NAME};
use crate::{Error, Result};

/// Environment variable holding the API server host inside a pod
pub const SERVICE_HOSTENV: &str = "KUBERNETES_SERVICE_HOST";
/// Environment variable holding the API server port inside a pod
pub const SERVICE_PORTENV: &str = "KUBERNETES_SERVICE_PORT";

// Mounted credential files
const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";
const SERVICE_TOKENFILE: &str = "token";
const SERVICE_CERTFILE: &str = "ca.crt";
const SERVICE_DEFAULT_NS: &str = "namespace";

impl Configuration {
    /// Create configuration from the cluster's environment variables and service account mount
    ///
    /// This follows the standard [API Access from a Pod](https://kubernetes.io/docs/tasks/access-application-cluster/access-cluster/#accessing-the-api-from-a-pod)
    /// and relies on you having the service account's token mounted.
    pub fn from_cluster_env() -> Result<Self> {
        load_from(Path::new(SERVICE_ACCOUNT_DIR))
    }

    /// Like [`Configuration::from_cluster_env`], but only attempted once per process
    ///
    /// Later calls get the result of the first attempt, success or failure.
    pub fn in_cluster() -> Result<Self> {
        static IN_CLUSTER: OnceLock<Result<Configuration>> = OnceLock::new();
        IN_CLUSTER.get_or_init(Self::from_cluster_env).clone()
    }
}

pub(crate) fn load_from(service_account_dir: &Path) -> Result<Configuration> {
    let server = kube_server()?;
    let token = utils::read_file_to_string(service_account_dir.join(SERVICE_TOKENFILE))?;
    let namespace = utils::read_file_to_string(service_account_dir.join(SERVICE_DEFAULT_NS))?;

    let cert_path = service_account_dir.join(SERVICE_CERTFILE);
    let certificate_authority = if cert_path.exists() {
        Some(PathOrData::Path(cert_path))
    } else {
        tracing::debug!("no service account certificate at {}, continuing without it", cert_path.display());
        None
    };

    let cluster = Cluster {
        server,
        certificate_authority,
        ..Cluster::default()
    };
    let context = Context {
        cluster: cluster.clone(),
        auth_info: AuthInfo::Token {
            token: SecretString::from(token),
        },
        namespace,
    };
    Ok(Configuration::default()
        .with_cluster(DEFAULT_NAME, cluster)
        .with_context(DEFAULT_NAME, context.clone())
        .use_context(context))
}

/// Returns Kubernetes address from specified environment variables.
fn kube_server() -> Result<String> {
    let host = required_env(SERVICE_HOSTENV)?;
    let port = required_env(SERVICE_PORTENV)?;
    Ok(server_url(&host, &port))
}

fn server_url(host: &str, port: &str) -> String {
    if port.is_empty() {
        format!("https://{host}")
    } else {
        format!("https://{host}:{port}")
    }
}

fn required_env(name: &'static str) -> Result<String> {
    env::var(name).map_err(|_| Error::MissingEnvironmentVariable { name })
}
