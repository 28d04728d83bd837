//! Prints where the inferred configuration points and how it authenticates.
//!
//! Try it with `KUBE_CONFIG_SOURCE=proxy`, `KUBECONFIG=/some/path`, or nothing set at all.
use kube_config::{AuthInfo, Configuration, PathOrData};
use tracing::*;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kube_config=debug".into()),
        )
        .init();

    let config = Configuration::infer()?;
    let context = &config.current_context;

    info!("server: {}", context.cluster.server);
    info!("namespace: {}", context.namespace);
    if context.cluster.insecure_skip_tls_verify {
        warn!("server certificate will not be verified");
    }
    match &context.cluster.certificate_authority {
        Some(PathOrData::Path(path)) => info!("certificate authority file: {}", path.display()),
        Some(PathOrData::Data(data)) => info!("inline certificate authority ({} bytes)", data.len()),
        None => info!("no certificate authority configured"),
    }

    let auth = match &context.auth_info {
        AuthInfo::None => "none".to_string(),
        AuthInfo::Basic { username, .. } => format!("basic auth as {username}"),
        AuthInfo::Token { .. } => "bearer token".to_string(),
        AuthInfo::ClientCertificate { user, .. } => {
            format!("client certificate ({})", user.as_deref().unwrap_or("anonymous"))
        }
        AuthInfo::Oidc { .. } => "oidc id-token".to_string(),
        AuthInfo::Gcp { expiry, cmd_path, .. } => match expiry {
            Some(expiry) => format!("gcp via {cmd_path}, token expires {expiry}"),
            None => format!("gcp via {cmd_path}"),
        },
    };
    info!("authentication: {}", auth);

    let mut names: Vec<_> = config.contexts.keys().collect();
    names.sort();
    info!("known contexts: {:?}", names);
    Ok(())
}
