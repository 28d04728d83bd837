use std::{collections::HashMap, io::Read, path::Path};

use serde::Deserialize;

use super::{
    file_config::{self, Kubeconfig},
    utils, AuthInfo, Cluster, Configuration, Context, PathOrData, DEFAULT_NAMESPACE,
};
use crate::{Error, Result};

/// Server used for a cluster block without a `server` key
const DEFAULT_SERVER: &str = "http://localhost:8001";

/// Parsing of the kubeconfig format
///
/// Only a single document is read; merging several kubeconfig files is not supported.
impl Configuration {
    /// Read a kubeconfig from an arbitrary location
    ///
    /// Relative credential paths inside the file are resolved against the directory containing it.
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = utils::read_file(path)?;
        tracing::debug!("parsing kubeconfig at {}", path.display());
        Self::from_reader(data.as_slice(), path.parent())
    }

    /// Read a kubeconfig from a YAML string
    ///
    /// Relative credential paths are resolved against `base_dir` when given, and kept as-is otherwise.
    pub fn from_yaml(text: &str, base_dir: Option<&Path>) -> Result<Self> {
        Self::from_reader(text.as_bytes(), base_dir)
    }

    /// Read a kubeconfig from a byte stream
    pub fn from_reader<R: Read>(reader: R, base_dir: Option<&Path>) -> Result<Self> {
        let mut documents = serde_yaml::Deserializer::from_reader(reader);
        let kubeconfig = match documents.next() {
            Some(document) => Option::<Kubeconfig>::deserialize(document)?.unwrap_or_default(),
            None => Kubeconfig::default(),
        };
        if documents.next().is_some() {
            tracing::warn!("kubeconfig contains more than one YAML document, only the first one is used");
        }
        resolve(&kubeconfig, base_dir)
    }
}

fn resolve(kubeconfig: &Kubeconfig, base_dir: Option<&Path>) -> Result<Configuration> {
    let mut clusters = HashMap::new();
    for named in &kubeconfig.clusters {
        let (name, cluster) = named_entry(
            named.name.as_deref(),
            named.cluster.as_ref(),
            "clusters",
            "cluster",
        )?;
        clusters.insert(name.to_owned(), resolve_cluster(cluster, base_dir)?);
    }

    let mut users = HashMap::new();
    for named in &kubeconfig.auth_infos {
        let (name, user) = named_entry(named.name.as_deref(), named.auth_info.as_ref(), "users", "user")?;
        users.insert(name.to_owned(), AuthInfo::resolve(user, name, base_dir)?);
    }

    let mut contexts = HashMap::new();
    for named in &kubeconfig.contexts {
        let (name, context) = named_entry(
            named.name.as_deref(),
            named.context.as_ref(),
            "contexts",
            "context",
        )?;
        contexts.insert(name.to_owned(), resolve_context(name, context, &clusters, &users)?);
    }

    let current_context = match kubeconfig.current_context.as_deref() {
        Some(name) => contexts.get(name).cloned().unwrap_or_else(|| {
            tracing::debug!("current-context '{}' is not defined, using defaults", name);
            Context::default()
        }),
        None => Context::default(),
    };

    tracing::trace!(
        "resolved kubeconfig with {} clusters, {} users, {} contexts",
        clusters.len(),
        users.len(),
        contexts.len()
    );
    Ok(Configuration {
        clusters,
        contexts,
        current_context,
        users,
    })
}

fn named_entry<'a, T>(
    name: Option<&'a str>,
    value: Option<&'a T>,
    list: &'static str,
    kind: &'static str,
) -> Result<(&'a str, &'a T)> {
    let name = name.ok_or_else(|| Error::MissingRequiredField {
        field: "name",
        block: format!("an entry of '{list}'"),
    })?;
    let value = value.ok_or_else(|| Error::MissingRequiredField {
        field: kind,
        block: format!("{list} entry '{name}'"),
    })?;
    Ok((name, value))
}

fn resolve_cluster(cluster: &file_config::Cluster, base_dir: Option<&Path>) -> Result<Cluster> {
    Ok(Cluster {
        api_version: cluster.api_version.clone().unwrap_or_else(|| String::from("v1")),
        server: cluster.server.clone().unwrap_or_else(|| String::from(DEFAULT_SERVER)),
        insecure_skip_tls_verify: cluster.insecure_skip_tls_verify.unwrap_or(false),
        certificate_authority: PathOrData::resolve(
            cluster.certificate_authority.as_deref(),
            cluster.certificate_authority_data.as_deref(),
            "certificate-authority-data",
            base_dir,
        )?,
    })
}

fn resolve_context(
    context_name: &str,
    context: &file_config::Context,
    clusters: &HashMap<String, Cluster>,
    users: &HashMap<String, AuthInfo>,
) -> Result<Context> {
    // an empty reference means "not set" rather than a name to look up
    let reference = |value: &Option<String>| value.clone().filter(|name| !name.is_empty());
    let unresolvable = |kind: &'static str, name: String| Error::UnresolvableReference {
        kind,
        name,
        context: context_name.to_owned(),
    };

    let cluster = match reference(&context.cluster) {
        Some(name) => clusters
            .get(&name)
            .cloned()
            .ok_or_else(|| unresolvable("cluster", name))?,
        None => Cluster::default(),
    };
    let auth_info = match reference(&context.user) {
        Some(name) => users.get(&name).cloned().ok_or_else(|| unresolvable("user", name))?,
        None => AuthInfo::default(),
    };

    Ok(Context {
        cluster,
        auth_info,
        namespace: context
            .namespace
            .clone()
            .unwrap_or_else(|| String::from(DEFAULT_NAMESPACE)),
    })
}
