use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use secrecy::{ExposeSecret, SecretString};

use super::{file_config, PathOrData};
use crate::{Error, Result};

/// The credentials presented to the cluster.
///
/// Exactly one variant is picked per kubeconfig user, by looking at which keys are present:
/// an `auth-provider` block first, then username and password, then a token, then a client
/// certificate and key.
#[derive(Clone, Debug, Default)]
pub enum AuthInfo {
    /// No credentials
    #[default]
    None,
    /// HTTP basic authentication
    Basic {
        /// The username
        username: String,
        /// The password
        password: SecretString,
    },
    /// Static bearer token
    Token {
        /// The bearer token
        token: SecretString,
    },
    /// TLS client certificate authentication
    ClientCertificate {
        /// The client certificate
        client_certificate: PathOrData,
        /// The private key belonging to `client_certificate`
        client_key: PathOrData,
        /// Username from the same user block, if any
        user: Option<String>,
    },
    /// Token issued by an OpenID Connect provider
    Oidc {
        /// The id-token presented as bearer token
        id_token: SecretString,
    },
    /// Google Cloud credentials managed by an external command
    ///
    /// The expiry is carried as written; nothing here refreshes the token.
    Gcp {
        /// The last access token the command produced
        access_token: Option<SecretString>,
        /// When `access_token` stops being valid
        expiry: Option<DateTime<Utc>>,
        /// The command producing new tokens
        cmd_path: String,
        /// Arguments for `cmd_path`, as a single string
        cmd_args: String,
    },
}

impl PartialEq for AuthInfo {
    fn eq(&self, other: &Self) -> bool {
        fn secret_eq(a: &SecretString, b: &SecretString) -> bool {
            a.expose_secret() == b.expose_secret()
        }

        match (self, other) {
            (Self::None, Self::None) => true,
            (
                Self::Basic { username, password },
                Self::Basic {
                    username: other_username,
                    password: other_password,
                },
            ) => username == other_username && secret_eq(password, other_password),
            (Self::Token { token }, Self::Token { token: other }) => secret_eq(token, other),
            (
                Self::ClientCertificate {
                    client_certificate,
                    client_key,
                    user,
                },
                Self::ClientCertificate {
                    client_certificate: other_certificate,
                    client_key: other_key,
                    user: other_user,
                },
            ) => client_certificate == other_certificate && client_key == other_key && user == other_user,
            (Self::Oidc { id_token }, Self::Oidc { id_token: other }) => secret_eq(id_token, other),
            (
                Self::Gcp {
                    access_token,
                    expiry,
                    cmd_path,
                    cmd_args,
                },
                Self::Gcp {
                    access_token: other_token,
                    expiry: other_expiry,
                    cmd_path: other_path,
                    cmd_args: other_args,
                },
            ) => {
                let tokens_match = match (access_token, other_token) {
                    (Some(a), Some(b)) => secret_eq(a, b),
                    (None, None) => true,
                    _ => false,
                };
                tokens_match && expiry == other_expiry && cmd_path == other_path && cmd_args == other_args
            }
            _ => false,
        }
    }
}

impl AuthInfo {
    /// Picks the variant for a kubeconfig user block named `user_name`
    pub(crate) fn resolve(
        raw: &file_config::AuthInfo,
        user_name: &str,
        base_dir: Option<&Path>,
    ) -> Result<Self> {
        if let Some(provider) = &raw.auth_provider {
            return Self::from_auth_provider(provider, user_name);
        }
        if let (Some(username), Some(password)) = (&raw.username, &raw.password) {
            return Ok(Self::Basic {
                username: username.clone(),
                password: password.clone(),
            });
        }
        if let Some(token) = &raw.token {
            return Ok(Self::Token { token: token.clone() });
        }

        let client_certificate = PathOrData::resolve(
            raw.client_certificate.as_deref(),
            raw.client_certificate_data.as_deref(),
            "client-certificate-data",
            base_dir,
        )?;
        let client_key = PathOrData::resolve(
            raw.client_key.as_deref(),
            raw.client_key_data.as_ref().map(|key| key.expose_secret()),
            "client-key-data",
            base_dir,
        )?;
        if let (Some(client_certificate), Some(client_key)) = (client_certificate, client_key) {
            return Ok(Self::ClientCertificate {
                client_certificate,
                client_key,
                user: raw.username.clone(),
            });
        }

        Ok(Self::None)
    }

    fn from_auth_provider(provider: &file_config::AuthProviderConfig, user_name: &str) -> Result<Self> {
        let block = || format!("auth-provider config of user '{user_name}'");
        let required = |field: &'static str| {
            provider
                .get_str(field)
                .map(str::to_owned)
                .ok_or_else(|| Error::MissingRequiredField { field, block: block() })
        };

        match provider.name.to_ascii_lowercase().as_str() {
            "oidc" => Ok(Self::Oidc {
                id_token: SecretString::from(required("id-token")?),
            }),
            "gcp" => Ok(Self::Gcp {
                access_token: provider
                    .get_str("access-token")
                    .map(|token| SecretString::from(token.to_owned())),
                expiry: provider
                    .config
                    .get("expiry")
                    .and_then(|value| gcp_expiry(value, user_name)),
                cmd_path: required("cmd-path")?,
                cmd_args: required("cmd-args")?,
            }),
            other => {
                tracing::debug!("ignoring unsupported auth-provider '{}' of user '{}'", other, user_name);
                Ok(Self::None)
            }
        }
    }
}

/// An unreadable expiry is dropped rather than failing the whole user.
fn gcp_expiry(value: &serde_yaml::Value, user_name: &str) -> Option<DateTime<Utc>> {
    let parsed = match value {
        serde_yaml::Value::Null => return None,
        serde_yaml::Value::String(raw) => parse_expiry(raw),
        serde_yaml::Value::Number(secs) => {
            if let Some(expiry) = secs.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)) {
                return Some(expiry);
            }
            tracing::warn!("dropping out of range gcp expiry {} of user '{}'", secs, user_name);
            return None;
        }
        other => {
            tracing::warn!("dropping gcp expiry of user '{}': unsupported value {:?}", user_name, other);
            return None;
        }
    };
    parsed
        .map_err(|err| tracing::warn!("dropping gcp expiry of user '{}': {}", user_name, err))
        .ok()
}

/// Parses an RFC 3339 instant (`...Z`), falling back to an RFC 3339 date-time with offset.
pub(crate) fn parse_expiry(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.fZ")
        .map(|instant| instant.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|source| Error::DateParse {
            value: raw.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn resolve(yaml: &str) -> Result<AuthInfo> {
        let raw: file_config::AuthInfo = serde_yaml::from_str(yaml).unwrap();
        AuthInfo::resolve(&raw, "tester", None)
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_owned())
    }

    #[test]
    fn basic_beats_token() {
        let auth = resolve("username: admin\npassword: hunter2\ntoken: abc").unwrap();
        assert_eq!(auth, AuthInfo::Basic {
            username: "admin".into(),
            password: secret("hunter2"),
        });
    }

    #[test]
    fn username_alone_is_not_basic() {
        let auth = resolve("username: admin\ntoken: abc").unwrap();
        assert_eq!(auth, AuthInfo::Token { token: secret("abc") });
    }

    #[test]
    fn client_certificate_needs_both_halves() {
        let auth = resolve("client-certificate: /c.crt\nclient-key-data: aGVsbG8K\nusername: me").unwrap();
        assert_eq!(auth, AuthInfo::ClientCertificate {
            client_certificate: PathOrData::Path("/c.crt".into()),
            client_key: PathOrData::Data(b"hello\n".to_vec()),
            user: Some("me".into()),
        });

        let half = resolve("client-certificate: /c.crt").unwrap();
        assert_eq!(half, AuthInfo::None);
    }

    #[test]
    fn client_certificate_paths_use_base_dir() {
        let raw: file_config::AuthInfo =
            serde_yaml::from_str("client-certificate: certs/c.crt\nclient-key: ../k.key").unwrap();
        let auth = AuthInfo::resolve(&raw, "tester", Some(Path::new("/home/me/.kube"))).unwrap();
        assert_eq!(auth, AuthInfo::ClientCertificate {
            client_certificate: PathOrData::Path("/home/me/.kube/certs/c.crt".into()),
            client_key: PathOrData::Path("/home/me/k.key".into()),
            user: None,
        });
    }

    #[test]
    fn empty_block_is_none() {
        assert_eq!(resolve("{}").unwrap(), AuthInfo::None);
    }

    #[test]
    fn oidc_provider() {
        let auth = resolve(
            r#"
auth-provider:
  name: OIDC
  config:
    id-token: eyJhbGciOi
    client-id: kubernetes
"#,
        )
        .unwrap();
        assert_eq!(auth, AuthInfo::Oidc {
            id_token: secret("eyJhbGciOi"),
        });
    }

    #[test]
    fn oidc_without_id_token_fails() {
        let yaml = "auth-provider:\n  name: oidc\n  config:\n    client-id: kubernetes\n";
        let err = resolve(yaml).unwrap_err();
        match err {
            Error::MissingRequiredField { field, block } => {
                assert_eq!(field, "id-token");
                assert!(block.contains("tester"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn gcp_provider() {
        let auth = resolve(
            r#"
auth-provider:
  name: gcp
  config:
    access-token: ya29.token
    cmd-args: config config-helper --format=json
    cmd-path: /usr/lib/google-cloud-sdk/bin/gcloud
    expiry: "2018-03-04T16:00:00Z"
    expiry-key: '{.credential.token_expiry}'
    token-key: '{.credential.access_token}'
"#,
        )
        .unwrap();
        assert_eq!(auth, AuthInfo::Gcp {
            access_token: Some(secret("ya29.token")),
            expiry: Some(Utc.with_ymd_and_hms(2018, 3, 4, 16, 0, 0).unwrap()),
            cmd_path: "/usr/lib/google-cloud-sdk/bin/gcloud".into(),
            cmd_args: "config config-helper --format=json".into(),
        });
    }

    #[test]
    fn gcp_requires_cmd_path_and_args() {
        let err = resolve("auth-provider:\n  name: gcp\n  config:\n    cmd-args: x\n").unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField { field: "cmd-path", .. }));
        let err = resolve("auth-provider:\n  name: gcp\n  config:\n    cmd-path: x\n").unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField { field: "cmd-args", .. }));
    }

    #[test]
    fn gcp_bad_expiry_is_dropped() {
        let yaml = concat!(
            "auth-provider:\n  name: gcp\n  config:\n",
            "    cmd-path: g\n    cmd-args: a\n    expiry: yesterday\n",
        );
        let auth = resolve(yaml).unwrap();
        assert_eq!(auth, AuthInfo::Gcp {
            access_token: None,
            expiry: None,
            cmd_path: "g".into(),
            cmd_args: "a".into(),
        });
    }

    #[test]
    fn gcp_epoch_expiry() {
        let yaml = concat!(
            "auth-provider:\n  name: gcp\n  config:\n",
            "    cmd-path: g\n    cmd-args: a\n    expiry: 1520179200\n",
        );
        let auth = resolve(yaml).unwrap();
        match auth {
            AuthInfo::Gcp { expiry, .. } => {
                assert_eq!(expiry, Some(Utc.with_ymd_and_hms(2018, 3, 4, 16, 0, 0).unwrap()))
            }
            other => panic!("unexpected auth {other:?}"),
        }
    }

    #[test]
    fn unknown_provider_is_none() {
        let auth = resolve("auth-provider:\n  name: azure\n  config:\n    tenant-id: t\n").unwrap();
        assert_eq!(auth, AuthInfo::None);
    }

    #[test]
    fn unknown_provider_shadows_token_and_basic() {
        let yaml = "token: t\nusername: u\npassword: p\nauth-provider:\n  name: azure\n";
        assert_eq!(resolve(yaml).unwrap(), AuthInfo::None);
    }

    #[test]
    fn expiry_formats() {
        let expected = Utc.with_ymd_and_hms(2018, 3, 4, 16, 0, 0).unwrap();
        assert_eq!(parse_expiry("2018-03-04T16:00:00Z").unwrap(), expected);
        assert_eq!(parse_expiry("2018-03-04T16:00:00.000Z").unwrap(), expected);
        assert_eq!(parse_expiry("2018-03-04T17:00:00+01:00").unwrap(), expected);
        assert!(matches!(
            parse_expiry("04/03/2018"),
            Err(Error::DateParse { value, .. }) if value == "04/03/2018"
        ));
    }

    #[test]
    fn debug_redacts_secrets() {
        let auth = AuthInfo::Token { token: secret("hidden") };
        assert!(!format!("{auth:?}").contains("hidden"));
    }
}
