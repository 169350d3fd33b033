//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"HERMES_AUTH_TOKEN"`).
//! - Callers resolve once at startup and pass the result into constructors.
//! - `Debug` impls **redact** values.
//! - Error messages reference the env var **NAME**, never the value.

use anyhow::{bail, Result};

/// Authorization header name plus its resolved value.
///
/// **Value is redacted in `Debug` output.**
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedAuth {
    pub header: String,
    pub value: String,
}

impl std::fmt::Debug for ResolvedAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedAuth")
            .field("header", &self.header)
            .field("value", &"<REDACTED>")
            .finish()
    }
}

/// Read a secret from the env var called `var_name`. Absent or empty is an error.
pub fn resolve_env_secret(var_name: &str) -> Result<String> {
    resolve_with(var_name, |k| std::env::var(k).ok())
}

/// Same as [`resolve_env_secret`] with an injectable lookup (tests).
pub fn resolve_with<F>(var_name: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let name = var_name.trim();
    if name.is_empty() {
        bail!("SECRET_ENV_NAME_EMPTY: no env var name configured");
    }
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("SECRET_MISSING: env var '{}' is not set or empty", name),
    }
}

/// Pick the auth value: an explicit value wins, otherwise resolve the named env var.
pub fn resolve_auth(
    header: &str,
    explicit_value: Option<&str>,
    value_env: Option<&str>,
) -> Result<ResolvedAuth> {
    let value = match (explicit_value, value_env) {
        (Some(v), _) => v.to_string(),
        (None, Some(env)) => resolve_env_secret(env)?,
        (None, None) => bail!(
            "AUTH_VALUE_MISSING: header '{}' configured without a value or env var name",
            header
        ),
    };
    Ok(ResolvedAuth {
        header: header.to_string(),
        value,
    })
}
