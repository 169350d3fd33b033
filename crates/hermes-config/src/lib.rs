//! hermes-config
//!
//! Layered YAML configuration for the tool suite.
//!
//! - Docs are deep-merged in order: earlier docs are base, later docs override.
//! - The merged document is hashed (SHA-256 of canonical JSON) so a run log can
//!   name exactly which configuration it used.
//! - Literal secrets are rejected; YAML stores env var NAMES only (see [`secrets`]).
//! - Unknown keys are a hard error.

pub mod secrets;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;

/// If any leaf string value in the effective config starts with one of these,
/// loading aborts with CONFIG_SECRET_DETECTED.
const SECRET_PREFIXES: &[&str] = &[
    "sk-",        // OpenAI style
    "AKIA",       // AWS access key ID
    "-----BEGIN", // PEM private keys
    "ghp_",       // GitHub PAT
    "glpat-",     // GitLab PAT
    "xoxb-",      // Slack bot token
    "Bearer ",    // pasted Authorization value
    "Basic ",
];

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PREFIX: &str = "/run/hermes";
pub const DEFAULT_DELETE_DELAY_MS: u64 = 1000;

// ---------------------------------------------------------------------------
// Typed view
// ---------------------------------------------------------------------------

/// Management endpoints used by `migrate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManagementSection {
    pub source_url: Option<String>,
    pub destination_url: Option<String>,
    pub auth_header: Option<String>,
    /// Name of the env var holding the auth header value.
    pub auth_value_env: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ManagementSection {
    fn default() -> Self {
        Self {
            source_url: None,
            destination_url: None,
            auth_header: None,
            auth_value_env: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Coordination-service settings used by the tree tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinationSection {
    pub connect: Option<String>,
    pub prefix: String,
    pub delete_delay_ms: u64,
}

impl Default for CoordinationSection {
    fn default() -> Self {
        Self {
            connect: None,
            prefix: DEFAULT_PREFIX.to_string(),
            delete_delay_ms: DEFAULT_DELETE_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub management: ManagementSection,
    pub coordination: CoordinationSection,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
    pub tools: ToolsConfig,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = serde_json::json!({});
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        // An empty document parses as null; treat it as an empty layer.
        if v_yaml.is_null() {
            continue;
        }
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        merged = deep_merge(merged, v_json);
    }

    enforce_no_secret_literals(&merged)?;

    let tools: ToolsConfig =
        serde_json::from_value(merged.clone()).context("CONFIG_INVALID: unexpected shape")?;

    let (canonical_json, config_hash) = config_digest(&merged)?;
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
        tools,
    })
}

/// Overlays `over` onto `base`. Mappings merge key by key, so a later layer
/// can set `management.source_url` without restating `timeout_secs`; any
/// other value (lists included) replaces what was there.
fn deep_merge(base: Value, over: Value) -> Value {
    match (base, over) {
        (Value::Object(mut into), Value::Object(from)) => {
            for (key, value) in from {
                let prior = into.remove(&key).unwrap_or(Value::Null);
                into.insert(key, deep_merge(prior, value));
            }
            Value::Object(into)
        }
        (_, value) => value,
    }
}

/// Canonical JSON text of the merged layers and its SHA-256 digest.
///
/// `serde_json::Map` is ordered by key, so the text is stable regardless of
/// the key order inside each YAML file.
fn config_digest(merged: &Value) -> Result<(String, String)> {
    let canonical = serde_json::to_string(merged).context("canonical json serialize failed")?;
    let hash = hex::encode(Sha256::digest(canonical.as_bytes()));
    Ok((canonical, hash))
}

/// Refuses a merged config holding a pasted credential anywhere, e.g. an auth
/// token written into `management.auth_value_env` instead of a variable name.
fn enforce_no_secret_literals(merged: &Value) -> Result<()> {
    if let Some(leaf) = find_secret_leaf(merged, String::new()) {
        bail!("CONFIG_SECRET_DETECTED leaf={} value=REDACTED", leaf);
    }
    Ok(())
}

/// Dotted path of the first string leaf that looks like a credential.
fn find_secret_leaf(v: &Value, path: String) -> Option<String> {
    match v {
        Value::String(s) if looks_like_secret(s) => Some(path),
        Value::Object(map) => map
            .iter()
            .find_map(|(k, vv)| find_secret_leaf(vv, join_key(&path, k))),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, vv)| find_secret_leaf(vv, join_key(&path, i))),
        _ => None,
    }
}

fn join_key(path: &str, key: impl std::fmt::Display) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn looks_like_secret(s: &str) -> bool {
    let t = s.trim_start();
    t.len() >= 8 && SECRET_PREFIXES.iter().any(|p| t.starts_with(p))
}
