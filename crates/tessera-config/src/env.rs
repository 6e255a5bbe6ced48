//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only apply to fields the
//! config file did not set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::FieldSources;

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `TESSERA_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "TESSERA_EXTERNAL_URL",
        field_path: "server.external_url",
    },
    EnvMapping {
        var_name: "TESSERA_ISSUER_KEY",
        field_path: "issuer.key_path",
    },
    EnvMapping {
        var_name: "TESSERA_FEDERATION_URL",
        field_path: "issuer.federation_url",
    },
    EnvMapping {
        var_name: "TESSERA_METRIC_AUTHORIZATION",
        field_path: "monitoring.metric_authorization",
    },
    EnvMapping {
        var_name: "TESSERA_PROMQL_AUTHORIZATION",
        field_path: "monitoring.promql_authorization",
    },
    EnvMapping {
        var_name: "TESSERA_TOKEN_EXPIRES_IN_SECS",
        field_path: "monitoring.token_expires_in_secs",
    },
    EnvMapping {
        var_name: "TESSERA_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "TESSERA_LOG_FORMAT",
        field_path: "logging.format",
    },
    EnvMapping {
        var_name: "TESSERA_LOG_TARGET",
        field_path: "logging.target",
    },
    EnvMapping {
        var_name: "TESSERA_LOG_DIR",
        field_path: "logging.directory",
    },
];

/// Apply environment variable fallbacks to fields that were **not** set by
/// the config file.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources.contains(mapping.field_path) {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            set_field_from_string(merged, mapping.field_path, val);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set a `section.field` value in the TOML tree from a string.
fn set_field_from_string(root: &mut toml::Value, path: &str, val: &str) {
    let Some((section, field)) = path.split_once('.') else {
        return;
    };
    let Some(table) = root.as_table_mut() else {
        return;
    };

    let section = table
        .entry(section.to_owned())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    if let Some(section) = section.as_table_mut() {
        section.insert(field.to_owned(), coerce_to_toml_value(path, val));
    }
}

/// Coerce a string env var value to the TOML type of the field at `path`.
fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    if matches!(path, "monitoring.token_expires_in_secs")
        && let Ok(i) = val.parse::<i64>()
    {
        return toml::Value::Integer(i);
    }

    if matches!(
        path,
        "monitoring.metric_authorization" | "monitoring.promql_authorization"
    ) && let Ok(b) = val.parse::<bool>()
    {
        return toml::Value::Boolean(b);
    }

    toml::Value::String(val.to_owned())
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_apply_env_fallbacks() {
        let mut merged: toml::Value = toml::from_str("[server]\nexternal_url = \"x\"").unwrap();
        let env = make_env(&[
            ("TESSERA_EXTERNAL_URL", "https://origin.example.org"),
            ("TESSERA_METRIC_AUTHORIZATION", "false"),
            ("TESSERA_TOKEN_EXPIRES_IN_SECS", "120"),
            ("UNRELATED", "1"),
        ]);

        let count = apply_env_fallbacks(&mut merged, &FieldSources::new(), &env);

        assert_eq!(count, 3);
        assert_eq!(
            merged["server"]["external_url"].as_str(),
            Some("https://origin.example.org")
        );
        assert_eq!(
            merged["monitoring"]["metric_authorization"].as_bool(),
            Some(false)
        );
        assert_eq!(
            merged["monitoring"]["token_expires_in_secs"].as_integer(),
            Some(120)
        );
    }

    #[test]
    fn test_file_values_win_over_env() {
        let mut merged: toml::Value =
            toml::from_str("[server]\nexternal_url = \"https://from-file\"").unwrap();
        let sources: FieldSources = ["server.external_url".to_owned()].into_iter().collect();
        let env = make_env(&[("TESSERA_EXTERNAL_URL", "https://from-env")]);

        assert_eq!(apply_env_fallbacks(&mut merged, &sources, &env), 0);
        assert_eq!(
            merged["server"]["external_url"].as_str(),
            Some("https://from-file")
        );
    }

    #[test]
    fn test_uncoercible_value_stays_string() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let env = make_env(&[("TESSERA_PROMQL_AUTHORIZATION", "maybe")]);
        apply_env_fallbacks(&mut merged, &FieldSources::new(), &env);
        assert_eq!(
            merged["monitoring"]["promql_authorization"].as_str(),
            Some("maybe")
        );
    }
}
