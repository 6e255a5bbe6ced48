//! Deep merge of TOML layers.

use std::collections::HashSet;

/// Dotted paths of leaf fields set by a config file.
pub type FieldSources = HashSet<String>;

/// Deep-merge `overlay` into `base`, recording every leaf path the overlay
/// sets. `prefix` is the dotted path of `base` (empty at the root).
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge_tracking(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };

                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge_tracking(base_val, overlay_val, &path, sources);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_all_leaves(overlay_val, &path, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            sources.insert(prefix.to_owned());
        },
    }
}

fn record_all_leaves(val: &toml::Value, prefix: &str, sources: &mut FieldSources) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_all_leaves(child, &format!("{prefix}.{key}"), sources);
        }
    } else {
        sources.insert(prefix.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_replaces_leaves_and_keeps_siblings() {
        let mut base: toml::Value =
            toml::from_str("[trust]\nttl_secs = 900\ngrace_period_secs = 3600").unwrap();
        let overlay: toml::Value = toml::from_str("[trust]\nttl_secs = 60").unwrap();
        let mut sources = FieldSources::new();

        deep_merge_tracking(&mut base, &overlay, "", &mut sources);

        assert_eq!(base["trust"]["ttl_secs"].as_integer(), Some(60));
        assert_eq!(base["trust"]["grace_period_secs"].as_integer(), Some(3600));
        assert!(sources.contains("trust.ttl_secs"));
        assert!(!sources.contains("trust.grace_period_secs"));
    }

    #[test]
    fn test_new_tables_record_all_leaves() {
        let mut base: toml::Value = toml::from_str("[server]\nexternal_url = \"x\"").unwrap();
        let overlay: toml::Value =
            toml::from_str("[issuer]\nfederation_url = \"https://fed\"").unwrap();
        let mut sources = FieldSources::new();

        deep_merge_tracking(&mut base, &overlay, "", &mut sources);

        assert_eq!(
            base["issuer"]["federation_url"].as_str(),
            Some("https://fed")
        );
        assert!(sources.contains("issuer.federation_url"));
    }
}
