//! Configuration for the data access layer.

use serde::Deserialize;

/// Limits applied by every repository built with this configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DalConfig {
    /// Upper bound for rows loaded per owner when an association request
    /// carries no limit, or a larger one.
    pub max_association_limit: u64,
    /// Maximum number of segments in a dotted field path.
    pub max_path_depth: usize,
    /// Log every compiled SQL statement at debug level.
    pub log_statements: bool,
}

impl Default for DalConfig {
    fn default() -> Self {
        Self {
            max_association_limit: 500,
            max_path_depth: 8,
            log_statements: false,
        }
    }
}

impl DalConfig {
    /// Effective per-owner limit for an association request.
    #[must_use]
    pub fn association_limit(&self, requested: Option<u64>) -> u64 {
        requested.map_or(self.max_association_limit, |limit| {
            limit.min(self.max_association_limit)
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_keys() {
        let cfg: DalConfig = serde_json::from_value(serde_json::json!({
            "log_statements": true
        }))
        .unwrap();

        assert_eq!(cfg.max_association_limit, 500);
        assert_eq!(cfg.max_path_depth, 8);
        assert!(cfg.log_statements);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res: Result<DalConfig, _> = serde_json::from_value(serde_json::json!({
            "max_association_limt": 10
        }));
        assert!(res.is_err());
    }

    #[test]
    fn association_limit_is_capped() {
        let cfg = DalConfig {
            max_association_limit: 10,
            ..DalConfig::default()
        };

        assert_eq!(cfg.association_limit(None), 10);
        assert_eq!(cfg.association_limit(Some(4)), 4);
        assert_eq!(cfg.association_limit(Some(50)), 10);
    }
}
