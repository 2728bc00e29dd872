//! Configuration for the product listing.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Prefix of environment variables overriding file values.
pub const ENV_PREFIX: &str = "LISTING_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    /// Leave closeout products with no stock out of the listing.
    pub hide_closeout_products_when_out_of_stock: bool,

    /// Upper bound for the page size of one listing request.
    pub max_page_size: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            hide_closeout_products_when_out_of_stock: false,
            max_page_size: 100,
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("invalid listing configuration: {0}")]
pub struct ConfigError(#[from] Box<figment::Error>);

impl ListingConfig {
    /// Defaults, overridden by `path` (YAML, optional) and then by
    /// `LISTING_*` environment variables.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when a source has an unknown key or a value of
    /// the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| ConfigError(Box::new(e)))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_sources() {
        Jail::expect_with(|_jail| {
            assert_eq!(ListingConfig::load(None).unwrap(), ListingConfig::default());
            Ok(())
        });
    }

    #[test]
    fn yaml_then_env_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "listing.yaml",
                "hide_closeout_products_when_out_of_stock: true\nmax_page_size: 24\n",
            )?;
            jail.set_env("LISTING_MAX_PAGE_SIZE", "48");

            let cfg = ListingConfig::load(Some(Path::new("listing.yaml"))).unwrap();

            assert!(cfg.hide_closeout_products_when_out_of_stock);
            assert_eq!(cfg.max_page_size, 48);
            Ok(())
        });
    }

    #[test]
    fn unknown_keys_are_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("listing.yaml", "max_page_sise: 10\n")?;

            let err = ListingConfig::load(Some(Path::new("listing.yaml"))).unwrap_err();
            assert!(err.to_string().contains("max_page_sise"));
            Ok(())
        });
    }
}
