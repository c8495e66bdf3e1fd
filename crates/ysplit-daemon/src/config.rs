//! Configuration file management.
//!
//! `$YSPLIT_DATA_DIR/config.toml`, falling back to defaults when absent.
//! Addresses are `0x`-hex strings; split rules are basis points.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use ysplit_governance::{SplitRules, StreamRules};
use ysplit_types::{Address, Category, RevenueSource, Split};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// IPC settings.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Initial role holders.
    #[serde(default)]
    pub roles: RolesConfig,
    /// Component and counterparty addresses.
    #[serde(default)]
    pub addresses: AddressesConfig,
    /// Initial split rules.
    #[serde(default)]
    pub rules: RulesConfig,
    /// Initial category target sets.
    #[serde(default)]
    pub categories: CategoriesConfig,
    /// Reward sink behaviour.
    #[serde(default)]
    pub sink: SinkConfig,
    /// Gauges known to the in-process vote-weight oracle.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
    /// Initial revenue sources, in pull order.
    #[serde(default)]
    pub sources: Vec<RevenueSource>,
}

/// IPC configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Socket file name inside the data directory.
    #[serde(default = "default_socket_name")]
    pub socket_name: String,
}

/// Role holders used when no governance state has been persisted yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolesConfig {
    #[serde(default)]
    pub owner: Address,
    #[serde(default)]
    pub guardian: Address,
    /// Principal allowed to call `deposit_and_split`.
    #[serde(default)]
    pub operator: Option<Address>,
}

/// Addresses of the three components and the parties they pay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressesConfig {
    /// Gauge registry; also the identity rejected as a category target.
    #[serde(default)]
    pub registry: Address,
    /// Allowance registry buffer.
    #[serde(default)]
    pub allowances: Address,
    /// Split executor; sources grant their draw rights to this address.
    #[serde(default)]
    pub executor: Address,
    #[serde(default)]
    pub treasury: Address,
    #[serde(default)]
    pub reward_sink: Address,
    #[serde(default)]
    pub settlement_token: Address,
    /// Account whose vote weights drive the splits.
    #[serde(default)]
    pub voter: Address,
}

/// One rule as basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub ybs: u16,
    pub treasury: u16,
    pub remainder: u16,
}

impl RuleConfig {
    pub fn to_split(self) -> Split {
        Split::from_bps(self.ybs, self.treasury, self.remainder)
    }
}

/// Rules for one income stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StreamRulesConfig {
    #[serde(default = "default_rule")]
    pub ycrv: RuleConfig,
    #[serde(default = "default_rule")]
    pub partner: RuleConfig,
    #[serde(default = "default_rule")]
    pub discretionary: RuleConfig,
    #[serde(default = "default_rule")]
    pub uncategorized: RuleConfig,
}

impl StreamRulesConfig {
    fn to_rules(self) -> StreamRules {
        StreamRules {
            ycrv: self.ycrv.to_split(),
            partner: self.partner.to_split(),
            discretionary: self.discretionary.to_split(),
            uncategorized: self.uncategorized.to_split(),
        }
    }
}

/// Rules for both income streams.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub admin_fee: StreamRulesConfig,
    #[serde(default)]
    pub vote_incentive: StreamRulesConfig,
}

impl RulesConfig {
    /// Rules as fixed-point splits. Not yet validated.
    pub fn to_split_rules(self) -> SplitRules {
        SplitRules {
            admin_fee: self.admin_fee.to_rules(),
            vote_incentive: self.vote_incentive.to_rules(),
        }
    }
}

/// Initial category target sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoriesConfig {
    #[serde(default)]
    pub ycrv: Vec<Address>,
    #[serde(default)]
    pub partner: Vec<Address>,
    #[serde(default)]
    pub discretionary: Vec<Address>,
}

impl CategoriesConfig {
    pub fn get(&self, category: Category) -> &[Address] {
        match category {
            Category::YCrv => &self.ycrv,
            Category::Partner => &self.partner,
            Category::Discretionary => &self.discretionary,
        }
    }
}

/// Reward sink configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Fee taken when accumulated rewards are distributed.
    #[serde(default)]
    pub performance_fee_bps: u16,
    #[serde(default)]
    pub fee_recipient: Option<Address>,
    /// Where distributed rewards go. Distribution is refused without one.
    #[serde(default)]
    pub reward_pool: Option<Address>,
}

/// In-process oracle configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Gauges registered at start-up.
    #[serde(default)]
    pub gauges: Vec<Address>,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Expose the `dev_*` methods that mint tokens and edit oracle state.
    #[serde(default)]
    pub dev_methods: bool,
}

// Default value functions

fn default_socket_name() -> String {
    "ysplit.sock".to_string()
}

/// Everything stays at the source until governance sets real rules.
fn default_rule() -> RuleConfig {
    RuleConfig {
        ybs: 0,
        treasury: 0,
        remainder: 10_000,
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            socket_name: default_socket_name(),
        }
    }
}

impl Default for StreamRulesConfig {
    fn default() -> Self {
        Self {
            ycrv: default_rule(),
            partner: default_rule(),
            discretionary: default_rule(),
            uncategorized: default_rule(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            log_level: default_log_level(),
            dev_methods: false,
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.advanced.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.advanced.data_dir)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("YSPLIT_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/ysplit")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".ysplit")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/ysplit"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ysplit_types::IncomeStream;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.network.socket_name, "ysplit.sock");
        assert_eq!(config.advanced.log_level, "info");
        assert!(!config.advanced.dev_methods);
        assert!(config.sources.is_empty());
        assert!(config.rules.to_split_rules().validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = DaemonConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let _parsed: DaemonConfig = toml::from_str(&toml_str).expect("parse");
    }

    #[test]
    fn test_parse_full_config() {
        let owner = Address::repeat_byte(0xa0);
        let relay = Address::repeat_byte(0x10);
        let gauge = Address::repeat_byte(0x01);
        let text = format!(
            r#"
[roles]
owner = "{owner}"
guardian = "{owner}"

[rules.admin_fee.ycrv]
ybs = 5000
treasury = 3000
remainder = 2000

[categories]
ycrv = ["{gauge}"]

[oracle]
gauges = ["{gauge}"]

[[sources]]
address = "{relay}"
stream = "admin_fee"
"#
        );
        let config: DaemonConfig = toml::from_str(&text).expect("parse");
        assert_eq!(config.roles.owner, owner);
        assert_eq!(config.roles.operator, None);
        assert_eq!(config.categories.get(Category::YCrv), &[gauge]);
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.sources[0].stream, IncomeStream::AdminFee);

        let rules = config.rules.to_split_rules();
        assert_eq!(rules.admin_fee.ycrv, Split::from_percent(50, 30, 20));
        // Unset scopes keep the default.
        assert_eq!(rules.admin_fee.partner, Split::from_percent(0, 0, 100));
    }

    #[test]
    fn test_bad_rule_detected_on_validate() {
        let text = r#"
[rules.vote_incentive.uncategorized]
ybs = 5000
treasury = 5000
remainder = 1
"#;
        let config: DaemonConfig = toml::from_str(text).expect("parse");
        assert!(config.rules.to_split_rules().validate().is_err());
    }
}
