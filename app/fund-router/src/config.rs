//! Configuration management

use crate::error::{FundError, Result};
use crate::fund::{DEFAULT_DEADLINE_SECS, FundConfiguration};
use crate::router::SlippagePolicy;
use crate::router::slippage::DEFAULT_SLIPPAGE_BPS;
use crate::types::Asset;
use clap::Parser;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::path::PathBuf;
use std::str::FromStr;

/// Command-line arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "fund-router")]
#[command(about = "Stablecoin fund routing through the better of two venues", long_about = None)]
pub struct CliArgs {
    /// Action to run (deposit, withdraw, or preview)
    #[arg(short, long, default_value = "preview")]
    pub action: String,

    /// Amount of the input asset (in base units)
    #[arg(long)]
    pub amount: Option<u64>,

    /// Input asset: symbol (usdc, dai, link, weth) or address
    #[arg(long)]
    pub asset: Option<String>,

    /// Stable asset received on withdraw: symbol or address
    #[arg(long, default_value = "usdc")]
    pub stable_out: String,

    /// Slippage tolerance in basis points
    #[arg(long)]
    pub slippage_bps: Option<u16>,

    /// Accept any output (no minimum), overriding the tolerance
    #[arg(long)]
    pub unbounded_slippage: bool,

    /// Seconds between the start of a call and its swap deadline
    #[arg(long)]
    pub deadline_secs: Option<u64>,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub assets: Option<AssetsConfig>,
    pub routing: Option<RoutingConfig>,
    pub venues: Option<VenuesConfig>,
    pub market: Option<MarketConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetsConfig {
    pub usdc: Option<String>,
    pub dai: Option<String>,
    pub link: Option<String>,
    pub weth: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// "tolerance" or "unbounded"
    pub slippage_policy: Option<String>,
    pub slippage_bps: Option<u16>,
    pub deadline_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VenuesConfig {
    pub amm_fee_bps: Option<u16>,
    pub clmm_fee_bps: Option<u16>,
    pub clmm_concentration: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Stable-side reserve of every pool
    pub stable_reserve: Option<u64>,
    pub link_reserve: Option<u64>,
    pub weth_reserve: Option<u64>,
    /// Starting balance of the demo depositor in each stable asset
    pub depositor_balance: Option<u64>,
}

/// The four fund assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetBook {
    pub usdc: Asset,
    pub dai: Asset,
    pub link: Asset,
    pub weth: Asset,
}

impl AssetBook {
    pub fn generate() -> Self {
        Self {
            usdc: Pubkey::new_unique(),
            dai: Pubkey::new_unique(),
            link: Pubkey::new_unique(),
            weth: Pubkey::new_unique(),
        }
    }

    /// Resolve a symbol (case-insensitive) or a base58 address
    pub fn resolve(&self, name: &str) -> Result<Asset> {
        match name.to_ascii_lowercase().as_str() {
            "usdc" => Ok(self.usdc),
            "dai" => Ok(self.dai),
            "link" => Ok(self.link),
            "weth" => Ok(self.weth),
            _ => Pubkey::from_str(name)
                .map_err(|e| FundError::ConfigError(format!("Unknown asset '{}': {}", name, e))),
        }
    }

    pub fn symbol(&self, asset: &Asset) -> Option<&'static str> {
        match asset {
            a if *a == self.usdc => Some("USDC"),
            a if *a == self.dai => Some("DAI"),
            a if *a == self.link => Some("LINK"),
            a if *a == self.weth => Some("WETH"),
            _ => None,
        }
    }

    /// Fund whitelist: USDC/DAI are the stable assets, LINK/WETH the risk assets
    pub fn fund_configuration(&self) -> FundConfiguration {
        FundConfiguration::new(self.usdc, self.dai, self.link, self.weth)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VenueSettings {
    pub amm_fee_bps: u16,
    pub clmm_fee_bps: u16,
    pub clmm_concentration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSettings {
    pub stable_reserve: u64,
    pub link_reserve: u64,
    pub weth_reserve: u64,
    pub depositor_balance: u64,
}

/// Final configuration combining CLI args, config file, and defaults
#[derive(Debug, Clone)]
pub struct Config {
    pub assets: AssetBook,
    pub slippage: SlippagePolicy,
    pub deadline_secs: u64,
    pub venues: VenueSettings,
    pub market: MarketSettings,
    pub verbose: bool,
}

impl Config {
    /// Create config from CLI args
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config_file = match &args.config {
            Some(path) => Self::load_config_file(path)?,
            None => ConfigFile::default(),
        };
        let defaults = Self::default_simulation();

        let assets_file = config_file.assets.unwrap_or_default();
        let assets = AssetBook {
            usdc: Self::parse_address(assets_file.usdc, defaults.assets.usdc)?,
            dai: Self::parse_address(assets_file.dai, defaults.assets.dai)?,
            link: Self::parse_address(assets_file.link, defaults.assets.link)?,
            weth: Self::parse_address(assets_file.weth, defaults.assets.weth)?,
        };

        // Priority: CLI > config file > default
        let routing = config_file.routing.unwrap_or_default();
        let slippage_bps = args
            .slippage_bps
            .or(routing.slippage_bps)
            .unwrap_or(DEFAULT_SLIPPAGE_BPS);
        let unbounded = args.unbounded_slippage
            || match routing.slippage_policy.as_deref() {
                None | Some("tolerance") => false,
                Some("unbounded") => true,
                Some(other) => {
                    return Err(FundError::ConfigError(format!(
                        "Unknown slippage policy: {}",
                        other
                    )));
                }
            };
        let slippage = if unbounded {
            SlippagePolicy::Unbounded
        } else {
            SlippagePolicy::Tolerance { bps: slippage_bps }
        };

        let deadline_secs = args
            .deadline_secs
            .or(routing.deadline_secs)
            .unwrap_or(DEFAULT_DEADLINE_SECS);

        let venues_file = config_file.venues.unwrap_or_default();
        let venues = VenueSettings {
            amm_fee_bps: venues_file.amm_fee_bps.unwrap_or(defaults.venues.amm_fee_bps),
            clmm_fee_bps: venues_file.clmm_fee_bps.unwrap_or(defaults.venues.clmm_fee_bps),
            clmm_concentration: venues_file
                .clmm_concentration
                .unwrap_or(defaults.venues.clmm_concentration),
        };

        let market_file = config_file.market.unwrap_or_default();
        let market = MarketSettings {
            stable_reserve: market_file
                .stable_reserve
                .unwrap_or(defaults.market.stable_reserve),
            link_reserve: market_file.link_reserve.unwrap_or(defaults.market.link_reserve),
            weth_reserve: market_file.weth_reserve.unwrap_or(defaults.market.weth_reserve),
            depositor_balance: market_file
                .depositor_balance
                .unwrap_or(defaults.market.depositor_balance),
        };

        let config = Self {
            assets,
            slippage,
            deadline_secs,
            venues,
            market,
            verbose: args.verbose,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.slippage.validate()?;

        if self.deadline_secs == 0 {
            return Err(FundError::ConfigError(
                "deadline_secs must be positive".to_string(),
            ));
        }
        if self.venues.amm_fee_bps >= 10_000 || self.venues.clmm_fee_bps >= 10_000 {
            return Err(FundError::ConfigError(
                "venue fees must be below 10000 bps".to_string(),
            ));
        }
        if self.venues.clmm_concentration == 0 {
            return Err(FundError::ConfigError(
                "clmm_concentration must be at least 1".to_string(),
            ));
        }

        self.fund_configuration().validate()
    }

    /// Fund whitelist with the configured deadline window
    pub fn fund_configuration(&self) -> FundConfiguration {
        self.assets
            .fund_configuration()
            .with_deadline_secs(self.deadline_secs)
    }

    /// Load config file from path
    fn load_config_file(path: &PathBuf) -> Result<ConfigFile> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FundError::ConfigError(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| FundError::ConfigError(format!("Failed to parse config file: {}", e)))
    }

    fn parse_address(value: Option<String>, fallback: Pubkey) -> Result<Pubkey> {
        match value {
            Some(s) => Pubkey::from_str(&s)
                .map_err(|e| FundError::ConfigError(format!("Invalid address '{}': {}", s, e))),
            None => Ok(fallback),
        }
    }

    /// Default config for the simulated market
    pub fn default_simulation() -> Self {
        Self {
            assets: AssetBook::generate(),
            slippage: SlippagePolicy::default(),
            deadline_secs: DEFAULT_DEADLINE_SECS,
            venues: VenueSettings {
                amm_fee_bps: 30,
                clmm_fee_bps: 5,
                clmm_concentration: 4,
            },
            market: MarketSettings {
                stable_reserve: 50_000_000_000_000,
                link_reserve: 3_300_000_000_000,
                weth_reserve: 20_000_000_000,
                depositor_balance: 1_000_000_000_000,
            },
            verbose: false,
        }
    }
}
