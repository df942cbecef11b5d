//! Stablecoin Fund Router
//!
//! Runs deposits, withdrawals and previews against a simulated two-venue market

use clap::Parser;
use fund_router::*;
use fund_router::config::CliArgs;
use fund_router::router::RouteSelection;
use log::{error, info};
use std::sync::Arc;

/// Input used when no --amount is given
const DEFAULT_AMOUNT: u64 = 1_000_000_000;

fn main() {
    let args = CliArgs::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(e) = run(args) {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs) -> Result<()> {
    let config = Config::from_args(args.clone())?;
    info!("Slippage policy: {:?}", config.slippage);

    let market = SimulatedMarket::bootstrap(&config, Arc::new(SystemClock))?;
    let amount = args.amount.unwrap_or(DEFAULT_AMOUNT);

    match args.action.as_str() {
        "deposit" => run_deposit(&market, &args, amount),
        "withdraw" => run_withdraw(&market, &args, amount),
        "preview" => run_preview(&market, &args, amount),
        other => Err(FundError::ConfigError(format!("Unknown action: {}", other))),
    }
}

fn run_deposit(market: &SimulatedMarket, args: &CliArgs, amount: u64) -> Result<()> {
    let stable = market.assets.resolve(args.asset.as_deref().unwrap_or("usdc"))?;
    let caller = market.depositor;

    market.approve_fund(&caller, &stable, amount)?;
    let outcome = market.fund.deposit(&caller, amount, &stable)?;

    info!("Deposited {} {}", amount, symbol(market, &stable));
    for leg in [&outcome.risk_a_leg, &outcome.risk_b_leg].into_iter().flatten() {
        print_execution(leg);
    }
    info!("   LINK received: {}", outcome.risk_a_amount);
    info!("   WETH received: {}", outcome.risk_b_amount);

    print_events(market)
}

fn run_withdraw(market: &SimulatedMarket, args: &CliArgs, amount: u64) -> Result<()> {
    let risk = market.assets.resolve(args.asset.as_deref().unwrap_or("link"))?;
    let stable = market.assets.resolve(&args.stable_out)?;

    // The simulated depositor starts without risk assets
    let caller = market.new_account(&risk, amount)?;
    market.approve_fund(&caller, &risk, amount)?;
    let outcome = market.fund.withdraw(&caller, amount, &risk, &stable)?;

    info!(
        "Withdrew {} {} into {} {}",
        amount,
        symbol(market, &risk),
        outcome.amount_out,
        symbol(market, &stable)
    );
    print_execution(&outcome.execution);

    print_events(market)
}

fn run_preview(market: &SimulatedMarket, args: &CliArgs, amount: u64) -> Result<()> {
    let asset = market.assets.resolve(args.asset.as_deref().unwrap_or("usdc"))?;

    if market.fund.config().is_risk(&asset) {
        let stable = market.assets.resolve(&args.stable_out)?;
        let selection = market.fund.preview_withdraw(amount, &asset, &stable)?;
        info!(
            "Withdraw preview: {} {} -> {}",
            amount,
            symbol(market, &asset),
            symbol(market, &stable)
        );
        print_selection(&selection);
        return Ok(());
    }

    let preview = market.fund.preview_deposit(amount, &asset)?;
    info!("Deposit preview: {} {}", amount, symbol(market, &asset));
    info!("   LINK leg input: {}", preview.risk_a_input);
    if let Some(selection) = &preview.risk_a_route {
        print_selection(selection);
    }
    info!("   WETH leg input: {}", preview.risk_b_input);
    if let Some(selection) = &preview.risk_b_route {
        print_selection(selection);
    }
    Ok(())
}

fn symbol(market: &SimulatedMarket, asset: &types::Asset) -> String {
    market
        .assets
        .symbol(asset)
        .map(str::to_string)
        .unwrap_or_else(|| asset.to_string())
}

fn print_selection(selection: &RouteSelection) {
    let show = |quote: Option<u64>| quote.map_or("unavailable".to_string(), |q| q.to_string());
    info!("   venue-a quote: {}", show(selection.quote_a));
    info!("   venue-b quote: {}", show(selection.quote_b));
    info!(
        "   selected:      {} ({})",
        selection.chosen.venue_name, selection.chosen.venue
    );
}

fn print_execution(result: &ExecutionResult) {
    info!("   Venue:         {} ({})", result.venue_name, result.venue);
    info!("      Amount In:  {}", result.amount_in);
    info!("      Quoted:     {}", result.quoted_out);
    info!("      Minimum:    {}", result.min_amount_out);
    info!("      Received:   {}", result.amount_out);
    info!(
        "      Slippage:   {:.2}%",
        result.slippage_bps() as f64 / 100.0
    );
}

fn print_events(market: &SimulatedMarket) -> Result<()> {
    for event in market.events.drain() {
        let line = serde_json::to_string(&event).map_err(anyhow::Error::from)?;
        println!("{}", line);
    }
    Ok(())
}
