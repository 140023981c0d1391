//! Example: price a short call book, hedge its delta and gamma, then build
//! an efficient frontier
//!
//! Run with: cargo run --example hedge_and_frontier

use ndarray::array;
use quantcore::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn main() -> QuantResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quantcore=info".into()),
        )
        .init();

    // Option parameters
    let spot = 543.0;
    let strike = 545.0;
    let time = 30.0 / DAYS_PER_YEAR;
    let rate = 0.015;
    let vol = 0.53;
    let contracts = -1000.0; // short

    println!("=== Black-Scholes Pricing ===\n");
    println!("Spot:     ${:.2}", spot);
    println!("Strike:   ${:.2}", strike);
    println!("Time:     {:.4} years ({:.0} days)", time, time * DAYS_PER_YEAR);
    println!("Rate:     {:.1}%", rate * 100.0);
    println!("Vol:      {:.1}%\n", vol * 100.0);

    let call = OptionContract::call(spot, vol, strike, time, rate)?;
    let put = OptionContract::put(spot, vol, strike, time, rate)?;
    println!("Call Price: ${:.4}", call.price());
    println!("Put Price:  ${:.4}", put.price());

    let parity_lhs = call.price() - put.price();
    let parity_rhs = spot - strike * (-rate * time).exp();
    println!("\nPut-Call Parity Check:");
    println!("  C - P = {:.4}", parity_lhs);
    println!("  S - K*e^(-rT) = {:.4}", parity_rhs);

    // Per-share book so the numbers match a per-contract sign convention
    let book = Position::new(call, contracts)?.with_multiplier(1.0)?;
    let signed = book.signed_unit_greeks();
    println!("\n=== Short Book ({} contracts) ===\n", contracts);
    println!("Value:  ${:.2}", book.market_value());
    println!("Delta:  {:.4} per contract, {:.2} total", signed.delta, book.greeks().delta);
    println!("Gamma:  {:.5} per contract, {:.4} total", signed.gamma, book.greeks().gamma);
    println!("Share hedge for delta alone: {:.2}", delta_hedge_shares(&book));

    println!("\n=== Delta-Gamma Neutralization ===\n");
    let hedges = vec![
        OptionContract::call(spot, vol, 560.0, 60.0 / DAYS_PER_YEAR, rate)?,
        OptionContract::put(spot, vol, 530.0, time, rate)?,
    ];
    let portfolio = HedgePortfolio::new(book, hedges)?;
    match GreeksNeutralizer::default().neutralize(&portfolio) {
        Ok(solution) => {
            let [a, b] = solution.hedge_contracts();
            println!("Buy {:.2} x 560C (60d), {:.2} x 530P (30d)", a, b);
            println!("Hedge cost: ${:.2}", solution.hedge_cost());
            println!("Condition number: {:.2}", solution.ratios.condition_number);
            println!(
                "Net delta {:.2e}, net gamma {:.2e}",
                solution.net_greeks.delta, solution.net_greeks.gamma
            );
        }
        Err(e) => println!("Cannot hedge: {}", e),
    }

    println!("\n=== Efficient Frontier ===\n");
    let optimizer = PortfolioOptimizer::from_moments(
        array![0.06, 0.09, 0.12, 0.16],
        array![
            [0.0064, 0.0024, 0.0018, 0.0000],
            [0.0024, 0.0225, 0.0132, 0.0135],
            [0.0018, 0.0132, 0.0484, 0.0330],
            [0.0000, 0.0135, 0.0330, 0.0900]
        ],
        OptimizerConfig::default(),
    )?;

    let grid = optimizer.target_grid(8, true)?;
    let frontier = optimizer.efficient_frontier(&grid, true);
    println!("{:>10} {:>10}   weights", "return", "vol");
    for point in frontier.points() {
        println!(
            "{:>9.2}% {:>9.2}%   {:.3}",
            point.expected_return * 100.0,
            point.volatility * 100.0,
            point.weights
        );
    }
    if let Some(tangent) = frontier.max_sharpe(0.02) {
        println!("\nMax Sharpe (rf 2%): {:.3}", tangent.sharpe(0.02).unwrap_or_default());
    }

    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let samples = optimizer.random_portfolios(2000, &mut rng);
    if let Some(best) = best_sharpe(&samples, 0.02) {
        println!(
            "Best of {} random portfolios: return {:.2}%, vol {:.2}%",
            samples.len(),
            best.expected_return * 100.0,
            best.volatility * 100.0
        );
    }

    println!("\n=== Max Utility (δ = 3, shorting allowed) ===\n");
    let alloc = optimizer.max_utility(3.0)?;
    println!("Weights: {:.3}", alloc.point.weights);
    println!("Utility: {:.4}", alloc.utility);

    Ok(())
}
