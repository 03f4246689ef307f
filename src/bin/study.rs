//! Sampling Study Binary
//!
//! Tabulates MAP allocations across growing totals for each of the
//! supported laws: multinomial, equidistributed, hierarchical, Basel,
//! universal-prior, product and selection.

use clap::Parser;
use colored::Colorize;
use mapnomial::sample::generator;
use mapnomial::sample::generator::Generator;

#[derive(Parser)]
#[command(about = "MAP multinomial sampling studies")]
struct Args {
    /// largest total frequency swept by the studies
    #[arg(long, default_value_t = 1e2)]
    max_total: f64,
    /// probability vector for the multinomial study
    #[arg(long, value_delimiter = ',', default_values_t = vec![0.4, 0.3, 0.2, 0.1])]
    probs: Vec<f64>,
    /// value count for the equidistributed study
    #[arg(long, default_value_t = 5)]
    values: usize,
    /// selection size for the selection study
    #[arg(long, default_value_t = 3)]
    selection: usize,
    /// index bound for the Basel and universal-prior studies
    #[arg(long, default_value_t = 10)]
    max_index: usize,
}

fn totals(max: f64) -> Vec<f64> {
    let mut totals = Vec::new();
    let mut total = 1.0;
    while total <= max {
        totals.push(total);
        if total < 9.5 {
            total += 1.0;
        } else if total < 9.5e9 {
            total *= 10.0;
        } else {
            total *= 1e10;
        }
    }
    totals
}

fn main() {
    mapnomial::init();
    let args = Args::parse();
    let generator = Generator::default();

    println!("{}", "Multinomial".bold());
    println!("Total{}\tp(E)", generator::tabulate(&args.probs));
    for total in totals(args.max_total) {
        let frequencies = generator.compute_best_sample(total, &args.probs);
        let prob = generator.frequency_vector_prob(&args.probs, &frequencies);
        println!("{}{}\t{}", total, generator::tabulate(&frequencies), prob);
    }

    println!("\n{}\t{}", "Equidistributed".bold(), args.values);
    for total in totals(args.max_total) {
        let frequencies = generator.compute_best_equidistributed_sample(total, args.values);
        println!("{}{}", total, generator::tabulate(&frequencies));
    }

    println!("\n{}\t{}\t{}", "Hierarchical".bold(), args.values, args.values);
    for total in totals(args.max_total) {
        let (primary, secondary) =
            generator.compute_best_hierarchical_samples(total, args.values, args.values);
        println!(
            "{}{}{}",
            total,
            generator::tabulate(&primary),
            generator::tabulate(&secondary)
        );
    }

    println!("\n{}\t{}", "Basel".bold(), args.max_index);
    let basel = Generator::basel_probs(args.max_index);
    println!("Probs{}", generator::tabulate(&basel));
    for total in totals(args.max_total) {
        let frequencies = generator.compute_best_basel_sample(total, args.max_index);
        println!("{}{}", total, generator::tabulate(&frequencies));
    }

    println!("\n{}\t{}", "Universal prior".bold(), args.max_index);
    let universal = Generator::universal_prior_probs(args.max_index);
    println!("Probs{}", generator::tabulate(&universal));
    for total in totals(args.max_total) {
        let frequencies = generator.compute_best_universal_prior_sample(total, args.max_index);
        println!("{}{}", total, generator::tabulate(&frequencies));
    }

    println!("\n{}", "Product".bold());
    for total in totals(args.max_total) {
        let cells = generator.compute_best_product_sample(total, &basel, &universal);
        println!("Total frequency\t{}", total);
        print!("{}", generator::tabulate_cells(&cells));
    }

    println!("\n{}\t{}", "Selection".bold(), args.selection);
    for total in totals(args.max_total) {
        let cells = generator.compute_best_selection_sample(total, args.selection, &basel);
        println!("Total frequency\t{}", total);
        print!("{}", generator::tabulate_cells(&cells));
    }
}
