//! Route Search CLI - Run a route search from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use route_search::{
    compute::{evolution::Evolution, route_length, spiral_likeness},
    schema::{DiscreteChromosome, SearchConfig},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [result.json]", args[0]);
        eprintln!();
        eprintln!("Evolve treasure-hunt routes from JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to search configuration file");
        eprintln!("  result.json  Where to write the full result (optional)");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let output_path = args.get(2).map(PathBuf::from);

    let config = SearchConfig::load(&config_path).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    println!("Route Search");
    println!("============");
    println!("Name: {}", config.name);
    println!("Fitness: {}", config.fitness);
    println!(
        "Positions: {} (distances {:?})",
        config.positions, config.distance_bounds
    );
    println!(
        "Population: {} ({} survivors + {} offspring)",
        config.population, config.survivors, config.offspring
    );
    println!("Generations: {}", config.limit);
    println!();

    let limit = config.limit;
    let constraints = std::sync::Arc::new(config.constraints());
    let start = Instant::now();

    // Print progress every 10%
    let mut evolution = Evolution::new(config).with_progress(move |generation| {
        if generation % (limit / 10).max(1) == 0 {
            let elapsed = start.elapsed().as_secs_f32();
            println!(
                "  Generation {}/{}: {:.1} generations/s",
                generation,
                limit,
                generation as f32 / elapsed
            );
        }
    });

    println!("Running search...");
    let result = evolution.run().unwrap_or_else(|e| {
        eprintln!("Search failed: {}", e);
        std::process::exit(1);
    });

    println!();
    println!("Best route:");
    println!("  Fitness: {:.6}", result.best.fitness);
    for metric in &result.best.metric_scores {
        println!("  {}: {:.6}", metric.name, metric.score);
    }
    match DiscreteChromosome::from_record(constraints, &result.best.route) {
        Ok(route) => {
            println!("  Route: {}", route);
            println!("  Length: {:.6}", route_length(&route));
            println!("  Spiral-likeness: {:.6}", spiral_likeness(&route));
        }
        Err(e) => eprintln!("  Could not rebuild route: {}", e),
    }
    println!();
    println!(
        "Stopped: {:?} after {} generations ({} evaluations, {:.2}s)",
        result.stats.stop_reason,
        result.stats.generations,
        result.stats.total_evaluations,
        result.stats.elapsed_seconds
    );

    if let Some(path) = output_path {
        let json = serde_json::to_string_pretty(&result).unwrap_or_else(|e| {
            eprintln!("Error serializing result: {}", e);
            std::process::exit(1);
        });
        if let Err(e) = fs::write(&path, json) {
            eprintln!("Error writing {}: {}", path.display(), e);
            std::process::exit(1);
        }
        println!("Result written to {}", path.display());
    }
}

fn print_example_config() {
    let config = SearchConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing config: {}", e),
    }
}
