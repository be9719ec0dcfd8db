//! Fluid Advect CLI - Run advection scenes from JSON configuration.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use fluid_advect::{
    compute::{AdvectionPropagator, SimulationState, SimulationStats},
    schema::SimulationConfig,
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json> [steps]", args[0]);
        eprintln!();
        eprintln!("Advect a scene's density and velocity from a JSON configuration.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to simulation configuration file");
        eprintln!("  steps        Number of simulation steps (default: 100)");
        eprintln!();
        eprintln!("Example configuration is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);
    let steps: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: SimulationConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    println!("Fluid Advect");
    println!("============");
    if config.is_3d() {
        println!(
            "Grid: {}x{}x{} (batch {})",
            config.width, config.height, config.depth, config.batch
        );
    } else {
        println!("Grid: {}x{} (batch {})", config.width, config.height, config.batch);
    }
    println!(
        "Density: {} (order {}), velocity: {} (order {})",
        config.density.method,
        config.density.order_space,
        config.velocity.method,
        config.velocity.order_space
    );
    println!("dt: {}", config.dt);
    println!("Steps: {}", steps);
    println!();

    // Initialize
    let mut state = SimulationState::from_config(&config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });
    let initial_stats = SimulationStats::from_state(&state);
    print_stats("Initial state", &initial_stats);

    let mut propagator = AdvectionPropagator::new(config).unwrap_or_else(|e| {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    });

    // Run simulation
    println!("Running simulation...");
    let start = Instant::now();

    for i in 0..steps {
        if let Err(e) = propagator.step(&mut state) {
            eprintln!("Advection failed at step {}: {}", i, e);
            std::process::exit(1);
        }

        // Print progress every 10%
        if (i + 1) % (steps / 10).max(1) == 0 {
            let stats = SimulationStats::from_state(&state);
            let elapsed = start.elapsed().as_secs_f32();
            let steps_per_sec = (i + 1) as f32 / elapsed;
            println!(
                "  Step {}/{}: density={:.6}, range=[{:.4}, {:.4}], |u|max={:.3}, {:.1} steps/s",
                i + 1,
                steps,
                stats.total_density,
                stats.min_density,
                stats.max_density,
                stats.max_velocity,
                steps_per_sec
            );
        }
    }

    let elapsed = start.elapsed();
    let final_stats = SimulationStats::from_state(&state);

    println!();
    print_stats("Final state", &final_stats);
    if initial_stats.total_density > 0.0 {
        println!(
            "Density retained: {:.4}%",
            final_stats.total_density / initial_stats.total_density * 100.0
        );
    }
    println!(
        "Time: {:.2}s ({:.1} steps/s)",
        elapsed.as_secs_f32(),
        steps as f32 / elapsed.as_secs_f32()
    );
}

fn print_stats(label: &str, stats: &SimulationStats) {
    println!("{}:", label);
    println!("  Total density: {:.6}", stats.total_density);
    println!("  Active cells: {}", stats.active_cells);
    println!("  Fluid cells: {}", stats.fluid_cells);
    println!(
        "  Density range: [{:.6}, {:.6}]",
        stats.min_density, stats.max_density
    );
    println!();
}

fn print_example_config() {
    let config = SimulationConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example: {}", e),
    }
}
