use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;

use citydispatch::graph::{Graph, Route};
use citydispatch::map;
use citydispatch::triage::{EmergencyKind, EmergencyTask, TaskTree};

#[derive(Parser, Debug)]
#[command(name = "citydispatch")]
#[command(about = "Load a city road map and dispatch emergencies to the nearest facility over shortest paths.", long_about = None)]
struct Cli {
    /// Path to the map file
    #[arg(short, long, default_value_t = String::from("map.txt"))]
    map: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let mut graph = map::load(&cli.map).with_context(|| format!("loading map file {}", &cli.map))?;
    if graph.is_empty() {
        warn!("map file {} contains no locations", cli.map);
    }
    println!("Loaded {} locations from {}", graph.len(), cli.map);

    let stdin = io::stdin();
    let mut input = stdin.lock().lines();

    loop {
        println!("\n--- Main Menu ---");
        println!("1. Find Route");
        println!("2. Emergency Handler");
        println!("3. Traffic Handler");
        println!("0. Exit");
        let choice = match prompt(&mut input, "Enter your choice: ")? {
            Some(choice) => choice,
            None => break,
        };
        match choice.as_str() {
            "0" => {
                println!("Exiting program.");
                break;
            }
            "1" => find_route(&graph, &mut input)?,
            "2" => emergency_handler(&graph, &mut input)?,
            "3" => traffic_handler(&mut graph, &mut input)?,
            _ => println!("Invalid choice! Please try again."),
        }
    }

    Ok(())
}

/// Prints `msg` and reads one trimmed line. `None` means stdin hit EOF.
fn prompt<I>(input: &mut I, msg: &str) -> Result<Option<String>>
where
    I: Iterator<Item = io::Result<String>>,
{
    print!("{msg}");
    io::stdout().flush()?;
    match input.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

fn find_route<I>(graph: &Graph, input: &mut I) -> Result<()>
where
    I: Iterator<Item = io::Result<String>>,
{
    let start = match prompt(input, "Enter start point: ")? {
        Some(start) => start,
        None => return Ok(()),
    };
    let end = match prompt(input, "Enter end point: ")? {
        Some(end) => end,
        None => return Ok(()),
    };
    println!("Shortest path from {start} to {end}:");
    match graph.shortest_path(&start, &end) {
        Ok(route) => print_route(&route),
        Err(err) => println!("{err}"),
    }
    Ok(())
}

/// Collects a batch of emergencies, then dispatches them in urgency order:
/// each drained task is routed to the nearest facility of its kind.
fn emergency_handler<I>(graph: &Graph, input: &mut I) -> Result<()>
where
    I: Iterator<Item = io::Result<String>>,
{
    let mut intake = TaskTree::new();
    loop {
        let raw = match prompt(input, "\nEnter emergency type (1=Medical, 2=Fire, 3=Crime, 0=Stop): ")? {
            Some(raw) => raw,
            None => break,
        };
        if raw == "0" {
            break;
        }
        let kind = match raw.parse::<i32>().ok().and_then(EmergencyKind::from_code) {
            Some(kind) => kind,
            None => {
                println!("Invalid input. Please try again.");
                continue;
            }
        };
        let severity = match prompt(
            input,
            "Enter condition (1=Extremely Dangerous, 2=Dangerous, 3=Mildly Dangerous): ",
        )? {
            Some(raw) => match raw.parse::<i32>() {
                Ok(severity) => severity,
                Err(_) => {
                    println!("Invalid input. Please try again.");
                    continue;
                }
            },
            None => break,
        };
        let location = match prompt(input, "Enter emergency location: ")? {
            Some(location) => location,
            None => break,
        };
        intake.insert(EmergencyTask {
            location,
            kind,
            severity,
        });
    }

    for task in intake.drain_in_order() {
        println!(
            "\nProcessing task at {} with urgency {}",
            task.location, task.severity
        );
        let tag = task.kind.facility_tag();
        match graph.nearest_facility(&task.location, tag) {
            Ok(facility) => {
                println!("Nearest {tag}: {facility}");
                println!("Shortest path from {} to {}:", task.location, facility);
                match graph.shortest_path(&task.location, &facility) {
                    Ok(route) => print_route(&route),
                    Err(err) => println!("{err}"),
                }
            }
            Err(err) => println!("{err}"),
        }
    }
    Ok(())
}

fn traffic_handler<I>(graph: &mut Graph, input: &mut I) -> Result<()>
where
    I: Iterator<Item = io::Result<String>>,
{
    let start = match prompt(input, "Enter start point: ")? {
        Some(start) => start,
        None => return Ok(()),
    };
    let end = match prompt(input, "Enter end point: ")? {
        Some(end) => end,
        None => return Ok(()),
    };

    println!("Select traffic condition between {start} and {end}:");
    println!("1. Extreme Traffic (factor 1.75)");
    println!("2. Traffic (factor 1.5)");
    println!("3. Light Traffic (factor 1.25)");
    println!("0. Cancel");
    let choice = match prompt(input, "Enter your choice: ")? {
        Some(choice) => choice,
        None => return Ok(()),
    };
    let factor = match choice.as_str() {
        "1" => 1.75,
        "2" => 1.5,
        "3" => 1.25,
        "0" => return Ok(()),
        _ => {
            println!("Invalid input. Please try again.");
            return Ok(());
        }
    };
    match graph.apply_traffic_factor(&start, &end, factor) {
        Ok(weight) => {
            println!("Traffic factor applied between {start} and {end}. New distance: {weight:.2}")
        }
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn print_route(route: &Route) {
    println!("{}", route.stops.join(" -> "));
    println!("Total distance: {:.2}", route.cost);
}
