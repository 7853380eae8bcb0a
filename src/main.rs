//! x11handles - Demo client
//!
//! Opens a display, shows a window with a few shapes on it and prints the
//! events it receives.

use std::env;
use std::process;
use x11handles::backend;
use x11handles::{
    event_mask, slot, Config, Connection, EventType, Registry, ShortArray, Slot, VERSION,
};

fn print_usage() {
    println!("x11handles v{}", VERSION);
    println!("Safe handles over an X11 client session");
    println!();
    println!("Usage: x11handles [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -display <name>       Display to open (default: $DISPLAY)");
    println!("  -backend <type>       Backend type (x11, null)");
    println!("  -events <n>           Number of events to print before exiting (default: 10)");
    println!("  -list-backends        List available backends");
    println!("  -h, --help            Show this help message");
    println!();
    println!("Environment:");
    println!("  DISPLAY               Default display");
    println!("  X11HANDLES_BACKEND    Default backend");
    println!("  RUST_LOG              Log filter (default: info)");
    println!();
}

fn list_backends() {
    println!("Available backends:");
    for backend in backend::available_backends() {
        println!("  - {}", backend);
    }
    println!();
    println!("To build without the X11 backend:");
    println!("  cargo build --no-default-features");
}

#[derive(Debug)]
struct Options {
    config: Config,
    events: usize,
}

fn parse_args(config: Config) -> Result<Options, String> {
    let mut options = Options { config, events: 10 };
    let args: Vec<String> = env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "-list-backends" => {
                list_backends();
                process::exit(0);
            }
            "-display" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for -display".to_string());
                }
                options.config.display = Some(args[i].clone());
            }
            "-backend" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for -backend".to_string());
                }
                options.config.backend = args[i].parse()?;
            }
            "-events" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for -events".to_string());
                }
                options.events = args[i]
                    .parse()
                    .map_err(|_| "Invalid event count".to_string())?;
            }
            arg => {
                return Err(format!("Unknown option: {}", arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

fn run(options: &Options) -> x11handles::Result<()> {
    let registry = Registry::new();
    let conn = Connection::open(&registry, &options.config)?;

    log::info!(
        "Display {} ({} release {}), {} screen(s)",
        conn.display_string()?,
        conn.server_vendor()?,
        conn.vendor_release()?,
        conn.screen_count()?
    );
    let screen = conn.screen(None)?;
    log::info!(
        "Screen {}: {}x{} ({}x{} mm), depth {}",
        screen.number(),
        screen.width()?,
        screen.height()?,
        screen.width_mm()?,
        screen.height_mm()?,
        screen.planes()?
    );

    let window = conn.create_window()?;
    window.select_input(
        event_mask::EXPOSURE
            | event_mask::KEY_PRESS
            | event_mask::BUTTON_PRESS
            | event_mask::STRUCTURE_NOTIFY,
    )?;
    window.map()?;
    log::info!("Mapped window {}", window.id());

    let gc = conn.default_gc(None)?;
    let shapes = ShortArray::from_rows(&[[20, 20, 160, 100], [220, 60, 120, 120]]);

    for _ in 0..options.events {
        let event = match conn.next_event() {
            Ok(event) => event,
            Err(e) => {
                log::warn!("No more events: {}", e);
                break;
            }
        };
        let kind = event
            .event_type()
            .map(|t| format!("{:?}", t))
            .unwrap_or_else(|| format!("code {}", event.code().unwrap_or(0)));
        let target = match &event[slot::WINDOW] {
            Slot::Drawable(d) => d.id().to_string(),
            _ => "-".to_string(),
        };
        println!("{:<20} serial {:<6} window {}", kind, event.serial().unwrap_or(0), target);

        let last_expose =
            event.event_type() == Some(EventType::Expose) && event[slot::COUNT] == Slot::Int(0);
        if last_expose && event.window() == Some(&window) {
            window.draw_rectangles(&gc, &shapes)?;
            conn.flush()?;
        }
    }

    conn.close()
}

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };

    // Parse command line arguments
    let options = match parse_args(config) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    log::info!("x11handles v{}", VERSION);
    log::info!("Backend: {}", options.config.backend);

    if let Err(e) = run(&options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
