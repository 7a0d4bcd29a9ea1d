// ============================================================================
// main.rs
// Entry point. Initializes logging, parses startup flags and starts the
// event loop.
// ============================================================================

use rocketviz::app::{App, RunOptions};
use winit::event_loop::EventLoop;

fn main() {
    env_logger::init();

    let options = parse_args();

    let event_loop = EventLoop::new().unwrap();
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = App::new(options);
    event_loop.run_app(&mut app).unwrap();
}

fn parse_args() -> RunOptions {
    let mut options = RunOptions::default();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                if let Some(path) = args.next() {
                    options.config_path = path.into();
                } else {
                    log::warn!("--config needs a path, keeping {}", options.config_path.display());
                }
            }
            "--gamepad" => options.gamepad = true,
            "--cars" => match args.next().and_then(|n| n.parse().ok()) {
                Some(count) => options.car_count = count,
                None => log::warn!("--cars needs a number, keeping {}", options.car_count),
            },
            "--no-step" => options.step_arena = false,
            "--spectate" => options.overwrite_controls = false,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                log::warn!("Unknown argument: {}", other);
            }
        }
    }

    options
}

fn print_usage() {
    println!(
        "rocketviz — interactive arena viewer\n\
         \n\
         USAGE: rocketviz [OPTIONS]\n\
         \n\
         OPTIONS:\n\
         \x20   --config <PATH>   Config file (default: rocketviz.toml)\n\
         \x20   --gamepad         Use the first connected gamepad for controls\n\
         \x20   --cars <N>        Cars spawned in the bundled arena (default: 2)\n\
         \x20   --no-step         Do not advance the simulation from the viewer\n\
         \x20   --spectate        Watch without overwriting any car's controls\n\
         \x20   -h, --help        Print this help"
    );
}
