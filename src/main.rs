//! Operator console for the tilt-rotor hexacopter demonstrator.
//!
//! - `run`: drive the twelve servos from the keyboard (or a key script)
//! - `plot-sweep`: chart one arm's targets over a sweep as SVG
//! - `show-config`: print the effective configuration

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hexatilt::actuator::ActuatorBank;
use hexatilt::config::{load_config, RuntimeConfig, ARM_COUNT, DEFAULT_CONFIG_PATH};
use hexatilt::control::{Command, Controller};
use hexatilt::input::{CommandSource, TerminalSource};
use hexatilt::ipc::{spawn_script_feeder, DiagnosticLog};
use hexatilt::metrics::TransportMetrics;
use hexatilt::sequencer::SweepKind;
use hexatilt::transport::{DynamixelBus, SimulatedBus, Transport};
use hexatilt::visualization::{render_diagnostics, render_status, render_trajectory_svg, sweep_trajectory};

/// Tilt-rotor actuator controller
#[derive(Parser, Debug)]
#[command(name = "hexatilt")]
#[command(about = "Keyboard control of the hexacopter tilt-rotor servos")]
#[command(version)]
struct Args {
    /// Runtime configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Interactive control loop (the default)
    Run {
        /// Serial device, overrides [bus].device
        #[arg(long)]
        device: Option<String>,

        /// Baud rate, overrides [bus].baud
        #[arg(long)]
        baud: Option<u32>,

        /// Use the in-memory servo bus instead of hardware
        #[arg(long)]
        simulate: bool,

        /// Read keys from a script file instead of the keyboard
        #[arg(long)]
        script: Option<PathBuf>,

        /// Delay between scripted keys in milliseconds
        #[arg(long, default_value = "200")]
        script_interval_ms: u64,
    },

    /// Render one arm's sweep targets to an SVG chart
    PlotSweep {
        #[arg(long, value_enum, default_value = "body")]
        kind: SweepArg,

        /// Arm number (1-6)
        #[arg(long, default_value = "1")]
        arm: usize,

        #[arg(long, default_value = "sweep.svg")]
        output: PathBuf,
    },

    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SweepArg {
    Origin,
    Body,
}

impl From<SweepArg> for SweepKind {
    fn from(arg: SweepArg) -> Self {
        match arg {
            SweepArg::Origin => SweepKind::Origin,
            SweepArg::Body => SweepKind::Body,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args.config)?;

    match args.command.unwrap_or(Cmd::Run {
        device: None,
        baud: None,
        simulate: false,
        script: None,
        script_interval_ms: 200,
    }) {
        Cmd::Run {
            device,
            baud,
            simulate,
            script,
            script_interval_ms,
        } => {
            let mut config = config;
            if let Some(device) = device {
                config.bus.device = device;
            }
            if let Some(baud) = baud {
                config.bus.baud = baud;
            }
            config.validate()?;
            run(&config, simulate, script, Duration::from_millis(script_interval_ms))
        }
        Cmd::PlotSweep { kind, arm, output } => plot_sweep(&config, kind.into(), arm, output),
        Cmd::ShowConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn print_key_help() {
    println!("------------------------------------------");
    println!("0: all arms about their own origin");
    println!("9: all arms as one body");
    println!("q: sweep about each origin");
    println!("w: sweep about the body center");
    println!("-: send every servo to its offset");
    println!("1-6: control a single arm");
    println!("m: calibrate offsets from current positions");
    println!("j/l/i/k or arrows: left, right, forward, back");
    println!("a: larger step, z: smaller step");
    println!("space: stop a sweep");
    println!("ESC or Ctrl-C to quit");
    println!("------------------------------------------");
}

fn run(
    config: &RuntimeConfig,
    simulate: bool,
    script: Option<PathBuf>,
    script_interval: Duration,
) -> Result<()> {
    let diagnostics = DiagnosticLog::default();
    let metrics = TransportMetrics::new();

    let mut transport: Box<dyn Transport> = if simulate {
        info!("Using simulated servo bus");
        Box::new(SimulatedBus::new())
    } else {
        Box::new(DynamixelBus::new())
    };
    let bank = ActuatorBank::connect(transport.as_mut(), config, &diagnostics, &metrics);
    let mut controller = Controller::new(bank, config);

    let (mut source, feeder) = match script {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read script {}", path.display()))?;
            let commands = Command::parse_script(&text);
            info!("Running {} scripted commands from {}", commands.len(), path.display());
            let (source, handle) = spawn_script_feeder(commands, script_interval);
            (Box::new(source) as Box<dyn CommandSource>, Some(handle))
        }
        None => (Box::new(TerminalSource::new()) as Box<dyn CommandSource>, None),
    };

    print_key_help();
    print!("{}", render_status(controller.state(), controller.bank()));
    print!("{}", render_diagnostics(&diagnostics.drain()));

    let report = controller.run(source.as_mut(), |controller, command| {
        println!("> {command}");
        controller.bank_mut().refresh();
        print!("{}", render_status(controller.state(), controller.bank()));
        print!("{}", render_diagnostics(&diagnostics.drain()));
    })?;

    if let Some(handle) = feeder {
        let _ = handle.join();
    }

    println!("Released {} channels", report.released);
    for (id, err) in &report.failures {
        println!("  channel {id}: torque off failed: {err}");
    }
    println!("{}", metrics.report());
    Ok(())
}

fn plot_sweep(config: &RuntimeConfig, kind: SweepKind, arm: usize, output: PathBuf) -> Result<()> {
    anyhow::ensure!((1..=ARM_COUNT).contains(&arm), "arm must be 1-{ARM_COUNT}, got {arm}");

    let points = sweep_trajectory(&config.sweep_profile(), &config.geometry(), kind, arm - 1);
    let path = output.to_string_lossy();
    render_trajectory_svg(&points, &path)
        .map_err(|e| anyhow::anyhow!("Failed to render {path}: {e}"))?;
    println!("Wrote {} samples for arm {arm} to {path}", points.len());
    Ok(())
}
