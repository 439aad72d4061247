use clap::{Args, Parser, Subcommand, ValueEnum};
use ds_app::{
    AppError, AppResult, ComparisonEntry, PRESET_NAMES, RunMetrics, RunOptions, RunProgressEvent,
    RunRequest, RunService, RunStage, compare_presets, load_topology, preset, save_topology,
};
use ds_core::convert::mps_to_kmh;
use ds_results::RunStore;
use ds_rimpull::{CurveKind, rimpull_report};
use ds_sim::{IntegratorType, SimConfig, SimResult};
use ds_topology::{Topology, validate};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

#[derive(Parser)]
#[command(name = "drivesim")]
#[command(about = "Drivesim CLI - haul truck drivetrain analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a topology file against the connection rules
    Validate {
        /// Topology file (JSON or YAML)
        topology: PathBuf,
    },
    /// Compute rimpull, resistance and operating curves
    Rimpull {
        #[command(flatten)]
        source: Source,
        /// Write the full curve set as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a speed-tracking vehicle dynamics simulation
    Run {
        #[command(flatten)]
        source: Source,
        #[command(flatten)]
        sim: SimArgs,
        /// Skip cache and force re-run
        #[arg(long)]
        no_cache: bool,
        /// Write the sampled series as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Run several presets in sequence with the same settings
    Compare {
        /// Presets to compare (defaults to all)
        #[arg(long, value_delimiter = ',')]
        presets: Vec<String>,
        #[command(flatten)]
        sim: SimArgs,
        /// Write every entry as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a preset topology, or list presets without a name
    Preset {
        name: Option<String>,
        /// Destination file; `.yaml`/`.yml` selects YAML
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List cached runs
    Runs {
        /// Cache directory
        #[arg(long, default_value = ".drivesim/runs")]
        dir: PathBuf,
    },
}

#[derive(Args)]
struct Source {
    /// Topology file (JSON or YAML)
    #[arg(required_unless_present = "preset")]
    topology: Option<PathBuf>,
    /// Built-in preset instead of a file
    #[arg(long, conflicts_with = "topology")]
    preset: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum IntegratorArg {
    Rk4,
    Euler,
}

#[derive(Args)]
struct SimArgs {
    /// Duration in seconds
    #[arg(long, default_value_t = 60.0)]
    t_end: f64,
    /// Output sample spacing in seconds
    #[arg(long, default_value_t = 0.1)]
    dt: f64,
    /// Target speed in m/s
    #[arg(long, default_value_t = 12.0)]
    target: f64,
    /// Road grade as rise over run
    #[arg(long, default_value_t = 0.0)]
    grade: f64,
    /// Payload fraction, 0 to 1
    #[arg(long, default_value_t = 1.0)]
    payload: f64,
    #[arg(long, value_enum, default_value_t = IntegratorArg::Rk4)]
    integrator: IntegratorArg,
}

impl SimArgs {
    fn config(&self) -> SimConfig {
        SimConfig {
            t_end: self.t_end,
            dt_output: self.dt,
            target_velocity: self.target,
            grade: self.grade,
            payload_fraction: self.payload,
            integrator: match self.integrator {
                IntegratorArg::Rk4 => IntegratorType::RK4,
                IntegratorArg::Euler => IntegratorType::ForwardEuler,
            },
            ..SimConfig::default()
        }
    }
}

/// Label, topology and cache directory for a source.
fn resolve(source: &Source) -> AppResult<(String, Topology, RunStore)> {
    match (&source.topology, &source.preset) {
        (_, Some(name)) => {
            let p = preset(name)?;
            let store = RunStore::new(PathBuf::from(".drivesim").join("runs"))?;
            Ok((p.name, p.topology, store))
        }
        (Some(path), None) => {
            let topo = load_topology(path)?;
            let label = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            Ok((label, topo, RunStore::beside(path)?))
        }
        (None, None) => Err(AppError::InvalidInput(
            "give a topology file or --preset".to_string(),
        )),
    }
}

fn main() -> AppResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { topology } => cmd_validate(&topology),
        Commands::Rimpull { source, output } => cmd_rimpull(&source, output.as_deref()),
        Commands::Run {
            source,
            sim,
            no_cache,
            csv,
        } => cmd_run(&source, &sim, !no_cache, csv.as_deref()),
        Commands::Compare {
            presets,
            sim,
            output,
        } => cmd_compare(&presets, &sim, output.as_deref()),
        Commands::Preset { name, output } => cmd_preset(name.as_deref(), output.as_deref()),
        Commands::Runs { dir } => cmd_runs(dir),
    }
}

fn cmd_validate(path: &Path) -> AppResult<()> {
    println!("Validating topology: {}", path.display());
    let topo = load_topology(path)?;
    let report = validate(&topo);
    if report.is_valid {
        println!("✓ Topology is valid");
        return Ok(());
    }
    for issue in &report.errors {
        println!("  ✗ {issue}");
    }
    Err(AppError::Validation(format!(
        "{} issue(s) found",
        report.errors.len()
    )))
}

fn cmd_rimpull(source: &Source, output: Option<&Path>) -> AppResult<()> {
    let (label, topo, _) = resolve(source)?;
    let report = rimpull_report(&topo);
    if report.curves.is_empty() {
        println!("No curves: '{label}' is not a valid drivetrain");
        return Ok(());
    }

    println!("Rimpull curves for '{label}':");
    for c in &report.curves {
        let peak = c.points.iter().map(|p| p.force).fold(0.0, f64::max);
        let kind = match c.kind {
            CurveKind::Traction => "traction",
            CurveKind::Resistance => "resistance",
        };
        println!(
            "  {:<32} {:<10} {:>4} pts  to {:>5.1} km/h  peak {:>7.1} kN",
            c.name,
            kind,
            c.points.len(),
            mps_to_kmh(c.max_velocity()),
            peak / 1000.0
        );
    }
    println!("  {} operating curve(s)", report.operating.len());

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| AppError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        println!("✓ Wrote {}", path.display());
    }
    Ok(())
}

fn cmd_run(source: &Source, sim: &SimArgs, use_cache: bool, csv: Option<&Path>) -> AppResult<()> {
    let (label, topo, store) = resolve(source)?;
    let config = sim.config();
    println!("Running vehicle dynamics for '{label}'");
    println!(
        "  t_end = {:.1} s, dt = {:.3} s, target = {:.1} km/h, grade = {:.1} %",
        config.t_end,
        config.dt_output,
        mps_to_kmh(config.target_velocity),
        config.grade * 100.0
    );

    let service = RunService::with_store(store);
    let request = RunRequest {
        label: &label,
        topology: &topo,
        config,
        options: RunOptions {
            use_cache,
            ..RunOptions::default()
        },
    };

    let mut last_emit = Instant::now();
    let mut last_fraction = -1.0f64;
    let response = service.run_with_progress(
        &request,
        Some(&mut |event| {
            let fraction = event
                .transient
                .as_ref()
                .map(|t| t.fraction_complete)
                .unwrap_or(-1.0);
            let emit_now = (fraction >= 0.0 && (fraction - last_fraction).abs() >= 0.005)
                || last_emit.elapsed().as_millis() >= 100;
            if emit_now {
                render_cli_progress(&event);
                if fraction >= 0.0 {
                    last_fraction = fraction;
                }
                last_emit = Instant::now();
            }
        }),
    );
    clear_progress_line();
    let response = response?;

    let id = response.run_id.as_deref().unwrap_or("-");
    if response.loaded_from_cache {
        println!("✓ Loaded from cache: {id}");
    } else {
        println!("✓ Simulation completed: {id}");
    }
    print_metrics(&response.metrics);
    println!(
        "\nTiming: compile {:.3}s, simulate {:.3}s, save {:.3}s, total {:.3}s",
        response.timing.compile_time_s,
        response.timing.simulate_time_s,
        response.timing.save_time_s,
        response.timing.total_time_s
    );

    if let Some(path) = csv {
        write_csv(path, &response.result)?;
        println!("✓ Exported {} samples to {}", response.result.len(), path.display());
    }
    Ok(())
}

fn cmd_compare(names: &[String], sim: &SimArgs, output: Option<&Path>) -> AppResult<()> {
    let names: Vec<&str> = if names.is_empty() {
        PRESET_NAMES.to_vec()
    } else {
        names.iter().map(String::as_str).collect()
    };
    let presets = names
        .iter()
        .map(|n| preset(n))
        .collect::<AppResult<Vec<_>>>()?;
    println!("Comparing {} preset(s)", presets.len());

    let service = RunService::new();
    let mut current = String::new();
    let entries = compare_presets(
        &service,
        presets,
        &sim.config(),
        &RunOptions::default(),
        Some(&mut |event| {
            if event.label != current {
                clear_progress_line();
                println!("  {}", event.label);
                current = event.label.clone();
            }
            if event.stage == RunStage::RunningDynamics {
                render_cli_progress(&event);
            }
        }),
    )?;
    clear_progress_line();

    print_comparison(&entries);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| AppError::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        println!("✓ Wrote {}", path.display());
    }
    Ok(())
}

fn cmd_preset(name: Option<&str>, output: Option<&Path>) -> AppResult<()> {
    let Some(name) = name else {
        println!("Presets:");
        for n in PRESET_NAMES {
            let p = preset(n)?;
            println!(
                "  {:<14} {} ({} components)",
                p.name,
                p.display_name,
                p.topology.len()
            );
        }
        return Ok(());
    };

    let p = preset(name)?;
    match output {
        Some(path) => {
            save_topology(path, &p.topology)?;
            println!("✓ Wrote {} to {}", p.display_name, path.display());
        }
        None => println!("{}", ds_topology::to_json_string(&p.topology)?),
    }
    Ok(())
}

fn cmd_runs(dir: PathBuf) -> AppResult<()> {
    if !dir.exists() {
        println!("No cached runs in {}", dir.display());
        return Ok(());
    }
    let store = RunStore::new(dir)?;
    let runs = store.list_runs()?;
    if runs.is_empty() {
        println!("No cached runs in {}", store.root().display());
    } else {
        println!("Cached runs in {}:", store.root().display());
        for m in runs {
            println!("  {}  {:<16} {}", &m.run_id[..m.run_id.len().min(12)], m.label, m.timestamp);
        }
    }
    Ok(())
}

fn print_metrics(m: &RunMetrics) {
    println!("\nSummary:");
    println!("  Final speed:   {:.1} km/h", mps_to_kmh(m.final_velocity));
    println!("  Max speed:     {:.1} km/h", mps_to_kmh(m.max_velocity));
    match m.time_to_target_s {
        Some(t) => println!("  95% target:    {t:.1} s"),
        None => println!("  95% target:    not reached"),
    }
    println!("  Distance:      {:.0} m", m.distance_m);
    if let (Some(fuel), Some(rate)) = (m.total_fuel_kg, m.avg_fuel_rate_kg_h) {
        println!("  Fuel:          {fuel:.2} kg ({rate:.1} kg/h avg)");
    }
    if let Some(e) = m.battery_energy_kwh {
        println!("  Battery:       {e:.2} kWh net");
    }
    println!("  Engine power:  {:.0} kW avg", m.avg_engine_power_w / 1000.0);
    println!("  Motor power:   {:.0} kW avg", m.avg_motor_power_w / 1000.0);
}

fn print_comparison(entries: &[ComparisonEntry]) {
    println!(
        "\n  {:<14} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "preset", "v_end km/h", "t95 s", "dist m", "fuel kg", "batt kWh"
    );
    for e in entries {
        match (&e.metrics, &e.error) {
            (Some(m), _) => println!(
                "  {:<14} {:>10.1} {:>10} {:>10.0} {:>10} {:>10}",
                e.preset,
                mps_to_kmh(m.final_velocity),
                m.time_to_target_s.map_or("-".to_string(), |t| format!("{t:.1}")),
                m.distance_m,
                m.total_fuel_kg.map_or("-".to_string(), |f| format!("{f:.2}")),
                m.battery_energy_kwh.map_or("-".to_string(), |b| format!("{b:.2}")),
            ),
            (None, Some(err)) => println!("  {:<14} failed: {err}", e.preset),
            (None, None) => println!("  {:<14} no result", e.preset),
        }
    }
}

fn write_csv(path: &Path, r: &SimResult) -> AppResult<()> {
    let mut csv = String::from(
        "time_s,velocity_mps,distance_m,gear,tractive_force_n,engine_power_w,motor_power_w,battery_power_w,fuel_rate_kg_s,soc\n",
    );
    for i in 0..r.len() {
        let opt = |s: &Option<Vec<f64>>| {
            s.as_ref()
                .and_then(|v| v.get(i))
                .map_or(String::new(), |x| x.to_string())
        };
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            r.time[i],
            r.velocity[i],
            r.distance[i],
            r.gear[i] + 1,
            r.tractive_force[i],
            r.engine_power[i],
            r.motor_power[i],
            r.battery_power[i],
            opt(&r.fuel_rate),
            opt(&r.soc),
        ));
    }
    debug!(rows = r.len(), path = %path.display(), "csv written");
    std::fs::write(path, csv).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(120));
    let _ = io::stdout().flush();
}

fn render_cli_progress(event: &RunProgressEvent) {
    match (&event.stage, &event.transient) {
        (RunStage::RunningDynamics, Some(t)) => {
            let width = 28usize;
            let filled = ((t.fraction_complete * width as f64).round() as usize).min(width);
            let bar = format!(
                "{}{}",
                "#".repeat(filled),
                "-".repeat(width.saturating_sub(filled))
            );
            print!(
                "\r[{}] {:>6.2}%  t={:.1}/{:.1}s  step={}  elapsed={:.1}s",
                bar,
                t.fraction_complete * 100.0,
                t.sim_time_s,
                t.t_end_s,
                t.step,
                event.elapsed_wall_s
            );
        }
        _ => {
            let spinner = ['|', '/', '-', '\\'];
            let spin_idx = ((event.elapsed_wall_s * 10.0) as usize) % spinner.len();
            let mut line = format!(
                "\r{} {}  elapsed={:.2}s",
                spinner[spin_idx],
                event.stage.label(),
                event.elapsed_wall_s
            );
            if let Some(msg) = &event.message {
                line.push_str(&format!("  {msg}"));
            }
            print!("{line}");
        }
    }
    let _ = io::stdout().flush();
}
