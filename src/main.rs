use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use virtbench::data::duration::format_duration;
use virtbench::{
    logging, report, run_monitors, KubectlProbe, MonitorRun, RunConfig, Settings, TracingEvents,
    Workload,
};

/// Exit code for invalid configuration.
const CONFIG_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "virtbench")]
#[command(about = "Measure KubeVirt VM recovery and migration timings")]
struct Cli {
    /// Config file (TOML, YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace [default: info]
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Kubeconfig passed to kubectl
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch VMs in a namespace range until they run and answer ping
    Recovery(RecoveryArgs),
    /// Watch VMs being live-migrated until the migration completes and they answer ping
    Migration(MigrationArgs),
}

impl Command {
    fn workload(&self) -> Workload {
        match self {
            Command::Recovery(_) => Workload::Recovery,
            Command::Migration(_) => Workload::Migration,
        }
    }

    fn common(&self) -> &CommonArgs {
        match self {
            Command::Recovery(args) => &args.common,
            Command::Migration(args) => &args.common,
        }
    }

    fn deadline(&self) -> Option<String> {
        match self {
            Command::Recovery(args) => args.deadline.clone(),
            Command::Migration(args) => args.migration_timeout.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct RecoveryArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Give up on VMs not reachable this long after the start
    #[arg(long)]
    deadline: Option<String>,
}

#[derive(Args, Debug)]
struct MigrationArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Give up on VMs not migrated and reachable this long after the start [default: 600s]
    #[arg(long)]
    migration_timeout: Option<String>,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// First namespace index [default: 1]
    #[arg(short, long)]
    start: Option<u32>,

    /// Last namespace index, inclusive [default: 5, migration: 10]
    #[arg(short, long)]
    end: Option<u32>,

    /// VM name, the same in every namespace
    #[arg(short = 'n', long)]
    vm_name: Option<String>,

    /// Namespace prefix [default: kubevirt-perf-test, migration: migration]
    #[arg(long)]
    namespace_prefix: Option<String>,

    /// Maximum VMs monitored at once [default: 10]
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Wait between status checks, e.g. "1s", "500ms" [default: 1s, migration: 5s]
    #[arg(long)]
    poll_interval: Option<String>,

    /// Timeout for a single ping attempt [default: 5s]
    #[arg(long)]
    probe_timeout: Option<String>,

    /// Pod used to ping VM addresses
    #[arg(long)]
    ssh_pod: Option<String>,

    /// Namespace of the ping pod
    #[arg(long)]
    ssh_pod_ns: Option<String>,

    /// Export results to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Save results and summary under a timestamped run folder
    #[arg(long)]
    save_results: bool,

    /// Parent folder for saved results [default: results]
    #[arg(long)]
    results_folder: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (settings, config) = match load_settings(&cli) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            return ExitCode::from(CONFIG_ERROR);
        }
    };

    if let Err(err) = init_logging(&settings) {
        eprintln!("Error: {:#}", err);
        return ExitCode::from(CONFIG_ERROR);
    }

    match run(&config) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn path_override(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}

fn load_settings(cli: &Cli) -> Result<(Settings, RunConfig)> {
    let workload = cli.command.workload();
    let args = cli.command.common();
    let overrides = [
        ("log_level", cli.log_level.clone()),
        ("log_file", path_override(&cli.log_file)),
        ("kubeconfig", path_override(&cli.kubeconfig)),
        ("start", args.start.map(|v| v.to_string())),
        ("end", args.end.map(|v| v.to_string())),
        ("vm_name", args.vm_name.clone()),
        ("namespace_prefix", args.namespace_prefix.clone()),
        ("concurrency", args.concurrency.map(|v| v.to_string())),
        ("poll_interval", args.poll_interval.clone()),
        ("probe_timeout", args.probe_timeout.clone()),
        ("deadline", cli.command.deadline()),
        ("ssh_pod", args.ssh_pod.clone()),
        ("ssh_pod_ns", args.ssh_pod_ns.clone()),
        ("export", path_override(&args.export)),
        ("save_results", args.save_results.then(|| "true".to_string())),
        ("results_folder", path_override(&args.results_folder)),
    ];

    let settings = Settings::load(workload, cli.config.as_deref(), overrides)?;
    let config = settings.run_config(workload)?;
    Ok((settings, config))
}

fn init_logging(settings: &Settings) -> Result<()> {
    let level = logging::parse_level(&settings.log_level)?;
    logging::init(level, settings.log_file.as_deref())
}

/// Run the benchmark and return the process exit code.
fn run(config: &RunConfig) -> Result<u8> {
    let range = &config.range;
    let workload = config.monitor.workload;
    info!("{}", "=".repeat(80));
    info!("KubeVirt VM {} Test", workload.title());
    info!("{}", "=".repeat(80));
    info!("VM name:        {}", range.vm_name);
    info!(
        "Namespaces:     {}-{} to {}-{}",
        range.namespace_prefix, range.start, range.namespace_prefix, range.end
    );
    info!("VMIs:           {}", range.len());
    info!("Concurrency:    {}", config.concurrency);
    info!("Poll interval:  {}", format_duration(config.monitor.poll_interval));
    info!("Probe timeout:  {}", format_duration(config.monitor.probe_timeout));
    match config.monitor.deadline {
        Some(deadline) => info!("Deadline:       {}", format_duration(deadline)),
        None => info!("Deadline:       none"),
    }
    info!("Ping pod:       {}/{}", config.ssh_pod_ns, config.ssh_pod);
    info!("{}", "=".repeat(80));

    let probe = KubectlProbe::builder()
        .kubeconfig(config.kubeconfig.clone())
        .probe_pod(config.ssh_pod.clone(), config.ssh_pod_ns.clone())
        .build();

    // Build a tokio runtime for the monitors
    let rt = tokio::runtime::Runtime::new()?;
    let run = rt.block_on(run_monitors(
        &range.targets(),
        config.concurrency,
        config.monitor,
        Arc::new(probe),
        Arc::new(TracingEvents),
    ));

    println!();
    print!("{}", report::render_table(workload, &run.records));
    println!();
    print!("{}", report::render_summary(workload, &run.summary));

    if let Some(path) = &config.export {
        export(path, workload, &run)?;
    }
    if let Some(folder) = &config.results_dir {
        let dir = report::save_results(folder, workload, &run.records, &run.summary)?;
        info!(path = %dir.display(), "Results saved");
    }

    Ok(run.summary.exit_code() as u8)
}

fn export(path: &Path, workload: Workload, run: &MonitorRun) -> Result<()> {
    report::export_json(path, workload, &run.records, &run.summary)?;
    info!(path = %path.display(), "Results exported");
    Ok(())
}
