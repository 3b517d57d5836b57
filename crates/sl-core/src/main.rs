//! Slotlight Core - setting estimation CLI
//!
//! The main entry point for sl-core, handling:
//! - Machine catalog listing and validation
//! - One-shot setting estimates from explicit counts
//! - A persistent counting session with tap/undo semantics

use clap::{Args, Parser, Subcommand, ValueEnum};
use sl_common::{OutputFormat, StructuredError, SCHEMA_VERSION};
use sl_core::config::{
    load_catalog, ConfigError, ConfigOptions, EventDefinition, MachineDefinition, ResolvedCatalog,
};
use sl_core::estimate::{
    closest_setting, estimate_report, observed_denominator, resolve_trials, Observation,
    SettingEstimate,
};
use sl_core::exit_codes::ExitCode;
use sl_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogFormat, LogLevel, Stage,
};
use sl_core::session::{SessionError, SessionState, SessionStore};
use std::path::PathBuf;

/// Slotlight Core - estimate a slot machine's hidden setting from counted events
#[derive(Parser)]
#[command(name = "sl-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a machine catalog (machines.json)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Override the session data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log output format on stderr (human, jsonl)
    #[arg(long, global = true, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// List machines in the catalog
    Machines(MachinesArgs),

    /// Estimate setting probabilities from explicit counts
    Estimate(EstimateArgs),

    /// Nearest setting for a single event's observed rate
    Closest(ClosestArgs),

    /// Manage the persistent counting session
    Session(SessionArgs),

    /// Validate the machine catalog
    Check,

    /// Print JSON schemas for inputs
    Schema(SchemaArgs),

    /// Show version information
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Machines(_) => "machines",
            Commands::Estimate(_) => "estimate",
            Commands::Closest(_) => "closest",
            Commands::Session(_) => "session",
            Commands::Check => "check",
            Commands::Schema(_) => "schema",
            Commands::Version => "version",
        }
    }
}

#[derive(Args, Debug)]
struct MachinesArgs {
    /// Include event definitions and per-setting denominators
    #[arg(long)]
    events: bool,
}

#[derive(Args, Debug)]
struct EstimateArgs {
    /// Machine id from the catalog
    #[arg(long, short = 'm')]
    machine: String,

    /// Total elapsed games
    #[arg(long)]
    total: u64,

    /// Games in the primary phase (defaults to all games)
    #[arg(long)]
    primary: Option<u64>,

    /// Observed count as EVENT=N (repeatable)
    #[arg(long = "count", short = 'c', value_parser = parse_count)]
    counts: Vec<(String, u64)>,

    /// Exclude an event from the estimate (repeatable)
    #[arg(long)]
    ignore: Vec<String>,

    /// Include the per-event evidence ledger
    #[arg(long)]
    explain: bool,
}

#[derive(Args, Debug)]
struct ClosestArgs {
    #[arg(long, short = 'm')]
    machine: String,

    #[arg(long, short = 'e')]
    event: String,

    /// Trials the event was exposed to
    #[arg(long)]
    trials: u64,

    /// Times the event occurred
    #[arg(long)]
    occurrences: u64,
}

#[derive(Args, Debug)]
struct SessionArgs {
    #[command(subcommand)]
    command: SessionCommands,
}

#[derive(Subcommand, Debug)]
enum SessionCommands {
    /// Show the current session and its estimate
    Show {
        /// Include the per-event evidence ledger
        #[arg(long)]
        explain: bool,
    },

    /// Select a machine (switching resets the session)
    Select {
        /// Machine id from the catalog
        machine_id: String,
    },

    /// Count an event: +1 per tap (-1 in minus mode), or an explicit delta
    Count {
        event_id: String,

        #[arg(long, allow_negative_numbers = true)]
        delta: Option<i64>,
    },

    /// Update game counter readings
    Games {
        /// Current game counter reading
        #[arg(long)]
        set: Option<u64>,

        /// Adjust the current reading by a delta
        #[arg(long, allow_negative_numbers = true)]
        delta: Option<i64>,

        /// Game counter reading when play started
        #[arg(long)]
        start: Option<u64>,

        /// Elapsed games in the primary phase
        #[arg(long)]
        primary: Option<u64>,
    },

    /// Toggle whether an event is excluded
    Ignore { event_id: String },

    /// Flip a session mode
    Toggle {
        #[arg(value_enum)]
        mode: ToggleMode,
    },

    /// Treat current counts as the starting point
    MarkStart,

    /// Zero all counts and game readings for the current machine
    Reset,

    /// Deselect the machine and delete the stored session
    Clear,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ToggleMode {
    /// Taps subtract instead of add
    Minus,
    /// Show setting percentages in human output
    Settings,
    /// Ignore parent events once a child event is counted
    AutoIgnore,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    #[arg(value_enum, default_value = "observation")]
    target: SchemaTarget,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaTarget {
    Observation,
    Catalog,
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse()
}

fn parse_count(s: &str) -> Result<(String, u64), String> {
    let (event, count) = s
        .split_once('=')
        .ok_or_else(|| format!("expected EVENT=N, got '{s}'"))?;
    let event = event.trim();
    if event.is_empty() {
        return Err(format!("missing event id in '{s}'"));
    }
    let count = count
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid count in '{s}': {e}"))?;
    Ok((event.to_string(), count))
}

/// Failure of a command, keeping catalog errors apart for their exit codes.
#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Core(sl_common::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err)
    }
}

impl From<sl_common::Error> for CliError {
    fn from(err: sl_common::Error) -> Self {
        CliError::Core(err)
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        CliError::Core(err.into())
    }
}

type CliResult = Result<ExitCode, CliError>;

/// Per-invocation context.
struct Ctx<'a> {
    global: &'a GlobalOpts,
    run_id: String,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let ctx = Ctx {
        global: &cli.global,
        run_id: generate_run_id(),
    };
    tracing::info!(
        event = event_names::RUN_STARTED,
        stage = %Stage::Init,
        run_id = %ctx.run_id,
        command = cli.command.name(),
        "run started"
    );

    let result = match &cli.command {
        Commands::Machines(args) => run_machines(&ctx, args),
        Commands::Estimate(args) => run_estimate(&ctx, args),
        Commands::Closest(args) => run_closest(&ctx, args),
        Commands::Session(args) => run_session(&ctx, args),
        Commands::Check => run_check(&ctx),
        Commands::Schema(args) => run_schema(&ctx, args),
        Commands::Version => {
            print_version(&ctx);
            Ok(ExitCode::Clean)
        }
    };

    let exit_code = result.unwrap_or_else(|err| output_error(&ctx, err));
    tracing::info!(
        event = event_names::RUN_FINISHED,
        stage = %Stage::Init,
        run_id = %ctx.run_id,
        exit_code = exit_code.as_i32(),
        ok = exit_code.is_success(),
        "run finished"
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Commands
// ============================================================================

fn load(ctx: &Ctx) -> Result<ResolvedCatalog, ConfigError> {
    load_catalog(&ConfigOptions {
        catalog_path: ctx.global.catalog.clone(),
        skip_validation: false,
    })
}

fn open_store(ctx: &Ctx) -> Result<SessionStore, SessionError> {
    match &ctx.global.data_dir {
        Some(dir) => Ok(SessionStore::with_dir(dir)),
        None => SessionStore::from_env(),
    }
}

fn run_machines(ctx: &Ctx, args: &MachinesArgs) -> CliResult {
    let loaded = load(ctx)?;
    let machines: Vec<serde_json::Value> = loaded
        .catalog
        .machines
        .iter()
        .map(|m| {
            let mut entry = serde_json::json!({
                "id": m.id,
                "name": m.name,
                "maker": m.maker,
                "settings": m.settings,
                "event_count": m.events.len(),
            });
            if args.events {
                entry["events"] = serde_json::json!(m.events);
            }
            entry
        })
        .collect();

    let payload = serde_json::json!({
        "catalog_source": loaded.resolved.source.to_string(),
        "catalog_hash": loaded.snapshot.catalog_hash,
        "machines": machines,
    });

    emit(ctx, "machines", payload, || {
        let mut out = String::from("# sl-core machines\n\n");
        for m in &loaded.catalog.machines {
            out.push_str(&format!(
                "- **{}** `{}` ({} settings, {} events)\n",
                m.name,
                m.id,
                m.settings.len(),
                m.events.len()
            ));
            if args.events {
                for e in &m.events {
                    let parent = e
                        .parent_id
                        .as_deref()
                        .map(|p| format!(" (part of {p})"))
                        .unwrap_or_default();
                    out.push_str(&format!("  - {} `{}`{}\n", e.name, e.id, parent));
                }
            }
        }
        out
    }, format!("{} machines", loaded.catalog.machines.len()));
    Ok(ExitCode::Clean)
}

fn run_estimate(ctx: &Ctx, args: &EstimateArgs) -> CliResult {
    let loaded = load(ctx)?;
    let machine = loaded.machine(&args.machine)?;

    let primary = args.primary.unwrap_or(args.total);
    if primary > args.total {
        tracing::warn!(
            stage = %Stage::Estimate,
            primary,
            total = args.total,
            "primary-phase games exceed total; clamping"
        );
    }
    let mut observation = Observation::new(args.total).with_primary_phase(primary.min(args.total));
    for (event_id, count) in &args.counts {
        require_event(machine, event_id)?;
        observation = observation.with_count(event_id.clone(), *count);
    }
    for event_id in &args.ignore {
        require_event(machine, event_id)?;
        observation = observation.with_ignored(event_id.clone());
    }

    let report = estimate_report(machine, &observation);
    let closest = closest_by_event(machine, &observation);

    let mut payload = serde_json::json!({
        "machine_id": machine.id,
        "total_spins": observation.total_spins,
        "primary_phase_spins": observation.primary_phase_spins,
        "estimates": report.estimates,
        "uniform_reason": report.uniform_reason,
        "leader": report.leader,
        "closest": closest,
    });
    if args.explain {
        payload["log_likelihoods"] = serde_json::json!(report.log_likelihoods);
        payload["log_evidence"] = serde_json::json!(report.log_evidence);
        payload["evidence"] = serde_json::json!(report.evidence);
    }

    let summary = summarize_estimates(&machine.id, &report.estimates);
    emit(ctx, "estimate", payload, || {
        let mut out = format!("# sl-core estimate: {}\n\n", machine.name);
        out.push_str(&format!(
            "Games: {} (primary {})\n\n",
            observation.total_spins, observation.primary_phase_spins
        ));
        out.push_str(&estimates_md(&report.estimates));
        if let Some(reason) = report.uniform_reason {
            out.push_str(&format!("\nEqual shares: {reason}\n"));
        }
        if let Some(leader) = &report.leader {
            out.push_str(&format!(
                "\nSetting {} leads setting {} ({}, {:.1} bits)\n",
                leader.setting,
                leader.runner_up,
                leader.evidence.strength.label(),
                leader.evidence.delta_bits
            ));
        }
        out
    }, summary);
    Ok(ExitCode::Clean)
}

fn run_closest(ctx: &Ctx, args: &ClosestArgs) -> CliResult {
    let loaded = load(ctx)?;
    let machine = loaded.machine(&args.machine)?;
    let event = require_event(machine, &args.event)?;

    let observed = observed_denominator(args.trials as f64, args.occurrences as f64);
    let setting = closest_setting(event, observed);

    let payload = serde_json::json!({
        "machine_id": machine.id,
        "event_id": event.id,
        "trials": args.trials,
        "occurrences": args.occurrences,
        "observed_denominator": observed,
        "closest_setting": setting,
        "known": event.probabilities,
    });

    let line = match setting {
        Some(s) => format!("{}: 1/{:.1} is closest to setting {}", event.id, observed, s),
        None => format!("{}: rate does not differ between settings", event.id),
    };
    emit(ctx, "closest", payload, || format!("# sl-core closest\n\n{line}\n"), line.clone());
    Ok(ExitCode::Clean)
}

fn run_check(ctx: &Ctx) -> CliResult {
    let loaded = load_catalog(&ConfigOptions {
        catalog_path: ctx.global.catalog.clone(),
        skip_validation: true,
    })?;
    let issues = sl_config::validate_catalog_all(&loaded.catalog);
    let ok = issues.is_empty();

    let payload = serde_json::json!({
        "status": if ok { "ok" } else { "error" },
        "catalog_source": loaded.resolved.source.to_string(),
        "catalog_path": loaded.resolved.path.as_ref().map(|p| p.display().to_string()),
        "catalog_hash": loaded.snapshot.catalog_hash,
        "machine_count": loaded.snapshot.machine_count,
        "event_count": loaded.snapshot.event_count,
        "issues": issues
            .iter()
            .map(|i| serde_json::json!({ "code": i.code(), "message": i.to_string() }))
            .collect::<Vec<_>>(),
    });

    if !ok {
        tracing::warn!(
            event = event_names::CATALOG_INVALID,
            stage = %Stage::Catalog,
            issues = issues.len(),
            "catalog check failed"
        );
    }

    let summary = if ok {
        format!("catalog OK ({})", loaded.snapshot.short_id())
    } else {
        format!("catalog FAILED: {} issue(s)", issues.len())
    };
    emit(ctx, "check", payload, || {
        let mut out = String::from("# sl-core check\n\n");
        let symbol = if ok { "✓" } else { "✗" };
        out.push_str(&format!(
            "{} catalog ({}, {} machines)\n",
            symbol, loaded.resolved.source, loaded.snapshot.machine_count
        ));
        for issue in &issues {
            out.push_str(&format!("  Error: {issue}\n"));
        }
        out
    }, summary);

    Ok(if ok { ExitCode::Clean } else { ExitCode::ArgsError })
}

fn run_schema(ctx: &Ctx, args: &SchemaArgs) -> CliResult {
    let schema = match args.target {
        SchemaTarget::Observation => schemars::schema_for!(Observation),
        SchemaTarget::Catalog => schemars::schema_for!(sl_config::MachineCatalog),
    };
    if !matches!(ctx.global.format, OutputFormat::Exitcode) {
        let value = serde_json::to_value(&schema).map_err(sl_common::Error::from)?;
        print_json(&value);
    }
    Ok(ExitCode::Clean)
}

fn print_version(ctx: &Ctx) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "sl_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match ctx.global.format {
        OutputFormat::Json => print_json(&version_info),
        OutputFormat::Exitcode => {}
        _ => {
            println!("sl-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

// ============================================================================
// Session
// ============================================================================

fn run_session(ctx: &Ctx, args: &SessionArgs) -> CliResult {
    let loaded = load(ctx)?;
    let catalog = &loaded.catalog;
    let store = open_store(ctx)?;
    let mut state = store.load(catalog)?;

    let mut explain = false;
    match &args.command {
        SessionCommands::Show { explain: e } => explain = *e,
        SessionCommands::Select { machine_id } => {
            let machine = loaded.machine(machine_id)?;
            if state.select_machine(machine) {
                tracing::info!(
                    event = event_names::SESSION_MACHINE_SELECTED,
                    stage = %Stage::Session,
                    machine_id = %machine.id,
                    "machine selected"
                );
            }
        }
        SessionCommands::Count { event_id, delta } => {
            let machine = state.current_machine(catalog)?;
            match delta {
                Some(d) => state.update_count(machine, event_id, *d)?,
                None => state.tap(machine, event_id)?,
            };
        }
        SessionCommands::Games {
            set,
            delta,
            start,
            primary,
        } => {
            state.current_machine(catalog)?;
            if let Some(v) = start {
                state.set_start_games(*v);
            }
            if let Some(v) = set {
                state.set_current_games(*v);
            }
            if let Some(d) = delta {
                state.update_current_games(*d);
            }
            if let Some(v) = primary {
                state.set_primary_games(*v);
            }
        }
        SessionCommands::Ignore { event_id } => {
            let machine = state.current_machine(catalog)?;
            state.toggle_ignored(machine, event_id)?;
        }
        SessionCommands::Toggle { mode } => match mode {
            ToggleMode::Minus => {
                state.toggle_minus_mode();
            }
            ToggleMode::Settings => {
                state.toggle_show_settings();
            }
            ToggleMode::AutoIgnore => {
                state.auto_ignore_parents = !state.auto_ignore_parents;
            }
        },
        SessionCommands::MarkStart => {
            state.current_machine(catalog)?;
            state.mark_start_counts();
        }
        SessionCommands::Reset => {
            let machine = state.current_machine(catalog)?;
            state.reset_counts(machine);
        }
        SessionCommands::Clear => {
            state.clear_machine();
            store.remove()?;
        }
    }

    if !matches!(args.command, SessionCommands::Show { .. } | SessionCommands::Clear) {
        store.save(&state)?;
    }

    let payload = session_view(&state, &loaded, explain);
    let summary = match state.current_machine(catalog) {
        Ok(machine) => {
            let estimates = state.estimation(catalog);
            format!(
                "{} games, {}",
                state.total_games(),
                summarize_estimates(&machine.id, &estimates)
            )
        }
        Err(_) => "no machine selected".to_string(),
    };
    emit(ctx, "session", payload, || session_md(&state, &loaded), summary);
    Ok(ExitCode::Clean)
}

fn session_view(state: &SessionState, loaded: &ResolvedCatalog, explain: bool) -> serde_json::Value {
    let catalog = &loaded.catalog;
    let estimates = state.estimation(catalog);
    let machine = state.current_machine(catalog).ok();

    let mut view = serde_json::json!({
        "session_id": state.session_id,
        "machine_id": machine.map(|m| m.id.clone()),
        "start_games": state.start_games,
        "current_games": state.current_games,
        "total_games": state.total_games(),
        "primary_games": state.primary_phase_games(),
        "primary_games_recorded": state.primary_games.is_some(),
        "minus_mode": state.minus_mode,
        "show_settings": state.show_settings,
        "auto_ignore_parents": state.auto_ignore_parents,
        "estimates": estimates,
    });

    if let Some(machine) = machine {
        let auto = state.auto_ignored(machine);
        let events: Vec<serde_json::Value> = machine
            .events
            .iter()
            .map(|e| {
                let closest = state.closest_for(machine, &e.id).ok().flatten();
                serde_json::json!({
                    "id": e.id,
                    "name": e.name,
                    "count": state.effective_count(&e.id),
                    "raw_count": state.counts.get(&e.id).copied().unwrap_or(0),
                    "ignored": state.ignored.contains(&e.id),
                    "auto_ignored": auto.contains(&e.id),
                    "has_children": machine.has_children(&e.id),
                    "closest_setting": closest,
                    "closest_denominator": closest.and_then(|s| machine.probability_for(&e.id, s)),
                })
            })
            .collect();
        view["events"] = serde_json::json!(events);

        if explain {
            let report = estimate_report(machine, &state.observation(machine));
            view["uniform_reason"] = serde_json::json!(report.uniform_reason);
            view["leader"] = serde_json::json!(report.leader);
            view["evidence"] = serde_json::json!(report.evidence);
        }
    }
    view
}

fn session_md(state: &SessionState, loaded: &ResolvedCatalog) -> String {
    let catalog = &loaded.catalog;
    let Ok(machine) = state.current_machine(catalog) else {
        return "# sl-core session\n\nNo machine selected. Run `sl-core session select <machine-id>`.\n"
            .to_string();
    };

    let mut out = format!("# sl-core session: {}\n\n", machine.name);
    out.push_str(&format!(
        "Games: {} ({} → {}), primary {}\n",
        state.total_games(),
        state.start_games,
        state.current_games,
        state.primary_phase_games()
    ));
    if state.minus_mode {
        out.push_str("Minus mode: on\n");
    }
    out.push('\n');

    let auto = state.auto_ignored(machine);
    for event in &machine.events {
        let flag = if state.ignored.contains(&event.id) {
            " (ignored)"
        } else if auto.contains(&event.id) {
            " (auto-ignored)"
        } else {
            ""
        };
        let closest = state
            .closest_for(machine, &event.id)
            .ok()
            .flatten()
            .map(|s| match machine.probability_for(&event.id, s) {
                Some(d) => format!(", closest {s} (1/{d:.1})"),
                None => format!(", closest {s}"),
            })
            .unwrap_or_default();
        out.push_str(&format!(
            "- {}: {}{}{}\n",
            event.name,
            state.effective_count(&event.id),
            closest,
            flag
        ));
    }

    if state.show_settings {
        out.push('\n');
        out.push_str(&estimates_md(&state.estimation(catalog)));
    }
    if let Some(id) = &state.session_id {
        out.push_str(&format!("\nSession: {id}\n"));
    }
    out
}

// ============================================================================
// Output helpers
// ============================================================================

fn require_event<'a>(
    machine: &'a MachineDefinition,
    event_id: &str,
) -> Result<&'a EventDefinition, sl_common::Error> {
    machine
        .event(event_id)
        .ok_or_else(|| sl_common::Error::UnknownEvent {
            machine_id: machine.id.clone(),
            event_id: event_id.to_string(),
        })
}

/// Nearest setting per non-ignored event, for events that discriminate.
fn closest_by_event(
    machine: &MachineDefinition,
    observation: &Observation,
) -> serde_json::Map<String, serde_json::Value> {
    let mut out = serde_json::Map::new();
    for event in &machine.events {
        if observation.is_ignored(&event.id) {
            continue;
        }
        let trials = resolve_trials(
            event,
            observation.total_spins,
            observation.primary_phase_spins,
            &observation.counts,
        );
        if trials == 0 {
            continue;
        }
        let observed = observed_denominator(trials as f64, observation.count(&event.id) as f64);
        if let Some(setting) = closest_setting(event, observed) {
            out.insert(event.id.clone(), serde_json::json!(setting));
        }
    }
    out
}

fn summarize_estimates(machine_id: &str, estimates: &[SettingEstimate]) -> String {
    let top = estimates
        .iter()
        .max_by(|a, b| a.percentage.total_cmp(&b.percentage));
    match top {
        Some(e) => format!("{machine_id}: setting {} {:.2}%", e.setting, e.percentage),
        None => format!("{machine_id}: no settings"),
    }
}

fn estimates_md(estimates: &[SettingEstimate]) -> String {
    let mut out = String::from("| Setting | Share | |\n|---:|---:|:---|\n");
    for e in estimates {
        let width = (e.percentage / 5.0).round().clamp(0.0, 20.0) as usize;
        out.push_str(&format!(
            "| {} | {:.2}% | {} |\n",
            e.setting,
            e.percentage,
            "█".repeat(width)
        ));
    }
    out
}

fn print_json(value: &serde_json::Value) {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    println!("{text}");
}

/// Write a command payload in the selected format.
fn emit(
    ctx: &Ctx,
    command: &str,
    payload: serde_json::Value,
    markdown: impl FnOnce() -> String,
    summary: String,
) {
    match ctx.global.format {
        OutputFormat::Json => {
            let mut response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "command": command,
            });
            if let (Some(target), serde_json::Value::Object(fields)) =
                (response.as_object_mut(), payload)
            {
                target.extend(fields);
            }
            print_json(&response);
        }
        OutputFormat::Summary => println!("[{}] {}: {}", ctx.run_id, command, summary),
        OutputFormat::Md => print!("{}", markdown()),
        OutputFormat::Exitcode => {}
    }
}

fn output_error(ctx: &Ctx, err: CliError) -> ExitCode {
    let (exit_code, err) = match err {
        CliError::Config(e) => (ExitCode::for_config_error(&e), sl_common::Error::from(e)),
        CliError::Core(e) => (ExitCode::for_error(&e), e),
    };

    if exit_code.is_internal_error() {
        tracing::error!(stage = %Stage::Init, code = err.code(), error = %err, "command failed");
    } else {
        tracing::debug!(stage = %Stage::Init, code = err.code(), error = %err, "command rejected");
    }

    match ctx.global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(&err).with_context("run_id", &ctx.run_id);
            let response = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "run_id": ctx.run_id,
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "status": "error",
                "exit_code": exit_code.as_i32(),
                "exit_code_name": exit_code.code_name(),
                "error": structured,
            });
            let text =
                serde_json::to_string_pretty(&response).unwrap_or_else(|_| structured.to_json());
            eprintln!("{text}");
        }
        OutputFormat::Summary => eprintln!("[{}] error: {}", ctx.run_id, err),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => eprintln!("{}", err.format_human()),
    }

    exit_code
}
