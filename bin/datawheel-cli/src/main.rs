//! Datawheel CLI - data item allocation from the command line
//!
//! This binary manages the stored A/B/C groups and runs wheel or quota
//! allocations, printing per-person totals and the item-by-item
//! assignment, with optional CSV and clipboard exports.

mod export;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use datawheel_alloc::{QuotaAllocator, WheelAllocator, WheelOrder, aggregate};
use datawheel_common::{
    AssignmentSequence, Config, GroupAssignment, GroupLabel, LowPolicy, Name, Roster, StatsTable,
    TeamCodes, parse_names,
};
use datawheel_store::GroupStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "datawheel")]
#[command(about = "Weighted allocation of data items to people")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "datawheel.toml")]
    config: String,

    /// Group file (overrides storage.groups_file)
    #[arg(long)]
    groups_file: Option<PathBuf>,

    /// Log level (overrides logging.level)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stored group operations
    Groups {
        #[command(subcommand)]
        action: GroupCommands,
    },
    /// Weighted round-robin over the stored A/B/C groups
    Wheel(WheelArgs),
    /// Even split with a reduced quota for some people
    Quota(QuotaArgs),
}

#[derive(Subcommand, Debug)]
enum GroupCommands {
    /// Replace the stored groups (names separated by commas or newlines)
    Set {
        /// Group A members (3 items per round)
        #[arg(long, default_value = "")]
        a: String,
        /// Group B members (2 items per round)
        #[arg(long, default_value = "")]
        b: String,
        /// Group C members (1 item per round)
        #[arg(long, default_value = "")]
        c: String,
    },
    /// Append people to one stored group
    Add {
        /// Group label (A, B or C)
        group: String,
        /// Names to add, separated by commas or newlines
        names: String,
    },
    /// Show the stored groups
    Show {
        /// Only show this group (A, B or C)
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Delete the stored groups
    Clear,
}

#[derive(ClapArgs, Debug)]
#[group(id = "roster_input", required = true, multiple = false)]
struct RosterInput {
    /// Working roster, separated by commas or newlines
    #[arg(long)]
    names: Option<String>,
    /// Read the working roster from a file
    #[arg(long)]
    names_file: Option<PathBuf>,
}

impl RosterInput {
    fn read(&self) -> Result<Vec<Name>> {
        let raw = match (&self.names, &self.names_file) {
            (Some(names), _) => names.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read names file {}", path.display()))?,
            (None, None) => String::new(),
        };
        Ok(parse_names(&raw))
    }
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    /// Write the item-by-item assignment as CSV
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Write per-person totals as CSV
    #[arg(long)]
    stats_csv: Option<PathBuf>,
    /// Print the assignment as tab-separated text for pasting into a spreadsheet
    #[arg(long)]
    tsv: bool,
    /// Print the result as JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(ClapArgs, Debug)]
struct WheelArgs {
    /// Number of data items to hand out
    #[arg(short, long)]
    total: usize,
    #[command(flatten)]
    roster: RosterInput,
    /// Person who received the last item of the previous run (blank for none)
    #[arg(short, long)]
    resume: Option<String>,
    /// Give each member all of their items in a row instead of cycling
    #[arg(long)]
    per_member: bool,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
#[group(id = "low_policy", required = true, multiple = false)]
struct PolicyInput {
    /// Items per low-quota person
    #[arg(long)]
    fixed: Option<usize>,
    /// Percentage of the total shared by the low-quota people
    #[arg(long)]
    percent: Option<u32>,
}

impl PolicyInput {
    fn policy(&self) -> Result<LowPolicy> {
        match (self.fixed, self.percent) {
            (Some(n), _) => Ok(LowPolicy::FixedCount(n)),
            (None, Some(p)) => Ok(LowPolicy::Percentage(p)),
            (None, None) => anyhow::bail!("one of --fixed or --percent is required"),
        }
    }
}

#[derive(ClapArgs, Debug)]
struct QuotaArgs {
    /// Number of data items to hand out
    #[arg(short, long)]
    total: usize,
    #[command(flatten)]
    roster: RosterInput,
    /// People receiving the reduced quota
    #[arg(long, default_value = "")]
    low: String,
    #[command(flatten)]
    policy: PolicyInput,
    #[command(flatten)]
    output: OutputArgs,
}

/// JSON view of an allocation run
#[derive(Serialize)]
struct Report<'a, P: Serialize> {
    plan: &'a P,
    sequence: &'a AssignmentSequence,
    stats: Vec<&'a datawheel_common::StatsEntry>,
    last_recipient: Option<&'a Name>,
}

fn load_config(path: &str) -> Config {
    if !Path::new(path).exists() {
        return Config::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to parse config file: {}", e);
            Config::default()
        }),
        Err(e) => {
            eprintln!("Warning: Failed to read config file: {}", e);
            Config::default()
        }
    }
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // Load config file if it exists; CLI flags take precedence
    let config = load_config(&args.config);
    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run(args, &config) {
        let (message, code) = failure(&err);
        eprintln!("{message}");
        std::process::exit(code);
    }
}

/// Message and exit code for a failed run.
///
/// Unsatisfiable allocation requests are reported verbatim; anything else
/// carries its context chain.
fn failure(err: &anyhow::Error) -> (String, i32) {
    match err.downcast_ref::<datawheel_common::Error>() {
        Some(e) if e.is_allocation_failure() => (e.to_string(), e.exit_code()),
        Some(e) => (format!("Error: {err:#}"), e.exit_code()),
        None => (format!("Error: {err:#}"), 1),
    }
}

fn parse_label(raw: &str) -> Result<GroupLabel> {
    Ok(raw.parse::<GroupLabel>().map_err(datawheel_common::Error::from)?)
}

fn run(args: Args, config: &Config) -> Result<()> {
    let groups_file = args
        .groups_file
        .unwrap_or_else(|| config.storage.groups_file.clone());
    let store = GroupStore::open(&groups_file);
    let teams = TeamCodes::from_config(&config.teams);

    match args.command {
        Commands::Groups { action } => match action {
            GroupCommands::Set { a, b, c } => {
                let groups = GroupAssignment::new()
                    .with(GroupLabel::A, parse_names(&a))
                    .with(GroupLabel::B, parse_names(&b))
                    .with(GroupLabel::C, parse_names(&c));
                store.save(&groups)?;
                println!("Saved {} members to {}", groups.len(), store.path().display());
                print_groups(&groups, None);
            }
            GroupCommands::Add { group, names } => {
                let label = parse_label(&group)?;
                let mut groups = store.load()?;
                for name in parse_names(&names) {
                    if let Some(existing) = groups.label_of(&name) {
                        warn!("{} is already in group {}; skipped", name, existing);
                        continue;
                    }
                    groups.push(label, name);
                }
                store.save(&groups)?;
                print_groups(&groups, Some(label));
            }
            GroupCommands::Show { group } => {
                let only = group.as_deref().map(parse_label).transpose()?;
                if !store.exists() {
                    println!("No groups stored at {}", store.path().display());
                } else {
                    print_groups(&store.load()?, only);
                }
            }
            GroupCommands::Clear => {
                store.clear()?;
                println!("Cleared groups at {}", store.path().display());
            }
        },
        Commands::Wheel(wheel_args) => {
            let names = wheel_args.roster.read()?;
            let groups = store.load()?;
            let resume = wheel_args
                .resume
                .as_deref()
                .filter(|raw| !raw.trim().is_empty())
                .map(Name::new)
                .transpose()
                .map_err(datawheel_common::Error::from)?;
            let order = if wheel_args.per_member || config.wheel.per_member {
                WheelOrder::PerMember
            } else {
                WheelOrder::Cycled
            };

            let wheel = WheelAllocator::new(groups).with_order(order);
            for name in &names {
                if wheel.groups().label_of(name).is_none() {
                    warn!("{} is not in any group and will receive nothing", name);
                }
            }

            let allocation =
                wheel.allocate_with_plan(&names, wheel_args.total, resume.as_ref())?;
            let stats = aggregate(&allocation.sequence);
            info!(
                items = allocation.sequence.len(),
                people = stats.len(),
                order = ?wheel.order(),
                "wheel allocation done"
            );

            report(
                &allocation.plan,
                &allocation.sequence,
                &stats,
                &teams,
                &wheel_args.output,
            )?;
        }
        Commands::Quota(quota_args) => {
            let policy = quota_args.policy.policy()?;
            let roster = Roster::new(quota_args.roster.read()?).with_low(parse_names(&quota_args.low));

            for name in roster.stray_low_members() {
                warn!("{} is in the low list but not on the roster; ignored", name);
            }

            let allocator = QuotaAllocator::new(policy);
            let allocation = allocator.allocate(&roster, quota_args.total)?;
            info!(
                items = allocation.sequence.len(),
                policy = %allocator.policy(),
                "quota allocation done"
            );

            report(
                &allocation.plan,
                &allocation.sequence,
                &allocation.stats,
                &teams,
                &quota_args.output,
            )?;
        }
    }

    Ok(())
}

fn print_groups(groups: &GroupAssignment, only: Option<GroupLabel>) {
    for (label, members) in groups.iter() {
        if only.is_some_and(|wanted| wanted != label) {
            continue;
        }
        println!();
        println!("Group {label} ({} per round)", label.weight());
        println!("{}", "-".repeat(20));
        if members.is_empty() {
            println!("(empty)");
        }
        for name in members {
            println!("{name}");
        }
    }
}

fn report<P: Serialize>(
    plan: &P,
    sequence: &AssignmentSequence,
    stats: &StatsTable,
    teams: &TeamCodes,
    output: &OutputArgs,
) -> Result<()> {
    if let Some(path) = &output.stats_csv {
        export::to_file(path, |file| export::write_stats(file, stats))?;
        info!(path = %path.display(), "wrote stats CSV");
    }
    if let Some(path) = &output.csv {
        export::to_file(path, |file| export::write_assignments(file, sequence, teams))?;
        info!(path = %path.display(), "wrote assignment CSV");
    }

    if output.json {
        let report = Report {
            plan,
            sequence,
            stats: stats.sorted_by_count(),
            last_recipient: sequence.last(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if output.tsv {
        print!("{}", export::clipboard_tsv(sequence, teams)?);
        return Ok(());
    }

    println!("Items per person");
    println!("================");
    println!("{:<30} {:>8}", "NAME", "ITEMS");
    println!("{}", "-".repeat(39));
    for entry in stats.sorted_by_count() {
        println!("{:<30} {:>8}", entry.name.as_str(), entry.count);
    }

    println!();
    println!("Assignment");
    println!("==========");
    if teams.is_empty() {
        println!("{:<6} {:<30}", "#", "RECIPIENT");
        println!("{}", "-".repeat(37));
        for (i, name) in sequence.iter().enumerate() {
            println!("{:<6} {:<30}", i + 1, name.as_str());
        }
    } else {
        println!("{:<6} {:<12} {:<30}", "#", "TEAM", "RECIPIENT");
        println!("{}", "-".repeat(50));
        for (i, name) in sequence.iter().enumerate() {
            println!(
                "{:<6} {:<12} {:<30}",
                i + 1,
                teams.label(name).unwrap_or("-"),
                name.as_str()
            );
        }
    }

    if let Some(last) = sequence.last() {
        println!();
        println!("Last recipient: {last} (pass --resume \"{last}\" to continue next run)");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_quota_requires_exactly_one_policy() {
        let parsed = Args::try_parse_from(["datawheel", "quota", "-t", "10", "--names", "A,B"]);
        assert!(parsed.is_err());

        let parsed = Args::try_parse_from([
            "datawheel", "quota", "-t", "10", "--names", "A,B", "--fixed", "1", "--percent", "20",
        ]);
        assert!(parsed.is_err());

        let args = Args::try_parse_from([
            "datawheel", "quota", "-t", "10", "--names", "A,B", "--low", "B", "--percent", "20",
        ])
        .unwrap();
        let Commands::Quota(quota) = args.command else {
            panic!("expected quota command");
        };
        assert_eq!(quota.policy.policy().unwrap(), LowPolicy::Percentage(20));
    }

    #[test]
    fn test_wheel_roster_sources_are_exclusive() {
        let parsed = Args::try_parse_from([
            "datawheel", "wheel", "-t", "5", "--names", "A", "--names-file", "roster.txt",
        ]);
        assert!(parsed.is_err());

        let args =
            Args::try_parse_from(["datawheel", "wheel", "-t", "5", "--names", "Lan, Minh", "-r", "Lan"])
                .unwrap();
        let Commands::Wheel(wheel) = args.command else {
            panic!("expected wheel command");
        };
        assert_eq!(wheel.roster.read().unwrap().len(), 2);
        assert_eq!(wheel.resume.as_deref(), Some("Lan"));
    }

    #[test]
    fn test_wheel_run_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let groups_file = dir.path().join("groups.json");
        let stats_csv = dir.path().join("stats.csv");
        let config = Config::default();

        let set = Args::try_parse_from([
            "datawheel",
            "--groups-file",
            groups_file.to_str().unwrap(),
            "groups",
            "set",
            "--a",
            "X",
            "--b",
            "Y",
            "--c",
            "Z",
        ])
        .unwrap();
        run(set, &config).unwrap();

        let wheel = Args::try_parse_from([
            "datawheel",
            "--groups-file",
            groups_file.to_str().unwrap(),
            "wheel",
            "-t",
            "6",
            "--names",
            "Z, Y, X",
            "--stats-csv",
            stats_csv.to_str().unwrap(),
        ])
        .unwrap();
        run(wheel, &config).unwrap();

        assert_eq!(
            std::fs::read_to_string(&stats_csv).unwrap(),
            "name,count\nX,3\nY,2\nZ,1\n"
        );
    }

    fn run_with_groups(groups_file: &Path, argv: &[&str]) -> Result<()> {
        let mut full = vec!["datawheel", "--groups-file", groups_file.to_str().unwrap()];
        full.extend_from_slice(argv);
        run(Args::try_parse_from(full).unwrap(), &Config::default())
    }

    #[test]
    fn test_blank_resume_means_no_marker() {
        let dir = tempfile::tempdir().unwrap();
        let groups_file = dir.path().join("groups.json");
        run_with_groups(&groups_file, &["groups", "set", "--a", "X", "--b", "Y"]).unwrap();

        for resume in ["", "   "] {
            let stats_csv = dir.path().join("stats.csv");
            run_with_groups(
                &groups_file,
                &[
                    "wheel",
                    "-t",
                    "5",
                    "--names",
                    "X, Y",
                    "--resume",
                    resume,
                    "--stats-csv",
                    stats_csv.to_str().unwrap(),
                ],
            )
            .unwrap();
            assert_eq!(
                std::fs::read_to_string(&stats_csv).unwrap(),
                "name,count\nX,3\nY,2\n"
            );
        }
    }

    #[test]
    fn test_groups_add_then_wheel() {
        let dir = tempfile::tempdir().unwrap();
        let groups_file = dir.path().join("groups.json");
        run_with_groups(&groups_file, &["groups", "add", "b", "Y"]).unwrap();
        run_with_groups(&groups_file, &["groups", "add", "A", "X"]).unwrap();
        // Already in A, left where it is
        run_with_groups(&groups_file, &["groups", "add", "c", "X, Z"]).unwrap();
        run_with_groups(&groups_file, &["groups", "show", "--group", "c"]).unwrap();

        let stored = GroupStore::open(&groups_file).load().unwrap();
        assert_eq!(stored.label_of(&Name::new("X").unwrap()), Some(GroupLabel::A));
        assert_eq!(stored.label_of(&Name::new("Y").unwrap()), Some(GroupLabel::B));
        assert_eq!(stored.label_of(&Name::new("Z").unwrap()), Some(GroupLabel::C));

        let stats_csv = dir.path().join("stats.csv");
        run_with_groups(
            &groups_file,
            &[
                "wheel",
                "-t",
                "6",
                "--names",
                "X, Y, Z",
                "--stats-csv",
                stats_csv.to_str().unwrap(),
            ],
        )
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(&stats_csv).unwrap(),
            "name,count\nX,3\nY,2\nZ,1\n"
        );
    }

    #[test]
    fn test_unknown_group_label_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let groups_file = dir.path().join("groups.json");

        for argv in [&["groups", "add", "d", "X"][..], &["groups", "show", "--group", "q"][..]] {
            let err = run_with_groups(&groups_file, argv).unwrap_err();
            let err = err.downcast_ref::<datawheel_common::Error>().unwrap();
            assert!(matches!(err, datawheel_common::Error::InvalidGroup(_)));
            assert_eq!(err.exit_code(), 2);
        }
        assert!(!groups_file.exists());
    }

    #[test]
    fn test_failure_messages() {
        let capacity = anyhow::Error::from(datawheel_common::Error::capacity("low quota exceeds total"));
        assert_eq!(
            failure(&capacity),
            ("capacity error: low quota exceeds total".to_string(), 4)
        );

        let usage = anyhow::Error::from(datawheel_common::Error::invalid_argument("bad total"))
            .context("reading request");
        let (message, code) = failure(&usage);
        assert!(message.starts_with("Error: reading request: "));
        assert_eq!(code, 2);

        assert_eq!(failure(&anyhow::anyhow!("boom")), ("Error: boom".to_string(), 1));
    }

    #[test]
    fn test_capacity_error_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "datawheel",
            "--groups-file",
            dir.path().join("groups.json").to_str().unwrap(),
            "quota",
            "-t",
            "5",
            "--names",
            "A, B",
            "--low",
            "A",
            "--fixed",
            "10",
        ])
        .unwrap();

        let err = run(args, &Config::default()).unwrap_err();
        let err = err.downcast_ref::<datawheel_common::Error>().unwrap();
        assert_eq!(err, &datawheel_common::Error::capacity("low quota exceeds total"));
        assert_eq!(err.exit_code(), 4);
    }
}
