//! envyaml CLI - Render environment-supplied YAML templates at container startup
//!
//! Usage:
//!   envyaml prometheus /etc/prometheus/prometheus.yml
//!   envyaml mimir --interface eth0
//!   envyaml render --source LOKI_YAML --output /etc/loki.yaml
//!   envyaml check --source MIMIR_YAML --policy mimir

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use envyaml_core::policy::DEFAULT_INTERFACE;
use envyaml_core::{
    find_placeholders, load_document, DocumentSpec, Environment, Error, ErrorKind,
    HostnameProvider, InterfaceAddrProvider, MimirOptions, Policy, ProcessEnv, Profile,
    RenderEvent, ALERTMANAGER_OUTPUT, MIMIR_OUTPUT, PROMETHEUS_OUTPUT,
};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
const LOG_ENV: &str = "ENVYAML_LOG";

/// envyaml - Resolve {PLACEHOLDERS} in YAML templates read from the environment
#[derive(Parser)]
#[command(name = "envyaml")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Don't echo resolved documents to stdout
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log resolution steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render PROMETHEUS_YML for a Prometheus ring node
    Prometheus {
        /// Output file
        #[arg(default_value = PROMETHEUS_OUTPUT)]
        output: PathBuf,

        /// Print the resolved document without writing it
        #[arg(long)]
        no_write: bool,
    },

    /// Render MIMIR_YAML and, when set, ALERTMANAGER_YAML
    Mimir {
        /// Output file for the Mimir configuration
        #[arg(short, long, default_value = MIMIR_OUTPUT)]
        output: PathBuf,

        /// Output file for the Alertmanager configuration
        #[arg(long, default_value = ALERTMANAGER_OUTPUT)]
        alertmanager_output: PathBuf,

        /// Interface whose IPv4 address replaces {ADVERTISE_ADDR_REPLACE}
        #[arg(short, long, default_value = DEFAULT_INTERFACE)]
        interface: String,

        /// Print the resolved documents without writing them
        #[arg(long)]
        no_write: bool,
    },

    /// Render the template held by an arbitrary variable
    Render {
        /// Variable holding the YAML template
        #[arg(short, long)]
        source: String,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Additional placeholder names to forbid (the source is always forbidden)
        #[arg(long = "protect", value_name = "NAME")]
        protect: Vec<String>,

        /// Placeholder name answered with the host's name
        #[arg(long, value_name = "NAME")]
        hostname_token: Option<String>,

        /// Placeholder name answered with the address of --interface
        #[arg(long, value_name = "NAME")]
        address_token: Option<String>,

        /// Interface used by --address-token
        #[arg(short, long, default_value = DEFAULT_INTERFACE)]
        interface: String,

        /// Print the resolved document without writing it
        #[arg(long)]
        no_write: bool,
    },

    /// List the placeholders a template references without resolving them
    Check {
        /// Variable holding the YAML template
        #[arg(short, long)]
        source: String,

        /// Policy used to classify placeholders
        #[arg(short, long, value_enum, default_value_t = PolicyKind::Env)]
        policy: PolicyKind,
    },
}

/// Stock policies selectable from the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyKind {
    /// Environment lookups only
    Env,
    /// Prometheus ring node policy
    Prometheus,
    /// Mimir / Alertmanager policy
    Mimir,
}

/// Run the CLI with the process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let env: Arc<dyn Environment> = Arc::new(ProcessEnv);

    match cli.command {
        Commands::Prometheus { output, no_write } => {
            let profile = Profile::prometheus(env, output);
            cmd_render(&profile, !no_write, cli.quiet)
        }

        Commands::Mimir {
            output,
            alertmanager_output,
            interface,
            no_write,
        } => {
            let profile = Profile::mimir(
                env,
                MimirOptions {
                    output,
                    alertmanager_output,
                    interface,
                },
            );
            cmd_render(&profile, !no_write, cli.quiet)
        }

        Commands::Render {
            source,
            output,
            protect,
            hostname_token,
            address_token,
            interface,
            no_write,
        } => {
            let policy = custom_policy(
                Arc::clone(&env),
                &source,
                protect,
                hostname_token,
                address_token,
                interface,
            );
            let profile = custom_profile(env, source, output, policy);
            cmd_render(&profile, !no_write, cli.quiet)
        }

        Commands::Check { source, policy } => cmd_check(env, &source, policy),
    }
}

/// Install the stderr log subscriber; `log` records from the core are bridged
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    // Ignore the error: a subscriber may already be installed by an embedder
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn custom_policy(
    env: Arc<dyn Environment>,
    source: &str,
    protect: Vec<String>,
    hostname_token: Option<String>,
    address_token: Option<String>,
    interface: String,
) -> Policy {
    let mut policy = Policy::new(env).protect(source);
    for name in protect {
        policy = policy.protect(name);
    }
    if let Some(token) = hostname_token {
        policy = policy.with_provider(token, Arc::new(HostnameProvider));
    }
    if let Some(token) = address_token {
        policy = policy.with_provider(token, Arc::new(InterfaceAddrProvider::new(interface)));
    }
    policy
}

fn policy_for(kind: PolicyKind, env: Arc<dyn Environment>, source: &str) -> Policy {
    match kind {
        PolicyKind::Env => Policy::new(env).protect(source),
        PolicyKind::Prometheus => Policy::prometheus(env).protect(source),
        PolicyKind::Mimir => Policy::mimir(env, DEFAULT_INTERFACE).protect(source),
    }
}

/// Exit status for a failed run: 1 for unresolved placeholders, 2 for everything else
fn exit_code_for(err: &Error) -> u8 {
    match err.kind {
        ErrorKind::UnresolvedToken { .. } => 1,
        _ => 2,
    }
}

fn report(label: &str, err: &Error) -> ExitCode {
    eprintln!("{} Failed to render {}\n", "✗".red(), label);
    eprintln!("{}", err);
    ExitCode::from(exit_code_for(err))
}

fn cmd_render(profile: &Profile, write: bool, quiet: bool) -> ExitCode {
    match render_profile(profile, write, quiet) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e.source_var.as_deref().unwrap_or(profile.name()), &e),
    }
}

/// Render every active document of `profile`, echoing progress as it goes
fn render_profile(profile: &Profile, write: bool, quiet: bool) -> Result<(), Error> {
    log::debug!(
        "Profile {} declares {} documents",
        profile.name(),
        profile.documents().len()
    );
    profile.render_all(write, |event| match event {
        RenderEvent::Started(spec) => {
            eprintln!("{} file: {}", title_case(&spec.label), spec.output.display());
        }
        RenderEvent::Rendered(doc) => {
            if !quiet {
                println!("{}", doc.yaml);
            }
        }
        RenderEvent::Written(doc) => {
            eprintln!("{} Wrote to {}", "✓".green(), doc.output.display());
        }
    })?;
    Ok(())
}

fn custom_profile(
    env: Arc<dyn Environment>,
    source: String,
    output: PathBuf,
    policy: Policy,
) -> Profile {
    Profile::new("render", env).with_document(DocumentSpec::new(
        source.clone(),
        source,
        output,
        policy,
    ))
}

/// How a placeholder would fare under a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Forbidden,
    Computed,
    Set,
    Missing,
}

impl Status {
    fn classify(policy: &Policy, env: &dyn Environment, name: &str) -> Self {
        if policy.is_protected(name) {
            Status::Forbidden
        } else if policy.has_provider(name) {
            Status::Computed
        } else if env.non_empty(name).is_some() {
            Status::Set
        } else {
            Status::Missing
        }
    }

    fn is_failure(self) -> bool {
        matches!(self, Status::Forbidden | Status::Missing)
    }
}

fn cmd_check(env: Arc<dyn Environment>, source: &str, kind: PolicyKind) -> ExitCode {
    let doc = match load_document(env.as_ref(), source) {
        Ok(d) => d,
        Err(e) => return report(source, &e),
    };
    let policy = policy_for(kind, Arc::clone(&env), source);

    // Distinct names in first-seen order, with every path they appear at
    let mut names: Vec<String> = Vec::new();
    let mut paths: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for found in find_placeholders(&doc) {
        let entry = paths.entry(found.token.name.clone()).or_default();
        if entry.is_empty() {
            names.push(found.token.name.clone());
        }
        let path = if found.path.is_empty() {
            "<root>".to_string()
        } else {
            found.path
        };
        if !entry.contains(&path) {
            entry.push(path);
        }
    }

    if names.is_empty() {
        println!("{} {}: no placeholders", "✓".green(), source);
        return ExitCode::SUCCESS;
    }

    let mut failures = 0;
    for name in &names {
        let status = Status::classify(&policy, env.as_ref(), name);
        let marker = match status {
            Status::Forbidden => "forbidden".red(),
            Status::Missing => "missing".red(),
            Status::Computed => "computed".cyan(),
            Status::Set => "set".green(),
        };
        if status.is_failure() {
            failures += 1;
        }
        println!("{{{}}} {} ({})", name, marker, paths[name].join(", "));
    }

    if failures == 0 {
        println!("{} {}: {} placeholders resolvable", "✓".green(), source, names.len());
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "{} {}: {} of {} placeholders cannot be resolved",
            "✗".red(),
            source,
            failures,
            names.len()
        );
        ExitCode::from(1)
    }
}

fn title_case(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use envyaml_core::{MapEnv, TokenErrorKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_prometheus_default_output() {
        let cli = Cli::try_parse_from(["envyaml", "prometheus"]).unwrap();
        match cli.command {
            Commands::Prometheus { output, no_write } => {
                assert_eq!(output, PathBuf::from(PROMETHEUS_OUTPUT));
                assert!(!no_write);
            }
            _ => panic!("expected prometheus command"),
        }
    }

    #[test]
    fn test_prometheus_positional_output() {
        let cli =
            Cli::try_parse_from(["envyaml", "prometheus", "/tmp/p.yml", "--no-write", "-q"])
                .unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Prometheus { output, no_write } => {
                assert_eq!(output, PathBuf::from("/tmp/p.yml"));
                assert!(no_write);
            }
            _ => panic!("expected prometheus command"),
        }
    }

    #[test]
    fn test_mimir_defaults() {
        let cli = Cli::try_parse_from(["envyaml", "mimir"]).unwrap();
        match cli.command {
            Commands::Mimir {
                output,
                alertmanager_output,
                interface,
                ..
            } => {
                assert_eq!(output, PathBuf::from(MIMIR_OUTPUT));
                assert_eq!(alertmanager_output, PathBuf::from(ALERTMANAGER_OUTPUT));
                assert_eq!(interface, "eth0");
            }
            _ => panic!("expected mimir command"),
        }
    }

    #[test]
    fn test_render_requires_source_and_output() {
        assert!(Cli::try_parse_from(["envyaml", "render", "--source", "X_YAML"]).is_err());
        assert!(Cli::try_parse_from([
            "envyaml", "render", "--source", "X_YAML", "--output", "/tmp/x.yaml"
        ])
        .is_ok());
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn loki_profile(env: MapEnv, output: PathBuf) -> Profile {
        let env: Arc<dyn Environment> = Arc::new(env);
        let policy = custom_policy(
            Arc::clone(&env),
            "LOKI_YAML",
            Vec::new(),
            None,
            None,
            DEFAULT_INTERFACE.into(),
        );
        custom_profile(env, "LOKI_YAML".into(), output, policy)
    }

    #[test]
    fn test_render_writes_resolved_document() {
        let dir = temp_dir("envyaml_cli_test_render_ok");
        let output = dir.join("loki.yaml");
        let env = MapEnv::new()
            .with("LOKI_YAML", "common:\n  ring: \"{RING_NAME}\"\n")
            .with("RING_NAME", "ring-0");

        render_profile(&loki_profile(env, output.clone()), true, true).unwrap();
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "common:\n  ring: ring-0\n"
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_render_unresolved_token_leaves_no_file() {
        let dir = temp_dir("envyaml_cli_test_render_unresolved");
        let output = dir.join("loki.yaml");
        let env = MapEnv::new().with("LOKI_YAML", "common:\n  ring: \"{RING_NAME}\"\n");

        let err = render_profile(&loki_profile(env, output.clone()), true, true).unwrap_err();
        assert_eq!(err.token(), Some("RING_NAME"));
        assert_eq!(err.source_var.as_deref(), Some("LOKI_YAML"));
        assert_eq!(exit_code_for(&err), 1);
        assert!(!output.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_render_self_reference_leaves_no_file() {
        let dir = temp_dir("envyaml_cli_test_render_self_reference");
        let output = dir.join("loki.yaml");
        let env = MapEnv::new().with("LOKI_YAML", "copy: \"{LOKI_YAML}\"\n");

        let err = render_profile(&loki_profile(env, output.clone()), true, true).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::UnresolvedToken {
                reason: TokenErrorKind::SelfReference { .. },
                ..
            }
        ));
        assert!(!output.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_render_no_write() {
        let dir = temp_dir("envyaml_cli_test_render_no_write");
        let output = dir.join("loki.yaml");
        let env = MapEnv::new().with("LOKI_YAML", "a: 1\n");

        render_profile(&loki_profile(env, output.clone()), false, true).unwrap();
        assert!(!output.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_custom_policy() {
        let env: Arc<dyn Environment> = Arc::new(MapEnv::new().with("REGION", "eu-1"));
        let policy = custom_policy(
            env,
            "LOKI_YAML",
            vec!["OTHER_YAML".into()],
            Some("NODE_NAME".into()),
            Some("POD_IP".into()),
            "eth1".into(),
        );

        assert!(policy.is_protected("LOKI_YAML"));
        assert!(policy.is_protected("OTHER_YAML"));
        assert!(policy.has_provider("NODE_NAME"));
        assert!(policy.has_provider("POD_IP"));
        assert_eq!(policy.resolve("REGION").unwrap(), "eu-1");
    }

    #[test]
    fn test_check_classification() {
        let env = MapEnv::new().with("SET_VAR", "v").with("EMPTY_VAR", "");
        let shared: Arc<dyn Environment> = Arc::new(env.clone());
        let policy = policy_for(PolicyKind::Mimir, shared, "MIMIR_YAML");

        assert_eq!(
            Status::classify(&policy, &env, "MIMIR_YAML"),
            Status::Forbidden
        );
        assert_eq!(
            Status::classify(&policy, &env, "ALERTMANAGER_YAML"),
            Status::Forbidden
        );
        assert_eq!(
            Status::classify(&policy, &env, "ADVERTISE_ADDR_REPLACE"),
            Status::Computed
        );
        assert_eq!(Status::classify(&policy, &env, "SET_VAR"), Status::Set);
        assert_eq!(Status::classify(&policy, &env, "EMPTY_VAR"), Status::Missing);
        assert!(Status::Missing.is_failure());
        assert!(!Status::Computed.is_failure());
    }

    #[test]
    fn test_exit_codes() {
        let unresolved = Error::unresolved(
            "X",
            TokenErrorKind::EnvNotFound {
                var_name: "X".into(),
            },
        );
        assert_eq!(exit_code_for(&unresolved), 1);
        assert_eq!(exit_code_for(&Error::source_missing("X_YAML")), 2);
        assert_eq!(exit_code_for(&Error::parse("bad")), 2);
        assert_eq!(exit_code_for(&Error::persist("/etc/x", "denied")), 2);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("alertmanager"), "Alertmanager");
        assert_eq!(title_case(""), "");
    }
}
