//! mh CLI - operate multiple Helm charts from one self-rendering configuration

use clap::{Args, Parser, Subcommand};
use mh_core::MhConfig;
use std::path::PathBuf;

mod commands;
mod display;
mod error;
mod exit_codes;
mod helm;
mod logging;
mod session;
mod util;

use error::Result;
use session::Session;

#[derive(Parser)]
#[command(name = "mh")]
#[command(version)]
#[command(about = "Operate multiple Helm charts from one configuration", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// Config file [default: $HOME/.mh.yaml]
    #[arg(long, global = true, env = "MH_CONFIG")]
    config: Option<PathBuf>,

    /// Log as JSON; `render` also prints JSON
    #[arg(long, global = true, env = "MH_JSON")]
    json: bool,

    /// Enable debug output
    #[arg(long, global = true, env = "MH_DEBUG")]
    debug: bool,

    /// Print rendered override values
    #[arg(short = 'p', long, global = true, env = "MH_PRINT_RENDERED")]
    print_rendered: bool,

    /// Do not recreate pods on upgrade
    #[arg(long, global = true, env = "MH_NO_RECREATE_PODS")]
    no_recreate_pods: bool,

    /// Set config values (key1=val1,key2=val2); may be repeated
    #[arg(long, global = true, env = "MH_SET")]
    set: Vec<String>,

    /// kubectl context mh is allowed to act on
    #[arg(long, global = true, env = "MH_TARGET_CONTEXT")]
    target_context: Option<String>,

    #[arg(long, global = true, env = "MH_TEAM")]
    team: Option<String>,
}

impl GlobalArgs {
    /// The environment/CLI configuration layer
    fn config_layer(&self, simulate: bool) -> MhConfig {
        MhConfig {
            print_rendered: self.print_rendered,
            no_recreate_pods: self.no_recreate_pods,
            simulate,
            target_context: self.target_context.clone().unwrap_or_default(),
            team: self.team.clone().unwrap_or_default(),
            set: self.set.clone(),
            ..MhConfig::empty()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Apply apps; acts on every app when none are given
    Apply {
        apps: Vec<String>,
    },

    /// Dry-run `apply` with helm's --debug --dry-run
    Simulate {
        apps: Vec<String>,
    },

    /// Delete apps' releases
    Destroy {
        apps: Vec<String>,

        /// Remove the release name from helm's store
        #[arg(long)]
        purge: bool,
    },

    /// Show apps' release status
    Status {
        apps: Vec<String>,
    },

    /// Render apps without deploying anything
    Render {
        apps: Vec<String>,
    },
}

impl Commands {
    fn apps(&self) -> &[String] {
        match self {
            Commands::Apply { apps }
            | Commands::Simulate { apps }
            | Commands::Destroy { apps, .. }
            | Commands::Status { apps }
            | Commands::Render { apps } => apps,
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = util::config_path(cli.global.config.clone());
    let simulate = matches!(cli.command, Commands::Simulate { .. });
    let layer = cli.global.config_layer(simulate);

    let session = Session::load(&config_path, &layer, cli.command.apps())?;

    if !matches!(cli.command, Commands::Render { .. }) {
        let current = helm::current_context()?;
        helm::ensure_context(&session.effective.target_context, &current)?;
    }

    match cli.command {
        Commands::Apply { .. } | Commands::Simulate { .. } => commands::apply::run(&session),
        Commands::Destroy { purge, .. } => commands::destroy::run(&session, purge),
        Commands::Status { .. } => commands::status::run(&session),
        Commands::Render { .. } => commands::render::run(&session, cli.global.json),
    }
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::init_tracing(cli.global.debug, cli.global.json);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_layer() {
        let cli = Cli::parse_from([
            "mh",
            "simulate",
            "web",
            "--set",
            "foo=bar",
            "--team",
            "web-team",
            "-p",
        ]);
        let layer = cli.global.config_layer(true);

        assert!(layer.simulate);
        assert!(layer.print_rendered);
        assert_eq!(layer.team, "web-team");
        assert_eq!(layer.set, vec!["foo=bar".to_string()]);
        assert!(layer.target_context.is_empty());
        assert!(layer.maintainers.is_empty());
        assert_eq!(cli.command.apps(), ["web".to_string()]);
    }

    #[test]
    fn test_destroy_purge() {
        let cli = Cli::parse_from(["mh", "destroy", "--purge", "a", "b"]);
        match cli.command {
            Commands::Destroy { apps, purge } => {
                assert!(purge);
                assert_eq!(apps, vec!["a".to_string(), "b".to_string()]);
            }
            _ => panic!("expected destroy"),
        }
    }
}
