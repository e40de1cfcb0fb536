use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use al::commands::{self, Config, LinkSelector};
use al::provider::ProviderRegistry;
use al::shell::Shell;

/// al - dotfile links and shell snippets for installed packages
///
/// Moves configuration files into a managed directory behind symlinks and
/// keeps per-package shell snippets that `al activate` sources in order.
///
/// Examples:
///   al link add gitconfig --path ~/.gitconfig --package git
///   al package shell set fzf 'source <(fzf --zsh)' --after git
///   eval "$(al activate zsh)"
#[derive(Parser, Debug)]
#[command(author, version = env!("AL_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Managed root directory (defaults to ~/.al; also via AL_HOME)
    #[arg(
        long = "root",
        short = 'r',
        env = "AL_HOME",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Manage link.d (symlinked config files and directories)
    #[command(subcommand)]
    Link(LinkCommands),

    /// Per-package settings
    #[command(subcommand)]
    Package(PackageCommands),

    /// Print shell code sourcing enabled shell.d snippets in order
    Activate(ActivateArgs),

    /// Inspect package providers
    #[command(subcommand)]
    Provider(ProviderCommands),
}

#[derive(clap::Subcommand, Debug)]
enum LinkCommands {
    /// Move a path into link.d and replace it with a symlink
    Add(LinkAddArgs),
    /// List link.d entries
    List(PackageFilterArgs),
    /// Remove a link, copying the content back unless --purge
    Remove(LinkRemoveArgs),
    /// Open a link's stored content in $EDITOR
    Edit(LinkEditArgs),
    /// Check that every link still points at its content
    Status(PackageFilterArgs),
}

#[derive(clap::Args, Debug)]
pub struct LinkAddArgs {
    /// Entry name under link.d (letters, digits, '_', '-', '.')
    pub name: String,

    /// Path to take over. A missing path ending in '/' becomes a directory
    #[arg(long, value_name = "PATH")]
    pub path: PathBuf,

    /// Package name to associate with the link
    #[arg(long, value_name = "PKG")]
    pub package: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct PackageFilterArgs {
    /// Only links associated with this package
    #[arg(long, value_name = "PKG")]
    pub package: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct LinkTargetArgs {
    /// Entry name
    #[arg(long, required_unless_present = "path", conflicts_with = "path")]
    pub name: Option<String>,

    /// Symlink location
    #[arg(long, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Only consider links associated with this package
    #[arg(long, value_name = "PKG")]
    pub package: Option<String>,
}

impl LinkTargetArgs {
    fn selector(&self) -> LinkSelector {
        match (&self.name, &self.path) {
            (Some(name), _) => LinkSelector::Name(name.clone()),
            (None, Some(path)) => LinkSelector::Path(path.clone()),
            // clap requires one of the two
            (None, None) => LinkSelector::Name(String::new()),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct LinkRemoveArgs {
    #[command(flatten)]
    pub target: LinkTargetArgs,

    /// Delete the stored content instead of restoring it
    #[arg(long)]
    pub purge: bool,

    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct LinkEditArgs {
    #[command(flatten)]
    pub target: LinkTargetArgs,
}

#[derive(clap::Subcommand, Debug)]
enum PackageCommands {
    /// Manage a package's shell.d snippet
    #[command(subcommand)]
    Shell(ShellCommands),
}

#[derive(clap::Subcommand, Debug)]
enum ShellCommands {
    /// Show the snippet and manifest
    Show(ShellPackageArgs),
    /// Set the snippet content and optionally its load order
    Set(ShellSetArgs),
    /// Remove the snippet and manifest
    Unset(ShellPackageArgs),
    /// Edit the snippet in $EDITOR
    Edit(ShellPackageArgs),
    /// Include the snippet in `al activate`
    Enable(ShellPackageArgs),
    /// Leave the snippet out of `al activate` (files are kept)
    Disable(ShellPackageArgs),
}

#[derive(clap::Args, Debug)]
pub struct ShellPackageArgs {
    /// Package name
    #[arg(value_name = "PKG")]
    pub package: String,
}

#[derive(clap::Args, Debug)]
pub struct ShellSetArgs {
    /// Package name
    #[arg(value_name = "PKG")]
    pub package: String,

    /// Shell code to write as the snippet
    pub command: String,

    /// Package whose snippet must be sourced first
    #[arg(long, value_name = "PKG")]
    pub after: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ActivateArgs {
    /// zsh or bash
    pub shell: Shell,
}

#[derive(clap::Subcommand, Debug)]
enum ProviderCommands {
    /// List known providers
    List,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = Config::new(al::runtime::RealRuntime, cli.root)?;

    match cli.command {
        Commands::Link(command) => match command {
            LinkCommands::Add(args) => {
                commands::link_add(&config, &args.name, &args.path, args.package.as_deref())?
            }
            LinkCommands::List(args) => commands::link_list(&config, args.package.as_deref())?,
            LinkCommands::Remove(args) => commands::link_remove(
                &config,
                &args.target.selector(),
                args.target.package.as_deref(),
                args.purge,
                args.yes,
            )?,
            LinkCommands::Edit(args) => commands::link_edit(
                &config,
                &args.target.selector(),
                args.target.package.as_deref(),
            )?,
            LinkCommands::Status(args) => {
                commands::link_status(&config, args.package.as_deref())?
            }
        },
        Commands::Package(PackageCommands::Shell(command)) => match command {
            ShellCommands::Show(args) => commands::shell_show(&config, &args.package)?,
            ShellCommands::Set(args) => commands::shell_set(
                &config,
                &args.package,
                &args.command,
                args.after.as_deref(),
            )?,
            ShellCommands::Unset(args) => commands::shell_unset(&config, &args.package)?,
            ShellCommands::Edit(args) => commands::shell_edit(&config, &args.package)?,
            ShellCommands::Enable(args) => {
                commands::shell_set_enabled(&config, &args.package, true)?
            }
            ShellCommands::Disable(args) => {
                commands::shell_set_enabled(&config, &args.package, false)?
            }
        },
        Commands::Activate(args) => commands::activate(&config, args.shell)?,
        Commands::Provider(ProviderCommands::List) => {
            commands::provider_list(&config, &ProviderRegistry::builtin())?
        }
    }
    Ok(())
}
