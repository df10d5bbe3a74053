mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use hwaf_store::VcsKind;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "hwaf",
    version,
    about = "Package workspaces and hscript build configuration"
)]
struct Cli {
    /// Root directory of the workspace.
    #[arg(short = 'w', long, default_value = ".", global = true)]
    workspace: PathBuf,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Initialize a workspace in the workspace directory.
    Init,
    /// Create, check out, remove and list packages.
    Pkg {
        #[command(subcommand)]
        command: PkgCommands,
    },
    /// Inspect packages and hscript documents.
    Show {
        #[command(subcommand)]
        command: ShowCommands,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
enum PkgCommands {
    /// Create a new local package under the source root.
    Create {
        /// Package path relative to the source root (e.g. MyPath/MyPackage).
        path: String,
    },
    /// Check a package out of version control.
    Co {
        /// Remote repository URL.
        remote: String,
        /// Package path relative to the source root. Defaults to the remote's last component.
        path: Option<String>,
        /// Version control system of the remote.
        #[arg(long, default_value = "git")]
        vcs: VcsKind,
    },
    /// Remove packages from disk and from the registry.
    Rm {
        /// Package names or paths.
        #[arg(required = true)]
        names: Vec<String>,
        /// Remove the registry entry even if the package is already gone from disk.
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
    /// List registered packages.
    Ls,
}

#[derive(Debug, Subcommand)]
enum ShowCommands {
    /// Validate an hscript and print its resolved tags, environment and actions.
    Hscript {
        /// A package name, a package directory, or an hscript file.
        target: String,
    },
    /// Print a package's dependencies and the rules each build rule uses.
    PkgUses {
        /// Package name or path.
        name: String,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("HWAF_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let root = cli.workspace;
    let json_output = cli.json;
    tracing::debug!("workspace root: {}", root.display());

    let result = match cli.command {
        Commands::Init => commands::init::run(&root, json_output),
        Commands::Pkg { command } => match command {
            PkgCommands::Create { path } => commands::pkg_create::run(&root, &path, json_output),
            PkgCommands::Co { remote, path, vcs } => {
                commands::pkg_co::run(&root, vcs, &remote, path.as_deref(), json_output)
            }
            PkgCommands::Rm { names, force } => {
                commands::pkg_rm::run(&root, &names, force, json_output)
            }
            PkgCommands::Ls => commands::pkg_ls::run(&root, json_output),
        },
        Commands::Show { command } => match command {
            ShowCommands::Hscript { target } => {
                commands::show_hscript::run(&root, &target, json_output)
            }
            ShowCommands::PkgUses { name } => {
                commands::show_pkg_uses::run(&root, &name, json_output)
            }
        },
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(commands::exit_code_for(&msg))
        }
    }
}
