use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use gpo_admin::commands::{
    bump_gpo_version, find_gpo_links_batch, import_gpo_backups, BumpVersionRequest, LinkQuery,
};
use gpo_admin::domain::{GpoRef, LinkScope, VersionTarget};
use gpo_admin::error::{AppError, AppResult, CommandError};
use gpo_admin::infrastructure::{OsFileStore, PsDirectory};
use gpo_admin::logging;

fn main() {
    let _guard = logging::init_logging();
    tracing::info!("gpo-admin starting");

    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        let err = CommandError::from(error);
        eprintln!("error [{}]: {}", err.code, err.message);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> AppResult<()> {
    match cli.command {
        Command::BumpVersion(args) => execute_bump(args),
        Command::Links(args) => execute_links(args),
        Command::ImportBackups(args) => execute_import(args),
    }
}

fn execute_bump(args: BumpArgs) -> AppResult<()> {
    let request = BumpVersionRequest {
        gpos: args.gpo.resolve()?,
        target: args.target,
        domain: args.domain,
        server: args.server,
        what_if: args.what_if,
    };

    let directory = PsDirectory::new();
    let store = OsFileStore;
    let report = bump_gpo_version(&directory, &store, &request);

    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.success {
        Ok(())
    } else {
        Err(AppError::OperationFailed(format!(
            "{} GPO(s) failed",
            report.errors.len()
        )))
    }
}

fn execute_links(args: LinkArgs) -> AppResult<()> {
    let gpos = args.gpo.resolve()?;
    let scope = match (args.target_dn, args.scope) {
        (Some(dn), _) => LinkScope::Target(dn),
        (None, ScopeArg::Domain) => LinkScope::Domain,
        (None, ScopeArg::AllSites) => LinkScope::AllSites,
        (None, ScopeArg::EntireForest) => LinkScope::EntireForest,
    };

    let queries: Vec<LinkQuery> = gpos
        .into_iter()
        .map(|gpo| LinkQuery {
            gpo,
            scope: scope.clone(),
            domain: args.domain.clone(),
            server: args.server.clone(),
        })
        .collect();

    let directory = PsDirectory::new();
    let batch = find_gpo_links_batch(&directory, &queries);

    println!("{}", serde_json::to_string_pretty(&batch)?);
    if batch.success {
        Ok(())
    } else {
        Err(AppError::OperationFailed(format!(
            "{} link query(ies) failed",
            batch.errors.len()
        )))
    }
}

fn execute_import(args: ImportArgs) -> AppResult<()> {
    let records = import_gpo_backups(&args.path)?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Group Policy administrative helpers: version bumping, link enumeration, backup import."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Increment a GPO's version counter in AD and GPT.INI together.
    BumpVersion(BumpArgs),
    /// List the containers linking a GPO.
    Links(LinkArgs),
    /// Parse a GPO backup repository's manifest.
    ImportBackups(ImportArgs),
}

/// GPO selection by id or by name; the two are mutually exclusive.
#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct GpoSelector {
    /// GPO unique id(s), braced or bare GUID form.
    #[arg(long, num_args = 1..)]
    id: Vec<String>,

    /// GPO display name(s).
    #[arg(long, num_args = 1..)]
    name: Vec<String>,
}

impl GpoSelector {
    fn resolve(&self) -> AppResult<Vec<GpoRef>> {
        if !self.id.is_empty() {
            self.id
                .iter()
                .map(|s| {
                    GpoRef::from_id_str(s).ok_or_else(|| AppError::InvalidIdentifier(s.clone()))
                })
                .collect()
        } else {
            Ok(self.name.iter().cloned().map(GpoRef::Name).collect())
        }
    }
}

#[derive(clap::Args)]
struct BumpArgs {
    #[command(flatten)]
    gpo: GpoSelector,

    /// Which half of the version number to bump: user, computer, or both.
    #[arg(long, default_value = "both")]
    target: VersionTarget,

    /// DNS name of the domain to resolve the GPO in.
    #[arg(long)]
    domain: Option<String>,

    /// Directory server to use instead of discovering one.
    #[arg(long)]
    server: Option<String>,

    /// Report the intended change without applying it.
    #[arg(long)]
    what_if: bool,
}

#[derive(clap::Args)]
struct LinkArgs {
    #[command(flatten)]
    gpo: GpoSelector,

    /// Search scope.
    #[arg(long, value_enum, default_value_t = ScopeArg::Domain)]
    scope: ScopeArg,

    /// Search a single container by DN (overrides --scope).
    #[arg(long)]
    target_dn: Option<String>,

    /// DNS name of the domain to resolve the GPO in.
    #[arg(long)]
    domain: Option<String>,

    /// Directory server to use instead of discovering one.
    #[arg(long)]
    server: Option<String>,
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Backup repository directory, or the manifest file itself.
    path: PathBuf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ScopeArg {
    Domain,
    AllSites,
    EntireForest,
}
