mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use config::{CliOverrides, ConfigMerger};
use extbuild_core::adapters::{
    DryRunRunner, FixedRevisionSource, SvnRevisionSource, SystemClock, SystemRunner,
};
use extbuild_core::ports::{ProcessRunner, RevisionSource};
use extbuild_core::{RunSettings, run_pipeline};
use extbuild_types::{
    BuildError, BuildMode, BuildResult, PLATFORM_MAPPINGS, PlatformId, PlatformKind,
    PlatformRequest, Toolchain, VersionScheme,
};
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "extbuild",
    version,
    about = "Build, version, and package the Spectral extension."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the build pipeline: version update, compile, docs, SDK, installer, prep.
    Build(BuildArgs),
    /// List installer platform short names and identifiers.
    Platforms(PlatformsArgs),
}

#[derive(Debug, Parser)]
struct BuildArgs {
    /// Checkout root (default: current directory).
    #[arg(long, default_value = ".")]
    root: Utf8PathBuf,

    /// Third-party dependency tree.
    #[arg(short = 'd', long, env = "SPECTRALDEPENDENCIES")]
    dependencies: Option<Utf8PathBuf>,

    /// Host application source tree.
    #[arg(long, alias = "opticks-code-dir", env = "OPTICKS_CODE_DIR")]
    host_code_dir: Option<Utf8PathBuf>,

    /// Build mode (debug, release).
    #[arg(short = 'm', long)]
    mode: Option<BuildMode>,

    /// Clean before compiling.
    #[arg(long, default_value_t = false)]
    clean: bool,

    /// Compile the extension plug-ins.
    #[arg(long, default_value_t = false)]
    build_extension: bool,

    /// Stage host plug-ins and runtime files so the extension can be run in place.
    #[arg(long, default_value_t = false)]
    prep: bool,

    /// Build the installer bundle for `all` or a comma list of platforms.
    #[arg(long, value_name = "all|PLATFORMS")]
    build_installer: Option<PlatformRequest>,

    /// Build the SDK archive for `all` or a comma list of platforms.
    #[arg(long, value_name = "all|PLATFORMS")]
    build_sdk: Option<PlatformRequest>,

    /// Installer output path (default: <root>/Installer/AebOutput/Spectral.aeb).
    #[arg(long)]
    aeb_output: Option<Utf8PathBuf>,

    /// Job count passed to the compiler backend.
    #[arg(long)]
    concurrency: Option<u32>,

    /// Generate the API documentation.
    #[arg(long, default_value_t = false)]
    build_doxygen: bool,

    /// Only log warnings and errors.
    #[arg(short, long, default_value_t = false, conflicts_with = "verbose")]
    quiet: bool,

    /// Log stage progress and child environments.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    /// Version scheme (none, unofficial, nightly, milestone, production, rc).
    #[arg(long, value_name = "SCHEME", default_value = "none")]
    update_version: VersionScheme,

    /// Replacement version for milestone, rc, and production.
    #[arg(long)]
    new_version: Option<String>,

    /// Builder target (win32, win64, solaris, linux; default: this host).
    #[arg(long)]
    platform: Option<PlatformKind>,

    /// Windows compiler backend (msbuild, scons).
    #[arg(long)]
    toolchain: Option<Toolchain>,

    /// Directory containing msbuild.exe.
    #[arg(long)]
    msbuild: Option<Utf8PathBuf>,

    /// Unix checkout holding Solaris/Linux output when packaging on Windows.
    #[arg(long)]
    unix_build_dir: Option<Utf8PathBuf>,

    /// Build-revision token for nightly versions instead of querying the working copy.
    #[arg(long)]
    revision: Option<String>,

    /// Log external commands instead of running them.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

impl BuildArgs {
    fn verbosity(&self) -> u8 {
        match (self.quiet, self.verbose) {
            (true, _) => 0,
            (false, true) => 2,
            (false, false) => 1,
        }
    }
}

#[derive(Debug, Parser)]
struct PlatformsArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn real_main() -> BuildResult<()> {
    let cli = Cli::parse();
    let verbosity = match &cli.cmd {
        Command::Build(args) => args.verbosity(),
        Command::Platforms(_) => 1,
    };
    init_tracing(verbosity);

    match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::Platforms(args) => cmd_platforms(args),
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn absolutize(base: &Utf8Path, path: Utf8PathBuf) -> Utf8PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn cmd_build(args: BuildArgs) -> BuildResult<()> {
    let cwd = std::env::current_dir().context("determine current directory")?;
    let cwd = Utf8PathBuf::try_from(cwd).context("current directory is not valid UTF-8")?;
    let verbosity = args.verbosity();
    let root = absolutize(&cwd, args.root);

    let file_config = config::load_or_default(&root)
        .map_err(|e| BuildError::config(format!("{e:#}")))?;
    let merged = ConfigMerger::new(file_config).merge_build_args(
        &root,
        CliOverrides {
            dependencies: args.dependencies.map(|p| absolutize(&cwd, p)),
            host_code_dir: args.host_code_dir.map(|p| absolutize(&cwd, p)),
            msbuild: args.msbuild.map(|p| absolutize(&cwd, p)),
            unix_build_dir: args.unix_build_dir.map(|p| absolutize(&cwd, p)),
            installer_output: args.aeb_output.map(|p| absolutize(&cwd, p)),
            mode: args.mode,
            concurrency: args.concurrency,
            toolchain: args.toolchain,
            platform: args.platform,
        },
    );
    debug!(?merged, "merged configuration");

    let settings = RunSettings {
        root: root.clone(),
        dependencies: merged.dependencies,
        host_code_dir: merged.host_code_dir,
        mode: merged.mode,
        concurrency: merged.concurrency,
        verbosity,
        platform: merged.platform,
        toolchain: merged.toolchain,
        msbuild_dir: merged.msbuild,
        scheme: args.update_version,
        new_version: args.new_version,
        clean: args.clean,
        build_extension: args.build_extension,
        build_doxygen: args.build_doxygen,
        build_sdk: args.build_sdk,
        build_installer: args.build_installer,
        prep: args.prep,
        installer_output: merged.installer_output,
        unix_build_dir: merged.unix_build_dir,
    };

    let runner: Box<dyn ProcessRunner> = if args.dry_run {
        Box::new(DryRunRunner::new())
    } else {
        Box::new(SystemRunner)
    };

    let fixed;
    let svn;
    let revisions: &dyn RevisionSource = match args.revision {
        Some(token) => {
            fixed = FixedRevisionSource::new(Some(token));
            &fixed
        }
        None => {
            // Read-only query, so it runs for real even under --dry-run.
            svn = SvnRevisionSource::new(root, &SystemRunner);
            &svn
        }
    };

    let outcome = run_pipeline(&settings, runner.as_ref(), revisions, &SystemClock)?;
    if let Some(change) = &outcome.version {
        info!(from = %change.previous, to = %change.update.version, "version header updated");
    }
    for package in &outcome.packages {
        println!("{}  {}", package.sha256, package.path);
    }
    Ok(())
}

fn cmd_platforms(args: PlatformsArgs) -> BuildResult<()> {
    match args.format {
        OutputFormat::Text => {
            for (short, id) in PLATFORM_MAPPINGS {
                println!("{short:<14} {id}");
            }
        }
        OutputFormat::Json => {
            let rows = PLATFORM_MAPPINGS
                .iter()
                .map(|(short, id)| -> BuildResult<serde_json::Value> {
                    let parsed: PlatformId = id.parse()?;
                    Ok(serde_json::json!({
                        "name": short,
                        "id": id,
                        "platform": parsed.kind().as_str(),
                        "mode": parsed.mode().as_str(),
                    }))
                })
                .collect::<BuildResult<Vec<_>>>()?;
            let text = serde_json::to_string_pretty(&rows).context("serialize platform list")?;
            println!("{text}");
        }
    }
    Ok(())
}
