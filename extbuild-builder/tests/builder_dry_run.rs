//! Builder behaviour against a recording runner.

use camino::Utf8PathBuf;
use extbuild_builder::{Builder, BuilderConfig, PlatformBuilder};
use extbuild_process::DryRunRunner;
use extbuild_types::{BuildError, BuildMode, PlatformKind, Toolchain};
use pretty_assertions::assert_eq;
use std::io;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

struct Checkout {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl Checkout {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        for dir in ["src/Code/Include", "src/Code/ApiDocs", "deps", "host/Build"] {
            std::fs::create_dir_all(root.join(dir)).unwrap();
        }
        std::fs::write(
            root.join("src/Code/Include/SpectralVersion.h"),
            "#define SPECTRAL_VERSION_NUMBER \"4.3.1\"\n",
        )
        .unwrap();
        Self { _temp: temp, root }
    }

    fn config(&self, mode: BuildMode) -> BuilderConfig {
        let mut cfg = BuilderConfig::new(
            self.root.join("src"),
            self.root.join("deps"),
            self.root.join("host"),
        );
        cfg.mode = mode;
        cfg
    }

    fn touch(&self, rel: &str) {
        let path = self.root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }
}

fn env_of<'a>(cmd: &'a extbuild_process::CommandSpec, key: &str) -> Option<&'a str> {
    cmd.env.get(key).map(String::as_str)
}

/// Formatted log output shared with the subscriber's writer.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn info_logs_of(run: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, run);
    let bytes = buffer.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn build_executable_cleans_then_builds_with_env_overlay() {
    let co = Checkout::new();
    let runner = DryRunRunner::new();
    let builder = PlatformBuilder::new(PlatformKind::Linux, co.config(BuildMode::Release), &runner);

    builder.build_executable(true, 3).unwrap();

    let recorded = runner.recorded();
    assert_eq!(recorded.len(), 2);
    assert!(recorded[0].args.contains(&"-c".to_string()));
    assert!(!recorded[1].args.contains(&"-c".to_string()));
    for cmd in &recorded {
        assert_eq!(cmd.program, "scons");
        assert!(cmd.args.contains(&"-j3".to_string()));
        assert_eq!(
            env_of(cmd, "SPECTRALDEPENDENCIES"),
            Some(co.root.join("deps").as_str())
        );
        assert_eq!(
            env_of(cmd, "OPTICKS_CODE_DIR"),
            Some(co.root.join("host").as_str())
        );
    }
}

#[test]
fn compile_failure_stops_before_the_real_build() {
    let co = Checkout::new();
    let runner = DryRunRunner::with_status(2);
    let builder = PlatformBuilder::new(PlatformKind::Linux, co.config(BuildMode::Release), &runner);

    let err = builder.build_executable(true, 1).unwrap_err();
    assert!(matches!(err, BuildError::ToolFailed { ref tool, status: 2 } if tool == "scons"));
    assert_eq!(runner.recorded().len(), 1);
}

#[test]
fn msbuild_without_installation_fails_before_spawning() {
    let co = Checkout::new();
    let runner = DryRunRunner::new();
    let mut cfg = co.config(BuildMode::Debug);
    cfg.toolchain = Toolchain::MsBuild;
    cfg.msbuild_dir = Some(co.root.join("no-msbuild"));
    let builder = PlatformBuilder::new(PlatformKind::Win64, cfg, &runner);

    assert!(builder.build_executable(false, 1).unwrap_err().is_config());
    assert!(runner.recorded().is_empty());
}

#[test]
fn windows_scons_backend_is_selectable() {
    let co = Checkout::new();
    let runner = DryRunRunner::new();
    let mut cfg = co.config(BuildMode::Debug);
    cfg.toolchain = Toolchain::Scons;
    let builder = PlatformBuilder::new(PlatformKind::Win32, cfg, &runner);

    builder.build_executable(false, 1).unwrap();
    let recorded = runner.recorded();
    let cmd = &recorded[0];
    assert_eq!(cmd.program, "scons.bat");
    assert!(cmd.args.ends_with(&["all", "BITS=32", "SDKDEBUG=YES"].map(String::from)));
}

#[test]
fn path_accessors_follow_tag_and_mode() {
    let co = Checkout::new();
    let runner = DryRunRunner::new();
    let builder = PlatformBuilder::new(PlatformKind::Win64, co.config(BuildMode::Debug), &runner);

    assert_eq!(
        builder.binaries_dir(),
        co.root.join("src/Code/Build/Binaries-x64-debug")
    );
    assert_eq!(
        builder.plugin_dir(),
        co.root.join("host/Build/Binaries-x64-debug/PlugIns")
    );
}

#[test]
fn doxygen_location_falls_back_between_installs() {
    let co = Checkout::new();
    let runner = DryRunRunner::new();
    let builder = PlatformBuilder::new(PlatformKind::Win32, co.config(BuildMode::Release), &runner);

    // Neither install present: the last candidate.
    assert_eq!(
        builder.doxygen_path(),
        co.root.join("deps/64/bin/doxygen.exe")
    );
    co.touch("deps/32/bin/doxygen.exe");
    assert_eq!(
        builder.doxygen_path(),
        co.root.join("deps/32/bin/doxygen.exe")
    );

    let linux = PlatformBuilder::new(PlatformKind::Linux, co.config(BuildMode::Release), &runner);
    assert_eq!(linux.doxygen_path().as_str(), "/usr/bin/doxygen");
}

#[test]
fn build_doxygen_resets_output_and_passes_env() {
    let co = Checkout::new();
    co.touch("src/Code/Build/DoxygenOutput/stale.html");
    co.touch("deps/32/tools/graphviz/bin/dot");
    co.touch("deps/64/bin/doxygen");
    let runner = DryRunRunner::new();
    let builder = PlatformBuilder::new(PlatformKind::Solaris, co.config(BuildMode::Release), &runner);

    builder.build_doxygen().unwrap();

    let output = co.root.join("src/Code/Build/DoxygenOutput");
    assert!(output.is_dir());
    assert!(!output.join("stale.html").exists());

    let recorded = runner.recorded();
    assert_eq!(recorded.len(), 1);
    let cmd = &recorded[0];
    assert_eq!(cmd.program, co.root.join("deps/64/bin/doxygen").as_str());
    assert_eq!(
        cmd.args,
        vec![co.root.join("src/Code/ApiDocs/application.dox").to_string()]
    );
    assert_eq!(env_of(cmd, "VERSION"), Some("4.3.1"));
    assert_eq!(env_of(cmd, "SOURCE"), Some(co.root.join("src/Code").as_str()));
    assert_eq!(env_of(cmd, "OUTPUT_DIR"), Some(output.as_str()));
    assert_eq!(
        env_of(cmd, "CONFIG_DIR"),
        Some(co.root.join("src/Code/ApiDocs").as_str())
    );
    assert_eq!(
        env_of(cmd, "DOT_DIR"),
        Some(co.root.join("deps/32/tools/graphviz/bin").as_str())
    );
}

#[test]
fn doxygen_failure_is_reported() {
    let co = Checkout::new();
    co.touch("deps/64/bin/doxygen");
    let runner = DryRunRunner::with_status(1);
    let builder = PlatformBuilder::new(PlatformKind::Solaris, co.config(BuildMode::Release), &runner);
    let err = builder.build_doxygen().unwrap_err();
    assert!(matches!(err, BuildError::ToolFailed { ref tool, .. } if tool == "doxygen"));
}

#[test]
fn missing_doxygen_is_a_config_error_naming_the_searched_paths() {
    let co = Checkout::new();
    co.touch("src/Code/Build/DoxygenOutput/kept.html");
    let runner = DryRunRunner::new();
    let builder = PlatformBuilder::new(PlatformKind::Win64, co.config(BuildMode::Release), &runner);

    let err = builder.build_doxygen().unwrap_err();

    assert!(err.is_config());
    assert_eq!(err.exit_code(), 2);
    let message = err.to_string();
    assert!(message.contains(co.root.join("deps/32/bin/doxygen.exe").as_str()), "{message}");
    assert!(message.contains(co.root.join("deps/64/bin/doxygen.exe").as_str()), "{message}");
    assert!(runner.recorded().is_empty());
    assert!(co.root.join("src/Code/Build/DoxygenOutput/kept.html").exists());
}

#[test]
fn prep_to_run_uses_host_plugin_dir() {
    let co = Checkout::new();
    co.touch("host/Build/Binaries-linux-x86_64-release/PlugIns/Core.so");
    co.touch("host/Build/Binaries-linux-x86_64-release/PlugIns/Core.debug");
    let runner = DryRunRunner::new();
    let builder = PlatformBuilder::new(PlatformKind::Linux, co.config(BuildMode::Release), &runner);

    let report = builder.prep_to_run().unwrap();
    assert_eq!(report.plugins_copied, 1);
    assert!(report.descriptor_written);
    assert!(builder.binaries_dir().join("PlugIns/Core.so").is_file());
    assert!(builder.binaries_dir().join("Bin/spectral.dep").is_file());
    assert!(co.root.join("src/Code/Build/ApplicationUserSettings").is_dir());
    assert!(runner.recorded().is_empty());
}

#[test]
fn compiler_environment_is_logged_only_when_verbose() {
    let co = Checkout::new();
    let runner = DryRunRunner::new();

    let normal = PlatformBuilder::new(PlatformKind::Linux, co.config(BuildMode::Release), &runner);
    let logs = info_logs_of(|| normal.build_executable(false, 1).unwrap());
    assert!(logs.contains("building plug-ins"), "{logs}");
    assert!(!logs.contains("SPECTRALDEPENDENCIES"), "{logs}");

    let mut cfg = co.config(BuildMode::Release);
    cfg.verbosity = 2;
    let verbose = PlatformBuilder::new(PlatformKind::Linux, cfg, &runner);
    let logs = info_logs_of(|| verbose.build_executable(false, 1).unwrap());
    assert!(logs.contains("compiler environment"), "{logs}");
    assert!(logs.contains("SPECTRALDEPENDENCIES"), "{logs}");
}
