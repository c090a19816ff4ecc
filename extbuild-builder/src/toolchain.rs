//! Command lines for the two compiler backends.

use crate::config::{BuildEnv, require_dir};
use camino::Utf8Path;
use extbuild_process::CommandSpec;
use extbuild_types::{BuildMode, BuildResult, PlatformDescriptor, PlatformFamily};

/// Scripted build: `scons --directory=Code -j<n> [-c] [RELEASE=yes] all ...`.
pub fn scons_command(
    desc: &PlatformDescriptor,
    root: &Utf8Path,
    mode: BuildMode,
    env: &BuildEnv,
    clean: bool,
    concurrency: u32,
) -> CommandSpec {
    let program = match desc.family {
        PlatformFamily::Windows => "scons.bat",
        PlatformFamily::Unix => "scons",
    };
    let mut cmd = CommandSpec::new(program)
        .arg("--directory=Code")
        .arg(format!("-j{concurrency}"));
    if clean {
        cmd = cmd.arg("-c");
    }
    if !mode.is_debug() {
        cmd = cmd.arg("RELEASE=yes");
    }
    cmd = cmd.arg("all");
    if let Some(bits) = desc.bits {
        cmd = cmd.arg(format!("BITS={bits}"));
        if mode.is_debug() {
            cmd = cmd.arg("SDKDEBUG=YES");
        }
    }
    cmd.cwd(root).envs(env)
}

/// Project-file build through `msbuild.exe` in `msbuild_dir`.
///
/// Fails with a configuration error if `msbuild_dir` does not exist.
pub fn msbuild_command(
    desc: &PlatformDescriptor,
    root: &Utf8Path,
    msbuild_dir: &Utf8Path,
    mode: BuildMode,
    env: &BuildEnv,
    clean: bool,
    concurrency: u32,
) -> BuildResult<CommandSpec> {
    require_dir(msbuild_dir, "MSBuild directory")?;

    let configuration = if mode.is_debug() { "Debug" } else { "Release" };
    let mut cmd = CommandSpec::new(msbuild_dir.join("msbuild.exe").into_string())
        .arg(root.join("Code").join("Spectral.sln").into_string());
    if clean {
        cmd = cmd.arg("/target:clean");
    }
    Ok(cmd
        .arg(format!("/m:{concurrency}"))
        .arg(format!("/p:Platform={}", desc.tag))
        .arg(format!("/p:Configuration={configuration}"))
        .cwd(root)
        .envs(env))
}
