//! vfs-shell binary
//!
//! Boots a VFS with the bundled backends and runs a small command script
//! against it.
//!
//! ## Usage
//!
//! ```bash
//! # Run the built-in demo script on the default mounts
//! vfs-shell
//!
//! # Custom mounts and script
//! vfs-shell --config mounts.toml script.txt
//!
//! # With VFS tracing
//! RUST_LOG=thor_vfs=debug vfs-shell
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use thor_types::{DirectoryEntries, MountPoints, OpenFlags};
use thor_vfs::vfs::{DefaultBackends, ProcessInfo, ProcessState};
use thor_vfs::{HandleTable, Scheduler, Vfs, VfsConfig};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_SCRIPT: &str = r#"
mounts
mkdir /home
write /home/motd welcome to thor
cat /home/motd
stat /home/motd
ls /
ls /sys
cat /sys/kernel/name
ls /proc/1
cat /proc/1/state
ls /dev
df /
"#;

/// Exercise the Thor VFS from the host.
///
/// Script commands, one per line (`#` starts a comment): `mounts`,
/// `ls <dir>`, `cat <file>`, `write <file> <text>`, `mkdir <dir>`,
/// `rm <path>`, `stat <path>`, `df <mount point>`.
#[derive(Parser, Debug)]
#[command(name = "vfs-shell")]
#[command(about = "Boot a Thor VFS and run a command script against it")]
struct Args {
    /// Boot mounts from a TOML file instead of the built-in ones
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Script to run (default: built-in demo)
    script: Option<PathBuf>,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("vfs-shell failed: {e:#}");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => VfsConfig::load(path)?,
        None => VfsConfig::default(),
    };

    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => DEMO_SCRIPT.to_string(),
    };

    let backends = DefaultBackends::new();
    backends.sys_values().set_constant_value("/kernel/name", "thor");
    backends
        .sys_values()
        .set_constant_value("/kernel/version", env!("CARGO_PKG_VERSION"));
    backends.processes().update_process(ProcessInfo {
        pid: 1,
        ppid: 0,
        name: "vfs-shell".into(),
        state: ProcessState::Running,
        priority: 0,
    });

    let scheduler: Arc<dyn Scheduler> = Arc::new(HandleTable::new());
    let mut vfs = Vfs::with_factory(scheduler, Box::new(backends));
    vfs.init(&config).context("booting vfs")?;

    for line in script.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        println!("> {line}");
        if let Err(e) = execute(&vfs, line) {
            println!("  error: {e:#}");
        }
    }
    Ok(())
}

fn execute(vfs: &Vfs, line: &str) -> Result<()> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "mounts" => {
            let mut buffer = vec![0u8; 4096];
            let written = vfs.mounts(&mut buffer)?;
            for record in MountPoints::new(&buffer[..written]) {
                let record = record?;
                println!("  {} on {} type {}", record.device, record.mount_point, record.fs_type);
            }
        }
        "ls" => {
            let fd = vfs.open(rest, OpenFlags::read())?;
            let mut buffer = vec![0u8; 16 * 1024];
            let result = vfs.entries(fd, &mut buffer);
            vfs.close(fd);
            let written = result?;
            for entry in DirectoryEntries::new(&buffer[..written]) {
                let entry = entry?;
                let marker = if entry.entry_type & thor_types::flags::STAT_FLAG_DIRECTORY != 0 {
                    "/"
                } else {
                    ""
                };
                println!("  {}{marker}", entry.name);
            }
        }
        "cat" => {
            let mut content = String::new();
            vfs.direct_read_to_string(rest, &mut content)?;
            println!("  {content}");
        }
        "write" => {
            let Some((file, text)) = rest.split_once(' ') else {
                bail!("usage: write <file> <text>");
            };
            let fd = vfs.open(file, OpenFlags::create())?;
            let result = vfs
                .truncate(fd, 0)
                .and_then(|()| vfs.write(fd, text.as_bytes(), 0));
            vfs.close(fd);
            println!("  {} bytes", result?);
        }
        "mkdir" => vfs.mkdir(rest)?,
        "rm" => vfs.rm(rest)?,
        "stat" => {
            let fd = vfs.open(rest, OpenFlags::read())?;
            let result = vfs.stat(fd);
            vfs.close(fd);
            let info = result?;
            println!(
                "  size={} directory={} system={} hidden={}",
                info.size,
                info.is_directory(),
                info.is_system(),
                info.is_hidden()
            );
        }
        "df" => {
            let info = vfs.statfs(rest)?;
            println!("  total={} free={}", info.total_size, info.free_size);
        }
        other => bail!("unknown command: {other}"),
    }
    Ok(())
}
