//! `hamclock-shim`: maintenance tool for the HamClock host layer.
//!
//! ```text
//! hamclock-shim [-d DIR] [--config FILE] [-v] nvdump
//! hamclock-shim [-d DIR] [--config FILE] [-v] nvreset NAME
//! hamclock-shim [--config FILE] [-v] probe HOST PORT
//! ```
//!
//! `-d` selects the config directory exactly as it does for HamClock
//! itself, so the tool can inspect one instance among several.
#![deny(unused_must_use)]

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use log::{LevelFilter, info};

use hamclock_shim::fatal::OrFatal;
use hamclock_shim::nvram::{ColorTable, NV_LAYOUT};
use hamclock_shim::{DebugLevels, NvName, NvStore, ShimConfig, WifiClient};

const USAGE: &str = "usage: hamclock-shim [-d DIR] [--config FILE] [-v] \
                     (nvdump | nvreset NAME | probe HOST PORT)";

struct Cli {
    cfg: ShimConfig,
    verbose: bool,
    command: Vec<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Cli> {
    let mut cfg = ShimConfig::default();
    let mut dir: Option<PathBuf> = None;
    let mut verbose = false;
    let mut command = Vec::new();

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-d" => dir = Some(args.next().context("-d needs a directory")?.into()),
            "--config" => {
                let path = args.next().context("--config needs a file")?;
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {path}"))?;
                cfg = ShimConfig::from_json(&text)?;
            }
            "-v" => verbose = true,
            _ => command.push(arg),
        }
    }

    cfg.apply_env();
    if dir.is_some() {
        cfg.config_dir = dir;
    }
    Ok(Cli {
        cfg,
        verbose,
        command,
    })
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

fn nvdump(cfg: &ShimConfig, debug: DebugLevels) {
    let store = NvStore::open(cfg, debug).or_fatal("cannot open settings");
    for name in NvName::all() {
        let shown = match store.read_named(name, 0).or_fatal("nvdump") {
            Some(bytes) => hex(&bytes),
            None => "-".to_string(),
        };
        println!(
            "{:<14} {:>5} {:>3}  {}",
            format!("{name:?}"),
            NV_LAYOUT.offset(name),
            name.size(),
            shown
        );
    }
    for table in [ColorTable::A, ColorTable::B] {
        let state = match store.read_color_table(table).or_fatal("nvdump") {
            Some(_) => "set",
            None => "-",
        };
        println!("ColorTable{:?}    {}", table, state);
    }
}

fn nvreset(cfg: &ShimConfig, debug: DebugLevels, label: &str) -> Result<()> {
    let Some(name) = NvName::from_label(label) else {
        bail!("unknown setting {label}");
    };
    let mut store = NvStore::open(cfg, debug).or_fatal("cannot open settings");
    store.erase_named(name).or_fatal("cannot save settings");
    info!("{:?} reset to default", name);
    Ok(())
}

fn probe(cfg: &ShimConfig, debug: DebugLevels, host: &str, port: &str) -> Result<()> {
    let port: u16 = port.parse().with_context(|| format!("bad port {port}"))?;
    let mut client = WifiClient::from_config(cfg, debug);
    if !client.connect(host, port) {
        bail!("cannot connect to {host}:{port}");
    }
    match client.remote_ip() {
        Some(ip) => println!("connected to {host}:{port} ({ip})"),
        None => println!("connected to {host}:{port}"),
    }
    client.stop();
    Ok(())
}

fn main() -> Result<()> {
    let cli = parse_args(std::env::args().skip(1))?;
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();
    cli.cfg.validate()?;
    let debug = DebugLevels::from_config(&cli.cfg);

    let command: Vec<&str> = cli.command.iter().map(String::as_str).collect();
    match command.as_slice() {
        ["nvdump"] => {
            nvdump(&cli.cfg, debug);
            Ok(())
        }
        ["nvreset", name] => nvreset(&cli.cfg, debug, name),
        ["probe", host, port] => probe(&cli.cfg, debug, host, port),
        _ => bail!(USAGE),
    }
}
