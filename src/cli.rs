use anyhow::{Context, Result, anyhow};
use glam::Vec2;
use log::info;
use pico_args::Arguments;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use xrgesture::{GestureEngine, GestureKind, Profile, TraceProvider, parse_trace, replay};

use crate::profiles::ProfileStore;

const REPLAY_USAGE: &str =
    "usage: xrgesture replay <trace.jsonl> [--profile NAME] [--screen-mm W,H] [--only a,b]";

/// Plane size used when `--screen-mm` is not given.
const DEFAULT_SCREEN_MM: Vec2 = Vec2::new(320.0, 180.0);

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("replay") => {
            let profile_name: Option<String> = pargs.opt_value_from_str("--profile")?;
            let screen: Option<String> = pargs.opt_value_from_str("--screen-mm")?;
            let only: Option<String> = pargs.opt_value_from_str("--only")?;
            let path: PathBuf = pargs.free_from_str().map_err(|_| anyhow!(REPLAY_USAGE))?;

            let store = ProfileStore::load_or_install_default()?;
            let profile = match profile_name {
                Some(name) => store.load(&name)?,
                None => store.load_active()?,
            };
            let screen = match screen {
                Some(s) => parse_screen(&s)?,
                None => DEFAULT_SCREEN_MM,
            };
            let kinds = match only {
                Some(list) => parse_kinds(&list)?,
                None => GestureKind::ALL.to_vec(),
            };
            replay_file(&path, profile, screen, &kinds)
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: xrgesture use <profile_name>"))?;
            let mut store = ProfileStore::load_or_install_default()?;
            store.set_active(&name)?;
            println!("ok: active profile is now {name}");
            Ok(())
        }

        Some("list") => {
            let store = ProfileStore::load_or_install_default()?;
            for name in store.list_profiles() {
                let mark = if name == store.active_name { '*' } else { ' ' };
                println!("{mark} {name}");
            }
            Ok(())
        }

        Some("show") => {
            let name: Option<String> = pargs.free_from_str().ok();
            let store = ProfileStore::load_or_install_default()?;
            let profile = match name {
                Some(n) => store.load(&n)?,
                None => store.load_active()?,
            };
            println!("{}", serde_json::to_string_pretty(&profile)?);
            Ok(())
        }

        Some("check") => {
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: xrgesture check <profile.toml>"))?;
            let profile = Profile::load(&path)?;
            println!(
                "ok: {} is a valid profile ({})",
                path.display(),
                profile.meta.name.as_deref().unwrap_or("unnamed")
            );
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn replay_file(
    path: &Path,
    profile: Profile,
    screen: Vec2,
    kinds: &[GestureKind],
) -> Result<()> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let frames = parse_trace(&text)?;
    let mut engine = GestureEngine::new(TraceProvider::new(screen), profile)?;
    for &kind in kinds {
        engine.on(kind, |ev| {
            println!("{}", serde_json::to_string(ev)?);
            Ok(())
        });
    }
    let published = replay(&mut engine, &frames)?;
    info!("replayed {} frames, {published} events", frames.len());
    Ok(())
}

fn parse_screen(s: &str) -> Result<Vec2> {
    let (w, h) = s
        .split_once(',')
        .ok_or_else(|| anyhow!("--screen-mm expects W,H (got {s})"))?;
    let w: f32 = w.trim().parse().map_err(|e| anyhow!("bad width '{w}': {e}"))?;
    let h: f32 = h.trim().parse().map_err(|e| anyhow!("bad height '{h}': {e}"))?;
    Ok(Vec2::new(w, h))
}

fn parse_kinds(list: &str) -> Result<Vec<GestureKind>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<GestureKind>().map_err(Into::into))
        .collect()
}

fn print_help() {
    println!(
        r#"xrgesture - two-handed XR controller gesture recognition

USAGE:
  xrgesture help [command]                Show general or command-specific help
  xrgesture replay <trace.jsonl> [opts]   Run a recorded pose trace, print events as JSON lines
  xrgesture list                          List profiles
  xrgesture use <name>                    Switch active profile
  xrgesture show [name]                   Print a profile (active by default) as JSON
  xrgesture check <file.toml>             Validate a profile file

TIPS:
  - Profiles: ~/.config/xrgesture/profiles
  - Active profile pointer: ~/.config/xrgesture/active
  - Set RUST_LOG=debug to see gesture starts, ends and cooldowns
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "replay" => println!(
            "{REPLAY_USAGE}\n\
             Feeds every frame of the trace to a fresh engine and prints each event.\n\
             --screen-mm defaults to 320,180; --only limits output to the named gestures."
        ),
        "list" => {
            println!("usage: xrgesture list\nLists available profiles; marks active with '*'.")
        }
        "use" => println!("usage: xrgesture use <name>\nSwitches the active profile to <name>."),
        "show" => println!(
            "usage: xrgesture show [name]\nPrints the profile with every default filled in."
        ),
        "check" => {
            println!("usage: xrgesture check <file.toml>\nParses and validates a profile file.")
        }
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}
