use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use synth_player_deploy::targets::{self, Target, DEFAULT_TARGET};
use synth_player_deploy::DeployContext;

fn usage() -> &'static str {
    "Usage:\n  synth-player-deploy [--device <path>] [all|upload|requirements]\n  synth-player-deploy check <sd_root>\n\nWithout --device the board is looked for at /media/$USER/CIRCUITPY, then /run/media/$USER/CIRCUITPY."
}

/// What one invocation asks for.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Deploy {
        target: Target,
        device: Option<PathBuf>,
    },
    Check {
        sd_root: PathBuf,
    },
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match parse_command(&args)? {
        Command::Help => {
            println!("{}", usage());
            Ok(())
        }
        Command::Deploy { target, device } => deploy(target, device),
        Command::Check { sd_root } => {
            targets::check(&sd_root)
                .with_context(|| format!("checking SD card at '{}'", sd_root.display()))?;
            Ok(())
        }
    }
}

fn parse_command(args: &[String]) -> Result<Command> {
    let (device, rest) = split_device_flag(args)?;

    match rest.as_slice() {
        [help] if help == "-h" || help == "--help" => Ok(Command::Help),
        [] => Ok(Command::Deploy {
            target: DEFAULT_TARGET,
            device,
        }),
        [check, sd_root] if check == "check" => {
            if device.is_some() {
                bail!("--device does not apply to `check`\n{}", usage());
            }
            Ok(Command::Check {
                sd_root: PathBuf::from(sd_root),
            })
        }
        [target] if target != "check" => Ok(Command::Deploy {
            target: Target::parse(target).with_context(usage)?,
            device,
        }),
        _ => bail!(usage()),
    }
}

fn deploy(target: Target, device: Option<PathBuf>) -> Result<()> {
    let ctx = DeployContext::from_cwd(device)?;
    targets::run(&ctx, target)
}

/// Pull `--device <path>` / `--device=<path>` out of the argument list.
fn split_device_flag(args: &[String]) -> Result<(Option<PathBuf>, Vec<String>)> {
    let mut device = None;
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let value = if arg == "--device" {
            match iter.next() {
                Some(value) => value.clone(),
                None => bail!("--device requires a path\n{}", usage()),
            }
        } else if let Some(value) = arg.strip_prefix("--device=") {
            value.to_string()
        } else {
            rest.push(arg.clone());
            continue;
        };
        if device.is_some() {
            bail!("--device given more than once");
        }
        device = Some(PathBuf::from(value));
    }
    Ok((device, rest))
}
