use crate::{
    game::Timings,
    storage::HISTORY_KEY,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use std::path::{
    Path,
    PathBuf,
};

pub const APP_DIR: &str = "coin-flip";
pub const DEFAULT_LOG_DIR: &str = "logs";
const QUICK_FACTOR: u32 = 4;

pub const USAGE: &str = r#"Usage: coin-flip [--history-file <path> | --no-persist] [--seed <u64>]
                 [--log-dir <path>] [--quick]

Flags:
  --history-file <path>  Where to keep flip history
                         (default: $XDG_DATA_HOME/coin-flip/coinFlipHistory.json)
  --no-persist           Keep history in memory for this session only
  --seed <u64>           Use a reproducible coin
  --log-dir <path>       Directory for log files (default: ./logs)
  --quick                Run the flip animation four times faster
  -h, --help             Show this message

Keys:
  h / t                  Pick heads / tails when nothing is picked yet
  ← / →                  Pick heads / tails
  space, enter           Flip
  tab                    Show or hide history
  c                      Clear history (asks first)
  esc                    Close history, or quit when it is closed
  q                      Quit (asks first)
  any key                Close the win/lose banner"#;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StorageTarget {
    File(PathBuf),
    Memory,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AppConfig {
    pub storage: StorageTarget,
    pub seed: Option<u64>,
    pub log_dir: PathBuf,
    pub timings: Timings,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Run(AppConfig),
    Help,
}

/// `$XDG_DATA_HOME/coin-flip`, else `~/.local/share/coin-flip`, else the
/// current directory.
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("XDG_DATA_HOME").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir).join(APP_DIR);
    }
    if let Some(home) = std::env::var_os("HOME").filter(|h| !h.is_empty()) {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }
    PathBuf::from(".")
}

pub fn default_history_file() -> PathBuf {
    default_data_dir().join(format!("{HISTORY_KEY}.json"))
}

pub fn resolve_path(raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    PathBuf::from(expanded.into_owned())
}

/// Parses everything after the program name.
pub fn parse_args<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut history_file: Option<PathBuf> = None;
    let mut no_persist = false;
    let mut seed: Option<u64> = None;
    let mut log_dir: Option<PathBuf> = None;
    let mut quick = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--history-file" => {
                let path = args
                    .next()
                    .ok_or_else(|| eyre!("--history-file requires a path argument"))?;
                if history_file.is_some() {
                    return Err(eyre!("--history-file may only be specified once"));
                }
                history_file = Some(resolve_path(&path));
            }
            "--no-persist" => {
                if no_persist {
                    return Err(eyre!("--no-persist may only be specified once"));
                }
                no_persist = true;
            }
            "--seed" => {
                let raw = args
                    .next()
                    .ok_or_else(|| eyre!("--seed requires a number argument"))?;
                if seed.is_some() {
                    return Err(eyre!("--seed may only be specified once"));
                }
                let parsed = raw
                    .parse::<u64>()
                    .map_err(|e| eyre!("--seed expects an unsigned integer, got {raw:?}: {e}"))?;
                seed = Some(parsed);
            }
            "--log-dir" => {
                let path = args
                    .next()
                    .ok_or_else(|| eyre!("--log-dir requires a path argument"))?;
                if log_dir.is_some() {
                    return Err(eyre!("--log-dir may only be specified once"));
                }
                log_dir = Some(resolve_path(&path));
            }
            "--quick" => {
                if quick {
                    return Err(eyre!("--quick may only be specified once"));
                }
                quick = true;
            }
            "--help" | "-h" => return Ok(Command::Help),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let storage = match (history_file, no_persist) {
        (Some(_), true) => {
            return Err(eyre!("--history-file and --no-persist can't be combined"));
        }
        (Some(path), false) => StorageTarget::File(path),
        (None, true) => StorageTarget::Memory,
        (None, false) => StorageTarget::File(default_history_file()),
    };
    let timings = if quick {
        Timings::default().divided_by(QUICK_FACTOR)
    } else {
        Timings::default()
    };

    Ok(Command::Run(AppConfig {
        storage,
        seed,
        log_dir: log_dir.unwrap_or_else(|| Path::new(DEFAULT_LOG_DIR).to_path_buf()),
        timings,
    }))
}
