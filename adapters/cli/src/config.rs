//! Optional `train-mania.toml` configuration.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;
use train_mania_core::{Stage, StageId, DEFAULT_STAGES};
use train_mania_system_round::Config as RoundConfig;

/// File picked up from the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "train-mania.toml";

const SUPPORTED_CONFIG_VERSION: u32 = 1;

/// Resolved settings for a play session.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    /// Countdown length and timer cadences.
    pub(crate) round: RoundConfig,
    /// Stage table cycled through by `next`.
    pub(crate) stages: Vec<Stage>,
    /// Leaderboard file, when the configuration names one.
    pub(crate) leaderboard: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            round: RoundConfig::default(),
            stages: DEFAULT_STAGES.to_vec(),
            leaderboard: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    round: RoundSection,
    #[serde(default)]
    leaderboard: Option<PathBuf>,
    #[serde(default)]
    stages: Vec<StageSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoundSection {
    countdown_seconds: Option<u32>,
    countdown_period_ms: Option<u64>,
    train_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StageSection {
    id: u32,
    size: u32,
    target_score: u32,
}

const fn default_version() -> u32 {
    SUPPORTED_CONFIG_VERSION
}

/// Loads settings from `explicit`, or from [`DEFAULT_CONFIG_FILE`] when it exists.
pub(crate) fn load(explicit: Option<&Path>) -> Result<Settings> {
    if let Some(path) = explicit {
        return read(path);
    }
    let fallback = Path::new(DEFAULT_CONFIG_FILE);
    if fallback.exists() {
        read(fallback)
    } else {
        debug!("no configuration file found, using defaults");
        Ok(Settings::default())
    }
}

fn read(path: &Path) -> Result<Settings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    let settings = parse(&contents)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;
    debug!(path = %path.display(), stages = settings.stages.len(), "configuration loaded");
    Ok(settings)
}

/// Parses configuration text, filling omitted values with defaults.
pub(crate) fn parse(contents: &str) -> Result<Settings> {
    let file: ConfigFile =
        toml::from_str(contents).context("failed to parse configuration toml contents")?;
    if file.version != SUPPORTED_CONFIG_VERSION {
        bail!(
            "unsupported configuration version {}; expected {}",
            file.version,
            SUPPORTED_CONFIG_VERSION
        );
    }

    let defaults = RoundConfig::default();
    let countdown_period = match file.round.countdown_period_ms {
        Some(0) => bail!("round.countdown_period_ms must be positive"),
        Some(millis) => Duration::from_millis(millis),
        None => defaults.countdown_period(),
    };
    let train_interval = match file.round.train_interval_ms {
        Some(0) => bail!("round.train_interval_ms must be positive"),
        Some(millis) => Duration::from_millis(millis),
        None => defaults.train_interval(),
    };
    let round = RoundConfig::new(
        file.round
            .countdown_seconds
            .unwrap_or(defaults.countdown_seconds()),
        countdown_period,
        train_interval,
    );

    let stages = if file.stages.is_empty() {
        DEFAULT_STAGES.to_vec()
    } else {
        let mut seen = HashSet::new();
        let mut stages = Vec::with_capacity(file.stages.len());
        for section in file.stages {
            if section.size < 2 {
                bail!(
                    "stage {} has size {}; grids need at least 2x2 cells",
                    section.id,
                    section.size
                );
            }
            if !seen.insert(section.id) {
                bail!("stage {} is configured more than once", section.id);
            }
            stages.push(Stage::new(
                StageId::new(section.id),
                section.size,
                section.target_score,
            ));
        }
        stages
    };

    Ok(Settings {
        round,
        stages,
        leaderboard: file.leaderboard,
    })
}
