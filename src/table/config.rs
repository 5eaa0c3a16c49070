//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::constants;
use crate::game::entities::{Chips, RoundSettings};

/// Table speed variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSpeed {
    Normal,
    Turbo,
    Hyper,
}

impl std::fmt::Display for TableSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableSpeed::Normal => write!(f, "normal"),
            TableSpeed::Turbo => write!(f, "turbo"),
            TableSpeed::Hyper => write!(f, "hyper"),
        }
    }
}

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Maximum number of players per round
    pub max_players: usize,

    /// Forced contribution collected at round start
    pub ante: Chips,

    /// Whether re-raising an existing raise is allowed
    pub reraise_allowed: bool,

    /// Cap on raises within one betting phase
    pub max_raises_per_phase: u8,

    /// Table speed
    pub speed: TableSpeed,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Default Table".to_string(),
            max_players: constants::MAX_PLAYERS,
            ante: constants::DEFAULT_ANTE,
            reraise_allowed: true,
            max_raises_per_phase: constants::DEFAULT_MAX_RAISES_PER_PHASE,
            speed: TableSpeed::Normal,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.ante == 0 {
            return Err("Ante must be positive".to_string());
        }

        if self.max_players < constants::MIN_PLAYERS || self.max_players > constants::MAX_PLAYERS {
            return Err(format!(
                "Max players must be between {} and {}",
                constants::MIN_PLAYERS,
                constants::MAX_PLAYERS
            ));
        }

        if self.max_raises_per_phase == 0 {
            return Err("At least one raise per phase must be allowed".to_string());
        }

        Ok(())
    }

    /// Get action timeout based on table speed
    pub fn action_timeout_secs(&self) -> u64 {
        match self.speed {
            TableSpeed::Normal => constants::DEFAULT_ACTION_TIMEOUT_SECS,
            TableSpeed::Turbo => 15,
            TableSpeed::Hyper => 5,
        }
    }

    /// Get answer timeout based on table speed
    pub fn answer_timeout_secs(&self) -> u64 {
        match self.speed {
            TableSpeed::Normal => constants::DEFAULT_ANSWER_TIMEOUT_SECS,
            TableSpeed::Turbo => 20,
            TableSpeed::Hyper => 8,
        }
    }

    /// Get warning lead based on table speed
    pub fn warning_lead_secs(&self) -> u64 {
        match self.speed {
            TableSpeed::Normal => constants::DEFAULT_WARNING_LEAD_SECS,
            TableSpeed::Turbo => 5,
            TableSpeed::Hyper => 2,
        }
    }

    /// The per-round settings this table plays with
    pub fn round_settings(&self) -> RoundSettings {
        RoundSettings {
            ante: self.ante,
            reraise_allowed: self.reraise_allowed,
            max_raises_per_phase: self.max_raises_per_phase,
            action_timeout: Duration::from_secs(self.action_timeout_secs()),
            answer_timeout: Duration::from_secs(self.answer_timeout_secs()),
            warning_lead: Duration::from_secs(self.warning_lead_secs()),
        }
    }
}
