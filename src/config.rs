// Configuration module for reading Snake.toml
// Every tunable of the decision engine lives here so behaviour can change without touching the algorithms

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::types::Direction;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub search: SearchConfig,
    pub scores: ScoresConfig,
    pub food: FoodConfig,
    pub cache: CacheConfig,
    pub game_rules: GameRulesConfig,
    pub emergency: EmergencyConfig,
    pub debug: DebugConfig,
    pub appearance: AppearanceConfig,
}

/// Timing and iterative deepening limits
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub response_time_budget_ms: u64,
    pub network_overhead_ms: u64,
    pub polling_interval_ms: u64,
    pub initial_depth: u8,
    pub max_search_depth: u8,
    pub min_time_remaining_ms: u64,
}

impl TimingConfig {
    /// Computes the effective computation budget
    pub fn effective_budget_ms(&self) -> u64 {
        self.response_time_budget_ms.saturating_sub(self.network_overhead_ms)
    }
}

/// Adversarial lookahead constants
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Only enemies whose head is within this Manhattan distance get a reply ply
    pub threat_radius: i32,
    /// Value of a line where we are eliminated; later deaths score slightly higher
    pub loss_score: f64,
    pub loss_delay_bonus: f64,
    /// Leaf bonus per enemy eliminated along the line
    pub kill_bonus: f64,
    /// Leaf bonus per segment grown along the line while food is sought
    pub growth_bonus: f64,
}

/// Weights of the heuristic terms
#[derive(Debug, Deserialize, Clone)]
pub struct ScoresConfig {
    // Escape routes
    pub weight_escape_route: f64,

    // Space control
    pub weight_space: f64,
    pub space_comfort_multiplier: f64,
    pub space_comfort_bonus: f64,
    pub space_shortage_penalty: f64,

    // Food approach
    pub weight_food: f64,

    // Trapping
    pub trap_bonus: f64,
    pub trap_max_escape_moves: usize,

    // Deception
    pub deception_bonus: f64,
    pub deception_min_own_neighbors: usize,
    pub bait_bonus: f64,

    // Aggression
    pub aggression_bonus: f64,
    pub aggression_penalty: f64,
    pub min_aggression_health: i32,

    // Center control
    pub weight_center: f64,
}

/// Food seeking thresholds and urgency multipliers
#[derive(Debug, Deserialize, Clone)]
pub struct FoodConfig {
    pub critical_health_threshold: i32,
    pub low_health_threshold: i32,
    pub mid_health_threshold: i32,
    pub target_length: usize,
    /// A longer enemy head within this distance suppresses food seeking
    pub danger_radius: i32,
    /// Nearest foods (by Manhattan distance) that get a verified path search
    pub max_food_candidates: usize,
    pub balanced_multiplier: f64,
    pub urgent_multiplier: f64,
    pub critical_multiplier: f64,
}

/// Reachable-space memo lifecycle
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_turns: i32,
    pub idle_game_ttl_secs: u64,
    pub sweep_interval_ms: u64,
    pub max_entries: usize,
}

/// Game rules constants
#[derive(Debug, Deserialize, Clone)]
pub struct GameRulesConfig {
    pub max_health: i32,
}

/// Last-resort behaviour when no move passes the safety filter
#[derive(Debug, Deserialize, Clone)]
pub struct EmergencyConfig {
    pub default_direction: String,
}

impl EmergencyConfig {
    pub fn default_move(&self) -> Direction {
        Direction::parse(&self.default_direction).unwrap_or(Direction::Up)
    }
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

/// Snake customization returned from GET /
#[derive(Debug, Deserialize, Clone)]
pub struct AppearanceConfig {
    pub author: String,
    pub color: String,
    pub head: String,
    pub tail: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Snake.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Snake.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Snake.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Snake.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                response_time_budget_ms: 400,
                network_overhead_ms: 50,
                polling_interval_ms: 10,
                initial_depth: 1,
                max_search_depth: 4,
                min_time_remaining_ms: 15,
            },
            search: SearchConfig {
                threat_radius: 6,
                loss_score: -1_000_000.0,
                loss_delay_bonus: 1_000.0,
                kill_bonus: 3_000.0,
                growth_bonus: 500.0,
            },
            scores: ScoresConfig {
                weight_escape_route: 120.0,
                weight_space: 6.0,
                space_comfort_multiplier: 2.0,
                space_comfort_bonus: 200.0,
                space_shortage_penalty: 2_000.0,
                weight_food: 400.0,
                trap_bonus: 250.0,
                trap_max_escape_moves: 1,
                deception_bonus: 40.0,
                deception_min_own_neighbors: 2,
                bait_bonus: 60.0,
                aggression_bonus: 80.0,
                aggression_penalty: 150.0,
                min_aggression_health: 40,
                weight_center: 60.0,
            },
            food: FoodConfig {
                critical_health_threshold: 15,
                low_health_threshold: 30,
                mid_health_threshold: 60,
                target_length: 10,
                danger_radius: 2,
                max_food_candidates: 3,
                balanced_multiplier: 1.0,
                urgent_multiplier: 2.5,
                critical_multiplier: 5.0,
            },
            cache: CacheConfig {
                enabled: true,
                ttl_turns: 3,
                idle_game_ttl_secs: 120,
                sweep_interval_ms: 5_000,
                max_entries: 200_000,
            },
            game_rules: GameRulesConfig { max_health: 100 },
            emergency: EmergencyConfig {
                default_direction: "up".to_string(),
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "sidewinder_debug.jsonl".to_string(),
            },
            appearance: AppearanceConfig {
                author: "sidewinder".to_string(),
                color: "#2E8B57".to_string(),
                head: "viper".to_string(),
                tail: "rattle".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Snake.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}
