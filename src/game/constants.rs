//! Engine-wide defaults and limits.

/// Maximum number of participants a round will accept.
pub const MAX_PLAYERS: usize = 10;

/// A round needs at least two participants to be worth playing.
pub const MIN_PLAYERS: usize = 2;

/// Player identifiers are truncated to this many characters.
pub const MAX_PLAYER_ID_LEN: usize = 16;

/// Default forced contribution collected from every player at round start.
pub const DEFAULT_ANTE: u32 = 10;

/// Default stack handed to players by callers that don't track chips yet.
pub const DEFAULT_STARTING_STACK: u32 = 100;

/// Default cap on raises within a single betting phase.
pub const DEFAULT_MAX_RAISES_PER_PHASE: u8 = 3;

/// Seconds a player gets to act during a betting phase.
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 30;

/// Seconds the table waits for answers during a question phase.
pub const DEFAULT_ANSWER_TIMEOUT_SECS: u64 = 45;

/// Seconds before expiry at which a timer warning fires.
pub const DEFAULT_WARNING_LEAD_SECS: u64 = 10;

/// Accuracy is normalized against `max(correct_answer, this)` so small
/// answers don't make every deviation look catastrophic.
pub const ACCURACY_NORMALIZATION_FLOOR: f64 = 100.0;
