use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TOTAL_CARDS: usize = 12;
pub const DEFAULT_BIG_COUNT: usize = 5;
pub const DEFAULT_TOP_PRIZE: u64 = 100_000;
pub const DEFAULT_USER_POOL: [u64; 5] = [2_000, 5_000, 10_000, 15_000, 18_000];
pub const DEFAULT_OTHER_POOL: [u64; 6] = [1_000, 2_000, 5_000, 10_000, 20_000, 50_000];
pub const ANONYMOUS_NAME: &str = "Ẩn danh";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("total cards must be at least 2, got {0}")]
    TooFewCards(usize),
    #[error("big count {big} must be below total cards {total}")]
    BigCountTooLarge { big: usize, total: usize },
    #[error("{0} prize pool is empty")]
    EmptyPool(&'static str),
    #[error("{0} prize pool contains the top prize")]
    PoolContainsTopPrize(&'static str),
    #[error("prize amounts must be positive")]
    ZeroAmount,
    #[error("{0} must not be empty")]
    EmptyKey(&'static str),
    #[error("reveal timing overflows for {cards} cards")]
    TimingOverflow { cards: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PrizeRules {
    pub total_cards: usize,
    pub big_count: usize,
    pub top_prize: u64,
    pub user_pool: Vec<u64>,
    pub other_pool: Vec<u64>,
}

impl Default for PrizeRules {
    fn default() -> Self {
        Self {
            total_cards: DEFAULT_TOTAL_CARDS,
            big_count: DEFAULT_BIG_COUNT,
            top_prize: DEFAULT_TOP_PRIZE,
            user_pool: DEFAULT_USER_POOL.to_vec(),
            other_pool: DEFAULT_OTHER_POOL.to_vec(),
        }
    }
}

impl PrizeRules {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_cards < 2 {
            return Err(ConfigError::TooFewCards(self.total_cards));
        }
        if self.big_count >= self.total_cards {
            return Err(ConfigError::BigCountTooLarge {
                big: self.big_count,
                total: self.total_cards,
            });
        }
        if self.top_prize == 0 {
            return Err(ConfigError::ZeroAmount);
        }
        for (label, pool) in [("user", &self.user_pool), ("other", &self.other_pool)] {
            if pool.is_empty() {
                return Err(ConfigError::EmptyPool(label));
            }
            if pool.contains(&self.top_prize) {
                return Err(ConfigError::PoolContainsTopPrize(label));
            }
            if pool.contains(&0) {
                return Err(ConfigError::ZeroAmount);
            }
        }
        Ok(())
    }

    /// Lesser cards among the non-user slots.
    pub fn filler_count(&self) -> usize {
        self.total_cards - 1 - self.big_count
    }
}

/// Delays of the reveal sequence, in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RevealTiming {
    pub user_flip_ms: u64,
    pub stagger_ms: u64,
    pub settle_ms: u64,
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self {
            user_flip_ms: 900,
            stagger_ms: 55,
            settle_ms: 700,
        }
    }
}

impl RevealTiming {
    pub fn user_flip(&self) -> Duration {
        Duration::from_millis(self.user_flip_ms)
    }

    /// Offset of the `step`-th other card from the start of the others phase.
    pub fn flip_after(&self, step: usize) -> Duration {
        Duration::from_millis(self.stagger_ms.saturating_mul(step as u64))
    }

    /// Offset of the result from the start of the others phase.
    pub fn settle_after(&self, others: usize) -> Duration {
        Duration::from_millis(
            self.stagger_ms
                .saturating_mul(others as u64)
                .saturating_add(self.settle_ms),
        )
    }

    /// Whole reveal length from the user flip to the result, if it fits in u64 ms.
    pub fn total_ms(&self, others: usize) -> Option<u64> {
        self.stagger_ms
            .checked_mul(u64::try_from(others).ok()?)?
            .checked_add(self.settle_ms)?
            .checked_add(self.user_flip_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageKeys {
    pub log_key: String,
    pub played_marker: String,
    pub fingerprint_prefix: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            log_key: "lixi_log".to_string(),
            played_marker: "picked".to_string(),
            fingerprint_prefix: "lixi2026_".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameConfig {
    pub prizes: PrizeRules,
    pub timing: RevealTiming,
    pub storage: StorageKeys,
    pub anonymous_name: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            prizes: PrizeRules::default(),
            timing: RevealTiming::default(),
            storage: StorageKeys::default(),
            anonymous_name: ANONYMOUS_NAME.to_string(),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.prizes.validate()?;
        if self.timing.total_ms(self.prizes.total_cards - 1).is_none() {
            return Err(ConfigError::TimingOverflow {
                cards: self.prizes.total_cards,
            });
        }
        if self.storage.log_key.is_empty() {
            return Err(ConfigError::EmptyKey("log key"));
        }
        if self.storage.played_marker.is_empty() {
            return Err(ConfigError::EmptyKey("played marker"));
        }
        if self.anonymous_name.trim().is_empty() {
            return Err(ConfigError::EmptyKey("anonymous name"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
        assert_eq!(PrizeRules::default().filler_count(), 6);
    }

    #[test]
    fn top_prize_in_user_pool_is_rejected() {
        let mut rules = PrizeRules::default();
        rules.user_pool.push(rules.top_prize);
        assert_eq!(
            rules.validate(),
            Err(ConfigError::PoolContainsTopPrize("user"))
        );
    }

    #[test]
    fn overflowing_timing_is_rejected() {
        let mut config = GameConfig::default();
        config.timing.stagger_ms = u64::MAX / 4;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TimingOverflow { cards: 12 })
        );

        let mut config = GameConfig::default();
        config.timing.user_flip_ms = u64::MAX - 100;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TimingOverflow { cards: 12 })
        );
        assert_eq!(RevealTiming::default().total_ms(11), Some(2_205));
    }

    #[test]
    fn big_count_must_leave_room_for_user() {
        let rules = PrizeRules {
            big_count: 12,
            ..PrizeRules::default()
        };
        assert_eq!(
            rules.validate(),
            Err(ConfigError::BigCountTooLarge { big: 12, total: 12 })
        );
    }

    #[test]
    fn settle_offset_covers_every_stagger() {
        let timing = RevealTiming::default();
        assert_eq!(timing.settle_after(11), Duration::from_millis(55 * 11 + 700));
        assert_eq!(timing.flip_after(10), Duration::from_millis(550));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{"timing":{"stagger_ms":80}}"#).expect("parse");
        assert_eq!(config.timing.stagger_ms, 80);
        assert_eq!(config.timing.user_flip_ms, 900);
        assert_eq!(config.prizes, PrizeRules::default());
    }
}
