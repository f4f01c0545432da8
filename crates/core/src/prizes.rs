use crate::{format_vnd, short_amount, ConfigError, PrizeRules, Randomness};
use serde::{Deserialize, Serialize};

/// The envelopes of one page load. Exactly one slot belongs to the user and it
/// never holds the top prize.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrizeSet {
    amounts: Vec<u64>,
    user_slot: usize,
    top_prize: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    User,
    Top,
    Lesser,
}

/// What the back of a card shows once flipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardFace {
    pub index: usize,
    pub kind: CardKind,
    pub amount: u64,
    pub label: String,
    pub tag: String,
}

impl PrizeSet {
    /// Inserts the user's prize into the already shuffled others.
    pub fn assemble(
        mut others: Vec<u64>,
        user_prize: u64,
        user_slot: usize,
        top_prize: u64,
    ) -> Self {
        let user_slot = user_slot.min(others.len());
        others.insert(user_slot, user_prize);
        Self {
            amounts: others,
            user_slot,
            top_prize,
        }
    }

    pub fn amounts(&self) -> &[u64] {
        &self.amounts
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn user_slot(&self) -> usize {
        self.user_slot
    }

    pub fn user_amount(&self) -> u64 {
        self.amounts[self.user_slot]
    }

    pub fn top_prize(&self) -> u64 {
        self.top_prize
    }

    pub fn is_user_slot(&self, index: usize) -> bool {
        index == self.user_slot
    }

    /// 1-based positions of the top prize, the user's slot excluded.
    pub fn missed_positions(&self) -> Vec<usize> {
        self.amounts
            .iter()
            .enumerate()
            .filter(|(idx, amount)| **amount == self.top_prize && *idx != self.user_slot)
            .map(|(idx, _)| idx + 1)
            .collect()
    }

    pub fn count_top(&self) -> usize {
        self.amounts
            .iter()
            .filter(|amount| **amount == self.top_prize)
            .count()
    }

    pub fn other_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.amounts.len()).filter(move |idx| *idx != self.user_slot)
    }

    pub fn kind(&self, index: usize) -> CardKind {
        if index == self.user_slot {
            CardKind::User
        } else if self.amounts[index] == self.top_prize {
            CardKind::Top
        } else {
            CardKind::Lesser
        }
    }

    pub fn face(&self, index: usize) -> CardFace {
        let amount = self.amounts[index];
        let kind = self.kind(index);
        let tag = match kind {
            CardKind::User => "🎉 CỦA BẠN".to_string(),
            CardKind::Top => format!("🏆 {}", short_amount(amount)),
            CardKind::Lesser => format!("+{}", format_vnd(amount)),
        };
        CardFace {
            index,
            kind,
            amount,
            label: format_vnd(amount),
            tag,
        }
    }

    pub fn faces(&self) -> Vec<CardFace> {
        (0..self.amounts.len()).map(|idx| self.face(idx)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct PrizeEngine {
    rules: PrizeRules,
}

impl PrizeEngine {
    pub fn new(rules: PrizeRules) -> Result<Self, ConfigError> {
        rules.validate()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &PrizeRules {
        &self.rules
    }

    /// Draws one rigged deal: the user's prize comes from the user pool, the
    /// others carry exactly `big_count` top prizes.
    pub fn deal<R: Randomness>(&self, rng: &mut R) -> PrizeSet {
        let rules = &self.rules;
        let user_prize = rules.user_pool[rng.index(rules.user_pool.len())];

        let mut others = Vec::with_capacity(rules.total_cards);
        others.extend(std::iter::repeat(rules.top_prize).take(rules.big_count));
        for _ in 0..rules.filler_count() {
            others.push(rules.other_pool[rng.index(rules.other_pool.len())]);
        }
        rng.shuffle(&mut others);

        let user_slot = rng.index(rules.total_cards);
        PrizeSet::assemble(others, user_prize, user_slot, rules.top_prize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PrizeSet {
        let others = vec![
            1_000, 100_000, 2_000, 5_000, 10_000, 100_000, 20_000, 100_000, 100_000, 50_000,
            100_000,
        ];
        PrizeSet::assemble(others, 15_000, 4, 100_000)
    }

    #[test]
    fn assemble_places_user_prize() {
        let set = sample();
        assert_eq!(set.len(), 12);
        assert_eq!(set.user_slot(), 4);
        assert_eq!(set.user_amount(), 15_000);
        assert_eq!(set.count_top(), 5);
    }

    #[test]
    fn faces_tag_each_kind() {
        let set = sample();
        assert_eq!(set.face(4).kind, CardKind::User);
        assert_eq!(set.face(4).tag, "🎉 CỦA BẠN");
        assert_eq!(set.face(1).kind, CardKind::Top);
        assert_eq!(set.face(1).tag, "🏆 100K");
        assert_eq!(set.face(0).tag, "+1.000đ");
        assert_eq!(set.face(0).label, "1.000đ");
    }

    #[test]
    fn small_top_prize_tag_is_not_zero_k() {
        let set = PrizeSet::assemble(vec![500, 100, 500], 200, 0, 500);
        assert_eq!(set.face(1).tag, "🏆 500đ");
    }

    #[test]
    fn other_indices_skip_user() {
        let set = sample();
        let others: Vec<_> = set.other_indices().collect();
        assert_eq!(others.len(), 11);
        assert!(!others.contains(&4));
    }
}
