use std::cmp::Ordering;
use std::fmt;
use std::fmt::Write;

use super::bonus::*;

/// A numeric character statistic with a base value and a set of typed
/// bonuses. The effective value is recomputed on every read:
///
/// - if an override bonus is present its value *is* the stat's value,
/// - otherwise it is `base + stacking_total(bonuses)`.
///
/// An empty bonus list is always represented as `None`.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Stat {
    pub base: i64,
    bonuses: Option<Vec<Bonus>>,
    override_bonus: Option<Bonus>,
}

impl Stat {
    pub fn new(base: i64) -> Self {
        Self{ base, bonuses: None, override_bonus: None }
    }

    /// The effective value, saturating at the bounds of `i64`.
    pub fn value(&self) -> i64 {
        match &self.override_bonus {
            Some(b) => b.value,
            None => self.base.saturating_add(self.bonus_total()),
        }
    }

    /// The effective value, or `None` when computing it overflows.
    pub fn checked_value(&self) -> Option<i64> {
        match &self.override_bonus {
            Some(b) => Some(b.value),
            None => self.base.checked_add(checked_stacking_total(self.bonuses())?),
        }
    }

    pub fn bonuses(&self) -> &[Bonus] {
        match &self.bonuses {
            Some(bonuses) => bonuses.as_slice(),
            None => &[],
        }
    }

    pub fn override_bonus(&self) -> Option<&Bonus> {
        self.override_bonus.as_ref()
    }

    pub fn has_bonuses(&self) -> bool {
        self.bonuses.is_some() || self.override_bonus.is_some()
    }

    /// Total contribution of all bonuses, ignoring any override.
    pub fn bonus_total(&self) -> i64 {
        stacking_total(self.bonuses())
    }

    pub fn checked_bonus_total(&self) -> Option<i64> {
        checked_stacking_total(self.bonuses())
    }

    /// The highest bonus of the given type, or 0 when there is none.
    pub fn bonus_of(&self, bonus_type: BonusType) -> i64 {
        if bonus_type == BonusType::Override {
            return self.override_bonus.as_ref().map(|b| b.value).unwrap_or(0);
        }

        self.bonuses()
            .iter()
            .filter(|b| b.bonus_type == bonus_type)
            .map(|b| b.value)
            .max()
            .unwrap_or(0)
    }

    /// Adds a bonus. Zero-valued bonuses, the `Empty` type and the wildcard
    /// name are rejected. An override bonus replaces the current override.
    pub fn add_bonus(&mut self, bonus: Bonus) -> bool {
        if bonus.is_wildcard() || bonus.bonus_type == BonusType::Empty || bonus.value == 0 {
            return false;
        }

        if bonus.bonus_type == BonusType::Override {
            self.override_bonus = Some(bonus);
        } else {
            self.bonuses.get_or_insert_with(Vec::new).push(bonus);
        }

        true
    }

    /// Removes a bonus.
    ///
    /// - The wildcard name clears every bonus sharing the given type.
    /// - An override with a matching name is cleared.
    /// - Otherwise every exact match (name, type and value) is removed.
    ///
    /// Returns whether anything was removed.
    pub fn remove_bonus(&mut self, bonus: &Bonus) -> bool {
        if bonus.is_wildcard() {
            let had_bonus = self.has_bonuses();
            if bonus.bonus_type == BonusType::Override {
                self.override_bonus = None;
            } else if let Some(bonuses) = &mut self.bonuses {
                bonuses.retain(|b| b.bonus_type != bonus.bonus_type);
            }
            self.normalize();
            return had_bonus;
        }

        let mut removed = false;
        if let Some(current) = &self.override_bonus {
            if current.name == bonus.name {
                self.override_bonus = None;
                removed = true;
            }
        }

        if let Some(bonuses) = &mut self.bonuses {
            let num_before = bonuses.len();
            bonuses.retain(|b| b != bonus);
            removed = removed || bonuses.len() != num_before;
        }

        self.normalize();
        removed
    }

    fn normalize(&mut self) {
        if let Some(bonuses) = &self.bonuses {
            if bonuses.is_empty() {
                self.bonuses = None;
            }
        }
    }

    /// Detailed rendering: the value as a header, followed by the base (struck
    /// through when overridden) and every bonus as a list item.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("## {}", self.value());
        if !self.has_bonuses() {
            return out;
        }

        out.push('\n');
        match &self.override_bonus {
            Some(over) => {
                let _ = writeln!(out, "~~**Base:**~~ {}", self.base);
                let _ = writeln!(out, "**Override:** {}", over.value);
            },
            None => {
                let _ = writeln!(out, "**Base:** {}", self.base);
            }
        }
        for bonus in self.bonuses() {
            let _ = writeln!(out, "- {}", bonus);
        }

        out
    }
}

/// Combines bonuses according to the stacking rule of their category:
///
/// - typeless, circumstance and dodge bonuses stack, except that a name only
///   counts once (its highest value),
/// - penalties always stack,
/// - every other category only counts its single highest value.
///
/// The total saturates at the bounds of `i64`.
pub fn stacking_total(bonuses: &[Bonus]) -> i64 {
    combine_stacking(bonuses, |a, b| Some(a.saturating_add(b))).unwrap_or(0)
}

/// Like `stacking_total`, but `None` when the total overflows.
pub fn checked_stacking_total(bonuses: &[Bonus]) -> Option<i64> {
    combine_stacking(bonuses, i64::checked_add)
}

fn combine_stacking(bonuses: &[Bonus], add: impl Fn(i64, i64) -> Option<i64>) -> Option<i64> {
    // Group per type. Order of the groups does not matter for the total, but
    // the members of a group are visited highest first.
    let mut groups: Vec<(BonusType, Vec<&Bonus>)> = Vec::new();
    for bonus in bonuses {
        match groups.iter_mut().find(|(t, _)| *t == bonus.bonus_type) {
            Some((_, group)) => group.push(bonus),
            None => groups.push((bonus.bonus_type, vec![bonus])),
        }
    }

    let mut total = 0;
    for (bonus_type, mut group) in groups {
        group.sort_by(|a, b| b.value.cmp(&a.value));
        match bonus_type.stacking_rule() {
            StackingRule::DistinctNames => {
                let mut seen: Vec<&str> = Vec::with_capacity(group.len());
                for bonus in group {
                    if seen.contains(&bonus.name.as_str()) {
                        continue;
                    }
                    seen.push(&bonus.name);
                    total = add(total, bonus.value)?;
                }
            },
            StackingRule::Always => {
                for bonus in group {
                    total = add(total, bonus.value)?;
                }
            },
            StackingRule::HighestOnly => {
                total = add(total, group[0].value)?;
            }
        }
    }

    Some(total)
}

impl PartialEq for Stat {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl PartialOrd for Stat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.value().cmp(&other.value()))
    }
}

impl From<i64> for Stat {
    fn from(base: i64) -> Self {
        Stat::new(base)
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat_with(base: i64, bonuses: &[(&str, BonusType, i64)]) -> Stat {
        let mut stat = Stat::new(base);
        for (name, bonus_type, value) in bonuses {
            assert!(stat.add_bonus(Bonus::new(name, *bonus_type, *value)));
        }
        stat
    }

    #[test]
    fn test_typeless_same_name_counts_once() {
        let stat = stat_with(10, &[
            ("bless", BonusType::Typeless, 1),
            ("bless", BonusType::Typeless, 3),
        ]);
        assert_eq!(stat.value(), 13);
    }

    #[test]
    fn test_typeless_different_names_stack() {
        let stat = stat_with(10, &[
            ("bless", BonusType::Typeless, 1),
            ("flank", BonusType::Typeless, 2),
        ]);
        assert_eq!(stat.value(), 13);
    }

    #[test]
    fn test_penalties_always_stack() {
        let stat = stat_with(10, &[
            ("fatigued", BonusType::Penalty, -2),
            ("fatigued", BonusType::Penalty, -2),
        ]);
        assert_eq!(stat.value(), 6);
    }

    #[test]
    fn test_named_types_take_highest() {
        let stat = stat_with(10, &[
            ("rage", BonusType::Morale, 2),
            ("heroism", BonusType::Morale, 4),
            ("belt", BonusType::Enhancement, 2),
        ]);
        assert_eq!(stat.value(), 16);
        assert_eq!(stat.bonus_of(BonusType::Morale), 4);
        assert_eq!(stat.bonus_of(BonusType::Luck), 0);
    }

    #[test]
    fn test_override_replaces_total() {
        let mut stat = stat_with(10, &[("rage", BonusType::Morale, 2)]);
        assert!(stat.add_bonus(Bonus::new("wild shape", BonusType::Override, 20)));
        assert_eq!(stat.value(), 20);

        assert!(stat.remove_bonus(&Bonus::new("wild shape", BonusType::Override, 0)));
        assert_eq!(stat.value(), 12);
    }

    #[test]
    fn test_overflowing_totals() {
        let stat = stat_with(10, &[("x", BonusType::Morale, i64::MAX)]);
        assert_eq!(stat.checked_value(), None);
        assert_eq!(stat.value(), i64::MAX);
        assert_eq!(stat.checked_bonus_total(), Some(i64::MAX));

        let stat = stat_with(0, &[
            ("a", BonusType::Penalty, i64::MIN),
            ("b", BonusType::Penalty, -1),
        ]);
        assert_eq!(stat.checked_bonus_total(), None);
        assert_eq!(stat.bonus_total(), i64::MIN);

        let stat = stat_with(10, &[("rage", BonusType::Morale, 2)]);
        assert_eq!(stat.checked_value(), Some(12));
    }

    #[test]
    fn test_rejected_bonuses() {
        let mut stat = Stat::new(10);
        assert!(!stat.add_bonus(Bonus::new("zero", BonusType::Morale, 0)));
        assert!(!stat.add_bonus(Bonus::new("empty", BonusType::Empty, 2)));
        assert!(!stat.add_bonus(Bonus::new("*", BonusType::Morale, 2)));
        assert!(!stat.has_bonuses());
    }

    #[test]
    fn test_remove_all_exact_matches() {
        let mut stat = stat_with(10, &[
            ("fatigued", BonusType::Penalty, -2),
            ("fatigued", BonusType::Penalty, -2),
            ("shaken", BonusType::Penalty, -2),
        ]);
        assert!(stat.remove_bonus(&Bonus::new("fatigued", BonusType::Penalty, -2)));
        assert_eq!(stat.bonuses().len(), 1);
        assert_eq!(stat.value(), 8);

        // Value must match as well
        assert!(!stat.remove_bonus(&Bonus::new("shaken", BonusType::Penalty, -1)));

        assert!(stat.remove_bonus(&Bonus::new("shaken", BonusType::Penalty, -2)));
        assert!(!stat.has_bonuses());
        assert!(stat.bonuses.is_none());
    }

    #[test]
    fn test_wildcard_removal_by_type() {
        let mut stat = stat_with(10, &[
            ("rage", BonusType::Morale, 2),
            ("heroism", BonusType::Morale, 4),
            ("belt", BonusType::Enhancement, 2),
        ]);
        assert!(stat.remove_bonus(&Bonus::new("*", BonusType::Morale, 0)));
        assert_eq!(stat.value(), 12);

        assert!(stat.remove_bonus(&Bonus::new("*", BonusType::Enhancement, 0)));
        assert!(stat.bonuses.is_none());
        assert!(!stat.remove_bonus(&Bonus::new("*", BonusType::Enhancement, 0)));
    }

    #[test]
    fn test_markdown_rendering() {
        let mut stat = stat_with(10, &[("rage", BonusType::Morale, 2)]);
        assert_eq!(Stat::new(3).to_markdown(), "## 3");

        let rendered = stat.to_markdown();
        assert!(rendered.starts_with("## 12\n**Base:** 10\n"));
        assert!(rendered.contains("- rage +2 (morale)"));

        stat.add_bonus(Bonus::new("polymorph", BonusType::Override, 18));
        assert!(stat.to_markdown().contains("~~**Base:**~~ 10"));
    }

    #[test]
    fn test_bonus_type_lookup() {
        assert_eq!(BonusType::from_name("Natural Armor"), Some(BonusType::NaturalArmor));
        assert_eq!(BonusType::from_name("MORALE"), Some(BonusType::Morale));
        assert_eq!(BonusType::from_name("nonsense"), None);
        assert_eq!(BonusType::from_ordinal(1), Some(BonusType::Typeless));
        assert_eq!(BonusType::from_ordinal(-1), None);
    }
}
