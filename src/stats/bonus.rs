use std::fmt;

/// The category of a bonus. The category decides how bonuses of the same kind
/// combine, see `Stat::stacking_total`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum BonusType {
    Empty, // sentinel, never stored on a stat
    Typeless,
    Alchemical,
    Armor,
    BAB,
    Circumstance,
    Competence,
    Deflection,
    Dodge,
    Enhancement,
    Inherent,
    Insight,
    Luck,
    Morale,
    NaturalArmor,
    Profane,
    Racial,
    Resistance,
    Sacred,
    Shield,
    Size,
    Trait,
    Penalty,
    Override,
}

const ALL_BONUS_TYPES: [BonusType; 24] = [
    BonusType::Empty,
    BonusType::Typeless,
    BonusType::Alchemical,
    BonusType::Armor,
    BonusType::BAB,
    BonusType::Circumstance,
    BonusType::Competence,
    BonusType::Deflection,
    BonusType::Dodge,
    BonusType::Enhancement,
    BonusType::Inherent,
    BonusType::Insight,
    BonusType::Luck,
    BonusType::Morale,
    BonusType::NaturalArmor,
    BonusType::Profane,
    BonusType::Racial,
    BonusType::Resistance,
    BonusType::Sacred,
    BonusType::Shield,
    BonusType::Size,
    BonusType::Trait,
    BonusType::Penalty,
    BonusType::Override,
];

/// How the bonuses within a single category combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StackingRule {
    /// Sum, but a name only counts once (its highest value)
    DistinctNames,
    /// Sum everything
    Always,
    /// Only the single highest value counts
    HighestOnly,
}

impl BonusType {
    pub(crate) fn stacking_rule(&self) -> StackingRule {
        use BonusType as BT;
        match self {
            BT::Typeless | BT::Circumstance | BT::Dodge => StackingRule::DistinctNames,
            BT::Penalty => StackingRule::Always,
            _ => StackingRule::HighestOnly,
        }
    }

    pub fn name(&self) -> &'static str {
        use BonusType as BT;
        match self {
            BT::Empty => "empty",
            BT::Typeless => "typeless",
            BT::Alchemical => "alchemical",
            BT::Armor => "armor",
            BT::BAB => "bab",
            BT::Circumstance => "circumstance",
            BT::Competence => "competence",
            BT::Deflection => "deflection",
            BT::Dodge => "dodge",
            BT::Enhancement => "enhancement",
            BT::Inherent => "inherent",
            BT::Insight => "insight",
            BT::Luck => "luck",
            BT::Morale => "morale",
            BT::NaturalArmor => "naturalarmor",
            BT::Profane => "profane",
            BT::Racial => "racial",
            BT::Resistance => "resistance",
            BT::Sacred => "sacred",
            BT::Shield => "shield",
            BT::Size => "size",
            BT::Trait => "trait",
            BT::Penalty => "penalty",
            BT::Override => "override",
        }
    }

    /// Looks up a bonus type by its name. Case and any underscores/spaces are
    /// ignored, so `natural armor`, `NATURAL_ARMOR` and `NaturalArmor` all
    /// match.
    pub fn from_name(name: &str) -> Option<BonusType> {
        let wanted: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .flat_map(|c| c.to_lowercase())
            .collect();
        ALL_BONUS_TYPES.iter().copied().find(|t| t.name() == wanted)
    }

    pub fn from_ordinal(ordinal: i64) -> Option<BonusType> {
        if ordinal < 0 {
            return None;
        }
        ALL_BONUS_TYPES.get(ordinal as usize).copied()
    }
}

impl Default for BonusType {
    fn default() -> Self {
        BonusType::Typeless
    }
}

impl fmt::Display for BonusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single named modifier to a `Stat`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Bonus {
    pub name: String,
    pub bonus_type: BonusType,
    pub value: i64,
}

impl Bonus {
    pub fn new<S: ToString>(name: S, bonus_type: BonusType, value: i64) -> Self {
        Self{ name: name.to_string(), bonus_type, value }
    }

    /// The wildcard name, only meaningful when removing bonuses.
    pub(crate) fn is_wildcard(&self) -> bool {
        self.name == "*"
    }
}

impl fmt::Display for Bonus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+} ({})", self.name, self.value, self.bonus_type)
    }
}
