//! Boolean rules granted by reforms and government types.
//!
//! A rule set is a map from rule to on/off; combining two sets is bitwise
//! OR per rule, so any source granting a rule grants it overall.

use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    BuildFactory,
    ExpandFactory,
    OpenFactory,
    DestroyFactory,
    FactoryPriority,
    CanSubsidise,
    PopBuildFactory,
    PopExpandFactory,
    PopOpenFactory,
    DeleteFactoryIfNoInput,
    Citizenship,
    Slavery,
    UpperHouseComposition,
    VoteFranchise,
    VotingSystem,
    PublicMeetings,
    PressRights,
    TradeUnions,
    PoliticalParties,
    AllowForeignInvestment,
}

impl Rule {
    pub const ALL: [Rule; 20] = [
        Rule::BuildFactory,
        Rule::ExpandFactory,
        Rule::OpenFactory,
        Rule::DestroyFactory,
        Rule::FactoryPriority,
        Rule::CanSubsidise,
        Rule::PopBuildFactory,
        Rule::PopExpandFactory,
        Rule::PopOpenFactory,
        Rule::DeleteFactoryIfNoInput,
        Rule::Citizenship,
        Rule::Slavery,
        Rule::UpperHouseComposition,
        Rule::VoteFranchise,
        Rule::VotingSystem,
        Rule::PublicMeetings,
        Rule::PressRights,
        Rule::TradeUnions,
        Rule::PoliticalParties,
        Rule::AllowForeignInvestment,
    ];

    const fn bit(self) -> u32 {
        1u32 << self as u32
    }
}

/// Bitset over [`Rule`]. Empty means every rule is off.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct RuleSet(u32);

impl RuleSet {
    pub const EMPTY: RuleSet = RuleSet(0);

    pub fn with(mut self, rule: Rule) -> Self {
        self.0 |= rule.bit();
        self
    }

    pub fn set(&mut self, rule: Rule, enabled: bool) {
        if enabled {
            self.0 |= rule.bit();
        } else {
            self.0 &= !rule.bit();
        }
    }

    pub fn allows(self, rule: Rule) -> bool {
        self.0 & rule.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Rule> {
        Rule::ALL.into_iter().filter(move |r| self.allows(*r))
    }
}

impl std::ops::BitOr for RuleSet {
    type Output = RuleSet;
    fn bitor(self, rhs: RuleSet) -> RuleSet {
        RuleSet(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for RuleSet {
    fn bitor_assign(&mut self, rhs: RuleSet) {
        self.0 |= rhs.0;
    }
}
