//! Population cohorts and their daily needs/income pipeline.
//!
//! A pop's day: accumulators reset, the artisan works if there is one,
//! needs are computed and cash is split across them by price-inverse
//! weights, orders go to the market, and the settlement outcomes feed the
//! needs tiers in order and fill the income ledgers. Distribution updates
//! (growth, promotion, migration) happen in scripted phases outside this
//! pipeline; the engine only carries their deltas.

use crate::defs::goods::GoodIndex;
use crate::defs::map::ProvinceIndex;
use crate::defs::military::RebelTypeIndex;
use crate::defs::politics::IdeologyIndex;
use crate::defs::pops::{CultureIndex, NeedCategory, PopType, PopTypeIndex, ReligionIndex};
use crate::defs::SimDefines;
use crate::fixed::Fixed;
use crate::indexed::{FixedMap, IndexedMap};
use crate::market::{BuyResult, BuyUpToOrder, OrderActor};
use crate::production::artisan::ArtisanProducer;
use crate::production::OrderBatch;
use crate::scripts::PopRef;
use serde::{Deserialize, Serialize};

pub type PopSize = i64;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub enum CultureStatus {
    Primary,
    Accepted,
    #[default]
    Unaccepted,
}

impl CultureStatus {
    pub fn is_accepted(self) -> bool {
        matches!(self, CultureStatus::Primary | CultureStatus::Accepted)
    }
}

/// Income ledgers, reset daily. Values are post-tax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopIncome {
    pub rgo_owner: Fixed,
    pub rgo_worker: Fixed,
    pub factory_owner: Fixed,
    pub factory_worker: Fixed,
    pub artisanal_revenue: Fixed,
    pub unemployment_subsidies: Fixed,
    pub pensions: Fixed,
    pub administration_salary: Fixed,
    pub education_salary: Fixed,
    pub military_salary: Fixed,
    pub event_income: Fixed,
    pub loan_interest: Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeStream {
    RgoOwner,
    RgoWorker,
    FactoryOwner,
    FactoryWorker,
    UnemploymentSubsidy,
    Pension,
    AdministrationSalary,
    EducationSalary,
    MilitarySalary,
    Event,
    LoanInterest,
}

/// Expense ledgers, reset daily. Positive means spent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopExpenses {
    pub life_needs: Fixed,
    pub everyday_needs: Fixed,
    pub luxury_needs: Fixed,
    pub artisan_inputs: Fixed,
}

/// Per-strata multipliers the scheduler derives from province modifiers
/// and the pops defines, shared by every pop ticked in that province.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedNeedsValues {
    /// Indexed by [`NeedCategory`]; already includes the strata scalar and
    /// the province's needs-cost modifiers for this pop's strata.
    pub category_scalars: [Fixed; 3],
}

impl Default for SharedNeedsValues {
    fn default() -> Self {
        Self {
            category_scalars: [Fixed::ONE; 3],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pop {
    pub pop_type: PopTypeIndex,
    pub culture: CultureIndex,
    pub religion: ReligionIndex,
    pub size: PopSize,
    pub militancy: Fixed,
    pub consciousness: Fixed,
    pub literacy: Fixed,
    pub rebel_type: Option<RebelTypeIndex>,
    pub location: ProvinceIndex,
    pub id_in_province: u32,
    pub culture_status: CultureStatus,

    pub total_change: PopSize,
    pub num_grown: PopSize,
    pub num_promoted: PopSize,
    pub num_demoted: PopSize,
    pub num_migrated_internal: PopSize,
    pub num_migrated_external: PopSize,
    pub num_migrated_colonial: PopSize,

    /// Supporter-equivalents per ideology; sums to size.
    pub ideology_distribution: IndexedMap<IdeologyIndex, Fixed>,
    /// Supporter-equivalents per issue; sums to size or to zero.
    pub issue_support: FixedMap<crate::defs::politics::IssueIndex>,
    /// Vote-equivalents per party roster slot of the province owner; sums
    /// to size when an owner exists.
    pub party_votes: FixedMap<u32>,

    pub cash: Fixed,
    pub income: Fixed,
    pub expenses: Fixed,
    pub savings: Fixed,
    pub employed: PopSize,
    pub employed_yesterday: PopSize,
    pub yesterdays_import_value: Fixed,
    import_value_today: Fixed,
    pub max_supported_regiments: u32,
    pub regiment_count: u32,

    pub needs_acquired: [Fixed; 3],
    pub needs_desired: [Fixed; 3],
    /// Remaining desired quantity per good, per category; rebuilt daily.
    today_needs: [FixedMap<GoodIndex>; 3],
    /// Whether the full desired quantity of each needs good was covered
    /// today; rebuilt daily from the pop type's needs.
    pub needs_satisfied_goods: [FixedMap<GoodIndex>; 3],

    pub income_ledger: PopIncome,
    pub expense_ledger: PopExpenses,

    pub artisan: Option<ArtisanProducer>,
}

impl Pop {
    pub fn new(
        pop_type: PopTypeIndex,
        is_artisan: bool,
        culture: CultureIndex,
        religion: ReligionIndex,
        size: PopSize,
        location: ProvinceIndex,
        id_in_province: u32,
        ideology_count: usize,
    ) -> Self {
        Self {
            pop_type,
            culture,
            religion,
            size,
            militancy: Fixed::ZERO,
            consciousness: Fixed::ZERO,
            literacy: Fixed::from_fraction(1, 10),
            rebel_type: None,
            location,
            id_in_province,
            culture_status: CultureStatus::Unaccepted,
            total_change: 0,
            num_grown: 0,
            num_promoted: 0,
            num_demoted: 0,
            num_migrated_internal: 0,
            num_migrated_external: 0,
            num_migrated_colonial: 0,
            ideology_distribution: IndexedMap::new(ideology_count),
            issue_support: FixedMap::new(),
            party_votes: FixedMap::new(),
            cash: Fixed::ZERO,
            income: Fixed::ZERO,
            expenses: Fixed::ZERO,
            savings: Fixed::ZERO,
            employed: 0,
            employed_yesterday: 0,
            yesterdays_import_value: Fixed::ZERO,
            import_value_today: Fixed::ZERO,
            max_supported_regiments: 0,
            regiment_count: 0,
            needs_acquired: [Fixed::ZERO; 3],
            needs_desired: [Fixed::ZERO; 3],
            today_needs: [FixedMap::new(), FixedMap::new(), FixedMap::new()],
            needs_satisfied_goods: [FixedMap::new(), FixedMap::new(), FixedMap::new()],
            income_ledger: PopIncome::default(),
            expense_ledger: PopExpenses::default(),
            artisan: if is_artisan {
                Some(ArtisanProducer::new())
            } else {
                None
            },
        }
    }

    pub fn pop_ref(&self) -> PopRef {
        PopRef {
            province: self.location,
            slot: self.id_in_province,
        }
    }

    pub fn unemployed(&self) -> PopSize {
        (self.size - self.employed).max(0)
    }

    pub fn unemployment_fraction(&self, pop_type: &PopType) -> Fixed {
        if !pop_type.can_be_unemployed || self.size == 0 {
            return Fixed::ZERO;
        }
        Fixed::from_fraction(self.unemployed(), self.size)
    }

    /// Retire this pop into its type's declared equivalent.
    pub fn convert_to_equivalent(&mut self, pop_type: &PopType) -> bool {
        match pop_type.equivalent {
            Some(equivalent) => {
                self.pop_type = equivalent;
                true
            }
            None => {
                log::error!(
                    "pop type {:?} has no equivalent to convert to",
                    pop_type.identifier
                );
                false
            }
        }
    }

    /// The owner's party roster changed (relocation or conquest): the vote
    /// distribution restarts from zero over the new roster.
    pub fn reset_party_votes(&mut self, roster_size: usize) {
        self.party_votes.clear();
        for slot in 0..roster_size {
            self.party_votes.set(slot as u32, Fixed::ZERO);
        }
    }

    /// Tick step 1: roll yesterday's outputs over and reset the ledgers.
    pub fn start_day(&mut self) {
        self.employed_yesterday = self.employed;
        self.employed = 0;
        self.yesterdays_import_value = self.import_value_today;
        self.import_value_today = Fixed::ZERO;
        self.income = Fixed::ZERO;
        self.expenses = Fixed::ZERO;
        self.income_ledger = PopIncome::default();
        self.expense_ledger = PopExpenses::default();
        self.needs_acquired = [Fixed::ZERO; 3];
        self.needs_desired = [Fixed::ZERO; 3];
        for category in &mut self.today_needs {
            category.clear();
        }
        for category in &mut self.needs_satisfied_goods {
            category.clear();
        }
    }

    /// Base needs scalar: `(1 + 2·CON / base_con) · size`.
    pub fn base_needs_scalar(&self, defines: &SimDefines) -> Fixed {
        let consciousness_factor =
            Fixed::ONE + (Fixed::TWO * self.consciousness) / defines.base_con;
        consciousness_factor * Fixed::from_int(self.size)
    }

    /// Tick steps 4–6: compute desired quantities, feed from artisan
    /// leftovers, allocate cash and emit buy orders. `reserved_cash` is
    /// what the artisan already committed to input orders this tick.
    #[allow(clippy::too_many_arguments)]
    pub fn compute_and_order_needs(
        &mut self,
        pop_type: &PopType,
        defines: &SimDefines,
        shared: &SharedNeedsValues,
        country: Option<crate::defs::politics::CountryIndex>,
        reserved_cash: Fixed,
        good_available: impl Fn(GoodIndex) -> bool,
        price_of: impl Fn(GoodIndex) -> Fixed,
        min_next_price_of: impl Fn(GoodIndex) -> Fixed,
        batch: &mut OrderBatch,
    ) {
        let base_scalar = self.base_needs_scalar(defines);

        for category in NeedCategory::ALL {
            let slot = category.index();
            let scalar = base_scalar * shared.category_scalars[slot];
            for (good, base_amount) in pop_type.needs_for(category).iter() {
                if !good_available(good) {
                    continue;
                }
                let mut desired = base_amount.mul_div(scalar, defines.needs_scalar_divisor);
                if desired <= Fixed::ZERO {
                    continue;
                }
                self.needs_desired[slot] += desired;
                self.needs_satisfied_goods[slot].set(good, Fixed::ZERO);

                // Unsold artisan output of the same good feeds the need
                // before any money moves.
                if let Some(artisan) = self.artisan.as_mut() {
                    let from_stock = artisan.consumable_output(good).min(desired);
                    if from_stock > Fixed::ZERO {
                        artisan.consume_output(good, from_stock);
                        self.needs_acquired[slot] += from_stock;
                        desired -= from_stock;
                        if desired == Fixed::ZERO {
                            self.needs_satisfied_goods[slot].set(good, Fixed::ONE);
                            continue;
                        }
                    }
                }
                self.today_needs[slot].add(good, desired);
            }
        }

        // Aggregate the remaining demand per good across categories.
        let mut per_good: FixedMap<GoodIndex> = FixedMap::new();
        for category in &self.today_needs {
            per_good += category;
        }

        let mut allocations: Vec<NeedAllocation> = per_good
            .iter()
            .filter(|&(_, desired)| desired > Fixed::ZERO)
            .map(|(good, desired)| NeedAllocation {
                good,
                desired,
                price: price_of(good),
                min_next_price: min_next_price_of(good),
                allocated: Fixed::ZERO,
            })
            .collect();

        allocate_for_needs(&mut allocations, (self.cash - reserved_cash).max(Fixed::ZERO));

        for allocation in &allocations {
            if allocation.allocated <= Fixed::ZERO {
                continue;
            }
            batch.buys.push(BuyUpToOrder {
                good: allocation.good,
                country,
                max_quantity: allocation.desired,
                money_to_spend: allocation.allocated,
                actor: OrderActor::Pop(self.pop_ref()),
            });
        }
    }

    /// Tick step 8 (`after_buy`): tariff on the import share, then feed
    /// the needs tiers in order. Returns the tariff owed to the tax
    /// collector.
    pub fn on_needs_bought(&mut self, result: BuyResult, tariff_rate: Fixed) -> Fixed {
        let tariff = (tariff_rate * result.money_spent_on_imports).max(Fixed::ZERO);
        let total_cost = result.money_spent_total + tariff;
        self.import_value_today += result.money_spent_on_imports;

        let mut remaining = result.quantity_bought;
        let unit_cost = if result.quantity_bought > Fixed::ZERO {
            total_cost / result.quantity_bought
        } else {
            Fixed::ZERO
        };

        for category in NeedCategory::ALL {
            if remaining <= Fixed::ZERO {
                break;
            }
            let slot = category.index();
            let wanted = self.today_needs[slot].get(result.good);
            if wanted <= Fixed::ZERO {
                continue;
            }
            let taken = wanted.min(remaining);
            remaining -= taken;
            self.today_needs[slot].set(result.good, wanted - taken);
            self.needs_acquired[slot] += taken;
            if taken == wanted {
                self.needs_satisfied_goods[slot].set(result.good, Fixed::ONE);
            }
            let cost_share = taken * unit_cost;
            match category {
                NeedCategory::Life => self.expense_ledger.life_needs += cost_share,
                NeedCategory::Everyday => self.expense_ledger.everyday_needs += cost_share,
                NeedCategory::Luxury => self.expense_ledger.luxury_needs += cost_share,
            }
        }

        self.spend(total_cost);
        tariff
    }

    /// Artisan input purchase settled: stockpile the goods and book the
    /// expense.
    pub fn on_artisan_inputs_bought(&mut self, result: BuyResult, tariff_rate: Fixed) -> Fixed {
        let tariff = (tariff_rate * result.money_spent_on_imports).max(Fixed::ZERO);
        let total_cost = result.money_spent_total + tariff;
        self.import_value_today += result.money_spent_on_imports;
        if let Some(artisan) = self.artisan.as_mut() {
            artisan.on_inputs_bought(result.good, result.quantity_bought, result.money_spent_total);
        } else {
            log::error!("artisan purchase routed to a pop without a producer");
        }
        self.expense_ledger.artisan_inputs += total_cost;
        self.spend(total_cost);
        tariff
    }

    fn spend(&mut self, amount: Fixed) {
        if amount <= Fixed::ZERO {
            return;
        }
        self.expenses += amount;
        self.cash -= amount;
        if self.cash < Fixed::ZERO {
            log::error!(
                "pop cash went negative ({}) after spending {}; clamping",
                self.cash,
                amount
            );
            self.cash = Fixed::ZERO;
        }
    }

    /// Post-tax income from a wage, transfer or event stream. Returns the
    /// tax collected so the caller can report it.
    pub fn add_income(&mut self, stream: IncomeStream, amount: Fixed, tax_rate: Fixed) -> Fixed {
        if amount <= Fixed::ZERO {
            if amount < Fixed::ZERO {
                log::error!("adding negative income {amount} to pop; ignoring");
            }
            return Fixed::ZERO;
        }
        let tax = (tax_rate * amount).clamp(Fixed::ZERO, amount);
        let net = amount - tax;
        let ledger = &mut self.income_ledger;
        match stream {
            IncomeStream::RgoOwner => ledger.rgo_owner += net,
            IncomeStream::RgoWorker => ledger.rgo_worker += net,
            IncomeStream::FactoryOwner => ledger.factory_owner += net,
            IncomeStream::FactoryWorker => ledger.factory_worker += net,
            IncomeStream::UnemploymentSubsidy => ledger.unemployment_subsidies += net,
            IncomeStream::Pension => ledger.pensions += net,
            IncomeStream::AdministrationSalary => ledger.administration_salary += net,
            IncomeStream::EducationSalary => ledger.education_salary += net,
            IncomeStream::MilitarySalary => ledger.military_salary += net,
            IncomeStream::Event => ledger.event_income += net,
            IncomeStream::LoanInterest => ledger.loan_interest += net,
        }
        self.income += net;
        self.cash += net;
        tax
    }

    /// Artisanal sale revenue. Only the margin over the day's production
    /// costs is taxable, and only when the sold good was the recipe's own
    /// output. Returns the tax collected.
    pub fn add_artisanal_revenue(
        &mut self,
        revenue: Fixed,
        taxable: bool,
        costs_of_production: Fixed,
        tax_rate: Fixed,
    ) -> Fixed {
        if revenue <= Fixed::ZERO {
            if revenue < Fixed::ZERO {
                log::error!("adding negative artisanal revenue {revenue} to pop; ignoring");
            }
            return Fixed::ZERO;
        }
        let tax = if taxable {
            let taxable_income = (revenue - costs_of_production).max(Fixed::ZERO);
            (tax_rate * taxable_income).clamp(Fixed::ZERO, revenue)
        } else {
            Fixed::ZERO
        };
        let net = revenue - tax;
        self.income_ledger.artisanal_revenue += revenue;
        self.income += net;
        self.cash += net;
        tax
    }

    /// Import subsidies are neither income (no income tax) nor a negative
    /// expense; they only restore cash.
    pub fn add_import_subsidies(&mut self, amount: Fixed) {
        self.cash += amount;
    }

    /// Fulfilment ratio for a needs tier; full when nothing was desired.
    pub fn needs_fulfilled(&self, category: NeedCategory) -> Fixed {
        let slot = category.index();
        if self.needs_desired[slot] == Fixed::ZERO {
            return Fixed::ONE;
        }
        self.needs_acquired[slot] / self.needs_desired[slot]
    }

    /// Tick step 10: clamp bounded attributes, settle culture status and
    /// the regiment ceiling.
    pub fn update_gamestate(
        &mut self,
        defines: &SimDefines,
        owner_view: Option<PopGamestateView<'_>>,
    ) {
        self.militancy = self.militancy.clamp(Fixed::ZERO, Fixed::from_int(10));
        self.consciousness = self.consciousness.clamp(Fixed::ZERO, Fixed::from_int(10));
        self.literacy = self
            .literacy
            .clamp(Fixed::from_fraction(1, 100), Fixed::ONE);

        self.culture_status = match &owner_view {
            Some(view) => {
                if view.primary_culture == self.culture {
                    CultureStatus::Primary
                } else if view.accepted_cultures.contains(&self.culture) {
                    CultureStatus::Accepted
                } else {
                    CultureStatus::Unaccepted
                }
            }
            None => CultureStatus::Unaccepted,
        };

        let recruitable = owner_view
            .as_ref()
            .map_or(false, |view| view.can_recruit_status(self.culture_status));
        if !recruitable
            || self.size < defines.min_pop_size_for_regiment
            || defines.pop_size_per_regiment <= 0
        {
            self.max_supported_regiments = 0;
        } else {
            let per_regiment = Fixed::from_int(defines.pop_size_per_regiment)
                * defines.pop_size_per_regiment_multiplier;
            if per_regiment <= Fixed::ZERO {
                self.max_supported_regiments = 0;
            } else {
                let supported = Fixed::from_int(self.size) / per_regiment;
                self.max_supported_regiments = supported.floor_int() as u32 + 1;
            }
        }
    }
}

/// What the gamestate update needs to know about the owner country.
#[derive(Debug, Clone)]
pub struct PopGamestateView<'a> {
    pub primary_culture: CultureIndex,
    pub accepted_cultures: &'a [CultureIndex],
    pub regiment_cultures: vicdata::politics::RegimentCulturePolicy,
    pub pop_type_can_be_recruited: bool,
}

impl PopGamestateView<'_> {
    fn can_recruit_status(&self, status: CultureStatus) -> bool {
        use vicdata::politics::RegimentCulturePolicy::*;
        if !self.pop_type_can_be_recruited {
            return false;
        }
        match self.regiment_cultures {
            PrimaryOnly => status == CultureStatus::Primary,
            PrimaryAndAccepted => status.is_accepted(),
            AllCultures => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct NeedAllocation {
    good: GoodIndex,
    desired: Fixed,
    price: Fixed,
    min_next_price: Fixed,
    allocated: Fixed,
}

/// Split `cash` across goods by price-inverse weights, capping each good
/// at the money needed for its full desired quantity and redistributing
/// the remainder until no further capping occurs.
fn allocate_for_needs(allocations: &mut [NeedAllocation], cash: Fixed) {
    let mut remaining = cash;
    let mut capped = vec![false; allocations.len()];

    loop {
        let mut weight_sum = Fixed::ZERO;
        for (allocation, done) in allocations.iter().zip(capped.iter()) {
            if !done && allocation.price > Fixed::ZERO {
                weight_sum += Fixed::ONE / allocation.price;
            }
        }
        if weight_sum <= Fixed::ZERO || remaining <= Fixed::ZERO {
            break;
        }

        let mut any_capped = false;
        for (allocation, done) in allocations.iter_mut().zip(capped.iter_mut()) {
            if *done || allocation.price <= Fixed::ZERO {
                continue;
            }
            let weight = Fixed::ONE / allocation.price;
            let budget = remaining.mul_div(weight, weight_sum);
            let max_needed = allocation.desired * allocation.price;
            if budget > max_needed {
                allocation.allocated = max_needed;
                remaining -= max_needed;
                *done = true;
                any_capped = true;
            }
        }
        if any_capped {
            continue;
        }

        // Final distribution over the uncapped goods.
        for (allocation, done) in allocations.iter_mut().zip(capped.iter()) {
            if *done || allocation.price <= Fixed::ZERO {
                continue;
            }
            let weight = Fixed::ONE / allocation.price;
            allocation.allocated = remaining.mul_div(weight, weight_sum);
        }
        break;
    }

    // A budget too small to buy one epsilon of quantity at the floor price
    // is returned rather than wasted on an unfillable order.
    for allocation in allocations.iter_mut() {
        let min_buyable = Fixed::from_raw(allocation.min_next_price.raw() >> Fixed::FRAC_BITS);
        if allocation.allocated < min_buyable.max(Fixed::EPSILON) {
            allocation.allocated = Fixed::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(v: i64) -> Fixed {
        Fixed::from_int(v)
    }

    fn allocation(good: u32, desired: i64, price: i64) -> NeedAllocation {
        NeedAllocation {
            good: GoodIndex(good),
            desired: fx(desired),
            price: fx(price),
            min_next_price: fx(price),
            allocated: Fixed::ZERO,
        }
    }

    #[test]
    fn allocation_weights_by_price_inverse() {
        // good 0 at price 1, good 1 at price 3: weights 1 and 1/3
        let mut allocations = vec![allocation(0, 1000, 1), allocation(1, 1000, 3)];
        allocate_for_needs(&mut allocations, fx(40));
        let total = allocations[0].allocated + allocations[1].allocated;
        assert!(total <= fx(40));
        // 3:1 split within rounding
        let ratio = allocations[0].allocated / allocations[1].allocated;
        assert!((ratio - fx(3)).abs() < Fixed::from_fraction(1, 10));
    }

    #[test]
    fn allocation_caps_at_desired_and_redistributes() {
        // good 0 needs only 2 money; the rest flows to good 1
        let mut allocations = vec![allocation(0, 2, 1), allocation(1, 1000, 1)];
        allocate_for_needs(&mut allocations, fx(100));
        assert_eq!(allocations[0].allocated, fx(2));
        assert_eq!(allocations[1].allocated, fx(98));
    }

    #[test]
    fn allocation_never_overspends() {
        let mut allocations = vec![
            allocation(0, 5, 2),
            allocation(1, 7, 3),
            allocation(2, 11, 5),
        ];
        allocate_for_needs(&mut allocations, fx(10));
        let total: Fixed = allocations.iter().map(|a| a.allocated).sum();
        assert!(total <= fx(10));
    }

    #[test]
    fn tiny_budgets_are_zeroed() {
        let mut allocations = vec![allocation(0, 1000, 30000)];
        allocate_for_needs(&mut allocations, Fixed::from_raw(10));
        assert_eq!(allocations[0].allocated, Fixed::ZERO);
    }

    fn test_pop() -> Pop {
        let mut pop = Pop::new(
            PopTypeIndex(0),
            false,
            CultureIndex(0),
            ReligionIndex(0),
            1000,
            ProvinceIndex(0),
            0,
            2,
        );
        pop.cash = fx(100);
        pop
    }

    #[test]
    fn start_day_rolls_yesterday_values() {
        let mut pop = test_pop();
        pop.employed = 400;
        pop.import_value_today = fx(7);
        pop.income = fx(3);
        pop.start_day();
        assert_eq!(pop.employed, 0);
        assert_eq!(pop.employed_yesterday, 400);
        assert_eq!(pop.yesterdays_import_value, fx(7));
        assert_eq!(pop.income, Fixed::ZERO);
    }

    #[test]
    fn base_needs_scalar_grows_with_consciousness() {
        let defines = SimDefines::from_rows(&vicdata::defines::Defines::default());
        let mut pop = test_pop();
        let baseline = pop.base_needs_scalar(&defines);
        assert_eq!(baseline, fx(1000));
        pop.consciousness = fx(10);
        // 1 + 2·10/20 = 2
        assert_eq!(pop.base_needs_scalar(&defines), fx(2000));
    }

    #[test]
    fn buying_feeds_needs_tiers_in_order() {
        let mut pop = test_pop();
        let good = GoodIndex(0);
        pop.today_needs[0].set(good, fx(2));
        pop.today_needs[2].set(good, fx(3));
        pop.needs_desired[0] = fx(2);
        pop.needs_desired[2] = fx(3);

        let tariff = pop.on_needs_bought(
            BuyResult {
                good,
                quantity_bought: fx(4),
                money_spent_total: fx(8),
                money_spent_on_imports: Fixed::ZERO,
            },
            Fixed::ZERO,
        );
        assert_eq!(tariff, Fixed::ZERO);
        // life fully fed first, remainder to luxury
        assert_eq!(pop.needs_acquired[0], fx(2));
        assert_eq!(pop.needs_acquired[2], fx(2));
        assert_eq!(pop.needs_satisfied_goods[0].get(good), Fixed::ONE);
        assert_eq!(pop.needs_satisfied_goods[2].get(good), Fixed::ZERO);
        assert_eq!(pop.expense_ledger.life_needs, fx(4));
        assert_eq!(pop.expense_ledger.luxury_needs, fx(4));
        assert_eq!(pop.cash, fx(92));
        assert_eq!(pop.needs_fulfilled(NeedCategory::Life), Fixed::ONE);
    }

    #[test]
    fn tariff_applies_to_import_share_only() {
        let mut pop = test_pop();
        let good = GoodIndex(0);
        pop.today_needs[0].set(good, fx(10));
        pop.needs_desired[0] = fx(10);

        let tariff = pop.on_needs_bought(
            BuyResult {
                good,
                quantity_bought: fx(10),
                money_spent_total: fx(20),
                money_spent_on_imports: fx(5),
            },
            Fixed::from_fraction(1, 10),
        );
        assert_eq!(tariff, Fixed::HALF);
        assert_eq!(pop.cash, fx(100) - fx(20) - Fixed::HALF);
        assert_eq!(pop.yesterdays_import_value, Fixed::ZERO);
        assert_eq!(pop.import_value_today, fx(5));
    }

    #[test]
    fn negative_cash_is_clamped_and_logged() {
        let mut pop = test_pop();
        pop.cash = fx(1);
        let good = GoodIndex(0);
        pop.today_needs[0].set(good, fx(10));
        pop.on_needs_bought(
            BuyResult {
                good,
                quantity_bought: fx(10),
                money_spent_total: fx(20),
                money_spent_on_imports: Fixed::ZERO,
            },
            Fixed::ZERO,
        );
        assert_eq!(pop.cash, Fixed::ZERO);
    }

    #[test]
    fn income_is_taxed_at_source() {
        let mut pop = test_pop();
        let tax = pop.add_income(IncomeStream::RgoWorker, fx(10), Fixed::from_fraction(1, 4));
        assert_eq!(tax, Fixed::from_fraction(10, 4));
        assert_eq!(pop.income_ledger.rgo_worker, fx(10) - tax);
        assert_eq!(pop.cash, fx(100) + fx(10) - tax);
        assert_eq!(pop.income, fx(10) - tax);
    }

    #[test]
    fn artisanal_tax_applies_to_margin_only() {
        let mut pop = test_pop();
        let tax = pop.add_artisanal_revenue(
            fx(100),
            true,
            fx(60),
            Fixed::from_fraction(1, 10),
        );
        assert_eq!(tax, fx(4));
        assert_eq!(pop.cash, fx(100) + fx(96));
        assert_eq!(pop.income_ledger.artisanal_revenue, fx(100));

        // revenue from a stale recipe's goods goes untaxed
        let tax = pop.add_artisanal_revenue(fx(50), false, fx(60), Fixed::from_fraction(1, 10));
        assert_eq!(tax, Fixed::ZERO);
    }

    #[test]
    fn import_subsidies_bypass_income() {
        let mut pop = test_pop();
        pop.add_import_subsidies(fx(5));
        assert_eq!(pop.cash, fx(105));
        assert_eq!(pop.income, Fixed::ZERO);
    }

    #[test]
    fn gamestate_clamps_and_culture_status() {
        let defines = SimDefines::from_rows(&vicdata::defines::Defines::default());
        let mut pop = test_pop();
        pop.militancy = fx(15);
        pop.consciousness = -fx(2);
        pop.literacy = Fixed::ZERO;

        let accepted = [CultureIndex(5)];
        pop.update_gamestate(
            &defines,
            Some(PopGamestateView {
                primary_culture: CultureIndex(0),
                accepted_cultures: &accepted,
                regiment_cultures: vicdata::politics::RegimentCulturePolicy::PrimaryAndAccepted,
                pop_type_can_be_recruited: true,
            }),
        );
        assert_eq!(pop.militancy, fx(10));
        assert_eq!(pop.consciousness, Fixed::ZERO);
        assert_eq!(pop.literacy, Fixed::from_fraction(1, 100));
        assert_eq!(pop.culture_status, CultureStatus::Primary);
    }

    #[test]
    fn regiment_ceiling_follows_the_formula() {
        let defines = SimDefines::from_rows(&vicdata::defines::Defines::default());
        let mut pop = test_pop();
        pop.size = 25_000;
        let view = PopGamestateView {
            primary_culture: CultureIndex(0),
            accepted_cultures: &[],
            regiment_cultures: vicdata::politics::RegimentCulturePolicy::PrimaryAndAccepted,
            pop_type_can_be_recruited: true,
        };
        pop.update_gamestate(&defines, Some(view.clone()));
        // floor(25000 / 10000) + 1
        assert_eq!(pop.max_supported_regiments, 3);

        // below the minimum size nothing is supported
        pop.size = 500;
        pop.update_gamestate(&defines, Some(view.clone()));
        assert_eq!(pop.max_supported_regiments, 0);

        // no owner, no regiments
        pop.size = 25_000;
        pop.update_gamestate(&defines, None);
        assert_eq!(pop.max_supported_regiments, 0);
    }

    #[test]
    fn ownerless_pop_is_unaccepted() {
        let defines = SimDefines::from_rows(&vicdata::defines::Defines::default());
        let mut pop = test_pop();
        pop.culture_status = CultureStatus::Primary;
        pop.update_gamestate(&defines, None);
        assert_eq!(pop.culture_status, CultureStatus::Unaccepted);
    }
}
