//! Test fixtures: a small but complete mod and bookmark.
//!
//! The builder produces a two-province Sweden with an RGO, a factory and
//! artisan pops, which is enough surface to exercise every phase of the
//! day tick. Tests mutate the data through the `modify_*` hooks.

use crate::config::SimConfig;
use crate::defs::Definitions;
use crate::fixed::Fixed;
use crate::world::World;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vicdata::bookmark::{Bookmark, CountrySetup, FactorySetup, PopSetup, ProvinceSetup, TaxSetup};
use vicdata::goods::{GoodCategory, GoodRow};
use vicdata::military::{RebelTypeRow, UnitTypeRow, WargoalRow};
use vicdata::modifiers::{EffectValueRow, NamedModifierRow};
use vicdata::politics::{
    CountryRow, GovernmentRow, IdeologyRow, IssueKind, IssueRow, NationalValueRow, PartyRow,
    RegimentCulturePolicy,
};
use vicdata::pops::{CultureRow, NeedRow, PopTypeRow, ReligionRow, Strata};
use vicdata::production::{InputRow, JobRow, ProductionTypeRow, ProducerKind};
use vicdata::rules::Rule;
use vicdata::{AdjacencyRow, ModData, ProvinceRow, TerrainRow};

pub struct WorldBuilder {
    data: ModData,
    bookmark: Bookmark,
    config: SimConfig,
    seed: u64,
}

impl Default for WorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self {
            data: base_mod_data(),
            bookmark: base_bookmark(),
            config: SimConfig::default(),
            seed: 42,
        }
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn modify_data(mut self, change: impl FnOnce(&mut ModData)) -> Self {
        change(&mut self.data);
        self
    }

    pub fn modify_bookmark(mut self, change: impl FnOnce(&mut Bookmark)) -> Self {
        change(&mut self.bookmark);
        self
    }

    pub fn build_definitions(&self) -> Definitions {
        match Definitions::from_mod_data(&self.data) {
            Ok(defs) => defs,
            Err(errors) => panic!("test mod data failed to load: {errors}"),
        }
    }

    pub fn build(self) -> World {
        let defs = match Definitions::from_mod_data(&self.data) {
            Ok(defs) => defs,
            Err(errors) => panic!("test mod data failed to load: {errors}"),
        };
        match World::from_bookmark(defs, self.config, &self.bookmark, self.seed) {
            Ok(world) => world,
            Err(errors) => panic!("test bookmark failed to build: {errors}"),
        }
    }
}

/// Scramble every pop's political distributions with seeded randomness
/// and rescale them back to pop size, for tests that need non-degenerate
/// ideology and issue maps.
pub fn randomize_pop_politics(world: &mut World, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let issues: Vec<_> = world.defs().issues.indices().collect();
    for province in &mut world.provinces {
        for pop in &mut province.pops {
            let size = Fixed::from_int(pop.size);
            for (_, weight) in pop.ideology_distribution.iter_mut() {
                *weight = Fixed::from_int(rng.gen_range(1..=5));
            }
            pop.ideology_distribution.rescale(size);

            for &issue in &issues {
                pop.issue_support.set(issue, Fixed::from_int(rng.gen_range(0..=6)));
            }
            pop.issue_support.rescale(size);
        }
    }
}

fn base_mod_data() -> ModData {
    ModData {
        goods: vec![
            good("grain", GoodCategory::RawMaterialGoods, 2.0),
            good("cloth", GoodCategory::IndustrialGoods, 1.8),
            good("furniture", GoodCategory::ConsumerGoods, 4.9),
            GoodRow {
                available_from_start: false,
                ..good("radios", GoodCategory::ConsumerGoods, 12.0)
            },
        ],
        pop_types: vec![
            PopTypeRow {
                identifier: "farmers".to_string(),
                strata: Strata::Poor,
                color: None,
                life_needs: vec![need("grain", 1.5)],
                everyday_needs: vec![need("cloth", 0.3)],
                luxury_needs: vec![],
                is_artisan: false,
                can_be_unemployed: true,
                can_be_recruited: true,
                equivalent: None,
                research_optimum: 0.0,
                research_points: 0.0,
                leadership_optimum: 0.0,
                leadership_points: 0.0,
            },
            PopTypeRow {
                identifier: "labourers".to_string(),
                strata: Strata::Poor,
                color: None,
                life_needs: vec![need("grain", 1.2)],
                everyday_needs: vec![need("cloth", 0.2)],
                luxury_needs: vec![],
                is_artisan: false,
                can_be_unemployed: true,
                can_be_recruited: true,
                equivalent: None,
                research_optimum: 0.0,
                research_points: 0.0,
                leadership_optimum: 0.0,
                leadership_points: 0.0,
            },
            PopTypeRow {
                identifier: "artisans".to_string(),
                strata: Strata::Middle,
                color: None,
                life_needs: vec![need("grain", 1.4)],
                everyday_needs: vec![need("cloth", 0.5)],
                luxury_needs: vec![need("furniture", 0.1)],
                is_artisan: true,
                can_be_unemployed: false,
                can_be_recruited: false,
                equivalent: None,
                research_optimum: 0.0,
                research_points: 0.0,
                leadership_optimum: 0.0,
                leadership_points: 0.0,
            },
            PopTypeRow {
                identifier: "clerks".to_string(),
                strata: Strata::Middle,
                color: None,
                life_needs: vec![need("grain", 1.0)],
                everyday_needs: vec![need("cloth", 0.6)],
                luxury_needs: vec![need("furniture", 0.2)],
                is_artisan: false,
                can_be_unemployed: true,
                can_be_recruited: false,
                equivalent: None,
                research_optimum: 0.02,
                research_points: 2.0,
                leadership_optimum: 0.0,
                leadership_points: 0.0,
            },
            PopTypeRow {
                identifier: "aristocrats".to_string(),
                strata: Strata::Rich,
                color: None,
                life_needs: vec![need("grain", 1.0)],
                everyday_needs: vec![need("cloth", 0.8)],
                luxury_needs: vec![need("furniture", 0.6)],
                is_artisan: false,
                can_be_unemployed: false,
                can_be_recruited: false,
                equivalent: None,
                research_optimum: 0.0,
                research_points: 0.0,
                leadership_optimum: 0.01,
                leadership_points: 1.0,
            },
        ],
        cultures: vec![
            CultureRow {
                identifier: "swedish".to_string(),
                group: "scandinavian".to_string(),
                color: None,
            },
            CultureRow {
                identifier: "finnish".to_string(),
                group: "finnic".to_string(),
                color: None,
            },
        ],
        religions: vec![ReligionRow {
            identifier: "protestant".to_string(),
            group: "christian".to_string(),
            color: None,
        }],
        ideologies: vec![
            IdeologyRow {
                identifier: "conservative".to_string(),
                group: "establishment".to_string(),
                color: None,
                uncivilised: false,
                available_from_start: true,
            },
            IdeologyRow {
                identifier: "liberal".to_string(),
                group: "opposition".to_string(),
                color: None,
                uncivilised: false,
                available_from_start: true,
            },
        ],
        issues: vec![
            IssueRow {
                identifier: "landed_voting".to_string(),
                kind: IssueKind::Reform,
                group: "vote_franchise".to_string(),
                ordinal: 1,
                modifier: None,
                rules: vec![],
                tax_efficiency: [("middle".to_string(), 0.05)].into_iter().collect(),
                tariff_min: None,
                tariff_max: None,
            },
            IssueRow {
                identifier: "census_suffrage".to_string(),
                kind: IssueKind::Reform,
                group: "vote_franchise".to_string(),
                ordinal: 2,
                modifier: None,
                rules: vec![],
                tax_efficiency: Default::default(),
                tariff_min: None,
                tariff_max: None,
            },
            IssueRow {
                identifier: "protectionism".to_string(),
                kind: IssueKind::PartyPolicy,
                group: "trade_policy".to_string(),
                ordinal: 0,
                modifier: None,
                rules: vec![],
                tax_efficiency: Default::default(),
                tariff_min: Some(0.0),
                tariff_max: Some(0.5),
            },
            IssueRow {
                identifier: "interventionism".to_string(),
                kind: IssueKind::PartyPolicy,
                group: "economic_policy".to_string(),
                ordinal: 0,
                modifier: None,
                rules: vec![Rule::BuildFactory, Rule::CanSubsidise],
                tax_efficiency: Default::default(),
                tariff_min: None,
                tariff_max: None,
            },
        ],
        national_values: vec![NationalValueRow {
            identifier: "nv_order".to_string(),
            modifier: None,
        }],
        governments: vec![GovernmentRow {
            identifier: "monarchy".to_string(),
            allowed_party_ideologies: vec!["conservative".to_string(), "liberal".to_string()],
            elections: false,
            election_duration_months: 0,
        }],
        countries: vec![
            CountryRow {
                identifier: "SWE".to_string(),
                color: None,
                primary_culture: "swedish".to_string(),
                accepted_cultures: vec![],
                religion: "protestant".to_string(),
                parties: vec![
                    PartyRow {
                        identifier: "hattarna".to_string(),
                        ideology: "conservative".to_string(),
                        policies: vec![
                            "protectionism".to_string(),
                            "interventionism".to_string(),
                        ],
                        start_date: None,
                        end_date: None,
                    },
                    PartyRow {
                        identifier: "mossarna".to_string(),
                        ideology: "liberal".to_string(),
                        policies: vec!["protectionism".to_string()],
                        start_date: None,
                        end_date: None,
                    },
                ],
                regiment_cultures: RegimentCulturePolicy::PrimaryAndAccepted,
                decisions: vec![],
            },
            CountryRow {
                identifier: "FIN".to_string(),
                color: None,
                primary_culture: "finnish".to_string(),
                accepted_cultures: vec![],
                religion: "protestant".to_string(),
                parties: vec![PartyRow {
                    identifier: "suomalainen".to_string(),
                    ideology: "conservative".to_string(),
                    policies: vec!["protectionism".to_string()],
                    start_date: None,
                    end_date: None,
                }],
                regiment_cultures: RegimentCulturePolicy::PrimaryAndAccepted,
                decisions: vec![],
            },
        ],
        production_types: vec![
            ProductionTypeRow {
                identifier: "grain_farm".to_string(),
                kind: ProducerKind::Rgo,
                owner: Some(JobRow {
                    pop_type: "aristocrats".to_string(),
                    effect_multiplier: 2.0,
                    amount: 1.0,
                }),
                employees: vec![JobRow {
                    pop_type: "farmers".to_string(),
                    effect_multiplier: 1.0,
                    amount: 1.0,
                }],
                base_workforce_size: 40_000,
                input_goods: vec![],
                output_good: "grain".to_string(),
                base_output_quantity: 18.0,
                maintenance_requirements: vec![],
                bonuses: vec![],
                farm: true,
                mine: false,
                coastal: false,
            },
            ProductionTypeRow {
                identifier: "cloth_factory".to_string(),
                kind: ProducerKind::Factory,
                owner: Some(JobRow {
                    pop_type: "aristocrats".to_string(),
                    effect_multiplier: 2.0,
                    amount: 1.0,
                }),
                employees: vec![JobRow {
                    pop_type: "labourers".to_string(),
                    effect_multiplier: 1.0,
                    amount: 1.0,
                }],
                base_workforce_size: 10_000,
                input_goods: vec![InputRow {
                    good: "grain".to_string(),
                    amount: 2.0,
                }],
                output_good: "cloth".to_string(),
                base_output_quantity: 6.0,
                maintenance_requirements: vec![],
                bonuses: vec![],
                farm: false,
                mine: false,
                coastal: false,
            },
            ProductionTypeRow {
                identifier: "artisan_cloth".to_string(),
                kind: ProducerKind::Artisan,
                owner: None,
                employees: vec![],
                base_workforce_size: 10_000,
                input_goods: vec![InputRow {
                    good: "grain".to_string(),
                    amount: 1.0,
                }],
                output_good: "cloth".to_string(),
                base_output_quantity: 2.0,
                maintenance_requirements: vec![],
                bonuses: vec![],
                farm: false,
                mine: false,
                coastal: false,
            },
            ProductionTypeRow {
                identifier: "artisan_furniture".to_string(),
                kind: ProducerKind::Artisan,
                owner: None,
                employees: vec![],
                base_workforce_size: 10_000,
                input_goods: vec![InputRow {
                    good: "cloth".to_string(),
                    amount: 1.0,
                }],
                output_good: "furniture".to_string(),
                base_output_quantity: 1.0,
                maintenance_requirements: vec![],
                bonuses: vec![],
                farm: false,
                mine: false,
                coastal: false,
            },
            ProductionTypeRow {
                identifier: "artisan_radios".to_string(),
                kind: ProducerKind::Artisan,
                owner: None,
                employees: vec![],
                base_workforce_size: 10_000,
                input_goods: vec![InputRow {
                    good: "cloth".to_string(),
                    amount: 2.0,
                }],
                output_good: "radios".to_string(),
                base_output_quantity: 1.0,
                maintenance_requirements: vec![],
                bonuses: vec![],
                farm: false,
                mine: false,
                coastal: false,
            },
        ],
        unit_types: vec![UnitTypeRow {
            identifier: "infantry".to_string(),
            branch: vicdata::military::UnitBranch::Land,
            attack: 3.0,
            defence: 4.0,
            maneuver: 1.0,
            speed: 4.0,
            build_cost: vec![InputRow {
                good: "cloth".to_string(),
                amount: 10.0,
            }],
            supply_consumption: vec![InputRow {
                good: "grain".to_string(),
                amount: 0.25,
            }],
        }],
        rebel_types: vec![RebelTypeRow {
            identifier: "jacobins".to_string(),
            ideology: Some("liberal".to_string()),
            defection_militancy: 7.0,
            modifier: None,
        }],
        wargoals: vec![WargoalRow {
            identifier: "conquer_province".to_string(),
            sprite_index: 1,
            war_score_cost: 25.0,
            prestige_gain: 5.0,
            can_use: None,
            on_success: None,
        }],
        events: vec![],
        national_foci: vec![],
        named_modifiers: vec![NamedModifierRow {
            identifier: "highland_soil".to_string(),
            effects: vec![EffectValueRow {
                effect: "rgo_output".to_string(),
                value: -0.1,
            }],
        }],
        terrains: vec![
            TerrainRow {
                identifier: "plains".to_string(),
                color: None,
                modifier: None,
            },
            TerrainRow {
                identifier: "mountains".to_string(),
                color: None,
                modifier: Some("highland_soil".to_string()),
            },
        ],
        provinces: vec![
            ProvinceRow {
                identifier: "stockholm".to_string(),
                water: false,
                terrain: Some("plains".to_string()),
                region: Some("svealand".to_string()),
                rgo_good: Some("grain".to_string()),
                rgo_production_type: Some("grain_farm".to_string()),
                adjacencies: vec![
                    AdjacencyRow {
                        to: "uppsala".to_string(),
                        distance: 1.0,
                        flags: 0,
                    },
                    AdjacencyRow {
                        to: "baltic_sea".to_string(),
                        distance: 1.0,
                        flags: 0,
                    },
                ],
            },
            ProvinceRow {
                identifier: "uppsala".to_string(),
                water: false,
                terrain: Some("mountains".to_string()),
                region: Some("svealand".to_string()),
                rgo_good: Some("grain".to_string()),
                rgo_production_type: Some("grain_farm".to_string()),
                adjacencies: vec![AdjacencyRow {
                    to: "stockholm".to_string(),
                    distance: 1.0,
                    flags: 0,
                }],
            },
            ProvinceRow {
                identifier: "baltic_sea".to_string(),
                water: true,
                terrain: None,
                region: None,
                rgo_good: None,
                rgo_production_type: None,
                adjacencies: vec![AdjacencyRow {
                    to: "stockholm".to_string(),
                    distance: 1.0,
                    flags: 0,
                }],
            },
        ],
        defines: Default::default(),
    }
}

fn base_bookmark() -> Bookmark {
    Bookmark {
        date: "1836.1.1".to_string(),
        countries: vec![CountrySetup {
            tag: "SWE".to_string(),
            government: Some("monarchy".to_string()),
            national_value: Some("nv_order".to_string()),
            ruling_party: Some("hattarna".to_string()),
            reforms: vec!["landed_voting".to_string()],
            technologies: vec![],
            flags: vec![],
            prestige: 10.0,
            plurality: 2.0,
            tax_rate: TaxSetup {
                poor: 0.25,
                middle: 0.25,
                rich: 0.25,
            },
            tariff_rate: 0.1,
            treasury: 10_000.0,
        }],
        provinces: vec![
            ProvinceSetup {
                province: "stockholm".to_string(),
                owner: Some("SWE".to_string()),
                controller: None,
                cores: vec!["SWE".to_string()],
                pops: vec![
                    PopSetup {
                        pop_type: "farmers".to_string(),
                        culture: "swedish".to_string(),
                        religion: "protestant".to_string(),
                        size: 40_000,
                        militancy: 1.0,
                        consciousness: 1.0,
                        literacy: 0.2,
                        cash: 400.0,
                        rebel_type: None,
                    },
                    PopSetup {
                        pop_type: "labourers".to_string(),
                        culture: "swedish".to_string(),
                        religion: "protestant".to_string(),
                        size: 10_000,
                        militancy: 1.0,
                        consciousness: 1.0,
                        literacy: 0.2,
                        cash: 150.0,
                        rebel_type: None,
                    },
                    PopSetup {
                        pop_type: "artisans".to_string(),
                        culture: "swedish".to_string(),
                        religion: "protestant".to_string(),
                        size: 5_000,
                        militancy: 0.5,
                        consciousness: 2.0,
                        literacy: 0.4,
                        cash: 200.0,
                        rebel_type: None,
                    },
                    PopSetup {
                        pop_type: "aristocrats".to_string(),
                        culture: "swedish".to_string(),
                        religion: "protestant".to_string(),
                        size: 2_000,
                        militancy: 0.0,
                        consciousness: 3.0,
                        literacy: 0.8,
                        cash: 1_000.0,
                        rebel_type: None,
                    },
                ],
                factories: vec![FactorySetup {
                    production_type: "cloth_factory".to_string(),
                    size_multiplier: 1.0,
                    budget: 500.0,
                }],
                rgo_size_multiplier: 1.0,
            },
            ProvinceSetup {
                province: "uppsala".to_string(),
                owner: Some("SWE".to_string()),
                controller: None,
                cores: vec!["SWE".to_string()],
                pops: vec![
                    PopSetup {
                        pop_type: "farmers".to_string(),
                        culture: "swedish".to_string(),
                        religion: "protestant".to_string(),
                        size: 20_000,
                        militancy: 1.5,
                        consciousness: 0.5,
                        literacy: 0.15,
                        cash: 180.0,
                        rebel_type: None,
                    },
                    PopSetup {
                        pop_type: "clerks".to_string(),
                        culture: "finnish".to_string(),
                        religion: "protestant".to_string(),
                        size: 3_000,
                        militancy: 2.0,
                        consciousness: 4.0,
                        literacy: 0.6,
                        cash: 250.0,
                        rebel_type: None,
                    },
                ],
                factories: vec![],
                rgo_size_multiplier: 1.0,
            },
        ],
    }
}

fn good(identifier: &str, category: GoodCategory, base_price: f64) -> GoodRow {
    GoodRow {
        identifier: identifier.to_string(),
        category,
        color: None,
        base_price,
        available_from_start: true,
        tradeable: true,
        money: false,
        overseas_penalty: false,
    }
}

fn need(good: &str, base_amount: f64) -> NeedRow {
    NeedRow {
        good: good.to_string(),
        base_amount,
    }
}
