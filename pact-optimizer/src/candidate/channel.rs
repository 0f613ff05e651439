use crate::candidate::{CandidateRef, LocalStrategy, ShipStrategy, ShipStrategyType};
use crate::cost::{Cost, CostEstimator};
use crate::descriptor::InputRequirement;
use crate::fields::FieldList;
use crate::properties::{
    GlobalProperties, LocalProperties, Ordering, Partitioning, RequestedGlobalProperties,
    RequestedProperty,
};

/// What a consumer needs from one of its inputs.
#[derive(Clone, Debug)]
pub struct ChannelRequest<'a> {
    pub requirement: &'a InputRequirement,
    /// Key order to hash on, when the consumer needs a specific one.
    pub partitioning_keys: Option<&'a FieldList>,
    /// A requested grouping may be produced by a combining sort.
    pub combinable: bool,
    /// Ship strategy forced by the user.
    pub forced: Option<ShipStrategyType>,
    pub target_parallelism: u32,
}

/// Edge from a producing candidate to a consumer.
///
/// The channel records how records are shipped and prepared, and the properties the
/// consumer sees once both steps are done.
#[derive(Clone, Debug)]
pub struct Channel {
    source: CandidateRef,
    ship_strategy: ShipStrategy,
    local_strategy: LocalStrategy,
    global_props: GlobalProperties,
    local_props: LocalProperties,
    replication_factor: u32,
    cost: Cost,
}

impl Channel {
    pub fn source(&self) -> &CandidateRef {
        &self.source
    }

    pub fn ship_strategy(&self) -> &ShipStrategy {
        &self.ship_strategy
    }

    pub fn local_strategy(&self) -> &LocalStrategy {
        &self.local_strategy
    }

    /// Global properties after shipping.
    pub fn global_properties(&self) -> &GlobalProperties {
        &self.global_props
    }

    /// Local properties after shipping and local preparation.
    pub fn local_properties(&self) -> &LocalProperties {
        &self.local_props
    }

    pub fn replication_factor(&self) -> u32 {
        self.replication_factor
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    /// Channels from `source` meeting `request`, cheapest shipping first.
    ///
    /// Empty if no channel can meet the request, e.g. a forced forward across a change of
    /// parallelism.
    pub fn synthesize(
        source: &CandidateRef,
        request: &ChannelRequest<'_>,
        estimator: &CostEstimator,
    ) -> Vec<Channel> {
        ship_alternatives(source, request)
            .into_iter()
            .filter_map(|ship| Channel::with_ship_strategy(source, ship, request, estimator))
            .collect()
    }

    fn with_ship_strategy(
        source: &CandidateRef,
        ship_strategy: ShipStrategy,
        request: &ChannelRequest<'_>,
        estimator: &CostEstimator,
    ) -> Option<Channel> {
        let global_props = shipped_global_properties(&ship_strategy, source.global_properties());
        if !request.requirement.global.is_met_by(&global_props) {
            return None;
        }

        let shipped_local = match ship_strategy {
            ShipStrategy::Forward => source.local_properties().clone(),
            _ => LocalProperties::none().with_unique_fields(
                source
                    .global_properties()
                    .unique_field_combinations()
                    .iter()
                    .cloned(),
            ),
        };
        let (local_strategy, local_props) = prepare_locally(shipped_local, request)?;

        let stat = source.statistics();
        let cost = estimator.ship_cost(&ship_strategy, &stat, request.target_parallelism)
            + estimator.local_cost(&local_strategy, &stat);
        let replication_factor = match ship_strategy {
            ShipStrategy::Broadcast => request.target_parallelism,
            _ => 1,
        };

        Some(Channel {
            source: source.clone(),
            ship_strategy,
            local_strategy,
            global_props,
            local_props,
            replication_factor,
            cost,
        })
    }
}

fn ship_alternatives(source: &CandidateRef, request: &ChannelRequest<'_>) -> Vec<ShipStrategy> {
    let requested = &request.requirement.global;
    let forward_ok = source.parallelism() == request.target_parallelism
        && requested.is_met_by(source.global_properties());

    match request.forced {
        Some(ShipStrategyType::Forward) if forward_ok => vec![ShipStrategy::Forward],
        Some(ShipStrategyType::Forward) => vec![],
        Some(forced) => explicit_ship(forced, requested, request.partitioning_keys)
            .into_iter()
            .collect(),
        None if forward_ok => {
            let mut alternatives = vec![ShipStrategy::Forward];
            // Already partitioned, but maybe not in the key order the other input uses.
            if let Some(keys) = request.partitioning_keys {
                if source.global_properties().partitioning()
                    != &Partitioning::HashPartitioned(keys.clone())
                {
                    alternatives.push(ShipStrategy::PartitionHash(keys.clone()));
                }
            }
            alternatives
        }
        None => explicit_ship(
            default_ship_type(requested),
            requested,
            request.partitioning_keys,
        )
        .into_iter()
        .collect(),
    }
}

fn default_ship_type(requested: &RequestedGlobalProperties) -> ShipStrategyType {
    match requested {
        RequestedGlobalProperties::Random => ShipStrategyType::PartitionRandom,
        RequestedGlobalProperties::AnyPartitioning(_)
        | RequestedGlobalProperties::HashPartitioned(_) => ShipStrategyType::PartitionHash,
        RequestedGlobalProperties::RangePartitioned { .. } => ShipStrategyType::PartitionRange,
        RequestedGlobalProperties::FullyReplicated => ShipStrategyType::Broadcast,
    }
}

/// A ship strategy of type `ship` producing the requested partitioning.
fn explicit_ship(
    ship: ShipStrategyType,
    requested: &RequestedGlobalProperties,
    keys: Option<&FieldList>,
) -> Option<ShipStrategy> {
    match (ship, requested) {
        (ShipStrategyType::Forward, _) => None,
        (
            ShipStrategyType::PartitionHash,
            RequestedGlobalProperties::AnyPartitioning(fields)
            | RequestedGlobalProperties::HashPartitioned(fields),
        ) => {
            let fields = keys
                .filter(|k| &k.to_field_set() == fields)
                .cloned()
                .unwrap_or_else(|| fields.to_field_list());
            Some(ShipStrategy::PartitionHash(fields))
        }
        (
            ShipStrategyType::PartitionRange,
            RequestedGlobalProperties::RangePartitioned {
                ordering,
                distribution,
            },
        ) => Some(ShipStrategy::PartitionRange {
            ordering: ordering.clone(),
            distribution: distribution.clone(),
        }),
        (ShipStrategyType::PartitionRange, RequestedGlobalProperties::AnyPartitioning(fields)) => {
            Some(ShipStrategy::PartitionRange {
                ordering: Ordering::ascending(&fields.to_field_list()),
                distribution: None,
            })
        }
        (ShipStrategyType::PartitionRandom, RequestedGlobalProperties::Random) => {
            Some(ShipStrategy::PartitionRandom)
        }
        (ShipStrategyType::Broadcast, _) => Some(ShipStrategy::Broadcast),
        _ => None,
    }
}

fn shipped_global_properties(ship: &ShipStrategy, source: &GlobalProperties) -> GlobalProperties {
    let unique = source.unique_field_combinations().iter().cloned();
    match ship {
        ShipStrategy::Forward => source.clone(),
        ShipStrategy::PartitionHash(fields) => {
            GlobalProperties::hash_partitioned(fields.clone()).with_unique_fields(unique)
        }
        ShipStrategy::PartitionRange {
            ordering,
            distribution,
        } => GlobalProperties::range_partitioned(ordering.clone(), distribution.clone())
            .with_unique_fields(unique),
        ShipStrategy::PartitionRandom => GlobalProperties::random().with_unique_fields(unique),
        ShipStrategy::Broadcast => GlobalProperties::fully_replicated(),
    }
}

/// Sorts the records of each partition if the requested local properties are not met yet.
fn prepare_locally(
    shipped: LocalProperties,
    request: &ChannelRequest<'_>,
) -> Option<(LocalStrategy, LocalProperties)> {
    let requested = &request.requirement.local;
    if requested.is_met_by(&shipped) {
        return Some((LocalStrategy::None, shipped));
    }

    let (ordering, combining) = match (requested.ordering(), requested.grouped_fields()) {
        (Some(ordering), _) => (ordering.clone(), false),
        (None, Some(fields)) => (Ordering::ascending(&fields.to_field_list()), request.combinable),
        (None, None) => return Some((LocalStrategy::None, shipped)),
    };

    let unique = shipped.unique_fields().iter().cloned();
    let (strategy, props) = if combining {
        let props = LocalProperties::ordered(ordering.clone())
            .with_unique_fields(unique)
            .with_unique_fields([ordering.field_set()]);
        (LocalStrategy::CombiningSort(ordering), props)
    } else {
        let props = LocalProperties::ordered(ordering.clone()).with_unique_fields(unique);
        (LocalStrategy::Sort(ordering), props)
    };

    if requested.is_met_by(&props) {
        Some((strategy, props))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::candidate::{
        Channel, ChannelRequest, LocalStrategy, ShipStrategy, ShipStrategyType,
    };
    use crate::cost::CostEstimator;
    use crate::descriptor::{InputRequirement, OperatorDescriptor};
    use crate::fields::{FieldList, FieldSet};
    use crate::properties::{
        GlobalProperties, LocalProperties, Ordering, RequestedGlobalProperties,
        RequestedLocalProperties,
    };
    use crate::test_utils::source_candidate;

    fn request(requirement: &InputRequirement, target_parallelism: u32) -> ChannelRequest<'_> {
        ChannelRequest {
            requirement,
            partitioning_keys: None,
            combinable: false,
            forced: None,
            target_parallelism,
        }
    }

    #[test]
    fn test_trivial_request_forwards() {
        let estimator = CostEstimator::default();
        let requirement = InputRequirement::default();

        for global in [
            GlobalProperties::random(),
            GlobalProperties::hash_partitioned([1]),
            GlobalProperties::fully_replicated(),
        ] {
            let source = source_candidate(0, global.clone(), LocalProperties::none(), 4);
            let channels = Channel::synthesize(&source, &request(&requirement, 4), &estimator);

            assert_eq!(1, channels.len());
            assert_eq!(&ShipStrategy::Forward, channels[0].ship_strategy());
            assert_eq!(&LocalStrategy::None, channels[0].local_strategy());
            assert_eq!(&global, channels[0].global_properties());
            assert_eq!(0.0, channels[0].cost().network());
        }
    }

    #[test]
    fn test_parallelism_change_reshuffles() {
        let estimator = CostEstimator::default();
        let requirement = InputRequirement::default();
        let source = source_candidate(0, GlobalProperties::random(), LocalProperties::none(), 4);

        let channels = Channel::synthesize(&source, &request(&requirement, 8), &estimator);
        assert_eq!(1, channels.len());
        assert_eq!(&ShipStrategy::PartitionRandom, channels[0].ship_strategy());

        let mut forced = request(&requirement, 8);
        forced.forced = Some(ShipStrategyType::Forward);
        assert!(Channel::synthesize(&source, &forced, &estimator).is_empty());
    }

    #[test]
    fn test_broadcast_for_replication() {
        let estimator = CostEstimator::default();
        let requirement = InputRequirement {
            global: RequestedGlobalProperties::FullyReplicated,
            local: RequestedLocalProperties::none(),
        };
        let source = source_candidate(
            0,
            GlobalProperties::random().with_unique_fields(vec![FieldSet::from([0])]),
            LocalProperties::none(),
            4,
        );

        let channels = Channel::synthesize(&source, &request(&requirement, 4), &estimator);
        assert_eq!(1, channels.len());
        assert_eq!(&ShipStrategy::Broadcast, channels[0].ship_strategy());
        assert_eq!(4, channels[0].replication_factor());
        assert!(channels[0].global_properties().is_fully_replicated());
        assert!(channels[0]
            .global_properties()
            .unique_field_combinations()
            .is_empty());
    }

    #[test]
    fn test_grouping_by_combining_sort() {
        let estimator = CostEstimator::default();
        let reduce = OperatorDescriptor::SortedReduce {
            keys: FieldSet::from([1]),
            combinable: true,
        };
        let requirement = &reduce.requirements()[0][0];
        let source = source_candidate(0, GlobalProperties::random(), LocalProperties::none(), 2);

        let mut combining = request(requirement, 2);
        combining.combinable = true;
        let channels = Channel::synthesize(&source, &combining, &estimator);

        assert_eq!(1, channels.len());
        assert_eq!(
            &ShipStrategy::PartitionHash(FieldList::from([1])),
            channels[0].ship_strategy()
        );
        assert_eq!(
            &LocalStrategy::CombiningSort(Ordering::ascending(&FieldList::from([1]))),
            channels[0].local_strategy()
        );
        assert!(channels[0]
            .local_properties()
            .unique_fields()
            .contains(&FieldSet::from([1])));

        let channels = Channel::synthesize(&source, &request(requirement, 2), &estimator);
        assert!(matches!(
            channels[0].local_strategy(),
            LocalStrategy::Sort(_)
        ));
    }

    #[test]
    fn test_forced_ship_strategy_must_deliver() {
        let estimator = CostEstimator::default();
        let requirement = InputRequirement {
            global: RequestedGlobalProperties::HashPartitioned(FieldSet::from([0])),
            local: RequestedLocalProperties::none(),
        };
        let source = source_candidate(0, GlobalProperties::random(), LocalProperties::none(), 2);

        let mut forced = request(&requirement, 2);
        forced.forced = Some(ShipStrategyType::PartitionRandom);
        assert!(Channel::synthesize(&source, &forced, &estimator).is_empty());

        forced.forced = Some(ShipStrategyType::Broadcast);
        let channels = Channel::synthesize(&source, &forced, &estimator);
        assert_eq!(&ShipStrategy::Broadcast, channels[0].ship_strategy());
    }

    #[test]
    fn test_join_key_order() {
        let estimator = CostEstimator::default();
        let keys = FieldList::from([2, 1]);
        let requirement = InputRequirement {
            global: RequestedGlobalProperties::HashPartitioned(keys.to_field_set()),
            local: RequestedLocalProperties::none(),
        };
        let source = source_candidate(
            0,
            GlobalProperties::hash_partitioned([1]),
            LocalProperties::none(),
            2,
        );

        let mut keyed = request(&requirement, 2);
        keyed.partitioning_keys = Some(&keys);
        let channels = Channel::synthesize(&source, &keyed, &estimator);

        assert_eq!(2, channels.len());
        assert_eq!(&ShipStrategy::Forward, channels[0].ship_strategy());
        assert_eq!(&ShipStrategy::PartitionHash(keys.clone()), channels[1].ship_strategy());
    }
}
