//! Tests for work partitioning

use std::collections::HashSet;

use flexible_freeze::core::{flatten, partition, CandidateMap, ItemName, WorkUnit};
use rand::Rng;

fn random_candidates(rng: &mut impl Rng) -> CandidateMap {
    let resources = rng.random_range(0..8);
    (0..resources)
        .map(|r| {
            let count = rng.random_range(0..20);
            let items: Vec<ItemName> = (0..count)
                .map(|i| ItemName::new("public", format!("t{r}_{i}")))
                .collect();
            (format!("db{r}"), items)
        })
        .collect()
}

#[test]
fn test_partition_properties_hold_for_random_inputs() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let candidates = random_candidates(&mut rng);
        let workers = rng.random_range(0..10);
        let queues = partition(&candidates, workers);
        let flat = flatten(&candidates);

        let n = workers.max(1);
        assert_eq!(queues.len(), n);

        // Unit i of the flattened list is dealt to queue i % n, slot i / n.
        for (i, unit) in flat.iter().enumerate() {
            assert_eq!(&queues[i % n].units()[i / n], unit, "unit {i} misplaced");
        }

        let sizes: Vec<usize> = queues.iter().map(|q| q.len()).collect();
        let max = sizes.iter().copied().max().unwrap_or(0);
        let min = sizes.iter().copied().min().unwrap_or(0);
        assert!(max - min <= 1, "unbalanced: {sizes:?}");

        let mut seen: HashSet<WorkUnit> = HashSet::new();
        for queue in &queues {
            for unit in queue.units() {
                assert!(seen.insert(unit.clone()), "{unit} assigned twice");
            }
        }
        assert_eq!(seen.len(), flat.len());

        // Within a queue, units of one resource keep their ranking order.
        for queue in &queues {
            for entry in candidates.iter() {
                let ranks: Vec<usize> = queue
                    .units()
                    .iter()
                    .filter(|u| u.resource == entry.resource)
                    .filter_map(|u| entry.items.iter().position(|i| *i == u.item))
                    .collect();
                assert!(ranks.windows(2).all(|w| w[0] < w[1]));
            }
        }
    }
}

#[test]
fn test_partition_is_deterministic() {
    let candidates: CandidateMap = [("A", vec!["t1", "t2", "t3"]), ("B", vec!["t4", "t5"])]
        .into_iter()
        .collect();
    assert_eq!(partition(&candidates, 3), partition(&candidates, 3));
}

#[test]
fn test_empty_resources_are_dropped() {
    let candidates: CandidateMap = [("A", Vec::<&str>::new()), ("B", vec!["t1"])]
        .into_iter()
        .collect();
    assert_eq!(candidates.resource_count(), 1);
    assert!(candidates.get("A").is_none());
    assert_eq!(flatten(&candidates), [WorkUnit::new("B", "t1")]);
}
