//! Round-robin partitioning of candidates into per-worker queues.

use crate::core::model::{CandidateMap, WorkQueue, WorkUnit};

/// Flatten candidates into work units, preserving resource order and
/// within-resource rank order.
#[must_use]
pub fn flatten(candidates: &CandidateMap) -> Vec<WorkUnit> {
    candidates
        .iter()
        .flat_map(|entry| {
            entry.items.iter().map(|item| WorkUnit {
                resource: entry.resource.clone(),
                item: item.clone(),
            })
        })
        .collect()
}

/// Split candidates into `workers` queues; unit `i` goes to queue `i % n`.
///
/// `workers` is clamped to at least one. Queue sizes differ by at most one
/// and the result depends only on the input order.
#[must_use]
pub fn partition(candidates: &CandidateMap, workers: usize) -> Vec<WorkQueue> {
    let workers = workers.max(1);
    let mut queues = vec![WorkQueue::new(); workers];
    for (index, unit) in flatten(candidates).into_iter().enumerate() {
        queues[index % workers].push(unit);
    }
    tracing::debug!(
        workers,
        sizes = ?queues.iter().map(WorkQueue::len).collect::<Vec<_>>(),
        "partitioned work units"
    );
    queues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CandidateMap {
        [("A", vec!["t1", "t2", "t3"]), ("B", vec!["t4", "t5"])]
            .into_iter()
            .collect()
    }

    fn names(queue: &WorkQueue) -> Vec<String> {
        queue.units().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_flatten_preserves_order() {
        let flat: Vec<String> = flatten(&sample()).iter().map(ToString::to_string).collect();
        assert_eq!(flat, ["A.t1", "A.t2", "A.t3", "B.t4", "B.t5"]);
    }

    #[test]
    fn test_two_workers_round_robin() {
        let queues = partition(&sample(), 2);
        assert_eq!(queues.len(), 2);
        assert_eq!(names(&queues[0]), ["A.t1", "A.t3", "B.t5"]);
        assert_eq!(names(&queues[1]), ["A.t2", "B.t4"]);
    }

    #[test]
    fn test_zero_workers_clamped_to_one() {
        let queues = partition(&sample(), 0);
        assert_eq!(queues.len(), 1);
        assert_eq!(queues[0].len(), 5);
    }

    #[test]
    fn test_empty_candidates_yield_empty_queues() {
        let queues = partition(&CandidateMap::new(), 3);
        assert_eq!(queues.len(), 3);
        assert!(queues.iter().all(WorkQueue::is_empty));
    }

    #[test]
    fn test_more_workers_than_units() {
        let queues = partition(&sample(), 8);
        let sizes: Vec<usize> = queues.iter().map(WorkQueue::len).collect();
        assert_eq!(sizes, [1, 1, 1, 1, 1, 0, 0, 0]);
    }
}
