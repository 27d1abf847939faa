//! Property-based tests for the statistics.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use crate::cell::Cell;
    use crate::distribution::{BoxStats, Histogram, quantile, sorted_finite};
    use crate::frame::{Frame, concat};

    fn values() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(-1.0e6..1.0e6f64, 1..200)
    }

    proptest! {
        #[test]
        fn test_quantiles_are_ordered(v in values()) {
            let sorted = sorted_finite(&v);
            let q: Vec<f64> = [0.0, 0.25, 0.5, 0.75, 1.0]
                .iter()
                .map(|p| quantile(&sorted, *p).unwrap())
                .collect();
            for pair in q.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
            prop_assert_eq!(q[0], sorted[0]);
            prop_assert_eq!(q[4], sorted[sorted.len() - 1]);
        }

        #[test]
        fn test_histogram_counts_every_value(v in values()) {
            let h = Histogram::auto(&v).unwrap();
            prop_assert_eq!(h.counts.iter().sum::<usize>(), v.len());
            prop_assert_eq!(h.edges.len(), h.counts.len() + 1);
            for pair in h.edges.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
        }

        #[test]
        fn test_box_stats_partition_values(v in values()) {
            let b = BoxStats::from_values(&v).unwrap();
            prop_assert!(b.whisker_low <= b.q1);
            prop_assert!(b.q1 <= b.median && b.median <= b.q3);
            prop_assert!(b.q3 <= b.whisker_high);
            for f in &b.fliers {
                prop_assert!(*f < b.whisker_low || *f > b.whisker_high);
            }
        }

        #[test]
        fn test_concat_preserves_rows(sizes in prop::collection::vec(0usize..20, 0..6)) {
            let frames: Vec<Frame> = sizes
                .iter()
                .enumerate()
                .map(|(i, &n)| {
                    let rows = (0..n).map(|r| vec![Cell::Number(r as f64)]).collect();
                    Frame::new(vec![format!("c{}", i % 3)], rows).unwrap()
                })
                .collect();
            let combined = concat(frames);
            prop_assert_eq!(combined.shape().0, sizes.iter().sum::<usize>());
            for row in combined.rows() {
                prop_assert_eq!(row.iter().filter(|c| !c.is_empty()).count(), 1);
            }
        }
    }
}
