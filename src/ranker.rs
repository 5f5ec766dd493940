//! Ordering of the merged per-nation totals

use crate::aggregator::RevenueByNation;
use crate::revenue::Revenue;

/// Final query result row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NationRevenue {
    pub nation: String,
    pub revenue: Revenue,
}

/// Sort by revenue descending, ties broken by nation name ascending
///
/// Every nation in `totals` appears exactly once, zero totals included.
pub fn rank(totals: RevenueByNation) -> Vec<NationRevenue> {
    let mut results: Vec<NationRevenue> = totals
        .into_iter()
        .map(|(nation, revenue)| NationRevenue { nation, revenue })
        .collect();

    results.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.nation.cmp(&b.nation))
    });

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(rows: &[(&str, i128)]) -> RevenueByNation {
        rows.iter()
            .map(|(n, r)| (n.to_string(), Revenue::from_raw(*r)))
            .collect()
    }

    #[test]
    fn test_sorted_descending() {
        let ranked = rank(totals(&[("INDIA", 10), ("CHINA", 30), ("JAPAN", 20)]));
        let names: Vec<_> = ranked.iter().map(|r| r.nation.as_str()).collect();
        assert_eq!(names, vec!["CHINA", "JAPAN", "INDIA"]);
        assert!(ranked.windows(2).all(|w| w[0].revenue >= w[1].revenue));
    }

    #[test]
    fn test_ties_by_name() {
        let input = &[("VIETNAM", 5), ("INDONESIA", 5), ("JAPAN", 9), ("CHINA", 5)];
        let first = rank(totals(input));
        let names: Vec<_> = first.iter().map(|r| r.nation.as_str()).collect();
        assert_eq!(names, vec!["JAPAN", "CHINA", "INDONESIA", "VIETNAM"]);

        // HashMap iteration order differs between maps; ranking must not
        for _ in 0..10 {
            assert_eq!(rank(totals(input)), first);
        }
    }

    #[test]
    fn test_keeps_zero_totals() {
        let ranked = rank(totals(&[("CHINA", 0), ("INDIA", 1)]));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[1].nation, "CHINA");
        assert_eq!(ranked[1].revenue, Revenue::ZERO);
    }

    #[test]
    fn test_empty() {
        assert!(rank(RevenueByNation::new()).is_empty());
    }
}
