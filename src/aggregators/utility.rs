use super::Aggregate;
use crate::records::CompositeKey;

/// Sums values per key. Keys keep no particular order.
pub fn sum_per_key<I>(pairs: I) -> Aggregate
where
    I: IntoIterator<Item = (CompositeKey, f64)>,
{
    let mut totals = Aggregate::new();
    for (key, value) in pairs {
        *totals.entry(key).or_insert(0.0) += value;
    }
    totals
}

/// Rounds to `decimals` places, resolving ties on the exact decimal expansion
/// of the binary value (so `2.675` rounds down to `2.67`).
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> CompositeKey {
        let (region, year_month) = s.split_once('-').unwrap();
        CompositeKey::new(region, year_month)
    }

    #[test]
    fn test_sum_per_key_empty() {
        assert!(sum_per_key(Vec::new()).is_empty());
    }

    #[test]
    fn test_sum_per_key_groups_by_key() {
        let totals = sum_per_key(vec![
            (key("SP-2020-03"), 10.0),
            (key("RJ-2020-03"), 1.0),
            (key("SP-2020-03"), 5.0),
        ]);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&key("SP-2020-03")], 15.0);
        assert_eq!(totals[&key("RJ-2020-03")], 1.0);
    }

    #[test]
    fn test_sum_per_key_order_independent() {
        let pairs = vec![
            (key("SP-2020-03"), 4.0),
            (key("SP-2020-03"), 0.0),
            (key("SP-2020-04"), 7.0),
            (key("SP-2020-03"), 2.0),
        ];
        let mut reversed = pairs.clone();
        reversed.reverse();

        assert_eq!(sum_per_key(pairs), sum_per_key(reversed));
    }

    #[test]
    fn test_round_to_one_decimal() {
        assert_eq!(round_to(15.04, 1), 15.0);
        assert_eq!(round_to(15.06, 1), 15.1);
        assert_eq!(round_to(0.1 + 0.2, 1), 0.3);
        assert_eq!(round_to(2.675, 2), 2.67);
        assert_eq!(round_to(0.0, 1), 0.0);
    }
}
