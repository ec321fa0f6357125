use std::collections::HashSet;

use uuid::Uuid;

/// Percentage (`0..=100`) of the distinct requested products found in
/// `in_stock`.
///
/// An empty request scores 0: a store cannot match a list with nothing on it.
#[must_use]
pub fn availability_score(requested: &[Uuid], in_stock: &HashSet<Uuid>) -> f64 {
    let distinct: HashSet<&Uuid> = requested.iter().collect();
    if distinct.is_empty() {
        return 0.0;
    }

    let found = distinct.iter().filter(|id| in_stock.contains(**id)).count();

    #[allow(clippy::cast_precision_loss)]
    let (found, total) = (found as f64, distinct.len() as f64);
    found / total * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_match_is_one_hundred() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let stock: HashSet<Uuid> = [a, b].into_iter().collect();
        assert!((availability_score(&[a, b], &stock) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_match_is_proportional() {
        let wanted: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let stock: HashSet<Uuid> = [wanted[0], Uuid::new_v4()].into_iter().collect();
        assert!((availability_score(&wanted, &stock) - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn duplicate_requests_count_once() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let stock: HashSet<Uuid> = [a].into_iter().collect();
        assert!((availability_score(&[a, a, a, b], &stock) - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_request_scores_zero() {
        let stock: HashSet<Uuid> = [Uuid::new_v4()].into_iter().collect();
        assert!(availability_score(&[], &stock).abs() < f64::EPSILON);
    }

    #[test]
    fn nothing_in_stock_scores_zero() {
        assert!(availability_score(&[Uuid::new_v4()], &HashSet::new()).abs() < f64::EPSILON);
    }
}
