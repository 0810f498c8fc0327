use std::error::Error;
use std::fmt;

/// InputValueError is used if some simulation option or parameter does not fulfill the posed
/// requirements, e.g., a fractional track position lying outside [0, 1].
#[derive(Debug, Clone)]
pub struct InputValueError(pub String);

impl fmt::Display for InputValueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid input value: {}", self.0)
    }
}

impl Error for InputValueError {}

#[derive(Debug, Clone, Copy)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array.
pub fn argsort<T: std::cmp::PartialOrd>(x: &[T], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    match order {
        SortOrder::Ascending => indices.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap()),
        SortOrder::Descending => indices.sort_by(|&a, &b| x[b].partial_cmp(&x[a]).unwrap()),
    }
    indices
}

/// lin_interp returns the linearly interpolated value at x for given discrete data points xp, fp.
/// xp must be increasing. Inspired by numpy.interp.
pub fn lin_interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    if xp.len() != fp.len() {
        panic!("Number of items in xp and fp must be equal!")
    }

    if x <= xp[0] {
        return fp[0];
    }

    for i in 1..xp.len() {
        if x <= xp[i] {
            return fp[i - 1] + (x - xp[i - 1]) * (fp[i] - fp[i - 1]) / (xp[i] - xp[i - 1]);
        }
    }

    *fp.last().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argsort_descending_is_stable_for_strict_values() {
        let x = [2.0, 5.0, 1.0, 4.0];
        assert_eq!(argsort(&x, SortOrder::Descending), vec![1, 3, 0, 2]);
    }

    #[test]
    fn lin_interp_clamps_at_both_ends() {
        let xp = [0.0, 50.0, 100.0];
        let fp = [70.0, 95.0, 130.0];
        assert_eq!(lin_interp(-10.0, &xp, &fp), 70.0);
        assert_eq!(lin_interp(200.0, &xp, &fp), 130.0);
        assert_eq!(lin_interp(25.0, &xp, &fp), 82.5);
    }
}
