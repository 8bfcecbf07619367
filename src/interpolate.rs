//! Resampling helpers for signal tracks.

use std::fmt;

/// An error raised when building an interpolator.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpolateError {
    /// Fewer than two samples.
    TooFewPoints(usize),
    /// `x` and `y` differ in length.
    LengthMismatch {
        /// Number of x values.
        x: usize,
        /// Number of y values.
        y: usize,
    },
    /// `x[index]` is not strictly greater than `x[index - 1]`.
    NotIncreasing(usize),
    /// A sample is NaN or infinite.
    NonFinite(usize),
}

impl fmt::Display for InterpolateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolateError::TooFewPoints(n) => {
                write!(f, "interpolation needs at least 2 points, got {n}")
            }
            InterpolateError::LengthMismatch { x, y } => {
                write!(f, "x has {x} values but y has {y}")
            }
            InterpolateError::NotIncreasing(index) => {
                write!(f, "x must be strictly increasing (at index {index})")
            }
            InterpolateError::NonFinite(index) => {
                write!(f, "sample {index} is not finite")
            }
        }
    }
}

impl std::error::Error for InterpolateError {}

/// Akima's piecewise cubic interpolator.
///
/// Tangents at each knot are a weighted average of the neighbouring secant
/// slopes, weighted by how much the slopes on the far side change. Flat runs
/// therefore stay flat and isolated spikes do not ring across the whole
/// series. The two missing slopes at each end are extrapolated linearly.
#[derive(Debug, Clone)]
pub struct Akima {
    x: Vec<f64>,
    y: Vec<f64>,
    secants: Vec<f64>,
    tangents: Vec<f64>,
}

impl Akima {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, InterpolateError> {
        if x.len() != y.len() {
            return Err(InterpolateError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(InterpolateError::TooFewPoints(x.len()));
        }
        if let Some(index) = x
            .iter()
            .zip(y)
            .position(|(a, b)| !a.is_finite() || !b.is_finite())
        {
            return Err(InterpolateError::NonFinite(index));
        }
        if let Some(index) = x.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(InterpolateError::NotIncreasing(index + 1));
        }

        let secants: Vec<f64> = x
            .windows(2)
            .zip(y.windows(2))
            .map(|(xs, ys)| (ys[1] - ys[0]) / (xs[1] - xs[0]))
            .collect();
        let tangents = akima_tangents(&secants);

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            secants,
            tangents,
        })
    }

    /// Evaluates the interpolant. Returns `None` outside `[x[0], x[n-1]]`.
    pub fn eval(&self, at: f64) -> Option<f64> {
        let n = self.x.len();
        if !(self.x[0]..=self.x[n - 1]).contains(&at) {
            return None;
        }

        let segment = self.x.partition_point(|&knot| knot <= at).clamp(1, n - 1) - 1;
        let h = self.x[segment + 1] - self.x[segment];
        let s = at - self.x[segment];
        let (t0, t1) = (self.tangents[segment], self.tangents[segment + 1]);
        let m = self.secants[segment];

        let c2 = (3.0 * m - 2.0 * t0 - t1) / h;
        let c3 = (t0 + t1 - 2.0 * m) / (h * h);
        Some(self.y[segment] + s * (t0 + s * (c2 + s * c3)))
    }

    /// Evaluates the interpolant on `points` evenly spaced samples spanning
    /// the knots, returning `(x, y)`.
    pub fn resample(&self, points: usize) -> (Vec<f64>, Vec<f64>) {
        let n = self.x.len();
        let grid = linspace(self.x[0], self.x[n - 1], points);
        let values = grid
            .iter()
            .map(|&at| self.eval(at).unwrap_or(self.y[n - 1]))
            .collect();
        (grid, values)
    }
}

fn akima_tangents(secants: &[f64]) -> Vec<f64> {
    let count = secants.len() + 1;
    if secants.len() == 1 {
        return vec![secants[0]; 2];
    }

    // Two extrapolated slopes on each side.
    let mut m = Vec::with_capacity(secants.len() + 4);
    let (m0, m1) = (secants[0], secants[1]);
    let pre1 = 2.0 * m0 - m1;
    let pre0 = 2.0 * pre1 - m0;
    m.push(pre0);
    m.push(pre1);
    m.extend_from_slice(secants);
    let (last, before) = (secants[secants.len() - 1], secants[secants.len() - 2]);
    let post0 = 2.0 * last - before;
    let post1 = 2.0 * post0 - last;
    m.push(post0);
    m.push(post1);

    let dm: Vec<f64> = m.windows(2).map(|pair| (pair[1] - pair[0]).abs()).collect();
    let weights: Vec<(f64, f64)> = (0..count).map(|i| (dm[i + 2], dm[i])).collect();
    let threshold = 1e-9
        * weights
            .iter()
            .map(|(f1, f2)| f1 + f2)
            .fold(0.0_f64, f64::max);

    weights
        .iter()
        .enumerate()
        .map(|(i, &(f1, f2))| {
            if f1 + f2 > threshold {
                (f1 * m[i + 1] + f2 * m[i + 2]) / (f1 + f2)
            } else {
                0.5 * (m[i + 1] + m[i + 2])
            }
        })
        .collect()
}

/// Returns `points` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (points - 1) as f64;
            (0..points)
                .map(|i| {
                    if i == points - 1 {
                        end
                    } else {
                        start + step * i as f64
                    }
                })
                .collect()
        }
    }
}

/// Largest number of positions [`impute_zeros`] will materialise.
pub const MAX_DENSE_SPAN: u64 = 1 << 24;

/// Expands sparse samples into a dense series covering `min(x)..=max(x)`,
/// filling positions without a sample with zero. Later duplicates win.
///
/// Returns `None` when the covered span exceeds [`MAX_DENSE_SPAN`].
pub fn impute_zeros(x: &[u64], y: &[f64]) -> Option<Vec<f64>> {
    let (Some(&min), Some(&max)) = (x.iter().min(), x.iter().max()) else {
        return Some(Vec::new());
    };

    let span = (max - min).checked_add(1)?;
    if span > MAX_DENSE_SPAN {
        return None;
    }

    let mut dense = vec![0.0; span as usize];
    for (&position, &value) in x.iter().zip(y) {
        dense[(position - min) as usize] = value;
    }
    Some(dense)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn passes_through_knots() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.0, 2.0, 1.0, 3.0, 0.5];
        let akima = Akima::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert!(close(akima.eval(*xi).unwrap(), *yi));
        }
    }

    #[test]
    fn reproduces_straight_lines() {
        let x = [0.0, 1.0, 3.0, 4.0];
        let y = [1.0, 3.0, 7.0, 9.0];
        let akima = Akima::new(&x, &y).unwrap();
        assert!(close(akima.eval(2.0).unwrap(), 5.0));
        assert!(close(akima.eval(0.5).unwrap(), 2.0));
    }

    #[test]
    fn flat_plateau_does_not_overshoot() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let akima = Akima::new(&x, &y).unwrap();
        let (_, values) = akima.resample(101);
        assert!(values.iter().all(|v| *v >= -1e-9 && *v <= 1.0 + 1e-9));
        assert!(close(akima.eval(3.5).unwrap(), 1.0));
    }

    #[test]
    fn two_points_are_linear() {
        let akima = Akima::new(&[0.0, 10.0], &[0.0, 5.0]).unwrap();
        assert!(close(akima.eval(4.0).unwrap(), 2.0));
        assert_eq!(akima.eval(10.5), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            Akima::new(&[0.0], &[1.0]).unwrap_err(),
            InterpolateError::TooFewPoints(1)
        );
        assert_eq!(
            Akima::new(&[0.0, 0.0], &[1.0, 2.0]).unwrap_err(),
            InterpolateError::NotIncreasing(1)
        );
        assert!(matches!(
            Akima::new(&[0.0, 1.0], &[1.0]),
            Err(InterpolateError::LengthMismatch { x: 2, y: 1 })
        ));
    }

    #[test]
    fn linspace_hits_both_ends() {
        let grid = linspace(2.0, 4.0, 5);
        assert_eq!(grid, vec![2.0, 2.5, 3.0, 3.5, 4.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn impute_zeros_fills_gaps() {
        assert_eq!(
            impute_zeros(&[10, 12, 14], &[1.0, 2.0, 3.0]),
            Some(vec![1.0, 0.0, 2.0, 0.0, 3.0])
        );
        assert_eq!(impute_zeros(&[], &[]), Some(Vec::new()));
    }

    #[test]
    fn impute_zeros_refuses_huge_spans() {
        assert_eq!(impute_zeros(&[0, u64::MAX], &[1.0, 2.0]), None);
        assert_eq!(impute_zeros(&[5, 5 + MAX_DENSE_SPAN], &[1.0, 2.0]), None);
    }
}
