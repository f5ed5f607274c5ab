use cropmet_core::errors::{MetError, MetResult};
use serde::{Deserialize, Serialize};

/// Piecewise linear response `y(x)`.
///
/// Beyond the first and last points the end values are held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XYPairs {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl XYPairs {
    /// Points must be given in strictly increasing `x`.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> MetResult<Self> {
        let pairs = Self { x, y };
        pairs.check()?;
        Ok(pairs)
    }

    pub fn check(&self) -> MetResult<()> {
        let invalid = |message: &str| MetError::InvalidParameter {
            name: "response".to_string(),
            message: message.to_string(),
        };
        if self.x.is_empty() {
            return Err(invalid("at least one point is needed"));
        }
        if self.x.len() != self.y.len() {
            return Err(invalid("x and y must have the same length"));
        }
        if self.x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(invalid("x must be strictly increasing"));
        }
        Ok(())
    }

    pub fn value_at(&self, x: f64) -> f64 {
        let (Some(&first), Some(&last)) = (self.x.first(), self.x.last()) else {
            return 0.0;
        };
        if x <= first {
            return self.y[0];
        }
        if x >= last {
            return self.y[self.y.len() - 1];
        }
        let upper = self.x.partition_point(|&xi| xi <= x);
        let (x0, x1) = (self.x[upper - 1], self.x[upper]);
        let (y0, y1) = (self.y[upper - 1], self.y[upper]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn interpolates_and_holds_ends() {
        // A cardinal temperature response.
        let tt = XYPairs::new(vec![0.0, 26.0, 34.0], vec![0.0, 26.0, 0.0]).unwrap();
        assert_eq!(tt.value_at(-5.0), 0.0);
        assert!(is_close!(tt.value_at(13.0), 13.0));
        assert!(is_close!(tt.value_at(30.0), 13.0));
        assert_eq!(tt.value_at(26.0), 26.0);
        assert_eq!(tt.value_at(40.0), 0.0);
    }

    #[test]
    fn rejects_unordered_points() {
        assert!(XYPairs::new(vec![1.0, 1.0], vec![0.0, 1.0]).is_err());
        assert!(XYPairs::new(vec![1.0], vec![0.0, 1.0]).is_err());
        assert!(XYPairs::new(vec![], vec![]).is_err());
    }
}
