//! Strategies for blending sample values with natural-neighbor weights.
use core::fmt;
use core::str::FromStr;

use crate::geometry::{dot, sub, Vec3};

/// How sample values are combined at a query point.
///
/// All three reproduce sample values exactly at the samples. They differ in
/// smoothness and in whether they can leave the range of the samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Each neighbor contributes its value extrapolated to the query point
    /// along its gradient. C1 away from the samples and exact for linear
    /// fields, but may overshoot the sample range.
    HaleLiang,

    /// The Watson-Sambridge value corrected by half the inverse-square-distance
    /// weighted mean of the neighbor residuals. C0, needs no gradients, and
    /// never leaves the sample range.
    BraunSambridge,

    /// The plain weighted average. C0 at the samples and never leaves the
    /// sample range.
    #[default]
    WatsonSambridge,
}

impl Method {
    pub const ALL: [Method; 3] = [
        Method::HaleLiang,
        Method::BraunSambridge,
        Method::WatsonSambridge,
    ];

    /// Whether the blend reads node gradients.
    pub fn uses_gradients(&self) -> bool {
        matches!(self, Method::HaleLiang)
    }

    /// Blend the values of the natural neighbors of `q`.
    ///
    /// `neighbors` holds `(node, weight)` pairs with weights summing to one;
    /// `gradient` is only called for [`Method::HaleLiang`].
    pub(crate) fn blend<G>(
        &self,
        q: &Vec3,
        neighbors: &[(usize, f64)],
        points: &[Vec3],
        values: &[f64],
        gradient: G,
    ) -> f64
    where
        G: Fn(usize) -> [f64; 3],
    {
        match self {
            Method::WatsonSambridge => watson_sambridge(neighbors, values),
            Method::HaleLiang => neighbors
                .iter()
                .map(|&(node, w)| {
                    let d = sub(q, &points[node]);
                    w * (values[node] + dot(&gradient(node), &d))
                })
                .sum(),
            Method::BraunSambridge => {
                let s = watson_sambridge(neighbors, values);
                let mut residual = 0.0;
                let mut total = 0.0;
                for &(node, w) in neighbors {
                    let d = sub(q, &points[node]);
                    let r2 = dot(&d, &d);
                    if r2 == 0.0 {
                        // On a sample
                        return values[node];
                    }
                    residual += w / r2 * (values[node] - s);
                    total += w / r2;
                }
                s + 0.5 * residual / total
            }
        }
    }
}

fn watson_sambridge(neighbors: &[(usize, f64)], values: &[f64]) -> f64 {
    neighbors.iter().map(|&(node, w)| w * values[node]).sum()
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::HaleLiang => "HALE_LIANG",
            Method::BraunSambridge => "BRAUN_SAMBRIDGE",
            Method::WatsonSambridge => "WATSON_SAMBRIDGE",
        };
        f.write_str(name)
    }
}

impl FromStr for Method {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "HALE_LIANG" => Ok(Method::HaleLiang),
            "BRAUN_SAMBRIDGE" => Ok(Method::BraunSambridge),
            "WATSON_SAMBRIDGE" => Ok(Method::WatsonSambridge),
            _ => Err("Unrecognized interpolation method"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const POINTS: [Vec3; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
    const VALUES: [f64; 3] = [1.0, 3.0, -1.0];

    #[test]
    fn test_watson_sambridge_is_weighted_average() {
        let nb = [(0, 0.5), (1, 0.25), (2, 0.25)];
        let v = Method::WatsonSambridge.blend(&[0.3, 0.4, 0.0], &nb, &POINTS, &VALUES, |_| {
            panic!("gradients are not used")
        });
        assert_eq!(v, 0.5 + 0.75 - 0.25);
    }

    #[test]
    fn test_hale_liang_extrapolates_along_gradient() {
        // Linear field f = 1 + 2x - y sampled at POINTS
        let nb = [(0, 0.5), (1, 0.25), (2, 0.25)];
        let q = [0.3, 0.4, 0.0];
        let v = Method::HaleLiang.blend(&q, &nb, &POINTS, &VALUES, |_| [2.0, -1.0, 0.0]);
        assert!((v - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_braun_sambridge_on_sample() {
        let nb = [(0, 0.2), (1, 0.8)];
        let v = Method::BraunSambridge.blend(&POINTS[1], &nb, &POINTS, &VALUES, |_| [0.0; 3]);
        assert_eq!(v, 3.0);
    }

    #[test]
    fn test_braun_sambridge_constant_field() {
        let values = [2.5; 3];
        let nb = [(0, 0.5), (1, 0.25), (2, 0.25)];
        let v = Method::BraunSambridge.blend(&[0.3, 0.4, 0.0], &nb, &POINTS, &values, |_| [0.0; 3]);
        assert!((v - 2.5).abs() < 1e-15);
    }

    #[test]
    fn test_names() {
        for m in Method::ALL {
            assert_eq!(m.to_string().parse::<Method>(), Ok(m));
        }
        assert_eq!("hale-liang".parse::<Method>(), Ok(Method::HaleLiang));
        assert!("nearest".parse::<Method>().is_err());
    }
}
