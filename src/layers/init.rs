use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Half-width of the uniform jitter applied by `Initializer::HeUniform`.
pub const HE_UNIFORM_SPREAD: f64 = 0.4;

/// Produces initial parameter values. Every draw comes from the caller's
/// generator, so seeding that generator makes initialization reproducible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    /// Prior drawn uniformly in [-1, 1), then jittered uniformly within
    /// `[prior - spread, prior + spread]`.
    HeUniform { spread: f64 },
    /// N(0, sqrt(2 / fan_in)).
    HeNormal,
    /// N(0, sqrt(1 / fan_in)).
    XavierNormal,
    Zeros,
    Ones,
    Constant(f64),
}

impl Initializer {
    pub fn he_uniform() -> Initializer {
        Initializer::HeUniform { spread: HE_UNIFORM_SPREAD }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Initializer::HeUniform { spread } if !spread.is_finite() || *spread < 0.0 => {
                Err(NnError::InvalidConfig(format!(
                    "he-uniform spread must be finite and non-negative, got {spread}"
                )))
            }
            Initializer::Constant(v) if !v.is_finite() => Err(NnError::InvalidConfig(format!(
                "constant initializer must be finite, got {v}"
            ))),
            _ => Ok(()),
        }
    }

    /// A `rows x cols` matrix; `cols` is the fan-in.
    pub fn matrix<R: Rng + ?Sized>(&self, rows: usize, cols: usize, rng: &mut R) -> Result<Matrix> {
        self.validate()?;
        let fan_in = cols.max(1) as f64;
        let m = match self {
            Initializer::HeUniform { spread } => {
                let mut prior = Matrix::random_uniform(rows, cols, -1.0, 1.0, rng);
                for value in prior.data.iter_mut().flatten() {
                    *value = jitter(*value, *spread, rng);
                }
                prior
            }
            Initializer::HeNormal => Matrix::random_normal(rows, cols, (2.0 / fan_in).sqrt(), rng),
            Initializer::XavierNormal => Matrix::random_normal(rows, cols, (1.0 / fan_in).sqrt(), rng),
            Initializer::Zeros => Matrix::zeros(rows, cols),
            Initializer::Ones => Matrix::zeros(rows, cols).map(|_| 1.0),
            Initializer::Constant(v) => Matrix::zeros(rows, cols).map(|_| *v),
        };
        Ok(m)
    }

    pub fn vector<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Result<Vec<f64>> {
        Ok(self.matrix(1, len, rng)?.to_array())
    }
}

fn jitter<R: Rng + ?Sized>(prior: f64, spread: f64, rng: &mut R) -> f64 {
    let (down, upper) = (prior - spread, prior + spread);
    down + rng.gen::<f64>() * (upper - down)
}

/// A weight matrix together with the initializer that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub kernels: Matrix,
    pub init: Initializer,
}

impl Weights {
    pub fn new<R: Rng + ?Sized>(rows: usize, cols: usize, init: Initializer, rng: &mut R) -> Result<Weights> {
        let kernels = init.matrix(rows, cols, rng)?;
        Ok(Weights { kernels, init })
    }
}

/// A bias vector together with the initializer that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biases {
    pub values: Vec<f64>,
    pub init: Initializer,
}

impl Biases {
    pub fn new<R: Rng + ?Sized>(len: usize, init: Initializer, rng: &mut R) -> Result<Biases> {
        let values = init.vector(len, rng)?;
        Ok(Biases { values, init })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn he_uniform_stays_within_jitter_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let m = Initializer::he_uniform().matrix(8, 8, &mut rng).unwrap();
        let bound = 1.0 + HE_UNIFORM_SPREAD;
        assert!(m.to_array().iter().all(|x| x.abs() <= bound));
    }

    #[test]
    fn same_seed_same_weights() {
        let a = Weights::new(3, 2, Initializer::HeNormal, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = Weights::new(3, 2, Initializer::HeNormal, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn malformed_spread_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        let bad = Initializer::HeUniform { spread: -1.0 };
        assert!(matches!(bad.matrix(1, 1, &mut rng), Err(NnError::InvalidConfig(_))));
    }
}
