use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

/// Temporally correlated exploration noise (Ornstein-Uhlenbeck process),
/// added to the actor's raw action before clipping.
///
/// The process state is NOT reset between episodes: the loop keeps the
/// correlation running across episode boundaries and callers that want a
/// fresh process at an episode start have to call [`OuNoise::reset`]
/// themselves.
#[derive(Debug, Clone)]
pub struct OuNoise {
    mu: f32,
    theta: f32,
    sigma: f32,
    dt: f32,
    state: Vec<f32>,
    rng: StdRng,
}

impl OuNoise {
    pub fn new(dim: usize) -> Self {
        Self::with_params(dim, 0.0, 0.15, 0.3, 1e-2)
    }

    pub fn with_params(dim: usize, mu: f32, theta: f32, sigma: f32, dt: f32) -> Self {
        Self {
            mu,
            theta,
            sigma,
            dt,
            state: vec![mu; dim],
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(dim: usize, seed: u64) -> Self {
        let mut noise = Self::new(dim);
        noise.rng = StdRng::seed_from_u64(seed);
        noise
    }

    /// Advances `x += theta * (mu - x) * dt + sigma * sqrt(dt) * N(0, 1)`
    /// per dimension and returns the new value.
    pub fn next(&mut self) -> Vec<f32> {
        let scale = self.sigma * self.dt.sqrt();
        for x in self.state.iter_mut() {
            let draw: f32 = self.rng.sample(StandardNormal);
            *x += self.theta * (self.mu - *x) * self.dt + scale * draw;
        }
        self.state.clone()
    }

    pub fn set_sigma(&mut self, sigma: f32) {
        self.sigma = sigma;
    }

    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    pub fn state(&self) -> &[f32] {
        &self.state
    }

    pub fn dim(&self) -> usize {
        self.state.len()
    }

    /// Pulls the process back to its mean. Caller responsibility, see the
    /// type-level docs.
    pub fn reset(&mut self) {
        self.state.fill(self.mu);
    }
}

/// How the loop sets the OU sigma each cycle. Data, not a branch hidden in
/// the controller: the fixed-vs-decaying choice travels with the config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SigmaSchedule {
    Fixed(f32),
    /// `max(floor, max - train_timer / decay_steps)`.
    LinearDecay { max: f32, floor: f32, decay_steps: f32 },
}

impl SigmaSchedule {
    pub fn sigma_at(&self, train_timer: usize) -> f32 {
        match self {
            Self::Fixed(sigma) => *sigma,
            Self::LinearDecay {
                max,
                floor,
                decay_steps,
            } => floor.max(max - train_timer as f32 / decay_steps),
        }
    }
}

impl Default for SigmaSchedule {
    fn default() -> Self {
        Self::Fixed(0.3)
    }
}

/// Adaptive parameter-space noise, the alternative exploration mode. A
/// proportional controller keeping the induced action-space noise near
/// `desired_action_stddev`.
#[derive(Debug, Clone)]
pub struct AdaptiveParamNoise {
    current_stddev: f32,
    desired_action_stddev: f32,
    adaptation_coefficient: f32,
}

impl AdaptiveParamNoise {
    pub fn new(
        initial_stddev: f32,
        desired_action_stddev: f32,
        adaptation_coefficient: f32,
    ) -> Self {
        Self {
            current_stddev: initial_stddev,
            desired_action_stddev,
            adaptation_coefficient,
        }
    }

    /// `distance` is the measured gap between perturbed and unperturbed
    /// action batches, see [`ddpg_distance_metric`].
    pub fn adapt(&mut self, distance: f32) {
        if distance > self.desired_action_stddev {
            self.current_stddev /= self.adaptation_coefficient;
        } else {
            self.current_stddev *= self.adaptation_coefficient;
        }
    }

    pub fn current_stddev(&self) -> f32 {
        self.current_stddev
    }
}

impl Default for AdaptiveParamNoise {
    fn default() -> Self {
        Self::new(0.05, 0.5, 1.05)
    }
}

/// Root-mean-square distance between two equally shaped action batches.
pub fn ddpg_distance_metric(actions_a: &[Vec<f32>], actions_b: &[Vec<f32>]) -> f32 {
    let mut sum = 0f32;
    let mut count = 0usize;
    for (a, b) in actions_a.iter().zip(actions_b) {
        for (x, y) in a.iter().zip(b) {
            sum += (x - y).powi(2);
            count += 1;
        }
    }
    if count == 0 {
        return 0.;
    }
    (sum / count as f32).sqrt()
}

#[cfg(test)]
mod test {
    use super::{AdaptiveParamNoise, OuNoise, SigmaSchedule, ddpg_distance_metric};

    #[test]
    fn ou_reverts_to_mean_without_volatility() {
        let mut noise = OuNoise::with_params(2, 0.0, 0.5, 0.0, 1.0);
        noise.state.copy_from_slice(&[1.0, -1.0]);
        for _ in 0..64 {
            noise.next();
        }
        for x in noise.state() {
            assert!(x.abs() < 1e-6, "state did not revert: {x}");
        }
    }

    #[test]
    fn ou_is_deterministic_under_a_seed() {
        let mut a = OuNoise::seeded(3, 42);
        let mut b = OuNoise::seeded(3, 42);
        for _ in 0..10 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn reset_pulls_state_back_to_mu() {
        let mut noise = OuNoise::seeded(4, 1);
        noise.next();
        noise.reset();
        assert_eq!(noise.state(), &[0.0; 4]);
    }

    #[test]
    fn decay_schedule_has_a_floor() {
        let schedule = SigmaSchedule::LinearDecay {
            max: 0.6,
            floor: 0.2,
            decay_steps: 1e5,
        };
        assert_eq!(schedule.sigma_at(0), 0.6);
        assert!((schedule.sigma_at(10_000) - 0.5).abs() < 1e-6);
        assert_eq!(schedule.sigma_at(100_000_000), 0.2);
        assert_eq!(SigmaSchedule::Fixed(0.3).sigma_at(99), 0.3);
    }

    #[test]
    fn param_noise_adapts_in_both_directions() {
        let mut spec = AdaptiveParamNoise::new(0.05, 0.5, 1.05);
        spec.adapt(0.1);
        assert!((spec.current_stddev() - 0.0525).abs() < 1e-6);
        spec.adapt(0.9);
        assert!((spec.current_stddev() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn distance_metric_is_rms() {
        let a = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        let b = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        assert!((ddpg_distance_metric(&a, &b) - 1.0).abs() < 1e-6);
        assert_eq!(ddpg_distance_metric(&[], &[]), 0.);
    }
}
