//! Native CartPole-v1, same dynamics and limits as the gymnasium version.

use anyhow::{Result, bail};
use nl_core::{
    env::{Env, EnvironmentDescription, SnapShot, Space},
    rng::RNG,
};
use rand::Rng;

const GRAVITY: f32 = 9.8;
const MASS_CART: f32 = 1.0;
const MASS_POLE: f32 = 0.1;
const TOTAL_MASS: f32 = MASS_CART + MASS_POLE;
// half the pole length
const LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = MASS_POLE * LENGTH;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * std::f32::consts::PI / 360.0;
const X_THRESHOLD: f32 = 2.4;
const MAX_STEPS: usize = 500;

#[derive(Debug, Clone, Default)]
pub struct CartPole {
    x: f32,
    x_dot: f32,
    theta: f32,
    theta_dot: f32,
    steps: usize,
}

impl CartPole {
    pub fn new() -> Self {
        Self::default()
    }

    fn observation(&self) -> Vec<f32> {
        vec![self.x, self.x_dot, self.theta, self.theta_dot]
    }

    fn terminated(&self) -> bool {
        self.x.abs() > X_THRESHOLD || self.theta.abs() > THETA_THRESHOLD
    }
}

impl Env for CartPole {
    type Observation = Vec<f32>;
    type Action = usize;

    fn reset(&mut self) -> Result<Vec<f32>> {
        RNG.with_borrow_mut(|rng| {
            self.x = rng.random_range(-0.05..0.05);
            self.x_dot = rng.random_range(-0.05..0.05);
            self.theta = rng.random_range(-0.05..0.05);
            self.theta_dot = rng.random_range(-0.05..0.05);
        });
        self.steps = 0;
        Ok(self.observation())
    }

    fn step(&mut self, action: &usize) -> Result<SnapShot<Vec<f32>>> {
        let force = match action {
            0 => -FORCE_MAG,
            1 => FORCE_MAG,
            other => bail!("CartPole has 2 actions, got action {other}"),
        };
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        let temp =
            (force + POLE_MASS_LENGTH * self.theta_dot * self.theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        // euler integration
        self.x += TAU * self.x_dot;
        self.x_dot += TAU * x_acc;
        self.theta += TAU * self.theta_dot;
        self.theta_dot += TAU * theta_acc;
        self.steps += 1;

        let terminated = self.terminated();
        let truncated = !terminated && self.steps >= MAX_STEPS;
        Ok(SnapShot::new(self.observation(), 1.0, terminated, truncated))
    }

    fn env_description(&self) -> EnvironmentDescription {
        EnvironmentDescription::new(Space::continous_from_dims(vec![4]), Space::Discrete(2))
    }

    fn noise_std_dev(&self) -> f32 {
        0.
    }
}
