//! Visual particles (sparks, debris)
//!
//! Particles do not affect gameplay. They age by `life += dt` and are
//! expired once `life >= max_life`.

use std::collections::VecDeque;
use std::ops::Range;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_MAX_PARTICLES;

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds lived so far
    pub life: f32,
    /// Seconds until expiry
    pub max_life: f32,
    pub size: f32,
    /// Packed 0xRRGGBB, interpreted by the renderer
    pub color: u32,
}

impl Particle {
    /// Render alpha, fading linearly from 1 to 0 over the particle's life
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (1.0 - self.life / self.max_life).clamp(0.0, 1.0)
    }

    pub fn is_dead(&self) -> bool {
        self.life >= self.max_life
    }
}

/// Parameters for a radial burst
#[derive(Debug, Clone)]
pub struct Burst {
    pub count: usize,
    pub speed: Range<f32>,
    pub life: Range<f32>,
    pub size: Range<f32>,
    pub color: u32,
    /// Center direction (radians) and spread; `None` emits in all directions
    pub cone: Option<(f32, f32)>,
}

impl Default for Burst {
    fn default() -> Self {
        Self {
            count: 12,
            speed: 60.0..160.0,
            life: 0.3..0.6,
            size: 2.0..4.0,
            color: 0xffffff,
            cone: None,
        }
    }
}

/// Capped particle pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleSystem {
    particles: VecDeque<Particle>,
    max: usize,
    /// Velocity damping per second (0 = none)
    pub drag: f32,
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARTICLES)
    }
}

impl ParticleSystem {
    pub fn new(max: usize) -> Self {
        Self {
            particles: VecDeque::with_capacity(max.min(DEFAULT_MAX_PARTICLES)),
            max,
            drag: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.max
    }

    /// Add a particle, evicting the oldest when full
    pub fn push(&mut self, particle: Particle) {
        if self.max == 0 {
            return;
        }
        while self.particles.len() >= self.max {
            self.particles.pop_front();
        }
        self.particles.push_back(particle);
    }

    /// Emit `burst.count` particles from `origin`
    pub fn emit_burst<R: Rng>(&mut self, rng: &mut R, origin: Vec2, burst: &Burst) {
        for _ in 0..burst.count {
            let angle = match burst.cone {
                Some((center, spread)) => center + rng.random_range(-0.5..=0.5) * spread,
                None => rng.random_range(0.0..std::f32::consts::TAU),
            };
            let speed = sample(rng, &burst.speed);
            self.push(Particle {
                pos: origin,
                vel: Vec2::from_angle(angle) * speed,
                life: 0.0,
                max_life: sample(rng, &burst.life),
                size: sample(rng, &burst.size),
                color: burst.color,
            });
        }
    }

    /// Move particles and age them by `dt`
    pub fn advance(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let damping = (1.0 - self.drag * dt).max(0.0);
        for p in &mut self.particles {
            p.pos += p.vel * dt;
            p.vel *= damping;
            p.life += dt;
        }
    }

    /// Drop particles whose life has run out. Returns how many were removed.
    pub fn expire(&mut self) -> usize {
        let before = self.particles.len();
        self.particles.retain(|p| !p.is_dead());
        before - self.particles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

/// Uniform sample that tolerates empty ranges
fn sample<R: Rng>(rng: &mut R, range: &Range<f32>) -> f32 {
    if range.start < range.end {
        rng.random_range(range.clone())
    } else {
        range.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn spark(max_life: f32) -> Particle {
        Particle {
            pos: Vec2::ZERO,
            vel: Vec2::new(10.0, 0.0),
            life: 0.0,
            max_life,
            size: 2.0,
            color: 0xff0000,
        }
    }

    #[test]
    fn test_alpha_fades_with_life() {
        let mut p = spark(1.0);
        assert_eq!(p.alpha(), 1.0);
        p.life = 0.25;
        assert!((p.alpha() - 0.75).abs() < 1e-6);
        p.life = 2.0;
        assert_eq!(p.alpha(), 0.0);
    }

    #[test]
    fn test_advance_then_expire() {
        let mut system = ParticleSystem::new(8);
        system.push(spark(0.1));
        system.push(spark(1.0));
        system.advance(0.1);
        assert_eq!(system.expire(), 1);
        assert_eq!(system.len(), 1);
        let p = system.iter().next().unwrap();
        assert!((p.pos.x - 1.0).abs() < 1e-5);
        assert_eq!(system.expire(), 0);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut system = ParticleSystem::new(2);
        system.push(spark(1.0));
        system.push(spark(2.0));
        system.push(spark(3.0));
        let lives: Vec<f32> = system.iter().map(|p| p.max_life).collect();
        assert_eq!(lives, vec![2.0, 3.0]);
    }

    #[test]
    fn test_full_pool_keeps_the_newest() {
        let mut system = ParticleSystem::new(4096);
        for i in 0..10_000 {
            system.push(spark(i as f32));
        }
        assert_eq!(system.len(), 4096);
        assert_eq!(system.iter().next().map(|p| p.max_life), Some(5904.0));
        assert_eq!(system.iter().last().map(|p| p.max_life), Some(9999.0));
    }

    #[test]
    fn test_zero_capacity_disables_particles() {
        let mut system = ParticleSystem::new(0);
        system.push(spark(1.0));
        assert!(system.is_empty());
    }

    #[test]
    fn test_burst_is_seeded() {
        let burst = Burst {
            count: 5,
            ..Default::default()
        };
        let mut a = ParticleSystem::new(16);
        let mut b = ParticleSystem::new(16);
        a.emit_burst(&mut Pcg32::seed_from_u64(7), Vec2::ZERO, &burst);
        b.emit_burst(&mut Pcg32::seed_from_u64(7), Vec2::ZERO, &burst);
        assert_eq!(a.len(), 5);
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert_eq!(pa.vel, pb.vel);
            assert_eq!(pa.max_life, pb.max_life);
        }
    }

    #[test]
    fn test_drag_slows_particles() {
        let mut system = ParticleSystem::new(4);
        system.drag = 5.0;
        system.push(spark(10.0));
        system.advance(0.1);
        let p = system.iter().next().unwrap();
        assert!((p.vel.x - 5.0).abs() < 1e-4);
    }
}
