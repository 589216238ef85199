//! Particle emitters
//!
//! Simulation only. Drawing the particles is the renderer's business.

use crate::foundation::math::Vec3;

/// One simulated particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// World position
    pub position: Vec3,
    /// Units per second
    pub velocity: Vec3,
    /// Seconds since emission
    pub age: f32,
}

/// Particle system advanced during the animate stage
pub trait ParticleEmitter {
    /// Advance by `delta_time`, emitting at the owner's world position
    fn update(&mut self, origin: Vec3, delta_time: f32);

    /// Live particles, oldest first
    fn particles(&self) -> &[Particle];

    /// Drop every particle
    fn reset(&mut self) {}
}

/// Constant-rate emitter with a fixed launch velocity
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleEmitter {
    /// Particles per second
    pub rate: f32,
    /// Seconds a particle lives
    pub lifetime: f32,
    /// Launch velocity
    pub initial_velocity: Vec3,
    /// Upper bound on live particles
    pub max_particles: usize,
    accumulator: f32,
    particles: Vec<Particle>,
}

impl SimpleEmitter {
    /// Emitter producing `rate` particles per second that live `lifetime` seconds
    pub fn new(rate: f32, lifetime: f32, initial_velocity: Vec3) -> Self {
        Self {
            rate,
            lifetime,
            initial_velocity,
            max_particles: 1024,
            accumulator: 0.0,
            particles: Vec::new(),
        }
    }
}

impl ParticleEmitter for SimpleEmitter {
    fn update(&mut self, origin: Vec3, delta_time: f32) {
        for particle in &mut self.particles {
            particle.age += delta_time;
            particle.position += particle.velocity * delta_time;
        }
        let lifetime = self.lifetime;
        self.particles.retain(|p| p.age < lifetime);

        self.accumulator += self.rate * delta_time;
        while self.accumulator >= 1.0 {
            self.accumulator -= 1.0;
            if self.particles.len() < self.max_particles {
                self.particles.push(Particle {
                    position: origin,
                    velocity: self.initial_velocity,
                    age: 0.0,
                });
            }
        }
    }

    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn reset(&mut self) {
        self.particles.clear();
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_emission_and_expiry() {
        let mut emitter = SimpleEmitter::new(10.0, 0.25, Vec3::y());
        emitter.update(Vec3::zeros(), 0.1);
        assert_eq!(emitter.particles().len(), 1);

        emitter.update(Vec3::zeros(), 0.1);
        emitter.update(Vec3::zeros(), 0.1);
        assert_eq!(emitter.particles().len(), 3);
        assert_relative_eq!(emitter.particles()[0].position.y, 0.2, epsilon = 1e-5);

        // The first particle reaches its lifetime and is dropped
        emitter.update(Vec3::zeros(), 0.1);
        assert_eq!(emitter.particles().len(), 3);

        emitter.reset();
        assert!(emitter.particles().is_empty());
    }

    #[test]
    fn test_capacity_bound() {
        let mut emitter = SimpleEmitter::new(1000.0, 10.0, Vec3::zeros());
        emitter.max_particles = 5;
        emitter.update(Vec3::zeros(), 1.0);
        assert_eq!(emitter.particles().len(), 5);
    }
}
