// SPDX-License-Identifier: GPL-3.0-only

//! Decorative particle bursts
//!
//! Celebrations are optional. The presenter fires them and ignores any
//! failure; nothing downstream waits on them.

use crate::constants::celebration;
use rand::Rng;
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum ParticleShape {
    Circle,
    /// Text glyph (emoji) particle
    Glyph(&'static str),
}

/// Parameters of one burst
#[derive(Debug, Clone, PartialEq)]
pub struct Burst {
    pub particle_count: u32,
    /// Cone width in degrees, centered straight up
    pub spread: f32,
    /// Vertical origin as a fraction of the screen height
    pub origin_y: f32,
    /// Size multiplier
    pub scalar: f32,
    pub gravity: f32,
    /// Particle lifetime in animation ticks
    pub ticks: u32,
    pub colors: Vec<(u8, u8, u8)>,
    pub shape: ParticleShape,
}

impl Burst {
    /// Graduation caps thrown into the air
    pub fn grad_caps() -> Self {
        Self {
            particle_count: 30,
            spread: 100.0,
            origin_y: 0.6,
            scalar: 4.0,
            gravity: 0.7,
            ticks: 300,
            colors: vec![celebration::CONFETTI_COLORS[1]],
            shape: ParticleShape::Glyph(celebration::GRAD_CAP),
        }
    }

    /// Round confetti in the booth colors
    pub fn confetti() -> Self {
        Self {
            particle_count: 100,
            spread: 70.0,
            origin_y: 0.6,
            scalar: 1.0,
            gravity: 0.6,
            ticks: celebration::DEFAULT_TICKS,
            colors: celebration::CONFETTI_COLORS.to_vec(),
            shape: ParticleShape::Circle,
        }
    }

    /// Both bursts played when a result is presented
    pub fn presentation() -> [Burst; 2] {
        [Self::grad_caps(), Self::confetti()]
    }
}

/// Something that can play a burst
pub trait Celebration: Send + Sync {
    fn celebrate(&self, burst: &Burst) -> Result<(), String>;
}

/// A live particle in normalized screen coordinates (0..1)
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    vx: f32,
    vy: f32,
    gravity: f32,
    pub ttl: u32,
    pub color: (u8, u8, u8),
    pub shape: ParticleShape,
}

/// Particle system drawn over the terminal UI
#[derive(Debug, Clone, Default)]
pub struct TerminalConfetti {
    particles: Arc<Mutex<Vec<Particle>>>,
}

/// Upward launch speed, in screen heights per tick
const LAUNCH_SPEED: std::ops::Range<f32> = 0.012..0.03;
/// Horizontal drag per tick
const DECAY: f32 = 0.97;
/// Gravity scale per tick
const GRAVITY_STEP: f32 = 0.0012;

impl TerminalConfetti {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance every particle by one tick and drop expired ones
    pub fn step(&self) {
        let Ok(mut particles) = self.particles.lock() else {
            return;
        };
        particles.retain_mut(|p| {
            p.x += p.vx;
            p.y += p.vy;
            p.vx *= DECAY;
            p.vy += p.gravity * GRAVITY_STEP;
            p.ttl = p.ttl.saturating_sub(1);
            p.ttl > 0 && p.y < 1.2 && (-0.2..1.2).contains(&p.x)
        });
    }

    pub fn particles(&self) -> Vec<Particle> {
        self.particles
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.particles.lock().map(|p| !p.is_empty()).unwrap_or(false)
    }
}

impl Celebration for TerminalConfetti {
    fn celebrate(&self, burst: &Burst) -> Result<(), String> {
        if burst.colors.is_empty() {
            return Err("burst has no colors".to_string());
        }
        let mut rng = rand::thread_rng();
        let half_spread = (burst.spread / 2.0).max(f32::EPSILON);
        let spawned: Vec<Particle> = (0..burst.particle_count)
            .map(|_| {
                let angle = (90.0 + rng.gen_range(-half_spread..half_spread)).to_radians();
                let speed = rng.gen_range(LAUNCH_SPEED);
                Particle {
                    x: 0.5,
                    y: burst.origin_y,
                    vx: angle.cos() * speed,
                    vy: -angle.sin() * speed,
                    gravity: burst.gravity,
                    ttl: rng.gen_range(burst.ticks / 2..=burst.ticks.max(1)),
                    color: burst.colors[rng.gen_range(0..burst.colors.len())],
                    shape: burst.shape.clone(),
                }
            })
            .collect();

        let mut particles = self
            .particles
            .lock()
            .map_err(|_| "confetti state poisoned".to_string())?;
        debug!(count = spawned.len(), "Confetti burst");
        particles.extend(spawned);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_bursts_match_booth_presets() {
        let [caps, confetti] = Burst::presentation();
        assert_eq!(caps.particle_count, 30);
        assert_eq!(caps.shape, ParticleShape::Glyph("🎓"));
        assert_eq!(confetti.particle_count, 100);
        assert_eq!(confetti.colors.len(), 3);
    }

    #[test]
    fn particles_rise_then_expire() {
        let confetti = TerminalConfetti::new();
        confetti.celebrate(&Burst::confetti()).unwrap();
        assert_eq!(confetti.particles().len(), 100);

        confetti.step();
        assert!(confetti.particles().iter().all(|p| p.y < 0.6));

        for _ in 0..celebration::DEFAULT_TICKS {
            confetti.step();
        }
        assert!(!confetti.is_active());
    }

    #[test]
    fn colorless_burst_is_an_error() {
        let burst = Burst {
            colors: Vec::new(),
            ..Burst::confetti()
        };
        assert!(TerminalConfetti::new().celebrate(&burst).is_err());
    }
}
