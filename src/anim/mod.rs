//! Timed interpolation (tween) scheduling.
//!
//! Effects that animate declaratively (embers, firefly pulses, the sun's
//! linear path and its decorations) schedule a [`Tween`] once per cycle and
//! react to the progress/finish events it produces, instead of integrating
//! motion by hand every frame.

pub mod ease;

pub use ease::Ease;

use serde::{Deserialize, Serialize};

/// Handle to a scheduled tween
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(pub u64);

/// How many times a tween plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    #[default]
    Once,
    /// Play once, then repeat `n` more times
    Times(u32),
    Forever,
}

/// Description of a single interpolation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    /// Seconds per play
    pub duration: f32,
    pub ease: Ease,
    pub repeat: Repeat,
    /// Alternate direction on every repeat
    pub yoyo: bool,
}

impl Tween {
    /// A single linear play lasting `duration` seconds
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            ease: Ease::Linear,
            repeat: Repeat::Once,
            yoyo: false,
        }
    }

    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }
}

/// Progress report for one tween for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TweenEvent<K> {
    pub id: TweenId,
    /// Owner-supplied key (e.g. a particle index)
    pub key: K,
    /// Eased progress in `0..=1`, already reflected for yoyo plays
    pub progress: f32,
    /// Last event for this tween; it is no longer scheduled
    pub finished: bool,
}

/// The scheduling capability the effect systems depend on.
///
/// Hosts with their own animation engine can implement this; the crate ships
/// [`Tweens`] as the default.
pub trait TweenScheduler<K> {
    /// Schedule `tween` tagged with `key`
    fn schedule(&mut self, key: K, tween: Tween) -> TweenId;

    /// Cancel a tween immediately. Returns whether it was still running.
    fn cancel(&mut self, id: TweenId) -> bool;

    fn is_active(&self, id: TweenId) -> bool;

    /// Advance every tween by `dt` seconds, appending one event per tween
    fn advance(&mut self, dt: f32, events: &mut Vec<TweenEvent<K>>);

    /// Cancel everything
    fn clear(&mut self);

    fn active_count(&self) -> usize;
}

#[derive(Debug, Clone)]
struct Running<K> {
    id: TweenId,
    key: K,
    tween: Tween,
    elapsed: f32,
    /// Completed plays so far
    plays: u32,
}

/// Default tween scheduler: a flat list advanced in scheduling order
#[derive(Debug, Clone)]
pub struct Tweens<K> {
    running: Vec<Running<K>>,
    next_id: u64,
}

impl<K> Default for Tweens<K> {
    fn default() -> Self {
        Self {
            running: Vec::new(),
            next_id: 1,
        }
    }
}

impl<K> Tweens<K> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K: Copy> TweenScheduler<K> for Tweens<K> {
    fn schedule(&mut self, key: K, tween: Tween) -> TweenId {
        let id = TweenId(self.next_id);
        self.next_id += 1;
        self.running.push(Running {
            id,
            key,
            tween,
            elapsed: 0.0,
            plays: 0,
        });
        id
    }

    fn cancel(&mut self, id: TweenId) -> bool {
        let before = self.running.len();
        self.running.retain(|r| r.id != id);
        self.running.len() != before
    }

    fn is_active(&self, id: TweenId) -> bool {
        self.running.iter().any(|r| r.id == id)
    }

    fn advance(&mut self, dt: f32, events: &mut Vec<TweenEvent<K>>) {
        let dt = dt.max(0.0);

        self.running.retain_mut(|r| {
            r.elapsed += dt;
            let duration = r.tween.duration;

            // Consume completed plays; zero-length tweens finish immediately
            let mut finished = false;
            loop {
                if duration > 0.0 && r.elapsed < duration {
                    break;
                }
                let more = match r.tween.repeat {
                    Repeat::Once => false,
                    Repeat::Times(n) => r.plays < n,
                    Repeat::Forever => duration > 0.0,
                };
                if !more {
                    finished = true;
                    break;
                }
                r.plays += 1;
                r.elapsed -= duration.max(0.0);
                if duration <= 0.0 {
                    // Times(n) with zero duration: burn through the repeats
                    continue;
                }
            }

            let linear = if finished {
                1.0
            } else {
                (r.elapsed / duration).clamp(0.0, 1.0)
            };
            let reversed = r.tween.yoyo && r.plays % 2 == 1;
            let t = if reversed { 1.0 - linear } else { linear };

            events.push(TweenEvent {
                id: r.id,
                key: r.key,
                progress: r.tween.ease.apply(t),
                finished,
            });

            !finished
        });
    }

    fn clear(&mut self) {
        self.running.clear();
    }

    fn active_count(&self) -> usize {
        self.running.len()
    }
}
