//! Which plate the preview is committed to.
//!
//! The lock holds on to one key until a challenger out-scores it by a
//! margin for several frames, or until the locked plate has been missing
//! long enough.

use crate::config::LockConfig;
use crate::tracker::ObjectKey;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LockState {
    #[default]
    Unlocked,
    Locked {
        key: ObjectKey,
        best_score: f32,
        /// Decisive challenger frames so far
        stable_count: u32,
        /// Consecutive frames without any candidate
        miss_count: u32,
    },
}

impl LockState {
    pub fn key(&self) -> Option<ObjectKey> {
        match self {
            Self::Unlocked => None,
            Self::Locked { key, .. } => Some(*key),
        }
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

/// Observable outcome of one lock update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTransition {
    Acquired(ObjectKey),
    Refreshed,
    Challenged,
    Switched { from: ObjectKey, to: ObjectKey },
    Missed,
    Released(ObjectKey),
    Idle,
}

#[derive(Debug, Clone)]
pub struct LockMachine {
    config: LockConfig,
    state: LockState,
}

impl Default for LockMachine {
    fn default() -> Self {
        Self::new(LockConfig::default())
    }
}

impl LockMachine {
    pub fn new(config: LockConfig) -> Self {
        Self {
            config,
            state: LockState::Unlocked,
        }
    }

    pub fn state(&self) -> &LockState {
        &self.state
    }

    pub fn locked_key(&self) -> Option<ObjectKey> {
        self.state.key()
    }

    /// Advance the lock with this frame's best candidate, if any.
    pub fn update(&mut self, candidate: Option<(ObjectKey, f32)>) -> LockTransition {
        let (next, transition) = match (self.state, candidate) {
            (LockState::Unlocked, None) => (LockState::Unlocked, LockTransition::Idle),
            (LockState::Unlocked, Some((key, score))) => (
                LockState::Locked {
                    key,
                    best_score: score,
                    stable_count: 1,
                    miss_count: 0,
                },
                LockTransition::Acquired(key),
            ),
            (
                LockState::Locked {
                    key,
                    best_score,
                    stable_count,
                    ..
                },
                Some((candidate_key, score)),
            ) if key == candidate_key => (
                LockState::Locked {
                    key,
                    best_score: best_score.max(score),
                    stable_count,
                    miss_count: 0,
                },
                LockTransition::Refreshed,
            ),
            (
                LockState::Locked {
                    key,
                    best_score,
                    stable_count,
                    miss_count,
                },
                Some((candidate_key, score)),
            ) => {
                if score >= best_score + self.config.challenge_margin {
                    if stable_count + 1 >= self.config.min_stable {
                        (
                            LockState::Locked {
                                key: candidate_key,
                                best_score: score,
                                stable_count: 0,
                                miss_count: 0,
                            },
                            LockTransition::Switched {
                                from: key,
                                to: candidate_key,
                            },
                        )
                    } else {
                        (
                            LockState::Locked {
                                key,
                                best_score,
                                stable_count: stable_count + 1,
                                miss_count,
                            },
                            LockTransition::Challenged,
                        )
                    }
                } else {
                    (
                        LockState::Locked {
                            key,
                            best_score,
                            stable_count: 0,
                            miss_count: 0,
                        },
                        LockTransition::Refreshed,
                    )
                }
            }
            (
                LockState::Locked {
                    key,
                    best_score,
                    stable_count,
                    miss_count,
                },
                None,
            ) => {
                if miss_count + 1 >= self.config.miss_tolerance {
                    (LockState::Unlocked, LockTransition::Released(key))
                } else {
                    (
                        LockState::Locked {
                            key,
                            best_score,
                            stable_count,
                            miss_count: miss_count + 1,
                        },
                        LockTransition::Missed,
                    )
                }
            }
        };
        self.state = next;

        match transition {
            LockTransition::Acquired(key) => tracing::info!(%key, "plate lock acquired"),
            LockTransition::Switched { from, to } => {
                tracing::info!(%from, %to, "plate lock switched")
            }
            LockTransition::Released(key) => tracing::info!(%key, "plate lock released"),
            LockTransition::Challenged => {
                tracing::debug!(state = ?self.state, "plate lock challenged")
            }
            _ => {}
        }
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ObjectKey = ObjectKey::Grid { col: 1, row: 0 };
    const B: ObjectKey = ObjectKey::Grid { col: 7, row: 0 };

    #[test]
    fn test_acquire_on_first_candidate() {
        let mut lock = LockMachine::default();
        assert_eq!(lock.update(None), LockTransition::Idle);
        assert_eq!(lock.update(Some((A, 5.0))), LockTransition::Acquired(A));
        assert_eq!(
            *lock.state(),
            LockState::Locked {
                key: A,
                best_score: 5.0,
                stable_count: 1,
                miss_count: 0
            }
        );
    }

    #[test]
    fn test_equal_challenger_never_switches() {
        let mut lock = LockMachine::default();
        lock.update(Some((A, 6.0)));
        for _ in 0..10 {
            lock.update(Some((B, 6.0)));
        }
        assert_eq!(lock.locked_key(), Some(A));
    }

    #[test]
    fn test_decisive_challenger_switches_after_min_stable() {
        let mut lock = LockMachine::default();
        lock.update(Some((A, 5.0)));
        // non-decisive challenger clears the acquisition count
        lock.update(Some((B, 5.0)));

        assert_eq!(lock.update(Some((B, 6.0))), LockTransition::Challenged);
        assert_eq!(lock.update(Some((B, 6.0))), LockTransition::Challenged);
        assert_eq!(
            lock.update(Some((B, 6.0))),
            LockTransition::Switched { from: A, to: B }
        );
        assert_eq!(
            *lock.state(),
            LockState::Locked {
                key: B,
                best_score: 6.0,
                stable_count: 0,
                miss_count: 0
            }
        );
    }

    #[test]
    fn test_refresh_raises_best_score() {
        let mut lock = LockMachine::default();
        lock.update(Some((A, 5.0)));
        lock.update(Some((A, 7.5)));
        lock.update(Some((A, 6.0)));
        match lock.state() {
            LockState::Locked { best_score, .. } => assert_eq!(*best_score, 7.5),
            LockState::Unlocked => panic!("expected lock"),
        }
    }

    #[test]
    fn test_release_after_miss_tolerance() {
        let mut lock = LockMachine::default();
        lock.update(Some((A, 5.0)));
        for _ in 0..11 {
            assert_eq!(lock.update(None), LockTransition::Missed);
        }
        assert!(lock.state().is_locked());
        assert_eq!(lock.update(None), LockTransition::Released(A));
        assert_eq!(*lock.state(), LockState::Unlocked);
    }

    #[test]
    fn test_sighting_resets_misses() {
        let mut lock = LockMachine::default();
        lock.update(Some((A, 5.0)));
        for _ in 0..11 {
            lock.update(None);
        }
        lock.update(Some((A, 5.0)));
        for _ in 0..11 {
            lock.update(None);
        }
        assert_eq!(lock.locked_key(), Some(A));
    }
}
