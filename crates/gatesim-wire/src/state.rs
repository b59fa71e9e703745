//! Per-wire aggregation of driver contributions.
//!
//! A [`WireState`] holds every active contribution in insertion order and
//! caches the winning value. Recomputation takes the contributions at the
//! strongest strength present and folds them pairwise through the
//! [`ResolverChain`]; a pair that no resolver accepts is a
//! [`ShortCircuit`].
//!
//! Every mutating operation reports whether the winner changed, so the
//! owning wire knows when to notify downstream gates.

use std::mem;

use gatesim_core::{DrivenValue, ShortCircuit, Strength, WireId};

use crate::resolver::ResolverChain;

/// When a push is allowed to skip recomputation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolveMode {
    /// Recompute on every mutation. Conflicts are detected immediately.
    #[default]
    Exact,
    /// Skip recomputation for pushes strictly weaker than the current
    /// winner. A conflict among weaker drivers surfaces only once they
    /// become the strongest level.
    Optimized,
}

/// A change of a wire's winning value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WinnerChange {
    /// Winner before the mutation.
    pub previous: DrivenValue,
    /// Winner after the mutation.
    pub current: DrivenValue,
}

/// Result of a wire mutation: `Some` when the winner changed.
pub type Outcome = Result<Option<WinnerChange>, ShortCircuit>;

/// Fold `values` at their strongest strength into a single winner.
///
/// Values weaker than the strongest present never take part. `None`
/// contributions are ignored. An empty (or all-`None`) slice resolves to
/// the sentinel.
pub fn resolve(
    wire: WireId,
    values: &[DrivenValue],
    chain: &ResolverChain,
) -> Result<DrivenValue, ShortCircuit> {
    let Some(strongest) = values
        .iter()
        .filter(|v| !v.is_none())
        .map(DrivenValue::strength)
        .min()
    else {
        return Ok(DrivenValue::none());
    };

    let mut contenders = values
        .iter()
        .filter(|v| !v.is_none() && v.strength() == strongest);
    let Some(first) = contenders.next() else {
        return Ok(DrivenValue::none());
    };

    let mut acc = first.clone();
    for next in contenders {
        acc = chain.merge(&acc, next).ok_or_else(|| ShortCircuit {
            wire,
            first: acc.clone(),
            second: next.clone(),
        })?;
    }
    Ok(acc)
}

/// Active contributions and cached winner of one wire.
#[derive(Clone, Debug)]
pub struct WireState {
    wire: WireId,
    mode: ResolveMode,
    active: Vec<DrivenValue>,
    winner: DrivenValue,
}

impl WireState {
    /// An undriven wire.
    pub fn new(wire: WireId, mode: ResolveMode) -> Self {
        Self {
            wire,
            mode,
            active: Vec::new(),
            winner: DrivenValue::none(),
        }
    }

    /// The wire this state belongs to.
    pub fn wire(&self) -> WireId {
        self.wire
    }

    /// The cached winning value.
    pub fn winner(&self) -> &DrivenValue {
        &self.winner
    }

    /// Active contributions in insertion order.
    pub fn active(&self) -> &[DrivenValue] {
        &self.active
    }

    /// Number of active contributions.
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether nothing drives the wire.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// The recomputation policy.
    pub fn mode(&self) -> ResolveMode {
        self.mode
    }

    /// Add a contribution. Pushing the sentinel is a no-op.
    ///
    /// On [`ShortCircuit`] the push is undone.
    pub fn push(&mut self, value: DrivenValue, chain: &ResolverChain) -> Outcome {
        if value.is_none() {
            return Ok(None);
        }
        let skip = self.skips(value.strength());
        self.active.push(value);
        if skip {
            return Ok(None);
        }
        match self.recompute(chain) {
            Ok(change) => Ok(change),
            Err(e) => {
                self.active.pop();
                Err(e)
            }
        }
    }

    /// Remove one contribution structurally equal to `value`.
    ///
    /// Removing a value that is not active is a no-op. The removal always
    /// takes effect: if the remaining drivers conflict, the wire floats
    /// (winner becomes the sentinel) and the [`ShortCircuit`] is returned.
    pub fn pop(&mut self, value: &DrivenValue, chain: &ResolverChain) -> Outcome {
        let Some(pos) = self.active.iter().position(|v| v.is(value)) else {
            return Ok(None);
        };
        self.active.remove(pos);
        if self.active.is_empty() {
            return Ok(self.install(DrivenValue::none()));
        }
        if self.skips(value.strength()) {
            return Ok(None);
        }
        match resolve(self.wire, &self.active, chain) {
            Ok(winner) => Ok(self.install(winner)),
            Err(e) => {
                self.install(DrivenValue::none());
                Err(e)
            }
        }
    }

    /// Swap one contribution for another as a single step.
    ///
    /// `previous` is popped (if present) and `next` pushed (unless it is
    /// the sentinel). If the result short-circuits, the wire is restored
    /// to exactly its prior contributions and winner.
    pub fn replace(
        &mut self,
        previous: Option<&DrivenValue>,
        next: DrivenValue,
        chain: &ResolverChain,
    ) -> Outcome {
        if previous.is_some_and(|p| p.is(&next)) {
            return Ok(None);
        }
        let saved_active = self.active.clone();
        let saved_winner = self.winner.clone();

        let mut skip = true;
        if let Some(previous) = previous {
            if let Some(pos) = self.active.iter().position(|v| v.is(previous)) {
                self.active.remove(pos);
                skip &= self.skips(previous.strength());
            }
        }
        if !next.is_none() {
            skip &= self.skips(next.strength());
            self.active.push(next);
        }
        if skip {
            return Ok(None);
        }

        match self.recompute(chain) {
            Ok(change) => Ok(change),
            Err(e) => {
                self.active = saved_active;
                self.winner = saved_winner;
                Err(e)
            }
        }
    }

    /// Recompute the winner from the active set.
    ///
    /// On [`ShortCircuit`] the cached winner is left untouched.
    pub fn recompute(&mut self, chain: &ResolverChain) -> Outcome {
        let winner = resolve(self.wire, &self.active, chain)?;
        Ok(self.install(winner))
    }

    /// Drop every contribution. Used when the wire is torn down.
    pub fn clear(&mut self) -> Option<WinnerChange> {
        self.active.clear();
        self.install(DrivenValue::none())
    }

    /// Whether a mutation at `strength` may skip recomputation.
    fn skips(&self, strength: Strength) -> bool {
        self.mode == ResolveMode::Optimized
            && !self.winner.is_none()
            && self.winner.strength().beats(strength)
    }

    fn install(&mut self, winner: DrivenValue) -> Option<WinnerChange> {
        if winner == self.winner {
            return None;
        }
        let previous = mem::replace(&mut self.winner, winner);
        Some(WinnerChange {
            previous,
            current: self.winner.clone(),
        })
    }
}
