//! Binding Resolver: decides when an unbound track latches onto a hand.

use std::collections::{HashMap, HashSet};

use log::debug;
use nalgebra::distance;

use crate::tracker::hand::{Hand, HandSide};
use crate::tracker::track::Track;

/// Proposes and confirms track-to-hand bindings.
///
/// A proposal must hold for `binding_frames` consecutive frames before it
/// is confirmed, so a ball merely flying past a hand never latches. One
/// confirmed binding per hand; when two tracks qualify the closer wins.
pub struct BindingResolver {
    /// Consecutive-frame proposal counters, keyed by (track, hand).
    counters: HashMap<(u64, HandSide), u32>,
    binding_dist: f32,
    binding_frames: u32,
}

impl BindingResolver {
    pub fn new(binding_dist: f32, binding_frames: u32) -> Self {
        Self {
            counters: HashMap::new(),
            binding_dist,
            binding_frames,
        }
    }

    /// Run one frame of proposal/confirmation.
    ///
    /// `occupied` holds the sides already bound to some track. Returns the
    /// bindings confirmed this frame. Counters of pairs that were not
    /// re-proposed this frame reset to zero.
    pub fn resolve(
        &mut self,
        tracks: &HashMap<u64, Track>,
        hands: &[Hand],
        occupied: &HashSet<HandSide>,
    ) -> Vec<(u64, HandSide)> {
        let free_hands: Vec<&Hand> = hands
            .iter()
            .filter(|h| h.visible && !occupied.contains(&h.side))
            .collect();

        // Nearest free hand within the binding distance, per track.
        let mut proposals: Vec<(u64, HandSide, f32)> = Vec::new();
        let mut ids: Vec<u64> = tracks.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let track = &tracks[&id];
            let nearest = free_hands
                .iter()
                .map(|h| (h.side, distance(&track.centroid, &h.position)))
                .filter(|(_, d)| *d <= self.binding_dist)
                .min_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((side, d)) = nearest {
                proposals.push((id, side, d));
            }
        }

        // A proposal that lapses for even one frame starts over.
        let mut counters = HashMap::new();
        for &(id, side, _) in &proposals {
            let count = self.counters.get(&(id, side)).copied().unwrap_or(0) + 1;
            counters.insert((id, side), count);
        }
        self.counters = counters;

        // Confirm sustained proposals, closest track per hand.
        let mut confirmed: Vec<(u64, HandSide)> = Vec::new();
        let mut taken: HashSet<HandSide> = HashSet::new();
        proposals.sort_by(|a, b| a.2.total_cmp(&b.2));
        for (id, side, d) in proposals {
            if self.counters[&(id, side)] < self.binding_frames || taken.contains(&side) {
                continue;
            }
            debug!("binding confirmed: track {id} -> {} hand ({d:.1}px)", side.label());
            taken.insert(side);
            confirmed.push((id, side));
            self.counters.remove(&(id, side));
        }

        // A contested hand discards the losing proposal outright.
        if !taken.is_empty() {
            self.counters.retain(|(_, side), _| !taken.contains(side));
        }

        confirmed
    }
}
