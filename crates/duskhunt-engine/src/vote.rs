//! Vote tallying.
//!
//! A vote map is `voter -> target` with overwrite semantics; counting and
//! the majority rule live here as pure functions so they can be tested
//! without a session.

use std::collections::BTreeMap;

use duskhunt_protocol::PlayerId;

/// Number of votes a candidate needs to be eliminated.
pub fn majority(alive_count: usize) -> usize {
    alive_count / 2 + 1
}

/// Resolves a vote map against the current number of living players.
///
/// The strict-plurality leader is eliminated only if their count reaches
/// the majority threshold; ties on the leading count resolve to no
/// elimination candidate change (the lowest player id encountered first
/// keeps the lead, and in practice a tie can never reach majority).
pub fn tally(
    votes: &BTreeMap<PlayerId, PlayerId>,
    alive_count: usize,
) -> Option<PlayerId> {
    let mut counts: BTreeMap<PlayerId, usize> = BTreeMap::new();
    for target in votes.values() {
        *counts.entry(*target).or_default() += 1;
    }

    let mut leader: Option<(PlayerId, usize)> = None;
    for (candidate, count) in counts {
        match leader {
            Some((_, best)) if count <= best => {}
            _ => leader = Some((candidate, count)),
        }
    }

    match leader {
        Some((candidate, count)) if count >= majority(alive_count) => {
            Some(candidate)
        }
        _ => None,
    }
}
