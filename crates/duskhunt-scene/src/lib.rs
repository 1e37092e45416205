//! Static scene graphs: the movement substrate for every match.
//!
//! A [`Scene`] is an immutable directed adjacency graph of [`Location`]s
//! with type tags (spawn / safe / hiding), a designated monster spawn, and
//! a designated villager spawn. Scenes are built once per process and
//! shared read-only by every room via [`Scene::get`] — there is no mutable
//! state here, only traversal and validation queries.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

use duskhunt_protocol::{
    LocationId, LocationKind, LocationView, Role, SceneKind, SceneView,
};

mod castle;
mod village;

/// One node of a scene graph.
#[derive(Debug, Clone)]
pub struct Location {
    pub id: LocationId,
    pub name: &'static str,
    pub kind: LocationKind,
}

/// An immutable location graph.
pub struct Scene {
    kind: SceneKind,
    name: &'static str,
    locations: HashMap<LocationId, Location>,
    adjacency: HashMap<LocationId, Vec<LocationId>>,
    monster_spawn: LocationId,
    villager_spawn: LocationId,
    night_background: &'static str,
    day_background: &'static str,
}

impl Scene {
    /// Returns the shared scene for a kind. Built on first use, then
    /// reused by every room for the lifetime of the process.
    pub fn get(kind: SceneKind) -> &'static Scene {
        static VILLAGE: OnceLock<Scene> = OnceLock::new();
        static CASTLE: OnceLock<Scene> = OnceLock::new();
        match kind {
            SceneKind::Village => VILLAGE.get_or_init(village::build),
            SceneKind::Castle => CASTLE.get_or_init(castle::build),
        }
    }

    /// Every selectable scene kind.
    pub const ALL_KINDS: [SceneKind; 2] = [SceneKind::Village, SceneKind::Castle];

    pub(crate) fn new(
        kind: SceneKind,
        name: &'static str,
        locations: Vec<Location>,
        adjacency: Vec<(u16, &[u16])>,
        monster_spawn: u16,
        villager_spawn: u16,
        night_background: &'static str,
        day_background: &'static str,
    ) -> Self {
        let locations: HashMap<_, _> =
            locations.into_iter().map(|l| (l.id, l)).collect();
        let adjacency = adjacency
            .into_iter()
            .map(|(from, to)| {
                let mut to: Vec<LocationId> =
                    to.iter().copied().map(LocationId).collect();
                to.sort_unstable();
                (LocationId(from), to)
            })
            .collect();
        Self {
            kind,
            name,
            locations,
            adjacency,
            monster_spawn: LocationId(monster_spawn),
            villager_spawn: LocationId(villager_spawn),
            night_background,
            day_background,
        }
    }

    pub fn kind(&self) -> SceneKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Looks up a location by id.
    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(&id)
    }

    /// The locations reachable in one step from `id`.
    ///
    /// An id with no outgoing edges is a legal dead end and yields an
    /// empty slice, as does an unknown id.
    pub fn adjacent(&self, id: LocationId) -> &[LocationId] {
        self.adjacency.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Whether `to` can be reached from `from` in one step.
    pub fn is_adjacent(&self, from: LocationId, to: LocationId) -> bool {
        self.adjacent(from).contains(&to)
    }

    /// Where a freshly spawned or phase-reset player of this role stands.
    pub fn spawn_for(&self, role: Role) -> LocationId {
        match role {
            Role::Monster => self.monster_spawn,
            _ => self.villager_spawn,
        }
    }

    pub fn monster_spawn(&self) -> LocationId {
        self.monster_spawn
    }

    pub fn villager_spawn(&self) -> LocationId {
        self.villager_spawn
    }

    /// Background hint for the presentation layer.
    pub fn background(&self, night: bool) -> &'static str {
        if night { self.night_background } else { self.day_background }
    }

    /// All location ids reachable from `start` by following edges.
    pub fn reachable_from(&self, start: LocationId) -> HashSet<LocationId> {
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            stack.extend(self.adjacent(id).iter().copied());
        }
        seen
    }

    /// The client-facing rendering embedded in join snapshots.
    pub fn view(&self) -> SceneView {
        let mut locations: Vec<LocationView> = self
            .locations
            .values()
            .map(|l| LocationView {
                id: l.id,
                name: l.name.to_string(),
                kind: l.kind,
            })
            .collect();
        locations.sort_by_key(|l| l.id);

        let adjacency: BTreeMap<LocationId, Vec<LocationId>> = self
            .adjacency
            .iter()
            .map(|(from, to)| (*from, to.clone()))
            .collect();

        SceneView {
            kind: self.kind,
            name: self.name.to_string(),
            locations,
            adjacency,
            monster_spawn: self.monster_spawn,
            villager_spawn: self.villager_spawn,
        }
    }
}

pub(crate) fn loc(id: u16, name: &'static str, kind: LocationKind) -> Location {
    Location { id: LocationId(id), name, kind }
}
