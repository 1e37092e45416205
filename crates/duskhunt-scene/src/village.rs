//! The village scene.
//!
//! Layout: Forest <-> Village <-> Houses <-> Hiding spots. The monster
//! spawns in the forest; everyone else starts in the village square.

use duskhunt_protocol::LocationKind::{Hiding, Safe, Spawn};
use duskhunt_protocol::SceneKind;

use crate::{Scene, loc};

pub(crate) fn build() -> Scene {
    let locations = vec![
        loc(0, "Forest", Spawn),
        loc(1, "Village", Safe),
        loc(2, "House 1", Safe),
        loc(3, "House 2", Safe),
        loc(4, "House 3", Safe),
        loc(5, "House 4", Safe),
        loc(6, "House 5", Safe),
        // Three hiding spots per house.
        loc(7, "Under Bed", Hiding),
        loc(8, "Behind Door", Hiding),
        loc(9, "In Closet", Hiding),
        loc(10, "Under Bed", Hiding),
        loc(11, "Behind Door", Hiding),
        loc(12, "In Closet", Hiding),
        loc(13, "Under Bed", Hiding),
        loc(14, "Behind Door", Hiding),
        loc(15, "In Closet", Hiding),
        loc(16, "Under Bed", Hiding),
        loc(17, "Behind Door", Hiding),
        loc(18, "In Closet", Hiding),
        loc(19, "Under Bed", Hiding),
        loc(20, "Behind Door", Hiding),
        loc(21, "In Closet", Hiding),
    ];

    let adjacency: Vec<(u16, &[u16])> = vec![
        (0, &[1]),
        (1, &[0, 2, 3, 4, 5, 6]),
        (2, &[1, 7, 8, 9]),
        (3, &[1, 10, 11, 12]),
        (4, &[1, 13, 14, 15]),
        (5, &[1, 16, 17, 18]),
        (6, &[1, 19, 20, 21]),
        (7, &[2]),
        (8, &[2]),
        (9, &[2]),
        (10, &[3]),
        (11, &[3]),
        (12, &[3]),
        (13, &[4]),
        (14, &[4]),
        (15, &[4]),
        (16, &[5]),
        (17, &[5]),
        (18, &[5]),
        (19, &[6]),
        (20, &[6]),
        (21, &[6]),
    ];

    Scene::new(
        SceneKind::Village,
        "Village",
        locations,
        adjacency,
        0,
        1,
        "village_night",
        "village_day",
    )
}
