//! The castle scene.
//!
//! Layout: Outside <-> Hall <-> Floors <-> Rooms <-> Hiding spots.
//! Deeper than the village: three floors of three rooms each, with two
//! hiding spots per room.

use duskhunt_protocol::LocationKind::{Hiding, Safe, Spawn};
use duskhunt_protocol::SceneKind;

use crate::{Scene, loc};

pub(crate) fn build() -> Scene {
    let locations = vec![
        loc(0, "Castle Outside", Spawn),
        loc(1, "Hall", Safe),
        loc(2, "Floor 1", Safe),
        loc(3, "Floor 2", Safe),
        loc(4, "Floor 3", Safe),
        // Floor 1 rooms
        loc(5, "Bedroom 1", Safe),
        loc(6, "Dining Area 1", Safe),
        loc(7, "Kitchen 1", Safe),
        // Floor 2 rooms
        loc(8, "Bedroom 2", Safe),
        loc(9, "Dining Area 2", Safe),
        loc(10, "Kitchen 2", Safe),
        // Floor 3 rooms
        loc(11, "Bedroom 3", Safe),
        loc(12, "Dining Area 3", Safe),
        loc(13, "Kitchen 3", Safe),
        // Floor 1 hiding spots
        loc(14, "Under Bed", Hiding),
        loc(15, "In Closet", Hiding),
        loc(16, "Under Table", Hiding),
        loc(17, "Behind Curtain", Hiding),
        loc(18, "Behind Shelf", Hiding),
        loc(19, "In Barrel", Hiding),
        // Floor 2 hiding spots
        loc(20, "Under Bed", Hiding),
        loc(21, "In Closet", Hiding),
        loc(22, "Under Table", Hiding),
        loc(23, "Behind Curtain", Hiding),
        loc(24, "Behind Shelf", Hiding),
        loc(25, "In Barrel", Hiding),
        // Floor 3 hiding spots
        loc(26, "Under Bed", Hiding),
        loc(27, "In Closet", Hiding),
        loc(28, "Under Table", Hiding),
        loc(29, "Behind Curtain", Hiding),
        loc(30, "Behind Shelf", Hiding),
        loc(31, "In Barrel", Hiding),
    ];

    let adjacency: Vec<(u16, &[u16])> = vec![
        (0, &[1]),
        (1, &[0, 2, 3, 4]),
        // Floor 1
        (2, &[1, 5, 6, 7]),
        (5, &[2, 14, 15]),
        (6, &[2, 16, 17]),
        (7, &[2, 18, 19]),
        (14, &[5]),
        (15, &[5]),
        (16, &[6]),
        (17, &[6]),
        (18, &[7]),
        (19, &[7]),
        // Floor 2
        (3, &[1, 8, 9, 10]),
        (8, &[3, 20, 21]),
        (9, &[3, 22, 23]),
        (10, &[3, 24, 25]),
        (20, &[8]),
        (21, &[8]),
        (22, &[9]),
        (23, &[9]),
        (24, &[10]),
        (25, &[10]),
        // Floor 3
        (4, &[1, 11, 12, 13]),
        (11, &[4, 26, 27]),
        (12, &[4, 28, 29]),
        (13, &[4, 30, 31]),
        (26, &[11]),
        (27, &[11]),
        (28, &[12]),
        (29, &[12]),
        (30, &[13]),
        (31, &[13]),
    ];

    Scene::new(
        SceneKind::Castle,
        "Castle",
        locations,
        adjacency,
        0,
        1,
        "castle_night",
        "castle_day",
    )
}
