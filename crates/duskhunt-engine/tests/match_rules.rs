//! Behavioral tests for the match session engine.
//!
//! These drive a session with plain millisecond timestamps and assert on
//! the returned effects — no actor, no sockets, no real timers. Role
//! assignment is random, so tests locate the monster/sheriff/doctor by
//! querying roles after the start instead of assuming positions.

use duskhunt_engine::{
    Effect, JoinReject, MatchSession, StartOutcome, TimerKind,
};
use duskhunt_protocol::{
    GameMode, LocationId, MonsterActionKind, MonsterType, NoticeKind, Phase,
    PlayerId, Role, RoomId, ServerEvent, Side,
};
use duskhunt_scene::Scene;

// =========================================================================
// Helpers
// =========================================================================

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

fn lid(id: u16) -> LocationId {
    LocationId(id)
}

/// Builds a lobby with players 1..=n on the village scene.
fn lobby(mode: GameMode, n: u64) -> MatchSession {
    let mut session = MatchSession::new(
        RoomId::new("TEST01"),
        mode,
        Scene::get(duskhunt_protocol::SceneKind::Village),
    );
    for id in 1..=n {
        session
            .add_player(pid(id), format!("player-{id}"), 0)
            .expect("lobby join should succeed");
    }
    session
}

/// Builds and starts a match; the monster resolves to a werewolf.
fn started(mode: GameMode, n: u64) -> MatchSession {
    let mut session = lobby(mode, n);
    match session.start_game(pid(1), 0) {
        StartOutcome::Pending { .. } => {}
        StartOutcome::Rejected(effects) => {
            panic!("start rejected: {effects:?}")
        }
    }
    session.finish_start(MonsterType::Werewolf, 0);
    session
}

fn find_role(session: &MatchSession, role: Role) -> PlayerId {
    session
        .players()
        .find(|p| p.role == role)
        .unwrap_or_else(|| panic!("no {role:?} assigned"))
        .id
}

fn find_villagers(session: &MatchSession) -> Vec<PlayerId> {
    session
        .players()
        .filter(|p| p.role == Role::Villager)
        .map(|p| p.id)
        .collect()
}

fn location_of(session: &MatchSession, id: PlayerId) -> LocationId {
    session.player(id).expect("player exists").location
}

fn count_events(effects: &[Effect], pred: impl Fn(&ServerEvent) -> bool) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::Send(_, event) if pred(event)))
        .count()
}

fn count_ended(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::Ended(_)))
        .count()
}

/// Walks the monster along a path, spacing moves out past its cooldown.
/// Returns the effects of the final step and the timestamp reached.
fn walk_monster(
    session: &mut MatchSession,
    monster: PlayerId,
    path: &[u16],
    mut now: u64,
) -> (Vec<Effect>, u64) {
    let mut last = Vec::new();
    for step in path {
        now += 2_000;
        last = session.move_to(monster, lid(*step), now);
        assert_eq!(
            location_of(session, monster),
            lid(*step),
            "monster step to {step} at {now} was rejected"
        );
    }
    (last, now)
}

// =========================================================================
// Lobby & start gating
// =========================================================================

#[test]
fn test_first_joiner_becomes_host() {
    let session = lobby(GameMode::Discuss, 3);
    assert_eq!(session.host(), Some(pid(1)));
}

#[test]
fn test_sixth_join_rejected_room_full() {
    let mut session = lobby(GameMode::Discuss, 5);
    let result = session.add_player(pid(6), "late".into(), 0);
    assert_eq!(result.unwrap_err(), JoinReject::Full);
    assert_eq!(session.player_count(), 5);
}

#[test]
fn test_join_after_start_rejected() {
    let mut session = started(GameMode::Discuss, 3);
    let result = session.add_player(pid(9), "late".into(), 0);
    assert_eq!(result.unwrap_err(), JoinReject::AlreadyStarted);
}

#[test]
fn test_start_by_non_host_emits_room_error() {
    let mut session = lobby(GameMode::Discuss, 3);
    let StartOutcome::Rejected(effects) = session.start_game(pid(2), 0) else {
        panic!("non-host start must be rejected");
    };
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::RoomError { .. })),
        1
    );
    assert!(!session.has_started());
}

#[test]
fn test_start_with_two_players_emits_room_error() {
    let mut session = lobby(GameMode::Discuss, 2);
    let StartOutcome::Rejected(effects) = session.start_game(pid(1), 0) else {
        panic!("under-populated start must be rejected");
    };
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::RoomError { .. })),
        1
    );
}

#[test]
fn test_repeat_start_is_silently_ignored() {
    let mut session = started(GameMode::Discuss, 3);
    let StartOutcome::Rejected(effects) = session.start_game(pid(1), 0) else {
        panic!("second start must be rejected");
    };
    assert!(effects.is_empty(), "repeat start answers with nothing");
}

// =========================================================================
// Role assignment
// =========================================================================

#[test]
fn test_role_assignment_matches_table_for_each_count() {
    for n in 3..=5 {
        let session = started(GameMode::Discuss, n);
        let mut roles: Vec<Role> =
            session.players().map(|p| p.role).collect();
        roles.sort_by_key(|r| format!("{r:?}"));

        let mut expected: Vec<Role> =
            duskhunt_catalog::roles_for(n as usize).unwrap().to_vec();
        expected.sort_by_key(|r| format!("{r:?}"));

        assert_eq!(roles, expected, "role multiset for {n} players");
    }
}

#[test]
fn test_role_assignment_places_and_arms_players() {
    let session = started(GameMode::Discuss, 5);
    let scene = Scene::get(duskhunt_protocol::SceneKind::Village);

    let monster = session.player(find_role(&session, Role::Monster)).unwrap();
    assert_eq!(monster.location, scene.monster_spawn());
    assert_eq!(monster.health, 2);

    let sheriff = session.player(find_role(&session, Role::Sheriff)).unwrap();
    assert_eq!(sheriff.location, scene.villager_spawn());
    assert_eq!(sheriff.health, 2);

    for id in find_villagers(&session) {
        let villager = session.player(id).unwrap();
        assert_eq!(villager.location, scene.villager_spawn());
        assert_eq!(villager.health, 1);
    }
}

#[test]
fn test_start_enters_night_and_arms_timers() {
    let mut session = lobby(GameMode::Discuss, 3);
    assert!(matches!(
        session.start_game(pid(1), 0),
        StartOutcome::Pending { .. }
    ));
    let effects = session.finish_start(MonsterType::Werewolf, 0);

    assert_eq!(session.phase(), Phase::Night);
    assert!(session.has_started());
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::GameStarted)),
        1
    );
    // Phase timer plus the monster movement delay.
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::Arm(TimerKind::Phase, 60_000))));
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::Arm(TimerKind::MonsterMove, _))));
}

#[test]
fn test_fury_night_needs_no_movement_timer() {
    let mut session = lobby(GameMode::Fury, 3);
    assert!(matches!(
        session.start_game(pid(1), 0),
        StartOutcome::Pending { .. }
    ));
    let effects = session.finish_start(MonsterType::Werewolf, 0);
    assert!(!effects
        .iter()
        .any(|e| matches!(e, Effect::Arm(TimerKind::MonsterMove, _))));

    // The monster can move immediately.
    let monster = find_role(&session, Role::Monster);
    let moved = session.move_to(monster, lid(1), 2_000);
    assert_eq!(
        count_events(&moved, |e| matches!(e, ServerEvent::PlayerMoved { .. })),
        1
    );
}

// =========================================================================
// Movement
// =========================================================================

#[test]
fn test_villager_move_to_adjacent_location_is_applied() {
    let mut session = started(GameMode::Discuss, 3);
    let villager = find_villagers(&session)[0];

    let effects = session.move_to(villager, lid(2), 100);

    assert_eq!(location_of(&session, villager), lid(2));
    assert_eq!(
        count_events(&effects, |e| matches!(
            e,
            ServerEvent::PlayerMoved { location, .. } if *location == lid(2)
        )),
        1
    );
}

#[test]
fn test_move_to_non_adjacent_location_is_silently_dropped() {
    let mut session = started(GameMode::Discuss, 3);
    let villager = find_villagers(&session)[0];

    // Village (1) to a hiding spot (7) skips the house in between.
    let effects = session.move_to(villager, lid(7), 100);

    assert!(effects.is_empty(), "rejected move must not broadcast");
    assert_eq!(location_of(&session, villager), lid(1));
}

#[test]
fn test_move_by_unknown_player_is_silently_dropped() {
    let mut session = started(GameMode::Discuss, 3);
    assert!(session.move_to(pid(99), lid(2), 100).is_empty());
}

#[test]
fn test_monster_cannot_move_before_movement_enabled() {
    let mut session = started(GameMode::Discuss, 3);
    let monster = find_role(&session, Role::Monster);

    let effects = session.move_to(monster, lid(1), 100);

    assert!(effects.is_empty());
    assert_eq!(location_of(&session, monster), lid(0));

    // Once the delay timer fires, the same move goes through.
    session.timer_fired(TimerKind::MonsterMove, 10_000);
    let effects = session.move_to(monster, lid(1), 10_100);
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::PlayerMoved { .. })),
        1
    );
}

#[test]
fn test_monster_night_cooldown_blocks_rapid_moves() {
    let mut session = started(GameMode::Discuss, 3);
    let monster = find_role(&session, Role::Monster);
    session.timer_fired(TimerKind::MonsterMove, 10_000);

    assert!(!session.move_to(monster, lid(1), 12_000).is_empty());
    // 1.5s later: still inside the 2s cooldown.
    assert!(session.move_to(monster, lid(2), 13_500).is_empty());
    assert_eq!(location_of(&session, monster), lid(1));
    // Past the cooldown it works.
    assert!(!session.move_to(monster, lid(2), 14_000).is_empty());
}

#[test]
fn test_hiding_flag_tracks_location_kind() {
    let mut session = started(GameMode::Discuss, 3);
    let villager = find_villagers(&session)[0];

    session.move_to(villager, lid(2), 100);
    assert!(!session.player(villager).unwrap().hiding);

    session.move_to(villager, lid(7), 200);
    assert!(session.player(villager).unwrap().hiding);

    session.move_to(villager, lid(2), 300);
    assert!(!session.player(villager).unwrap().hiding);
}

#[test]
fn test_villager_day_cooldown_applies() {
    let mut session = started(GameMode::Discuss, 3);
    // Kill nobody; just ride the phase timer into day.
    session.timer_fired(TimerKind::Phase, 60_000);
    assert_eq!(session.phase(), Phase::Day);

    let villager = find_villagers(&session)[0];
    assert!(!session.move_to(villager, lid(2), 61_000).is_empty());
    // 1s later: inside the 2s day cooldown.
    assert!(session.move_to(villager, lid(1), 62_000).is_empty());
    assert!(!session.move_to(villager, lid(1), 63_100).is_empty());
}

// =========================================================================
// Cooldown grace window
// =========================================================================

#[test]
fn test_sheriff_hit_waives_monster_cooldown_inside_window() {
    let mut session = started(GameMode::Discuss, 4);
    let monster = find_role(&session, Role::Monster);
    let sheriff = find_role(&session, Role::Sheriff);
    session.timer_fired(TimerKind::MonsterMove, 10_000);

    // Monster steps into the village; the sheriff lands a hit at T.
    assert!(!session.move_to(monster, lid(1), 20_000).is_empty());
    let hit = session.sheriff_shoot(sheriff, monster, 21_000);
    assert_eq!(
        count_events(&hit, |e| matches!(e, ServerEvent::Combat { .. })),
        1
    );

    // T+500: only 1.5s since the last move, but the grace window waives
    // the cooldown entirely.
    assert!(!session.move_to(monster, lid(2), 21_500).is_empty());
    // Still inside the window at T+3000.
    assert!(!session.move_to(monster, lid(1), 24_000).is_empty());
    assert!(!session.move_to(monster, lid(2), 25_000).is_empty());

    // T+5500: window over; 1.5s since the last move is again too soon.
    assert!(session.move_to(monster, lid(1), 26_500).is_empty());
    // T+6000 and 2s elapsed: the normal cooldown is back in charge.
    assert!(!session.move_to(monster, lid(1), 27_000).is_empty());
}

// =========================================================================
// Ambush
// =========================================================================

#[test]
fn test_monster_entering_hiding_spot_kills_all_non_sheriff_occupants() {
    let mut session = started(GameMode::Discuss, 3);
    let monster = find_role(&session, Role::Monster);
    let villagers = find_villagers(&session);

    // Both villagers tuck into the same hiding spot: village -> house 1
    // -> under the bed.
    for v in &villagers {
        session.move_to(*v, lid(2), 100);
        session.move_to(*v, lid(7), 200);
    }

    session.timer_fired(TimerKind::MonsterMove, 10_000);
    let (effects, _) = walk_monster(&mut session, monster, &[1, 2, 7], 10_000);

    for v in &villagers {
        assert!(!session.player(*v).unwrap().alive, "victim survived ambush");
        assert_eq!(session.player(*v).unwrap().health, 0);
    }

    // Exactly one combat result and one kill notice per victim.
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::Combat { .. })),
        2
    );
    assert_eq!(
        count_events(&effects, |e| matches!(
            e,
            ServerEvent::Notice { notice } if notice.kind == NoticeKind::PlayerKilled
        )),
        2
    );
    let kills = session
        .monster_actions()
        .iter()
        .filter(|a| a.kind == MonsterActionKind::Kill)
        .count();
    assert_eq!(kills, 2, "one kill log entry per victim");

    // Both villagers died, so the monster wins — and the terminal
    // transition happened exactly once, not per victim.
    assert_eq!(session.phase(), Phase::Ended);
    assert_eq!(session.winner(), Some(Side::Monster));
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::GameEnded { .. })),
        1
    );
    assert_eq!(count_ended(&effects), 1);
}

#[test]
fn test_ambush_spares_the_sheriff() {
    let mut session = started(GameMode::Discuss, 4);
    let monster = find_role(&session, Role::Monster);
    let sheriff = find_role(&session, Role::Sheriff);

    session.move_to(sheriff, lid(2), 100);
    session.move_to(sheriff, lid(7), 200);

    session.timer_fired(TimerKind::MonsterMove, 10_000);
    let (effects, _) = walk_monster(&mut session, monster, &[1, 2, 7], 10_000);

    assert!(session.player(sheriff).unwrap().alive, "sheriff is exempt");
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::Combat { .. })),
        0
    );
}

// =========================================================================
// Proximity notifications
// =========================================================================

#[test]
fn test_monster_move_warns_adjacent_players_once_per_phase() {
    let mut session = started(GameMode::Discuss, 3);
    let monster = find_role(&session, Role::Monster);
    session.timer_fired(TimerKind::MonsterMove, 10_000);

    // Villagers are at the village (1). The monster entering house 1 (2)
    // is adjacent to them.
    session.move_to(monster, lid(1), 12_000);
    let effects = session.move_to(monster, lid(2), 14_000);
    assert_eq!(
        count_events(&effects, |e| matches!(
            e,
            ServerEvent::Notice { notice } if notice.kind == NoticeKind::MonsterNear
        )),
        2,
        "both villagers warned"
    );

    // Stepping out and back in warns nobody twice.
    session.move_to(monster, lid(1), 16_000);
    let effects = session.move_to(monster, lid(2), 18_000);
    assert_eq!(
        count_events(&effects, |e| matches!(
            e,
            ServerEvent::Notice { notice } if notice.kind == NoticeKind::MonsterNear
        )),
        0
    );
}

#[test]
fn test_fury_day_villager_move_warns_the_monster_once() {
    let mut session = started(GameMode::Fury, 3);
    session.timer_fired(TimerKind::Phase, 60_000);
    assert_eq!(session.phase(), Phase::Day);

    let monster = find_role(&session, Role::Monster);
    let villager = find_villagers(&session)[0];

    // Day hunt spawns: monster outside (0), villagers at the village (1).
    // A villager wandering into a house and back next to the forest edge
    // tips the monster off exactly once.
    session.move_to(villager, lid(2), 62_000);
    let effects = session.move_to(villager, lid(1), 64_100);
    let warnings = |effects: &[Effect]| {
        effects
            .iter()
            .filter(|e| matches!(
                e,
                Effect::Send(duskhunt_protocol::Recipient::Player(p), ServerEvent::Notice { notice })
                    if *p == monster && notice.kind == NoticeKind::MonsterNear
            ))
            .count()
    };
    assert_eq!(warnings(&effects), 1);

    session.move_to(villager, lid(2), 66_200);
    let effects = session.move_to(villager, lid(1), 68_300);
    assert_eq!(warnings(&effects), 0, "once per phase");
}

// =========================================================================
// Combat & abilities
// =========================================================================

#[test]
fn test_monster_attack_requires_shared_location_and_night() {
    let mut session = started(GameMode::Discuss, 3);
    let monster = find_role(&session, Role::Monster);
    let villager = find_villagers(&session)[0];

    // Different locations: dropped.
    assert!(session.monster_attack(monster, villager, 12_000).is_empty());

    session.timer_fired(TimerKind::MonsterMove, 10_000);
    session.move_to(monster, lid(1), 12_000);
    let effects = session.monster_attack(monster, villager, 14_100);
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::Combat { .. })),
        1
    );
    assert!(!session.player(villager).unwrap().alive);
}

#[test]
fn test_sheriff_shoot_non_monster_answers_with_room_error() {
    let mut session = started(GameMode::Discuss, 4);
    let sheriff = find_role(&session, Role::Sheriff);
    let villager = find_villagers(&session)[0];

    let effects = session.sheriff_shoot(sheriff, villager, 1_000);

    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::RoomError { .. })),
        1
    );
    assert!(session.player(villager).unwrap().alive);
}

#[test]
fn test_sheriff_shoot_is_night_only_in_discuss_mode() {
    let mut session = started(GameMode::Discuss, 4);
    session.timer_fired(TimerKind::Phase, 60_000);
    assert_eq!(session.phase(), Phase::Day);

    let sheriff = find_role(&session, Role::Sheriff);
    let monster = find_role(&session, Role::Monster);
    assert!(session.sheriff_shoot(sheriff, monster, 61_000).is_empty());
}

#[test]
fn test_fury_day_sheriff_shot_deals_double_damage() {
    let mut session = started(GameMode::Fury, 4);
    session.timer_fired(TimerKind::Phase, 60_000);
    assert_eq!(session.phase(), Phase::Day);

    let sheriff = find_role(&session, Role::Sheriff);
    let monster = find_role(&session, Role::Monster);

    // Werewolf health is 2; a doubled day shot kills outright.
    let effects = session.sheriff_shoot(sheriff, monster, 61_000);
    assert!(!session.player(monster).unwrap().alive);
    assert_eq!(session.winner(), Some(Side::Villagers));
    assert_eq!(count_ended(&effects), 1);
}

#[test]
fn test_doctor_revive_restores_dead_neighbor_at_night() {
    let mut session = started(GameMode::Discuss, 5);
    let monster = find_role(&session, Role::Monster);
    let doctor = find_role(&session, Role::Doctor);
    let villager = find_villagers(&session)[0];

    session.timer_fired(TimerKind::MonsterMove, 10_000);
    session.move_to(monster, lid(1), 12_000);
    session.monster_attack(monster, villager, 14_100);
    assert!(!session.player(villager).unwrap().alive);

    // Doctor shares the village location with the body.
    let effects = session.doctor_revive(doctor, villager, 15_000);

    let patient = session.player(villager).unwrap();
    assert!(patient.alive);
    assert_eq!(patient.health, 1);
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::PlayerRevived { .. })),
        1
    );
}

#[test]
fn test_doctor_cannot_revive_living_target_or_self() {
    let mut session = started(GameMode::Discuss, 5);
    let doctor = find_role(&session, Role::Doctor);
    let villager = find_villagers(&session)[0];

    assert!(session.doctor_revive(doctor, villager, 1_000).is_empty());
    assert!(session.doctor_revive(doctor, doctor, 1_000).is_empty());
}

// =========================================================================
// Voting
// =========================================================================

/// Drives a discuss match into its first day phase.
fn at_day(n: u64) -> MatchSession {
    let mut session = started(GameMode::Discuss, n);
    session.timer_fired(TimerKind::Phase, 60_000);
    assert_eq!(session.phase(), Phase::Day);
    session
}

#[test]
fn test_vote_overwrites_previous_vote() {
    let mut session = at_day(5);
    let ids: Vec<PlayerId> = session.players().map(|p| p.id).collect();

    session.cast_vote(ids[0], ids[1], 61_000);
    let effects = session.cast_vote(ids[0], ids[2], 62_000);

    let votes = effects.iter().find_map(|e| match e {
        Effect::Send(_, ServerEvent::VoteUpdate { votes }) => Some(votes),
        _ => None,
    });
    assert_eq!(votes.unwrap().get(&ids[0]), Some(&ids[2]));
}

#[test]
fn test_unanimous_votes_resolve_early_with_majority_elimination() {
    let mut session = at_day(3);
    let ids: Vec<PlayerId> = session.players().map(|p| p.id).collect();

    // Everyone votes the same target; the tally fires on the last vote
    // without waiting for the day timer.
    session.cast_vote(ids[0], ids[2], 61_000);
    session.cast_vote(ids[1], ids[2], 62_000);
    let effects = session.cast_vote(ids[2], ids[2], 63_000);

    assert_eq!(
        count_events(&effects, |e| matches!(
            e,
            ServerEvent::VoteResult { eliminated: Some(id) } if *id == ids[2]
        )),
        1
    );
    assert!(!session.player(ids[2]).unwrap().alive);
}

#[test]
fn test_split_vote_eliminates_nobody_and_schedules_next_night() {
    let mut session = at_day(3);
    let ids: Vec<PlayerId> = session.players().map(|p| p.id).collect();

    session.cast_vote(ids[0], ids[1], 61_000);
    session.cast_vote(ids[1], ids[2], 62_000);
    let effects = session.cast_vote(ids[2], ids[0], 63_000);

    assert_eq!(
        count_events(&effects, |e| matches!(
            e,
            ServerEvent::VoteResult { eliminated: None }
        )),
        1
    );
    assert_eq!(
        count_events(&effects, |e| matches!(
            e,
            ServerEvent::Notice { notice } if notice.kind == NoticeKind::VoteFailed
        )),
        1
    );
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::Arm(TimerKind::NextNight, 3_000))));
    for id in ids {
        assert!(session.player(id).unwrap().alive);
    }

    // The scheduled delay rolls the room into the next night.
    session.timer_fired(TimerKind::NextNight, 66_000);
    assert_eq!(session.phase(), Phase::Night);
}

#[test]
fn test_day_timer_with_no_votes_fails_the_vote() {
    let mut session = at_day(3);
    let effects = session.timer_fired(TimerKind::Phase, 120_000);
    assert_eq!(
        count_events(&effects, |e| matches!(
            e,
            ServerEvent::VoteResult { eliminated: None }
        )),
        1
    );
}

#[test]
fn test_dead_player_votes_are_dropped() {
    let mut session = started(GameMode::Discuss, 4);
    let monster = find_role(&session, Role::Monster);
    let villager = find_villagers(&session)[0];
    session.timer_fired(TimerKind::MonsterMove, 10_000);
    session.move_to(monster, lid(1), 12_000);
    session.monster_attack(monster, villager, 14_100);

    session.timer_fired(TimerKind::Phase, 60_000);
    assert_eq!(session.phase(), Phase::Day);
    assert!(session.cast_vote(villager, monster, 61_000).is_empty());
}

#[test]
fn test_fury_mode_drops_votes_silently() {
    let mut session = started(GameMode::Fury, 3);
    session.timer_fired(TimerKind::Phase, 60_000);
    let ids: Vec<PlayerId> = session.players().map(|p| p.id).collect();
    assert!(session.cast_vote(ids[0], ids[1], 61_000).is_empty());
}

// =========================================================================
// Win conditions
// =========================================================================

#[test]
fn test_discuss_two_survivors_with_monster_ends_in_monster_win() {
    let mut session = started(GameMode::Discuss, 3);
    let monster = find_role(&session, Role::Monster);
    let villagers = find_villagers(&session);

    session.timer_fired(TimerKind::MonsterMove, 10_000);
    session.move_to(monster, lid(1), 12_000);
    // One kill leaves a 1v1, which the forced-endgame rule hands to the
    // monster immediately.
    let effects = session.monster_attack(monster, villagers[0], 14_100);

    assert_eq!(session.phase(), Phase::Ended);
    assert_eq!(session.winner(), Some(Side::Monster));
    assert_eq!(count_ended(&effects), 1);
    assert!(session.player(villagers[1]).unwrap().alive);
}

#[test]
fn test_fury_runs_down_to_last_player_standing() {
    let mut session = started(GameMode::Fury, 3);
    let monster = find_role(&session, Role::Monster);
    let villagers = find_villagers(&session);

    session.move_to(monster, lid(1), 2_000);
    let effects = session.monster_attack(monster, villagers[0], 4_100);
    // Two still alive: fury keeps going where discuss would have ended.
    assert_eq!(session.phase(), Phase::Night);
    assert_eq!(count_ended(&effects), 0);

    let effects = session.monster_attack(monster, villagers[1], 6_200);
    assert_eq!(session.phase(), Phase::Ended);
    assert_eq!(session.winner(), Some(Side::Monster));
    assert_eq!(count_ended(&effects), 1);
}

#[test]
fn test_night_kills_resolve_at_dawn_before_day_begins() {
    let mut session = started(GameMode::Discuss, 3);
    let monster = find_role(&session, Role::Monster);
    let villagers = find_villagers(&session);

    session.timer_fired(TimerKind::MonsterMove, 10_000);
    session.move_to(monster, lid(1), 12_000);
    session.monster_attack(monster, villagers[0], 14_100);
    assert_eq!(session.phase(), Phase::Ended, "1v1 rule fired on the kill");

    // A stale phase timer on an ended match changes nothing.
    let effects = session.timer_fired(TimerKind::Phase, 60_000);
    assert!(effects.is_empty());
    assert_eq!(session.phase(), Phase::Ended);
}

// =========================================================================
// Leaving
// =========================================================================

#[test]
fn test_leave_before_start_removes_the_record() {
    let mut session = lobby(GameMode::Discuss, 3);
    let effects = session.remove_player(pid(3), 1_000);

    assert_eq!(session.player_count(), 2);
    assert!(session.player(pid(3)).is_none());
    // No death, no win check — just the roster broadcast.
    assert_eq!(count_ended(&effects), 0);
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::StateSync { .. })),
        1
    );
}

#[test]
fn test_leave_mid_match_marks_dead_and_rechecks_win() {
    let mut session = started(GameMode::Discuss, 3);
    let villagers = find_villagers(&session);

    let effects = session.remove_player(villagers[0], 5_000);

    // The record stays, dead.
    let leaver = session.player(villagers[0]).unwrap();
    assert!(!leaver.alive);
    assert_eq!(leaver.health, 0);

    // Two survivors, one of them the monster: the forced endgame fires.
    assert_eq!(session.phase(), Phase::Ended);
    assert_eq!(session.winner(), Some(Side::Monster));
    assert_eq!(count_ended(&effects), 1);
}

#[test]
fn test_monster_leaving_mid_match_hands_the_win_to_villagers() {
    let mut session = started(GameMode::Fury, 4);
    let monster = find_role(&session, Role::Monster);

    session.remove_player(monster, 5_000);

    assert_eq!(session.phase(), Phase::Ended);
    assert_eq!(session.winner(), Some(Side::Villagers));
}

// =========================================================================
// Chat
// =========================================================================

#[test]
fn test_chat_flows_only_during_the_day() {
    let mut session = started(GameMode::Discuss, 3);
    let ids: Vec<PlayerId> = session.players().map(|p| p.id).collect();

    assert!(session.chat(ids[0], "psst".into(), 1_000).is_empty());

    session.timer_fired(TimerKind::Phase, 60_000);
    let effects = session.chat(ids[0], "it was P-3, I saw it".into(), 61_000);
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::ChatMessage { .. })),
        1
    );
}

// =========================================================================
// Dawn replay
// =========================================================================

#[test]
fn test_discuss_dawn_replays_monster_actions_to_non_monster_players() {
    let mut session = started(GameMode::Discuss, 3);
    let monster = find_role(&session, Role::Monster);

    session.timer_fired(TimerKind::MonsterMove, 10_000);
    session.move_to(monster, lid(1), 12_000);

    let effects = session.timer_fired(TimerKind::Phase, 60_000);
    let replays: Vec<&Effect> = effects
        .iter()
        .filter(|e| {
            matches!(e, Effect::Send(_, ServerEvent::MonsterReplay { .. }))
        })
        .collect();
    assert_eq!(replays.len(), 2, "one replay per non-monster player");
    for replay in replays {
        let Effect::Send(recipient, ServerEvent::MonsterReplay { actions }) =
            replay
        else {
            unreachable!()
        };
        assert_ne!(
            *recipient,
            duskhunt_protocol::Recipient::Player(monster),
            "the monster never sees its own replay"
        );
        assert_eq!(actions.len(), 1);
    }
}

#[test]
fn test_fury_dawn_sends_no_replay() {
    let mut session = started(GameMode::Fury, 3);
    let monster = find_role(&session, Role::Monster);
    session.move_to(monster, lid(1), 2_000);

    let effects = session.timer_fired(TimerKind::Phase, 60_000);
    assert_eq!(
        count_events(&effects, |e| matches!(e, ServerEvent::MonsterReplay { .. })),
        0
    );
}

// =========================================================================
// Night reset
// =========================================================================

#[test]
fn test_entering_night_resets_positions_votes_and_log() {
    let mut session = started(GameMode::Discuss, 3);
    let monster = find_role(&session, Role::Monster);
    let villager = find_villagers(&session)[0];

    session.timer_fired(TimerKind::MonsterMove, 10_000);
    session.move_to(monster, lid(1), 12_000);
    session.move_to(villager, lid(2), 12_000);

    // Day, a stray vote, then the failed tally schedules the next night.
    session.timer_fired(TimerKind::Phase, 60_000);
    session.cast_vote(villager, monster, 61_000);
    session.timer_fired(TimerKind::Phase, 120_000);
    session.timer_fired(TimerKind::NextNight, 123_000);
    assert_eq!(session.phase(), Phase::Night);

    let scene = Scene::get(duskhunt_protocol::SceneKind::Village);
    assert_eq!(location_of(&session, monster), scene.monster_spawn());
    assert_eq!(location_of(&session, villager), scene.villager_spawn());
    assert!(session.monster_actions().is_empty());
    assert!(session.snapshot().votes.is_empty());
    assert!(!session.snapshot().monster_movement_enabled);
}
