mod common;

use common::*;
use hangman_core::{IdlePolicy, Recipient, Room, RoomEffect};
use hangman_types::{
    ClientMessage, GameConfigPatch, GameMode, GameState, GameStatus, Player, ServerMessage,
};
use std::time::Duration;

#[test]
fn test_first_player_becomes_host() {
    let mut room = create_test_room(&["GATO"]);
    let out = join(&mut room, 1, "alice");

    let state = room.state();
    assert_eq!(state.players.len(), 1);
    assert_eq!(state.host_id, "alice");
    assert!(state.players[0].is_host);
    assert!(state.players[0].is_connected);
    assert_eq!(state.scores.get("alice"), Some(0));

    let messages: Vec<_> = out.broadcasts().collect();
    assert!(matches!(messages[0], ServerMessage::PlayerJoined(p) if p.id == "alice"));
    assert!(matches!(messages[1], ServerMessage::StateUpdate(_)));
    assert!(out.persists());
}

#[test]
fn test_second_player_is_not_host() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");
    join(&mut room, 2, "bob");

    let state = room.state();
    assert_eq!(state.host_id, "alice");
    assert!(!state.player("bob").unwrap().is_host);
    assert!(has_single_host(state));
}

#[test]
fn test_connect_sends_state_to_newcomer_only() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");

    let out = room.connect(9);
    assert_eq!(out.effects().len(), 1);
    match &out.effects()[0] {
        RoomEffect::Send {
            to: Recipient::Transport(9),
            message: ServerMessage::StateUpdate(state),
        } => assert_eq!(state.players.len(), 1),
        other => panic!("Expected unicast state, got {:?}", other),
    }
}

#[test]
fn test_join_requires_session() {
    let mut room = create_test_room(&["GATO"]);
    let out = join(&mut room, 1, "  ");
    assert_eq!(out.error_message(), Some("A session id is required to join"));
    assert!(room.state().players.is_empty());
    assert!(!out.persists());
}

#[test]
fn test_messages_from_unjoined_transport_are_ignored() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");

    let out = send(&mut room, 5, ClientMessage::StartGame, T0);
    assert!(out.is_empty());
    let out = send(&mut room, 5, ClientMessage::Leave, T0);
    assert!(out.is_empty());
    assert_eq!(room.state().players.len(), 1);
}

#[test]
fn test_disconnect_keeps_seat_and_host() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");
    join(&mut room, 2, "bob");

    let out = room.disconnect(&1);
    let alice = room.state().player("alice").unwrap();
    assert!(!alice.is_connected);
    assert!(alice.is_host);
    assert_eq!(room.state().host_id, "alice");
    assert!(out.broadcasts().any(
        |m| matches!(m, ServerMessage::PlayerLeft { player_id } if player_id == "alice")
    ));
    assert!(room.connections().transport_for("alice").is_none());

    // Unknown transports are a no-op
    assert!(room.disconnect(&42).is_empty());
}

#[test]
fn test_host_reclaims_seat_after_others_play_a_round() {
    let mut room = room_with_players(GameMode::Single, &["GATO"], 2);
    start(&mut room, 1);
    room.disconnect(&1);
    assert!(room.state().player("p1").unwrap().is_host);

    // p2 plays the whole round while the host is away.
    for (i, letter) in ["g", "a", "t", "o"].into_iter().enumerate() {
        let out = guess(&mut room, 2, letter, T0 + 1_000 * (i as i64 + 1));
        assert!(out.error_message().is_none());
    }
    let state = room.state();
    assert_eq!(state.status, GameStatus::BetweenRounds);
    assert_eq!(state.round_winners, vec!["p2".to_string()]);
    assert!(state.scores.get("p2").unwrap() > 0);
    assert!(!state.player("p2").unwrap().is_host);

    join(&mut room, 3, "p1");

    let state = room.state();
    let host = state.player("p1").unwrap();
    assert!(host.is_connected);
    assert!(host.is_host);
    assert_eq!(state.host_id, "p1");
    assert!(!state.player("p2").unwrap().is_host);
    assert!(has_single_host(state));
    assert_eq!(state.status, GameStatus::BetweenRounds);
    assert_eq!(room.connections().transport_for("p1"), Some(&3));
}

#[test]
fn test_reconnect_restores_host() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");
    room.disconnect(&1);
    join(&mut room, 2, "bob");
    assert!(!room.state().player("bob").unwrap().is_host);

    let out = room.handle_message(
        3,
        ClientMessage::Join {
            name: "Alice Again".to_string(),
            avatar: "🦊".to_string(),
            session_id: "alice".to_string(),
        },
        T0,
    );

    let state = room.state();
    assert_eq!(state.players.len(), 2);
    let alice = state.player("alice").unwrap();
    assert!(alice.is_connected);
    assert!(alice.is_host);
    assert_eq!(alice.name, "Alice Again");
    assert_eq!(alice.avatar, "🦊");
    assert!(has_single_host(state));
    // Reconnection is not announced as a new player
    assert!(!out
        .broadcasts()
        .any(|m| matches!(m, ServerMessage::PlayerJoined(_))));
    assert_eq!(room.connections().transport_for("alice"), Some(&3));
}

#[test]
fn test_reconnecting_host_demotes_stray_host() {
    let mut state = GameState::new("ABCD".to_string());
    let mut alice = Player::new("alice".to_string(), "A".to_string(), "🐱".to_string(), false);
    alice.is_connected = false;
    let bob = Player::new("bob".to_string(), "B".to_string(), "🐶".to_string(), true);
    state.players = vec![alice, bob];
    state.host_id = "alice".to_string();
    state.scores.set("alice", 50);
    state.scores.set("bob", 20);

    let mut room: TestRoom = Room::with_state(state, FixedWords::new(&["GATO"]));
    room.resume(T0);
    join(&mut room, 2, "bob");
    join(&mut room, 1, "alice");

    let state = room.state();
    assert!(state.player("alice").unwrap().is_host);
    assert!(!state.player("bob").unwrap().is_host);
    assert!(has_single_host(state));
    assert_eq!(state.scores.get("alice"), Some(50));
}

#[test]
fn test_rebinding_transport_supersedes_old_one() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");
    join(&mut room, 2, "alice");

    assert_eq!(room.state().players.len(), 1);
    // The old tab no longer speaks for alice
    assert!(send(&mut room, 1, ClientMessage::RestartGame, T0).is_empty());
    // Closing it does not mark her offline either
    assert!(room.disconnect(&1).is_empty());
    assert!(room.state().player("alice").unwrap().is_connected);
}

#[test]
fn test_update_config_is_host_only() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");
    join(&mut room, 2, "bob");

    let out = configure(
        &mut room,
        2,
        GameConfigPatch {
            rounds: Some(5),
            ..Default::default()
        },
    );
    assert_eq!(out.error_message(), Some("Only host can update config"));
    assert_eq!(out.effects().len(), 1);
    assert!(matches!(
        out.effects()[0],
        RoomEffect::Send {
            to: Recipient::Transport(2),
            ..
        }
    ));
    assert_eq!(room.state().config.rounds, 3);
    assert_eq!(room.state().status, GameStatus::Lobby);
}

#[test]
fn test_update_config_merges_and_moves_to_configuring() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");

    let out = configure(
        &mut room,
        1,
        GameConfigPatch {
            rounds: Some(5),
            turn_time_limit: Some(Some(20)),
            ..Default::default()
        },
    );
    assert!(out.persists());
    let state = room.state();
    assert_eq!(state.status, GameStatus::Configuring);
    assert_eq!(state.config.rounds, 5);
    assert_eq!(state.config.turn_time_limit, Some(20));
    assert_eq!(state.config.max_attempts, 6);
}

#[test]
fn test_update_config_rejects_invalid_values() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");

    let out = configure(
        &mut room,
        1,
        GameConfigPatch {
            max_attempts: Some(3),
            ..Default::default()
        },
    );
    assert!(out.error_message().unwrap().starts_with("Invalid config"));
    assert_eq!(room.state().config.max_attempts, 6);
    assert_eq!(room.state().status, GameStatus::Lobby);
}

#[test]
fn test_config_locked_during_game() {
    let mut room = room_with_players(GameMode::Team, &["GATO"], 2);
    start(&mut room, 1);

    let out = configure(
        &mut room,
        1,
        GameConfigPatch {
            rounds: Some(1),
            ..Default::default()
        },
    );
    assert_eq!(out.error_message(), Some("Cannot update config during game"));
}

#[test]
fn test_start_requires_quorum_for_multiplayer() {
    let mut room = room_with_players(GameMode::Team, &["GATO"], 1);
    let out = start(&mut room, 1);
    assert_eq!(
        out.error_message(),
        Some("Need at least 2 players for this mode")
    );
    assert_eq!(room.state().status, GameStatus::Configuring);

    let mut room = room_with_players(GameMode::Single, &["GATO"], 1);
    start(&mut room, 1);
    assert_eq!(room.state().status, GameStatus::Playing);
}

#[test]
fn test_start_is_host_only_and_not_while_running() {
    let mut room = room_with_players(GameMode::Team, &["GATO"], 2);
    let out = start(&mut room, 2);
    assert_eq!(out.error_message(), Some("Only host can start the game"));

    start(&mut room, 1);
    let out = start(&mut room, 1);
    assert_eq!(out.error_message(), Some("Game already in progress"));
}

#[test]
fn test_start_resets_scores_and_round_counter() {
    let mut room = room_with_players(GameMode::Team, &["GATO"], 2);
    start(&mut room, 1);

    let state = room.state();
    assert_eq!(state.status, GameStatus::Playing);
    assert_eq!(state.current_round, 1);
    assert!(state.round_winners.is_empty());
    assert_eq!(state.scores.get("p1"), Some(0));
    assert_eq!(state.scores.get("p2"), Some(0));
    assert_eq!(shared_round(&room).puzzle.word, "GATO");
    assert_eq!(shared_round(&room).start_time, T0);
}

#[test]
fn test_leave_transfers_host_to_first_remaining() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");
    join(&mut room, 2, "bob");
    join(&mut room, 3, "carol");

    let out = send(&mut room, 1, ClientMessage::Leave, T0);
    let state = room.state();
    assert_eq!(state.players.len(), 2);
    assert_eq!(state.host_id, "bob");
    assert!(state.player("bob").unwrap().is_host);
    assert!(!state.scores.contains("alice"));
    assert!(has_single_host(state));
    assert!(out.broadcasts().any(
        |m| matches!(m, ServerMessage::PlayerLeft { player_id } if player_id == "alice")
    ));
    assert!(room.connections().transport_for("alice").is_none());
}

#[test]
fn test_last_player_leaving_clears_host() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");
    send(&mut room, 1, ClientMessage::Leave, T0);
    assert!(room.state().players.is_empty());
    assert!(has_single_host(room.state()));

    join(&mut room, 2, "bob");
    assert_eq!(room.state().host_id, "bob");
    assert!(has_single_host(room.state()));
}

#[test]
fn test_leave_below_quorum_returns_to_lobby() {
    let mut room = room_with_players(GameMode::Team, &["GATO"], 2);
    configure(
        &mut room,
        1,
        GameConfigPatch {
            turn_time_limit: Some(Some(30)),
            ..Default::default()
        },
    );
    start(&mut room, 1);

    let out = send(&mut room, 2, ClientMessage::Leave, T0 + 1_000);
    let state = room.state();
    assert_eq!(state.status, GameStatus::Lobby);
    assert!(state.round.is_none());
    assert!(out
        .effects()
        .iter()
        .any(|e| matches!(e, RoomEffect::CancelTurnTimer)));
}

#[test]
fn test_leave_single_mode_keeps_status() {
    let mut room = room_with_players(GameMode::Single, &["GATO"], 2);
    start(&mut room, 1);
    send(&mut room, 2, ClientMessage::Leave, T0);
    assert_eq!(room.state().status, GameStatus::Playing);
    assert_eq!(room.state().players.len(), 1);
}

#[test]
fn test_kick_validation() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");
    join(&mut room, 2, "bob");

    let kick = |id: &str| ClientMessage::KickPlayer {
        player_id: id.to_string(),
    };

    let out = send(&mut room, 2, kick("alice"), T0);
    assert_eq!(out.error_message(), Some("Only host can kick players"));
    let out = send(&mut room, 1, kick("alice"), T0);
    assert_eq!(out.error_message(), Some("Cannot kick yourself"));
    let out = send(&mut room, 1, kick("zoe"), T0);
    assert_eq!(out.error_message(), Some("Player not found: zoe"));
    assert_eq!(room.state().players.len(), 2);
}

#[test]
fn test_kick_removes_player_and_binding() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");
    join(&mut room, 2, "bob");

    let out = send(
        &mut room,
        1,
        ClientMessage::KickPlayer {
            player_id: "bob".to_string(),
        },
        T0,
    );
    assert!(out.broadcasts().any(
        |m| matches!(m, ServerMessage::PlayerLeft { player_id } if player_id == "bob")
    ));
    let state = room.state();
    assert_eq!(state.players.len(), 1);
    assert!(!state.scores.contains("bob"));
    assert_eq!(state.host_id, "alice");
    assert!(has_single_host(state));

    // Bob's socket no longer speaks for anyone
    assert!(send(&mut room, 2, ClientMessage::Leave, T0).is_empty());
}

#[test]
fn test_restart_from_any_status() {
    let mut room = room_with_players(GameMode::Team, &["GATO"], 2);
    configure(
        &mut room,
        1,
        GameConfigPatch {
            turn_time_limit: Some(Some(30)),
            ..Default::default()
        },
    );
    start(&mut room, 1);
    guess(&mut room, 1, "g", T0 + 1_000);

    let out = send(&mut room, 2, ClientMessage::RestartGame, T0);
    assert_eq!(out.error_message(), Some("Only host can restart the game"));

    let out = send(&mut room, 1, ClientMessage::RestartGame, T0 + 2_000);
    assert!(out
        .effects()
        .iter()
        .any(|e| matches!(e, RoomEffect::CancelTurnTimer)));
    let state = room.state();
    assert_eq!(state.status, GameStatus::Lobby);
    assert_eq!(state.current_round, 0);
    assert!(state.round.is_none());
    assert!(state.round_winners.is_empty());
    assert!(state.players.iter().all(|p| p.score == 0));
    assert_eq!(state.scores.len(), 2);
}

#[test]
fn test_idle_reset_after_everyone_disconnects() {
    let mut room = room_with_players(GameMode::Team, &["GATO"], 2);
    start(&mut room, 1);

    let first = room.disconnect(&1);
    assert!(first.idle_reset().is_none());
    let last = room.disconnect(&2);
    let (after, generation) = last.idle_reset().expect("idle reset armed");
    assert_eq!(after, Duration::from_secs(300));
    assert!(room.idle_reset_pending());

    let out = room.idle_reset(generation);
    assert!(out.persists());
    assert_eq!(room.state(), &GameState::new("ABCD".to_string()));
    assert!(room.connections().is_empty());
    assert!(!room.idle_reset_pending());
}

#[test]
fn test_reconnect_cancels_idle_reset() {
    let mut room = room_with_players(GameMode::Team, &["GATO"], 2);
    start(&mut room, 1);
    room.disconnect(&1);
    let (_, generation) = room.disconnect(&2).idle_reset().unwrap();

    let out = join(&mut room, 7, "p2");
    assert!(out
        .effects()
        .iter()
        .any(|e| matches!(e, RoomEffect::CancelIdleReset)));

    assert!(room.idle_reset(generation).is_empty());
    assert_eq!(room.state().players.len(), 2);
    assert_eq!(room.state().status, GameStatus::Playing);
}

#[test]
fn test_no_idle_reset_in_lobby() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "alice");
    let out = room.disconnect(&1);
    assert!(out.idle_reset().is_none());
    assert!(!room.idle_reset_pending());
}

#[test]
fn test_custom_idle_policy() {
    let mut room = room_with_players(GameMode::Single, &["GATO"], 1)
        .with_idle_policy(IdlePolicy::new(Duration::from_secs(5)));
    start(&mut room, 1);
    let out = room.disconnect(&1);
    assert_eq!(out.idle_reset().map(|(after, _)| after), Some(Duration::from_secs(5)));
}

#[test]
fn test_resume_marks_everyone_offline() {
    let mut original = room_with_players(GameMode::Team, &["GATO"], 2);
    configure(
        &mut original,
        1,
        GameConfigPatch {
            turn_time_limit: Some(Some(15)),
            ..Default::default()
        },
    );
    start(&mut original, 1);
    let saved = original.state().clone();

    let mut room: TestRoom = Room::with_state(saved, FixedWords::new(&["GATO"]));
    let out = room.resume(T0 + 5_000);

    assert!(room.state().players.iter().all(|p| !p.is_connected));
    assert!(room.connections().is_empty());
    assert_eq!(out.turn_timer().map(|(after, _)| after), Some(Duration::from_secs(15)));
    assert!(out.idle_reset().is_some());
    assert_eq!(shared_round(&room).turn_start_time, Some(T0 + 5_000));
}

#[test]
fn test_host_invariant_through_churn() {
    let mut room = create_test_room(&["GATO"]);
    join(&mut room, 1, "a");
    join(&mut room, 2, "b");
    join(&mut room, 3, "c");
    assert!(has_single_host(room.state()));

    room.disconnect(&1);
    assert!(has_single_host(room.state()));
    send(
        &mut room,
        1,
        ClientMessage::KickPlayer {
            player_id: "b".to_string(),
        },
        T0,
    );
    assert!(has_single_host(room.state()));
    join(&mut room, 4, "a");
    send(
        &mut room,
        4,
        ClientMessage::KickPlayer {
            player_id: "b".to_string(),
        },
        T0,
    );
    assert!(has_single_host(room.state()));
    send(&mut room, 4, ClientMessage::Leave, T0);
    assert!(has_single_host(room.state()));
    assert_eq!(room.state().host_id, "c");
    join(&mut room, 5, "d");
    send(&mut room, 3, ClientMessage::Leave, T0);
    assert!(has_single_host(room.state()));
    assert_eq!(room.state().host_id, "d");
}
