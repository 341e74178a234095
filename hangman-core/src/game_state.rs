use hangman_types::{
    ClientMessage, CompetitivePlayerState, CompetitiveRound, GameConfigPatch, GameError, GameMode,
    GameState, GameStatus, Player, PlayerId, Puzzle, RoomCode, RoundPlay, RoundState,
    ServerMessage,
};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    normalize_letter, normalize_word, scoring_length, ConnectionRegistry, IdlePolicy, Outbox,
    RoomEffect, ScoringEngine, WordSource,
};

type Step = Result<(), GameError>;

/// Where a guess left the word it was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    Solved,
    Exhausted,
    Continue,
}

/// Records `letter` against `puzzle` and reports whether it was in the word.
/// Win is checked before loss.
pub fn apply_guess(
    puzzle: &mut Puzzle,
    letter: char,
    max_attempts: u8,
) -> Result<(bool, GuessOutcome), GameError> {
    if puzzle.has_guessed(letter) {
        return Err(GameError::LetterAlreadyGuessed { letter });
    }

    let target = normalize_word(&puzzle.word);
    let correct = target.contains(letter);
    if correct {
        puzzle.revealed_letters.push(letter);
    } else {
        puzzle.wrong_letters.push(letter);
    }

    let solved = target
        .chars()
        .all(|c| c.is_whitespace() || puzzle.revealed_letters.contains(&c));
    let outcome = if solved {
        GuessOutcome::Solved
    } else if puzzle.wrong_letters.len() >= max_attempts as usize {
        GuessOutcome::Exhausted
    } else {
        GuessOutcome::Continue
    };

    Ok((correct, outcome))
}

/// One room's authoritative game.
///
/// Every operation is synchronous, takes the current time in milliseconds when
/// it needs one, and returns the effects the host must carry out. `T` is
/// whatever the host uses to tell connections apart.
pub struct Room<T> {
    state: GameState,
    connections: ConnectionRegistry<T>,
    words: Arc<dyn WordSource>,
    idle_policy: IdlePolicy,
    turn_generation: u64,
    idle_generation: u64,
    idle_pending: bool,
}

impl<T: Clone + Eq + Hash + fmt::Debug> Room<T> {
    pub fn new(room_code: RoomCode, words: Arc<dyn WordSource>) -> Self {
        Self::with_state(GameState::new(room_code), words)
    }

    /// Wraps a previously saved state. Call `resume` before handling traffic.
    pub fn with_state(state: GameState, words: Arc<dyn WordSource>) -> Self {
        Self {
            state,
            connections: ConnectionRegistry::new(),
            words,
            idle_policy: IdlePolicy::default(),
            turn_generation: 0,
            idle_generation: 0,
            idle_pending: false,
        }
    }

    pub fn with_idle_policy(mut self, idle_policy: IdlePolicy) -> Self {
        self.idle_policy = idle_policy;
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn room_code(&self) -> &str {
        &self.state.room_code
    }

    pub fn connections(&self) -> &ConnectionRegistry<T> {
        &self.connections
    }

    pub fn idle_reset_pending(&self) -> bool {
        self.idle_pending
    }

    /// Brings a restored state back to life: nobody is connected yet, so
    /// players are marked offline and the timers are re-armed.
    pub fn resume(&mut self, now: i64) -> Outbox<T> {
        let mut out = Outbox::new();
        for player in self.state.players.iter_mut() {
            player.is_connected = false;
        }
        if self.state.status == GameStatus::Playing {
            self.arm_turn_timer(now, &mut out);
        }
        if !self.state.players.is_empty() {
            self.maybe_arm_idle_reset(&mut out);
        }
        out
    }

    /// A transport opened. It gets the current state right away.
    pub fn connect(&mut self, transport: T) -> Outbox<T> {
        let mut out = Outbox::new();
        out.unicast(transport, ServerMessage::StateUpdate(self.state.clone()));
        out
    }

    /// A transport closed without saying goodbye. The player keeps their seat
    /// (and host role) until they come back or the room goes idle.
    pub fn disconnect(&mut self, transport: &T) -> Outbox<T> {
        let mut out = Outbox::new();
        let Some(session) = self.connections.release_transport(transport) else {
            return out;
        };
        let Some(player) = self.state.player_mut(&session) else {
            return out;
        };
        player.is_connected = false;
        info!(room = %self.state.room_code, player_id = %session, "Player disconnected");

        self.maybe_arm_idle_reset(&mut out);
        out.broadcast(ServerMessage::PlayerLeft { player_id: session });
        self.commit(&mut out);
        out
    }

    pub fn handle_message(&mut self, transport: T, message: ClientMessage, now: i64) -> Outbox<T> {
        let mut out = Outbox::new();
        let kind = message.kind();

        let result = match message {
            ClientMessage::Join {
                name,
                avatar,
                session_id,
            } => self.join(transport.clone(), session_id, name, avatar, &mut out),
            other => match self.connections.session_for(&transport).cloned() {
                Some(session) => self.dispatch(&session, other, now, &mut out),
                None => {
                    debug!(room = %self.state.room_code, ?transport, kind, "Ignoring message from unjoined transport");
                    return out;
                }
            },
        };

        if let Err(err) = result {
            debug!(room = %self.state.room_code, kind, error = %err, "Rejected action");
            out = Outbox::new();
            out.unicast(
                transport,
                ServerMessage::Error {
                    message: err.to_string(),
                },
            );
        }
        out
    }

    fn dispatch(
        &mut self,
        session: &str,
        message: ClientMessage,
        now: i64,
        out: &mut Outbox<T>,
    ) -> Step {
        match message {
            ClientMessage::Join { .. } => Ok(()),
            ClientMessage::Leave => self.leave(session, now, out),
            ClientMessage::UpdateConfig(patch) => self.update_config(session, &patch, out),
            ClientMessage::StartGame => self.start_game(session, now, out),
            ClientMessage::GuessLetter { letter } => self.guess_letter(session, &letter, now, out),
            ClientMessage::NextRound => self.next_round(session, now, out),
            ClientMessage::RestartGame => self.restart_game(session, out),
            ClientMessage::KickPlayer { player_id } => {
                self.kick_player(session, &player_id, now, out)
            }
        }
    }

    /// The turn timer armed with `generation` went off.
    pub fn turn_timeout(&mut self, generation: u64, now: i64) -> Outbox<T> {
        let mut out = Outbox::new();
        if generation != self.turn_generation || self.state.status != GameStatus::Playing {
            debug!(room = %self.state.room_code, generation, "Stale turn timer");
            return out;
        }

        let player_count = self.state.players.len();
        let Some(round) = self.state.round.as_mut().and_then(RoundPlay::shared_mut) else {
            return out;
        };
        if player_count == 0 {
            return out;
        }

        let holder = self
            .state
            .players
            .get(round.current_player_index)
            .map(|p| p.id.clone());
        round.current_player_index = (round.current_player_index + 1) % player_count;

        if let Some(player_id) = holder {
            info!(room = %self.state.room_code, %player_id, "Turn timed out");
            out.broadcast(ServerMessage::TurnTimeout { player_id });
        }
        self.arm_turn_timer(now, &mut out);
        self.commit(&mut out);
        out
    }

    /// The idle timer armed with `generation` went off.
    pub fn idle_reset(&mut self, generation: u64) -> Outbox<T> {
        let mut out = Outbox::new();
        if generation != self.idle_generation || !self.idle_pending {
            return out;
        }
        self.idle_pending = false;
        if self.state.connected_count() > 0 {
            return out;
        }

        info!(room = %self.state.room_code, "Resetting idle room");
        self.state = GameState::new(self.state.room_code.clone());
        self.connections.clear();
        self.cancel_turn_timer(&mut out);
        self.commit(&mut out);
        out
    }

    fn join(
        &mut self,
        transport: T,
        session_id: PlayerId,
        name: String,
        avatar: String,
        out: &mut Outbox<T>,
    ) -> Step {
        if session_id.trim().is_empty() {
            return Err(GameError::MissingSession);
        }

        self.connections.bind(&session_id, transport);
        self.cancel_idle_reset(out);

        let is_host_session = self.state.host_id == session_id;
        if let Some(player) = self.state.player_mut(&session_id) {
            player.is_connected = true;
            player.name = name;
            player.avatar = avatar;
            if is_host_session {
                for player in self.state.players.iter_mut() {
                    player.is_host = player.id == session_id;
                }
            }
            info!(room = %self.state.room_code, player_id = %session_id, "Player reconnected");
        } else {
            let is_host = self.state.players.is_empty();
            let player = Player::new(session_id.clone(), name, avatar, is_host);
            self.state.players.push(player.clone());
            self.state.scores.set(&session_id, 0);
            if is_host {
                self.state.host_id = session_id.clone();
            }
            info!(room = %self.state.room_code, player_id = %session_id, is_host, "Player joined");
            out.broadcast(ServerMessage::PlayerJoined(player));
        }

        self.commit(out);
        Ok(())
    }

    fn leave(&mut self, session: &str, now: i64, out: &mut Outbox<T>) -> Step {
        let Some(index) = self.state.player_index(session) else {
            return Ok(());
        };

        let removed = self.state.players.remove(index);
        self.state.scores.remove(session);
        self.connections.release_session(session);

        if removed.is_host {
            match self.state.players.first_mut() {
                Some(next) => {
                    next.is_host = true;
                    self.state.host_id = next.id.clone();
                }
                None => self.state.host_id.clear(),
            }
        }
        info!(room = %self.state.room_code, player_id = %session, "Player left");
        out.broadcast(ServerMessage::PlayerLeft {
            player_id: session.to_string(),
        });

        let count = self.state.players.len();
        if count == 0 || (count < 2 && self.state.config.mode != GameMode::Single) {
            self.state.status = GameStatus::Lobby;
            self.state.round = None;
            self.cancel_turn_timer(out);
        } else {
            self.repair_round(index, session, now, out);
        }

        self.maybe_arm_idle_reset(out);
        self.commit(out);
        Ok(())
    }

    fn kick_player(&mut self, session: &str, target: &str, now: i64, out: &mut Outbox<T>) -> Step {
        self.require_host(session, "kick players")?;
        if target == session {
            return Err(GameError::CannotKickSelf);
        }
        let index = self
            .state
            .player_index(target)
            .ok_or_else(|| GameError::PlayerNotFound {
                player_id: target.to_string(),
            })?;

        self.state.players.remove(index);
        self.state.scores.remove(target);
        self.connections.release_session(target);
        info!(room = %self.state.room_code, player_id = %target, "Player kicked");
        out.broadcast(ServerMessage::PlayerLeft {
            player_id: target.to_string(),
        });

        self.repair_round(index, target, now, out);
        self.commit(out);
        Ok(())
    }

    /// Keeps the round consistent after the player at `index` was removed.
    fn repair_round(&mut self, index: usize, removed: &str, now: i64, out: &mut Outbox<T>) {
        let player_count = self.state.players.len();
        match self.state.round.as_mut() {
            None => {}
            Some(RoundPlay::Single(round)) | Some(RoundPlay::Team(round)) => {
                if index < round.current_player_index {
                    round.current_player_index -= 1;
                }
                if round.current_player_index >= player_count {
                    round.current_player_index = 0;
                }
                self.arm_turn_timer(now, out);
            }
            Some(RoundPlay::Competitive(round)) => {
                round.competitive_states.retain(|s| s.player_id != removed);
                if round.competitive_states.iter().all(|s| s.is_finished()) {
                    self.finish_competitive_round(out);
                }
            }
        }
    }

    fn update_config(
        &mut self,
        session: &str,
        patch: &GameConfigPatch,
        out: &mut Outbox<T>,
    ) -> Step {
        self.require_host(session, "update config")?;
        if !matches!(
            self.state.status,
            GameStatus::Lobby | GameStatus::Configuring
        ) {
            return Err(GameError::ConfigLocked);
        }

        self.state.config = self.state.config.merged(patch)?;
        self.state.status = GameStatus::Configuring;
        self.commit(out);
        Ok(())
    }

    fn start_game(&mut self, session: &str, now: i64, out: &mut Outbox<T>) -> Step {
        self.require_host(session, "start the game")?;
        if matches!(
            self.state.status,
            GameStatus::Playing | GameStatus::BetweenRounds
        ) {
            return Err(GameError::GameAlreadyInProgress);
        }
        let required = match self.state.config.mode {
            GameMode::Single => 1,
            GameMode::Team | GameMode::Competitive => 2,
        };
        if self.state.players.len() < required {
            return Err(GameError::NotEnoughPlayers { required });
        }

        self.reset_scores();
        self.state.current_round = 1;
        self.state.round_winners.clear();
        self.start_round(now, out);
        Ok(())
    }

    fn next_round(&mut self, session: &str, now: i64, out: &mut Outbox<T>) -> Step {
        self.require_host(session, "start next round")?;
        if self.state.status != GameStatus::BetweenRounds {
            return Err(GameError::CannotStartNextRound);
        }

        self.state.current_round += 1;
        self.start_round(now, out);
        Ok(())
    }

    fn restart_game(&mut self, session: &str, out: &mut Outbox<T>) -> Step {
        self.require_host(session, "restart the game")?;

        self.state.scores.clear();
        self.reset_scores();
        self.state.status = GameStatus::Lobby;
        self.state.current_round = 0;
        self.state.round_winners.clear();
        self.state.round = None;
        self.cancel_turn_timer(out);
        info!(room = %self.state.room_code, "Game restarted");
        self.commit(out);
        Ok(())
    }

    fn start_round(&mut self, now: i64, out: &mut Outbox<T>) {
        let config = self.state.config.clone();
        let round_number = self.state.current_round;
        self.state.status = GameStatus::Playing;

        if config.mode == GameMode::Competitive {
            let drawn =
                self.words
                    .draw_many(config.category, config.difficulty, self.state.players.len());
            let competitive_states = self
                .state
                .players
                .iter()
                .zip(drawn)
                .map(|(player, drawn)| CompetitivePlayerState::new(player.id.clone(), drawn.word))
                .collect();
            self.state.round = Some(RoundPlay::Competitive(CompetitiveRound {
                round_number,
                start_time: now,
                competitive_states,
            }));
            self.cancel_turn_timer(out);
        } else {
            let drawn = self.words.draw_one(config.category, config.difficulty);
            let shared = RoundState {
                round_number,
                puzzle: Puzzle::new(drawn.word),
                category: drawn.category,
                current_player_index: 0,
                start_time: now,
                turn_start_time: None,
            };
            self.state.round = Some(match config.mode {
                GameMode::Single => RoundPlay::Single(shared),
                _ => RoundPlay::Team(shared),
            });
            self.arm_turn_timer(now, out);
        }

        info!(room = %self.state.room_code, round = round_number, mode = ?config.mode, "Round started");
        self.commit(out);
    }

    fn guess_letter(&mut self, session: &str, raw: &str, now: i64, out: &mut Outbox<T>) -> Step {
        if self.state.status != GameStatus::Playing {
            return Err(GameError::GameNotInProgress);
        }
        let letter = normalize_letter(raw).ok_or_else(|| GameError::InvalidLetter {
            letter: raw.to_string(),
        })?;

        let competitive = match &self.state.round {
            None => return Err(GameError::GameNotInProgress),
            Some(round) => round.competitive().is_some(),
        };
        if competitive {
            self.guess_competitive(session, letter, now, out)
        } else {
            self.guess_shared(session, letter, now, out)
        }
    }

    fn guess_shared(&mut self, session: &str, letter: char, now: i64, out: &mut Outbox<T>) -> Step {
        let (team, turn_index) = match &self.state.round {
            Some(RoundPlay::Team(round)) => (true, round.current_player_index),
            Some(RoundPlay::Single(round)) => (false, round.current_player_index),
            _ => return Err(GameError::GameNotInProgress),
        };
        if self.state.player(session).is_none() {
            return Err(GameError::PlayerNotFound {
                player_id: session.to_string(),
            });
        }
        if team && self.state.players.get(turn_index).map(|p| p.id.as_str()) != Some(session) {
            return Err(GameError::NotYourTurn);
        }

        let max_attempts = self.state.config.max_attempts;
        let player_count = self.state.players.len();
        let Some(round) = self.state.round.as_mut().and_then(RoundPlay::shared_mut) else {
            return Err(GameError::GameNotInProgress);
        };
        let (correct, outcome) = apply_guess(&mut round.puzzle, letter, max_attempts)?;

        let elapsed = now - round.start_time;
        let wrong_count = round.puzzle.wrong_letters.len();
        let length = scoring_length(&round.puzzle.word);
        if team && outcome == GuessOutcome::Continue {
            round.current_player_index = (round.current_player_index + 1) % player_count;
        }

        out.broadcast(ServerMessage::LetterGuessed {
            player_id: session.to_string(),
            letter,
            correct,
        });

        match outcome {
            GuessOutcome::Solved => {
                let score = ScoringEngine::score(true, wrong_count, max_attempts, elapsed, length);
                if team {
                    let share = ScoringEngine::team_share(score, player_count);
                    for player in self.state.players.iter_mut() {
                        player.score = self.state.scores.add(&player.id, share);
                    }
                } else {
                    self.state.scores.add(session, score);
                    self.state.sync_player_score(session);
                }
                self.state.round_winners.push(session.to_string());
                self.end_round(Some(session.to_string()), out);
            }
            GuessOutcome::Exhausted => self.end_round(None, out),
            GuessOutcome::Continue if team => self.arm_turn_timer(now, out),
            GuessOutcome::Continue => {}
        }

        self.commit(out);
        Ok(())
    }

    fn guess_competitive(
        &mut self,
        session: &str,
        letter: char,
        now: i64,
        out: &mut Outbox<T>,
    ) -> Step {
        let max_attempts = self.state.config.max_attempts;
        let Some(RoundPlay::Competitive(round)) = self.state.round.as_mut() else {
            return Err(GameError::GameNotInProgress);
        };
        let start_time = round.start_time;
        let Some(own) = round
            .competitive_states
            .iter_mut()
            .find(|s| s.player_id == session)
        else {
            return Err(GameError::NotInRound);
        };
        if own.is_finished() {
            return Err(GameError::AlreadyFinished);
        }

        let (correct, outcome) = apply_guess(&mut own.puzzle, letter, max_attempts)?;
        let mut points = None;
        match outcome {
            GuessOutcome::Solved => {
                own.has_won = true;
                own.finish_time = Some(now);
                points = Some(ScoringEngine::score(
                    true,
                    own.puzzle.wrong_letters.len(),
                    max_attempts,
                    now - start_time,
                    scoring_length(&own.puzzle.word),
                ));
            }
            GuessOutcome::Exhausted => {
                own.has_lost = true;
                own.finish_time = Some(now);
            }
            GuessOutcome::Continue => {}
        }
        let all_finished = round.competitive_states.iter().all(|s| s.is_finished());

        out.broadcast(ServerMessage::LetterGuessed {
            player_id: session.to_string(),
            letter,
            correct,
        });
        if let Some(points) = points {
            self.state.scores.add(session, points);
            self.state.sync_player_score(session);
        }
        if all_finished {
            self.finish_competitive_round(out);
        }

        self.commit(out);
        Ok(())
    }

    /// Earliest finisher among the winners takes the round. Equal finish times
    /// go to whoever comes first in the list.
    fn finish_competitive_round(&mut self, out: &mut Outbox<T>) {
        let winner = self
            .state
            .round
            .as_ref()
            .and_then(RoundPlay::competitive)
            .and_then(|round| {
                round
                    .competitive_states
                    .iter()
                    .filter(|s| s.has_won)
                    .min_by_key(|s| s.finish_time.unwrap_or(i64::MAX))
                    .map(|s| s.player_id.clone())
            });
        if let Some(winner) = &winner {
            self.state.round_winners.push(winner.clone());
        }
        self.end_round(winner, out);
    }

    fn end_round(&mut self, winner: Option<PlayerId>, out: &mut Outbox<T>) {
        self.cancel_turn_timer(out);
        let word = self
            .state
            .round
            .take()
            .map(|round| round.representative_word())
            .unwrap_or_default();
        info!(room = %self.state.room_code, round = self.state.current_round, winner = ?winner, "Round ended");
        out.broadcast(ServerMessage::RoundEnded { winner, word });

        if self.state.current_round >= u32::from(self.state.config.rounds) {
            self.state.status = GameStatus::Finished;
            let winner = self.state.scores.leader().cloned();
            info!(room = %self.state.room_code, winner = ?winner, "Game ended");
            out.broadcast(ServerMessage::GameEnded {
                winner,
                scores: self.state.scores.clone(),
            });
        } else {
            self.state.status = GameStatus::BetweenRounds;
        }
    }

    fn reset_scores(&mut self) {
        for player in self.state.players.iter_mut() {
            self.state.scores.set(&player.id, 0);
            player.score = 0;
        }
    }

    fn require_host(&self, session: &str, action: &str) -> Step {
        if self.state.is_host(session) {
            Ok(())
        } else {
            Err(GameError::not_host(action))
        }
    }

    /// Starts a fresh turn clock, superseding any armed one. Only shared
    /// rounds with a configured limit have a turn timer.
    fn arm_turn_timer(&mut self, now: i64, out: &mut Outbox<T>) {
        let Some(limit) = self.state.config.turn_time_limit else {
            return;
        };
        let Some(round) = self.state.round.as_mut().and_then(RoundPlay::shared_mut) else {
            return;
        };
        round.turn_start_time = Some(now);
        self.turn_generation += 1;
        out.push(RoomEffect::ArmTurnTimer {
            after: Duration::from_secs(u64::from(limit)),
            generation: self.turn_generation,
        });
    }

    fn cancel_turn_timer(&mut self, out: &mut Outbox<T>) {
        self.turn_generation += 1;
        out.push(RoomEffect::CancelTurnTimer);
    }

    fn maybe_arm_idle_reset(&mut self, out: &mut Outbox<T>) {
        if self.state.connected_count() > 0 || self.state.status == GameStatus::Lobby {
            return;
        }
        self.idle_generation += 1;
        self.idle_pending = true;
        out.push(RoomEffect::ArmIdleReset {
            after: self.idle_policy.reset_after,
            generation: self.idle_generation,
        });
    }

    fn cancel_idle_reset(&mut self, out: &mut Outbox<T>) {
        if !self.idle_pending {
            return;
        }
        self.idle_generation += 1;
        self.idle_pending = false;
        out.push(RoomEffect::CancelIdleReset);
    }

    fn commit(&self, out: &mut Outbox<T>) {
        out.broadcast(ServerMessage::StateUpdate(self.state.clone()));
        out.push(RoomEffect::Persist);
    }
}
