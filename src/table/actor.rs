//! Table actor implementation with async message handling.
//!
//! One actor task owns one round and its timers. Every player message and
//! every timer expiry is serialized through the same inbox/tick loop, so
//! there is never more than one in-flight mutation of a round. When an
//! action is accepted, that player's turn timer is stopped in the same
//! synchronous step, before any suspension point, which guarantees a
//! late expiry can only ever be a no-op.

use super::{
    config::TableConfig,
    messages::{TableMessage, TableResponse},
};
use crate::game::{
    RoundAction, RoundError, RoundEvent, RoundState, RoundStateManagement, constants,
    entities::{Action, Answer, Chips, PlayerId, Question},
    states::Phase,
};
use crate::timer::{Timer, TimerFire, TimerScheduler};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::interval,
};
use uuid::Uuid;

/// Name of the shared answer-window timer for question phases.
const ANSWER_TIMER: &str = "answers";

fn action_timer_name(player: &PlayerId) -> String {
    format!("action:{player}")
}

/// Table actor handle for sending messages
#[derive(Clone)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
    table_id: Uuid,
}

impl TableHandle {
    /// Create a new table handle
    pub fn new(sender: mpsc::Sender<TableMessage>, table_id: Uuid) -> Self {
        Self { sender, table_id }
    }

    /// Get table ID
    pub fn table_id(&self) -> Uuid {
        self.table_id
    }

    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), String> {
        self.sender
            .send(message)
            .await
            .map_err(|_| "Table is closed".to_string())
    }
}

/// Table actor managing a single quiz-poker table
pub struct TableActor {
    /// Table ID
    id: Uuid,

    /// Table configuration
    config: TableConfig,

    /// Current round, if one has been started
    round: Option<RoundState>,

    /// Logical timers for the current round
    scheduler: TimerScheduler,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Whose turn timer is currently armed
    current_turn: Option<PlayerId>,

    /// Which question phase the answer timer was armed for
    answer_timer_phase: Option<Phase>,

    /// Is table paused
    is_paused: bool,

    /// Is table closed
    is_closed: bool,

    /// Completed round count
    rounds_played: u32,

    /// Subscribers for round events
    subscribers: HashMap<u64, mpsc::Sender<RoundEvent>>,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(config: TableConfig) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(100);
        let id = Uuid::new_v4();

        let actor = Self {
            id,
            config,
            round: None,
            scheduler: TimerScheduler::new(),
            inbox,
            current_turn: None,
            answer_timer_phase: None,
            is_paused: false,
            is_closed: false,
            rounds_played: 0,
            subscribers: HashMap::new(),
        };

        let handle = TableHandle::new(sender, id);

        (actor, handle)
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!("Table {} '{}' starting", self.id, self.config.name);

        // Logical time advances one second per tick.
        let mut tick_interval = interval(Duration::from_secs(1));

        loop {
            tokio::select! {
                Some(message) = self.inbox.recv() => {
                    self.handle_message(message);

                    if self.is_closed {
                        break;
                    }
                }

                _ = tick_interval.tick() => {
                    self.handle_tick();
                }
            }
        }

        // No timer may outlive its table.
        self.scheduler.stop_all();
        log::info!(
            "Table {} '{}' closed after {} round(s)",
            self.id,
            self.config.name,
            self.rounds_played
        );
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::StartRound {
                players,
                question,
                response,
            } => {
                let result = self.handle_start_round(players, question);
                let _ = response.send(result);
            }

            TableMessage::TakeAction {
                player,
                action,
                response,
            } => {
                let result = self.handle_action(&player, action);
                let _ = response.send(result);
            }

            TableMessage::SubmitAnswer {
                player,
                value,
                response,
            } => {
                let result = self.handle_answer(&player, value);
                let _ = response.send(result);
            }

            TableMessage::GetSnapshot { response } => {
                let snapshot = self.round.as_ref().map(|round| round.snapshot());
                let _ = response.send(snapshot);
            }

            TableMessage::Pause { response } => {
                self.is_paused = true;
                self.scheduler.pause_all();
                let _ = response.send(TableResponse::Accepted);
            }

            TableMessage::Resume { response } => {
                self.is_paused = false;
                self.scheduler.resume_all();
                let _ = response.send(TableResponse::Accepted);
            }

            TableMessage::Close { response } => {
                self.is_closed = true;
                self.scheduler.stop_all();
                let _ = response.send(TableResponse::Accepted);
            }

            TableMessage::Tick => {
                self.handle_tick();
            }

            TableMessage::Subscribe {
                subscriber_id,
                sender,
            } => {
                self.subscribers.insert(subscriber_id, sender);
                log::debug!(
                    "Subscriber {} attached to table {} events",
                    subscriber_id,
                    self.id
                );
            }

            TableMessage::Unsubscribe { subscriber_id } => {
                self.subscribers.remove(&subscriber_id);
                log::debug!(
                    "Subscriber {} detached from table {} events",
                    subscriber_id,
                    self.id
                );
            }
        }
    }

    /// Handle a new round request
    fn handle_start_round(
        &mut self,
        players: Vec<(String, Chips)>,
        question: Question,
    ) -> TableResponse {
        if self.is_paused {
            return TableResponse::Rejected(RoundError::GameNotActive);
        }
        if let Some(round) = &self.round
            && !round.is_finished()
        {
            return TableResponse::Error("Round already in progress".to_string());
        }
        if players.len() < constants::MIN_PLAYERS || players.len() > self.config.max_players {
            return TableResponse::Error(format!(
                "Need between {} and {} players",
                constants::MIN_PLAYERS,
                self.config.max_players
            ));
        }

        let roster: Vec<(PlayerId, Chips)> = players
            .into_iter()
            .map(|(name, stack)| (PlayerId::new(&name), stack))
            .collect();
        let round = RoundState::new(roster, question, self.config.round_settings());

        log::info!("Table {} starting round {}", self.id, round.data().round_id);
        self.round = Some(round);
        self.current_turn = None;
        self.answer_timer_phase = None;
        self.scheduler.stop_all();
        self.settle();
        TableResponse::Accepted
    }

    /// Handle a player wagering action
    fn handle_action(&mut self, player: &str, action: Action) -> TableResponse {
        if self.is_paused {
            return TableResponse::Rejected(RoundError::GameNotActive);
        }
        let Some(round) = self.round.as_mut() else {
            return TableResponse::Rejected(RoundError::NoActiveRound);
        };

        let id = PlayerId::new(player);
        match round.take_action(&id, action) {
            Ok(()) => {
                // Cancel this player's turn timer before anything can
                // suspend; a timeout racing this action must lose.
                self.scheduler.stop(&action_timer_name(&id));
                if self.current_turn.as_ref() == Some(&id) {
                    self.current_turn = None;
                }
                self.settle();
                TableResponse::Accepted
            }
            Err(reason) => TableResponse::Rejected(reason),
        }
    }

    /// Handle an answer submission, rejecting missing or malformed values
    /// before they reach the engine
    fn handle_answer(&mut self, player: &str, value: Option<Answer>) -> TableResponse {
        let Some(value) = value else {
            return TableResponse::Rejected(RoundError::MissingAnswer);
        };
        if !value.is_finite() {
            return TableResponse::Rejected(RoundError::AnswerWrongType);
        }
        self.handle_action(player, Action::Answer(value))
    }

    /// Advance logical time (called by the interval and by injected ticks)
    fn handle_tick(&mut self) {
        if self.is_paused || self.is_closed {
            return;
        }

        let fires = self.scheduler.advance(Duration::from_secs(1));
        for fire in fires {
            match fire {
                TimerFire::Warning {
                    name, remaining, ..
                } => {
                    self.broadcast_one(RoundEvent::TimerWarning {
                        name,
                        remaining_secs: remaining.as_secs(),
                    });
                }
                TimerFire::Expired { name, player, .. } => {
                    self.broadcast_one(RoundEvent::TimerExpired { name });
                    let Some(round) = self.round.as_mut() else {
                        continue;
                    };
                    // Fold the slow player, or close the answer window.
                    // Both are no-ops when the round has already moved on.
                    let handled = match player {
                        Some(player) => {
                            if self.current_turn.as_ref() == Some(&player) {
                                self.current_turn = None;
                            }
                            round.expire_turn(&player)
                        }
                        None => round.expire_answers(),
                    };
                    if !handled {
                        log::debug!("Table {}: stale timer expiry ignored", self.id);
                    }
                }
            }
        }

        self.settle();
    }

    /// Step the round as far as it will go, re-arm timers for whatever
    /// phase it landed in, and flush events to subscribers.
    fn settle(&mut self) {
        let mut events: VecDeque<RoundEvent> = VecDeque::new();

        if let Some(round) = self.round.take() {
            let mut round = round;
            loop {
                events.extend(round.drain_events());
                let before = round.phase();
                round = round.step();
                if round.phase() == before {
                    break;
                }
                if round.is_finished() {
                    self.rounds_played += 1;
                    log::debug!("Table {} round {} finished", self.id, self.rounds_played);
                }
            }
            self.round = Some(round);
        }

        self.arm_timers(&mut events);
        self.broadcast(events);
    }

    /// Keep exactly the timers the current phase needs: a turn timer for
    /// the player next to act, or one answer-window timer per question
    /// phase. Everything else is stopped.
    fn arm_timers(&mut self, events: &mut VecDeque<RoundEvent>) {
        let Some(round) = &self.round else {
            self.scheduler.stop_all();
            return;
        };
        let phase = round.phase();

        if round.is_finished() {
            self.scheduler.stop_all();
            self.current_turn = None;
            self.answer_timer_phase = None;
            return;
        }

        if !phase.is_question() && self.answer_timer_phase.take().is_some() {
            self.scheduler.stop(ANSWER_TIMER);
        }
        if !phase.is_betting()
            && let Some(stale) = self.current_turn.take()
        {
            self.scheduler.stop(&action_timer_name(&stale));
        }

        if phase.is_betting() {
            let next = round.next_to_act();
            if next != self.current_turn {
                if let Some(stale) = self.current_turn.take() {
                    self.scheduler.stop(&action_timer_name(&stale));
                }
                if let Some(player) = next {
                    let settings = self.config.round_settings();
                    let name = action_timer_name(&player);
                    self.scheduler.start(
                        Timer::new(&name, settings.action_timeout)
                            .for_phase(phase)
                            .for_player(player.clone())
                            .with_warning(settings.warning_lead),
                    );
                    events.push_back(RoundEvent::TimerStarted {
                        name,
                        secs: settings.action_timeout.as_secs(),
                    });
                    self.current_turn = Some(player);
                }
            }
        } else if phase.is_question() && self.answer_timer_phase != Some(phase) {
            let settings = self.config.round_settings();
            self.scheduler.start(
                Timer::new(ANSWER_TIMER, settings.answer_timeout)
                    .for_phase(phase)
                    .with_warning(settings.warning_lead),
            );
            events.push_back(RoundEvent::TimerStarted {
                name: ANSWER_TIMER.to_string(),
                secs: settings.answer_timeout.as_secs(),
            });
            self.answer_timer_phase = Some(phase);
        }
    }

    /// Broadcast one event to all subscribers
    fn broadcast_one(&mut self, event: RoundEvent) {
        let mut events = VecDeque::with_capacity(1);
        events.push_back(event);
        self.broadcast(events);
    }

    /// Broadcast round events to all subscribers, dropping the ones that
    /// went away
    fn broadcast(&mut self, events: VecDeque<RoundEvent>) {
        for event in events {
            log::debug!("Table {}: {}", self.id, event);
            self.subscribers.retain(|subscriber_id, sender| {
                match sender.try_send(event.clone()) {
                    Ok(_) => true,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        log::warn!(
                            "Subscriber {} channel full, dropping event",
                            subscriber_id
                        );
                        true
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        log::debug!("Subscriber {} disconnected, removing", subscriber_id);
                        false
                    }
                }
            });
        }
    }
}
