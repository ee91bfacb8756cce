use std::{cell::RefCell, rc::Rc, time::Duration};

use proptest::prelude::*;
use train_mania_core::{
    AudioCue, AudioNotifier, CellCoord, Event, InputEvent, LeaderboardEntry, Phase, Scheduler,
    ScoreboardError, ScoreboardPort, StageId, DEFAULT_STAGES,
};
use train_mania_system_round::{Config, IntervalScheduler, RoundController};
use train_mania_world::{query, ScriptedRandom, SeededRandom, World};

const TRAIN_STEP: Duration = Duration::from_millis(1_300);

#[derive(Clone, Debug, Default)]
struct SharedBoard(Rc<RefCell<Vec<LeaderboardEntry>>>);

impl ScoreboardPort for SharedBoard {
    fn append(&mut self, entry: LeaderboardEntry) -> Result<(), ScoreboardError> {
        self.0.borrow_mut().push(entry);
        Ok(())
    }

    fn list(&self) -> Result<Vec<LeaderboardEntry>, ScoreboardError> {
        Ok(self.0.borrow().clone())
    }
}

#[derive(Debug, Default)]
struct BrokenBoard;

impl ScoreboardPort for BrokenBoard {
    fn append(&mut self, _entry: LeaderboardEntry) -> Result<(), ScoreboardError> {
        Err(ScoreboardError::Malformed("disk full".to_owned()))
    }

    fn list(&self) -> Result<Vec<LeaderboardEntry>, ScoreboardError> {
        Err(ScoreboardError::Malformed("unreadable".to_owned()))
    }
}

#[derive(Clone, Debug, Default)]
struct RecordingAudio(Rc<RefCell<Vec<AudioCue>>>);

impl AudioNotifier for RecordingAudio {
    fn cue(&mut self, cue: AudioCue) {
        self.0.borrow_mut().push(cue);
    }
}

struct Harness {
    controller: RoundController<IntervalScheduler>,
    board: SharedBoard,
    audio: RecordingAudio,
}

impl Harness {
    // Reset draws the next tile, then goal row 3 and column 2.
    fn scripted(tail: &[u32]) -> Self {
        let mut values = vec![0, 3, 2];
        values.extend_from_slice(tail);
        let world = World::new(DEFAULT_STAGES.to_vec(), Box::new(ScriptedRandom::new(values)))
            .expect("default stages are valid");
        Self::with_board(world, SharedBoard::default())
    }

    fn with_board(world: World, board: SharedBoard) -> Self {
        let audio = RecordingAudio::default();
        let controller = RoundController::new(
            world,
            IntervalScheduler::new(),
            Config::default(),
            Box::new(board.clone()),
            Box::new(audio.clone()),
        );
        Self {
            controller,
            board,
            audio,
        }
    }

    fn input(&mut self, input: InputEvent) -> Vec<Event> {
        let mut events = Vec::new();
        self.controller.handle_input(input, &mut events);
        events
    }

    fn place(&mut self, row: u32, column: u32) -> Vec<Event> {
        self.input(InputEvent::PlaceTile { row, column })
    }

    fn advance(&mut self, elapsed: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        self.controller.advance(elapsed, &mut events);
        events
    }

    fn build_route_to_goal(&mut self) {
        for (row, column) in [(0, 1), (0, 2), (1, 2), (2, 2)] {
            let events = self.place(row, column);
            assert!(matches!(events.first(), Some(Event::TilePlaced { .. })));
        }
    }
}

fn count(events: &[Event], predicate: impl Fn(&Event) -> bool) -> usize {
    events.iter().filter(|event| predicate(event)).count()
}

fn is_departure(event: &Event) -> bool {
    matches!(
        event,
        Event::PhaseChanged {
            phase: Phase::Departed
        }
    )
}

fn is_train_event(event: &Event) -> bool {
    matches!(
        event,
        Event::TrainAdvanced { .. } | Event::TrainDerailed { .. }
    )
}

#[test]
fn countdown_ticks_once_per_second_while_building() {
    let mut harness = Harness::scripted(&[]);

    let events = harness.advance(Duration::from_millis(3_400));

    assert_eq!(
        events,
        vec![
            Event::CountdownChanged { remaining: 59 },
            Event::CountdownChanged { remaining: 58 },
            Event::CountdownChanged { remaining: 57 },
        ]
    );
    assert!(harness.controller.countdown_running());
    assert!(!harness.controller.train_running());
}

#[test]
fn countdown_expiry_departs_and_hands_over_to_train_ticker() {
    let mut harness = Harness::scripted(&[]);

    let events = harness.advance(Duration::from_secs(60));

    assert_eq!(count(&events, is_departure), 1);
    assert_eq!(query::countdown(harness.controller.world()), 0);
    assert!(!harness.controller.countdown_running());
    assert!(harness.controller.train_running());
    assert_eq!(harness.controller.scheduler().pending(), 1);
    assert_eq!(*harness.audio.0.borrow(), vec![AudioCue::Depart]);

    let derailed = harness.advance(TRAIN_STEP);
    assert_eq!(
        derailed,
        vec![
            Event::TrainDerailed {
                at: CellCoord::new(0, 0)
            },
            Event::PhaseChanged {
                phase: Phase::Stalled
            },
        ]
    );
    assert!(!harness.controller.train_running());
    assert_eq!(harness.controller.scheduler().pending(), 0);
    assert!(harness.advance(Duration::from_secs(30)).is_empty());
}

#[test]
fn completed_route_wins_and_records_leaderboard_entry() {
    // Placement draws: turn-bl, vertical, vertical, horizontal; then the conductor number.
    let mut harness = Harness::scripted(&[4, 1, 1, 0, 42]);
    let _ = harness.advance(Duration::from_secs(15));
    harness.build_route_to_goal();

    let departed = harness.input(InputEvent::ForceDepart);
    assert_eq!(count(&departed, is_departure), 1);

    let events = harness.advance(TRAIN_STEP * 5);

    assert_eq!(count(&events, |event| matches!(event, Event::TrainAdvanced { .. })), 5);
    let expected_score = 20 * 4 + 35 * 5 + 200;
    assert_eq!(
        events.last(),
        Some(&Event::StageCompleted {
            stage: StageId::new(1),
            score: expected_score,
            time_bonus: 0,
            conductor: "Conductor 52".to_owned(),
        })
    );
    assert_eq!(query::phase(harness.controller.world()), Phase::Won);
    assert!(!harness.controller.train_running());

    let board = harness.controller.leaderboard();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].name, "Conductor 52");
    assert_eq!(board[0].score, expected_score);
    assert_eq!(board[0].stage, StageId::new(1));
    assert_eq!(harness.board.0.borrow().len(), 1);

    assert_eq!(
        *harness.audio.0.borrow(),
        vec![
            AudioCue::Click,
            AudioCue::Click,
            AudioCue::Click,
            AudioCue::Click,
            AudioCue::Depart,
            AudioCue::Win,
        ]
    );
    assert!(harness.advance(Duration::from_secs(30)).is_empty());
}

#[test]
fn reset_while_departed_silences_pending_train_steps() {
    let mut harness = Harness::scripted(&[4]);
    let _ = harness.place(0, 1);
    let _ = harness.input(InputEvent::ForceDepart);

    let moved = harness.advance(TRAIN_STEP);
    assert_eq!(count(&moved, |event| matches!(event, Event::TrainAdvanced { .. })), 1);

    // The next train step is still pending when the reset lands.
    let _ = harness.advance(Duration::from_millis(1_000));
    let reset = harness.input(InputEvent::ResetStage { index: 0 });
    assert!(matches!(reset.first(), Some(Event::StageStarted { .. })));
    assert!(!harness.controller.train_running());
    assert!(harness.controller.countdown_running());
    assert_eq!(harness.controller.scheduler().pending(), 1);

    let after = harness.advance(TRAIN_STEP * 4);
    assert_eq!(count(&after, is_train_event), 0);
    assert_eq!(
        count(&after, |event| matches!(event, Event::CountdownChanged { .. })),
        5
    );
    assert_eq!(query::phase(harness.controller.world()), Phase::Building);
}

#[test]
fn advancing_stage_restarts_the_countdown_on_a_larger_grid() {
    let mut harness = Harness::scripted(&[]);
    let _ = harness.input(InputEvent::ForceDepart);
    assert!(harness.controller.train_running());

    let events = harness.input(InputEvent::AdvanceStage);

    assert!(matches!(
        events.first(),
        Some(Event::StageStarted { size: 5, .. })
    ));
    assert_eq!(harness.controller.snapshot().stage.size(), 5);
    assert!(harness.controller.countdown_running());
    assert!(!harness.controller.train_running());
}

#[test]
fn invalid_inputs_leave_round_and_timers_untouched() {
    let mut harness = Harness::scripted(&[]);

    let on_start = harness.place(0, 0);
    let unknown_stage = harness.input(InputEvent::ResetStage { index: 9 });

    assert!(matches!(
        on_start.as_slice(),
        [Event::PlacementRejected { .. }]
    ));
    assert!(unknown_stage.is_empty());
    assert!(harness.audio.0.borrow().is_empty());
    assert_eq!(query::score(harness.controller.world()), 0);
    assert!(harness.controller.countdown_running());
}

#[test]
fn leaderboard_failures_are_swallowed() {
    let world = World::new(
        DEFAULT_STAGES.to_vec(),
        Box::new(ScriptedRandom::new(vec![0, 3, 2, 4, 1, 1, 0, 42])),
    )
    .expect("default stages are valid");
    let mut controller = RoundController::new(
        world,
        IntervalScheduler::new(),
        Config::default(),
        Box::new(BrokenBoard),
        Box::new(RecordingAudio::default()),
    );
    let mut events = Vec::new();
    for (row, column) in [(0, 1), (0, 2), (1, 2), (2, 2)] {
        controller.handle_input(InputEvent::PlaceTile { row, column }, &mut events);
    }
    controller.handle_input(InputEvent::ForceDepart, &mut events);

    controller.advance(TRAIN_STEP * 5, &mut events);

    assert!(matches!(events.last(), Some(Event::StageCompleted { .. })));
    assert_eq!(query::phase(controller.world()), Phase::Won);
    assert!(controller.leaderboard().is_empty());
}

#[test]
fn configured_countdown_takes_effect_after_reset() {
    let world = World::new(
        DEFAULT_STAGES.to_vec(),
        Box::new(ScriptedRandom::new(vec![0, 3, 2])),
    )
    .expect("default stages are valid");
    let mut controller = RoundController::new(
        world,
        IntervalScheduler::new(),
        Config::new(5, Duration::from_millis(500), TRAIN_STEP),
        Box::new(SharedBoard::default()),
        Box::new(RecordingAudio::default()),
    );
    let mut events = Vec::new();
    controller.handle_input(InputEvent::ResetStage { index: 0 }, &mut events);
    assert_eq!(query::countdown(controller.world()), 5);

    events.clear();
    controller.advance(Duration::from_millis(2_500), &mut events);

    assert_eq!(count(&events, is_departure), 1);
    assert_eq!(controller.scheduler().now(), Duration::from_millis(2_500));
}

#[test]
fn world_started_with_configured_countdown_times_its_first_round() {
    let config = Config::new(5, Duration::from_millis(500), TRAIN_STEP);
    let world = World::starting_at(
        DEFAULT_STAGES.to_vec(),
        1,
        config.countdown_seconds(),
        Box::new(ScriptedRandom::new(vec![0, 4, 4])),
    )
    .expect("second stage is valid");
    let mut controller = RoundController::new(
        world,
        IntervalScheduler::new(),
        config,
        Box::new(SharedBoard::default()),
        Box::new(RecordingAudio::default()),
    );
    assert_eq!(query::stage_index(controller.world()), 1);
    assert_eq!(query::countdown(controller.world()), 5);

    let mut events = Vec::new();
    controller.advance(Duration::from_millis(2_500), &mut events);

    assert_eq!(count(&events, is_departure), 1);
    assert!(controller.train_running());
}

#[derive(Clone, Debug)]
enum Step {
    Place(u32, u32),
    Depart,
    Reset,
    Advance(u64),
}

fn replay(seed: u64, steps: &[Step]) -> Vec<Event> {
    let world = World::new(DEFAULT_STAGES.to_vec(), Box::new(SeededRandom::new(seed)))
        .expect("default stages are valid");
    let mut controller = RoundController::new(
        world,
        IntervalScheduler::new(),
        Config::default(),
        Box::new(SharedBoard::default()),
        Box::new(RecordingAudio::default()),
    );
    let mut events = Vec::new();
    for step in steps {
        match step {
            Step::Place(row, column) => controller.handle_input(
                InputEvent::PlaceTile {
                    row: *row,
                    column: *column,
                },
                &mut events,
            ),
            Step::Depart => controller.handle_input(InputEvent::ForceDepart, &mut events),
            Step::Reset => controller.handle_input(InputEvent::ResetStage { index: 0 }, &mut events),
            Step::Advance(millis) => {
                controller.advance(Duration::from_millis(*millis), &mut events)
            }
        }
        assert!(
            !(controller.countdown_running() && controller.train_running()),
            "countdown and train tickers overlapped"
        );
    }
    events
}

#[test]
fn seeded_rounds_replay_identically() {
    let script = vec![
        Step::Place(0, 1),
        Step::Advance(2_000),
        Step::Place(1, 0),
        Step::Place(0, 1),
        Step::Place(1, 1),
        Step::Depart,
        Step::Advance(10_000),
        Step::Reset,
        Step::Place(2, 2),
        Step::Advance(61_000),
        Step::Advance(5_000),
    ];

    let first = replay(0x5eed, &script);
    let second = replay(0x5eed, &script);

    assert_eq!(first, second, "seeded replay diverged");
    assert_eq!(count(&first, is_departure), 2);
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0u32..5, 0u32..5).prop_map(|(row, column)| Step::Place(row, column)),
        1 => Just(Step::Depart),
        1 => Just(Step::Reset),
        3 => (0u64..20_000).prop_map(Step::Advance),
    ]
}

proptest! {
    #[test]
    fn train_never_moves_after_reset_or_while_building(
        seed in any::<u64>(),
        steps in proptest::collection::vec(step_strategy(), 1..40),
    ) {
        let events = replay(seed, &steps);

        let mut phase = Phase::Building;
        for event in &events {
            match event {
                Event::PhaseChanged { phase: next } => phase = *next,
                Event::TrainAdvanced { .. } | Event::TrainDerailed { .. } => {
                    prop_assert_eq!(phase, Phase::Departed);
                }
                _ => {}
            }
        }
    }
}
