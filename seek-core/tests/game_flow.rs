mod common;

use common::{ScriptedAudio, quick_config, silence, tone};
use seek_core::pitch::PitchEstimator;
use seek_core::round::RoundSession;
use seek_core::tuning::find_note;
use seek_core::{
    Attempt, EventLog, GameEvent, GameSession, GameStats, Note, RoundOutcome, SeekError,
};

fn a4() -> Note {
    find_note("A4").unwrap()
}

fn run_round(audio: &mut ScriptedAudio) -> (seek_core::RoundResult, EventLog<GameEvent>) {
    let config = seek_core::GameConfig {
        tolerance_cents: 50.0,
        ..quick_config()
    };
    let estimator = PitchEstimator::new(config.estimator.clone());
    let note = a4();
    let mut log = EventLog::default();
    let result = RoundSession::new(&note, &config, &estimator)
        .run(audio, &mut log)
        .unwrap();
    (result, log)
}

#[test]
fn round_matched_on_first_attempt() {
    let mut audio = ScriptedAudio::singing(&[440.0, 440.0]);
    let (result, log) = run_round(&mut audio);

    assert_eq!(result.attempts, Attempt::First);
    assert_eq!(result.outcome, RoundOutcome::Matched);
    assert_eq!(audio.records, 1);
    assert_eq!(audio.plays, vec![(440.0, 2.0)]);
    assert!(matches!(
        log.events.last(),
        Some(GameEvent::RoundFinal { result: r }) if r.outcome == RoundOutcome::Matched
    ));
}

#[test]
fn round_matched_on_retry_replays_the_target() {
    let mut audio = ScriptedAudio::singing(&[460.0, 440.0]);
    let (result, log) = run_round(&mut audio);

    assert_eq!(result.attempts, Attempt::Second);
    assert_eq!(result.outcome, RoundOutcome::Matched);
    assert_eq!(audio.records, 2);
    assert_eq!(audio.plays.len(), 2);

    let feedback: Vec<_> = log
        .events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Feedback { matched, cents_offset, .. } => Some((*matched, *cents_offset)),
            _ => None,
        })
        .collect();
    assert_eq!(feedback.len(), 2);
    assert!(!feedback[0].0);
    // 460 Hz is about 77 cents sharp of A4.
    assert!(feedback[0].1.unwrap() > 60.0);
    assert!(feedback[1].0);
}

#[test]
fn round_missed_twice_when_silent() {
    let mut audio = ScriptedAudio::new(vec![Ok(silence()), Ok(silence())]);
    let (result, log) = run_round(&mut audio);

    assert_eq!(result.attempts, Attempt::Second);
    assert_eq!(result.outcome, RoundOutcome::MissedTwice);
    let misses = log
        .events
        .iter()
        .filter(|e| {
            matches!(
                e,
                GameEvent::Feedback { matched: false, cents_offset: None, .. }
            )
        })
        .count();
    assert_eq!(misses, 2);
}

#[test]
fn round_without_replay_plays_the_target_once() {
    let config = seek_core::GameConfig {
        replay_on_retry: false,
        ..quick_config()
    };
    let estimator = PitchEstimator::new(config.estimator.clone());
    let note = a4();
    let mut audio = ScriptedAudio::singing(&[300.0, 300.0]);
    let mut log = EventLog::default();
    let result = RoundSession::new(&note, &config, &estimator)
        .run(&mut audio, &mut log)
        .unwrap();

    assert_eq!(result.outcome, RoundOutcome::MissedTwice);
    assert_eq!(audio.plays.len(), 1);
}

#[test]
fn perfect_run_celebrates() {
    let notes = vec![a4(), find_note("D4").unwrap()];
    let mut audio = ScriptedAudio::singing(&[440.0, 293.66]);
    let mut log = EventLog::default();
    let mut session = GameSession::new(quick_config()).unwrap();

    let stats = session.run(&mut audio, &mut log, &notes).unwrap();

    assert_eq!(
        stats,
        GameStats {
            total_attempts: 2,
            successful_notes: 2,
            total_notes: 2,
        }
    );
    assert_eq!(session.results().len(), 2);
    assert!(matches!(log.events.last(), Some(GameEvent::Celebration { .. })));
    assert!(!log.events.iter().any(|e| matches!(e, GameEvent::SessionSummary { .. })));

    // Introduction first, in order, then the rounds.
    assert!(matches!(&log.events[0], GameEvent::Introduction { index: 1, note } if note.name() == "A4"));
    assert!(matches!(&log.events[1], GameEvent::Introduction { index: 2, note } if note.name() == "D4"));
    assert_eq!(log.events[2], GameEvent::IntroductionDone);
    assert_eq!(audio.plays.len(), 4);
}

#[test]
fn celebration_melody_plays_up_and_down() {
    let config = seek_core::GameConfig {
        celebration_melody: true,
        ..quick_config()
    };
    let mut audio = ScriptedAudio::singing(&[440.0]);
    let mut log = EventLog::default();
    let mut session = GameSession::new(config).unwrap();
    session.run(&mut audio, &mut log, &[a4()]).unwrap();

    // One intro, one target, ten melody notes.
    assert_eq!(audio.plays.len(), 12);
    assert_eq!(audio.plays[2].0, audio.plays[11].0);
}

#[test]
fn a_missed_note_gets_a_summary_instead() {
    let notes = vec![a4(), find_note("E5").unwrap()];
    let mut audio = ScriptedAudio::new(vec![Ok(tone(440.0)), Ok(silence()), Ok(silence())]);
    let mut log = EventLog::default();
    let mut session = GameSession::new(quick_config()).unwrap();

    let stats = session.run(&mut audio, &mut log, &notes).unwrap();

    assert_eq!(
        stats,
        GameStats {
            total_attempts: 3,
            successful_notes: 1,
            total_notes: 2,
        }
    );
    assert!(matches!(log.events.last(), Some(GameEvent::SessionSummary { .. })));
    assert!(!log.events.iter().any(|e| matches!(e, GameEvent::Celebration { .. })));
}

#[test]
fn device_failure_aborts_the_run() {
    let notes = vec![a4(), find_note("D4").unwrap(), find_note("E5").unwrap()];
    let mut audio = ScriptedAudio::new(vec![
        Ok(tone(440.0)),
        Err(SeekError::Device("microphone unplugged".to_string())),
    ]);
    let mut log = EventLog::default();
    let mut session = GameSession::new(quick_config()).unwrap();

    let err = session.run(&mut audio, &mut log, &notes).unwrap_err();

    assert!(err.is_device());
    assert_eq!(session.results().len(), 1);
    assert_eq!(session.results()[0].outcome, RoundOutcome::Matched);
    assert_eq!(
        log.events.last(),
        Some(&GameEvent::DeviceFailure {
            message: "microphone unplugged".to_string()
        })
    );
    assert_eq!(audio.records, 2);
}

#[test]
fn empty_run_is_rejected_before_any_audio() {
    let mut audio = ScriptedAudio::default();
    let mut log = EventLog::default();
    let mut session = GameSession::new(quick_config()).unwrap();

    let err = session.run(&mut audio, &mut log, &[]).unwrap_err();

    assert!(matches!(err, SeekError::InvalidConfiguration(_)));
    assert!(audio.plays.is_empty());
    assert_eq!(audio.records, 0);
    assert!(log.events.is_empty());
}

#[test]
fn repeated_runs_start_from_scratch() {
    let mut session = GameSession::new(quick_config()).unwrap();
    let mut log = EventLog::default();

    session
        .run(&mut ScriptedAudio::singing(&[440.0]), &mut log, &[a4()])
        .unwrap();
    let stats = session
        .run(&mut ScriptedAudio::singing(&[440.0]), &mut log, &[a4()])
        .unwrap();

    assert_eq!(stats.total_notes, 1);
    assert_eq!(session.results().len(), 1);
}

#[test]
fn events_serialize_with_a_tag() {
    let event = GameEvent::Feedback {
        attempt: Attempt::Second,
        matched: false,
        cents_offset: None,
        detected_hz: None,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "feedback");
    assert_eq!(json["attempt"], 2);
    assert!(json["cents_offset"].is_null());
}
