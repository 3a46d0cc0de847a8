use std::{sync::Arc, time::Duration};

use chrono::Utc;
use playful_pause::{
    audio::RecordingOutput,
    canvas::{CanvasEngine, Color, Jitter, PointerEvent, RasterSurface, StrokeStyle, CANVAS_HEIGHT},
    config::AppConfig,
    garden::{GrowthStage, MoodGarden},
    sequencer::{step_interval, SequencerController, Voice},
    storage::MemoryStore,
    AppState,
};

#[test]
fn five_point_red_stroke_undoes_to_blank() {
    let mut engine = CanvasEngine::new(RasterSurface::new(320, CANVAS_HEIGHT, 2.0), Jitter::disabled());
    let style = StrokeStyle::new(Color::from_hex("#FF0000").unwrap(), 5.0);

    engine.begin_stroke(PointerEvent::new(30.0, 30.0, 0.0), style);
    for (i, (x, y)) in [(60.0, 50.0), (90.0, 80.0), (120.0, 90.0), (150.0, 120.0)]
        .into_iter()
        .enumerate()
    {
        engine.extend_stroke(PointerEvent::new(x, y, (i + 1) as f64 * 16.0));
    }
    engine.end_stroke(80.0);

    assert_eq!(engine.history().len(), 1);
    assert_eq!(engine.history()[0].points().len(), 5);

    engine.undo();
    assert_eq!(engine.history().len(), 0);
    assert!(engine.surface().is_blank());
}

#[tokio::test(start_paused = true)]
async fn circle_pattern_at_eighty_bpm() {
    let output = Arc::new(RecordingOutput::new());
    let seq = SequencerController::new(output.clone(), 8);
    seq.toggle_cell(Voice::Circle, 0).await.unwrap();
    seq.toggle_cell(Voice::Circle, 4).await.unwrap();
    seq.set_tempo(80).await;
    assert_eq!(step_interval(80), Duration::from_millis(375));

    seq.start().await.unwrap();
    assert_eq!(output.ready_calls(), 1);

    // One full loop: ticks at 0, 375, ..., 2625 ms.
    tokio::time::sleep(Duration::from_millis(375 * 7 + 10)).await;
    assert_eq!(output.frequencies(), vec![220.0, 220.0]);

    seq.stop().await;
    assert_eq!(seq.snapshot().await.cursor, 0);
}

#[test]
fn third_mood_on_one_day_is_refused() {
    let mut garden = MoodGarden::load(Arc::new(MemoryStore::new()));
    let now = Utc::now();
    garden.plant("joyful", now).unwrap();
    garden.plant("tender", now).unwrap();

    assert!(garden.plant("curious", now).is_err());
    assert_eq!(garden.entries().len(), 2);
    assert!(garden.entries().iter().all(|e| e.growth == GrowthStage::Seed));
}

#[tokio::test]
async fn silent_app_session_round_trip() {
    let data_dir = std::env::temp_dir().join(format!("playful-pause-app-{}", uuid::Uuid::new_v4()));
    let config = AppConfig {
        data_dir: data_dir.clone(),
        debug: false,
        silent: true,
        growth_refresh_every: Duration::from_secs(60),
    };

    let app = AppState::launch(config).unwrap();
    app.garden.lock().await.plant("sunny", Utc::now()).unwrap();

    app.interaction_reporter().report("sunny");
    // Let the listener task drain the report.
    for _ in 0..50 {
        if app.garden.lock().await.entries()[0].interactions == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(app.garden.lock().await.entries()[0].interactions, 1);

    app.sequencer.toggle_cell(Voice::Hexagon, 0).await.unwrap();
    app.sequencer.start().await.unwrap();
    assert!(app.sequencer.is_running().await);
    assert!(app.sequencer.output().take_notice().is_none());

    app.shutdown().await;
    assert!(data_dir.join("local_storage.json").exists());
    let _ = std::fs::remove_dir_all(data_dir);
}
