use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use playful_pause::{
    canvas::{Color, PointerEvent, StrokeStyle},
    config::AppConfig,
    init_logging,
    sequencer::Voice,
    AppState,
};

/// Headless session: doodle and export, a short sequencer loop, plant a mood.
#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_logging(config.debug);

    let mut app = AppState::launch(config)?;

    let personal = app.personalization();
    let brush = StrokeStyle::new(personal.suggested_breathing_color(), 6.0);
    app.canvas.begin_stroke(PointerEvent::new(40.0, 200.0, 0.0), brush);
    for i in 1..=24 {
        let t = i as f32 / 24.0;
        let x = 40.0 + t * 520.0;
        let y = 200.0 + (t * std::f32::consts::TAU).sin() * 120.0;
        app.canvas.extend_stroke(PointerEvent::new(x, y, i as f64 * 16.0));
    }
    app.canvas.end_stroke(400.0);
    app.canvas.begin_stroke(
        PointerEvent::new(60.0, 360.0, 500.0),
        StrokeStyle::new(Color::from_hex("#FF6F91")?, 3.0),
    );
    app.canvas.extend_stroke(PointerEvent::new(540.0, 360.0, 516.0));
    app.canvas.end_stroke(520.0);
    let exported = app.canvas.export_to(&app.config.data_dir)?;
    println!("Doodle saved to {}", exported.display());

    app.sequencer.set_cell(Voice::Circle, 0, true).await?;
    app.sequencer.set_cell(Voice::Circle, 4, true).await?;
    app.sequencer.set_cell(Voice::Star, 2, true).await?;
    app.sequencer.set_cell(Voice::Heart, 6, true).await?;
    app.sequencer.start().await?;
    if let Some(notice) = app.sequencer.output().take_notice() {
        println!("{notice}");
    }
    tokio::time::sleep(Duration::from_secs(3)).await;
    app.sequencer.stop().await;

    {
        let mut garden = app.garden.lock().await;
        match garden.plant("calm", Utc::now()) {
            Ok(entry) => println!("Planted '{}'", entry.mood),
            Err(err) => println!("Garden says: {err}"),
        }
    }
    app.interaction_reporter().report("calm");
    tokio::time::sleep(Duration::from_millis(50)).await;

    app.shutdown().await;
    Ok(())
}
