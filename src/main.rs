mod app;
use word_review::*;

use app::ReviewApp;
use chrono::Utc;
use word_review::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> eframe::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "word_review=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring config: {}", e);
        AppConfig::default()
    });

    let store = match SqliteStore::open(&config.database.path) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Cannot open {}: {}", config.database.path.display(), e);
            std::process::exit(1);
        }
    };

    if store.word_count().unwrap_or_default() == 0 {
        let now = Utc::now();
        for (text, translation) in [("window", "窗户"), ("kettle", "水壶"), ("bicycle", "自行车")] {
            let _ = store.upsert_word(&NewWord::new(text).with_translation(translation), now);
        }
        tracing::info!("Sample words created");
    }

    tracing::info!(
        "Loaded {} words, {} due now",
        store.word_count().unwrap_or_default(),
        store.due_count(Utc::now()).unwrap_or_default()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([520.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Word Review",
        options,
        Box::new(move |_cc| Ok(Box::new(ReviewApp::new(store, &config)))),
    )
}
