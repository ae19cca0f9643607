mod common;

use common::{FakeRenderer, FixedSource, MockSpeech, MockStock, MockText, MockUploader, Outcome};
use fashion_shorts::content::ContentGenerator;
use fashion_shorts::content::template::fallback_script;
use fashion_shorts::media::MediaAssembler;
use fashion_shorts::models::TrendItem;
use fashion_shorts::pipeline::{Agent, AgentSettings};
use fashion_shorts::platform::Platform;
use fashion_shorts::storage::Database;
use fashion_shorts::trends::TrendAggregator;
use fashion_shorts::upload::UploadDispatcher;
use std::time::Duration;

const PLATFORMS: [Platform; 3] = [Platform::YouTube, Platform::TikTok, Platform::Facebook];

async fn agent(output: &std::path::Path, renderer: FakeRenderer) -> Agent {
    let trend = TrendItem::new("reddit", "Oversized Blazers", 120);
    let db = Database::connect_in_memory().await.unwrap();
    agent_with(output, renderer, vec![trend], db)
}

fn agent_with(
    output: &std::path::Path,
    renderer: FakeRenderer,
    trends: Vec<TrendItem>,
    db: Database,
) -> Agent {
    Agent::new(
        TrendAggregator::new(vec![Box::new(FixedSource(trends))], 0.7).without_fallback(),
        ContentGenerator::new(vec![
            Box::new(MockText::Fails("groq")),
            Box::new(MockText::Fails("openai")),
            Box::new(MockText::Fails("huggingface")),
        ]),
        MediaAssembler::new(
            vec![
                Box::new(MockSpeech::Fails("elevenlabs")),
                Box::new(MockSpeech::Writes("google_tts")),
            ],
            vec![
                Box::new(MockStock::Empty("pexels")),
                Box::new(MockStock::Images("unsplash", 3)),
            ],
            Box::new(renderer),
        ),
        UploadDispatcher::new(
            vec![
                MockUploader::arc(Platform::YouTube, Outcome::Publishes),
                MockUploader::arc(Platform::TikTok, Outcome::RejectsAuth),
                MockUploader::arc(Platform::Facebook, Outcome::Publishes),
            ],
            4,
        ),
        db,
        AgentSettings {
            platforms: PLATFORMS.to_vec(),
            output_dir: output.to_path_buf(),
            daily_videos_count: 10,
            stagger: Duration::ZERO,
        },
    )
}

#[tokio::test]
async fn oversized_blazers_with_every_provider_down() {
    let out = tempfile::tempdir().unwrap();
    let renderer = FakeRenderer::default();
    let agent = agent(out.path(), renderer.clone()).await;

    let summary = agent.run_cycle().await.unwrap();

    assert_eq!(summary.trends_found, 1);
    assert_eq!(summary.videos_created, 1);
    assert!(summary.failures.is_empty());

    let produced = &summary.produced[0];
    assert_eq!(produced.trend_title, "Oversized Blazers");
    assert_eq!(produced.script.provider, "template");
    assert!(produced.hook.contains("Oversized Blazers"));
    assert_eq!(
        produced.script.text,
        fallback_script(&TrendItem::new("reddit", "Oversized Blazers", 120))
    );
    assert!(produced.video.path.exists());
    assert!(produced.video.path.starts_with(out.path()));
    assert!(renderer.seen.lock().unwrap().iter().all(|p| *p == "unsplash"));

    assert_eq!(summary.results.len(), PLATFORMS.len());
    for (result, platform) in summary.results.iter().zip(PLATFORMS) {
        assert_eq!(result.platform, platform);
        assert_eq!(result.success, platform != Platform::TikTok);
    }
    assert_eq!(summary.uploads_succeeded, 2);
    assert_eq!(summary.uploads_failed, 1);

    // The trend was consumed and the uploads recorded.
    let db = agent.database();
    assert!(db.unused_trends(10).await.unwrap().is_empty());
    let totals = db.total_analytics().await.unwrap();
    assert_eq!(totals.videos, 1);
    assert_eq!(totals.uploads, 2);
}

#[tokio::test]
async fn analytics_refresh_and_report() {
    let out = tempfile::tempdir().unwrap();
    let agent = agent(out.path(), FakeRenderer::default()).await;
    agent.run_cycle().await.unwrap();

    let updated = agent.update_analytics().await.unwrap();
    assert_eq!(updated, 2);

    let report = agent.report().await.unwrap();
    assert_eq!(report.totals.views, 2000);
    assert_eq!(report.platforms.len(), 2);
    assert!(report.platforms.iter().all(|p| p.uploads == 1 && p.views == 1000));
}

#[tokio::test]
async fn second_cycle_without_new_trends_produces_nothing() {
    let out = tempfile::tempdir().unwrap();
    let agent = Agent::new(
        TrendAggregator::new(Vec::new(), 0.7).without_fallback(),
        ContentGenerator::new(Vec::new()),
        MediaAssembler::new(Vec::new(), Vec::new(), Box::new(FakeRenderer::default())),
        UploadDispatcher::new(Vec::new(), 1),
        Database::connect_in_memory().await.unwrap(),
        AgentSettings {
            platforms: Vec::new(),
            output_dir: out.path().to_path_buf(),
            daily_videos_count: 3,
            stagger: Duration::ZERO,
        },
    );

    let summary = agent.run_cycle().await.unwrap();
    assert_eq!(summary.trends_found, 0);
    assert_eq!(summary.videos_created, 0);
    assert!(summary.results.is_empty());
}

#[tokio::test]
async fn leftover_trends_do_not_join_the_cycle() {
    let out = tempfile::tempdir().unwrap();
    let db = Database::connect_in_memory().await.unwrap();
    // Saved by an earlier cycle that stopped before producing it.
    let leftover = db
        .save_trend(&TrendItem::new("reddit", "Cargo pants comeback", 900))
        .await
        .unwrap();

    let fresh = TrendItem::new("twitter", "Cargo pants comeback!", 300);
    let agent = agent_with(out.path(), FakeRenderer::default(), vec![fresh], db);
    let summary = agent.run_cycle().await.unwrap();

    assert_eq!(summary.trends_found, 1);
    assert_eq!(summary.videos_created, 1);
    let titles: Vec<&str> = summary.produced.iter().map(|p| p.trend_title.as_str()).collect();
    assert_eq!(titles, vec!["Cargo pants comeback!"]);

    let unused = agent.database().unused_trends(10).await.unwrap();
    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0].id, leftover);
}
