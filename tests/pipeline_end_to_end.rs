//! Full pipeline runs with scripted generation and the silent speech backend.

use async_trait::async_trait;
use podcastgen::audio::{MonoAudio, wav};
use podcastgen::config::{Config, SynthesisFailurePolicy};
use podcastgen::content::PodcastScript;
use podcastgen::llm::{GenerationClients, GenerationRole, MockGenerationClient};
use podcastgen::pipeline::script_file;
use podcastgen::pipeline::{PodcastPipeline, StageFlags};
use podcastgen::timeline::export::ConversationRecord;
use podcastgen::timeline::subtitles::{self, SubtitleFormat};
use podcastgen::timeline::SegmentKind;
use podcastgen::tts::{SilentBackend, SpeechBackend};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const RATE: u32 = 1000;

fn scripted_client() -> MockGenerationClient {
    MockGenerationClient::new("scripted").with_responder(|prompt, role, n| match role {
        GenerationRole::TopicGenerator => "1. Solar prices\n2. Grid storage".to_string(),
        GenerationRole::IntroWriter => "Welcome to the show.".to_string(),
        GenerationRole::OutroWriter => "Thanks for listening.".to_string(),
        GenerationRole::MetadataWriter => {
            "TITLE: Cheap Sun\nDESCRIPTION: Solar and storage.".to_string()
        }
        GenerationRole::Translator => format!("Traduction {n}."),
        GenerationRole::Guest if prompt.contains("Topic: Grid storage") => {
            "This line explodes.".to_string()
        }
        other => format!("The {} speaks, call {n}.", other.as_str()),
    })
}

/// Config with one-second speech per segment, no pauses or fades.
fn config(dir: &Path) -> Config {
    let document = dir.join("article.md");
    std::fs::write(
        &document,
        "# Energy\n\nPanel prices fell ninety percent in a decade.\n\nBatteries follow the same curve.",
    )
    .unwrap();

    let mut config = Config::default();
    config.document_path = Some(document);
    config.output_dir = dir.join("out");
    config.content.num_topics = 2;
    config.content.num_turns = 2;
    config.audio.sample_rate = RATE;
    config.audio.pause_after_intro_ms = 0;
    config.audio.pause_after_topic_label_ms = 0;
    config.audio.pause_after_turn_ms = 0;
    config.audio.fade_ms = 0;
    config
}

fn backend() -> SilentBackend {
    SilentBackend::new(RATE).with_fixed_duration(1.0)
}

fn pipeline(config: Config, client: Arc<MockGenerationClient>, backend: SilentBackend) -> PodcastPipeline {
    PodcastPipeline::new(config, GenerationClients::uniform(client), Arc::new(backend))
}

fn read_export(path: &Path) -> ConversationRecord {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn exports_in(output_dir: &Path) -> Vec<PathBuf> {
    let dir = output_dir.join("exports");
    if !dir.exists() {
        return Vec::new();
    }
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect()
}

#[tokio::test]
async fn english_run_writes_every_output() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(dir.path());
    cfg.audio.generate_subtitles = true;
    cfg.audio.subtitle_format = SubtitleFormat::Vtt;
    let client = Arc::new(scripted_client());

    let report = pipeline(cfg, client.clone(), backend()).run().await.unwrap();

    assert_eq!(client.call_count(GenerationRole::Translator), 0);
    assert!(!report.translated);
    assert_eq!(report.script.title, "Cheap Sun");
    assert_eq!(report.script.total_turns(), 4);

    // intro + 2 × (label + 2 turns) + outro
    assert_eq!(report.total_duration_seconds, Some(8.0));
    let audio = wav::read_file(report.audio_path.as_ref().unwrap()).unwrap();
    assert_eq!(audio.samples.len(), 8 * RATE as usize);
    assert_eq!(audio.sample_rate, RATE);

    let subtitle_path = report.subtitle_path.unwrap();
    assert_eq!(subtitle_path.extension().unwrap(), "vtt");
    let cues = subtitles::parse_cues(&std::fs::read_to_string(&subtitle_path).unwrap()).unwrap();
    assert_eq!(cues.len(), 8);
    assert_eq!(cues[0].text, "Host: Welcome to the show.");
    assert_eq!(cues[1].text, "Topic: Solar prices");
    assert_eq!((cues[7].start_ms, cues[7].end_ms), (7000, 8000));

    let record = read_export(report.export_path.as_ref().unwrap());
    let titles: Vec<&String> = record.conversations.keys().collect();
    assert_eq!(titles, ["Solar prices", "Grid storage"]);
    assert_eq!(record.metadata.total_topics, 2);
    assert_eq!(record.metadata.total_duration_seconds, Some(8.0));
    let first = &record.conversations["Solar prices"][0];
    assert_eq!(first.offset_start, Some(2.0));
    assert_eq!(first.offset_end, Some(3.0));
    assert_eq!(first.duration_seconds, Some(1.0));
    assert!(first.start_time.is_some());

    let saved = script_file::load(report.script_path.as_ref().unwrap()).unwrap();
    assert_eq!(saved.topics, report.script.topics);
}

#[tokio::test]
async fn translation_rewrites_content_only() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(dir.path());
    cfg.audio.lang = "f".to_string();
    let client = Arc::new(scripted_client());

    let report = pipeline(cfg, client.clone(), backend()).run().await.unwrap();

    // intro, outro, and per topic: title + 2 turns
    assert_eq!(client.call_count(GenerationRole::Translator), 8);
    assert!(report.translated);

    let original = script_file::load(report.script_path.as_ref().unwrap()).unwrap();
    let translated = script_file::load(report.translated_script_path.as_ref().unwrap()).unwrap();
    for (before, after) in original.topics.iter().zip(&translated.topics) {
        assert_eq!(before.topic, after.topic);
        assert!(after.title.starts_with("Traduction"));
        for (b, a) in before.turns.iter().zip(&after.turns) {
            assert_eq!(b.speaker, a.speaker);
            assert_eq!(b.turn_index, a.turn_index);
            assert!(a.content.starts_with("Traduction"));
        }
    }
    assert!(translated.intro.starts_with("Traduction"));
    assert_eq!(translated.language.as_deref(), Some("f"));
    assert_eq!(original.language, None);
    assert_eq!(report.script, translated);
}

#[tokio::test]
async fn skipped_translation_makes_no_call_and_keeps_text() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(dir.path());
    cfg.audio.lang = "f".to_string();
    let client = Arc::new(scripted_client());

    let report = pipeline(cfg, client.clone(), backend())
        .with_flags(StageFlags {
            skip_translation: true,
            ..StageFlags::default()
        })
        .run()
        .await
        .unwrap();

    assert_eq!(client.call_count(GenerationRole::Translator), 0);
    assert!(report.translated_script_path.is_none());
    let saved = script_file::load(report.script_path.as_ref().unwrap()).unwrap();
    for (saved_topic, spoken_topic) in saved.topics.iter().zip(&report.script.topics) {
        for (a, b) in saved_topic.turns.iter().zip(&spoken_topic.turns) {
            assert_eq!(a.content.as_bytes(), b.content.as_bytes());
        }
    }
}

#[tokio::test]
async fn skip_policy_records_gap_without_shifting_timestamps() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(dir.path());
    cfg.pipeline.synthesis_failure = SynthesisFailurePolicy::Skip;
    cfg.audio.generate_subtitles = true;
    let client = Arc::new(scripted_client());

    let report = pipeline(cfg, client, backend().with_failure_on("explodes"))
        .run()
        .await
        .unwrap();

    assert_eq!(report.gaps.len(), 1);
    let gap = &report.gaps[0];
    assert_eq!(gap.kind, SegmentKind::Turn);
    assert_eq!((gap.topic_id, gap.turn_index), (Some(1), Some(1)));
    // intro 1 s + topic 1 (3 s) + label 1 s + first turn 1 s
    assert_eq!(gap.at_seconds, 6.0);
    assert_eq!(report.total_duration_seconds, Some(7.0));

    let cues = subtitles::parse_cues(
        &std::fs::read_to_string(report.subtitle_path.as_ref().unwrap()).unwrap(),
    )
    .unwrap();
    assert_eq!(cues.len(), 7);
    for pair in cues.windows(2) {
        assert_eq!(pair[0].end_ms, pair[1].start_ms);
    }

    let record = read_export(report.export_path.as_ref().unwrap());
    assert_eq!(record.gaps.len(), 1);
    let skipped = &record.conversations["Grid storage"][1];
    assert_eq!(skipped.content, "This line explodes.");
    assert!(skipped.start_time.is_none());
    assert!(skipped.duration_seconds.is_none());
}

#[tokio::test]
async fn abort_policy_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let output_dir = cfg.output_dir.clone();

    let err = pipeline(cfg, Arc::new(scripted_client()), backend().with_failure_on("explodes"))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, podcastgen::PodcastError::SynthesisFailure { .. }));
    assert!(!output_dir.join("podcast.wav").exists());
    assert!(exports_in(&output_dir).is_empty());
}

#[tokio::test]
async fn skip_content_reuses_saved_script_without_generation() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let first = pipeline(cfg.clone(), Arc::new(scripted_client()), backend())
        .run()
        .await
        .unwrap();

    let offline = Arc::new(
        MockGenerationClient::new("offline")
            .with_failure(GenerationRole::TopicGenerator)
            .with_failure(GenerationRole::Moderator)
            .with_failure(GenerationRole::Guest)
            .with_failure(GenerationRole::IntroWriter),
    );
    let second = pipeline(cfg, offline.clone(), backend())
        .with_flags(StageFlags {
            skip_content: true,
            ..StageFlags::default()
        })
        .run()
        .await
        .unwrap();

    assert!(offline.calls().is_empty());
    assert_eq!(second.script.topics, first.script.topics);
    assert_eq!(second.total_duration_seconds, first.total_duration_seconds);
}

#[tokio::test]
async fn skip_content_without_saved_script_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    let err = pipeline(config(dir.path()), Arc::new(scripted_client()), backend())
        .with_flags(StageFlags {
            skip_content: true,
            ..StageFlags::default()
        })
        .run()
        .await
        .unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn skip_audio_exports_text_only() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let output_dir = cfg.output_dir.clone();
    let speech = Arc::new(backend());

    let report = PodcastPipeline::new(
        cfg,
        GenerationClients::uniform(Arc::new(scripted_client())),
        speech.clone(),
    )
    .with_flags(StageFlags {
        skip_audio: true,
        ..StageFlags::default()
    })
    .run()
    .await
    .unwrap();

    assert!(speech.calls().is_empty());
    assert!(report.audio_path.is_none());
    assert!(report.total_duration_seconds.is_none());
    assert!(!output_dir.join("podcast.wav").exists());

    let record = read_export(report.export_path.as_ref().unwrap());
    assert!(record.metadata.total_duration_seconds.is_none());
    assert!(record.conversations.values().flatten().all(|e| e.start_time.is_none()));
}

#[tokio::test]
async fn background_music_is_mixed_under_silent_speech() {
    let dir = TempDir::new().unwrap();
    let music = dir.path().join("music.wav");
    wav::write_file(&music, &vec![0.5; 2500], RATE).unwrap();
    let mut cfg = config(dir.path());
    cfg.audio.music_path = Some(music);

    let report = pipeline(cfg, Arc::new(scripted_client()), backend())
        .run()
        .await
        .unwrap();

    let audio = wav::read_file(report.audio_path.as_ref().unwrap()).unwrap();
    assert_eq!(audio.samples.len(), 8 * RATE as usize);
    // Content phase sits at -20 dB: 0.5 × 0.1
    let mid = audio.samples[4 * RATE as usize];
    assert!((mid - 0.05).abs() < 0.002, "content-phase sample was {mid}");
}

#[tokio::test]
async fn unusable_background_falls_back_to_vocals() {
    let dir = TempDir::new().unwrap();
    let music = dir.path().join("music.mp3");
    std::fs::write(&music, b"ID3").unwrap();
    let mut cfg = config(dir.path());
    cfg.audio.music_path = Some(music);

    let report = pipeline(cfg, Arc::new(scripted_client()), backend())
        .run()
        .await
        .unwrap();

    let audio = wav::read_file(report.audio_path.as_ref().unwrap()).unwrap();
    assert_eq!(audio.samples.len(), 8 * RATE as usize);
    assert!(audio.samples.iter().all(|s| *s == 0.0));
}

#[tokio::test]
async fn saved_scripts_are_plain_json() {
    let dir = TempDir::new().unwrap();
    let cfg = config(dir.path());
    let report = pipeline(cfg, Arc::new(scripted_client()), backend())
        .with_flags(StageFlags {
            skip_audio: true,
            ..StageFlags::default()
        })
        .run()
        .await
        .unwrap();

    let raw = std::fs::read_to_string(report.script_path.unwrap()).unwrap();
    let script: PodcastScript = serde_json::from_str(&raw).unwrap();
    assert_eq!(script.topics[0].title, "Solar prices");
    assert_eq!(script.topics[1].turns[0].turn_index, 0);
}

fn skip_content() -> StageFlags {
    StageFlags {
        skip_content: true,
        ..StageFlags::default()
    }
}

fn text_only() -> StageFlags {
    StageFlags {
        skip_audio: true,
        ..StageFlags::default()
    }
}

#[tokio::test]
async fn skip_content_translates_again_for_another_language() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(dir.path());
    cfg.audio.lang = "f".to_string();
    pipeline(cfg.clone(), Arc::new(scripted_client()), backend())
        .with_flags(text_only())
        .run()
        .await
        .unwrap();

    cfg.audio.lang = "i".to_string();
    let italian = Arc::new(
        MockGenerationClient::new("italian").with_responder(|_, role, n| match role {
            GenerationRole::Translator => format!("Traduzione {n}."),
            other => format!("unexpected {} call", other.as_str()),
        }),
    );
    let report = pipeline(cfg, italian.clone(), backend())
        .with_flags(skip_content())
        .run()
        .await
        .unwrap();

    assert_eq!(italian.call_count(GenerationRole::Translator), 8);
    assert!(italian.calls().iter().all(|(role, _)| *role == GenerationRole::Translator));
    // Translated from the English script, not the French one
    assert!(
        italian
            .calls()
            .iter()
            .all(|(_, prompt)| !prompt.contains("Traduction"))
    );
    assert!(report.script.intro.starts_with("Traduzione"));
    assert_eq!(report.script.language.as_deref(), Some("i"));

    let saved = script_file::load(report.translated_script_path.as_ref().unwrap()).unwrap();
    assert_eq!(saved.language.as_deref(), Some("i"));
}

#[tokio::test]
async fn skip_content_reuses_translation_in_same_language() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(dir.path());
    cfg.audio.lang = "f".to_string();
    pipeline(cfg.clone(), Arc::new(scripted_client()), backend())
        .with_flags(text_only())
        .run()
        .await
        .unwrap();

    let offline = Arc::new(MockGenerationClient::new("offline"));
    let report = pipeline(cfg, offline.clone(), backend())
        .with_flags(skip_content())
        .run()
        .await
        .unwrap();

    assert!(offline.calls().is_empty());
    assert!(report.script.intro.starts_with("Traduction"));
    assert_eq!(report.script.language.as_deref(), Some("f"));
}

/// Speaks one second of silence; anything about solar power takes longer.
#[derive(Default)]
struct PacedBackend {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    finished: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechBackend for PacedBackend {
    async fn speak(&self, text: &str, _voice: &str, _lang: &str) -> podcastgen::Result<MonoAudio> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let millis = if text.contains("Solar") { 60 } else { 5 };
        tokio::time::sleep(Duration::from_millis(millis)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.lock().unwrap().push(text.to_string());
        Ok(MonoAudio {
            samples: vec![0.0; RATE as usize],
            sample_rate: RATE,
        })
    }

    fn name(&self) -> &str {
        "paced"
    }
}

#[tokio::test]
async fn slow_topic_keeps_its_place_and_workers_bound_synthesis() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(dir.path());
    cfg.content.num_topics = 3;
    cfg.pipeline.workers = 2;
    let client = Arc::new(MockGenerationClient::new("tagged").with_responder(
        |prompt, role, n| match role {
            GenerationRole::TopicGenerator => {
                "1. Solar prices\n2. Grid storage\n3. Wind farms".to_string()
            }
            GenerationRole::IntroWriter => "Welcome to the show.".to_string(),
            GenerationRole::OutroWriter => "Thanks for listening.".to_string(),
            GenerationRole::MetadataWriter => "TITLE: Energy\nDESCRIPTION: Power.".to_string(),
            _ if prompt.contains("Topic: Solar prices") => format!("Solar point {n}."),
            _ => format!("Other point {n}."),
        },
    ));
    let speech = Arc::new(PacedBackend::default());

    let report = PodcastPipeline::new(cfg, GenerationClients::uniform(client), speech.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(speech.peak.load(Ordering::SeqCst), 2);

    // The second topic finished speaking before the first one...
    let finished = speech.finished.lock().unwrap().clone();
    let position = |needle: &str| finished.iter().position(|t| t.contains(needle)).unwrap();
    assert!(position("Topic 2: Grid storage") < position("Topic 1: Solar prices"));

    // ...but the timeline still follows topic order.
    let record = read_export(report.export_path.as_ref().unwrap());
    let titles: Vec<&String> = record.conversations.keys().collect();
    assert_eq!(titles, ["Solar prices", "Grid storage", "Wind farms"]);
    let starts: Vec<Option<f64>> = record
        .conversations
        .values()
        .map(|turns| turns[0].offset_start)
        .collect();
    assert_eq!(starts, [Some(2.0), Some(5.0), Some(8.0)]);
    assert_eq!(report.total_duration_seconds, Some(11.0));
}
