//! Podcast pipeline that runs from a document to the finished episode.
//!
//! Stages run in order: document → content → translation → synthesis →
//! mixing → export. Within the content, translation and synthesis stages
//! topics are processed concurrently (bounded by `pipeline.workers`) and
//! rejoined in topic order.

use crate::audio::wav;
use crate::config::{Config, SynthesisFailurePolicy};
use crate::content::language;
use crate::content::text;
use crate::content::types::{PodcastScript, Speaker, TopicScript};
use crate::content::{DialogueGenerator, IntroOutroGenerator, TopicExtractor, Translator};
use crate::defaults;
use crate::document;
use crate::error::{PodcastError, Result};
use crate::llm::{GenerationClients, GenerationRole};
use crate::pipeline::script_file;
use crate::pipeline::stages::{
    NoopObserver, RunControl, RunObserver, SegmentOutcome, Stage, StageFlags, StageTimings,
};
use crate::timeline::mixer::{self, BackgroundTrack, MixSettings, PhaseVolumes};
use crate::timeline::segment::{Gap, SegmentKind, SegmentRef};
use crate::timeline::subtitles;
use crate::timeline::{ConversationExporter, Timeline, TimelineAssembler};
use crate::tts::{SpeechBackend, SpeechRequest, SpeechSynthesizer, SynthesisSettings};
use chrono::{DateTime, Local};
use futures_util::{StreamExt, TryStreamExt, stream};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub script: PodcastScript,
    /// Whether the script went through the translator in this or a saved run
    pub translated: bool,
    pub script_path: Option<PathBuf>,
    pub translated_script_path: Option<PathBuf>,
    pub audio_path: Option<PathBuf>,
    pub subtitle_path: Option<PathBuf>,
    pub export_path: Option<PathBuf>,
    pub total_duration_seconds: Option<f64>,
    pub gaps: Vec<Gap>,
    pub timings: StageTimings,
}

/// Drives one podcast run.
pub struct PodcastPipeline {
    config: Config,
    clients: GenerationClients,
    backend: Arc<dyn SpeechBackend>,
    flags: StageFlags,
    control: RunControl,
    observer: Arc<dyn RunObserver>,
}

impl PodcastPipeline {
    pub fn new(config: Config, clients: GenerationClients, backend: Arc<dyn SpeechBackend>) -> Self {
        Self {
            config,
            clients,
            backend,
            flags: StageFlags::default(),
            control: RunControl::new(),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_flags(mut self, flags: StageFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_control(mut self, control: RunControl) -> Self {
        self.control = control;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn control(&self) -> &RunControl {
        &self.control
    }

    /// Translation runs when the target language differs from the source
    /// language and is not English, unless skipped. Decided once per run.
    pub fn translation_needed(&self) -> bool {
        !self.flags.skip_translation
            && language::needs_translation(&self.config.audio.source_lang, &self.config.audio.lang)
    }

    /// Run every stage not skipped by the flags.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self) -> Result<RunReport> {
        let run_started = Local::now();
        let output_dir = self.config.output_dir.clone();
        std::fs::create_dir_all(&output_dir)?;

        let mut timings = StageTimings::default();
        let translate = self.translation_needed();
        tracing::info!(
            lang = %self.config.audio.lang,
            translate,
            skip_content = self.flags.skip_content,
            skip_audio = self.flags.skip_audio,
            "Starting podcast run"
        );

        let mut script_path = None;
        let mut translated_script_path = None;

        let (mut script, already_translated) = if self.flags.skip_content {
            self.timed(Stage::Content, &mut timings, async {
                self.load_saved(&output_dir, translate)
            })
            .await?
        } else {
            let text = self
                .timed(Stage::Document, &mut timings, self.load_document())
                .await?;
            let script = self
                .timed(
                    Stage::Content,
                    &mut timings,
                    self.generate_content(&text, run_started),
                )
                .await?;
            let path = script_file::script_path(&output_dir);
            script_file::save(&path, &script)?;
            script_path = Some(path);
            (script, false)
        };

        if translate && !already_translated {
            script = self
                .timed(Stage::Translation, &mut timings, self.translate(script))
                .await?;
            let path = script_file::translated_script_path(&output_dir);
            script_file::save(&path, &script)?;
            translated_script_path = Some(path);
        } else if !translate {
            tracing::info!("Translation not needed, keeping generated text");
        }

        for topic in &script.topics {
            self.observer.topic_ready(topic);
        }

        let mut audio_path = None;
        let timeline = if self.flags.skip_audio {
            tracing::info!("Audio stages skipped");
            None
        } else {
            let timeline = self
                .timed(Stage::Synthesis, &mut timings, self.synthesize(&script))
                .await?;
            audio_path = Some(
                self.timed(Stage::Mixing, &mut timings, async {
                    self.write_mix(&timeline, &output_dir)
                })
                .await?,
            );
            Some(timeline)
        };

        let (subtitle_path, export_path) = self
            .timed(Stage::Export, &mut timings, async {
                self.export(&script, timeline.as_ref(), run_started, &output_dir)
            })
            .await?;
        tracing::info!(summary = %timings.summary(), "Podcast run complete");
        Ok(RunReport {
            script,
            translated: translate,
            script_path,
            translated_script_path,
            audio_path,
            subtitle_path,
            export_path,
            total_duration_seconds: timeline.as_ref().map(Timeline::total_duration_seconds),
            gaps: timeline.map(|t| t.gaps).unwrap_or_default(),
            timings,
        })
    }

    /// Run one stage under the run control, recording its wall time.
    async fn timed<T>(
        &self,
        stage: Stage,
        timings: &mut StageTimings,
        work: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        self.observer.stage_started(stage);
        let started = Instant::now();
        let result = self.control.guard(work).await;
        let elapsed = started.elapsed();
        timings.record(stage, elapsed);
        self.observer.stage_finished(stage, elapsed);
        match &result {
            Ok(_) => tracing::info!(%stage, elapsed_ms = elapsed.as_millis() as u64, "Stage finished"),
            Err(e) => tracing::error!(%stage, error = %e, "Stage failed"),
        }
        result
    }

    fn workers(&self) -> usize {
        self.config.pipeline.workers.max(1)
    }

    async fn load_document(&self) -> Result<String> {
        let path = self.config.document_path.as_deref().ok_or_else(|| {
            PodcastError::configuration("document_path", "no document given (use --pdf)")
        })?;
        document::load_text(path).await
    }

    /// Reuse a saved script. A saved translation is preferred when the run
    /// would translate anyway and it is in the configured language.
    fn load_saved(&self, output_dir: &Path, translate: bool) -> Result<(PodcastScript, bool)> {
        let translated = script_file::translated_script_path(output_dir);
        if translate && translated.is_file() {
            let saved = script_file::load(&translated)?;
            let lang = &self.config.audio.lang;
            if saved.language.as_deref() == Some(lang.as_str()) {
                tracing::info!(path = %translated.display(), "Loading saved translated script");
                return Ok((saved, true));
            }
            tracing::info!(
                saved = saved.language.as_deref().unwrap_or("unknown"),
                %lang,
                "Saved translation is in another language, translating again"
            );
        }
        let path = script_file::script_path(output_dir);
        tracing::info!(path = %path.display(), "Loading saved script");
        Ok((script_file::load(&path)?, false))
    }

    #[tracing::instrument(skip_all)]
    async fn generate_content(
        &self,
        document_text: &str,
        created_at: DateTime<Local>,
    ) -> Result<PodcastScript> {
        let content = &self.config.content;

        let extractor = TopicExtractor::new(
            self.clients.get(GenerationRole::TopicGenerator)?,
            content.document_excerpt_chars,
        );
        let topics = extractor.extract(document_text, content.num_topics).await?;
        tracing::info!(topics = topics.len(), "Extracted topics");

        let narrator = IntroOutroGenerator::new(self.clients.clone());
        let intro = narrator.intro(&topics).await?;

        let dialogue = DialogueGenerator::new(self.clients.clone());
        let excerpt = text::excerpt(document_text, content.document_excerpt_chars / 2);
        let scripts: Vec<TopicScript> = stream::iter(topics.iter().map(|topic| {
            let dialogue = &dialogue;
            async move {
                let turns = dialogue
                    .generate(topic, content.num_turns, &content.roles, excerpt)
                    .await?;
                tracing::info!(topic_id = topic.id, turns = turns.len(), "Generated dialogue");
                Ok::<_, PodcastError>(TopicScript::new(topic.clone(), turns))
            }
        }))
        .buffered(self.workers())
        .try_collect()
        .await?;

        let outro = narrator.outro(&scripts).await?;
        let metadata = narrator.metadata(&topics, &intro).await?;

        Ok(PodcastScript {
            created_at,
            document_path: self
                .config
                .document_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            title: metadata.title,
            description: metadata.description,
            intro,
            outro,
            topics: scripts,
            language: None,
        })
    }

    #[tracing::instrument(skip_all, fields(lang = %self.config.audio.lang))]
    async fn translate(&self, mut script: PodcastScript) -> Result<PodcastScript> {
        let translator = Translator::new(
            self.clients.get(GenerationRole::Translator)?,
            &self.config.audio.lang,
        )?;
        translator.translate_narration(&mut script).await?;

        let topics = std::mem::take(&mut script.topics);
        script.topics = stream::iter(topics.into_iter().map(|t| translator.translate_topic(t)))
            .buffered(self.workers())
            .try_collect()
            .await?;
        script.language = Some(translator.target_lang().to_string());
        tracing::info!(turns = script.total_turns(), "Translated script");
        Ok(script)
    }

    fn voice_for(&self, speaker: Speaker) -> &str {
        let audio = &self.config.audio;
        match speaker {
            Speaker::Moderator => &audio.moderator_voice,
            Speaker::Host => &audio.host_voice,
            Speaker::Guest => &audio.guest_voice,
        }
    }

    /// Speak every segment and place it on a timeline in episode order.
    #[tracing::instrument(skip_all)]
    async fn synthesize(&self, script: &PodcastScript) -> Result<Timeline> {
        let audio = &self.config.audio;
        let synthesizer = SpeechSynthesizer::new(
            Arc::clone(&self.backend),
            SynthesisSettings {
                sample_rate: audio.sample_rate,
                chunk_size: audio.chunk_size,
                chunk_pause_ms: defaults::CHUNK_PAUSE_MS,
                lang: audio.lang.clone(),
            },
        );
        let total = 2 + script
            .topics
            .iter()
            .map(|t| 1 + t.turns.len())
            .sum::<usize>();
        self.observer.synthesis_started(total);
        tracing::info!(segments = total, backend = self.backend.name(), "Synthesizing speech");

        let mut assembler = TimelineAssembler::new(audio.sample_rate);

        let intro = self
            .speak(
                &synthesizer,
                SpeechRequest {
                    kind: SegmentKind::Intro,
                    reference: SegmentRef::None,
                    speaker: Speaker::Host,
                    text: &script.intro,
                    voice: &audio.host_voice,
                    trailing_pause_ms: audio.pause_after_intro_ms,
                },
            )
            .await?;
        self.place(&mut assembler, intro)?;

        let mut topics = std::pin::pin!(
            stream::iter(
                script
                    .topics
                    .iter()
                    .map(|topic| self.synthesize_topic(&synthesizer, topic))
            )
            .buffered(self.workers())
        );
        while let Some(outcomes) = topics.try_next().await? {
            for outcome in outcomes {
                self.place(&mut assembler, outcome)?;
            }
        }

        let outro = self
            .speak(
                &synthesizer,
                SpeechRequest {
                    kind: SegmentKind::Outro,
                    reference: SegmentRef::None,
                    speaker: Speaker::Host,
                    text: &script.outro,
                    voice: &audio.host_voice,
                    trailing_pause_ms: 0,
                },
            )
            .await?;
        self.place(&mut assembler, outro)?;

        self.observer.synthesis_finished();
        let timeline = assembler.finish();
        tracing::info!(
            seconds = timeline.total_duration_seconds(),
            segments = timeline.segments.len(),
            gaps = timeline.gaps.len(),
            "Timeline assembled"
        );
        Ok(timeline)
    }

    /// Topic label then turns, in order.
    async fn synthesize_topic(
        &self,
        synthesizer: &SpeechSynthesizer,
        topic: &TopicScript,
    ) -> Result<Vec<SegmentOutcome>> {
        let audio = &self.config.audio;
        let topic_id = topic.topic.id;
        let mut outcomes = Vec::with_capacity(topic.turns.len() + 1);

        let announcement = topic.announcement();
        outcomes.push(
            self.speak(
                synthesizer,
                SpeechRequest {
                    kind: SegmentKind::TopicLabel,
                    reference: SegmentRef::Topic { topic_id },
                    speaker: Speaker::Host,
                    text: &announcement,
                    voice: &audio.host_voice,
                    trailing_pause_ms: audio.pause_after_topic_label_ms,
                },
            )
            .await?,
        );

        for turn in &topic.turns {
            outcomes.push(
                self.speak(
                    synthesizer,
                    SpeechRequest {
                        kind: SegmentKind::Turn,
                        reference: SegmentRef::Turn {
                            topic_id,
                            turn_index: turn.turn_index,
                        },
                        speaker: turn.speaker,
                        text: &turn.content,
                        voice: self.voice_for(turn.speaker),
                        trailing_pause_ms: audio.pause_after_turn_ms,
                    },
                )
                .await?,
            );
        }
        Ok(outcomes)
    }

    /// Synthesize one segment, applying the synthesis failure policy.
    async fn speak(
        &self,
        synthesizer: &SpeechSynthesizer,
        request: SpeechRequest<'_>,
    ) -> Result<SegmentOutcome> {
        match synthesizer.synthesize(&request).await {
            Ok(segment) => Ok(SegmentOutcome::Rendered(segment)),
            Err(err @ PodcastError::SynthesisFailure { .. })
                if self.config.pipeline.synthesis_failure == SynthesisFailurePolicy::Skip =>
            {
                tracing::warn!(
                    kind = %request.kind,
                    reference = %request.reference,
                    error = %err,
                    "Synthesis failed, skipping segment"
                );
                Ok(SegmentOutcome::Skipped {
                    kind: request.kind,
                    reference: request.reference,
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }

    fn place(&self, assembler: &mut TimelineAssembler, outcome: SegmentOutcome) -> Result<()> {
        match outcome {
            SegmentOutcome::Rendered(segment) => {
                let placed = assembler.push(segment)?;
                self.observer.segment_placed(placed);
            }
            SegmentOutcome::Skipped {
                kind,
                reference,
                reason,
            } => {
                let gap = assembler.record_gap(kind, reference, reason);
                self.observer.segment_skipped(gap);
            }
        }
        Ok(())
    }

    /// Background track, or `None` when unset or unusable.
    fn background(&self) -> Option<BackgroundTrack> {
        let audio = &self.config.audio;
        let path = audio.music_path.as_deref()?;
        let volumes = PhaseVolumes {
            intro_db: audio.bg_intro_volume,
            content_db: audio.bg_content_volume,
            outro_db: audio.bg_outro_volume,
        };
        match BackgroundTrack::load(path, audio.sample_rate, volumes) {
            Ok(track) => Some(track),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Background music disabled");
                None
            }
        }
    }

    /// Mix and write the episode. The file only appears under its final
    /// name once completely written.
    fn write_mix(&self, timeline: &Timeline, output_dir: &Path) -> Result<PathBuf> {
        let audio = &self.config.audio;
        let settings = MixSettings {
            vocal_volume_db: audio.vocal_volume,
            crossfade_ms: audio.crossfade_ms,
            fade_ms: audio.fade_ms,
        };

        let background = self.background();
        let mix = match mixer::render(timeline, background.as_ref(), &settings) {
            Ok(mix) => mix,
            Err(PodcastError::Mixing { message }) if background.is_some() => {
                tracing::warn!(%message, "Background mixing failed, rendering vocals only");
                mixer::render(timeline, None, &settings)?
            }
            Err(e) => return Err(e),
        };

        let path = output_dir.join(&audio.output_file);
        let partial = partial_path(&path);
        if let Err(e) = wav::write_file(&partial, &mix, timeline.sample_rate) {
            if let Err(cleanup) = std::fs::remove_file(&partial) {
                tracing::debug!(error = %cleanup, "No partial file to remove");
            }
            return Err(e);
        }
        std::fs::rename(&partial, &path)?;
        tracing::info!(
            path = %path.display(),
            seconds = mix.len() as f64 / timeline.sample_rate as f64,
            "Wrote podcast audio"
        );
        Ok(path)
    }

    fn export(
        &self,
        script: &PodcastScript,
        timeline: Option<&Timeline>,
        run_started: DateTime<Local>,
        output_dir: &Path,
    ) -> Result<(Option<PathBuf>, Option<PathBuf>)> {
        let audio = &self.config.audio;

        let subtitle_path = match timeline {
            Some(timeline) if audio.generate_subtitles => {
                let path = output_dir
                    .join(&audio.output_file)
                    .with_extension(audio.subtitle_format.extension());
                std::fs::write(
                    &path,
                    subtitles::emit(&timeline.segments, audio.subtitle_format),
                )?;
                tracing::info!(path = %path.display(), format = %audio.subtitle_format, "Wrote subtitles");
                Some(path)
            }
            _ => None,
        };

        let export_path = if self.config.pipeline.export_json {
            let exporter = ConversationExporter::new(run_started, &audio.lang);
            let record = exporter.build(script, timeline);
            Some(exporter.write(&record, output_dir)?)
        } else {
            None
        };

        Ok((subtitle_path, export_path))
    }
}

/// `podcast.wav` → `podcast.wav.partial`
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockGenerationClient;
    use crate::tts::SilentBackend;
    use tempfile::TempDir;

    fn config(dir: &Path) -> Config {
        let document = dir.join("doc.txt");
        std::fs::write(&document, "Solar panels got cheap. Batteries followed.").unwrap();
        let mut config = Config::default();
        config.document_path = Some(document);
        config.output_dir = dir.join("out");
        config.content.num_topics = 2;
        config.content.num_turns = 2;
        config.audio.sample_rate = 1000;
        config.audio.fade_ms = 0;
        config
    }

    fn clients() -> GenerationClients {
        let client = MockGenerationClient::new("mock")
            .with_response(GenerationRole::TopicGenerator, "1. Solar prices\n2. Storage");
        GenerationClients::uniform(Arc::new(client))
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/out/podcast.wav")),
            PathBuf::from("/out/podcast.wav.partial")
        );
    }

    #[test]
    fn translation_decision_honours_flag_and_language() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(dir.path());
        cfg.audio.lang = "f".to_string();
        let backend = Arc::new(SilentBackend::new(1000));

        let pipeline = PodcastPipeline::new(cfg.clone(), clients(), backend.clone());
        assert!(pipeline.translation_needed());

        let pipeline = PodcastPipeline::new(cfg.clone(), clients(), backend.clone()).with_flags(
            StageFlags {
                skip_translation: true,
                ..StageFlags::default()
            },
        );
        assert!(!pipeline.translation_needed());

        cfg.audio.lang = "a".to_string();
        let pipeline = PodcastPipeline::new(cfg, clients(), backend);
        assert!(!pipeline.translation_needed());
    }

    #[tokio::test]
    async fn run_places_every_segment_in_order() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(SilentBackend::new(1000).with_fixed_duration(1.0));
        let mut cfg = config(dir.path());
        cfg.audio.pause_after_intro_ms = 0;
        cfg.audio.pause_after_topic_label_ms = 0;
        cfg.audio.pause_after_turn_ms = 0;

        let report = PodcastPipeline::new(cfg, clients(), backend)
            .run()
            .await
            .unwrap();

        // intro + 2 × (label + 2 turns) + outro, 1 s each
        assert_eq!(report.total_duration_seconds, Some(8.0));
        assert!(report.gaps.is_empty());
        let audio_path = report.audio_path.unwrap();
        assert!(audio_path.is_file());
        assert!(!partial_path(&audio_path).exists());
        assert_eq!(report.script.topics.len(), 2);
        assert_eq!(report.script.topics[1].title, "Storage");
    }

    #[tokio::test]
    async fn abort_policy_stops_on_synthesis_failure() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(SilentBackend::new(1000).with_failure_on("Storage"));
        let cfg = config(dir.path());
        let out = cfg.output_dir.clone();

        let err = PodcastPipeline::new(cfg, clients(), backend)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, PodcastError::SynthesisFailure { .. }));
        assert!(!out.join("podcast.wav").exists());
    }

    #[tokio::test]
    async fn cancelled_run_writes_no_audio() {
        let dir = TempDir::new().unwrap();
        let cfg = config(dir.path());
        let out = cfg.output_dir.clone();
        let control = RunControl::new();
        control.cancel();

        let err = PodcastPipeline::new(cfg, clients(), Arc::new(SilentBackend::new(1000)))
            .with_control(control)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, PodcastError::Cancelled { .. }));
        assert!(!out.join("podcast.wav").exists());
    }
}
