//! Timing and mixing behavior of an assembled episode.

use podcastgen::audio::gain::db_to_gain;
use podcastgen::content::types::Speaker;
use podcastgen::timeline::mixer::{self, BackgroundTrack, MixSettings, PhaseVolumes};
use podcastgen::timeline::subtitles::{self, SubtitleFormat};
use podcastgen::timeline::{AudioSegment, SegmentKind, SegmentRef, Timeline, TimelineAssembler};

const RATE: u32 = 1000;

fn segment(kind: SegmentKind, reference: SegmentRef, speaker: Speaker, seconds: f64) -> AudioSegment {
    AudioSegment {
        kind,
        reference,
        speaker,
        text: format!("{kind} spoken by {speaker}"),
        samples: vec![0.0; (seconds * RATE as f64) as usize],
        sample_rate: RATE,
    }
}

fn turn(topic_id: usize, turn_index: usize, speaker: Speaker) -> AudioSegment {
    segment(
        SegmentKind::Turn,
        SegmentRef::Turn {
            topic_id,
            turn_index,
        },
        speaker,
        6.0,
    )
}

/// Intro 5 s, four 6 s turns over two topics, outro 5 s.
fn episode() -> Timeline {
    let mut assembler = TimelineAssembler::new(RATE);
    assembler
        .push(segment(SegmentKind::Intro, SegmentRef::None, Speaker::Host, 5.0))
        .unwrap();
    for topic_id in 0..2 {
        assembler.push(turn(topic_id, 0, Speaker::Moderator)).unwrap();
        assembler.push(turn(topic_id, 1, Speaker::Guest)).unwrap();
    }
    assembler
        .push(segment(SegmentKind::Outro, SegmentRef::None, Speaker::Host, 5.0))
        .unwrap();
    assembler.finish()
}

#[test]
fn segments_are_placed_back_to_back() {
    let timeline = episode();
    let ranges: Vec<(f64, f64)> = timeline
        .segments
        .iter()
        .map(|s| (s.start_time, s.end_time))
        .collect();
    assert_eq!(
        ranges,
        [
            (0.0, 5.0),
            (5.0, 11.0),
            (11.0, 17.0),
            (17.0, 23.0),
            (23.0, 29.0),
            (29.0, 34.0)
        ]
    );
    assert_eq!(timeline.total_duration_seconds(), 34.0);

    let summed: f64 = timeline.segments.iter().map(|s| s.duration_seconds()).sum();
    assert_eq!(summed, timeline.total_duration_seconds());
    for pair in timeline.segments.windows(2) {
        assert_eq!(pair[0].start_sample + pair[0].sample_count, pair[1].start_sample);
    }
}

#[test]
fn assembling_twice_gives_the_same_timeline() {
    assert_eq!(episode(), episode());
}

#[test]
fn subtitles_match_segment_times_in_both_formats() {
    let timeline = episode();
    for format in [SubtitleFormat::Srt, SubtitleFormat::Vtt] {
        let cues = subtitles::parse_cues(&subtitles::emit(&timeline.segments, format)).unwrap();
        assert_eq!(cues.len(), timeline.segments.len());
        for (cue, segment) in cues.iter().zip(&timeline.segments) {
            assert_eq!(cue.start_ms, (segment.start_time * 1000.0).round() as u64);
            assert_eq!(cue.end_ms, (segment.end_time * 1000.0).round() as u64);
        }
        assert_eq!(cues[2].text, "Guest: turn spoken by Guest");
    }
}

#[test]
fn background_follows_phase_levels() {
    let timeline = episode();
    let volumes = PhaseVolumes {
        intro_db: -12.0,
        content_db: -20.0,
        outro_db: -12.0,
    };
    let track = BackgroundTrack::from_samples(vec![0.5; 3000], RATE, RATE, volumes).unwrap();
    let settings = MixSettings {
        vocal_volume_db: 0.0,
        crossfade_ms: 0,
        fade_ms: 0,
    };

    let mix = mixer::render(&timeline, Some(&track), &settings).unwrap();
    assert_eq!(mix.len(), timeline.samples.len());

    let at = |seconds: usize| mix[seconds * RATE as usize];
    let intro = 0.5 * db_to_gain(-12.0);
    let content = 0.5 * db_to_gain(-20.0);
    assert!((at(2) - intro).abs() < 1e-6);
    assert!((at(20) - content).abs() < 1e-6);
    assert!((at(31) - intro).abs() < 1e-6);
    assert!((content - 0.05).abs() < 1e-4);
}

#[test]
fn short_background_loops_to_episode_length() {
    let timeline = episode();
    let flat = PhaseVolumes {
        intro_db: 0.0,
        content_db: 0.0,
        outro_db: 0.0,
    };
    // 10 s ramp, so every position within a loop is distinguishable
    let ramp: Vec<f32> = (0..10 * RATE).map(|i| i as f32 / 20_000.0).collect();
    let track = BackgroundTrack::from_samples(ramp, RATE, RATE, flat).unwrap();
    let settings = MixSettings {
        vocal_volume_db: 0.0,
        crossfade_ms: 0,
        fade_ms: 0,
    };

    let mix = mixer::render(&timeline, Some(&track), &settings).unwrap();
    assert_eq!(mix.len(), 34 * RATE as usize);
    for offset in [123, 4567, 9999] {
        for loop_start in [10_000, 20_000, 30_000] {
            let i = loop_start + offset;
            if i < mix.len() {
                assert_eq!(mix[i], mix[offset], "sample {i} does not repeat sample {offset}");
            }
        }
    }
    assert_ne!(mix[9_999], mix[10_000]);
}
