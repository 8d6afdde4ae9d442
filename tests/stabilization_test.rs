use std::collections::VecDeque;
use std::ops::ControlFlow;

use anpr_stabilizer::stabilize::{NO_PLATE_TEXT, READING_PLACEHOLDER};
use anpr_stabilizer::text::CharacterSet;
use anpr_stabilizer::{
    BurstCapture, Detection, DetectionBuilder, DetectionSource, EngineConfig, FrameDetections,
    FrameSource, PipelineEvent, PlatePipeline, PreviewSource, StabilizationEngine,
    StabilizerError,
};
use image::{Rgb, RgbImage};

/// Character detections spelling each row, rows stacked top to bottom.
fn glyphs(rows: &[&str]) -> Vec<Detection> {
    let charset = CharacterSet::default();
    let mut out = Vec::new();
    for (r, row) in rows.iter().enumerate() {
        let y = r as f32 * 30.0;
        for (i, c) in row.chars().enumerate() {
            let class_id = (0..charset.len() as u32)
                .find(|id| charset.label(*id) == Some(c))
                .unwrap();
            let x = i as f32 * 14.0;
            out.push(
                DetectionBuilder::new()
                    .tlbr(x, y, x + 12.0, y + 20.0)
                    .score(0.9)
                    .class_id(class_id)
                    .build(),
            );
        }
    }
    out
}

/// Detector double replaying scripted detections and readings.
struct ScriptedModels {
    frames: VecDeque<FrameDetections>,
    readings: VecDeque<Vec<&'static str>>,
}

impl ScriptedModels {
    fn new() -> Self {
        Self {
            frames: VecDeque::new(),
            readings: VecDeque::new(),
        }
    }

    fn frame(mut self, detections: FrameDetections) -> Self {
        self.frames.push_back(detections);
        self
    }

    fn reading(mut self, rows: Vec<&'static str>) -> Self {
        self.readings.push_back(rows);
        self
    }
}

impl DetectionSource for ScriptedModels {
    type Error = String;

    fn detect(&mut self, _frame: &RgbImage) -> Result<FrameDetections, Self::Error> {
        self.frames.pop_front().ok_or_else(|| "no detections scripted".to_string())
    }

    fn recognize_characters(&mut self, _plate: &RgbImage) -> Result<Vec<Detection>, Self::Error> {
        let rows = self
            .readings
            .pop_front()
            .ok_or_else(|| "no reading scripted".to_string())?;
        Ok(glyphs(&rows))
    }
}

struct StillCamera {
    remaining: usize,
}

impl FrameSource for StillCamera {
    type Error = String;

    fn next_frame(&mut self) -> Result<Option<RgbImage>, Self::Error> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(RgbImage::from_pixel(640, 480, Rgb([120, 120, 120]))))
    }
}

fn frame() -> RgbImage {
    RgbImage::from_pixel(640, 480, Rgb([120, 120, 120]))
}

fn car(x: f32) -> Detection {
    Detection::new(x, 150.0, x + 200.0, 300.0, 0.9, 2)
}

fn plate(x: f32) -> Detection {
    Detection::new(x + 50.0, 240.0, x + 150.0, 270.0, 0.8, 0)
}

#[test]
fn test_two_row_plate_is_read_in_order() {
    let mut engine = StabilizationEngine::new(EngineConfig::default()).unwrap();
    let mut models = ScriptedModels::new().reading(vec!["ABC", "123"]);
    let detections = FrameDetections::new(vec![car(100.0)], vec![plate(100.0)]);

    let report = engine.process_frame(&frame(), &detections, &mut models);
    assert_eq!(report.observations.len(), 1);
    assert_eq!(report.observations[0].reading.text, "ABC 123");
    assert_eq!(report.text, "ABC 123");
    assert!(report.is_locked());
}

#[test]
fn test_noisy_reads_are_voted_out() {
    let mut engine = StabilizationEngine::new(EngineConfig::default()).unwrap();
    let mut models = ScriptedModels::new();
    for text in ["51F12345", "51F12345", "51F12845", "51F12345", "5IF12345"] {
        models = models.reading(vec![text]);
    }
    let detections = FrameDetections::new(vec![car(100.0)], vec![plate(100.0)]);

    let mut texts = Vec::new();
    for _ in 0..5 {
        texts.push(engine.process_frame(&frame(), &detections, &mut models).text);
    }
    assert!(texts.iter().all(|t| t == "51F12345"), "{texts:?}");
}

#[test]
fn test_lock_holds_against_equal_challenger() {
    let mut engine = StabilizationEngine::new(EngineConfig::default()).unwrap();
    let mut models = ScriptedModels::new().reading(vec!["AB123"]);
    let first = engine.process_frame(
        &frame(),
        &FrameDetections::new(vec![car(0.0)], vec![plate(0.0)]),
        &mut models,
    );
    let locked = first.lock.key().unwrap();

    for _ in 0..10 {
        models = models.reading(vec!["CD456"]);
        let report = engine.process_frame(
            &frame(),
            &FrameDetections::new(vec![car(400.0)], vec![plate(400.0)]),
            &mut models,
        );
        assert_eq!(report.lock.key(), Some(locked));
        // locked plate not visible, so the preview is the retained one
        assert_eq!(report.preview.unwrap().source, PreviewSource::Retained);
    }
}

#[test]
fn test_better_plate_takes_over_lock() {
    let mut engine = StabilizationEngine::new(EngineConfig::default()).unwrap();
    let mut models = ScriptedModels::new().reading(vec!["AB1"]);
    let first = engine.process_frame(
        &frame(),
        &FrameDetections::plates_only(vec![plate(0.0)]),
        &mut models,
    );
    let original = first.lock.key().unwrap();

    let mut last = None;
    for _ in 0..3 {
        models = models.reading(vec!["CD45678"]);
        last = Some(engine.process_frame(
            &frame(),
            &FrameDetections::plates_only(vec![plate(400.0)]),
            &mut models,
        ));
    }
    let report = last.unwrap();
    assert_ne!(report.lock.key(), Some(original));
    assert_eq!(report.text, "CD45678");
    assert_eq!(report.preview.unwrap().source, PreviewSource::Locked);
}

#[test]
fn test_lock_released_after_plate_disappears() {
    let mut engine = StabilizationEngine::new(EngineConfig::default()).unwrap();
    let mut models = ScriptedModels::new().reading(vec![]);
    let report = engine.process_frame(
        &frame(),
        &FrameDetections::plates_only(vec![plate(0.0)]),
        &mut models,
    );
    assert_eq!(report.text, READING_PLACEHOLDER);
    assert!(report.is_locked());

    for _ in 0..11 {
        let report = engine.process_frame(&frame(), &FrameDetections::default(), &mut models);
        assert!(report.is_locked());
        assert_eq!(report.text, NO_PLATE_TEXT);
    }
    let report = engine.process_frame(&frame(), &FrameDetections::default(), &mut models);
    assert_eq!(report.status(), "UNLOCKED");
    assert!(report.preview.is_some());
}

#[test]
fn test_pipeline_runs_to_end_of_stream() {
    let mut models = ScriptedModels::new();
    for _ in 0..4 {
        models = models
            .frame(FrameDetections::new(vec![car(100.0)], vec![plate(100.0)]))
            .reading(vec!["XY", "9876"]);
    }
    let mut pipeline =
        PlatePipeline::new(StillCamera { remaining: 4 }, models, EngineConfig::default()).unwrap();

    let mut texts = Vec::new();
    let processed = pipeline
        .run(|event| {
            if let PipelineEvent::Frame(report) = event {
                texts.push(report.text.clone());
            }
            ControlFlow::Continue(())
        })
        .unwrap();
    assert_eq!(processed, 4);
    assert_eq!(texts, vec!["XY 9876"; 4]);
}

#[test]
fn test_pipeline_without_frames_fails() {
    let mut pipeline = PlatePipeline::new(
        StillCamera { remaining: 0 },
        ScriptedModels::new(),
        EngineConfig::default(),
    )
    .unwrap();
    let err = pipeline.run(|_| ControlFlow::Continue(())).unwrap_err();
    assert!(matches!(err, StabilizerError::SourceUnavailable(_)));
}

#[test]
fn test_burst_capture_from_json_config() {
    let config = EngineConfig::from_json_str(r#"{ "burst": { "frames": 3, "delay_ms": 0 } }"#).unwrap();
    let mut models = ScriptedModels::new();
    for text in ["30A12345", "30A12345", "30A12845"] {
        models = models
            .frame(FrameDetections::plates_only(vec![plate(100.0)]))
            .reading(vec![text]);
    }
    let result = BurstCapture::new(&config)
        .capture(&mut StillCamera { remaining: 10 }, &mut models)
        .unwrap();
    assert_eq!(result.text, "30A12345");
    assert_eq!(result.frames, 3);
    assert_eq!(result.votes, 2);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["text"], "30A12345");
    assert_eq!(json["char_count"], 8);
}
