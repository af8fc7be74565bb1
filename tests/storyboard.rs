use std::fs;
use std::path::PathBuf;

use binary_explainer::assets::AgentAction;
use binary_explainer::error::StoryboardError;
use binary_explainer::storyboard::{JsonFileSource, Point, StoryboardDocument, StoryboardSource};
use pretty_assertions::assert_eq;

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("binary-explainer-{}-{name}", std::process::id()));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn file_source_loads_and_validates() {
    let path = temp_file(
        "ok.json",
        r#"{
            "narration_ssml": "<speak>Eight bits make a byte.</speak>",
            "scenes": [
                { "duration_ms": 1500, "agent_action": "Wave", "caption": "A byte" },
                { "duration_ms": 2500.4, "agent_action": "juggle",
                  "symbol_art": "0101\n1010", "agent_position": {"x": 130, "y": -5} }
            ]
        }"#,
    );
    let doc = JsonFileSource::new(&path).get_storyboard("what is a byte?").unwrap();
    fs::remove_file(&path).ok();

    let scenes = doc.scenes();
    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[0].agent_action, AgentAction::Wave);
    assert_eq!(scenes[1].agent_action, AgentAction::Idle);
    assert_eq!(scenes[1].duration_ms, 2500);
    assert_eq!(scenes[1].symbol_anchor(), Some(Point::CENTER));
    assert_eq!(scenes[1].agent_position.clamped(), Point { x: 100.0, y: 0.0 });
    assert_eq!(doc.voice_hint().language, "en");
}

#[test]
fn missing_file_is_an_io_error() {
    let err = JsonFileSource::new("/definitely/not/here.json")
        .get_storyboard("")
        .unwrap_err();
    assert!(matches!(err, StoryboardError::Io(_)));
}

#[test]
fn malformed_documents_are_rejected_before_playback() {
    let missing_scenes = StoryboardDocument::from_json(r#"{ "narration_ssml": "hi" }"#);
    assert!(matches!(missing_scenes, Err(StoryboardError::MissingField("scenes"))));

    let missing_narration = StoryboardDocument::from_json(r#"{ "scenes": [{ "duration_ms": 1 }] }"#);
    assert!(matches!(missing_narration, Err(StoryboardError::MissingField("narration_ssml"))));

    let empty = StoryboardDocument::from_json(r#"{ "narration_ssml": "", "scenes": [] }"#);
    assert!(matches!(empty, Err(StoryboardError::NoScenes)));

    assert!(matches!(
        StoryboardDocument::from_json("not json"),
        Err(StoryboardError::Parse(_))
    ));
}

#[test]
fn standby_is_a_single_quiet_idle_scene() {
    let doc = StoryboardDocument::standby();
    assert_eq!(doc.scenes().len(), 1);
    assert_eq!(doc.scenes()[0].agent_action, AgentAction::Idle);
    assert!(doc.narration().is_empty());
}
