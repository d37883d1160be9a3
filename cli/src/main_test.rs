#![allow(clippy::float_cmp)]

use std::io::Cursor;

use pixel_canvas::mode::Mode;

use super::*;

fn view() -> ChallengeView {
    ChallengeView {
        prompt: "Capital of France?".into(),
        choices: vec!["Rome".into(), "Paris".into(), "Oslo".into()],
        cell: Cell::new(1, 1),
        remaining_ms: 9_500.0,
    }
}

#[test]
fn place_parses_cell_and_color() {
    let cli = Cli::try_parse_from(["pixel-cli", "place", "main", "3", "4", "#ff0000"]).unwrap();
    match cli.command {
        Command::Place { canvas_id, x, y, color, timeout_secs } => {
            assert_eq!(canvas_id, "main");
            assert_eq!((x, y), (3, 4));
            assert_eq!(color, Color::rgb(0xff, 0, 0));
            assert_eq!(timeout_secs, 15);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn place_rejects_bad_color() {
    assert!(Cli::try_parse_from(["pixel-cli", "place", "main", "3", "4", "red"]).is_err());
}

#[test]
fn watch_takes_limit_and_output() {
    let cli = Cli::try_parse_from(["pixel-cli", "watch", "main", "--max-events", "10", "--out", "canvas.png"]).unwrap();
    match cli.command {
        Command::Watch { max_events, out, .. } => {
            assert_eq!(max_events, Some(10));
            assert_eq!(out, Some(PathBuf::from("canvas.png")));
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn missing_config_uses_defaults() {
    assert_eq!(load_config(None).unwrap(), EngineConfig::default());
}

#[test]
fn config_file_overrides_defaults() {
    let path = std::env::temp_dir().join(format!("pixel-cli-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "mode": "elimination", "max_scale": 64 }"#).unwrap();
    let config = load_config(Some(&path)).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.mode, Mode::Elimination);
    assert_eq!(config.max_scale, 64.0);
}

#[test]
fn invalid_config_is_canvas_error() {
    let path = std::env::temp_dir().join(format!("pixel-cli-bad-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "min_scale": 5, "max_scale": 1 }"#).unwrap();
    let result = load_config(Some(&path));
    std::fs::remove_file(&path).unwrap();
    assert!(matches!(result, Err(CliError::Canvas(CanvasError::Config(_)))));
}

#[test]
fn choices_are_one_based() {
    assert_eq!(parse_choice("2\n", 3), 1);
    assert_eq!(parse_choice(" 1 ", 3), 0);
}

#[test]
fn out_of_range_choice_is_wrong_answer() {
    assert_eq!(parse_choice("0", 3), usize::MAX);
    assert_eq!(parse_choice("4", 3), usize::MAX);
    assert_eq!(parse_choice("paris", 3), usize::MAX);
}

#[test]
fn ask_reads_answer_line() {
    let mut input = Cursor::new("2\n");
    assert_eq!(ask(&view(), &mut input).unwrap(), 1);
}

#[test]
fn finds_opened_challenge_among_actions() {
    let actions = vec![Action::SelectionChanged(None), Action::ChallengeOpened(view()), Action::RenderNeeded];
    assert_eq!(opened_challenge(&actions).map(|v| v.cell), Some(Cell::new(1, 1)));
    assert!(opened_challenge(&[Action::RenderNeeded]).is_none());
}
