// Operator input sources for the binary
//
// Keyboard: WASD drive, Z/X rotate, I/K lift stick, U/J lift level up/down,
// 1/2 left intake in/out, 3/4 right intake in/out, F/V foundation lower/raise,
// G/H grip close/open, R/T roll left/right, P/L pitch up/down, Q or Esc quits.
//
// Script: one JSON `OperatorInput` per line, replayed one line per tick by
// the control loop itself. Blank lines and lines starting with '#' are skipped.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::messages::OperatorInput;

// A key counts as held for this long after its last press/repeat event
const KEY_HOLD: Duration = Duration::from_millis(150);

// Keyboard poll timeout (50Hz effective rate)
const KEY_POLL: Duration = Duration::from_millis(20);

/// Where operator input comes from
#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    Keyboard,
    Script(PathBuf),
}

/// Message from an input source to the control loop
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Input(OperatorInput),
    Quit,
}

/// Read the keyboard on a blocking thread, sending a snapshot every poll
pub fn spawn_keyboard(tx: UnboundedSender<InputEvent>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        if let Err(e) = run_keyboard(&tx) {
            warn!("Keyboard input failed: {}", e);
        }
        let _ = tx.send(InputEvent::Quit);
    })
}

/// Load a JSON-lines script to be replayed one line per tick
pub async fn load_script(path: &Path) -> std::io::Result<VecDeque<OperatorInput>> {
    let text = tokio::fs::read_to_string(path).await?;
    let inputs = parse_script(&text);
    info!("Replaying {} inputs from {}", inputs.len(), path.display());
    Ok(inputs)
}

/// Parse a JSON-lines script, skipping lines that do not parse
pub fn parse_script(text: &str) -> VecDeque<OperatorInput> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .filter_map(|(n, line)| match serde_json::from_str(line) {
            Ok(input) => Some(input),
            Err(e) => {
                warn!("Skipping script line {}: {}", n + 1, e);
                None
            }
        })
        .collect()
}

/// Build a snapshot from the set of currently held keys
pub fn input_from_keys(held: impl Fn(char) -> bool) -> OperatorInput {
    let axis = |pos: char, neg: char| match (held(pos), held(neg)) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    };

    OperatorInput {
        drive_forward: axis('w', 's'),
        drive_strafe: axis('d', 'a'),
        drive_rotate: axis('x', 'z'),
        intake_left_in: held('1'),
        intake_left_out: held('2'),
        intake_right_in: held('3'),
        intake_right_out: held('4'),
        foundation_lower: held('f'),
        foundation_raise: held('v'),
        grip_close: held('g'),
        grip_open: held('h'),
        roll_left: held('r'),
        roll_right: held('t'),
        pitch_up: held('p'),
        pitch_down: held('l'),
        lift_manual_axis: axis('i', 'k'),
        lift_level_up: held('u'),
        lift_level_down: held('j'),
    }
}

fn run_keyboard(tx: &UnboundedSender<InputEvent>) -> std::io::Result<()> {
    info!("Controls: WASD=drive, Z/X=rotate, I/K=lift, U/J=level, Q=quit");
    enable_raw_mode()?;
    let result = keyboard_loop(tx);
    disable_raw_mode()?;
    result
}

fn keyboard_loop(tx: &UnboundedSender<InputEvent>) -> std::io::Result<()> {
    let mut last_seen: HashMap<char, Instant> = HashMap::new();

    loop {
        if event::poll(KEY_POLL)? {
            if let Event::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) = event::read()?
            {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                match code {
                    KeyCode::Esc | KeyCode::Char('q') if pressed => return Ok(()),
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(());
                    }
                    KeyCode::Char(c) if pressed => {
                        last_seen.insert(c.to_ascii_lowercase(), Instant::now());
                    }
                    KeyCode::Char(c) if kind == KeyEventKind::Release => {
                        last_seen.remove(&c.to_ascii_lowercase());
                    }
                    _ => {}
                }
            }
        }

        let now = Instant::now();
        last_seen.retain(|_, at| now.duration_since(*at) < KEY_HOLD);
        let input = input_from_keys(|c| last_seen.contains_key(&c));
        if tx.send(InputEvent::Input(input)).is_err() {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_skips_comments_and_bad_lines() {
        let text = r#"
# drive forward, then raise a level
{ "driveForward": 1.0 }

not json
{ "liftLevelUp": true, "intakeLeftIn": true }
"#;
        let inputs = parse_script(text);
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].drive_forward, 1.0);
        assert!(inputs[1].lift_level_up && inputs[1].intake_left_in);
    }

    #[test]
    fn test_no_keys_is_idle() {
        assert_eq!(input_from_keys(|_| false), OperatorInput::idle());
    }

    #[test]
    fn test_key_mapping() {
        let input = input_from_keys(|c| matches!(c, 'w' | 'a' | '1' | '2' | 'u'));
        assert_eq!(input.drive_forward, 1.0);
        assert_eq!(input.drive_strafe, -1.0);
        assert!(input.intake_left_in && input.intake_left_out);
        assert!(input.lift_level_up);
        assert_eq!(input.lift_manual_axis, 0.0);
    }

    #[test]
    fn test_opposing_keys_cancel_axis() {
        let input = input_from_keys(|c| matches!(c, 'i' | 'k'));
        assert_eq!(input.lift_manual_axis, 0.0);
    }

    #[tokio::test]
    async fn test_load_script_keeps_every_line_in_order() {
        let path = std::env::temp_dir().join(format!(
            "mecanum-teleop-script-{}.jsonl",
            std::process::id()
        ));
        std::fs::write(&path, "{ \"driveRotate\": -0.5 }\n{}\n{ \"gripOpen\": true }\n").unwrap();

        let inputs = load_script(&path).await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0].drive_rotate, -0.5);
        assert_eq!(inputs[1], OperatorInput::idle());
        assert!(inputs[2].grip_open);
    }

    #[tokio::test]
    async fn test_load_script_missing_file() {
        let err = load_script(Path::new("/nonexistent/script.jsonl"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
