// Kbfn Pipeline Scenarios
//
// Complete layer chains driven with timestamped events into a memory sink.
// No device access is needed.
//
// Run with: cargo test -p kbfn-core --test pipeline_scenarios

use kbfn_core::{
    Config, ConfigError, DualRoleConfig, Event, HoldAction, Key, KeyState, LayerConfig,
    LayerDescriptor, MemorySink, Pipeline, RemapConfig,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// =========================================================================
// Test Helpers
// =========================================================================

fn at(ms: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(ms)
}

fn down(key: Key, ms: u64) -> Event {
    Event::key(at(ms), key, KeyState::Down)
}

fn up(key: Key, ms: u64) -> Event {
    Event::key(at(ms), key, KeyState::Up)
}

fn hold(key: Key, ms: u64) -> Event {
    Event::key(at(ms), key, KeyState::Hold)
}

/// SPACE as a navigation layer: 500ms threshold, 50ms lookahead, I -> UP
fn space_nav() -> LayerConfig {
    let keymap = [(Key::I, Key::UP), (Key::J, Key::LEFT), (Key::K, Key::DOWN)];
    LayerConfig::DualRole(
        DualRoleConfig::new(Key::SPACE, HoldAction::SwitchKeymap(keymap.into_iter().collect()))
            .with_hold_threshold(Duration::from_millis(500))
            .with_lookahead_delay(Duration::from_millis(50)),
    )
}

/// CAPSLOCK that acts as control when held
fn caps_ctrl() -> LayerConfig {
    LayerConfig::DualRole(DualRoleConfig::new(
        Key::CAPSLOCK,
        HoldAction::EmitCompanionModifier(Key::LEFTCTRL),
    ))
}

/// Feed events one batch each, the way the device loop does
fn run(layers: &[LayerConfig], events: &[Event]) -> (MemorySink, Pipeline) {
    let sink = MemorySink::new();
    let mut pipeline = Pipeline::build(layers, sink.clone());
    for event in events {
        pipeline.process_batch([*event]).unwrap();
    }
    (sink, pipeline)
}

fn stamped(sink: &MemorySink) -> Vec<(Key, KeyState, u64)> {
    sink.events()
        .iter()
        .filter_map(|event| {
            let (key, state) = event.as_key()?;
            let ms = event.time.duration_since(UNIX_EPOCH).ok()?.as_millis() as u64;
            Some((key, state, ms))
        })
        .collect()
}

// =========================================================================
// Dual-role scenarios
// =========================================================================

#[test]
fn test_hold_translates_through_keymap() {
    let (sink, _) = run(
        &[space_nav()],
        &[
            down(Key::SPACE, 0),
            down(Key::I, 80),
            up(Key::I, 150),
            up(Key::SPACE, 200),
        ],
    );

    assert_eq!(
        stamped(&sink),
        vec![(Key::UP, KeyState::Down, 80), (Key::UP, KeyState::Up, 150)]
    );
}

#[test]
fn test_lone_tap_synthesizes_keystroke() {
    let (sink, _) = run(&[space_nav()], &[down(Key::SPACE, 0), up(Key::SPACE, 100)]);

    assert_eq!(
        stamped(&sink),
        vec![
            (Key::SPACE, KeyState::Down, 100),
            (Key::SPACE, KeyState::Up, 100),
        ]
    );
}

#[test]
fn test_rollover_from_before_activation_passes_through() {
    let (sink, _) = run(
        &[space_nav()],
        &[
            down(Key::X, 10),
            down(Key::SPACE, 20),
            up(Key::X, 30),
            up(Key::SPACE, 40),
        ],
    );

    assert_eq!(
        sink.keys(),
        vec![
            (Key::X, KeyState::Down),
            (Key::X, KeyState::Up),
            (Key::SPACE, KeyState::Down),
            (Key::SPACE, KeyState::Up),
        ]
    );
}

#[test]
fn test_slow_release_without_use_is_silent() {
    let (sink, _) = run(
        &[space_nav()],
        &[down(Key::SPACE, 0), hold(Key::SPACE, 250), up(Key::SPACE, 900)],
    );
    assert!(sink.events().is_empty());
}

#[test]
fn test_key_struck_just_before_slow_release_is_silent() {
    let (sink, pipeline) = run(
        &[space_nav()],
        &[
            down(Key::SPACE, 0),
            down(Key::I, 520),
            up(Key::SPACE, 540),
            up(Key::I, 600),
        ],
    );
    assert!(sink.events().is_empty());
    // The leftover lookahead deadline is stale and fires harmlessly
    assert_eq!(pipeline.next_deadline(), None);
}

#[test]
fn test_typing_burst_inside_lookahead() {
    // I and J both land inside the window: J decides I, both translate
    let (sink, _) = run(
        &[space_nav()],
        &[
            down(Key::SPACE, 0),
            down(Key::I, 10),
            down(Key::J, 20),
            up(Key::I, 30),
            up(Key::J, 40),
            up(Key::SPACE, 300),
        ],
    );

    assert_eq!(
        sink.keys(),
        vec![
            (Key::UP, KeyState::Down),
            (Key::LEFT, KeyState::Down),
            (Key::UP, KeyState::Up),
            (Key::LEFT, KeyState::Up),
        ]
    );
}

#[test]
fn test_timer_driven_resolution_via_tick() {
    let sink = MemorySink::new();
    let mut pipeline = Pipeline::build(&[space_nav()], sink.clone());
    pipeline.process_batch([down(Key::SPACE, 0), down(Key::K, 100)]).unwrap();
    assert!(sink.events().is_empty());

    let deadline = pipeline.next_deadline().unwrap();
    assert_eq!(deadline, at(150));
    assert!(pipeline.tick(deadline).unwrap());
    assert_eq!(stamped(&sink), vec![(Key::DOWN, KeyState::Down, 100)]);
}

#[test]
fn test_companion_modifier_chord() {
    let (sink, _) = run(
        &[caps_ctrl()],
        &[
            down(Key::CAPSLOCK, 0),
            down(Key::A, 100),
            up(Key::A, 200),
            up(Key::CAPSLOCK, 300),
        ],
    );

    assert_eq!(
        sink.keys(),
        vec![
            (Key::LEFTCTRL, KeyState::Down),
            (Key::A, KeyState::Down),
            (Key::A, KeyState::Up),
            (Key::LEFTCTRL, KeyState::Up),
        ]
    );
}

#[test]
fn test_two_dual_role_layers_are_independent() {
    let (sink, _) = run(
        &[caps_ctrl(), space_nav()],
        &[
            down(Key::CAPSLOCK, 0),
            up(Key::CAPSLOCK, 50),
            down(Key::SPACE, 100),
            up(Key::SPACE, 150),
        ],
    );

    assert_eq!(
        sink.keys(),
        vec![
            (Key::CAPSLOCK, KeyState::Down),
            (Key::CAPSLOCK, KeyState::Up),
            (Key::SPACE, KeyState::Down),
            (Key::SPACE, KeyState::Up),
        ]
    );
}

// =========================================================================
// Layer ordering and flushing
// =========================================================================

#[test]
fn test_remap_feeds_dual_role() {
    let remap = LayerConfig::Remap(RemapConfig {
        codes: [(Key::TAB, Key::SPACE), (Key::L, Key::I)].into_iter().collect(),
    });
    let (sink, _) = run(
        &[remap, space_nav()],
        &[
            down(Key::TAB, 0),
            down(Key::L, 100),
            up(Key::L, 200),
            up(Key::TAB, 250),
        ],
    );

    assert_eq!(
        sink.keys(),
        vec![(Key::UP, KeyState::Down), (Key::UP, KeyState::Up)]
    );
}

#[test]
fn test_dual_role_output_is_remapped_downstream() {
    let remap = LayerConfig::Remap(RemapConfig {
        codes: [(Key::UP, Key::ENTER)].into_iter().collect(),
    });
    let (sink, _) = run(
        &[space_nav(), remap],
        &[
            down(Key::SPACE, 0),
            down(Key::I, 100),
            up(Key::I, 200),
            up(Key::SPACE, 250),
        ],
    );

    assert_eq!(
        sink.keys(),
        vec![(Key::ENTER, KeyState::Down), (Key::ENTER, KeyState::Up)]
    );
}

#[test]
fn test_one_flush_per_batch() {
    let sink = MemorySink::new();
    let mut pipeline = Pipeline::build(&[space_nav()], sink.clone());
    pipeline
        .process_batch([down(Key::A, 0), up(Key::A, 10), down(Key::X, 20)])
        .unwrap();
    pipeline.process_batch([up(Key::X, 30)]).unwrap();

    assert_eq!(sink.keys().len(), 4);
    assert_eq!(sink.flushes(), 2);
}

#[test]
fn test_tick_without_due_timers_does_not_flush() {
    let sink = MemorySink::new();
    let mut pipeline = Pipeline::build(&[space_nav()], sink.clone());
    assert!(!pipeline.tick(at(1_000)).unwrap());
    assert_eq!(sink.flushes(), 0);
}

// =========================================================================
// Building from configuration
// =========================================================================

#[test]
fn test_unknown_layer_kind_rejected_at_build() {
    let descriptors = [
        LayerDescriptor::new("Remap", toml::Table::new()),
        LayerDescriptor::new("Leader", toml::Table::new()),
    ];
    let result = Pipeline::from_descriptors(&descriptors, MemorySink::new());
    assert!(matches!(result, Err(ConfigError::UnknownLayerKind(kind)) if kind == "Leader"));
}

#[test]
fn test_pipeline_from_config_file_contents() {
    let config = Config::from_toml(
        r#"
        [device]
        name = "SEM USB Keyboard"

        [[layers]]
        kind = "Remap"
        [layers.options.codes]
        CAPSLOCK = "ESC"

        [[layers]]
        kind = "DualRole"
        options = { key = "SPACE", keymap = { I = "UP" } }
        "#,
    )
    .unwrap();

    let sink = MemorySink::new();
    let mut pipeline = Pipeline::build(&config.layers, sink.clone());
    assert_eq!(pipeline.layer_count(), 2);

    pipeline
        .process_batch([down(Key::CAPSLOCK, 0), up(Key::CAPSLOCK, 5)])
        .unwrap();
    pipeline
        .process_batch([down(Key::SPACE, 10), up(Key::SPACE, 20)])
        .unwrap();

    assert_eq!(
        sink.keys(),
        vec![
            (Key::ESC, KeyState::Down),
            (Key::ESC, KeyState::Up),
            (Key::SPACE, KeyState::Down),
            (Key::SPACE, KeyState::Up),
        ]
    );
}

#[test]
fn test_rebuilt_pipeline_starts_clean() {
    let events = [down(Key::SPACE, 0), down(Key::I, 100)];
    let (first, _) = run(&[space_nav()], &events);
    assert!(first.events().is_empty());

    // A fresh build knows nothing of the previous activation
    let (second, _) = run(&[space_nav()], &[up(Key::I, 500), up(Key::SPACE, 510)]);
    assert!(second.events().is_empty());
}
