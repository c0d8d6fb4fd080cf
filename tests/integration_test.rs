//! Integration tests for the tilt-rotor controller over the simulated bus

use std::time::Duration;

use hexatilt::actuator::ActuatorBank;
use hexatilt::config::RuntimeConfig;
use hexatilt::control::{Command, Controller, Flow, Mode};
use hexatilt::ipc::{spawn_script_feeder, ChannelSource, CommandChannels, DiagnosticLog};
use hexatilt::mapping::{ArmId, ArmTargets, Geometry, Mapping, Tilt};
use hexatilt::metrics::TransportMetrics;
use hexatilt::sequencer::{SweepKind, SweepPhase, SweepProfile};
use hexatilt::transport::SimulatedBus;
use hexatilt::visualization::{render_status, sweep_trajectory};

const ROLL_IDS: [u8; 6] = [1, 2, 3, 4, 5, 6];
const PITCH_IDS: [u8; 6] = [11, 12, 13, 14, 15, 16];

fn instant_config() -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.sweep.sample_delay_ms = 0;
    config.sweep.settle_delay_ms = 0;
    config
}

fn controller_on(bus: &SimulatedBus) -> Controller {
    let config = instant_config();
    let mut transport = bus.clone();
    let bank = ActuatorBank::connect(
        &mut transport,
        &config,
        &DiagnosticLog::default(),
        &TransportMetrics::new(),
    );
    Controller::new(bank, &config)
}

fn arm(n: u8) -> ArmId {
    ArmId::new(n).unwrap()
}

fn no_input() -> ChannelSource {
    ChannelSource::from_commands(Vec::new())
}

// ============================================================================
// MAPPING TESTS
// ============================================================================

#[test]
fn test_zero_tilt_maps_to_zero_everywhere() {
    let geometry = Geometry::default();
    let uniform = geometry.map_all(Mapping::Uniform, Tilt::ZERO);
    let body = geometry.map_all(Mapping::Body, Tilt::ZERO);

    for i in 0..6 {
        assert_eq!(body[i], Some(ArmTargets { roll: 0, pitch: 0 }));
        assert_eq!(uniform[i], body[i], "Uniform and body must agree at the origin");
    }
}

#[test]
fn test_body_mapping_is_linear_up_to_rounding() {
    let geometry = Geometry::default();
    let a = Tilt::new(3.0, -2.0);
    let b = Tilt::new(-1.5, 4.0);
    let sum = Tilt::new(a.x + b.x, a.y + b.y);

    for i in 0..6 {
        let ta = geometry.map_targets(Mapping::Body, a, i).unwrap();
        let tb = geometry.map_targets(Mapping::Body, b, i).unwrap();
        let ts = geometry.map_targets(Mapping::Body, sum, i).unwrap();
        assert!((ts.roll - ta.roll - tb.roll).abs() <= 1, "arm {i} roll not additive");
        assert!((ts.pitch - ta.pitch - tb.pitch).abs() <= 1, "arm {i} pitch not additive");
    }
}

#[test]
fn test_body_mapping_uses_arm_angles() {
    let geometry = Geometry::default();
    let tilt = Tilt::new(1.0, 0.0);

    // Arm 1 sits at 0 degrees: an x tilt is pure pitch.
    assert_eq!(
        geometry.map_targets(Mapping::Body, tilt, 0),
        Some(ArmTargets { roll: 0, pitch: 290 })
    );
    // Arm 2 sits opposite.
    assert_eq!(
        geometry.map_targets(Mapping::Body, tilt, 1),
        Some(ArmTargets { roll: 0, pitch: -290 })
    );
    // Arm 3 sits at 120 degrees.
    assert_eq!(
        geometry.map_targets(Mapping::Body, tilt, 2),
        Some(ArmTargets { roll: -33, pitch: -145 })
    );
}

#[test]
fn test_single_mapping_only_touches_selected_arm() {
    let geometry = Geometry::default();
    let targets = geometry.map_all(Mapping::Single(arm(4)), Tilt::new(2.0, 1.0));

    for (i, target) in targets.iter().enumerate() {
        if i == 3 {
            assert_eq!(*target, Some(ArmTargets { roll: 76, pitch: 290 }));
        } else {
            assert_eq!(*target, None);
        }
    }
}

// ============================================================================
// SEQUENCER TESTS
// ============================================================================

#[test]
fn test_sweep_phase_lengths() {
    let profile = SweepProfile::default();
    let samples: Vec<_> = profile.sequence().collect();
    let count = |phase| samples.iter().filter(|s| s.phase == phase).count();

    assert_eq!(count(SweepPhase::Settle), 1);
    assert_eq!(count(SweepPhase::RampIn), 7);
    assert_eq!(count(SweepPhase::Rotate), 73);
    assert_eq!(count(SweepPhase::RampOut), 7);
    assert_eq!(samples.len(), 88);
    assert_eq!(profile.sequence().len(), 88);
}

#[test]
fn test_sweep_shape() {
    let profile = SweepProfile::default();
    let samples: Vec<_> = profile.sequence().collect();

    assert_eq!(samples[0].tilt, Tilt::ZERO);
    assert_eq!(samples[0].delay, Duration::from_secs(1));
    assert_eq!(samples[7].tilt, Tilt::new(30.0, 0.0), "Ramp-in ends at the sweep angle");
    assert_eq!(samples[8].tilt.x, 30.0, "Rotation starts on the x axis");
    assert!(samples[8].tilt.y.abs() < 1e-9);
    assert_eq!(samples[87].tilt.x, 0.0, "Ramp-out ends at zero");
    assert!(samples[87].tilt.y.abs() < 1e-9);
    assert!(samples[1..].iter().all(|s| s.delay == Duration::from_millis(100)));
}

#[test]
fn test_sweep_is_deterministic_and_restartable() {
    let profile = SweepProfile::default();
    let first: Vec<_> = profile.sequence().collect();
    let second: Vec<_> = profile.sequence().collect();
    assert_eq!(first, second);

    let mut seq = profile.sequence();
    seq.by_ref().take(20).for_each(drop);
    seq.restart();
    assert_eq!(seq.collect::<Vec<_>>(), first);
}

#[test]
fn test_ramp_never_overshoots_angle() {
    let profile = SweepProfile {
        step_deg: 7,
        ..SweepProfile::default()
    };
    let ramp: Vec<f64> = profile
        .sequence()
        .filter(|s| s.phase == SweepPhase::RampIn)
        .map(|s| s.tilt.x)
        .collect();
    assert_eq!(ramp, vec![0.0, 7.0, 14.0, 21.0, 28.0]);
}

#[test]
fn test_ramp_out_holds_last_rotation_y() {
    let profile = SweepProfile {
        step_deg: 7,
        ..SweepProfile::default()
    };
    let samples: Vec<_> = profile.sequence().collect();
    let last_rotate = samples
        .iter()
        .filter(|s| s.phase == SweepPhase::Rotate)
        .last()
        .unwrap();
    assert_eq!(last_rotate.index, 51, "Rotation stops at 357 degrees");
    assert!((last_rotate.tilt.y - 30.0 * 357f64.to_radians().sin()).abs() < 1e-9);
    assert!(last_rotate.tilt.y < -1.5);

    let ramp_out: Vec<_> = samples
        .iter()
        .filter(|s| s.phase == SweepPhase::RampOut)
        .collect();
    assert_eq!(ramp_out.len(), 5);
    for sample in ramp_out {
        assert_eq!(sample.tilt.y, last_rotate.tilt.y, "sample {}", sample.index);
    }
}

#[test]
fn test_trajectory_spans_sweep() {
    let profile = SweepProfile::default();
    let points = sweep_trajectory(&profile, &Geometry::default(), SweepKind::Body, 0);
    assert_eq!(points.len(), 88);
    assert_eq!(points[0].at, Duration::ZERO);
    assert_eq!(points[87].at, profile.duration() - profile.sample_delay);
}

// ============================================================================
// CONTROLLER TESTS
// ============================================================================

#[test]
fn test_select_actuator_then_forward_moves_only_that_arm() {
    let bus = SimulatedBus::new();
    let mut controller = controller_on(&bus);
    let mut input = no_input();

    controller.handle(Command::SelectActuator(arm(3)), &mut input).unwrap();
    controller.handle(Command::TiltForward, &mut input).unwrap();

    let arm3 = controller.bank().arm(2);
    assert_eq!(arm3.pitch.target(), 290);
    assert_eq!(arm3.roll.target(), 0);
    assert_eq!(bus.writes_for(13).last(), Some(&(2048 + 290)));

    for other in [0, 1, 3, 4, 5] {
        assert!(bus.writes_for(ROLL_IDS[other]).is_empty());
        assert!(bus.writes_for(PITCH_IDS[other]).is_empty());
    }
}

#[test]
fn test_calibrate_matches_observed_positions() {
    let bus = SimulatedBus::with_positions([(1, 1000), (11, 3000)]);
    let mut controller = controller_on(&bus);
    let mut input = no_input();

    controller.handle(Command::SelectUniform, &mut input).unwrap();
    controller.handle(Command::TiltRight, &mut input).unwrap();
    bus.set_position(2, 1500);
    bus.set_position(14, 100);

    controller.handle(Command::SelectActuator(arm(1)), &mut input).unwrap();
    controller.handle(Command::Calibrate, &mut input).unwrap();

    assert_eq!(controller.state().tilt(), Tilt::ZERO);
    for channel in controller.bank().channels() {
        assert_eq!(
            channel.target() + channel.offset(),
            channel.observed(),
            "channel {}",
            channel.id()
        );
    }
    assert_eq!(controller.bank().channel(2).unwrap().offset(), 1500);
    assert_eq!(controller.bank().channel(14).unwrap().offset(), 100);
}

#[test]
fn test_tilt_commands_and_step_floor() {
    let bus = SimulatedBus::new();
    let mut controller = controller_on(&bus);
    let mut input = no_input();

    controller.handle(Command::DecreaseStep, &mut input).unwrap();
    assert_eq!(controller.state().min_step(), 1);
    assert_eq!(
        controller.state().step(),
        controller.state().min_step(),
        "Step never drops below the minimum"
    );

    controller.handle(Command::IncreaseStep, &mut input).unwrap();
    controller.handle(Command::TiltLeft, &mut input).unwrap();
    controller.handle(Command::TiltForward, &mut input).unwrap();
    controller.handle(Command::TiltForward, &mut input).unwrap();
    assert_eq!(controller.state().tilt(), Tilt::new(-2.0, 4.0));

    controller.handle(Command::TiltRight, &mut input).unwrap();
    controller.handle(Command::TiltBack, &mut input).unwrap();
    assert_eq!(controller.state().tilt(), Tilt::new(0.0, 2.0));
    assert_eq!(bus.write_count(), 0, "Idle mode maps nothing");
}

#[test]
fn test_zero_all_keeps_mode() {
    let bus = SimulatedBus::new();
    let mut controller = controller_on(&bus);
    let mut input = no_input();

    controller.handle(Command::SelectBody, &mut input).unwrap();
    controller.handle(Command::TiltRight, &mut input).unwrap();
    controller.handle(Command::ZeroAll, &mut input).unwrap();

    assert_eq!(controller.state().mode(), Mode::BodyDistributed);
    assert_eq!(controller.state().tilt(), Tilt::ZERO);
    for channel in controller.bank().channels() {
        assert_eq!(channel.target(), 0);
        assert_eq!(bus.position(channel.id()), channel.offset());
    }
}

#[test]
fn test_stop_and_unrecognized_send_nothing() {
    let bus = SimulatedBus::new();
    let mut controller = controller_on(&bus);
    let mut input = no_input();

    controller.handle(Command::SelectUniform, &mut input).unwrap();
    let before = bus.write_count();
    assert_eq!(controller.handle(Command::Stop, &mut input).unwrap(), Flow::Continue);
    assert_eq!(controller.handle(Command::Unrecognized, &mut input).unwrap(), Flow::Continue);
    assert_eq!(bus.write_count(), before);
}

#[test]
fn test_completed_sweep_returns_to_idle() {
    let bus = SimulatedBus::new();
    let mut controller = controller_on(&bus);

    let flow = controller.handle(Command::SweepBody, &mut no_input()).unwrap();

    assert_eq!(flow, Flow::Continue);
    assert_eq!(controller.state().mode(), Mode::Idle);
    assert_eq!(controller.state().tilt(), Tilt::ZERO);
    for id in ROLL_IDS.iter().chain(&PITCH_IDS) {
        let writes = bus.writes_for(*id);
        assert_eq!(writes.len(), 88, "id {id}");
        assert_eq!(writes.last(), Some(&2048), "Sweep ends back at the offset");
    }
}

fn press(controller: &mut Controller, command: Command, times: usize) {
    let mut input = no_input();
    for _ in 0..times {
        controller.handle(command, &mut input).unwrap();
    }
}

#[test]
fn test_commands_clamp_to_position_range() {
    let bus = SimulatedBus::new();
    let mut controller = controller_on(&bus);
    let scale_pitch = controller.geometry().scale_pitch();
    let scale_roll = controller.geometry().scale_roll();

    press(&mut controller, Command::SelectUniform, 1);
    press(&mut controller, Command::TiltForward, 8);
    let pitch = (8.0 * scale_pitch).round() as i32;
    for (i, id) in PITCH_IDS.iter().enumerate() {
        assert_eq!(bus.writes_for(*id).last(), Some(&4095), "id {id}");
        assert_eq!(controller.bank().arm(i).pitch.target(), pitch, "Target keeps the request");
    }

    press(&mut controller, Command::TiltBack, 16);
    for (i, id) in PITCH_IDS.iter().enumerate() {
        assert_eq!(bus.writes_for(*id).last(), Some(&0), "id {id}");
        assert_eq!(controller.bank().arm(i).pitch.target(), -pitch);
    }

    press(&mut controller, Command::IncreaseStep, 9);
    assert_eq!(controller.state().step(), 10);
    press(&mut controller, Command::TiltRight, 6);
    let roll = (60.0 * scale_roll).round() as i32;
    for (i, id) in ROLL_IDS.iter().enumerate() {
        assert_eq!(bus.writes_for(*id).last(), Some(&4095), "id {id}");
        assert_eq!(controller.bank().arm(i).roll.target(), roll);
    }

    press(&mut controller, Command::TiltLeft, 12);
    for (i, id) in ROLL_IDS.iter().enumerate() {
        assert_eq!(bus.writes_for(*id).last(), Some(&0), "id {id}");
        assert_eq!(controller.bank().arm(i).roll.target(), -roll);
    }

    let writes = bus.writes_for(1);
    assert!(writes.iter().all(|&w| w <= 4095), "Nothing wraps on the wire");
}

/// Run one sweep with room on every servo so no sample is clamped, and
/// compare each channel's writes with the mapping of every sample.
fn check_sweep_follows_mapping(command: Command, kind: SweepKind) -> SimulatedBus {
    const START: i32 = 100_000;
    let mut config = instant_config();
    config.sweep.step_deg = 7;
    config.actuators.position_max = 1_048_575;
    let bus = SimulatedBus::with_positions(ROLL_IDS.iter().chain(&PITCH_IDS).map(|&id| (id, START)));
    let mut transport = bus.clone();
    let bank = ActuatorBank::connect(
        &mut transport,
        &config,
        &DiagnosticLog::default(),
        &TransportMetrics::new(),
    );
    let mut controller = Controller::new(bank, &config);
    let geometry = controller.geometry().clone();
    let profile = *controller.profile();

    press(&mut controller, command, 1);

    for arm in 0..6 {
        let expected: Vec<ArmTargets> = profile
            .sequence()
            .map(|s| geometry.map_targets(kind.mapping(), s.tilt, arm).unwrap())
            .collect();
        let roll: Vec<u32> = expected.iter().map(|t| (START + t.roll) as u32).collect();
        let pitch: Vec<u32> = expected.iter().map(|t| (START + t.pitch) as u32).collect();
        assert_eq!(bus.writes_for(ROLL_IDS[arm]), roll, "{kind:?} roll, arm {}", arm + 1);
        assert_eq!(bus.writes_for(PITCH_IDS[arm]), pitch, "{kind:?} pitch, arm {}", arm + 1);
    }
    bus
}

#[test]
fn test_origin_sweep_moves_every_arm_alike() {
    let bus = check_sweep_follows_mapping(Command::SweepOrigin, SweepKind::Origin);
    for arm in 1..6 {
        assert_eq!(bus.writes_for(ROLL_IDS[arm]), bus.writes_for(ROLL_IDS[0]));
        assert_eq!(bus.writes_for(PITCH_IDS[arm]), bus.writes_for(PITCH_IDS[0]));
    }
}

#[test]
fn test_body_sweep_resolves_per_arm() {
    let bus = check_sweep_follows_mapping(Command::SweepBody, SweepKind::Body);
    assert_ne!(
        bus.writes_for(PITCH_IDS[0]),
        bus.writes_for(PITCH_IDS[1]),
        "Opposite arms pitch in opposite directions"
    );
}

#[test]
fn test_stop_cancels_sweep_at_sample_boundary() {
    let bus = SimulatedBus::new();
    let mut controller = controller_on(&bus);
    let mut input = ChannelSource::from_commands([Command::Stop]);

    let flow = controller.handle(Command::SweepOrigin, &mut input).unwrap();

    assert_eq!(flow, Flow::Continue);
    assert_eq!(controller.state().mode(), Mode::Idle);
    assert_eq!(bus.writes_for(1).len(), 1, "Only the settle sample went out");
}

#[test]
fn test_commands_during_sweep_are_deferred() {
    let bus = SimulatedBus::new();
    let mut controller = controller_on(&bus);
    let mut input = ChannelSource::from_commands([
        Command::SweepOrigin,
        Command::SelectActuator(arm(3)),
        Command::TiltForward,
    ]);

    let mut ticks = Vec::new();
    let report = controller
        .run(&mut input, |c, command| ticks.push((command, c.state().mode())))
        .unwrap();

    assert_eq!(
        ticks,
        vec![
            (Command::SweepOrigin, Mode::Idle),
            (Command::SelectActuator(arm(3)), Mode::SingleActuator(arm(3))),
            (Command::TiltForward, Mode::SingleActuator(arm(3))),
        ]
    );
    assert_eq!(bus.writes_for(1).len(), 88, "Sweep ran to completion");
    assert_eq!(bus.writes_for(13).last(), Some(&(2048 + 290)));
    assert_eq!(report.released, 12);
}

#[test]
fn test_quit_releases_every_link_once() {
    let bus = SimulatedBus::new();
    let mut controller = controller_on(&bus);
    let mut input = ChannelSource::from_commands([
        Command::SelectBody,
        Command::TiltRight,
        Command::Quit,
        Command::TiltRight,
    ]);

    let report = controller.run(&mut input, |_, _| {}).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.released, 12);

    drop(controller);
    for id in ROLL_IDS.iter().chain(&PITCH_IDS) {
        assert!(!bus.torque(*id), "id {id} still engaged");
        assert_eq!(bus.open_count(*id), 1);
        assert_eq!(bus.close_count(*id), 1, "id {id}");
    }
}

#[test]
fn test_quit_during_sweep() {
    let bus = SimulatedBus::new();
    let mut controller = controller_on(&bus);
    let mut input = ChannelSource::from_commands([Command::SweepBody, Command::Quit]);

    let report = controller.run(&mut input, |_, _| {}).unwrap();

    assert_eq!(report.released, 12);
    assert_eq!(controller.state().mode(), Mode::Idle);
    assert_eq!(bus.writes_for(11).len(), 1);
    assert!(ROLL_IDS.iter().all(|id| bus.close_count(*id) == 1));
}

#[test]
fn test_dropping_controller_releases_bank() {
    let bus = SimulatedBus::new();
    let controller = controller_on(&bus);
    assert!(bus.torque(1));
    drop(controller);
    assert!(ROLL_IDS.iter().chain(&PITCH_IDS).all(|id| bus.close_count(*id) == 1));
    assert!(!bus.torque(16));
}

#[test]
fn test_status_display_lists_every_arm() {
    let bus = SimulatedBus::with_positions([(1, 1000)]);
    let controller = controller_on(&bus);

    let status = render_status(controller.state(), controller.bank());
    assert!(status.starts_with("Mode: idle"));
    assert!(status.contains("Status 1: 1000/0/1000 2048/0/2048"));
    assert!(status.contains("Status 6:"));
}

// ============================================================================
// INPUT TESTS
// ============================================================================

#[test]
fn test_key_map() {
    assert_eq!(Command::from_char('0'), Command::SelectUniform);
    assert_eq!(Command::from_char('9'), Command::SelectBody);
    assert_eq!(Command::from_char('q'), Command::SweepOrigin);
    assert_eq!(Command::from_char('w'), Command::SweepBody);
    assert_eq!(Command::from_char('-'), Command::ZeroAll);
    assert_eq!(Command::from_char('5'), Command::SelectActuator(arm(5)));
    assert_eq!(Command::from_char('7'), Command::Unrecognized);
    assert_eq!(Command::from_char('m'), Command::Calibrate);
    assert_eq!(Command::from_char(' '), Command::Stop);
    assert_eq!(Command::from_char('\u{1b}'), Command::Quit);
}

#[test]
fn test_terminal_keys() {
    use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert_eq!(Command::from_key(&ctrl_c), Some(Command::Quit));
    let up = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
    assert_eq!(Command::from_key(&up), Some(Command::TiltForward));
    let mut release = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
    release.kind = KeyEventKind::Release;
    assert_eq!(Command::from_key(&release), None);
}

#[test]
fn test_parse_script() {
    let commands = Command::parse_script("3 ii\nstop  quit x");
    assert_eq!(
        commands,
        vec![
            Command::SelectActuator(arm(3)),
            Command::TiltForward,
            Command::TiltForward,
            Command::Stop,
            Command::Quit,
            Command::Unrecognized,
        ]
    );
}

#[test]
fn test_channel_source_reads_disconnect_as_quit() {
    use hexatilt::input::CommandSource;

    let channels = CommandChannels::new(4);
    let mut source = channels.source();
    channels.command_tx.send(Command::Calibrate).unwrap();
    assert_eq!(source.next_command().unwrap(), Command::Calibrate);
    assert_eq!(source.poll_command(Duration::from_millis(5)).unwrap(), None);

    drop(channels);
    assert_eq!(source.next_command().unwrap(), Command::Quit);
}

#[test]
fn test_script_feeder_drives_controller() {
    let bus = SimulatedBus::new();
    let mut controller = controller_on(&bus);
    let (mut source, handle) = spawn_script_feeder(
        Command::parse_script("0 ll"),
        Duration::from_millis(1),
    );

    let report = controller.run(&mut source, |_, _| {}).unwrap();

    assert_eq!(handle.join().unwrap(), 3);
    assert_eq!(report.released, 12);
    assert_eq!(controller.state().tilt(), Tilt::new(2.0, 0.0));
    assert_eq!(bus.writes_for(4).last(), Some(&(2048 + 76)));
}

// ============================================================================
// CONFIG TESTS
// ============================================================================

#[test]
fn test_partial_config_takes_defaults() {
    let config = RuntimeConfig::from_toml_str("[bus]\nbaud = 1000000\n", "inline").unwrap();
    assert_eq!(config.bus.baud, 1_000_000);
    assert_eq!(config.bus.device, "/dev/ttyUSB0");
    assert_eq!(config.actuators.pitch_ids, PITCH_IDS.to_vec());
    assert_eq!(config.sweep_profile(), SweepProfile::default());
}

#[test]
fn test_invalid_config_rejected() {
    assert!(RuntimeConfig::from_toml_str("[actuators]\nroll_ids = [1, 2, 3]\n", "inline").is_err());
    assert!(RuntimeConfig::from_toml_str("[sweep]\nstep_deg = 0\n", "inline").is_err());
    assert!(RuntimeConfig::from_toml_str("[control]\nmin_step = 0\n", "inline").is_err());
    assert!(RuntimeConfig::from_toml_str("[bus\n", "inline").is_err());
}

#[test]
fn test_printed_config_loads_back() {
    let config = RuntimeConfig::default();
    let text = config.to_toml_string().unwrap();
    assert_eq!(RuntimeConfig::from_toml_str(&text, "printed").unwrap(), config);
}

#[test]
fn test_missing_config_file_means_defaults() {
    let config = hexatilt::load_config("does/not/exist.toml").unwrap();
    assert_eq!(config, RuntimeConfig::default());
}

#[test]
fn test_sample_config_matches_defaults() {
    let config = hexatilt::load_config("config/hexatilt.toml").unwrap();
    let defaults = RuntimeConfig::default();
    assert_eq!(config.bus, defaults.bus);
    assert_eq!(config.actuators, defaults.actuators);
    assert_eq!(config.sweep, defaults.sweep);
    assert_eq!(config.control, defaults.control);
    assert!((config.geometry.scale_roll - defaults.geometry.scale_roll).abs() < 1e-9);
    assert!((config.geometry.scale_pitch - defaults.geometry.scale_pitch).abs() < 1e-9);

    let wide = RuntimeConfig::from_toml_str("[actuators]\nposition_max = 1048575\n", "inline").unwrap();
    assert_eq!(wide.limits().max(), 1_048_575);
}
