//! Type changes, binding resets and persistence across restarts.

use iochan::action::ActionId;
use iochan::adapters::memory_store::MemoryStore;
use iochan::app::ports::{BindingKind, ConfigPort, OutputStore};
use iochan::app::service::ChannelService;
use iochan::channel::NUM_CHANNELS;
use iochan::config::{ChannelConfig, ChannelKind, ModuleConfig, ServoParams};
use iochan::motion::MotionState;
use iochan::persist::StoredOutputs;
use iochan::scheduler::PulseScheduler;
use iochan::ticks::Millis;

use crate::mock_hw::{MockBus, MockPins, MockPulseHw, Rig, ch};

#[test]
fn retyping_a_moving_servo_halts_it() {
    let mut config = ModuleConfig::default();
    config.set_channel(ch(3), ChannelConfig::default_for(ChannelKind::Servo));
    let mut rig = Rig::new(config);
    rig.send(ActionId::consumer(ch(3), 1));
    rig.run_ms(100);
    assert_eq!(rig.service.motion().channel(ch(3)).state, MotionState::Moving);

    rig.service.set_channel_kind(ch(3), ChannelKind::Input, &mut rig.pins, &mut rig.bus);
    assert_eq!(rig.service.motion().channel(ch(3)).state, MotionState::Off);
    assert_eq!(rig.service.config().kind(ch(3)), ChannelKind::Input);
    assert!(rig.service.is_config_dirty());
    assert_eq!(rig.bus.clears, [ch(3)]);
    assert_eq!(
        rig.bus.bindings,
        vec![
            (ch(3), BindingKind::Produced, ActionId(12)),
            (ch(3), BindingKind::Produced, ActionId(13)),
        ]
    );

    let before = rig.pulses_for(ch(3)).len();
    rig.run_ms(100);
    assert_eq!(rig.pulses_for(ch(3)).len(), before);

    // Inbound servo command now means nothing.
    rig.send(ActionId::consumer(ch(3), 1));
    assert_eq!(rig.service.motion().channel(ch(3)).state, MotionState::Off);
}

#[test]
fn retyped_input_is_reseeded_without_event() {
    let mut config = ModuleConfig::default();
    config.set_channel(ch(0), ChannelConfig::default_for(ChannelKind::Output));
    let mut rig = Rig::new(config);
    rig.send(ActionId::consumer(ch(0), 0));
    assert!(rig.pins.levels[0]);

    rig.service.set_channel_kind(ch(0), ChannelKind::Input, &mut rig.pins, &mut rig.bus);
    rig.run_ms(100);
    assert!(rig.bus.emitted.is_empty());
}

#[test]
fn reset_all_defaults_covers_every_channel() {
    let mut config = ModuleConfig::default();
    config.set_channel(ch(4), ChannelConfig::default_for(ChannelKind::Multi));
    config.set_channel(ch(5), ChannelConfig::default_for(ChannelKind::Bounce));
    let mut rig = Rig::new(config);
    rig.service.reset_all_defaults(&mut rig.bus);
    assert_eq!(rig.bus.clears.len(), NUM_CHANNELS);
    assert_eq!(rig.bus.bindings.len(), 2 * (NUM_CHANNELS - 1));
    assert!(rig.bus.bindings.contains(&(ch(5), BindingKind::Consumed, ActionId(85))));
    assert!(rig.bus.bindings.iter().all(|b| b.0 != ch(4)));
}

#[test]
fn config_survives_restart() {
    let mem = MemoryStore::new();
    let mut rig = Rig::new(mem.load().unwrap());
    rig.service.set_channel_kind(ch(10), ChannelKind::Bounce, &mut rig.pins, &mut rig.bus);
    assert_eq!(rig.service.save_config_if_dirty(&mem), Ok(true));

    let restored = mem.load().unwrap();
    assert_eq!(restored.kind(ch(10)), ChannelKind::Bounce);
    assert_eq!(&restored, rig.service.config());
}

#[test]
fn servo_position_survives_restart() {
    let mut config = ModuleConfig::default();
    config.set_channel(
        ch(6),
        ChannelConfig::Servo(ServoParams { start_pos: 10, end_pos: 90, on_speed: 20, off_speed: 20 }),
    );

    let mut pins = MockPins::default();
    let mut bus = MockBus::default();
    let mut store = StoredOutputs::new(MemoryStore::new());
    let pulses = PulseScheduler::new(MockPulseHw::default());

    let mut service = ChannelService::new(config.clone());
    service.start(Millis::ZERO, &mut pins, &store);
    service.handle_action(ActionId::consumer(ch(6), 1), &mut pins, &mut store);
    for t in 1..=200 {
        service.poll(Millis(t), &mut pins, &mut bus, &mut store, &pulses);
    }
    assert_eq!(store.load(ch(6)), Some(90));

    let mut store = StoredOutputs::new(store.into_inner());
    let mut service = ChannelService::new(config);
    service.start(Millis::ZERO, &mut pins, &store);
    let s = service.motion().channel(ch(6));
    assert_eq!((s.state, s.current_pos), (MotionState::Off, 90));

    // Off from the restored position crosses the midpoint once.
    bus.emitted.clear();
    service.handle_action(ActionId::consumer(ch(6), 0), &mut pins, &mut store);
    for t in 1..=200 {
        service.poll(Millis(t), &mut pins, &mut bus, &mut store, &pulses);
    }
    assert_eq!(bus.actions(), vec![(ActionId(25), true), (ActionId(24), false)]);
}

#[test]
fn whole_config_retype_resets_bindings_and_input_state() {
    let mut rig = Rig::new(ModuleConfig::default());
    rig.service.reset_all_defaults(&mut rig.bus);
    rig.bus.clears.clear();

    // Parameter updates cannot smuggle in a type change.
    let output = ChannelConfig::default_for(ChannelKind::Output);
    assert!(rig.service.set_channel_config(ch(0), output).is_err());
    assert_eq!(rig.service.config().kind(ch(0)), ChannelKind::Input);

    let mut next = rig.service.config().clone();
    next.set_channel(ch(0), output);
    rig.service.update_config(next, &mut rig.pins, &mut rig.bus).unwrap();
    assert_eq!(rig.bus.clears, [ch(0)]);
    let ch0: Vec<_> = rig.bus.bindings.iter().filter(|b| b.0 == ch(0)).copied().collect();
    assert_eq!(
        ch0,
        vec![
            (ch(0), BindingKind::Consumed, ActionId(64)),
            (ch(0), BindingKind::Consumed, ActionId(66)),
        ]
    );

    rig.send(ActionId::consumer(ch(0), 0));
    assert!(rig.pins.levels[0]);

    let mut back = rig.service.config().clone();
    back.set_channel(ch(0), ChannelConfig::default_for(ChannelKind::Input));
    rig.service.update_config(back, &mut rig.pins, &mut rig.bus).unwrap();
    rig.run_ms(100);
    assert!(rig.bus.emitted.is_empty());
    assert_eq!(rig.bus.clears, [ch(0), ch(0)]);
}

#[test]
fn whole_config_retype_halts_motion() {
    let mut config = ModuleConfig::default();
    config.set_channel(ch(3), ChannelConfig::default_for(ChannelKind::Servo));
    let mut rig = Rig::new(config);
    rig.send(ActionId::consumer(ch(3), 1));
    rig.run_ms(40);
    assert_eq!(rig.service.motion().channel(ch(3)).state, MotionState::Moving);

    let mut next = rig.service.config().clone();
    next.set_channel(ch(3), ChannelConfig::default_for(ChannelKind::Multi));
    rig.service.update_config(next, &mut rig.pins, &mut rig.bus).unwrap();
    assert_eq!(rig.service.motion().channel(ch(3)).state, MotionState::Off);
    assert!(rig.bus.bindings.iter().all(|b| b.0 != ch(3)));

    let before = rig.pulses_for(ch(3)).len();
    rig.run_ms(200);
    assert_eq!(rig.pulses_for(ch(3)).len(), before);
    assert!(rig.bus.emitted.is_empty());
}
