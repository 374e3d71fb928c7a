//! Round-robin pulse generation through the service loop.

use iochan::action::ActionId;
use iochan::channel::{ChannelId, NUM_CHANNELS, TimerId};
use iochan::config::{ChannelConfig, ChannelKind, ModuleConfig, MultiParams};

use crate::mock_hw::{MockStore, Rig, TimerCall, ch};

fn all_servo() -> ModuleConfig {
    let mut config = ModuleConfig::default();
    for c in ChannelId::all() {
        config.set_channel(c, ChannelConfig::default_for(ChannelKind::Servo));
    }
    config
}

#[test]
fn every_moving_channel_pulses_once_per_frame() {
    let mut rig = Rig::new(all_servo());
    for c in ChannelId::all() {
        rig.send(ActionId::consumer(c, 1));
    }
    rig.run_ms(200);
    for c in ChannelId::all() {
        assert_eq!(rig.pulses_for(c).len(), 10, "{c}");
    }
}

#[test]
fn off_channels_never_pulse() {
    let mut rig = Rig::new(all_servo());
    rig.send(ActionId::consumer(ch(7), 1));
    rig.run_ms(100);
    for c in ChannelId::all().filter(|&c| c != ch(7)) {
        assert!(rig.pulses_for(c).is_empty(), "{c}");
    }
    assert_eq!(rig.pulses_for(ch(7)).len(), 5);
}

#[test]
fn no_pin_is_left_high() {
    let mut rig = Rig::new(all_servo());
    for c in ChannelId::all().step_by(3) {
        rig.send(ActionId::consumer(c, 1));
    }
    for _ in 0..50 {
        rig.run_ms(7);
        rig.pulses.with_hardware(|hw| {
            assert_eq!(hw.pin_high, [false; NUM_CHANNELS]);
        });
    }
}

#[test]
fn wide_and_narrow_timers_agree() {
    let mut config = ModuleConfig::default();
    let multi = ChannelConfig::Multi(MultiParams { positions: [100, 0, 0, 0], count: 1 });
    config.set_channel(ch(0), multi);
    config.set_channel(ch(1), multi);
    let store = MockStore {
        values: {
            let mut v = [None; NUM_CHANNELS];
            v[0] = Some(100);
            v[1] = Some(100);
            v
        },
        commits: 0,
    };
    let mut rig = Rig::with_store(config, store);
    rig.send(ActionId::consumer(ch(0), 0));
    rig.send(ActionId::consumer(ch(1), 0));
    rig.run_ms(400);

    let expected = rig.service.config().pulse.ticks_for(100) as u32;
    let wide = rig.pulses_for(ch(0));
    let narrow = rig.pulses_for(ch(1));
    assert_eq!(wide.len(), narrow.len());
    assert!(!wide.is_empty());
    assert!(wide.iter().chain(&narrow).all(|&t| t == expected));

    // Only the narrow timer chains reloads.
    rig.pulses.with_hardware(|hw| {
        let reloads = |t: usize| {
            hw.calls
                .iter()
                .filter(|c| matches!(c, TimerCall::Reload { timer, .. } if *timer == t))
                .count()
        };
        assert_eq!(reloads(0), 0);
        assert!(reloads(1) > 0);
    });
}

#[test]
fn blocks_cycle_in_order() {
    let mut rig = Rig::new(ModuleConfig::default());
    let mut seen = Vec::new();
    for _ in 0..8 {
        rig.run_ms(5);
        seen.push(rig.pulses.active_block().index());
    }
    assert_eq!(seen, [0, 1, 2, 3, 0, 1, 2, 3]);
    assert!(TimerId::all().all(|t| rig.pulses.armed(t).is_none()));
}
