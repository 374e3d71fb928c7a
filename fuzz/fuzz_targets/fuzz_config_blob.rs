//! Fuzz target: persisted configuration blobs
//!
//! Decodes arbitrary bytes as a stored module configuration and verifies:
//! - No panics on malformed or truncated blobs
//! - Any blob that decodes and validates drives a service without panicking
//! - Re-encoding a valid config decodes to the same value
//!
//! cargo fuzz run fuzz_config_blob

#![no_main]

use iochan::config::ModuleConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = postcard::from_bytes::<ModuleConfig>(data) else {
        return;
    };
    if config.validate().is_err() {
        return;
    }

    let encoded = postcard::to_allocvec(&config).expect("encode valid config");
    let decoded: ModuleConfig = postcard::from_bytes(&encoded).expect("decode re-encoded config");
    assert_eq!(decoded, config);

    let _ = iochan::app::service::ChannelService::new(config);
});
