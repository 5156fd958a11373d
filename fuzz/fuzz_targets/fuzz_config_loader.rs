#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validate errors are fine; panics are not.
    if let Ok(cfg) = potvol_config::load_toml(data) {
        let _ = cfg.validate();
        let _ = cfg.adc.resolved_path();
    }
});
