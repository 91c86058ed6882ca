#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing or validation may reject the input, but neither may panic.
    match sonar_config::load_toml(data) {
        Ok(cfg) => {
            let _ = cfg.validate();
        }
        Err(_e) => {}
    }
});
