#![no_main]

use fontlab_bind::Bindings;
use fontlab_panel::PanelConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    for config in [PanelConfig::from_toml_str(text), PanelConfig::from_json_str(text)]
        .into_iter()
        .flatten()
    {
        let _ = config.apply(&Bindings::new());
    }
});
