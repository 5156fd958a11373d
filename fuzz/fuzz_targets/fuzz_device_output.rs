#![no_main]
use libfuzzer_sys::fuzz_target;
use potvol_hardware::pactl::{is_sink_event, parse_sink_mute, parse_sink_volumes};
use potvol_hardware::saradc::parse_adc_value;

fuzz_target!(|data: &[u8]| {
    // Whatever sysfs or pactl print, parsing must not panic.
    let _ = parse_adc_value(data);
    let text = String::from_utf8_lossy(data);
    let _ = parse_sink_volumes(&text);
    let _ = parse_sink_mute(&text);
    let _ = is_sink_event(&text);
});
