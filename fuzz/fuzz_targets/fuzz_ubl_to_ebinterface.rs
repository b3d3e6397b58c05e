#![no_main]

use libfuzzer_sys::fuzz_target;
use ubl2ebi::core::ConversionSettings;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parse → resolve → serialize must not panic in either mode.
        let _ = ubl2ebi::ebinterface::ubl_to_ebinterface(s, &ConversionSettings::lax());
        let _ = ubl2ebi::ebinterface::ubl_to_ebinterface(s, &ConversionSettings::strict());
    }
});
