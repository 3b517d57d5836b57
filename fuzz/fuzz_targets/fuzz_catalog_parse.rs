//! Fuzz target for machine catalog parsing and validation.
//!
//! Catalogs are user-supplied files; parsing and validation must reject bad
//! input with an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sl_config::{validate_catalog_all, MachineCatalog};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(catalog) = MachineCatalog::from_str(s) {
            let _ = validate_catalog_all(&catalog);
        }
    }
});
