//! Legacy Cargo license notation
//!
//! Old Cargo manifests used `/` to separate alternative licenses
//! (`MIT/Apache-2.0`). The only meaning `/` ever had there is SPDX `OR`.

/// Rewrite a legacy `A/B` license string into SPDX `A OR B`.
///
/// This is a plain textual substitution and must run before parsing.
pub fn to_standard_dialect(legacy: &str) -> String {
    legacy.replace('/', " OR ")
}
