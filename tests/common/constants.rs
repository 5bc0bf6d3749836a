//! Shared constants for end-to-end tests

// ============================================================================
// Routes
// ============================================================================

pub const EMPLOYMENT_SLUG: &str = "andamento-occupazione";
pub const ECONOMIC_IMPORTANCE_SLUG: &str = "importanza-economica";
pub const PRODUCTIVITY_SLUG: &str = "produttivita";

pub const MACRO_EMPLOYMENT_SLUG: &str = "media-occupazione-macroaree";
pub const NATIONAL_EMPLOYMENT_SLUG: &str = "media-occupazione-nazionale";
pub const MACRO_VALUE_ADDED_SLUG: &str = "media-valore-aggiunto-macroaree";
pub const MACRO_PRODUCTIVITY_SLUG: &str = "produttivita-macroaree";
pub const NATIONAL_PRODUCTIVITY_SLUG: &str = "produttivita-nazionale";

// ============================================================================
// Column names (default dataset)
// ============================================================================

pub const YEAR: &str = "Anno";
pub const REGION: &str = "Regione";
pub const MACRO_AREA: &str = "Macro Area";
pub const EMPLOYMENT_VALUE: &str = "Variazione percentuale unita di lavoro della pesca";
pub const NATIONAL_EMPLOYMENT_VALUE: &str = "Media_Nazionale_Variazione_Percentuale_Occupazione";
pub const MACRO_EMPLOYMENT_VALUE: &str = "Media_Macroarea_Variazione_Percentuale_Occupazione";
pub const MACRO_VALUE_ADDED_VALUE: &str = "Media_Macroarea_Percentuale_Valore_Aggiunto";
pub const MACRO_PRODUCTIVITY_VALUE: &str = "Produttivita_Totale_Macroarea_Migliaia_Euro";
pub const NATIONAL_PRODUCTIVITY_VALUE: &str = "Produttivita_Totale_Nazionale_Migliaia_Euro";

// ============================================================================
// Timeouts
// ============================================================================

pub const REQUEST_TIMEOUT_SECS: u64 = 10;
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
