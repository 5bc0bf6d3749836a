//! Static mapping of the 20 Italian regions onto the 5 statistical macro-regions.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MacroRegion {
    NordOvest,
    NordEst,
    Centro,
    Sud,
    Isole,
}

impl MacroRegion {
    pub const ALL: [MacroRegion; 5] = [
        MacroRegion::NordOvest,
        MacroRegion::NordEst,
        MacroRegion::Centro,
        MacroRegion::Sud,
        MacroRegion::Isole,
    ];

    /// The label stored in the macro-region column of derived tables.
    pub fn label(&self) -> &'static str {
        match self {
            MacroRegion::NordOvest => "Nord-ovest",
            MacroRegion::NordEst => "Nord-est",
            MacroRegion::Centro => "Centro",
            MacroRegion::Sud => "Sud",
            MacroRegion::Isole => "Isole",
        }
    }
}

impl fmt::Display for MacroRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Region names exactly as they appear in the source files.
pub const REGIONS: [(&str, MacroRegion); 20] = [
    ("Valle d'Aosta", MacroRegion::NordOvest),
    ("Piemonte", MacroRegion::NordOvest),
    ("Liguria", MacroRegion::NordOvest),
    ("Lombardia", MacroRegion::NordOvest),
    ("Trentino-Alto Adige", MacroRegion::NordEst),
    ("Veneto", MacroRegion::NordEst),
    ("Friuli-Venezia Giulia", MacroRegion::NordEst),
    ("Emilia-Romagna", MacroRegion::NordEst),
    ("Toscana", MacroRegion::Centro),
    ("Umbria", MacroRegion::Centro),
    ("Marche", MacroRegion::Centro),
    ("Lazio", MacroRegion::Centro),
    ("Abruzzo", MacroRegion::Centro),
    ("Molise", MacroRegion::Sud),
    ("Campania", MacroRegion::Sud),
    ("Puglia", MacroRegion::Sud),
    ("Basilicata", MacroRegion::Sud),
    ("Calabria", MacroRegion::Sud),
    ("Sicilia", MacroRegion::Isole),
    ("Sardegna", MacroRegion::Isole),
];

/// Exact-match lookup; names are keys, not fuzzy labels.
pub fn macro_region_of(region: &str) -> Option<MacroRegion> {
    REGIONS
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, macro_region)| *macro_region)
}
