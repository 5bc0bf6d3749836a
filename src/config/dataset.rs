//! Table and column names of the fishery dataset.
//!
//! Every component receives an `Arc<DatasetConfig>` at construction time, so
//! tests can run the whole pipeline against alternate table names.

use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Configuration key '{0}' is missing or empty")]
pub struct ConfigurationKeyMissing(pub &'static str);

/// The three imported, per-region metric tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawTable {
    EmploymentTrend,
    EconomicImportance,
    Productivity,
}

impl RawTable {
    pub const ALL: [RawTable; 3] = [
        RawTable::EmploymentTrend,
        RawTable::EconomicImportance,
        RawTable::Productivity,
    ];

    /// Path segment used by the HTTP routes.
    pub fn slug(&self) -> &'static str {
        match self {
            RawTable::EmploymentTrend => "andamento-occupazione",
            RawTable::EconomicImportance => "importanza-economica",
            RawTable::Productivity => "produttivita",
        }
    }
}

/// The five series computed from the raw tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DerivedSeries {
    MacroRegionEmploymentMean,
    NationalEmploymentMean,
    MacroRegionValueAddedMean,
    MacroRegionProductivityTotal,
    NationalProductivityTotal,
}

impl DerivedSeries {
    pub const ALL: [DerivedSeries; 5] = [
        DerivedSeries::MacroRegionEmploymentMean,
        DerivedSeries::NationalEmploymentMean,
        DerivedSeries::MacroRegionValueAddedMean,
        DerivedSeries::MacroRegionProductivityTotal,
        DerivedSeries::NationalProductivityTotal,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            DerivedSeries::MacroRegionEmploymentMean => "media-occupazione-macroaree",
            DerivedSeries::NationalEmploymentMean => "media-occupazione-nazionale",
            DerivedSeries::MacroRegionValueAddedMean => "media-valore-aggiunto-macroaree",
            DerivedSeries::MacroRegionProductivityTotal => "produttivita-macroaree",
            DerivedSeries::NationalProductivityTotal => "produttivita-nazionale",
        }
    }

    /// The raw table this series is computed from.
    pub fn source(&self) -> RawTable {
        match self {
            DerivedSeries::MacroRegionEmploymentMean | DerivedSeries::NationalEmploymentMean => {
                RawTable::EmploymentTrend
            }
            DerivedSeries::MacroRegionValueAddedMean => RawTable::EconomicImportance,
            DerivedSeries::MacroRegionProductivityTotal
            | DerivedSeries::NationalProductivityTotal => RawTable::Productivity,
        }
    }

    pub fn is_macro_region(&self) -> bool {
        matches!(
            self,
            DerivedSeries::MacroRegionEmploymentMean
                | DerivedSeries::MacroRegionValueAddedMean
                | DerivedSeries::MacroRegionProductivityTotal
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    pub year_column: String,
    pub region_column: String,
    pub macro_region_column: String,

    pub employment_table: String,
    pub employment_column: String,
    pub economic_importance_table: String,
    pub value_added_column: String,
    pub productivity_table: String,
    pub productivity_column: String,

    pub macro_employment_mean_table: String,
    pub macro_employment_mean_column: String,
    pub national_employment_mean_table: String,
    pub national_employment_mean_column: String,
    pub macro_value_added_mean_table: String,
    pub macro_value_added_mean_column: String,
    pub macro_productivity_total_table: String,
    pub macro_productivity_total_column: String,
    pub national_productivity_total_table: String,
    pub national_productivity_total_column: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            year_column: "Anno".to_string(),
            region_column: "Regione".to_string(),
            macro_region_column: "Macro Area".to_string(),

            employment_table: "Andamento-occupazione-del-settore-della-pesca-per-regione"
                .to_string(),
            employment_column: "Variazione percentuale unita di lavoro della pesca".to_string(),
            economic_importance_table: "Importanza-economica-del-settore-della-pesca-per-regione"
                .to_string(),
            value_added_column: "Percentuale valore aggiunto pesca-piscicoltura-servizi"
                .to_string(),
            productivity_table: "Produttivita-del-settore-della-pesca-per-regione".to_string(),
            productivity_column: "Produttivita in migliaia di euro".to_string(),

            macro_employment_mean_table: "Medie_Macroaree_Andamento_Occupazione_Pesca"
                .to_string(),
            macro_employment_mean_column: "Media_Macroarea_Variazione_Percentuale_Occupazione"
                .to_string(),
            national_employment_mean_table: "Media_Nazionale_Andamento_Occupazione_Pesca"
                .to_string(),
            national_employment_mean_column: "Media_Nazionale_Variazione_Percentuale_Occupazione"
                .to_string(),
            macro_value_added_mean_table: "Medie_Macroaree_Valore_Aggiunto_Pesca".to_string(),
            macro_value_added_mean_column: "Media_Macroarea_Percentuale_Valore_Aggiunto"
                .to_string(),
            macro_productivity_total_table: "Produttivita_Totale_MacroAree_Pesca".to_string(),
            macro_productivity_total_column: "Produttivita_Totale_Macroarea_Migliaia_Euro"
                .to_string(),
            national_productivity_total_table: "Produttivita_Totale_Nazionale_Pesca".to_string(),
            national_productivity_total_column: "Produttivita_Totale_Nazionale_Migliaia_Euro"
                .to_string(),
        }
    }
}

impl DatasetConfig {
    pub fn raw_table(&self, table: RawTable) -> &str {
        match table {
            RawTable::EmploymentTrend => &self.employment_table,
            RawTable::EconomicImportance => &self.economic_importance_table,
            RawTable::Productivity => &self.productivity_table,
        }
    }

    pub fn raw_value_column(&self, table: RawTable) -> &str {
        match table {
            RawTable::EmploymentTrend => &self.employment_column,
            RawTable::EconomicImportance => &self.value_added_column,
            RawTable::Productivity => &self.productivity_column,
        }
    }

    pub fn derived_table(&self, series: DerivedSeries) -> &str {
        match series {
            DerivedSeries::MacroRegionEmploymentMean => &self.macro_employment_mean_table,
            DerivedSeries::NationalEmploymentMean => &self.national_employment_mean_table,
            DerivedSeries::MacroRegionValueAddedMean => &self.macro_value_added_mean_table,
            DerivedSeries::MacroRegionProductivityTotal => &self.macro_productivity_total_table,
            DerivedSeries::NationalProductivityTotal => &self.national_productivity_total_table,
        }
    }

    pub fn derived_value_column(&self, series: DerivedSeries) -> &str {
        match series {
            DerivedSeries::MacroRegionEmploymentMean => &self.macro_employment_mean_column,
            DerivedSeries::NationalEmploymentMean => &self.national_employment_mean_column,
            DerivedSeries::MacroRegionValueAddedMean => &self.macro_value_added_mean_column,
            DerivedSeries::MacroRegionProductivityTotal => &self.macro_productivity_total_column,
            DerivedSeries::NationalProductivityTotal => &self.national_productivity_total_column,
        }
    }

    /// Returns the raw table whose configured name is exactly `name`.
    pub fn raw_table_by_name(&self, name: &str) -> Option<RawTable> {
        RawTable::ALL
            .into_iter()
            .find(|table| self.raw_table(*table) == name)
    }

    /// Every configured table and column name. The store refuses to put any
    /// other identifier into query text it builds from caller input.
    pub fn identifier_allow_list(&self) -> HashSet<String> {
        let mut names: HashSet<String> = [
            &self.year_column,
            &self.region_column,
            &self.macro_region_column,
        ]
        .into_iter()
        .cloned()
        .collect();
        for table in RawTable::ALL {
            names.insert(self.raw_table(table).to_string());
            names.insert(self.raw_value_column(table).to_string());
        }
        for series in DerivedSeries::ALL {
            names.insert(self.derived_table(series).to_string());
            names.insert(self.derived_value_column(series).to_string());
        }
        names
    }

    /// Applies the non-`None` overrides of a `[dataset]` TOML section.
    /// Empty strings are rejected rather than silently producing unnamed tables.
    pub fn with_overrides(
        mut self,
        overrides: &DatasetOverrides,
    ) -> Result<Self, ConfigurationKeyMissing> {
        macro_rules! apply {
            ($field:ident) => {
                if let Some(value) = &overrides.$field {
                    if value.trim().is_empty() {
                        return Err(ConfigurationKeyMissing(stringify!($field)));
                    }
                    self.$field = value.clone();
                }
            };
        }

        apply!(year_column);
        apply!(region_column);
        apply!(macro_region_column);
        apply!(employment_table);
        apply!(employment_column);
        apply!(economic_importance_table);
        apply!(value_added_column);
        apply!(productivity_table);
        apply!(productivity_column);
        apply!(macro_employment_mean_table);
        apply!(macro_employment_mean_column);
        apply!(national_employment_mean_table);
        apply!(national_employment_mean_column);
        apply!(macro_value_added_mean_table);
        apply!(macro_value_added_mean_column);
        apply!(macro_productivity_total_table);
        apply!(macro_productivity_total_column);
        apply!(national_productivity_total_table);
        apply!(national_productivity_total_column);

        Ok(self)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DatasetOverrides {
    pub year_column: Option<String>,
    pub region_column: Option<String>,
    pub macro_region_column: Option<String>,
    pub employment_table: Option<String>,
    pub employment_column: Option<String>,
    pub economic_importance_table: Option<String>,
    pub value_added_column: Option<String>,
    pub productivity_table: Option<String>,
    pub productivity_column: Option<String>,
    pub macro_employment_mean_table: Option<String>,
    pub macro_employment_mean_column: Option<String>,
    pub national_employment_mean_table: Option<String>,
    pub national_employment_mean_column: Option<String>,
    pub macro_value_added_mean_table: Option<String>,
    pub macro_value_added_mean_column: Option<String>,
    pub macro_productivity_total_table: Option<String>,
    pub macro_productivity_total_column: Option<String>,
    pub national_productivity_total_table: Option<String>,
    pub national_productivity_total_column: Option<String>,
}
