use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use serde::Serialize;

use crate::workflows::portfolio::{Gift, TrustId};

/// Per-donor, per-beneficiary annual gift tax exclusion by tax year.
const ANNUAL_EXCLUSIONS: &[(i32, f64)] = &[
    (2023, 17_000.0),
    (2024, 18_000.0),
    (2025, 19_000.0),
    (2026, 19_000.0),
];

const UNDESIGNATED_BENEFICIARY: &str = "N/A";

/// Exclusion for `year`; years outside the table use the latest earlier entry, else the earliest.
pub fn annual_exclusion(year: i32) -> f64 {
    ANNUAL_EXCLUSIONS
        .iter()
        .rev()
        .find(|(table_year, _)| *table_year <= year)
        .or_else(|| ANNUAL_EXCLUSIONS.first())
        .map(|(_, amount)| *amount)
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GiftFilter {
    pub year: Option<i32>,
    /// Case-insensitive substring of the donor name.
    pub donor: Option<String>,
    pub trust_id: Option<TrustId>,
}

impl GiftFilter {
    pub fn matches(&self, gift: &Gift) -> bool {
        if self.year.is_some_and(|year| gift.gift_date.year() != year) {
            return false;
        }
        if let Some(trust_id) = &self.trust_id {
            if &gift.trust_id != trust_id {
                return false;
            }
        }
        match self.donor.as_deref().map(str::trim) {
            Some(donor) if !donor.is_empty() => gift
                .donor_name
                .to_lowercase()
                .contains(&donor.to_lowercase()),
            _ => true,
        }
    }
}

/// A gift joined with the names the report prints.
#[derive(Debug, Clone)]
pub struct LabelledGift {
    pub gift: Gift,
    pub trust_name: String,
    pub beneficiary_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GiftSummaryRow {
    pub tax_year: i32,
    pub donor_name: String,
    pub donor_email: Option<String>,
    pub beneficiary_name: String,
    pub trust_name: String,
    pub total_gifts: f64,
    pub gift_count: usize,
    pub annual_exclusion: f64,
    pub exceeds_exclusion: bool,
    pub excess_amount: f64,
    pub requires_form_709: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTotals {
    pub total_donors: usize,
    pub total_beneficiaries: usize,
    pub total_gift_amount: f64,
    pub gifts_exceeding_exclusion: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GiftTaxSummary {
    pub tax_year: Option<i32>,
    /// Exclusion for the requested year, or for the reporting year when unfiltered.
    pub annual_exclusion: f64,
    pub summary: Vec<GiftSummaryRow>,
    pub totals: SummaryTotals,
}

type GroupKey = (String, String, String, i32);

/// Groups gifts by donor, beneficiary, trust, and tax year and flags groups over the exclusion.
pub fn summarize(
    gifts: impl IntoIterator<Item = LabelledGift>,
    tax_year: Option<i32>,
    reporting_year: i32,
) -> GiftTaxSummary {
    let mut groups: BTreeMap<GroupKey, GiftSummaryRow> = BTreeMap::new();

    for labelled in gifts {
        let year = labelled.gift.gift_date.year();
        let beneficiary = labelled
            .beneficiary_name
            .unwrap_or_else(|| UNDESIGNATED_BENEFICIARY.to_string());
        let key = (
            labelled.gift.donor_name.clone(),
            beneficiary.clone(),
            labelled.trust_name.clone(),
            year,
        );
        let row = groups.entry(key).or_insert_with(|| GiftSummaryRow {
            tax_year: year,
            donor_name: labelled.gift.donor_name.clone(),
            donor_email: None,
            beneficiary_name: beneficiary,
            trust_name: labelled.trust_name.clone(),
            total_gifts: 0.0,
            gift_count: 0,
            annual_exclusion: annual_exclusion(year),
            exceeds_exclusion: false,
            excess_amount: 0.0,
            requires_form_709: false,
        });
        row.total_gifts += labelled.gift.amount;
        row.gift_count += 1;
        if row.donor_email.is_none() {
            row.donor_email = labelled.gift.donor_email;
        }
    }

    let summary: Vec<GiftSummaryRow> = groups
        .into_values()
        .map(|mut row| {
            row.exceeds_exclusion = row.total_gifts > row.annual_exclusion;
            row.excess_amount = if row.exceeds_exclusion {
                row.total_gifts - row.annual_exclusion
            } else {
                0.0
            };
            row.requires_form_709 = row.exceeds_exclusion;
            row
        })
        .collect();

    let totals = SummaryTotals {
        total_donors: distinct(summary.iter().map(|row| row.donor_name.as_str())),
        total_beneficiaries: distinct(summary.iter().map(|row| row.beneficiary_name.as_str())),
        total_gift_amount: summary.iter().map(|row| row.total_gifts).sum(),
        gifts_exceeding_exclusion: summary.iter().filter(|row| row.exceeds_exclusion).count(),
    };

    GiftTaxSummary {
        tax_year,
        annual_exclusion: annual_exclusion(tax_year.unwrap_or(reporting_year)),
        summary,
        totals,
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> usize {
    values.collect::<BTreeSet<_>>().len()
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Tax Year")]
    tax_year: i32,
    #[serde(rename = "Donor Name")]
    donor_name: &'a str,
    #[serde(rename = "Donor Email")]
    donor_email: &'a str,
    #[serde(rename = "Beneficiary")]
    beneficiary: &'a str,
    #[serde(rename = "Trust")]
    trust: &'a str,
    #[serde(rename = "Total Gifts")]
    total_gifts: String,
    #[serde(rename = "Gift Count")]
    gift_count: usize,
    #[serde(rename = "Annual Exclusion")]
    annual_exclusion: String,
    #[serde(rename = "Excess Amount")]
    excess_amount: String,
    #[serde(rename = "Requires 709")]
    requires_form_709: &'static str,
}

const CSV_HEADER: [&str; 10] = [
    "Tax Year",
    "Donor Name",
    "Donor Email",
    "Beneficiary",
    "Trust",
    "Total Gifts",
    "Gift Count",
    "Annual Exclusion",
    "Excess Amount",
    "Requires 709",
];

/// Renders the summary rows as CSV for a tax preparer. An empty summary still carries the header.
pub fn to_csv(summary: &GiftTaxSummary) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for row in &summary.summary {
        writer.serialize(CsvRow {
            tax_year: row.tax_year,
            donor_name: &row.donor_name,
            donor_email: row.donor_email.as_deref().unwrap_or_default(),
            beneficiary: &row.beneficiary_name,
            trust: &row.trust_name,
            total_gifts: format!("{:.2}", row.total_gifts),
            gift_count: row.gift_count,
            annual_exclusion: format!("{:.2}", row.annual_exclusion),
            excess_amount: format!("{:.2}", row.excess_amount),
            requires_form_709: if row.requires_form_709 { "Yes" } else { "No" },
        })?;
    }

    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}
