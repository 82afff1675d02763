//! Reaction analytics over flattened report records.
//!
//! These back the exploration views next to the graph: which drugs are most
//! reported for an indication, which reactions dominate, and how reports are
//! spread over patient sex, onset age and time.

use crate::dates::parse_report_date;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_TOP_DRUGS: usize = 20;
pub const DEFAULT_REACTION_LIMIT: usize = 10;

/// One drug/reaction row of an adverse-event report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub report_id: String,
    pub drug_name: Option<String>,
    pub indication: Option<String>,
    pub reaction: Option<String>,
    pub patient_sex: Option<String>,
    pub onset_age: Option<f64>,
    pub receipt_date: Option<String>,
    pub serious: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionProfile {
    /// Most reported reactions, count descending.
    pub top: Vec<LabelCount>,
    /// Least reported reactions, count descending.
    pub bottom: Vec<LabelCount>,
    /// Largest reaction count, at least 1 (shared axis range for both lists).
    pub max_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicationReport {
    pub indication: String,
    pub drug: Option<String>,
    pub top_drugs: Vec<LabelCount>,
    pub reactions: ReactionProfile,
    pub sex_distribution: Vec<LabelCount>,
    pub onset_ages: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySeverity {
    /// `YYYY-MM`
    pub month: String,
    pub serious: String,
    pub reports: usize,
}

/// Count labels, ordered by count descending then label ascending.
fn ranked_counts<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<LabelCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut ranked: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|x, y| y.count.cmp(&x.count).then_with(|| x.label.cmp(&y.label)));
    ranked
}

fn for_indication<'a>(
    records: &'a [ReactionRecord],
    indication: &'a str,
) -> impl Iterator<Item = &'a ReactionRecord> + 'a {
    records
        .iter()
        .filter(move |r| r.indication.as_deref() == Some(indication))
}

fn for_indication_and_drug<'a>(
    records: &'a [ReactionRecord],
    indication: &'a str,
    drug: Option<&'a str>,
) -> impl Iterator<Item = &'a ReactionRecord> + 'a {
    for_indication(records, indication)
        .filter(move |r| drug.map_or(true, |d| r.drug_name.as_deref() == Some(d)))
}

/// Most frequently reported drugs for one indication.
pub fn top_drugs_for_indication(
    records: &[ReactionRecord],
    indication: &str,
    limit: usize,
) -> Vec<LabelCount> {
    let mut ranked = ranked_counts(
        for_indication(records, indication).filter_map(|r| r.drug_name.as_deref()),
    );
    ranked.truncate(limit);
    ranked
}

/// Top and bottom reaction counts for an indication, optionally for one drug.
pub fn reaction_profile(
    records: &[ReactionRecord],
    indication: &str,
    drug: Option<&str>,
    limit: usize,
) -> ReactionProfile {
    let ranked = ranked_counts(
        for_indication_and_drug(records, indication, drug).filter_map(|r| r.reaction.as_deref()),
    );
    let max_count = ranked.first().map_or(1, |c| c.count.max(1));
    let top = ranked.iter().take(limit).cloned().collect();
    let bottom = ranked[ranked.len().saturating_sub(limit)..].to_vec();
    ReactionProfile {
        top,
        bottom,
        max_count,
    }
}

pub fn sex_distribution(
    records: &[ReactionRecord],
    indication: &str,
    drug: Option<&str>,
) -> Vec<LabelCount> {
    ranked_counts(
        for_indication_and_drug(records, indication, drug).filter_map(|r| r.patient_sex.as_deref()),
    )
}

/// Positive onset ages, in record order.
pub fn onset_ages(records: &[ReactionRecord], indication: &str, drug: Option<&str>) -> Vec<f64> {
    for_indication_and_drug(records, indication, drug)
        .filter_map(|r| r.onset_age)
        .filter(|age| *age > 0.0)
        .collect()
}

pub fn indication_report(
    records: &[ReactionRecord],
    indication: &str,
    drug: Option<&str>,
) -> IndicationReport {
    IndicationReport {
        indication: indication.to_string(),
        drug: drug.map(str::to_string),
        top_drugs: top_drugs_for_indication(records, indication, DEFAULT_TOP_DRUGS),
        reactions: reaction_profile(records, indication, drug, DEFAULT_REACTION_LIMIT),
        sex_distribution: sex_distribution(records, indication, drug),
        onset_ages: onset_ages(records, indication, drug),
    }
}

/// Report rows per month and seriousness for the given drugs, months ascending.
///
/// Rows whose receipt date cannot be read are skipped.
pub fn monthly_severity<S: AsRef<str>>(
    records: &[ReactionRecord],
    drugs: &[S],
) -> Vec<MonthlySeverity> {
    let mut buckets: BTreeMap<(String, String), usize> = BTreeMap::new();
    for record in records {
        let Some(drug) = record.drug_name.as_deref() else {
            continue;
        };
        if !drugs.iter().any(|d| d.as_ref() == drug) {
            continue;
        }
        let Some(date) = record
            .receipt_date
            .as_deref()
            .and_then(|raw| parse_report_date(raw).ok())
        else {
            continue;
        };
        let serious = record
            .serious
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        *buckets
            .entry((date.format("%Y-%m").to_string(), serious))
            .or_default() += 1;
    }

    buckets
        .into_iter()
        .map(|((month, serious), reports)| MonthlySeverity {
            month,
            serious,
            reports,
        })
        .collect()
}
