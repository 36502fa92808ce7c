use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use super::exclusion::{self, GiftFilter, GiftTaxSummary, LabelledGift};
use super::sufficiency::{
    assess_fund_sufficiency, lookahead_horizon, FundSufficiency, DEFAULT_LOOKAHEAD_DAYS,
};
use crate::error::FailureKind;
use crate::store::Repositories;
use crate::workflows::portfolio::{BeneficiaryId, PortfolioRepository, RepositoryError, TrustId};

/// Gift-tax filing reports and trust fund-sufficiency checks.
pub struct GiftReportService {
    portfolio: Arc<dyn PortfolioRepository>,
}

impl GiftReportService {
    pub fn new(repositories: &Repositories) -> Self {
        Self {
            portfolio: Arc::clone(&repositories.portfolio),
        }
    }

    pub fn summary(
        &self,
        filter: &GiftFilter,
        today: NaiveDate,
    ) -> Result<GiftTaxSummary, GiftReportError> {
        let gifts = match &filter.trust_id {
            Some(trust_id) => self.portfolio.gifts_for_trust(trust_id)?,
            None => self.portfolio.all_gifts()?,
        };

        let mut trust_names: HashMap<TrustId, String> = HashMap::new();
        let mut beneficiary_names: HashMap<BeneficiaryId, Option<String>> = HashMap::new();
        let mut labelled = Vec::new();

        for gift in gifts.into_iter().filter(|gift| filter.matches(gift)) {
            let trust_name = match trust_names.get(&gift.trust_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .portfolio
                        .trust(&gift.trust_id)?
                        .map(|trust| trust.name)
                        .unwrap_or_else(|| gift.trust_id.to_string());
                    trust_names.insert(gift.trust_id.clone(), name.clone());
                    name
                }
            };
            let beneficiary_name = match &gift.beneficiary_id {
                Some(id) => match beneficiary_names.get(id) {
                    Some(name) => name.clone(),
                    None => {
                        let name = self.portfolio.beneficiary(id)?.map(|b| b.name);
                        beneficiary_names.insert(id.clone(), name.clone());
                        name
                    }
                },
                None => None,
            };
            labelled.push(LabelledGift {
                gift,
                trust_name,
                beneficiary_name,
            });
        }

        let summary = exclusion::summarize(labelled, filter.year, today.year());
        tracing::info!(
            rows = summary.summary.len(),
            exceeding = summary.totals.gifts_exceeding_exclusion,
            "gift tax summary prepared"
        );
        Ok(summary)
    }

    pub fn export_csv(
        &self,
        filter: &GiftFilter,
        today: NaiveDate,
    ) -> Result<Vec<u8>, GiftReportError> {
        let summary = self.summary(filter, today)?;
        Ok(exclusion::to_csv(&summary)?)
    }

    pub fn fund_sufficiency(
        &self,
        trust_id: &TrustId,
        lookahead_days: Option<i64>,
        today: NaiveDate,
    ) -> Result<FundSufficiency, GiftReportError> {
        let lookahead_days = lookahead_days.unwrap_or(DEFAULT_LOOKAHEAD_DAYS);
        let Some(horizon) = lookahead_horizon(today, lookahead_days) else {
            return Err(GiftReportError::InvalidLookahead(lookahead_days));
        };
        if self.portfolio.trust(trust_id)?.is_none() {
            return Err(GiftReportError::TrustNotFound(trust_id.clone()));
        }

        let gifts = self.portfolio.gifts_for_trust(trust_id)?;
        let payments = self.portfolio.trust_payments(trust_id)?;
        let policies = self.portfolio.policies_for_trust(trust_id)?;
        let report =
            assess_fund_sufficiency(trust_id, &gifts, &payments, &policies, today, horizon);

        tracing::info!(
            trust_id = %trust_id,
            available = report.available_funds,
            required = report.required_funds,
            sufficient = report.is_sufficient,
            "fund sufficiency assessed"
        );
        Ok(report)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GiftReportError {
    #[error("lookahead_days must be a positive number of days within the calendar (got {0})")]
    InvalidLookahead(i64),
    #[error("trust {0} not found")]
    TrustNotFound(TrustId),
    #[error("failed to render gift tax export: {0}")]
    Export(#[from] csv::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl GiftReportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GiftReportError::InvalidLookahead(_) => FailureKind::InvalidInput,
            GiftReportError::TrustNotFound(_) => FailureKind::NotFound,
            GiftReportError::Export(_) | GiftReportError::Repository(_) => {
                FailureKind::PersistenceFailed
            }
        }
    }
}
