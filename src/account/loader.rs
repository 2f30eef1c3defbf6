//! Load accounts from a credit_portfolio.csv extract
//!
//! Malformed rows do not abort the load: each becomes a [`ValidationError`]
//! in the [`LoadReport`] and the caller decides what to do with them.

use super::{AcceptanceDecision, Account, IncomeBand, Region};
use crate::error::{Result, ValidationError};
use csv::Reader;
use log::{info, warn};
use std::path::Path;
use std::str::FromStr;

/// Raw CSV row matching credit_portfolio.csv columns
///
/// Extra columns in the extract (repayment_history, marketing_offer_response)
/// are ignored. Numeric cells are kept as text so a bad cell rejects only
/// its own record.
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    customer_id: String,
    application_score: String,
    income_band: String,
    region: String,
    credit_limit: String,
    balance: String,
    utilization_rate: String,
    delinquency_status: String,
    acceptance_decision: String,
}

fn parse_field<T: FromStr>(
    account_id: &str,
    field: &'static str,
    value: &str,
) -> std::result::Result<T, ValidationError> {
    value.trim().parse().map_err(|_| ValidationError::MalformedField {
        account_id: account_id.to_string(),
        field,
        value: value.to_string(),
    })
}

impl CsvRow {
    fn into_account(self) -> std::result::Result<Account, ValidationError> {
        let id = self.customer_id.as_str();
        let application_score: f64 = parse_field(id, "application_score", &self.application_score)?;
        let credit_limit: f64 = parse_field(id, "credit_limit", &self.credit_limit)?;
        let balance: f64 = parse_field(id, "balance", &self.balance)?;
        let utilization_rate: f64 = parse_field(id, "utilization_rate", &self.utilization_rate)?;
        let delinquency_status: i64 = parse_field(id, "delinquency_status", &self.delinquency_status)?;

        let income_band = IncomeBand::parse(&self.income_band).ok_or_else(|| {
            ValidationError::UnknownCategory {
                account_id: self.customer_id.clone(),
                field: "income_band",
                value: self.income_band.clone(),
            }
        })?;

        let region = Region::parse(&self.region).ok_or_else(|| ValidationError::UnknownCategory {
            account_id: self.customer_id.clone(),
            field: "region",
            value: self.region.clone(),
        })?;

        let acceptance_decision = AcceptanceDecision::parse(&self.acceptance_decision)
            .ok_or_else(|| ValidationError::UnknownCategory {
                account_id: self.customer_id.clone(),
                field: "acceptance_decision",
                value: self.acceptance_decision.clone(),
            })?;

        let delinquency_status = u32::try_from(delinquency_status).map_err(|_| {
            ValidationError::NegativeDelinquency {
                account_id: self.customer_id.clone(),
                value: delinquency_status,
            }
        })?;

        let account = Account {
            customer_id: self.customer_id,
            application_score,
            income_band,
            region,
            credit_limit,
            balance,
            utilization_rate,
            delinquency_status,
            acceptance_decision,
        };
        account.validate()?;
        Ok(account)
    }
}

/// Accounts that parsed cleanly plus the per-record rejections
#[derive(Debug, Default)]
pub struct LoadReport {
    pub accounts: Vec<Account>,
    pub rejected: Vec<ValidationError>,
}

impl LoadReport {
    pub fn total_rows(&self) -> usize {
        self.accounts.len() + self.rejected.len()
    }

    /// Fail on the first rejection (strict mode), otherwise return the accounts
    pub fn into_strict(self) -> std::result::Result<Vec<Account>, ValidationError> {
        match self.rejected.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.accounts),
        }
    }
}

/// Load all accounts from a CSV file
pub fn load_accounts<P: AsRef<Path>>(path: P) -> Result<LoadReport> {
    let reader = Reader::from_path(path.as_ref())?;
    let report = collect_rows(reader)?;
    info!(
        "loaded {} accounts from {} ({} rejected)",
        report.accounts.len(),
        path.as_ref().display(),
        report.rejected.len()
    );
    Ok(report)
}

/// Load accounts from any reader (e.g., string buffer, network stream)
pub fn load_accounts_from_reader<R: std::io::Read>(reader: R) -> Result<LoadReport> {
    collect_rows(Reader::from_reader(reader))
}

fn collect_rows<R: std::io::Read>(mut reader: Reader<R>) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    for result in reader.deserialize() {
        let row: CsvRow = match result {
            Ok(row) => row,
            Err(err) if is_record_error(&err) => {
                let rejection = ValidationError::MalformedRecord {
                    line: err.position().map_or(0, |p| p.line()),
                    reason: err.to_string(),
                };
                warn!("rejected record: {}", rejection);
                report.rejected.push(rejection);
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        match row.into_account() {
            Ok(account) => report.accounts.push(account),
            Err(err) => {
                warn!("rejected record: {}", err);
                report.rejected.push(err);
            }
        }
    }

    Ok(report)
}

/// Errors confined to one record; anything else (I/O, encoding) ends the load
fn is_record_error(err: &csv::Error) -> bool {
    matches!(
        err.kind(),
        csv::ErrorKind::Deserialize { .. } | csv::ErrorKind::UnequalLengths { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTRACT: &str = "\
customer_id,application_score,income_band,region,credit_limit,balance,utilization_rate,delinquency_status,acceptance_decision,repayment_history
C001,720,High,London,8000,2000,25.0,0,Approved,Good
C002,580,Low,North West,1500,1400,93.3,30,Approved,Poor
C003,640,Medium,Scotland,3000,0,0.0,0,Declined,Fair
C004,1020,Medium,Wales,3000,100,3.3,0,Approved,Good
C005,650,Middle,Wales,3000,100,3.3,0,Approved,Good
C006,650,Low,Wales,3000,100,3.3,-30,Approved,Good
";

    #[test]
    fn test_load_accounts_from_reader() {
        let report = load_accounts_from_reader(EXTRACT.as_bytes()).expect("extract should parse");
        assert_eq!(report.total_rows(), 6);
        assert_eq!(report.accounts.len(), 3);

        let c002 = &report.accounts[1];
        assert_eq!(c002.customer_id, "C002");
        assert_eq!(c002.region, Region::NorthWest);
        assert_eq!(c002.income_band, IncomeBand::Low);
        assert_eq!(c002.delinquency_status, 30);
        assert!(c002.is_approved());

        assert!(!report.accounts[2].is_approved());
    }

    #[test]
    fn test_rejections_are_per_record() {
        let report = load_accounts_from_reader(EXTRACT.as_bytes()).unwrap();
        assert_eq!(report.rejected.len(), 3);
        assert!(matches!(report.rejected[0], ValidationError::ScoreOutOfRange { .. }));
        assert!(matches!(
            report.rejected[1],
            ValidationError::UnknownCategory { field: "income_band", .. }
        ));
        assert!(matches!(
            report.rejected[2],
            ValidationError::NegativeDelinquency { value: -30, .. }
        ));
    }

    #[test]
    fn test_strict_mode_surfaces_first_rejection() {
        let report = load_accounts_from_reader(EXTRACT.as_bytes()).unwrap();
        let err = report.into_strict().unwrap_err();
        assert!(matches!(err, ValidationError::ScoreOutOfRange { .. }));
    }

    #[test]
    fn test_unparseable_numbers_reject_only_their_record() {
        let extract = "\
customer_id,application_score,income_band,region,credit_limit,balance,utilization_rate,delinquency_status,acceptance_decision
C001,720,High,London,8000,2000,25.0,0,Approved
C002,650,Low,Wales,3000,N/A,3.3,0,Approved
C003,,Low,Wales,3000,100,3.3,0,Approved
C004,640,Medium,Scotland,3000,100,3.3,30.5,Approved
C005,700,Medium,Scotland,4000,500,12.5,0,Approved
";
        let report = load_accounts_from_reader(extract.as_bytes()).unwrap();
        let ids: Vec<&str> = report.accounts.iter().map(|a| a.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["C001", "C005"]);
        assert_eq!(report.rejected.len(), 3);
        assert_eq!(
            report.rejected[0],
            ValidationError::MalformedField {
                account_id: "C002".to_string(),
                field: "balance",
                value: "N/A".to_string(),
            }
        );
        assert!(matches!(
            report.rejected[1],
            ValidationError::MalformedField { field: "application_score", .. }
        ));
        assert!(matches!(
            report.rejected[2],
            ValidationError::MalformedField { field: "delinquency_status", .. }
        ));
    }

    #[test]
    fn test_short_row_is_rejected_not_fatal() {
        let extract = "\
customer_id,application_score,income_band,region,credit_limit,balance,utilization_rate,delinquency_status,acceptance_decision
C001,720,High,London,8000,2000,25.0,0,Approved
C002,650,Low
C003,700,Medium,Scotland,4000,500,12.5,0,Approved
";
        let report = load_accounts_from_reader(extract.as_bytes()).unwrap();
        assert_eq!(report.accounts.len(), 2);
        assert!(matches!(report.rejected[0], ValidationError::MalformedRecord { .. }));
    }
}
