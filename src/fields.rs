//! Section and field identifiers, data types, and value coercion

use crate::geometry::Rect;
use crate::page::PageIndex;
use crate::PaychequeError;
use chrono::NaiveDate;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// The fifteen subsections of the payslip template, in page order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    PaychequeDetails,
    BaselineDetails,
    TaxData,
    HoursAndEarnings,
    Taxes,
    BeforeTaxDeductions,
    AfterTaxDeductions,
    EmployerPaidBenefits,
    GrossAndNet,
    Vacation,
    BankBalances,
    AdvanceOutstanding,
    DirectDepositDistribution,
    NetPayDistribution,
    Message,
}

impl Section {
    pub const ALL: [Section; 15] = [
        Section::PaychequeDetails,
        Section::BaselineDetails,
        Section::TaxData,
        Section::HoursAndEarnings,
        Section::Taxes,
        Section::BeforeTaxDeductions,
        Section::AfterTaxDeductions,
        Section::EmployerPaidBenefits,
        Section::GrossAndNet,
        Section::Vacation,
        Section::BankBalances,
        Section::AdvanceOutstanding,
        Section::DirectDepositDistribution,
        Section::NetPayDistribution,
        Section::Message,
    ];

    /// Display name, also used as the output folder name
    pub fn name(&self) -> &'static str {
        match self {
            Section::PaychequeDetails => "Pay Cheque Details",
            Section::BaselineDetails => "Baseline Details",
            Section::TaxData => "Tax Data",
            Section::HoursAndEarnings => "Hours and Earnings",
            Section::Taxes => "Taxes",
            Section::BeforeTaxDeductions => "Before-Tax Deductions",
            Section::AfterTaxDeductions => "After-Tax Deductions",
            Section::EmployerPaidBenefits => "Employer Paid Benefits",
            Section::GrossAndNet => "Gross and Net Pay",
            Section::Vacation => "Vacation",
            Section::BankBalances => "Bank Balances",
            Section::AdvanceOutstanding => "Advance Outstanding",
            Section::DirectDepositDistribution => "Direct Deposit Distribution",
            Section::NetPayDistribution => "Net Pay Distribution",
            Section::Message => "Message",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every field the template carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    PayBeginDate,
    PayEndDate,
    AdviceNumber,
    AdviceDate,
    EmployeeId,
    Department,
    Location,
    JobTitle,
    PayRate,
    FederalNetClaimAmount,
    FederalSpecialLetters,
    FederalAdditionalPercent,
    FederalAdditionalAmount,
    AlbertaNetClaimAmount,
    AlbertaSpecialLetters,
    AlbertaAdditionalPercent,
    AlbertaAdditionalAmount,
    Description,
    RateCurrent,
    HoursCurrent,
    EarningsCurrent,
    HoursYtd,
    EarningsYtd,
    Current,
    Ytd,
    CurrentTotalGross,
    CurrentCitTaxableGross,
    CurrentTotalTaxes,
    CurrentTotalDeductions,
    CurrentNetPay,
    YtdTotalGross,
    YtdCitTaxableGross,
    YtdTotalTaxes,
    YtdTotalDeductions,
    YtdNetPay,
    VacationCurrent,
    VacationSupplemental,
    VacationNextYear,
    YtdOtBank,
    YtdSickBank,
    YtdStatBank,
    YtdFloatBank,
    OsAdvance,
    AccountType,
    DepositAmount,
    AdviceNumberReference,
    Amount,
    Message,
}

impl Field {
    /// Column header used when the field is written out
    pub fn header(&self) -> &'static str {
        match self {
            Field::PayBeginDate => "Pay Begin Date",
            Field::PayEndDate => "Pay End Date",
            Field::AdviceNumber => "Advice Number",
            Field::AdviceDate => "Advice Date",
            Field::EmployeeId => "Employee ID",
            Field::Department => "Department",
            Field::Location => "Location",
            Field::JobTitle => "Job Title",
            Field::PayRate => "Pay Rate",
            Field::FederalNetClaimAmount => "Federal - Net Claim Amount",
            Field::FederalSpecialLetters => "Federal - Special Letters",
            Field::FederalAdditionalPercent => "Federal - Additional Percent",
            Field::FederalAdditionalAmount => "Federal - Additional Amount",
            Field::AlbertaNetClaimAmount => "Alberta - Net Claim Amount",
            Field::AlbertaSpecialLetters => "Alberta - Special Letters",
            Field::AlbertaAdditionalPercent => "Alberta - Additional Percent",
            Field::AlbertaAdditionalAmount => "Alberta - Additional Amount",
            Field::Description => "Description",
            Field::RateCurrent => "Current - Rate",
            Field::HoursCurrent => "Current - Hours",
            Field::EarningsCurrent => "Current - Earnings",
            Field::HoursYtd => "YTD - Hours",
            Field::EarningsYtd => "YTD - Earnings",
            Field::Current => "Current",
            Field::Ytd => "YTD",
            Field::CurrentTotalGross => "Current - Total Gross",
            Field::CurrentCitTaxableGross => "Current - CIT Taxable Gross",
            Field::CurrentTotalTaxes => "Current - Total Taxes",
            Field::CurrentTotalDeductions => "Current - Total Deductions",
            Field::CurrentNetPay => "Current - Net Pay",
            Field::YtdTotalGross => "YTD - Total Gross",
            Field::YtdCitTaxableGross => "YTD - CIT Taxable Gross",
            Field::YtdTotalTaxes => "YTD - Total Taxes",
            Field::YtdTotalDeductions => "YTD - Total Deductions",
            Field::YtdNetPay => "YTD - Net Pay",
            Field::VacationCurrent => "Current",
            Field::VacationSupplemental => "Supplemental",
            Field::VacationNextYear => "Next Year",
            Field::YtdOtBank => "YTD OT Bank",
            Field::YtdSickBank => "YTD Sick Bank",
            Field::YtdStatBank => "YTD Stat Bank",
            Field::YtdFloatBank => "YTD Float Bank",
            Field::OsAdvance => "OS/Advance",
            Field::AccountType => "Account Type",
            Field::DepositAmount => "Deposit Amount",
            Field::AdviceNumberReference => "Advice Number Reference",
            Field::Amount => "Amount",
            Field::Message => "Message",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Expected content type of a field box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Text,
    Date,
    Currency,
    Number,
}

impl DataType {
    /// Value used when an optional field is absent from the page
    pub fn empty_value(&self) -> Option<Value> {
        match self {
            DataType::Text => Some(Value::Text(String::new())),
            DataType::Currency | DataType::Number => Some(Value::Decimal(Decimal::ZERO)),
            DataType::Date => None,
        }
    }
}

/// A coerced field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Date(NaiveDate),
    Decimal(Decimal),
}

impl Value {
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Decimal(d) => write!(f, "{}", d),
        }
    }
}

/// A named box and the type of value expected inside it
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub field: Field,
    /// `None` when the field's optional label is absent from the page
    pub rect: Option<Rect>,
    pub data_type: DataType,
}

/// A field read from the page and coerced to its declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedValue {
    pub field: Field,
    pub value: Value,
    pub data_type: DataType,
}

static NON_NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d.]+").unwrap());

/// Drop every character that is not an ASCII digit or a decimal point.
///
/// Signs and thousands separators go with it, so "-12.50" becomes "12.50":
/// negative amounts cannot currently be represented.
pub fn strip_numeric(text: &str) -> String {
    NON_NUMERIC_RE.replace_all(text, "").into_owned()
}

/// Coerce trimmed box text to `data_type`
pub fn coerce(field: Field, text: &str, data_type: DataType) -> Result<Value, PaychequeError> {
    let text = text.trim();
    match data_type {
        DataType::Text => Ok(Value::Text(text.to_string())),
        DataType::Date => NaiveDate::parse_from_str(text, "%m/%d/%Y")
            .map(Value::Date)
            .map_err(|_| PaychequeError::DateParse {
                field: field.header().to_string(),
                text: text.to_string(),
            }),
        DataType::Currency | DataType::Number => {
            let stripped = strip_numeric(text);
            if stripped.is_empty() {
                return Ok(Value::Decimal(Decimal::ZERO));
            }
            Decimal::from_str(&stripped)
                .map(Value::Decimal)
                .map_err(|_| PaychequeError::InvalidNumber {
                    field: field.header().to_string(),
                    text: text.to_string(),
                })
        }
    }
}

/// Read a descriptor's box from the page and coerce it
pub fn extract(
    page: &PageIndex,
    descriptor: &FieldDescriptor,
) -> Result<ExtractedValue, PaychequeError> {
    let FieldDescriptor {
        field,
        rect,
        data_type,
    } = *descriptor;

    debug!("    Extracting \"{}\" ({:?})", field, data_type);

    let value = match rect {
        Some(rect) => {
            let raw = page.textbox(&rect);
            debug!("    Extracted value before formatting: {}", raw.trim());
            coerce(field, &raw, data_type)?
        }
        None => data_type.empty_value().ok_or(PaychequeError::MissingValue {
            field: field.header().to_string(),
        })?,
    };

    debug!("    Extracted value after formatting: {}", value);

    Ok(ExtractedValue {
        field,
        value,
        data_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_trimmed() {
        let v = coerce(Field::Department, "  Nursing \n", DataType::Text).unwrap();
        assert_eq!(v, Value::Text("Nursing".into()));
    }

    #[test]
    fn test_date_parses_month_day_year() {
        let v = coerce(Field::PayBeginDate, "01/01/2024", DataType::Date).unwrap();
        assert_eq!(v, Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
    }

    #[test]
    fn test_bad_date_is_an_error() {
        let err = coerce(Field::AdviceDate, "2024-01-19", DataType::Date).unwrap_err();
        assert!(matches!(err, PaychequeError::DateParse { text, .. } if text == "2024-01-19"));
    }

    #[test]
    fn test_currency_strips_symbols_and_separators() {
        let v = coerce(Field::PayRate, "$1,234.50", DataType::Currency).unwrap();
        assert_eq!(v, Value::Decimal(Decimal::from_str("1234.50").unwrap()));
    }

    #[test]
    fn test_blank_number_is_zero() {
        let v = coerce(Field::VacationCurrent, "   ", DataType::Number).unwrap();
        assert_eq!(v, Value::Decimal(Decimal::ZERO));
    }

    #[test]
    fn test_negative_amount_loses_its_sign() {
        // Known limitation: the minus sign is stripped with the other symbols.
        let v = coerce(Field::Current, "-12.50", DataType::Currency).unwrap();
        assert_eq!(v, Value::Decimal(Decimal::from_str("12.50").unwrap()));
    }

    #[test]
    fn test_strip_is_idempotent() {
        for raw in ["$1,234.50", "-12.50", "abc", "1.2.3", "CPP 170.25 CR", ""] {
            let once = strip_numeric(raw);
            assert_eq!(strip_numeric(&once), once);
        }
    }

    #[test]
    fn test_two_decimal_points_is_invalid() {
        let err = coerce(Field::Amount, "1.2.3", DataType::Currency).unwrap_err();
        assert!(matches!(err, PaychequeError::InvalidNumber { .. }));
    }

    #[test]
    fn test_empty_values() {
        assert_eq!(
            DataType::Number.empty_value(),
            Some(Value::Decimal(Decimal::ZERO))
        );
        assert_eq!(DataType::Date.empty_value(), None);
    }

    #[test]
    fn test_exact_decimal_precision_is_kept() {
        let v = coerce(Field::Ytd, "150.750", DataType::Currency).unwrap();
        assert_eq!(v.to_string(), "150.750");
    }
}
