//! Price Summary

use std::io;

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::pricing::PricingResult;

/// Errors that can occur when writing a summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// IO error
    #[error("IO error")]
    IO,
}

/// One line of a price breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    /// Line label
    pub label: String,

    /// Formatted amount, discounts prefixed with `-`
    pub amount: String,
}

impl SummaryRow {
    fn new(label: impl Into<String>, amount: String) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Customer-facing breakdown of a priced booking.
#[derive(Debug, Clone, Copy)]
pub struct PriceSummary<'r, 'a> {
    result: &'r PricingResult<'a>,
}

impl<'r, 'a> PriceSummary<'r, 'a> {
    /// Summarize a priced booking.
    pub fn new(result: &'r PricingResult<'a>) -> Self {
        Self { result }
    }

    /// Breakdown lines: base fare, every non-zero discount, total, deposit and balance.
    pub fn rows(&self) -> SmallVec<[SummaryRow; 10]> {
        let result = self.result;
        let mut rows = SmallVec::new();

        rows.push(SummaryRow::new("Base fare", result.base_price().to_string()));

        for (bucket, amount) in result.amounts().non_zero() {
            rows.push(SummaryRow::new(bucket.label(), discount(amount)));
        }

        let combined = if result.is_capped() {
            format!(
                "Combined discount ({}%, capped from {}%)",
                result.combined_percentage(),
                result.requested_percentage()
            )
        } else {
            format!("Combined discount ({}%)", result.combined_percentage())
        };

        rows.push(SummaryRow::new(combined, discount(result.total_discount())));
        rows.push(SummaryRow::new("Total", result.total().to_string()));
        rows.push(SummaryRow::new("Deposit", result.deposit().amount().to_string()));
        rows.push(SummaryRow::new(
            "Balance due",
            result.deposit().remainder().to_string(),
        ));

        rows
    }

    /// Write the breakdown as a table.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::IO`] if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), SummaryError> {
        let rows = self.rows();
        let mut builder = Builder::default();

        builder.push_record(["", "Amount"]);

        for row in &rows {
            builder.push_record([row.label.as_str(), row.amount.as_str()]);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());
        let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(1, separator);

        // Total, deposit and balance close the table
        if let Some(totals_row) = rows.len().checked_sub(2) {
            theme.insert_horizontal_line(totals_row, separator);
        }

        table.with(theme);
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(1..2), Alignment::right());

        writeln!(out, "\n{table}").map_err(|_err| SummaryError::IO)
    }
}

fn discount(amount: Money<'_, Currency>) -> String {
    format!("-{amount}")
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::CLP;
    use testresult::TestResult;

    use super::*;
    use crate::{
        codes::{CodeDiscount, DiscountCode},
        pricing::{PricingComposer, PricingInput},
        quotes::Quote,
        rates::{DiscountRates, percent},
    };

    fn labels(rows: &[SummaryRow]) -> Vec<&str> {
        rows.iter().map(|row| row.label.as_str()).collect()
    }

    #[test]
    fn rows_skip_zero_buckets() -> TestResult {
        let quote = Quote::priced(Money::from_minor(100_000, CLP), None);
        let rates = DiscountRates::none().with_base(percent(10)).with_promotion(percent(5));

        let pricing = PricingComposer::default().compose(&PricingInput::new(&quote, rates))?;
        let result = pricing.result().ok_or("pricing unavailable")?;

        let rows = PriceSummary::new(result).rows();

        assert_eq!(
            labels(&rows),
            vec![
                "Base fare",
                "Online discount",
                "Promotion",
                "Combined discount (15%)",
                "Total",
                "Deposit",
                "Balance due",
            ]
        );

        Ok(())
    }

    #[test]
    fn capped_discount_is_labelled() -> TestResult {
        let quote = Quote::priced(Money::from_minor(100_000, CLP), None);
        let rates = DiscountRates::none().with_base(percent(60));
        let code = DiscountCode::new("VEINTE", CodeDiscount::Percentage(percent(20)));

        let input = PricingInput::new(&quote, rates).with_code(Some(&code));
        let pricing = PricingComposer::default().compose(&input)?;
        let result = pricing.result().ok_or("pricing unavailable")?;

        let rows = PriceSummary::new(result).rows();

        assert!(labels(&rows).contains(&"Combined discount (75%, capped from 80%)"));
        assert!(labels(&rows).contains(&"Discount code"));

        Ok(())
    }

    #[test]
    fn write_to_renders_totals() -> TestResult {
        let quote = Quote::priced(Money::from_minor(100_000, CLP), None);
        let rates = DiscountRates::none().with_base(percent(15));

        let pricing = PricingComposer::default().compose(&PricingInput::new(&quote, rates))?;
        let result = pricing.result().ok_or("pricing unavailable")?;

        let mut out = Vec::new();

        PriceSummary::new(result).write_to(&mut out)?;

        let rendered = String::from_utf8(out)?;

        assert!(rendered.contains("Balance due"));
        assert!(rendered.contains(&Money::from_minor(85_000, CLP).to_string()));
        assert!(rendered.contains(&Money::from_minor(34_000, CLP).to_string()));

        Ok(())
    }
}
