use serde::{Deserialize, Serialize};

use crate::error::{HahnemannError, Result};
use crate::input::{
    check_discount, check_price, check_quantity, parse_discount, parse_name, parse_price,
    parse_quantity, Field,
};

/// A validated invoice line. Only these reach the calculator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLine {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    /// Percentage in `[0, 100]`.
    pub discount: f64,
}

impl InvoiceLine {
    pub fn gross(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }

    pub fn discount_amount(&self) -> f64 {
        self.price * f64::from(self.quantity) * self.discount / 100.0
    }

    pub fn total(&self) -> f64 {
        self.gross() - self.discount_amount()
    }

    /// Display form of this line, as it appears in a table row.
    pub fn result(&self, currency_label: &str) -> LineResult {
        LineResult {
            display_name: self.name.clone(),
            quantity: self.quantity,
            unit_price_text: format_money(self.price, currency_label),
            discount_text: format_percent(self.discount),
            line_total: self.total(),
        }
    }
}

/// Derived per-line output. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineResult {
    pub display_name: String,
    pub quantity: u32,
    pub unit_price_text: String,
    pub discount_text: String,
    pub line_total: f64,
}

impl LineResult {
    pub fn cells(&self, currency_label: &str) -> Vec<String> {
        vec![
            self.display_name.clone(),
            self.quantity.to_string(),
            self.unit_price_text.clone(),
            self.discount_text.clone(),
            format_money(self.line_total, currency_label),
        ]
    }
}

/// Sum of line totals, in sequence order. Zero for no lines.
pub fn grand_total(lines: &[InvoiceLine]) -> f64 {
    // fold from +0.0: `Sum for f64` starts at -0.0, which prints as "-0.00"
    lines.iter().fold(0.0, |acc, line| acc + line.total())
}

pub fn format_money(amount: f64, currency_label: &str) -> String {
    // anything that rounds to zero prints as "0.00", never "-0.00"
    let amount = if (amount * 100.0).round() == 0.0 { 0.0 } else { amount };
    format!("{} {:.2}", currency_label, amount)
}

pub fn format_percent(value: f64) -> String {
    format!("{}%", value)
}

/// One raw, editable row of the billing form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineDraft {
    pub name: String,
    pub quantity: String,
    pub price: String,
    pub discount: String,
}

impl LineDraft {
    pub fn set(&mut self, field: Field, value: &str) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Quantity => &mut self.quantity,
            Field::Price => &mut self.price,
            Field::Discount => &mut self.discount,
        };
        *slot = value.to_string();
    }

    pub fn validate(&self) -> crate::input::Validated<InvoiceLine> {
        Ok(InvoiceLine {
            name: parse_name(&self.name)?,
            quantity: parse_quantity(&self.quantity)?,
            price: parse_price(&self.price)?,
            discount: parse_discount(&self.discount)?,
        })
    }

    /// Parse "name:quantity:price[:discount]" as given on the command line.
    pub fn parse_shorthand(input: &str) -> Result<LineDraft> {
        let parts: Vec<&str> = input.split(':').collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(HahnemannError::InvalidLineFormat(input.to_string()));
        }

        Ok(LineDraft {
            name: parts[0].to_string(),
            quantity: parts[1].to_string(),
            price: parts[2].to_string(),
            discount: parts.get(3).map(|d| d.to_string()).unwrap_or_default(),
        })
    }
}

/// A line as written in a TOML line file.
#[derive(Debug, Deserialize)]
pub struct LineRecord {
    pub name: String,
    pub quantity: f64,
    pub price: f64,
    #[serde(default)]
    pub discount: f64,
}

impl LineRecord {
    pub fn validate(&self) -> crate::input::Validated<InvoiceLine> {
        Ok(InvoiceLine {
            name: parse_name(&self.name)?,
            quantity: check_quantity(self.quantity)?,
            price: check_price(self.price)?,
            discount: check_discount(self.discount)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(name: &str, quantity: u32, price: f64, discount: f64) -> InvoiceLine {
        InvoiceLine {
            name: name.to_string(),
            quantity,
            price,
            discount,
        }
    }

    #[test]
    fn fully_discounted_line_prints_zero() {
        let l = line("Nux Vomica", 3, 0.07, 100.0);
        assert!(l.total().abs() < 1e-12);
        assert_eq!(l.result("INR").cells("INR")[4], "INR 0.00");
        assert_eq!(format_money(grand_total(&[l]), "INR"), "INR 0.00");
        assert_eq!(format_money(-0.004, "INR"), "INR 0.00");
        assert_eq!(format_money(-0.006, "INR"), "INR -0.01");
    }

    #[test]
    fn paracetamol_example() {
        let l = line("Paracetamol", 10, 5.00, 10.0);
        assert_eq!(l.discount_amount(), 5.0);
        assert_eq!(l.total(), 45.0);

        let result = l.result("INR");
        assert_eq!(result.unit_price_text, "INR 5.00");
        assert_eq!(result.discount_text, "10%");
        assert_eq!(
            result.cells("INR"),
            ["Paracetamol", "10", "INR 5.00", "10%", "INR 45.00"]
        );
    }

    #[test]
    fn two_line_grand_total() {
        let lines = [line("A", 2, 100.0, 0.0), line("B", 1, 50.0, 50.0)];
        assert_eq!(lines[0].total(), 200.0);
        assert_eq!(lines[1].total(), 25.0);
        assert_eq!(grand_total(&lines), 225.0);
        assert_eq!(format_money(grand_total(&lines), "INR"), "INR 225.00");
    }

    #[test]
    fn empty_invoice_totals_zero() {
        assert_eq!(grand_total(&[]), 0.0);
        assert_eq!(format_money(grand_total(&[]), "INR"), "INR 0.00");
    }

    #[test]
    fn fractional_discount_prints_shortest_form() {
        assert_eq!(format_percent(12.5), "12.5%");
        assert_eq!(format_percent(0.0), "0%");
    }

    #[test]
    fn parse_shorthand_accepts_optional_discount() {
        let draft = LineDraft::parse_shorthand("Arnica 30C:3:120").unwrap();
        assert_eq!(draft.name, "Arnica 30C");
        assert_eq!(draft.discount, "");
        assert_eq!(draft.validate().unwrap().discount, 0.0);

        assert!(matches!(
            LineDraft::parse_shorthand("Arnica:3"),
            Err(HahnemannError::InvalidLineFormat(_))
        ));
    }

    #[test]
    fn draft_fields_are_edited_in_place() {
        let mut draft = LineDraft::default();
        draft.set(Field::Name, "Nux Vomica");
        draft.set(Field::Quantity, "4");
        draft.set(Field::Price, "60");
        draft.set(Field::Discount, "25");
        assert_eq!(draft.validate().unwrap(), line("Nux Vomica", 4, 60.0, 25.0));
        assert_eq!(draft.validate().unwrap().total(), 180.0);
    }

    #[test]
    fn record_with_fractional_quantity_is_rejected() {
        let record = LineRecord {
            name: "Arnica".into(),
            quantity: 1.5,
            price: 10.0,
            discount: 0.0,
        };
        assert!(record.validate().is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: total is price x quantity less the discounted share.
        #[test]
        fn total_matches_formula(
            quantity in 0u32..10_000,
            price in 0.0f64..100_000.0,
            discount in 0.0f64..=100.0,
        ) {
            let l = line("x", quantity, price, discount);
            let q = f64::from(quantity);
            prop_assert_eq!(l.total(), price * q - (price * q * discount / 100.0));
            prop_assert!(l.total() <= l.gross() + 1e-9);
            prop_assert!(l.total() >= -1e-9 * l.gross().max(1.0));
        }

        /// Property: the grand total is the in-order sum of independent line totals.
        #[test]
        fn grand_total_is_sum_of_lines(
            raw in prop::collection::vec((0u32..500, 0.0f64..1_000.0, 0.0f64..=100.0), 0..20)
        ) {
            let lines: Vec<_> = raw
                .iter()
                .map(|&(q, p, d)| line("x", q, p, d))
                .collect();
            let mut expected = 0.0;
            for l in &lines {
                expected += l.total();
            }
            prop_assert_eq!(grand_total(&lines), expected);

            // Line totals do not depend on their neighbours.
            for (i, l) in lines.iter().enumerate() {
                prop_assert_eq!(l.total(), line("x", raw[i].0, raw[i].1, raw[i].2).total());
            }
        }
    }
}
