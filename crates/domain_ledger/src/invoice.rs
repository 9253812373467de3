//! Invoice numbering
//!
//! Invoice numbers have the form `<PREFIX>-<YYYYMMDD>-<NNNN>` where the
//! prefix encodes the direction (`MJP` inbound, `INV` outbound) and `NNNN`
//! is the zero-padded count of transactions already created that day.
//! Sequences above 9999 widen rather than wrap.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

use crate::error::LedgerError;
use crate::transaction::Direction;

const DATE_FORMAT: &str = "%Y%m%d";

/// A parsed or generated invoice number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvoiceNumber {
    direction: Direction,
    date: NaiveDate,
    sequence: u32,
}

impl InvoiceNumber {
    pub fn new(direction: Direction, date: NaiveDate, sequence: u32) -> Self {
        Self {
            direction,
            date,
            sequence,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:04}",
            self.direction.invoice_prefix(),
            self.date.format(DATE_FORMAT),
            self.sequence
        )
    }
}

impl FromStr for InvoiceNumber {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || LedgerError::validation(format!("malformed invoice number '{}'", s));

        let mut parts = s.splitn(3, '-');
        let (prefix, date, sequence) = match (parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(d), Some(n)) => (p, d, n),
            _ => return Err(malformed()),
        };

        let direction = match prefix {
            "MJP" => Direction::Inbound,
            "INV" => Direction::Outbound,
            _ => return Err(malformed()),
        };
        if date.len() != 8 || sequence.len() < 4 {
            return Err(malformed());
        }
        let date = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| malformed())?;
        if !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let sequence = sequence.parse::<u32>().map_err(|_| malformed())?;

        Ok(Self::new(direction, date, sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_format_pads_sequence() {
        assert_eq!(InvoiceNumber::new(Direction::Inbound, date(), 0).to_string(), "MJP-20240309-0000");
        assert_eq!(InvoiceNumber::new(Direction::Outbound, date(), 42).to_string(), "INV-20240309-0042");
    }

    #[test]
    fn test_sequence_widens_past_four_digits() {
        assert_eq!(InvoiceNumber::new(Direction::Outbound, date(), 12345).to_string(), "INV-20240309-12345");
    }

    #[test]
    fn test_parse_recovers_parts() {
        let parsed: InvoiceNumber = "INV-20240309-0007".parse().unwrap();
        assert_eq!(parsed.direction(), Direction::Outbound);
        assert_eq!(parsed.date(), date());
        assert_eq!(parsed.sequence(), 7);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "INV", "XYZ-20240309-0001", "INV-2024039-0001", "INV-20240309-1", "INV-20240309-00a1"] {
            assert!(bad.parse::<InvoiceNumber>().is_err(), "{} should not parse", bad);
        }
    }
}
