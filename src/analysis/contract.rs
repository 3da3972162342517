use chrono::NaiveDate;

const PREFIX: &str = "FUTSTK";
const DATE_LEN: usize = 11;

/// Result of parsing a `FUTSTK<SYMBOL><DD-MMM-YYYY>` contract identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractId {
    Parsed { symbol: String, expiry: NaiveDate },
    /// The identifier has the right shape but the date is not a real date.
    BadDate { symbol: String, date: String },
    Unrecognized,
}

impl ContractId {
    pub fn into_parts(self) -> Option<(String, NaiveDate)> {
        match self {
            ContractId::Parsed { symbol, expiry } => Some((symbol, expiry)),
            _ => None,
        }
    }
}

pub fn parse_contract(raw: &str) -> ContractId {
    let Some(body) = raw.strip_prefix(PREFIX) else {
        return ContractId::Unrecognized;
    };
    if !body.is_ascii() || body.len() <= DATE_LEN {
        return ContractId::Unrecognized;
    }

    let (symbol, date) = body.split_at(body.len() - DATE_LEN);
    if !symbol
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        || !has_date_shape(date)
    {
        return ContractId::Unrecognized;
    }

    match NaiveDate::parse_from_str(date, "%d-%b-%Y") {
        Ok(expiry) => ContractId::Parsed {
            symbol: symbol.to_string(),
            expiry,
        },
        Err(_) => ContractId::BadDate {
            symbol: symbol.to_string(),
            date: date.to_string(),
        },
    }
}

// DD-MMM-YYYY with an upper-case month token
fn has_date_shape(date: &str) -> bool {
    let bytes = date.as_bytes();
    bytes.len() == DATE_LEN
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[2] == b'-'
        && bytes[3..6].iter().all(u8::is_ascii_uppercase)
        && bytes[6] == b'-'
        && bytes[7..].iter().all(u8::is_ascii_digit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_contract() {
        assert_eq!(
            parse_contract("FUTSTKBHARATFORG28-AUG-2025"),
            ContractId::Parsed {
                symbol: "BHARATFORG".to_string(),
                expiry: NaiveDate::from_ymd_opt(2025, 8, 28).unwrap(),
            }
        );
    }

    #[test]
    fn test_symbol_with_digits() {
        let (symbol, expiry) = parse_contract("FUTSTKM3M30-SEP-2025").into_parts().unwrap();
        assert_eq!(symbol, "M3M");
        assert_eq!(expiry, NaiveDate::from_ymd_opt(2025, 9, 30).unwrap());
    }

    #[test]
    fn test_unrecognized_shapes() {
        for raw in [
            "",
            "FUTIDXNIFTY28-AUG-2025",
            "FUTSTK28-AUG-2025",
            "FUTSTKabc28-AUG-2025",
            "FUTSTKABC28-Aug-2025",
            "FUTSTKABC28AUG2025",
            "FUTSTKABC-28-AUG-2025",
            "FUTSTKABC28-AUG-2025 ",
        ] {
            assert_eq!(parse_contract(raw), ContractId::Unrecognized, "{raw}");
        }
    }

    #[test]
    fn test_well_shaped_but_invalid_date() {
        assert_eq!(
            parse_contract("FUTSTKABC31-FEB-2025"),
            ContractId::BadDate {
                symbol: "ABC".to_string(),
                date: "31-FEB-2025".to_string(),
            }
        );
        assert!(matches!(
            parse_contract("FUTSTKABC12-XYZ-2025"),
            ContractId::BadDate { .. }
        ));
    }
}
