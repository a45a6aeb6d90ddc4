use anyhow::{anyhow, Result};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_DURATION_MINUTES: i64 = 8 * 60;
/// Upper bound on a service price, in major units.
pub const MAX_PRICE: i64 = 10_000_000;

pub fn validate_service_name(name: &str) -> Result<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(anyhow!("Service name cannot be longer than {} characters", MAX_NAME_LEN));
    }

    if name.contains('\n') || name.contains('\r') {
        return Err(anyhow!("Service name cannot contain line breaks"));
    }

    Ok(())
}

pub fn validate_description(description: &str) -> Result<()> {
    if description.trim().chars().count() > MAX_DESCRIPTION_LEN {
        return Err(anyhow!(
            "Description cannot be longer than {} characters",
            MAX_DESCRIPTION_LEN
        ));
    }
    Ok(())
}

pub fn validate_discount_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("Discount name cannot be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(anyhow!("Discount name cannot be longer than {} characters", MAX_NAME_LEN));
    }
    Ok(())
}

/// Service length in whole minutes, 1 to 480.
pub fn parse_duration(input: &str) -> Result<i64> {
    let minutes: i64 = input
        .trim()
        .parse()
        .map_err(|_| anyhow!("Duration must be a whole number of minutes"))?;
    if minutes <= 0 {
        return Err(anyhow!("Duration must be positive"));
    }
    if minutes > MAX_DURATION_MINUTES {
        return Err(anyhow!("Duration cannot exceed {} minutes", MAX_DURATION_MINUTES));
    }
    Ok(minutes)
}

/// Price typed in major units (`2500` or `2500.50`), returned in minor units.
pub fn parse_price(input: &str) -> Result<i64> {
    let input = input.trim();
    let invalid = || anyhow!("Price must be a non-negative amount like 2500 or 2500.50");

    let (major, minor) = match input.split_once('.') {
        Some((major, minor)) => (major, minor),
        None => (input, ""),
    };
    if major.is_empty() || !major.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if minor.len() > 2 || !minor.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let major: i64 = major.parse().map_err(|_| invalid())?;
    let minor: i64 = match minor.len() {
        0 => 0,
        1 => minor.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => minor.parse().map_err(|_| invalid())?,
    };
    if major > MAX_PRICE || (major == MAX_PRICE && minor > 0) {
        return Err(anyhow!("Price cannot exceed {}", MAX_PRICE));
    }
    Ok(major * 100 + minor)
}

pub fn validate_percentage(percentage: i64) -> Result<()> {
    if !(1..=99).contains(&percentage) {
        return Err(anyhow!("Percentage must be between 1 and 99"));
    }
    Ok(())
}

pub fn parse_percentage(input: &str) -> Result<i64> {
    let percentage: i64 = input
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| anyhow!("Percentage must be a whole number"))?;
    validate_percentage(percentage)?;
    Ok(percentage)
}

pub fn parse_id(input: &str, what: &str) -> Result<i64> {
    input
        .trim()
        .trim_start_matches('#')
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| anyhow!("{} id must be a positive number", what))
}

/// Splits `a | b | c` command arguments into exactly `expected` trimmed fields.
/// The last field keeps any further `|` characters.
pub fn split_fields(args: &str, expected: usize) -> Result<Vec<String>> {
    let fields: Vec<String> = args
        .splitn(expected, '|')
        .map(|s| s.trim().to_string())
        .collect();
    if fields.len() != expected || fields.iter().take(expected - 1).any(|f| f.is_empty()) {
        return Err(anyhow!("Expected {} fields separated by '|'", expected));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_service_name() {
        assert!(validate_service_name("Classic massage").is_ok());
        assert!(validate_service_name("  Trimmed  ").is_ok());
        assert!(validate_service_name("").is_err());
        assert!(validate_service_name("   ").is_err());
        assert!(validate_service_name("Two\nlines").is_err());
        assert!(validate_service_name(&"a".repeat(101)).is_err());
        assert!(validate_service_name(&"a".repeat(100)).is_ok());
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("").is_ok());
        assert!(validate_description(&"a".repeat(500)).is_ok());
        assert!(validate_description(&"a".repeat(501)).is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("60").unwrap(), 60);
        assert_eq!(parse_duration(" 45 ").unwrap(), 45);
        assert!(parse_duration("0").is_err());
        assert!(parse_duration("-30").is_err());
        assert!(parse_duration("1.5").is_err());
        assert!(parse_duration("481").is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("3000").unwrap(), 300000);
        assert_eq!(parse_price("1500.5").unwrap(), 150050);
        assert_eq!(parse_price("1500.05").unwrap(), 150005);
        assert_eq!(parse_price("0").unwrap(), 0);
        assert!(parse_price("-1").is_err());
        assert!(parse_price("12.345").is_err());
        assert!(parse_price("abc").is_err());
        assert!(parse_price(".50").is_err());
        assert!(parse_price("").is_err());
    }

    #[test]
    fn test_parse_price_upper_bound() {
        assert_eq!(parse_price("10000000").unwrap(), 1_000_000_000);
        assert!(parse_price("10000000.01").is_err());
        assert!(parse_price("1000000000000000").is_err());
        assert!(parse_price("99999999999999999999999").is_err());
    }

    #[test]
    fn test_parse_percentage() {
        assert_eq!(parse_percentage("20").unwrap(), 20);
        assert_eq!(parse_percentage("15%").unwrap(), 15);
        assert!(parse_percentage("0").is_err());
        assert!(parse_percentage("100").is_err());
        assert!(parse_percentage("ten").is_err());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("12", "Booking").unwrap(), 12);
        assert_eq!(parse_id("#7", "Booking").unwrap(), 7);
        assert!(parse_id("0", "Booking").is_err());
        assert!(parse_id("x", "Booking").is_err());
    }

    #[test]
    fn test_split_fields() {
        let fields = split_fields("Hot stones | 90 | 4500 | Warm | relaxing", 4).unwrap();
        assert_eq!(fields, vec!["Hot stones", "90", "4500", "Warm | relaxing"]);

        // Trailing optional field may be empty
        let fields = split_fields("Hot stones | 90 | 4500 |", 4).unwrap();
        assert_eq!(fields[3], "");

        assert!(split_fields("Hot stones | 90", 4).is_err());
        assert!(split_fields(" | 90 | 4500 | x", 4).is_err());
    }
}
