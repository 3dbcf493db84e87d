//! Domain validation of request fields.
//!
//! Price and publish date travel as strings in create/update requests
//! so that all field errors can be reported together. These validators
//! accumulate every applicable message instead of failing fast.

use time::{macros::format_description, Date, PrimitiveDateTime};

pub const PRICE_MESSAGE: &str =
    "The provided price is not valid. It should be a number greater than or equal to zero.";
pub const PUBLISH_DATE_MESSAGE: &str =
    "The provided date is not valid. Please ensure the date is in the correct format.";

pub const MIN_PRICE_NEGATIVE_MESSAGE: &str = "Minimum price must be positive.";
pub const MAX_PRICE_NEGATIVE_MESSAGE: &str = "Maximum price must be positive.";
pub const MIN_ABOVE_MAX_MESSAGE: &str = "Minimum price cannot be greater than maximum price.";

/// Read access to the string-typed fields shared by create and update
/// requests.
pub trait BookRequest {
    fn price(&self) -> Option<&str>;
    fn publish_date(&self) -> Option<&str>;
}

/// Checks price-range query bounds. Returns an error message, or `None`
/// when the bounds are acceptable.
pub fn validate_price_range(min_price: Option<f64>, max_price: Option<f64>) -> Option<&'static str> {
    if let Some(min) = min_price {
        if min < 0.0 {
            return Some(MIN_PRICE_NEGATIVE_MESSAGE);
        }
    }
    if let Some(max) = max_price {
        if max < 0.0 {
            return Some(MAX_PRICE_NEGATIVE_MESSAGE);
        }
    }
    if let (Some(min), Some(max)) = (min_price, max_price) {
        if min > max {
            return Some(MIN_ABOVE_MAX_MESSAGE);
        }
    }
    None
}

/// Validates the string-typed fields of a book request. Absent fields
/// pass (update requests are partial); present fields must parse.
/// All failures are reported, newline separated.
pub fn validate_request(request: &impl BookRequest) -> Option<String> {
    let mut messages = Vec::new();

    if let Some(date) = request.publish_date() {
        if parse_publish_date(date).is_none() {
            messages.push(PUBLISH_DATE_MESSAGE);
        }
    }
    if let Some(price) = request.price() {
        if parse_price(price).is_none() {
            messages.push(PRICE_MESSAGE);
        }
    }

    if messages.is_empty() {
        None
    } else {
        Some(messages.join("\n"))
    }
}

/// Non-negative price from its string form.
pub fn parse_price(input: &str) -> Option<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|price| *price >= 0.0 && price.is_finite())
}

/// Calendar date from `yyyy-MM-dd`, with or without a `THH:mm:ss`
/// time part (the time of day carries no meaning and is dropped).
pub fn parse_publish_date(input: &str) -> Option<Date> {
    let date_only = format_description!("[year]-[month]-[day]");
    let date_time = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

    let input = input.trim();
    Date::parse(input, date_only).ok().or_else(|| {
        PrimitiveDateTime::parse(input, date_time)
            .ok()
            .map(|dt| dt.date())
    })
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    struct Probe {
        price: Option<&'static str>,
        publish_date: Option<&'static str>,
    }

    impl BookRequest for Probe {
        fn price(&self) -> Option<&str> {
            self.price
        }
        fn publish_date(&self) -> Option<&str> {
            self.publish_date
        }
    }

    #[test]
    fn price_range_messages() {
        assert_eq!(
            validate_price_range(Some(-1.0), None),
            Some(MIN_PRICE_NEGATIVE_MESSAGE)
        );
        assert_eq!(
            validate_price_range(None, Some(-0.5)),
            Some(MAX_PRICE_NEGATIVE_MESSAGE)
        );
        assert_eq!(
            validate_price_range(Some(30.0), Some(10.0)),
            Some(MIN_ABOVE_MAX_MESSAGE)
        );
        assert_eq!(validate_price_range(Some(10.0), Some(30.0)), None);
        assert_eq!(validate_price_range(None, None), None);
        assert_eq!(validate_price_range(Some(10.0), Some(10.0)), None);
    }

    #[test]
    fn request_errors_accumulate() {
        let both_bad = Probe {
            price: Some("cheap"),
            publish_date: Some("soon"),
        };
        let message = validate_request(&both_bad).unwrap();
        assert!(message.contains(PRICE_MESSAGE));
        assert!(message.contains(PUBLISH_DATE_MESSAGE));
    }

    #[test]
    fn absent_fields_are_not_errors() {
        let empty = Probe {
            price: None,
            publish_date: None,
        };
        assert_eq!(validate_request(&empty), None);
    }

    #[test]
    fn negative_price_rejected() {
        let negative = Probe {
            price: Some("-19.99"),
            publish_date: Some("2022-01-01"),
        };
        let message = validate_request(&negative).unwrap();
        assert_eq!(message, PRICE_MESSAGE);
    }

    #[test]
    fn parse_price_accepts_zero() {
        assert_eq!(parse_price("0"), Some(0.0));
        assert_eq!(parse_price(" 19.99 "), Some(19.99));
        assert_eq!(parse_price("NaN"), None);
        assert_eq!(parse_price("abc"), None);
    }

    #[test]
    fn parse_dates() {
        assert_eq!(parse_publish_date("2022-01-01"), Some(date!(2022 - 01 - 01)));
        assert_eq!(
            parse_publish_date("2022-01-01T00:00:00"),
            Some(date!(2022 - 01 - 01))
        );
        assert_eq!(parse_publish_date("2022-13-01"), None);
        assert_eq!(parse_publish_date("01/02/2022"), None);
    }
}
