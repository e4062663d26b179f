// Price display in Lakhs

use crate::models::Language;

const MYANMAR_LAKH_SUFFIX: &str = "သိန်း";

/// Rounds to a whole number of Lakhs and groups thousands with commas.
pub fn format_price_lakhs(price: f64, language: Language) -> String {
    let rounded = price.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match language {
        Language::En => format!("{} Lakhs", grouped),
        Language::Mm => format!("{}{}", grouped, MYANMAR_LAKH_SUFFIX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_price_lakhs(1234.0, Language::En), "1,234 Lakhs");
        assert_eq!(format_price_lakhs(1_234_567.0, Language::En), "1,234,567 Lakhs");
        assert_eq!(format_price_lakhs(999.0, Language::En), "999 Lakhs");
        assert_eq!(format_price_lakhs(0.0, Language::En), "0 Lakhs");
    }

    #[test]
    fn rounds_fractions() {
        assert_eq!(format_price_lakhs(449.6, Language::En), "450 Lakhs");
        assert_eq!(format_price_lakhs(-1200.2, Language::En), "-1,200 Lakhs");
    }

    #[test]
    fn suffix_follows_language() {
        assert_eq!(format_price_lakhs(1234.0, Language::Mm), "1,234သိန်း");
    }
}
