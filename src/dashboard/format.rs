//! Text formatting for the rendered page.

/// Escape `& < > " '` for insertion into HTML text or attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Format a display value as whole US dollars (`$1,235`).
///
/// Everything except digits, `.` and `-` is stripped first, so `"$ 1,234.50"`
/// reads as 1234.5. An empty remainder counts as zero. Text that still does
/// not parse is returned unchanged.
pub fn money(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let value = if cleaned.is_empty() {
        0.0
    } else {
        match cleaned.parse::<f64>() {
            Ok(v) => v,
            Err(_) => return raw.to_string(),
        }
    };
    format_usd(value)
}

fn format_usd(value: f64) -> String {
    let sign = if value.is_sign_negative() { "-" } else { "" };
    if value.is_infinite() {
        return format!("{}$∞", sign);
    }
    // f64::round rounds half away from zero.
    let digits = format!("{:.0}", value.abs().round());
    format!("{}${}", sign, group_thousands(&digits))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#039;Jerry&#039;&lt;/b&gt;"
        );
        assert_eq!(escape_html("En distribución"), "En distribución");
    }

    #[test]
    fn test_money_rounds_half_away_from_zero() {
        assert_eq!(money("1234.5"), "$1,235");
        assert_eq!(money("1234.49"), "$1,234");
        assert_eq!(money("-1234.5"), "-$1,235");
        assert_eq!(money("0.5"), "$1");
    }

    #[test]
    fn test_money_strips_formatting() {
        assert_eq!(money("$ 1,234,567.00"), "$1,234,567");
        assert_eq!(money("MXN 999"), "$999");
        assert_eq!(money("100"), "$100");
        assert_eq!(money("1000"), "$1,000");
    }

    #[test]
    fn test_money_empty_is_zero() {
        assert_eq!(money(""), "$0");
        assert_eq!(money("n/a"), "$0");
    }

    #[test]
    fn test_money_negative_zero_keeps_sign() {
        assert_eq!(money("-0.4"), "-$0");
    }

    #[test]
    fn test_money_unparseable_passthrough() {
        assert_eq!(money("1.2.3"), "1.2.3");
        assert_eq!(money("-"), "-");
        assert_eq!(money("10-5"), "10-5");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("123456"), "123,456");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }
}
