use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub struct TextMetrics {
    pub char_width: f64,
    pub padding_x: f64,
    pub min_label_width: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 7.0,
            padding_x: 12.0,
            min_label_width: 30.0,
        }
    }
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    /// Width of the box drawn behind a relationship label.
    pub fn label_width(&self, label: &str) -> f64 {
        (self.text_width(label) + self.padding_x).max(self.min_label_width)
    }

    /// Cut `text` so it fits in `max_width`, ending with an ellipsis when shortened.
    pub fn truncate(&self, text: &str, max_width: f64) -> String {
        if self.text_width(text) <= max_width {
            return text.to_string();
        }
        let budget = max_width - self.char_width;
        let mut used = 0.0;
        let mut out = String::new();
        for ch in text.chars() {
            let w = UnicodeWidthChar::width(ch).unwrap_or(0) as f64 * self.char_width;
            if used + w > budget {
                break;
            }
            used += w;
            out.push(ch);
        }
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_width() {
        let m = TextMetrics::default();
        assert_eq!(m.text_width("users"), 5.0 * 7.0);
    }

    #[test]
    fn test_unicode_width() {
        let m = TextMetrics::default();
        // full-width characters count double
        assert_eq!(m.text_width("ユーザー"), 8.0 * 7.0);
    }

    #[test]
    fn test_label_width_minimum() {
        let m = TextMetrics::default();
        assert_eq!(m.label_width("1"), 30.0);
        assert_eq!(m.label_width("1:N"), 3.0 * 7.0 + 12.0);
        assert_eq!(m.label_width("customer_id"), 11.0 * 7.0 + 12.0);
    }

    #[test]
    fn test_truncate() {
        let m = TextMetrics::default();
        assert_eq!(m.truncate("users", 100.0), "users");
        // 35px budget leaves room for four characters plus the ellipsis
        assert_eq!(m.truncate("customer_accounts", 35.0), "cust…");
        assert_eq!(m.truncate("ユーザー情報", 35.0), "ユー…");
    }
}
