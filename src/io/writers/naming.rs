//! Output filename templates.
//!
//! Tokens: `{num}` zero-padded index, `{char}` bijective base-26 letters,
//! `{ext}`, `{parent}` input folder name, `{date}` and `{time}` of the job.
use chrono::{DateTime, Local};

pub const DEFAULT_TEMPLATE: &str = "{num}";

/// Template plus the values that stay fixed for a whole job.
#[derive(Debug, Clone)]
pub struct NamingContext {
    template: String,
    parent: String,
    date: String,
    time: String,
}

impl NamingContext {
    /// Capture the job's date and time now.
    pub fn new(template: Option<&str>, parent: impl Into<String>) -> Self {
        Self::at(template, parent, Local::now())
    }

    pub fn at(template: Option<&str>, parent: impl Into<String>, when: DateTime<Local>) -> Self {
        let template = match template {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => DEFAULT_TEMPLATE.to_string(),
        };
        Self {
            template,
            parent: parent.into(),
            date: when.format("%Y-%m-%d").to_string(),
            time: when.format("%H-%M-%S").to_string(),
        }
    }

    /// File name for the segment with 1-based `index`.
    pub fn file_name(&self, index: usize, extension: &str) -> String {
        let mut name = self
            .template
            .replace("{num}", &format!("{:02}", index))
            .replace("{char}", &index_letters(index))
            .replace("{parent}", &self.parent)
            .replace("{date}", &self.date)
            .replace("{time}", &self.time);
        if name.contains("{ext}") {
            name = name.replace("{ext}", extension);
        } else {
            name.push('.');
            name.push_str(extension);
        }
        name
    }
}

/// 1 -> `a`, 26 -> `z`, 27 -> `aa`; 0 has no letters.
pub fn index_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        index -= 1;
        letters.push(b'a' + (index % 26) as u8);
        index /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx(template: Option<&str>) -> NamingContext {
        let when = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        NamingContext::at(template, "Chapter 12", when)
    }

    #[test]
    fn default_template_is_padded_number() {
        assert_eq!(ctx(None).file_name(3, "png"), "03.png");
        assert_eq!(ctx(Some("")).file_name(123, "jpg"), "123.jpg");
    }

    #[test]
    fn all_tokens_expand() {
        let name = ctx(Some("{parent}_{date}_{time}_{char}_{num}.{ext}")).file_name(28, "tiff");
        assert_eq!(name, "Chapter 12_2024-03-09_07-05-01_ab_28.tiff");
    }

    #[test]
    fn letters_are_bijective_base26() {
        assert_eq!(index_letters(1), "a");
        assert_eq!(index_letters(26), "z");
        assert_eq!(index_letters(27), "aa");
        assert_eq!(index_letters(52), "az");
        assert_eq!(index_letters(703), "aaa");
    }
}
