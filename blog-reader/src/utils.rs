/// Word counting and reading time estimation
pub mod text {
    /// Default reading speed used for the reading time estimate
    pub const WORDS_PER_MINUTE: usize = 200;

    /// Counts words by splitting on every non-word character.
    /// Word characters are letters, digits and `_`; empty tokens are ignored.
    pub fn word_count(text: &str) -> usize {
        text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|token| !token.is_empty())
            .count()
    }

    /// Minutes needed to read `words` words, rounded up. Never less than one minute.
    pub fn reading_time_minutes(words: usize, words_per_minute: usize) -> u32 {
        let minutes = words.div_ceil(words_per_minute.max(1));
        u32::try_from(minutes).unwrap_or(u32::MAX).max(1)
    }

    pub fn format_reading_time(minutes: u32) -> String {
        format!("{} min", minutes)
    }
}

/// Publication date helpers
pub mod time {
    use chrono::{DateTime, Locale, Utc};

    pub const DISPLAY_LOCALE: Locale = Locale::pt_BR;
    pub const DISPLAY_FORMAT: &str = "%d %b %Y";

    /// Formats a publication date as `dd MMM yyyy` in the display locale, e.g. `25 mar 2021`
    pub fn format_publication_date(date: &DateTime<Utc>) -> String {
        date.format_localized(DISPLAY_FORMAT, DISPLAY_LOCALE).to_string()
    }

    pub fn parse_publication_date(value: &str) -> Option<DateTime<Utc>> {
        content_interfaces::defs::prismic_date::parse(value)
    }
}

/// Routes and endpoint URL helpers
pub mod url {
    use url::Url;

    /// Route of an article page
    pub fn post_href(id: &str) -> String {
        format!("/post/{}", id)
    }

    pub fn is_valid_api_endpoint(url_str: &str) -> bool {
        if let Ok(url) = Url::parse(url_str) {
            url.scheme() == "http" || url.scheme() == "https"
        } else {
            false
        }
    }

    /// Same scheme, host and port
    pub fn same_origin(a: &Url, b: &Url) -> bool {
        a.scheme() == b.scheme() && a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
    }
}
