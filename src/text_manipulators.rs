use chrono::NaiveDate;
use scraper::ElementRef;

const EVENT_DATE_FORMAT: &str = "%Y%m%d";

pub fn extract_text(node: ElementRef) -> String {
    node.text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}

/// Absolute urls from the event list are kept, paths are joined onto the origin.
pub fn get_html_link_to_page(origin: &str, html_fragment: &str) -> String {
    if html_fragment.starts_with("http://") || html_fragment.starts_with("https://") {
        return html_fragment.to_string();
    }
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        html_fragment.trim_start_matches('/')
    )
}

pub fn format_event_date(date: NaiveDate) -> String {
    date.format(EVENT_DATE_FORMAT).to_string()
}

pub fn parse_event_date(text: &str) -> anyhow::Result<NaiveDate> {
    let text = text.trim();
    if text.len() != 8 {
        anyhow::bail!("expected an 8 digit YYYYMMDD date, got {:?}", text);
    }
    Ok(NaiveDate::parse_from_str(text, EVENT_DATE_FORMAT)?)
}
