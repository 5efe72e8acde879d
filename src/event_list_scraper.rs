use chrono::NaiveDate;
use log::debug;
use reqwest::header::REFERER;
use serde::Deserialize;

use crate::{
    Sport, scraping_context::ScrapingContext, text_manipulators::get_html_link_to_page,
};

#[derive(Debug, Deserialize)]
pub struct EventListResponse {
    pub d: EventListData,
}

#[derive(Debug, Deserialize)]
pub struct EventListData {
    #[serde(default)]
    pub rows: Vec<EventRow>,
}

#[derive(Debug, Deserialize)]
pub struct EventRow {
    pub url: String,
}

/// Lists the event pages scheduled for one sport on one day.
pub struct EventListScraper<'a> {
    ctx: &'a ScrapingContext,
}

impl<'a> EventListScraper<'a> {
    pub fn new(ctx: &'a ScrapingContext) -> Self {
        Self { ctx }
    }

    pub async fn scrape(&self, date: NaiveDate, sport: Sport) -> anyhow::Result<Vec<String>> {
        let config = &self.ctx.scraping_config;
        let url = config.get_event_list_url(sport, date);
        debug!("Listing {} events for {} from {}", sport, date, url);

        let request = self
            .ctx
            .request_client
            .get(&url)
            .query(&[("_", "/")])
            .header(REFERER, config.get_referer(sport, date));
        let response: EventListResponse = self.ctx.request_client.fetch_json(request).await?;

        Ok(event_urls(config.site_origin(), response))
    }
}

pub fn event_urls(origin: &str, response: EventListResponse) -> Vec<String> {
    response
        .d
        .rows
        .into_iter()
        .map(|row| get_html_link_to_page(origin, &row.url))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScrapingConfig, ScrapingEnv};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context_for(server: &MockServer) -> ScrapingContext {
        let scraping_env: ScrapingEnv = envy::from_iter(vec![
            ("SITE_ORIGIN".to_string(), server.uri()),
            ("REQUESTS_PER_SEC".to_string(), "50".to_string()),
        ])
        .unwrap();
        ScrapingContext::with_config(ScrapingConfig::from_env(scraping_env).unwrap()).unwrap()
    }

    #[test]
    fn rows_are_prefixed_with_origin() {
        let response: EventListResponse = serde_json::from_value(json!({
            "s": 1,
            "d": {
                "total": 2,
                "rows": [
                    {"id": "a", "url": "/football/czech-republic/division-e/brno-bzenec-0x81ByeF/"},
                    {"id": "b", "url": "/football/england/premier-league/x-y-abc/"}
                ]
            }
        }))
        .unwrap();

        assert_eq!(
            event_urls("https://www.oddsportal.com", response),
            vec![
                "https://www.oddsportal.com/football/czech-republic/division-e/brno-bzenec-0x81ByeF/",
                "https://www.oddsportal.com/football/england/premier-league/x-y-abc/",
            ]
        );
    }

    #[test]
    fn missing_rows_means_no_events() {
        let response: EventListResponse = serde_json::from_value(json!({"d": {}})).unwrap();
        assert!(event_urls("https://www.oddsportal.com", response).is_empty());
    }

    #[tokio::test]
    async fn fetches_the_day_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ajax-nextgames/1/-4/1/20230514/yje83.dat"))
            .and(query_param("_", "/"))
            .and(header("x-requested-with", "XMLHttpRequest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "d": {"rows": [{"url": "/football/a/b-1/"}, {"url": "/football/a/c-2/"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context_for(&server);
        let date = NaiveDate::from_ymd_opt(2023, 5, 14).unwrap();
        let urls = EventListScraper::new(&ctx)
            .scrape(date, Sport::Football)
            .await
            .unwrap();

        assert_eq!(
            urls,
            vec![
                format!("{}/football/a/b-1/", server.uri()),
                format!("{}/football/a/c-2/", server.uri()),
            ]
        );
    }

    #[tokio::test]
    async fn server_errors_are_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let ctx = context_for(&server);
        let date = NaiveDate::from_ymd_opt(2023, 5, 14).unwrap();
        let result = EventListScraper::new(&ctx).scrape(date, Sport::Football).await;

        assert!(result.is_err());
    }
}
