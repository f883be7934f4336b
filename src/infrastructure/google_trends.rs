// Google Trends client implementation
use crate::application::errors::UpstreamError;
use crate::application::trend_source::{TrendQuery, TrendSource};
use crate::domain::sample::RawSample;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

const TIMESERIES_WIDGET_ID: &str = "TIMESERIES";

#[derive(Debug, Clone)]
pub struct GoogleTrendsClient {
    client: reqwest::Client,
    base_url: String,
    language: String,
    timezone_offset: i32,
    topic_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    default: AutocompleteDefault,
}

#[derive(Debug, Deserialize)]
struct AutocompleteDefault {
    #[serde(default)]
    topics: Vec<KeywordTopic>,
}

#[derive(Debug, Deserialize)]
struct KeywordTopic {
    mid: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type", default)]
    topic_type: String,
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    #[serde(default)]
    widgets: Vec<ExploreWidget>,
}

#[derive(Debug, Deserialize)]
struct ExploreWidget {
    #[serde(default)]
    id: String,
    token: String,
    request: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct MultilineResponse {
    default: MultilineDefault,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MultilineDefault {
    #[serde(default)]
    timeline_data: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelinePoint {
    time: String,
    #[serde(default)]
    formatted_axis_time: String,
    #[serde(default)]
    value: Vec<f64>,
    #[serde(default)]
    formatted_value: Vec<String>,
}

impl GoogleTrendsClient {
    pub fn new(
        base_url: String,
        language: String,
        timezone_offset: i32,
        topic_type: Option<String>,
    ) -> Result<Self, UpstreamError> {
        // The API rejects requests that do not carry the session cookie it
        // hands out on the first response.
        let client = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            language,
            timezone_offset,
            topic_type: topic_type.filter(|t| !t.is_empty()),
        })
    }

    fn build_url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!(
            "{}{}?hl={}&tz={}",
            self.base_url,
            path,
            urlencoding::encode(&self.language),
            self.timezone_offset
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        tracing::debug!("Requesting {}", url);
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        let body = response.text().await?;
        parse_guarded_json(&body)
    }

    /// Replace the keyword with the entity id of the first autocomplete topic
    /// of the configured type, keeping the plain keyword otherwise.
    async fn resolve_keyword(&self, keyword: &str) -> Result<String, UpstreamError> {
        let Some(topic_type) = &self.topic_type else {
            return Ok(keyword.to_string());
        };

        let path = format!("/trends/api/autocomplete/{}", urlencoding::encode(keyword));
        let url = self.build_url(&path, &[]);
        let response: AutocompleteResponse = self.get_json(&url).await?;

        for topic in &response.default.topics {
            tracing::debug!(mid = %topic.mid, title = %topic.title, topic_type = %topic.topic_type, "Autocomplete topic");
        }

        Ok(select_topic(&response.default.topics, topic_type)
            .map(|topic| topic.mid.clone())
            .unwrap_or_else(|| keyword.to_string()))
    }

    async fn explore(&self, keyword: &str, query: &TrendQuery) -> Result<ExploreWidget, UpstreamError> {
        let request = json!({
            "comparisonItem": [{
                "keyword": keyword,
                "geo": query.geo,
                "time": query.time_range,
            }],
            "category": query.category,
            "property": "",
        });
        let url = self.build_url("/trends/api/explore", &[("req", &request.to_string())]);
        let response: ExploreResponse = self.get_json(&url).await?;

        select_timeseries_widget(response.widgets).ok_or(UpstreamError::NoTimeseriesWidget)
    }

    async fn interest_over_time(&self, widget: &ExploreWidget) -> Result<Vec<TimelinePoint>, UpstreamError> {
        let url = self.build_url(
            "/trends/api/widgetdata/multiline",
            &[("req", &widget.request.to_string()), ("token", &widget.token)],
        );
        let response: MultilineResponse = self.get_json(&url).await?;
        Ok(response.default.timeline_data)
    }
}

#[async_trait]
impl TrendSource for GoogleTrendsClient {
    async fn fetch_window(&self, query: &TrendQuery) -> Result<Vec<RawSample>, UpstreamError> {
        let keyword = self.resolve_keyword(&query.keyword).await?;
        tracing::debug!(keyword = %query.keyword, resolved = %keyword, "Resolved keyword");

        let widget = self.explore(&keyword, query).await?;
        let timeline = self.interest_over_time(&widget).await?;

        let samples = timeline
            .into_iter()
            .map(to_raw_sample)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(keyword = %query.keyword, samples = samples.len(), "Fetched interest over time");
        Ok(samples)
    }
}

/// Strip the `)]}'` guard the API prepends to every JSON body.
fn parse_guarded_json<T: DeserializeOwned>(body: &str) -> Result<T, UpstreamError> {
    let start = body
        .find(['{', '['])
        .ok_or_else(|| UpstreamError::Decode("response body contains no JSON".to_string()))?;
    serde_json::from_str(&body[start..]).map_err(|e| UpstreamError::Decode(e.to_string()))
}

fn select_topic<'a>(topics: &'a [KeywordTopic], topic_type: &str) -> Option<&'a KeywordTopic> {
    topics.iter().find(|topic| topic.topic_type == topic_type)
}

fn select_timeseries_widget(widgets: Vec<ExploreWidget>) -> Option<ExploreWidget> {
    let index = widgets
        .iter()
        .position(|w| w.id == TIMESERIES_WIDGET_ID)
        .unwrap_or(0);
    widgets.into_iter().nth(index)
}

fn to_raw_sample(point: TimelinePoint) -> Result<RawSample, UpstreamError> {
    let value = point
        .formatted_value
        .first()
        .and_then(|v| v.trim().parse::<f32>().ok())
        .or_else(|| point.value.first().map(|&v| v as f32));
    let Some(value) = value else {
        return Err(UpstreamError::MalformedSample {
            timestamp: point.time,
        });
    };

    let display_time = if point.formatted_axis_time.is_empty() {
        render_epoch(&point.time).unwrap_or_else(|| point.time.clone())
    } else {
        point.formatted_axis_time
    };

    Ok(RawSample {
        timestamp: point.time,
        display_time,
        value,
    })
}

fn render_epoch(time: &str) -> Option<String> {
    let seconds = time.parse::<i64>().ok()?;
    chrono::DateTime::from_timestamp(seconds, 0).map(|t| t.format("%b %-d at %-I:%M %p").to_string())
}
