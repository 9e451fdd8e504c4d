//! `/now`: who is on call and which events are coming up, for the status page.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::warn;

use oncall_core::{Entry, Rotation};

use super::{api_error, ApiError, OnParams};
use crate::duration::event_duration;
use crate::sources::{self, RotationSource, SourceKind};
use crate::state::AppState;

const DATE_LAYOUT: &str = "%B %-d, %Y";
const GITHUB_PREFIX: &str = "https://github.com/";

#[derive(Debug, Serialize, Deserialize)]
pub struct NowResponse {
    pub support: Vec<Tier>,
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub title: String,
    pub on_call: OnCall,
    pub next: Option<OnCall>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnCall {
    pub name: String,
    pub start: String,
    pub end: String,
    pub github: String,
    pub questions: String,
    pub questions_slack: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    #[serde(rename = "wg")]
    pub working_group: String,
    pub when: String,
}

pub async fn now(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OnParams>,
) -> Result<Json<NowResponse>, ApiError> {
    let on = params.instant()?;
    let sources = state
        .sources()
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut response = NowResponse {
        support: Vec::new(),
        events: Vec::new(),
    };
    for (source, rotation) in sources::load_ok(&sources, &state.http).await {
        match source.kind {
            SourceKind::Support => response.support.extend(tier(source, &rotation, on)),
            SourceKind::Event => response.events.extend(event(source, &rotation, on)),
        }
    }
    Ok(Json(response))
}

fn tier(source: &RotationSource, rotation: &Rotation, on: DateTime<FixedOffset>) -> Option<Tier> {
    let current = match rotation.at(on) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(source = %source.name, error = %e, "Skipping rotation");
            return None;
        }
    };
    let next = rotation.next(on);
    Some(Tier {
        title: rotation.meta("title").unwrap_or(source.name.as_str()).to_string(),
        on_call: on_call(rotation, &current),
        next: (next.start > on).then(|| on_call(rotation, &next)),
    })
}

fn on_call(rotation: &Rotation, entry: &Entry) -> OnCall {
    let handle = entry.handle().unwrap_or_default();
    let github = if entry.is_sentinel() || handle.is_empty() {
        String::new()
    } else {
        format!("{GITHUB_PREFIX}{handle}")
    };
    OnCall {
        name: handle.to_string(),
        start: entry.start.format(DATE_LAYOUT).to_string(),
        end: entry.end.format(DATE_LAYOUT).to_string(),
        github,
        questions: rotation.meta("slack").unwrap_or_default().to_string(),
        questions_slack: rotation.meta("slacklink").unwrap_or_default().to_string(),
    }
}

/// The event in progress at `on`, else the next one; finished events are omitted.
fn event(source: &RotationSource, rotation: &Rotation, on: DateTime<FixedOffset>) -> Option<Event> {
    let duration = event_duration(rotation.meta("duration"));
    let current = match rotation.at(on) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(source = %source.name, error = %e, "Skipping event rotation");
            return None;
        }
    };
    let running = occurrence(current, duration).filter(|e| !e.is_sentinel() && e.contains(on));
    let entry = match running {
        Some(entry) => entry,
        None => match occurrence(rotation.next(on), duration) {
            Some(entry) => entry,
            None => {
                warn!(source = %source.name, "Event end out of range, skipping");
                return None;
            }
        },
    };
    if entry.is_sentinel() || entry.end <= on {
        return None;
    }

    let zone = if entry.start.offset().local_minus_utc() == 0 {
        "UTC".to_string()
    } else {
        entry.start.format("%:z").to_string()
    };
    Some(Event {
        title: rotation.meta("title").unwrap_or(source.name.as_str()).to_string(),
        working_group: entry.data.join(" "),
        when: format!(
            "{} – {} {}",
            entry.start.format("%B %-d, %Y @ %H:%M"),
            entry.end.format("%H:%M"),
            zone
        ),
    })
}

/// The entry narrowed to one event of length `duration`; `None` if the end
/// is not representable.
fn occurrence(entry: Entry, duration: TimeDelta) -> Option<Entry> {
    let end = entry.start.checked_add_signed(duration)?;
    Some(Entry { end, ..entry })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{DateTime, TimeDelta, Utc};

    use oncall_core::Entry;

    use super::occurrence;
    use crate::api::test_support::{app, get, write};

    const SERVING: &str = "# Serving oncall
#@ title: Serving
#@ slack: #serving-api
#@ slacklink: https://slack.example/serving
2021-03-01T01:00:00Z | alice
2021-03-08T01:00:00Z | bob
";

    const TOC: &str = "#@ title: ToC Working Group Update
#@ duration: 45m
2021-03-04T16:30:00Z | Networking WG
2021-03-11T16:30:00Z | Serving WG
";

    fn seed(root: &std::path::Path) {
        write(root, "rotations/serving.txt", SERVING);
        write(root, "events/toc.txt", TOC);
    }

    #[tokio::test]
    async fn now_reports_current_and_next_oncall() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path());

        let (status, body) = get(app(tmp.path()), "/now?on=2021-03-02T00:00:00Z").await;
        assert_eq!(status, StatusCode::OK);

        let tier = &body["support"][0];
        assert_eq!(tier["title"], "Serving");
        assert_eq!(tier["onCall"]["name"], "alice");
        assert_eq!(tier["onCall"]["start"], "March 1, 2021");
        assert_eq!(tier["onCall"]["end"], "March 8, 2021");
        assert_eq!(tier["onCall"]["github"], "https://github.com/alice");
        assert_eq!(tier["onCall"]["questions"], "#serving-api");
        assert_eq!(tier["onCall"]["questionsSlack"], "https://slack.example/serving");
        assert_eq!(tier["next"]["name"], "bob");
    }

    #[tokio::test]
    async fn now_moves_with_the_on_parameter() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path());

        let (_, body) = get(app(tmp.path()), "/now?on=2021-03-09T00:00:00Z").await;
        assert_eq!(body["support"][0]["onCall"]["name"], "bob");
        assert!(body["support"][0]["next"].is_null());

        let (_, body) = get(app(tmp.path()), "/now?on=2021-01-01T00:00:00Z").await;
        let on_call = &body["support"][0]["onCall"];
        assert_eq!(on_call["name"], "before rotation");
        assert_eq!(on_call["github"], "");
        assert_eq!(on_call["end"], "March 1, 2021");
    }

    #[tokio::test]
    async fn now_reports_upcoming_and_running_events() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path());

        let (_, body) = get(app(tmp.path()), "/now?on=2021-03-02T00:00:00Z").await;
        let event = &body["events"][0];
        assert_eq!(event["title"], "ToC Working Group Update");
        assert_eq!(event["wg"], "Networking WG");
        assert_eq!(event["when"], "March 4, 2021 @ 16:30 – 17:15 UTC");

        // Ten minutes into the first event it is still the one shown.
        let (_, body) = get(app(tmp.path()), "/now?on=2021-03-04T16:40:00Z").await;
        assert_eq!(body["events"][0]["wg"], "Networking WG");

        // After it ends, the next one takes over.
        let (_, body) = get(app(tmp.path()), "/now?on=2021-03-04T17:15:00Z").await;
        assert_eq!(body["events"][0]["wg"], "Serving WG");

        // Past the last event nothing is shown.
        let (_, body) = get(app(tmp.path()), "/now?on=2021-04-01T00:00:00Z").await;
        assert_eq!(body["events"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn oversized_event_duration_falls_back_to_an_hour() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "rotations/serving.txt", SERVING);
        write(
            tmp.path(),
            "events/toc.txt",
            "#@ duration: 99999999999d\n2021-03-04T16:30:00Z | Networking WG\n",
        );

        let (status, body) = get(app(tmp.path()), "/now?on=2021-03-02T00:00:00Z").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["support"][0]["onCall"]["name"], "alice");
        assert_eq!(body["events"][0]["when"], "March 4, 2021 @ 16:30 – 17:30 UTC");
    }

    #[test]
    fn occurrence_past_the_calendar_is_none() {
        let last = DateTime::<Utc>::MAX_UTC.fixed_offset();
        let entry = Entry {
            start: last,
            end: last,
            data: vec!["late".to_string()],
        };
        assert!(occurrence(entry.clone(), TimeDelta::hours(1)).is_none());

        let early = Entry {
            start: DateTime::<Utc>::UNIX_EPOCH.fixed_offset(),
            ..entry
        };
        let event = occurrence(early, TimeDelta::hours(1)).unwrap();
        assert_eq!(event.end - event.start, TimeDelta::hours(1));
    }

    #[tokio::test]
    async fn broken_and_empty_rotations_are_omitted() {
        let tmp = tempfile::tempdir().unwrap();
        seed(tmp.path());
        write(tmp.path(), "rotations/broken.txt", "2021-03-11T01:00:00Z oops, i did it again\n");
        write(tmp.path(), "rotations/empty.txt", "#@ title: Nobody yet\n");

        let (status, body) = get(app(tmp.path()), "/now?on=2021-03-02T00:00:00Z").await;
        assert_eq!(status, StatusCode::OK);
        let support = body["support"].as_array().unwrap();
        assert_eq!(support.len(), 1);
        assert_eq!(support[0]["title"], "Serving");
    }

    #[tokio::test]
    async fn now_rejects_bad_on_parameter() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, body) = get(app(tmp.path()), "/now?on=next-tuesday").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("next-tuesday"));
    }

    #[tokio::test]
    async fn now_without_sources_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let (status, body) = get(app(tmp.path()), "/now").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["support"].as_array().unwrap().len(), 0);
        assert_eq!(body["events"].as_array().unwrap().len(), 0);
    }
}
