//! Schedule generation client: builds the request, calls the backend, and
//! validates the answer into candidate tasks.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, error, info};

use creatorflow_store::models::{ChannelName, ClockTime, Priority, Product, Task, new_id};

use super::GenerationError;
use super::backend::{CompletionBackend, CompletionRequest};
use super::prompt::{ScheduleRequest, build_prompt, response_schema};

/// One element of the model's answer. Fields outside the schema are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCandidate {
    product_id: String,
    title: String,
    channel: String,
    start_time: String,
    duration: u32,
    priority: String,
    notes: String,
}

/// Strip an optional Markdown code fence around the payload.
fn unfence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Validate raw model output into candidate tasks placed on `date`.
///
/// Every element must carry all candidate fields with the right types; one
/// bad element rejects the whole answer. Each candidate gets a fresh id, is
/// not completed, is not synced, and is forced onto `date`. Unknown
/// priorities become `Medium` and an empty `productId` means no product.
pub fn parse_candidates(raw: &str, date: NaiveDate) -> Result<Vec<Task>, GenerationError> {
    let payload = unfence(raw);
    if payload.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let value: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| GenerationError::MalformedJson(e.to_string()))?;
    let raw_candidates: Vec<RawCandidate> =
        serde_json::from_value(value).map_err(|e| GenerationError::Schema(e.to_string()))?;

    raw_candidates
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| {
            let channel = ChannelName::parse(&raw.channel)
                .map_err(|e| GenerationError::Schema(format!("element {idx}: {e}")))?;
            let start_time: ClockTime = raw
                .start_time
                .parse()
                .map_err(|e| GenerationError::Schema(format!("element {idx}: {e}")))?;
            let product_id = Some(raw.product_id.trim().to_owned()).filter(|id| !id.is_empty());

            Ok(Task {
                id: new_id(),
                title: raw.title,
                channel,
                date,
                start_time,
                duration: raw.duration,
                is_completed: false,
                priority: Priority::coerce(&raw.priority),
                notes: Some(raw.notes),
                notion_synced: Some(false),
                product_id,
            })
        })
        .collect()
}

/// Turns a [`ScheduleRequest`] into candidate tasks via a completion backend.
#[derive(Clone)]
pub struct ScheduleGenerator {
    backend: Arc<dyn CompletionBackend>,
}

impl ScheduleGenerator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate candidates, surfacing why generation failed.
    pub async fn try_generate(
        &self,
        request: &ScheduleRequest,
        tasks: &[Task],
        products: &[Product],
        now: DateTime<Utc>,
    ) -> Result<Vec<Task>, GenerationError> {
        let completion = CompletionRequest {
            prompt: build_prompt(request, tasks, products, now),
            response_schema: response_schema(),
        };
        debug!(
            backend = self.backend.name(),
            date = %request.date,
            shift = %request.shift,
            products = products.len(),
            "requesting schedule"
        );

        let raw = self.backend.complete(&completion).await?;
        let candidates = parse_candidates(&raw, request.date)?;
        info!(count = candidates.len(), date = %request.date, "schedule generated");
        Ok(candidates)
    }

    /// Generate candidates; any failure is logged and yields an empty list.
    pub async fn generate(
        &self,
        request: &ScheduleRequest,
        tasks: &[Task],
        products: &[Product],
        now: DateTime<Utc>,
    ) -> Vec<Task> {
        match self.try_generate(request, tasks, products, now).await {
            Ok(candidates) => candidates,
            Err(e) => {
                error!(backend = self.backend.name(), error = %e, "schedule generation failed");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for ScheduleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduleGenerator")
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Mutex;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn candidate(priority: &str) -> serde_json::Value {
        json!({
            "productId": "p1",
            "title": "Quay nồi chiên",
            "channel": "Gia dụng",
            "startTime": "08:00",
            "duration": 60,
            "priority": priority,
            "notes": "Cảnh mở hộp, cận cảnh nút bấm"
        })
    }

    /// Returns a fixed answer and records the prompt it was sent.
    struct CannedBackend {
        answer: Result<String, GenerationError>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl CannedBackend {
        fn new(answer: Result<String, GenerationError>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for CannedBackend {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push(request.clone());
            self.answer.clone()
        }
    }

    #[test]
    fn parses_valid_answer() {
        let raw = json!([candidate("High")]).to_string();
        let tasks = parse_candidates(&raw, date()).unwrap();
        assert_eq!(tasks.len(), 1);
        let t = &tasks[0];
        assert_eq!(t.title, "Quay nồi chiên");
        assert_eq!(t.channel.as_str(), "Gia dụng");
        assert_eq!(t.start_time.to_string(), "08:00");
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.product_id.as_deref(), Some("p1"));
        assert_eq!(t.notes.as_deref(), Some("Cảnh mở hộp, cận cảnh nút bấm"));
        assert!(!t.is_completed);
        assert_eq!(t.notion_synced, Some(false));
        assert!(!t.id.is_empty());
    }

    #[test]
    fn unknown_priority_becomes_medium() {
        let raw = json!([candidate("Urgent")]).to_string();
        let tasks = parse_candidates(&raw, date()).unwrap();
        assert_eq!(tasks[0].priority, Priority::Medium);
    }

    #[test]
    fn date_is_forced_and_ids_are_fresh() {
        let raw = json!([candidate("Low"), candidate("Low")]).to_string();
        let tasks = parse_candidates(&raw, date()).unwrap();
        assert!(tasks.iter().all(|t| t.date == date()));
        assert_ne!(tasks[0].id, tasks[1].id);
    }

    #[test]
    fn model_supplied_date_is_overridden() {
        let mut element = candidate("Low");
        element["date"] = json!("2030-01-01");
        let tasks = parse_candidates(&json!([element]).to_string(), date()).unwrap();
        assert_eq!(tasks[0].date, date());
    }

    #[test]
    fn empty_product_id_means_no_product() {
        let mut element = candidate("Low");
        element["productId"] = json!("");
        let tasks = parse_candidates(&json!([element]).to_string(), date()).unwrap();
        assert_eq!(tasks[0].product_id, None);
    }

    #[test]
    fn empty_notes_are_kept() {
        let mut element = candidate("Low");
        element["notes"] = json!("");
        let tasks = parse_candidates(&json!([element]).to_string(), date()).unwrap();
        assert_eq!(tasks[0].notes.as_deref(), Some(""));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            parse_candidates("[{\"title\": ", date()),
            Err(GenerationError::MalformedJson(_))
        ));
    }

    #[test]
    fn missing_field_is_a_schema_error() {
        let mut element = candidate("High");
        element.as_object_mut().unwrap().remove("notes");
        assert!(matches!(
            parse_candidates(&json!([element]).to_string(), date()),
            Err(GenerationError::Schema(_))
        ));
    }

    #[test]
    fn bad_start_time_or_blank_channel_rejects_answer() {
        let mut late = candidate("High");
        late["startTime"] = json!("25:00");
        let raw = json!([candidate("High"), late]).to_string();
        assert!(matches!(
            parse_candidates(&raw, date()),
            Err(GenerationError::Schema(_))
        ));

        let mut blank = candidate("High");
        blank["channel"] = json!("  ");
        assert!(matches!(
            parse_candidates(&json!([blank]).to_string(), date()),
            Err(GenerationError::Schema(_))
        ));
    }

    #[test]
    fn object_instead_of_array_is_a_schema_error() {
        let raw = candidate("High").to_string();
        assert!(matches!(
            parse_candidates(&raw, date()),
            Err(GenerationError::Schema(_))
        ));
    }

    #[test]
    fn blank_and_fenced_payloads() {
        assert_eq!(
            parse_candidates("  \n", date()),
            Err(GenerationError::EmptyResponse)
        );
        assert_eq!(parse_candidates("[]", date()), Ok(vec![]));
        let fenced = format!("```json\n{}\n```", json!([candidate("Low")]));
        assert_eq!(parse_candidates(&fenced, date()).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn generate_sends_prompt_and_schema() {
        let backend = CannedBackend::new(Ok(json!([candidate("High")]).to_string()));
        let generator = ScheduleGenerator::new(backend.clone());
        let request = ScheduleRequest {
            date: date(),
            shift: Default::default(),
            focus: String::new(),
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0).unwrap();

        let tasks = generator.generate(&request, &[], &[], now).await;
        assert_eq!(tasks.len(), 1);

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].prompt.contains("2024-06-01"));
        assert_eq!(seen[0].response_schema, response_schema());
    }

    #[tokio::test]
    async fn generate_swallows_backend_failure() {
        let backend = CannedBackend::new(Err(GenerationError::Transport("offline".to_owned())));
        let generator = ScheduleGenerator::new(backend);
        let request = ScheduleRequest {
            date: date(),
            shift: Default::default(),
            focus: "review".to_owned(),
        };
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0).unwrap();

        assert!(generator.generate(&request, &[], &[], now).await.is_empty());
        assert_eq!(
            generator.try_generate(&request, &[], &[], now).await,
            Err(GenerationError::Transport("offline".to_owned()))
        );
    }
}
