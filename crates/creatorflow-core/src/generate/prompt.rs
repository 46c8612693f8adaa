//! Prompt and response-schema construction for schedule generation.
//!
//! Pure logic: no I/O. Prompt text is Vietnamese; generated titles and notes
//! reach the user verbatim.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Value, json};

use creatorflow_store::models::{Product, Task};

use crate::aging;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Preset time window the generated tasks must fit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shift {
    #[default]
    Full,
    Morning,
    Afternoon,
    Evening,
}

impl Shift {
    /// Textual window handed to the model.
    pub fn time_window(&self) -> &'static str {
        match self {
            Self::Full => "00:00 đến 23:59 (Hệ 24 giờ)",
            Self::Morning => "05:00 đến 12:00",
            Self::Afternoon => "12:00 đến 18:00",
            Self::Evening => "18:00 đến 02:00 (Sáng hôm sau)",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Full => "full",
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        };
        f.write_str(s)
    }
}

impl FromStr for Shift {
    type Err = ShiftParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            other => Err(ShiftParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Shift`] string.
#[derive(Debug, Clone)]
pub struct ShiftParseError(pub String);

impl fmt::Display for ShiftParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid shift {:?} (expected full, morning, afternoon, or evening)",
            self.0
        )
    }
}

impl std::error::Error for ShiftParseError {}

/// A user's request for an AI-generated day plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    /// Day every generated task is placed on.
    pub date: NaiveDate,
    pub shift: Shift,
    /// Free-text priorities; may be empty.
    pub focus: String,
}

impl ScheduleRequest {
    /// The user's focus, or [`DEFAULT_FOCUS`] when blank.
    pub fn effective_focus(&self) -> &str {
        let trimmed = self.focus.trim();
        if trimmed.is_empty() {
            DEFAULT_FOCUS
        } else {
            trimmed
        }
    }
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// Focus used when the user leaves the field empty.
pub const DEFAULT_FOCUS: &str = "Sắp xếp công việc thông minh, ưu tiên hàng tồn lâu ngày";

/// Inventory block used when there are no products.
pub const EMPTY_INVENTORY_HINT: &str =
    "(Kho đang trống - hãy tự gợi ý các task chung về sáng tạo nội dung)";

const NO_BOOKED_TASKS: &str = "(Chưa có task nào trong ngày)";

const ROLE: &str = "Bạn là AI Planner chuyên nghiệp cho Content Creator. \
                    Hệ thống hoạt động trên lịch 24 GIỜ.\n\n";

const DIRECTIVES: &str = r#"NHIỆM VỤ:
1. Phân bổ lịch trình hợp lý, không chồng chéo (kể cả với lịch đã có).
2. Sử dụng định dạng 24h (HH:mm).
3. **TRỌNG TÂM**: Ưu tiên sản phẩm có trạng thái "GẤP" hoặc "Ưu tiên" (chờ nhiều ngày).
4. **LIÊN KẾT**: Phải giữ đúng 'productId' để hệ thống truy vết.
5. **GHI CHÚ**: Notes phải cực kỳ chi tiết.
6. **KÊNH**: 'channel' phải trùng với kênh của sản phẩm trong kho.

CẤU TRÚC JSON: Array các đối tượng Task.
"#;

/// One inventory line: identity, placement, description, tags, and aging.
pub fn inventory_line(product: &Product, now: DateTime<Utc>) -> String {
    let report = aging::evaluate(product, now);
    let placement = match &product.sub_category {
        Some(sub) => format!("{} > {sub}", product.channel),
        None => product.channel.to_string(),
    };
    format!(
        "- ID: {} | Tên: {} | Kênh: {} | Mô tả: {} | Tags: {} | Trạng thái: {} (Chờ {} ngày)",
        product.id,
        product.name,
        placement,
        product.description,
        product.tags.join(", "),
        report.class.label(),
        report.days_pending
    )
}

/// Inventory section of the prompt, one aging-annotated line per product.
pub fn build_inventory_block(products: &[Product], now: DateTime<Utc>) -> String {
    if products.is_empty() {
        return EMPTY_INVENTORY_HINT.to_owned();
    }
    products
        .iter()
        .map(|p| inventory_line(p, now))
        .collect::<Vec<_>>()
        .join("\n")
}

fn booked_block(tasks: &[Task], date: NaiveDate) -> String {
    let mut booked: Vec<&Task> = tasks.iter().filter(|t| t.date == date).collect();
    if booked.is_empty() {
        return NO_BOOKED_TASKS.to_owned();
    }
    booked.sort_by_key(|t| t.start_time);
    booked
        .iter()
        .map(|t| {
            format!(
                "- {} ({} phút) [{}] {}",
                t.start_time, t.duration, t.channel, t.title
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full generation prompt.
///
/// Existing tasks on the requested day are listed as context only; nothing
/// downstream enforces non-overlap.
pub fn build_prompt(
    request: &ScheduleRequest,
    tasks: &[Task],
    products: &[Product],
    now: DateTime<Utc>,
) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(ROLE);

    prompt.push_str("NGỮ CẢNH:\n");
    prompt.push_str(&format!("- Ngày: {}.\n", request.date.format("%Y-%m-%d")));
    prompt.push_str(&format!(
        "- Khung giờ yêu cầu: {}.\n",
        request.shift.time_window()
    ));
    prompt.push_str(&format!(
        "- Mục tiêu của User: \"{}\"\n\n",
        request.effective_focus()
    ));

    prompt.push_str("LỊCH ĐÃ CÓ TRONG NGÀY:\n");
    prompt.push_str(&booked_block(tasks, request.date));
    prompt.push_str("\n\n");

    prompt.push_str("KHO HÀNG (Dữ liệu đầu vào):\n");
    prompt.push_str(&build_inventory_block(products, now));
    prompt.push_str("\n\n");

    prompt.push_str(DIRECTIVES);

    prompt
}

// ---------------------------------------------------------------------------
// Response schema
// ---------------------------------------------------------------------------

/// Fields every generated element must carry, in output order.
pub const CANDIDATE_FIELDS: [&str; 7] = [
    "productId",
    "title",
    "channel",
    "startTime",
    "duration",
    "priority",
    "notes",
];

/// Structured-output schema: an array of objects with exactly the
/// [`CANDIDATE_FIELDS`], all required.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "productId": { "type": "STRING" },
                "title": { "type": "STRING" },
                "channel": { "type": "STRING" },
                "startTime": { "type": "STRING" },
                "duration": { "type": "INTEGER" },
                "priority": { "type": "STRING" },
                "notes": { "type": "STRING" }
            },
            "required": CANDIDATE_FIELDS,
            "propertyOrdering": CANDIDATE_FIELDS
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use creatorflow_store::models::{ChannelName, ClockTime, Priority};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 3, 0, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn sample_product(id: &str, sub: Option<&str>, age_days: i64) -> Product {
        Product {
            id: id.to_owned(),
            name: format!("Sản phẩm {id}"),
            description: "Mô tả ngắn".to_owned(),
            channel: ChannelName::parse("Gia dụng").unwrap(),
            sub_category: sub.map(str::to_owned),
            image: None,
            tags: vec!["bếp".to_owned(), "review".to_owned()],
            created_at: now() - Duration::days(age_days),
            last_scheduled_at: None,
        }
    }

    fn sample_task(date: NaiveDate, start: &str, title: &str) -> Task {
        Task {
            id: "t".to_owned(),
            title: title.to_owned(),
            channel: ChannelName::parse("Đạo lý").unwrap(),
            date,
            start_time: start.parse::<ClockTime>().unwrap(),
            duration: 30,
            is_completed: false,
            priority: Priority::Low,
            notes: None,
            notion_synced: None,
            product_id: None,
        }
    }

    fn request(shift: Shift, focus: &str) -> ScheduleRequest {
        ScheduleRequest {
            date: date(),
            shift,
            focus: focus.to_owned(),
        }
    }

    // -- Shift --

    #[test]
    fn shift_windows_are_fixed() {
        assert_eq!(Shift::Full.time_window(), "00:00 đến 23:59 (Hệ 24 giờ)");
        assert_eq!(Shift::Morning.time_window(), "05:00 đến 12:00");
        assert_eq!(Shift::Afternoon.time_window(), "12:00 đến 18:00");
        assert!(Shift::Evening.time_window().starts_with("18:00 đến 02:00"));
    }

    #[test]
    fn shift_parse_roundtrip() {
        for shift in [Shift::Full, Shift::Morning, Shift::Afternoon, Shift::Evening] {
            assert_eq!(shift.to_string().parse::<Shift>().unwrap(), shift);
        }
        assert!("night".parse::<Shift>().is_err());
    }

    // -- inventory --

    #[test]
    fn inventory_line_includes_subcategory_and_aging() {
        let line = inventory_line(&sample_product("p1", Some("Đồ nhà bếp"), 20), now());
        assert!(line.contains("ID: p1"));
        assert!(line.contains("Kênh: Gia dụng > Đồ nhà bếp"));
        assert!(line.contains("Tags: bếp, review"));
        assert!(line.contains("CẦN XỬ LÝ GẤP"));
        assert!(line.contains("(Chờ 20 ngày)"));
    }

    #[test]
    fn empty_inventory_uses_hint() {
        assert_eq!(build_inventory_block(&[], now()), EMPTY_INVENTORY_HINT);
    }

    // -- build_prompt --

    #[test]
    fn prompt_contains_context() {
        let prompt = build_prompt(&request(Shift::Morning, "Quay video bếp"), &[], &[], now());
        assert!(prompt.contains("Ngày: 2024-06-01."));
        assert!(prompt.contains("Khung giờ yêu cầu: 05:00 đến 12:00."));
        assert!(prompt.contains("\"Quay video bếp\""));
    }

    #[test]
    fn blank_focus_falls_back_to_default() {
        let prompt = build_prompt(&request(Shift::Full, "   "), &[], &[], now());
        assert!(prompt.contains(DEFAULT_FOCUS));
    }

    #[test]
    fn prompt_contains_directives() {
        let prompt = build_prompt(&request(Shift::Full, ""), &[], &[], now());
        assert!(prompt.contains("không chồng chéo"));
        assert!(prompt.contains("định dạng 24h"));
        assert!(prompt.contains("'productId'"));
        assert!(prompt.contains("Notes phải cực kỳ chi tiết"));
    }

    #[test]
    fn prompt_lists_only_same_day_tasks_in_order() {
        let other_day = date().succ_opt().unwrap();
        let tasks = vec![
            sample_task(date(), "14:00", "Buổi chiều"),
            sample_task(other_day, "07:00", "Ngày mai"),
            sample_task(date(), "08:00", "Buổi sáng"),
        ];
        let prompt = build_prompt(&request(Shift::Full, ""), &tasks, &[], now());
        assert!(!prompt.contains("Ngày mai"));
        let morning = prompt.find("08:00 (30 phút) [Đạo lý] Buổi sáng").unwrap();
        let afternoon = prompt.find("14:00 (30 phút) [Đạo lý] Buổi chiều").unwrap();
        assert!(morning < afternoon);
    }

    #[test]
    fn prompt_without_booked_tasks_says_so() {
        let prompt = build_prompt(&request(Shift::Full, ""), &[], &[], now());
        assert!(prompt.contains(NO_BOOKED_TASKS));
    }

    // -- schema --

    #[test]
    fn schema_requires_exactly_seven_fields() {
        let schema = response_schema();
        assert_eq!(schema["type"], "ARRAY");
        let item = &schema["items"];
        assert_eq!(item["type"], "OBJECT");
        let props = item["properties"].as_object().unwrap();
        assert_eq!(props.len(), 7);
        assert_eq!(item["required"].as_array().unwrap().len(), 7);
        assert_eq!(props["duration"]["type"], "INTEGER");
        for field in CANDIDATE_FIELDS {
            assert!(props.contains_key(field), "missing {field}");
        }
    }
}
