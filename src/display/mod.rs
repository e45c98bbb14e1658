//! Terminal rendering of paper listings and paper requests.

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::remote::{PaperRequest, PaperSummary, RequestStatus};

const TITLE_WIDTH: usize = 48;

/// A row in the paper listing table
#[derive(Tabled)]
struct PaperRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Course")]
    course: String,
    #[tabled(rename = "Exam")]
    exam: String,
    #[tabled(rename = "Views")]
    views: u64,
    #[tabled(rename = "Downloads")]
    downloads: u64,
    #[tabled(rename = "Fav")]
    favorite: String,
}

impl From<&PaperSummary> for PaperRow {
    fn from(paper: &PaperSummary) -> Self {
        Self {
            id: paper.id.clone(),
            title: truncate(&paper.title, TITLE_WIDTH),
            course: paper.course_label().to_string(),
            exam: format_exam(paper),
            views: paper.views,
            downloads: paper.downloads,
            favorite: format_favorite(paper.is_favorite, paper.favorites_count),
        }
    }
}

/// "Mid Term 2024 S3", skipping whatever is missing
pub fn format_exam(paper: &PaperSummary) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !paper.exam_type.is_empty() {
        parts.push(paper.exam_type.clone());
    }
    if !paper.year.is_empty() {
        parts.push(paper.year.clone());
    }
    if !paper.semester.is_empty() {
        parts.push(format!("S{}", paper.semester));
    }
    parts.join(" ")
}

/// Favorite marker with the favorites count
pub fn format_favorite(is_favorite: bool, count: u64) -> String {
    if is_favorite {
        format!("{} {count}", "★".yellow())
    } else {
        format!("☆ {count}")
    }
}

/// Shorten `text` to at most `max` characters, ending in an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Render papers as a rounded table
pub fn format_paper_table(papers: &[PaperSummary]) -> String {
    let rows: Vec<PaperRow> = papers.iter().map(PaperRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

#[derive(Tabled)]
struct RequestRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Course")]
    course: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Exam")]
    exam: String,
    #[tabled(rename = "By")]
    requested_by: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&PaperRequest> for RequestRow {
    fn from(request: &PaperRequest) -> Self {
        let exam = PaperSummary {
            exam_type: request.exam_type.clone(),
            year: request.year.clone(),
            semester: request.semester.clone(),
            ..Default::default()
        };
        Self {
            id: request.id.clone(),
            course: truncate(&request.course_name, TITLE_WIDTH),
            code: request.course_code.to_uppercase(),
            exam: or_dash(format_exam(&exam)),
            requested_by: or_dash(request.requested_by.clone()),
            status: format_status(request.status),
        }
    }
}

fn or_dash(value: String) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value
    }
}

pub fn format_status(status: RequestStatus) -> String {
    match status {
        RequestStatus::Pending => status.as_str().yellow().to_string(),
        RequestStatus::Fulfilled => status.as_str().green().to_string(),
        RequestStatus::Rejected => status.as_str().red().to_string(),
    }
}

/// Render paper requests as a rounded table
pub fn format_request_table(requests: &[PaperRequest]) -> String {
    let rows: Vec<RequestRow> = requests.iter().map(RequestRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}
