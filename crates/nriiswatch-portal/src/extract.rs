//! List-page extraction.
//!
//! A pure function over the fetched document: no network, no state.
//! Anything malformed degrades to "nothing extracted" rather than an
//! error; the workflow decides what a count/row mismatch means.

use std::sync::OnceLock;

use regex::Regex;

use nriiswatch_core::config::PortalSelectors;
use nriiswatch_core::types::{ListSnapshot, ProposalRecord};

use crate::html;

/// Minimum cells a grid row must have to be considered well-formed.
const MIN_CELLS: usize = 9;

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").unwrap())
}

fn researcher_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"นักวิจัย\s*:\s*(.*)").unwrap())
}

fn department_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"คณะ(.*)").unwrap())
}

/// Extract the pending count and proposal rows from the list page.
pub fn parse_list_page(doc: &str, selectors: &PortalSelectors) -> ListSnapshot {
    ListSnapshot {
        count: parse_count(doc, &selectors.count_label),
        rows: parse_rows(doc, selectors),
    }
}

/// First run of digits in the count label's text, 0 when the label is
/// absent or carries no number.
fn parse_count(doc: &str, count_label: &str) -> u32 {
    let Some(block) = html::id_block(doc, count_label, "</span>") else {
        return 0;
    };
    let label = html::text(block);
    digits_re()
        .find(&label)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

fn parse_rows(doc: &str, selectors: &PortalSelectors) -> Vec<ProposalRecord> {
    let Some(table) = html::id_block(doc, &selectors.grid_table, "</table>") else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    let mut pos = 0usize;
    let mut index = 0usize;
    while let Some((start, end)) = html::next_block(table, "<tr", "</tr>", pos) {
        let tr = &table[start..end];
        pos = end;
        index += 1;
        // Row 0 is the header.
        if index == 1 {
            continue;
        }
        if let Some(record) = parse_row(tr, selectors) {
            rows.push(record);
        }
    }
    rows
}

/// One grid row. Rows with fewer than [`MIN_CELLS`] cells are malformed
/// filler (pager rows, spacer rows) and are skipped.
fn parse_row(tr: &str, selectors: &PortalSelectors) -> Option<ProposalRecord> {
    let mut cells = Vec::new();
    let mut pos = 0usize;
    while let Some((start, end)) = html::next_block(tr, "<td", "</td>", pos) {
        cells.push(&tr[start..end]);
        pos = end;
    }
    if cells.len() < MIN_CELLS {
        return None;
    }

    // Cell 2 fuses title, researcher and department into one blob; the
    // title is the anchor text, the rest is split by its Thai labels.
    let title_cell = cells[2];
    let combined = html::text(title_cell);
    let title = html::next_block(title_cell, "<a", "</a>", 0)
        .map(|(s, e)| html::text(&title_cell[s..e]))
        .unwrap_or_default();

    let researcher = researcher_re()
        .captures(&combined)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split("คณะ").next().unwrap_or("").trim().to_string())
        .unwrap_or_default();

    let department = department_re()
        .captures(&combined)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    let deadline = cells
        .get(9)
        .and_then(|cell| html::text_of_id_fragment(cell, &selectors.deadline_fragment))
        .unwrap_or_default();

    Some(ProposalRecord {
        id: html::text(cells[0]),
        title,
        researcher,
        department,
        budget: html::text(cells[3]),
        funding_source: html::text(cells[4]),
        funding_agency: html::text(cells[5]),
        status: html::text(cells[6]),
        deadline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selectors() -> PortalSelectors {
        PortalSelectors::default()
    }

    fn grid_row(id: &str, title: &str, researcher: &str, dept: &str, deadline: &str) -> String {
        format!(
            concat!(
                "<tr class=\"grid\">",
                "<td>{id}</td>",
                "<td>1</td>",
                "<td><a href=\"Detail.aspx\">{title}</a><br/>นักวิจัย : {researcher} คณะ{dept}</td>",
                "<td>1,200,000</td>",
                "<td>สกสว.</td>",
                "<td>วช.</td>",
                "<td>รอการรับรอง</td>",
                "<td>-</td>",
                "<td>-</td>",
                "<td><span id=\"ctl00_g_lbHAEnddate_0\">{deadline}</span></td>",
                "</tr>"
            ),
            id = id,
            title = title,
            researcher = researcher,
            dept = dept,
            deadline = deadline,
        )
    }

    fn list_page(count_text: &str, rows: &[String]) -> String {
        format!(
            "<html><body>\
             <span id=\"ctl00_ContentDetail_lbN\">{count_text}</span>\
             <table id=\"ctl00_ContentDetail_gv_wait\" class=\"grid\">\
             <tr><th>รหัส</th><th>ปี</th><th>โครงการ</th></tr>{}</table>\
             </body></html>",
            rows.concat()
        )
    }

    #[test]
    fn count_is_first_digit_run_in_label() {
        let doc = list_page("รอการพิจารณา 12 โครงการ", &[]);
        assert_eq!(parse_count(&doc, "ctl00_ContentDetail_lbN"), 12);
    }

    #[test]
    fn count_defaults_to_zero_without_digits_or_label() {
        let doc = list_page("ไม่มีรายการ", &[]);
        assert_eq!(parse_count(&doc, "ctl00_ContentDetail_lbN"), 0);
        assert_eq!(parse_count("<html></html>", "ctl00_ContentDetail_lbN"), 0);
    }

    #[test]
    fn well_formed_rows_extract_every_field() {
        let doc = list_page(
            "รอการพิจารณา 1 โครงการ",
            &[grid_row("2569A001", "ระบบเฝ้าระวังน้ำท่วม", "สมชาย ใจดี", "วิศวกรรมศาสตร์", "30/9/2569")],
        );
        let snapshot = parse_list_page(&doc, &selectors());
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.rows.len(), 1);
        let row = &snapshot.rows[0];
        assert_eq!(row.id, "2569A001");
        assert_eq!(row.title, "ระบบเฝ้าระวังน้ำท่วม");
        assert_eq!(row.researcher, "สมชาย ใจดี");
        assert_eq!(row.department, "วิศวกรรมศาสตร์");
        assert_eq!(row.budget, "1,200,000");
        assert_eq!(row.funding_source, "สกสว.");
        assert_eq!(row.funding_agency, "วช.");
        assert_eq!(row.status, "รอการรับรอง");
        assert_eq!(row.deadline, "30/9/2569");
    }

    #[test]
    fn header_and_short_rows_are_skipped() {
        let short = "<tr><td>pager</td><td>1</td><td>2</td></tr>".to_string();
        let doc = list_page(
            "รอการพิจารณา 2 โครงการ",
            &[short, grid_row("2569A002", "ก", "ข", "ค", "1/1/2570")],
        );
        let snapshot = parse_list_page(&doc, &selectors());
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].id, "2569A002");
    }

    #[test]
    fn researcher_without_department_label_runs_to_end() {
        let row = grid_row("x", "t", "สมหญิง ดีงาม", "", "d").replace(" คณะ", "");
        let doc = list_page("1", &[row]);
        let snapshot = parse_list_page(&doc, &selectors());
        assert_eq!(snapshot.rows[0].researcher, "สมหญิง ดีงาม");
        assert_eq!(snapshot.rows[0].department, "");
    }

    #[test]
    fn nine_cell_row_parses_with_empty_deadline() {
        // A row that clears the cell minimum but stops short of the
        // deadline column still yields a record.
        let row = concat!(
            "<tr>",
            "<td>2569A003</td><td>1</td>",
            "<td><a href=\"Detail.aspx\">ชื่อโครงการ</a></td>",
            "<td>500,000</td><td>สกสว.</td><td>วช.</td>",
            "<td>รอการรับรอง</td><td>-</td><td>-</td>",
            "</tr>"
        )
        .to_string();
        let doc = list_page("1", &[row]);
        let snapshot = parse_list_page(&doc, &selectors());
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.rows[0].id, "2569A003");
        assert_eq!(snapshot.rows[0].deadline, "");
    }

    #[test]
    fn missing_anchor_or_deadline_yields_empty_fields() {
        let row = grid_row("x", "t", "r", "d", "z")
            .replace("<a href=\"Detail.aspx\">t</a>", "t")
            .replace("lbHAEnddate", "other");
        let doc = list_page("1", &[row]);
        let snapshot = parse_list_page(&doc, &selectors());
        assert_eq!(snapshot.rows[0].title, "");
        assert_eq!(snapshot.rows[0].deadline, "");
    }

    #[test]
    fn malformed_document_degrades_to_empty_snapshot() {
        let snapshot = parse_list_page("<<<not html", &selectors());
        assert_eq!(snapshot, ListSnapshot::default());
    }

    #[test]
    fn count_without_rows_is_representable() {
        // The parse-inconsistency the workflow reports: label says 3,
        // grid is missing.
        let doc = "<span id=\"ctl00_ContentDetail_lbN\">3 โครงการ</span>";
        let snapshot = parse_list_page(doc, &selectors());
        assert_eq!(snapshot.count, 3);
        assert!(snapshot.rows.is_empty());
    }
}
