use chrono::NaiveDate;
use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::{
    error::ScrapeError,
    game::{Game, Platform},
    shift_collection::{ShiftCode, ShiftCollection},
};

// Sanity caps for colspan/rowspan attributes of scraped tables.
const MAX_COLSPAN: usize = 16;
const MAX_ROWSPAN: u32 = 64;

const EXPIRY_FORMATS: [&str; 6] = [
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
];

pub fn extract_text(node: ElementRef) -> String {
    node.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the expiry column of a code table. Anything that is not a date
/// ("Unknown", "Never", "N/A", empty) yields `None`.
pub fn parse_expiry(text: &str) -> Option<NaiveDate> {
    let text = strip_ordinals(text.trim());
    if text.is_empty() {
        return None;
    }
    EXPIRY_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&text, format).ok())
}

// "June 1st, 2014" -> "June 1, 2014"
fn strip_ordinals(text: &str) -> String {
    text.split_whitespace()
        .map(|token| {
            let (word, comma) = match token.strip_suffix(',') {
                Some(word) => (word, ","),
                None => (token, ""),
            };
            let stripped = ["st", "nd", "rd", "th"].iter().find_map(|suffix| {
                word.strip_suffix(suffix)
                    .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
            });
            format!("{}{}", stripped.unwrap_or(word), comma)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Meaning of one column of a code table, decided from its header cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Platform(Platform),
    Reward,
    Expires,
    Other,
}

impl Column {
    fn from_header(header: &str) -> Self {
        if let Some(platform) = Platform::from_column_header(header) {
            return Column::Platform(platform);
        }
        let header = header.to_lowercase();
        if header.contains("expir") {
            Column::Expires
        } else if header.contains("reward") || header.contains("description") {
            Column::Reward
        } else {
            Column::Other
        }
    }
}

/// Pulls SHiFT codes out of the code tables of a source page.
pub struct CodeExtractor {
    code_regex: Regex,
    table_selector: Selector,
}

impl CodeExtractor {
    pub fn new() -> Result<Self, ScrapeError> {
        // Five groups of five alphanumerics, e.g. WBKTT-6WHJ6-6J53F-BRJXC-JXC3T.
        let code_regex = Regex::new(r"(?i)\b[A-Z0-9]{5}(?:-[A-Z0-9]{5}){4}\b")?;
        let table_selector = parse_selector("table")?;
        Ok(Self {
            code_regex,
            table_selector,
        })
    }

    pub fn find_codes(&self, text: &str) -> Vec<String> {
        self.code_regex
            .find_iter(text)
            .map(|found| found.as_str().to_uppercase())
            .collect()
    }

    /// Parses `html` into one collection per platform bucket (PC, PlayStation,
    /// Xbox). Tables and rows that don't look like code tables are skipped.
    pub fn extract_codes(&self, html: &str, game: Game, source: &str) -> [ShiftCollection; 3] {
        let mut buckets: [ShiftCollection; 3] = Default::default();
        let document = Html::parse_document(html);

        for table in document.select(&self.table_selector) {
            let mut columns: Option<Vec<Column>> = None;
            let mut carried: Vec<Option<(u32, String)>> = Vec::new();

            for row in own_rows(table) {
                let grid = layout_row(row, &mut carried);
                let row_codes: Vec<Vec<String>> = grid
                    .iter()
                    .map(|cell| cell.as_deref().map(|text| self.find_codes(text)).unwrap_or_default())
                    .collect();

                if row_codes.iter().all(Vec::is_empty) {
                    // Once a table has a header, only a row of `th` cells may replace it.
                    if columns.is_some() && !is_heading_row(row) {
                        continue;
                    }
                    let header: Vec<Column> = grid
                        .iter()
                        .map(|cell| cell.as_deref().map_or(Column::Other, Column::from_header))
                        .collect();
                    if header.iter().any(|column| matches!(column, Column::Platform(_))) {
                        columns = Some(header);
                    }
                    continue;
                }

                let Some(columns) = &columns else {
                    debug!("skipping codes in a table without platform columns");
                    continue;
                };

                let cell_for = |wanted: Column| {
                    columns
                        .iter()
                        .position(|column| *column == wanted)
                        .and_then(|index| grid.get(index).cloned().flatten())
                };
                let reward = cell_for(Column::Reward).unwrap_or_default();
                let expires = cell_for(Column::Expires).and_then(|text| parse_expiry(&text));

                for (column, codes) in columns.iter().zip(&row_codes) {
                    let Column::Platform(platform) = *column else {
                        continue;
                    };
                    let Some(index) = platform.bucket_index() else {
                        continue;
                    };
                    for code in codes {
                        buckets[index].push(ShiftCode {
                            code: code.clone(),
                            game,
                            platform,
                            reward: reward.clone(),
                            expires,
                            source: source.to_string(),
                        });
                    }
                }
            }
        }

        buckets
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector(format!("{selector}: {e}")))
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    names: &'static [&'static str],
) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |element| names.iter().any(|name| *name == element.value().name()))
}

/// Rows of `table` itself, without the rows of tables nested in its cells.
fn own_rows(table: ElementRef) -> Vec<ElementRef> {
    let mut rows = Vec::new();
    for child in child_elements(table, &["tr", "thead", "tbody", "tfoot"]) {
        if child.value().name() == "tr" {
            rows.push(child);
        } else {
            rows.extend(child_elements(child, &["tr"]));
        }
    }
    rows
}

fn is_heading_row(row: ElementRef) -> bool {
    let mut cells = child_elements(row, &["td", "th"]).peekable();
    cells.peek().is_some() && cells.all(|cell| cell.value().name() == "th")
}

/// Lays the cells of `row` out on the table grid, expanding colspans and
/// filling positions still covered by rowspans of earlier rows.
fn layout_row(row: ElementRef, carried: &mut Vec<Option<(u32, String)>>) -> Vec<Option<String>> {
    let mut grid: Vec<Option<String>> = Vec::new();
    let mut column = 0;

    for cell in child_elements(row, &["td", "th"]) {
        while let Some(text) = take_carried(carried, column) {
            place(&mut grid, column, text);
            column += 1;
        }

        let text = extract_text(cell);
        let colspan = span_attr(cell, "colspan").clamp(1, MAX_COLSPAN as u32) as usize;
        let rowspan = span_attr(cell, "rowspan").clamp(1, MAX_ROWSPAN);

        for offset in 0..colspan {
            place(&mut grid, column + offset, text.clone());
            if rowspan > 1 {
                if carried.len() <= column + offset {
                    carried.resize(column + offset + 1, None);
                }
                carried[column + offset] = Some((rowspan - 1, text.clone()));
            }
        }
        column += colspan;
    }

    for trailing in column..carried.len() {
        if let Some(text) = take_carried(carried, trailing) {
            place(&mut grid, trailing, text);
        }
    }

    grid
}

fn take_carried(carried: &mut [Option<(u32, String)>], column: usize) -> Option<String> {
    let slot = carried.get_mut(column)?;
    let (rows_left, text) = slot.as_mut()?;
    let text = text.clone();
    *rows_left -= 1;
    if *rows_left == 0 {
        *slot = None;
    }
    Some(text)
}

fn place(grid: &mut Vec<Option<String>>, column: usize, text: String) {
    if grid.len() <= column {
        grid.resize(column + 1, None);
    }
    grid[column] = Some(text);
}

fn span_attr(cell: ElementRef, name: &str) -> u32 {
    cell.value()
        .attr(name)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "http://localhost/codes";

    const PAGE: &str = r#"
        <html><body>
        <table><tr><td>Navigation</td><td>Main page</td></tr></table>
        <table class="wikitable">
          <tr><th>Source</th><th>Date</th><th>Expires</th><th>Reward</th>
              <th>PC / Mac</th><th>PlayStation</th><th>Xbox 360</th></tr>
          <tr><td>Twitter</td><td>May 1, 2014</td><td>May 15, 2014</td><td>3 Golden Keys</td>
              <td>WBKTT-6WHJ6-6J53F-BRJXC-JXC3T</td>
              <td>5BKBJ-FSH3J-JTTJB-3BJB3-BSBB9</td>
              <td>CTCBT-3FR9K-XHSFT-5SBT3-THSZ5</td></tr>
          <tr><td>Facebook</td><td>June 1, 2014</td><td>Unknown</td><td>1 Golden Key</td>
              <td colspan="3">k3wbb-rrxxx-5brr5-xtjbb-wbhkr</td></tr>
          <tr><td>Broken row</td><td>garbage</td></tr>
        </table>
        </body></html>
    "#;

    #[test]
    fn codes_land_in_platform_buckets() {
        let extractor = CodeExtractor::new().unwrap();
        let [pc, ps, xbox] = extractor.extract_codes(PAGE, Game::Bl2, SOURCE);

        let pc_codes: Vec<_> = pc.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(
            pc_codes,
            vec!["WBKTT-6WHJ6-6J53F-BRJXC-JXC3T", "K3WBB-RRXXX-5BRR5-XTJBB-WBHKR"]
        );
        assert_eq!(ps.len(), 2);
        assert_eq!(xbox.len(), 2);
        assert!(ps.iter().all(|c| c.platform == Platform::Ps));
        assert!(xbox.iter().all(|c| c.game == Game::Bl2 && c.source == SOURCE));
    }

    #[test]
    fn reward_and_expiry_are_attached() {
        let extractor = CodeExtractor::new().unwrap();
        let [pc, _, _] = extractor.extract_codes(PAGE, Game::Bl2, SOURCE);
        let first = pc.iter().next().unwrap();
        assert_eq!(first.reward, "3 Golden Keys");
        assert_eq!(first.expires, NaiveDate::from_ymd_opt(2014, 5, 15));

        let universal = pc.iter().nth(1).unwrap();
        assert_eq!(universal.reward, "1 Golden Key");
        assert_eq!(universal.expires, None);
    }

    #[test]
    fn rowspan_keeps_columns_aligned() {
        let page = r#"<table>
            <tr><th>Expires</th><th>PC</th><th>PS3</th><th>Xbox</th></tr>
            <tr><td rowspan="2">2014-05-15</td>
                <td>AAAAA-AAAAA-AAAAA-AAAAA-AAAAA</td>
                <td>BBBBB-BBBBB-BBBBB-BBBBB-BBBBB</td>
                <td>CCCCC-CCCCC-CCCCC-CCCCC-CCCCC</td></tr>
            <tr><td>DDDDD-DDDDD-DDDDD-DDDDD-DDDDD</td>
                <td>EEEEE-EEEEE-EEEEE-EEEEE-EEEEE</td>
                <td>FFFFF-FFFFF-FFFFF-FFFFF-FFFFF</td></tr>
        </table>"#;
        let extractor = CodeExtractor::new().unwrap();
        let [pc, ps, xbox] = extractor.extract_codes(page, Game::Blps, SOURCE);

        let second_pc = pc.iter().nth(1).unwrap();
        assert_eq!(second_pc.code, "DDDDD-DDDDD-DDDDD-DDDDD-DDDDD");
        assert_eq!(second_pc.expires, NaiveDate::from_ymd_opt(2014, 5, 15));
        assert_eq!(ps.iter().nth(1).unwrap().code, "EEEEE-EEEEE-EEEEE-EEEEE-EEEEE");
        assert_eq!(xbox.iter().nth(1).unwrap().code, "FFFFF-FFFFF-FFFFF-FFFFF-FFFFF");
    }

    #[test]
    fn malformed_pages_yield_what_can_be_recognised() {
        let extractor = CodeExtractor::new().unwrap();

        let [pc, ps, xbox] = extractor.extract_codes("<p>not a table <b>", Game::Bl2, SOURCE);
        assert!(pc.is_empty() && ps.is_empty() && xbox.is_empty());

        // Codes outside of a platform table are ignored.
        let page = "<table><tr><td>WBKTT-6WHJ6-6J53F-BRJXC-JXC3T</td></tr></table>";
        let [pc, _, _] = extractor.extract_codes(page, Game::Bl2, SOURCE);
        assert!(pc.is_empty());

        // Unclosed tags still parse.
        let page = "<table><tr><th>PC<th>Xbox<tr><td>AAAAA-AAAAA-AAAAA-AAAAA-AAAAA<td>too-short";
        let [pc, _, xbox] = extractor.extract_codes(page, Game::Bl2, SOURCE);
        assert_eq!(pc.len(), 1);
        assert!(xbox.is_empty());
    }

    #[test]
    fn codeless_data_row_does_not_replace_header() {
        let page = r#"<table>
            <tr><th>Reward</th><th>PC</th><th>PlayStation</th><th>Xbox</th></tr>
            <tr><td>Xbox 360 only skin</td><td>Expired</td><td>Expired</td><td>Expired</td></tr>
            <tr><td>5 Golden Keys</td>
                <td>AAAAA-AAAAA-AAAAA-AAAAA-AAAAA</td>
                <td>BBBBB-BBBBB-BBBBB-BBBBB-BBBBB</td>
                <td>CCCCC-CCCCC-CCCCC-CCCCC-CCCCC</td></tr>
        </table>"#;
        let extractor = CodeExtractor::new().unwrap();
        let [pc, ps, xbox] = extractor.extract_codes(page, Game::Bl2, SOURCE);
        assert_eq!((pc.len(), ps.len(), xbox.len()), (1, 1, 1));
        assert_eq!(xbox.iter().next().unwrap().code, "CCCCC-CCCCC-CCCCC-CCCCC-CCCCC");
        assert_eq!(pc.iter().next().unwrap().reward, "5 Golden Keys");
    }

    #[test]
    fn heading_row_can_redefine_columns() {
        let page = r#"<table>
            <tr><th>PC</th><th>Xbox</th></tr>
            <tr><td>AAAAA-AAAAA-AAAAA-AAAAA-AAAAA</td><td>BBBBB-BBBBB-BBBBB-BBBBB-BBBBB</td></tr>
            <tr><th>Xbox</th><th>PC</th></tr>
            <tr><td>CCCCC-CCCCC-CCCCC-CCCCC-CCCCC</td><td>DDDDD-DDDDD-DDDDD-DDDDD-DDDDD</td></tr>
        </table>"#;
        let extractor = CodeExtractor::new().unwrap();
        let [pc, _, xbox] = extractor.extract_codes(page, Game::Bl2, SOURCE);
        let pc_codes: Vec<_> = pc.iter().map(|c| &c.code[..5]).collect();
        let xbox_codes: Vec<_> = xbox.iter().map(|c| &c.code[..5]).collect();
        assert_eq!(pc_codes, vec!["AAAAA", "DDDDD"]);
        assert_eq!(xbox_codes, vec!["BBBBB", "CCCCC"]);
    }

    #[test]
    fn nested_tables_keep_their_own_rows() {
        let page = r#"<table>
            <tr><th>Expires</th><th>PC</th><th>Xbox</th></tr>
            <tr><td rowspan="2">2014-05-15</td>
                <td>AAAAA-AAAAA-AAAAA-AAAAA-AAAAA</td>
                <td><table><tr><td>note</td></tr></table>BBBBB-BBBBB-BBBBB-BBBBB-BBBBB</td></tr>
            <tr><td>CCCCC-CCCCC-CCCCC-CCCCC-CCCCC</td><td>DDDDD-DDDDD-DDDDD-DDDDD-DDDDD</td></tr>
        </table>"#;
        let extractor = CodeExtractor::new().unwrap();
        let [pc, _, xbox] = extractor.extract_codes(page, Game::Bl2, SOURCE);

        let pc_codes: Vec<_> = pc.iter().map(|c| &c.code[..5]).collect();
        let xbox_codes: Vec<_> = xbox.iter().map(|c| &c.code[..5]).collect();
        assert_eq!(pc_codes, vec!["AAAAA", "CCCCC"]);
        assert_eq!(xbox_codes, vec!["BBBBB", "DDDDD"]);
        assert!(pc.iter().all(|c| c.expires == NaiveDate::from_ymd_opt(2014, 5, 15)));
    }

    #[test]
    fn expiry_formats() {
        let may_15 = NaiveDate::from_ymd_opt(2014, 5, 15);
        assert_eq!(parse_expiry("May 15, 2014"), may_15);
        assert_eq!(parse_expiry("May 15th, 2014"), may_15);
        assert_eq!(parse_expiry("15 May 2014"), may_15);
        assert_eq!(parse_expiry(" 2014-05-15 "), may_15);
        assert_eq!(parse_expiry("05/15/2014"), may_15);
        assert_eq!(parse_expiry("15.05.2014"), may_15);
        assert_eq!(parse_expiry("Unknown"), None);
        assert_eq!(parse_expiry(""), None);
    }

    #[test]
    fn find_codes_normalises_case() {
        let extractor = CodeExtractor::new().unwrap();
        assert_eq!(
            extractor.find_codes("use wbktt-6whj6-6j53f-brjxc-jxc3t now, or 12345-1234"),
            vec!["WBKTT-6WHJ6-6J53F-BRJXC-JXC3T"]
        );
    }
}
