//! Table-aware segmentation of free-form entry text.
//!
//! A single forward pass over the lines. Pipe-prefixed lines are buffered and
//! rebuilt into a table when the run ends; everything else becomes a
//! highlighted paragraph or a blank spacer. Malformed tables never raise.

use crate::highlight::highlight;
use crate::models::RenderBlock;

/// Split `raw_text` into render blocks, highlighting `active_term` in
/// paragraph content.
pub fn segment(raw_text: &str, active_term: Option<&str>) -> Vec<RenderBlock> {
    let mut blocks = Vec::new();
    let mut table_buffer: Vec<&str> = Vec::new();

    for line in raw_text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('|') {
            table_buffer.push(trimmed);
            continue;
        }

        if !table_buffer.is_empty() {
            flush_table(&mut table_buffer, &mut blocks);
        }

        if trimmed.is_empty() {
            blocks.push(RenderBlock::Blank);
        } else {
            blocks.push(RenderBlock::Paragraph(highlight(line, active_term)));
        }
    }

    if !table_buffer.is_empty() {
        flush_table(&mut table_buffer, &mut blocks);
    }

    blocks
}

/// Turn buffered table lines into a table block. The first line is the
/// header, the second is assumed to be the separator and is dropped. Buffers
/// shorter than two lines are discarded.
fn flush_table(buffer: &mut Vec<&str>, blocks: &mut Vec<RenderBlock>) {
    if buffer.len() >= 2 {
        let headers = split_cells(buffer[0]);
        let rows = buffer[2..]
            .iter()
            .map(|line| {
                let mut cells = split_cells(line);
                if cells.len() < headers.len() {
                    cells.resize(headers.len(), String::new());
                }
                cells
            })
            .collect();
        blocks.push(RenderBlock::Table { headers, rows });
    }
    buffer.clear();
}

fn split_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Segment;

    fn para(s: &str) -> RenderBlock {
        RenderBlock::Paragraph(vec![Segment::Plain(s.to_string())])
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_table_between_paragraphs() {
        let blocks = segment("A\n|H1|H2|\n|---|---|\n|v1|v2|\nB", None);
        assert_eq!(
            blocks,
            vec![
                para("A"),
                RenderBlock::Table {
                    headers: strings(&["H1", "H2"]),
                    rows: vec![strings(&["v1", "v2"])],
                },
                para("B"),
            ]
        );
    }

    #[test]
    fn test_single_table_line_is_dropped() {
        let blocks = segment("A\n| only header |\nB", None);
        assert_eq!(blocks, vec![para("A"), para("B")]);
    }

    #[test]
    fn test_table_at_end_of_input_is_flushed() {
        let blocks = segment("| a | b |\n|---|---|\n| 1 | 2 |\n| 3 | 4 |", None);
        assert_eq!(
            blocks,
            vec![RenderBlock::Table {
                headers: strings(&["a", "b"]),
                rows: vec![strings(&["1", "2"]), strings(&["3", "4"])],
            }]
        );
    }

    #[test]
    fn test_header_and_separator_only_yields_empty_table() {
        let blocks = segment("|x|y|\n|--|--|", None);
        assert_eq!(
            blocks,
            vec![RenderBlock::Table {
                headers: strings(&["x", "y"]),
                rows: Vec::new(),
            }]
        );
    }

    #[test]
    fn test_short_rows_are_padded() {
        let blocks = segment("|a|b|c|\n|-|-|-|\n|1|", None);
        assert_eq!(
            blocks,
            vec![RenderBlock::Table {
                headers: strings(&["a", "b", "c"]),
                rows: vec![strings(&["1", "", ""])],
            }]
        );
    }

    #[test]
    fn test_second_line_is_always_discarded() {
        // Two data rows and no separator: the second row is lost.
        let blocks = segment("|k|v|\n|a|1|\n|b|2|", None);
        assert_eq!(
            blocks,
            vec![RenderBlock::Table {
                headers: strings(&["k", "v"]),
                rows: vec![strings(&["b", "2"])],
            }]
        );
    }

    #[test]
    fn test_blank_lines_become_spacers() {
        let blocks = segment("one\n\n   \ntwo", None);
        assert_eq!(
            blocks,
            vec![para("one"), RenderBlock::Blank, RenderBlock::Blank, para("two")]
        );
    }

    #[test]
    fn test_indented_table_lines_are_recognized() {
        let blocks = segment("  | h |\n  |---|\n  | v |", None);
        assert_eq!(
            blocks,
            vec![RenderBlock::Table {
                headers: strings(&["h"]),
                rows: vec![strings(&["v"])],
            }]
        );
    }

    #[test]
    fn test_blank_line_closes_table() {
        let blocks = segment("|h|\n|-|\n|v|\n\n|h2|\n|-|", None);
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[1], RenderBlock::Blank));
        assert!(matches!(blocks[2], RenderBlock::Table { .. }));
    }

    #[test]
    fn test_paragraphs_are_highlighted_and_cleaned() {
        let blocks = segment("Use **git reset --soft**", Some("reset"));
        assert_eq!(
            blocks,
            vec![RenderBlock::Paragraph(vec![
                Segment::Plain("Use git ".to_string()),
                Segment::Emphasized("reset".to_string()),
                Segment::Plain(" --soft".to_string()),
            ])]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(segment("", None).is_empty());
    }
}
