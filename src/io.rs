use std::fs;
use std::path::Path;

use crate::constants::*;
use crate::error::MemoryError;
use crate::translation::{Action, Operation};
use crate::vm_system::VirtualMemorySystem;

/// Initial ST/PT contents, read from the two-line layout file
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Layout {
    /// `(segment, address)` pairs
    pub page_tables: Vec<(u32, i32)>,
    /// `(page, segment, address)` triples
    pub pages: Vec<(u32, u32, i32)>,
}

impl Layout {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read layout file: {}", e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let lines: Vec<&str> = content.lines().collect();

        if lines.is_empty() {
            return Err("Layout file is empty".to_string());
        }

        let page_tables = Self::parse_page_table_line(lines[0])?;
        let pages = if lines.len() > 1 {
            Self::parse_page_line(lines[1])?
        } else {
            Vec::new()
        };

        Ok(Layout { page_tables, pages })
    }

    fn parse_page_table_line(line: &str) -> Result<Vec<(u32, i32)>, String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() % 2 != 0 {
            return Err(format!("ST line has {} tokens, expected multiple of 2", tokens.len()));
        }

        let mut entries = Vec::new();
        for chunk in tokens.chunks(2) {
            let s = parse_segment(chunk[0])?;
            let address = parse_address(chunk[1])?;
            entries.push((s, address));
        }
        Ok(entries)
    }

    fn parse_page_line(line: &str) -> Result<Vec<(u32, u32, i32)>, String> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() % 3 != 0 {
            return Err(format!("PT line has {} tokens, expected multiple of 3", tokens.len()));
        }

        let mut entries = Vec::new();
        for chunk in tokens.chunks(3) {
            let p: u32 = chunk[0].parse().map_err(|_| format!("Invalid page number: {}", chunk[0]))?;
            let s = parse_segment(chunk[1])?;
            let address = parse_address(chunk[2])?;

            if p >= PT_SIZE as u32 {
                return Err(format!("Page number {} exceeds max {}", p, PT_SIZE - 1));
            }
            entries.push((p, s, address));
        }
        Ok(entries)
    }

    /// Preload every page table, then every page, in file order
    pub fn apply(&self, vm: &mut VirtualMemorySystem) -> Result<(), MemoryError> {
        for &(segment, address) in &self.page_tables {
            vm.create_page_table(segment, address)?;
        }
        for &(page, segment, address) in &self.pages {
            vm.create_page(page, segment, address)?;
        }
        Ok(())
    }
}

fn parse_segment(token: &str) -> Result<u32, String> {
    let s: u32 = token.parse().map_err(|_| format!("Invalid segment number: {}", token))?;
    if s >= ST_SIZE as u32 {
        return Err(format!("Segment number {} exceeds max {}", s, ST_SIZE - 1));
    }
    Ok(s)
}

fn parse_address(token: &str) -> Result<i32, String> {
    token.parse().map_err(|_| format!("Invalid physical address: {}", token))
}

/// Parse whitespace-separated `(op, address)` pairs
pub fn parse_actions(content: &str) -> Result<Vec<Action>, String> {
    let tokens: Vec<&str> = content.split_whitespace().collect();
    if tokens.len() % 2 != 0 {
        return Err(format!("Action stream has {} tokens, expected pairs", tokens.len()));
    }

    let mut actions = Vec::new();
    for chunk in tokens.chunks(2) {
        let code: i32 = chunk[0].parse().map_err(|_| format!("Invalid operation: {}", chunk[0]))?;
        let op = Operation::try_from(code)?;
        let address: i32 = chunk[1]
            .parse()
            .map_err(|_| format!("Invalid virtual address: {}", chunk[1]))?;
        actions.push(Action { op, address });
    }
    Ok(actions)
}

pub fn read_actions<P: AsRef<Path>>(path: P) -> Result<Vec<Action>, String> {
    let content = fs::read_to_string(path.as_ref())
        .map_err(|e| format!("Failed to read action file: {}", e))?;
    parse_actions(&content)
}

pub fn write_output<P: AsRef<Path>>(path: P, output: &str) -> Result<(), String> {
    fs::write(path.as_ref(), output).map_err(|e| format!("Failed to write output file: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_layout() {
        let layout = Layout::parse("15 512 9 -1\n0 15 1536 1 15 -1").unwrap();
        assert_eq!(layout.page_tables, vec![(15, 512), (9, -1)]);
        assert_eq!(layout.pages, vec![(0, 15, 1536), (1, 15, -1)]);
    }

    #[test]
    fn test_parse_layout_without_pages() {
        let layout = Layout::parse("2 2048\n").unwrap();
        assert_eq!(layout.page_tables, vec![(2, 2048)]);
        assert!(layout.pages.is_empty());
    }

    #[test]
    fn test_parse_layout_errors() {
        assert!(Layout::parse("").is_err());
        assert!(Layout::parse("1 512 3").is_err());
        assert!(Layout::parse("1 512\n0 1").is_err());
        assert!(Layout::parse("512 1024").is_err());
        assert!(Layout::parse("1 512\n1024 1 2048").is_err());
        assert!(Layout::parse("x 512").is_err());
    }

    #[test]
    fn test_apply_layout() {
        let layout = Layout::parse("15 512 9 -1\n0 15 1536 1 15 -1").unwrap();
        let mut vm = VirtualMemorySystem::new();
        layout.apply(&mut vm).unwrap();

        assert_eq!(vm.segment_entry(15), 512);
        assert_eq!(vm.segment_entry(9), -1);
        assert_eq!(vm.get_page_table(15, 0), 1536);
        assert_eq!(vm.get_page_table(15, 1), -1);
        // ST, two table frames, one page
        assert_eq!(vm.bitmap().count_occupied(), 4);
    }

    #[test]
    fn test_parse_actions() {
        let actions = parse_actions("0 1049088 1 -5\n").unwrap();
        assert_eq!(
            actions,
            vec![
                Action { op: Operation::Read, address: 1049088 },
                Action { op: Operation::Write, address: -5 },
            ]
        );
        assert!(parse_actions("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_actions_errors() {
        assert!(parse_actions("0").is_err());
        assert!(parse_actions("2 100").is_err());
        assert!(parse_actions("0 abc").is_err());
        assert!(parse_actions("0 4294967296").is_err());
    }
}
