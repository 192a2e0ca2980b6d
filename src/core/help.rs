//! Help page generation.

use std::fmt::Write;

/// How many commands are listed per help page.
pub const COMMANDS_PER_PAGE: usize = 5;

/// A category of commands shown in the help pages.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct HelpCategory {
    /// Category heading
    pub name: String,
    /// `(command, description)` pairs in display order
    pub commands: Vec<(String, String)>,
}

/// Splits every category into pages of at most [`COMMANDS_PER_PAGE`] commands.
///
/// A category never shares a page with another category.
#[must_use]
pub fn generate_pages(categories: &[HelpCategory]) -> Vec<String> {
    let mut pages = Vec::new();
    for category in categories {
        for chunk in category.commands.chunks(COMMANDS_PER_PAGE) {
            let mut page = format!("**{}:**\n", category.name);
            for (command, description) in chunk {
                // Writing to a String cannot fail.
                let _ = writeln!(page, "  `{command}` - {description}");
            }
            pages.push(page);
        }
    }
    pages
}

/// Page index after moving `delta` pages, wrapping around both ends.
#[must_use]
pub fn wrap_page(current: usize, delta: isize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let total = total as isize;
    (current as isize + delta).rem_euclid(total) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, n: usize) -> HelpCategory {
        HelpCategory {
            name: name.to_string(),
            commands: (0..n)
                .map(|i| (format!("cmd{i}"), format!("does {i}")))
                .collect(),
        }
    }

    #[test]
    fn test_pages_are_chunked_per_category() {
        let pages = generate_pages(&[category("Actions", 7), category("Misc", 1)]);
        assert_eq!(pages.len(), 3);
        assert!(pages[0].starts_with("**Actions:**\n"));
        assert_eq!(pages[0].lines().count(), 6);
        assert_eq!(pages[1].lines().count(), 3);
        assert!(pages[2].contains("`cmd0` - does 0"));
    }

    #[test]
    fn test_empty_category_has_no_pages() {
        assert!(generate_pages(&[category("Empty", 0)]).is_empty());
    }

    #[test]
    fn test_wrap_page() {
        assert_eq!(wrap_page(0, -1, 3), 2);
        assert_eq!(wrap_page(2, 1, 3), 0);
        assert_eq!(wrap_page(1, 1, 3), 2);
        assert_eq!(wrap_page(0, 1, 0), 0);
    }
}
