use serde::Serialize;

/// Basic size figures for an extracted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub line_count: usize,
    pub word_count: usize,
    pub character_count: usize,
}

impl DocumentStats {
    pub fn of(text: &str) -> Self {
        Self {
            line_count: text.split('\n').count(),
            word_count: text.split_whitespace().count(),
            character_count: text.chars().count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_lines_words_and_characters() {
        let stats = DocumentStats::of("This Agreement is made\nbetween the parties.");
        assert_eq!(stats.line_count, 2);
        assert_eq!(stats.word_count, 7);
        assert_eq!(stats.character_count, 43);
    }
}
