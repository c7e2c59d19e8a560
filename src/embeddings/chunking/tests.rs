use super::estimate_token_count as estimate_token_count_impl;
use super::*;

fn reassemble(spans: &[TextSpan], overlap: usize) -> String {
    let mut text = String::new();
    for (i, span) in spans.iter().enumerate() {
        if i == 0 {
            text.push_str(&span.text);
        } else {
            text.extend(span.text.chars().skip(overlap));
        }
    }
    text
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn sample_text() -> String {
    "Retrieval augmented generation pairs a search step with a language model.\n\n\
     The search step finds passages that look relevant to the question.\n\
     The model then answers using only those passages. "
        .repeat(12)
}

fn page(text: &str, number: u32) -> Page {
    Page {
        text: text.to_string(),
        source: PathBuf::from("docs/sample.pdf"),
        number,
    }
}

#[test]
fn estimate_token_count() {
    assert_eq!(estimate_token_count_impl("hello world"), 2);
    assert_eq!(estimate_token_count_impl("This is a test."), 5);
    assert_eq!(estimate_token_count_impl(""), 0);
}

#[test]
fn empty_text_yields_no_chunks() {
    assert!(split_text("", 100, 20).is_empty());
}

#[test]
fn short_text_is_single_chunk() {
    let spans = split_text("Paris is the capital of France.", 1000, 200);
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].start, 0);
    assert_eq!(spans[0].text, "Paris is the capital of France.");
}

#[test]
fn chunks_respect_maximum_length() {
    let text = sample_text();
    for (size, overlap) in [(50, 10), (120, 30), (1000, 200), (7, 0), (2, 1)] {
        let spans = split_text(&text, size, overlap);
        assert!(spans.len() > 1, "size {} should split the text", size);
        for span in &spans {
            assert!(
                char_len(&span.text) <= size,
                "chunk of {} chars exceeds {}",
                char_len(&span.text),
                size
            );
        }
    }
}

#[test]
fn consecutive_chunks_share_exact_overlap() {
    let text = sample_text();
    let overlap = 25;
    let spans = split_text(&text, 120, overlap);

    for pair in spans.windows(2) {
        let prev: Vec<char> = pair[0].text.chars().collect();
        let next: Vec<char> = pair[1].text.chars().collect();
        assert_eq!(prev[prev.len() - overlap..], next[..overlap]);
        assert_eq!(pair[1].start, pair[0].start + prev.len() - overlap);
    }
}

#[test]
fn round_trip_reconstructs_text() {
    let texts = [
        sample_text(),
        "abcdefghijklmnopqrstuvwxyz".repeat(9),
        "one two three four five six seven eight nine ten".to_string(),
        "line\nline\nline\n\nparagraph".repeat(5),
    ];
    for text in &texts {
        for (size, overlap) in [(10, 0), (10, 3), (10, 9), (33, 8), (64, 16), (500, 100)] {
            let spans = split_text(text, size, overlap);
            assert_eq!(
                &reassemble(&spans, overlap),
                text,
                "round trip failed for size {} overlap {}",
                size,
                overlap
            );
        }
    }
}

#[test]
fn trailing_text_shorter_than_overlap_is_kept() {
    // 25 chars with no separators: windows end at 10, 16, 22 and the tail is 7 chars
    let text = "abcdefghijklmnopqrstuvwxy";
    let spans = split_text(text, 10, 4);

    let last = spans.last().expect("should produce chunks");
    assert!(last.text.ends_with('y'));
    assert_eq!(reassemble(&spans, 4), text);
}

#[test]
fn prefers_paragraph_then_line_then_space() {
    let text = "first paragraph here\n\nsecond paragraph text";
    let spans = split_text(text, 30, 0);
    assert_eq!(spans[0].text, "first paragraph here\n\n");

    let text = "a line of text\nanother line of text";
    let spans = split_text(text, 20, 0);
    assert_eq!(spans[0].text, "a line of text\n");

    let text = "words separated only by spaces";
    let spans = split_text(text, 12, 0);
    assert_eq!(spans[0].text, "words ");
}

#[test]
fn hard_cut_without_separators() {
    let spans = split_text("abcdefghij", 4, 1);
    let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["abcd", "defg", "ghij"]);
}

#[test]
fn counts_characters_not_bytes() {
    let text = "héllo wörld ünïcode ßtring ".repeat(6);
    let spans = split_text(&text, 16, 4);
    for span in &spans {
        assert!(char_len(&span.text) <= 16);
    }
    assert_eq!(reassemble(&spans, 4), text);
}

#[test]
fn splitting_is_deterministic() {
    let text = sample_text();
    assert_eq!(split_text(&text, 90, 20), split_text(&text, 90, 20));
}

#[test]
fn degenerate_parameters_are_clamped() {
    let spans = split_text("abc", 0, 5);
    let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["a", "b", "c"]);
}

#[test]
fn chunk_pages_numbers_chunks_across_pages() {
    let long = sample_text();
    let pages = vec![page(&long, 1), page("", 2), page("Short last page.", 3)];
    let config = ChunkingConfig {
        chunk_size: 200,
        chunk_overlap: 40,
    };

    let chunks = chunk_pages(&pages, &config);

    assert!(chunks.len() > 2);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.id, i);
        assert_eq!(chunk.source, PathBuf::from("docs/sample.pdf"));
    }
    assert!(chunks.iter().all(|c| c.page_number != 2));

    let last = chunks.last().expect("should have chunks");
    assert_eq!(last.page_number, 3);
    assert_eq!(last.text, "Short last page.");
    assert_eq!(last.start_char, 0);

    let first_page: Vec<TextSpan> = chunks
        .iter()
        .filter(|c| c.page_number == 1)
        .map(|c| TextSpan {
            start: c.start_char,
            text: c.text.clone(),
        })
        .collect();
    assert_eq!(reassemble(&first_page, 40), long);
}

#[test]
fn default_config_matches_document_qa_settings() {
    let config = ChunkingConfig::default();
    assert_eq!(config.chunk_size, 1000);
    assert_eq!(config.chunk_overlap, 200);
}
