use revhash::corpus::CorpusIndex;
use revhash::digest::Hasher;
use revhash::lookup::{LookupResponse, LookupService};
use revhash::scanner::{FileIndexer, ScanConfig};
use revhash::serve_queries;
use revhash::signal::ShutdownHandler;
use std::fs;
use std::io::Cursor;
use tempfile::tempdir;

fn parse_lines(output: &[u8]) -> Vec<LookupResponse> {
    String::from_utf8(output.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_query_answers_one_line_per_digest() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "meeting notes").unwrap();
    let service = LookupService::new(
        CorpusIndex::with_defaults(),
        dir.path(),
        FileIndexer::new(ScanConfig::default()),
    );

    let hasher = Hasher::new();
    let input = format!(
        "{}\n\n{}\n{}\nnot-a-digest\n",
        hasher.digest_str("test"),
        hasher.digest_str("meeting notes"),
        "f".repeat(128),
    );

    let mut output = Vec::new();
    let stats = serve_queries(&service, Cursor::new(input), &mut output, None).unwrap();

    assert_eq!(stats.answered, 4);
    assert_eq!(stats.found, 2);
    assert_eq!(stats.invalid, 1);

    let responses = parse_lines(&output);
    assert_eq!(responses.len(), 4);
    assert_eq!(responses[0].result.as_deref(), Some("test"));
    assert!(responses[1]
        .result
        .as_deref()
        .unwrap()
        .ends_with("notes.txt"));
    assert_eq!(responses[2].result, None);
    assert_eq!(responses[3].result, None);
}

#[test]
fn test_query_stops_on_shutdown() {
    let dir = tempdir().unwrap();
    let service = LookupService::new(
        CorpusIndex::with_defaults(),
        dir.path(),
        FileIndexer::new(ScanConfig::default()),
    );
    let handler = ShutdownHandler::new();
    handler.request_shutdown();

    let input = format!("{}\n", Hasher::new().digest_str("hello"));
    let mut output = Vec::new();
    let stats = serve_queries(&service, Cursor::new(input), &mut output, Some(&handler)).unwrap();

    assert_eq!(stats.answered, 0);
    assert!(output.is_empty());
}
