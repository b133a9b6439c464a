//! Parsers for the signal, relevance and document-frequency files.
//!
//! Paths ending in `.gz` are decompressed on the fly. Any malformed line is a
//! fatal error; no partial corpus is ever returned.

use crate::config::IdfConfig;
use crate::document::{Corpus, Document, Query, RelevanceLabels};
use crate::error::{LtrError, Result};
use crate::idf::IdfTable;
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|source| LtrError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if path.extension().map_or(false, |ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Yield (line number, line) pairs, mapping read failures to `LtrError::Io`
fn numbered_lines<'a, R: BufRead + 'a>(
    reader: R,
    source: &'a str,
) -> impl Iterator<Item = Result<(usize, String)>> + 'a {
    reader.lines().enumerate().map(move |(i, line)| {
        line.map(|l| (i + 1, l)).map_err(|source_err| LtrError::Io {
            path: source.into(),
            source: source_err,
        })
    })
}

fn split_key_value<'l>(line: &'l str, source: &str, line_no: usize) -> Result<(&'l str, &'l str)> {
    line.split_once(':')
        .map(|(k, v)| (k.trim(), v.trim()))
        .ok_or_else(|| LtrError::parse(source, line_no, "expected 'key: value'"))
}

fn parse_number<T: std::str::FromStr>(value: &str, source: &str, line_no: usize, what: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| LtrError::parse(source, line_no, format!("invalid {}: '{}'", what, value)))
}

/// Load a signal file into a corpus
pub fn load_corpus<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let corpus = parse_corpus(open_reader(path)?, &source)?;
    info!(
        "Signal file {}: {} queries, {} documents",
        source,
        corpus.num_queries(),
        corpus.num_documents()
    );
    Ok(corpus)
}

/// Parse the `key: value` signal format.
///
/// A `query` line opens a query, a `url` line opens a document under it and
/// the remaining keys fill in that document. `stanford_anchor_count` applies
/// to the most recent `anchor_text`.
pub fn parse_corpus<R: BufRead>(reader: R, source: &str) -> Result<Corpus> {
    let mut corpus = Corpus::new();
    let mut query: Option<Query> = None;
    let mut document: Option<Document> = None;
    let mut anchor_text: Option<String> = None;

    for line in numbered_lines(reader, source) {
        let (line_no, line) = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = split_key_value(&line, source, line_no)?;

        if key == "query" {
            if let (Some(q), Some(doc)) = (&query, document.take()) {
                corpus.add_document(q, doc);
            }
            let q = Query::new(value);
            if corpus.documents(&q).is_some() {
                warn!("{}:{}: query '{}' repeated, merging into its first block", source, line_no, q.text);
            }
            corpus.add_query(q.clone());
            query = Some(q);
            anchor_text = None;
            continue;
        }

        if key == "url" {
            let q = query
                .as_ref()
                .ok_or_else(|| LtrError::parse(source, line_no, "url before any query"))?;
            if let Some(doc) = document.take() {
                corpus.add_document(q, doc);
            }
            if corpus
                .documents(q)
                .map_or(false, |docs| docs.iter().any(|d| d.url == value))
            {
                warn!("{}:{}: url '{}' listed twice for query '{}'", source, line_no, value, q.text);
            }
            document = Some(Document::new(value.to_string()));
            anchor_text = None;
            continue;
        }

        let doc = document
            .as_mut()
            .ok_or_else(|| LtrError::parse(source, line_no, format!("'{}' before any url", key)))?;

        match key {
            "title" => doc.title = value.to_string(),
            "header" => doc.headers.push(value.to_string()),
            "body_hits" => {
                let (term, positions) = value
                    .split_once(' ')
                    .ok_or_else(|| LtrError::parse(source, line_no, "body_hits without positions"))?;
                let positions = positions
                    .split_whitespace()
                    .map(|p| parse_number::<u32>(p, source, line_no, "body position"))
                    .collect::<Result<Vec<_>>>()?;
                doc.body_hits
                    .entry(term.trim().to_string())
                    .or_default()
                    .extend(positions);
            }
            "body_length" => doc.body_length = parse_number(value, source, line_no, "body_length")?,
            "pagerank" => doc.page_rank = Some(parse_number(value, source, line_no, "pagerank")?),
            "anchor_text" => anchor_text = Some(value.to_string()),
            "stanford_anchor_count" => {
                let text = anchor_text
                    .clone()
                    .ok_or_else(|| LtrError::parse(source, line_no, "anchor count before anchor_text"))?;
                let count = parse_number(value, source, line_no, "anchor count")?;
                doc.anchors.insert(text, count);
            }
            other => debug!("{}:{}: ignoring unknown key '{}'", source, line_no, other),
        }
    }

    if let (Some(q), Some(doc)) = (&query, document.take()) {
        corpus.add_document(q, doc);
    }

    Ok(corpus)
}

/// Load a relevance file
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<RelevanceLabels> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let labels = parse_labels(open_reader(path)?, &source)?;
    info!(
        "Rel file {}: {} queries, {} documents",
        source,
        labels.num_queries(),
        labels.num_judgements()
    );
    Ok(labels)
}

/// Parse `query: <text>` / `url: <url> <score>` lines
pub fn parse_labels<R: BufRead>(reader: R, source: &str) -> Result<RelevanceLabels> {
    let mut labels = RelevanceLabels::new();
    let mut query: Option<String> = None;

    for line in numbered_lines(reader, source) {
        let (line_no, line) = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = split_key_value(&line, source, line_no)?;

        match key {
            "query" => query = Some(value.to_string()),
            "url" => {
                let q = query
                    .as_deref()
                    .ok_or_else(|| LtrError::parse(source, line_no, "url before any query"))?;
                let (url, score) = value
                    .split_once(' ')
                    .ok_or_else(|| LtrError::parse(source, line_no, "url without a score"))?;
                let score = parse_number(score.trim(), source, line_no, "relevance score")?;
                labels.insert(q, url.trim(), score);
            }
            other => debug!("{}:{}: ignoring unknown key '{}'", source, line_no, other),
        }
    }

    Ok(labels)
}

/// Load a document-frequency file and derive the IDF table
pub fn load_idf<P: AsRef<Path>>(path: P, config: &IdfConfig) -> Result<IdfTable> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let dfs = parse_document_frequencies(open_reader(path)?, &source)?;
    let table = IdfTable::from_document_frequencies(dfs, config);
    let stats = table.stats();
    info!(
        "DF file {}: {} terms, {:.1} documents{}, avg idf {:.3}",
        source,
        stats.total_terms,
        stats.total_documents,
        if config.total_documents.is_some() { "" } else { " (estimated)" },
        stats.avg_idf
    );
    Ok(table)
}

/// Parse whitespace separated `term df` lines; blank lines are skipped
pub fn parse_document_frequencies<R: BufRead>(reader: R, source: &str) -> Result<HashMap<String, f64>> {
    let mut dfs = HashMap::new();

    for line in numbered_lines(reader, source) {
        let (line_no, line) = line?;
        let mut parts = line.split_whitespace();
        let (term, df) = match (parts.next(), parts.next()) {
            (None, _) => continue,
            (Some(term), Some(df)) => (term, df),
            (Some(_), None) => return Err(LtrError::parse(source, line_no, "expected 'term df'")),
        };
        dfs.insert(term.to_string(), parse_number(df, source, line_no, "document frequency")?);
    }

    Ok(dfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    const SIGNAL: &str = "\
query: stanford aoerc pool hours
url: http://events.stanford.edu/2011/February/18/
title: Events at Stanford Tuesday February 18 2011
header: Stanford Events
header: Aoerc Pool
body_hits: stanford 239 271 318
body_hits: pool 33
body_length: 438
pagerank: 1
anchor_text: stanford events
stanford_anchor_count: 5
anchor_text: events calendar
stanford_anchor_count: 2
url: http://med.stanford.edu/aoerc/
title: AOERC
body_length: 0
query: cs276
url: http://cs276.stanford.edu/
";

    #[test]
    fn test_parse_corpus() -> Result<()> {
        let corpus = parse_corpus(Cursor::new(SIGNAL), "signal.txt")?;
        assert_eq!(corpus.num_queries(), 2);
        assert_eq!(corpus.num_documents(), 3);

        let docs = corpus.documents(&Query::new("stanford aoerc pool hours")).unwrap();
        let first = &docs[0];
        assert_eq!(first.url, "http://events.stanford.edu/2011/February/18/");
        assert_eq!(first.headers, vec!["Stanford Events", "Aoerc Pool"]);
        assert_eq!(first.body_hits["stanford"], vec![239, 271, 318]);
        assert_eq!(first.body_length, 438);
        assert_eq!(first.page_rank, Some(1));
        assert_eq!(first.anchors["stanford events"], 5);
        assert_eq!(first.anchors["events calendar"], 2);
        assert_eq!(docs[1].title, "AOERC");
        assert!(docs[1].anchors.is_empty());
        Ok(())
    }

    #[test]
    fn test_repeated_query_and_url_are_kept() -> Result<()> {
        let input = "\
query: rust
url: http://dup
url: http://dup
title: Rust
query: other
url: http://x
query: rust
url: http://late
";
        let corpus = parse_corpus(Cursor::new(input), "dup.txt")?;
        assert_eq!(corpus.num_queries(), 2);

        let docs = corpus.documents(&Query::new("rust")).unwrap();
        let urls: Vec<&str> = docs.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(urls, vec!["http://dup", "http://dup", "http://late"]);
        assert_eq!(docs[0].title, "");
        assert_eq!(docs[1].title, "Rust");
        Ok(())
    }

    #[test]
    fn test_field_before_url_is_fatal() {
        let err = parse_corpus(Cursor::new("query: a\ntitle: orphan\n"), "bad.txt").unwrap_err();
        assert!(matches!(err, LtrError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_bad_number_is_fatal() {
        let input = "query: a\nurl: http://x\nbody_length: lots\n";
        assert!(matches!(
            parse_corpus(Cursor::new(input), "bad.txt"),
            Err(LtrError::Parse { line: 3, .. })
        ));
    }

    #[test]
    fn test_parse_labels() -> Result<()> {
        let input = "query: stanford aoerc pool hours\nurl: http://events.stanford.edu/ 1.5\nurl: http://med.stanford.edu/aoerc/ 2\n";
        let labels = parse_labels(Cursor::new(input), "rel.txt")?;
        assert_eq!(labels.get("stanford aoerc pool hours", "http://med.stanford.edu/aoerc/"), Some(2.0));
        assert_eq!(labels.get("stanford aoerc pool hours", "http://events.stanford.edu/"), Some(1.5));
        assert_eq!(labels.num_judgements(), 2);
        Ok(())
    }

    #[test]
    fn test_parse_document_frequencies() -> Result<()> {
        let dfs = parse_document_frequencies(Cursor::new("stanford 120\n\n  pool\t3 \n"), "df.txt")?;
        assert_eq!(dfs["stanford"], 120.0);
        assert_eq!(dfs["pool"], 3.0);

        assert!(parse_document_frequencies(Cursor::new("lonely\n"), "df.txt").is_err());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(load_corpus("/nonexistent/signal.txt"), Err(LtrError::Io { .. })));
    }

    #[test]
    fn test_load_gzipped_idf() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("df.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"cat 1\ndog 3\n").unwrap();
        encoder.finish().unwrap();

        let config = IdfConfig {
            total_documents: Some(9.0),
            ..Default::default()
        };
        let table = load_idf(&path, &config)?;
        assert_eq!(table.len(), 2);
        assert!((table.lookup("cat") - 5.0f64.ln()).abs() < 1e-12);
        assert!((table.lookup("dog") - 2.5f64.ln()).abs() < 1e-12);
        Ok(())
    }
}
