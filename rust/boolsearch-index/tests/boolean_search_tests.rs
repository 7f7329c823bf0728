use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use boolsearch_common::error::ErrorKind;
use boolsearch_index::{
    IndexBuilder, IndexBuilderConfig, InvertedIndex, PostingsEncoding, RunConfig,
    artifacts::{DICTIONARY_FILE, DOCS_FILE, MANIFEST_FILE, POSTINGS_FILE},
};
use tempfile::TempDir;

fn write_corpus(docs: &[(&str, &str, &str)]) -> TempDir {
    let root = TempDir::new().expect("Failed to create corpus directory");
    for (source, name, text) in docs {
        let dir = root.path().join(source);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), text).unwrap();
    }
    root
}

fn build(corpus: &Path, config: IndexBuilderConfig) -> TempDir {
    let out = TempDir::new().expect("Failed to create index directory");
    IndexBuilder::new(config)
        .expect("Failed to create builder")
        .build(corpus, out.path())
        .expect("Failed to build index");
    out
}

fn hits(index: &InvertedIndex, query: &str) -> Vec<u32> {
    index.search(query, usize::MAX).unwrap().hits
}

fn error_kind(index: &InvertedIndex, query: &str) -> ErrorKind {
    index.search(query, 10).unwrap_err().into_kind()
}

/// Three documents, one per id: "ocean pollution", "ocean biology", "ship war".
fn sample_corpus() -> TempDir {
    write_corpus(&[
        ("news", "doc0.txt", "Ocean pollution"),
        ("news", "doc1.txt", "ocean biology"),
        ("news", "doc2.txt", "ship war"),
    ])
}

#[test]
fn test_end_to_end_scenario() {
    let corpus = sample_corpus();
    let out = build(corpus.path(), IndexBuilderConfig::default());
    let index = InvertedIndex::open(out.path()).unwrap();
    assert_eq!(index.doc_count(), 3);

    assert_eq!(hits(&index, "ocean AND pollution"), vec![0]);
    assert_eq!(hits(&index, "ocean OR ship"), vec![0, 1, 2]);
    assert!(hits(&index, "ship AND NOT war").is_empty());
    assert_eq!(hits(&index, "OCEANS and not Pollution"), vec![1]);
    assert!(hits(&index, "whale").is_empty());

    assert!(matches!(
        error_kind(&index, "(a AND b"),
        ErrorKind::MismatchedParen { .. }
    ));
    assert!(matches!(
        error_kind(&index, "AND ocean"),
        ErrorKind::MissingOperand { operator: "AND" }
    ));
    assert!(matches!(
        error_kind(&index, ""),
        ErrorKind::MalformedQuery { .. }
    ));

    // The index stays usable after failed queries.
    assert_eq!(hits(&index, "biology"), vec![1]);

    let doc = index.document(2).unwrap();
    assert_eq!(doc.source, "news");
    assert!(doc.path.ends_with("doc2.txt"));
}

#[test]
fn test_precedence() {
    let corpus = sample_corpus();
    let out = build(corpus.path(), IndexBuilderConfig::default());
    let index = InvertedIndex::open(out.path()).unwrap();

    assert_eq!(
        hits(&index, "ocean OR ship AND biology"),
        hits(&index, "ocean OR (ship AND biology)")
    );
    assert_ne!(
        hits(&index, "ocean OR ship AND biology"),
        hits(&index, "(ocean OR ship) AND biology")
    );
    assert_eq!(
        hits(&index, "NOT ocean AND ship"),
        hits(&index, "(NOT ocean) AND ship")
    );
    assert_eq!(
        index.explain("NOT ocean AND ship OR war").unwrap().to_string(),
        "ocean NOT ship AND war OR"
    );
}

#[test]
fn test_limit_and_total() {
    let corpus = sample_corpus();
    let out = build(corpus.path(), IndexBuilderConfig::default());
    let index = InvertedIndex::open(out.path()).unwrap();

    let result = index.search("NOT whale", 2).unwrap();
    assert_eq!(result.total_hits, 3);
    assert_eq!(result.hits, vec![0, 1]);
}

#[test]
fn test_stemming_options() {
    let corpus = write_corpus(&[
        ("a", "1.txt", "sailing ships"),
        ("a", "2.txt", "a ship sailed"),
    ]);

    let out = build(corpus.path(), IndexBuilderConfig::default());
    let index = InvertedIndex::open(out.path()).unwrap();
    assert_eq!(hits(&index, "ship AND sail"), vec![0, 1]);
    // Single-letter tokens are below the default minimum length.
    assert!(hits(&index, "a").is_empty());

    let config = IndexBuilderConfig {
        stemming: false,
        min_token_len: 1,
        ..Default::default()
    };
    let out = build(corpus.path(), config);
    let index = InvertedIndex::open(out.path()).unwrap();
    assert_eq!(hits(&index, "ship"), vec![1]);
    assert_eq!(hits(&index, "ships OR sailed"), vec![0, 1]);
    assert_eq!(hits(&index, "a"), vec![1]);
    assert!(!index.manifest().stemming);
}

fn artifact_bytes(dir: &Path) -> Vec<Vec<u8>> {
    [DOCS_FILE, DICTIONARY_FILE, POSTINGS_FILE]
        .iter()
        .map(|name| std::fs::read(dir.join(name)).unwrap())
        .collect()
}

/// Generates a corpus over a small vocabulary and returns the term sets of
/// every document in id order.
fn random_corpus(doc_count: usize) -> (TempDir, Vec<BTreeSet<String>>) {
    let vocabulary: Vec<String> = (0..30).map(|i| format!("w{i:02}x")).collect();
    let root = TempDir::new().unwrap();
    let mut expected: Vec<(String, BTreeSet<String>)> = Vec::new();
    for doc in 0..doc_count {
        let source = ["alpha", "beta"][doc % 2];
        let dir = root.path().join(source);
        std::fs::create_dir_all(&dir).unwrap();
        let words: Vec<&str> = (0..fastrand::usize(0..15))
            .map(|_| vocabulary[fastrand::usize(0..vocabulary.len())].as_str())
            .collect();
        std::fs::write(dir.join(format!("{doc:04}.txt")), words.join(" ")).unwrap();
        expected.push((
            format!("{source}/{doc:04}"),
            words.iter().map(|w| w.to_string()).collect(),
        ));
    }
    // Ids follow the path order.
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    (root, expected.into_iter().map(|(_, terms)| terms).collect())
}

fn small_runs_config() -> IndexBuilderConfig {
    IndexBuilderConfig {
        stemming: false,
        min_token_len: 1,
        run: RunConfig {
            max_run_size: 512,
            max_merge_fan_in: 2,
        },
        batch_size: 7,
        ..Default::default()
    }
}

#[test]
fn test_multi_pass_merge_matches_single_run() {
    let (corpus, _) = random_corpus(120);
    let small = build(corpus.path(), small_runs_config());
    let large = build(
        corpus.path(),
        IndexBuilderConfig {
            stemming: false,
            min_token_len: 1,
            ..Default::default()
        },
    );
    assert_eq!(artifact_bytes(small.path()), artifact_bytes(large.path()));

    let summary = IndexBuilder::new(small_runs_config())
        .unwrap()
        .build(corpus.path(), small.path())
        .unwrap();
    assert!(summary.spilled_runs > 2);
    assert!(summary.merge_passes > 1);
}

#[test]
fn test_rebuild_is_deterministic() {
    let (corpus, _) = random_corpus(60);
    let first = build(corpus.path(), IndexBuilderConfig::default());
    let second = build(corpus.path(), IndexBuilderConfig::default());
    assert_eq!(artifact_bytes(first.path()), artifact_bytes(second.path()));
}

#[test]
fn test_queries_against_brute_force() {
    let (corpus, docs) = random_corpus(150);
    for encoding in [PostingsEncoding::DeltaVarint, PostingsEncoding::FixedU32] {
        let config = IndexBuilderConfig {
            encoding,
            ..small_runs_config()
        };
        let out = build(corpus.path(), config);
        let index = InvertedIndex::open(out.path()).unwrap();
        assert_eq!(index.manifest().encoding, encoding);

        let with = |term: &str| -> BTreeSet<u32> {
            (0..docs.len() as u32)
                .filter(|&id| docs[id as usize].contains(term))
                .collect()
        };
        let all: BTreeSet<u32> = (0..docs.len() as u32).collect();

        for _ in 0..100 {
            let a = format!("w{:02}x", fastrand::usize(0..32));
            let b = format!("w{:02}x", fastrand::usize(0..32));
            let c = format!("w{:02}x", fastrand::usize(0..32));
            let (sa, sb, sc) = (with(&a), with(&b), with(&c));

            let posting = index.posting_list(&a).unwrap();
            assert!(posting.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(posting, sa.iter().copied().collect::<Vec<_>>());

            let expected: Vec<u32> = sa.union(&(&sb & &sc)).copied().collect();
            assert_eq!(hits(&index, &format!("{a} OR {b} AND {c}")), expected);

            let expected: Vec<u32> = (&all - &sa).intersection(&sb).copied().collect();
            assert_eq!(hits(&index, &format!("NOT {a} AND {b}")), expected);

            let expected: Vec<u32> = (&all - &(&sa | &sb)).intersection(&sc).copied().collect();
            assert_eq!(hits(&index, &format!("NOT ({a} OR {b}) AND {c}")), expected);
        }
    }
}

#[test]
fn test_source_filter_and_counts() {
    let corpus = write_corpus(&[
        ("news", "1.txt", "ocean"),
        ("news", "2.txt", "ship"),
        ("wiki", "1.txt", "ocean"),
    ]);

    let out = TempDir::new().unwrap();
    let summary = IndexBuilder::new(IndexBuilderConfig::default())
        .unwrap()
        .build(corpus.path(), out.path())
        .unwrap();
    assert_eq!(summary.sources.get("news"), Some(&2));
    assert_eq!(summary.sources.get("wiki"), Some(&1));

    let mut config = IndexBuilderConfig::default();
    config.corpus.sources = vec!["wiki".to_string()];
    let out = build(corpus.path(), config);
    let index = InvertedIndex::open(out.path()).unwrap();
    assert_eq!(index.doc_count(), 1);
    assert_eq!(index.manifest().sources.len(), 1);
    assert_eq!(hits(&index, "ocean"), vec![0]);
}

#[test]
fn test_empty_corpus_fails() {
    let corpus = TempDir::new().unwrap();
    std::fs::create_dir(corpus.path().join("news")).unwrap();
    let out = TempDir::new().unwrap();
    let err = IndexBuilder::new(IndexBuilderConfig::default())
        .unwrap()
        .build(corpus.path(), out.path())
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::CorpusEmpty { .. }));
    assert!(!out.path().join(MANIFEST_FILE).exists());
}

#[test]
fn test_duplicate_source_filter() {
    let corpus = write_corpus(&[("news", "1.txt", "ocean"), ("news", "2.txt", "ship")]);
    let mut config = IndexBuilderConfig::default();
    config.corpus.sources = vec!["news".to_string(), "news".to_string()];
    let out = build(corpus.path(), config);
    let index = InvertedIndex::open(out.path()).unwrap();
    assert_eq!(index.doc_count(), 2);
    assert_eq!(index.manifest().sources.get("news"), Some(&2));
    assert_eq!(hits(&index, "ocean OR ship"), vec![0, 1]);
}

#[test]
fn test_keywords_with_punctuation() {
    let corpus = sample_corpus();
    let out = build(corpus.path(), IndexBuilderConfig::default());
    let index = InvertedIndex::open(out.path()).unwrap();

    assert!(hits(&index, "ocean AND,ship").is_empty());
    assert_eq!(hits(&index, "ocean AND \"NOT\" pollution"), vec![1]);
    assert_eq!(hits(&index, "biology;OR;war"), vec![1, 2]);
    assert_eq!(
        index.explain("ocean AND,ship").unwrap().to_string(),
        "ocean ship AND"
    );
}

#[test]
fn test_concurrent_queries() {
    let (corpus, _) = random_corpus(100);
    let out = build(corpus.path(), small_runs_config());
    let index = InvertedIndex::open(out.path()).unwrap();

    let queries: Vec<String> = (0..40)
        .map(|i| {
            format!(
                "w{:02}x OR NOT (w{:02}x AND w{:02}x)",
                i % 30,
                (i * 7) % 30,
                (i * 11) % 30
            )
        })
        .collect();
    let serial: Vec<Vec<u32>> = queries.iter().map(|q| hits(&index, q)).collect();

    let index = &index;
    let parallel: Vec<Vec<Vec<u32>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    queries
                        .iter()
                        .map(|q| hits(index, q))
                        .collect::<Vec<Vec<u32>>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for results in parallel {
        assert_eq!(results, serial);
    }
}

fn corrupt_index(edit: impl FnOnce(&Path)) -> (TempDir, PathBuf) {
    let corpus = sample_corpus();
    let out = build(corpus.path(), IndexBuilderConfig::default());
    edit(out.path());
    let path = out.path().to_path_buf();
    (out, path)
}

#[test]
fn test_dictionary_range_outside_postings() {
    let (_out, path) = corrupt_index(|dir| {
        let dict = std::fs::read_to_string(dir.join(DICTIONARY_FILE)).unwrap();
        let dict = dict.replacen("ocean\t2\t", "ocean\t2\t9999", 1);
        std::fs::write(dir.join(DICTIONARY_FILE), dict).unwrap();
    });
    let index = InvertedIndex::open(&path).unwrap();
    assert!(matches!(
        error_kind(&index, "ocean"),
        ErrorKind::IndexCorruption { .. }
    ));
    assert_eq!(hits(&index, "ship"), vec![2]);
}

#[test]
fn test_doc_freq_mismatch() {
    let (_out, path) = corrupt_index(|dir| {
        let dict = std::fs::read_to_string(dir.join(DICTIONARY_FILE)).unwrap();
        let dict = dict.replacen("ocean\t2\t", "ocean\t3\t", 1);
        std::fs::write(dir.join(DICTIONARY_FILE), dict).unwrap();
    });
    let index = InvertedIndex::open(&path).unwrap();
    assert!(matches!(
        error_kind(&index, "ocean OR ship"),
        ErrorKind::IndexCorruption { .. }
    ));
}

#[test]
fn test_oversized_doc_freq() {
    let (_out, path) = corrupt_index(|dir| {
        let dict = std::fs::read_to_string(dir.join(DICTIONARY_FILE)).unwrap();
        let dict = dict.replacen("ocean\t2\t", "ocean\t4294967295\t", 1);
        std::fs::write(dir.join(DICTIONARY_FILE), dict).unwrap();
    });
    let index = InvertedIndex::open(&path).unwrap();
    assert!(matches!(
        error_kind(&index, "ocean"),
        ErrorKind::IndexCorruption { .. }
    ));
    assert_eq!(hits(&index, "biology"), vec![1]);
}

#[test]
fn test_document_table_mismatch() {
    let (_out, path) = corrupt_index(|dir| {
        let docs = std::fs::read_to_string(dir.join(DOCS_FILE)).unwrap();
        let truncated: Vec<&str> = docs.lines().take(2).collect();
        std::fs::write(dir.join(DOCS_FILE), truncated.join("\n")).unwrap();
    });
    let err = InvertedIndex::open(&path).err().unwrap();
    assert!(matches!(err.kind(), ErrorKind::IndexCorruption { .. }));
}
