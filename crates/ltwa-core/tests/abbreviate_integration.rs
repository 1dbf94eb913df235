//! End-to-end tests for [`Abbreviator`].
//!
//! Most tests use a small in-memory rule list; the last ones go through a
//! real SQLite index built from a CSV file.

use std::sync::Arc;

use ltwa_core::{Abbreviator, LtwaEntry};

fn rule(word: &str, abbreviation: Option<&str>, language: &str) -> LtwaEntry {
    LtwaEntry {
        word: word.to_string(),
        abbreviation: abbreviation.map(String::from),
        languages: vec![language.to_string()],
    }
}

fn eng(word: &str, abbreviation: &str) -> LtwaEntry {
    rule(word, Some(abbreviation), "eng")
}

/// A handful of rules covering every matching path.
fn sample_rules() -> Vec<LtwaEntry> {
    vec![
        eng("journal", "j."),
        eng("international", "int."),
        eng("conference", "conf."),
        eng("computer", "cmptr."),
        eng("comput-", "comput."),
        eng("security", "secur."),
        eng("science", "sci."),
        eng("physics", "phys."),
        rule("physik", Some("phys."), "ger"),
        rule("uber", Some("uber"), "ger"),
        rule("review", Some("rvw."), "fre"),
        eng("review", "rev."),
        eng("united state", "u. s."),
        eng("report", "rep."),
        eng("-ology", "-ol."),
        eng("-ologi", "-ol."),
        rule("letters", None, "eng"),
        eng("medical", "med."),
        eng("engineering", "eng."),
        eng("proceedings", "proc."),
        eng("symposium", "symp."),
        rule("annales", Some("ann."), "fre"),
        rule("institut", Some("inst."), "fre"),
        eng("nature", "nat."),
    ]
}

fn abbreviator() -> Abbreviator {
    Abbreviator::from_source(sample_rules().as_slice()).unwrap()
}

fn abbreviate(title: &str) -> Option<String> {
    abbreviator().abbreviate(title)
}

#[test]
fn journal_of_testing_without_rules() {
    let abbreviator = Abbreviator::empty();
    assert_eq!(
        abbreviator.abbreviate("Journal of Testing").as_deref(),
        Some("Journal Testing")
    );
}

#[test]
fn conference_with_year() {
    assert_eq!(
        abbreviate("International Conference, 2020").as_deref(),
        Some("Int. Conf.")
    );
    assert_eq!(
        Abbreviator::empty()
            .abbreviate("International Conference, 2020")
            .as_deref(),
        Some("International Conference")
    );
    // Numbers inside a compound survive
    assert_eq!(
        abbreviate("3-D Conference").as_deref(),
        Some("3-D Conf.")
    );
}

#[test]
fn open_stem_beats_longer_closed_rule() {
    assert_eq!(
        abbreviate("Computers and Security").as_deref(),
        Some("Comput. Secur.")
    );

    // Same outcome regardless of the order rules were loaded in
    let mut reversed = sample_rules();
    reversed.reverse();
    let abbreviator = Abbreviator::from_source(reversed.as_slice()).unwrap();
    for _ in 0..10 {
        assert_eq!(
            abbreviator.abbreviate("Computers and Security").as_deref(),
            Some("Comput. Secur.")
        );
    }
}

#[test]
fn diacritics_and_case_are_restored() {
    assert_eq!(abbreviate("Über Physik").as_deref(), Some("Über Phys."));
    assert_eq!(abbreviate("ÜBER PHYSIK").as_deref(), Some("ÜBER PHYS."));
}

#[test]
fn english_rule_wins_full_tie() {
    assert_eq!(abbreviate("Physics Review").as_deref(), Some("Phys. Rev."));
}

#[test]
fn unabbreviated_rule_keeps_word() {
    assert_eq!(abbreviate("Physics Letters").as_deref(), Some("Phys. Letters"));
}

#[test]
fn multi_word_rule_absorbs_next_word() {
    assert_eq!(
        abbreviate("United States Reports").as_deref(),
        Some("U. S. Rep.")
    );
}

#[test]
fn suffix_rule_abbreviates_tail() {
    assert_eq!(
        abbreviate("The Lancet Oncology").as_deref(),
        Some("Lancet Oncol.")
    );
}

#[test]
fn suffix_rule_after_inflection() {
    assert_eq!(
        abbreviate("Oncology's Reports").as_deref(),
        Some("Oncol. Rep.")
    );
    assert_eq!(
        abbreviate("Radiologies Today").as_deref(),
        Some("Radiol. Today")
    );
}

#[test]
fn hyphenated_compound_stays_joined() {
    assert_eq!(
        abbreviate("Bio-Medical Engineering").as_deref(),
        Some("Bio-Med. Eng.")
    );
}

#[test]
fn ordinals_pass_through() {
    assert_eq!(
        abbreviate("Symposium on the 21st Century").as_deref(),
        Some("Symp. 21st Century")
    );
}

#[test]
fn ordinal_replaces_adjacent_word() {
    assert_eq!(
        abbreviate("Conf2nd Symposium").as_deref(),
        Some("2nd Symp.")
    );
}

#[test]
fn filler_words_dropped_after_first() {
    assert_eq!(
        abbreviate("Annual Proceedings Review").as_deref(),
        Some("Annual Rev.")
    );
    assert_eq!(
        Abbreviator::empty()
            .abbreviate("Annual Proceedings Part Volume Papers Review")
            .as_deref(),
        Some("Annual Review")
    );
    // A leading filler is kept as written, without lookup
    assert_eq!(
        abbreviate("Proceedings of the 21st Symposium").as_deref(),
        Some("Proceedings 21st Symp.")
    );
}

#[test]
fn leading_stopword_is_kept() {
    assert_eq!(
        abbreviate("On Computers and Security").as_deref(),
        Some("On Comput. Secur.")
    );
}

#[test]
fn elided_articles_and_prepositions() {
    assert_eq!(
        abbreviate("Annales de l'Institut Fourier").as_deref(),
        Some("Ann. Inst. Fourier")
    );
}

#[test]
fn pre_abbreviated_titles_are_unchanged() {
    for title in ["J. Phys. Chem.", "Int. J. Comput. Sci.", "{IEEE} Trans. Comput."] {
        assert_eq!(abbreviate(title).as_deref(), Some(title));
    }
    assert_eq!(abbreviate("J. Physics").as_deref(), Some("J. Phys."));
}

#[test]
fn whole_title_shortcuts_skip_lookup() {
    assert_eq!(abbreviate("Nature").as_deref(), Some("Nature"));
    assert_eq!(abbreviate("In Nature").as_deref(), Some("In Nature"));
    assert_eq!(abbreviate("Science!").as_deref(), Some("Science!"));
    // Longer titles take the general path
    assert_eq!(abbreviate("Nature Physics").as_deref(), Some("Nat. Phys."));
}

#[test]
fn symbol_only_titles() {
    for title in ["&", "...", ", ,", "+ & .", "  "] {
        assert_eq!(abbreviate(title), None, "{title:?}");
    }
    assert_eq!(abbreviate("?!").as_deref(), Some("?!"));
}

#[test]
fn compatibility_forms_are_normalized() {
    assert_eq!(abbreviate("Ｊournal of Phy\u{FB01}sics"), abbreviate("Journal of Phyfisics"));
    assert_eq!(abbreviate("Ｊournal of Science").as_deref(), Some("J. Sci."));
}

#[test]
fn unfoldable_title_has_no_result() {
    assert_eq!(abbreviate("Journal of 한국 Physics"), None);
}

#[test]
fn unrestorable_abbreviation_drops_whole_title() {
    let mut rules = sample_rules();
    rules.push(eng("hangul", "h\u{D55C}"));
    let abbreviator = Abbreviator::from_source(rules.as_slice()).unwrap();

    assert_eq!(abbreviator.abbreviate("Journal of Hangul Science"), None);
    assert_eq!(
        abbreviator.abbreviate("Journal of Science").as_deref(),
        Some("J. Sci.")
    );
}

#[test]
fn concurrent_use_matches_sequential() {
    let titles = [
        "Journal of Testing",
        "International Conference, 2020",
        "Computers and Security",
        "Über Physik",
        "United States Reports",
        "Bio-Medical Engineering",
    ];
    let abbreviator = Arc::new(abbreviator());
    let expected: Vec<Option<String>> = titles.iter().map(|t| abbreviator.abbreviate(t)).collect();

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let abbreviator = Arc::clone(&abbreviator);
            let expected = &expected;
            scope.spawn(move || {
                for _ in 0..50 {
                    let got: Vec<Option<String>> =
                        titles.iter().map(|t| abbreviator.abbreviate(t)).collect();
                    assert_eq!(&got, expected);
                }
            });
        }
    });
}

const SAMPLE_CSV: &str = "WORDS;ABBREVIATIONS;LANGUAGES\n\
\"journal\";\"j.\";\"eng\"\n\
\"comput-\";\"comput.\";\"eng\"\n\
\"science\";\"sci.\";\"eng\"\n\
\"-ology\";\"-ol.\";\"eng\"\n\
\"(Royal) société\";\"soc.\";\"fre\"\n";

#[test]
fn abbreviates_from_sqlite_index() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("ltwa.csv");
    let db_path = dir.path().join("ltwa.db");
    std::fs::write(&csv_path, SAMPLE_CSV).unwrap();
    ltwa_index::build_index_from_file(&db_path, &csv_path, |_| {}).unwrap();

    let abbreviator = Abbreviator::open(&db_path);
    assert_eq!(abbreviator.store().prefix_len(), 4);
    assert_eq!(abbreviator.store().suffix_len(), 1);

    assert_eq!(
        abbreviator
            .abbreviate("Journal of Computer Science")
            .as_deref(),
        Some("J. Comput. Sci.")
    );
    assert_eq!(
        abbreviator
            .abbreviate("Société de Radiology")
            .as_deref(),
        Some("Soc. Radiol.")
    );
}

#[test]
fn corrupt_index_falls_back_to_no_rules() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ltwa.db");
    std::fs::write(&db_path, b"not a database").unwrap();

    let abbreviator = Abbreviator::open(&db_path);
    assert!(abbreviator.store().is_empty());
    assert_eq!(
        abbreviator.abbreviate("Journal of Science").as_deref(),
        Some("Journal Science")
    );
}
