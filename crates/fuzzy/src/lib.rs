use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use nucleo_matcher::{Config, Utf32Str, Utf32String};
use walkdir::WalkDir;

/// A file offered by the picker.
#[derive(Clone, Debug)]
pub struct Candidate {
    /// Full filesystem path.
    pub absolute_path: PathBuf,
    /// Path relative to the scanned root, as displayed and matched.
    pub display: String,
    /// `display` in the matcher's representation, computed once at scan time.
    haystack: Utf32String,
}

impl Candidate {
    pub fn new(root: &Path, absolute_path: PathBuf) -> Self {
        let display = absolute_path
            .strip_prefix(root)
            .unwrap_or(&absolute_path)
            .to_string_lossy()
            .into_owned();
        let haystack = Utf32String::from(display.as_str());
        Self {
            absolute_path,
            display,
            haystack,
        }
    }

    pub fn haystack(&self) -> Utf32Str<'_> {
        self.haystack.slice(..)
    }

    /// Length used to order candidates, in characters.
    pub fn len(&self) -> usize {
        self.haystack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.haystack.is_empty()
    }
}

/// Walk `root` recursively and collect every regular file, skipping `.git`
/// directories. Entries that cannot be read are skipped.
pub fn scan(root: &Path) -> Vec<Candidate> {
    let mut out = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == ".git"));
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                out.push(Candidate::new(root, entry.into_path()));
            }
            Ok(_) => {}
            Err(error) => tracing::debug!(%error, "skipping unreadable entry"),
        }
    }
    tracing::debug!(root = %root.display(), files = out.len(), "scanned picker candidates");
    out
}

/// Scores a query against a candidate. `None` means no match.
pub trait Matcher {
    fn score(&mut self, query: &str, candidate: &Candidate) -> Option<u32>;
}

/// [`Matcher`] backed by `nucleo-matcher`.
pub struct NucleoMatcher {
    matcher: nucleo_matcher::Matcher,
    needle_buf: Vec<char>,
}

impl Default for NucleoMatcher {
    fn default() -> Self {
        Self {
            matcher: nucleo_matcher::Matcher::new(Config::DEFAULT),
            needle_buf: Vec::new(),
        }
    }
}

impl Matcher for NucleoMatcher {
    fn score(&mut self, query: &str, candidate: &Candidate) -> Option<u32> {
        self.needle_buf.clear();
        let needle = Utf32Str::new(query, &mut self.needle_buf);
        self.matcher
            .fuzzy_match(candidate.haystack(), needle)
            .map(u32::from)
    }
}

/// One entry of a ranked result list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ranked {
    /// Position of the candidate in the scanned list.
    pub index: usize,
    pub score: u32,
}

/// Rank `candidates` against `query`, keeping at most `limit` results.
///
/// An empty query lists everything shortest first. Otherwise candidates
/// scoring above zero are sorted by descending score, ties broken by
/// ascending length. The full list is re-scored on every call.
pub fn rank(
    candidates: &[Candidate],
    query: &str,
    matcher: &mut dyn Matcher,
    limit: usize,
) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = if query.is_empty() {
        (0..candidates.len())
            .map(|index| Ranked { index, score: 0 })
            .collect()
    } else {
        candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                let score = matcher.score(query, candidate)?;
                (score > 0).then_some(Ranked { index, score })
            })
            .collect()
    };

    ranked.sort_by(|a, b| match b.score.cmp(&a.score) {
        Ordering::Equal => candidates[a.index].len().cmp(&candidates[b.index].len()),
        other => other,
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn make_candidates(paths: &[&str]) -> Vec<Candidate> {
        let root = Path::new("/repo");
        paths
            .iter()
            .map(|p| Candidate::new(root, root.join(p)))
            .collect()
    }

    fn displays<'a>(candidates: &'a [Candidate], ranked: &[Ranked]) -> Vec<&'a str> {
        ranked
            .iter()
            .map(|r| candidates[r.index].display.as_str())
            .collect()
    }

    /// Gives every candidate containing the query the same score.
    struct Substring;

    impl Matcher for Substring {
        fn score(&mut self, query: &str, candidate: &Candidate) -> Option<u32> {
            candidate.display.contains(query).then_some(10)
        }
    }

    #[test]
    fn candidate_display_is_relative() {
        let c = Candidate::new(Path::new("/repo"), PathBuf::from("/repo/src/main.go"));
        assert_eq!(c.display, "src/main.go");
        assert_eq!(c.len(), 11);
        assert_eq!(c.absolute_path, PathBuf::from("/repo/src/main.go"));
    }

    #[test]
    fn empty_query_sorts_by_length() {
        let files = make_candidates(&["abcdefghijkl", "abc", "abcdefg"]);
        let ranked = rank(&files, "", &mut NucleoMatcher::default(), 10);
        assert_eq!(displays(&files, &ranked), vec!["abc", "abcdefg", "abcdefghijkl"]);
    }

    #[test]
    fn ties_broken_by_length() {
        let files = make_candidates(&["pkg/long/name.go", "name.go", "x/name.go"]);
        let ranked = rank(&files, "name", &mut Substring, 10);
        assert_eq!(
            displays(&files, &ranked),
            vec!["name.go", "x/name.go", "pkg/long/name.go"]
        );
    }

    #[test]
    fn results_capped_at_limit() {
        let files = make_candidates(&["a", "bb", "ccc", "dddd"]);
        let ranked = rank(&files, "", &mut NucleoMatcher::default(), 2);
        assert_eq!(displays(&files, &ranked), vec!["a", "bb"]);
    }

    #[test]
    fn empty_candidates_returns_empty() {
        assert!(rank(&[], "test", &mut NucleoMatcher::default(), 10).is_empty());
    }

    #[test]
    fn no_match_returns_empty() {
        let files = make_candidates(&["src/main.go", "go.mod"]);
        assert!(rank(&files, "zzzzzzzzz", &mut NucleoMatcher::default(), 10).is_empty());
    }

    #[test]
    fn exact_filename_match_first() {
        let files = make_candidates(&["src/main.go", "src/lib.go", "go.mod"]);
        let ranked = rank(&files, "main.go", &mut NucleoMatcher::default(), 10);
        assert!(!ranked.is_empty());
        assert_eq!(files[ranked[0].index].display, "src/main.go");
    }

    #[test]
    fn scores_descend() {
        let files = make_candidates(&[
            "src/something/deeply/nested/main.go",
            "main.go",
            "src/main_helper.go",
        ]);
        let ranked = rank(&files, "main.go", &mut NucleoMatcher::default(), 10);
        assert!(ranked.len() >= 2);
        for window in ranked.windows(2) {
            assert!(
                window[0].score >= window[1].score,
                "scores not in descending order: {} < {}",
                window[0].score,
                window[1].score
            );
        }
    }

    #[test]
    fn fuzzy_matching_non_contiguous() {
        let files = make_candidates(&["src/my_awesome_file.go", "other.txt"]);
        let ranked = rank(&files, "maf", &mut NucleoMatcher::default(), 10);
        assert!(
            !ranked.is_empty(),
            "expected fuzzy match for 'maf' in 'my_awesome_file.go'"
        );
    }

    #[test]
    fn scan_skips_git_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        fs::write(dir.path().join("main.go"), "package main\n").unwrap();
        fs::write(dir.path().join("pkg/util.go"), "package pkg\n").unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(dir.path().join(".git/objects/ab"), "x").unwrap();

        let candidates = scan(dir.path());
        let mut names: Vec<&str> = candidates.iter().map(|c| c.display.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["main.go", "pkg/util.go"]);
    }
}
