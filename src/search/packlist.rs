//! Local pack-list provider.
//!
//! Reads an iroffer-style pack list from disk and serves it through the
//! [`SearchProvider`] contract. The file names its source on the first
//! meaningful line — a locator prefix without the pack segment — followed by
//! one line per pack:
//!
//! ```text
//! ** SomeBot pack list **
//! irc://irc.rizon.net/#example/SomeBot
//! #1   90x [ 181M] Some.File.S01E01.mkv
//! #2  102x [ 1.2G] Some.File.S01E02.mkv
//! ```
//!
//! Banner lines (`**`), blank lines, and anything else unrecognized are
//! skipped, matching how lenient real pack lists need to be. A size that
//! does not parse becomes -1 rather than dropping the entry.

use std::path::Path;

use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;

use crate::search::{parse_file_size, FileRecord, SearchProvider};
use crate::xdcc::locator::IrcFile;

pub struct PacklistProvider {
    name: String,
    records: Vec<FileRecord>,
}

impl PacklistProvider {
    /// Read and parse a pack list. Fails when the file cannot be read or
    /// names no source locator.
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pack list {}", path.display()))?;
        let records = parse_packlist(&text)
            .with_context(|| format!("failed to parse pack list {}", path.display()))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("packlist")
            .to_string();
        Ok(Self { name, records })
    }
}

impl SearchProvider for PacklistProvider {
    fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive all-keywords match against the pack name. An empty
    /// keyword list matches everything.
    fn search<'a>(&'a self, keywords: &'a [String]) -> BoxFuture<'a, Result<Vec<FileRecord>>> {
        Box::pin(async move {
            let needles: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
            Ok(self
                .records
                .iter()
                .filter(|r| {
                    let name = r.name.to_lowercase();
                    needles.iter().all(|n| name.contains(n))
                })
                .cloned()
                .collect())
        })
    }
}

fn parse_packlist(text: &str) -> Result<Vec<FileRecord>> {
    let mut source: Option<IrcFile> = None;
    let mut records = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("**") {
            continue;
        }
        if line.starts_with("irc://") && source.is_none() {
            source = Some(parse_source_prefix(line)?);
            continue;
        }
        let Some(source) = &source else { continue };
        if let Some((pack, size, name)) = parse_pack_line(line) {
            let mut file = source.clone();
            file.pack = pack;
            records.push(FileRecord {
                file,
                name,
                size,
                slot: records.len(),
            });
        }
    }

    if source.is_none() {
        bail!("no source locator line (irc://host/[#channel/]bot) found");
    }
    Ok(records)
}

/// A locator prefix is a locator without the pack segment; reuse the locator
/// grammar by appending a placeholder pack.
fn parse_source_prefix(line: &str) -> Result<IrcFile> {
    let prefix = line.trim_end_matches('/');
    IrcFile::parse(&format!("{prefix}/0"))
        .with_context(|| format!("invalid source locator prefix {line:?}"))
}

/// Parse one `#<pack> <gets>x [<size>] <name>` line.
fn parse_pack_line(line: &str) -> Option<(u32, i64, String)> {
    let rest = line.strip_prefix('#')?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    let pack: u32 = digits.parse().ok()?;

    let open = rest.find('[')?;
    let close = rest[open..].find(']')? + open;
    let size = parse_file_size(rest[open + 1..close].trim()).unwrap_or(-1);

    let name = rest[close + 1..].trim();
    if name.is_empty() {
        return None;
    }
    Some((pack, size, name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
** SomeBot pack list -- 3 packs **
irc://irc.rizon.net/#example/SomeBot

#1   90x [ 181M] Great.Show.S01E01.mkv
#2  102x [ 1.2G] Great.Show.S01E02.mkv
#3    4x [ ???M] Mystery.Sizes.rar
total offered: 1.4G
";

    #[test]
    fn parses_entries_with_source_locator() {
        let records = parse_packlist(SAMPLE).unwrap();
        assert_eq!(records.len(), 3);

        let first = &records[0];
        assert_eq!(first.file.bot, "SomeBot");
        assert_eq!(first.file.channel.as_deref(), Some("#example"));
        assert_eq!(first.file.pack, 1);
        assert_eq!(first.name, "Great.Show.S01E01.mkv");
        assert_eq!(first.size, 181 * 1024 * 1024);
        assert_eq!(records[1].size, (1.2 * 1024.0 * 1024.0 * 1024.0) as i64);
    }

    #[test]
    fn unparseable_size_becomes_unknown() {
        let records = parse_packlist(SAMPLE).unwrap();
        assert_eq!(records[2].size, -1);
    }

    #[test]
    fn missing_source_line_is_an_error() {
        assert!(parse_packlist("#1 1x [ 1M] file.bin\n").is_err());
    }

    #[tokio::test]
    async fn keyword_filter_matches_case_insensitively() {
        let provider = PacklistProvider {
            name: "test".into(),
            records: parse_packlist(SAMPLE).unwrap(),
        };

        let hits = provider
            .search(&["great".into(), "E02".into()])
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file.pack, 2);

        let all = provider.search(&[]).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
