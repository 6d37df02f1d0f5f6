//! Grouping of probed files into releases.

use crate::probe::FileRecord;

/// A release: one file, or every part of a multi-part archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Display name. The filename for single-file groups, the shared base
    /// name for multi-part groups, the URL for dead links.
    pub name: String,
    /// Members in discovery order. Empty for a dead link.
    pub files: Vec<FileRecord>,
    /// Sum of member sizes.
    pub total_size_bytes: u64,
    /// Hoster name.
    pub host: String,
    /// The group stands for a dead link.
    pub is_dead: bool,
}

impl Group {
    fn live(name: String, file: FileRecord) -> Self {
        Self {
            name,
            files: vec![file],
            total_size_bytes: 0,
            host: String::new(),
            is_dead: false,
        }
    }

    fn dead(url: &str) -> Self {
        Self {
            name: url.to_string(),
            files: Vec::new(),
            total_size_bytes: 0,
            host: String::new(),
            is_dead: true,
        }
    }

    /// Base name shared by the members, empty for a dead group.
    #[must_use]
    pub fn base_name(&self) -> &str {
        self.files.first().map_or("", |f| f.base_name.as_str())
    }
}

fn is_multipart_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower
        .strip_suffix(".rar")
        .and_then(|rest| rest.rsplit_once(".part"))
        .is_some_and(|(_, n)| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Groups probed files into releases.
///
/// Dead files become singleton dead groups. A live file joins the first
/// live group whose name equals its base name; otherwise it opens a group
/// named after its base name when it looks like `*.partNN.rar`, or after its
/// full filename when it does not. Single-member groups end up named after
/// their file.
#[must_use]
pub fn group_files(files: &[FileRecord], host: &str) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();

    for file in files {
        if file.is_dead {
            groups.push(Group::dead(&file.url));
            continue;
        }

        if let Some(group) = groups
            .iter_mut()
            .find(|g| !g.is_dead && g.name == file.base_name)
        {
            group.files.push(file.clone());
            continue;
        }

        let name = if is_multipart_name(&file.display_name) {
            file.base_name.clone()
        } else {
            file.display_name.clone()
        };
        groups.push(Group::live(name, file.clone()));
    }

    for group in &mut groups {
        group.total_size_bytes = group.files.iter().map(|f| f.size_bytes).sum();
        group.host = host.to_string();
        if let [only] = group.files.as_slice() {
            group.name.clone_from(&only.display_name);
        }
    }

    groups
}

fn name_tokens(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(['-', '.'])
        .map(str::to_string)
        .collect()
}

/// Renames groups after catalog release names.
///
/// A release matches a group when the last `-`/`.` separated token of both
/// names is the same and they agree on carrying a `720p` or `1080p` marker.
/// The last matching release wins. Dead groups keep their URL.
pub fn match_release_names<S: AsRef<str>>(groups: &mut [Group], releases: &[S]) {
    for group in groups.iter_mut().filter(|g| !g.is_dead) {
        let group_tokens = name_tokens(group.base_name());
        let g720 = group_tokens.iter().any(|t| t == "720p");
        let g1080 = group_tokens.iter().any(|t| t == "1080p");

        for release in releases.iter().map(AsRef::as_ref) {
            let lower = release.to_lowercase();
            if name_tokens(release).last() != group_tokens.last() {
                continue;
            }

            let r720 = lower.contains("720p");
            let r1080 = lower.contains("1080p");
            if (r720 && g720) || (r1080 && g1080) || (!r720 && !r1080 && !g720 && !g1080) {
                group.name = release.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live(url: &str, name: &str, size: u64) -> FileRecord {
        FileRecord {
            url: url.to_string(),
            id: url.rsplit('/').next().unwrap().to_string(),
            rand_token: "r".to_string(),
            form_token: name.to_string(),
            display_name: name.to_string(),
            base_name: crate::probe::base_name(name),
            is_dead: false,
            size_bytes: size,
        }
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_files(&[], "UpToBox").is_empty());
    }

    #[test]
    fn multipart_files_merge() {
        let files = [
            live("u/1", "Show.S01E01.part1.rar", 100),
            live("u/2", "Show.S01E01.part2.rar", 50),
            live("u/3", "Movie.2020.mkv", 7),
        ];
        let groups = group_files(&files, "UpToBox");

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Show.S01E01");
        assert_eq!(groups[0].files.len(), 2);
        assert_eq!(groups[0].total_size_bytes, 150);
        assert_eq!(groups[0].host, "UpToBox");
        assert_eq!(groups[1].name, "Movie.2020.mkv");
        assert_eq!(groups[1].total_size_bytes, 7);
    }

    #[test]
    fn lone_part_is_named_after_its_file() {
        let groups = group_files(&[live("u/1", "Show.S01E01.part1.rar", 1)], "UpToBox");
        assert_eq!(groups[0].name, "Show.S01E01.part1.rar");
    }

    #[test]
    fn multipart_detection_is_case_insensitive() {
        assert!(is_multipart_name("Show.PART01.RAR"));
        assert!(!is_multipart_name("Show.part.rar"));
        assert!(!is_multipart_name("Show.part1.zip"));
    }

    #[test]
    fn non_part_file_joins_existing_multipart_group() {
        let files = [
            live("u/1", "Show.part1.rar", 1),
            live("u/2", "Show.part2.rar", 1),
            live("u/3", "Show.nfo", 1),
        ];
        let groups = group_files(&files, "UpToBox");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files.len(), 3);
    }

    #[test]
    fn earlier_singletons_never_merge_retroactively() {
        let files = [
            live("u/1", "Show.nfo", 1),
            live("u/2", "Show.part1.rar", 1),
            live("u/3", "Show.part2.rar", 1),
        ];
        let groups = group_files(&files, "UpToBox");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Show.nfo");
        assert_eq!(groups[1].name, "Show");
        assert_eq!(groups[1].files.len(), 2);
    }

    #[test]
    fn dead_files_are_isolated() {
        let files = [
            FileRecord::dead("http://uptobox.com/bbbbbbbbbbbb"),
            live("u/1", "a.mkv", 1),
        ];
        let groups = group_files(&files, "UpToBox");
        assert_eq!(groups.len(), 2);
        assert!(groups[0].is_dead);
        assert!(groups[0].files.is_empty());
        assert_eq!(groups[0].name, "http://uptobox.com/bbbbbbbbbbbb");
        assert_eq!(groups[0].base_name(), "");
    }

    #[test]
    fn release_names_applied() {
        let files = [
            live("u/1", "show.s01e01.720p-grp.part1.rar", 1),
            live("u/2", "show.s01e01.720p-grp.part2.rar", 1),
            live("u/3", "show.s01e01.1080p-grp.mkv", 1),
        ];
        let mut groups = group_files(&files, "UpToBox");
        let releases = ["Show.S01E01.1080p.WEB-GRP", "Show.S01E01.720p.HDTV-GRP"];
        match_release_names(&mut groups, &releases);

        assert_eq!(groups[0].name, "Show.S01E01.720p.HDTV-GRP");
        assert_eq!(groups[1].name, "Show.S01E01.1080p.WEB-GRP");
    }

    #[test]
    fn release_names_require_matching_tag() {
        let mut groups = group_files(&[live("u/1", "show.s01e01-lol.mkv", 1)], "UpToBox");
        match_release_names(&mut groups, &["Other.Show-DIMENSION", "Show.S01E01.720p-LOL"]);
        assert_eq!(groups[0].name, "show.s01e01-lol.mkv");

        match_release_names(&mut groups, &["Show.S01E01.HDTV-LOL"]);
        assert_eq!(groups[0].name, "Show.S01E01.HDTV-LOL");
    }

    #[test]
    fn release_names_skip_dead_groups() {
        let mut groups = group_files(&[FileRecord::dead("http://uptobox.com/x")], "UpToBox");
        match_release_names(&mut groups, &["x"]);
        assert_eq!(groups[0].name, "http://uptobox.com/x");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn record() -> impl Strategy<Value = FileRecord> {
            (
                "[a-c]{1,2}",
                prop::option::of(1u8..4),
                prop::bool::weighted(0.2),
                0u64..1_000_000,
                "[a-z]{12}",
            )
                .prop_map(|(stem, part, dead, size, id)| {
                    let url = format!("http://uptobox.com/{id}");
                    if dead {
                        return FileRecord::dead(&url);
                    }
                    let name = part.map_or_else(
                        || format!("{stem}.mkv"),
                        |n| format!("{stem}.part{n}.rar"),
                    );
                    live(&url, &name, size)
                })
        }

        proptest! {
            #[test]
            fn grouping_is_idempotent(files in prop::collection::vec(record(), 0..20)) {
                prop_assert_eq!(group_files(&files, "UpToBox"), group_files(&files, "UpToBox"));
            }

            #[test]
            fn sizes_add_up(files in prop::collection::vec(record(), 0..20)) {
                for group in group_files(&files, "UpToBox") {
                    let sum: u64 = group.files.iter().map(|f| f.size_bytes).sum();
                    prop_assert_eq!(group.total_size_bytes, sum);
                }
            }

            #[test]
            fn every_file_lands_in_one_group(files in prop::collection::vec(record(), 0..20)) {
                let groups = group_files(&files, "UpToBox");
                let live_members: usize = groups.iter().map(|g| g.files.len()).sum();
                let dead_groups = groups.iter().filter(|g| g.is_dead).count();
                prop_assert_eq!(live_members, files.iter().filter(|f| !f.is_dead).count());
                prop_assert_eq!(dead_groups, files.iter().filter(|f| f.is_dead).count());
            }

            #[test]
            fn dead_groups_stay_empty(files in prop::collection::vec(record(), 0..20)) {
                for group in group_files(&files, "UpToBox") {
                    prop_assert!(!group.is_dead || group.files.is_empty());
                    prop_assert!(group.files.iter().all(|f| !f.is_dead));
                }
            }
        }
    }
}
